use thiserror::Error;

#[derive(Error, Debug)]
pub enum Witsml2CsvError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed XML: {message}")]
    Xml { message: String },

    #[error("Required element <{element}> not found in document")]
    MissingElement { element: &'static str },

    #[error("Data row {row} has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Column {column} has {found} values, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Log name cannot be used as a file name: {stem:?}")]
    InvalidStem { stem: String },

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("No WITSML input files found")]
    NoInputsFound { searched_extensions: Vec<String> },

    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Permission denied: {path}")]
    Permission { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl Witsml2CsvError {
    /// True for failures caused by the document content rather than the
    /// filesystem or the environment.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            Witsml2CsvError::Xml { .. }
                | Witsml2CsvError::MissingElement { .. }
                | Witsml2CsvError::RaggedRow { .. }
                | Witsml2CsvError::ColumnLengthMismatch { .. }
                | Witsml2CsvError::InvalidStem { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Witsml2CsvError {
    fn user_message(&self) -> String {
        match self {
            Witsml2CsvError::Xml { message } => {
                format!("Could not parse the document as XML: {}", message)
            }
            Witsml2CsvError::MissingElement { element } => {
                format!("The document has no <{}> element", element)
            }
            Witsml2CsvError::RaggedRow {
                row,
                expected,
                found,
            } => format!(
                "Data row {} has {} values but the log declares {} mnemonics",
                row, found, expected
            ),
            Witsml2CsvError::ColumnLengthMismatch {
                column,
                expected,
                found,
            } => format!(
                "Column '{}' ended up with {} values instead of {}",
                column, found, expected
            ),
            Witsml2CsvError::InvalidStem { stem } => {
                format!("Log name {:?} is not a usable file name", stem)
            }
            Witsml2CsvError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            Witsml2CsvError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            Witsml2CsvError::NoInputsFound { searched_extensions } => {
                format!(
                    "No input files found with extensions: {}",
                    searched_extensions.join(", ")
                )
            }
            Witsml2CsvError::FileTooLarge { size, max_size } => {
                format!(
                    "File too large: {} (maximum allowed: {})",
                    format_bytes(*size),
                    format_bytes(*max_size)
                )
            }
            Witsml2CsvError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            Witsml2CsvError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Witsml2CsvError::Xml { .. } => Some(
                "Check that the file is a complete WITSML export and not truncated.".to_string(),
            ),
            Witsml2CsvError::MissingElement { .. } => Some(
                "Only WITSML log documents with mnemonicList, unitList and name elements can be converted.".to_string(),
            ),
            Witsml2CsvError::RaggedRow { .. } | Witsml2CsvError::ColumnLengthMismatch { .. } => Some(
                "Use --ragged-rows pad to fill short rows with empty values.".to_string(),
            ),
            Witsml2CsvError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string(),
            ),
            Witsml2CsvError::NoInputsFound { .. } => Some(
                "Pass WITSML files directly or adjust --extensions (e.g., --extensions xml,witsml).".to_string(),
            ),
            Witsml2CsvError::FileTooLarge { .. } => Some(
                "Increase the maximum file size limit with --max-size.".to_string(),
            ),
            Witsml2CsvError::Permission { .. } => Some(
                "Ensure you have the necessary read/write permissions for the destination directory.".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<roxmltree::Error> for Witsml2CsvError {
    fn from(error: roxmltree::Error) -> Self {
        Witsml2CsvError::Xml {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Witsml2CsvError>;

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
