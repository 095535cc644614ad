use crate::error::{Result, Witsml2CsvError};
use crate::extractor::table::LogTable;
use crate::witsml::MnemonicMap;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const JSON_EXTENSION: &str = ".json";
pub const CSV_GZ_EXTENSION: &str = ".csv.gz";

// Upper bound on suffix bumps when the counted name is already taken.
const MAX_SUFFIX_PROBES: usize = 10_000;

/// Paths and shape of one persisted log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLog {
    pub stem: String,
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
    pub json_id: usize,
    pub csv_id: usize,
    pub rows: usize,
    pub columns: usize,
}

pub struct OutputManager {
    destination: PathBuf,
    create_destination: bool,
}

impl OutputManager {
    pub fn new<P: Into<PathBuf>>(destination: P) -> Self {
        Self {
            destination: destination.into(),
            create_destination: false,
        }
    }

    pub fn with_create_destination(mut self, create: bool) -> Self {
        self.create_destination = create;
        self
    }

    /// Makes sure the destination is an existing, writable directory.
    pub fn initialize(&self) -> Result<()> {
        if !self.destination.exists() {
            if !self.create_destination {
                return Err(Witsml2CsvError::InvalidPath {
                    path: format!(
                        "Destination directory does not exist: {}",
                        self.destination.display()
                    ),
                });
            }

            fs::create_dir_all(&self.destination).map_err(|e| Witsml2CsvError::Permission {
                path: format!(
                    "Cannot create destination directory {}: {}",
                    self.destination.display(),
                    e
                ),
            })?;
            tracing::info!(path = %self.destination.display(), "created destination directory");
        }

        let metadata = fs::metadata(&self.destination)?;
        if !metadata.is_dir() {
            return Err(Witsml2CsvError::InvalidPath {
                path: format!("{} is not a directory", self.destination.display()),
            });
        }
        if metadata.permissions().readonly() {
            return Err(Witsml2CsvError::Permission {
                path: self.destination.display().to_string(),
            });
        }

        Ok(())
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Writes `{stem}_{J}.json` and `{stem}_{C}.csv.gz`.
    ///
    /// Both payloads are rendered before anything touches the disk, and the
    /// JSON file is removed again if the CSV file cannot be written, so a
    /// failed call leaves the destination unchanged.
    pub fn save_log(&self, stem: &str, mnemonics: &MnemonicMap, table: &LogTable) -> Result<SavedLog> {
        validate_stem(stem)?;

        let header = render_header_json(mnemonics)?;
        let body = render_table_csv_gz(table)?;

        let json_start = next_file_id(&self.destination, stem, JSON_EXTENSION)?;
        let (json_path, json_id) =
            write_unique(&self.destination, stem, json_start, JSON_EXTENSION, &header)?;

        let csv_written = next_file_id(&self.destination, stem, CSV_GZ_EXTENSION)
            .and_then(|start| write_unique(&self.destination, stem, start, CSV_GZ_EXTENSION, &body));

        let (csv_path, csv_id) = match csv_written {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&json_path);
                return Err(e);
            }
        };

        tracing::debug!(
            json = %json_path.display(),
            csv = %csv_path.display(),
            rows = table.row_count(),
            "saved log"
        );

        Ok(SavedLog {
            stem: stem.to_string(),
            json_path,
            csv_path,
            json_id,
            csv_id,
            rows: table.row_count(),
            columns: table.column_count(),
        })
    }
}

/// Counts directory entries whose name contains `stem` and ends with
/// `extension`. The count is the suffix for the next file.
pub fn next_file_id(dir: &Path, stem: &str, extension: &str) -> Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if name.contains(stem) && name.ends_with(extension) {
            count += 1;
        }
    }
    Ok(count)
}

pub fn output_file_name(stem: &str, id: usize, extension: &str) -> String {
    format!("{}_{}{}", stem, id, extension)
}

/// Rejects log names that would place output outside the destination.
pub fn validate_stem(stem: &str) -> Result<()> {
    if stem.chars().any(|c| c == '/' || c == '\\' || c == '\0') {
        return Err(Witsml2CsvError::InvalidStem {
            stem: stem.to_string(),
        });
    }
    Ok(())
}

// Never overwrites: the first free name at or after `start` is used.
fn write_unique(
    dir: &Path,
    stem: &str,
    start: usize,
    extension: &str,
    contents: &[u8],
) -> Result<(PathBuf, usize)> {
    for id in start..start + MAX_SUFFIX_PROBES {
        let path = dir.join(output_file_name(stem, id, extension));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), "name taken, bumping suffix");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = file.write_all(contents).and_then(|_| file.flush()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        return Ok((path, id));
    }

    Err(Witsml2CsvError::InvalidPath {
        path: format!(
            "No free file name for {} in {}",
            output_file_name(stem, start, extension),
            dir.display()
        ),
    })
}

/// JSON object in the spaced, ASCII-only layout downstream tooling expects:
/// `{"DEPT": "m", "GR": "API"}`.
pub fn render_header_json(mnemonics: &MnemonicMap) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedAsciiFormatter);
    mnemonics.serialize(&mut serializer)?;
    Ok(buffer)
}

/// Gzip-compressed CSV with a header row of mnemonics and no index column.
pub fn render_table_csv_gz(table: &LogTable) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(encoder);

    writer.write_record(table.headers())?;
    for row in table.rows() {
        let fields: Vec<Cow<'_, str>> = row.iter().map(|value| value.as_csv_field()).collect();
        writer.write_record(fields.iter().map(|field| field.as_bytes()))?;
    }

    let encoder = writer
        .into_inner()
        .map_err(|e| Witsml2CsvError::Io(e.into_error()))?;
    Ok(encoder.finish()?)
}

/// `", "` and `": "` separators. Only printable ASCII is written raw.
struct SpacedAsciiFormatter;

fn is_printable_ascii(ch: char) -> bool {
    (' '..='~').contains(&ch)
}

impl serde_json::ser::Formatter for SpacedAsciiFormatter {
    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn write_string_fragment<W: ?Sized + Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        if fragment.chars().all(is_printable_ascii) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if is_printable_ascii(ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
