pub mod log_extractor;
pub mod output_manager;
pub mod report;
pub mod table;

pub use log_extractor::{ExtractedLog, ExtractionOutcome, LogExtractor};
pub use output_manager::{OutputManager, SavedLog};
pub use report::{ConversionProgress, ConversionReport, ConversionSummary, FileResult, FileStatus};
pub use table::{Column, LogTable, RaggedRowPolicy};
