pub mod file_filter;
pub mod input_scanner;

pub use file_filter::FileFilter;
pub use input_scanner::{InputFile, InputScanner};
