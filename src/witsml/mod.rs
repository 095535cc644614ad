pub mod header;
pub mod loader;
pub mod parser;
pub mod value;

pub use header::MnemonicMap;
pub use loader::read_xml;
pub use parser::LogDocument;
pub use value::CellValue;
