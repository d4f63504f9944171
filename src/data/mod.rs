//! Data module - workbook loading, table model, numeric processing and xlsx output

mod cell;
mod loader;
mod processor;
mod sheet;
mod writer;

pub use cell::Cell;
pub use loader::{DataLoader, LoaderError};
pub use processor::{round_to, DataProcessor, ProcessorError};
pub use sheet::Sheet;
pub use writer::{column_letter, Highlights, WriterError, XlsxWriter};
