use std::path::PathBuf;

use thiserror::Error;

use super::model::Column;

/// Errors raised by the data layer.
///
/// Malformed single values (a bad date, a non-numeric price) are never
/// errors; they load as null.
#[derive(Debug, Error)]
pub enum DataError {
    /// The source could not be opened or does not have the expected shape.
    #[error("cannot load listings from {}: {reason}", path.display())]
    DataSource { path: PathBuf, reason: String },

    /// A helper needs a column the table does not carry.
    #[error("column '{}' is not present in the table", column.name())]
    Schema { column: Column },
}

impl DataError {
    pub fn data_source(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DataError::DataSource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;
