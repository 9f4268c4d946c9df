use thiserror::Error;

#[derive(Debug, Error)]
pub enum OhlcvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to persist output file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("row {row}: cannot convert {field} from {value:?}")]
    Conversion {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("dataset contains missing values (first at row {row})")]
    MissingValues { row: usize },

    #[error("timestamps are not in chronological order (row {row})")]
    OutOfOrderTimestamps { row: usize },

    #[error("invalid OHLC relationship (row {row})")]
    InvalidOhlc { row: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),
}
