use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypemasterError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database Error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Corpus Error: {0}")]
    Corpus(String),

    #[error("Invalid Input: {0}")]
    InvalidInput(String),
}

pub type TmResult<T> = Result<T, TypemasterError>;
