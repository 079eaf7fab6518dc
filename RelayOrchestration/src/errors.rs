use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("State file I/O error: {0}")]
    Io(String),
    #[error("State file corrupt: {0}")]
    Corrupt(String),
}
