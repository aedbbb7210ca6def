// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Required field is blank: {field}")]
    Validation { field: &'static str },

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown sector: {0}")]
    UnknownSector(String),
}

pub type Result<T> = std::result::Result<T, Error>;
