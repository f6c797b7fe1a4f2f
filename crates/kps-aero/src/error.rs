//! Error types for coefficient tables.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AeroError {
    #[error("Table {table}: {what}")]
    InvalidTable { table: &'static str, what: String },
}

pub type AeroResult<T> = Result<T, AeroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AeroError::InvalidTable {
            table: "cl",
            what: "too short".to_string(),
        };
        assert!(err.to_string().contains("cl"));
    }
}
