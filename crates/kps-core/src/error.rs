use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KpsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Degenerate geometry: {what}")]
    Degenerate { what: &'static str },
}
