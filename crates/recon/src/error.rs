use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (weights, thresholds, price-sync tunables).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// CSV decoding error.
    #[error("csv error: {0}")]
    Csv(String),
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(String),
    /// A candidate may be approved for at most one internal product.
    #[error("candidate '{candidate_id}' is already approved for product '{approved_for}'")]
    CandidateAlreadyApproved {
        candidate_id: String,
        approved_for: String,
    },
    /// No decision exists for the (internal, candidate) pair.
    #[error("no match decision for product '{internal_id}' and candidate '{candidate_id}'")]
    UnknownDecision {
        internal_id: String,
        candidate_id: String,
    },
}

impl From<csv::Error> for ReconError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<std::io::Error> for ReconError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
