// Error taxonomy for authprobe
//
// Transport failures never appear here: the probe converts them to the
// status_code=0 sentinel snapshot. These variants cover preparation and
// I/O failures that the scheduler turns into error results.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    /// The case carried a method reqwest cannot represent.
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The case URL could not be parsed into a request target.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum PlanError {
    /// An endpoint record could not be deserialized; the endpoint is
    /// skipped and planning continues.
    #[error("malformed endpoint record: {0}")]
    MalformedEndpoint(String),

    /// Plan or result persistence failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
