#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Codacy API request failed [{status}]: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to reach the Codacy API: {0}")]
    Transport(String),

    #[error("Failed to parse Codacy response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("No Coding Standards found for org {0}")]
    NoCodingStandards(String),

    #[error("Coding standard '{0}' not found")]
    CodingStandardNotFound(String),

    #[error("Pattern listing did not finish after {0} pages")]
    PaginationLimit(usize),

    #[error("Input closed before a selection was made")]
    InputClosed,
}

impl Error {
    /// Whether the error came from talking to the Codacy API
    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api { .. } | Error::Transport(_) | Error::Decode { .. })
    }
}
