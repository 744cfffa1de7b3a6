use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid base URL `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("virtual user count must be non-zero")]
    NoUsers,

    /// Connection refused, timeout, malformed response and friends. Never
    /// fatal during a run; surfaced as a failed check instead.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}
