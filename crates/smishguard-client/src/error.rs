use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("submitted text is empty")]
    EmptyText,

    #[error("{0}")]
    Other(String),
}
