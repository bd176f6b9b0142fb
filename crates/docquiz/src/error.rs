#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Rejected(String),
}
