use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("Unknown player: {0}")]
    UnknownPlayer(usize),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GameError {
    pub fn invalid(message: impl Into<String>) -> Self {
        GameError::InvalidArgument(message.into())
    }

    pub fn illegal(message: impl Into<String>) -> Self {
        GameError::IllegalState(message.into())
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
