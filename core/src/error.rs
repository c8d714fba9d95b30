//! Error types for the chat daemon

use thiserror::Error;

/// Main error type for the chat daemon
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Generic(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

/// Rejections a command handler reports back to the offending session.
///
/// None of these close the connection. The `Display` text is exactly the
/// line the client sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Username {0} in use! Choose another.")]
    NameTaken(String),

    #[error("You are not in a channel! Join one with /join <channel>.")]
    NotInChannel,

    #[error("Channel {0} does not exist!")]
    ChannelNotFound(String),

    #[error("User {0} does not exist!")]
    UserNotFound(String),

    #[error("Command not recognized (/help for help).")]
    UnrecognizedCommand,

    #[error("You are already in {0}!")]
    AlreadyInChannel(String),
}
