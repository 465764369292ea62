use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(String),

    #[error("Settings serialization error: {0}")]
    Serialization(String),

    #[error("Settings lock poisoned")]
    Lock,
}

pub type Result<T> = std::result::Result<T, SettingsError>;
