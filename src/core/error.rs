use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("No agent, structure, or group named '{0}'")]
    UnknownName(String),

    #[error("The name '{0}' is already in use")]
    DuplicateName(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
