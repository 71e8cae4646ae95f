use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum WindowError {
    #[error("Device not found in device registry: {0}")]
    DeviceNotFound(String),

    #[error("Invalid entity {entity}: expected one of the domains {expected}")]
    InvalidEntity { entity: String, expected: String },

    #[error("Missing second entity for mode {0}")]
    MissingSecondEntity(String),

    #[error("Base and second entity must differ: {0}")]
    DuplicateEntity(String),

    #[error("Invalid tilt threshold: {0} (must be finite and non-negative)")]
    InvalidThreshold(f64),

    #[error("Unknown mode: {0}")]
    UnknownMode(String),

    #[error("Entity id already taken: {0}")]
    EntityIdTaken(String),

    #[error("Entity not registered: {0}")]
    EntityNotRegistered(String),

    #[error("Config entry not found: {0}")]
    EntryNotFound(String),

    #[error("Config entry already set up: {0}")]
    EntryAlreadyLoaded(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl WindowError {
    /// Whether this error comes from setup-time validation of a window's
    /// configuration rather than from I/O or the host registries.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            WindowError::DeviceNotFound(_)
                | WindowError::InvalidEntity { .. }
                | WindowError::MissingSecondEntity(_)
                | WindowError::DuplicateEntity(_)
                | WindowError::InvalidThreshold(_)
                | WindowError::UnknownMode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WindowError>;
