use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwarderError {
    /// Missing or unusable connection settings.
    #[error("invalid forwarder configuration: {0}")]
    Configuration(String),

    /// The store rejected or failed an index or bulk call. The store's own
    /// error is passed through untouched.
    #[error(transparent)]
    Delivery(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ForwarderError>;

impl ForwarderError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ForwarderError::Configuration(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ForwarderError::Configuration(_))
    }

    pub fn is_delivery(&self) -> bool {
        matches!(self, ForwarderError::Delivery(_))
    }
}
