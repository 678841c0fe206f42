use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to enumerate installed products: {0}")]
    Enumeration(#[source] std::io::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub fn is_cancelled(&self) -> bool { matches!(self, Error::Cancelled) }
}
