pub type AnimGraphResult<T> = Result<T, AnimGraphError>;

#[derive(thiserror::Error, Debug)]
pub enum AnimGraphError {
    /// Host/caller protocol bug: unknown discriminator, duplicate or missing
    /// tag, wrong node kind for the requested operation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed animation graph arithmetic (division by zero).
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// The active subgraph of an update pass contained a cycle.
    #[error("graph cycle: {0}")]
    Cycle(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnimGraphError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn arithmetic(msg: impl Into<String>) -> Self {
        Self::Arithmetic(msg.into())
    }

    pub fn cycle(msg: impl Into<String>) -> Self {
        Self::Cycle(msg.into())
    }
}
