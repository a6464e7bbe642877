use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Input the caller must fix; never retried
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Decoding, cropping, mixing, compositing or encoding failed
    #[error("Render failed: {0}")]
    RenderFailure(String),

    #[error("{operation} failed after {attempts} attempt(s): {last}")]
    RetryExhausted {
        operation: String,
        attempts: u32,
        last: String,
    },
}

impl RenderError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RenderError::InvalidInput(message.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        RenderError::RenderFailure(message.into())
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, RenderError::InvalidInput(_))
    }

    /// Stable name reported in the `kind` field of error events
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::InvalidInput(_) => "invalid_input",
            RenderError::RenderFailure(_) => "render_failure",
            RenderError::RetryExhausted { .. } => "retry_exhausted",
        }
    }
}

/// Find the typed render error inside an `anyhow` chain, if there is one
pub fn render_error(err: &anyhow::Error) -> Option<&RenderError> {
    err.chain().find_map(|cause| cause.downcast_ref::<RenderError>())
}
