pub type ScrollbookResult<T> = Result<T, ScrollbookError>;

#[derive(thiserror::Error, Debug)]
pub enum ScrollbookError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrollbookError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ScrollbookError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(ScrollbookError::asset("x").to_string().contains("asset error:"));
        assert!(
            ScrollbookError::render("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ScrollbookError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
