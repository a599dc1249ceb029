//! Error type shared across AskLyn crates.

/// Errors raised outside the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum AskLynError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AskLynError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AskLynError::Config("bad port".into());
        assert_eq!(err.to_string(), "Config error: bad port");
    }

    #[test]
    fn test_io_error_converts() {
        fn open_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here/asklyn.toml")?)
        }
        assert!(matches!(open_missing(), Err(AskLynError::Io(_))));
    }
}
