//! Error types for the animation engine

use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("bone '{bone}' references missing parent '{parent}'")]
    MissingParent { bone: String, parent: String },

    #[error("bone hierarchy contains a cycle through '{bone}'")]
    Cycle { bone: String },

    #[error("unknown bone: {0}")]
    UnknownBone(String),

    #[error("bone already exists: {0}")]
    DuplicateBone(String),

    #[error("unknown registration: {0}")]
    UnknownRegistration(String),

    #[error("registration already exists: {0}")]
    DuplicateRegistration(String),

    #[error("skeleton is not validated")]
    InvalidSkeleton,

    #[error("invalid time: {0}")]
    InvalidTime(f32),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Structural errors are only produced by skeleton validation.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::MissingParent { .. } | Error::Cycle { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::MissingParent {
            bone: "hand".into(),
            parent: "arm".into(),
        };
        assert_eq!(err.to_string(), "bone 'hand' references missing parent 'arm'");
        assert_eq!(Error::UnknownBone("tail".into()).to_string(), "unknown bone: tail");
    }

    #[test]
    fn test_structural_kinds() {
        assert!(Error::Cycle { bone: "a".into() }.is_structural());
        assert!(!Error::InvalidSkeleton.is_structural());
        assert!(!Error::UnknownRegistration("walk".into()).is_structural());
    }
}
