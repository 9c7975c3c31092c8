//! Error kinds for callvis operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to decide how to react; the message and
/// context only help humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid argument passed to function
    InvalidArgument,

    // =========================================================================
    // Graph build errors
    // =========================================================================
    /// Unrecognized grouping token or otherwise unusable build options
    InvalidConfiguration,

    /// A raw call-edge record lacks its caller or callee identity
    MalformedInputRecord,

    /// The finished graph violates a structural invariant (dangling id,
    /// node placed twice or never)
    SerializationFailure,

    // =========================================================================
    // Input errors
    // =========================================================================
    /// Failed to decode the edge stream or a config file
    ParseFailed,

    // =========================================================================
    // File/IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    // =========================================================================
    // Renderer errors
    // =========================================================================
    /// The Graphviz `dot` executable could not be located
    RendererUnavailable,

    /// The renderer ran but rejected its input
    RenderFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Process exit code for a run that failed with this kind.
    ///
    /// 2 for bad input or options, 3 when Graphviz could not produce the
    /// image, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::InvalidArgument
            | ErrorKind::InvalidConfiguration
            | ErrorKind::MalformedInputRecord
            | ErrorKind::ParseFailed
            | ErrorKind::FileNotFound => 2,
            ErrorKind::RendererUnavailable | ErrorKind::RenderFailed => 3,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(
            ErrorKind::InvalidConfiguration.to_string(),
            "InvalidConfiguration"
        );
        assert_eq!(
            ErrorKind::SerializationFailure.as_str(),
            "SerializationFailure"
        );
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(ErrorKind::ParseFailed.exit_code(), 2);
        assert_eq!(ErrorKind::FileNotFound.exit_code(), 2);
        assert_eq!(ErrorKind::RenderFailed.exit_code(), 3);
        assert_eq!(ErrorKind::SerializationFailure.exit_code(), 1);
        assert_eq!(ErrorKind::IoFailed.exit_code(), 1);
    }
}
