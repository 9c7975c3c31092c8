//! The main Error type for callvis.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::ErrorKind;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Unified error type for all callvis operations.
///
/// Display renders as `Kind at operation [key=value, ...]: message`.
pub struct Error {
    kind: ErrorKind,
    message: String,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<BoxedSource>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The most recent operation this error passed through.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Value of the first context entry named `key`.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn source_ref(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Set the operation that failed.
    ///
    /// A previously set operation moves into the context as `called`, so
    /// the chain of callers survives.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying error. Setting it twice is a bug.
    pub fn set_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(Box::new(source));
        self
    }

    /// Exit code the CLI should report for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            write!(f, " [{}]", pairs.join(", "))?;
        }

        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Error");
        out.field("kind", &self.kind)
            .field("operation", &self.operation)
            .field("message", &self.message);
        if !self.context.is_empty() {
            out.field("context", &self.context);
        }
        if let Some(source) = &self.source {
            out.field("source", source);
        }
        out.finish()
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::unexpected(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::unexpected(msg)
    }
}

// Constructors for the kinds callvis raises itself.
impl Error {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// `what` names the setting, e.g. `group` or `rankdir`.
    pub fn invalid_configuration(what: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(
            ErrorKind::InvalidConfiguration,
            format!("unrecognized {what} '{value}'"),
        )
        .with_context(what, value)
    }

    /// `index` is the 1-based record (or line) number in the input.
    pub fn malformed_record(index: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedInputRecord, message)
            .with_context("record", index.to_string())
    }

    pub fn serialization_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SerializationFailure, message)
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    pub fn renderer_unavailable(program: impl Into<String>) -> Self {
        let program = program.into();
        Self::new(
            ErrorKind::RendererUnavailable,
            format!("unable to find program '{program}', please install it or check your PATH"),
        )
        .with_context("program", program)
    }

    pub fn render_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RenderFailed, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::ParseFailed, "unexpected token");
        assert_eq!(err.kind(), ErrorKind::ParseFailed);
        assert_eq!(err.message(), "unexpected token");
        assert_eq!(err.operation(), "");
        assert!(err.context().is_empty());
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::invalid_configuration("group", "module")
            .with_operation("collect::parse_group")
            .with_operation("cli::build_options");

        assert_eq!(err.operation(), "cli::build_options");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context_value("group"), Some("module"));
        assert_eq!(err.context_value("called"), Some("collect::parse_group"));
    }

    #[test]
    fn test_display() {
        let err = Error::invalid_configuration("group", "module")
            .with_operation("collect::parse_group");
        assert_eq!(
            err.to_string(),
            "InvalidConfiguration at collect::parse_group [group=module]: unrecognized group 'module'"
        );

        let bare = Error::render_failed("");
        assert_eq!(bare.to_string(), "RenderFailed");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err = Error::from(io_err);
        assert_eq!(err.kind(), ErrorKind::FileNotFound);
        assert_eq!(err.operation(), "io");
        assert!(err.source_ref().is_some());
        assert!(StdError::source(&err).is_some());

        let err = Error::from(io::Error::other("broken pipe"));
        assert_eq!(err.kind(), ErrorKind::IoFailed);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_renderer_unavailable() {
        let err = Error::renderer_unavailable("dot");
        assert_eq!(err.kind(), ErrorKind::RendererUnavailable);
        assert!(err.message().contains("'dot'"));
        assert_eq!(err.context_value("program"), Some("dot"));
        assert_eq!(err.exit_code(), 3);
    }
}
