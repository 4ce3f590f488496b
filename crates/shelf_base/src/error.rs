use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not use anyhow/eyre/thiserror etc?

- Better control over error handling
- No dependencies to compile and integrate
- More transparency into error handling logic
- The HTTP layer needs to tell validation and not-found apart from everything else
 */

/// Error variants that can occur in shelf operations.
/// Each variant represents a specific error category with its associated context.
#[derive(Debug)]
pub enum ErrorKind {
    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input was rejected before anything was written
    Validation { message: String },

    /// The addressed record does not exist
    NotFound { what: String },

    /// Multiple errors occurred during batch operations
    Multiple {
        errors: Vec<ShelfError>,
        count: usize,
    },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::Validation { message } => write!(f, "{}", message),
            ErrorKind::NotFound { what } => write!(f, "{} not found", what),
            ErrorKind::Multiple { errors, count } => {
                write!(f, "Multiple errors occurred ({} total)", count)?;
                if let Some(first) = errors.first() {
                    write!(f, ": {}", first)?;
                }
                Ok(())
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }
}

/* 📖 # Why separate ErrorKind and ShelfError?
This two-layer design provides a clear separation of concerns:
- ErrorKind: structural variants with specific contexts (file paths, messages, etc.)
- ShelfError: wraps ErrorKind with context strings, an optional cause and a span trace

Callers match on ErrorKind to decide on an HTTP status, while the wrapper carries
everything needed to diagnose the failure in the logs.
*/

/// Error type wrapping ErrorKind with context, cause and the span trace at creation.
pub struct ShelfError {
    kind: ErrorKind,
    context: Vec<String>,
    cause: Option<Box<ShelfError>>,
    span_trace: SpanTrace,
}

impl ShelfError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            cause: None,
            span_trace: SpanTrace::capture(),
        }
    }

    /// Creates a catch-all error with the given message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation {
            message: message.into(),
        })
    }

    /// Creates a not-found error for the named record.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound { what: what.into() })
    }

    /// Attaches context to an error.
    /// Context is displayed before the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    /// Records the error that caused this one.
    pub fn caused_by(mut self, cause: ShelfError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns a reference to the underlying ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the context strings in the order they were attached.
    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    /// Returns the span trace captured when the error was created.
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.kind, ErrorKind::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound { .. })
    }

    /// Returns the innermost error in the chain.
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, prefix: &str) -> fmt::Result {
        let children = self.context.len() + usize::from(self.cause.is_some());
        for (index, context) in self.context.iter().enumerate() {
            let connector = if index + 1 == children { "└─" } else { "├─" };
            writeln!(f, "{}{} {}", prefix, connector, context)?;
        }
        if let Some(cause) = &self.cause {
            writeln!(f, "{}└─ cause: {}", prefix, cause.kind)?;
            cause.write_tree(f, &format!("{}   ", prefix))?;
        }
        Ok(())
    }
}

impl From<ErrorKind> for ShelfError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl StdError for ShelfError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            ErrorKind::Multiple { errors, .. } => errors.first().and_then(|e| e.source()),
            _ => self
                .cause
                .as_deref()
                .map(|cause| cause as &(dyn StdError + 'static)),
        }
    }
}

impl fmt::Display for ShelfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for context in &self.context {
            write!(f, "{}: ", context)?;
        }
        write!(f, "{}", self.kind)
    }
}

/* 📖 # Why a hand-written Debug impl?
Errors end up in log lines and test failures. A tree of message, context and causes
followed by the span trace reads far better there than the derived struct dump.
*/
impl fmt::Debug for ShelfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        self.write_tree(f, "")?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/* 📖 # Why use Box<ShelfError> in the result type?

Boxing the error reduces the size of the result type, making it more efficient to return in the common case.

*/

/// Standard result type for shelf operations.
pub type ShelfResult<T> = std::result::Result<T, Box<ShelfError>>;

/// Extension trait for attaching context to Results during propagation.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> ShelfResult<T>;

    /// Attaches context using lazy evaluation.
    /// Context is only evaluated if the result is an error.
    fn with_context<F>(self, f: F) -> ShelfResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for ShelfResult<T> {
    fn context(self, context: impl Into<String>) -> ShelfResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> ShelfResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Build a boxed message error from format arguments.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        ::std::boxed::Box::new($crate::ShelfError::message(format!($($arg)*)))
    };
}

/// Return early with a boxed message error.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return ::std::result::Result::Err($crate::err!($($arg)*))
    };
}
