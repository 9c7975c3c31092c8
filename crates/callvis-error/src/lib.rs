//! # callvis-error
//!
//! Unified error handling for callvis.
//!
//! - **ErrorKind**: what went wrong (e.g. InvalidConfiguration, SerializationFailure)
//! - **Operation**: the function that failed; earlier operations stay in the
//!   context as `called`
//! - **Error Context**: key/value pairs that help locate the cause
//! - **Error Source**: the wrapped underlying error, if any
//!
//! ## Usage
//!
//! ```rust
//! use callvis_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::InvalidConfiguration, "unknown grouping token")
//!         .with_operation("collect::parse_group")
//!         .with_context("token", "module"))
//! }
//! ```
//!
//! Library crates return `callvis_error::Result<T>`. External errors are
//! wrapped with `set_source(err)`; callers further up only append context.

mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// Result type alias using callvis Error
pub type Result<T> = std::result::Result<T, Error>;
