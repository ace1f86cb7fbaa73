//! Ripple Core - Record Types
//!
//! Pure data structures with no behavior beyond record lifecycle.
//! All other crates depend on this. This crate contains ONLY data types
//! and the error taxonomy - no caching or notification logic.

mod error;
mod record;

pub use error::{LoaderError, RippleError, RippleResult, StoreError};
pub use record::{ChangeKind, NamespaceDelta, NamespaceEvent, Record};

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
