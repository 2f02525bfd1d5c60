//! Restoring archived buckets for search, and evicting them again
//!
//! - [`BucketThawer`] copies archived buckets overlapping a time range into
//!   the index's thaw directory
//! - [`Flusher`] deletes thawed copies that do not overlap a retained range
//!
//! Both select buckets with the same closed-interval overlap predicate, so a
//! flush with the range of an earlier thaw keeps exactly what was thawed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod factory;
pub mod flusher;
pub mod location;
pub mod settings;
pub mod thawer;

pub use error::{ThawError, ThawResult};
pub use factory::{ThawServices, ThawerFactory};
pub use flusher::Flusher;
pub use location::ThawLocationProvider;
pub use settings::{ConfiguredIndexSettings, IndexSettings};
pub use thawer::{BucketThawer, ThawFailure, ThawReport};
