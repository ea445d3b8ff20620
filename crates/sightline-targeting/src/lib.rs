//! Classification, resolution and the execution backends of sightline.
//!
//! Two [`TargetingBackend`](sightline_core::TargetingBackend) implementations
//! share the same contract:
//! - [`ObjectBackend`] works directly on the tracked GeoInfos, with an
//!   optional fork/join pass for edge flags
//! - [`EntityBackend`] mirrors candidates into a struct-of-arrays store and
//!   runs chunked jobs on its own worker pool
//!
//! Both rank with the same projection arithmetic, so for one scene state
//! they agree on the closest target.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Job signatures take a handful of parallel slices
#![allow(clippy::too_many_arguments)]

pub mod classify;
pub mod entity;
pub mod immediate;
pub mod resolve;

pub use classify::FrustumClassifier;
pub use entity::batch::BatchContext;
pub use entity::commands::{ApplyStats, Command, CommandQueue};
pub use entity::store::{EntityData, EntityStore, Span};
pub use entity::EntityBackend;
pub use immediate::ObjectBackend;
pub use resolve::TargetResolver;
