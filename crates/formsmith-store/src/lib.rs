//! Storage for saved form snapshots.
//!
//! [`FormStore`] is the seam the builder saves through; [`MemoryStore`] and
//! [`JsonFileStore`] are the provided backends.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{JsonFileStore, MemoryStore};
pub use error::StoreError;
pub use traits::FormStore;

// Re-export for convenience
pub use formsmith_schema::SavedForm;
