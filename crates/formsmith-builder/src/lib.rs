//! Editing and previewing forms.
//!
//! [`FormBuilder`] holds the form being designed and saves snapshots through a
//! [`FormStore`](formsmith_store::FormStore). [`PreviewSession`] fills in a
//! form: it keeps derived values current and validates on submit.

mod clock;
pub mod builder;
pub mod error;
pub mod preview;

pub use builder::{BuilderConfig, FieldPatch, FormBuilder};
pub use error::BuilderError;
pub use preview::PreviewSession;

// Re-export for convenience
pub use formsmith_common::{FieldType, FieldValue};
pub use formsmith_eval::{DeterministicMode, EvalConfig};
