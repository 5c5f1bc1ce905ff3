pub mod error;
pub mod field_type;
pub mod value;

pub use error::*;
pub use field_type::*;
pub use value::*;
