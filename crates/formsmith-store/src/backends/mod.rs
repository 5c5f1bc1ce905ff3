pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
