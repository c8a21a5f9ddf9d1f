//! Storage layer. The engine only ever talks to the repository traits;
//! this module provides the in-process implementation backing them.

mod memory;

pub use memory::MemoryStore;
