//! Built-in router DNS store implementations

pub mod memory;

pub use memory::MemoryDnsStore;
