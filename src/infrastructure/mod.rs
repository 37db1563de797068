//! Storage adapters implementing the `domain::ports` contracts.

pub mod in_memory;

#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
