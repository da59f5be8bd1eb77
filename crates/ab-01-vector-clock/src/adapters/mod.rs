//! Storage adapters of the vector index.

pub mod vector_store;

pub use vector_store::VectorStore;
