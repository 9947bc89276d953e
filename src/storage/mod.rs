//! Storage layer abstraction.
//!
//! The exporter only reads from the document store, through
//! [`DocumentStore`]. Two backends are provided:
//! - [`InMemoryDocumentStore`]: seeded programmatically (tests, embedding)
//! - snapshot loader: fills an in-memory store from a JSON dump of the store

pub mod memory;
pub mod snapshot;
pub mod traits;

pub use memory::InMemoryDocumentStore;
pub use snapshot::{load_snapshot, load_snapshot_from_reader};
pub use traits::DocumentStore;
