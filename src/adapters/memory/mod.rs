//! In-process host: a page model for tests and the CLI simulator.

pub mod fixture;
pub mod page;
pub mod selector;
pub mod store;

pub use fixture::{NodeFixture, PageFixture};
pub use page::{MemoryPage, NodeId};
pub use store::MemoryPreferenceStore;
