//! Store adapters - implementations of the [`ProjectStore`] port.
//!
//! [`ProjectStore`]: crate::ports::ProjectStore

mod memory;
mod postgres;

pub use memory::{InMemoryProjectStore, NullProjectStore};
pub use postgres::PgProjectStore;
