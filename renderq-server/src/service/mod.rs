//! Service Module
//!
//! Job store and the background work that runs against it.

pub mod store;
pub mod sweeper;

pub use store::{JobStore, StoreError, SweepReport};
pub use sweeper::Sweeper;
