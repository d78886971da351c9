//! Core domain types
//!
//! The job record is owned by the server's job store and travels verbatim
//! to producers and workers. The status projection is the reduced view
//! served by the status endpoints.

pub mod job;
pub mod state;
pub mod status;
pub mod tags;
