//! Data Transfer Objects
//!
//! Response shapes that are not the job record itself.

pub mod job;
