//! renderq Core
//!
//! Core types shared by the renderq server, client and CLI.
//!
//! This crate contains:
//! - Domain types: the render job record, its state vocabulary and status projection
//! - DTOs: request/response shapes used on the wire

pub mod domain;
pub mod dto;
