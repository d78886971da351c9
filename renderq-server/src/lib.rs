//! renderq Server
//!
//! Multi-tenant render job queue: per-tenant job stores behind an auth gate,
//! served over HTTP, mirrored to a persistent backing and pruned by a
//! recurring retention sweep.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod tenant;
