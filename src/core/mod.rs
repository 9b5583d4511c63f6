//! core
//!
//! Core domain types, path routing, and configuration for Trailhead.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Slug, Channel, Document
//! - [`paths`] - Candidate, destination, and mirror path routing
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid slugs from reaching the store
//! - Path routing is pure and deterministic

pub mod config;
pub mod paths;
pub mod types;
