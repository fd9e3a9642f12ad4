//! # sift-core
//!
//! Core types and error types for Sift.
//!
//! This crate provides the foundational types shared across all Sift crates:
//! - Validated keys for components, projects, and users
//! - Component kinds and issue attribute enums
//! - Entity structs for components, project links, and indexed issues
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod keys;
