//! State management module
//!
//! This module handles all application state:
//! - The coin record schema and embedded payloads (data.rs)
//! - The persistent key-value store (library.rs)
//! - The in-memory collection and its queries (collection.rs)

pub mod collection;
pub mod data;
pub mod library;
