//! Photo and model ingestion
//!
//! This module handles:
//! - Reading picked files and embedding them as data URLs
//! - Decoding embedded photos into grid thumbnails
//! - The placeholder shown for coins without photographs

pub mod embed;
pub mod thumbnail;
