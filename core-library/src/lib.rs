//! # Library Management Module
//!
//! Owns the user's favorites and playlists and the view of the device's audio.
//!
//! ## Overview
//!
//! This module manages:
//! - The [`Track`](models::Track) model shared by every screen
//! - Favorites and playlists persisted as JSON blobs in the host key-value store
//! - Lenient decoding: malformed blobs fall back to empty structures
//! - The permission-aware [`MediaCatalog`](catalog::MediaCatalog) with title search

pub mod catalog;
pub mod codec;
pub mod error;
pub mod models;
pub mod query;
pub mod store;

pub use catalog::MediaCatalog;
pub use error::{LibraryError, Result};
pub use models::{format_duration, Track};
pub use store::LibraryStore;
