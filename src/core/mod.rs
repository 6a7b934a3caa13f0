//! Core module - Contains the fundamental data structures and utilities
//!
//! This module provides:
//! - Source locations (positions, ranges, file identities, query kinds)
//! - Error types
//! - Output row model and rendering
//! - Path <-> file identity conversion
//! - File reading strategies
//! - Common utilities

pub mod error;
pub mod file_reader;
pub mod location;
pub mod model;
pub mod paths;
pub mod render;
pub mod util;
