//! Backends module - Concrete collaborators for the match tree
//!
//! Provides:
//! - rg: ripgrep-backed location provider (references / implementations)
//! - replay: location provider answering from a recorded JSON file
//! - fs_loader: filesystem document loader

pub mod fs_loader;
pub mod replay;
pub mod rg;
