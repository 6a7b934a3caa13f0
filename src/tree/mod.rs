//! Tree module - Navigable file/match tree over query results
//!
//! Provides:
//! - MatchTree: grouping, nearest match, cyclic navigation, removal
//! - FileGroup / MatchEntry nodes with id back-references
//! - Memoized document loading with one-step prefetch
//! - Change notifications
//! - The location provider seam

pub mod document;
pub mod events;
pub mod match_tree;
pub mod node;
pub mod provider;

pub use document::{preview, Document, DocumentLoader, LoadFuture, Preview};
pub use events::{SubscriptionId, TreeChange};
pub use match_tree::MatchTree;
pub use node::{EntryId, FileGroup, GroupId, MatchEntry, TreeItem};
pub use provider::{LocationFuture, LocationProvider};
