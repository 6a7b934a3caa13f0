//! File groups and match entries
//!
//! Back-references are plain ids. The tree owns the groups, each group owns
//! its entries, and nothing else holds them.

use serde::Serialize;
use std::fmt;

use crate::core::location::{FileId, Location};
use crate::tree::document::DocumentCell;

/// Stable identity of a file group within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupId(pub(crate) u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Stable identity of a match entry within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub(crate) u32);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Anything navigation or removal can start from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeItem {
    Group(GroupId),
    Entry(EntryId),
}

impl From<GroupId> for TreeItem {
    fn from(id: GroupId) -> Self {
        TreeItem::Group(id)
    }
}

impl From<EntryId> for TreeItem {
    fn from(id: EntryId) -> Self {
        TreeItem::Entry(id)
    }
}

/// One match location, owned by a [`FileGroup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntry {
    pub(crate) id: EntryId,
    pub(crate) group: GroupId,
    pub(crate) location: Location,
}

impl MatchEntry {
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// The group this entry belongs to
    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn item(&self) -> TreeItem {
        TreeItem::Entry(self.id)
    }
}

/// All matches found in one file, in location order
#[derive(Debug)]
pub struct FileGroup {
    pub(crate) id: GroupId,
    pub(crate) file: FileId,
    pub(crate) entries: Vec<MatchEntry>,
    pub(crate) document: DocumentCell,
}

impl FileGroup {
    pub(crate) fn new(id: GroupId, file: FileId) -> Self {
        Self {
            id,
            file,
            entries: Vec::new(),
            document: DocumentCell::default(),
        }
    }

    pub(crate) fn push(&mut self, id: EntryId, location: Location) {
        self.entries.push(MatchEntry {
            id,
            group: self.id,
            location,
        });
    }

    /// Entry ids only grow along a group, so lookups can bisect
    pub(crate) fn entry_index(&self, id: EntryId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |e| e.id).ok()
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn file(&self) -> &FileId {
        &self.file
    }

    pub fn entries(&self) -> &[MatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_entry(&self) -> Option<&MatchEntry> {
        self.entries.first()
    }

    pub fn last_entry(&self) -> Option<&MatchEntry> {
        self.entries.last()
    }

    /// True once this group's document load has finished (ok or failed)
    #[allow(dead_code)]
    pub fn is_document_loaded(&self) -> bool {
        self.document.is_loaded()
    }

    pub fn item(&self) -> TreeItem {
        TreeItem::Group(self.id)
    }
}
