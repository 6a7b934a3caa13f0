//! The match tree
//!
//! Groups a flat list of locations by file, keeps both levels sorted, and
//! answers the navigation questions a results view asks: where to land
//! first, what comes next or before, and what is left after a removal.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::core::error::{LoadError, TreeError};
use crate::core::location::{FileId, Location, Position, QueryKind, TextRange};
use crate::tree::document::{preview, Document, DocumentLoader};
use crate::tree::events::{Listeners, SubscriptionId, TreeChange};
use crate::tree::node::{EntryId, FileGroup, GroupId, MatchEntry, TreeItem};
use crate::tree::provider::LocationProvider;

pub struct MatchTree {
    kind: QueryKind,
    origin: FileId,
    position: Position,
    groups: Vec<FileGroup>,
    loader: Arc<dyn DocumentLoader>,
    listeners: Listeners,
}

impl MatchTree {
    /// Query `provider` once and build a tree from its answer.
    ///
    /// `Ok(None)` when the provider has no result for this position; an
    /// empty answer still yields a (empty) tree.
    pub async fn create(
        provider: &dyn LocationProvider,
        loader: Arc<dyn DocumentLoader>,
        file: FileId,
        position: Position,
        kind: QueryKind,
    ) -> Result<Option<Self>, TreeError> {
        let Some(locations) = provider.locations(&file, position, kind).await? else {
            debug!(provider = provider.name(), %kind, %file, "provider returned no result");
            return Ok(None);
        };
        Ok(Some(Self::from_locations(
            kind, file, position, locations, loader,
        )))
    }

    /// Build a tree from already collected locations
    pub fn from_locations(
        kind: QueryKind,
        origin: FileId,
        position: Position,
        mut locations: Vec<Location>,
        loader: Arc<dyn DocumentLoader>,
    ) -> Self {
        // sort_by is stable: exact ties keep their input order
        locations.sort_by(|a, b| a.tree_order(b));

        let count = locations.len();
        let mut groups: Vec<FileGroup> = Vec::new();
        for (n, location) in locations.into_iter().enumerate() {
            let entry_id = EntryId(n as u32);
            match groups.last_mut() {
                Some(group) if group.file == location.file => group.push(entry_id, location),
                _ => {
                    let mut group =
                        FileGroup::new(GroupId(groups.len() as u32), location.file.clone());
                    group.push(entry_id, location);
                    groups.push(group);
                }
            }
        }
        debug!(%kind, %origin, locations = count, files = groups.len(), "built match tree");

        Self {
            kind,
            origin,
            position,
            groups,
            loader,
            listeners: Listeners::default(),
        }
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// File the query was issued from
    pub fn origin(&self) -> &FileId {
        &self.origin
    }

    /// Cursor position the query was issued from
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn groups(&self) -> &[FileGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of entries across all groups
    pub fn total(&self) -> usize {
        self.groups.iter().map(FileGroup::len).sum()
    }

    #[allow(dead_code)]
    pub fn group(&self, id: GroupId) -> Option<&FileGroup> {
        self.group_index(id).map(|i| &self.groups[i])
    }

    #[allow(dead_code)]
    pub fn entry(&self, id: EntryId) -> Option<&MatchEntry> {
        self.locate_entry(id)
            .map(|(gi, ei)| &self.groups[gi].entries[ei])
    }

    /// The group for `file`, if it has any matches
    pub fn group_of(&self, file: &FileId) -> Option<&FileGroup> {
        self.groups
            .binary_search_by(|g| g.file.cmp(file))
            .ok()
            .map(|i| &self.groups[i])
    }

    fn group_index(&self, id: GroupId) -> Option<usize> {
        self.groups.binary_search_by_key(&id, |g| g.id).ok()
    }

    fn locate_entry(&self, id: EntryId) -> Option<(usize, usize)> {
        // Entry ids grow in tree order and no attached group is empty, so the
        // owner is the last group whose first id is not past `id`.
        let gi = self
            .groups
            .partition_point(|g| g.entries.first().is_some_and(|e| e.id <= id))
            .checked_sub(1)?;
        let ei = self.groups[gi].entry_index(id)?;
        Some((gi, ei))
    }

    /// Entry to land on right after the query.
    ///
    /// In the origin file: the match under the cursor, else the first match
    /// ending after it, else the last one before it. Without matches in the
    /// origin file: the first match of the file whose identity shares the
    /// longest prefix with the origin (earliest file wins ties).
    pub fn first(&self) -> Option<&MatchEntry> {
        if let Some(group) = self.group_of(&self.origin) {
            let entries = &group.entries;
            if let Some(hit) = entries
                .iter()
                .find(|e| e.location.range.contains(&self.position))
            {
                return Some(hit);
            }
            if let Some(after) = entries
                .iter()
                .find(|e| e.location.range.end.is_after(&self.position))
            {
                return Some(after);
            }
            if let Some(last) = entries.last() {
                return Some(last);
            }
        }

        let mut best: Option<(&FileGroup, usize)> = None;
        for group in &self.groups {
            let score = group.file.common_prefix_len(&self.origin);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((group, score));
            }
        }
        best.and_then(|(group, _)| group.entries.first())
    }

    /// Cyclic navigation.
    ///
    /// From a group: first entry of the next group or last entry of the
    /// previous one. From an entry: the neighbouring entry, wrapping through
    /// to the next or previous group at the edges. `None` for an empty tree
    /// or an item that is no longer attached.
    pub fn move_from(&self, item: TreeItem, forward: bool) -> Option<&MatchEntry> {
        match item {
            TreeItem::Group(id) => self.step_group(self.group_index(id)?, forward),
            TreeItem::Entry(id) => {
                let (gi, ei) = self.locate_entry(id)?;
                let entries = &self.groups[gi].entries;
                if forward && ei + 1 < entries.len() {
                    return entries.get(ei + 1);
                }
                if !forward && ei > 0 {
                    return entries.get(ei - 1);
                }
                self.step_group(gi, forward)
            }
        }
    }

    fn step_group(&self, gi: usize, forward: bool) -> Option<&MatchEntry> {
        let n = self.groups.len();
        if n == 0 {
            return None;
        }
        let target = if forward { (gi + 1) % n } else { (gi + n - 1) % n };
        let group = &self.groups[target];
        if forward {
            group.first_entry()
        } else {
            group.last_entry()
        }
    }

    /// Detach a group or an entry and notify listeners.
    ///
    /// Removing the last entry of a group removes the group too. Items that
    /// are not attached are ignored; returns whether anything was removed.
    pub fn remove(&mut self, item: TreeItem) -> bool {
        match item {
            TreeItem::Group(id) => {
                let Some(gi) = self.group_index(id) else {
                    return false;
                };
                let group = self.groups.remove(gi);
                debug!(file = %group.file, entries = group.len(), "removed group");
                self.listeners.emit(TreeChange::Structural);
            }
            TreeItem::Entry(id) => {
                let Some((gi, ei)) = self.locate_entry(id) else {
                    return false;
                };
                let group = &mut self.groups[gi];
                group.entries.remove(ei);
                if group.entries.is_empty() {
                    let group = self.groups.remove(gi);
                    debug!(file = %group.file, "removed last entry, dropping group");
                    self.listeners.emit(TreeChange::Structural);
                } else {
                    let group_id = group.id;
                    debug!(file = %group.file, remaining = group.len(), "removed entry");
                    self.listeners.emit(TreeChange::GroupChanged(group_id));
                }
            }
        }
        true
    }

    /// Subscribe to change notifications
    pub fn on_change<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&TreeChange) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Box::new(listener))
    }

    #[allow(dead_code)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Text of a group's file, loaded once and then shared.
    ///
    /// With `prefetch_next`, a successful load also starts loading the group
    /// forward navigation reaches next, in the background.
    pub async fn document(
        &self,
        group: GroupId,
        prefetch_next: bool,
    ) -> Result<Arc<Document>, LoadError> {
        let gi = self
            .group_index(group)
            .ok_or_else(|| LoadError::Detached(group.to_string()))?;
        let target = &self.groups[gi];
        let document = target.document.get(&self.loader, &target.file).await?;

        if prefetch_next {
            self.prefetch_after(gi);
        }
        Ok(document)
    }

    fn prefetch_after(&self, gi: usize) {
        let Some(next) = self.step_group(gi, true) else {
            return;
        };
        let Some(ni) = self.group_index(next.group) else {
            return;
        };
        if ni == gi {
            return;
        }
        let group = &self.groups[ni];
        if group
            .document
            .prefetch(self.loader.clone(), group.file.clone())
        {
            debug!(file = %group.file, "prefetching next document");
        }
    }

    /// Ranges of all matches in `file`, for highlighting in an editor
    #[allow(dead_code)]
    pub fn highlights(&self, file: &FileId) -> Vec<TextRange> {
        self.group_of(file)
            .map(|g| g.entries.iter().map(|e| e.location.range).collect())
            .unwrap_or_default()
    }

    /// One-line description such as "3 results in 2 files"
    pub fn summary(&self) -> String {
        let total = self.total();
        if total == 0 {
            return "No results.".to_string();
        }
        let files = self.groups.len();
        format!(
            "{} {} in {} {}",
            total,
            if total == 1 { "result" } else { "results" },
            files,
            if files == 1 { "file" } else { "files" }
        )
    }

    /// Plain-text listing of the tree for the clipboard.
    ///
    /// Entries whose group has a document in `documents` get a preview.
    pub fn copy_text(&self, documents: &HashMap<GroupId, Arc<Document>>) -> String {
        let mut out = String::new();
        for group in &self.groups {
            out.push_str(group.file.as_str());
            out.push('\n');
            let document = documents.get(&group.id);
            for entry in &group.entries {
                let start = entry.location.range.start;
                out.push_str(&format!("  {}, {}", start.line + 1, start.character + 1));
                if let Some(document) = document {
                    out.push_str(": ");
                    out.push_str(preview(document, &entry.location.range).to_string().trim());
                }
                out.push('\n');
            }
        }
        out
    }
}

impl fmt::Debug for MatchTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchTree")
            .field("kind", &self.kind)
            .field("origin", &self.origin)
            .field("position", &self.position)
            .field("groups", &self.groups)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
