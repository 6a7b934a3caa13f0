//! Change notifications
//!
//! Listeners are called synchronously, in mutation order, one call per
//! change.

use std::fmt;

use crate::tree::node::GroupId;

/// What changed in a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeChange {
    /// A group was added or removed
    Structural,
    /// The entries of one group changed
    GroupChanged(GroupId),
}

/// Handle returned by `on_change`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&TreeChange) + Send + Sync>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

impl Listeners {
    pub(crate) fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sid, _)| *sid != id);
        self.entries.len() != before
    }

    pub(crate) fn emit(&mut self, change: TreeChange) {
        for (_, listener) in self.entries.iter_mut() {
            listener(&change);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.len())
            .finish()
    }
}
