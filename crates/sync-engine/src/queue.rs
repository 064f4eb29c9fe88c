//! Queue state and merge rules.
//!
//! `current` is set exactly while a job executes and is never also in
//! `queue`. Items are cloned whenever they leave this structure, so callers
//! only ever hold snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use sync_core::{SyncKind, SyncQueueItem};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueueState {
    pub queue: Vec<SyncQueueItem>,
    pub current: Option<SyncQueueItem>,
}

impl SyncQueueState {
    /// Queue `names` for a partial job of `kind`.
    ///
    /// Names are merged into a queued full job of the same kind if one
    /// exists, otherwise into a queued partial job of that kind, otherwise a
    /// new item is appended. Returns the id of the item covering the names.
    pub fn enqueue(&mut self, kind: SyncKind, names: BTreeSet<String>) -> String {
        let position = self
            .queue
            .iter()
            .position(|item| item.kind == kind && item.full)
            .or_else(|| self.queue.iter().position(|item| item.kind == kind));

        match position {
            Some(i) => {
                let item = &mut self.queue[i];
                item.merge_targets(&names);
                item.id.clone()
            }
            None => {
                let item = SyncQueueItem::new(kind, names, false);
                let id = item.id.clone();
                self.queue.push(item);
                id
            }
        }
    }

    /// Queue a full job of `kind` covering `names`.
    ///
    /// An existing queued full job absorbs the names. Otherwise the new full
    /// job takes the place of a queued partial job of the same kind, merging
    /// its names.
    pub fn enqueue_full(&mut self, kind: SyncKind, names: BTreeSet<String>) -> String {
        if let Some(item) = self
            .queue
            .iter_mut()
            .find(|item| item.kind == kind && item.full)
        {
            item.merge_targets(&names);
            return item.id.clone();
        }

        let mut item = SyncQueueItem::new(kind, names, true);
        let id = item.id.clone();
        match self.queue.iter().position(|queued| queued.kind == kind) {
            Some(i) => {
                item.merge_targets(&self.queue[i].target_set);
                self.queue[i] = item;
            }
            None => self.queue.push(item),
        }
        id
    }

    /// Remove a queued item. The executing job cannot be removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.queue.len();
        self.queue.retain(|item| item.id != id);
        self.queue.len() != before
    }

    /// Move the head of the queue to `current` and return a copy of it.
    pub fn start_next(&mut self) -> Option<SyncQueueItem> {
        if self.current.is_some() || self.queue.is_empty() {
            return None;
        }
        let item = self.queue.remove(0);
        self.current = Some(item.clone());
        Some(item)
    }

    /// Clear `current`, returning its final state.
    pub fn finish_current(&mut self) -> Option<SyncQueueItem> {
        self.current.take()
    }

    /// Add `name` to the executing job if it is a full job of `kind`.
    pub fn add_to_current_full(&mut self, kind: SyncKind, name: &str) -> bool {
        match self.current.as_mut() {
            Some(item) if item.kind == kind && item.full => {
                item.target_set.insert(name.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }
}
