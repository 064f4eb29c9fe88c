//! Observable run and queue state.
//!
//! The hub holds the migration state of the running job and the queue state.
//! Subscribers are called synchronously with an immutable snapshot after
//! every change on their channel. A failing or panicking subscriber is logged
//! and does not affect the others.

use crate::queue::SyncQueueState;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use sync_core::MigrationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Migration,
    Queue,
    All,
}

impl Channel {
    fn receives(&self, changed: Channel) -> bool {
        *self == Channel::All || *self == changed
    }
}

/// Snapshot handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubState {
    pub migration: MigrationState,
    pub queue: SyncQueueState,
}

type Callback = Arc<dyn Fn(&HubState) -> anyhow::Result<()> + Send + Sync>;

struct Subscriber {
    id: u64,
    channel: Channel,
    callback: Callback,
}

#[derive(Default)]
struct Inner {
    state: HubState,
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

#[derive(Default)]
pub struct StateHub {
    inner: Mutex<Inner>,
}

impl StateHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> HubState {
        self.lock().state.clone()
    }

    pub fn migration(&self) -> MigrationState {
        self.lock().state.migration.clone()
    }

    pub fn queue(&self) -> SyncQueueState {
        self.lock().state.queue.clone()
    }

    /// Register `callback` for `channel` and call it once with the current
    /// state. The callback stays registered until the returned handle is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(self: &Arc<Self>, channel: Channel, callback: F) -> Subscription
    where
        F: Fn(&HubState) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(callback);
        let (id, snapshot) = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                channel,
                callback: callback.clone(),
            });
            (id, inner.state.clone())
        };
        invoke(id, &callback, &snapshot);

        Subscription {
            hub: Arc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.lock().subscribers.retain(|s| s.id != id);
    }

    /// Mutate the migration state and notify `Migration` and `All`
    /// subscribers.
    pub fn update_migration<R>(&self, update: impl FnOnce(&mut MigrationState) -> R) -> R {
        self.update(Channel::Migration, |state| update(&mut state.migration))
    }

    /// Mutate the queue state and notify `Queue` and `All` subscribers.
    pub fn update_queue<R>(&self, update: impl FnOnce(&mut SyncQueueState) -> R) -> R {
        self.update(Channel::Queue, |state| update(&mut state.queue))
    }

    fn update<R>(&self, channel: Channel, update: impl FnOnce(&mut HubState) -> R) -> R {
        let (result, snapshot, callbacks) = {
            let mut inner = self.lock();
            let result = update(&mut inner.state);
            let callbacks: Vec<(u64, Callback)> = inner
                .subscribers
                .iter()
                .filter(|s| s.channel.receives(channel))
                .map(|s| (s.id, s.callback.clone()))
                .collect();
            (result, inner.state.clone(), callbacks)
        };

        for (id, callback) in &callbacks {
            invoke(*id, callback, &snapshot);
        }
        result
    }
}

fn invoke(id: u64, callback: &Callback, snapshot: &HubState) {
    match catch_unwind(AssertUnwindSafe(|| callback(snapshot))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("State subscriber {id} failed: {e:#}"),
        Err(_) => tracing::error!("State subscriber {id} panicked"),
    }
}

/// Registration handle returned by [`StateHub::subscribe`].
pub struct Subscription {
    hub: Weak<StateHub>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use sync_core::{SyncKind, SyncProgress, SyncStatus};

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn test_subscribe_receives_current_state_immediately() {
        let hub = StateHub::new();
        hub.update_migration(|m| m.running = true);

        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let _sub = hub.subscribe(Channel::Migration, move |state| {
            *sink.lock().unwrap() = Some(state.migration.running);
            Ok(())
        });
        assert_eq!(*seen.lock().unwrap(), Some(true));
    }

    #[test]
    fn test_channels_filter_notifications() {
        let hub = StateHub::new();
        let migration = counter();
        let queue = counter();
        let all = counter();

        let subs = [
            (Channel::Migration, migration.clone()),
            (Channel::Queue, queue.clone()),
            (Channel::All, all.clone()),
        ]
        .into_iter()
        .map(|(channel, count)| {
            hub.subscribe(channel, move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
        .collect::<Vec<_>>();

        hub.update_migration(|m| {
            m.progress = Some(SyncProgress::new(SyncStatus::Scanning, 0, 3))
        });
        hub.update_queue(|q| q.enqueue(SyncKind::Label, Default::default()));

        // One immediate call each, then one per matching update.
        assert_eq!(migration.load(Ordering::SeqCst), 2);
        assert_eq!(queue.load(Ordering::SeqCst), 2);
        assert_eq!(all.load(Ordering::SeqCst), 3);
        drop(subs);
    }

    #[test]
    fn test_failing_subscribers_do_not_block_others() {
        let hub = StateHub::new();
        let calls = counter();

        let _err = hub.subscribe(Channel::All, |_| anyhow::bail!("subscriber error"));
        let _panic = hub.subscribe(Channel::All, |state| {
            if state.migration.running {
                panic!("subscriber panic");
            }
            Ok(())
        });
        let count = calls.clone();
        let _ok = hub.subscribe(Channel::All, move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        hub.update_migration(|m| m.running = true);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(hub.migration().running);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let hub = StateHub::new();
        let calls = counter();
        let count = calls.clone();
        let sub = hub.subscribe(Channel::Queue, move |_| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        sub.unsubscribe();

        hub.update_queue(|q| q.enqueue(SyncKind::Label, Default::default()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_update_returns_closure_result() {
        let hub = StateHub::new();
        let id = hub.update_queue(|q| q.enqueue(SyncKind::Relationship, Default::default()));
        assert_eq!(hub.queue().queue[0].id, id);
    }
}
