//! Connection registry and event fan-out.
//!
//! Every connection owns a bounded queue; publishing pushes onto those
//! queues and never awaits a client. A full queue loses that one event for
//! that one connection, a closed queue gets the connection unregistered.
//! Rooms are keyed by thread id and hold connection ids, never references.

use crate::protocol::ServerMessage;
use crate::types::{ConnectionId, ThreadId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

/// Events buffered per connection before new ones are dropped for it
pub const CONNECTION_QUEUE_CAPACITY: usize = 256;

pub type EventSender = mpsc::Sender<ServerMessage>;
pub type EventReceiver = mpsc::Receiver<ServerMessage>;

/// Returned by [`Hub::connect`]: the handle plus the connection's event queue
#[derive(Debug)]
pub struct Subscription {
    pub id: ConnectionId,
    pub events: EventReceiver,
}

/// Delivery counters, snapshot of the atomics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HubStats {
    pub messages_sent: u64,
    pub messages_dropped: u64,
    pub active_connections: usize,
    pub active_rooms: usize,
}

#[derive(Default)]
struct AtomicHubStats {
    messages_sent: AtomicU64,
    messages_dropped: AtomicU64,
}

#[derive(Default)]
struct Membership {
    connections: HashMap<ConnectionId, EventSender>,
    rooms: HashMap<ThreadId, HashSet<ConnectionId>>,
    /// Reverse index so disconnect doesn't scan every room
    joined: HashMap<ConnectionId, HashSet<ThreadId>>,
}

impl Membership {
    fn remove_connection(&mut self, id: &ConnectionId) -> bool {
        let existed = self.connections.remove(id).is_some();

        if let Some(threads) = self.joined.remove(id) {
            for thread_id in threads {
                self.remove_from_room(&thread_id, id);
            }
        }

        existed
    }

    fn remove_from_room(&mut self, thread_id: &str, id: &ConnectionId) -> bool {
        let Some(members) = self.rooms.get_mut(thread_id) else {
            return false;
        };
        let removed = members.remove(id);
        if members.is_empty() {
            self.rooms.remove(thread_id);
        }
        removed
    }
}

/// Shared broadcast hub. Cheap to clone.
#[derive(Clone, Default)]
pub struct Hub {
    membership: Arc<RwLock<Membership>>,
    stats: Arc<AtomicHubStats>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection. It receives global events from now on.
    pub async fn connect(&self) -> Subscription {
        let id = ulid::Ulid::new();
        let (tx, rx) = mpsc::channel(CONNECTION_QUEUE_CAPACITY);

        self.membership.write().await.connections.insert(id, tx);
        tracing::debug!(connection = %id, "Connection registered");

        Subscription { id, events: rx }
    }

    /// Add a connection to a thread's room.
    /// Returns true if the membership is new. Unknown connections are ignored.
    pub async fn join(&self, id: &ConnectionId, thread_id: &str) -> bool {
        let mut membership = self.membership.write().await;
        if !membership.connections.contains_key(id) {
            tracing::debug!(connection = %id, thread_id, "Join from unknown connection ignored");
            return false;
        }

        membership
            .joined
            .entry(*id)
            .or_default()
            .insert(thread_id.to_string());
        let added = membership
            .rooms
            .entry(thread_id.to_string())
            .or_default()
            .insert(*id);

        if added {
            tracing::debug!(connection = %id, thread_id, "Joined room");
        }
        added
    }

    /// Remove a connection from a thread's room. No-op if not a member.
    pub async fn leave(&self, id: &ConnectionId, thread_id: &str) -> bool {
        let mut membership = self.membership.write().await;

        if let Some(threads) = membership.joined.get_mut(id) {
            threads.remove(thread_id);
            if threads.is_empty() {
                membership.joined.remove(id);
            }
        }
        let removed = membership.remove_from_room(thread_id, id);

        if removed {
            tracing::debug!(connection = %id, thread_id, "Left room");
        }
        removed
    }

    /// Drop a connection from every room and from global delivery
    pub async fn disconnect(&self, id: &ConnectionId) -> bool {
        let removed = self.membership.write().await.remove_connection(id);
        if removed {
            tracing::debug!(connection = %id, "Connection unregistered");
        }
        removed
    }

    /// Deliver to every connected client. Returns how many queues accepted it.
    pub async fn publish_global(&self, msg: ServerMessage) -> usize {
        let (delivered, dead) = {
            let membership = self.membership.read().await;
            self.fan_out(membership.connections.iter(), &msg)
        };

        tracing::debug!(kind = msg.kind(), delivered, "Published global event");
        self.prune(dead).await;
        delivered
    }

    /// Deliver only to connections currently joined to `thread_id`
    pub async fn publish_to_room(&self, thread_id: &str, msg: ServerMessage) -> usize {
        let (delivered, dead) = {
            let membership = self.membership.read().await;
            match membership.rooms.get(thread_id) {
                Some(members) => self.fan_out(
                    members
                        .iter()
                        .filter_map(|id| membership.connections.get_key_value(id)),
                    &msg,
                ),
                None => (0, Vec::new()),
            }
        };

        tracing::debug!(kind = msg.kind(), thread_id, delivered, "Published room event");
        self.prune(dead).await;
        delivered
    }

    /// Push onto each queue. Full and closed queues both count as dropped;
    /// only closed ones are reported back for pruning.
    fn fan_out<'a>(
        &self,
        targets: impl Iterator<Item = (&'a ConnectionId, &'a EventSender)>,
        msg: &ServerMessage,
    ) -> (usize, Vec<ConnectionId>) {
        let mut delivered = 0;
        let mut dropped = 0;
        let mut dead = Vec::new();

        for (id, tx) in targets {
            match tx.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(connection = %id, kind = msg.kind(), "Queue full, dropped event");
                    dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(connection = %id, kind = msg.kind(), "Dropped event for closed connection");
                    dropped += 1;
                    dead.push(*id);
                }
            }
        }

        self.stats
            .messages_sent
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.stats
            .messages_dropped
            .fetch_add(dropped, Ordering::Relaxed);

        (delivered, dead)
    }

    async fn prune(&self, dead: Vec<ConnectionId>) {
        if dead.is_empty() {
            return;
        }
        let mut membership = self.membership.write().await;
        for id in &dead {
            membership.remove_connection(id);
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.membership.read().await.connections.len()
    }

    pub async fn room_size(&self, thread_id: &str) -> usize {
        self.membership
            .read()
            .await
            .rooms
            .get(thread_id)
            .map_or(0, HashSet::len)
    }

    /// Thread ids a connection is currently joined to
    pub async fn rooms_of(&self, id: &ConnectionId) -> Vec<ThreadId> {
        let mut rooms: Vec<ThreadId> = self
            .membership
            .read()
            .await
            .joined
            .get(id)
            .map(|threads| threads.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    pub async fn stats(&self) -> HubStats {
        let membership = self.membership.read().await;
        HubStats {
            messages_sent: self.stats.messages_sent.load(Ordering::Relaxed),
            messages_dropped: self.stats.messages_dropped.load(Ordering::Relaxed),
            active_connections: membership.connections.len(),
            active_rooms: membership.rooms.len(),
        }
    }
}
