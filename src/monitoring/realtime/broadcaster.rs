//! Room-based fan-out of realtime events

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::payload::RealtimeEvent;
use crate::config::RealtimeConfig;
use crate::monitoring::health::{AggregatedHealthStatus, StatusCache};

type Rooms = Arc<DashMap<String, broadcast::Sender<RealtimeEvent>>>;

fn prune_room(rooms: &Rooms, room: &str) {
    if rooms
        .remove_if(room, |_, sender| sender.receiver_count() == 0)
        .is_some()
    {
        debug!("Realtime room {} is empty, removed", room);
    }
}

/// Broadcasts health events to subscribers grouped by room
#[derive(Debug)]
pub struct RealtimeBroadcaster {
    rooms: Rooms,
    cache: Arc<StatusCache>,
    default_room: String,
    capacity: usize,
    next_id: AtomicU64,
    started_at: Instant,
}

impl RealtimeBroadcaster {
    /// Create a broadcaster reading initial payloads from `cache`
    pub fn new(cache: Arc<StatusCache>, config: &RealtimeConfig) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            cache,
            default_room: config.default_room.clone(),
            capacity: config.channel_capacity.max(1),
            next_id: AtomicU64::new(1),
            started_at: Instant::now(),
        }
    }

    /// Name of the room used when a client does not pick one
    pub fn default_room(&self) -> &str {
        &self.default_room
    }

    /// Join `room`, or the default room when `None`
    ///
    /// The subscription carries the trusted cached snapshot as its
    /// initial payload, or an empty healthy snapshot on cold start.
    pub fn subscribe(&self, room: Option<&str>) -> Subscription {
        let room = room.unwrap_or(&self.default_room).to_string();
        let receiver = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        let snapshot = self.cache.trusted_snapshot().unwrap_or_else(|| {
            AggregatedHealthStatus::empty(self.started_at.elapsed().as_secs())
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("Subscription {} joined room {}", id, room);

        Subscription {
            id,
            room,
            receiver: Some(receiver),
            initial: Some(RealtimeEvent::status(&snapshot)),
            rooms: Arc::clone(&self.rooms),
        }
    }

    /// Leave a room explicitly
    pub fn unsubscribe(&self, subscription: Subscription) {
        debug!(
            "Subscription {} left room {}",
            subscription.id, subscription.room
        );
        drop(subscription);
    }

    /// Send an event to one room, returning how many subscribers got it
    pub fn publish(&self, room: &str, event: RealtimeEvent) -> usize {
        let Some(sender) = self.rooms.get(room).map(|entry| entry.value().clone()) else {
            return 0;
        };
        match sender.send(event) {
            Ok(delivered) => delivered,
            Err(_) => 0,
        }
    }

    /// Send an event to the default room
    pub fn broadcast(&self, event: RealtimeEvent) -> usize {
        self.publish(&self.default_room, event)
    }

    /// Subscribers across all rooms
    pub fn subscriber_count(&self) -> usize {
        self.rooms
            .iter()
            .map(|entry| entry.value().receiver_count())
            .sum()
    }

    /// Subscribers in one room
    pub fn room_size(&self, room: &str) -> usize {
        self.rooms
            .get(room)
            .map(|entry| entry.value().receiver_count())
            .unwrap_or(0)
    }

    /// Rooms with at least one subscriber
    pub fn rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.rooms.iter().map(|entry| entry.key().clone()).collect();
        rooms.sort();
        rooms
    }
}

/// Membership of one room
///
/// Dropping the subscription releases it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    room: String,
    receiver: Option<broadcast::Receiver<RealtimeEvent>>,
    initial: Option<RealtimeEvent>,
    rooms: Rooms,
}

impl Subscription {
    /// Subscription identifier
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Room joined
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Initial `health:status` payload; `None` once taken
    pub fn take_initial(&mut self) -> Option<RealtimeEvent> {
        self.initial.take()
    }

    /// Next event, skipping any this subscriber lagged behind on
    ///
    /// Returns `None` when the room is gone.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscription {} lagged, skipped {} events",
                        self.id, skipped
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.take();
        prune_room(&self.rooms, &self.room);
    }
}
