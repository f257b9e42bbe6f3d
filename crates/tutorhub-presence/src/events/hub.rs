//! In-process pub/sub of room events.

use std::collections::HashMap;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use super::types::RoomEvent;

/// Room name → broadcast channel of that room's events.
#[derive(Debug)]
pub struct RoomEventHub {
    /// Room name → broadcast sender
    channels: RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>,
    /// Buffer size for channels
    buffer_size: usize,
}

impl RoomEventHub {
    /// Create a hub whose per-room channels hold `buffer_size` events.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Publish an event to its room. Rooms with no subscribers are skipped
    /// and their channel is released.
    pub async fn publish(&self, event: RoomEvent) {
        let delivered = {
            let channels = self.channels.read().await;
            match channels.get(event.room()) {
                Some(tx) => tx.send(event.clone()).is_ok(),
                None => return,
            }
        };

        if !delivered {
            let mut channels = self.channels.write().await;
            if channels
                .get(event.room())
                .is_some_and(|tx| tx.receiver_count() == 0)
            {
                channels.remove(event.room());
                debug!(room = %event.room(), "Released idle room channel");
            }
        }
    }

    /// Subscribe to a room.
    pub async fn subscribe(&self, room: &str) -> RoomSubscription {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        RoomSubscription {
            room: room.to_string(),
            rx: tx.subscribe(),
        }
    }

    /// Number of rooms that currently have a channel.
    pub async fn room_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

/// Receiving end of a room subscription.
#[derive(Debug)]
pub struct RoomSubscription {
    room: String,
    rx: broadcast::Receiver<RoomEvent>,
}

impl RoomSubscription {
    /// Room this subscription listens to.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Next event, or `None` once the hub is gone.
    ///
    /// A lagging subscriber gets a single [`RoomEvent::Resync`] in place of
    /// the events it missed.
    pub async fn recv(&mut self) -> Option<RoomEvent> {
        match self.rx.recv().await {
            Ok(event) => Some(event),
            Err(RecvError::Lagged(skipped)) => {
                debug!(room = %self.room, skipped, "Room subscriber lagged");
                Some(RoomEvent::Resync {
                    room: self.room.clone(),
                })
            }
            Err(RecvError::Closed) => None,
        }
    }

    /// Convert into a boxed stream of events.
    pub fn into_stream(self) -> BoxStream<'static, RoomEvent> {
        stream::unfold(self, |mut sub| async move {
            let event = sub.recv().await?;
            Some((event, sub))
        })
        .boxed()
    }
}
