// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast fan-out of item writes to async consumers.

use tokio::sync::broadcast;

use super::ItemEvent;
use crate::item::{Item, Listener};

/// Events buffered per subscriber before the oldest are overwritten.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// A [`Listener`] that republishes every item write on a broadcast channel.
///
/// Register it once on the [`Registry`](crate::Registry) and every item
/// added afterwards feeds it. Websocket sessions, history writers and
/// other async consumers each [`subscribe`](Self::subscribe) and get their
/// own copy of each [`ItemEvent`].
///
/// Publishing is a non-blocking send, so the item that is being written
/// never waits on a consumer.
///
/// # Lagging consumers
///
/// Each subscriber buffers up to `capacity` events. A consumer that falls
/// further behind than that loses the oldest writes and is told how many
/// through `RecvError::Lagged`; it should resynchronise from item
/// snapshots rather than rely on the missed history.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ItemEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` item writes per subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Starts receiving the writes published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ItemEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Sends `event` to every subscriber. Dropped when nobody listens.
    pub fn publish(&self, event: ItemEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Item event dropped, no subscribers");
        }
    }
}

impl Listener for EventBus {
    fn on_value_change(&self, item: &dyn Item, old: &str, new: &str) {
        self.publish(ItemEvent::new(item.id(), old, new));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
