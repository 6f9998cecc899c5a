// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for item value changes.
//!
//! This module bridges the synchronous listener fan-out to asynchronous
//! consumers (WebSocket push, persistence writers). The [`EventBus`] is a
//! [`Listener`](crate::item::Listener): registered on the
//! [`Registry`](crate::registry::Registry), it turns every item write into
//! an [`ItemEvent`] on a tokio broadcast channel.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use hasc::event::EventBus;
//! use hasc::item::{BaseItem, Item, Listener};
//! use hasc::registry::Registry;
//!
//! let bus = Arc::new(EventBus::new());
//! let mut rx = bus.subscribe();
//!
//! let registry = Registry::with_listeners([bus.clone() as Arc<dyn Listener>]);
//! let item = Arc::new(BaseItem::new("door"));
//! registry.add(item.clone(), "").unwrap();
//!
//! item.set_value("open");
//!
//! let event = rx.try_recv().unwrap();
//! assert_eq!(event.item_id, "door");
//! assert_eq!(event.new, "open");
//! ```

mod event_bus;
mod item_event;

pub use event_bus::EventBus;
pub use item_event::ItemEvent;
