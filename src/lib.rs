// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `hasc` - the reactive item core of a home-automation hub.
//!
//! Device adapters (MQTT, serial, pollers), the web UI and persistence all
//! talk to the hub through **items**: named, thread-safe string values whose
//! writes are fanned out synchronously to listeners.
//!
//! # Building Blocks
//!
//! - [`item`]: the [`Item`] and [`Listener`] contracts, the plain
//!   [`BaseItem`], [`SwitchItem`] and [`ValueItem`]
//! - [`registry`]: the [`Registry`] every item is added to, which attaches
//!   global listeners to each new item
//! - [`group`]: [`GroupItem`], the OR of its members
//! - [`timer`]: [`TimerItem`], a delayed on / automatic off driver
//! - [`event`]: [`EventBus`], a broadcast listener for async consumers
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use hasc::{EventBus, GroupItem, Item, Listener, Registry, SwitchItem, TimerItem, TimerOptions};
//! use hasc::item::ON;
//!
//! #[tokio::main]
//! async fn main() -> hasc::Result<()> {
//!     // Global listeners first: they are attached to items as they are added.
//!     let bus = Arc::new(EventBus::new());
//!     let mut events = bus.subscribe();
//!     let registry = Registry::with_listeners([bus.clone() as Arc<dyn Listener>]);
//!
//!     let kitchen = Arc::new(SwitchItem::new("kitchen", "Kitchen"));
//!     let hall = Arc::new(SwitchItem::new("hall", "Hall"));
//!     let lights = GroupItem::new("lights", "Lights");
//!     lights.add(kitchen.clone());
//!     lights.add(hall.clone());
//!
//!     let hall_timer = TimerItem::new(
//!         "hall_timer",
//!         "Hall timer",
//!         hall.clone(),
//!         TimerOptions::new().with_off_after(Duration::from_secs(120)),
//!     )?;
//!
//!     registry.add(kitchen, "ground")?;
//!     registry.add(hall, "ground")?;
//!     registry.add(lights.clone(), "")?;
//!     registry.add(hall_timer, "")?;
//!
//!     registry.get("ground/kitchen").unwrap().set_value(ON);
//!     assert_eq!(lights.value(), ON);
//!
//!     // Listeners run in registration order: the group watcher was attached
//!     // to the switch before the bus, so the group event comes first.
//!     assert_eq!(events.recv().await.unwrap().item_id, "lights");
//!     assert_eq!(events.recv().await.unwrap().item_id, "kitchen");
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! `set_value` never blocks on I/O and never fails. Listeners run on the
//! caller's thread after the item's lock is released. A notification that
//! would re-enter the fan-out of the same item is dropped. The only
//! background work is one tokio task per active timer.

pub mod error;
pub mod event;
pub mod group;
pub mod item;
pub mod registry;
pub mod timer;

pub use error::{Error, RegistryError, Result};
pub use event::{EventBus, ItemEvent};
pub use group::GroupItem;
pub use item::{BaseItem, CallbackListener, Item, ItemSnapshot, Listener, SwitchItem, ValueItem};
pub use registry::Registry;
pub use timer::{TimerItem, TimerOptions};
