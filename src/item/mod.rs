// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observable items.
//!
//! An item is a named, thread-safe string value with a bit of presentation
//! metadata. Every write goes through [`Item::set_value`], which records the
//! update time, records the change time when the value actually differs, and
//! then synchronously notifies the item's [`Listener`]s.
//!
//! All values are strings, including booleans and numbers. Binary states use
//! the [`ON`] and [`OFF`] sentinels.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use hasc::item::{BaseItem, CallbackListener, Item, ON};
//!
//! let item = BaseItem::new("porch_light").with_label("Porch");
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&calls);
//! item.add_listener(CallbackListener::new(move |_item, _old, _new| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! }));
//!
//! let update = item.set_value(ON);
//! assert!(update.changed);
//! assert_eq!(item.value(), ON);
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

mod base_item;
mod listener;
mod snapshot;
mod switch;
mod value;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use base_item::BaseItem;
pub use listener::{CallbackListener, Listener};
pub(crate) use listener::{ListenerSet, same_listener};
pub use snapshot::ItemSnapshot;
pub use switch::SwitchItem;
pub use value::ValueItem;

/// Value of a binary item that is on.
pub const ON: &str = "ON";

/// Value of a binary item that is off.
pub const OFF: &str = "OFF";

/// UTC timestamp used for `last_value_update` and `last_value_change`.
pub type Timestamp = DateTime<Utc>;

/// Returns `true` for the inputs that switch a binary item on.
///
/// ```
/// assert!(hasc::item::is_on_command("on"));
/// assert!(hasc::item::is_on_command("1"));
/// assert!(!hasc::item::is_on_command("On"));
/// ```
#[must_use]
pub fn is_on_command(value: &str) -> bool {
    matches!(value, "on" | "ON" | "1")
}

/// Outcome of a [`Item::set_value`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueUpdate {
    /// The value before the call.
    pub old: String,
    /// Whether the new value differs from the old one.
    pub changed: bool,
}

/// A named, observable value.
///
/// Implementors only provide [`Item::base`]; every other method has a default
/// that reads or writes the embedded [`BaseItem`]. Composite items (groups,
/// timers, switches) override [`Item::set_value`] to put their own semantics
/// in front of the plain write.
///
/// Listeners are notified with the embedded [`BaseItem`], which carries the
/// same id and value as the composite item.
pub trait Item: Send + Sync {
    /// Returns the plain item holding this item's state.
    fn base(&self) -> &BaseItem;

    /// Returns the item identifier.
    fn id(&self) -> &str {
        self.base().id()
    }

    /// Returns the current value.
    fn value(&self) -> String {
        self.base().value()
    }

    /// Sets the value and notifies listeners, whether or not it changed.
    fn set_value(&self, value: &str) -> ValueUpdate {
        self.base().set_value(value)
    }

    /// Returns the display label.
    fn label(&self) -> String {
        self.base().label()
    }

    /// Sets the display label.
    fn set_label(&self, label: &str) {
        self.base().set_label(label);
    }

    /// Returns the free-form item kind ("value", "switch", "state", ...).
    fn kind(&self) -> String {
        self.base().kind()
    }

    /// Sets the item kind.
    fn set_kind(&self, kind: &str) {
        self.base().set_kind(kind);
    }

    /// Returns the image name used by the presentation layer.
    fn img(&self) -> String {
        self.base().img()
    }

    /// Sets the image name.
    fn set_img(&self, img: &str) {
        self.base().set_img(img);
    }

    /// Returns the unit of the value, empty when unitless.
    fn unit(&self) -> String {
        self.base().unit()
    }

    /// Sets the unit.
    fn set_unit(&self, unit: &str) {
        self.base().set_unit(unit);
    }

    /// Returns the time of the last `set_value` call, if any.
    fn last_value_update(&self) -> Option<Timestamp> {
        self.base().last_value_update()
    }

    /// Returns the time of the last `set_value` call that changed the value.
    fn last_value_change(&self) -> Option<Timestamp> {
        self.base().last_value_change()
    }

    /// Adds a listener. Adding the same listener twice is a no-op.
    fn add_listener(&self, listener: Arc<dyn Listener>) {
        self.base().add_listener(listener);
    }

    /// Returns a serializable point-in-time view of the item.
    fn snapshot(&self) -> ItemSnapshot {
        self.base().snapshot()
    }
}

impl std::fmt::Debug for dyn Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id())
            .field("value", &self.value())
            .finish()
    }
}
