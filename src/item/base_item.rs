// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The plain item every other item embeds.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use super::{Item, ItemSnapshot, Listener, ListenerSet, Timestamp, ValueUpdate};

/// Presentation metadata. Last writer wins.
#[derive(Debug, Clone, Default)]
struct Metadata {
    label: String,
    kind: String,
    img: String,
    unit: String,
}

/// Value and timestamps, always read and written together.
#[derive(Debug, Clone, Default)]
struct ValueState {
    value: String,
    last_value_update: Option<Timestamp>,
    last_value_change: Option<Timestamp>,
}

/// A plain observable item.
///
/// The value and both timestamps sit behind a single reader/writer lock.
/// Listeners are called after that lock is released, so a listener may read
/// or write the item it is notified about without deadlocking.
///
/// # Re-entrancy
///
/// A notification that starts while another notification of the same item
/// is still running is dropped. The write itself is applied; only its
/// fan-out is skipped. This bounds the stack when a listener writes back to
/// the item that notified it.
///
/// # Examples
///
/// ```
/// use hasc::item::{BaseItem, Item};
///
/// let item = BaseItem::new("temp").with_label("Temperature").with_unit("°C");
///
/// let update = item.set_value("21.5");
/// assert_eq!(update.old, "");
/// assert!(update.changed);
///
/// let update = item.set_value("21.5");
/// assert!(!update.changed);
/// assert!(item.last_value_change() <= item.last_value_update());
/// ```
pub struct BaseItem {
    id: String,
    metadata: RwLock<Metadata>,
    state: RwLock<ValueState>,
    listeners: ListenerSet,
}

impl BaseItem {
    /// Creates an empty item with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: RwLock::new(Metadata::default()),
            state: RwLock::new(ValueState::default()),
            listeners: ListenerSet::default(),
        }
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.metadata.get_mut().label = label.into();
        self
    }

    /// Sets the kind.
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.metadata.get_mut().kind = kind.into();
        self
    }

    /// Sets the image name.
    #[must_use]
    pub fn with_img(mut self, img: impl Into<String>) -> Self {
        self.metadata.get_mut().img = img.into();
        self
    }

    /// Sets the unit.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.metadata.get_mut().unit = unit.into();
        self
    }

    /// Returns the item identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> String {
        self.state.read().value.clone()
    }

    /// Stores `value`, then notifies every listener with `(old, value)`.
    ///
    /// Listeners are notified even when the value did not change; composite
    /// items rely on it to re-evaluate.
    pub fn set_value(&self, value: &str) -> ValueUpdate {
        let update = {
            let mut state = self.state.write();
            let now = Utc::now();

            let old = std::mem::replace(&mut state.value, value.to_string());
            let changed = old != value;

            state.last_value_update = Some(now);
            if changed {
                state.last_value_change = Some(now);
            }

            ValueUpdate { old, changed }
        };

        self.listeners.notify(self, &update.old, value);

        update
    }

    /// Returns the time of the last write.
    #[must_use]
    pub fn last_value_update(&self) -> Option<Timestamp> {
        self.state.read().last_value_update
    }

    /// Returns the time of the last write that changed the value.
    #[must_use]
    pub fn last_value_change(&self) -> Option<Timestamp> {
        self.state.read().last_value_change
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.metadata.read().label.clone()
    }

    pub fn set_label(&self, label: &str) {
        label.clone_into(&mut self.metadata.write().label);
    }

    #[must_use]
    pub fn kind(&self) -> String {
        self.metadata.read().kind.clone()
    }

    pub fn set_kind(&self, kind: &str) {
        kind.clone_into(&mut self.metadata.write().kind);
    }

    #[must_use]
    pub fn img(&self) -> String {
        self.metadata.read().img.clone()
    }

    pub fn set_img(&self, img: &str) {
        img.clone_into(&mut self.metadata.write().img);
    }

    #[must_use]
    pub fn unit(&self) -> String {
        self.metadata.read().unit.clone()
    }

    pub fn set_unit(&self, unit: &str) {
        unit.clone_into(&mut self.metadata.write().unit);
    }

    /// Adds a listener unless the same instance is already registered.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) {
        if !self.listeners.add(listener) {
            tracing::trace!(item = %self.id, "listener already registered");
        }
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns a serializable view of the item.
    #[must_use]
    pub fn snapshot(&self) -> ItemSnapshot {
        let metadata = self.metadata.read().clone();
        let state = self.state.read().clone();

        ItemSnapshot::new(
            self.id.clone(),
            metadata.kind,
            metadata.label,
            state.value,
            metadata.img,
            metadata.unit,
            state.last_value_update,
        )
    }
}

impl Item for BaseItem {
    fn base(&self) -> &BaseItem {
        self
    }
}

impl std::fmt::Debug for BaseItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseItem")
            .field("id", &self.id)
            .field("metadata", &*self.metadata.read())
            .field("state", &*self.state.read())
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}
