// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item registry.
//!
//! The [`Registry`] is the composition root of the hub: every item an
//! adapter, group or timer creates is added to it, and the presentation and
//! persistence layers look items up through it.
//!
//! Global listeners registered on the registry are attached to every item
//! at the moment that item is added. A global listener registered after some
//! items were added is **not** attached to those items, so global listeners
//! should be registered (or passed to [`Registry::with_listeners`]) before
//! the first [`Registry::add`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use hasc::item::{Item, SwitchItem};
//! use hasc::registry::Registry;
//!
//! let registry = Registry::new();
//! let switch = Arc::new(SwitchItem::new("light", "Light"));
//!
//! registry.add(switch, "kitchen").unwrap();
//!
//! let item = registry.get("kitchen/light").unwrap();
//! item.set_value("ON");
//!
//! // Registering the same key again is a configuration error.
//! let again = Arc::new(SwitchItem::new("light", "Light"));
//! assert!(registry.add(again, "kitchen").is_err());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{RegistryError, Result};
use crate::item::{Item, Listener, same_listener};

/// Catalog of every item of the hub, keyed by `prefix/id`.
///
/// # Thread Safety
///
/// The item map and the global listener list each sit behind a map-wide
/// reader/writer lock. Lookups never block each other.
#[derive(Default)]
pub struct Registry {
    items: RwLock<HashMap<String, Arc<dyn Item>>>,
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
}

impl Registry {
    /// Creates an empty registry without global listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with the given global listeners.
    #[must_use]
    pub fn with_listeners<I>(listeners: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Listener>>,
    {
        let registry = Self::new();
        for listener in listeners {
            registry.add_listener(listener);
        }
        registry
    }

    /// Returns the registry key of an item: `prefix/id`, or `id` alone when
    /// `prefix` is empty.
    ///
    /// ```
    /// use hasc::registry::Registry;
    ///
    /// assert_eq!(Registry::key_for("light", "kitchen"), "kitchen/light");
    /// assert_eq!(Registry::key_for("light", ""), "light");
    /// ```
    #[must_use]
    pub fn key_for(id: &str, prefix: &str) -> String {
        if prefix.is_empty() {
            id.to_string()
        } else {
            format!("{prefix}/{id}")
        }
    }

    /// Adds a global listener, attached to every item added from now on.
    ///
    /// Items already in the registry are not affected.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) {
        let mut listeners = self.listeners.write();
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Adds `item` under `prefix` and attaches the global listeners to it.
    ///
    /// Returns the key the item was registered under.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKey`] if another item already uses
    /// the same key. The item is left untouched in that case.
    pub fn add(&self, item: Arc<dyn Item>, prefix: &str) -> Result<String> {
        let key = Self::key_for(item.id(), prefix);
        let listeners = self.listeners.read().clone();

        let mut items = self.items.write();
        if items.contains_key(&key) {
            tracing::warn!(key = %key, "Rejecting duplicate item key");
            return Err(RegistryError::DuplicateKey(key).into());
        }

        for listener in listeners {
            item.add_listener(listener);
        }
        items.insert(key.clone(), item);

        tracing::debug!(key = %key, "Item registered");
        Ok(key)
    }

    /// Returns the item registered under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<dyn Item>> {
        self.items.read().get(key).cloned()
    }

    /// Returns a snapshot of all items, in no particular order.
    #[must_use]
    pub fn items(&self) -> Vec<Arc<dyn Item>> {
        self.items.read().values().cloned().collect()
    }

    /// Returns the number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if no item is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Returns the number of global listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("item_count", &self.len())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
