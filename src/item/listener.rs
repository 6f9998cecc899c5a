// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Listener trait and the per-item listener set.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::Item;

/// Observer of item value changes.
///
/// Listeners are called synchronously, on the thread that called
/// `set_value`, after the item's lock has been released.
pub trait Listener: Send + Sync {
    /// Called after `item` was written, with the previous and new value.
    ///
    /// `old` and `new` may be equal: every write is notified.
    fn on_value_change(&self, item: &dyn Item, old: &str, new: &str);
}

/// Type alias for listener callbacks.
type Callback = Box<dyn Fn(&dyn Item, &str, &str) + Send + Sync>;

/// A [`Listener`] backed by a closure.
///
/// # Examples
///
/// ```
/// use hasc::item::{BaseItem, CallbackListener, Item};
///
/// let item = BaseItem::new("door");
/// item.add_listener(CallbackListener::new(|item, old, new| {
///     println!("{} changed from {old:?} to {new:?}", item.id());
/// }));
/// item.set_value("open");
/// ```
pub struct CallbackListener {
    callback: Callback,
}

impl CallbackListener {
    /// Wraps `callback` into a shareable listener.
    #[must_use]
    pub fn new<F>(callback: F) -> Arc<Self>
    where
        F: Fn(&dyn Item, &str, &str) + Send + Sync + 'static,
    {
        Arc::new(Self {
            callback: Box::new(callback),
        })
    }
}

impl Listener for CallbackListener {
    fn on_value_change(&self, item: &dyn Item, old: &str, new: &str) {
        (self.callback)(item, old, new);
    }
}

impl std::fmt::Debug for CallbackListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackListener").finish_non_exhaustive()
    }
}

/// Compares two listener handles by identity.
pub(crate) fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Insertion-ordered, de-duplicated listeners of one item.
///
/// Registration is append-only. Fan-out iterates over a copy of the list so
/// a listener may register further listeners while being notified.
#[derive(Default)]
pub(crate) struct ListenerSet {
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
    /// Held for the duration of a fan-out. Never locked, only tried.
    notifying: Mutex<()>,
}

impl ListenerSet {
    /// Appends `listener`. Returns `false` if it was already present.
    pub(crate) fn add(&self, listener: Arc<dyn Listener>) -> bool {
        let mut listeners = self.listeners.write();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Notifies every listener, unless a fan-out is already running.
    ///
    /// Returns `false` when the notification was dropped.
    pub(crate) fn notify(&self, item: &dyn Item, old: &str, new: &str) -> bool {
        let Some(_guard) = self.notifying.try_lock() else {
            tracing::trace!(item = item.id(), old, new, "Dropping nested notification");
            return false;
        };

        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener.on_value_change(item, old, new);
        }

        true
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}
