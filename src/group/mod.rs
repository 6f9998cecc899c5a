// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Aggregate items.
//!
//! A [`GroupItem`] reflects the state of its members with an OR: it is
//! [`ON`] as soon as one member holds anything other than [`OFF`] or the
//! empty string, and [`OFF`] otherwise. Non-binary member values such as a
//! temperature reading count as "on".
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use hasc::group::GroupItem;
//! use hasc::item::{Item, SwitchItem, OFF, ON};
//!
//! let group = GroupItem::new("ground_floor", "Ground floor");
//! let kitchen = Arc::new(SwitchItem::new("kitchen", "Kitchen"));
//! let hall = Arc::new(SwitchItem::new("hall", "Hall"));
//!
//! group.add(kitchen.clone());
//! group.add(hall.clone());
//! assert_eq!(group.value(), OFF);
//!
//! hall.set_value(ON);
//! assert_eq!(group.value(), ON);
//!
//! hall.set_value(OFF);
//! assert_eq!(group.value(), OFF);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};

use crate::item::{BaseItem, Item, Listener, OFF, ON};

/// An item whose value is the OR of its members' values.
#[derive(Debug)]
pub struct GroupItem {
    base: BaseItem,
    members: RwLock<Vec<Arc<dyn Item>>>,
    /// Serializes recomputations. Reentrant for members written by the
    /// group's own listeners.
    refreshing: ReentrantMutex<()>,
    /// Subscribed to every member. Holds the group weakly.
    watcher: Arc<MemberWatcher>,
}

impl GroupItem {
    /// Creates an empty group, initially [`OFF`].
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Arc<Self> {
        let base = BaseItem::new(id)
            .with_label(label)
            .with_kind("state")
            .with_img("group");
        base.set_value(OFF);

        Arc::new_cyclic(|group| Self {
            base,
            members: RwLock::new(Vec::new()),
            refreshing: ReentrantMutex::new(()),
            watcher: Arc::new(MemberWatcher {
                group: group.clone(),
            }),
        })
    }

    /// Adds a member, subscribes to it, then recomputes the group value.
    pub fn add(&self, member: Arc<dyn Item>) {
        member.add_listener(self.watcher.clone());
        self.members.write().push(member);

        self.refresh();
    }

    /// Returns a snapshot of the members, in insertion order.
    #[must_use]
    pub fn members(&self) -> Vec<Arc<dyn Item>> {
        self.members.read().clone()
    }

    /// Recomputes the group value from the current member values.
    ///
    /// The group is only written when the computed state differs from the
    /// current one. Called automatically whenever a member is written.
    /// Concurrent recomputations run one at a time, so the last one always
    /// sees the latest member values.
    pub fn refresh(&self) {
        let _refreshing = self.refreshing.lock();

        let current = self.base.value();
        let was_off = current == OFF || current.is_empty();

        let any_on = self.members.read().iter().any(|member| {
            let value = member.value();
            value != OFF && !value.is_empty()
        });

        if any_on && was_off {
            self.switch(ON);
        } else if !any_on && !was_off {
            self.switch(OFF);
        }
    }

    fn switch(&self, value: &str) {
        tracing::info!(group = %self.base.id(), value, "Group switched");
        self.base.set_value(value);
    }
}

impl Item for GroupItem {
    fn base(&self) -> &BaseItem {
        &self.base
    }
}

/// Refreshes its group whenever a member is written.
struct MemberWatcher {
    group: Weak<GroupItem>,
}

impl Listener for MemberWatcher {
    fn on_value_change(&self, _item: &dyn Item, _old: &str, _new: &str) {
        if let Some(group) = self.group.upgrade() {
            group.refresh();
        }
    }
}

impl std::fmt::Debug for MemberWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberWatcher").finish_non_exhaustive()
    }
}
