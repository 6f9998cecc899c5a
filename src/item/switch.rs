// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary switch item.

use super::{BaseItem, Item, OFF, ON, ValueUpdate, is_on_command};

/// An item that only ever holds [`ON`] or [`OFF`].
///
/// `"on"`, `"ON"` and `"1"` switch it on; every other input switches it off.
///
/// # Examples
///
/// ```
/// use hasc::item::{Item, SwitchItem, OFF, ON};
///
/// let switch = SwitchItem::new("fan", "Fan");
/// assert_eq!(switch.value(), OFF);
///
/// switch.set_value("1");
/// assert_eq!(switch.value(), ON);
///
/// switch.set_value("whatever");
/// assert_eq!(switch.value(), OFF);
/// ```
#[derive(Debug)]
pub struct SwitchItem {
    base: BaseItem,
}

impl SwitchItem {
    /// Creates a switch the UI can toggle.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::build(id, label, "switch")
    }

    /// Creates a switch the UI only displays.
    #[must_use]
    pub fn read_only(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::build(id, label, "state")
    }

    fn build(id: impl Into<String>, label: impl Into<String>, kind: &str) -> Self {
        let base = BaseItem::new(id)
            .with_label(label)
            .with_kind(kind)
            .with_img("switch");
        base.set_value(OFF);
        Self { base }
    }
}

impl Item for SwitchItem {
    fn base(&self) -> &BaseItem {
        &self.base
    }

    fn set_value(&self, value: &str) -> ValueUpdate {
        let value = if is_on_command(value) { ON } else { OFF };
        self.base.set_value(value)
    }
}
