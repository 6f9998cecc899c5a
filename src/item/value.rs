// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Free-form measurement item.

use super::{BaseItem, Item};

/// An item holding a measurement or any other free-form value.
///
/// Sensors, pollers and protocol bridges publish their readings through
/// value items. The value is stored as given.
#[derive(Debug)]
pub struct ValueItem {
    base: BaseItem,
}

impl ValueItem {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            base: BaseItem::new(id)
                .with_label(label)
                .with_kind("value")
                .with_img("chart"),
        }
    }

    /// Sets the unit displayed next to the value.
    #[must_use]
    pub fn with_unit(self, unit: impl Into<String>) -> Self {
        Self {
            base: self.base.with_unit(unit),
        }
    }
}

impl Item for ValueItem {
    fn base(&self) -> &BaseItem {
        &self.base
    }
}
