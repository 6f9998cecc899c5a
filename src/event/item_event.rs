// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item event type.

use chrono::Utc;
use serde::Serialize;

use crate::item::Timestamp;

/// A single item write, as seen by a listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemEvent {
    /// Identifier of the written item.
    pub item_id: String,
    /// Value before the write.
    pub old: String,
    /// Value after the write.
    pub new: String,
    /// When the event was observed.
    pub timestamp: Timestamp,
}

impl ItemEvent {
    /// Creates an event observed now.
    #[must_use]
    pub fn new(item_id: impl Into<String>, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            old: old.into(),
            new: new.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns `true` if the write changed the value.
    #[must_use]
    pub fn is_change(&self) -> bool {
        self.old != self.new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_change() {
        assert!(ItemEvent::new("a", "OFF", "ON").is_change());
        assert!(!ItemEvent::new("a", "ON", "ON").is_change());
    }

    #[test]
    fn serializes_fields() {
        let event = ItemEvent::new("boiler", "OFF", "ON");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["item_id"], "boiler");
        assert_eq!(value["old"], "OFF");
        assert_eq!(value["new"], "ON");
        assert!(value["timestamp"].is_string());
    }
}
