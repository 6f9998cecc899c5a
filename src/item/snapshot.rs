// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Serializable item view consumed by the presentation layer.

use chrono::Local;
use serde::Serialize;

use super::Timestamp;
use crate::error::Result;

/// Wall-clock format of [`ItemSnapshot::last_update`].
const LAST_UPDATE_FORMAT: &str = "%H:%M:%S";

/// Point-in-time view of an item.
///
/// Field names follow the JSON layout the web UI expects.
///
/// # Examples
///
/// ```
/// use hasc::item::{Item, ValueItem};
///
/// let item = ValueItem::new("power", "Power").with_unit("W");
/// item.set_value("230");
///
/// let json = item.snapshot().to_json().unwrap();
/// assert!(json.contains(r#""ID":"power""#));
/// assert!(json.contains(r#""Value":"230""#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSnapshot {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Label")]
    pub label: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Img")]
    pub img: String,
    #[serde(rename = "Unit")]
    pub unit: String,
    /// Local time of the last update as `HH:MM:SS`, empty if never written.
    #[serde(rename = "LastUpdate")]
    pub last_update: String,
}

impl ItemSnapshot {
    pub(crate) fn new(
        id: String,
        kind: String,
        label: String,
        value: String,
        img: String,
        unit: String,
        last_value_update: Option<Timestamp>,
    ) -> Self {
        let last_update = last_value_update
            .map(|ts| ts.with_timezone(&Local).format(LAST_UPDATE_FORMAT).to_string())
            .unwrap_or_default();

        Self {
            id,
            kind,
            label,
            value,
            img,
            unit,
            last_update,
        }
    }

    /// Serializes the snapshot to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
