// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timer configuration.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::item::{OFF, ON};

/// Keep-alive timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Timing and target states of a [`TimerItem`](super::TimerItem).
///
/// Durations are read from configuration files in milliseconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hasc::timer::TimerOptions;
///
/// // Switch the light on 2s after motion, and off 5 minutes after the last one.
/// let options = TimerOptions::new()
///     .with_on_after(Duration::from_secs(2))
///     .with_off_after(Duration::from_secs(300))
///     .with_timeout(Duration::from_millis(500));
///
/// assert_eq!(options.on_state, "ON");
///
/// let parsed: TimerOptions = serde_json::from_str(
///     r#"{"on_after_ms": 2000, "off_after_ms": 300000, "timeout_ms": 500}"#,
/// ).unwrap();
/// assert_eq!(parsed, options);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimerOptions {
    /// Delay between activation and switching the target on.
    #[serde(rename = "on_after_ms", deserialize_with = "duration_from_millis")]
    pub on_after: Duration,

    /// How long the target stays on after the last refresh.
    #[serde(rename = "off_after_ms", deserialize_with = "duration_from_millis")]
    pub off_after: Duration,

    /// Time without refresh after which an activation is considered stale.
    ///
    /// A stale activation that has not fired yet is abandoned; a fired one
    /// starts counting down.
    #[serde(rename = "timeout_ms", deserialize_with = "duration_from_millis")]
    pub timeout: Duration,

    /// Value written to the target when the timer fires.
    pub on_state: String,

    /// Value written to the target when the timer switches off.
    pub off_state: String,
}

impl TimerOptions {
    /// Creates options with the default states and timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_on_after(mut self, on_after: Duration) -> Self {
        self.on_after = on_after;
        self
    }

    #[must_use]
    pub fn with_off_after(mut self, off_after: Duration) -> Self {
        self.off_after = off_after;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_on_state(mut self, on_state: impl Into<String>) -> Self {
        self.on_state = on_state.into();
        self
    }

    #[must_use]
    pub fn with_off_state(mut self, off_state: impl Into<String>) -> Self {
        self.off_state = off_state.into();
        self
    }

    /// Replaces empty states and a zero timeout with the defaults.
    #[must_use]
    pub(crate) fn normalized(mut self) -> Self {
        if self.on_state.is_empty() {
            self.on_state = ON.to_string();
        }
        if self.off_state.is_empty() {
            self.off_state = OFF.to_string();
        }
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        self
    }
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            on_after: Duration::ZERO,
            off_after: Duration::ZERO,
            timeout: DEFAULT_TIMEOUT,
            on_state: ON.to_string(),
            off_state: OFF.to_string(),
        }
    }
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}
