// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Monotonic per-customer timestamp assignment.
//!
//! Message timestamps double as the sort key inside a customer's partition,
//! so two messages for the same customer must never share one. Wall-clock
//! reads are clamped to be strictly greater than the last stamp issued for
//! that customer; ties advance by one microsecond. The dashmap entry lock
//! serializes assignment per customer and is held only for the in-memory
//! clamp, never across I/O.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Issues strictly increasing ISO-8601 timestamps per customer.
#[derive(Debug, Default)]
pub struct MessageClock {
    last_micros: DashMap<String, i64>,
}

impl MessageClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this clock has issued or observed a stamp for `customer_id`.
    ///
    /// A fresh process seeds the floor from the stored log before the first
    /// append so a backwards wall clock cannot collide with persisted rows.
    pub fn is_seeded(&self, customer_id: &str) -> bool {
        self.last_micros.contains_key(customer_id)
    }

    /// Raise the customer's floor to at least `micros`.
    pub fn observe(&self, customer_id: &str, micros: i64) {
        let mut entry = self
            .last_micros
            .entry(customer_id.to_string())
            .or_insert(0);
        if micros > *entry {
            *entry = micros;
        }
    }

    /// Issue the next timestamp for `customer_id`, strictly greater than
    /// every stamp issued or observed for it so far.
    pub fn next_stamp(&self, customer_id: &str) -> String {
        let now = Utc::now().timestamp_micros();
        let mut entry = self
            .last_micros
            .entry(customer_id.to_string())
            .or_insert(0);
        let stamp = now.max(*entry + 1);
        *entry = stamp;
        format_stamp(stamp)
    }
}

/// Render microseconds-since-epoch as a fixed-width ISO-8601 string.
///
/// Fixed fractional width keeps lexicographic order identical to numeric
/// order, which the message table's sort key relies on.
pub fn format_stamp(micros: i64) -> String {
    // In range for any clock-derived value; epoch fallback is unreachable.
    let dt = DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or_default();
    dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Parse a stored stamp back to microseconds-since-epoch.
pub fn parse_stamp(stamp: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(stamp)
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp_micros())
}
