// src/core/slots/resource_slot.rs

//! Resource-slot accounting (spec.md §4.1, component C1).
//!
//! A `ResourceSlot` is a mapping from slot name to a non-negative decimal
//! with six fractional digits of precision, so that both very large byte
//! counts (>= 1 TiB) and fractional counts (0.5 CPU) are representable
//! exactly — the Rust analogue of the source's `NUMERIC(24,6)` columns
//! (spec.md §3.1, §8).

use crate::core::errors::CoreError;
use rust_decimal::Decimal;
use rust_decimal::prelude::Zero;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

/// The six-decimal-digit scale every `ResourceSlot` value is rescaled to,
/// matching the source's `NUMERIC(24,6)` columns.
const SLOT_SCALE: u32 = 6;

/// A named, typed capacity dimension: "count" units (e.g. `cpu`,
/// `cuda.device`) or "bytes" units (e.g. `mem`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SlotType {
    Count,
    Bytes,
}

fn rescale(mut d: Decimal) -> Decimal {
    d.rescale(SLOT_SCALE);
    d
}

/// A mapping from slot name to a non-negative, six-decimal-digit amount.
///
/// Arithmetic is defined only over the union of both operands' keys;
/// a key missing from one side defaults to zero (spec.md §4.1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSlot(BTreeMap<String, Decimal>);

impl ResourceSlot {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_map(map: BTreeMap<String, Decimal>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, rescale(v))).collect())
    }

    pub fn get(&self, slot_name: &str) -> Decimal {
        self.0.get(slot_name).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn set(&mut self, slot_name: impl Into<String>, value: Decimal) {
        self.0.insert(slot_name.into(), rescale(value));
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.is_zero())
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    fn union_keys<'a>(a: &'a Self, b: &'a Self) -> std::collections::BTreeSet<&'a String> {
        a.0.keys().chain(b.0.keys()).collect()
    }

    /// Componentwise addition over the union of both operands' keys.
    pub fn add(&self, other: &Self) -> Self {
        let mut out = BTreeMap::new();
        for key in Self::union_keys(self, other) {
            out.insert(key.clone(), rescale(self.get(key) + other.get(key)));
        }
        Self(out)
    }

    /// Componentwise subtraction. Returns an error if any resulting
    /// component would go negative — callers that want to clamp at zero
    /// (e.g. freeing slightly more than was reserved due to a race)
    /// should use [`Self::sub_saturating`] instead.
    pub fn sub(&self, other: &Self) -> Result<Self, CoreError> {
        let mut out = BTreeMap::new();
        for key in Self::union_keys(self, other) {
            let v = self.get(key) - other.get(key);
            if v < Decimal::ZERO {
                return Err(CoreError::Failure(format!(
                    "resource slot underflow on '{key}': {} - {}",
                    self.get(key),
                    other.get(key)
                )));
            }
            out.insert(key.clone(), rescale(v));
        }
        Ok(Self(out))
    }

    /// Componentwise subtraction, clamping each component at zero.
    pub fn sub_saturating(&self, other: &Self) -> Self {
        let mut out = BTreeMap::new();
        for key in Self::union_keys(self, other) {
            let v = (self.get(key) - other.get(key)).max(Decimal::ZERO);
            out.insert(key.clone(), rescale(v));
        }
        Self(out)
    }

    /// Componentwise `<=`: true iff every component of `self` is no
    /// greater than the corresponding component of `other`. Used to
    /// answer "does this request fit the remaining capacity?".
    pub fn le(&self, other: &Self) -> bool {
        Self::union_keys(self, other)
            .into_iter()
            .all(|key| self.get(key) <= other.get(key))
    }

    /// Parses user-supplied slot requests, e.g. `{"cpu": "4", "mem": "8g"}`,
    /// into a `ResourceSlot`. Plain counts (`"4"`) are taken as-is; byte
    /// slots accept a `k`/`m`/`g`/`t` suffix (binary, base-1024).
    /// Unknown slot names are rejected (spec.md §4.1).
    pub fn from_user_input(
        raw: &BTreeMap<String, String>,
        known_slot_types: &BTreeMap<String, SlotType>,
    ) -> Result<Self, CoreError> {
        let mut out = BTreeMap::new();
        for (slot_name, value) in raw {
            let slot_type = known_slot_types.get(slot_name).ok_or_else(|| {
                CoreError::NotFound(format!("unknown resource slot '{slot_name}'"))
            })?;
            let parsed = match slot_type {
                SlotType::Count => parse_decimal(value)?,
                SlotType::Bytes => parse_byte_size(value)?,
            };
            out.insert(slot_name.clone(), rescale(parsed));
        }
        Ok(Self(out))
    }
}

fn parse_decimal(raw: &str) -> Result<Decimal, CoreError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| CoreError::Failure(format!("invalid numeric slot value '{raw}': {e}")))
}

/// Parses a byte-size string such as `"8g"`, `"512m"`, or a bare integer
/// byte count, using binary (base-1024) unit multipliers.
fn parse_byte_size(raw: &str) -> Result<Decimal, CoreError> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last() {
        Some(c) if c.eq_ignore_ascii_case(&'k') => (&raw[..raw.len() - 1], Decimal::from(1024u64)),
        Some(c) if c.eq_ignore_ascii_case(&'m') => {
            (&raw[..raw.len() - 1], Decimal::from(1024u64 * 1024))
        }
        Some(c) if c.eq_ignore_ascii_case(&'g') => {
            (&raw[..raw.len() - 1], Decimal::from(1024u64 * 1024 * 1024))
        }
        Some(c) if c.eq_ignore_ascii_case(&'t') => (
            &raw[..raw.len() - 1],
            Decimal::from(1024u64 * 1024 * 1024 * 1024),
        ),
        _ => (raw, Decimal::ONE),
    };
    let base = parse_decimal(digits)?;
    Ok(base * multiplier)
}
