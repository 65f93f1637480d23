//! Address type and range arithmetic.
//!
//! This module defines the strong address type used throughout the engine. It provides:
//! 1. **Type Safety:** Addresses are `u64` values internally; hex strings exist only at the edges.
//! 2. **Hex Conversion:** Parsing of `0x`-prefixed or bare hex, and the canonical 8-digit output form.
//! 3. **Range Arithmetic:** Inclusive end addresses and the overlap test every validator rule builds on.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ParseAddrError;

/// An address in the SoC physical address space.
///
/// Ordering follows the numeric value, so sorting by `Addr` sorts by location
/// regardless of how the address was spelled in the source data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(pub u64);

impl Addr {
    /// Parses a hex address, with or without a `0x` prefix, in any case.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseAddrError`] when the input is empty, contains a non-hex
    /// digit, or does not fit in 64 bits.
    pub fn parse_hex(input: &str) -> Result<Self, ParseAddrError> {
        parse_hex(input).map(Self)
    }

    /// Returns the canonical `0x`-prefixed, upper-case, zero-padded form.
    pub fn to_hex(self) -> String {
        to_hex(self.0)
    }

    /// Returns the inclusive end of a range of `size` bytes starting here.
    ///
    /// `None` when `size` is zero or the range would run past `u64::MAX`.
    pub fn end_for(self, size: u64) -> Option<Self> {
        end_address(self.0, size).map(Self)
    }

    /// Returns `true` when this address is a multiple of `alignment`.
    ///
    /// An alignment of zero imposes no constraint.
    pub const fn is_aligned(self, alignment: u64) -> bool {
        alignment == 0 || self.0 % alignment == 0
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Addr {
    type Err = ParseAddrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl From<u64> for Addr {
    fn from(addr: u64) -> Self {
        Self(addr)
    }
}

impl Serialize for Addr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct AddrVisitor;

impl Visitor<'_> for AddrVisitor {
    type Value = Addr;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a hex address string or an unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Addr, E> {
        Addr::parse_hex(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Addr, E> {
        Ok(Addr(v))
    }
}

impl<'de> Deserialize<'de> for Addr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AddrVisitor)
    }
}

/// Serde adapter for an optional address where an empty string means "unset".
///
/// Draft partitions carry `""` until the user types an address; that must
/// survive a save/load round trip as `None` rather than fail to parse.
pub mod optional {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Addr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    /// Serializes `None` as `""` and `Some` in canonical hex.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(addr: &Option<Addr>, serializer: S) -> Result<S::Ok, S::Error> {
        match addr {
            Some(addr) => serializer.serialize_str(&addr.to_hex()),
            None => serializer.serialize_str(""),
        }
    }

    /// Deserializes `null`, `""`, a hex string, or an integer.
    ///
    /// # Errors
    ///
    /// Fails on a non-empty string that is not valid hex.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Addr>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(v)) => Ok(Some(Addr(v))),
            Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(Raw::Text(s)) => Addr::parse_hex(&s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// Parses a hex string into a `u64`, accepting an optional `0x`/`0X` prefix.
///
/// # Errors
///
/// Returns a [`ParseAddrError`] for empty input, non-hex digits, or overflow.
pub fn parse_hex(input: &str) -> Result<u64, ParseAddrError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(ParseAddrError::Empty);
    }

    u64::from_str_radix(digits, 16).map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow => ParseAddrError::Overflow(input.to_string()),
        _ => ParseAddrError::InvalidDigit(input.to_string()),
    })
}

/// Formats a value as `0x` followed by at least 8 upper-case hex digits.
pub fn to_hex(value: u64) -> String {
    format!("0x{value:08X}")
}

/// Upper-cases everything after a two-character `0x` prefix.
///
/// The prefix itself is left untouched, so `0x2000ffff` becomes `0x2000FFFF`.
pub fn format_hex_prefix(hex: &str) -> String {
    match hex.get(..2) {
        Some(prefix) => format!("{prefix}{}", hex[2..].to_uppercase()),
        None => hex.to_uppercase(),
    }
}

/// Returns the inclusive end address `start + size - 1`.
///
/// `None` for a zero size (an empty range has no last byte) or on overflow.
pub const fn end_address(start: u64, size: u64) -> Option<u64> {
    if size == 0 {
        return None;
    }
    match start.checked_add(size - 1) {
        Some(end) => Some(end),
        None => None,
    }
}

/// Returns `true` when two inclusive ranges share at least one address.
///
/// A single address is the degenerate range `[addr, addr]`.
pub fn ranges_overlap(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> bool {
    a_end.min(b_end) >= a_start.max(b_start)
}

/// Distance from `base` to `address`, or `None` when `address` lies below `base`.
pub const fn address_offset(base: Addr, address: Addr) -> Option<u64> {
    address.0.checked_sub(base.0)
}

/// Moves `address` forward by `offset` bytes.
pub const fn offset_address(address: Addr, offset: u64) -> Option<Addr> {
    match address.0.checked_add(offset) {
        Some(v) => Some(Addr(v)),
        None => None,
    }
}
