//! Address parsing with checksum normalization.

use crate::error::{KycError, KycResult};
use alloy_primitives::Address;
use std::str::FromStr;

/// Parse an address and return it together with its checksummed rendering.
///
/// The `0x` prefix is optional. All-lowercase and all-uppercase inputs are accepted as-is;
/// mixed-case input must carry a valid checksum.
pub fn normalize_address(s: &str) -> KycResult<(Address, String)> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(KycError::InvalidAddress(format!("{trimmed}: expected 40 hex digits")));
    }
    let prefixed = format!("0x{digits}");

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());

    let addr = if has_lower && has_upper {
        Address::parse_checksummed(&prefixed, None)
            .map_err(|e| KycError::InvalidAddress(format!("{trimmed}: {e}")))?
    } else {
        Address::from_str(&prefixed).map_err(|e| KycError::InvalidAddress(format!("{trimmed}: {e}")))?
    };

    Ok((addr, addr.to_checksum(None)))
}

pub fn parse_address(s: &str) -> KycResult<Address> {
    normalize_address(s).map(|(addr, _)| addr)
}

pub fn checksum(addr: &Address) -> String {
    addr.to_checksum(None)
}

/// Serde adapter rendering an [`Address`] in its checksummed form.
pub mod checksummed {
    use alloy_primitives::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &Address, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&addr.to_checksum(None))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let s = String::deserialize(d)?;
        super::parse_address(&s).map_err(serde::de::Error::custom)
    }
}
