//! Hex formatting for handles and proofs.
//!
//! Handles are fixed-length references; a handle of the wrong length is rejected rather than
//! padded or truncated.

use crate::constants::HANDLE_LEN;
use crate::error::{KycError, KycResult};

/// `0x`-prefixed lowercase hex of arbitrary bytes.
pub fn hexlify(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Canonical hex form of a 32-byte handle.
pub fn expect_bytes32(bytes: &[u8]) -> KycResult<String> {
    if bytes.len() != HANDLE_LEN {
        return Err(KycError::LengthMismatch {
            expected: HANDLE_LEN,
            got: bytes.len(),
        });
    }
    Ok(hexlify(bytes))
}

/// Decode hex with or without a `0x` prefix.
pub fn decode_hex(s: &str) -> KycResult<Vec<u8>> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|e| KycError::InvalidForm(format!("invalid hex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_short_input() {
        let input = [0xab, 0xcd];
        assert!(matches!(
            expect_bytes32(&input),
            Err(KycError::LengthMismatch { expected: 32, got: 2 })
        ));
    }

    #[test]
    fn keeps_exact_32_bytes_unchanged() {
        let input: Vec<u8> = (0..32).collect();
        let expected = format!(
            "0x{}",
            input.iter().map(|b| format!("{b:02x}")).collect::<String>()
        );
        assert_eq!(expect_bytes32(&input).unwrap(), expected);
    }

    #[test]
    fn rejects_long_input() {
        let input: Vec<u8> = (1..=40).collect();
        assert!(matches!(
            expect_bytes32(&input),
            Err(KycError::LengthMismatch { expected: 32, got: 40 })
        ));
    }

    #[test]
    fn decode_accepts_both_prefixes() {
        assert_eq!(decode_hex("0xff00").unwrap(), vec![0xff, 0x00]);
        assert_eq!(decode_hex("ff00").unwrap(), vec![0xff, 0x00]);
        assert!(decode_hex("0xzz").is_err());
    }

    proptest! {
        #[test]
        fn any_32_bytes_render_lowercase(bytes in any::<[u8; 32]>()) {
            let out = expect_bytes32(&bytes).unwrap();
            prop_assert!(out.starts_with("0x"));
            prop_assert_eq!(out.len(), 66);
            prop_assert_eq!(out.to_lowercase(), out.clone());
            prop_assert_eq!(decode_hex(&out).unwrap(), bytes.to_vec());
        }

        #[test]
        fn any_other_length_fails(bytes in proptest::collection::vec(any::<u8>(), 0..96)) {
            prop_assume!(bytes.len() != 32);
            prop_assert!(expect_bytes32(&bytes).is_err());
        }
    }
}
