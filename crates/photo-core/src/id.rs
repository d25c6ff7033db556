//! Compact base-36 id tokens.
//!
//! Tokens are written least-significant digit first using `0-9a-z`, so
//! `37` encodes as `"11"` and `36` as `"01"`. The last character of a
//! token is therefore its most significant digit.

use crate::error::{PhotoError, Result};

/// Identifier for concepts and photo records.
pub type Id = u64;

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RADIX: u64 = 36;

/// Encode an id as a base-36 token.
pub fn encode_id(id: Id) -> String {
    let mut token = String::new();
    let mut rest = id;
    loop {
        token.push(DIGITS[(rest % RADIX) as usize] as char);
        rest /= RADIX;
        if rest == 0 {
            break;
        }
    }
    token
}

/// Decode a base-36 token produced by [`encode_id`].
///
/// Rejects empty tokens, characters outside `0-9a-z`, and values that do
/// not fit in an [`Id`].
pub fn decode_id(token: &str) -> Result<Id> {
    if token.is_empty() {
        return Err(PhotoError::invalid_token(token));
    }

    let mut id: Id = 0;
    for byte in token.bytes().rev() {
        let digit = digit_value(byte).ok_or_else(|| PhotoError::invalid_token(token))?;
        id = id
            .checked_mul(RADIX)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| PhotoError::invalid_token(token))?;
    }

    Ok(id)
}

fn digit_value(byte: u8) -> Option<u64> {
    match byte {
        b'0'..=b'9' => Some(u64::from(byte - b'0')),
        b'a'..=b'z' => Some(u64::from(byte - b'a') + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode_id(0), "0");
        assert_eq!(encode_id(9), "9");
        assert_eq!(encode_id(10), "a");
        assert_eq!(encode_id(35), "z");
        assert_eq!(encode_id(36), "01");
        assert_eq!(encode_id(37), "11");
        assert_eq!(encode_id(36 * 36), "001");
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode_id("0").unwrap(), 0);
        assert_eq!(decode_id("z").unwrap(), 35);
        assert_eq!(decode_id("01").unwrap(), 36);
        assert_eq!(decode_id("11").unwrap(), 37);
    }

    #[test]
    fn test_round_trip_range() {
        for n in 0..=10_000_000u64 {
            assert_eq!(decode_id(&encode_id(n)).unwrap(), n);
        }
    }

    #[test]
    fn test_round_trip_extremes() {
        assert_eq!(decode_id(&encode_id(u64::MAX)).unwrap(), u64::MAX);
    }

    #[test]
    fn test_no_trailing_zero_digit() {
        for n in 1..5_000u64 {
            assert!(!encode_id(n).ends_with('0'), "non-canonical token for {}", n);
        }
    }

    #[test]
    fn test_decode_rejects_bad_tokens() {
        for bad in ["", "A", "1-", "é", " 1", "-tags"] {
            let err = decode_id(bad).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_TOKEN", "token {:?}", bad);
        }
    }

    #[test]
    fn test_decode_rejects_overflow() {
        let too_long = "z".repeat(20);
        assert!(decode_id(&too_long).is_err());
    }
}
