use alloy::primitives::{I256, U256};
use eyre::{bail, eyre, Result};
use std::fmt::Write;

/// Reinterprets an unsigned word as a two's complement signed integer.
///
/// ```
/// use alloy::primitives::{I256, U256};
/// use cinder_common::utils::strings::sign_uint;
///
/// assert_eq!(sign_uint(U256::MAX), I256::MINUS_ONE);
/// ```
pub fn sign_uint(unsigned: U256) -> I256 {
    I256::from_raw(unsigned)
}

/// Decodes a hex string into a vector of bytes. A leading `0x` and surrounding whitespace
/// are ignored.
///
/// ```
/// use cinder_common::utils::strings::decode_hex;
///
/// let hex = "0x6001600201";
/// let result = decode_hex(hex).expect("should decode hex");
/// assert_eq!(result, vec![0x60, 0x01, 0x60, 0x02, 0x01]);
/// ```
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    // normalize
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);

    if s.is_empty() {
        return Ok(vec![]);
    }
    if s.len() % 2 != 0 {
        bail!("invalid hex string: odd number of digits in {}", s);
    }

    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| eyre!("invalid hex string: {}", s))
}

/// Encodes a slice of bytes into a lowercase hex string, without a prefix.
///
/// ```
/// use cinder_common::utils::strings::encode_hex;
///
/// assert_eq!(encode_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
/// ```
pub fn encode_hex(s: &[u8]) -> String {
    s.iter().fold(String::with_capacity(s.len() * 2), |mut acc, b| {
        // writing into a String cannot fail
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use crate::utils::strings::*;

    #[test]
    fn test_sign_uint() {
        assert_eq!(sign_uint(U256::from(10)), I256::try_from(10i64).expect("invalid"));
        assert_eq!(sign_uint(U256::ZERO), I256::ZERO);
        assert_eq!(sign_uint(U256::MAX), I256::MINUS_ONE);
    }

    #[test]
    fn test_decode_hex() {
        let result = decode_hex("48656c6c6f20776f726c64").expect("should decode hex");
        assert_eq!(result, b"Hello world".to_vec());

        let result = decode_hex("0xABCDEF").expect("should decode hex");
        assert_eq!(result, vec![171, 205, 239]);

        assert!(decode_hex("0x").expect("should decode hex").is_empty());
    }

    #[test]
    fn test_decode_hex_rejects_malformed_input() {
        assert!(decode_hex("0x123").is_err());
        assert!(decode_hex("zz").is_err());
    }

    #[test]
    fn test_encode_hex() {
        assert_eq!(encode_hex(b"Hello world"), "48656c6c6f20776f726c64");
        assert_eq!(encode_hex(&[1, 35, 69]), "012345");
        assert_eq!(encode_hex(&[]), "");
    }
}
