//! CBOR wire encoding for module payloads.
//!
//! Requirements (module init data) and manifests (follow data) travel as a
//! CBOR array of `[asset, amount]` pairs, in order. Amounts are unsigned
//! 128-bit and round-trip losslessly (values above `u64::MAX` use the CBOR
//! bignum tag).

use crate::assets::{Amount, AssetId};
use crate::follow_module::types::{AssetAmount, DepositRequirement};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("CBOR decoding failed: {0}")]
    Decode(String),
}

/// Serialize to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| SerializationError::Encode(format!("{:?}", e)))?;
    Ok(bytes)
}

/// Deserialize from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(bytes).map_err(|e| SerializationError::Decode(format!("{:?}", e)))
}

/// Encode a requirement or manifest as an ordered list of `[asset, amount]`.
pub fn encode_deposits(deposits: &DepositRequirement) -> Result<Vec<u8>, SerializationError> {
    let pairs: Vec<(&str, Amount)> = deposits
        .iter()
        .map(|d| (d.asset.as_str(), d.amount))
        .collect();
    to_cbor(&pairs)
}

/// Decode a list produced by [`encode_deposits`].
pub fn decode_deposits(bytes: &[u8]) -> Result<DepositRequirement, SerializationError> {
    let pairs: Vec<(String, Amount)> = from_cbor(bytes)?;
    Ok(DepositRequirement::new(
        pairs
            .into_iter()
            .map(|(asset, amount)| AssetAmount::new(AssetId(asset), amount))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposits_keep_order_and_duplicates() {
        let req = DepositRequirement::from_pairs([("CUR", 100), ("DAI", 3), ("CUR", 200)]);

        let decoded = decode_deposits(&encode_deposits(&req).unwrap()).unwrap();

        assert_eq!(decoded, req);
    }

    #[test]
    fn test_full_width_amount_is_lossless() {
        let req = DepositRequirement::from_pairs([("CUR", u128::MAX), ("CUR", u64::MAX as u128 + 1)]);

        let decoded = decode_deposits(&encode_deposits(&req).unwrap()).unwrap();

        assert_eq!(decoded.entries[0].amount, u128::MAX);
        assert_eq!(decoded.entries[1].amount, u64::MAX as u128 + 1);
    }

    #[test]
    fn test_cbor_deterministic() {
        let req = DepositRequirement::from_pairs([("CUR", 100)]);
        assert_eq!(encode_deposits(&req).unwrap(), encode_deposits(&req).unwrap());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_deposits(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(SerializationError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_negative_amount() {
        let bytes = to_cbor(&vec![("CUR", -5i64)]).unwrap();
        assert!(decode_deposits(&bytes).is_err());
    }
}
