//! Payment signature parsing and signer recovery.
//!
//! Accepts 65-byte `r || s || v` signatures and 64-byte compact (ERC-2098) ones.
//! Signatures with `s` in the upper half of the curve order are refused, so each
//! authorization has exactly one valid encoding.

use alloy_primitives::{Address, Signature, U256, hex};
use tracing::instrument;

use crate::domain::PaymentChannelDomain;

/// Half the secp256k1 group order. Canonical signatures have `s <= SECP256K1N_HALF`.
const SECP256K1N_HALF: [u8; 32] =
    hex!("7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Malformed signature: {0}")]
    Malformed(String),
    #[error("Non-canonical signature: s is in the upper half of the curve order")]
    NonCanonical,
    #[error("Failed to recover signer: {0}")]
    Recovery(String),
    #[error("Signer mismatch: recovered {recovered}, expected {expected}")]
    SignerMismatch { recovered: Address, expected: Address },
}

/// Decodes raw signature bytes, rejecting malleable encodings.
///
/// The recovery byte of a 65-byte signature must be one of `0`, `1`, `27` or `28`.
pub fn parse_signature(bytes: &[u8]) -> Result<Signature, SignatureError> {
    let signature = match bytes.len() {
        65 => {
            let v = bytes[64];
            if !matches!(v, 0 | 1 | 27 | 28) {
                return Err(SignatureError::Malformed(format!(
                    "invalid recovery byte {v}"
                )));
            }
            Signature::from_raw(bytes).map_err(|e| SignatureError::Malformed(e.to_string()))?
        }
        64 => Signature::from_erc2098(bytes),
        len => {
            return Err(SignatureError::Malformed(format!(
                "expected 64 or 65 bytes, got {len}"
            )));
        }
    };
    if signature.s() > U256::from_be_bytes(SECP256K1N_HALF) {
        return Err(SignatureError::NonCanonical);
    }
    Ok(signature)
}

/// Recovers the address that signed `Payment { amount }` under `domain`.
pub fn recover_payment_signer(
    amount: U256,
    signature: &[u8],
    domain: &PaymentChannelDomain,
) -> Result<Address, SignatureError> {
    let signature = parse_signature(signature)?;
    let hash = domain.signing_hash(amount);
    signature
        .recover_address_from_prehash(&hash)
        .map_err(|e| SignatureError::Recovery(e.to_string()))
}

/// Verifies that `expected` signed `Payment { amount }` under `domain`.
///
/// A signature made under any other domain recovers to an unrelated address, so
/// domain mismatches surface as [`SignatureError::SignerMismatch`].
#[instrument(skip_all, err, fields(amount = %amount, expected = %expected))]
pub fn verify_payment(
    amount: U256,
    signature: &[u8],
    domain: &PaymentChannelDomain,
    expected: Address,
) -> Result<Address, SignatureError> {
    let recovered = recover_payment_signer(amount, signature, domain)?;
    if recovered != expected {
        return Err(SignatureError::SignerMismatch {
            recovered,
            expected,
        });
    }
    Ok(recovered)
}
