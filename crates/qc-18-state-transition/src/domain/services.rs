//! # Domain Services
//!
//! Pure hashing helpers: payload digests for private references and contract
//! address derivation for creations.

use crate::domain::value_objects::{Address, Hash};
use sha3::{Digest, Keccak256};

/// Computes keccak256 hash of data.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    Hash::new(Keccak256::digest(data).into())
}

/// Computes the address of a contract created by `sender` at `nonce`.
///
/// Address = keccak256(rlp(\[sender, nonce\]))\[12:\]
#[must_use]
pub fn compute_contract_address(sender: Address, nonce: u64) -> Address {
    let mut content = Vec::with_capacity(30);

    // 20-byte string header: 0x80 + 20
    content.push(0x94);
    content.extend_from_slice(sender.as_bytes());

    if nonce == 0 {
        content.push(0x80);
    } else if nonce < 0x80 {
        content.push(nonce as u8);
    } else {
        let bytes = nonce.to_be_bytes();
        let start = bytes.iter().position(|&b| b != 0).unwrap_or(7);
        content.push(0x80 + (8 - start) as u8);
        content.extend_from_slice(&bytes[start..]);
    }

    // Content never exceeds 30 bytes, so the short list header always applies.
    let mut rlp = Vec::with_capacity(content.len() + 1);
    rlp.push(0xc0 + content.len() as u8);
    rlp.extend_from_slice(&content);

    let hash = keccak256(&rlp);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash.as_bytes()[12..]);
    Address::new(addr)
}

// =============================================================================
// TESTS
// =============================================================================
