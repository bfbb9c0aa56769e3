//! Ledger index derivation for hook state entries.

use sha2::{Digest, Sha512};

use crate::primitive::AccountId;

/// Ledger space tag of hook state entries (`'v'`).
const HOOK_STATE_SPACE: u16 = 0x0076;

pub const INDEX_BYTES: usize = 32;

/// First half of the SHA-512 digest of the concatenated parts.
pub fn sha512_half(parts: &[&[u8]]) -> [u8; INDEX_BYTES] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; INDEX_BYTES];
    out.copy_from_slice(&digest[..INDEX_BYTES]);
    out
}

/// Ledger index of the hook state entry `key` in `namespace` of `account`.
pub fn hook_state_index(
    account: &AccountId,
    key: &[u8; 32],
    namespace: &[u8; 32],
) -> [u8; INDEX_BYTES] {
    sha512_half(&[
        &HOOK_STATE_SPACE.to_be_bytes(),
        account.as_bytes(),
        key,
        namespace,
    ])
}
