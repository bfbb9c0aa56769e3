use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Base58 alphabet used by ledger addresses. Digit zero is `r`.
const ALPHABET: &[u8; 58] = b"rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz";

/// Version byte prefixed to an account ID before checksumming.
const ACCOUNT_VERSION: u8 = 0x00;

const CHECKSUM_BYTES: usize = 4;

/// A 20-byte ledger account identifier.
///
/// Displays as (and parses from) the checked base58 address form, e.g.
/// `rHfLeAcShzsicdcepwFqM7syUikCQ6dDXi`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId([u8; AccountId::BYTES]);

impl AccountId {
    pub const BYTES: usize = 20;

    /// Wrap raw account ID bytes. Fails unless exactly 20 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; Self::BYTES] = bytes.try_into().map_err(|_| {
            Error::MalformedInput(format!(
                "account ID is {} bytes, expected {}",
                bytes.len(),
                Self::BYTES
            ))
        })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; Self::BYTES] {
        &self.0
    }

    /// Encode as a base58check address.
    pub fn to_address(&self) -> String {
        let mut payload = Vec::with_capacity(1 + Self::BYTES + CHECKSUM_BYTES);
        payload.push(ACCOUNT_VERSION);
        payload.extend_from_slice(&self.0);
        let sum = checksum(&payload);
        payload.extend_from_slice(&sum);
        encode_base58(&payload)
    }

    /// Parse a base58check address, verifying alphabet, length, version, and checksum.
    pub fn from_address(address: &str) -> Result<Self> {
        let raw = decode_base58(address)?;
        if raw.len() != 1 + Self::BYTES + CHECKSUM_BYTES {
            return Err(Error::InvalidAddress(format!(
                "`{}` decodes to {} bytes, expected {}",
                address,
                raw.len(),
                1 + Self::BYTES + CHECKSUM_BYTES
            )));
        }
        let (payload, sum) = raw.split_at(1 + Self::BYTES);
        if payload[0] != ACCOUNT_VERSION {
            return Err(Error::InvalidAddress(format!(
                "`{}` has version byte {:#04x}",
                address, payload[0]
            )));
        }
        if checksum(payload) != sum {
            return Err(Error::InvalidAddress(format!(
                "`{}` fails its checksum",
                address
            )));
        }
        let mut id = [0u8; Self::BYTES];
        id.copy_from_slice(&payload[1..]);
        Ok(Self(id))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_address())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.to_address())
    }
}

impl FromStr for AccountId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_address(s)
    }
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_BYTES] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first.as_slice());
    let mut out = [0u8; CHECKSUM_BYTES];
    out.copy_from_slice(&second[..CHECKSUM_BYTES]);
    out
}

fn encode_base58(data: &[u8]) -> String {
    // Each leading zero byte becomes one zero digit.
    let zeros = data.iter().take_while(|b| **b == 0).count();
    let mut out = String::with_capacity(data.len() * 138 / 100 + 1);
    out.extend(std::iter::repeat(ALPHABET[0] as char).take(zeros));
    let rest = &data[zeros..];
    if !rest.is_empty() {
        let digits = BigUint::from_bytes_be(rest).to_radix_be(58);
        out.extend(digits.iter().map(|d| ALPHABET[*d as usize] as char));
    }
    out
}

fn decode_base58(text: &str) -> Result<Vec<u8>> {
    let mut digits = Vec::with_capacity(text.len());
    for c in text.chars() {
        let digit = ALPHABET
            .iter()
            .position(|a| *a as char == c)
            .ok_or_else(|| {
                Error::InvalidAddress(format!("`{}` contains invalid character {:?}", text, c))
            })?;
        digits.push(digit as u8);
    }
    if digits.is_empty() {
        return Err(Error::InvalidAddress("address is empty".into()));
    }
    let zeros = digits.iter().take_while(|d| **d == 0).count();
    let mut out = vec![0u8; zeros];
    let rest = &digits[zeros..];
    if !rest.is_empty() {
        let n = BigUint::from_radix_be(rest, 58)
            .ok_or_else(|| Error::InvalidAddress(format!("`{}` is not base58", text)))?;
        out.extend_from_slice(&n.to_bytes_be());
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    const VECTORS: &[(&str, &str)] = &[
        (
            "7FB3E32A0E968D8D69AEED05DF298574C43996D9",
            "rUeNKwrjBXRDHZft2KqBozc13CBnJg17LF",
        ),
        (
            "BEF78C206179940F3BCA042067619C78018C9B82",
            "rJQjALkWExMsg8Ub7LYKyCoGakGiHqR4C2",
        ),
        (
            "B0B4EA2F24C9BFB2DC8E1A33854A846328116BB8",
            "rHfLeAcShzsicdcepwFqM7syUikCQ6dDXi",
        ),
        (
            "A3B6B1B61181DB9C81EED4F3D5109F6CFC31109B",
            "rEvernodee8dJLaFsujS6q1EiXvZYmHXr8",
        ),
        (
            "88CECA8ED635F79573136EAAA2B70F07C2F2B9D8",
            "rD74dUPRFNfgnY2NzrxxYRXN4BrfGSN6Mv",
        ),
    ];

    #[test]
    fn known_addresses() {
        for (id, address) in VECTORS {
            let bytes = hex::decode(id).unwrap();
            let account = AccountId::from_bytes(&bytes).unwrap();
            assert_eq!(account.to_address(), *address);
            let parsed: AccountId = address.parse().unwrap();
            assert_eq!(parsed, account);
        }
    }

    #[test]
    fn zero_account() {
        let account = AccountId::from_bytes(&[0u8; 20]).unwrap();
        assert_eq!(account.to_string(), "rrrrrrrrrrrrrrrrrrrrrhoLvTp");
        assert_eq!(
            AccountId::from_address("rrrrrrrrrrrrrrrrrrrrrhoLvTp").unwrap(),
            account
        );
    }

    #[test]
    fn bad_addresses() {
        // Flip the last character: checksum no longer holds.
        assert!(matches!(
            AccountId::from_address("rHfLeAcShzsicdcepwFqM7syUikCQ6dDXj"),
            Err(Error::InvalidAddress(_))
        ));
        // '0' and 'l' are not in the alphabet.
        assert!(matches!(
            AccountId::from_address("rHfLeAcShzsicdcepwFqM7syUikCQ6dDX0"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            AccountId::from_address("rHfLeAcSh"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            AccountId::from_address(""),
            Err(Error::InvalidAddress(_))
        ));
    }

    #[test]
    fn random_round_trip() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let bytes: [u8; AccountId::BYTES] = rng.gen();
            let account = AccountId::from_bytes(&bytes).unwrap();
            let address = account.to_address();
            assert!(address.starts_with('r'));
            assert_eq!(AccountId::from_address(&address).unwrap(), account);
        }
    }

    #[test]
    fn wrong_width() {
        assert!(matches!(
            AccountId::from_bytes(&[1u8; 19]),
            Err(Error::MalformedInput(_))
        ));
    }
}
