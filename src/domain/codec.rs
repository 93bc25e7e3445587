//! Encryption of stored balances.
//!
//! A balance is persisted as `base64(ciphertext || tag)` where the ciphertext is the
//! AES-128-CBC encryption (PKCS#7, IV = key) of the canonical decimal string and the
//! tag is HMAC-SHA256 over the ciphertext truncated to 16 bytes. Using the key as IV
//! keeps the encoding deterministic per key; the tag turns a wrong key or a
//! corrupted row into an error instead of a plausible-looking amount.

use super::money::Money;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Required key length in bytes.
pub const KEY_LEN: usize = 16;
const TAG_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("key must be {KEY_LEN} bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("balance is not valid base64")]
    NotBase64,
    #[error("balance ciphertext has invalid length {0}")]
    InvalidLength(usize),
    #[error("balance tag mismatch (wrong key or tampered value)")]
    TagMismatch,
    #[error("balance plaintext is malformed")]
    MalformedPlaintext,
}

/// The persisted (encrypted) form of a balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBalance(pub String);

impl EncodedBalance {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncodedBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A key bound to balance encoding and decoding.
///
/// Built fresh for every request from the key the caller presents; it holds no
/// shared state and can be cloned freely across tasks.
#[derive(Clone)]
pub struct BalanceCodec {
    key: [u8; KEY_LEN],
    mac: HmacSha256,
}

impl fmt::Debug for BalanceCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BalanceCodec").finish_non_exhaustive()
    }
}

impl BalanceCodec {
    pub fn new(key: &str) -> Result<Self, CodecError> {
        let key: [u8; KEY_LEN] = key
            .as_bytes()
            .try_into()
            .map_err(|_| CodecError::InvalidKeyLength(key.len()))?;
        let mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|_| CodecError::InvalidKeyLength(KEY_LEN))?;
        Ok(Self { key, mac })
    }

    pub fn encode(&self, amount: Money) -> EncodedBalance {
        let plaintext = amount.to_canonical_string();
        let ciphertext = Aes128CbcEnc::new(&self.key.into(), &self.key.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut mac = self.mac.clone();
        mac.update(&ciphertext);
        let tag = mac.finalize().into_bytes();

        let mut raw = ciphertext;
        raw.extend_from_slice(&tag[..TAG_LEN]);
        EncodedBalance(STANDARD.encode(raw))
    }

    pub fn decode(&self, encoded: &EncodedBalance) -> Result<Money, CodecError> {
        let raw = STANDARD
            .decode(encoded.as_str().trim())
            .map_err(|_| CodecError::NotBase64)?;
        if raw.len() < BLOCK_LEN + TAG_LEN || (raw.len() - TAG_LEN) % BLOCK_LEN != 0 {
            return Err(CodecError::InvalidLength(raw.len()));
        }
        let (ciphertext, tag) = raw.split_at(raw.len() - TAG_LEN);

        let mut mac = self.mac.clone();
        mac.update(ciphertext);
        mac.verify_truncated_left(tag)
            .map_err(|_| CodecError::TagMismatch)?;

        let plaintext = Aes128CbcDec::new(&self.key.into(), &self.key.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CodecError::MalformedPlaintext)?;
        let text = std::str::from_utf8(&plaintext).map_err(|_| CodecError::MalformedPlaintext)?;
        Money::from_str(text).map_err(|_| CodecError::MalformedPlaintext)
    }
}
