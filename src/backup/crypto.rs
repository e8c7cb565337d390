//! Password-based encryption for backup payloads.
//!
//! Blob layout: salt(16) || nonce(16) || AES-256-GCM ciphertext+tag. The key
//! is derived with PBKDF2-HMAC-SHA256 over the password and the per-backup
//! salt; both salt and nonce are freshly random for every encryption.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use hmac::Hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::error::BackupError;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 16;
const KEY_LEN: usize = 32;
// Deliberately slow to resist offline brute force
const PBKDF2_ROUNDS: u32 = 100_000;

// The blob layout carries a 16-byte nonce, not the 12-byte GCM default
type BackupCipher = AesGcm<Aes256, U16>;

fn derive_key(password: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, BackupError> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key[..])
        .map_err(|_| BackupError::KeyDerivationFailed)?;
    Ok(key)
}

pub fn encrypt(plaintext: &[u8], password: &str) -> Result<Vec<u8>, BackupError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce_bytes);

    let key = derive_key(password, &salt)?;
    let cipher =
        BackupCipher::new_from_slice(&key[..]).map_err(|_| BackupError::EncryptionFailed)?;
    let ciphertext = cipher
        .encrypt(Nonce::<U16>::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| BackupError::EncryptionFailed)?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

pub fn decrypt(blob: &[u8], password: &str) -> Result<Vec<u8>, BackupError> {
    // Malformed input and wrong password fail identically
    if blob.len() <= SALT_LEN + NONCE_LEN {
        return Err(BackupError::DecryptionFailed);
    }
    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(password, salt)?;
    let cipher =
        BackupCipher::new_from_slice(&key[..]).map_err(|_| BackupError::DecryptionFailed)?;
    cipher
        .decrypt(Nonce::<U16>::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| BackupError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let plaintext = b"the quick brown fox";
        let blob = encrypt(plaintext, "correct-horse").unwrap();
        let decrypted = decrypt(&blob, "correct-horse").unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn large_payload_round_trips_byte_identically() {
        // Roughly the size of a real backup file
        let plaintext: Vec<u8> = br#"{"version":2,"items":[]}"#
            .iter()
            .copied()
            .cycle()
            .take(5 * 1024)
            .collect();
        let blob = encrypt(&plaintext, "correct-horse").unwrap();
        assert!(matches!(
            decrypt(&blob, "wrong-password"),
            Err(BackupError::DecryptionFailed)
        ));
        assert_eq!(decrypt(&blob, "correct-horse").unwrap(), plaintext);
    }

    #[test]
    fn wrong_password_fails() {
        let blob = encrypt(b"secret", "correct-horse").unwrap();
        match decrypt(&blob, "wrong-password") {
            Err(BackupError::DecryptionFailed) => {}
            other => panic!("expected DecryptionFailed, got {:?}", other),
        }
    }

    #[test]
    fn blob_layout_is_salt_nonce_ciphertext_tag() {
        let plaintext = b"abc";
        let blob = encrypt(plaintext, "pw").unwrap();
        // 16 salt + 16 nonce + plaintext + 16-byte tag
        assert_eq!(blob.len(), 16 + 16 + plaintext.len() + 16);
    }

    #[test]
    fn salts_and_nonces_are_fresh() {
        let a = encrypt(b"same input", "pw").unwrap();
        let b = encrypt(b"same input", "pw").unwrap();
        assert_ne!(a[..32], b[..32]);
        assert_ne!(a[32..], b[32..]);
    }

    #[test]
    fn truncated_blob_fails() {
        let blob = encrypt(b"payload", "pw").unwrap();
        match decrypt(&blob[..20], "pw") {
            Err(BackupError::DecryptionFailed) => {}
            other => panic!("expected DecryptionFailed, got {:?}", other),
        }
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let mut blob = encrypt(b"payload", "pw").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        match decrypt(&blob, "pw") {
            Err(BackupError::DecryptionFailed) => {}
            other => panic!("expected DecryptionFailed, got {:?}", other),
        }
    }
}
