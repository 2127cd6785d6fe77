// [libs/domain/crypto/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN CRYPTO & DEDUPLICATION (V1.0)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: DERIVACIÓN DE CLAVES, SOBRE SMS Y CARGA EN REPOSO
 *
 * # Mathematical Proof (Key Isolation):
 * Cada paciente recibe una clave AES-128 distinta derivada vía
 * HKDF-SHA256 sobre la clave maestra con `info = patient_id`.
 * La compromisión de la clave de un paciente no revela la clave
 * de ningún otro, ni la clave maestra misma (propiedad de HKDF).
 * =================================================================
 */

use aes::Aes256;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

pub const SMS_ENVELOPE_PREFIX: &str = "TMT:v1:";
const GCM_NONCE_LEN: usize = 12;
const CBC_IV_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("[CRYPTO_KEY_FAULT]: {0}")]
    KeyDerivation(String),
    #[error("[CRYPTO_ENCRYPT_FAULT]: {0}")]
    Encrypt(String),
    #[error("[CRYPTO_DECRYPT_FAULT]: {0}")]
    Decrypt(String),
    #[error("[CRYPTO_ENVELOPE_FAULT]: malformed envelope — {0}")]
    MalformedEnvelope(String),
}

/// Hashes the configured master key secret into 32 bytes of key material.
pub fn derive_master_key_material(master_key_secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(master_key_secret.as_bytes());
    hasher.finalize().into()
}

/// HKDF-SHA256(master_key, salt=empty, info=patient_id_bytes) → 16 bytes.
pub fn derive_patient_sms_key(
    master_key_material: &[u8; 32],
    patient_id: Uuid,
) -> Result<[u8; 16], CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, master_key_material);
    let mut key = [0u8; 16];
    hk.expand(patient_id.as_bytes(), &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

/// Encrypts `plaintext` for `patient_id`, producing a `TMT:v1:`-prefixed envelope.
pub fn encrypt_sms_envelope(
    master_key_material: &[u8; 32],
    patient_id: Uuid,
    plaintext: &str,
) -> Result<String, CryptoError> {
    let key_bytes = derive_patient_sms_key(master_key_material, patient_id)?;
    let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&key_bytes));

    let mut nonce_bytes = [0u8; GCM_NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

    let mut payload = Vec::with_capacity(GCM_NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce_bytes);
    payload.extend_from_slice(&ciphertext);

    Ok(format!("{SMS_ENVELOPE_PREFIX}{}", BASE64_STANDARD.encode(payload)))
}

/// Decrypts a `TMT:v1:`-prefixed envelope for `patient_id`. Callers must strip
/// the prefix check themselves before calling this (the prefix is only a
/// dispatch signal, not part of the cryptographic material).
pub fn decrypt_sms_envelope(
    master_key_material: &[u8; 32],
    patient_id: Uuid,
    envelope_body_base64: &str,
) -> Result<String, CryptoError> {
    let raw = BASE64_STANDARD
        .decode(envelope_body_base64)
        .map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))?;

    if raw.len() < GCM_NONCE_LEN {
        return Err(CryptoError::MalformedEnvelope("payload shorter than nonce".into()));
    }

    let (nonce_bytes, ciphertext) = raw.split_at(GCM_NONCE_LEN);
    let key_bytes = derive_patient_sms_key(master_key_material, patient_id)?;
    let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(&key_bytes));
    let nonce = Nonce::from_slice(nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CryptoError::Decrypt(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|e| CryptoError::Decrypt(e.to_string()))
}

type Aes256CbcEncryptor = cbc::Encryptor<Aes256>;
type Aes256CbcDecryptor = cbc::Decryptor<Aes256>;

/// AES-256-CBC with PKCS7 padding; IV is 16 random bytes prepended to the ciphertext.
/// Used for the rarely-touched at-rest medical payload (see SPEC_FULL.md §4.9).
pub fn encrypt_at_rest(key_32_bytes: &[u8; 32], plaintext: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; CBC_IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let encryptor = Aes256CbcEncryptor::new(key_32_bytes.into(), &iv.into());
    let ciphertext = encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(CBC_IV_LEN + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out
}

pub fn decrypt_at_rest(key_32_bytes: &[u8; 32], payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if payload.len() < CBC_IV_LEN {
        return Err(CryptoError::MalformedEnvelope("payload shorter than IV".into()));
    }
    let (iv, ciphertext) = payload.split_at(CBC_IV_LEN);
    let decryptor = Aes256CbcDecryptor::new(key_32_bytes.into(), iv.into());
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| CryptoError::Decrypt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sms_envelope_round_trips() {
        let master = derive_master_key_material("test-secret");
        let patient = Uuid::new_v4();
        let envelope = encrypt_sms_envelope(&master, patient, "hello distress").unwrap();
        assert!(envelope.starts_with(SMS_ENVELOPE_PREFIX));

        let body = &envelope[SMS_ENVELOPE_PREFIX.len()..];
        let decrypted = decrypt_sms_envelope(&master, patient, body).unwrap();
        assert_eq!(decrypted, "hello distress");
    }

    #[test]
    fn different_patients_derive_different_keys() {
        let master = derive_master_key_material("test-secret");
        let a = derive_patient_sms_key(&master, Uuid::new_v4()).unwrap();
        let b = derive_patient_sms_key(&master, Uuid::new_v4()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_patient_key_fails_decryption() {
        let master = derive_master_key_material("test-secret");
        let envelope = encrypt_sms_envelope(&master, Uuid::new_v4(), "secret").unwrap();
        let body = &envelope[SMS_ENVELOPE_PREFIX.len()..];
        assert!(decrypt_sms_envelope(&master, Uuid::new_v4(), body).is_err());
    }

    #[test]
    fn at_rest_payload_round_trips() {
        let key = derive_master_key_material("another-secret");
        let ciphertext = encrypt_at_rest(&key, b"chronic: diabetes");
        let plaintext = decrypt_at_rest(&key, &ciphertext).unwrap();
        assert_eq!(plaintext, b"chronic: diabetes");
    }
}
