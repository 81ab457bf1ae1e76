use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{self, Argon2, Params};
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
/// Prepended to plaintext before sealing; checked on open to tell a wrong
/// passphrase from a valid but empty payload.
const MAGIC: &[u8] = b"CYCLECAL_V1";

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: wrong passphrase or corrupted data")]
    Decryption,
    #[error("invalid data format")]
    InvalidFormat,
}

/// Argon2id-derived AES-256-GCM key bound to one vault salt.
///
/// The key is derived once per unlock and wiped when the vault is dropped,
/// so repeated writes do not pay for key derivation again.
pub struct Vault {
    salt: [u8; SALT_LEN],
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let params = Params::new(65536, 3, 1, Some(KEY_LEN)).map_err(|_| CryptoError::KeyDerivation)?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(key)
}

impl Vault {
    /// New vault with a fresh random salt.
    pub fn create(passphrase: &str) -> Result<Self, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let key = derive_key(passphrase, &salt)?;
        Ok(Self { salt, key })
    }

    /// Re-derive the key for an existing blob and return it with the plaintext.
    pub fn unlock(passphrase: &str, sealed: &[u8]) -> Result<(Self, Vec<u8>), CryptoError> {
        if sealed.len() < SALT_LEN + NONCE_LEN + MAGIC.len() {
            return Err(CryptoError::InvalidFormat);
        }
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&sealed[..SALT_LEN]);
        let vault = Self {
            salt,
            key: derive_key(passphrase, &salt)?,
        };
        let plaintext = vault.open(sealed)?;
        Ok((vault, plaintext))
    }

    /// Output: salt (32) || nonce (12) || ciphertext
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let cipher =
            Aes256Gcm::new_from_slice(&self.key[..]).map_err(|_| CryptoError::Encryption)?;

        let mut payload = Vec::with_capacity(MAGIC.len() + plaintext.len());
        payload.extend_from_slice(MAGIC);
        payload.extend_from_slice(plaintext);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), payload.as_slice())
            .map_err(|_| CryptoError::Encryption);
        payload.zeroize();
        let ciphertext = ciphertext?;

        let mut output = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        output.extend_from_slice(&self.salt);
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    /// Open a blob sealed under this vault's salt.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < SALT_LEN + NONCE_LEN + MAGIC.len() {
            return Err(CryptoError::InvalidFormat);
        }
        if sealed[..SALT_LEN] != self.salt {
            return Err(CryptoError::Decryption);
        }
        let nonce_bytes = &sealed[SALT_LEN..SALT_LEN + NONCE_LEN];
        let ciphertext = &sealed[SALT_LEN + NONCE_LEN..];

        let cipher =
            Aes256Gcm::new_from_slice(&self.key[..]).map_err(|_| CryptoError::Decryption)?;
        let mut decrypted = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Decryption)?;

        if decrypted.len() < MAGIC.len() || &decrypted[..MAGIC.len()] != MAGIC {
            decrypted.zeroize();
            return Err(CryptoError::Decryption);
        }

        let plaintext = decrypted[MAGIC.len()..].to_vec();
        decrypted.zeroize();
        Ok(plaintext)
    }
}
