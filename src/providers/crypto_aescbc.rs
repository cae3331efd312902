//! # AES-CBC cryptor module.
//!
//! Module contains [`AesCbcCryptor`] type which can be used for data encryption
//! and decryption.
//!
//! It requires the [`crypto` feature] to be enabled.
//!
//! [`crypto` feature]: ../index.html#features

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::{Digest, Sha256};

use crate::core::{Cryptor, PubNubError};

type Encryptor = cbc::Encryptor<aes::Aes256>;
type Decryptor = cbc::Decryptor<aes::Aes256>;

/// AES cipher block size.
const AES_BLOCK_SIZE: usize = 16;

/// AES-CBC cryptor.
///
/// Cipher key is hashed with SHA-256 and the first half of the digest,
/// rendered as lowercase hex, becomes the 256-bit AES key. This is what every
/// other PubNub SDK does, so messages can be exchanged with them.
///
/// # Examples
/// ```
/// use pubnub_longpoll::providers::crypto_aescbc::AesCbcCryptor;
///
/// # fn main() -> Result<(), pubnub_longpoll::core::PubNubError> {
/// let cryptor = AesCbcCryptor::new("enigma", false)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AesCbcCryptor {
    /// Whether random IV should be used.
    ///
    /// With enabled random IV it is prepended to the cipher text.
    use_random_iv: bool,

    /// Key for data encryption / decryption
    cipher_key: Vec<u8>,
}

impl AesCbcCryptor {
    /// Create AES-CBC cryptor.
    ///
    /// # Errors
    /// Returns [`PubNubError::CryptoInitialization`] for empty cipher key.
    pub fn new<K>(cipher_key: K, use_random_iv: bool) -> Result<Self, PubNubError>
    where
        K: Into<Vec<u8>>,
    {
        let cipher_key = cipher_key.into();

        if cipher_key.is_empty() {
            return Err(PubNubError::CryptoInitialization {
                details: "Cipher key is empty".into(),
            });
        }

        Ok(Self {
            use_random_iv,
            cipher_key: Self::sha256_hex(cipher_key),
        })
    }

    fn initialization_vector(&self) -> [u8; AES_BLOCK_SIZE] {
        if self.use_random_iv {
            let mut random = [0u8; AES_BLOCK_SIZE];
            getrandom::getrandom(&mut random).ok();
            random
        } else {
            *b"0123456789012345"
        }
    }

    fn data_offset(&self) -> usize {
        if self.use_random_iv {
            AES_BLOCK_SIZE
        } else {
            0
        }
    }

    fn sha256_hex(data: Vec<u8>) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(data.as_slice());
        hasher
            .finalize()
            .iter()
            .take(AES_BLOCK_SIZE)
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>()
            .into_bytes()
    }
}

impl Cryptor for AesCbcCryptor {
    fn encrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
        let data_offset = self.data_offset();
        let padding = AES_BLOCK_SIZE - source.len() % AES_BLOCK_SIZE;
        let mut buffer = vec![0u8; data_offset + source.len() + padding];
        let iv = self.initialization_vector();

        let encrypted_len = Encryptor::new(self.cipher_key.as_slice().into(), iv.as_slice().into())
            .encrypt_padded_b2b_mut::<Pkcs7>(&source, &mut buffer[data_offset..])
            .map_err(|err| PubNubError::Encryption {
                details: err.to_string(),
            })?
            .len();

        if data_offset > 0 {
            buffer[0..data_offset].copy_from_slice(iv.as_slice());
        }
        buffer.truncate(data_offset + encrypted_len);

        Ok(buffer)
    }

    fn decrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
        let data_offset = self.data_offset();
        if source.len() < data_offset + AES_BLOCK_SIZE {
            return Err(PubNubError::Decryption {
                details: "Encrypted data is too short".into(),
            });
        }

        let iv = if self.use_random_iv {
            source[0..AES_BLOCK_SIZE].to_vec()
        } else {
            self.initialization_vector().to_vec()
        };
        let mut buffer = vec![0u8; source.len() - data_offset];

        let decrypted_len = Decryptor::new(self.cipher_key.as_slice().into(), iv.as_slice().into())
            .decrypt_padded_b2b_mut::<Pkcs7>(&source[data_offset..], buffer.as_mut())
            .map_err(|err| PubNubError::Decryption {
                details: err.to_string(),
            })?
            .len();
        buffer.truncate(decrypted_len);

        Ok(buffer)
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[test]
    fn create_cryptor_with_hardcoded_iv() {
        let cryptor = AesCbcCryptor::new("enigma", false).expect("Cryptor should be created");
        let iv = cryptor.initialization_vector();
        assert_eq!(&iv, b"0123456789012345");
        assert_eq!(
            cryptor.initialization_vector(),
            cryptor.initialization_vector()
        );
    }

    #[test]
    fn create_cryptor_with_random_iv() {
        let cryptor = AesCbcCryptor::new("enigma", true).expect("Cryptor should be created");
        assert_ne!(
            cryptor.initialization_vector(),
            cryptor.initialization_vector()
        );
    }

    #[test]
    fn not_create_cryptor_with_empty_cipher_key() {
        assert!(AesCbcCryptor::new("", true).is_err());
    }

    #[test]
    fn derive_hex_key_from_cipher_key() {
        let cryptor = AesCbcCryptor::new("enigma", false).expect("Cryptor should be created");

        assert_eq!(cryptor.cipher_key.len(), 32);
        assert!(cryptor
            .cipher_key
            .iter()
            .all(|byte| byte.is_ascii_hexdigit() && !byte.is_ascii_uppercase()));
    }

    #[test]
    fn encrypt_data_with_constant_iv() {
        let cryptor = AesCbcCryptor::new("enigma", false).expect("Cryptor should be created");
        let encrypted1 = cryptor
            .encrypt(Vec::from("\"Hello there\""))
            .expect("Data should be encrypted");
        let encrypted2 = cryptor
            .encrypt(Vec::from("\"Hello there\""))
            .expect("Data should be encrypted");

        assert_eq!(encrypted1, encrypted2);
        assert_eq!(encrypted1.len() % AES_BLOCK_SIZE, 0);
        assert_ne!(b"0123456789012345", &encrypted1[0..AES_BLOCK_SIZE]);
    }

    #[test]
    fn encrypt_data_with_random_iv() {
        let cryptor = AesCbcCryptor::new("enigma", true).expect("Cryptor should be created");
        let encrypted1 = cryptor
            .encrypt(Vec::from("\"Hello there\""))
            .expect("Data should be encrypted");
        let encrypted2 = cryptor
            .encrypt(Vec::from("\"Hello there\""))
            .expect("Data should be encrypted");

        assert_ne!(encrypted1, encrypted2);
        assert_ne!(encrypted1[0..AES_BLOCK_SIZE], encrypted2[0..AES_BLOCK_SIZE]);
    }

    #[test]
    fn decrypt_own_cipher_text() {
        let message = Vec::from("{\"text\":\"Hello there\",\"count\":42}");

        for use_random_iv in [false, true] {
            let cryptor =
                AesCbcCryptor::new("enigma", use_random_iv).expect("Cryptor should be created");
            let encrypted = cryptor
                .encrypt(message.clone())
                .expect("Data should be encrypted");

            assert_eq!(
                cryptor.decrypt(encrypted).expect("Data should be decrypted"),
                message
            );
        }
    }

    #[test]
    fn not_decrypt_with_different_key() {
        let encrypted = AesCbcCryptor::new("enigma", false)
            .unwrap()
            .encrypt(Vec::from("\"Hello there\""))
            .unwrap();
        let decrypted = AesCbcCryptor::new("riddle", false).unwrap().decrypt(encrypted);

        assert_ne!(decrypted.ok(), Some(Vec::from("\"Hello there\"")));
    }

    #[test]
    fn not_decrypt_truncated_data() {
        let cryptor = AesCbcCryptor::new("enigma", true).expect("Cryptor should be created");

        assert!(cryptor.decrypt(vec![0u8; 8]).is_err());
    }
}
