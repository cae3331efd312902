//! Cryptor module
//!
//! This module contains the [`Cryptor`] trait which is used to implement
//! encryption and decryption of published data.

use crate::core::error::PubNubError;
use base64::{engine::general_purpose, Engine as _};
use log::warn;
use serde_json::Value;
use std::fmt::Debug;

/// This trait is used to encrypt and decrypt messages sent to the
/// [`PubNub API`].
///
/// It is used by the [`dx`] modules to encrypt published messages and to
/// decrypt messages received from subscribe and history.
///
/// To implement this trait, you must provide `encrypt` and `decrypt` methods
/// that takes a `Vec<u8>` and returns a `Result<Vec<u8>, PubNubError>`.
///
/// When you use this trait to make your own crypto, make sure that other SDKs
/// use the same encryption and decryption algorithms.
///
/// # Examples
/// ```
/// use pubnub_longpoll::core::{Cryptor, PubNubError};
///
/// #[derive(Debug)]
/// struct MyCryptor;
///
/// impl Cryptor for MyCryptor {
///     fn encrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
///         // Encrypt provided data here
///         Ok(vec![])
///     }
///
///     fn decrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
///         // Decrypt provided data here
///         Ok(vec![])
///     }
/// }
/// ```
///
/// [`dx`]: ../dx/index.html
/// [`PubNub API`]: https://www.pubnub.com/docs
pub trait Cryptor: Debug + Send + Sync {
    /// Encrypt provided data.
    ///
    /// # Errors
    /// Should return an [`PubNubError::Encryption`] if provided data can't
    /// be encrypted or underlying cryptor misconfigured.
    fn encrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError>;

    /// Decrypt provided data.
    ///
    /// # Errors
    /// Should return an [`PubNubError::Decryption`] if provided data can't
    /// be decrypted or underlying cryptor misconfigured.
    fn decrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError>;
}

/// Encrypt serialized message.
///
/// Returns JSON string literal with base64 encoded cipher text, which is what
/// other SDKs expect to find in the publish path.
pub(crate) fn encrypt_message(cryptor: &dyn Cryptor, message: &str) -> Result<String, PubNubError> {
    let encrypted = cryptor.encrypt(message.as_bytes().to_vec())?;
    serde_json::to_string(&general_purpose::STANDARD.encode(encrypted)).map_err(|err| {
        PubNubError::Serialization {
            details: err.to_string(),
        }
    })
}

/// Decrypt received payload.
///
/// Payloads which are not base64 strings or can't be decrypted are returned
/// unchanged, so plain text publishers on the same channel still get through.
pub(crate) fn decrypt_payload(cryptor: &dyn Cryptor, payload: Value) -> Value {
    let Value::String(encoded) = &payload else {
        return payload;
    };

    let decrypted = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|err| PubNubError::Decryption {
            details: err.to_string(),
        })
        .and_then(|data| cryptor.decrypt(data))
        .and_then(|data| {
            serde_json::from_slice::<Value>(&data).map_err(|err| PubNubError::Deserialization {
                details: err.to_string(),
            })
        });

    match decrypted {
        Ok(value) => value,
        Err(err) => {
            warn!("Unable to decrypt payload: {err}");
            payload
        }
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[derive(Debug)]
    struct ReversingCryptor;

    impl Cryptor for ReversingCryptor {
        fn encrypt(&self, mut source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
            source.reverse();
            Ok(source)
        }

        fn decrypt(&self, mut source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
            source.reverse();
            Ok(source)
        }
    }

    #[test]
    fn wrap_encrypted_message_into_json_string() {
        let encrypted = encrypt_message(&ReversingCryptor, "\"hi\"").unwrap();

        assert_eq!(encrypted, "\"ImloIg==\"");
    }

    #[test]
    fn decrypt_encrypted_payload() {
        let payload = Value::String("fSJpaCI6ImdzbSJ7".into());

        assert_eq!(
            decrypt_payload(&ReversingCryptor, payload),
            serde_json::json!({"msg": "hi"})
        );
    }

    #[test]
    fn keep_payload_which_is_not_encrypted() {
        let payload = serde_json::json!({"text": "plain"});

        assert_eq!(decrypt_payload(&ReversingCryptor, payload.clone()), payload);
    }

    #[test]
    fn keep_string_payload_which_is_not_base64() {
        let payload = Value::String("hello world!".into());

        assert_eq!(decrypt_payload(&ReversingCryptor, payload.clone()), payload);
    }
}
