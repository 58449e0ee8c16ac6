//! Integration tests for SealDoc.
//!
//! These tests drive the engines through the factory and the pipeline
//! through a real [`FileStore`] in a temporary directory.

// Allow unwrap() in tests - panics are acceptable for test assertions
#![allow(clippy::disallowed_methods)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use sealdoc_engine::{CryptoConfig, LoadReport, Pipeline};
use sealdoc_storage::FileStore;

// ============================================================================
// Test Workspace
// ============================================================================

/// A document store in its own temporary directory.
pub struct TestDocs {
    pipeline: Pipeline<FileStore>,
    dir: TempDir,
}

impl TestDocs {
    /// Creates an empty store.
    pub fn new() -> Result<Self> {
        let dir = TempDir::new().context("Failed to create temp dir")?;
        Ok(Self {
            pipeline: Pipeline::new(FileStore::new(dir.path())),
            dir,
        })
    }

    /// Saves `text` under `name`.
    pub fn save(&self, name: &str, config: CryptoConfig, text: &str) -> Result<CryptoConfig> {
        self.pipeline
            .save(Path::new(name), config, text)
            .with_context(|| format!("Failed to save {}", name))
    }

    /// Loads `name`.
    pub fn load(&self, name: &str, password: Option<&str>) -> Result<LoadReport> {
        self.pipeline
            .load(Path::new(name), password)
            .with_context(|| format!("Failed to load {}", name))
    }

    /// On-disk path of `name` with `extension` appended.
    pub fn file(&self, name: &str, extension: &str) -> PathBuf {
        self.dir.path().join(format!("{}.{}", name, extension))
    }

    /// Rewrites one field of the stored record.
    pub fn edit_record(&self, name: &str, field: &str, value: serde_json::Value) -> Result<()> {
        let path = self.file(name, "ste");
        let json = std::fs::read(&path)?;
        let mut record: serde_json::Value = serde_json::from_slice(&json)?;
        record[field] = value;
        std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
        Ok(())
    }

    /// Reads one field of the stored record.
    pub fn record_field(&self, name: &str, field: &str) -> Result<serde_json::Value> {
        let json = std::fs::read(self.file(name, "ste"))?;
        let record: serde_json::Value = serde_json::from_slice(&json)?;
        Ok(record[field].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use sealdoc_crypto::CryptoError;
    use sealdoc_engine::{
        create_cert, create_cipher, create_digest, create_pbe, BlockMode, CipherAlgorithm,
        ConfigError, EngineError, IntegrityKind, IntegrityOption, IntegrityStatus, Padding,
        PbeAlgorithm, PipelineError,
    };
    use sealdoc_storage::StorageError;

    const HALLO: &str = "Hallo Welt";
    const LETTER: &str = "Sehr geehrte Damen und Herren,\nanbei das Protokoll vom 3. März. ✓";

    // ------------------------------------------------------------------------
    // Engine scenarios
    // ------------------------------------------------------------------------

    #[test]
    fn test_aes_ecb_pkcs7_roundtrip() {
        let mut config = CryptoConfig::new();
        config.set_cipher_algorithm(CipherAlgorithm::Aes).unwrap();
        config.set_key_size(128).unwrap();
        config.set_block_mode(BlockMode::Ecb).unwrap();
        config.set_padding(Padding::Pkcs7).unwrap();

        let encrypted = create_cipher(&config).unwrap().encrypt(HALLO).unwrap();
        let decrypted = create_cipher(&encrypted)
            .unwrap()
            .decrypt(encrypted.cipher_text.as_deref().unwrap())
            .unwrap();
        assert_eq!(decrypted, HALLO);
    }

    #[test]
    fn test_rc4_2048_roundtrip() {
        let mut config = CryptoConfig::new();
        config.set_cipher_algorithm(CipherAlgorithm::Rc4).unwrap();
        config.set_key_size(2048).unwrap();
        assert_eq!(config.block_mode, BlockMode::None);
        assert_eq!(config.padding, Padding::None);

        let encrypted = create_cipher(&config).unwrap().encrypt(HALLO).unwrap();
        let decrypted = create_cipher(&encrypted)
            .unwrap()
            .decrypt(encrypted.cipher_text.as_deref().unwrap())
            .unwrap();
        assert_eq!(decrypted, HALLO);
    }

    #[test]
    fn test_scrypt_aes_gcm_rederive_roundtrip() {
        let mut config = CryptoConfig::new();
        config.set_pbe_active(true);
        config.set_pbe_algorithm(PbeAlgorithm::Scrypt).unwrap();
        config.set_password("secret");
        assert_eq!(config.block_mode, BlockMode::Gcm);
        assert_eq!(config.key_size, 256);

        let derived = create_pbe(&config).unwrap().derive_key().unwrap();
        let encrypted = create_cipher(&derived).unwrap().encrypt(HALLO).unwrap();

        // Forget the key; only the password and salt remain.
        let mut reloaded = encrypted.redacted_for_storage();
        reloaded.set_password("secret");
        let rederived = create_pbe(&reloaded).unwrap().derive_key().unwrap();
        assert_eq!(rederived.key, derived.key);

        let decrypted = create_cipher(&rederived)
            .unwrap()
            .decrypt(encrypted.cipher_text.as_deref().unwrap())
            .unwrap();
        assert_eq!(decrypted, HALLO);
    }

    #[test]
    fn test_dsa_sign_verify_and_uppercase_rejected() {
        let mut config = CryptoConfig::new();
        config.set_integrity_active(true);
        config.set_integrity_kind(IntegrityKind::Dsa);

        let message = BASE64.encode(HALLO);
        let mut cert = create_cert(&config).unwrap();
        cert.generate_certs().unwrap();
        let signed = cert.sign(&message).unwrap();
        let signature = signed.signature.clone().unwrap();

        assert!(cert.verify(&signature, &message).unwrap());
        assert!(!cert.verify(&signature.to_uppercase(), &message).unwrap());
    }

    #[test]
    fn test_cts_short_input_rejected() {
        let mut config = CryptoConfig::new();
        config.set_block_mode(BlockMode::Cts).unwrap();

        let result = create_cipher(&config).unwrap().encrypt("0123456789");
        assert!(matches!(
            result,
            Err(EngineError::Crypto(CryptoError::InputTooShort { required: 32, actual: 10 }))
        ));
    }

    #[test]
    fn test_every_legal_combination_roundtrips() {
        // Empty, one block, two blocks exactly, and an unaligned letter.
        let texts = ["", "0123456789abcdef", "Zwei Blöcke füllen genau 32 B.", LETTER];
        assert_eq!(texts[2].len(), 32);

        for text in texts {
            for algorithm in [CipherAlgorithm::Aes, CipherAlgorithm::Rc4] {
                let mut config = CryptoConfig::new();
                config.set_cipher_algorithm(algorithm).unwrap();
                for mode in config.valid_block_modes_for_input(text.len()) {
                    config.set_block_mode(mode).unwrap();
                    for padding in config.valid_paddings() {
                        config.set_padding(padding).unwrap();
                        let encrypted = create_cipher(&config).unwrap().encrypt(text).unwrap();
                        let decrypted = create_cipher(&encrypted)
                            .unwrap()
                            .decrypt(encrypted.cipher_text.as_deref().unwrap())
                            .unwrap();
                        assert_eq!(
                            decrypted, text,
                            "{algorithm}/{mode}/{padding} on {} bytes",
                            text.len()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_document_store_roundtrip() {
        let docs = TestDocs::new().unwrap();
        let mut config = CryptoConfig::new();
        config.set_block_mode(BlockMode::Ecb).unwrap();
        config.set_padding(Padding::ZeroByte).unwrap();

        docs.save("empty", config, "").unwrap();
        let report = docs.load("empty", None).unwrap();
        assert_eq!(report.plaintext.unwrap(), "");
    }

    #[test]
    fn test_zero_padding_refuses_trailing_nul() {
        let mut config = CryptoConfig::new();
        config.set_padding(Padding::ZeroByte).unwrap();

        let result = create_cipher(&config).unwrap().encrypt("abc\0");
        assert!(matches!(
            result,
            Err(EngineError::Crypto(CryptoError::InvalidInput(_)))
        ));

        config.set_padding(Padding::Pkcs7).unwrap();
        let encrypted = create_cipher(&config).unwrap().encrypt("abc\0").unwrap();
        let decrypted = create_cipher(&encrypted)
            .unwrap()
            .decrypt(encrypted.cipher_text.as_deref().unwrap())
            .unwrap();
        assert_eq!(decrypted, "abc\0");
    }

    #[test]
    fn test_digest_signature_byte_flip() {
        for option in [
            IntegrityOption::Sha256,
            IntegrityOption::AesCmac,
            IntegrityOption::HmacSha256,
        ] {
            let mut config = CryptoConfig::new();
            config.set_integrity_active(true);
            config.set_integrity_option(option).unwrap();

            let signed = create_digest(&config).unwrap().sign(LETTER).unwrap();
            let engine = create_digest(&signed).unwrap();
            let signature = signed.signature.as_deref().unwrap();
            assert!(engine.verify(signature, LETTER).unwrap());

            let mut raw = BASE64.decode(signature).unwrap();
            raw[0] ^= 0x80;
            assert!(!engine.verify(&BASE64.encode(&raw), LETTER).unwrap(), "{option}");
        }
    }

    #[test]
    fn test_gcm_tamper_is_authentication_failure() {
        let mut config = CryptoConfig::new();
        config.set_block_mode(BlockMode::Gcm).unwrap();
        let encrypted = create_cipher(&config).unwrap().encrypt(LETTER).unwrap();

        let mut raw = BASE64.decode(encrypted.cipher_text.as_deref().unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        let err = create_cipher(&encrypted)
            .unwrap()
            .decrypt(&BASE64.encode(&raw))
            .unwrap_err();
        assert!(err.is_authentication_failure());
    }

    // ------------------------------------------------------------------------
    // Save and load
    // ------------------------------------------------------------------------

    #[test]
    fn test_store_plain_aes() {
        let docs = TestDocs::new().unwrap();
        docs.save("plain", CryptoConfig::new(), LETTER).unwrap();

        assert!(docs.file("plain", "ste").is_file());
        assert!(docs.file("plain", "key").is_file());
        assert_eq!(docs.record_field("plain", "cipher_algorithm").unwrap(), "aes");

        let report = docs.load("plain", None).unwrap();
        assert_eq!(report.integrity, IntegrityStatus::NotChecked);
        assert_eq!(report.plaintext.unwrap(), LETTER);
    }

    #[test]
    fn test_store_unencrypted_with_hmac() {
        let docs = TestDocs::new().unwrap();
        let mut config = CryptoConfig::new();
        config.set_encrypt_active(false);
        config.set_integrity_active(true);
        config.set_integrity_option(IntegrityOption::HmacSha256).unwrap();
        docs.save("memo", config, LETTER).unwrap();

        assert_eq!(docs.record_field("memo", "cipher_text").unwrap(), LETTER);
        assert!(docs.file("memo", "digKey").is_file());
        assert!(!docs.file("memo", "key").exists());

        let report = docs.load("memo", None).unwrap();
        assert_eq!(report.integrity, IntegrityStatus::Verified);
        assert_eq!(report.plaintext.unwrap(), LETTER);
    }

    #[test]
    fn test_store_pbkdf2_rc4_with_cmac() {
        let docs = TestDocs::new().unwrap();
        let mut config = CryptoConfig::new();
        config.set_pbe_active(true);
        config.set_cipher_algorithm(CipherAlgorithm::Rc4).unwrap();
        config.set_password("correct horse battery staple");
        config.set_integrity_active(true);
        config.set_integrity_option(IntegrityOption::AesCmac).unwrap();

        let saved = docs.save("rc4", config, LETTER).unwrap();
        assert_eq!(saved.key_size, 40);
        assert_eq!(
            saved.iv_or_salt.as_ref().unwrap().len(),
            "correct horse battery staple".len()
        );
        assert!(!docs.file("rc4", "key").exists());

        let report = docs.load("rc4", Some("correct horse battery staple")).unwrap();
        assert_eq!(report.integrity, IntegrityStatus::Verified);
        assert_eq!(report.plaintext.unwrap(), LETTER);
    }

    #[test]
    fn test_store_scrypt_wrong_and_missing_password() {
        let docs = TestDocs::new().unwrap();
        let mut config = CryptoConfig::new();
        config.set_pbe_active(true);
        config.set_pbe_algorithm(PbeAlgorithm::Scrypt).unwrap();
        config.set_password("secret");
        docs.save("vault", config, LETTER).unwrap();

        let report = docs.load("vault", Some("secret")).unwrap();
        assert_eq!(report.plaintext.unwrap(), LETTER);

        // GCM rejects the key derived from the wrong password.
        let report = docs.load("vault", Some("Secret")).unwrap();
        assert!(report.plaintext.unwrap_err().is_authentication_failure());

        let report = docs.load("vault", None).unwrap();
        assert!(matches!(
            report.plaintext,
            Err(EngineError::Config(ConfigError::MissingField("pbe_password")))
        ));
    }

    #[test]
    fn test_store_dsa() {
        let docs = TestDocs::new().unwrap();
        let mut config = CryptoConfig::new();
        config.set_block_mode(BlockMode::Ofb).unwrap();
        config.set_integrity_active(true);
        config.set_integrity_kind(IntegrityKind::Dsa);
        docs.save("signed", config, LETTER).unwrap();

        for extension in ["ste", "key", "privKey", "pubKey"] {
            assert!(docs.file("signed", extension).is_file(), "{extension}");
        }

        let report = docs.load("signed", None).unwrap();
        assert_eq!(report.integrity, IntegrityStatus::Verified);
        assert_eq!(report.plaintext.unwrap(), LETTER);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let docs = TestDocs::new().unwrap();
        let err = docs.load("nothing", None).unwrap_err();
        let err = err.downcast::<PipelineError>().unwrap();
        assert!(matches!(err, PipelineError::Storage(StorageError::NotFound(_))));
    }

    #[test]
    fn test_tampered_ciphertext_reports_mismatch_and_still_decrypts() {
        let docs = TestDocs::new().unwrap();
        let mut config = CryptoConfig::new();
        config.set_block_mode(BlockMode::Ofb).unwrap();
        config.set_integrity_active(true);
        config.set_integrity_option(IntegrityOption::HmacSha256).unwrap();
        docs.save("letter", config, LETTER).unwrap();

        // Flip one bit of the first character: 'S' becomes 'R'.
        let stored = docs.record_field("letter", "cipher_text").unwrap();
        let mut raw = BASE64.decode(stored.as_str().unwrap()).unwrap();
        raw[0] ^= 0x01;
        docs.edit_record("letter", "cipher_text", BASE64.encode(&raw).into())
            .unwrap();

        let report = docs.load("letter", None).unwrap();
        assert_eq!(report.integrity, IntegrityStatus::Mismatch);
        let text = report.plaintext.unwrap();
        assert!(text.starts_with("Rehr geehrte"));
    }

    #[test]
    fn test_tampered_signature_with_dsa() {
        let docs = TestDocs::new().unwrap();
        let mut config = CryptoConfig::new();
        config.set_integrity_active(true);
        config.set_integrity_kind(IntegrityKind::Dsa);
        docs.save("contract", config, LETTER).unwrap();

        docs.edit_record("contract", "signature", "bm90IGEgc2lnbmF0dXJl".into())
            .unwrap();

        let report = docs.load("contract", None).unwrap();
        assert_eq!(report.integrity, IntegrityStatus::Mismatch);
        assert_eq!(report.plaintext.unwrap(), LETTER);
    }

    #[test]
    fn test_resave_replaces_stale_sidecars() {
        let docs = TestDocs::new().unwrap();

        let mut config = CryptoConfig::new();
        config.set_integrity_active(true);
        config.set_integrity_option(IntegrityOption::HmacSha256).unwrap();
        docs.save("doc", config, LETTER).unwrap();
        assert!(docs.file("doc", "digKey").is_file());

        docs.save("doc", CryptoConfig::new(), HALLO).unwrap();
        assert!(!docs.file("doc", "digKey").exists());

        let report = docs.load("doc", None).unwrap();
        assert_eq!(report.integrity, IntegrityStatus::NotChecked);
        assert_eq!(report.plaintext.unwrap(), HALLO);
    }

    #[test]
    fn test_missing_key_sidecar() {
        let docs = TestDocs::new().unwrap();
        docs.save("doc", CryptoConfig::new(), LETTER).unwrap();
        std::fs::remove_file(docs.file("doc", "key")).unwrap();

        let report = docs.load("doc", None).unwrap();
        assert!(matches!(
            report.plaintext,
            Err(EngineError::Config(ConfigError::MissingField("key")))
        ));
    }
}
