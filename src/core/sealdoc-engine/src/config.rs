//! The crypto configuration record and its option-derivation rules.
//!
//! A [`CryptoConfig`] is the single document that flows through every
//! engine: the user's selections, the produced key material and the
//! ciphertext/signature all live here. The `valid_*` functions compute
//! which values are legal for the current selections; the `set_*`
//! functions apply a change and re-narrow every dependent field to its
//! first legal value.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use sealdoc_crypto::symmetric::CTS_MIN_INPUT;
use sealdoc_crypto::SecretBytes;

use crate::error::ConfigError;

// ============================================================================
// Enumerations
// ============================================================================

/// Implements `Display`/`FromStr` with fixed kebab-case names.
macro_rules! named_enum {
    ($ty:ident, $field:literal { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Canonical text name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ConfigError::InvalidValue {
                        field: $field,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

/// Symmetric cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherAlgorithm {
    /// AES block cipher.
    #[default]
    Aes,
    /// RC4 stream cipher.
    Rc4,
}

named_enum!(CipherAlgorithm, "cipher_algorithm" {
    Aes => "aes",
    Rc4 => "rc4",
});

/// Block cipher mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockMode {
    /// No block mode (stream ciphers).
    None,
    /// Electronic codebook.
    Ecb,
    /// Cipher block chaining.
    #[default]
    Cbc,
    /// Galois/counter mode with a 16-byte IV and 128-bit tag.
    Gcm,
    /// Output feedback.
    Ofb,
    /// CBC with ciphertext stealing.
    Cts,
}

named_enum!(BlockMode, "block_mode" {
    None => "none",
    Ecb => "ecb",
    Cbc => "cbc",
    Gcm => "gcm",
    Ofb => "ofb",
    Cts => "cts",
});

impl BlockMode {
    /// Whether the mode consumes an IV.
    pub fn needs_iv(&self) -> bool {
        !matches!(self, BlockMode::None | BlockMode::Ecb)
    }
}

/// Block padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Padding {
    /// No padding.
    None,
    /// PKCS#5/PKCS#7.
    #[default]
    Pkcs7,
    /// Zero-byte padding.
    ZeroByte,
}

named_enum!(Padding, "padding" {
    None => "none",
    Pkcs7 => "pkcs7",
    ZeroByte => "zero-byte",
});

/// Password-based key derivation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PbeAlgorithm {
    /// PBKDF2 with an HMAC PRF.
    #[default]
    Pbkdf2,
    /// scrypt.
    Scrypt,
}

named_enum!(PbeAlgorithm, "pbe_algorithm" {
    Pbkdf2 => "pbkdf2",
    Scrypt => "scrypt",
});

/// Digest tag attached to a PBE configuration.
///
/// Always derived from the PBE algorithm and cipher; `Gcm` marks the
/// scrypt pairing where no PRF digest applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PbeDigest {
    /// HMAC-SHA1.
    Sha1,
    /// HMAC-SHA256.
    #[default]
    Sha256,
    /// scrypt feeding AES-GCM.
    Gcm,
}

named_enum!(PbeDigest, "pbe_digest" {
    Sha1 => "sha1",
    Sha256 => "sha256",
    Gcm => "gcm",
});

/// Integrity mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrityKind {
    /// Hash or MAC over the ciphertext.
    #[default]
    Digest,
    /// DSA signature over the ciphertext.
    Dsa,
}

named_enum!(IntegrityKind, "integrity_kind" {
    Digest => "digest",
    Dsa => "dsa",
});

/// Integrity algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrityOption {
    /// SHA-256 (keyless for digests, SHA256withDSA for signatures).
    #[default]
    Sha256,
    /// AES-CMAC with a generated 128-bit key.
    AesCmac,
    /// HMAC-SHA256 with a generated 256-bit key.
    HmacSha256,
}

named_enum!(IntegrityOption, "integrity_option" {
    Sha256 => "sha256",
    AesCmac => "aes-cmac",
    HmacSha256 => "hmac-sha256",
});

/// AES key sizes in bits.
pub const AES_KEY_SIZES: &[u32] = &[128, 192, 256];

/// RC4 key sizes in bits.
pub const RC4_KEY_SIZES: &[u32] = &[40, 128, 256, 512, 1024, 2048];

// ============================================================================
// CryptoConfig
// ============================================================================

/// The crypto configuration of one document.
///
/// Secret fields (`key`, `pbe_password`, `digest_key`, both signature keys)
/// are never serialized; the pipeline writes them to sidecar files, or in
/// the case of the password, not at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Encryption enabled.
    pub encrypt_active: bool,
    /// Password-based key derivation enabled. Implies `encrypt_active`.
    pub pbe_active: bool,
    /// Integrity protection enabled.
    pub integrity_active: bool,

    /// Cipher.
    pub cipher_algorithm: CipherAlgorithm,
    /// Key size in bits.
    pub key_size: u32,
    /// Block mode.
    pub block_mode: BlockMode,
    /// Padding.
    pub padding: Padding,

    /// Key derivation function.
    pub pbe_algorithm: PbeAlgorithm,
    /// PRF digest, derived from `pbe_algorithm` and `cipher_algorithm`.
    pub pbe_digest: PbeDigest,
    /// User password. Supplied at save/load time.
    #[serde(skip)]
    pub pbe_password: Option<SecretBytes>,
    /// IV for non-PBE ciphers, salt under PBE (which for AES doubles as the IV).
    #[serde(with = "crate::encoding::base64_opt", skip_serializing_if = "Option::is_none")]
    pub iv_or_salt: Option<Vec<u8>>,

    /// Integrity mechanism.
    pub integrity_kind: IntegrityKind,
    /// Integrity algorithm.
    pub integrity_option: IntegrityOption,

    /// Symmetric key, generated or derived.
    #[serde(skip)]
    pub key: Option<SecretBytes>,
    /// Base64 ciphertext, or the plaintext itself when encryption is off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher_text: Option<String>,

    /// MAC key for AES-CMAC or HMAC.
    #[serde(skip)]
    pub digest_key: Option<SecretBytes>,
    /// Base64 SPKI DER public key.
    #[serde(skip)]
    pub signature_public_key: Option<String>,
    /// PKCS#8 DER private key.
    #[serde(skip)]
    pub signature_private_key: Option<SecretBytes>,
    /// Base64 tag or signature over `cipher_text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            encrypt_active: true,
            pbe_active: false,
            integrity_active: false,
            cipher_algorithm: CipherAlgorithm::Aes,
            key_size: 128,
            block_mode: BlockMode::Cbc,
            padding: Padding::Pkcs7,
            pbe_algorithm: PbeAlgorithm::Pbkdf2,
            pbe_digest: PbeDigest::Sha256,
            pbe_password: None,
            iv_or_salt: None,
            integrity_kind: IntegrityKind::Digest,
            integrity_option: IntegrityOption::Sha256,
            key: None,
            cipher_text: None,
            digest_key: None,
            signature_public_key: None,
            signature_private_key: None,
            signature: None,
        }
    }
}

impl CryptoConfig {
    /// Creates the default configuration: AES-128/CBC/PKCS7, no PBE, no integrity.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Derivation rules
    // ------------------------------------------------------------------------

    /// Ciphers legal for the current selections.
    ///
    /// RC4 has no scrypt pairing, so it drops out when scrypt PBE is on.
    pub fn valid_algorithms(&self) -> Vec<CipherAlgorithm> {
        if self.pbe_active && self.pbe_algorithm == PbeAlgorithm::Scrypt {
            vec![CipherAlgorithm::Aes]
        } else {
            vec![CipherAlgorithm::Aes, CipherAlgorithm::Rc4]
        }
    }

    /// Block modes legal for the current selections.
    pub fn valid_block_modes(&self) -> Vec<BlockMode> {
        if self.cipher_algorithm == CipherAlgorithm::Rc4 {
            return vec![BlockMode::None];
        }
        if self.pbe_active {
            return match self.pbe_algorithm {
                PbeAlgorithm::Pbkdf2 => vec![BlockMode::Cbc],
                PbeAlgorithm::Scrypt => vec![BlockMode::Gcm],
            };
        }
        vec![
            BlockMode::Ecb,
            BlockMode::Cbc,
            BlockMode::Gcm,
            BlockMode::Ofb,
            BlockMode::Cts,
        ]
    }

    /// Block modes legal for a plaintext of `input_len` bytes.
    ///
    /// Ciphertext stealing needs at least two full blocks.
    pub fn valid_block_modes_for_input(&self, input_len: usize) -> Vec<BlockMode> {
        self.valid_block_modes()
            .into_iter()
            .filter(|mode| *mode != BlockMode::Cts || input_len >= CTS_MIN_INPUT)
            .collect()
    }

    /// Paddings legal for the current selections.
    pub fn valid_paddings(&self) -> Vec<Padding> {
        match self.block_mode {
            BlockMode::Ecb | BlockMode::Cbc if self.pbe_active => vec![Padding::Pkcs7],
            BlockMode::Ecb | BlockMode::Cbc => vec![Padding::Pkcs7, Padding::ZeroByte],
            _ => vec![Padding::None],
        }
    }

    /// Integrity options legal for the current integrity kind.
    pub fn valid_integrity_options(&self) -> Vec<IntegrityOption> {
        match self.integrity_kind {
            IntegrityKind::Digest => vec![
                IntegrityOption::Sha256,
                IntegrityOption::AesCmac,
                IntegrityOption::HmacSha256,
            ],
            IntegrityKind::Dsa => vec![IntegrityOption::Sha256],
        }
    }

    /// PRF digest implied by the PBE algorithm and cipher.
    pub fn derived_pbe_digest(&self) -> PbeDigest {
        match (self.pbe_algorithm, self.cipher_algorithm) {
            (PbeAlgorithm::Scrypt, _) => PbeDigest::Gcm,
            (PbeAlgorithm::Pbkdf2, CipherAlgorithm::Aes) => PbeDigest::Sha256,
            (PbeAlgorithm::Pbkdf2, CipherAlgorithm::Rc4) => PbeDigest::Sha1,
        }
    }

    /// Key sizes in bits legal for the current selections.
    ///
    /// Without PBE the full range of the cipher applies; each PBE pairing
    /// fixes a single size.
    pub fn valid_key_sizes(&self) -> Vec<u32> {
        if !self.pbe_active {
            return match self.cipher_algorithm {
                CipherAlgorithm::Aes => AES_KEY_SIZES.to_vec(),
                CipherAlgorithm::Rc4 => RC4_KEY_SIZES.to_vec(),
            };
        }
        match (self.pbe_algorithm, self.cipher_algorithm) {
            (PbeAlgorithm::Scrypt, _) => vec![256],
            (PbeAlgorithm::Pbkdf2, CipherAlgorithm::Aes) => vec![128],
            (PbeAlgorithm::Pbkdf2, CipherAlgorithm::Rc4) => vec![40],
        }
    }

    /// Snapshot of every legal value for the current selections.
    pub fn options(&self) -> OptionSet {
        OptionSet {
            algorithms: self.valid_algorithms(),
            key_sizes: self.valid_key_sizes(),
            block_modes: self.valid_block_modes(),
            paddings: self.valid_paddings(),
            pbe_algorithms: if self.cipher_algorithm == CipherAlgorithm::Rc4 {
                vec![PbeAlgorithm::Pbkdf2]
            } else {
                PbeAlgorithm::ALL.to_vec()
            },
            pbe_digest: self.derived_pbe_digest(),
            integrity_options: self.valid_integrity_options(),
        }
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    /// Turns encryption on or off. Turning it off also turns PBE off.
    pub fn set_encrypt_active(&mut self, active: bool) {
        self.encrypt_active = active;
        if !active {
            self.pbe_active = false;
        }
        self.renarrow();
    }

    /// Turns PBE on or off. Turning it on also turns encryption on.
    pub fn set_pbe_active(&mut self, active: bool) {
        self.pbe_active = active;
        if active {
            self.encrypt_active = true;
        }
        self.renarrow();
    }

    /// Turns integrity protection on or off.
    pub fn set_integrity_active(&mut self, active: bool) {
        self.integrity_active = active;
    }

    /// Selects the key derivation function.
    pub fn set_pbe_algorithm(&mut self, algorithm: PbeAlgorithm) -> Result<(), ConfigError> {
        if self.pbe_active
            && algorithm == PbeAlgorithm::Scrypt
            && self.cipher_algorithm == CipherAlgorithm::Rc4
        {
            return Err(ConfigError::Unsupported {
                field: "pbe_algorithm",
                value: format!("{} with {}", algorithm, self.cipher_algorithm),
            });
        }
        self.pbe_algorithm = algorithm;
        self.renarrow();
        Ok(())
    }

    /// Selects the cipher.
    pub fn set_cipher_algorithm(&mut self, algorithm: CipherAlgorithm) -> Result<(), ConfigError> {
        check_member("cipher_algorithm", &algorithm, &self.valid_algorithms())?;
        self.cipher_algorithm = algorithm;
        self.renarrow();
        Ok(())
    }

    /// Selects the key size in bits.
    pub fn set_key_size(&mut self, bits: u32) -> Result<(), ConfigError> {
        check_member("key_size", &bits, &self.valid_key_sizes())?;
        self.key_size = bits;
        Ok(())
    }

    /// Selects the block mode.
    pub fn set_block_mode(&mut self, mode: BlockMode) -> Result<(), ConfigError> {
        check_member("block_mode", &mode, &self.valid_block_modes())?;
        self.block_mode = mode;
        self.renarrow();
        Ok(())
    }

    /// Selects the padding.
    pub fn set_padding(&mut self, padding: Padding) -> Result<(), ConfigError> {
        check_member("padding", &padding, &self.valid_paddings())?;
        self.padding = padding;
        Ok(())
    }

    /// Selects the integrity mechanism.
    pub fn set_integrity_kind(&mut self, kind: IntegrityKind) {
        self.integrity_kind = kind;
        self.renarrow();
    }

    /// Selects the integrity algorithm.
    pub fn set_integrity_option(&mut self, option: IntegrityOption) -> Result<(), ConfigError> {
        check_member("integrity_option", &option, &self.valid_integrity_options())?;
        self.integrity_option = option;
        Ok(())
    }

    /// Sets the PBE password.
    pub fn set_password(&mut self, password: &str) {
        self.pbe_password = Some(SecretBytes::from(password));
    }

    /// Snaps every dependent field to its first legal value when the
    /// current one fell out of the legal set.
    fn renarrow(&mut self) {
        let legal = self.valid_algorithms();
        narrow(&mut self.cipher_algorithm, &legal);
        let legal = self.valid_key_sizes();
        narrow(&mut self.key_size, &legal);
        let legal = self.valid_block_modes();
        narrow(&mut self.block_mode, &legal);
        let legal = self.valid_paddings();
        narrow(&mut self.padding, &legal);
        let legal = self.valid_integrity_options();
        narrow(&mut self.integrity_option, &legal);
        self.pbe_digest = self.derived_pbe_digest();
    }

    // ------------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------------

    /// Checks that every active selection is legal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pbe_active && !self.encrypt_active {
            return Err(ConfigError::Inconsistent(
                "password-based encryption requires encryption".to_string(),
            ));
        }

        if self.encrypt_active {
            check_member("cipher_algorithm", &self.cipher_algorithm, &self.valid_algorithms())?;
            check_member("key_size", &self.key_size, &self.valid_key_sizes())?;
            check_member("block_mode", &self.block_mode, &self.valid_block_modes())?;
            check_member("padding", &self.padding, &self.valid_paddings())?;
        }

        if self.pbe_active && self.pbe_digest != self.derived_pbe_digest() {
            return Err(ConfigError::Unsupported {
                field: "pbe_digest",
                value: self.pbe_digest.to_string(),
            });
        }

        if self.integrity_active {
            check_member(
                "integrity_option",
                &self.integrity_option,
                &self.valid_integrity_options(),
            )?;
        }

        Ok(())
    }

    /// Key length in bytes.
    pub fn key_len(&self) -> usize {
        (self.key_size / 8) as usize
    }

    /// The record as persisted, with every secret field cleared.
    pub fn redacted_for_storage(&self) -> CryptoConfig {
        let mut record = self.clone();
        record.pbe_password = None;
        record.key = None;
        record.digest_key = None;
        record.signature_public_key = None;
        record.signature_private_key = None;
        record
    }
}

fn check_member<T>(field: &'static str, value: &T, legal: &[T]) -> Result<(), ConfigError>
where
    T: PartialEq + std::fmt::Display,
{
    if legal.contains(value) {
        Ok(())
    } else {
        Err(ConfigError::Unsupported {
            field,
            value: value.to_string(),
        })
    }
}

fn narrow<T: PartialEq + Copy>(value: &mut T, legal: &[T]) {
    if !legal.contains(value) {
        if let Some(first) = legal.first() {
            *value = *first;
        }
    }
}

/// Every legal value for a configuration, as offered to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSet {
    /// Ciphers.
    pub algorithms: Vec<CipherAlgorithm>,
    /// Key sizes in bits.
    pub key_sizes: Vec<u32>,
    /// Block modes.
    pub block_modes: Vec<BlockMode>,
    /// Paddings.
    pub paddings: Vec<Padding>,
    /// Key derivation functions.
    pub pbe_algorithms: Vec<PbeAlgorithm>,
    /// PRF digest the PBE selection implies.
    pub pbe_digest: PbeDigest,
    /// Integrity algorithms.
    pub integrity_options: Vec<IntegrityOption>,
}
