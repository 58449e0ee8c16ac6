//! SealDoc CLI - Command line interface.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sealdoc_engine::{
    BlockMode, CipherAlgorithm, CryptoConfig, IntegrityKind, IntegrityOption, IntegrityStatus,
    Padding, PbeAlgorithm, Pipeline,
};
use sealdoc_storage::FileStore;

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "sealdoc")]
#[command(about = "SealDoc - Encrypt, sign and store text documents")]
#[command(version)]
struct Cli {
    /// Directory documents are resolved against
    #[arg(long, default_value = ".", env = "SEALDOC_DIR")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Protect a text and store it
    Save {
        /// Document path (without extension)
        path: PathBuf,
        /// Text file to read, or - for stdin
        #[arg(long, default_value = "-")]
        input: String,
        /// Password for --pbe
        #[arg(long, env = "SEALDOC_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[command(flatten)]
        protection: ProtectionArgs,
    },
    /// Load a stored document and print its text
    Load {
        /// Document path (without extension)
        path: PathBuf,
        /// Password, for documents saved with --pbe
        #[arg(long, env = "SEALDOC_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Show the legal options for a partial configuration
    Options {
        /// Plaintext length, to drop modes the text is too short for
        #[arg(long)]
        input_len: Option<usize>,
        #[command(flatten)]
        protection: ProtectionArgs,
    },
}

#[derive(Args, Debug)]
struct ProtectionArgs {
    /// Store the text unencrypted
    #[arg(long)]
    no_encrypt: bool,
    /// Cipher (aes, rc4)
    #[arg(long)]
    algorithm: Option<CipherAlgorithm>,
    /// Key size in bits
    #[arg(long)]
    key_size: Option<u32>,
    /// Block mode (none, ecb, cbc, gcm, ofb, cts)
    #[arg(long)]
    mode: Option<BlockMode>,
    /// Padding (none, pkcs7, zero-byte)
    #[arg(long)]
    padding: Option<Padding>,
    /// Derive the key from a password (pbkdf2, scrypt)
    #[arg(long)]
    pbe: Option<PbeAlgorithm>,
    /// Integrity mechanism (digest, dsa)
    #[arg(long)]
    integrity: Option<IntegrityKind>,
    /// Integrity algorithm (sha256, aes-cmac, hmac-sha256)
    #[arg(long)]
    integrity_option: Option<IntegrityOption>,
}

impl ProtectionArgs {
    /// Applies the flags in dependency order, so each setter sees the
    /// narrowed option lists of the ones before it.
    fn to_config(&self) -> Result<CryptoConfig> {
        let mut config = CryptoConfig::new();

        if self.no_encrypt {
            if self.pbe.is_some() {
                bail!("--pbe cannot be combined with --no-encrypt");
            }
            config.set_encrypt_active(false);
        }

        if let Some(pbe) = self.pbe {
            config
                .set_pbe_algorithm(pbe)
                .context("Invalid --pbe")?;
            config.set_pbe_active(true);
        }
        if let Some(algorithm) = self.algorithm {
            config
                .set_cipher_algorithm(algorithm)
                .context("Invalid --algorithm")?;
        }
        if let Some(bits) = self.key_size {
            config.set_key_size(bits).with_context(|| {
                format!("Invalid --key-size, expected one of {:?}", config.valid_key_sizes())
            })?;
        }
        if let Some(mode) = self.mode {
            config.set_block_mode(mode).context("Invalid --mode")?;
        }
        if let Some(padding) = self.padding {
            config.set_padding(padding).context("Invalid --padding")?;
        }

        if let Some(kind) = self.integrity {
            config.set_integrity_active(true);
            config.set_integrity_kind(kind);
        }
        if let Some(option) = self.integrity_option {
            config.set_integrity_active(true);
            config
                .set_integrity_option(option)
                .context("Invalid --integrity-option")?;
        }

        Ok(config)
    }
}

// ============================================================================
// Commands
// ============================================================================

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read text from stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}

fn describe(config: &CryptoConfig) -> String {
    let cipher = if !config.encrypt_active {
        "unencrypted".to_string()
    } else if config.pbe_active {
        format!(
            "{}-{}/{}/{} from {} password",
            config.cipher_algorithm, config.key_size, config.block_mode, config.padding, config.pbe_algorithm
        )
    } else {
        format!(
            "{}-{}/{}/{}",
            config.cipher_algorithm, config.key_size, config.block_mode, config.padding
        )
    };

    if config.integrity_active {
        format!("{}, {} {}", cipher, config.integrity_kind, config.integrity_option)
    } else {
        cipher
    }
}

fn cmd_save(
    pipeline: &Pipeline<FileStore>,
    path: &Path,
    input: &str,
    password: Option<&str>,
    protection: &ProtectionArgs,
) -> Result<()> {
    let mut config = protection.to_config()?;
    if config.pbe_active {
        match password {
            Some(p) if !p.is_empty() => config.set_password(p),
            _ => bail!("--pbe needs a password (--password or SEALDOC_PASSWORD)"),
        }
    }

    let text = read_input(input)?;
    let saved = pipeline
        .save(path, config, &text)
        .with_context(|| format!("Failed to save {}", path.display()))?;

    println!(
        "Saved {} ({})",
        pipeline.store().record_path(path).display(),
        describe(&saved)
    );
    Ok(())
}

fn cmd_load(pipeline: &Pipeline<FileStore>, path: &Path, password: Option<&str>) -> Result<ExitCode> {
    let report = pipeline
        .load(path, password)
        .with_context(|| format!("Failed to load {}", path.display()))?;

    eprintln!("Integrity: {}", report.integrity);
    let text = report.plaintext.context("Failed to recover the text")?;
    print!("{}", text);

    if report.integrity == IntegrityStatus::Mismatch {
        eprintln!("Warning: the document does not match its integrity tag.");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_options(protection: &ProtectionArgs, input_len: Option<usize>) -> Result<()> {
    let config = protection.to_config()?;
    let mut options = config.options();
    if let Some(len) = input_len {
        options.block_modes = config.valid_block_modes_for_input(len);
    }
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(FileStore::new(&cli.dir));

    match cli.command {
        Commands::Save {
            path,
            input,
            password,
            protection,
        } => cmd_save(&pipeline, &path, &input, password.as_deref(), &protection)
            .map(|()| ExitCode::SUCCESS),
        Commands::Load { path, password } => cmd_load(&pipeline, &path, password.as_deref()),
        Commands::Options {
            input_len,
            protection,
        } => cmd_options(&protection, input_len).map(|()| ExitCode::SUCCESS),
    }
}
