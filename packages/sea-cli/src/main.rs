//! SEA command-line tool
//!
//! Thin wrapper over `sea-core` for scripting and debugging:
//!
//! ```text
//! sea pair --out alice.json
//! sea sign --pair alice.json '{"hello":"world"}'
//! sea verify --pub <x.y> 'SEA{"m":...,"s":"..."}'
//! sea encrypt --secret hunter2 'some text'
//! sea certify --authority alice.json --certificants '*' --write inbox
//! ```
//!
//! Payload arguments are read as JSON when they parse, otherwise as plain
//! text. Results go to stdout; logs go to stderr (`RUST_LOG` controls them).

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde_json::Value;

use sea_core::crypto::envelope::parse_text;
use sea_core::{
    CertifyOptions, CipherKey, CipherOptions, Encoding, Identity, NativeProvider, Sea, SeaConfig,
    WorkOptions, WorkSalt,
};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sea", version, about = "SEA identities, signatures, encryption and certificates")]
struct Args {
    /// PBKDF2 iteration count used by `work`
    #[arg(long, default_value_t = 100_000, env = "SEA_PBKDF2_ITERATIONS", global = true)]
    pbkdf2_iterations: u32,

    /// Compatibility level for signature verification (2+ enables legacy digests)
    #[arg(long, default_value_t = 2, env = "SEA_FALLBACK", global = true)]
    fallback: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new identity
    Pair {
        /// Write the identity here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Sign a payload
    Sign {
        /// Identity file
        #[arg(long)]
        pair: PathBuf,
        /// Payload (JSON or text)
        data: String,
    },
    /// Verify a signed payload and print its message
    Verify {
        /// Signer's public key (`x.y`)
        #[arg(long = "pub")]
        pub_key: String,
        /// Signed payload
        data: String,
    },
    /// Encrypt a payload
    Encrypt {
        #[command(flatten)]
        key: KeyArgs,
        /// Field encoding: base64, hex or utf8
        #[arg(long, default_value = "base64")]
        encode: Encoding,
        /// Payload (JSON or text)
        data: String,
    },
    /// Decrypt a payload
    Decrypt {
        #[command(flatten)]
        key: KeyArgs,
        /// Field encoding: base64, hex or utf8
        #[arg(long, default_value = "base64")]
        encode: Encoding,
        /// Encrypted payload
        data: String,
    },
    /// Derive the secret shared with another identity
    Secret {
        /// Own identity file
        #[arg(long)]
        pair: PathBuf,
        /// Counterpart's encryption public key (`x.y`)
        epub: String,
    },
    /// Issue a certificate
    Certify {
        /// Authority identity file
        #[arg(long)]
        authority: PathBuf,
        /// Certificants: `*`, a public key, or a JSON list of keys
        #[arg(long)]
        certificants: String,
        /// Read policy (JSON or text)
        #[arg(long)]
        read: Option<String>,
        /// Write policy (JSON or text)
        #[arg(long)]
        write: Option<String>,
        /// Expiry, epoch seconds
        #[arg(long)]
        expiry: Option<f64>,
        /// Block list reference (JSON or text)
        #[arg(long)]
        block: Option<String>,
    },
    /// Print the key id of a public key
    Keyid {
        /// Public key (`x.y`)
        pub_key: String,
    },
    /// Stretch a password or hash a payload
    Work {
        /// Salt text (random if absent)
        #[arg(long)]
        salt: Option<String>,
        /// Algorithm: PBKDF2 or SHA-256
        #[arg(long)]
        name: Option<String>,
        /// Output encoding: base64, hex or utf8
        #[arg(long, default_value = "base64")]
        encode: Encoding,
        /// Payload (JSON or text)
        data: String,
    },
}

#[derive(clap::Args, Debug)]
struct KeyArgs {
    /// Identity file whose `epriv` is the key
    #[arg(long, conflicts_with = "secret")]
    pair: Option<PathBuf>,
    /// Shared secret or passphrase
    #[arg(long, env = "SEA_SECRET")]
    secret: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_pair(path: &Path) -> Result<Identity> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("reading identity from {}", path.display()))?;
    serde_json::from_str(&text).wrap_err_with(|| format!("parsing identity in {}", path.display()))
}

fn write_pair(path: &Path, pair: &Identity) -> Result<()> {
    let text = serde_json::to_string_pretty(pair)?;
    std::fs::write(path, text).wrap_err_with(|| format!("writing identity to {}", path.display()))
}

fn print_value(value: &Value) {
    match value {
        Value::String(s) => println!("{}", s),
        other => println!("{}", other),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn run(sea: &Sea, command: Command) -> Result<()> {
    match command {
        Command::Pair { out } => {
            let pair = sea.pair().await?;
            match out {
                Some(path) => {
                    write_pair(&path, &pair)?;
                    tracing::info!(
                        path = %path.display(),
                        pub_key = %pair.pub_key,
                        "Identity written"
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&pair)?),
            }
        }
        Command::Sign { pair, data } => {
            let pair = read_pair(&pair)?;
            println!("{}", sea.sign(parse_text(&data), &pair).await?);
        }
        Command::Verify { pub_key, data } => {
            let message = sea.verify(data, &pub_key).await?;
            print_value(&message);
        }
        Command::Encrypt { key, encode, data } => {
            let options = CipherOptions {
                encode: Some(encode),
                ..Default::default()
            };
            let pair = key.pair.as_deref().map(read_pair).transpose()?;
            let cipher_key = cipher_key(pair.as_ref(), key.secret.as_deref())?;
            println!("{}", sea.encrypt(parse_text(&data), cipher_key, &options).await?);
        }
        Command::Decrypt { key, encode, data } => {
            let options = CipherOptions {
                encode: Some(encode),
                ..Default::default()
            };
            let pair = key.pair.as_deref().map(read_pair).transpose()?;
            let cipher_key = cipher_key(pair.as_ref(), key.secret.as_deref())?;
            print_value(&sea.decrypt(data, cipher_key, &options).await?);
        }
        Command::Secret { pair, epub } => {
            let pair = read_pair(&pair)?;
            println!("{}", sea.secret(&epub, Some(&pair)).await?);
        }
        Command::Certify {
            authority,
            certificants,
            read,
            write,
            expiry,
            block,
        } => {
            let authority = read_pair(&authority)?;
            let mut policy = serde_json::Map::new();
            if let Some(read) = read {
                policy.insert("read".into(), parse_text(&read));
            }
            if let Some(write) = write {
                policy.insert("write".into(), parse_text(&write));
            }
            let options = CertifyOptions {
                expiry,
                block: block.as_deref().map(parse_text),
            };
            let cert = sea
                .certify(&parse_text(&certificants), &Value::Object(policy), &authority, &options)
                .await?;
            println!("{}", cert);
        }
        Command::Keyid { pub_key } => {
            println!("{}", sea.keyid(&pub_key)?);
        }
        Command::Work {
            salt,
            name,
            encode,
            data,
        } => {
            let options = WorkOptions {
                name,
                encode: Some(encode),
                ..Default::default()
            };
            let salt = salt.as_deref().map_or(WorkSalt::Random, WorkSalt::Text);
            println!("{}", sea.work(parse_text(&data), salt, &options).await?);
        }
    }
    Ok(())
}

fn cipher_key<'a>(pair: Option<&'a Identity>, secret: Option<&'a str>) -> Result<CipherKey<'a>> {
    match (pair, secret) {
        (Some(pair), _) => Ok(CipherKey::Pair(pair)),
        (None, Some(secret)) => Ok(CipherKey::Secret(secret)),
        (None, None) => Err(eyre!("either --pair or --secret is required")),
    }
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sea_core=warn,sea=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = SeaConfig {
        pbkdf2_iterations: args.pbkdf2_iterations,
        fallback: args.fallback,
        ..Default::default()
    };
    let sea = Sea::with_provider(NativeProvider::new(), config)?;

    run(&sea, args.command).await
}
