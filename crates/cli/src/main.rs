//! `ksr-ceremony` — wires YAML configuration, the soft-HSM signer, the XML
//! codec, and the ceremony orchestrator into one binary, with logging and
//! config setup kept out of the core crates entirely.

mod bootstrap;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use ksr_ceremony_application::CeremonyInputs;
use ksr_ceremony_infrastructure::{write_atomically, SoftHsmSigner, XmlCodec};

use bootstrap::config::{load_config, CliOverrides};
use bootstrap::logging::init_logging;

#[derive(Parser)]
#[command(name = "ksr-ceremony", about = "Root-zone KSK signing ceremony tool")]
struct Cli {
    /// Increase log verbosity; repeat for trace-level output.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all but error-level logging.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a signing ceremony over a KSR, producing a signed SKR.
    Sign {
        /// YAML ceremony configuration.
        #[arg(long)]
        config: PathBuf,

        /// KSR document to sign.
        #[arg(long)]
        ksr: PathBuf,

        /// Previous cycle's SKR, for chain-linkage checks. Omit for the
        /// first ceremony in a chain.
        #[arg(long = "prev-skr")]
        prev_skr: Option<PathBuf>,

        /// Destination for the produced SKR.
        #[arg(long)]
        out: PathBuf,

        /// Ceremony timestamp, as UNIX seconds or an RFC 3339 date-time.
        /// Defaults to the system clock, read exactly once, here.
        #[arg(long)]
        now: Option<String>,

        /// Named schema (`normal`, `pre-publish`, `rollover`, `revoke`, or
        /// a `+` variant). Overrides the config file's `schema_name`.
        #[arg(long)]
        schema: Option<String>,

        /// Directory holding the soft-HSM's one-PKCS#8-file-per-label key
        /// store.
        #[arg(long = "hsm-dir")]
        hsm_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(verbosity_level(cli.verbose, cli.quiet));

    let exit_code = match &cli.command {
        Command::Sign { config, ksr, prev_skr, out, now, schema, hsm_dir } => {
            run_sign(config, ksr, prev_skr.as_deref(), out, now.as_deref(), schema.as_deref(), hsm_dir)
        }
    };

    std::process::exit(exit_code);
}

fn verbosity_level(verbose: u8, quiet: bool) -> tracing::Level {
    if quiet {
        return tracing::Level::ERROR;
    }
    match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

#[allow(clippy::too_many_arguments)]
fn run_sign(
    config_path: &Path,
    ksr_path: &Path,
    prev_skr_path: Option<&Path>,
    out_path: &Path,
    now: Option<&str>,
    schema: Option<&str>,
    hsm_dir: &Path,
) -> i32 {
    let overrides = CliOverrides { schema_name: schema.map(str::to_string) };
    let config = match load_config(config_path, overrides) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "failed to load configuration");
            return ksr_ceremony_domain::CoreError::ConfigurationError(err.to_string()).exit_code();
        }
    };

    let ksr_xml = match fs::read(ksr_path) {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(path = %ksr_path.display(), %err, "failed to read KSR");
            return 2;
        }
    };

    let prev_skr_xml = match prev_skr_path.map(fs::read).transpose() {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(%err, "failed to read previous SKR");
            return 2;
        }
    };

    let schema_name = schema
        .map(str::to_string)
        .or_else(|| config.schema_name.clone())
        .unwrap_or_else(|| "normal".to_string());

    let now = match now.map(parse_now).transpose() {
        Ok(now) => now.unwrap_or_else(current_unix_time),
        Err(err) => {
            error!(%err, "invalid --now value");
            return ksr_ceremony_domain::CoreError::ConfigurationError(err).exit_code();
        }
    };

    let codec = XmlCodec;
    let signer = SoftHsmSigner::new(hsm_dir);

    let inputs = CeremonyInputs {
        ksr_xml: &ksr_xml,
        previous_skr_xml: prev_skr_xml.as_deref(),
        config: &config,
        schema_name: &schema_name,
        now,
    };

    match ksr_ceremony_application::run_ceremony(inputs, &codec, &signer) {
        Ok(skr_xml) => match write_atomically(out_path, &skr_xml) {
            Ok(()) => {
                info!(out = %out_path.display(), "ceremony complete");
                0
            }
            Err(err) => {
                error!(%err, "failed to write SKR");
                3
            }
        },
        Err(err) => {
            error!(%err, "ceremony failed");
            err.exit_code()
        }
    }
}

/// The one place this binary reads the system clock; every core crate
/// takes "now" as an explicit parameter instead.
fn current_unix_time() -> u32 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as u32).unwrap_or(0)
}

/// Accepts either bare UNIX seconds or an RFC 3339 date-time, so an
/// operator can write `--now 2026-04-01T00:00:00Z` in a rehearsal script.
fn parse_now(text: &str) -> Result<u32, String> {
    if let Ok(seconds) = text.parse::<u32>() {
        return Ok(seconds);
    }
    chrono::DateTime::parse_from_rfc3339(text)
        .map_err(|e| format!("{text:?} is neither UNIX seconds nor RFC 3339: {e}"))
        .and_then(|dt| {
            u32::try_from(dt.timestamp()).map_err(|_| format!("{text:?} is outside the representable time range"))
        })
}
