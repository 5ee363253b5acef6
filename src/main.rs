//! marcid-list: print the identifier of every MARC record in a file.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use marcid::{list_identifiers, ListConfig, Loader, RecoveryMode};

#[derive(Parser, Debug)]
#[command(
    name = "marcid-list",
    version,
    about = "List the identifiers of the MARC records in a file"
)]
struct Cli {
    /// Input file name (a local path, or an s3:// name when --local is given)
    #[arg(long)]
    infile: String,
    /// Local copy of a remote input
    #[arg(long)]
    local: Option<PathBuf>,
    /// Validate the framing of the whole file before listing
    #[arg(long)]
    validate: bool,
    /// Do not fold continuation records sharing an identifier
    #[arg(long)]
    no_read_ahead: bool,
    /// Fail on records with a bad length header instead of recovering
    #[arg(long)]
    strict: bool,
}

impl From<Cli> for ListConfig {
    fn from(cli: Cli) -> Self {
        ListConfig {
            infile: cli.infile,
            local: cli.local,
            validate_first: cli.validate,
            read_ahead: !cli.no_read_ahead,
            recovery_mode: if cli.strict {
                RecoveryMode::Strict
            } else {
                RecoveryMode::Lenient
            },
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(&ListConfig::from(Cli::parse())) {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run(config: &ListConfig) -> Result<()> {
    let path = config.local_path()?;
    let mut loader = Loader::open(&path, &config.infile)
        .with_context(|| format!("cannot open {}", path.display()))?
        .with_recovery_mode(config.recovery_mode);

    if config.validate_first {
        let count = loader
            .validate()
            .with_context(|| format!("{} failed validation", path.display()))?;
        info!("{count} records validated");
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let count = list_identifiers(&mut loader, config.read_ahead, &mut out)
        .with_context(|| format!("listing identifiers from {}", path.display()))?;
    out.flush().context("writing identifiers")?;

    if let Some(stats) = loader.recovery_stats() {
        if stats.total() > 0 {
            warn!(
                "recovered {} records with a bad length ({} truncated, {} extended)",
                stats.total(),
                stats.truncated,
                stats.extended
            );
        }
    }
    loader.done();

    info!("listed {count} identifiers");
    Ok(())
}
