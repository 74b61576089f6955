//! IR Patcher CLI
//!
//! Post-compilation step: patches `<BASENAME>.<ext>` for one dialect in place.

use clap::Parser as ClapParser;
use irpatch::{PatchError, PatchStatus, Patcher, PatcherConfig};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "irpatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Resolve magic identity functions in generated kernel IR and source",
    long_about = None
)]
struct Cli {
    /// Dialect: ir-plain (nvvm), ir-tagged (spir), c-style-a (cuda) or c-style-b (opencl).
    /// Unrecognized dialects are accepted and ignored.
    dialect: String,

    /// Base name of the file to patch, without extension
    basename: PathBuf,

    /// TOML configuration (extensions, calling convention, builtin overrides)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Builtin override: replace `declare ... @NAME(...)` with the contents of PATH
    #[arg(long = "override", value_name = "NAME=PATH")]
    overrides: Vec<String>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "irpatch=warn" } else { "irpatch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), PatchError> {
    let config = load_config(cli.config.as_deref(), &cli.overrides)?;
    let patcher = Patcher::new(config);

    let Some(report) = patcher.patch_tag(&cli.dialect, &cli.basename)? else {
        info!("Nothing to do for dialect '{}'", cli.dialect);
        return Ok(());
    };

    match report.status {
        PatchStatus::Missing => info!("{} does not exist, skipping", report.path.display()),
        PatchStatus::Unchanged => info!("{} needs no patching", report.path.display()),
        PatchStatus::Rewritten => info!(
            "Patched {} ({} magic IDs, {} attribute blocks removed, {} builtin overrides)",
            report.path.display(),
            report.patched_magic_ids.len(),
            report.attribute_blocks_removed,
            report.overrides_applied.len()
        ),
    }
    Ok(())
}

fn load_config(path: Option<&Path>, overrides: &[String]) -> Result<PatcherConfig, PatchError> {
    let mut config = match path {
        Some(path) => PatcherConfig::load(path)?,
        None => PatcherConfig::default(),
    };
    for spec in overrides {
        config = config.with_override_file(spec)?;
    }
    debug!("{} builtin overrides configured", config.overrides.len());
    Ok(config)
}
