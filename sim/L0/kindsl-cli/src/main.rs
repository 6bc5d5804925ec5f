//! urdf2kindsl: convert a URDF robot model to a Kinematics-DSL model.
//!
//! # Usage
//!
//! - `urdf2kindsl robot.urdf` - Write the converted model to stdout
//! - `urdf2kindsl robot.urdf -o robot.kindsl --prune-fixed-joints` - Remove
//!   dummy links and write to a file
//! - `urdf2kindsl robot.urdf --link-origin tool0` - Print the origin of a link
//!   in base coordinates (no conversion)
//!
//! Logging goes to stderr. `RUST_LOG` takes precedence over `--log-level`.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use nalgebra::Vector3;
use sim_kindsl::rotation::round_vector;
use sim_kindsl::{
    ConvertOptions, KindslWriter, NumFormatter, convert, link_origin, parse_urdf_file,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Convert a URDF model to a Kinematics-DSL model
#[derive(Debug, Parser)]
#[command(name = "urdf2kindsl")]
#[command(about = "Convert a URDF model to a Kinematics-DSL model", long_about = None)]
#[command(version)]
struct Cli {
    /// Path of the URDF input file
    #[arg(value_name = "URDF-input")]
    urdf: PathBuf,

    /// Destination file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Max number of digits for the fractional part of a real number
    #[arg(long, default_value_t = 6)]
    digits: u32,

    /// Number of digits of the fractional part of an angle used to determine
    /// if it is equal to PI
    #[arg(long, default_value_t = 5)]
    pi_digits: u32,

    /// Declare the base as floating
    #[arg(long)]
    floating: bool,

    /// Prune fixed joints and child links - see also the following options
    #[arg(long)]
    prune_fixed_joints: bool,

    /// Convert pruned links to custom frames in the parent link (default)
    #[arg(long, overrides_with = "no_to_frames")]
    to_frames: bool,

    /// Drop the frames of pruned links
    #[arg(long, overrides_with = "to_frames")]
    no_to_frames: bool,

    /// Propagate up the tree the inertia of pruned links (default)
    #[arg(long, overrides_with = "no_lump_inertia")]
    lump_inertia: bool,

    /// Discard the inertia of pruned links
    #[arg(long, overrides_with = "lump_inertia")]
    no_lump_inertia: bool,

    /// Logging level
    #[arg(long, value_enum, default_value_t = LogLevel::Warning)]
    log_level: LogLevel,

    /// Print the origin of the frame of LINK in base coordinates, for the
    /// zero configuration (no conversion performed)
    #[arg(long, value_name = "LINK", help_heading = "URDF inspection")]
    link_origin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
        }
    }
}

impl Cli {
    fn convert_options(&self) -> ConvertOptions {
        ConvertOptions::default()
            .with_prune_fixed_joints(self.prune_fixed_joints)
            .with_migrate_frames(!self.no_to_frames)
            .with_lump_inertia(!self.no_lump_inertia)
    }

    fn writer(&self) -> KindslWriter {
        KindslWriter::new()
            .with_formatter(NumFormatter::new(self.digits, self.pi_digits))
            .with_floating(self.floating)
    }
}

/// Origin rounded to 5 decimals, as `(x, y, z)`.
fn format_origin(origin: &Vector3<f64>) -> String {
    // Adding zero turns -0.0 into 0.0
    let o = round_vector(origin, 5).map(|c| c + 0.0);
    format!("({}, {}, {})\n", o.x, o.y, o.z)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_filter())),
        )
        .init();

    let robot = parse_urdf_file(&cli.urdf)
        .with_context(|| format!("failed to read URDF model '{}'", cli.urdf.display()))?;

    let output = if let Some(link) = &cli.link_origin {
        format_origin(&link_origin(&robot, link)?)
    } else {
        let tree = convert(&robot, &cli.convert_options())
            .with_context(|| format!("failed to convert robot '{}'", robot.name))?;
        info!(
            links = tree.link_count(),
            joints = tree.joint_count(),
            "converted robot '{}'",
            robot.name
        );
        cli.writer().write_model(&tree)
    };

    match &cli.output {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("failed to write '{}'", path.display()))?,
        None => io::stdout().write_all(output.as_bytes())?,
    }
    Ok(())
}
