//! Converts an Abaqus input deck into a FrontISTR job.
//!
//! ```text
//! Usage: a2f <input.inp> [options]
//! ```
//!
//! The mesh (`<job>.msh`), control (`<job>.cnt`) and job (`hecmw_ctrl.dat`)
//! files are written to `<input dir>/<job>/` unless `--out` is given. The job
//! name defaults to the input file stem.
//!
//! Emission settings come from an optional JSON options file:
//!
//! ```bash
//! a2f bracket.inp --options nonlinear.json -v
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use a2f_io::{ConvertOptions, IoError, convert};
use clap::Parser;
use log::{error, info};

#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    after_help("Typical use: a2f model.inp --options run.json"),
    term_width(70),
    override_usage("a2f <input> [options]")
)]
struct Cli {
    /// Path to the Abaqus input deck
    #[arg(name = "input")]
    input: PathBuf,

    /// JSON file with emission options
    ///
    /// Fields left out take their defaults, see `ConvertOptions`.
    #[arg(short, long)]
    #[arg(value_name = "path")]
    options: Option<PathBuf>,

    /// Job name used for the .msh and .cnt files (input stem default)
    #[arg(short, long)]
    #[arg(value_name = "name")]
    job: Option<String>,

    /// Output directory (<input dir>/<job> default)
    #[arg(long)]
    #[arg(value_name = "dir")]
    out: Option<PathBuf>,

    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) {
    let result = stderrlog::new()
        .modules(vec![module_path!(), "a2f_io", "a2f_convert", "a2f_model"])
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init();
    if let Err(err) = result {
        eprintln!("logging unavailable: {err}");
    }
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

fn run(cli: &Cli) -> Result<(), IoError> {
    let mut options = match &cli.options {
        Some(path) => ConvertOptions::load(path)?,
        None => ConvertOptions::default(),
    };
    options.job_name = cli.job.clone().unwrap_or_else(|| input_stem(&cli.input));

    let out = match &cli.out {
        Some(dir) => dir.clone(),
        None => cli
            .input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&options.job_name),
    };

    info!("Converting \"{}\"", cli.input.display());
    let text = fs::read_to_string(&cli.input)?;
    let job = convert(&text, &options)?;
    for path in job.write_to_dir(&out)? {
        info!("  - {}", path.display());
    }
    Ok(())
}

#[doc(hidden)]
fn main() -> ExitCode {
    let cli = Cli::parse();

    // +2 makes INFO the default level
    logging_init(cli.verbose as usize + 2, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(1)
        }
    }
}
