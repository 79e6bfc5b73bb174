use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use schema_mixer_core::{merge_fragments, render_schema};
use schema_mixer_loader::{MixMode, MixerFile, PslParser, load_fragments, run_all, scan_directory};
use tracing::debug;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for `inspect`.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum InspectFormat {
    Json,
    Yaml,
    Prisma,
}

#[derive(Debug, Parser)]
#[command(name = "schema-mixer")]
#[command(about = "Merge Prisma schema fragments into one schema file")]
struct Cli {
    /// Config file (default: schema-mixer.yml, .yaml or .json in the working directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv).
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory that input and output paths are relative to.
    #[arg(long, global = true, default_value = ".")]
    cwd: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the configured mixers.
    Mix(MixArgs),
    /// List the schema files a directory scan picks up.
    Scan(ScanArgs),
    /// Load and merge schema files and print the result.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct MixArgs {
    /// Only run the named mixer. Repeatable.
    #[arg(long = "mixer")]
    mixers: Vec<String>,

    /// Print the rendered schemas instead of writing them.
    #[arg(long)]
    stdout: bool,
}

#[derive(Debug, Args)]
struct ScanArgs {
    /// Directory to scan recursively.
    dir: PathBuf,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Schema files, merged in the order given.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long, value_enum, default_value = "prisma")]
    format: InspectFormat,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Mix(args) => run_mix(cli.config.as_deref(), &cli.cwd, args),
        Command::Scan(args) => run_scan(&cli.cwd, args),
        Command::Inspect(args) => run_inspect(&cli.cwd, args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,schema_mixer_loader=info,schema_mixer_core=info".to_string(),
            2 => "info,schema_mixer_loader=debug,schema_mixer_core=debug".to_string(),
            _ => "debug,schema_mixer_loader=trace,schema_mixer_core=trace".to_string(),
        },
    };
    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(verbose >= 2)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(config: Option<&Path>, cwd: &Path) -> Result<MixerFile, String> {
    let path = match config {
        Some(path) => cwd.join(path),
        None => MixerFile::find_default(cwd).ok_or_else(|| {
            format!(
                "no schema-mixer.yml, schema-mixer.yaml or schema-mixer.json found in {}",
                cwd.display()
            )
        })?,
    };
    debug!(path = %path.display(), "loading config");
    MixerFile::load(&path).map_err(|err| format!("{}: {err}", path.display()))
}

fn run_mix(config: Option<&Path>, cwd: &Path, args: MixArgs) -> Result<(), String> {
    let config = load_config(config, cwd)?;
    let mixers = config.select(&args.mixers).map_err(|err| err.to_string())?;
    let mode = if args.stdout {
        MixMode::DryRun
    } else {
        MixMode::Write
    };

    let mut failures = Vec::new();
    for (name, result) in run_all(&mixers, cwd, &PslParser, mode) {
        match result {
            Ok(outcome) if args.stdout => print!("{}", outcome.rendered),
            Ok(outcome) => println!(
                "{}: merged {} of {} file(s) into {}",
                outcome.name,
                outcome.fragments,
                outcome.inputs.len(),
                outcome.output.display()
            ),
            Err(err) => {
                eprintln!("{name}: {err}");
                failures.push(name);
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} mixer(s) failed: {}", failures.len(), failures.join(", ")))
    }
}

fn run_scan(cwd: &Path, args: ScanArgs) -> Result<(), String> {
    let dir = cwd.join(&args.dir);
    if !dir.is_dir() {
        return Err(format!("{} is not a directory", dir.display()));
    }
    for path in scan_directory(&dir) {
        let shown = path.strip_prefix(cwd).unwrap_or(&path);
        println!("{}", shown.display());
    }
    Ok(())
}

fn run_inspect(cwd: &Path, args: InspectArgs) -> Result<(), String> {
    let paths: Vec<PathBuf> = args.files.iter().map(|file| cwd.join(file)).collect();
    let fragments = load_fragments(&paths, &PslParser);
    if fragments.is_empty() {
        return Err("none of the given files could be loaded".to_string());
    }

    let schema = merge_fragments(&fragments);
    let text = match args.format {
        InspectFormat::Json => {
            serde_json::to_string_pretty(&schema).map_err(|e| e.to_string())? + "\n"
        }
        InspectFormat::Yaml => serde_yaml::to_string(&schema).map_err(|e| e.to_string())?,
        InspectFormat::Prisma => render_schema(&schema).map_err(|e| e.to_string())?,
    };
    print!("{text}");
    Ok(())
}
