use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use statescriber::Config;
use statescriber::diagram::{FiniteStateMachine, StateId};
use statescriber::export::{self, ExportFormat, ExportSettings};
use statescriber::session::{self, LoadReport};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("STATESCRIBER_GIT_HASH"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "statescriber")]
#[command(
    version,
    long_version = LONG_VERSION,
    about = "Finite-state-machine diagram engine: inspect and export saved diagrams"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a saved diagram to PNG, SVG or JSON
    Export {
        /// Session file or exported JSON document (plain or gzip)
        file: PathBuf,

        #[arg(long, short = 'f', value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,

        /// Scale factor (defaults to export.scale from the config)
        #[arg(long, short = 's')]
        scale: Option<f64>,

        /// Output path (defaults to FILE with the format's extension)
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Print a summary of a saved diagram
    Info {
        /// Session file or exported JSON document (plain or gzip)
        file: PathBuf,
    },

    /// Write the documented default config to ~/.config/statescriber/config.toml
    InitConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Png,
    Svg,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Svg => ExportFormat::Svg,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::InitConfig => {
            let path = Config::create_default_file()?;
            println!("Wrote default config to {}", path.display());
        }
        Command::Info { file } => {
            let config = load_config();
            let (machine, report) = load_machine(&file, &config)?;
            print_info(&machine, &report);
        }
        Command::Export {
            file,
            format,
            scale,
            output,
        } => {
            let config = load_config();
            let (machine, report) = load_machine(&file, &config)?;
            if report.dropped_transitions > 0 {
                log::warn!(
                    "{} transition(s) referenced missing states and were skipped",
                    report.dropped_transitions
                );
            }

            let format = ExportFormat::from(format);
            let mut settings = ExportSettings::from_config(&config);
            if let Some(scale) = scale {
                if !scale.is_finite() || scale <= 0.0 {
                    bail!("--scale must be a positive number, got {scale}");
                }
                settings.scale = scale;
            }

            let output = output.unwrap_or_else(|| file.with_extension(format.extension()));
            if output == file {
                bail!(
                    "refusing to overwrite {}; pass --output",
                    file.display()
                );
            }

            export::export_to_path(&machine, format, &settings, &output)
                .with_context(|| format!("failed to export {}", output.display()))?;
            println!("Exported {}", output.display());
        }
    }

    Ok(())
}

/// User config, or defaults if it is missing or broken.
fn load_config() -> Config {
    Config::load().unwrap_or_else(|err| {
        log::warn!("{err:#}; using default settings");
        Config::default()
    })
}

fn load_machine(path: &Path, config: &Config) -> Result<(FiniteStateMachine, LoadReport)> {
    let max_bytes = config
        .session
        .max_file_size_mb
        .saturating_mul(1024 * 1024)
        .max(1);
    let loaded = session::read_document_file(path, max_bytes)?;

    let mut machine = FiniteStateMachine::new();
    let report = session::load_document(&mut machine, &loaded.document, &AtomicBool::new(false))
        .with_context(|| format!("failed to load diagram from {}", path.display()))?;
    Ok((machine, report))
}

fn print_info(machine: &FiniteStateMachine, report: &LoadReport) {
    let info = &machine.info;
    println!("Name: {}", info.name);
    if !info.description.is_empty() {
        println!("Description: {}", info.description);
    }
    println!("Id: {}", info.id);
    println!("Canvas: {}x{}", info.width, info.height);
    println!("States: {}", machine.states().len());
    println!("Transitions: {}", machine.transitions().len());
    println!("Initial states: {}", join_ids(&machine.initial_states()));
    println!("Final states: {}", join_ids(&machine.final_states()));
    println!("Dropped transitions: {}", report.dropped_transitions);
    println!("Pruned free ends: {}", report.pruned_markers);
}

fn join_ids(ids: &[StateId]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
