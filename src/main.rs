//! Summarise Les Houches Event Files into a table with one row per event.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};

use rapgap::{ColumnWriter, Delimiter, LhefSource, Summarizer, TableWriter};

/// Output table format.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Tab-separated values
    Tsv,
    /// Comma-separated values
    Csv,
}

impl From<Format> for Delimiter {
    fn from(format: Format) -> Self {
        match format {
            Format::Tsv => Delimiter::Tab,
            Format::Csv => Delimiter::Comma,
        }
    }
}

/// Event identifiers and rapidity gap ξ estimates for generated events.
#[derive(Parser)]
#[command(name = "rapgap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input event files, plain or gzip-compressed
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output file path [default: standard output]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output table format
    #[arg(short, long, value_enum, default_value = "tsv")]
    format: Format,

    /// Run number for events without run information
    #[arg(long, default_value = "1")]
    run: u32,

    /// Luminosity block for events without luminosity block information
    #[arg(long, default_value = "1")]
    lumi: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut writer = TableWriter::new(output, cli.format.into())?;
    let mut summarizer = Summarizer::new();
    let mut next_event = 1;

    for path in &cli.input {
        info!("Reading {}", path.display());
        let reader =
            rapgap::open(path).with_context(|| format!("Failed to read {}", path.display()))?;
        debug!("LHEF version {}, beam energies {:?}", reader.version(), reader.heprup().EBMUP);
        let mut source = LhefSource::new(reader)
            .with_run(cli.run)
            .with_lumi(cli.lumi)
            .with_first_event(next_event);
        let rows = rapgap::process(&mut source, &mut summarizer, &mut writer)
            .with_context(|| format!("Failed to process {}", path.display()))?;
        debug!("{rows} events in {}", path.display());
        next_event = source.next_event_number();
    }
    writer.finish()?;

    let stats = summarizer.stats();
    info!(
        "Wrote {} events ({} simulated, {} real data, {} without pileup information)",
        writer.rows(),
        stats.simulated(),
        stats.real_data,
        stats.without_pileup
    );
    Ok(())
}
