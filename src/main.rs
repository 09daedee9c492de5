use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use scatter_sweep::app::render;
use scatter_sweep::collect::ResultCollector;
use scatter_sweep::config::{RunConfig, PRESETS};
use scatter_sweep::correction::mantid::MantidCorrection;
use scatter_sweep::correction::{Announced, CorrectionParams};
use scatter_sweep::experiment::build_experiment;
use scatter_sweep::export::export_file;
use scatter_sweep::sweep::{sweep_each, SweepParameter};

/// Sweep the element size of a scattering correction and compare the results
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Built-in benchmark
    #[arg(short, long, default_value = "multiple-scattering", value_parser = PRESETS)]
    preset: String,

    /// JSON configuration, replaces the preset
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Element sizes in mm, comma separated, in plotting order
    #[arg(long, value_delimiter = ',')]
    values: Option<Vec<f64>>,

    /// Spectrum indices to compare, comma separated
    #[arg(long, value_delimiter = ',')]
    spectra: Option<Vec<usize>>,

    /// Python interpreter with the mantid package
    #[arg(long, default_value = "python3")]
    python: PathBuf,

    /// Save the curves to a .csv, .json or .parquet file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Do not open the plot window
    #[arg(long)]
    no_plot: bool,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => RunConfig::preset(&cli.preset)
            .with_context(|| format!("unknown preset '{}'", cli.preset))?,
    };
    if let Some(values) = &cli.values {
        config.sweep.values = values.clone();
    }
    if let Some(spectra) = &cli.spectra {
        config.sweep.spectra = spectra.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let experiment = build_experiment(&config.experiment).context("building experiment")?;
    let parameter = SweepParameter::new(config.sweep.values.clone())?;
    let swept = config.sweep.correction.swept;
    let backend = Announced::new(MantidCorrection::new(&cli.python), |params: &CorrectionParams| {
        println!("{swept} = {}", params.value)
    });

    let mut collector = ResultCollector::new(&config.plot.unit);
    sweep_each(
        &experiment,
        &parameter,
        &backend,
        &config.sweep.correction,
        &config.sweep.spectra,
        |result| collector.push(result),
    )
    .with_context(|| format!("sweeping {}", config.sweep.correction.correction.algorithm()))?;

    if let Some(path) = &cli.export {
        export_file(&collector, path)?;
    }

    if !cli.no_plot {
        let title = format!(
            "{} – {swept} sweep",
            config.sweep.correction.correction.algorithm()
        );
        render(collector, config.plot, &title)?;
    }
    Ok(())
}
