use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use resonance_finder::batch::{process_dataset, write_report, write_report_csv};
use resonance_finder::data::loader::load_path;
use resonance_finder::pipeline::{PeakType, ProcessingParams};

#[derive(Parser)]
#[command(
    name = "resonance-finder",
    version,
    about = "Extract resonance wavelength, FWHM, depth and baseline from transmission spectra"
)]
struct Cli {
    /// Input file or directory of spectra
    input: PathBuf,

    /// JSON file with processing parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output CSV report (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Apply boxcar smoothing with this many points
    #[arg(long)]
    smooth: Option<usize>,

    /// Normalise each curve to its maximum
    #[arg(long, default_value_t = false)]
    normalise: bool,

    /// Resample onto a uniform grid with this step (nm)
    #[arg(long)]
    interpolate: Option<f64>,

    /// Look for a transmission maximum instead of a minimum
    #[arg(long, default_value_t = false)]
    max: bool,
}

impl Cli {
    fn params(&self) -> Result<ProcessingParams> {
        let mut params = match &self.config {
            Some(path) => ProcessingParams::from_json_file(path)?,
            None => ProcessingParams::default(),
        };
        if let Some(points) = self.smooth {
            params.smooth = true;
            params.smooth_points = points;
        }
        if self.normalise {
            params.normalise = true;
        }
        if let Some(step) = self.interpolate {
            params.interpolate = true;
            params.sampling_rate = step;
        }
        if self.max {
            params.peak_type = PeakType::Max;
        }
        params.validate()?;
        Ok(params)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let params = cli.params()?;
    log::info!(
        "resonance-finder v{} on {} (peak type {})",
        env!("CARGO_PKG_VERSION"),
        cli.input.display(),
        params.peak_type
    );

    let dataset = load_path(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    if dataset.is_empty() {
        bail!("no spectra found in {}", cli.input.display());
    }

    let report = process_dataset(&dataset, &params);
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.name, skipped.reason);
    }

    match &cli.out {
        Some(path) => write_report_csv(&report, path)?,
        None => write_report(&report, std::io::stdout().lock())?,
    }
    Ok(())
}
