use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::data::model::{Dataset, Measurement};
use crate::pipeline::{extract_features, FeatureResult, ProcessingParams};

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

/// One extracted measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRow {
    pub name: String,
    pub result: FeatureResult,
}

impl ExtractedRow {
    /// `false` when the peak selector fell back to its 0.0 sentinel.
    pub fn is_resolved(&self) -> bool {
        self.result.peak_wavelength != 0.0 && self.result.peak_wavelength.is_finite()
    }
}

/// A measurement the pipeline rejected, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMeasurement {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Extracted measurements, in dataset order.
    pub rows: Vec<ExtractedRow>,
    pub skipped: Vec<SkippedMeasurement>,
}

impl BatchReport {
    pub fn resolved_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_resolved()).count()
    }
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// Run the pipeline over every measurement.
///
/// Curves are independent, so they are processed in parallel. A failing
/// measurement is logged and listed in [`BatchReport::skipped`]; it never
/// stops the rest of the batch.
pub fn process_dataset(dataset: &Dataset, params: &ProcessingParams) -> BatchReport {
    let outcomes: Vec<(&Measurement, _)> = dataset
        .measurements
        .par_iter()
        .map(|m| (m, extract_features(&m.curve, params)))
        .collect();

    let mut report = BatchReport::default();
    for (measurement, outcome) in outcomes {
        match outcome {
            Ok(result) => report.rows.push(ExtractedRow {
                name: measurement.name.clone(),
                result,
            }),
            Err(err) => {
                log::warn!("skipping {}: {err}", measurement.name);
                report.skipped.push(SkippedMeasurement {
                    name: measurement.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    log::info!(
        "processed {} measurements: {} extracted ({} resolved), {} skipped",
        dataset.len(),
        report.rows.len(),
        report.resolved_count(),
        report.skipped.len()
    );
    report
}

// ---------------------------------------------------------------------------
// CSV report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    peak_wavelength: f64,
    fwhm: f64,
    height: f64,
    baseline: f64,
    resolved: bool,
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Write one row per extracted measurement to any writer.
pub fn write_report<W: std::io::Write>(report: &BatchReport, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in &report.rows {
        csv_writer
            .serialize(CsvRow {
                name: &row.name,
                peak_wavelength: round3(row.result.peak_wavelength),
                fwhm: round3(row.result.fwhm),
                height: round3(row.result.height),
                baseline: round3(row.result.baseline),
                resolved: row.is_resolved(),
            })
            .with_context(|| format!("writing report row for {}", row.name))?;
    }
    csv_writer.flush().context("flushing report")?;
    Ok(())
}

/// Write the report as CSV; values are rounded to 3 decimals here only.
pub fn write_report_csv(report: &BatchReport, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_report(report, file)?;
    log::info!("wrote {} rows to {}", report.rows.len(), path.display());
    Ok(())
}
