use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::{Parser, ValueEnum};
use parquet::arrow::ArrowWriter;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Parquet,
    Csv,
    Both,
}

#[derive(Parser)]
#[command(name = "generate_sample", about = "Write synthetic transmission spectra")]
struct Cli {
    /// Output path without extension
    #[arg(short, long, default_value = "sample_data")]
    out: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Format::Parquet)]
    format: Format,

    /// Noise standard deviation in percent transmission
    #[arg(long, default_value_t = 0.05)]
    noise: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// One synthetic measurement.
struct Row {
    x: Vec<f64>,
    y: Vec<f64>,
    sample: String,
    centre: f64,
    depth: f64,
    id: i64,
}

fn dip(x: f64, mu: f64, sigma: f64, depth: f64) -> f64 {
    depth * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// 100 % baseline minus Gaussian dips, plus noise.
fn transmission_spectrum(
    wavelengths: &[f64],
    dips: &[(f64, f64, f64)],
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| {
            let absorbed: f64 = dips
                .iter()
                .map(|&(mu, sigma, depth)| dip(wl, mu, sigma, depth))
                .sum();
            100.0 - absorbed + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn build_rows(noise: f64, rng: &mut SimpleRng) -> Vec<Row> {
    // 400 → 900 nm, step 0.5
    let wavelengths: Vec<f64> = (0..1000).map(|i| 400.0 + i as f64 * 0.5).collect();

    // (name, resonance sigma, secondary dip (centre, sigma, depth))
    let samples: [(&str, f64, Option<(f64, f64, f64)>); 3] = [
        ("grating_A", 18.0, None),
        ("grating_B", 25.0, Some((520.0, 15.0, 12.0))),
        ("grating_C", 12.0, Some((810.0, 20.0, 8.0))),
    ];
    let centres = [610.0, 640.0, 670.0, 700.0];
    let depths = [20.0, 40.0];

    let mut rows = Vec::new();
    for &(sample, sigma, secondary) in &samples {
        for &centre in &centres {
            for &depth in &depths {
                let mut dips = vec![(centre, sigma, depth)];
                dips.extend(secondary);
                rows.push(Row {
                    x: wavelengths.clone(),
                    y: transmission_spectrum(&wavelengths, &dips, noise, rng),
                    sample: sample.to_string(),
                    centre,
                    depth,
                    id: rows.len() as i64,
                });
            }
        }
    }
    rows
}

fn list_array(values: impl Iterator<Item = Vec<f64>>) -> arrow::array::ListArray {
    let mut builder = ListBuilder::new(Float64Builder::new());
    for row in values {
        builder.values().append_slice(&row);
        builder.append(true);
    }
    builder.finish()
}

fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let item = Arc::new(Field::new("item", DataType::Float64, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::List(item.clone()), false),
        Field::new("y", DataType::List(item), false),
        Field::new("sample", DataType::Utf8, false),
        Field::new("centre_nm", DataType::Float64, false),
        Field::new("depth", DataType::Float64, false),
        Field::new("measurement_id", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(list_array(rows.iter().map(|r| r.x.clone()))),
            Arc::new(list_array(rows.iter().map(|r| r.y.clone()))),
            Arc::new(StringArray::from(
                rows.iter().map(|r| r.sample.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.centre).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.depth).collect::<Vec<_>>())),
            Arc::new(Int64Array::from(rows.iter().map(|r| r.id).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["x", "y", "sample", "centre_nm", "depth", "measurement_id"])?;
    for r in rows {
        writer.write_record([
            join_floats(&r.x),
            join_floats(&r.y),
            r.sample.clone(),
            r.centre.to_string(),
            r.depth.to_string(),
            r.id.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);
    let rows = build_rows(cli.noise, &mut rng);

    if matches!(cli.format, Format::Parquet | Format::Both) {
        let path = cli.out.with_extension("parquet");
        write_parquet(&rows, &path)?;
        log::info!("wrote {} spectra to {}", rows.len(), path.display());
    }
    if matches!(cli.format, Format::Csv | Format::Both) {
        let path = cli.out.with_extension("csv");
        write_csv(&rows, &path)?;
        log::info!("wrote {} spectra to {}", rows.len(), path.display());
    }
    Ok(())
}
