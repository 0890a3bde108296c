use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Curve, Dataset, Measurement, MetadataValue};

/// Extensions picked up when a directory is loaded.
const SUPPORTED_EXTENSIONS: &[&str] = &["parquet", "pq", "json", "csv", "tsv", "txt", "dat"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a file, or every supported file directly inside a directory.
pub fn load_path(path: &Path) -> Result<Dataset> {
    if !path.is_dir() {
        return load_file(path);
    }

    let mut entries: Vec<_> = std::fs::read_dir(path)
        .with_context(|| format!("listing {}", path.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && extension_of(p).is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str())))
        .collect();
    entries.sort();

    let mut dataset = Dataset::default();
    for entry in entries {
        match load_file(&entry) {
            Ok(ds) => dataset.extend(ds),
            Err(err) => log::warn!("skipping {}: {err:#}", entry.display()),
        }
    }
    Ok(dataset)
}

/// Load measurements from a single file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – Parquet file with `x` and `y` list columns
/// * `.json`    – `[{ "x": [...], "y": [...], ...meta }, ...]`
/// * `.csv`     – either columns `x` and `y` containing semicolon-separated
///   floats (one spectrum per row), or a two-column spectrometer export
/// * `.tsv` / `.txt` / `.dat` – two-column spectrometer export
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = extension_of(path).unwrap_or_default();
    log::info!("loading {}", path.display());

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => {
            if has_wide_header(path)? {
                load_wide_csv(path)
            } else {
                load_two_column(path)
            }
        }
        "tsv" | "txt" | "dat" => load_two_column(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("spectrum")
        .to_string()
}

/// Sort samples by wavelength and build a validated curve.
fn sorted_curve(x: Vec<f64>, y: Vec<f64>) -> Result<Curve> {
    if x.len() != y.len() {
        bail!("x has {} values but y has {}", x.len(), y.len());
    }
    let mut pairs: Vec<(f64, f64)> = x.into_iter().zip(y).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
    Ok(Curve::new(x, y)?)
}

fn row_name(stem: &str, row: usize, rows: usize) -> String {
    if rows == 1 {
        stem.to_string()
    } else {
        format!("{stem}#{row}")
    }
}

// ---------------------------------------------------------------------------
// Two-column spectrometer export
// ---------------------------------------------------------------------------

/// One `wavelength<sep>transmission` pair per line. Lines whose first two
/// fields are not numbers (headers, instrument preamble) are skipped.
fn load_two_column(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (x, y) = parse_two_column(&text).with_context(|| format!("parsing {}", path.display()))?;
    let curve = sorted_curve(x, y).with_context(|| format!("{}", path.display()))?;

    Ok(Dataset::from_measurements(vec![Measurement {
        name: file_stem(path),
        curve,
        metadata: BTreeMap::new(),
    }]))
}

pub(crate) fn parse_two_column(text: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    let delimiter = sniff_delimiter(text);
    let mut x = Vec::new();
    let mut y = Vec::new();

    let mut push = |fields: &[&str]| {
        if let [a, b, ..] = fields {
            if let (Ok(w), Ok(t)) = (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
                x.push(w);
                y.push(t);
            }
        }
    };

    match delimiter {
        Some(delim) => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .delimiter(delim)
                .from_reader(text.as_bytes());
            for (row_no, record) in reader.records().enumerate() {
                let record = record.with_context(|| format!("row {row_no}"))?;
                let fields: Vec<&str> = record.iter().collect();
                push(&fields);
            }
        }
        None => {
            for line in text.lines() {
                let fields: Vec<&str> = line.split_whitespace().collect();
                push(&fields);
            }
        }
    }

    if x.is_empty() {
        bail!("no numeric wavelength/transmission rows found");
    }
    Ok((x, y))
}

/// Tab, semicolon or comma, judged from the first line containing a digit;
/// `None` means whitespace-separated.
fn sniff_delimiter(text: &str) -> Option<u8> {
    let line = text
        .lines()
        .find(|l| l.trim_start().starts_with(|c: char| c.is_ascii_digit() || c == '-'))?;
    [b'\t', b';', b',']
        .into_iter()
        .find(|&d| line.contains(d as char))
}

// ---------------------------------------------------------------------------
// Wide CSV (one spectrum per row)
// ---------------------------------------------------------------------------

fn has_wide_header(path: &Path) -> Result<bool> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?;
    Ok(headers.iter().any(|h| h == "x") && headers.iter().any(|h| h == "y"))
}

/// CSV layout:  header row with column names.
/// `x` and `y` columns contain semicolon-separated floats:
///   `"400.0;400.5;401.0"`, `"98.1;97.9;98.4"`
/// All other columns are treated as metadata.
fn load_wide_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let x_idx = headers
        .iter()
        .position(|h| h == "x")
        .context("CSV missing 'x' column")?;
    let y_idx = headers
        .iter()
        .position(|h| h == "y")
        .context("CSV missing 'y' column")?;

    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<std::result::Result<_, _>>()
        .context("reading CSV rows")?;
    let stem = file_stem(path);
    let mut measurements = Vec::with_capacity(records.len());

    for (row_no, record) in records.iter().enumerate() {
        let x = parse_semicolon_floats(record.get(x_idx).unwrap_or(""), row_no, "x")?;
        let y = parse_semicolon_floats(record.get(y_idx).unwrap_or(""), row_no, "y")?;
        let curve = sorted_curve(x, y).with_context(|| format!("CSV row {row_no}"))?;

        let mut metadata = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == x_idx || col_idx == y_idx {
                continue;
            }
            if let Some(col_name) = headers.get(col_idx) {
                metadata.insert(col_name.clone(), guess_metadata_type(value));
            }
        }

        measurements.push(Measurement {
            name: row_name(&stem, row_no, records.len()),
            curve,
            metadata,
        });
    }

    Ok(Dataset::from_measurements(measurements))
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

fn guess_metadata_type(s: &str) -> MetadataValue {
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "x": [400.0, 400.5, ...], "y": [98.1, 97.9, ...], "sample": "A" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;
    let stem = file_stem(path);
    let mut measurements = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let x = json_array_to_f64(obj.get("x"), i, "x")?;
        let y = json_array_to_f64(obj.get("y"), i, "y")?;
        let curve = sorted_curve(x, y).with_context(|| format!("JSON row {i}"))?;

        let metadata = obj
            .iter()
            .filter(|(key, _)| key.as_str() != "x" && key.as_str() != "y")
            .map(|(key, val)| (key.clone(), json_to_metadata(val)))
            .collect();

        measurements.push(Measurement {
            name: row_name(&stem, i, records.len()),
            curve,
            metadata,
        });
    }

    Ok(Dataset::from_measurements(measurements))
}

fn json_array_to_f64(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Row {row}, {col}[{j}]: not a number"))
        })
        .collect()
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing transmission spectra.
///
/// Expected schema:
/// - `x`: List<Float64> or LargeList<Float64> – wavelength arrays (nm)
/// - `y`: List<Float64> or LargeList<Float64> – transmission arrays
/// - Any other columns are treated as metadata (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let total_rows = usize::try_from(builder.metadata().file_metadata().num_rows()).unwrap_or(0);
    let reader = builder.build().context("building parquet reader")?;

    let stem = file_stem(path);
    let mut measurements = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let x_idx = schema
            .index_of("x")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'x' column"))?;
        let y_idx = schema
            .index_of("y")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'y' column"))?;

        let x_col = batch.column(x_idx);
        let y_col = batch.column(y_idx);

        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != x_idx && *i != y_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let global_row = measurements.len();
            let x = extract_f64_list(x_col, row)
                .with_context(|| format!("Row {global_row}: failed to read 'x'"))?;
            let y = extract_f64_list(y_col, row)
                .with_context(|| format!("Row {global_row}: failed to read 'y'"))?;
            let curve = sorted_curve(x, y).with_context(|| format!("Parquet row {global_row}"))?;

            let metadata = meta_cols
                .iter()
                .map(|(col_idx, col_name)| {
                    (col_name.clone(), extract_metadata_value(batch.column(*col_idx), row))
                })
                .collect();

            measurements.push(Measurement {
                name: row_name(&stem, global_row, total_rows),
                curve,
                metadata,
            });
        }
    }

    Ok(Dataset::from_measurements(measurements))
}

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => col
            .as_any()
            .downcast_ref::<ListArray>()
            .context("expected ListArray")?
            .value(row),
        DataType::LargeList(_) => col
            .as_any()
            .downcast_ref::<LargeListArray>()
            .context("expected LargeListArray")?
            .value(row),
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64).collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map_or(MetadataValue::Null, |s| MetadataValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => MetadataValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Bool(a.value(row))),
        other => MetadataValue::String(format!("{other:?}")),
    }
}
