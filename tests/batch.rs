mod helpers;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Float64Builder, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use helpers::{assert_close_tol, dip_curve, grid};
use resonance_finder::batch::{process_dataset, write_report_csv};
use resonance_finder::data::loader::{load_file, load_path};
use resonance_finder::{Curve, Dataset, Measurement, MetadataValue, ProcessingParams};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("resonance-finder-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn measurement(name: &str, curve: Curve) -> Measurement {
    Measurement {
        name: name.to_string(),
        curve,
        metadata: BTreeMap::new(),
    }
}

#[test]
fn failing_measurement_does_not_abort_batch() {
    let xs = grid(400.0, 900.0, 1.0);
    let dataset = Dataset::from_measurements(vec![
        measurement("first", dip_curve(&xs, &[(620.0, 20.0, 30.0)], 100.0, 0.01)),
        measurement("broken", Curve::new(vec![500.0], vec![80.0]).unwrap()),
        measurement("second", dip_curve(&xs, &[(700.0, 20.0, 30.0)], 100.0, 0.01)),
    ]);

    let report = process_dataset(&dataset, &ProcessingParams::default());
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].name, "first");
    assert_eq!(report.rows[1].name, "second");
    assert_close_tol(report.rows[0].result.peak_wavelength, 620.0, 2.0);
    assert_close_tol(report.rows[1].result.peak_wavelength, 700.0, 2.0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "broken");
    assert_eq!(report.resolved_count(), 2);
}

#[test]
fn loads_every_format_in_a_directory() {
    let dir = scratch_dir("formats");
    let xs = grid(400.0, 900.0, 1.0);
    let curve = dip_curve(&xs, &[(650.0, 25.0, 40.0)], 100.0, 0.0);

    // Two-column export, written in descending wavelength order.
    let mut tsv = String::from("Wavelength (nm)\tTransmission (%)\n");
    for (x, y) in curve.wavelengths().iter().zip(curve.transmission()).rev() {
        tsv.push_str(&format!("{x}\t{y}\n"));
    }
    std::fs::write(dir.join("spot1.tsv"), tsv).unwrap();

    // Wide CSV with metadata.
    let join = |v: &[f64]| v.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(";");
    let wide = format!(
        "x,y,sample,temp\n{},{},A,21.5\n{},{},B,22\n",
        join(curve.wavelengths()),
        join(curve.transmission()),
        join(curve.wavelengths()),
        join(curve.transmission()),
    );
    std::fs::write(dir.join("batch.csv"), wide).unwrap();

    // Records JSON.
    let json = serde_json::json!([
        { "x": curve.wavelengths(), "y": curve.transmission(), "sample": "C" }
    ]);
    std::fs::write(dir.join("single.json"), json.to_string()).unwrap();

    // Unsupported files are ignored.
    std::fs::write(dir.join("notes.md"), "not a spectrum").unwrap();

    let dataset = load_path(&dir).unwrap();
    let mut names: Vec<&str> = dataset.measurements.iter().map(|m| m.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["batch#0", "batch#1", "single", "spot1"]);
    assert_eq!(dataset.column_names, vec!["sample".to_string(), "temp".to_string()]);

    let spot = dataset.measurements.iter().find(|m| m.name == "spot1").unwrap();
    assert_eq!(spot.curve.first_wavelength(), 400.0);
    assert_eq!(spot.curve.len(), xs.len());

    let b = dataset.measurements.iter().find(|m| m.name == "batch#1").unwrap();
    assert_eq!(b.metadata.get("temp"), Some(&MetadataValue::Integer(22)));

    let report = process_dataset(&dataset, &ProcessingParams::default());
    assert_eq!(report.rows.len(), 4);
    for row in &report.rows {
        assert_close_tol(row.result.peak_wavelength, 650.0, 2.0);
    }

    let out = dir.join("report.csv");
    write_report_csv(&report, &out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.starts_with("name,peak_wavelength,fwhm,height,baseline,resolved"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn parquet_list_columns_load_with_metadata() {
    let dir = scratch_dir("parquet");
    let xs = grid(400.0, 900.0, 1.0);
    let curves = [
        dip_curve(&xs, &[(620.0, 20.0, 30.0)], 100.0, 0.01),
        dip_curve(&xs, &[(680.0, 20.0, 30.0)], 100.0, 0.01),
    ];

    let list = |values: Vec<&[f64]>| {
        let mut builder = ListBuilder::new(Float64Builder::new());
        for row in values {
            builder.values().append_slice(row);
            builder.append(true);
        }
        builder.finish()
    };
    let item = Arc::new(Field::new("item", DataType::Float64, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::List(item.clone()), false),
        Field::new("y", DataType::List(item), false),
        Field::new("sample", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(list(curves.iter().map(|c| c.wavelengths()).collect())),
            Arc::new(list(curves.iter().map(|c| c.transmission()).collect())),
            Arc::new(StringArray::from(vec!["grating_A", "grating_B"])),
        ],
    )
    .unwrap();

    let path = dir.join("plate.parquet");
    let mut writer = ArrowWriter::try_new(std::fs::File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let dataset = load_path(&dir).unwrap();
    let names: Vec<&str> = dataset.measurements.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["plate#0", "plate#1"]);
    assert_eq!(dataset.column_names, vec!["sample".to_string()]);
    assert_eq!(
        dataset.measurements[1].metadata.get("sample"),
        Some(&MetadataValue::String("grating_B".into()))
    );
    assert_eq!(dataset.measurements[0].curve, curves[0]);

    let report = process_dataset(&dataset, &ProcessingParams::default());
    assert!(report.skipped.is_empty());
    assert_close_tol(report.rows[0].result.peak_wavelength, 620.0, 2.0);
    assert_close_tol(report.rows[1].result.peak_wavelength, 680.0, 2.0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unsupported_extension_is_an_error() {
    let dir = scratch_dir("unsupported");
    let path = dir.join("spectrum.xyz");
    std::fs::write(&path, "1 2\n").unwrap();
    assert!(load_file(&path).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn parameter_file_overrides_defaults() {
    let dir = scratch_dir("params");
    let path = dir.join("params.json");
    std::fs::write(&path, r#"{ "normalise": true, "smooth": true, "smooth_points": 7 }"#).unwrap();
    let params = ProcessingParams::from_json_file(&path).unwrap();
    assert!(params.normalise);
    assert_eq!(params.smooth_points, 7);
    assert_eq!(params.polynomial_order, 51);

    std::fs::write(&path, r#"{ "sampling_rate": -1.0 }"#).unwrap();
    assert!(ProcessingParams::from_json_file(&path).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
