use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use arrow::array::{Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;
use serde_json::json;

use crate::collect::ResultCollector;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Extensions accepted by [`export_file`]
pub const EXPORT_EXTENSIONS: [&str; 4] = ["parquet", "pq", "json", "csv"];

/// Write every collected curve to a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – one row per curve, `x` and `y` list columns plus metadata
/// * `.json`    – `[{ "x": [...], "y": [...], ...meta }, ...]`
/// * `.csv`     – long format, one row per point
pub fn export_file(collector: &ResultCollector, path: &Path) -> anyhow::Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => write_parquet(collector, path).context("writing parquet file")?,
        "json" => write_json(collector, path).context("writing JSON file")?,
        "csv" => write_csv(collector, path).context("writing CSV file")?,
        other => bail!("Unsupported file extension: .{other}"),
    }
    log::info!(
        "Exported {} curves to {}",
        collector.iter().count(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PointRow<'a> {
    spectrum: usize,
    element_size: f64,
    label: &'a str,
    x: f64,
    y: f64,
}

fn write_csv(collector: &ResultCollector, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (spectrum, curve) in collector.iter() {
        for (&x, &y) in curve.x.iter().zip(&curve.y) {
            writer.serialize(PointRow {
                spectrum,
                element_size: curve.value,
                label: &curve.label,
                x,
                y,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON writer
// ---------------------------------------------------------------------------

fn write_json(collector: &ResultCollector, path: &Path) -> Result<()> {
    let records: Vec<_> = collector
        .iter()
        .map(|(spectrum, curve)| {
            json!({
                "x": curve.x,
                "y": curve.y,
                "spectrum": spectrum,
                "element_size": curve.value,
                "label": curve.label,
            })
        })
        .collect();

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

fn write_parquet(collector: &ResultCollector, path: &Path) -> Result<()> {
    let mut x_builder = ListBuilder::new(Float64Builder::new());
    let mut y_builder = ListBuilder::new(Float64Builder::new());
    let mut spectra = Vec::new();
    let mut sizes = Vec::new();
    let mut labels = Vec::new();

    for (spectrum, curve) in collector.iter() {
        x_builder.values().append_slice(&curve.x);
        x_builder.append(true);
        y_builder.values().append_slice(&curve.y);
        y_builder.append(true);
        spectra.push(spectrum as i64);
        sizes.push(curve.value);
        labels.push(curve.label.as_str());
    }

    let item = || Arc::new(Field::new("item", DataType::Float64, true));
    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::List(item()), false),
        Field::new("y", DataType::List(item()), false),
        Field::new("spectrum", DataType::Int64, false),
        Field::new("element_size", DataType::Float64, false),
        Field::new("label", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(x_builder.finish()),
            Arc::new(y_builder.finish()),
            Arc::new(Int64Array::from(spectra)),
            Arc::new(Float64Array::from(sizes)),
            Arc::new(StringArray::from(labels)),
        ],
    )?;

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::{CorrectionResult, Curve};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::TempDir;

    fn collector() -> ResultCollector {
        let mut collector = ResultCollector::new("mm");
        for value in [0.5, 0.2] {
            collector.push(CorrectionResult {
                value,
                output_name: "out".into(),
                curves: [0, 1]
                    .into_iter()
                    .map(|s| {
                        (
                            s,
                            Curve {
                                x: vec![1.0, 2.0, 3.0],
                                y: vec![value; 3],
                            },
                        )
                    })
                    .collect(),
            });
        }
        collector
    }

    #[test]
    fn csv_has_one_row_per_point() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.csv");
        export_file(&collector(), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ["spectrum", "element_size", "label", "x", "y"]);
        assert_eq!(reader.records().count(), 2 * 2 * 3);
    }

    #[test]
    fn json_records_carry_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.json");
        export_file(&collector(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let records: serde_json::Value = serde_json::from_str(&text).unwrap();
        let records = records.as_array().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0]["spectrum"], 0);
        assert_eq!(records[0]["label"], "0.5 mm");
        assert_eq!(records[3]["element_size"], 0.2);
        assert_eq!(records[3]["x"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn parquet_has_one_row_per_curve() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweep.parquet");
        export_file(&collector(), &path).unwrap();

        let file = File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let mut rows = 0;
        for batch in reader {
            let batch = batch.unwrap();
            let schema = batch.schema();
            assert!(schema.index_of("x").is_ok());
            assert!(schema.index_of("element_size").is_ok());
            rows += batch.num_rows();
        }
        assert_eq!(rows, 4);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = export_file(&collector(), &dir.path().join("sweep.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
