use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Table, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line (what `pd.read_csv` accepts)
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "Loaded {} row(s) with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then data records.
/// A UTF-8 BOM on the first header is dropped and names are trimmed.
fn load_csv(path: &Path) -> Result<Table> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

pub(crate) fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != columns.len() {
            bail!(
                "CSV row {row_no}: expected {} fields but found {}",
                columns.len(),
                record.len()
            );
        }
        cells.push(record.iter().map(|c| c.trim().to_string()).collect());
    }

    let numeric: Vec<bool> = (0..columns.len())
        .map(|col| cells.iter().all(|row| !guess_value(&row[col]).is_text()))
        .collect();

    let rows = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&numeric)
                .map(|(cell, &is_numeric)| type_cell(cell, is_numeric))
                .collect()
        })
        .collect();

    Ok(Table::new(columns, rows))
}

/// Numbers are parsed only in all-numeric columns; any other column keeps
/// each cell's text as written, so `007` and `7` stay distinct.
fn type_cell(cell: String, numeric_column: bool) -> Value {
    if numeric_column || is_na(&cell) {
        guess_value(&cell)
    } else {
        Value::Text(cell)
    }
}

fn is_na(s: &str) -> bool {
    NA_VALUES.contains(&s)
}

/// Markers `pd.read_csv` treats as NaN by default, plus the ARFF `?`.
const NA_VALUES: &[&str] = &[
    "", "?", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Type a raw text cell on its own the way `read_csv` would.
pub fn guess_value(s: &str) -> Value {
    let s = s.trim();
    if is_na(s) {
        return Value::Missing;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    Value::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Age": 24, "Gender": "Female", "Current_brand": "Apple" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub(crate) fn parse_json(text: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    // First pass: columns in first-seen order.
    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_value).unwrap_or(Value::Missing))
                .collect()
        })
        .collect();

    Ok(Table::new(columns, rows))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => guess_text(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Text(b.to_string()),
        JsonValue::Null => Value::Missing,
        other => Value::Text(other.to_string()),
    }
}

/// JSON strings stay text unless they are empty or the ARFF missing marker.
fn guess_text(s: &str) -> Value {
    match s.trim() {
        "" | "?" => Value::Missing,
        t => Value::Text(t.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let n_rows = batch.num_rows();

        for row in 0..n_rows {
            let values = (0..batch.num_columns())
                .map(|col_idx| extract_value(batch.column(col_idx), row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}"))?;
            rows.push(values);
        }
    }

    Ok(Table::new(columns, rows))
}

// -- Parquet / Arrow helpers --

/// Extract a single value from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Missing);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let s = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            guess_text(s.value(row))
        }
        DataType::LargeUtf8 => guess_text(col.as_string::<i64>().value(row)),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Value::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Value::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            float_value(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            float_value(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            Value::Text(arr.value(row).to_string())
        }
        other => bail!("Unsupported parquet column type {other:?}"),
    };
    Ok(value)
}

/// Pandas writes missing floats as NaN rather than null.
fn float_value(v: f64) -> Value {
    if v.is_nan() {
        Value::Missing
    } else {
        Value::Float(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn guess_value_follows_read_csv_typing() {
        assert_eq!(guess_value(""), Value::Missing);
        assert_eq!(guess_value(" ? "), Value::Missing);
        assert_eq!(guess_value("42"), Value::Integer(42));
        assert_eq!(guess_value("4.5"), Value::Float(4.5));
        assert_eq!(guess_value("Apple"), text("Apple"));
        assert_eq!(guess_value("NaN"), Value::Missing);
        assert_eq!(guess_value("n/a"), Value::Missing);
        assert_eq!(guess_value("inf"), text("inf"));
    }

    #[test]
    fn csv_header_bom_is_stripped() {
        let data = "\u{feff}Age , Current_brand\n21,Apple\n,Samsung\n";
        let table = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(table.columns, vec!["Age", "Current_brand"]);
        assert_eq!(table.rows[0], vec![Value::Integer(21), text("Apple")]);
        assert_eq!(table.rows[1], vec![Value::Missing, text("Samsung")]);
    }

    #[test]
    fn csv_text_column_keeps_number_like_cells_verbatim() {
        let data = "Code,Age,Current_brand\n007,21,Apple\nx9,30.5,Samsung\n1.50,,Apple\n7,40,Apple\n";
        let table = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        let codes: Vec<&Value> = table.column_values(0).collect();
        assert_eq!(codes, vec![&text("007"), &text("x9"), &text("1.50"), &text("7")]);
        let ages: Vec<&Value> = table.column_values(1).collect();
        assert_eq!(
            ages,
            vec![&Value::Integer(21), &Value::Float(30.5), &Value::Missing, &Value::Integer(40)]
        );
    }

    #[test]
    fn csv_na_markers_stay_missing_in_text_columns() {
        let data = "Gender,Current_brand\nNA,Apple\nMale,Samsung\n";
        let table = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(table.rows[0][0], Value::Missing);
        assert_eq!(table.rows[1][0], text("Male"));
    }

    #[test]
    fn parquet_nan_floats_are_missing_at_any_width() {
        let f32s: Arc<dyn Array> = Arc::new(Float32Array::from(vec![f32::NAN, 2.5]));
        let f64s: Arc<dyn Array> = Arc::new(Float64Array::from(vec![f64::NAN, 1.25]));
        assert_eq!(extract_value(&f32s, 0).unwrap(), Value::Missing);
        assert_eq!(extract_value(&f32s, 1).unwrap(), Value::Float(2.5));
        assert_eq!(extract_value(&f64s, 0).unwrap(), Value::Missing);
        assert_eq!(extract_value(&f64s, 1).unwrap(), Value::Float(1.25));
    }

    #[test]
    fn csv_ragged_row_names_the_row() {
        let data = "a,b\n1,2\n3\n";
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());
        let err = read_csv(reader).unwrap_err();
        assert!(format!("{err:#}").contains("CSV row 1"));
    }

    #[test]
    fn json_columns_follow_first_seen_order() {
        let table = parse_json(
            r#"[{"Age": 30, "Current_brand": "Oppo"},
                {"Current_brand": "Apple", "Income": 1.5, "Age": null}]"#,
        )
        .unwrap();
        assert_eq!(table.columns, vec!["Age", "Current_brand", "Income"]);
        assert_eq!(
            table.rows[0],
            vec![Value::Integer(30), text("Oppo"), Value::Missing]
        );
        assert_eq!(
            table.rows[1],
            vec![Value::Missing, text("Apple"), Value::Float(1.5)]
        );
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Gender,Current_brand").unwrap();
        writeln!(f, "Male,Vivo").unwrap();
        drop(f);

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 1);

        let bad = dir.path().join("survey.xlsx");
        std::fs::write(&bad, "").unwrap();
        let err = load_file(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension: .xlsx"));
    }
}
