use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::model::{quote, ArffDataset};
use super::ArffError;
use crate::data::model::Value;

/// Serialize a dataset: relation, attribute declarations, then `@DATA` rows.
pub fn write_arff<W: Write>(dataset: &ArffDataset, mut out: W) -> Result<(), ArffError> {
    writeln!(out, "@RELATION {}", quote(&dataset.relation))?;
    writeln!(out)?;
    for attr in &dataset.attributes {
        writeln!(out, "@ATTRIBUTE {} {}", quote(&attr.name), attr.kind)?;
    }
    writeln!(out)?;
    writeln!(out, "@DATA")?;
    for row in &dataset.rows {
        let cells: Vec<String> = row.iter().map(format_value).collect();
        writeln!(out, "{}", cells.join(","))?;
    }
    out.flush()?;
    Ok(())
}

/// Write the dataset to `path`, replacing any existing file.
pub fn save(dataset: &ArffDataset, path: &Path) -> Result<(), ArffError> {
    let file = File::create(path)?;
    write_arff(dataset, BufWriter::new(file))
}

fn format_value(v: &Value) -> String {
    match v {
        Value::Missing => "?".to_string(),
        Value::Text(s) => quote(s),
        other => other.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn to_string(dataset: &ArffDataset) -> String {
    let mut buf = Vec::new();
    write_arff(dataset, &mut buf).expect("writing to a Vec cannot fail");
    String::from_utf8(buf).expect("ARFF output is UTF-8")
}
