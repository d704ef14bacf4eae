use std::collections::BTreeSet;

use anyhow::{Result, bail};

use super::model::{ArffDataset, Attribute, AttributeType};
use crate::data::model::{Table, Value};

/// Convert a table into an ARFF dataset, inferring one type per column.
///
/// A column whose non-missing cells are all numbers becomes `NUMERIC`; an
/// all-missing column does too, since Pandas reads it as float64. Anything
/// else becomes nominal over its sorted distinct values.
pub fn table_to_arff(table: &Table, relation: &str) -> ArffDataset {
    let attributes: Vec<Attribute> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| Attribute::new(name.clone(), infer_type(table, idx)))
        .collect();

    let rows = table
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(&attributes)
                .map(|(value, attr)| coerce(value, &attr.kind))
                .collect()
        })
        .collect();

    ArffDataset {
        relation: relation.to_string(),
        attributes,
        rows,
    }
}

fn infer_type(table: &Table, idx: usize) -> AttributeType {
    let present: Vec<&Value> = table.column_values(idx).filter(|v| !v.is_missing()).collect();
    if present.iter().all(|v| v.is_numeric()) {
        return AttributeType::Numeric;
    }
    let distinct: BTreeSet<String> = present.iter().map(|v| v.to_string()).collect();
    AttributeType::Nominal(distinct.into_iter().collect())
}

/// Numbers inside a nominal column are carried as their text form.
fn coerce(value: &Value, kind: &AttributeType) -> Value {
    match (value, kind) {
        (Value::Integer(_) | Value::Float(_), AttributeType::Nominal(_)) => {
            Value::Text(value.to_string())
        }
        _ => value.clone(),
    }
}

/// View an ARFF dataset as a plain table (attribute names as columns).
pub fn arff_to_table(dataset: &ArffDataset) -> Table {
    Table::new(
        dataset.attributes.iter().map(|a| a.name.clone()).collect(),
        dataset.rows.clone(),
    )
}

/// Map table rows onto an existing ARFF header, matching columns by name.
///
/// The class attribute (the header's last attribute) is set to `?` unless
/// `keep_class` is true, in which case the table must provide it. Extra table
/// columns are ignored.
pub fn template_rows(table: &Table, template: &ArffDataset, keep_class: bool) -> Result<ArffDataset> {
    let class_idx = template.attributes.len().checked_sub(1);

    let mut sources = Vec::with_capacity(template.attributes.len());
    for (i, attr) in template.attributes.iter().enumerate() {
        let is_class = Some(i) == class_idx;
        match table.column_index(&attr.name) {
            Some(col) => sources.push(Some(col)),
            None if is_class && !keep_class => sources.push(None),
            None if is_class => bail!("Missing class {}", attr.name),
            None => bail!("input has no column named '{}'", attr.name),
        }
    }

    let rows = table
        .rows
        .iter()
        .map(|row| {
            sources
                .iter()
                .zip(&template.attributes)
                .enumerate()
                .map(|(i, (src, attr))| {
                    if Some(i) == class_idx && !keep_class {
                        return Value::Missing;
                    }
                    src.and_then(|c| row.get(c))
                        .map(|v| coerce(v, &attr.kind))
                        .unwrap_or(Value::Missing)
                })
                .collect()
        })
        .collect();

    Ok(template.with_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn survey() -> Table {
        Table::new(
            vec!["Age".into(), "Code".into(), "Empty".into(), "Current_brand".into()],
            vec![
                vec![Value::Integer(22), Value::Integer(7), Value::Missing, text("Samsung")],
                vec![Value::Float(30.5), text("x9"), Value::Missing, text("Apple")],
                vec![Value::Missing, Value::Integer(7), Value::Missing, text("Apple")],
            ],
        )
    }

    #[test]
    fn infers_numeric_and_sorted_nominal() {
        let ds = table_to_arff(&survey(), "smartphone");
        assert_eq!(ds.relation, "smartphone");
        assert_eq!(ds.attributes[0].kind, AttributeType::Numeric);
        assert_eq!(
            ds.attributes[1].kind,
            AttributeType::Nominal(vec!["7".into(), "x9".into()])
        );
        assert_eq!(ds.attributes[2].kind, AttributeType::Numeric);
        assert_eq!(
            ds.attributes[3].kind,
            AttributeType::Nominal(vec!["Apple".into(), "Samsung".into()])
        );
        assert_eq!(ds.rows[0][1], text("7"));
        assert_eq!(ds.rows[2][0], Value::Missing);
    }

    #[test]
    fn nominal_domain_keeps_csv_text_verbatim() {
        let data = "Code,Current_brand\n007,Apple\nx9,Samsung\n1.50,Apple\n";
        let table = loader::read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        let ds = table_to_arff(&table, "smartphone");
        assert_eq!(
            ds.attributes[0].kind,
            AttributeType::Nominal(vec!["007".into(), "1.50".into(), "x9".into()])
        );
        assert_eq!(ds.rows[0][0], text("007"));
        assert_eq!(ds.rows[2][0], text("1.50"));
    }

    #[test]
    fn template_rows_blank_the_class() {
        let mut table = survey();
        table.move_column_last("Current_brand").unwrap();
        let template = table_to_arff(&table, "smartphone").header_only();

        // Prediction input without the class column, columns in another order.
        let input = Table::new(
            vec!["Code".into(), "Age".into(), "Empty".into()],
            vec![vec![text("x9"), Value::Integer(40), Value::Missing]],
        );
        let ds = template_rows(&input, &template, false).unwrap();
        assert_eq!(ds.attributes, template.attributes);
        assert_eq!(
            ds.rows[0],
            vec![Value::Integer(40), text("x9"), Value::Missing, Value::Missing]
        );
    }

    #[test]
    fn template_rows_require_feature_columns() {
        let template = table_to_arff(&survey(), "smartphone");
        let input = Table::new(vec!["Age".into()], vec![]);
        let err = template_rows(&input, &template, false).unwrap_err();
        assert_eq!(err.to_string(), "input has no column named 'Code'");

        let features_only = Table::new(
            vec!["Age".into(), "Code".into(), "Empty".into()],
            vec![],
        );
        let err = template_rows(&features_only, &template, true).unwrap_err();
        assert_eq!(err.to_string(), "Missing class Current_brand");
    }
}
