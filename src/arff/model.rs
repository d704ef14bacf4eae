use std::fmt;

use crate::data::model::Value;
use crate::reorder::{self, Reordered, ReorderError};

// ---------------------------------------------------------------------------
// Attribute declarations
// ---------------------------------------------------------------------------

/// Declared type of an ARFF attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    Numeric,
    /// Nominal domain in declaration order.
    Nominal(Vec<String>),
    String,
    /// Optional date format pattern.
    Date(Option<String>),
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::Numeric => write!(f, "NUMERIC"),
            AttributeType::String => write!(f, "STRING"),
            AttributeType::Date(None) => write!(f, "DATE"),
            AttributeType::Date(Some(fmt_str)) => write!(f, "DATE \"{fmt_str}\""),
            AttributeType::Nominal(values) => {
                let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
                write!(f, "{{{}}}", quoted.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeType,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeType) -> Self {
        Attribute {
            name: name.into(),
            kind,
        }
    }

    /// Nominal domain, if this attribute is nominal.
    pub fn nominal_values(&self) -> Option<&[String]> {
        match &self.kind {
            AttributeType::Nominal(values) => Some(values),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ArffDataset
// ---------------------------------------------------------------------------

/// A parsed or generated ARFF document.
#[derive(Debug, Clone, PartialEq)]
pub struct ArffDataset {
    pub relation: String,
    pub attributes: Vec<Attribute>,
    pub rows: Vec<Vec<Value>>,
}

impl ArffDataset {
    /// The class attribute under Weka's `-c last` convention.
    pub fn class_attribute(&self) -> Option<&Attribute> {
        self.attributes.last()
    }

    /// Header without data, used as a template for prediction input.
    pub fn header_only(&self) -> Self {
        ArffDataset {
            relation: self.relation.clone(),
            attributes: self.attributes.clone(),
            rows: Vec::new(),
        }
    }

    /// Same header, different rows.
    pub fn with_rows(&self, rows: Vec<Vec<Value>>) -> Self {
        ArffDataset {
            rows,
            ..self.header_only()
        }
    }

    pub fn move_class_last(&mut self, class_attr: &str) -> Result<Reordered, ReorderError> {
        reorder::move_class_last(&mut self.attributes, &mut self.rows, class_attr, |a| {
            a.name.as_str()
        })
    }
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Quote a name or value when ARFF would otherwise misread it.
pub fn quote(s: &str) -> String {
    let needs_quotes = s.is_empty()
        || s == "?"
        || s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | '{' | '}' | '\'' | '"' | '%' | '\\'));
    if !needs_quotes {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_only_when_needed() {
        assert_eq!(quote("Apple"), "Apple");
        assert_eq!(quote("Galaxy S23"), "'Galaxy S23'");
        assert_eq!(quote("a,b"), "'a,b'");
        assert_eq!(quote("O'Neil"), "'O\\'Neil'");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("?"), "'?'");
    }

    #[test]
    fn nominal_type_renders_braced_list() {
        let kind = AttributeType::Nominal(vec!["Apple".into(), "One Plus".into()]);
        assert_eq!(kind.to_string(), "{Apple,'One Plus'}");
        assert_eq!(AttributeType::Date(Some("yyyy-MM-dd".into())).to_string(), "DATE \"yyyy-MM-dd\"");
    }

    #[test]
    fn with_rows_shares_header() {
        let ds = ArffDataset {
            relation: "smartphone".into(),
            attributes: vec![
                Attribute::new("Age", AttributeType::Numeric),
                Attribute::new("Current_brand", AttributeType::Nominal(vec!["Apple".into()])),
            ],
            rows: vec![vec![Value::Integer(20), Value::Text("Apple".into())]],
        };
        let one = ds.with_rows(vec![vec![Value::Integer(31), Value::Missing]]);
        assert_eq!(one.attributes, ds.attributes);
        assert_eq!(one.rows.len(), 1);
        assert_eq!(one.class_attribute().map(|a| a.name.as_str()), Some("Current_brand"));
        assert!(ds.header_only().rows.is_empty());
    }
}
