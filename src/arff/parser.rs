use std::path::Path;

use super::model::{ArffDataset, Attribute, AttributeType};
use super::ArffError;
use crate::data::model::Value;

/// Read and parse an ARFF file.
pub fn load(path: &Path) -> Result<ArffDataset, ArffError> {
    let text = std::fs::read_to_string(path)?;
    parse_arff(&text)
}

/// Parse dense ARFF text. Keywords are case-insensitive and `%` starts a comment.
pub fn parse_arff(text: &str) -> Result<ArffDataset, ArffError> {
    let mut relation = String::new();
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut in_data = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim().trim_start_matches('\u{feff}');
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if in_data {
            rows.push(parse_row(line, line_no, &attributes)?);
            continue;
        }

        if let Some(rest) = keyword(line, "@relation") {
            let (name, _) = read_name(rest.trim_start(), line_no)?;
            relation = name;
        } else if let Some(rest) = keyword(line, "@attribute") {
            let (name, rest) = read_name(rest.trim_start(), line_no)?;
            let kind = parse_type(rest.trim(), line_no)?;
            attributes.push(Attribute::new(name, kind));
        } else if keyword(line, "@data").is_some() {
            in_data = true;
        } else {
            return Err(ArffError::syntax(line_no, format!("unexpected line '{line}'")));
        }
    }

    if !in_data {
        return Err(ArffError::MissingData);
    }

    Ok(ArffDataset {
        relation,
        attributes,
        rows,
    })
}

/// Case-insensitive keyword match; the keyword must be followed by whitespace or end of line.
fn keyword<'a>(line: &'a str, kw: &str) -> Option<&'a str> {
    let head = line.get(..kw.len())?;
    if !head.eq_ignore_ascii_case(kw) {
        return None;
    }
    let rest = &line[kw.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Header parsing
// ---------------------------------------------------------------------------

/// Read a relation or attribute name, quoted or bare.
fn read_name(s: &str, line: usize) -> Result<(String, &str), ArffError> {
    if s.starts_with('\'') || s.starts_with('"') {
        return read_quoted(s, line);
    }
    let end = s
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(s.len());
    if end == 0 {
        return Err(ArffError::syntax(line, "missing name"));
    }
    Ok((s[..end].to_string(), &s[end..]))
}

fn parse_type(decl: &str, line: usize) -> Result<AttributeType, ArffError> {
    if let Some(inner) = decl.strip_prefix('{') {
        let close = find_closing_brace(inner)
            .ok_or_else(|| ArffError::syntax(line, "unterminated nominal specification"))?;
        let values = split_values(&inner[..close], line)?
            .into_iter()
            .map(|(v, _)| v)
            .collect();
        return Ok(AttributeType::Nominal(values));
    }

    let word_end = decl.find(char::is_whitespace).unwrap_or(decl.len());
    let word = decl[..word_end].to_ascii_lowercase();
    match word.as_str() {
        "numeric" | "real" | "integer" => Ok(AttributeType::Numeric),
        "string" => Ok(AttributeType::String),
        "date" => {
            let rest = decl[word_end..].trim();
            if rest.is_empty() {
                Ok(AttributeType::Date(None))
            } else {
                let (fmt, _) = read_name(rest, line)?;
                Ok(AttributeType::Date(Some(fmt)))
            }
        }
        "relational" => Err(ArffError::syntax(line, "relational attributes are not supported")),
        "" => Err(ArffError::syntax(line, "missing attribute type")),
        other => Err(ArffError::syntax(line, format!("unknown attribute type '{other}'"))),
    }
}

/// Index of the `}` closing a nominal list, ignoring braces inside quotes.
fn find_closing_brace(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '\'' | '"') => quote = Some(c),
            (None, '}') => return Some(i),
            _ => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Data parsing
// ---------------------------------------------------------------------------

fn parse_row(line: &str, line_no: usize, attributes: &[Attribute]) -> Result<Vec<Value>, ArffError> {
    if line.starts_with('{') {
        return Err(ArffError::syntax(line_no, "sparse data rows are not supported"));
    }
    let tokens = split_values(line, line_no)?;
    if tokens.len() != attributes.len() {
        return Err(ArffError::syntax(
            line_no,
            format!("expected {} values, found {}", attributes.len(), tokens.len()),
        ));
    }

    tokens
        .into_iter()
        .zip(attributes)
        .map(|((token, quoted), attr)| to_value(token, quoted, attr, line_no))
        .collect()
}

fn to_value(token: String, quoted: bool, attr: &Attribute, line: usize) -> Result<Value, ArffError> {
    if !quoted && token == "?" {
        return Ok(Value::Missing);
    }
    let invalid = |value: String| ArffError::InvalidValue {
        line,
        attribute: attr.name.clone(),
        value,
    };
    match &attr.kind {
        AttributeType::Numeric => {
            if let Ok(i) = token.parse::<i64>() {
                Ok(Value::Integer(i))
            } else {
                token
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| invalid(token))
            }
        }
        AttributeType::Nominal(domain) => {
            if domain.contains(&token) {
                Ok(Value::Text(token))
            } else {
                Err(invalid(token))
            }
        }
        AttributeType::String | AttributeType::Date(_) => Ok(Value::Text(token)),
    }
}

/// Split a comma-separated list into `(value, was_quoted)` pairs.
fn split_values(s: &str, line: usize) -> Result<Vec<(String, bool)>, ArffError> {
    let mut out = Vec::new();
    let mut rest = s.trim();
    if rest.is_empty() {
        return Ok(out);
    }
    loop {
        rest = rest.trim_start();
        let (value, quoted, after) = if rest.starts_with('\'') || rest.starts_with('"') {
            let (v, after) = read_quoted(rest, line)?;
            (v, true, after.trim_start())
        } else {
            let end = rest.find(',').unwrap_or(rest.len());
            (rest[..end].trim().to_string(), false, &rest[end..])
        };
        out.push((value, quoted));

        match after.strip_prefix(',') {
            Some(next) => rest = next,
            None if after.is_empty() => break,
            None => {
                return Err(ArffError::syntax(
                    line,
                    format!("expected ',' before '{after}'"),
                ))
            }
        }
    }
    Ok(out)
}

/// Read a single- or double-quoted token starting at `s[0]`, resolving escapes.
fn read_quoted(s: &str, line: usize) -> Result<(String, &str), ArffError> {
    let mut chars = s.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return Err(ArffError::syntax(line, "expected a quoted token")),
    };
    let mut value = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 'r')) => value.push('\r'),
                Some((_, 't')) => value.push('\t'),
                Some((_, other)) => value.push(other),
                None => break,
            },
            c if c == quote => return Ok((value, &s[i + c.len_utf8()..])),
            c => value.push(c),
        }
    }
    Err(ArffError::syntax(line, "unterminated quoted string"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arff::writer;

    const SAMPLE: &str = "\
% smartphone survey
@relation smartphone

@attribute Age numeric
@attribute 'Current_brand' {Apple, 'One Plus', Samsung}
@ATTRIBUTE Gender {Female,Male}

@data
24, Apple, Female
?,'One Plus',Male
31.5,Samsung,?
";

    #[test]
    fn parses_header_and_rows() {
        let ds = parse_arff(SAMPLE).unwrap();
        assert_eq!(ds.relation, "smartphone");
        assert_eq!(ds.attributes.len(), 3);
        assert_eq!(
            ds.attributes[1].kind,
            AttributeType::Nominal(vec!["Apple".into(), "One Plus".into(), "Samsung".into()])
        );
        assert_eq!(
            ds.rows[0],
            vec![Value::Integer(24), Value::Text("Apple".into()), Value::Text("Female".into())]
        );
        assert_eq!(ds.rows[1][0], Value::Missing);
        assert_eq!(ds.rows[2][0], Value::Float(31.5));
        assert_eq!(ds.rows[2][2], Value::Missing);
    }

    #[test]
    fn written_output_parses_back() {
        let ds = parse_arff(SAMPLE).unwrap();
        let text = writer::to_string(&ds);
        assert_eq!(parse_arff(&text).unwrap(), ds);
    }

    #[test]
    fn nominal_value_outside_domain_is_rejected() {
        let text = "@relation r\n@attribute b {Apple}\n@data\nNokia\n";
        let err = parse_arff(text).unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 4: value 'Nokia' is not valid for attribute 'b'"
        );
    }

    #[test]
    fn wrong_arity_reports_line() {
        let text = "@relation r\n@attribute a numeric\n@attribute b numeric\n@data\n1,2\n3\n";
        let err = parse_arff(text).unwrap_err();
        assert_eq!(err.to_string(), "line 6: expected 2 values, found 1");
    }

    #[test]
    fn sparse_and_missing_data_are_errors() {
        let sparse = "@relation r\n@attribute a numeric\n@data\n{0 1}\n";
        assert!(parse_arff(sparse)
            .unwrap_err()
            .to_string()
            .contains("sparse"));
        let no_data = "@relation r\n@attribute a numeric\n";
        assert!(matches!(parse_arff(no_data), Err(ArffError::MissingData)));
    }

    #[test]
    fn quoted_values_keep_commas_and_escapes() {
        let text = "@relation r\n@attribute s string\n@attribute d date \"yyyy-MM-dd\"\n@data\n'a, \\'b\\'',2024-01-02\n";
        let ds = parse_arff(text).unwrap();
        assert_eq!(ds.rows[0][0], Value::Text("a, 'b'".into()));
        assert_eq!(ds.attributes[1].kind, AttributeType::Date(Some("yyyy-MM-dd".into())));
    }
}
