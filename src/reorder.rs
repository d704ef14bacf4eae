//! Moving the class column to the last position.
//!
//! Weka's `-c last` convention expects the class attribute at the end of the
//! header. Tables loaded from CSV and ARFF files alike go through
//! [`move_class_last`], so the header and every row are permuted identically.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("Attribute {0} not found")]
    ClassAttributeNotFound(String),

    #[error("row {row} has {found} values but the header declares {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// What [`move_class_last`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reordered {
    /// The column was already last; nothing changed.
    AlreadyLast,
    /// The column was moved from index `from`.
    Moved { from: usize },
}

/// Move the header entry named `class_attr` and the matching cell of every row
/// to the end. The relative order of all other columns is preserved.
///
/// `name_of` extracts the column name from a header entry, so the same
/// transform serves plain `String` headers and typed ARFF attributes.
pub fn move_class_last<A, V, F>(
    header: &mut Vec<A>,
    rows: &mut [Vec<V>],
    class_attr: &str,
    name_of: F,
) -> Result<Reordered, ReorderError>
where
    F: Fn(&A) -> &str,
{
    let idx = header
        .iter()
        .position(|a| name_of(a) == class_attr)
        .ok_or_else(|| ReorderError::ClassAttributeNotFound(class_attr.to_string()))?;

    let width = header.len();
    if let Some((row, found)) = rows
        .iter()
        .enumerate()
        .find(|(_, r)| r.len() != width)
        .map(|(i, r)| (i, r.len()))
    {
        return Err(ReorderError::RaggedRow {
            row,
            expected: width,
            found,
        });
    }

    if idx + 1 == width {
        return Ok(Reordered::AlreadyLast);
    }

    let attr = header.remove(idx);
    header.push(attr);
    for row in rows.iter_mut() {
        let cell = row.remove(idx);
        row.push(cell);
    }

    Ok(Reordered::Moved { from: idx })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sorted(mut v: Vec<&'static str>) -> Vec<&'static str> {
        v.sort_unstable();
        v
    }

    #[test]
    fn moves_header_and_every_row() {
        let mut h = header(&["a", "class", "b", "c"]);
        let mut rows = vec![vec!["1", "x", "2", "3"], vec!["4", "y", "5", "6"]];

        let out = move_class_last(&mut h, &mut rows, "class", |s| s.as_str()).unwrap();

        assert_eq!(out, Reordered::Moved { from: 1 });
        assert_eq!(h, header(&["a", "b", "c", "class"]));
        assert_eq!(rows[0], vec!["1", "2", "3", "x"]);
        assert_eq!(rows[1], vec!["4", "5", "6", "y"]);
    }

    #[test]
    fn second_application_is_a_no_op() {
        let mut h = header(&["class", "a", "b"]);
        let mut rows = vec![vec!["x", "1", "2"]];

        move_class_last(&mut h, &mut rows, "class", |s| s.as_str()).unwrap();
        let (h1, r1) = (h.clone(), rows.clone());
        let again = move_class_last(&mut h, &mut rows, "class", |s| s.as_str()).unwrap();

        assert_eq!(again, Reordered::AlreadyLast);
        assert_eq!(h, h1);
        assert_eq!(rows, r1);
    }

    #[test]
    fn rows_keep_their_multiset_of_values() {
        let mut h = header(&["p", "q", "class", "r"]);
        let original = vec![vec!["1", "1", "k", "2"], vec!["?", "3", "k", "?"]];
        let mut rows = original.clone();

        move_class_last(&mut h, &mut rows, "class", |s| s.as_str()).unwrap();

        for (before, after) in original.into_iter().zip(rows) {
            assert_eq!(sorted(before), sorted(after));
        }
    }

    #[test]
    fn missing_class_is_reported_by_name() {
        let mut h = header(&["a", "b"]);
        let mut rows: Vec<Vec<&str>> = vec![];
        let err = move_class_last(&mut h, &mut rows, "Current_brand", |s| s.as_str()).unwrap_err();
        assert_eq!(err, ReorderError::ClassAttributeNotFound("Current_brand".into()));
        assert_eq!(err.to_string(), "Attribute Current_brand not found");
    }

    #[test]
    fn ragged_rows_are_rejected_before_any_mutation() {
        let mut h = header(&["class", "a"]);
        let mut rows = vec![vec!["x", "1"], vec!["y"]];
        let err = move_class_last(&mut h, &mut rows, "class", |s| s.as_str()).unwrap_err();
        assert_eq!(
            err,
            ReorderError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
        assert_eq!(h, header(&["class", "a"]));
    }
}
