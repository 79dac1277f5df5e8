//! Delimited-table reader
//!
//! A small quote-aware state machine, not a general CSV library: it
//! handles exactly what the input tables use. Quoted fields may contain
//! delimiters and newlines; a doubled quote inside a quoted field is a
//! literal quote. Blank lines and rows with an empty first field are
//! skipped, which also takes care of the customary trailing newline.

use textmesh_core::error::{Result, TextmeshError};

/// Split table contents into rows of fields.
///
/// A quote still open at end of input is a [`TextmeshError::MalformedTable`].
pub fn parse_rows(contents: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut iter = contents.chars().peekable();

    while let Some(c) = iter.next() {
        if in_quotes {
            if c == '"' {
                if iter.peek() == Some(&'"') {
                    field.push('"');
                    iter.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == ',' {
            fields.push(std::mem::take(&mut field));
        } else if c == '\n' {
            fields.push(std::mem::take(&mut field));
            flush_row(&mut rows, &mut fields);
        } else {
            field.push(c);
        }
    }

    if in_quotes {
        return Err(TextmeshError::MalformedTable(
            "unterminated quote at end of table".into(),
        ));
    }

    // A final row without a trailing newline still counts.
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        flush_row(&mut rows, &mut fields);
    }

    Ok(rows)
}

fn flush_row(rows: &mut Vec<Vec<String>>, fields: &mut Vec<String>) {
    let row = std::mem::take(fields);
    // Blank lines and comment-like stubs: skip anything without a real
    // first field or with only one field.
    if row.len() > 1 && !row[0].is_empty() {
        rows.push(row);
    }
}
