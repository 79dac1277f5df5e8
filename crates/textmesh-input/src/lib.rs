//! Content model building: the compiler's first stage
//!
//! Reads the two input tables and produces the in-memory catalog the
//! rest of the pipeline works from. The raw bytes of both files are
//! hashed before any parsing, in file order, because that hash is the
//! outer cache gate: it must see exactly what is on disk.
//!
//! Table shapes:
//!
//! - styles: `name, fontFace, pointSize, lineHeight`, four fields per
//!   row, no header.
//! - strings: `key, width, height, <lang>, ...` with a mandatory header
//!   row whose language columns define the language index order.

use std::fs;
use std::path::Path;

use log::debug;

use textmesh_core::error::{Result, TextmeshError};
use textmesh_core::hash::ContentHash;
use textmesh_core::types::{ContentModel, LocalizedString, Style};

pub mod table;

/// Fields preceding the language columns in the strings table.
const STRINGS_PARAM_FIELDS: usize = 3;

/// Read and parse both tables from disk.
pub fn load(styles_path: &Path, strings_path: &Path) -> Result<ContentModel> {
    let styles_raw = read_table(styles_path)?;
    let strings_raw = read_table(strings_path)?;

    let mut hash = ContentHash::new();
    hash.write(styles_raw.as_bytes());
    hash.write(strings_raw.as_bytes());

    let mut model = parse_tables(&styles_raw, &strings_raw)?;
    model.source_hash = hash.finish();
    debug!(
        "content model: {} style(s), {} string(s), {} language(s), source hash {:08x}",
        model.styles.len(),
        model.strings.len(),
        model.languages.len(),
        model.source_hash
    );
    Ok(model)
}

fn read_table(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|err| TextmeshError::MissingResource(format!("{}: {err}", path.display())))?;
    String::from_utf8(bytes).map_err(|_| {
        TextmeshError::MalformedTable(format!("{} is not valid UTF-8", path.display()))
    })
}

/// Parse already-loaded table contents. `source_hash` is left at zero;
/// [`load`] fills it from the raw bytes.
pub fn parse_tables(styles: &str, strings: &str) -> Result<ContentModel> {
    let mut model = ContentModel::default();

    for row in table::parse_rows(styles)? {
        if row.len() != 4 {
            return Err(TextmeshError::MalformedTable(format!(
                "style row '{}' has {} fields, expected 4",
                row[0],
                row.len()
            )));
        }
        model.styles.push(Style {
            name: row[0].clone(),
            face: row[1].clone(),
            point_size: parse_u32(&row[2], "point size")?,
            line_height: parse_f32(&row[3], "line height")?,
        });
    }
    if model.styles.is_empty() {
        return Err(TextmeshError::MalformedTable(
            "style table declares no styles".into(),
        ));
    }

    let mut rows = table::parse_rows(strings)?.into_iter();
    let header = rows.next().ok_or_else(|| {
        TextmeshError::MalformedTable("strings table is missing its header row".into())
    })?;
    if header.len() <= STRINGS_PARAM_FIELDS {
        return Err(TextmeshError::MalformedTable(
            "strings table header declares no language columns".into(),
        ));
    }
    model.languages = header[STRINGS_PARAM_FIELDS..].to_vec();

    let expected = STRINGS_PARAM_FIELDS + model.languages.len();
    for row in rows {
        if row.len() != expected {
            return Err(TextmeshError::MalformedTable(format!(
                "string row '{}' has {} fields, expected {expected}",
                row[0],
                row.len()
            )));
        }
        model.strings.push(LocalizedString {
            key: row[0].clone(),
            target_width: parse_u32(&row[1], "width")?,
            target_height: parse_u32(&row[2], "height")?,
            texts: row[STRINGS_PARAM_FIELDS..].to_vec(),
        });
    }

    Ok(model)
}

/// Parse the leading digits of a field, the way the tables have always
/// been read: `100px` is 100, but a field with no digits at all is
/// malformed rather than silently zero.
fn parse_u32(field: &str, what: &str) -> Result<u32> {
    let trimmed = field.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end]
        .parse()
        .map_err(|_| TextmeshError::MalformedTable(format!("{what} '{field}' is not a number")))
}

fn parse_f32(field: &str, what: &str) -> Result<f32> {
    let trimmed = field.trim();
    let end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '+' || c == '-') && i == 0)))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end]
        .parse()
        .map_err(|_| TextmeshError::MalformedTable(format!("{what} '{field}' is not a number")))
}
