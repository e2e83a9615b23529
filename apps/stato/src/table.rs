//! # Table Output
//!
//! Renders query results as a fixed-width table: uppercased headers, one
//! column per field, widths computed from the data. Numbers are
//! right-aligned, everything else left-aligned; missing fields render as
//! blanks and non-scalar values as compact JSON.

use serde_json::Value;
use std::io::{self, Write};

/// Write the table for a field list and its matching objects.
pub fn emit_table(out: &mut dyn Write, fields: &[String], objects: &[Value]) -> io::Result<()> {
    let rows: Vec<Vec<Option<(String, bool)>>> = objects
        .iter()
        .map(|object| {
            fields
                .iter()
                .map(|field| {
                    object
                        .get(field)
                        .map(|value| (cell_text(value), value.is_number()))
                })
                .collect()
        })
        .collect();

    // Column width: longest of header and cells, plus one space.
    let mut widths: Vec<usize> = fields.iter().map(|field| field.len() + 1).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some((text, _)) = cell
                && text.len() + 1 > widths[i]
            {
                widths[i] = text.len() + 1;
            }
        }
    }

    for (i, field) in fields.iter().enumerate() {
        write!(out, "{}", pad(&field.to_uppercase(), widths[i], false))?;
    }
    writeln!(out)?;

    for row in rows {
        for (i, cell) in row.into_iter().enumerate() {
            match cell {
                Some((text, numeric)) => write!(out, "{}", pad(&text, widths[i], numeric))?,
                None => write!(out, "{}", pad("", widths[i], false))?,
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    let fill = width.saturating_sub(text.len());
    if right_align {
        format!("{}{}", " ".repeat(fill), text)
    } else {
        format!("{}{}", text, " ".repeat(fill))
    }
}

// =============================================================================
// TESTS
// =============================================================================
