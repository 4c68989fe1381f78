//! Writer for parsed Go files.
//!
//! Untouched regions of the file are copied verbatim from the source text, so
//! serializing an unmodified [`SourceFile`] reproduces the input byte for byte.
//! Struct bodies whose field list was replaced are rendered from their
//! [`FieldNode`]s with gofmt-style column alignment.

use std::fs;
use std::ops::Range;

use tracing::debug;

use crate::error::{Error, Result};

use super::types::{FieldNode, SourceFile, Spacing, StructType};

/// Serialize a file back to Go source.
pub fn serialize(file: &SourceFile) -> String {
    let source = file.source();
    let mut replacements: Vec<(Range<usize>, String)> = file
        .specs
        .iter()
        .filter_map(|spec| spec.as_struct())
        .filter(|st| st.is_replaced())
        .map(|st| (st.body.clone(), render_struct_body(st)))
        .collect();
    replacements.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    for (range, body) in replacements {
        out.push_str(&source[pos..range.start]);
        out.push_str(&body);
        pos = range.end;
    }
    out.push_str(&source[pos..]);
    out
}

/// Serialize a file and overwrite it on disk.
pub fn write_file(file: &SourceFile) -> Result<()> {
    let content = serialize(file);
    fs::write(file.path(), content).map_err(|e| Error::write(file.path(), e))?;
    debug!(path = %file.path().display(), "wrote file");
    Ok(())
}

/// Render the text between the braces of a struct type.
pub fn render_struct_body(st: &StructType) -> String {
    if st.fields.is_empty() && st.trailing.is_empty() {
        return String::new();
    }

    let indent = format!("{}\t", st.indent);
    let mut out = String::from("\n");
    let mut section: Vec<Vec<String>> = Vec::new();

    for (i, field) in st.fields.iter().enumerate() {
        let blank = i > 0 && field.decs.before == Spacing::EmptyLine;
        if blank || !field.decs.start.is_empty() {
            flush_section(&mut out, &mut section, &indent);
        }
        if blank {
            out.push('\n');
        }
        write_comment_lines(&mut out, &field.decs.start, &indent);

        let row = field_cells(field);
        if row.iter().any(|cell| cell.contains('\n')) {
            flush_section(&mut out, &mut section, &indent);
            section.push(row);
            flush_section(&mut out, &mut section, &indent);
        } else {
            section.push(row);
        }
    }
    flush_section(&mut out, &mut section, &indent);
    write_comment_lines(&mut out, &st.trailing, &indent);

    out.push_str(&st.indent);
    out
}

/// The cells of one field line: names, type, tag, end-of-line comments.
fn field_cells(field: &FieldNode) -> Vec<String> {
    let mut cells = Vec::with_capacity(4);
    if !field.is_embedded() {
        cells.push(field.names.join(", "));
    }
    cells.push(field.ty.to_source());
    if let Some(tag) = &field.tag {
        cells.push(tag.clone());
    }
    if !field.decs.end.is_empty() {
        cells.push(field.decs.end.join(" "));
    }
    cells
}

fn write_comment_lines(out: &mut String, lines: &[String], indent: &str) {
    for line in lines {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(indent);
            out.push_str(line);
            out.push('\n');
        }
    }
}

/// Write an aligned block of rows. A cell that is the last of its row does not
/// widen its column.
fn flush_section(out: &mut String, rows: &mut Vec<Vec<String>>, indent: &str) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows.iter() {
        for (col, cell) in row.iter().enumerate().take(row.len().saturating_sub(1)) {
            widths[col] = widths[col].max(cell.chars().count());
        }
    }

    for row in rows.drain(..) {
        out.push_str(indent);
        let last = row.len().saturating_sub(1);
        for (col, cell) in row.iter().enumerate() {
            out.push_str(cell);
            if col < last {
                let pad = widths[col] - cell.chars().count() + 1;
                out.extend(std::iter::repeat(' ').take(pad));
            }
        }
        out.push('\n');
    }
}
