//! Table markup to pipe-delimited text.
//!
//! Upstream tables arrive as HTML-like markup (`<table><tr><td>..`). They
//! are flattened into a `| a | b |` text table that survives tokenization
//! and that the model can quote back verbatim.

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

/// Cells extracted from table markup.
#[derive(Debug, Default, PartialEq)]
struct ParsedTable {
    /// Text of every explicitly tagged header cell (`<th>`).
    headers: Vec<String>,
    /// Data rows (`<td>` cells), empty rows skipped.
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CellKind {
    Header,
    Data,
}

/// Collapse runs of whitespace and trim.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Walk the markup leniently: unknown entities are kept as written and
/// unclosed cells are closed by the next cell or row.
fn parse_table(markup: &str) -> ParsedTable {
    let mut reader = Reader::from_str(markup);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
    }

    let mut table = ParsedTable::default();
    let mut row: Vec<String> = Vec::new();
    let mut cell: Option<(CellKind, String)> = None;

    let finish_cell = |cell: &mut Option<(CellKind, String)>,
                       row: &mut Vec<String>,
                       headers: &mut Vec<String>| {
        if let Some((kind, text)) = cell.take() {
            match kind {
                CellKind::Header => headers.push(normalize(&text)),
                CellKind::Data => row.push(normalize(&text)),
            }
        }
    };

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref().to_ascii_lowercase().as_slice() {
                b"tr" => {
                    finish_cell(&mut cell, &mut row, &mut table.headers);
                    if !row.is_empty() {
                        table.rows.push(std::mem::take(&mut row));
                    }
                }
                b"th" => {
                    finish_cell(&mut cell, &mut row, &mut table.headers);
                    cell = Some((CellKind::Header, String::new()));
                }
                b"td" => {
                    finish_cell(&mut cell, &mut row, &mut table.headers);
                    cell = Some((CellKind::Data, String::new()));
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref().to_ascii_lowercase().as_slice() {
                b"th" => table.headers.push(String::new()),
                b"td" => row.push(String::new()),
                b"br" => {
                    if let Some((_, text)) = cell.as_mut() {
                        text.push(' ');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some((_, text)) = cell.as_mut() {
                    match t.unescape() {
                        Ok(s) => text.push_str(&s),
                        Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some((_, text)) = cell.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref().to_ascii_lowercase().as_slice() {
                b"th" | b"td" => finish_cell(&mut cell, &mut row, &mut table.headers),
                b"tr" | b"table" => {
                    finish_cell(&mut cell, &mut row, &mut table.headers);
                    if !row.is_empty() {
                        table.rows.push(std::mem::take(&mut row));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(error = %e, "Stopping at malformed table markup");
                break;
            }
            Ok(_) => {}
        }
    }

    finish_cell(&mut cell, &mut row, &mut table.headers);
    if !row.is_empty() {
        table.rows.push(row);
    }
    table
}

fn pipe_row(cells: &[String]) -> String {
    format!("| {} |\n", cells.join(" | "))
}

fn separator(width: usize) -> String {
    pipe_row(&vec!["---".to_string(); width])
}

/// Convert raw table markup into a pipe-delimited text table.
///
/// Explicit `<th>` cells form the header row. Without them the first data
/// row is followed by a separator line, so it reads as an untitled header.
/// Returns an empty string when the markup holds no cells.
pub fn table_markup_to_text(markup: &str) -> String {
    let table = parse_table(markup);
    let mut out = String::new();

    if !table.headers.is_empty() {
        out.push_str(&pipe_row(&table.headers));
        out.push_str(&separator(table.headers.len()));
    }

    for (index, row) in table.rows.iter().enumerate() {
        out.push_str(&pipe_row(row));
        if table.headers.is_empty() && index == 0 {
            out.push_str(&separator(row.len()));
        }
    }

    out
}
