use crate::ai_sql::schema::{PiiRecord, SchemaInfo};
use crate::database::QueryRows;
use prettytable::format::consts::FORMAT_BOX_CHARS;
use prettytable::{Cell, Row, Table};

/// Cells wider than this are cut with an ellipsis in result tables
pub const MAX_CELL_WIDTH: usize = 60;

fn pad(text: &str, width: usize, left_align: bool) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let padding = " ".repeat(width - len);
    if left_align {
        format!("{}{}", text, padding)
    } else {
        format!("{}{}", padding, text)
    }
}

fn truncate(text: &str, max_width: usize) -> String {
    let single_line = text.replace('\n', "\\n");
    if single_line.chars().count() <= max_width {
        return single_line;
    }
    let kept: String = single_line.chars().take(max_width.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// psql-style rendering of a result set.
///
/// Text is left-aligned, numbers are right-aligned, and a `(N rows)` footer
/// closes the table. An empty result still prints its header.
pub fn format_query_results_psql(rows: &QueryRows) -> String {
    if rows.columns.is_empty() {
        return format_row_count(rows.len());
    }

    let cells: Vec<Vec<(String, bool)>> = rows
        .rows
        .iter()
        .map(|row| {
            (0..rows.columns.len())
                .map(|i| match row.get(i) {
                    Some(value) => (truncate(&value.to_string(), MAX_CELL_WIDTH), value.is_numeric()),
                    None => (String::new(), false),
                })
                .collect()
        })
        .collect();

    let mut col_widths: Vec<usize> = rows.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (i, (text, _)) in row.iter().enumerate() {
            col_widths[i] = col_widths[i].max(text.chars().count());
        }
    }

    let mut result = String::new();

    for (i, h) in rows.columns.iter().enumerate() {
        if i > 0 {
            result.push_str(" | ");
        }
        result.push_str(&pad(h, col_widths[i], true));
    }
    result.push('\n');

    for (i, width) in col_widths.iter().enumerate() {
        if i > 0 {
            result.push_str("-+-");
        }
        result.push_str(&"-".repeat(*width));
    }
    result.push('\n');

    for row in &cells {
        for (i, (text, numeric)) in row.iter().enumerate() {
            if i > 0 {
                result.push_str(" | ");
            }
            result.push_str(&pad(text, col_widths[i], !numeric));
        }
        result.push('\n');
    }

    result.push_str(&format_row_count(rows.len()));
    result
}

fn format_row_count(count: usize) -> String {
    format!("({} {})\n", count, if count == 1 { "row" } else { "rows" })
}

/// One box-drawn table per store table, listing columns with their flags
pub fn format_schema(schema: &SchemaInfo) -> String {
    let mut output = String::new();
    for table_schema in &schema.tables {
        let mut table = Table::new();
        table.set_format(*FORMAT_BOX_CHARS);
        table.set_titles(Row::new(vec![
            Cell::new("Column"),
            Cell::new("Type"),
            Cell::new("Modifiers"),
        ]));

        for column in &table_schema.columns {
            let mut modifiers = Vec::new();
            if column.primary_key {
                modifiers.push("PRIMARY KEY");
            }
            if column.not_null {
                modifiers.push("NOT NULL");
            }
            let modifiers = if modifiers.is_empty() {
                "-".to_string()
            } else {
                modifiers.join(", ")
            };
            table.add_row(Row::new(vec![
                Cell::new(&column.name),
                Cell::new(&column.data_type),
                Cell::new(&modifiers),
            ]));
        }

        output.push_str(&format!("Table \"{}\"\n", table_schema.name));
        output.push_str(&table.to_string());
        output.push('\n');
    }
    output
}

/// Box-drawn rendering of the PII catalog
pub fn format_pii(records: &[PiiRecord]) -> String {
    let mut table = Table::new();
    table.set_format(*FORMAT_BOX_CHARS);
    table.set_titles(Row::new(vec![
        Cell::new("Table"),
        Cell::new("Column"),
        Cell::new("PII type"),
        Cell::new("Masking"),
        Cell::new("Access level"),
    ]));

    for record in records {
        table.add_row(Row::new(vec![
            Cell::new(&record.table_name),
            Cell::new(&record.column_name),
            Cell::new(&record.pii_type),
            Cell::new(if record.requires_masking { "required" } else { "no" }),
            Cell::new(&record.access_level.to_string()).style_spec("r"),
        ]));
    }

    table.to_string()
}
