//! Plain-text rendering of the visible page.

use std::fmt::Write as _;

use datatable_lib::{DataTable, SELECTION_COLUMN_ID, TableRow};

/// Renders the visible page as an aligned text table with a footer line.
pub fn render_page<T: TableRow>(table: &DataTable<T>) -> String {
    let columns = table.visible_column_ids();
    let model = table.row_model();

    let headers: Vec<String> = columns
        .iter()
        .map(|id| {
            if id == SELECTION_COLUMN_ID {
                header_checkbox(table)
            } else {
                table.header_text(id).unwrap_or_else(|| id.clone())
            }
        })
        .collect();

    let body: Vec<Vec<String>> = model
        .page_indices()
        .iter()
        .map(|&row| {
            columns
                .iter()
                .map(|id| table.render_cell(row, id).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..columns.len())
        .map(|i| {
            body.iter()
                .map(|cells| cells[i].chars().count())
                .chain(std::iter::once(headers[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for cells in &body {
        push_line(&mut out, cells, &widths);
    }

    let page = &model.page;
    let _ = write!(
        out,
        "Page {} of {} ({} rows)",
        if page.page_count == 0 { 0 } else { page.page_index + 1 },
        page.page_count,
        page.total_rows
    );
    if table.is_selection_enabled() {
        let _ = write!(out, ", {} selected", table.selected_row_ids().len());
    }
    out
}

fn header_checkbox<T: TableRow>(table: &DataTable<T>) -> String {
    let state = table.header_state();
    if state.all_selected {
        "[x]".to_string()
    } else if state.some_selected {
        "[-]".to_string()
    } else {
        "[ ]".to_string()
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use datatable_lib::{ColumnDef, TableOptions};
    use serde_json::json;

    #[test]
    fn test_render_page() {
        let mut table = DataTable::builder(vec![ColumnDef::new("name", "Name"), ColumnDef::new("age", "Age")])
            .rows(vec![json!({"name": "Ada", "age": 36}), json!({"name": "Grace", "age": 45})])
            .options(TableOptions::default().with_row_selection(true))
            .build();
        table.toggle_row("1");

        assert_eq!(
            render_page(&table),
            "[-]  Name   Age\n\
             ---  -----  ---\n\
             [ ]  Ada    36\n\
             [x]  Grace  45\n\
             Page 1 of 1 (2 rows), 1 selected"
        );
    }
}
