// Plain-text table rendering for the report presets.

/// How a column aligns its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Header plus alignment for one column.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub header: String,
    pub alignment: Alignment,
}

impl TableColumn {
    pub fn left(header: &str) -> Self {
        TableColumn {
            header: header.to_string(),
            alignment: Alignment::Left,
        }
    }

    pub fn right(header: &str) -> Self {
        TableColumn {
            header: header.to_string(),
            alignment: Alignment::Right,
        }
    }
}

/// A table with column metadata and rows of cells to render.
#[derive(Debug)]
pub struct Table {
    columns: Vec<TableColumn>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<TableColumn>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let mut width = column.header.chars().count();
                for row in &self.rows {
                    if let Some(cell) = row.get(idx) {
                        width = width.max(cell.chars().count());
                    }
                }
                width
            })
            .collect()
    }

    fn render_row(&self, cells: &[String], widths: &[usize]) -> String {
        let rendered: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let cell = cells.get(idx).map(String::as_str).unwrap_or("");
                let pad = widths[idx].saturating_sub(cell.chars().count());
                match column.alignment {
                    Alignment::Left => format!("{}{}", cell, " ".repeat(pad)),
                    Alignment::Right => format!("{}{}", " ".repeat(pad), cell),
                }
            })
            .collect();
        rendered.join("  ").trim_end().to_string()
    }

    /// Render the full table: header, rule, rows.
    pub fn render(&self) -> String {
        let widths = self.widths();
        let header: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();
        let rule_len = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

        let mut out = String::new();
        out.push_str(&self.render_row(&header, &widths));
        out.push('\n');
        out.push_str(&"-".repeat(rule_len));
        for row in &self.rows {
            out.push('\n');
            out.push_str(&self.render_row(row, &widths));
        }
        out
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_aligned_columns() {
        let mut table = Table::new(vec![
            TableColumn::left("Account"),
            TableColumn::right("Balance"),
        ]);
        table.add_row(vec!["asset.checking".to_string(), "100".to_string()]);
        table.add_row(vec!["expense.grocery".to_string(), "-45.77".to_string()]);

        let out = table.render();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Account"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("asset.checking"));
        // right-aligned balances end at the same column
        assert_eq!(lines[2].len(), lines[3].len());
    }

    #[test]
    fn short_rows_pad_out() {
        let mut table = Table::new(vec![TableColumn::left("A"), TableColumn::left("B")]);
        table.add_row(vec!["x".to_string()]);
        assert!(table.render().lines().count() == 3);
    }
}
