//! In-memory table addressed by (row id, column name).

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::{TableError, TableResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Column layout as observed in the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Widest cell seen at load. Only used when a table without source text is rendered.
    pub width: usize,
    pub alignment: Alignment,
}

/// One line of the file a table was read from.
#[derive(Debug, Clone)]
pub(crate) struct SourceLine {
    pub(crate) text: String,
    /// Terminator as found: `"\n"`, `"\r\n"`, or empty on an unterminated last line.
    pub(crate) ending: String,
    /// Data row held by this line and the byte span of each cell in `text`.
    /// Every other line is written back verbatim.
    pub(crate) row: Option<(usize, Vec<Range<usize>>)>,
}

#[derive(Debug, Clone)]
pub struct Table {
    title: String,
    columns: Vec<Column>,
    units: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    index: Option<usize>,
    keep: Option<Vec<usize>>,
    filter: Vec<(usize, Vec<String>)>,
    source: Option<Vec<SourceLine>>,
}

impl Table {
    /// Build a table from raw cells, deriving widths and alignment from the data.
    pub fn from_cells(
        title: impl Into<String>,
        names: Vec<String>,
        units: Option<Vec<String>>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(pos, name)| {
                let mut width = name.len();
                if let Some(unit) = units.as_ref().and_then(|u| u.get(pos)) {
                    width = width.max(unit.len());
                }
                let mut numeric = true;
                for row in &rows {
                    if let Some(cell) = row.get(pos) {
                        width = width.max(cell.len());
                        numeric &= is_numeric(cell);
                    }
                }
                let alignment = if numeric && !rows.is_empty() {
                    Alignment::Right
                } else {
                    Alignment::Left
                };
                Column {
                    name,
                    width,
                    alignment,
                }
            })
            .collect();

        Self {
            title: title.into(),
            columns,
            units,
            rows,
            index: None,
            keep: None,
            filter: Vec::new(),
            source: None,
        }
    }

    pub(crate) fn with_source(mut self, lines: Vec<SourceLine>) -> Self {
        self.source = Some(lines);
        self
    }

    /// Original file text, when the table was loaded rather than built.
    pub(crate) fn source(&self) -> Option<&[SourceLine]> {
        self.source.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn units(&self) -> Option<&[String]> {
        self.units.as_deref()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index_column(&self) -> Option<&str> {
        self.index.map(|pos| self.columns[pos].name.as_str())
    }

    /// Choose the column whose values identify rows.
    pub fn set_index(&mut self, column: &str) -> TableResult<()> {
        self.index = Some(self.column_position(column)?);
        Ok(())
    }

    /// Restrict [`Table::selected_rows`] to the named columns.
    pub fn keep_columns(&mut self, columns: &[String]) -> TableResult<()> {
        let positions = columns
            .iter()
            .map(|c| self.column_position(c))
            .collect::<TableResult<Vec<_>>>()?;
        self.keep = Some(positions);
        Ok(())
    }

    /// Restrict [`Table::selected_rows`] to rows whose column value is one of `values`.
    pub fn filter_by(&mut self, filters: &BTreeMap<String, Vec<String>>) -> TableResult<()> {
        self.filter = filters
            .iter()
            .map(|(column, values)| Ok((self.column_position(column)?, values.clone())))
            .collect::<TableResult<Vec<_>>>()?;
        Ok(())
    }

    /// Rows passing the load filter, projected onto the kept columns.
    ///
    /// Filtering is a view only: every row is still written back on save.
    pub fn selected_rows(&self) -> Vec<Vec<&str>> {
        self.rows
            .iter()
            .filter(|row| {
                self.filter
                    .iter()
                    .all(|(pos, values)| values.iter().any(|v| v == &row[*pos]))
            })
            .map(|row| match &self.keep {
                Some(keep) => keep.iter().map(|pos| row[*pos].as_str()).collect(),
                None => row.iter().map(String::as_str).collect(),
            })
            .collect()
    }

    pub fn column_position(&self, column: &str) -> TableResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| TableError::MissingColumn {
                column: column.to_string(),
            })
    }

    fn row_positions(&self, row: &str) -> TableResult<Vec<usize>> {
        let index = self.index.ok_or_else(|| TableError::NoIndex {
            row: row.to_string(),
        })?;
        let positions: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells[index] == row)
            .map(|(pos, _)| pos)
            .collect();
        if positions.is_empty() {
            return Err(TableError::MissingRow {
                row: row.to_string(),
                index: self.columns[index].name.clone(),
            });
        }
        Ok(positions)
    }

    pub fn get(&self, row: &str, column: &str) -> TableResult<&str> {
        let col = self.column_position(column)?;
        let positions = self.row_positions(row)?;
        Ok(self.rows[positions[0]][col].as_str())
    }

    /// Set one cell. Rows sharing the same id are all updated; returns how many.
    pub fn set(&mut self, row: &str, column: &str, value: impl ToString) -> TableResult<usize> {
        let col = self.column_position(column)?;
        let positions = self.row_positions(row)?;
        let value = value.to_string();
        for pos in &positions {
            self.rows[*pos][col] = value.clone();
        }
        Ok(positions.len())
    }

    pub fn column(&self, column: &str) -> TableResult<Vec<&str>> {
        let col = self.column_position(column)?;
        Ok(self.rows.iter().map(|r| r[col].as_str()).collect())
    }

    /// Assign the same value to every row of a column.
    pub fn set_column(&mut self, column: &str, value: impl ToString) -> TableResult<()> {
        let col = self.column_position(column)?;
        let value = value.to_string();
        for row in &mut self.rows {
            row[col] = value.clone();
        }
        Ok(())
    }

    /// Rendered width of each column: the original width, widened for new values.
    pub(crate) fn render_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(pos, column)| {
                self.rows
                    .iter()
                    .map(|r| r[pos].len())
                    .fold(column.width, usize::max)
            })
            .collect()
    }
}

fn is_numeric(cell: &str) -> bool {
    cell.parse::<f64>().is_ok()
}
