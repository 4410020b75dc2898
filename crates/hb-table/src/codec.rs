//! Reading and writing tables from disk.

use std::collections::BTreeMap;
use std::fs;
use std::ops::Range;
use std::path::Path;

use tracing::debug;

use crate::error::{TableError, TableResult};
use crate::table::{Alignment, SourceLine, Table};

const FIELD_SEPARATOR: &str = "  ";

/// How a table file should be interpreted.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// A units line follows the header.
    pub has_units: bool,
    /// Column whose values identify rows.
    pub index: Option<String>,
    /// Columns exposed through [`Table::selected_rows`]; all when `None`.
    pub columns: Option<Vec<String>>,
    /// Row filter: column name -> accepted values.
    pub filter_by: BTreeMap<String, Vec<String>>,
}

impl LoadOptions {
    pub fn indexed(index: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            ..Self::default()
        }
    }
}

/// Load/save contract for tabular model inputs.
pub trait TableCodec: Send + Sync {
    fn load(&self, path: &Path, options: &LoadOptions) -> TableResult<Table>;

    /// Write the table back, keeping title, units line and column layout.
    fn save(&self, table: &Table, path: &Path) -> TableResult<()>;
}

/// Whitespace-separated tables: title line, header, optional units, rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTableCodec;

impl WhitespaceTableCodec {
    pub fn parse(&self, text: &str, path: &Path, options: &LoadOptions) -> TableResult<Table> {
        let malformed = |line: usize, reason: String| TableError::FileFormat {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let mut lines = text.split_inclusive('\n').map(split_ending).enumerate();
        let (title, ending) = lines
            .next()
            .map(|(_, line)| line)
            .ok_or_else(|| malformed(1, "empty file".to_string()))?;
        let mut source = vec![verbatim(title, ending)];

        let mut names: Option<Vec<String>> = None;
        let mut units: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for (idx, (line, ending)) in lines {
            if line.trim().is_empty() {
                source.push(verbatim(line, ending));
                continue;
            }
            let spans = field_spans(line);
            let cells: Vec<String> = spans.iter().map(|span| line[span.clone()].to_string()).collect();

            let Some(columns) = names.as_ref().map(Vec::len) else {
                names = Some(cells);
                source.push(verbatim(line, ending));
                continue;
            };
            if options.has_units && units.is_none() {
                if cells.len() != columns {
                    return Err(malformed(
                        idx + 1,
                        format!("expected {} units, found {}", columns, cells.len()),
                    ));
                }
                units = Some(cells);
                source.push(verbatim(line, ending));
                continue;
            }
            if cells.len() != columns {
                return Err(malformed(
                    idx + 1,
                    format!("expected {} fields, found {}", columns, cells.len()),
                ));
            }
            source.push(SourceLine {
                text: line.to_string(),
                ending: ending.to_string(),
                row: Some((rows.len(), spans)),
            });
            rows.push(cells);
        }

        let names = names.ok_or_else(|| malformed(2, "missing header line".to_string()))?;
        if options.has_units && units.is_none() {
            return Err(malformed(3, "missing units line".to_string()));
        }

        let mut table =
            Table::from_cells(title.trim_end(), names, units, rows).with_source(source);
        if let Some(index) = &options.index {
            table.set_index(index)?;
        }
        if let Some(columns) = &options.columns {
            table.keep_columns(columns)?;
        }
        table.filter_by(&options.filter_by)?;
        Ok(table)
    }

    /// Render a table as file text.
    ///
    /// A loaded table comes back byte-for-byte except for edited cells, which
    /// are written into their original span. A value wider than its span
    /// first takes spare blanks from the neighbouring gap and only then
    /// shifts the rest of its line.
    pub fn render(&self, table: &Table) -> String {
        let alignments: Vec<Alignment> = table.columns().iter().map(|c| c.alignment).collect();
        let Some(source) = table.source() else {
            return render_fresh(table, &alignments);
        };

        let mut out = String::new();
        for line in source {
            match &line.row {
                Some((row, spans)) => {
                    out.push_str(&splice_row(&line.text, spans, &table.rows()[*row], &alignments))
                }
                None => out.push_str(&line.text),
            }
            out.push_str(&line.ending);
        }
        out
    }
}

fn split_ending(line: &str) -> (&str, &str) {
    if let Some(text) = line.strip_suffix("\r\n") {
        (text, "\r\n")
    } else if let Some(text) = line.strip_suffix('\n') {
        (text, "\n")
    } else {
        (line, "")
    }
}

fn verbatim(text: &str, ending: &str) -> SourceLine {
    SourceLine {
        text: text.to_string(),
        ending: ending.to_string(),
        row: None,
    }
}

/// Byte ranges of the whitespace-separated fields of `line`.
fn field_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;
    for (pos, ch) in line.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(begin)) => {
                spans.push(begin..pos);
                start = None;
            }
            (false, None) => start = Some(pos),
            _ => {}
        }
    }
    if let Some(begin) = start {
        spans.push(begin..line.len());
    }
    spans
}

fn splice_row(
    text: &str,
    spans: &[Range<usize>],
    cells: &[String],
    alignments: &[Alignment],
) -> String {
    // gaps[i] precedes field i; the last entry is the line tail.
    let mut gaps: Vec<String> = Vec::with_capacity(spans.len() + 1);
    let mut prev = 0;
    for span in spans {
        gaps.push(text[prev..span.start].to_string());
        prev = span.end;
    }
    gaps.push(text[prev..].to_string());

    let mut fields = Vec::with_capacity(spans.len());
    for (pos, span) in spans.iter().enumerate() {
        let original = &text[span.clone()];
        let value = cells[pos].as_str();
        if original == value {
            fields.push(original.to_string());
            continue;
        }
        let width = original.chars().count();
        let len = value.chars().count();
        let alignment = alignments[pos];
        if len > width {
            let gap = match alignment {
                Alignment::Right => pos,
                Alignment::Left => pos + 1,
            };
            // Interior gaps keep one blank so fields stay separated.
            let keep = usize::from(gap != 0 && gap != spans.len());
            shrink_gap(&mut gaps[gap], len - width, keep);
        }
        fields.push(pad(value, width, alignment));
    }

    let mut out = String::with_capacity(text.len());
    for (gap, field) in gaps.iter().zip(&fields) {
        out.push_str(gap);
        out.push_str(field);
    }
    out.push_str(&gaps[spans.len()]);
    out
}

fn shrink_gap(gap: &mut String, wanted: usize, keep: usize) {
    let spare = gap.chars().count().saturating_sub(keep);
    for _ in 0..wanted.min(spare) {
        gap.pop();
    }
}

fn pad(value: &str, width: usize, alignment: Alignment) -> String {
    match alignment {
        Alignment::Left => format!("{:<width$}", value),
        Alignment::Right => format!("{:>width$}", value),
    }
}

/// Layout for tables built in memory: every column as wide as its widest cell.
fn render_fresh(table: &Table, alignments: &[Alignment]) -> String {
    let widths = table.render_widths();

    let mut out = String::new();
    out.push_str(table.title());
    out.push('\n');

    let header: Vec<&str> = table.column_names().collect();
    push_line(&mut out, &header, &widths, alignments);
    if let Some(units) = table.units() {
        let units: Vec<&str> = units.iter().map(String::as_str).collect();
        push_line(&mut out, &units, &widths, alignments);
    }
    for row in table.rows() {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_line(&mut out, &cells, &widths, alignments);
    }
    out
}

fn push_line(out: &mut String, cells: &[&str], widths: &[usize], alignments: &[Alignment]) {
    let mut line = String::new();
    for (pos, cell) in cells.iter().enumerate() {
        if pos > 0 {
            line.push_str(FIELD_SEPARATOR);
        }
        line.push_str(&pad(cell, widths[pos], alignments[pos]));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

impl TableCodec for WhitespaceTableCodec {
    fn load(&self, path: &Path, options: &LoadOptions) -> TableResult<Table> {
        let text = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = self.parse(&text, path, options)?;
        debug!(path = %path.display(), rows = table.len(), "loaded table");
        Ok(table)
    }

    fn save(&self, table: &Table, path: &Path) -> TableResult<()> {
        fs::write(path, self.render(table)).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), rows = table.len(), "saved table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HYD: &str = "\
hydrology.hyd: written by editor
name      lat_ttime     esco     epco
hyd001      0.00000  0.95000  1.00000
hyd002      0.00000  0.90000  1.00000
";

    #[test]
    fn parse_header_and_rows() {
        let table = WhitespaceTableCodec
            .parse(HYD, Path::new("hydrology.hyd"), &LoadOptions::indexed("name"))
            .unwrap();
        assert_eq!(table.title(), "hydrology.hyd: written by editor");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("hyd001", "esco").unwrap(), "0.95000");
        assert_eq!(table.index_column(), Some("name"));
    }

    #[test]
    fn ragged_row_is_a_format_error() {
        let text = "title\na b\n1 2 3\n";
        let err = WhitespaceTableCodec
            .parse(text, Path::new("bad.txt"), &LoadOptions::default())
            .unwrap_err();
        match err {
            TableError::FileFormat { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn units_line_is_preserved() {
        let text = "title\nname  area\nna    ha\nb1    12.5\n";
        let options = LoadOptions {
            has_units: true,
            ..LoadOptions::default()
        };
        let codec = WhitespaceTableCodec;
        let table = codec.parse(text, Path::new("u.txt"), &options).unwrap();
        assert_eq!(table.units().unwrap(), ["na", "ha"]);
        let rendered = codec.render(&table);
        assert_eq!(rendered.lines().nth(2).unwrap().split_whitespace().collect::<Vec<_>>(), ["na", "ha"]);
    }

    const EDITOR_HYD: &str = "\
hydrology.hyd: written by SWAT+ editor v2.3.3 on 2024-05-02 10:21
name                lat_ttime        lat_sed        can_max           esco           epco
hyd001                0.00000        0.00000        1.00000        0.95000        1.00000
hyd002                0.00000        0.00000        1.00000        0.90000        1.00000
";

    fn editor_table() -> Table {
        WhitespaceTableCodec
            .parse(EDITOR_HYD, Path::new("hydrology.hyd"), &LoadOptions::indexed("name"))
            .unwrap()
    }

    #[test]
    fn unchanged_table_renders_byte_identical() {
        assert_eq!(WhitespaceTableCodec.render(&editor_table()), EDITOR_HYD);
        assert_eq!(WhitespaceTableCodec.render(&sample_table()), HYD);
    }

    #[test]
    fn crlf_blank_lines_and_missing_final_newline_survive() {
        let text = "title  \r\nname  esco\r\n\r\nhyd001  0.9\r\nhyd002  0.8";
        let table = WhitespaceTableCodec
            .parse(text, Path::new("c.hyd"), &LoadOptions::default())
            .unwrap();
        assert_eq!(table.title(), "title");
        assert_eq!(table.len(), 2);
        assert_eq!(WhitespaceTableCodec.render(&table), text);
    }

    #[test]
    fn edited_cell_stays_in_its_span() {
        let mut table = editor_table();
        table.set("hyd001", "esco", "0.5").unwrap();
        let rendered = WhitespaceTableCodec.render(&table);

        let before: Vec<&str> = EDITOR_HYD.lines().collect();
        let after: Vec<&str> = rendered.lines().collect();
        assert_eq!(after.len(), before.len());
        assert_eq!(after[2], before[2].replace("0.95000", "    0.5"));
        for line in [0, 1, 3] {
            assert_eq!(after[line], before[line]);
        }
    }

    #[test]
    fn wide_value_borrows_blanks_before_shifting() {
        let mut table = editor_table();
        table.set("hyd001", "esco", "0.123456789").unwrap();
        let rendered = WhitespaceTableCodec.render(&table);
        let after: Vec<&str> = rendered.lines().collect();
        let before: Vec<&str> = EDITOR_HYD.lines().collect();

        // The gap before esco had room, so the line length is unchanged.
        assert_eq!(after[2].len(), before[2].len());
        assert_eq!(
            after[2].split_whitespace().collect::<Vec<_>>(),
            ["hyd001", "0.00000", "0.00000", "1.00000", "0.123456789", "1.00000"]
        );
        assert_eq!(after[3], before[3]);
    }

    #[test]
    fn value_wider_than_the_gap_keeps_one_blank() {
        let mut table = WhitespaceTableCodec
            .parse(HYD, Path::new("hydrology.hyd"), &LoadOptions::indexed("name"))
            .unwrap();
        table.set("hyd001", "esco", "0.123456789").unwrap();
        let rendered = WhitespaceTableCodec.render(&table);
        let line = rendered.lines().nth(2).unwrap();
        assert_eq!(line, "hyd001      0.00000 0.123456789  1.00000");
        assert_eq!(rendered.lines().nth(3), HYD.lines().nth(3));
    }

    #[test]
    fn built_tables_get_a_fresh_layout() {
        let table = Table::from_cells(
            "t",
            vec!["name".into(), "esco".into()],
            None,
            vec![vec!["hyd001".into(), "0.9".into()]],
        );
        assert_eq!(WhitespaceTableCodec.render(&table), "t\nname    esco\nhyd001   0.9\n");
    }

    fn sample_table() -> Table {
        WhitespaceTableCodec
            .parse(HYD, Path::new("hydrology.hyd"), &LoadOptions::default())
            .unwrap()
    }
}
