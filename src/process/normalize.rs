use crate::process::raw_table::{Cell, RawGrid};
use std::fmt;
use tracing::{debug, instrument};

/// Zero-based row holding the column headers.
pub const HEADER_ROW_INDEX: usize = 2;

/// Placeholder for blank header cells.
pub const UNNAMED_HEADER: &str = "名称未設定";

/// Rows are kept only when their label starts with this.
pub const INDUSTRY_PREFIX: &str = "建設業";

const NOTE_MARKER: &str = "（注）";
const SOURCE_MARKER: &str = "出典";

/// Accident-type columns kept, in output order.
pub const ACCIDENT_TYPES: [&str; 21] = [
    "墜落・転落",
    "転倒",
    "激突",
    "飛来・落下",
    "崩壊・倒壊",
    "激突され",
    "はさまれ・巻き込まれ",
    "切れ・こすれ",
    "踏抜き",
    "おぼれ",
    "高温・低温物との接触",
    "有害物との接触",
    "感電",
    "爆発",
    "破裂",
    "火災",
    "交通事故（道路）",
    "交通事故（その他）",
    "動作の反動・無理な動作",
    "その他",
    "分類不能",
];

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Sector and subsector cells concatenated.
    pub label: String,
    /// One non-negative count per column.
    pub values: Vec<f64>,
}

/// Construction-industry rows restricted to the accident-type columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

impl NormalizedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// No rows, or no accident-type columns survived.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// `(column, value)` pairs of the first row; `None` when the table is empty.
    pub fn first_row(&self) -> Option<impl Iterator<Item = (&str, f64)> + '_> {
        if self.is_empty() {
            return None;
        }
        let row = self.rows.first()?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.values.iter().copied()),
        )
    }
}

impl fmt::Display for NormalizedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty table, {} columns)", self.columns.len());
        }
        for row in &self.rows {
            writeln!(f, "{}", row.label)?;
            for (col, v) in self.columns.iter().zip(&row.values) {
                writeln!(f, "  {}: {}", col, v)?;
            }
        }
        Ok(())
    }
}

fn row_label(row: &[Cell]) -> String {
    let sector = row.first().map(Cell::to_label).unwrap_or_default();
    let subsector = row.get(1).map(Cell::to_label).unwrap_or_default();
    sector + &subsector
}

/// Body rows up to, not including, the first blank or annotation label.
fn annotated_rows_cutoff(labels: &[String]) -> usize {
    labels
        .iter()
        .position(|label| {
            label.is_empty() || label.contains(NOTE_MARKER) || label.contains(SOURCE_MARKER)
        })
        .unwrap_or(labels.len())
}

/// Non-numeric and negative values become 0.
fn coerce_count(cell: &Cell) -> f64 {
    match cell.to_number() {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Turn the fixed-layout sheet into the construction-industry accident table.
///
/// Grids too short to hold a header row give back an empty table.
#[instrument(level = "debug", skip(grid), fields(rows = grid.len()))]
pub fn clean_fixed_layout(grid: &RawGrid) -> NormalizedTable {
    let Some(header_row) = grid.row(HEADER_ROW_INDEX) else {
        debug!("grid has no header row");
        return NormalizedTable::default();
    };

    let width = grid.width();
    let headers: Vec<String> = (0..width)
        .map(|i| match header_row.get(i) {
            Some(c) if !c.is_empty() => c.to_label().trim().to_string(),
            _ => UNNAMED_HEADER.to_string(),
        })
        .collect();

    let body: Vec<&[Cell]> = grid.rows().skip(HEADER_ROW_INDEX + 1).collect();
    let labels: Vec<String> = body.iter().map(|r| row_label(r)).collect();
    let cutoff = annotated_rows_cutoff(&labels);
    debug!(body = body.len(), kept = cutoff, "trimmed trailing annotations");

    let selected: Vec<(String, usize)> = ACCIDENT_TYPES
        .iter()
        .filter_map(|&name| {
            headers
                .iter()
                .position(|h| h == name)
                .map(|idx| (name.to_string(), idx))
        })
        .collect();

    let rows: Vec<TableRow> = body[..cutoff]
        .iter()
        .zip(&labels[..cutoff])
        .filter(|(row, _)| !row.iter().all(Cell::is_empty))
        .filter(|(_, label)| label.trim().starts_with(INDUSTRY_PREFIX))
        .map(|(row, label)| TableRow {
            label: label.clone(),
            values: selected
                .iter()
                .map(|&(_, idx)| row.get(idx).map(coerce_count).unwrap_or(0.0))
                .collect(),
        })
        .collect();

    NormalizedTable {
        columns: selected.into_iter().map(|(name, _)| name).collect(),
        rows,
    }
}
