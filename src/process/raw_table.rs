use calamine::{Data, Range};
use std::fmt;

/// One worksheet cell with no schema applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    /// Blank cells and empty strings both count as missing.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text rendering used for row labels; missing cells render as `""`.
    pub fn to_label(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
        }
    }

    /// Numeric value of the cell, if it has one.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(d: &Data) -> Self {
        match d {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_label())
    }
}

/// A worksheet read position-addressed from A1, rows possibly ragged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Copy a calamine range into a grid anchored at A1.
    ///
    /// calamine drops leading blank rows/columns from the range, so they are padded
    /// back in to keep row and column indexes equal to sheet positions.
    pub fn from_range(range: &Range<Data>) -> Self {
        let (row_off, col_off) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_off];
        for r in range.rows() {
            let mut row = vec![Cell::Empty; col_off];
            row.extend(r.iter().map(Cell::from));
            rows.push(row);
        }
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Missing positions read as `Cell::Empty`.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_render_numbers_without_trailing_zero() {
        assert_eq!(Cell::Number(3.0).to_label(), "3");
        assert_eq!(Cell::Number(2.5).to_label(), "2.5");
        assert_eq!(Cell::Empty.to_label(), "");
        assert_eq!(Cell::Text("建設業".into()).to_label(), "建設業");
    }

    #[test]
    fn text_cells_parse_as_numbers_when_they_can() {
        assert_eq!(Cell::Text(" 12 ".into()).to_number(), Some(12.0));
        assert_eq!(Cell::Text("—".into()).to_number(), None);
        assert_eq!(Cell::Text("1,234".into()).to_number(), None);
        assert_eq!(Cell::Empty.to_number(), None);
    }

    #[test]
    fn from_range_pads_back_to_a1() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("header".to_string()));
        range.set_value((3, 2), Data::Float(7.0));

        let grid = RawGrid::from_range(&range);
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.cell(2, 1), &Cell::Text("header".to_string()));
        assert_eq!(grid.cell(3, 2), &Cell::Number(7.0));
        assert_eq!(grid.cell(0, 0), &Cell::Empty);
        assert_eq!(grid.cell(10, 10), &Cell::Empty);
    }

    #[test]
    fn ints_and_bools_become_numbers() {
        assert_eq!(Cell::from(&Data::Int(4)), Cell::Number(4.0));
        assert_eq!(Cell::from(&Data::Bool(true)), Cell::Number(1.0));
        assert_eq!(Cell::from(&Data::Empty), Cell::Empty);
    }
}
