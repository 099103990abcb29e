use crate::error::PipelineError;
use crate::process::{date_parser::Period, raw_table::RawGrid, utils::to_full_width_digits};
use anyhow::Context;
use calamine::{open_workbook_auto_from_rs, Reader, Sheets};
use std::io::Cursor;
use tracing::{debug, info, instrument};

/// Reiwa 1 is 2019, so era year = calendar year − 2018.
pub const ERA_BASE_YEAR: i32 = 2018;

const DEATHS_INJURIES: &str = "死傷災害";
const BY_INDUSTRY_AND_TYPE: &str = "業種・事故の型別";

/// An era year in both digit renderings used in sheet names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EraYear {
    pub half_width: String,
    pub full_width: String,
}

impl EraYear {
    pub fn for_calendar_year(year: i32) -> Self {
        let half_width = (year - ERA_BASE_YEAR).to_string();
        let full_width = to_full_width_digits(&half_width);
        Self {
            half_width,
            full_width,
        }
    }

    /// `令和{y}年` in full-width then half-width digits.
    fn phrases(&self) -> [String; 2] {
        [
            format!("令和{}年", self.full_width),
            format!("令和{}年", self.half_width),
        ]
    }

    /// Exact sheet names to try, full-width first.
    pub fn target_sheet_names(&self) -> [String; 2] {
        self.phrases()
            .map(|era| format!("{DEATHS_INJURIES}（{era}、{BY_INDUSTRY_AND_TYPE}）"))
    }
}

/// Pick the deaths/injuries-by-industry sheet for `era` out of `sheet_names`.
///
/// An exact name wins; otherwise the first sheet carrying both keywords and the era
/// phrase in either digit form.
pub fn find_target_sheet<'a>(sheet_names: &'a [String], era: &EraYear) -> Option<&'a str> {
    for target in era.target_sheet_names() {
        if let Some(name) = sheet_names.iter().find(|n| **n == target) {
            return Some(name.as_str());
        }
    }

    let phrases = era.phrases();
    sheet_names
        .iter()
        .find(|name| {
            name.contains(DEATHS_INJURIES)
                && name.contains(BY_INDUSTRY_AND_TYPE)
                && phrases.iter().any(|p| name.contains(p.as_str()))
        })
        .map(String::as_str)
}

/// The sheet chosen for a period, already read into a grid.
#[derive(Debug)]
pub struct LocatedSheet {
    pub name: String,
    pub grid: RawGrid,
}

/// Open an in-memory `.xls`/`.xlsx` workbook.
pub fn open_workbook(bytes: Vec<u8>) -> anyhow::Result<Sheets<Cursor<Vec<u8>>>> {
    open_workbook_auto_from_rs(Cursor::new(bytes)).context("opening workbook")
}

/// Read `name` into a grid with no header inference.
pub fn read_grid(workbook: &mut Sheets<Cursor<Vec<u8>>>, name: &str) -> anyhow::Result<RawGrid> {
    let range = workbook
        .worksheet_range(name)
        .with_context(|| format!("reading sheet {}", name))?;
    Ok(RawGrid::from_range(&range))
}

/// Locate and read the target sheet of a downloaded workbook for `period`.
#[instrument(level = "info", skip_all, fields(size = bytes.len(), %period))]
pub fn locate_sheet(bytes: Vec<u8>, period: Period) -> Result<LocatedSheet, PipelineError> {
    let mut workbook = open_workbook(bytes).map_err(PipelineError::Workbook)?;
    let sheet_names = workbook.sheet_names();
    debug!(count = sheet_names.len(), "workbook sheets");

    let era = EraYear::for_calendar_year(period.year());
    let Some(name) = find_target_sheet(&sheet_names, &era).map(str::to_owned) else {
        return Err(PipelineError::SheetNotFound {
            era_year: era.half_width,
            available: sheet_names,
        });
    };

    info!(sheet = %name, "reading sheet");
    let grid = read_grid(&mut workbook, &name).map_err(PipelineError::Workbook)?;
    Ok(LocatedSheet { name, grid })
}
