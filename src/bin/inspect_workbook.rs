use anyhow::{anyhow, Context, Result};
use calamine::Reader;
use rousai_scraper::process::{
    clean_fixed_layout, period_from_filename,
    sheet::{find_target_sheet, open_workbook, read_grid, EraYear},
    Period,
};
use std::{env, fs, path::Path, process::exit};

fn main() {
    // Expect a workbook path and an optional YYYY-MM data month.
    let args: Vec<String> = env::args().collect();
    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} <WORKBOOK.xls[x]> [YYYY-MM]", args[0]);
        exit(1);
    }
    if let Err(e) = inspect_workbook(Path::new(&args[1]), args.get(2).map(String::as_str)) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// List sheets, pick the target one and print its normalized table.
fn inspect_workbook(path: &Path, period: Option<&str>) -> Result<()> {
    let period: Period = match period {
        Some(p) => p.parse()?,
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(period_from_filename)
            .ok_or_else(|| anyhow!("cannot infer period from {}; pass YYYY-MM", path.display()))?,
    };

    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut workbook = open_workbook(bytes)?;
    let sheet_names = workbook.sheet_names();

    println!("=== Workbook: {} ===", path.display());
    println!("Data month: {}", period);
    println!("Sheets:");
    for name in &sheet_names {
        println!("  - {}", name);
    }
    println!();

    let era = EraYear::for_calendar_year(period.year());
    let name = find_target_sheet(&sheet_names, &era)
        .ok_or_else(|| anyhow!("no target sheet for 令和{}年", era.half_width))?
        .to_string();
    println!("=== Sheet: {} ===", name);

    let grid = read_grid(&mut workbook, &name)?;
    println!("Raw rows: {}", grid.len());
    println!();
    print!("{}", clean_fixed_layout(&grid));
    println!();
    Ok(())
}
