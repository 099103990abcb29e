// src/process/mod.rs
pub mod date_parser;
pub mod normalize;
pub mod raw_table;
pub mod sheet;
pub mod utils;

pub use date_parser::{period_from_filename, Period};
pub use normalize::{clean_fixed_layout, NormalizedTable};
pub use raw_table::{Cell, RawGrid};
