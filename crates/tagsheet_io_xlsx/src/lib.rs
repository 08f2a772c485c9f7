//! `tagsheet_io_xlsx` v1:
//! Record-to-spreadsheet export kernel.
//!
//! - `conf`    : constants and default presets
//! - `spec`    : records/models/options/errors
//! - `util`    : pure helper functions
//! - `builder` : in-memory sheet model builder
//! - `writer`  : `rust_xlsxwriter` rendering and persistence
pub mod builder;
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use builder::build_sheet_model;
pub use conf::{
    C_SHEET_NAME_DEFAULT, EnumFmtKey, derive_default_columns, derive_default_formats,
    derive_default_write_options, derive_sample_records,
};
pub use spec::{
    EnumCellValue, SpecAutofitCellsPolicy, SpecCell, SpecCellFormat, SpecColumnDefinition,
    SpecRecord, SpecSheetHorizontalMerge, SpecSheetModel, SpecXlsxRecordsWriteOptions,
    SpecXlsxReport, XlsxRecordsError,
};
pub use util::{
    calculate_column_width, calculate_display_width, render_tags, sanitize_cell_value,
    strip_literal_marker,
};
pub use writer::{XlsxWriter, write_records_to_xlsx};
