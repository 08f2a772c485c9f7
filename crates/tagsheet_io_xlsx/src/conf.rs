//! XLSX constants and default preset factories.

use crate::spec::{SpecCellFormat, SpecColumnDefinition, SpecRecord, SpecXlsxRecordsWriteOptions};

/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Default worksheet name.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";
/// Leading character that spreadsheet apps may read as a formula/number token.
pub const C_FORMULA_TRIGGER_PREFIX: char = '-';
/// Marker prepended to force literal-text interpretation.
pub const C_LITERAL_TEXT_MARKER: char = '\'';

/// Floor for persisted column width.
pub const N_WIDTH_CELL_MIN: f64 = 10.0;
/// Ceiling for persisted column width.
pub const N_WIDTH_CELL_MAX: f64 = 50.0;
/// Breathing-room factor applied to the measured display width.
pub const N_WIDTH_CELL_SCALE: f64 = 1.2;

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnumFmtKey {
    /// Header and data cell format.
    Standard,
    /// Merged title row format.
    Title,
}

/// Build the two named format presets used by [`crate::writer::XlsxWriter`].
///
/// Returns `(standard, title)`.
pub fn derive_default_formats() -> (SpecCellFormat, SpecCellFormat) {
    let cfg_base_fmt_spec = SpecCellFormat {
        valign: Some("vcenter".to_string()),
        text_wrap: Some(true),
        ..Default::default()
    };

    let fmt_title = cfg_base_fmt_spec.with_(SpecCellFormat {
        bold: Some(true),
        align: Some("center".to_string()),
        ..Default::default()
    });

    (cfg_base_fmt_spec, fmt_title)
}

/// Fixed column layout: Name, Description, Tags, Note.
pub fn derive_default_columns() -> Vec<SpecColumnDefinition> {
    vec![
        SpecColumnDefinition::new("Name", "Name, Description"),
        SpecColumnDefinition::new("Description", "Name, Description"),
        SpecColumnDefinition::new("Tags", "Tags, Note"),
        SpecColumnDefinition::new("Note", "Tags, Note"),
    ]
}

/// Build default write options.
pub fn derive_default_write_options() -> SpecXlsxRecordsWriteOptions {
    SpecXlsxRecordsWriteOptions::default()
}

/// Built-in demo records, used by the CLI when no input file is given.
pub fn derive_sample_records() -> Vec<SpecRecord> {
    vec![
        SpecRecord::new(
            "-Name1",
            "First line\nSecond line",
            ["go", "excel", "example1"],
            "-Note1",
        ),
        SpecRecord::new(
            "NormalName",
            "Single line description",
            ["yaml", "example2"],
            "Note2",
        ),
        SpecRecord::new(
            "-Name3",
            "Multi-line\ntest\nexample",
            ["multi", "line"],
            "Additional note",
        ),
        SpecRecord::new(
            "SingleTagName",
            "Single tag description",
            Vec::<String>::new(),
            "Single tag note",
        ),
    ]
}
