//! Shared XLSX specification models.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::conf::{
    C_SHEET_NAME_DEFAULT, EnumFmtKey, N_WIDTH_CELL_MAX, N_WIDTH_CELL_MIN, N_WIDTH_CELL_SCALE,
    derive_default_columns, derive_default_formats,
};

////////////////////////////////////////////////////////////////////////////////
// #region RecordSpecification

/// One exported entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpecRecord {
    /// Display name.
    pub name: String,
    /// Free text, may span several lines.
    pub description: String,
    /// Ordered tag list.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Trailing note.
    pub note: String,
}

impl SpecRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            note: note.into(),
        }
    }
}

/// Column header plus the title shown in the merged row above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnDefinition {
    /// Text shown in the header row.
    pub header: String,
    /// Text shown in the title row; equal neighbours are merged.
    pub title: String,
}

impl SpecColumnDefinition {
    pub fn new(header: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            title: title.into(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Bold style.
    pub bold: Option<bool>,
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetModel

/// Cell value in the in-memory sheet model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCellValue {
    /// Styled placeholder without text.
    None,
    /// Text value.
    String(String),
}

/// One cell: value plus style reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCell {
    /// Cell value.
    pub value: EnumCellValue,
    /// Named format preset.
    pub style: EnumFmtKey,
}

impl SpecCell {
    pub fn text(value: impl Into<String>, style: EnumFmtKey) -> Self {
        Self {
            value: EnumCellValue::String(value.into()),
            style,
        }
    }

    pub fn blank(style: EnumFmtKey) -> Self {
        Self {
            value: EnumCellValue::None,
            style,
        }
    }
}

/// Horizontal merge plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetHorizontalMerge {
    /// Row index where merge is applied.
    pub row_idx_start: usize,
    /// Start column index (inclusive).
    pub col_idx_start: usize,
    /// End column index (inclusive).
    pub col_idx_end: usize,
    /// Merge display text.
    pub text: String,
}

/// Fully built sheet, ready to be rendered by [`crate::writer::XlsxWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetModel {
    /// Worksheet name.
    pub sheet_name: String,
    /// Rows in write order.
    pub rows: Vec<Vec<SpecCell>>,
    /// Horizontal merges, anchored on their first cell.
    pub merges: Vec<SpecSheetHorizontalMerge>,
    /// Finalized per-column widths.
    pub col_widths: Vec<f64>,
}

impl SpecSheetModel {
    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.col_widths.len()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit policy for column width finalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecAutofitCellsPolicy {
    /// Minimum final width.
    pub width_cell_min: f64,
    /// Maximum final width.
    pub width_cell_max: f64,
    /// Factor applied to measured width before clamping.
    pub width_cell_scale: f64,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: N_WIDTH_CELL_MIN,
            width_cell_max: N_WIDTH_CELL_MAX,
            width_cell_scale: N_WIDTH_CELL_SCALE,
        }
    }
}

/// Options for one `write_records_to_xlsx` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecXlsxRecordsWriteOptions {
    /// Worksheet name; sanitized before use.
    pub sheet_name: String,
    /// Column layout, in write order.
    pub columns: Vec<SpecColumnDefinition>,
    /// Header/data cell format.
    pub fmt_standard: SpecCellFormat,
    /// Title row format.
    pub fmt_title: SpecCellFormat,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
}

impl Default for SpecXlsxRecordsWriteOptions {
    fn default() -> Self {
        let (fmt_standard, fmt_title) = derive_default_formats();
        Self {
            sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
            columns: derive_default_columns(),
            fmt_standard,
            fmt_title,
            policy_autofit: SpecAutofitCellsPolicy::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportAndErrors

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecXlsxReport {
    /// Worksheet name actually used.
    pub sheet_name: String,
    /// Rows written, including title and header.
    pub n_rows: usize,
    /// Columns written.
    pub n_cols: usize,
    /// Persisted column widths.
    pub col_widths: Vec<f64>,
}

impl fmt::Display for SpecXlsxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_widths = self
            .col_widths
            .iter()
            .map(|n_width| format!("{n_width:.1}"))
            .collect::<Vec<_>>()
            .join(",");
        write!(
            f,
            "[XLSX] sheet={:?} rows={} cols={} widths=[{c_widths}]",
            self.sheet_name, self.n_rows, self.n_cols
        )
    }
}

/// "Top-level call failed" errors, one per write phase.
#[derive(Debug, thiserror::Error)]
pub enum XlsxRecordsError {
    /// Write options rejected before any row is built.
    #[error("invalid write options: {reason}")]
    InvalidOptions {
        /// Validation message.
        reason: String,
    },
    /// Worksheet could not be created, named, or filled.
    #[error("failed to create sheet: {reason}")]
    SheetCreation {
        /// Underlying error text.
        reason: String,
    },
    /// Tag list could not be rendered to text.
    #[error("failed to marshal tags for record {row}: {reason}")]
    TagSerialization {
        /// Zero-based record index.
        row: usize,
        /// Underlying error text.
        reason: String,
    },
    /// Column width could not be computed or applied.
    #[error("failed to set column width for column {col}: {reason}")]
    ColumnWidth {
        /// Zero-based column index.
        col: usize,
        /// Underlying error text.
        reason: String,
    },
    /// Workbook could not be written to disk.
    #[error("failed to save Excel file {}: {reason}", .path.display())]
    FileSave {
        /// Output path.
        path: PathBuf,
        /// Underlying error text.
        reason: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_deserialize_defaults_missing_tags() {
        let record: SpecRecord = serde_json::from_str(
            r#"{"name": "n", "description": "d", "note": "x"}"#,
        )
        .unwrap();
        assert_eq!(record, SpecRecord::new("n", "d", Vec::<String>::new(), "x"));
    }

    #[test]
    fn test_cell_format_merge_prefers_right_side() {
        let base = SpecCellFormat {
            align: Some("left".to_string()),
            text_wrap: Some(true),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            align: Some("center".to_string()),
            ..Default::default()
        });
        assert_eq!(merged.align.as_deref(), Some("center"));
        assert_eq!(merged.text_wrap, Some(true));
    }

    #[test]
    fn test_error_messages_name_phase() {
        let err = XlsxRecordsError::ColumnWidth {
            col: 2,
            reason: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to set column width for column 2: boom"
        );

        let err = XlsxRecordsError::FileSave {
            path: PathBuf::from("out.xlsx"),
            reason: "disk full".to_string(),
        };
        assert_eq!(err.to_string(), "failed to save Excel file out.xlsx: disk full");
    }

    #[test]
    fn test_report_display() {
        let report = SpecXlsxReport {
            sheet_name: "Sheet1".to_string(),
            n_rows: 6,
            n_cols: 2,
            col_widths: vec![10.0, 24.0],
        };
        assert_eq!(
            report.to_string(),
            "[XLSX] sheet=\"Sheet1\" rows=6 cols=2 widths=[10.0,24.0]"
        );
    }
}
