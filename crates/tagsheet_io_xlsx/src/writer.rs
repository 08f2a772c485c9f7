//! XLSX writer kernel that renders a sheet model into workbook output.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

use crate::builder::build_sheet_model;
use crate::conf::EnumFmtKey;
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecRecord, SpecSheetModel, SpecXlsxRecordsWriteOptions,
    SpecXlsxReport, XlsxRecordsError,
};
use crate::util::derive_horizontal_merge_tracker;

/// Build, render, and save `records` as a single-sheet workbook at `path_file_out`.
///
/// The first failing phase aborts the call; whatever the serializer left on
/// disk is not cleaned up.
pub fn write_records_to_xlsx(
    records: &[SpecRecord],
    path_file_out: impl AsRef<Path>,
    options: &SpecXlsxRecordsWriteOptions,
) -> Result<SpecXlsxReport, XlsxRecordsError> {
    let model = build_sheet_model(records, options)?;

    let mut writer = XlsxWriter::new(
        path_file_out.as_ref().to_path_buf(),
        options.fmt_standard.clone(),
        options.fmt_title.clone(),
    );
    let report = writer.write_sheet(&model)?;
    writer.close()?;
    Ok(report)
}

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_standard: SpecCellFormat,
    fmt_title: SpecCellFormat,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and format presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(
        path_file_out: PathBuf,
        fmt_standard: SpecCellFormat,
        fmt_title: SpecCellFormat,
    ) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmt_standard,
            fmt_title,
            if_closed: false,
        }
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), XlsxRecordsError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(|err| XlsxRecordsError::FileSave {
                path: self.path_file_out.clone(),
                reason: err.to_string(),
            })?;
        self.if_closed = true;
        log::info!("Saved workbook to {}", self.path_file_out.display());
        Ok(())
    }

    /// Render one sheet model: cells, merges, then column widths.
    pub fn write_sheet(
        &mut self,
        model: &SpecSheetModel,
    ) -> Result<SpecXlsxReport, XlsxRecordsError> {
        if self.if_closed {
            return Err(derive_sheet_creation_error("Cannot write after close()."));
        }

        let fmt_standard = derive_rust_xlsx_format(&self.fmt_standard);
        let fmt_title = derive_rust_xlsx_format(&self.fmt_title);
        let select_format = |style: EnumFmtKey| match style {
            EnumFmtKey::Standard => &fmt_standard,
            EnumFmtKey::Title => &fmt_title,
        };

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&model.sheet_name)
            .map_err(derive_sheet_creation_error)?;

        let dict_horizontal_merge_tracker = derive_horizontal_merge_tracker(&model.merges);
        let set_merge_anchors: BTreeSet<(usize, usize)> = model
            .merges
            .iter()
            .map(|merge| (merge.row_idx_start, merge.col_idx_start))
            .collect();

        for (row_idx, row_cells) in model.rows.iter().enumerate() {
            for (col_idx, cell) in row_cells.iter().enumerate() {
                if set_merge_anchors.contains(&(row_idx, col_idx))
                    || dict_horizontal_merge_tracker
                        .get(&(row_idx, col_idx))
                        .copied()
                        .unwrap_or(false)
                {
                    continue;
                }
                write_cell_with_format(
                    worksheet,
                    row_idx,
                    col_idx,
                    &cell.value,
                    select_format(cell.style),
                )?;
            }
        }

        for merge in &model.merges {
            let style = model
                .rows
                .get(merge.row_idx_start)
                .and_then(|row| row.get(merge.col_idx_start))
                .map_or(EnumFmtKey::Title, |cell| cell.style);
            worksheet
                .merge_range(
                    cast_row_num(merge.row_idx_start)?,
                    cast_col_num(merge.col_idx_start)?,
                    cast_row_num(merge.row_idx_start)?,
                    cast_col_num(merge.col_idx_end)?,
                    &merge.text,
                    select_format(style),
                )
                .map_err(derive_sheet_creation_error)?;
        }

        for (col_idx, n_width) in model.col_widths.iter().enumerate() {
            apply_column_width(worksheet, col_idx, *n_width)?;
        }

        log::debug!(
            "Rendered sheet {:?}: {} rows, {} merges",
            model.sheet_name,
            model.height(),
            model.merges.len()
        );

        Ok(SpecXlsxReport {
            sheet_name: model.sheet_name.clone(),
            n_rows: model.height(),
            n_cols: model.width(),
            col_widths: model.col_widths.clone(),
        })
    }
}

fn apply_column_width(
    worksheet: &mut Worksheet,
    col_idx: usize,
    width: f64,
) -> Result<(), XlsxRecordsError> {
    let n_col = u16::try_from(col_idx).map_err(|_| XlsxRecordsError::ColumnWidth {
        col: col_idx,
        reason: format!("column index overflow: {col_idx}"),
    })?;
    worksheet
        .set_column_width(n_col, width)
        .map_err(|err| XlsxRecordsError::ColumnWidth {
            col: col_idx,
            reason: err.to_string(),
        })?;
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxRecordsError> {
    match value {
        EnumCellValue::None => {
            worksheet
                .write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)
                .map_err(derive_sheet_creation_error)?;
        }
        EnumCellValue::String(val) => {
            worksheet
                .write_string_with_format(
                    cast_row_num(row_idx)?,
                    cast_col_num(col_idx)?,
                    val,
                    format,
                )
                .map_err(derive_sheet_creation_error)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if let Some(align) = spec.align.as_deref().and_then(derive_format_align) {
        format = format.set_align(align);
    }
    if let Some(align) = spec.valign.as_deref().and_then(derive_format_align) {
        format = format.set_align(align);
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "fill" => Some(FormatAlign::Fill),
        "justify" => Some(FormatAlign::Justify),
        "center_across" => Some(FormatAlign::CenterAcross),
        "distributed" => Some(FormatAlign::Distributed),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        "vjustify" | "vertical_justify" => Some(FormatAlign::VerticalJustify),
        "vdistributed" | "vertical_distributed" => Some(FormatAlign::VerticalDistributed),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxRecordsError> {
    u32::try_from(value)
        .map_err(|_| derive_sheet_creation_error(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxRecordsError> {
    u16::try_from(value)
        .map_err(|_| derive_sheet_creation_error(format!("column index overflow: {value}")))
}

fn derive_sheet_creation_error(err: impl Display) -> XlsxRecordsError {
    XlsxRecordsError::SheetCreation {
        reason: format!("xlsx write error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_format_align_accepts_aliases() {
        assert_eq!(derive_format_align(" Center "), Some(FormatAlign::Center));
        assert_eq!(
            derive_format_align("vcenter"),
            Some(FormatAlign::VerticalCenter)
        );
        assert_eq!(
            derive_format_align("vertical_center"),
            Some(FormatAlign::VerticalCenter)
        );
        assert_eq!(derive_format_align("diagonal"), None);
    }

    #[test]
    fn test_write_after_close_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWriter::new(
            dir.path().join("closed.xlsx"),
            SpecCellFormat::default(),
            SpecCellFormat::default(),
        );
        let model = SpecSheetModel {
            sheet_name: "Sheet1".to_string(),
            rows: vec![],
            merges: vec![],
            col_widths: vec![10.0],
        };
        writer.write_sheet(&model).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(dir.path().join("closed.xlsx").is_file());

        let err = writer.write_sheet(&model).unwrap_err();
        assert!(matches!(err, XlsxRecordsError::SheetCreation { .. }));
    }

    #[test]
    fn test_invalid_sheet_name_is_sheet_creation_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWriter::new(
            dir.path().join("bad.xlsx"),
            SpecCellFormat::default(),
            SpecCellFormat::default(),
        );
        let model = SpecSheetModel {
            sheet_name: "bad[name]".to_string(),
            rows: vec![],
            merges: vec![],
            col_widths: vec![],
        };
        let err = writer.write_sheet(&model).unwrap_err();
        assert!(matches!(err, XlsxRecordsError::SheetCreation { .. }));
    }

    #[test]
    fn test_out_of_range_column_width_is_column_width_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = XlsxWriter::new(
            dir.path().join("wide.xlsx"),
            SpecCellFormat::default(),
            SpecCellFormat::default(),
        );
        let model = SpecSheetModel {
            sheet_name: "Sheet1".to_string(),
            rows: vec![],
            merges: vec![],
            col_widths: vec![10.0; 16_385],
        };
        let err = writer.write_sheet(&model).unwrap_err();
        assert!(matches!(
            err,
            XlsxRecordsError::ColumnWidth { col: 16_384, .. }
        ));
    }
}
