//! Sheet builder: turns records into an in-memory [`SpecSheetModel`].
//!
//! Rows are appended in one forward pass: title, header, then one row per
//! record. The column width accumulator is owned by [`build_sheet_model`] and
//! lent to each phase as `&mut [f64]`; its index always equals the column index
//! of the cell being added.

use crate::conf::EnumFmtKey;
use crate::spec::{
    SpecCell, SpecRecord, SpecSheetHorizontalMerge, SpecSheetModel, SpecXlsxRecordsWriteOptions,
    XlsxRecordsError,
};
use crate::util::{
    calculate_column_width, calculate_display_width, plan_horizontal_merges, render_tags,
    sanitize_cell_value, sanitize_sheet_name, validate_policy_autofit,
};

/// Column positions of record fields in the default layout.
const N_COL_IDX_NAME: usize = 0;
const N_COL_IDX_DESCRIPTION: usize = 1;
const N_COL_IDX_TAGS: usize = 2;
const N_COL_IDX_NOTE: usize = 3;
/// Number of record fields written per data row.
pub const N_NCOLS_RECORD: usize = 4;

/// Build the full sheet model for `records`.
///
/// Fails on invalid options or a tag serialization error. Nothing is written
/// to disk here.
pub fn build_sheet_model(
    records: &[SpecRecord],
    options: &SpecXlsxRecordsWriteOptions,
) -> Result<SpecSheetModel, XlsxRecordsError> {
    validate_write_options(options)?;

    let n_width = options.columns.len();
    let mut builder = SheetBuilder::new(sanitize_sheet_name(&options.sheet_name, "_"));
    let mut l_width_by_col = vec![0.0f64; n_width];

    builder.write_title_row(options);
    builder.write_header_row(options, &mut l_width_by_col);
    builder.write_data_rows(records, &mut l_width_by_col)?;
    let l_col_widths = finalize_column_widths(&l_width_by_col, options);

    log::debug!(
        "Built sheet model {:?}: {} rows x {} cols",
        builder.sheet_name,
        builder.rows.len(),
        n_width
    );

    Ok(SpecSheetModel {
        sheet_name: builder.sheet_name,
        rows: builder.rows,
        merges: builder.merges,
        col_widths: l_col_widths,
    })
}

fn validate_write_options(options: &SpecXlsxRecordsWriteOptions) -> Result<(), XlsxRecordsError> {
    if options.columns.len() != N_NCOLS_RECORD {
        return Err(XlsxRecordsError::InvalidOptions {
            reason: format!(
                "columns must have exactly {N_NCOLS_RECORD} entries (got {}).",
                options.columns.len()
            ),
        });
    }
    validate_policy_autofit(&options.policy_autofit)
        .map_err(|reason| XlsxRecordsError::InvalidOptions { reason })
}

struct SheetBuilder {
    sheet_name: String,
    rows: Vec<Vec<SpecCell>>,
    merges: Vec<SpecSheetHorizontalMerge>,
}

impl SheetBuilder {
    fn new(sheet_name: String) -> Self {
        Self {
            sheet_name,
            rows: Vec::new(),
            merges: Vec::new(),
        }
    }

    /// Merged title row; columns outside any merge group stay blank.
    fn write_title_row(&mut self, options: &SpecXlsxRecordsWriteOptions) {
        let n_row_idx = self.rows.len();
        let l_titles: Vec<String> = options.columns.iter().map(|c| c.title.clone()).collect();

        let l_merges: Vec<SpecSheetHorizontalMerge> = plan_horizontal_merges(&[l_titles])
            .remove(&0)
            .unwrap_or_default()
            .into_iter()
            .map(|merge| SpecSheetHorizontalMerge {
                row_idx_start: n_row_idx,
                ..merge
            })
            .collect();

        let row = (0..options.columns.len())
            .map(|n_col_idx| {
                match l_merges.iter().find(|m| m.col_idx_start == n_col_idx) {
                    Some(merge) => SpecCell::text(merge.text.clone(), EnumFmtKey::Title),
                    None => SpecCell::blank(EnumFmtKey::Title),
                }
            })
            .collect();

        self.rows.push(row);
        self.merges.extend(l_merges);
    }

    fn write_header_row(
        &mut self,
        options: &SpecXlsxRecordsWriteOptions,
        width_by_col: &mut [f64],
    ) {
        let mut row = Vec::with_capacity(options.columns.len());
        for (n_col_idx, column) in options.columns.iter().enumerate() {
            add_cell(&mut row, &column.header, width_by_col, n_col_idx);
        }
        self.rows.push(row);
    }

    fn write_data_rows(
        &mut self,
        records: &[SpecRecord],
        width_by_col: &mut [f64],
    ) -> Result<(), XlsxRecordsError> {
        for (n_record_idx, record) in records.iter().enumerate() {
            let c_tags = render_tags(&record.tags).map_err(|reason| {
                XlsxRecordsError::TagSerialization {
                    row: n_record_idx,
                    reason,
                }
            })?;

            let mut row = Vec::with_capacity(N_NCOLS_RECORD);
            add_cell(&mut row, &record.name, width_by_col, N_COL_IDX_NAME);
            add_cell(
                &mut row,
                &record.description,
                width_by_col,
                N_COL_IDX_DESCRIPTION,
            );
            add_cell(&mut row, &c_tags, width_by_col, N_COL_IDX_TAGS);
            add_cell(&mut row, &record.note, width_by_col, N_COL_IDX_NOTE);
            self.rows.push(row);
        }
        Ok(())
    }
}

/// Append one sanitized, standard-styled cell and fold its width into the accumulator.
///
/// Width is measured on `value_raw`, so the literal-text marker never counts.
fn add_cell(row: &mut Vec<SpecCell>, value_raw: &str, width_by_col: &mut [f64], col_idx: usize) {
    row.push(SpecCell::text(
        sanitize_cell_value(value_raw),
        EnumFmtKey::Standard,
    ));
    width_by_col[col_idx] = f64::max(width_by_col[col_idx], calculate_display_width(value_raw));
}

fn finalize_column_widths(
    width_by_col: &[f64],
    options: &SpecXlsxRecordsWriteOptions,
) -> Vec<f64> {
    width_by_col
        .iter()
        .map(|n_width_measured| calculate_column_width(*n_width_measured, &options.policy_autofit))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::conf::derive_sample_records;
    use crate::spec::{EnumCellValue, SpecAutofitCellsPolicy, SpecColumnDefinition};

    fn cell_text(cell: &SpecCell) -> &str {
        match &cell.value {
            EnumCellValue::String(val) => val,
            EnumCellValue::None => "",
        }
    }

    fn build_default(records: &[SpecRecord]) -> SpecSheetModel {
        build_sheet_model(records, &SpecXlsxRecordsWriteOptions::default()).unwrap()
    }

    #[test]
    fn test_sample_records_layout() {
        let model = build_default(&derive_sample_records());

        assert_eq!(model.sheet_name, "Sheet1");
        assert_eq!(model.height(), 6);
        assert_eq!(model.width(), 4);
        assert!(model.rows.iter().all(|row| row.len() == 4));
    }

    #[test]
    fn test_title_row_merges_two_groups() {
        let model = build_default(&derive_sample_records());

        let l_spans: Vec<(usize, usize, usize)> = model
            .merges
            .iter()
            .map(|m| (m.row_idx_start, m.col_idx_start, m.col_idx_end))
            .collect();
        assert_eq!(l_spans, vec![(0, 0, 1), (0, 2, 3)]);

        let l_title: Vec<&str> = model.rows[0].iter().map(cell_text).collect();
        assert_eq!(l_title, vec!["Name, Description", "", "Tags, Note", ""]);
        assert!(model.rows[0].iter().all(|c| c.style == EnumFmtKey::Title));
    }

    #[test]
    fn test_title_row_blanks_unmerged_columns() {
        let options = SpecXlsxRecordsWriteOptions {
            columns: vec![
                SpecColumnDefinition::new("Name", "Solo"),
                SpecColumnDefinition::new("Description", "Pair"),
                SpecColumnDefinition::new("Tags", "Pair"),
                SpecColumnDefinition::new("Note", "Other"),
            ],
            ..Default::default()
        };
        let model = build_sheet_model(&[], &options).unwrap();

        assert_eq!(model.merges.len(), 1);
        assert_eq!((model.merges[0].col_idx_start, model.merges[0].col_idx_end), (1, 2));
        let l_title: Vec<&str> = model.rows[0].iter().map(cell_text).collect();
        assert_eq!(l_title, vec!["", "Pair", "", ""]);
    }

    #[test]
    fn test_header_and_data_rows_are_sanitized() {
        let model = build_default(&derive_sample_records());

        let l_header: Vec<&str> = model.rows[1].iter().map(cell_text).collect();
        assert_eq!(l_header, vec!["Name", "Description", "Tags", "Note"]);
        assert!(model.rows[1].iter().all(|c| c.style == EnumFmtKey::Standard));

        let row_first = &model.rows[2];
        assert_eq!(cell_text(&row_first[0]), "'-Name1");
        assert_eq!(cell_text(&row_first[1]), "First line\nSecond line");
        assert!(cell_text(&row_first[2]).starts_with("'-"));
        assert_eq!(cell_text(&row_first[3]), "'-Note1");

        assert_eq!(cell_text(&model.rows[3][0]), "NormalName");
        assert_eq!(cell_text(&model.rows[4][0]), "'-Name3");
        assert_eq!(cell_text(&model.rows[5][2]), "");
    }

    #[test]
    fn test_single_tag_is_verbatim() {
        let records = vec![SpecRecord::new("n", "d", ["solo"], "x")];
        let model = build_default(&records);
        assert_eq!(cell_text(&model.rows[2][2]), "solo");
    }

    #[test]
    fn test_column_widths_follow_content() {
        let records = vec![SpecRecord::new(
            "-abcdefghijklmnopqrs",
            format!("short\n{}", "中".repeat(30)),
            Vec::<String>::new(),
            "n",
        )];
        let model = build_default(&records);

        // 20 chars measured without the marker.
        assert!((model.col_widths[0] - 24.0).abs() < 1e-9);
        // 30 wide glyphs -> 60 units, clamped.
        assert_eq!(model.col_widths[1], 50.0);
        assert_eq!(model.col_widths[2], 10.0);
        assert_eq!(model.col_widths[3], 10.0);
    }

    #[test]
    fn test_build_is_deterministic() {
        let records = derive_sample_records();
        assert_eq!(build_default(&records), build_default(&records));
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let options = SpecXlsxRecordsWriteOptions {
            policy_autofit: SpecAutofitCellsPolicy {
                width_cell_min: 60.0,
                width_cell_max: 50.0,
                width_cell_scale: 1.2,
            },
            ..Default::default()
        };
        let err = build_sheet_model(&derive_sample_records(), &options).unwrap_err();
        assert!(matches!(err, XlsxRecordsError::InvalidOptions { .. }));
    }

    #[test]
    fn test_wrong_column_count_is_rejected() {
        let options = SpecXlsxRecordsWriteOptions {
            columns: vec![SpecColumnDefinition::new("Name", "Name")],
            ..Default::default()
        };
        let err = build_sheet_model(&[], &options).unwrap_err();
        assert!(matches!(err, XlsxRecordsError::InvalidOptions { .. }));
    }
}
