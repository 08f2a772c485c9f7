//! Stateless helper utilities used by the sheet builder and writer kernel.

use std::collections::BTreeMap;

use unicode_width::UnicodeWidthStr;

use crate::conf::{
    C_FORMULA_TRIGGER_PREFIX, C_LITERAL_TEXT_MARKER, C_SHEET_NAME_DEFAULT,
    N_LEN_EXCEL_SHEET_NAME_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{SpecAutofitCellsPolicy, SpecSheetHorizontalMerge};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Prefix values starting with `-` with the literal-text marker.
pub fn sanitize_cell_value(value: &str) -> String {
    if value.starts_with(C_FORMULA_TRIGGER_PREFIX) {
        let mut c_value = String::with_capacity(value.len() + 1);
        c_value.push(C_LITERAL_TEXT_MARKER);
        c_value.push_str(value);
        return c_value;
    }
    value.to_string()
}

/// Inverse of [`sanitize_cell_value`].
///
/// Only a marker directly followed by `-` is removed; other apostrophes are content.
pub fn strip_literal_marker(value: &str) -> &str {
    match value.strip_prefix(C_LITERAL_TEXT_MARKER) {
        Some(rest) if rest.starts_with(C_FORMULA_TRIGGER_PREFIX) => rest,
        _ => value,
    }
}

/// Render a tag list into cell text.
///
/// Zero tags give an empty string and one tag is kept verbatim; longer lists
/// become a block-style YAML sequence with surrounding whitespace trimmed.
pub fn render_tags(tags: &[String]) -> Result<String, String> {
    match tags {
        [] => Ok(String::new()),
        [tag] => Ok(tag.clone()),
        _ => serde_saphyr::to_string(&tags)
            .map(|c_yaml| c_yaml.trim().to_string())
            .map_err(|err| err.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WidthEstimation

/// Display width of the widest line, counting wide glyphs as 2 units.
pub fn calculate_display_width(content: &str) -> f64 {
    content
        .lines()
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0) as f64
}

/// Validate autofit bounds before any width is derived from them.
pub fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), String> {
    let SpecAutofitCellsPolicy {
        width_cell_min,
        width_cell_max,
        width_cell_scale,
    } = *policy_autofit;

    if !(width_cell_min.is_finite() && width_cell_max.is_finite() && width_cell_scale.is_finite())
    {
        return Err("policy_autofit values must be finite.".to_string());
    }
    if width_cell_min <= 0.0 {
        return Err("policy_autofit.width_cell_min must be > 0.".to_string());
    }
    if width_cell_max < width_cell_min {
        return Err(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        );
    }
    if width_cell_scale <= 0.0 {
        return Err("policy_autofit.width_cell_scale must be > 0.".to_string());
    }
    Ok(())
}

/// Persisted width for one column: `min(max, max(min, measured * scale))`.
pub fn calculate_column_width(width_measured: f64, policy_autofit: &SpecAutofitCellsPolicy) -> f64 {
    f64::min(
        policy_autofit.width_cell_max,
        f64::max(
            policy_autofit.width_cell_min,
            width_measured * policy_autofit.width_cell_scale,
        ),
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_DEFAULT.to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TitleMergeUtils

/// Plan horizontal merges for repeated non-empty text per row.
pub fn plan_horizontal_merges(
    header_grid: &[Vec<String>],
) -> BTreeMap<usize, Vec<SpecSheetHorizontalMerge>> {
    let mut dict_horizontal_merges_map = BTreeMap::new();

    for (row_idx, v_str_current_row) in header_grid.iter().enumerate() {
        let n_cols = v_str_current_row.len();
        let mut n_col_idx = 0;

        while n_col_idx < n_cols {
            let c_cell_val = &v_str_current_row[n_col_idx];
            if c_cell_val.is_empty() {
                n_col_idx += 1;
                continue;
            }

            let mut n_col_idx_end = n_col_idx + 1;
            while n_col_idx_end < n_cols && v_str_current_row[n_col_idx_end] == *c_cell_val {
                n_col_idx_end += 1;
            }

            if n_col_idx_end - n_col_idx > 1 {
                dict_horizontal_merges_map
                    .entry(row_idx)
                    .or_insert_with(Vec::new)
                    .push(SpecSheetHorizontalMerge {
                        row_idx_start: row_idx,
                        col_idx_start: n_col_idx,
                        col_idx_end: n_col_idx_end - 1,
                        text: c_cell_val.clone(),
                    });
            }
            n_col_idx = n_col_idx_end;
        }
    }

    dict_horizontal_merges_map
}

/// Build lookup set for cells covered by a horizontal merge (excluding anchor).
pub fn derive_horizontal_merge_tracker(
    merges: &[SpecSheetHorizontalMerge],
) -> BTreeMap<(usize, usize), bool> {
    let mut dict_merged_cells_tracker = BTreeMap::new();

    for merge in merges {
        for col_idx in (merge.col_idx_start + 1)..=merge.col_idx_end {
            dict_merged_cells_tracker.insert((merge.row_idx_start, col_idx), true);
        }
    }

    dict_merged_cells_tracker
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
