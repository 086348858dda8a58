// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Column, ReportIndex, RowRecord, SortDirection};
use std::sync::Arc;

pub const DEFAULT_COLUMNS: [Column; 6] = Column::ALL;

/// Grid state for one function group: input rows, filter text and the
/// per-column sort toggles. The visible rows are always derived on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGrid {
    columns: Vec<Column>,
    rows: Arc<[RowRecord]>,
    active_function: Option<String>,
    filter_key: String,
    sort_key: Option<Column>,
    sort_orders: Vec<(Column, SortDirection)>,
}

impl Default for ResultGrid {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMNS.to_vec())
    }
}

impl ResultGrid {
    pub fn new(columns: Vec<Column>) -> Self {
        // Every column starts flipped so its first activation sorts ascending.
        let sort_orders = columns
            .iter()
            .map(|column| (*column, SortDirection::Desc))
            .collect();
        Self {
            columns,
            rows: Arc::from(Vec::new()),
            active_function: None,
            filter_key: String::new(),
            sort_key: None,
            sort_orders,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    pub fn set_rows(&mut self, rows: Arc<[RowRecord]>) {
        self.rows = rows;
    }

    /// Switches the grid to `function`'s rows. Unknown names are ignored.
    pub fn activate(&mut self, index: &ReportIndex, function: &str) -> bool {
        let Some(rows) = index.lookup(function) else {
            return false;
        };
        self.rows = Arc::clone(rows);
        self.active_function = Some(function.to_owned());
        true
    }

    pub fn active_function(&self) -> Option<&str> {
        self.active_function.as_deref()
    }

    pub fn filter_key(&self) -> &str {
        &self.filter_key
    }

    pub fn set_filter(&mut self, filter_key: impl Into<String>) {
        self.filter_key = filter_key.into();
    }

    pub fn push_filter_char(&mut self, value: char) {
        self.filter_key.push(value);
    }

    pub fn pop_filter_char(&mut self) -> bool {
        self.filter_key.pop().is_some()
    }

    pub fn clear_filter(&mut self) {
        self.filter_key.clear();
    }

    pub fn sort_key(&self) -> Option<Column> {
        self.sort_key
    }

    pub fn sort_direction(&self, column: Column) -> Option<SortDirection> {
        self.sort_orders
            .iter()
            .find(|(candidate, _)| *candidate == column)
            .map(|(_, direction)| *direction)
    }

    /// The active sort column and the direction rows are currently ordered in.
    pub fn sort_state(&self) -> Option<(Column, SortDirection)> {
        let column = self.sort_key?;
        self.sort_direction(column)
            .map(|direction| (column, direction))
    }

    /// Makes `column` the sort key and flips its remembered direction.
    /// Columns outside the configured set are ignored.
    pub fn sort_by(&mut self, column: Column) -> Option<SortDirection> {
        let entry = self
            .sort_orders
            .iter_mut()
            .find(|(candidate, _)| *candidate == column)?;
        entry.1 = entry.1.flipped();
        self.sort_key = Some(column);
        Some(entry.1)
    }

    pub fn filtered_and_sorted_rows(&self) -> Vec<&RowRecord> {
        let needle = self.filter_key.to_lowercase();
        let mut rows = self
            .rows
            .iter()
            .filter(|row| needle.is_empty() || row.matches_filter(&needle))
            .collect::<Vec<_>>();

        if let Some((column, direction)) = self.sort_state() {
            rows.sort_by(|left, right| {
                direction.apply(left.cell(column).cmp_value(&right.cell(column)))
            });
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::ResultGrid;
    use crate::{Column, RawResultRecord, ReportIndex, RowRecord, SortDirection};
    use proptest::prelude::*;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn row(name: &str) -> RowRecord {
        RowRecord {
            module: "m".to_owned(),
            name: name.to_owned(),
            success: true,
            params: json!([]),
            raises: None,
            result: String::new(),
        }
    }

    fn grid_with(rows: Vec<RowRecord>) -> ResultGrid {
        let mut grid = ResultGrid::default();
        grid.set_rows(Arc::from(rows));
        grid
    }

    fn names(rows: &[&RowRecord]) -> Vec<String> {
        rows.iter().map(|row| row.name.clone()).collect()
    }

    #[test]
    fn sort_by_toggles_between_ascending_and_descending() {
        let mut grid = grid_with(vec![row("b"), row("a")]);

        assert_eq!(grid.sort_by(Column::Name), Some(SortDirection::Asc));
        assert_eq!(names(&grid.filtered_and_sorted_rows()), vec!["a", "b"]);

        assert_eq!(grid.sort_by(Column::Name), Some(SortDirection::Desc));
        assert_eq!(names(&grid.filtered_and_sorted_rows()), vec!["b", "a"]);

        assert_eq!(grid.rows()[0].name, "b");
    }

    #[test]
    fn unsorted_grid_keeps_input_order() {
        let grid = grid_with(vec![row("c"), row("a"), row("b")]);
        assert_eq!(grid.sort_key(), None);
        assert_eq!(names(&grid.filtered_and_sorted_rows()), vec!["c", "a", "b"]);
    }

    #[test]
    fn columns_remember_their_own_direction() {
        let mut grid = ResultGrid::default();
        grid.sort_by(Column::Name);
        grid.sort_by(Column::Name);
        grid.sort_by(Column::Module);

        assert_eq!(grid.sort_key(), Some(Column::Module));
        assert_eq!(grid.sort_direction(Column::Module), Some(SortDirection::Asc));
        assert_eq!(grid.sort_direction(Column::Name), Some(SortDirection::Desc));

        grid.sort_by(Column::Name);
        assert_eq!(grid.sort_state(), Some((Column::Name, SortDirection::Asc)));
    }

    #[test]
    fn sort_on_unconfigured_column_is_ignored() {
        let mut grid = ResultGrid::new(vec![Column::Name]);
        assert_eq!(grid.sort_by(Column::Result), None);
        assert_eq!(grid.sort_key(), None);
    }

    #[test]
    fn filter_matches_any_field_case_insensitively() {
        let mut failing = row("test_divide");
        failing.success = false;
        failing.raises = Some("ZeroDivisionError".to_owned());
        let mut grid = grid_with(vec![row("test_add"), failing]);

        grid.set_filter("zerodiv");
        assert_eq!(names(&grid.filtered_and_sorted_rows()), vec!["test_divide"]);

        grid.set_filter("FALSE");
        assert_eq!(names(&grid.filtered_and_sorted_rows()), vec!["test_divide"]);

        grid.set_filter("TEST_");
        assert_eq!(grid.filtered_and_sorted_rows().len(), 2);

        grid.clear_filter();
        assert_eq!(grid.filtered_and_sorted_rows().len(), 2);
    }

    #[test]
    fn filter_reaches_into_args() {
        let mut with_args = row("t2");
        with_args.params = json!([41, "needle"]);
        let mut grid = grid_with(vec![row("t1"), with_args]);
        grid.set_filter("Needle");
        assert_eq!(names(&grid.filtered_and_sorted_rows()), vec!["t2"]);
    }

    #[test]
    fn missing_raises_is_empty_for_filtering() {
        let mut grid = grid_with(vec![row("t1")]);
        grid.set_filter("null");
        assert!(grid.filtered_and_sorted_rows().is_empty());
    }

    #[test]
    fn filter_editing_helpers() {
        let mut grid = ResultGrid::default();
        grid.push_filter_char('a');
        grid.push_filter_char('b');
        assert_eq!(grid.filter_key(), "ab");
        assert!(grid.pop_filter_char());
        assert_eq!(grid.filter_key(), "a");
        grid.clear_filter();
        assert!(!grid.pop_filter_char());
    }

    #[test]
    fn numeric_args_sort_numerically() {
        let mut ten = row("ten");
        ten.params = json!(10);
        let mut two = row("two");
        two.params = json!(2);
        let mut grid = grid_with(vec![ten, two]);
        grid.sort_by(Column::Args);
        assert_eq!(names(&grid.filtered_and_sorted_rows()), vec!["two", "ten"]);
    }

    #[test]
    fn mixed_type_args_sort_by_type_then_value() {
        let mut rows = Vec::new();
        for index in 0..200 {
            let mut next = row(&format!("t{index}"));
            next.params = match index % 4 {
                0 => json!(index),
                1 => json!(format!("{index}a")),
                2 => json!([index, "x"]),
                _ => json!(null),
            };
            rows.push(next);
        }
        let mut grid = grid_with(rows);

        assert_eq!(grid.sort_by(Column::Args), Some(SortDirection::Asc));
        let sorted = grid.filtered_and_sorted_rows();
        assert_eq!(sorted.len(), 200);
        assert!(sorted[0].params.is_null());
        assert!(sorted[50].params.is_number());
        assert!(sorted[100].params.is_string());
        assert!(sorted[150].params.is_array());
        assert_eq!(sorted[50].params, json!(0));
        assert_eq!(sorted[51].params, json!(4));

        let mut nine = row("nine");
        nine.params = json!(9);
        let mut ten = row("ten");
        ten.params = json!(10);
        let mut text = row("text");
        text.params = json!("1a");
        let mut grid = grid_with(vec![text, ten, nine]);
        grid.sort_by(Column::Args);
        assert_eq!(
            names(&grid.filtered_and_sorted_rows()),
            vec!["nine", "ten", "text"]
        );
    }

    #[test]
    fn activate_switches_rows_and_ignores_unknown_functions() -> anyhow::Result<()> {
        let records: Vec<RawResultRecord> = serde_json::from_value(json!([
            {"name": "t1", "function": "f", "success": "true"},
            {"name": "t2", "function": "g", "success": "true"},
            {"name": "t3", "function": "g", "success": "false"},
        ]))?;
        let index = ReportIndex::build(records);
        let mut grid = ResultGrid::default();

        assert!(grid.activate(&index, "g"));
        assert_eq!(grid.active_function(), Some("g"));
        assert_eq!(grid.rows().len(), 2);

        assert!(!grid.activate(&index, "missing"));
        assert_eq!(grid.active_function(), Some("g"));
        assert_eq!(grid.rows().len(), 2);
        Ok(())
    }

    fn arb_args() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            (0_i64..50).prop_map(Value::from),
            "[0-9a-z]{0,3}".prop_map(Value::from),
            prop::collection::vec(0_i64..50, 0..3).prop_map(Value::from),
            ("[0-9a-z]{0,2}", 0_i64..5).prop_map(|(text, number)| json!([text, number])),
        ]
    }

    fn arb_row() -> impl Strategy<Value = RowRecord> {
        (
            "[a-c]{0,3}",
            "[A-Za-z_]{1,6}",
            any::<bool>(),
            prop::option::of("[A-Za-z]{1,5}"),
            "[a-zA-Z0-9 ]{0,10}",
            arb_args(),
        )
            .prop_map(|(module, name, success, raises, result, params)| RowRecord {
                module,
                name,
                success,
                params,
                raises,
                result,
            })
    }

    proptest! {
        #[test]
        fn filtered_rows_are_exactly_the_matching_subset(
            rows in prop::collection::vec(arb_row(), 0..20),
            filter in "[a-zA-Z_]{1,3}",
        ) {
            let mut grid = grid_with(rows.clone());
            grid.set_filter(filter.clone());
            let needle = filter.to_lowercase();

            let visible = grid.filtered_and_sorted_rows();
            for row in &visible {
                prop_assert!(row.matches_filter(&needle));
            }
            let expected = rows.iter().filter(|row| row.matches_filter(&needle)).count();
            prop_assert_eq!(visible.len(), expected);
        }

        #[test]
        fn sorting_twice_reverses_distinct_values(
            rows in prop::collection::vec(arb_row(), 2..20),
            column_index in 0_usize..6,
        ) {
            let column = Column::ALL[column_index];
            let mut grid = grid_with(rows);

            grid.sort_by(column);
            let first = grid
                .filtered_and_sorted_rows()
                .iter()
                .map(|row| row.cell(column).display())
                .collect::<Vec<_>>();
            grid.sort_by(column);
            let mut second = grid
                .filtered_and_sorted_rows()
                .iter()
                .map(|row| row.cell(column).display())
                .collect::<Vec<_>>();

            let mut first_distinct = first.clone();
            first_distinct.dedup();
            second.dedup();
            second.reverse();
            prop_assert_eq!(first_distinct, second);
        }

        #[test]
        fn derived_view_is_idempotent(
            rows in prop::collection::vec(arb_row(), 0..20),
            filter in "[a-z]{0,2}",
            column_index in 0_usize..6,
        ) {
            let mut grid = grid_with(rows);
            grid.set_filter(filter);
            grid.sort_by(Column::ALL[column_index]);
            let first = grid.filtered_and_sorted_rows();
            let second = grid.filtered_and_sorted_rows();
            prop_assert_eq!(first, second);
        }
    }
}
