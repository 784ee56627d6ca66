//! Aggregation library shared by every report section and export.
//!
//! All operations are pure: they read a [`Dataset`] and return new rows or a
//! new dataset. Column presence is checked once per call and reported as a
//! [`SchemaError`].

use crate::error::SchemaError;
use crate::types::{cell_at, AggregateRow, Dataset};
use crate::util::compare_keys;
use std::collections::{HashMap, HashSet};

/// One output column of [`summarize_by_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure<'a> {
    /// Sum of a numeric column, nulls counting as 0.
    Sum(&'a str),
    /// Number of rows in the group.
    Count,
}

enum Resolved {
    Sum(usize),
    Count,
}

/// Group rows by the distinct values of `group_col` and compute `measures`
/// for each group. Groups appear in first-seen order.
pub fn summarize_by_group(
    dataset: &Dataset,
    group_col: &str,
    measures: &[Measure<'_>],
) -> Result<Vec<AggregateRow>, SchemaError> {
    let group_idx = dataset.require_column(group_col)?;
    let resolved = measures
        .iter()
        .map(|m| match m {
            Measure::Sum(col) => dataset.require_numeric(col).map(Resolved::Sum),
            Measure::Count => Ok(Resolved::Count),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut order: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<AggregateRow> = Vec::new();
    for record in dataset.rows() {
        let key = cell_at(record, group_idx).key();
        let slot = match order.get(&*key) {
            Some(&i) => i,
            None => {
                order.insert(key.to_string(), rows.len());
                rows.push(AggregateRow { key: key.into_owned(), values: vec![0.0; resolved.len()] });
                rows.len() - 1
            }
        };
        let acc = &mut rows[slot].values;
        for (value, m) in acc.iter_mut().zip(&resolved) {
            match m {
                Resolved::Sum(idx) => *value += cell_at(record, *idx).as_f64().unwrap_or(0.0),
                Resolved::Count => *value += 1.0,
            }
        }
    }
    Ok(rows)
}

/// Sum `measure_col` per distinct value of `group_col`.
pub fn sum_by_group(
    dataset: &Dataset,
    group_col: &str,
    measure_col: &str,
) -> Result<Vec<AggregateRow>, SchemaError> {
    summarize_by_group(dataset, group_col, &[Measure::Sum(measure_col)])
}

/// Row count per distinct value of `group_col`.
pub fn count_by_group(dataset: &Dataset, group_col: &str) -> Result<Vec<AggregateRow>, SchemaError> {
    summarize_by_group(dataset, group_col, &[Measure::Count])
}

/// Sort descending by measure `by` and keep the first `n` rows.
///
/// The sort is stable, so ties keep their incoming order.
pub fn top_n(mut rows: Vec<AggregateRow>, n: usize, by: usize) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| b.value(by).total_cmp(&a.value(by)));
    rows.truncate(n);
    rows
}

/// Sort ascending by group key, numerically where keys are numbers.
pub fn sort_by_key(mut rows: Vec<AggregateRow>) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| compare_keys(&a.key, &b.key));
    rows
}

/// `value` as a percentage of `total`; a zero total yields `0.0`.
pub fn percentage(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / total * 100.0
    }
}

/// Sum of a numeric column, nulls counting as 0.
pub fn total(dataset: &Dataset, measure_col: &str) -> Result<f64, SchemaError> {
    let idx = dataset.require_numeric(measure_col)?;
    Ok(dataset.column_cells(idx).filter_map(|c| c.as_f64()).sum())
}

/// Number of distinct values in `column`.
pub fn distinct_count(dataset: &Dataset, column: &str) -> Result<usize, SchemaError> {
    let idx = dataset.require_column(column)?;
    let seen: HashSet<_> = dataset.column_cells(idx).map(|c| c.key()).collect();
    Ok(seen.len())
}

/// Drop rows whose `column` value, lower-cased, is in `excluded`.
///
/// `excluded` must already be lower-case. Matching ignores case regardless
/// of how the loader left the values.
pub fn exclude_categories(
    dataset: &Dataset,
    column: &str,
    excluded: &[&str],
) -> Result<Dataset, SchemaError> {
    select_rows(dataset, column, |v| !excluded.contains(&v.to_lowercase().as_str()))
}

/// Keep rows whose `column` value, lower-cased, is in `included` (lower-case).
pub fn retain_categories_ci(
    dataset: &Dataset,
    column: &str,
    included: &[&str],
) -> Result<Dataset, SchemaError> {
    select_rows(dataset, column, |v| included.contains(&v.to_lowercase().as_str()))
}

/// Keep rows whose `column` value is exactly one of `included`.
pub fn retain_categories(
    dataset: &Dataset,
    column: &str,
    included: &[&str],
) -> Result<Dataset, SchemaError> {
    select_rows(dataset, column, |v| included.contains(&v))
}

fn select_rows(
    dataset: &Dataset,
    column: &str,
    keep: impl Fn(&str) -> bool,
) -> Result<Dataset, SchemaError> {
    let idx = dataset.require_column(column)?;
    let rows = dataset
        .rows()
        .iter()
        .filter(|r| keep(&cell_at(r, idx).key()))
        .cloned()
        .collect();
    Ok(dataset.with_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::types::{Cell, Column, ColumnKind, Schema};
    use pretty_assertions::assert_eq;

    fn dataset(rows: &[(&str, Option<f64>)]) -> Dataset {
        let schema = Schema::new(vec![
            Column { name: config::ETHNICITY.into(), kind: ColumnKind::Text },
            Column { name: config::PEOPLE_PER_OCCURRENCE.into(), kind: ColumnKind::Numeric },
        ]);
        let rows = rows
            .iter()
            .map(|(e, n)| vec![Cell::Text(e.to_string()), n.map(Cell::Number).unwrap_or(Cell::Null)])
            .collect();
        Dataset::new("subjects", schema, rows)
    }

    fn column_sum(rows: &[AggregateRow], measure: usize) -> f64 {
        rows.iter().map(|r| r.value(measure)).sum()
    }

    fn row(key: &str, value: f64) -> AggregateRow {
        AggregateRow { key: key.into(), values: vec![value] }
    }

    #[test]
    fn sums_treat_null_as_zero_and_keep_first_seen_order() {
        let ds = dataset(&[("Wayuu", Some(3.0)), ("Nasa", None), ("Wayuu", Some(1.5)), ("Nasa", Some(2.0))]);
        let rows = sum_by_group(&ds, config::ETHNICITY, config::PEOPLE_PER_OCCURRENCE).unwrap();
        assert_eq!(rows, vec![row("Wayuu", 4.5), row("Nasa", 2.0)]);
        assert_eq!(column_sum(&rows, 0), total(&ds, config::PEOPLE_PER_OCCURRENCE).unwrap());
    }

    #[test]
    fn counts_every_row() {
        let ds = dataset(&[("Wayuu", None), ("Nasa", None), ("Wayuu", None)]);
        let rows = count_by_group(&ds, config::ETHNICITY).unwrap();
        assert_eq!(rows, vec![row("Wayuu", 2.0), row("Nasa", 1.0)]);
    }

    #[test]
    fn missing_measure_is_a_schema_error() {
        let ds = dataset(&[("Wayuu", Some(1.0))]);
        let err = sum_by_group(&ds, config::YEAR, config::EVENTS).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn { dataset: "subjects".into(), column: config::YEAR.into() }
        );
        let err = sum_by_group(&ds, config::ETHNICITY, config::EVENTS).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn { column, .. } if column == config::EVENTS));
    }

    #[test]
    fn summing_a_text_column_is_rejected() {
        let ds = dataset(&[("Wayuu", Some(1.0))]);
        let err = sum_by_group(&ds, config::ETHNICITY, config::ETHNICITY).unwrap_err();
        assert!(matches!(err, SchemaError::NotNumeric { .. }));
    }

    #[test]
    fn top_n_is_stable_and_tolerates_large_n() {
        let rows = vec![row("a", 1.0), row("b", 5.0), row("c", 1.0), row("d", 3.0)];
        let top = top_n(rows.clone(), 2, 0);
        assert_eq!(top, vec![row("b", 5.0), row("d", 3.0)]);
        let all = top_n(rows, 10, 0);
        assert_eq!(all, vec![row("b", 5.0), row("d", 3.0), row("a", 1.0), row("c", 1.0)]);
    }

    #[test]
    fn keys_sort_as_years() {
        let rows = vec![row("2010", 1.0), row("985", 1.0), row("2009", 1.0)];
        let keys: Vec<_> = sort_by_key(rows).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["985", "2009", "2010"]);
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage(0.0, 0.0), 0.0);
        assert_eq!(percentage(7.0, 0.0), 0.0);
        assert_eq!(percentage(25.0, 200.0), 12.5);
    }

    #[test]
    fn exclusion_ignores_case() {
        let ds = dataset(&[("NINGUNA", Some(1.0)), ("Wayuu", Some(2.0)), ("No Informa", Some(3.0))]);
        let out = exclude_categories(&ds, config::ETHNICITY, &["ninguna", "no informa"]).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows()[0][0], Cell::Text("Wayuu".into()));
        assert_eq!(ds.len(), 3);
    }

    #[test]
    fn retention_is_exact_unless_asked_otherwise() {
        let ds = dataset(&[("Ninguna", Some(1.0)), ("NINGUNA", Some(2.0))]);
        assert_eq!(retain_categories(&ds, config::ETHNICITY, &["Ninguna"]).unwrap().len(), 1);
        assert_eq!(retain_categories_ci(&ds, config::ETHNICITY, &["ninguna"]).unwrap().len(), 2);
    }

    #[test]
    fn distinct_count_counts_keys() {
        let ds = dataset(&[("Wayuu", None), ("Nasa", None), ("Wayuu", None)]);
        assert_eq!(distinct_count(&ds, config::ETHNICITY).unwrap(), 2);
    }
}
