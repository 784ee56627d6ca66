//! Filter engine: categorical inclusion filters over a [`Dataset`].
//!
//! Five dimensions are combined with AND. A dimension set to
//! [`Selection::All`], or whose column the dataset lacks, is skipped.

use crate::config;
use crate::types::{cell_at, ColumnRole, Dataset};
use crate::util::compare_keys;
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// What one dimension lets through. An empty `Subset` restricts nothing,
/// the same as `All`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum Selection {
    #[default]
    All,
    Subset(BTreeSet<String>),
}

impl Selection {
    /// Build a selection from widget choices.
    ///
    /// No choices, or any choice equal to the "All" option, mean no
    /// restriction.
    pub fn from_choices<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = choices.into_iter().map(Into::into).collect();
        if values.is_empty() || values.contains(config::ALL_OPTION) {
            Selection::All
        } else {
            Selection::Subset(values)
        }
    }

    pub fn is_all(&self) -> bool {
        match self {
            Selection::All => true,
            Selection::Subset(values) => values.is_empty(),
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Subset(values) => values.is_empty() || values.contains(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    EventType,
    Ethnicity,
    LifeCycle,
    Department,
    Year,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::EventType,
        Dimension::Ethnicity,
        Dimension::LifeCycle,
        Dimension::Department,
        Dimension::Year,
    ];

    pub fn role(self) -> ColumnRole {
        match self {
            Dimension::EventType => ColumnRole::EventType,
            Dimension::Ethnicity => ColumnRole::Ethnicity,
            Dimension::LifeCycle => ColumnRole::LifeCycle,
            Dimension::Department => ColumnRole::Department,
            Dimension::Year => ColumnRole::Year,
        }
    }

    pub fn column(self) -> &'static str {
        self.role().column_name()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::EventType => "Victimizing event",
            Dimension::Ethnicity => "Ethnicity",
            Dimension::LifeCycle => "Life cycle",
            Dimension::Department => "Department",
            Dimension::Year => "Year",
        };
        f.write_str(name)
    }
}

/// The user's current choice on every dimension.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterCriteria {
    pub event_type: Selection,
    pub ethnicity: Selection,
    pub life_cycle: Selection,
    pub department: Selection,
    pub year: Selection,
}

impl FilterCriteria {
    /// No restriction on any dimension.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn get(&self, dim: Dimension) -> &Selection {
        match dim {
            Dimension::EventType => &self.event_type,
            Dimension::Ethnicity => &self.ethnicity,
            Dimension::LifeCycle => &self.life_cycle,
            Dimension::Department => &self.department,
            Dimension::Year => &self.year,
        }
    }

    /// Restricted dimensions with the values they keep, in dimension order.
    pub fn active_dimensions(&self) -> Vec<(Dimension, &BTreeSet<String>)> {
        Dimension::ALL
            .iter()
            .filter_map(|&d| match self.get(d) {
                Selection::Subset(values) if !values.is_empty() => Some((d, values)),
                _ => None,
            })
            .collect()
    }
}

/// Keep the rows that pass every active dimension.
///
/// Never fails: unknown selected values simply match nothing.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
    let active: Vec<(usize, &Selection)> = Dimension::ALL
        .iter()
        .filter_map(|&d| {
            let selection = criteria.get(d);
            if selection.is_all() {
                return None;
            }
            match dataset.schema().position(d.column()) {
                Some(idx) => Some((idx, selection)),
                None => {
                    debug!("{}: no '{}' column, skipping {d} filter", dataset.label(), d.column());
                    None
                }
            }
        })
        .collect();

    if active.is_empty() {
        return dataset.clone();
    }

    let rows = dataset
        .rows()
        .iter()
        .filter(|row| {
            active
                .iter()
                .all(|(idx, selection)| selection.allows(&cell_at(row, *idx).key()))
        })
        .cloned()
        .collect();
    let out = dataset.with_rows(rows);
    debug!("{}: {} of {} rows pass filters", dataset.label(), out.len(), dataset.len());
    out
}

/// Choices for a dimension widget: the "All" option followed by the sorted
/// distinct values of `column`. Only "All" when the column is absent.
pub fn filter_options(dataset: &Dataset, column: &str) -> Vec<String> {
    let mut options = vec![config::ALL_OPTION.to_string()];
    if let Some(idx) = dataset.schema().position(column) {
        let distinct: BTreeSet<String> =
            dataset.column_cells(idx).map(|c| c.key().into_owned()).collect();
        let mut values: Vec<String> = distinct.into_iter().collect();
        values.sort_by(|a, b| compare_keys(a, b));
        options.extend(values);
    }
    options
}
