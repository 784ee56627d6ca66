//! Report assembly.
//!
//! Every section of the on-screen summary and of the exported report is
//! computed here, from the same filtered datasets and through the same
//! aggregation calls, so the two surfaces cannot disagree. Each section
//! degrades on its own: a missing column yields `NoData`, a zero-row subset
//! yields `Empty`, and neither affects the other sections.

use crate::aggregate::{
    count_by_group, distinct_count, exclude_categories, percentage, retain_categories,
    retain_categories_ci, sort_by_key, sum_by_group, summarize_by_group, top_n, total, Measure,
};
use crate::config;
use crate::error::SchemaError;
use crate::filter::{filter, FilterCriteria};
use crate::types::{AggregateRow, Dataset, KpiRow};
use crate::util::{compare_keys, format_count, format_int, parse_f64_safe};
use chrono::{Local, NaiveDateTime};
use log::warn;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum SectionOutcome<T> {
    Ready(T),
    /// A column this view needs is missing.
    NoData(String),
    /// The current filters leave nothing to show.
    Empty(String),
}

impl<T> SectionOutcome<T> {
    fn from_parts(result: Result<Option<T>, SchemaError>, empty: &str) -> Self {
        match result {
            Ok(Some(v)) => SectionOutcome::Ready(v),
            Ok(None) => SectionOutcome::Empty(empty.to_string()),
            Err(e) => {
                warn!("section unavailable: {e}");
                SectionOutcome::NoData(e.to_string())
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            SectionOutcome::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// A grouped table: one key column and one or more measure columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub key_label: String,
    pub measure_labels: Vec<String>,
    pub rows: Vec<AggregateRow>,
    /// Per-row share of the first measure in the full population, in
    /// percent. Empty when the table carries no share column.
    pub shares: Vec<f64>,
}

impl Breakdown {
    fn new(key_label: &str, measure_labels: &[&str], rows: Vec<AggregateRow>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(Self {
            key_label: key_label.to_string(),
            measure_labels: measure_labels.iter().map(|s| s.to_string()).collect(),
            rows,
            shares: Vec::new(),
        })
    }

    /// Attach each row's share of `total`. `total` must cover every row of
    /// the population, not only the rows kept after `top_n`.
    fn with_shares(mut self, total: f64) -> Self {
        self.shares = self.rows.iter().map(|r| percentage(r.value(0), total)).collect();
        self
    }
}

fn with_shares(outcome: SectionOutcome<Breakdown>, total: f64) -> SectionOutcome<Breakdown> {
    match outcome {
        SectionOutcome::Ready(b) => SectionOutcome::Ready(b.with_shares(total)),
        other => other,
    }
}

fn breakdown(
    rows: Result<Vec<AggregateRow>, SchemaError>,
    key_label: &str,
    measure_labels: &[&str],
    empty: &str,
) -> SectionOutcome<Breakdown> {
    SectionOutcome::from_parts(rows.map(|r| Breakdown::new(key_label, measure_labels, r)), empty)
}

const NO_MATCH: &str = "No records match the current filters";

/// Headline figures. Each one is `None` when its column is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_victims: Option<f64>,
    pub total_arrivals: Option<f64>,
    pub total_events: Option<f64>,
    pub departments: Option<usize>,
}

impl Kpis {
    pub fn rows(&self) -> Vec<KpiRow> {
        let shown = |v: Option<f64>| v.map(format_count).unwrap_or_else(|| "N/A".to_string());
        vec![
            KpiRow { indicator: "Total people affected".into(), value: shown(self.total_victims) },
            KpiRow { indicator: "People displaced".into(), value: shown(self.total_arrivals) },
            KpiRow { indicator: "Registered events".into(), value: shown(self.total_events) },
            KpiRow {
                indicator: "Departments affected".into(),
                value: self.departments.map(format_int).unwrap_or_else(|| "N/A".to_string()),
            },
        ]
    }
}

pub fn kpis(subjects: &Dataset, arrivals: &Dataset) -> Kpis {
    Kpis {
        total_victims: total(subjects, config::PEOPLE_PER_OCCURRENCE).ok(),
        total_arrivals: total(arrivals, config::PEOPLE_ARRIVED).ok(),
        total_events: total(arrivals, config::EVENTS).ok(),
        departments: distinct_count(arrivals, config::DEPARTMENT).ok(),
    }
}

/// Arrivals per year, oldest first.
pub fn temporal_trend(arrivals: &Dataset) -> SectionOutcome<Breakdown> {
    let rows = summarize_by_group(
        arrivals,
        config::YEAR,
        &[Measure::Sum(config::PEOPLE_ARRIVED), Measure::Sum(config::EVENTS)],
    )
    .map(sort_by_key);
    breakdown(rows, "Year", &["People displaced", "Events"], NO_MATCH)
}

/// The departments receiving the most displaced people.
pub fn geographic_top(arrivals: &Dataset) -> SectionOutcome<Breakdown> {
    let rows = summarize_by_group(
        arrivals,
        config::DEPARTMENT,
        &[Measure::Sum(config::PEOPLE_ARRIVED), Measure::Sum(config::EVENTS)],
    )
    .map(|r| top_n(r, config::GEOGRAPHIC_TOP_N, 0));
    breakdown(rows, "Department", &["People displaced", "Events"], NO_MATCH)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    pub ethnicity: SectionOutcome<Breakdown>,
    pub life_cycle: SectionOutcome<Breakdown>,
    pub sex: SectionOutcome<Breakdown>,
}

pub fn demographics(subjects: &Dataset) -> Demographics {
    let victims = |col: &str| sum_by_group(subjects, col, config::PEOPLE_PER_OCCURRENCE);
    let all_victims = total(subjects, config::PEOPLE_PER_OCCURRENCE).unwrap_or(0.0);
    Demographics {
        ethnicity: with_shares(
            breakdown(
                victims(config::ETHNICITY).map(|r| top_n(r, config::ETHNICITY_TOP_N, 0)),
                "Ethnicity",
                &["Victims"],
                NO_MATCH,
            ),
            all_victims,
        ),
        life_cycle: with_shares(
            breakdown(
                victims(config::LIFE_CYCLE).map(|r| top_n(r, usize::MAX, 0)),
                "Life cycle",
                &["Victims"],
                NO_MATCH,
            ),
            all_victims,
        ),
        sex: with_shares(
            breakdown(victims(config::SEX), "Sex", &["Victims"], NO_MATCH),
            all_victims,
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparative {
    /// Source of the treemap.
    pub event_types: SectionOutcome<Breakdown>,
    pub disability: SectionOutcome<Breakdown>,
}

pub fn comparative(subjects: &Dataset) -> Comparative {
    let all_victims = total(subjects, config::PEOPLE_PER_OCCURRENCE).unwrap_or(0.0);
    Comparative {
        event_types: with_shares(
            breakdown(
                sum_by_group(subjects, config::EVENT_TYPE, config::PEOPLE_PER_OCCURRENCE)
                    .map(|r| top_n(r, config::EVENT_TYPE_TOP_N, 0)),
                "Victimizing event",
                &["Victims"],
                NO_MATCH,
            ),
            all_victims,
        ),
        disability: with_shares(
            breakdown(
                sum_by_group(subjects, config::DISABILITY, config::PEOPLE_PER_OCCURRENCE),
                "Disability",
                &["Victims"],
                NO_MATCH,
            ),
            all_victims,
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinorityGroupRow {
    pub ethnicity: String,
    pub victims: f64,
    /// `None` when the dataset has no people-subject-to-attention column.
    pub requiring_attention: Option<f64>,
    pub records: f64,
    pub share_of_minorities: f64,
    pub share_of_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareRow {
    pub category: String,
    pub victims: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinorityAnalysis {
    pub groups: Vec<MinorityGroupRow>,
    pub total_minority_victims: f64,
    pub share_of_all_victims: f64,
    /// Share here is relative to all minority victims.
    pub most_affected: Option<ShareRow>,
    pub group_count: usize,
    /// Victims recorded with no ethnic affiliation, share of all victims.
    pub no_ethnicity: ShareRow,
    pub event_types: SectionOutcome<Breakdown>,
}

/// Ethnic minorities only: every ethnicity except "none" and the unknown
/// markers.
pub fn minority_analysis(subjects: &Dataset) -> SectionOutcome<MinorityAnalysis> {
    SectionOutcome::from_parts(
        build_minority_analysis(subjects),
        "No ethnic minority records match the current filters",
    )
}

fn build_minority_analysis(subjects: &Dataset) -> Result<Option<MinorityAnalysis>, SchemaError> {
    let all_victims = total(subjects, config::PEOPLE_PER_OCCURRENCE)?;
    let minorities =
        exclude_categories(subjects, config::ETHNICITY, config::NON_MINORITY_ETHNICITIES)?;
    if minorities.is_empty() {
        return Ok(None);
    }

    let grouped = summarize_by_group(
        &minorities,
        config::ETHNICITY,
        &[Measure::Sum(config::PEOPLE_PER_OCCURRENCE), Measure::Count],
    )
    .map(|r| top_n(r, usize::MAX, 0))?;
    let attention: Option<HashMap<String, f64>> =
        sum_by_group(&minorities, config::ETHNICITY, config::PEOPLE_SUBJECT_TO_ATTENTION)
            .ok()
            .map(|rows| rows.into_iter().map(|r| (r.key.clone(), r.value(0))).collect());

    let total_minority_victims = total(&minorities, config::PEOPLE_PER_OCCURRENCE)?;
    let groups: Vec<MinorityGroupRow> = grouped
        .iter()
        .map(|r| MinorityGroupRow {
            ethnicity: r.key.clone(),
            victims: r.value(0),
            requiring_attention: attention.as_ref().and_then(|m| m.get(&r.key).copied()),
            records: r.value(1),
            share_of_minorities: percentage(r.value(0), total_minority_victims),
            share_of_total: percentage(r.value(0), all_victims),
        })
        .collect();

    let most_affected = grouped.first().map(|r| ShareRow {
        category: r.key.clone(),
        victims: r.value(0),
        share: percentage(r.value(0), total_minority_victims),
    });

    let no_ethnicity_set = retain_categories_ci(subjects, config::ETHNICITY, &[config::NO_ETHNICITY])?;
    let no_ethnicity_victims = total(&no_ethnicity_set, config::PEOPLE_PER_OCCURRENCE)?;

    let event_types = breakdown(
        sum_by_group(&minorities, config::EVENT_TYPE, config::PEOPLE_PER_OCCURRENCE)
            .map(|r| top_n(r, config::MINORITY_EVENTS_TOP_N, 0)),
        "Victimizing event",
        &["Victims"],
        NO_MATCH,
    );

    Ok(Some(MinorityAnalysis {
        group_count: groups.len(),
        groups,
        total_minority_victims,
        share_of_all_victims: percentage(total_minority_victims, all_victims),
        most_affected,
        no_ethnicity: ShareRow {
            category: config::NO_ETHNICITY.to_string(),
            victims: no_ethnicity_victims,
            share: percentage(no_ethnicity_victims, all_victims),
        },
        event_types,
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeShareRow {
    pub life_cycle: String,
    pub label: String,
    pub victims: f64,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinorMinorities {
    pub groups: Breakdown,
    pub total: f64,
    /// Share of all minors.
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinorsAnalysis {
    pub total_minors: f64,
    pub share_of_all_victims: f64,
    pub records: usize,
    /// `None` when the dataset has no sex column.
    pub girls: Option<f64>,
    pub boys: Option<f64>,
    pub age_distribution: Vec<AgeShareRow>,
    pub event_types: SectionOutcome<Breakdown>,
    /// Every event type, descending, with its share of all minors.
    pub event_types_full: SectionOutcome<Breakdown>,
    pub sex: SectionOutcome<Breakdown>,
    pub minorities: SectionOutcome<MinorMinorities>,
    pub by_year: SectionOutcome<Breakdown>,
}

/// Label shown for a minor life-cycle category.
pub fn minor_label(life_cycle: &str) -> &str {
    config::MINOR_LIFE_CYCLES
        .iter()
        .find(|(raw, _)| *raw == life_cycle)
        .map(|(_, label)| *label)
        .unwrap_or(life_cycle)
}

/// Victims aged 0 to 17.
pub fn minors_analysis(subjects: &Dataset) -> SectionOutcome<MinorsAnalysis> {
    SectionOutcome::from_parts(
        build_minors_analysis(subjects),
        "No records of minors match the current filters",
    )
}

fn build_minors_analysis(subjects: &Dataset) -> Result<Option<MinorsAnalysis>, SchemaError> {
    let categories: Vec<&str> = config::MINOR_LIFE_CYCLES.iter().map(|(raw, _)| *raw).collect();
    let minors = retain_categories(subjects, config::LIFE_CYCLE, &categories)?;
    if minors.is_empty() {
        return Ok(None);
    }
    let all_victims = total(subjects, config::PEOPLE_PER_OCCURRENCE)?;
    let total_minors = total(&minors, config::PEOPLE_PER_OCCURRENCE)?;

    let victims_with_sex = |sex: &str| -> Option<f64> {
        let subset = retain_categories(&minors, config::SEX, &[sex]).ok()?;
        total(&subset, config::PEOPLE_PER_OCCURRENCE).ok()
    };

    let age_distribution = sort_by_key(sum_by_group(
        &minors,
        config::LIFE_CYCLE,
        config::PEOPLE_PER_OCCURRENCE,
    )?)
    .into_iter()
    .map(|r| AgeShareRow {
        label: minor_label(&r.key).to_string(),
        victims: r.value(0),
        share: percentage(r.value(0), total_minors),
        life_cycle: r.key,
    })
    .collect();

    let victims = |ds: &Dataset, col: &str| sum_by_group(ds, col, config::PEOPLE_PER_OCCURRENCE);

    let minorities = SectionOutcome::from_parts(
        exclude_categories(&minors, config::ETHNICITY, config::NON_MINORITY_ETHNICITIES).and_then(
            |subset| {
                if subset.is_empty() {
                    return Ok(None);
                }
                let total_minority = total(&subset, config::PEOPLE_PER_OCCURRENCE)?;
                let rows = top_n(
                    victims(&subset, config::ETHNICITY)?,
                    config::MINOR_MINORITIES_TOP_N,
                    0,
                );
                Ok(Breakdown::new("Ethnicity", &["Minors"], rows).map(|groups| MinorMinorities {
                    groups,
                    total: total_minority,
                    share: percentage(total_minority, total_minors),
                }))
            },
        ),
        "No minority minors match the current filters",
    );

    Ok(Some(MinorsAnalysis {
        total_minors,
        share_of_all_victims: percentage(total_minors, all_victims),
        records: minors.len(),
        girls: victims_with_sex(config::SEX_FEMALE),
        boys: victims_with_sex(config::SEX_MALE),
        age_distribution,
        event_types: with_shares(
            breakdown(
                victims(&minors, config::EVENT_TYPE)
                    .map(|r| top_n(r, config::MINOR_EVENTS_TOP_N, 0)),
                "Victimizing event",
                &["Minors"],
                NO_MATCH,
            ),
            total_minors,
        ),
        event_types_full: with_shares(
            breakdown(
                victims(&minors, config::EVENT_TYPE).map(|r| top_n(r, usize::MAX, 0)),
                "Victimizing event",
                &["Minors"],
                NO_MATCH,
            ),
            total_minors,
        ),
        sex: with_shares(
            breakdown(victims(&minors, config::SEX), "Sex", &["Minors"], NO_MATCH),
            total_minors,
        ),
        minorities,
        by_year: breakdown(
            victims(&minors, config::YEAR).map(sort_by_key),
            "Year",
            &["Minors"],
            NO_MATCH,
        ),
    }))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndefinedDepartments {
    pub records: usize,
    pub records_share: f64,
    /// `None` when arrivals have no people-arrived column.
    pub people: Option<f64>,
    pub people_share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCoverage {
    pub first: String,
    pub last: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    pub undefined_departments: SectionOutcome<UndefinedDepartments>,
    pub year_coverage: SectionOutcome<YearCoverage>,
}

pub fn data_quality(arrivals: &Dataset) -> DataQuality {
    let undefined = retain_categories_ci(arrivals, config::DEPARTMENT, config::UNDEFINED_DEPARTMENTS)
        .map(|subset| {
            let people = total(&subset, config::PEOPLE_ARRIVED).ok();
            let all_people = total(arrivals, config::PEOPLE_ARRIVED).ok();
            Some(UndefinedDepartments {
                records: subset.len(),
                records_share: percentage(subset.len() as f64, arrivals.len() as f64),
                people,
                people_share: people.zip(all_people).map(|(p, all)| percentage(p, all)),
            })
        });

    let coverage = count_by_group(arrivals, config::YEAR).map(|rows| {
        // Only numeric keys are years; "Not specified" and other markers are skipped.
        let mut years: Vec<String> = rows
            .into_iter()
            .map(|r| r.key)
            .filter(|k| parse_f64_safe(Some(k.as_str())).is_some())
            .collect();
        years.sort_by(|a, b| compare_keys(a, b));
        match (years.first(), years.last()) {
            (Some(first), Some(last)) => Some(YearCoverage { first: first.clone(), last: last.clone() }),
            _ => None,
        }
    });

    DataQuality {
        undefined_departments: SectionOutcome::from_parts(undefined, NO_MATCH),
        year_coverage: SectionOutcome::from_parts(coverage, "No valid years recorded"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conclusions {
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn conclusions() -> Conclusions {
    let findings = [
        "Magnitude of displacement: millions of people affected reveal a humanitarian crisis lasting decades. Displacement is the main consequence of the armed conflict.",
        "Most vulnerable populations: ethnic minorities are disproportionately affected, minors are an alarming share of victims, and women and girls face specific risk of sexual violence.",
        "Child exploitation: displacement exposes minors to commercial sexual exploitation, forced labour and recruitment by armed groups.",
        "Geographic concentration: a few departments receive most arrivals, putting pressure on the infrastructure of receiving cities.",
    ];
    let recommendations = [
        "Protection: special protocols for minors, ethnically differentiated care, immediate protection routes.",
        "Data: better recording of perpetrators, precise georeferencing, longitudinal follow-up.",
        "Justice: prosecution of exploiters, comprehensive reparation, guarantees of non-repetition.",
    ];
    Conclusions {
        findings: findings.iter().map(|s| s.to_string()).collect(),
        recommendations: recommendations.iter().map(|s| s.to_string()).collect(),
    }
}

/// One restricted filter dimension as listed in the report header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedFilter {
    pub dimension: String,
    pub shown: Vec<String>,
    /// Selected values beyond the ones listed in `shown`.
    pub more: usize,
}

pub fn applied_filters(criteria: &FilterCriteria) -> Vec<AppliedFilter> {
    criteria
        .active_dimensions()
        .into_iter()
        .map(|(dim, values)| AppliedFilter {
            dimension: dim.to_string(),
            shown: values.iter().take(config::FILTER_PREVIEW_VALUES).cloned().collect(),
            more: values.len().saturating_sub(config::FILTER_PREVIEW_VALUES),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub source: String,
    pub filters: Vec<AppliedFilter>,
    pub subjects_rows: usize,
    pub arrivals_rows: usize,
    pub kpis: Kpis,
    pub temporal: SectionOutcome<Breakdown>,
    pub geographic: SectionOutcome<Breakdown>,
    pub demographics: Demographics,
    pub comparative: Comparative,
    pub minorities: SectionOutcome<MinorityAnalysis>,
    pub minors: SectionOutcome<MinorsAnalysis>,
    pub data_quality: DataQuality,
    pub conclusions: Conclusions,
}

/// Filter both datasets with `criteria` and build every section.
pub fn build_report(subjects: &Dataset, arrivals: &Dataset, criteria: &FilterCriteria) -> Report {
    build_report_at(subjects, arrivals, criteria, Local::now().naive_local())
}

pub fn build_report_at(
    subjects: &Dataset,
    arrivals: &Dataset,
    criteria: &FilterCriteria,
    generated_at: NaiveDateTime,
) -> Report {
    let subjects = filter(subjects, criteria);
    let arrivals = filter(arrivals, criteria);
    Report {
        title: config::REPORT_TITLE.to_string(),
        generated_at,
        source: config::DATA_SOURCE.to_string(),
        filters: applied_filters(criteria),
        subjects_rows: subjects.len(),
        arrivals_rows: arrivals.len(),
        kpis: kpis(&subjects, &arrivals),
        temporal: temporal_trend(&arrivals),
        geographic: geographic_top(&arrivals),
        demographics: demographics(&subjects),
        comparative: comparative(&subjects),
        minorities: minority_analysis(&subjects),
        minors: minors_analysis(&subjects),
        data_quality: data_quality(&arrivals),
        conclusions: conclusions(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, Column, ColumnKind, Schema};
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn subjects() -> Dataset {
        let schema = Schema::new(vec![
            Column { name: config::EVENT_TYPE.into(), kind: ColumnKind::Text },
            Column { name: config::ETHNICITY.into(), kind: ColumnKind::Text },
            Column { name: config::LIFE_CYCLE.into(), kind: ColumnKind::Text },
            Column { name: config::SEX.into(), kind: ColumnKind::Text },
            Column { name: config::PEOPLE_PER_OCCURRENCE.into(), kind: ColumnKind::Numeric },
        ]);
        let row = |e: &str, eth: &str, lc: &str, sex: &str, n: f64| {
            vec![text(e), text(eth), text(lc), text(sex), Cell::Number(n)]
        };
        Dataset::new(
            "subjects",
            schema,
            vec![
                row("Desplazamiento", "Ninguna", "entre 29 y 60", "HOMBRE", 50.0),
                row("Desplazamiento", "Indígena", "entre 0 y 5", "MUJER", 20.0),
                row("Amenaza", "Negro(a) o Afrocolombiano(a)", "entre 12 y 17", "HOMBRE", 10.0),
                row("Amenaza", "No Informa", "entre 6 y 11", "MUJER", 15.0),
                row("Homicidio", "Indígena", "entre 18 y 28", "HOMBRE", 5.0),
            ],
        )
    }

    fn arrivals() -> Dataset {
        let schema = Schema::new(vec![
            Column { name: config::DEPARTMENT.into(), kind: ColumnKind::Text },
            Column { name: config::YEAR.into(), kind: ColumnKind::Text },
            Column { name: config::EVENTS.into(), kind: ColumnKind::Numeric },
            Column { name: config::PEOPLE_ARRIVED.into(), kind: ColumnKind::Numeric },
        ]);
        let row = |d: &str, y: &str, ev: f64, p: f64| vec![text(d), text(y), Cell::Number(ev), Cell::Number(p)];
        Dataset::new(
            "arrivals",
            schema,
            vec![
                row("Antioquia", "2021", 3.0, 30.0),
                row("Sin Definir", "2019", 1.0, 10.0),
                row("Cesar", "2021", 2.0, 20.0),
                row("Antioquia", "2020", 4.0, 40.0),
            ],
        )
    }

    #[test]
    fn kpis_and_missing_columns() {
        let k = kpis(&subjects(), &arrivals());
        assert_eq!(k.total_victims, Some(100.0));
        assert_eq!(k.total_arrivals, Some(100.0));
        assert_eq!(k.total_events, Some(10.0));
        assert_eq!(k.departments, Some(3));

        let k = kpis(&arrivals(), &subjects());
        assert_eq!(k.total_victims, None);
        assert_eq!(k.rows()[0].value, "N/A");
    }

    #[test]
    fn temporal_trend_is_ascending_by_year() {
        let trend = temporal_trend(&arrivals());
        let rows = &trend.ready().unwrap().rows;
        let years: Vec<_> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(years, vec!["2019", "2020", "2021"]);
        assert_eq!(rows[2].values, vec![50.0, 5.0]);
    }

    #[test]
    fn temporal_trend_without_events_is_no_data() {
        assert!(matches!(temporal_trend(&subjects()), SectionOutcome::NoData(_)));
    }

    #[test]
    fn geographic_top_orders_by_people() {
        let geo = geographic_top(&arrivals());
        let keys: Vec<_> = geo.ready().unwrap().rows.iter().map(|r| r.key.clone()).collect();
        assert_eq!(keys, vec!["Antioquia", "Cesar", "Sin Definir"]);
    }

    #[test]
    fn minorities_exclude_none_and_unknown() {
        let analysis = minority_analysis(&subjects());
        let a = analysis.ready().unwrap();
        let names: Vec<_> = a.groups.iter().map(|g| g.ethnicity.as_str()).collect();
        assert_eq!(names, vec!["Indígena", "Negro(a) o Afrocolombiano(a)"]);
        assert_eq!(a.total_minority_victims, 35.0);
        assert_eq!(a.share_of_all_victims, 35.0);
        assert_eq!(a.groups[0].records, 2.0);
        assert_eq!(a.groups[0].requiring_attention, None);
        assert_eq!(a.no_ethnicity.victims, 50.0);
        assert_eq!(a.most_affected.as_ref().map(|m| m.category.as_str()), Some("Indígena"));
    }

    #[test]
    fn minors_cover_the_three_child_brackets() {
        let analysis = minors_analysis(&subjects());
        let m = analysis.ready().unwrap();
        assert_eq!(m.total_minors, 45.0);
        assert_eq!(m.records, 3);
        assert_eq!(m.girls, Some(35.0));
        assert_eq!(m.boys, Some(10.0));
        let labels: Vec<_> = m.age_distribution.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Early childhood (0-5)", "Adolescence (12-17)", "Childhood (6-11)"]
        );
        assert!(matches!(m.by_year, SectionOutcome::NoData(_)));
        let minorities = m.minorities.ready().unwrap();
        assert_eq!(minorities.total, 30.0);
    }

    #[test]
    fn empty_filter_result_is_empty_not_no_data() {
        let criteria = FilterCriteria {
            ethnicity: crate::filter::Selection::from_choices(["Raizal"]),
            ..FilterCriteria::all()
        };
        let report = build_report(&subjects(), &arrivals(), &criteria);
        assert!(matches!(report.minorities, SectionOutcome::Empty(_)));
        assert!(matches!(report.minors, SectionOutcome::Empty(_)));
        assert!(matches!(report.demographics.ethnicity, SectionOutcome::Empty(_)));
        assert_eq!(report.subjects_rows, 0);
        // Arrivals have no ethnicity column, so they are untouched.
        assert_eq!(report.arrivals_rows, 4);
        assert!(report.temporal.ready().is_some());
    }

    #[test]
    fn data_quality_flags_undefined_departments() {
        let dq = data_quality(&arrivals());
        let undefined = dq.undefined_departments.ready().unwrap();
        assert_eq!(undefined.records, 1);
        assert_eq!(undefined.records_share, 25.0);
        assert_eq!(undefined.people_share, Some(10.0));
        assert_eq!(
            dq.year_coverage.ready(),
            Some(&YearCoverage { first: "2019".into(), last: "2021".into() })
        );
    }

    fn many_ethnicities(groups: usize, victims_each: f64) -> Dataset {
        let schema = Schema::new(vec![
            Column { name: config::ETHNICITY.into(), kind: ColumnKind::Text },
            Column { name: config::PEOPLE_PER_OCCURRENCE.into(), kind: ColumnKind::Numeric },
        ]);
        let rows = (0..groups)
            .map(|i| vec![text(&format!("G{i}")), Cell::Number(victims_each)])
            .collect();
        Dataset::new("subjects", schema, rows)
    }

    #[test]
    fn top_ethnicity_shares_use_the_full_total() {
        let demo = demographics(&many_ethnicities(10, 10.0));
        let eth = demo.ethnicity.ready().unwrap();
        assert_eq!(eth.rows.len(), config::ETHNICITY_TOP_N);
        assert_eq!(eth.shares, vec![10.0; config::ETHNICITY_TOP_N]);
        assert!(matches!(demo.sex, SectionOutcome::NoData(_)));
    }

    #[test]
    fn minors_list_every_event_with_share_of_minors() {
        let schema = Schema::new(vec![
            Column { name: config::EVENT_TYPE.into(), kind: ColumnKind::Text },
            Column { name: config::LIFE_CYCLE.into(), kind: ColumnKind::Text },
            Column { name: config::PEOPLE_PER_OCCURRENCE.into(), kind: ColumnKind::Numeric },
        ]);
        let rows = (0..12)
            .map(|i| vec![text(&format!("E{i}")), text("entre 6 y 11"), Cell::Number(5.0)])
            .chain(std::iter::once(vec![text("E0"), text("entre 29 y 60"), Cell::Number(500.0)]))
            .collect();
        let ds = Dataset::new("subjects", schema, rows);
        let analysis = minors_analysis(&ds);
        let m = analysis.ready().unwrap();
        assert_eq!(m.total_minors, 60.0);

        let top = m.event_types.ready().unwrap();
        assert_eq!(top.rows.len(), config::MINOR_EVENTS_TOP_N);
        let full = m.event_types_full.ready().unwrap();
        assert_eq!(full.rows.len(), 12);
        for share in top.shares.iter().chain(&full.shares) {
            assert!((share - 100.0 / 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn year_coverage_skips_unspecified_years() {
        let schema = Schema::new(vec![
            Column { name: config::YEAR.into(), kind: ColumnKind::Text },
            Column { name: config::PEOPLE_ARRIVED.into(), kind: ColumnKind::Numeric },
        ]);
        let row = |y: &str| vec![text(y), Cell::Number(1.0)];
        let ds = Dataset::new(
            "arrivals",
            schema.clone(),
            vec![row("2019"), row(config::NOT_SPECIFIED), row("2021")],
        );
        assert_eq!(
            data_quality(&ds).year_coverage.ready(),
            Some(&YearCoverage { first: "2019".into(), last: "2021".into() })
        );

        let unknown = Dataset::new("arrivals", schema, vec![row(config::NOT_SPECIFIED)]);
        assert!(matches!(data_quality(&unknown).year_coverage, SectionOutcome::Empty(_)));
    }

    #[test]
    fn applied_filters_preview_three_values() {
        let criteria = FilterCriteria {
            year: crate::filter::Selection::from_choices(["2018", "2019", "2020", "2021", "2022"]),
            ..FilterCriteria::all()
        };
        let applied = applied_filters(&criteria);
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].shown, vec!["2018", "2019", "2020"]);
        assert_eq!(applied[0].more, 2);
    }
}
