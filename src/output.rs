use crate::config;
use crate::error::ExportError;
use crate::reports::{Breakdown, Report, SectionOutcome};
use crate::types::Dataset;
use crate::util::{format_count, format_int, format_percent};
use serde::Serialize;
use std::fmt::Write as _;
use std::io;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Write `dataset` rows as CSV: normalized headers, nulls as empty fields.
pub fn write_dataset_csv<W: io::Write>(writer: W, dataset: &Dataset) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.schema().names())?;
    for row in dataset.rows() {
        wtr.write_record(row.iter().map(|c| c.to_field()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_dataset_csv(path: &Path, dataset: &Dataset) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_dataset_csv(file, dataset)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// One page of the detail table.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-based, clamped into `1..=total_pages`.
    pub number: usize,
    pub total_pages: usize,
    /// Row range on this page, 0-based and end-exclusive.
    pub start: usize,
    pub end: usize,
    pub total_rows: usize,
}

impl Page {
    pub fn caption(&self) -> String {
        if self.total_rows == 0 {
            return "No rows to show".to_string();
        }
        format!(
            "Showing rows {} to {} of {}",
            self.start + 1,
            self.end,
            format_int(self.total_rows)
        )
    }
}

pub fn page(dataset: &Dataset, number: usize, rows_per_page: usize) -> Page {
    let rows_per_page = rows_per_page.max(1);
    let total_rows = dataset.len();
    let total_pages = total_rows.div_ceil(rows_per_page).max(1);
    let number = number.clamp(1, total_pages);
    let start = ((number - 1) * rows_per_page).min(total_rows);
    let end = (start + rows_per_page).min(total_rows);
    Page { number, total_pages, start, end, total_rows }
}

/// Markdown table of the rows on `page`. Numbers are shown truncated with
/// thousands separators.
pub fn page_table(dataset: &Dataset, page: &Page) -> String {
    let mut builder = Builder::default();
    builder.push_record(dataset.schema().names().map(str::to_string));
    let end = page.end.min(dataset.len());
    let start = page.start.min(end);
    for row in &dataset.rows()[start..end] {
        builder.push_record(row.iter().map(|c| match c.as_f64() {
            Some(n) => format_count(n),
            None => c.key().into_owned(),
        }));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        return "(no rows)\n".to_string();
    }
    format!("{}\n", Table::new(slice).with(Style::markdown()))
}

/// Shares are printed as computed by the report; nothing is derived here.
fn breakdown_table(b: &Breakdown) -> String {
    let mut builder = Builder::default();
    let mut header = vec![b.key_label.clone()];
    header.extend(b.measure_labels.iter().cloned());
    if !b.shares.is_empty() {
        header.push("Share".to_string());
    }
    builder.push_record(header);

    for (i, r) in b.rows.iter().enumerate() {
        let mut record = vec![r.key.clone()];
        record.extend(r.values.iter().map(|v| format_count(*v)));
        if let Some(share) = b.shares.get(i) {
            record.push(format_percent(*share, 2));
        }
        builder.push_record(record);
    }
    format!("{}\n", builder.build().with(Style::markdown()))
}

fn render_outcome<T>(out: &mut String, outcome: &SectionOutcome<T>, ready: impl FnOnce(&mut String, &T)) {
    match outcome {
        SectionOutcome::Ready(v) => ready(out, v),
        SectionOutcome::NoData(reason) => {
            let _ = writeln!(out, "_No data for this view ({reason})._\n");
        }
        SectionOutcome::Empty(message) => {
            let _ = writeln!(out, "_{message}._\n");
        }
    }
}

fn render_breakdown(out: &mut String, title: &str, outcome: &SectionOutcome<Breakdown>) {
    let _ = writeln!(out, "### {title}\n");
    render_outcome(out, outcome, |out, b| out.push_str(&breakdown_table(b)));
}

/// Render the whole report as Markdown. Nothing is recomputed here: every
/// figure comes from `report`.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", report.title);
    let _ = writeln!(out, "Generated: {}\n", report.generated_at.format("%Y-%m-%d %H:%M"));

    if !report.filters.is_empty() {
        out.push_str("**Filters applied:**\n\n");
        for f in &report.filters {
            let mut line = format!("- {}: {}", f.dimension, f.shown.join(", "));
            if f.more > 0 {
                let _ = write!(line, " (and {} more)", f.more);
            }
            let _ = writeln!(out, "{line}");
        }
        out.push('\n');
    }

    out.push_str("## Key impact indicators\n\n");
    out.push_str(&preview_table_rows(&report.kpis.rows(), usize::MAX));
    out.push('\n');

    out.push_str("## Temporal analysis\n\n");
    render_breakdown(&mut out, "Displacement by year", &report.temporal);

    out.push_str("## Geographic distribution\n\n");
    render_breakdown(
        &mut out,
        &format!("Top {} receiving departments", config::GEOGRAPHIC_TOP_N),
        &report.geographic,
    );

    out.push_str("## Demographic profile\n\n");
    render_breakdown(&mut out, "By ethnicity", &report.demographics.ethnicity);
    render_breakdown(&mut out, "By life cycle", &report.demographics.life_cycle);
    render_breakdown(&mut out, "By sex", &report.demographics.sex);

    out.push_str("## Comparative analysis\n\n");
    render_breakdown(&mut out, "Victimizing events", &report.comparative.event_types);
    render_breakdown(&mut out, "Victims with and without disability", &report.comparative.disability);

    out.push_str("## Ethnic minorities\n\n");
    render_outcome(&mut out, &report.minorities, |out, m| {
        let mut builder = Builder::default();
        builder.push_record([
            "Ethnicity",
            "Victims",
            "Requiring attention",
            "Records",
            "% of minorities",
            "% of total",
        ]);
        for g in &m.groups {
            builder.push_record([
                g.ethnicity.clone(),
                format_count(g.victims),
                g.requiring_attention.map(format_count).unwrap_or_else(|| "N/A".into()),
                format_count(g.records),
                format_percent(g.share_of_minorities, 2),
                format_percent(g.share_of_total, 2),
            ]);
        }
        let _ = writeln!(out, "{}\n", builder.build().with(Style::markdown()));
        let _ = writeln!(
            out,
            "- Minority victims: {} ({} of total)",
            format_count(m.total_minority_victims),
            format_percent(m.share_of_all_victims, 1)
        );
        if let Some(top) = &m.most_affected {
            let _ = writeln!(
                out,
                "- Most affected group: {} with {} victims ({})",
                top.category,
                format_count(top.victims),
                format_percent(top.share, 1)
            );
        }
        let _ = writeln!(out, "- Ethnic groups recorded: {}", m.group_count);
        let _ = writeln!(
            out,
            "- No ethnic affiliation: {} victims ({} of total)\n",
            format_count(m.no_ethnicity.victims),
            format_percent(m.no_ethnicity.share, 1)
        );
        render_breakdown(out, "Top victimizing events in minorities", &m.event_types);
    });

    out.push_str("## Minors\n\n");
    render_outcome(&mut out, &report.minors, |out, m| {
        let _ = writeln!(
            out,
            "- Minors affected: {} ({} of total)",
            format_count(m.total_minors),
            format_percent(m.share_of_all_victims, 1)
        );
        let _ = writeln!(out, "- Records involving minors: {}", format_int(m.records));
        let shown = |v: Option<f64>| v.map(format_count).unwrap_or_else(|| "N/A".into());
        let _ = writeln!(out, "- Girls: {}", shown(m.girls));
        let _ = writeln!(out, "- Boys: {}\n", shown(m.boys));

        let mut builder = Builder::default();
        builder.push_record(["Age group", "Victims", "Share"]);
        for a in &m.age_distribution {
            builder.push_record([a.label.clone(), format_count(a.victims), format_percent(a.share, 2)]);
        }
        let _ = writeln!(out, "{}\n", builder.build().with(Style::markdown()));

        render_breakdown(out, "Top victimizing events against minors", &m.event_types);
        render_breakdown(out, "All victimizing events against minors", &m.event_types_full);
        render_breakdown(out, "Minors by sex", &m.sex);
        let _ = writeln!(out, "### Minority minors\n");
        render_outcome(out, &m.minorities, |out, mm| {
            let _ = writeln!(
                out,
                "{} minority minors ({} of minors)\n",
                format_count(mm.total),
                format_percent(mm.share, 1)
            );
            out.push_str(&breakdown_table(&mm.groups));
        });
        render_breakdown(out, "Minors by year", &m.by_year);
    });

    out.push_str("## Data quality\n\n");
    render_outcome(&mut out, &report.data_quality.undefined_departments, |out, u| {
        let _ = writeln!(
            out,
            "- {} records ({}) without a defined department",
            format_int(u.records),
            format_percent(u.records_share, 1)
        );
        if let (Some(p), Some(s)) = (u.people, u.people_share) {
            let _ = writeln!(out, "- {} people ({}) without a clear location", format_count(p), format_percent(s, 1));
        }
    });
    render_outcome(&mut out, &report.data_quality.year_coverage, |out, y| {
        let _ = writeln!(out, "- Period covered: {} - {}\n", y.first, y.last);
    });

    out.push_str("## Conclusions\n\n");
    for (i, f) in report.conclusions.findings.iter().enumerate() {
        let _ = writeln!(out, "{}. {f}", i + 1);
    }
    out.push_str("\n### Recommendations\n\n");
    for r in &report.conclusions.recommendations {
        let _ = writeln!(out, "- {r}");
    }
    let _ = writeln!(out, "\nSource: {}", report.source);
    out
}
