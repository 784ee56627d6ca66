// Entry point and high-level CLI flow.
//
// Every command loads the two datasets through one `DataStore`, applies the
// filter flags, and hands the filtered data to the report builder or an
// exporter. Console output is for the user; diagnostics go through `log`.
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use displacement_report::config::{self, LoaderConfig};
use displacement_report::filter::{filter, filter_options, Dimension, FilterCriteria, Selection};
use displacement_report::output;
use displacement_report::reports;
use displacement_report::store::DataStore;
use displacement_report::types::Dataset;
use displacement_report::util::format_int;
use env_logger::Env;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Forced-displacement victims analysis: filtered summaries, report and exports.
#[derive(Parser, Debug)]
#[command(name = "displacement-report")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Victimizing-event records (CSV)
    #[arg(long, global = true, default_value = config::DEFAULT_SUBJECTS_PATH)]
    subjects: PathBuf,

    /// Displacement-arrival records (CSV)
    #[arg(long, global = true, default_value = config::DEFAULT_ARRIVALS_PATH)]
    arrivals: PathBuf,

    /// Field delimiter of both input files
    #[arg(long, global = true, default_value_t = ',')]
    delimiter: char,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Category filters. Omitted, or given the value "All", means no restriction.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Victimizing event type (repeatable)
    #[arg(long = "event", value_name = "VALUE")]
    event: Vec<String>,

    /// Ethnicity (repeatable)
    #[arg(long, value_name = "VALUE")]
    ethnicity: Vec<String>,

    /// Life-cycle stage (repeatable)
    #[arg(long, value_name = "VALUE")]
    life_cycle: Vec<String>,

    /// Receiving department (repeatable)
    #[arg(long, value_name = "VALUE")]
    department: Vec<String>,

    /// Year (repeatable)
    #[arg(long, value_name = "VALUE")]
    year: Vec<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            event_type: Selection::from_choices(self.event.iter().cloned()),
            ethnicity: Selection::from_choices(self.ethnicity.iter().cloned()),
            life_cycle: Selection::from_choices(self.life_cycle.iter().cloned()),
            department: Selection::from_choices(self.department.iter().cloned()),
            year: Selection::from_choices(self.year.iter().cloned()),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Which {
    Subjects,
    Arrivals,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the full analytical report and optionally save it
    Report {
        #[command(flatten)]
        filters: FilterArgs,

        /// Also write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Also write the report as Markdown
        #[arg(long)]
        markdown: Option<PathBuf>,
    },

    /// Write the filtered rows of one dataset as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, value_enum)]
        dataset: Which,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the values each filter accepts
    Options,

    /// Show one page of the filtered rows of a dataset
    Table {
        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long, value_enum)]
        dataset: Which,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = config::ROWS_PER_PAGE)]
        rows_per_page: usize,
    },
}

/// Load (or fetch from the store) one dataset, printing a short summary of
/// what the loader did.
fn load_one(store: &mut DataStore, path: &Path, label: &str) -> Result<Arc<Dataset>> {
    let dataset = store
        .get_or_load(path, label)
        .with_context(|| format!("{label} data unavailable"))?;
    if let Some(report) = store.load_report(path) {
        println!(
            "Processing {}... ({} rows loaded, {} skipped)",
            label,
            format_int(report.kept_rows),
            format_int(report.dropped_rows)
        );
        if report.coerced_cells > 0 {
            println!(
                "Note: {} unreadable numeric values treated as missing.",
                format_int(report.coerced_cells)
            );
        }
    }
    Ok(dataset)
}

fn load_both(store: &mut DataStore, cli: &Cli) -> Result<(Arc<Dataset>, Arc<Dataset>)> {
    let subjects = load_one(store, &cli.subjects, "subjects")?;
    let arrivals = load_one(store, &cli.arrivals, "arrivals")?;
    println!();
    Ok((subjects, arrivals))
}

fn pick(which: Which, subjects: Arc<Dataset>, arrivals: Arc<Dataset>) -> Arc<Dataset> {
    match which {
        Which::Subjects => subjects,
        Which::Arrivals => arrivals,
    }
}

fn handle_report(
    subjects: &Dataset,
    arrivals: &Dataset,
    filters: &FilterArgs,
    json: Option<&Path>,
    markdown: Option<&Path>,
) -> Result<()> {
    let report = reports::build_report(subjects, arrivals, &filters.criteria());
    let rendered = output::render_markdown(&report);
    println!("{rendered}");

    if let Some(path) = json {
        output::write_json(path, &report)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("(Report exported to {})", path.display());
    }
    if let Some(path) = markdown {
        std::fs::write(path, &rendered).with_context(|| format!("writing {}", path.display()))?;
        println!("(Report exported to {})", path.display());
    }
    Ok(())
}

fn handle_export(dataset: &Dataset, filters: &FilterArgs, path: &Path) -> Result<()> {
    let filtered = filter(dataset, &filters.criteria());
    output::export_dataset_csv(path, &filtered)
        .with_context(|| format!("writing {}", path.display()))?;
    println!(
        "Exported {} {} rows to {}",
        format_int(filtered.len()),
        dataset.label(),
        path.display()
    );
    Ok(())
}

/// Subject-side dimensions come from the subjects file, department and year
/// from the arrivals file.
fn handle_options(subjects: &Dataset, arrivals: &Dataset) {
    for dim in Dimension::ALL {
        let source = match dim {
            Dimension::Department | Dimension::Year => arrivals,
            _ => subjects,
        };
        println!("{dim}:");
        for option in filter_options(source, dim.column()) {
            println!("  {option}");
        }
        println!();
    }
}

fn handle_table(dataset: &Dataset, filters: &FilterArgs, page: usize, rows_per_page: usize) {
    let filtered = filter(dataset, &filters.criteria());
    let p = output::page(&filtered, page, rows_per_page);
    println!("Page {} of {}\n", p.number, p.total_pages);
    println!("{}\n", output::page_table(&filtered, &p));
    println!("{}", p.caption());
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if !cli.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character, got '{}'", cli.delimiter);
    }
    let loader_config = LoaderConfig { delimiter: cli.delimiter as u8, ..LoaderConfig::default() };
    let mut store = DataStore::new(loader_config);
    let (subjects, arrivals) = load_both(&mut store, &cli)?;
    info!("subjects: {} rows, arrivals: {} rows", subjects.len(), arrivals.len());

    match &cli.command {
        Commands::Report { filters, json, markdown } => {
            handle_report(&subjects, &arrivals, filters, json.as_deref(), markdown.as_deref())?;
        }
        Commands::Export { filters, dataset, output } => {
            let dataset = pick(*dataset, subjects, arrivals);
            handle_export(&dataset, filters, output)?;
        }
        Commands::Options => handle_options(&subjects, &arrivals),
        Commands::Table { filters, dataset, page, rows_per_page } => {
            let dataset = pick(*dataset, subjects, arrivals);
            handle_table(&dataset, filters, *page, *rows_per_page);
        }
    }
    Ok(())
}
