// Column vocabulary, sentinels and the fixed analytical category lists
// shared by the loader, the filters and the report sections.
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Value written into every null text cell by the loader.
pub const NOT_SPECIFIED: &str = "Not specified";

/// The always-available "no restriction" option of a filter dimension.
pub const ALL_OPTION: &str = "All";

pub const EVENT_TYPE: &str = "Type or Name of Victimizing Event";
pub const SEX: &str = "Sex";
pub const ETHNICITY: &str = "Ethnicity";
pub const DISABILITY: &str = "Disability";
pub const LIFE_CYCLE: &str = "Life cycle";
pub const PEOPLE_PER_OCCURRENCE: &str = "People per occurrence";
pub const PEOPLE_SUBJECT_TO_ATTENTION: &str = "People subject to attention";
pub const EVENTS: &str = "Events";
pub const YEAR: &str = "Year";
pub const PEOPLE_ARRIVED: &str = "People arrived";
/// Department of arrival. Not renamed, only present in the arrivals file.
pub const DEPARTMENT: &str = "ESTADO_DEPTO";

/// Administrative columns dropped on load (compared after upper-casing).
pub const DROPPED_COLUMNS: &[&str] = &["FECHA_CORTE", "COD_ESTADO_DEPTO", "PARAM_HECHO"];

/// Columns that look numeric but are categories.
pub const FORCED_TEXT_COLUMNS: &[&str] = &[YEAR];

/// Raw (upper-cased) header -> normalized column name.
pub static COLUMN_RENAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("HECHO", EVENT_TYPE),
        ("SEXO", SEX),
        ("ETNIA", ETHNICITY),
        ("DISCAPACIDAD", DISABILITY),
        ("CICLO_VITAL", LIFE_CYCLE),
        ("PER_OCU", PEOPLE_PER_OCCURRENCE),
        ("PER_SA", PEOPLE_SUBJECT_TO_ATTENTION),
        ("EVENTOS", EVENTS),
        ("VIGENCIA", YEAR),
        ("PER_LLEGADA", PEOPLE_ARRIVED),
    ])
});

/// Ethnicity values that mean "no ethnic affiliation" or unknown, lower-cased.
pub const NON_MINORITY_ETHNICITIES: &[&str] = &[
    "ninguna",
    "no informa",
    "sin información",
    "no especificado",
    "nd",
    "not specified",
];

/// The explicit "no ethnic affiliation" category, lower-cased.
pub const NO_ETHNICITY: &str = "ninguna";

/// Department values that do not identify a place, lower-cased.
pub const UNDEFINED_DEPARTMENTS: &[&str] = &[
    "sin definir",
    "no informa",
    "sin información",
    "no especificado",
    "not specified",
];

/// Life-cycle categories of people under 18, with their display labels.
pub const MINOR_LIFE_CYCLES: &[(&str, &str)] = &[
    ("entre 0 y 5", "Early childhood (0-5)"),
    ("entre 6 y 11", "Childhood (6-11)"),
    ("entre 12 y 17", "Adolescence (12-17)"),
];

pub const SEX_FEMALE: &str = "MUJER";
pub const SEX_MALE: &str = "HOMBRE";

pub const GEOGRAPHIC_TOP_N: usize = 10;
pub const ETHNICITY_TOP_N: usize = 8;
pub const EVENT_TYPE_TOP_N: usize = 8;
pub const MINORITY_EVENTS_TOP_N: usize = 10;
pub const MINOR_EVENTS_TOP_N: usize = 10;
pub const MINOR_MINORITIES_TOP_N: usize = 8;

/// Rows per page in the detail table view.
pub const ROWS_PER_PAGE: usize = 50;

/// Number of selected values listed per dimension in the "filters applied" block.
pub const FILTER_PREVIEW_VALUES: usize = 3;

/// Rows sampled when inferring whether a column is numeric.
pub const INFER_SCHEMA_ROWS: usize = 100;

pub const DEFAULT_SUBJECTS_PATH: &str = "datasets/hecho_victimizante.csv";
pub const DEFAULT_ARRIVALS_PATH: &str = "datasets/llegadas.csv";

pub const REPORT_TITLE: &str = "Forced Displacement Victims Analysis";
pub const DATA_SOURCE: &str = "Registro Único de Víctimas (RUV) - Colombia";

/// Loader knobs that can vary per input file.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub delimiter: u8,
    pub infer_schema_rows: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { delimiter: b',', infer_schema_rows: INFER_SCHEMA_ROWS }
    }
}
