use thiserror::Error;

pub type Result<T> = std::result::Result<T, MetaError>;

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Missing column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Malformed value {value:?} in {table} row {row}, column '{column}': {reason}")]
    MalformedValue {
        table: String,
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("Unrecognised column '{column}' in {table}")]
    BadColumn { table: String, column: String },

    #[error("Liquid '{liquid}' has more than one solvent ('{first}' and '{second}')")]
    DuplicateSolvent {
        liquid: String,
        first: String,
        second: String,
    },

    #[error("Bottles '{bottles}': side {side} assigned twice")]
    SideConflict { bottles: String, side: u32 },

    #[error("Bottles '{bottles}': corner {corner} assigned twice")]
    CornerConflict { bottles: String, corner: u32 },

    #[error(
        "Liquid '{liquid}': density {liquid_density} inconsistent with solvent density {solvent_density}"
    )]
    DensityMismatch {
        liquid: String,
        liquid_density: f64,
        solvent_density: f64,
    },

    #[error("Phase '{0}' defined more than once")]
    DuplicatePhase(String),

    #[error("Phase at row {phase_row} refers to unknown partition '{partition}'")]
    UnknownPartition { phase_row: usize, partition: String },
}

impl MetaError {
    pub(crate) fn malformed(
        table: &str,
        row: usize,
        column: &str,
        value: &str,
        reason: impl ToString,
    ) -> Self {
        MetaError::MalformedValue {
            table: table.to_string(),
            row,
            column: column.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(feature = "python")]
impl From<MetaError> for pyo3::PyErr {
    fn from(err: MetaError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
