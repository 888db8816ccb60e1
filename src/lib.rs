pub mod animal;
pub mod bottles;
pub mod config;
pub mod error;
pub mod frames;
pub mod graph;
pub mod liquid;
pub mod metadata;
pub mod phase;
pub mod schema;
pub mod substance;
pub mod table;
pub mod time;

#[cfg(test)]
mod fixtures;
#[cfg(feature = "python")]
mod python;

pub use animal::{Animal, AnimalRegistry, Animals, Groups, Partition, Partitions};
pub use bottles::{BottleSets, Bottles, LiquidRef};
pub use config::MetadataConfig;
pub use error::{MetaError, Result};
pub use graph::MetadataGraph;
pub use liquid::{Concentration, Liquid, Liquids, Solutes, SubstanceRef};
pub use metadata::Metadata;
pub use phase::{Phase, Phases};
pub use substance::{Substance, Substances};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Export table names as a Python submodule
#[cfg(feature = "python")]
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let tables = PyModule::new(m.py(), "tables")?;
    tables.add("SUBSTANCES", schema::tables::SUBSTANCES)?;
    tables.add("LIQUIDS", schema::tables::LIQUIDS)?;
    tables.add("BOTTLES", schema::tables::BOTTLES)?;
    tables.add("ANIMALS", schema::tables::ANIMALS)?;
    tables.add("PHASES", schema::tables::PHASES)?;
    m.add_submodule(&tables)?;
    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::MetadataModel>()?;
    add_schema_exports(m)?;
    Ok(())
}
