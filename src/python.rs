use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::config::MetadataConfig;
use crate::error::MetaError;
use crate::frames;
use crate::graph::MetadataGraph;
use crate::metadata::Metadata;

#[pyclass]
pub struct MetadataModel {
    base_path: PathBuf,
    config: MetadataConfig,
    metadata: Option<Metadata>,
    graph: Option<MetadataGraph>,
}

#[pymethods]
impl MetadataModel {
    #[new]
    #[pyo3(signature = (base_path, utc_offset_minutes=0))]
    fn new(base_path: String, utc_offset_minutes: i32) -> PyResult<Self> {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .ok_or_else(|| PyValueError::new_err("utc_offset_minutes out of range"))?;
        Ok(Self {
            base_path: PathBuf::from(base_path),
            config: MetadataConfig::default().with_default_offset(offset),
            metadata: None,
            graph: None,
        })
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load every metadata table found under the base path.
    /// Missing tables are skipped; malformed ones raise.
    fn load(&mut self) -> PyResult<()> {
        let metadata = Metadata::load_with(&self.base_path, &self.config)?;
        self.graph = Some(metadata.graph());
        self.metadata = Some(metadata);
        Ok(())
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn phases_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(frames::phases_frame(self.loaded()?)?))
    }

    #[getter]
    fn animals_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(frames::animals_frame(self.loaded()?)?))
    }

    #[getter]
    fn liquids_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(frames::liquids_frame(self.loaded()?)?))
    }

    #[getter]
    fn bottles_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(frames::bottle_sides_frame(self.loaded()?)?))
    }

    /// Group name → animal names, in table order.
    fn groups(&self) -> PyResult<HashMap<String, Vec<String>>> {
        let metadata = self.loaded()?;
        Ok(metadata
            .groups
            .iter()
            .map(|(group, members)| {
                (
                    group.clone(),
                    members.iter().map(|a| a.name.clone()).collect(),
                )
            })
            .collect())
    }

    /// Phase names ordered by start time.
    fn phase_names(&self) -> PyResult<Vec<String>> {
        let metadata = self.loaded()?;
        Ok(metadata
            .phases_by_start()
            .into_iter()
            .map(|p| p.name.clone())
            .collect())
    }

    /// `(start, end)` of a phase as timezone-aware datetimes.
    fn phase_interval(
        &self,
        name: &str,
    ) -> PyResult<Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)>> {
        let metadata = self.loaded()?;
        Ok(metadata.phase(name).map(|p| (p.start, p.end)))
    }

    // ── Graph queries ───────────────────────────────────────────────────────

    fn phases_exposed_to(&self, substance: &str) -> PyResult<Vec<String>> {
        Ok(self.graph()?.phases_exposed_to(substance))
    }

    fn substances_in_phase(&self, phase: &str) -> PyResult<Vec<String>> {
        Ok(self.graph()?.substances_in_phase(phase))
    }

    fn animals_in_phase(&self, phase: &str) -> PyResult<Vec<String>> {
        Ok(self.graph()?.animals_in_phase(phase))
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl MetadataModel {
    fn loaded(&self) -> Result<&Metadata, MetaError> {
        self.metadata
            .as_ref()
            .ok_or_else(|| MetaError::NotLoaded("metadata".into()))
    }

    fn graph(&self) -> Result<&MetadataGraph, MetaError> {
        self.graph
            .as_ref()
            .ok_or_else(|| MetaError::NotLoaded("metadata".into()))
    }
}
