use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};

use crate::schema::tables;

/// Where the metadata tables live and how their timestamps are read.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    /// File name of the substances table, relative to the metadata root.
    pub substances_file: String,
    pub liquids_file: String,
    pub bottles_file: String,
    pub animals_file: String,
    pub phases_file: String,
    /// Offset given to phase timestamps written without one.
    pub default_offset: FixedOffset,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            substances_file: tables::SUBSTANCES.to_string(),
            liquids_file: tables::LIQUIDS.to_string(),
            bottles_file: tables::BOTTLES.to_string(),
            animals_file: tables::ANIMALS.to_string(),
            phases_file: tables::PHASES.to_string(),
            default_offset: Utc.fix(),
        }
    }
}

impl MetadataConfig {
    pub fn with_substances_file(mut self, name: impl Into<String>) -> Self {
        self.substances_file = name.into();
        self
    }

    pub fn with_liquids_file(mut self, name: impl Into<String>) -> Self {
        self.liquids_file = name.into();
        self
    }

    pub fn with_bottles_file(mut self, name: impl Into<String>) -> Self {
        self.bottles_file = name.into();
        self
    }

    pub fn with_animals_file(mut self, name: impl Into<String>) -> Self {
        self.animals_file = name.into();
        self
    }

    pub fn with_phases_file(mut self, name: impl Into<String>) -> Self {
        self.phases_file = name.into();
        self
    }

    pub fn with_default_offset(mut self, offset: FixedOffset) -> Self {
        self.default_offset = offset;
        self
    }

    pub(crate) fn substances_path(&self, root: &Path) -> PathBuf {
        root.join(&self.substances_file)
    }

    pub(crate) fn liquids_path(&self, root: &Path) -> PathBuf {
        root.join(&self.liquids_file)
    }

    pub(crate) fn bottles_path(&self, root: &Path) -> PathBuf {
        root.join(&self.bottles_file)
    }

    pub(crate) fn animals_path(&self, root: &Path) -> PathBuf {
        root.join(&self.animals_file)
    }

    pub(crate) fn phases_path(&self, root: &Path) -> PathBuf {
        root.join(&self.phases_file)
    }
}
