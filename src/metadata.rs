use std::path::{Path, PathBuf};

use tracing::info;

use crate::animal::{load_animals, Animals, Groups, Partitions};
use crate::bottles::{load_bottles, BottleSets};
use crate::config::MetadataConfig;
use crate::error::Result;
use crate::graph::MetadataGraph;
use crate::liquid::{load_liquids, Liquids};
use crate::phase::{load_phases, Phase, Phases};
use crate::substance::{load_substances, Substances};

/// Every registry loaded from one metadata root.
///
/// A stage whose table is absent stays `None`; stages depending on it fall
/// back to raw names.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub root: PathBuf,
    pub substances: Option<Substances>,
    pub liquids: Option<Liquids>,
    pub bottles: Option<BottleSets>,
    pub animals: Option<Animals>,
    pub groups: Groups,
    pub partitions: Partitions,
    pub phases: Option<Phases>,
}

impl Metadata {
    /// Load the tables under `root` with default file names.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(root, &MetadataConfig::default())
    }

    /// Substances, liquids and bottles are resolved in turn; animals are
    /// loaded in full before phases look up their partitions.
    pub fn load_with(root: impl AsRef<Path>, config: &MetadataConfig) -> Result<Self> {
        let root = root.as_ref();

        let substances = load_substances(&config.substances_path(root))?;
        let liquids = load_liquids(&config.liquids_path(root), substances.as_ref())?;
        let bottles = load_bottles(&config.bottles_path(root), liquids.as_ref())?;

        let (animals, groups, partitions) = match load_animals(&config.animals_path(root))? {
            Some(registry) => (Some(registry.animals), registry.groups, registry.partitions),
            None => (None, Groups::new(), Partitions::new()),
        };

        let phases = load_phases(
            &config.phases_path(root),
            bottles.as_ref(),
            &partitions,
            config.default_offset,
        )?;

        let metadata = Self {
            root: root.to_path_buf(),
            substances,
            liquids,
            bottles,
            animals,
            groups,
            partitions,
            phases,
        };
        info!(
            root = %root.display(),
            substances = count(&metadata.substances),
            liquids = count(&metadata.liquids),
            bottles = count(&metadata.bottles),
            animals = count(&metadata.animals),
            groups = metadata.groups.len(),
            phases = count(&metadata.phases),
            "metadata loaded"
        );
        Ok(metadata)
    }

    /// The `(phases, animals, groups)` triple; absent tables give empty maps.
    pub fn into_parts(self) -> (Phases, Animals, Groups) {
        (
            self.phases.unwrap_or_default(),
            self.animals.unwrap_or_default(),
            self.groups,
        )
    }

    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.as_ref().and_then(|p| p.get(name))
    }

    /// Phases ordered by start time, then name.
    pub fn phases_by_start(&self) -> Vec<&Phase> {
        let mut phases: Vec<&Phase> = self.phases.iter().flat_map(|p| p.values()).collect();
        phases.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.name.cmp(&b.name)));
        phases
    }

    pub fn graph(&self) -> MetadataGraph {
        MetadataGraph::from_metadata(self)
    }
}

fn count<K, V>(map: &Option<std::collections::HashMap<K, V>>) -> usize {
    map.as_ref().map_or(0, |m| m.len())
}
