/// Table and column-name constants for the metadata tables.
/// Single source of truth - exported to Python via PyO3.

// ── Table files ─────────────────────────────────────────────────────────────
pub mod tables {
    pub const SUBSTANCES: &str = "substances.csv";
    pub const LIQUIDS: &str = "liquids.csv";
    pub const BOTTLES: &str = "bottles.csv";
    pub const ANIMALS: &str = "animals.csv";
    pub const PHASES: &str = "phases.csv";
}

// ── Substance columns ───────────────────────────────────────────────────────
pub mod substance {
    pub const NAME: &str = "name";
    pub const MOLAR_MASS: &str = "molar mass";
    pub const DENSITY: &str = "density";
}

// ── Liquid columns ──────────────────────────────────────────────────────────
pub mod liquid {
    pub const NAME: &str = "name";
    pub const DENSITY: &str = "density";

    /// Cell tokens marking the substance of a column as the solvent.
    pub const SOLVENT_TOKENS: [&str; 2] = ["medium", "solvent"];

    pub const UNIT_VOLUME: &str = "volume";
    pub const UNIT_MASS: &str = "mass";
}

// ── Bottles columns ─────────────────────────────────────────────────────────
pub mod bottles {
    pub const NAME: &str = "name";
    pub const CORNER: &str = "corner";
    pub const SIDE: &str = "side";
}

// ── Animal columns ──────────────────────────────────────────────────────────
pub mod animal {
    pub const NAME: &str = "name";
    pub const WEIGHT: &str = "weight";
    pub const DECEASED: &str = "deceased";
    pub const GROUP_PREFIX: &str = "group";
    pub const PARTITION_PREFIX: &str = "partition";
}

// ── Phase columns ───────────────────────────────────────────────────────────
pub mod phase {
    pub const START: &str = "start";
    pub const END: &str = "end";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const ITERATION: &str = "iteration";
    pub const PARTITION: &str = "partition";
    pub const COMMENTS: &str = "comments";
    pub const CAGE_PREFIX: &str = "cage";
}

// ── DataFrame view columns ──────────────────────────────────────────────────
pub mod frame {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const ITERATION: &str = "iteration";
    pub const START: &str = "start";
    pub const END: &str = "end";
    pub const COMMENTS: &str = "comments";
    pub const PARTITION: &str = "partition";
    pub const CAGE_COUNT: &str = "cage_count";
    pub const WEIGHT: &str = "weight";
    pub const DECEASED: &str = "deceased";
    pub const LIQUID: &str = "liquid";
    pub const SUBSTANCE: &str = "substance";
    pub const ROLE: &str = "role";
    pub const AMOUNT: &str = "amount";
    pub const UNIT: &str = "unit";
    pub const MASS_FRACTION: &str = "mass_fraction";
    pub const VOLUME_CONCENTRATION: &str = "volume_concentration";
    pub const BOTTLES: &str = "bottles";
    pub const SIDE: &str = "side";

    pub const ROLE_SOLVENT: &str = "solvent";
    pub const ROLE_SOLUTE: &str = "solute";
}
