//! DataFrame views of the loaded registries.
//!
//! Rows are sorted so that the frames are stable across runs: phases by
//! start time, everything else by name.
use polars::datatypes::TimeUnit;
use polars::prelude::*;

use crate::error::MetaError;
use crate::liquid::Concentration;
use crate::metadata::Metadata;
use crate::schema::frame;

/// One row per phase: name, type, iteration, start, end, comments,
/// partition and the number of cages with bottles.
pub fn phases_frame(metadata: &Metadata) -> Result<DataFrame, MetaError> {
    let phases = metadata.phases_by_start();

    let names: Vec<String> = phases.iter().map(|p| p.name.clone()).collect();
    let types: Vec<Option<String>> = phases.iter().map(|p| p.phase_type.clone()).collect();
    let iterations: Vec<Option<i64>> = phases.iter().map(|p| p.iteration).collect();
    let starts: Vec<i64> = phases.iter().map(|p| p.start.timestamp_micros()).collect();
    let ends: Vec<i64> = phases.iter().map(|p| p.end.timestamp_micros()).collect();
    let comments: Vec<Option<String>> = phases.iter().map(|p| p.comments.clone()).collect();
    let partitions: Vec<Option<String>> = phases.iter().map(|p| p.partition.clone()).collect();
    let cage_counts: Vec<i64> = phases.iter().map(|p| p.cages.len() as i64).collect();

    let df = DataFrame::new(vec![
        Column::new(frame::NAME.into(), &names),
        Column::new(frame::TYPE.into(), &types),
        Column::new(frame::ITERATION.into(), &iterations),
        datetime_column(frame::START, &starts)?,
        datetime_column(frame::END, &ends)?,
        Column::new(frame::COMMENTS.into(), &comments),
        Column::new(frame::PARTITION.into(), &partitions),
        Column::new(frame::CAGE_COUNT.into(), &cage_counts),
    ])?;
    Ok(df)
}

/// One row per animal: name, weight, deceased.
pub fn animals_frame(metadata: &Metadata) -> Result<DataFrame, MetaError> {
    let mut animals: Vec<_> = metadata.animals.iter().flat_map(|a| a.values()).collect();
    animals.sort_by(|a, b| a.name.cmp(&b.name));

    let names: Vec<String> = animals.iter().map(|a| a.name.clone()).collect();
    let weights: Vec<Option<f64>> = animals.iter().map(|a| a.weight).collect();
    let deceased: Vec<bool> = animals.iter().map(|a| a.deceased).collect();

    let df = DataFrame::new(vec![
        Column::new(frame::NAME.into(), &names),
        Column::new(frame::WEIGHT.into(), &weights),
        Column::new(frame::DECEASED.into(), &deceased),
    ])?;
    Ok(df)
}

/// One row per (liquid, substance), solvent first.
pub fn liquids_frame(metadata: &Metadata) -> Result<DataFrame, MetaError> {
    let mut liquids: Vec<_> = metadata.liquids.iter().flat_map(|l| l.values()).collect();
    liquids.sort_by(|a, b| a.name.cmp(&b.name));

    let mut rows = LiquidRows::default();
    for liquid in liquids {
        if let Some(solvent) = &liquid.solvent {
            rows.push(&liquid.name, frame::ROLE_SOLVENT, solvent);
        }
        for solute in liquid.solutes.iter() {
            rows.push(&liquid.name, frame::ROLE_SOLUTE, solute);
        }
    }

    let df = DataFrame::new(vec![
        Column::new(frame::LIQUID.into(), &rows.liquids),
        Column::new(frame::SUBSTANCE.into(), &rows.substances),
        Column::new(frame::ROLE.into(), &rows.roles),
        Column::new(frame::AMOUNT.into(), &rows.amounts),
        Column::new(frame::UNIT.into(), &rows.units),
        Column::new(frame::MASS_FRACTION.into(), &rows.mass_fractions),
        Column::new(frame::VOLUME_CONCENTRATION.into(), &rows.volumes),
    ])?;
    Ok(df)
}

/// One row per occupied side: bottles, side, liquid.
pub fn bottle_sides_frame(metadata: &Metadata) -> Result<DataFrame, MetaError> {
    let mut sets: Vec<_> = metadata.bottles.iter().flat_map(|b| b.values()).collect();
    sets.sort_by(|a, b| a.name.cmp(&b.name));

    let mut names = Vec::new();
    let mut sides = Vec::new();
    let mut liquids = Vec::new();
    for bottles in sets {
        for (side, liquid) in &bottles.sides {
            names.push(bottles.name.clone());
            sides.push(i64::from(*side));
            liquids.push(liquid.name().to_string());
        }
    }

    let df = DataFrame::new(vec![
        Column::new(frame::BOTTLES.into(), &names),
        Column::new(frame::SIDE.into(), &sides),
        Column::new(frame::LIQUID.into(), &liquids),
    ])?;
    Ok(df)
}

#[derive(Default)]
struct LiquidRows {
    liquids: Vec<String>,
    substances: Vec<String>,
    roles: Vec<String>,
    amounts: Vec<Option<f64>>,
    units: Vec<Option<String>>,
    mass_fractions: Vec<Option<f64>>,
    volumes: Vec<Option<f64>>,
}

impl LiquidRows {
    fn push(&mut self, liquid: &str, role: &str, concentration: &Concentration) {
        self.liquids.push(liquid.to_string());
        self.substances
            .push(concentration.substance.name().to_string());
        self.roles.push(role.to_string());
        self.amounts.push(concentration.amount);
        self.units.push(concentration.unit.clone());
        self.mass_fractions.push(concentration.mass_fraction);
        self.volumes.push(concentration.volume_concentration);
    }
}

/// UTC microseconds → naive Datetime column.
fn datetime_column(name: &str, micros: &[i64]) -> Result<Column, MetaError> {
    let series = Series::new(name.into(), micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;
    Ok(series.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_phases_frame_sorted_by_start() {
        let (_dir, metadata) = fixtures::load();
        let df = phases_frame(&metadata).unwrap();

        assert_eq!(df.height(), 4);
        let names = df.column(frame::NAME).unwrap().str().unwrap();
        assert_eq!(names.get(0), Some("Adaptation"));
        assert_eq!(names.get(1), Some("NP 1"));
        assert_eq!(names.get(3), Some("Phase 3"));

        let cages = df.column(frame::CAGE_COUNT).unwrap().i64().unwrap();
        assert_eq!(cages.get(0), Some(2));
        assert_eq!(cages.get(3), Some(0));

        assert!(matches!(
            df.column(frame::START).unwrap().dtype(),
            DataType::Datetime(TimeUnit::Microseconds, None)
        ));
    }

    #[test]
    fn test_liquids_frame_rows() {
        let (_dir, metadata) = fixtures::load();
        let df = liquids_frame(&metadata).unwrap();

        // saccharin: solvent + solute, sucrose 10%: solvent + solute, water: solvent
        assert_eq!(df.height(), 5);
        let liquids = df.column(frame::LIQUID).unwrap().str().unwrap();
        let roles = df.column(frame::ROLE).unwrap().str().unwrap();
        let fractions = df.column(frame::MASS_FRACTION).unwrap().f64().unwrap();
        assert_eq!(liquids.get(2), Some("sucrose 10%"));
        assert_eq!(roles.get(2), Some("solvent"));
        assert!((fractions.get(2).unwrap() - 0.9).abs() < 1e-9);
        assert_eq!(roles.get(3), Some("solute"));
        // the saccharin solvent fraction could not be derived
        assert_eq!(fractions.get(0), None);
    }

    #[test]
    fn test_animals_and_bottles_frames() {
        let (_dir, metadata) = fixtures::load();

        let animals = animals_frame(&metadata).unwrap();
        assert_eq!(animals.height(), 4);
        let deceased = animals.column(frame::DECEASED).unwrap().bool().unwrap();
        // Jerry sorts first
        assert_eq!(deceased.get(0), Some(true));

        let sides = bottle_sides_frame(&metadata).unwrap();
        // standard: 8 sides, sweet: 4 sides
        assert_eq!(sides.height(), 12);
    }

    #[test]
    fn test_empty_metadata_frames() {
        let metadata = Metadata::default();
        assert_eq!(phases_frame(&metadata).unwrap().height(), 0);
        assert_eq!(animals_frame(&metadata).unwrap().height(), 0);
        assert_eq!(liquids_frame(&metadata).unwrap().height(), 0);
        assert_eq!(bottle_sides_frame(&metadata).unwrap().height(), 0);
    }
}
