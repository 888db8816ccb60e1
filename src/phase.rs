use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tracing::trace;

use crate::animal::{Partition, Partitions};
use crate::bottles::{BottleSets, Bottles};
use crate::error::{MetaError, Result};
use crate::schema::phase;
use crate::table::{Row, Table};
use crate::time::convert_time;

/// One experimental phase.
#[derive(Debug, Clone)]
pub struct Phase {
    pub name: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub phase_type: Option<String>,
    pub iteration: Option<i64>,
    /// Partition key as written in the table, lowercased.
    pub partition: Option<String>,
    /// The animals of that partition, shared with the animal registry.
    pub animals: Option<Arc<Partition>>,
    pub comments: Option<String>,
    /// Cage number → bottle arrangement placed in it.
    pub cages: BTreeMap<u32, Arc<Bottles>>,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub type Phases = HashMap<String, Phase>;

/// Fallback name sources for unnamed rows, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NamingTier {
    /// `"<type> <iteration>"`
    TypeAndIteration,
    /// `"<type>"`
    Type,
    /// `"Phase <row>"`
    RowIndex,
}

const NAMING_TIERS: [NamingTier; 3] = [
    NamingTier::TypeAndIteration,
    NamingTier::Type,
    NamingTier::RowIndex,
];

impl NamingTier {
    fn base_name(self, row: usize, draft: &Phase) -> Option<String> {
        match self {
            NamingTier::TypeAndIteration => match (&draft.phase_type, draft.iteration) {
                (Some(kind), Some(iteration)) => Some(format!("{kind} {iteration}")),
                _ => None,
            },
            NamingTier::Type => draft.phase_type.clone(),
            NamingTier::RowIndex => Some(format!("Phase {row}")),
        }
    }
}

/// `base`, or the first free `"base (j)"` counting from zero.
fn free_name(taken: &Phases, base: String) -> String {
    if !taken.contains_key(&base) {
        return base;
    }
    let mut j = 0usize;
    loop {
        let candidate = format!("{base} ({j})");
        if !taken.contains_key(&candidate) {
            return candidate;
        }
        j += 1;
    }
}

/// Name the deferred rows tier by tier. Each name is committed at once, so
/// later rows see it as taken.
fn name_unnamed(result: &mut Phases, mut pending: Vec<(usize, Phase)>) {
    for tier in NAMING_TIERS {
        let mut left = Vec::new();
        for (row, mut draft) in pending {
            match tier.base_name(row, &draft) {
                Some(base) => {
                    draft.name = free_name(result, base);
                    trace!(row, name = %draft.name, ?tier, "phase named");
                    result.insert(draft.name.clone(), draft);
                }
                None => left.push((row, draft)),
            }
        }
        pending = left;
    }
}

const LABELS: [&str; 7] = [
    phase::START,
    phase::END,
    phase::NAME,
    phase::TYPE,
    phase::ITERATION,
    phase::PARTITION,
    phase::COMMENTS,
];

/// Load the phases table; `None` when the file is absent.
pub fn load_phases(
    path: &Path,
    bottles: Option<&BottleSets>,
    partitions: &Partitions,
    default_offset: FixedOffset,
) -> Result<Option<Phases>> {
    match Table::read(path)? {
        Some(table) => phases_from_table(&table, bottles, partitions, default_offset).map(Some),
        None => Ok(None),
    }
}

pub fn phases_from_table(
    table: &Table,
    bottles: Option<&BottleSets>,
    partitions: &Partitions,
    default_offset: FixedOffset,
) -> Result<Phases> {
    table.require_columns(&[phase::START, phase::END])?;

    let mut result = Phases::new();
    let mut pending = Vec::new();
    for row in table.rows(&LABELS) {
        let draft = draft_phase(&row, bottles, partitions, default_offset)?;
        if draft.name.is_empty() {
            pending.push((row.index(), draft));
            continue;
        }
        if result.contains_key(&draft.name) {
            return Err(MetaError::DuplicatePhase(draft.name));
        }
        result.insert(draft.name.clone(), draft);
    }

    name_unnamed(&mut result, pending);
    Ok(result)
}

/// A phase as written in one row; `name` is empty when the row has none.
fn draft_phase(
    row: &Row<'_>,
    bottles: Option<&BottleSets>,
    partitions: &Partitions,
    default_offset: FixedOffset,
) -> Result<Phase> {
    let time = |label: &str| {
        let value = row.field(label);
        convert_time(value, default_offset)
            .map_err(|reason| MetaError::malformed(row.table_name(), row.index(), label, value, reason))
    };
    let start = time(phase::START)?;
    let end = time(phase::END)?;

    let partition = row.field(phase::PARTITION).to_lowercase();
    let animals = match partitions.get(&partition) {
        Some(found) => Some(Arc::clone(found)),
        None if partition.is_empty() => None,
        None => {
            return Err(MetaError::UnknownPartition {
                phase_row: row.index(),
                partition,
            })
        }
    };

    Ok(Phase {
        name: row.field(phase::NAME).to_string(),
        start,
        end,
        phase_type: row.opt_string(phase::TYPE),
        iteration: row.opt_i64(phase::ITERATION)?,
        partition: (!partition.is_empty()).then_some(partition),
        animals,
        comments: row.opt_string(phase::COMMENTS),
        cages: cages(row, bottles)?,
    })
}

/// `cage<N>` columns whose cell names a known bottle arrangement.
fn cages(row: &Row<'_>, bottles: Option<&BottleSets>) -> Result<BTreeMap<u32, Arc<Bottles>>> {
    let mut cages = BTreeMap::new();
    for (column, cell) in row.extras() {
        let key = column.trim().to_lowercase();
        let Some(number) = key.strip_prefix(phase::CAGE_PREFIX) else {
            continue;
        };
        let value = cell.trim().to_lowercase();
        if value.is_empty() {
            continue;
        }
        let cage: u32 = number.trim().parse().map_err(|_| MetaError::BadColumn {
            table: row.table_name().to_string(),
            column: column.to_string(),
        })?;

        match bottles.and_then(|b| b.get(&value)) {
            Some(found) => {
                cages.insert(cage, Arc::clone(found));
            }
            None => trace!(cage, value = %value, "no bottles by that name"),
        }
    }
    Ok(cages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::Animal;
    use chrono::{Offset, Utc};

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            "phases.csv",
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    const COLUMNS: [&str; 5] = ["start", "end", "name", "type", "iteration"];
    const START: &str = "2012-12-18 12:00";
    const END: &str = "2012-12-19 12:00";

    fn named(rows: &[[&str; 3]]) -> Vec<String> {
        let rows: Vec<Vec<&str>> = rows
            .iter()
            .map(|[name, kind, iteration]| vec![START, END, *name, *kind, *iteration])
            .collect();
        let rows: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
        let phases =
            phases_from_table(&table(&COLUMNS, &rows), None, &Partitions::new(), utc()).unwrap();
        let mut names: Vec<String> = phases.into_keys().collect();
        names.sort();
        names
    }

    #[test]
    fn test_explicit_names_kept() {
        assert_eq!(named(&[["Adaptation", "", ""]]), vec!["Adaptation"]);
    }

    #[test]
    fn test_type_and_iteration_disambiguated() {
        assert_eq!(
            named(&[["", "A", "1"], ["", "A", "1"]]),
            vec!["A 1", "A 1 (0)"]
        );
        assert_eq!(
            named(&[["", "A", "1"], ["", "A", "1"], ["", "A", "1"]]),
            vec!["A 1", "A 1 (0)", "A 1 (1)"]
        );
    }

    #[test]
    fn test_type_only_takes_bare_name_first() {
        assert_eq!(named(&[["", "X", ""], ["", "X", ""]]), vec!["X", "X (0)"]);
    }

    #[test]
    fn test_row_index_fallback() {
        let names = named(&[
            ["a", "", ""],
            ["b", "", ""],
            ["c", "", ""],
            ["", "", ""],
        ]);
        assert_eq!(names, vec!["Phase 3", "a", "b", "c"]);
    }

    #[test]
    fn test_synthesized_names_avoid_explicit_ones() {
        assert_eq!(
            named(&[["", "", ""], ["Phase 0", "", ""]]),
            vec!["Phase 0", "Phase 0 (0)"]
        );
        assert_eq!(
            named(&[["", "A", "1"], ["A 1", "", ""]]),
            vec!["A 1", "A 1 (0)"]
        );
    }

    #[test]
    fn test_earlier_tiers_claim_names_first() {
        // the type-only row comes first in the table but is named after the
        // type-and-iteration rows
        assert_eq!(
            named(&[["", "A", ""], ["", "A", "1"], ["", "A 1", ""]]),
            vec!["A", "A 1", "A 1 (0)"]
        );
    }

    #[test]
    fn test_duplicate_explicit_name_faults() {
        let rows: &[&[&str]] = &[&[START, END, "x", "", ""], &[START, END, "x", "", ""]];
        let err = phases_from_table(&table(&COLUMNS, rows), None, &Partitions::new(), utc())
            .unwrap_err();
        assert!(matches!(err, MetaError::DuplicatePhase(ref n) if n == "x"));
    }

    #[test]
    fn test_fields_partition_and_cages() {
        let mouse = Arc::new(Animal {
            name: "Mickey".into(),
            weight: None,
            deceased: false,
        });
        let partition: Partition = [(1, vec![Arc::clone(&mouse)])].into_iter().collect();
        let partitions: Partitions = [("halves".to_string(), Arc::new(partition))]
            .into_iter()
            .collect();
        let standard = Arc::new(Bottles::new("Standard"));
        let bottles: BottleSets = [(standard.name.clone(), Arc::clone(&standard))]
            .into_iter()
            .collect();

        let t = table(
            &[
                "start", "end", "name", "type", "iteration", "partition", "comments", "cage1",
                "Cage 2", "cage 3",
            ],
            &[&[
                START,
                END,
                "",
                "NP",
                "2",
                "Halves",
                "lights off",
                "standard",
                "unknown",
                "",
            ]],
        );
        let phases = phases_from_table(&t, Some(&bottles), &partitions, utc()).unwrap();
        let np = &phases["NP 2"];

        assert_eq!(np.phase_type.as_deref(), Some("NP"));
        assert_eq!(np.iteration, Some(2));
        assert_eq!(np.comments.as_deref(), Some("lights off"));
        assert_eq!(np.partition.as_deref(), Some("halves"));
        let animals = np.animals.as_ref().unwrap();
        assert!(Arc::ptr_eq(animals, &partitions["halves"]));
        assert_eq!(animals[&1][0].name, "Mickey");

        assert_eq!(np.cages.len(), 1);
        assert!(Arc::ptr_eq(&np.cages[&1], &standard));
        assert!(np.start < np.end);
    }

    #[test]
    fn test_unknown_partition_faults() {
        let t = table(
            &["start", "end", "partition"],
            &[&[START, END, "nowhere"]],
        );
        let err = phases_from_table(&t, None, &Partitions::new(), utc()).unwrap_err();
        assert!(matches!(err, MetaError::UnknownPartition { phase_row: 0, .. }));
    }

    #[test]
    fn test_bad_time_and_missing_columns() {
        let t = table(&["start", "end"], &[&["soon", END]]);
        let err = phases_from_table(&t, None, &Partitions::new(), utc()).unwrap_err();
        assert!(matches!(err, MetaError::MalformedValue { ref column, .. } if column == "start"));

        let t = table(&["start", "name"], &[&[START, "x"]]);
        let err = phases_from_table(&t, None, &Partitions::new(), utc()).unwrap_err();
        assert!(matches!(err, MetaError::MissingColumn { ref column, .. } if column == "end"));
    }

    #[test]
    fn test_bad_cage_column() {
        let t = table(&["start", "end", "cage one"], &[&[START, END, "x"]]);
        let err = phases_from_table(&t, None, &Partitions::new(), utc()).unwrap_err();
        assert!(matches!(err, MetaError::BadColumn { .. }));
    }

    #[test]
    fn test_blank_cage_annotation_column_is_skipped() {
        let t = table(&["start", "end", "name", "cage notes"], &[&[START, END, "A", " "]]);
        let phases = phases_from_table(&t, None, &Partitions::new(), utc()).unwrap();
        assert!(phases["A"].cages.is_empty());
    }
}
