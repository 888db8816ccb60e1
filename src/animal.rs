use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{MetaError, Result};
use crate::schema::animal;
use crate::table::{Row, Table};

/// A tracked animal. The name keeps its original case.
#[derive(Debug, Clone, PartialEq)]
pub struct Animal {
    pub name: String,
    pub weight: Option<f64>,
    pub deceased: bool,
}

impl fmt::Display for Animal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub type Animals = HashMap<String, Arc<Animal>>;

/// Group name → members in table order.
pub type Groups = BTreeMap<String, Vec<Arc<Animal>>>;

/// Partition value → members in table order.
pub type Partition = BTreeMap<i64, Vec<Arc<Animal>>>;

/// Partition key → shared partition.
pub type Partitions = HashMap<String, Arc<Partition>>;

/// Everything the animals table yields. Phases read `partitions` only
/// once the whole table has been processed.
#[derive(Debug, Clone, Default)]
pub struct AnimalRegistry {
    pub animals: Animals,
    pub groups: Groups,
    pub partitions: Partitions,
}

const LABELS: [&str; 3] = [animal::NAME, animal::WEIGHT, animal::DECEASED];

/// Load the animals table; `None` when the file is absent.
pub fn load_animals(path: &Path) -> Result<Option<AnimalRegistry>> {
    match Table::read(path)? {
        Some(table) => animals_from_table(&table).map(Some),
        None => Ok(None),
    }
}

pub fn animals_from_table(table: &Table) -> Result<AnimalRegistry> {
    let mut animals = Animals::new();
    let mut groups = Groups::new();
    let mut partitions: HashMap<String, Partition> = HashMap::new();

    for row in table.rows(&LABELS) {
        let instance = Arc::new(Animal {
            name: row.field(animal::NAME).to_string(),
            weight: row.opt_f64(animal::WEIGHT)?,
            deceased: parse_deceased(&row)?,
        });

        for (column, cell) in row.extras() {
            let key = column.trim().to_lowercase();
            let value = cell.trim().to_lowercase();

            if let Some(suffix) = key.strip_prefix(animal::GROUP_PREFIX) {
                if value.is_empty() {
                    continue;
                }
                let group = if suffix.is_empty() {
                    value
                } else {
                    suffix.trim().to_string()
                };
                groups.entry(group).or_default().push(Arc::clone(&instance));
            } else if let Some(suffix) = key.strip_prefix(animal::PARTITION_PREFIX) {
                if value.is_empty() {
                    continue;
                }
                let index: i64 = value.parse().map_err(|e| {
                    MetaError::malformed(row.table_name(), row.index(), column, &value, e)
                })?;
                partitions
                    .entry(suffix.trim().to_string())
                    .or_default()
                    .entry(index)
                    .or_default()
                    .push(Arc::clone(&instance));
            }
        }

        animals.insert(instance.name.clone(), instance);
    }

    Ok(AnimalRegistry {
        animals,
        groups,
        partitions: partitions
            .into_iter()
            .map(|(key, partition)| (key, Arc::new(partition)))
            .collect(),
    })
}

fn parse_deceased(row: &Row<'_>) -> Result<bool> {
    let value = row.field(animal::DECEASED);
    match value.to_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n" | "f" => Ok(false),
        "1" | "true" | "yes" | "y" | "t" => Ok(true),
        _ => Err(MetaError::malformed(
            row.table_name(),
            row.index(),
            animal::DECEASED,
            value,
            "expected a yes/no value",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            "animals.csv",
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn names(members: &[Arc<Animal>]) -> Vec<&str> {
        members.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_basic_fields() {
        let reg = animals_from_table(&table(
            &["name", "weight", "deceased"],
            &[&["Mickey", "21.5", ""], &["Minnie", "", "yes"]],
        ))
        .unwrap();

        let mickey = &reg.animals["Mickey"];
        assert_eq!(mickey.weight, Some(21.5));
        assert!(!mickey.deceased);
        let minnie = &reg.animals["Minnie"];
        assert_eq!(minnie.weight, None);
        assert!(minnie.deceased);
        assert!(reg.groups.is_empty());
        assert!(reg.partitions.is_empty());
    }

    #[test]
    fn test_groups_keep_row_order() {
        let reg = animals_from_table(&table(
            &["name", "group", "Group Control", "group treated"],
            &[
                &["C", "Cohort A", "x", ""],
                &["A", "cohort a", "", "1"],
                &["B", "", "x", "1"],
            ],
        ))
        .unwrap();

        assert_eq!(names(&reg.groups["cohort a"]), vec!["C", "A"]);
        assert_eq!(names(&reg.groups["control"]), vec!["C", "B"]);
        assert_eq!(names(&reg.groups["treated"]), vec!["A", "B"]);
        assert_eq!(reg.groups.len(), 3);
    }

    #[test]
    fn test_partitions_by_index() {
        let reg = animals_from_table(&table(
            &["name", "partition halves", "Partition"],
            &[&["A", "1", "0"], &["B", "2", "0"], &["C", "1", ""]],
        ))
        .unwrap();

        let halves = &reg.partitions["halves"];
        assert_eq!(names(&halves[&1]), vec!["A", "C"]);
        assert_eq!(names(&halves[&2]), vec!["B"]);

        let bare = &reg.partitions[""];
        assert_eq!(names(&bare[&0]), vec!["A", "B"]);
    }

    #[test]
    fn test_partition_index_must_be_integer() {
        let err = animals_from_table(&table(&["name", "partition x"], &[&["A", "one"]]))
            .unwrap_err();
        assert!(matches!(err, MetaError::MalformedValue { row: 0, .. }));
    }

    #[test]
    fn test_deceased_must_be_boolean() {
        let err = animals_from_table(&table(&["name", "deceased"], &[&["A", "maybe"]]))
            .unwrap_err();
        assert!(matches!(err, MetaError::MalformedValue { ref column, .. } if column == "deceased"));
    }
}
