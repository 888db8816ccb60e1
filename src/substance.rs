use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::schema::substance;
use crate::table::Table;

/// A named chemical substance. Names are stored lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct Substance {
    pub name: String,
    pub molar_mass: Option<f64>,
    pub density: Option<f64>,
}

/// Substances by lowercased name.
pub type Substances = HashMap<String, Arc<Substance>>;

impl Substance {
    pub fn new(name: &str, molar_mass: Option<f64>, density: Option<f64>) -> Self {
        Self {
            name: name.to_lowercase(),
            molar_mass,
            density,
        }
    }
}

impl fmt::Display for Substance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

const LABELS: [&str; 3] = [substance::NAME, substance::MOLAR_MASS, substance::DENSITY];

/// Load the substances table; `None` when the file is absent.
pub fn load_substances(path: &Path) -> Result<Option<Substances>> {
    match Table::read(path)? {
        Some(table) => substances_from_table(&table).map(Some),
        None => Ok(None),
    }
}

pub fn substances_from_table(table: &Table) -> Result<Substances> {
    let mut result = Substances::new();
    for row in table.rows(&LABELS) {
        let instance = Substance::new(
            row.field(substance::NAME),
            row.opt_f64(substance::MOLAR_MASS)?,
            row.opt_f64(substance::DENSITY)?,
        );
        result.insert(instance.name.clone(), Arc::new(instance));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetaError;

    fn table(rows: &[[&str; 3]]) -> Table {
        Table::new(
            "substances.csv",
            vec!["name".into(), "molar mass".into(), "density".into()],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_names_lowercased_and_numbers_optional() {
        let subs = substances_from_table(&table(&[
            ["Water", "18.01528", "1.0"],
            ["Sucrose", "", ""],
        ]))
        .unwrap();

        assert_eq!(subs.len(), 2);
        let water = &subs["water"];
        assert_eq!(water.molar_mass, Some(18.01528));
        assert_eq!(water.density, Some(1.0));
        assert_eq!(water.to_string(), "water");

        let sucrose = &subs["sucrose"];
        assert_eq!(sucrose.molar_mass, None);
        assert_eq!(sucrose.density, None);
    }

    #[test]
    fn test_malformed_density_is_fatal() {
        let err = substances_from_table(&table(&[["water", "18", "dense"]])).unwrap_err();
        assert!(matches!(err, MetaError::MalformedValue { ref column, .. } if column == "density"));
    }

    #[test]
    fn test_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_substances(&dir.path().join("substances.csv"))
            .unwrap()
            .is_none());
    }
}
