use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::trace;

use crate::error::{MetaError, Result};
use crate::schema::liquid;
use crate::substance::{Substance, Substances};
use crate::table::Table;

/// `substance [unit]` column header, matched against the lowercased name.
static SUBSTANCE_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<substance>\S+)(?:\s+\[(?P<unit>\w+)\])?\s*$").expect("valid regex")
});

// ── Substance references ────────────────────────────────────────────────────

/// A substance as named by a liquid column: either found in the substance
/// registry or kept as the raw token.
#[derive(Debug, Clone, PartialEq)]
pub enum SubstanceRef {
    Known(Arc<Substance>),
    Unresolved(String),
}

impl SubstanceRef {
    pub fn resolve(token: &str, substances: Option<&Substances>) -> Self {
        match substances.and_then(|s| s.get(token)) {
            Some(found) => SubstanceRef::Known(Arc::clone(found)),
            None => SubstanceRef::Unresolved(token.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SubstanceRef::Known(s) => &s.name,
            SubstanceRef::Unresolved(token) => token,
        }
    }

    pub fn density(&self) -> Option<f64> {
        match self {
            SubstanceRef::Known(s) => s.density,
            SubstanceRef::Unresolved(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, SubstanceRef::Known(_))
    }
}

impl fmt::Display for SubstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Concentration ───────────────────────────────────────────────────────────

/// Amount of one substance in a liquid, with whatever derived quantities
/// could be computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Concentration {
    pub substance: SubstanceRef,
    pub amount: Option<f64>,
    /// Only kept when `amount` is set.
    pub unit: Option<String>,
    pub volume_concentration: Option<f64>,
    pub mass_fraction: Option<f64>,
}

impl Concentration {
    pub fn new(substance: SubstanceRef, amount: Option<f64>, unit: Option<String>) -> Self {
        let unit = amount.and(unit);
        Self {
            substance,
            amount,
            unit,
            volume_concentration: None,
            mass_fraction: None,
        }
    }

    /// The substance makes up the whole liquid.
    pub fn pure(substance: SubstanceRef) -> Self {
        Self::new(substance, None, None).with_fractions(Some(1.0), Some(1.0))
    }

    pub fn with_fractions(mut self, mass_fraction: Option<f64>, volume: Option<f64>) -> Self {
        self.mass_fraction = mass_fraction;
        self.volume_concentration = volume;
        self
    }

    /// A dissolved substance; the unit decides which fraction `amount` is
    /// and the other one is derived from densities when possible.
    fn solute(
        substance: SubstanceRef,
        amount: f64,
        unit: Option<String>,
        liquid_density: Option<f64>,
    ) -> Self {
        let (mass_fraction, volume) = match unit.as_deref() {
            Some(liquid::UNIT_VOLUME) => (
                ratio(Some(amount), substance.density(), liquid_density),
                Some(amount),
            ),
            Some(liquid::UNIT_MASS) => (
                Some(amount),
                ratio(Some(amount), liquid_density, substance.density()),
            ),
            _ => (None, None),
        };
        Self::new(substance, Some(amount), unit).with_fractions(mass_fraction, volume)
    }
}

impl fmt::Display for Concentration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.amount, &self.unit) {
            (None, _) => write!(f, "{}", self.substance),
            (Some(amount), None) => write!(f, "{} {:.6}", self.substance, amount),
            (Some(amount), Some(unit)) => write!(f, "{} {:.6} [{}]", self.substance, amount, unit),
        }
    }
}

/// `a * b / c`, or `None` when an operand is missing or the result is not finite.
fn ratio(a: Option<f64>, b: Option<f64>, c: Option<f64>) -> Option<f64> {
    let value = a? * b? / c?;
    value.is_finite().then_some(value)
}

// ── Solutes ─────────────────────────────────────────────────────────────────

/// Non-solvent substances of a liquid, keyed by substance name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solutes {
    entries: BTreeMap<String, Concentration>,
}

impl Solutes {
    fn from_pending(pending: Vec<PendingSolute>, liquid_density: Option<f64>) -> Self {
        let mut entries = BTreeMap::new();
        for (substance, amount, unit) in pending {
            let concentration = Concentration::solute(substance, amount, unit, liquid_density);
            entries.insert(concentration.substance.name().to_string(), concentration);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Concentration> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Concentration> {
        self.entries.values()
    }

    /// Sum of the solute mass fractions; `None` if any of them is unknown.
    fn total_mass_fraction(&self) -> Option<f64> {
        self.iter().map(|c| c.mass_fraction).sum()
    }
}

impl fmt::Display for Solutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, concentration) in self.entries.values().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{concentration}")?;
        }
        Ok(())
    }
}

// ── Liquid ──────────────────────────────────────────────────────────────────

/// `(substance, amount, unit)` collected from one liquid row.
pub type PendingSolute = (SubstanceRef, f64, Option<String>);

/// A named liquid: a solvent with dissolved solutes.
#[derive(Debug, Clone, PartialEq)]
pub struct Liquid {
    pub name: String,
    pub density: Option<f64>,
    pub solvent: Option<Concentration>,
    pub solutes: Solutes,
}

/// Liquids by lowercased name.
pub type Liquids = HashMap<String, Arc<Liquid>>;

impl Liquid {
    /// Assemble a liquid from its tagged solvent and numeric substance cells.
    ///
    /// A lone substance with no tagged solvent becomes the solvent. A tagged
    /// solvent gets the mass fraction left over by the solutes. Without
    /// solutes the liquid density follows the solvent's.
    pub fn build(
        name: &str,
        density: Option<f64>,
        solvent: Option<SubstanceRef>,
        mut pending: Vec<PendingSolute>,
    ) -> Result<Self> {
        let name = name.to_lowercase();

        let solvent = match solvent {
            None if pending.len() == 1 => pending.pop().map(|(substance, amount, unit)| {
                Concentration::new(substance, Some(amount), unit)
                    .with_fractions(Some(1.0), Some(1.0))
            }),
            None => None,
            Some(substance) if pending.is_empty() => Some(Concentration::pure(substance)),
            Some(substance) => Some(Concentration::new(substance, None, None)),
        };

        let solutes = Solutes::from_pending(pending, density);
        let mut liquid = Self {
            name,
            density,
            solvent,
            solutes,
        };
        liquid.balance_solvent();
        liquid.infer_density()?;
        Ok(liquid)
    }

    fn balance_solvent(&mut self) {
        if self.solutes.is_empty() {
            return;
        }
        let Some(solvent) = self.solvent.as_mut() else {
            return;
        };

        let mass_fraction = self.solutes.total_mass_fraction().map(|total| 1.0 - total);
        let volume = ratio(mass_fraction, self.density, solvent.substance.density());
        solvent.mass_fraction = mass_fraction;
        solvent.volume_concentration = volume;
    }

    fn infer_density(&mut self) -> Result<()> {
        if !self.solutes.is_empty() {
            return Ok(());
        }
        let Some(solvent) = &self.solvent else {
            return Ok(());
        };
        if !solvent.substance.is_known() {
            return Ok(());
        }

        let solvent_density = solvent.substance.density();
        match (self.density, solvent_density) {
            (None, inferred) => self.density = inferred,
            (Some(given), Some(expected)) if given != expected => {
                return Err(MetaError::DensityMismatch {
                    liquid: self.name.clone(),
                    liquid_density: given,
                    solvent_density: expected,
                });
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Display for Liquid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.solutes.is_empty() {
            write!(f, ": {}", self.solutes)?;
            if let Some(solvent) = &self.solvent {
                write!(f, " in {}", solvent.substance)?;
            }
        } else if let Some(solvent) = &self.solvent {
            write!(f, ": {}", solvent.substance)?;
        }
        Ok(())
    }
}

// ── Loading ─────────────────────────────────────────────────────────────────

const LABELS: [&str; 2] = [liquid::NAME, liquid::DENSITY];

/// Load the liquids table; `None` when the file is absent.
pub fn load_liquids(path: &Path, substances: Option<&Substances>) -> Result<Option<Liquids>> {
    match Table::read(path)? {
        Some(table) => liquids_from_table(&table, substances).map(Some),
        None => Ok(None),
    }
}

pub fn liquids_from_table(table: &Table, substances: Option<&Substances>) -> Result<Liquids> {
    let mut result = Liquids::new();
    for row in table.rows(&LABELS) {
        let name = row.field(liquid::NAME).to_lowercase();
        let density = row.opt_f64(liquid::DENSITY)?;

        let mut solvent: Option<SubstanceRef> = None;
        let mut pending = Vec::new();
        for (column, cell) in row.extras() {
            let key = column.to_lowercase();
            let Some(caps) = SUBSTANCE_COLUMN.captures(&key) else {
                continue;
            };
            let token = caps["substance"].trim();
            let unit = caps.name("unit").map(|u| u.as_str().trim().to_string());
            let substance = SubstanceRef::resolve(token, substances);

            let cell = cell.trim().to_lowercase();
            if liquid::SOLVENT_TOKENS.contains(&cell.as_str()) {
                if let Some(first) = &solvent {
                    return Err(MetaError::DuplicateSolvent {
                        liquid: name,
                        first: first.name().to_string(),
                        second: substance.name().to_string(),
                    });
                }
                solvent = Some(substance);
                continue;
            }

            match cell.parse::<f64>() {
                Ok(amount) => pending.push((substance, amount, unit)),
                Err(_) => trace!(liquid = %name, column, cell = %cell, "skipping non-numeric cell"),
            }
        }

        let instance = Liquid::build(&name, density, solvent, pending)?;
        result.insert(instance.name.clone(), Arc::new(instance));
    }
    Ok(result)
}
