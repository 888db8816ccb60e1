use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{MetaError, Result};
use crate::liquid::{Liquid, Liquids};
use crate::schema::bottles;
use crate::table::Table;

static LOCATION_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<kind>corner|side)\s*(?P<number>\d+)\s*$").expect("valid regex")
});

/// A liquid as named by a bottles cell.
#[derive(Debug, Clone, PartialEq)]
pub enum LiquidRef {
    Known(Arc<Liquid>),
    Unresolved(String),
}

impl LiquidRef {
    pub fn resolve(token: &str, liquids: Option<&Liquids>) -> Self {
        match liquids.and_then(|l| l.get(token)) {
            Some(found) => LiquidRef::Known(Arc::clone(found)),
            None => LiquidRef::Unresolved(token.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LiquidRef::Known(l) => &l.name,
            LiquidRef::Unresolved(token) => token,
        }
    }

    pub fn liquid(&self) -> Option<&Arc<Liquid>> {
        match self {
            LiquidRef::Known(l) => Some(l),
            LiquidRef::Unresolved(_) => None,
        }
    }
}

impl fmt::Display for LiquidRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One bottle arrangement: which liquid sits at which corner and side.
///
/// Corner `n` covers sides `2n - 1` and `2n`. Every side is written once.
#[derive(Debug, Clone, PartialEq)]
pub struct Bottles {
    pub name: String,
    pub corners: BTreeMap<u32, LiquidRef>,
    pub sides: BTreeMap<u32, LiquidRef>,
}

/// Bottle arrangements by lowercased name.
pub type BottleSets = HashMap<String, Arc<Bottles>>;

impl Bottles {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            corners: BTreeMap::new(),
            sides: BTreeMap::new(),
        }
    }

    pub fn add_side(&mut self, side: u32, liquid: LiquidRef) -> Result<()> {
        if self.sides.contains_key(&side) {
            return Err(self.side_conflict(side));
        }
        self.sides.insert(side, liquid);
        Ok(())
    }

    /// Place a liquid at a corner. Both of its sides are checked before
    /// either is written.
    pub fn add_corner(&mut self, corner: u32, liquid: LiquidRef) -> Result<()> {
        let Some((left, right)) = corner_sides(corner) else {
            return Err(MetaError::BadColumn {
                table: self.name.clone(),
                column: format!("{} {corner}", bottles::CORNER),
            });
        };
        if self.corners.contains_key(&corner) {
            return Err(MetaError::CornerConflict {
                bottles: self.name.clone(),
                corner,
            });
        }
        for side in [left, right] {
            if self.sides.contains_key(&side) {
                return Err(self.side_conflict(side));
            }
        }

        self.sides.insert(left, liquid.clone());
        self.sides.insert(right, liquid.clone());
        self.corners.insert(corner, liquid);
        Ok(())
    }

    pub fn side(&self, side: u32) -> Option<&LiquidRef> {
        self.sides.get(&side)
    }

    pub fn corner(&self, corner: u32) -> Option<&LiquidRef> {
        self.corners.get(&corner)
    }

    fn side_conflict(&self, side: u32) -> MetaError {
        MetaError::SideConflict {
            bottles: self.name.clone(),
            side,
        }
    }
}

/// Sides covered by a corner; `None` for corner 0 or when side `2n`
/// does not fit in a `u32`.
pub fn corner_sides(corner: u32) -> Option<(u32, u32)> {
    let right = corner.checked_mul(2)?;
    Some((right.checked_sub(1)?, right))
}

const LABELS: [&str; 1] = [bottles::NAME];

/// Load the bottles table; `None` when the file is absent.
pub fn load_bottles(path: &Path, liquids: Option<&Liquids>) -> Result<Option<BottleSets>> {
    match Table::read(path)? {
        Some(table) => bottles_from_table(&table, liquids).map(Some),
        None => Ok(None),
    }
}

pub fn bottles_from_table(table: &Table, liquids: Option<&Liquids>) -> Result<BottleSets> {
    let mut result = BottleSets::new();
    for row in table.rows(&LABELS) {
        let mut instance = Bottles::new(row.field(bottles::NAME));

        for (column, cell) in row.extras() {
            let key = column.to_lowercase();
            let Some(caps) = LOCATION_COLUMN.captures(&key) else {
                let trimmed = key.trim_start();
                if trimmed.starts_with(bottles::CORNER) || trimmed.starts_with(bottles::SIDE) {
                    return Err(MetaError::BadColumn {
                        table: table.name().to_string(),
                        column: column.to_string(),
                    });
                }
                continue;
            };
            let number: u32 = caps["number"].parse().map_err(|_| MetaError::BadColumn {
                table: table.name().to_string(),
                column: column.to_string(),
            })?;

            let cell = cell.trim().to_lowercase();
            if cell.is_empty() {
                continue;
            }
            let liquid = LiquidRef::resolve(&cell, liquids);

            match &caps["kind"] {
                bottles::CORNER => instance.add_corner(number, liquid)?,
                _ => instance.add_side(number, liquid)?,
            }
        }

        result.insert(instance.name.clone(), Arc::new(instance));
    }
    Ok(result)
}
