//! Metadata tables shared by the file-backed tests.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::metadata::Metadata;

const SUBSTANCES: &str = "\
name,molar mass,density
Water,18.015,1.0
sucrose,342.3,1.59
saccharin,183.18,
";

const LIQUIDS: &str = "\
name,density,water,sucrose [mass],saccharin [volume]
Water,,100,,
Sucrose 10%,1.04,solvent,0.1,
Saccharin,,medium,,0.001
";

const BOTTLES: &str = "\
name,corner 1,corner 2,side 5,side 6,corner 4
Standard,water,water,sucrose 10%,water,saccharin
Sweet,sucrose 10%,sucrose 10%,,,
";

const ANIMALS: &str = "\
name,weight,deceased,group,partition halves,Group Males
Mickey,21.5,,Control,1,x
Minnie,19.0,,Treated,2,
Jerry,22.0,1,Control,1,x
Tom,,,Treated,2,x
";

const PHASES: &str = "\
start,end,name,type,iteration,partition,comments,cage 1,cage 2
2012-12-18 12:00,2012-12-19 12:00,Adaptation,,,halves,,standard,standard
2012-12-19 12:00,2012-12-20 12:00,,NP,1,halves,,standard,sweet
2012-12-20 12:00,2012-12-21 12:00,,NP,1,halves,swap,sweet,standard
2012-12-21 12:00,2012-12-22 12:00,,,,,,,
";

pub fn write(root: &Path) {
    for (file, content) in [
        ("substances.csv", SUBSTANCES),
        ("liquids.csv", LIQUIDS),
        ("bottles.csv", BOTTLES),
        ("animals.csv", ANIMALS),
        ("phases.csv", PHASES),
    ] {
        fs::write(root.join(file), content).unwrap();
    }
}

pub fn load() -> (TempDir, Metadata) {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path());
    let metadata = Metadata::load(dir.path()).unwrap();
    (dir, metadata)
}
