//! Stimulus table reader.
//!
//! A dataset is a CSV file with one row per block. Rows are grouped by
//! stimulus name (and by ratio, for datasets with size variants) and handed
//! to the geometry instancer as a [`StimulusSpec`].
//!
//! # Columns
//!
//! | column | meaning |
//! |--------|---------|
//! | `name` | stimulus id |
//! | `object` | block id, unique within a stimulus |
//! | `pos_x`, `pos_y`, `pos_z` | block center |
//! | `quat_w`, `quat_x`, `quat_y`, `quat_z` | orientation |
//! | `scale_x`, `scale_y`, `scale_z` | full box extents |
//! | `mass`, `friction`, `restitution` | rigid-body parameters |
//! | `blocktype` | optional, 0 or 1 |
//! | `ratio` | optional size-variant key |

use crate::error::TableError;
use glam::{DQuat, DVec3};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every table must carry.
pub const REQUIRED_COLUMNS: [&str; 15] = [
    "name",
    "object",
    "pos_x",
    "pos_y",
    "pos_z",
    "quat_w",
    "quat_x",
    "quat_y",
    "quat_z",
    "scale_x",
    "scale_y",
    "scale_z",
    "mass",
    "friction",
    "restitution",
];

/// One raw table row.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StimulusRow {
    pub name: String,
    pub object: String,
    pub pos_x: f64,
    pub pos_y: f64,
    pub pos_z: f64,
    pub quat_w: f64,
    pub quat_x: f64,
    pub quat_y: f64,
    pub quat_z: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
    pub mass: f64,
    pub friction: f64,
    pub restitution: f64,
    #[serde(default)]
    pub blocktype: Option<f64>,
    #[serde(default)]
    pub ratio: Option<String>,
}

/// Binary visual theme label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// Label `0`.
    Zero,
    /// Label `1`.
    One,
}

impl BlockType {
    fn from_cell(object: &str, value: f64) -> Result<Self, TableError> {
        if value == 0.0 {
            Ok(BlockType::Zero)
        } else if value == 1.0 {
            Ok(BlockType::One)
        } else {
            Err(TableError::InvalidBlockType {
                object: object.to_string(),
                value,
            })
        }
    }

    /// The numeric label.
    pub fn index(self) -> usize {
        match self {
            BlockType::Zero => 0,
            BlockType::One => 1,
        }
    }
}

/// Per-block fields of a stimulus, with the scale already halved.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub position: DVec3,
    pub rotation: DQuat,
    /// Half extents.
    pub scale: DVec3,
    pub mass: f64,
    pub friction: f64,
    pub restitution: f64,
    pub blocktype: Option<BlockType>,
    pub ratio: Option<String>,
}

impl BlockSpec {
    /// Build from a raw row, halving the table's full extents.
    pub fn from_row(row: &StimulusRow) -> Result<Self, TableError> {
        let blocktype = row
            .blocktype
            .map(|v| BlockType::from_cell(&row.object, v))
            .transpose()?;
        Ok(Self {
            position: DVec3::new(row.pos_x, row.pos_y, row.pos_z),
            // Table order is w, x, y, z
            rotation: DQuat::from_xyzw(row.quat_x, row.quat_y, row.quat_z, row.quat_w),
            scale: DVec3::new(row.scale_x, row.scale_y, row.scale_z) / 2.0,
            mass: row.mass,
            friction: row.friction,
            restitution: row.restitution,
            blocktype,
            ratio: row.ratio.clone(),
        })
    }
}

/// All blocks of one stimulus (or one ratio variant), keyed by object name.
///
/// Keys iterate in lexicographic order; the first key is the base block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StimulusSpec {
    pub name: String,
    pub ratio: Option<String>,
    pub blocks: BTreeMap<String, BlockSpec>,
}

impl StimulusSpec {
    /// Object names in processing order.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    /// Number of blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if the stimulus has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// A loaded dataset table.
#[derive(Debug, Clone, Default)]
pub struct StimulusTable {
    rows: Vec<StimulusRow>,
    has_ratio: bool,
}

impl StimulusTable {
    /// Load a table from a CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Parse a table from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = csv.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(TableError::MissingColumn(column));
            }
        }
        let has_ratio = headers.iter().any(|h| h == "ratio");

        let rows = csv
            .deserialize::<StimulusRow>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rows, has_ratio })
    }

    /// Build a table from rows already in memory.
    pub fn from_rows(rows: Vec<StimulusRow>) -> Self {
        let has_ratio = rows.iter().any(|r| r.ratio.is_some());
        Self { rows, has_ratio }
    }

    /// All rows, in file order.
    pub fn rows(&self) -> &[StimulusRow] {
        &self.rows
    }

    /// True if the table carries a `ratio` column.
    pub fn has_ratio(&self) -> bool {
        self.has_ratio
    }

    /// Distinct stimulus names, in first-appearance order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !names.contains(&row.name.as_str()) {
                names.push(&row.name);
            }
        }
        names
    }

    /// Distinct ratio keys for a stimulus, in first-appearance order.
    ///
    /// Tables without a ratio column yield a single `None` variant.
    pub fn ratios(&self, name: &str) -> Vec<Option<String>> {
        if !self.has_ratio {
            return vec![None];
        }
        let mut ratios: Vec<Option<String>> = Vec::new();
        for row in self.rows.iter().filter(|r| r.name == name) {
            if !ratios.contains(&row.ratio) {
                ratios.push(row.ratio.clone());
            }
        }
        ratios
    }

    /// Group the rows of one stimulus (and ratio) into a spec.
    pub fn spec(&self, name: &str, ratio: Option<&str>) -> Result<StimulusSpec, TableError> {
        let mut blocks = BTreeMap::new();
        let matching = self
            .rows
            .iter()
            .filter(|r| r.name == name)
            .filter(|r| !self.has_ratio || r.ratio.as_deref() == ratio);

        for row in matching {
            let block = BlockSpec::from_row(row)?;
            if blocks.insert(row.object.clone(), block).is_some() {
                return Err(TableError::DuplicateObject {
                    name: name.to_string(),
                    object: row.object.clone(),
                });
            }
        }

        if blocks.is_empty() {
            return Err(TableError::MissingData {
                name: name.to_string(),
                ratio: ratio.map(str::to_string),
            });
        }

        Ok(StimulusSpec {
            name: name.to_string(),
            ratio: ratio.map(str::to_string),
            blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "name,object,pos_x,pos_y,pos_z,quat_w,quat_x,quat_y,quat_z,scale_x,scale_y,scale_z,mass,friction,restitution";

    fn table(body: &str) -> Result<StimulusTable, TableError> {
        StimulusTable::from_reader(format!("{HEADER}\n{body}").as_bytes())
    }

    #[test]
    fn test_groups_and_sorts_objects() {
        let t = table(
            "s1,block_2,0,0,2,1,0,0,0,2,2,2,1,0.8,0\n\
             s1,block_0,0,0,0,1,0,0,0,2,2,2,1,0.8,0\n\
             s2,block_0,0,0,0,1,0,0,0,2,2,2,1,0.8,0\n\
             s1,block_1,0,0,1,1,0,0,0,2,2,2,1,0.8,0",
        )
        .unwrap();

        assert_eq!(t.names(), vec!["s1", "s2"]);
        assert_eq!(t.ratios("s1"), vec![None]);

        let spec = t.spec("s1", None).unwrap();
        let names: Vec<_> = spec.object_names().collect();
        assert_eq!(names, vec!["block_0", "block_1", "block_2"]);
    }

    #[test]
    fn test_scale_is_halved() {
        let t = table("s,a,0,0,0,1,0,0,0,2,2,2,1,0.5,0").unwrap();
        let spec = t.spec("s", None).unwrap();
        assert_eq!(spec.blocks["a"].scale, DVec3::ONE);
    }

    #[test]
    fn test_quaternion_wxyz_order() {
        let t = table("s,a,0,0,0,0.5,0.1,0.2,0.3,1,1,1,1,0.5,0").unwrap();
        let q = t.spec("s", None).unwrap().blocks["a"].rotation;
        assert_eq!((q.w, q.x, q.y, q.z), (0.5, 0.1, 0.2, 0.3));
    }

    #[test]
    fn test_missing_column() {
        let csv = "name,object,pos_x\ns,a,0";
        let err = StimulusTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn("pos_y")));
    }

    #[test]
    fn test_missing_stimulus() {
        let t = table("s,a,0,0,0,1,0,0,0,1,1,1,1,0.5,0").unwrap();
        assert!(matches!(t.spec("nope", None), Err(TableError::MissingData { .. })));
    }

    #[test]
    fn test_malformed_row() {
        assert!(matches!(
            table("s,a,zero,0,0,1,0,0,0,1,1,1,1,0.5,0"),
            Err(TableError::Csv(_))
        ));
    }

    #[test]
    fn test_duplicate_object() {
        let t = table(
            "s,a,0,0,0,1,0,0,0,1,1,1,1,0.5,0\n\
             s,a,0,0,1,1,0,0,0,1,1,1,1,0.5,0",
        )
        .unwrap();
        assert!(matches!(t.spec("s", None), Err(TableError::DuplicateObject { .. })));
    }

    #[test]
    fn test_ratio_variants_and_blocktype() {
        let csv = format!(
            "{HEADER},blocktype,ratio\n\
             s,a,0,0,0,1,0,0,0,1,1,1,1,0.5,0,0,1\n\
             s,b,0,0,1,1,0,0,0,1,1,1,1,0.5,0,1,1\n\
             s,a,0,0,0,1,0,0,0,1,1,1,2,0.5,0,0,4\n"
        );
        let t = StimulusTable::from_reader(csv.as_bytes()).unwrap();
        assert!(t.has_ratio());
        assert_eq!(t.ratios("s"), vec![Some("1".to_string()), Some("4".to_string())]);

        let small = t.spec("s", Some("1")).unwrap();
        assert_eq!(small.len(), 2);
        assert_eq!(small.blocks["b"].blocktype, Some(BlockType::One));

        let big = t.spec("s", Some("4")).unwrap();
        assert_eq!(big.len(), 1);
        assert_eq!(big.blocks["a"].mass, 2.0);

        assert!(t.spec("s", Some("9")).is_err());
    }

    #[test]
    fn test_invalid_blocktype() {
        let csv = format!("{HEADER},blocktype\ns,a,0,0,0,1,0,0,0,1,1,1,1,0.5,0,2\n");
        let t = StimulusTable::from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(t.spec("s", None), Err(TableError::InvalidBlockType { .. })));
    }
}
