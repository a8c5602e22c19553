//! Work-offset and tool-offset tables.
//!
//! Both tables are owned by the caller and handed to the kernel by shared
//! reference for the duration of a build. The kernel only ever reads them.
//!
//! On disk (inside a machine setup TOML, see [`crate::config`]) the tables
//! look like:
//!
//! ```toml
//! [work_offsets.G54]
//! x = 100.0
//! y = 50.0
//!
//! [[tool_offsets.length]]
//! register = 1
//! geometry = 50.0
//! wear = 0.2
//!
//! [[tool_offsets.diameter]]
//! register = 1
//! geometry = 10.0
//! wear = -0.02
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::position::Position;
use crate::error::KernelError;

/// Named coordinate-system translations (`G54`..`G59` or custom names).
///
/// A name that is absent from the table translates by zero. Names are
/// case-insensitive, including keys read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Position>",
    into = "BTreeMap<String, Position>"
)]
pub struct WorkOffsetTable {
    offsets: BTreeMap<String, Position>,
}

impl WorkOffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, convenient for tests and hosts assembling a
    /// table in code.
    pub fn with_offset(mut self, name: &str, translation: Position) -> Self {
        self.insert(name, translation);
        self
    }

    /// Inserts or replaces the translation for `name`. Names are stored
    /// uppercase so `g54` and `G54` address the same entry.
    pub fn insert(&mut self, name: &str, translation: Position) {
        self.offsets.insert(name.to_ascii_uppercase(), translation);
    }

    pub fn get(&self, name: &str) -> Option<&Position> {
        self.offsets.get(&name.to_ascii_uppercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The translation for `name`, or zero when the table has no entry.
    pub fn translation(&self, name: &str) -> Position {
        self.get(name).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// One H-register entry: tool length geometry and wear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LengthOffset {
    pub geometry: f64,
    #[serde(default)]
    pub wear: f64,
}

impl LengthOffset {
    /// Total applied length: geometry + wear.
    pub fn total(&self) -> f64 {
        self.geometry + self.wear
    }
}

/// One D-register entry: cutter diameter geometry and wear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiameterOffset {
    pub geometry: f64,
    #[serde(default)]
    pub wear: f64,
}

impl DiameterOffset {
    /// Total applied radius: (geometry + wear) / 2.
    pub fn radius(&self) -> f64 {
        (self.geometry + self.wear) / 2.0
    }
}

/// Parallel H (length) and D (diameter) register tables, 1-indexed.
///
/// Register 0 means "no compensation" and can never hold an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToolOffsetFile", into = "ToolOffsetFile")]
pub struct ToolOffsetTable {
    length: BTreeMap<u32, LengthOffset>,
    diameter: BTreeMap<u32, DiameterOffset>,
}

impl ToolOffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets H`register`. Fails for register 0.
    pub fn set_length(
        &mut self,
        register: u32,
        offset: LengthOffset,
    ) -> Result<(), KernelError> {
        check_register(register, 'H')?;
        self.length.insert(register, offset);
        Ok(())
    }

    /// Sets D`register`. Fails for register 0.
    pub fn set_diameter(
        &mut self,
        register: u32,
        offset: DiameterOffset,
    ) -> Result<(), KernelError> {
        check_register(register, 'D')?;
        self.diameter.insert(register, offset);
        Ok(())
    }

    pub fn length_entry(&self, register: u32) -> Option<&LengthOffset> {
        self.length.get(&register)
    }

    pub fn diameter_entry(&self, register: u32) -> Option<&DiameterOffset> {
        self.diameter.get(&register)
    }

    /// Total tool length for H`register`; 0 for register 0 or an empty slot.
    pub fn length(&self, register: u32) -> f64 {
        self.length_entry(register)
            .map(LengthOffset::total)
            .unwrap_or(0.0)
    }

    /// Cutter radius for D`register`; 0 for register 0 or an empty slot.
    pub fn radius(&self, register: u32) -> f64 {
        self.diameter_entry(register)
            .map(DiameterOffset::radius)
            .unwrap_or(0.0)
    }
}

fn check_register(register: u32, letter: char) -> Result<(), KernelError> {
    if register == 0 {
        return Err(KernelError::Config(format!(
            "{letter}0 is reserved for \"no compensation\" and cannot hold an offset"
        )));
    }
    Ok(())
}

// ── On-disk shape ─────────────────────────────────────────────────────────────

impl TryFrom<BTreeMap<String, Position>> for WorkOffsetTable {
    type Error = KernelError;

    fn try_from(file: BTreeMap<String, Position>) -> Result<Self, Self::Error> {
        let mut table = WorkOffsetTable::new();
        for (name, translation) in file {
            if table.contains(&name) {
                return Err(KernelError::Config(format!(
                    "{} is defined more than once",
                    name.to_ascii_uppercase()
                )));
            }
            table.insert(&name, translation);
        }
        Ok(table)
    }
}

impl From<WorkOffsetTable> for BTreeMap<String, Position> {
    fn from(table: WorkOffsetTable) -> Self {
        table.offsets
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct ToolOffsetFile {
    #[serde(default)]
    length: Vec<LengthRow>,
    #[serde(default)]
    diameter: Vec<DiameterRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LengthRow {
    register: u32,
    #[serde(flatten)]
    offset: LengthOffset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DiameterRow {
    register: u32,
    #[serde(flatten)]
    offset: DiameterOffset,
}

impl TryFrom<ToolOffsetFile> for ToolOffsetTable {
    type Error = KernelError;

    fn try_from(file: ToolOffsetFile) -> Result<Self, Self::Error> {
        let mut table = ToolOffsetTable::new();
        for row in file.length {
            if table.length.contains_key(&row.register) {
                return Err(KernelError::Config(format!(
                    "H{} is defined more than once",
                    row.register
                )));
            }
            table.set_length(row.register, row.offset)?;
        }
        for row in file.diameter {
            if table.diameter.contains_key(&row.register) {
                return Err(KernelError::Config(format!(
                    "D{} is defined more than once",
                    row.register
                )));
            }
            table.set_diameter(row.register, row.offset)?;
        }
        Ok(table)
    }
}

impl From<ToolOffsetTable> for ToolOffsetFile {
    fn from(table: ToolOffsetTable) -> Self {
        ToolOffsetFile {
            length: table
                .length
                .into_iter()
                .map(|(register, offset)| LengthRow { register, offset })
                .collect(),
            diameter: table
                .diameter
                .into_iter()
                .map(|(register, offset)| DiameterRow { register, offset })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── work offsets ─────────────────────────────────────────────────────────

    #[test]
    fn missing_work_offset_translates_by_zero() {
        let table = WorkOffsetTable::new();
        assert_eq!(table.translation("G55"), Position::zero());
        assert!(!table.contains("G55"));
    }

    #[test]
    fn work_offset_names_are_case_insensitive() {
        let table = WorkOffsetTable::new().with_offset("g55", Position::new(1.0, 2.0, 3.0));
        assert_eq!(table.translation("G55"), Position::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn work_offsets_parse_from_toml_with_partial_axes() {
        let table: WorkOffsetTable =
            toml::from_str("[G54]\nx = 100.0\ny = 50.0\n\n[FIXTURE_2]\nz = -10.0\na = 90.0")
                .expect("parse work offsets");
        assert_eq!(table.translation("G54"), Position::new(100.0, 50.0, 0.0));
        let fixture = table.translation("FIXTURE_2");
        assert_eq!(fixture.z, -10.0);
        assert_eq!(fixture.a, 90.0);
    }

    #[test]
    fn lowercase_toml_keys_match_uppercase_lookups() {
        let table: WorkOffsetTable =
            toml::from_str("[g55]\nx = 10.0").expect("parse work offsets");
        assert_eq!(table.translation("G55"), Position::new(10.0, 0.0, 0.0));
        assert!(table.contains("g55"));
    }

    #[test]
    fn work_offset_names_colliding_by_case_are_rejected() {
        let err = toml::from_str::<WorkOffsetTable>("[g55]\nx = 1.0\n\n[G55]\nx = 2.0")
            .expect_err("g55 and G55 collide");
        assert!(err.to_string().contains("G55 is defined more than once"), "{err}");
    }

    // ── tool offsets ─────────────────────────────────────────────────────────

    #[test]
    fn length_is_geometry_plus_wear() {
        let mut table = ToolOffsetTable::new();
        table
            .set_length(
                1,
                LengthOffset {
                    geometry: 50.0,
                    wear: 0.2,
                },
            )
            .expect("set H1");
        assert!((table.length(1) - 50.2).abs() < 1e-12);
    }

    #[test]
    fn radius_is_half_of_diameter_geometry_plus_wear() {
        let mut table = ToolOffsetTable::new();
        table
            .set_diameter(
                3,
                DiameterOffset {
                    geometry: 10.0,
                    wear: -0.02,
                },
            )
            .expect("set D3");
        assert!((table.radius(3) - 4.99).abs() < 1e-12);
    }

    #[test]
    fn register_zero_is_rejected() {
        let mut table = ToolOffsetTable::new();
        let err = table
            .set_length(0, LengthOffset::default())
            .expect_err("H0 must be rejected");
        assert!(matches!(err, KernelError::Config(_)));
        assert!(err.to_string().contains("H0"));
    }

    #[test]
    fn empty_registers_read_as_zero() {
        let table = ToolOffsetTable::new();
        assert_eq!(table.length(0), 0.0);
        assert_eq!(table.length(7), 0.0);
        assert_eq!(table.radius(7), 0.0);
    }

    #[test]
    fn tool_offsets_parse_from_toml_rows() {
        let toml_str = r#"
[[length]]
register = 1
geometry = 50.0
wear = 0.2

[[length]]
register = 2
geometry = 75.5

[[diameter]]
register = 1
geometry = 6.0
"#;
        let table: ToolOffsetTable = toml::from_str(toml_str).expect("parse tool offsets");
        assert!((table.length(1) - 50.2).abs() < 1e-12);
        assert_eq!(table.length(2), 75.5);
        assert_eq!(table.radius(1), 3.0);
    }

    #[test]
    fn duplicate_register_rows_are_rejected() {
        let toml_str = "[[length]]\nregister = 4\ngeometry = 1.0\n\n[[length]]\nregister = 4\ngeometry = 2.0\n";
        let result: Result<ToolOffsetTable, _> = toml::from_str(toml_str);
        let err = result.expect_err("duplicate H4 must fail");
        assert!(err.to_string().contains("H4"));
    }
}
