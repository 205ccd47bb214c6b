//! Rule tables for brittle crack arrest measures.
//!
//! Table 8.2.1 decides which of Measures 1 to 5 apply for a governing yield
//! strength and plate thickness. Table 8.2.2 assigns the brittle crack arrest
//! steel type per member category, yield strength and thickness. Both are
//! plain data: a new revision of the rules is a new [`RuleTable`] value,
//! passed to the engine explicitly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::RuleTableError;

/// Label of the built-in table revision.
pub const TABLE_REVISION: &str = "LR-8.2-2024.1";

/// Applicability of a single measure in a Table 8.2.1 row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureRequirement {
    /// The measure is required.
    Required,
    /// The measure depends on the Measure 3 option (Note 2 of the table).
    SeeNote2,
    /// The measure is not required.
    NotRequired,
}

use MeasureRequirement::{NotRequired as N, Required as R, SeeNote2 as N2};

/// Thickness range with an exclusive lower and inclusive upper bound.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThicknessRange {
    /// Exclusive lower bound in millimetres.
    pub min_exclusive: f64,
    /// Inclusive upper bound in millimetres.
    pub max_inclusive: f64,
}

impl ThicknessRange {
    /// Create a range `min < t <= max`.
    #[must_use]
    pub const fn new(min_exclusive: f64, max_inclusive: f64) -> Self {
        Self {
            min_exclusive,
            max_inclusive,
        }
    }

    /// Return `true` when `thickness` lies inside the range.
    ///
    /// # Examples
    /// ```
    /// use coamingx::ThicknessRange;
    ///
    /// let range = ThicknessRange::new(65.0, 85.0);
    /// assert!(range.contains(85.0));
    /// assert!(!range.contains(65.0));
    /// ```
    #[must_use]
    pub fn contains(&self, thickness: f64) -> bool {
        self.min_exclusive < thickness && thickness <= self.max_inclusive
    }
}

impl fmt::Display for ThicknessRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<t<={}", self.min_exclusive, self.max_inclusive)
    }
}

/// One row of Table 8.2.1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table821Row {
    /// Yield band in N/mm².
    pub yield_strength_nmm2: u32,
    /// Thickness range covered by the row.
    pub thickness: ThicknessRange,
    /// Applicability of Measures 1 to 5, in order.
    pub measures: [MeasureRequirement; 5],
}

impl Table821Row {
    /// Applicability of measure `id` (1 to 5).
    #[must_use]
    pub fn requirement(&self, id: u8) -> Option<MeasureRequirement> {
        match id {
            1..=5 => Some(self.measures[usize::from(id - 1)]),
            _ => None,
        }
    }

    /// Measure ids carrying the given applicability, ascending.
    #[must_use]
    pub fn measures_with(&self, requirement: MeasureRequirement) -> Vec<u8> {
        (1..=5u8)
            .filter(|id| self.requirement(*id) == Some(requirement))
            .collect()
    }

    /// Human-readable row label, e.g. `YS=390, 85<t<=100`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("YS={}, {}", self.yield_strength_nmm2, self.thickness)
    }
}

/// Brittle crack arrest steel type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BcaType {
    /// Standard crack arrest toughness.
    #[serde(rename = "BCA1")]
    Bca1,
    /// Higher crack arrest toughness.
    #[serde(rename = "BCA2")]
    Bca2,
}

impl fmt::Display for BcaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bca1 => f.write_str("BCA1"),
            Self::Bca2 => f.write_str("BCA2"),
        }
    }
}

/// Member group a Table 8.2.2 row applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberCategory {
    /// Upper deck plating in the cargo hold region.
    UpperDeck,
    /// Side plate of the longitudinal hatch coaming.
    HatchCoamingSide,
}

impl fmt::Display for MemberCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpperDeck => f.write_str("upper_deck"),
            Self::HatchCoamingSide => f.write_str("hatch_coaming_side"),
        }
    }
}

/// One row of Table 8.2.2.
///
/// A row covers one member category, the steels at or above `min_yield_nmm2`
/// and one thickness range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table822Row {
    /// Member group the row applies to.
    pub member_category: MemberCategory,
    /// Lowest yield strength the row applies to in N/mm².
    pub min_yield_nmm2: u32,
    /// Thickness range covered by the row.
    pub thickness: ThicknessRange,
    /// Required steel type.
    pub bca_type: BcaType,
}

/// Built-in Table 8.2.1.
pub const TABLE_821: &[Table821Row] = &[
    row(355, 50.0, 65.0, [N, N, N, N, N]),
    row(355, 65.0, 85.0, [R, N, N, N, N]),
    row(355, 85.0, 100.0, [R, N2, R, R, N]),
    row(390, 50.0, 65.0, [R, N, N, N, N]),
    row(390, 65.0, 85.0, [R, N2, R, R, N]),
    row(390, 85.0, 100.0, [R, N2, R, R, R]),
    row(460, 50.0, 85.0, [R, N2, R, R, R]),
    row(460, 85.0, 100.0, [R, N2, R, R, R]),
];

/// Built-in Table 8.2.2.
pub const TABLE_822: &[Table822Row] = &[
    bca(MemberCategory::UpperDeck, 0, BcaType::Bca1),
    bca(MemberCategory::UpperDeck, 390, BcaType::Bca2),
    bca(MemberCategory::HatchCoamingSide, 0, BcaType::Bca1),
    bca(MemberCategory::HatchCoamingSide, 390, BcaType::Bca2),
];

/// Shorthand for a Table 8.2.2 row covering the whole table thickness.
const fn bca(
    member_category: MemberCategory,
    min_yield_nmm2: u32,
    bca_type: BcaType,
) -> Table822Row {
    Table822Row {
        member_category,
        min_yield_nmm2,
        thickness: ThicknessRange::new(0.0, 100.0),
        bca_type,
    }
}

/// Shorthand for building the constant table.
const fn row(
    yield_strength_nmm2: u32,
    min_exclusive: f64,
    max_inclusive: f64,
    measures: [MeasureRequirement; 5],
) -> Table821Row {
    Table821Row {
        yield_strength_nmm2,
        thickness: ThicknessRange::new(min_exclusive, max_inclusive),
        measures,
    }
}

/// A versioned pair of Tables 8.2.1 and 8.2.2.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    /// Revision label echoed in every evaluation result.
    pub revision: String,
    /// Applicability matrix.
    pub table_821: Vec<Table821Row>,
    /// Steel type matrix.
    pub table_822: Vec<Table822Row>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleTable {
    /// The built-in revision [`TABLE_REVISION`].
    ///
    /// # Examples
    /// ```
    /// use coamingx::{RuleTable, TABLE_REVISION};
    ///
    /// let table = RuleTable::builtin();
    /// assert_eq!(table.revision, TABLE_REVISION);
    /// assert_eq!(table.yield_bands(), vec![355, 390, 460]);
    /// ```
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            revision: TABLE_REVISION.to_string(),
            table_821: TABLE_821.to_vec(),
            table_822: TABLE_822.to_vec(),
        }
    }

    /// Parse and validate a table revision from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTableError::Json`] when the document cannot be parsed and the
    /// other variants of [`RuleTableError`] when [`RuleTable::validate`] fails.
    pub fn from_json(text: &str) -> Result<Self, RuleTableError> {
        let table: Self =
            serde_json::from_str(text).map_err(|source| RuleTableError::Json { source })?;
        table.validate()?;
        Ok(table)
    }

    /// Check that both tables are populated and that Table 8.2.1 ranges are
    /// well formed and disjoint within each yield band.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleTableError`] found.
    pub fn validate(&self) -> Result<(), RuleTableError> {
        if self.table_821.is_empty() {
            return Err(RuleTableError::Empty { table: "8.2.1" });
        }
        if self.table_822.is_empty() {
            return Err(RuleTableError::Empty { table: "8.2.2" });
        }
        let ranges = self
            .table_821
            .iter()
            .map(|row| (row.yield_strength_nmm2, row.thickness))
            .chain(
                self.table_822
                    .iter()
                    .map(|row| (row.min_yield_nmm2, row.thickness)),
            );
        for (yield_strength, range) in ranges {
            if !range.min_exclusive.is_finite()
                || !range.max_inclusive.is_finite()
                || range.min_exclusive >= range.max_inclusive
            {
                return Err(RuleTableError::InvalidRange {
                    yield_strength,
                    min: range.min_exclusive,
                    max: range.max_inclusive,
                });
            }
        }
        for band in self.yield_bands() {
            let mut ranges: Vec<ThicknessRange> = self
                .band_rows(band)
                .map(|row| row.thickness)
                .collect();
            ranges.sort_by(|a, b| a.min_exclusive.total_cmp(&b.min_exclusive));
            for pair in ranges.windows(2) {
                if pair[1].min_exclusive < pair[0].max_inclusive {
                    return Err(RuleTableError::OverlappingRange {
                        yield_strength: band,
                        at: pair[1].min_exclusive,
                    });
                }
            }
        }
        Ok(())
    }

    /// Distinct yield bands of Table 8.2.1, ascending.
    #[must_use]
    pub fn yield_bands(&self) -> Vec<u32> {
        let mut bands: Vec<u32> = self
            .table_821
            .iter()
            .map(|row| row.yield_strength_nmm2)
            .collect();
        bands.sort_unstable();
        bands.dedup();
        bands
    }

    /// Rows of one yield band in table order.
    fn band_rows(&self, yield_strength: u32) -> impl Iterator<Item = &Table821Row> {
        self.table_821
            .iter()
            .filter(move |row| row.yield_strength_nmm2 == yield_strength)
    }

    /// Find the row whose band equals `yield_strength` and whose range contains `thickness`.
    #[must_use]
    pub fn lookup_821(&self, yield_strength: u32, thickness: f64) -> Option<&Table821Row> {
        self.band_rows(yield_strength)
            .find(|row| row.thickness.contains(thickness))
    }

    /// Upper bound of the highest range defined for a yield band.
    #[must_use]
    pub fn band_ceiling(&self, yield_strength: u32) -> Option<f64> {
        self.band_rows(yield_strength)
            .map(|row| row.thickness.max_inclusive)
            .reduce(f64::max)
    }

    /// The row with the highest range of a yield band.
    #[must_use]
    pub fn top_row(&self, yield_strength: u32) -> Option<&Table821Row> {
        self.band_rows(yield_strength).reduce(|top, row| {
            if row.thickness.max_inclusive > top.thickness.max_inclusive {
                row
            } else {
                top
            }
        })
    }

    /// Steel type required by Table 8.2.2 for a member of `category`.
    ///
    /// Among the rows of the category whose range contains `thickness`, the
    /// one with the highest `min_yield_nmm2` not exceeding the yield wins.
    ///
    /// # Examples
    /// ```
    /// use coamingx::{BcaType, MemberCategory, RuleTable};
    ///
    /// let table = RuleTable::builtin();
    /// assert_eq!(table.bca_type(MemberCategory::UpperDeck, 355, 80.0), Some(BcaType::Bca1));
    /// assert_eq!(table.bca_type(MemberCategory::HatchCoamingSide, 390, 90.0), Some(BcaType::Bca2));
    /// assert_eq!(table.bca_type(MemberCategory::HatchCoamingSide, 390, 120.0), None);
    /// ```
    #[must_use]
    pub fn bca_type(
        &self,
        category: MemberCategory,
        yield_strength: u32,
        thickness: f64,
    ) -> Option<BcaType> {
        self.table_822
            .iter()
            .filter(|row| {
                row.member_category == category
                    && row.min_yield_nmm2 <= yield_strength
                    && row.thickness.contains(thickness)
            })
            .max_by_key(|row| row.min_yield_nmm2)
            .map(|row| row.bca_type)
    }
}
