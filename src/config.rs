//! Numeric policy settings injected into the engine next to the rule table.

use serde::{Deserialize, Serialize};

use crate::errors::OptionsError;

/// What the global lookup does when `t_control` exceeds the highest range of its yield band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AboveCeilingPolicy {
    /// Use the topmost row of the band and flag the extrapolation.
    TopBand,
    /// Report no row.
    Unmatched,
}

/// Thresholds and switches the rules leave to the assessing engineer.
///
/// # Examples
/// ```
/// use coamingx::EngineOptions;
///
/// let options = EngineOptions::from_json(r#"{"block_shift_min_offset_mm": 350}"#)
///     .expect("partial options accepted");
/// assert_eq!(options.block_shift_min_offset_mm, 350.0);
/// assert_eq!(options.special_consideration_threshold_mm, 100.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Minimum stagger between block butts under the block shift option, in millimetres.
    pub block_shift_min_offset_mm: f64,
    /// Thickness above which the rules call for special consideration, in millimetres.
    pub special_consideration_threshold_mm: f64,
    /// Minimum CTOD demanded under the enhanced NDE option, in millimetres.
    pub ctod_min_mm: f64,
    /// Whether electrogas welding is accepted together with enhanced NDE.
    pub egw_permitted_with_enhanced_nde: bool,
    /// Lookup behaviour above the table ceiling.
    pub above_ceiling: AboveCeilingPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            block_shift_min_offset_mm: 300.0,
            special_consideration_threshold_mm: 100.0,
            ctod_min_mm: 0.18,
            egw_permitted_with_enhanced_nde: false,
            above_ceiling: AboveCeilingPolicy::TopBand,
        }
    }
}

impl EngineOptions {
    /// Parse and validate options from JSON; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::Json`] for malformed documents and
    /// [`OptionsError::NonPositive`] when a threshold is not a positive number.
    pub fn from_json(text: &str) -> Result<Self, OptionsError> {
        let options: Self =
            serde_json::from_str(text).map_err(|source| OptionsError::Json { source })?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every threshold is a positive, finite number.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::NonPositive`] naming the first rejected option.
    pub fn validate(&self) -> Result<(), OptionsError> {
        let thresholds = [
            ("block_shift_min_offset_mm", self.block_shift_min_offset_mm),
            (
                "special_consideration_threshold_mm",
                self.special_consideration_threshold_mm,
            ),
            ("ctod_min_mm", self.ctod_min_mm),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value <= 0.0 {
                return Err(OptionsError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}
