//! Global requirement lookup against Table 8.2.1.

use std::cmp::Ordering;

use tracing::debug;

use crate::config::AboveCeilingPolicy;
use crate::input::Measure3Option;
use crate::result::ControlValues;
use crate::rules::{MeasureRequirement, RuleTable, Table821Row};

/// Measures the table demands for the whole coaming, before any target is visited.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalRequirements {
    /// Measures marked required, ascending.
    pub required: Vec<u8>,
    /// Measures marked see Note 2, ascending.
    pub conditional: Vec<u8>,
    /// Row the lookup matched.
    pub row: Option<Table821Row>,
    /// Set when `row` is the top row of its band used above the band ceiling.
    pub extrapolated: bool,
    /// Set when the Measure 3 choice resolves Note 2, i.e. enhanced NDE was chosen.
    pub note_2_resolved: bool,
    /// Manual review flags raised by the lookup.
    pub flags: Vec<String>,
}

impl GlobalRequirements {
    /// Return `true` when `measure_id` is globally required.
    #[must_use]
    pub fn requires(&self, measure_id: u8) -> bool {
        self.required.contains(&measure_id)
    }

    /// Return `true` when `measure_id` is conditional under Note 2.
    #[must_use]
    pub fn is_conditional(&self, measure_id: u8) -> bool {
        self.conditional.contains(&measure_id)
    }
}

/// Match the governing values against Table 8.2.1.
///
/// Ranges are `min < t <= max` within the band equal to `y_control`. A yield
/// outside every band, a thickness outside every range or an unspecified
/// governing value gives no row and a flag. Above the highest range of a band
/// the result follows `policy`.
///
/// # Examples
/// ```
/// use coamingx::{requirements, AboveCeilingPolicy, ControlValues, Measure3Option, RuleTable};
///
/// let values = ControlValues { t_control: Some(92.0), y_control: Some(390), ..ControlValues::default() };
/// let global = requirements::lookup(
///     &RuleTable::builtin(),
///     &values,
///     Measure3Option::EnhancedNde,
///     AboveCeilingPolicy::TopBand,
/// );
/// assert_eq!(global.required, vec![1, 3, 4, 5]);
/// assert_eq!(global.conditional, vec![2]);
/// assert!(global.note_2_resolved);
/// ```
#[must_use]
pub fn lookup(
    table: &RuleTable,
    values: &ControlValues,
    option: Measure3Option,
    policy: AboveCeilingPolicy,
) -> GlobalRequirements {
    let mut global = GlobalRequirements {
        note_2_resolved: option == Measure3Option::EnhancedNde,
        ..GlobalRequirements::default()
    };

    let (Some(t_control), Some(y_control)) = (values.t_control, values.y_control) else {
        global.flags.push(
            "T821-INPUT-01: t_control or y_control is unspecified; \
             Table 8.2.1 lookup skipped and no measure is globally required"
                .to_string(),
        );
        return global;
    };

    let bands = table.yield_bands();
    if !bands.contains(&y_control) {
        let listed: Vec<String> = bands.iter().map(ToString::to_string).collect();
        global.flags.push(format!(
            "T821-YS-01: y_control={y_control} N/mm² is not a Table 8.2.1 yield band ({}); \
             no row matched",
            listed.join(", ")
        ));
        return global;
    }

    let row = match table.lookup_821(y_control, t_control) {
        Some(row) => Some(*row),
        None => above_ceiling(table, y_control, t_control, policy, &mut global),
    };

    match row {
        Some(row) => {
            global.required = row.measures_with(MeasureRequirement::Required);
            global.conditional = row.measures_with(MeasureRequirement::SeeNote2);
            global.row = Some(row);
        }
        None => global.flags.push(format!(
            "T821-RANGE-01: no Table 8.2.1 range contains t_control={t_control} mm \
             for YS={y_control}"
        )),
    }

    debug!(
        required = ?global.required,
        conditional = ?global.conditional,
        extrapolated = global.extrapolated,
        "table 8.2.1 lookup"
    );
    global
}

/// Row to use when `t_control` lies above the ceiling of its band, if any.
fn above_ceiling(
    table: &RuleTable,
    y_control: u32,
    t_control: f64,
    policy: AboveCeilingPolicy,
    global: &mut GlobalRequirements,
) -> Option<Table821Row> {
    let ceiling = table.band_ceiling(y_control)?;
    let above = t_control.partial_cmp(&ceiling) == Some(Ordering::Greater);
    if !above || policy == AboveCeilingPolicy::Unmatched {
        return None;
    }
    let top = *table.top_row(y_control)?;
    global.extrapolated = true;
    global.flags.push(format!(
        "T821-EXTRAP-01: t_control={t_control} mm exceeds the {ceiling} mm ceiling of Table 8.2.1 \
         for YS={y_control}; row {} used as a best-effort match",
        top.thickness
    ));
    Some(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ThicknessRange;

    fn values(y_control: u32, t_control: f64) -> ControlValues {
        ControlValues {
            t_control: Some(t_control),
            y_control: Some(y_control),
            ..ControlValues::default()
        }
    }

    fn lookup_builtin(y_control: u32, t_control: f64) -> GlobalRequirements {
        lookup(
            &RuleTable::builtin(),
            &values(y_control, t_control),
            Measure3Option::Unspecified,
            AboveCeilingPolicy::TopBand,
        )
    }

    #[test]
    fn thin_355_plates_need_nothing() {
        let global = lookup_builtin(355, 60.0);
        assert!(global.required.is_empty());
        assert!(global.conditional.is_empty());
        assert_eq!(
            global.row.map(|row| row.thickness),
            Some(ThicknessRange::new(50.0, 65.0))
        );
        assert!(global.flags.is_empty());
    }

    #[test]
    fn boundary_values_select_the_lower_row() {
        let at_85 = lookup_builtin(355, 85.0);
        assert_eq!(at_85.required, vec![1]);
        let above_85 = lookup_builtin(355, 85.000_000_1);
        assert_eq!(above_85.required, vec![1, 3, 4]);
        assert_eq!(above_85.conditional, vec![2]);
    }

    #[test]
    fn thin_plates_and_unknown_bands_have_no_row() {
        for global in [lookup_builtin(390, 50.0), lookup_builtin(420, 70.0)] {
            assert!(global.row.is_none());
            assert!(global.required.is_empty());
            assert_eq!(global.flags.len(), 1);
        }
        assert!(lookup_builtin(420, 70.0).flags[0].starts_with("T821-YS-01"));
    }

    #[test]
    fn above_the_ceiling_the_top_row_is_extrapolated() {
        let global = lookup_builtin(460, 120.0);
        assert!(global.extrapolated);
        assert_eq!(global.required, vec![1, 3, 4, 5]);
        assert_eq!(
            global.row.map(|row| row.thickness),
            Some(ThicknessRange::new(85.0, 100.0))
        );
        assert!(global.flags[0].starts_with("T821-EXTRAP-01"));
    }

    #[test]
    fn above_the_ceiling_can_stay_unmatched() {
        let global = lookup(
            &RuleTable::builtin(),
            &values(460, 120.0),
            Measure3Option::EnhancedNde,
            AboveCeilingPolicy::Unmatched,
        );
        assert!(!global.extrapolated);
        assert!(global.row.is_none());
        assert!(global.required.is_empty());
        assert!(global.flags[0].starts_with("T821-RANGE-01"));
    }

    #[test]
    fn a_nan_thickness_matches_no_row() {
        let global = lookup_builtin(390, f64::NAN);
        assert!(!global.extrapolated);
        assert!(global.row.is_none());
        assert!(global.required.is_empty());
        assert_eq!(global.flags.len(), 1);
        assert!(global.flags[0].starts_with("T821-RANGE-01"));
    }

    #[test]
    fn unspecified_governing_values_skip_the_lookup() {
        let global = lookup(
            &RuleTable::builtin(),
            &ControlValues::default(),
            Measure3Option::BlockShift,
            AboveCeilingPolicy::TopBand,
        );
        assert!(global.row.is_none());
        assert!(!global.note_2_resolved);
        assert!(global.flags[0].starts_with("T821-INPUT-01"));
    }
}
