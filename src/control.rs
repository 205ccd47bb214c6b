//! Governing thickness and yield strength of the hatch coaming.

use tracing::debug;

use crate::input::{Member, MemberRole};
use crate::result::ControlValues;

/// Outcome of [`resolve`].
#[derive(Clone, Debug, PartialEq)]
pub struct ControlResolution {
    /// Governing values and the plate data they were taken from.
    pub values: ControlValues,
    /// Set when `t_control` exceeds the special consideration threshold.
    pub special_consideration: bool,
    /// Manual review flags raised while resolving.
    pub flags: Vec<String>,
}

/// Derive `t_control` and `y_control` from the first coaming side plate and
/// the first coaming top plate among `members`.
///
/// Each governing value is the larger of the two plates when both are known,
/// otherwise the single known one. A non-finite thickness counts as unknown. Missing plates are not an error; they leave
/// the value unspecified and raise a flag.
///
/// # Examples
/// ```
/// use coamingx::{control, Member, MemberRole, Zone};
///
/// let members = vec![
///     Member::new("M01", MemberRole::HatchCoamingSidePlate, Zone::CargoHoldRegion).with_material(390, 90.0),
///     Member::new("M02", MemberRole::HatchCoamingTopPlate, Zone::CargoHoldRegion).with_material(390, 92.0),
/// ];
/// let resolution = control::resolve(&members, 100.0);
/// assert_eq!(resolution.values.t_control, Some(92.0));
/// assert_eq!(resolution.values.y_control, Some(390));
/// assert!(resolution.flags.is_empty());
/// ```
#[must_use]
pub fn resolve(members: &[Member], special_threshold_mm: f64) -> ControlResolution {
    let side = members
        .iter()
        .find(|m| m.member_role == MemberRole::HatchCoamingSidePlate);
    let top = members
        .iter()
        .find(|m| m.member_role == MemberRole::HatchCoamingTopPlate);

    let values = ControlValues {
        side_thickness: side.and_then(|m| m.thickness).filter(|t| t.is_finite()),
        top_thickness: top.and_then(|m| m.thickness).filter(|t| t.is_finite()),
        side_yield: side.and_then(|m| m.yield_strength),
        top_yield: top.and_then(|m| m.yield_strength),
        ..ControlValues::default()
    };
    let mut flags = Vec::new();

    let t_control = match (values.side_thickness, values.top_thickness) {
        (Some(side), Some(top)) => Some(side.max(top)),
        (Some(side), None) => {
            flags.push(
                "CTRL-T-01: hatch coaming top plate thickness is unspecified; \
                 t_control based on side plate only"
                    .to_string(),
            );
            Some(side)
        }
        (None, Some(top)) => {
            flags.push(
                "CTRL-T-02: hatch coaming side plate thickness is unspecified; \
                 t_control based on top plate only"
                    .to_string(),
            );
            Some(top)
        }
        (None, None) => {
            flags.push(
                "CTRL-T-03: hatch coaming side and top plate thicknesses are unspecified; \
                 t_control cannot be determined"
                    .to_string(),
            );
            None
        }
    };

    let y_control = match (values.side_yield, values.top_yield) {
        (Some(side), Some(top)) => {
            let governing = side.max(top);
            if side != top {
                flags.push(format!(
                    "CTRL-Y-01: hatch coaming side yield ({side} N/mm²) differs from top yield \
                     ({top} N/mm²); y_control taken as max={governing} N/mm², review required"
                ));
            }
            Some(governing)
        }
        (Some(side), None) => {
            flags.push(
                "CTRL-Y-02: hatch coaming top plate yield is unspecified; \
                 y_control based on side plate only"
                    .to_string(),
            );
            Some(side)
        }
        (None, Some(top)) => {
            flags.push(
                "CTRL-Y-03: hatch coaming side plate yield is unspecified; \
                 y_control based on top plate only"
                    .to_string(),
            );
            Some(top)
        }
        (None, None) => {
            flags.push(
                "CTRL-Y-04: hatch coaming side and top plate yields are unspecified; \
                 y_control cannot be determined"
                    .to_string(),
            );
            None
        }
    };

    let oversize = t_control.filter(|t| *t > special_threshold_mm);
    let special_consideration = oversize.is_some();
    if let Some(t) = oversize {
        flags.push(format!(
            "CTRL-SPECIAL: t_control={t} mm is >{special_threshold_mm}mm; \
             special consideration required"
        ));
    }

    debug!(?t_control, ?y_control, special_consideration, "control values resolved");
    ControlResolution {
        values: ControlValues {
            t_control,
            y_control,
            ..values
        },
        special_consideration,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Zone;
    use approx::assert_relative_eq;

    fn side(yield_strength: u32, thickness: f64) -> Member {
        Member::new("S", MemberRole::HatchCoamingSidePlate, Zone::CargoHoldRegion)
            .with_material(yield_strength, thickness)
    }

    fn top(yield_strength: u32, thickness: f64) -> Member {
        Member::new("T", MemberRole::HatchCoamingTopPlate, Zone::CargoHoldRegion)
            .with_material(yield_strength, thickness)
    }

    #[test]
    fn governing_values_are_the_maximum() {
        let resolution = resolve(&[side(355, 60.0), top(355, 55.0)], 100.0);
        assert_relative_eq!(resolution.values.t_control.unwrap_or_default(), 60.0);
        assert_eq!(resolution.values.y_control, Some(355));
        assert_eq!(resolution.values.top_thickness, Some(55.0));
        assert!(!resolution.special_consideration);
        assert!(resolution.flags.is_empty());
    }

    #[test]
    fn yield_mismatch_names_both_values() {
        let resolution = resolve(&[side(355, 70.0), top(390, 70.0)], 100.0);
        assert_eq!(resolution.values.y_control, Some(390));
        assert_eq!(resolution.flags.len(), 1);
        let flag = &resolution.flags[0];
        assert!(flag.contains("355") && flag.contains("390") && flag.contains("max"));
    }

    #[test]
    fn thickness_above_threshold_needs_special_consideration() {
        let resolution = resolve(&[side(460, 120.0), top(460, 110.0)], 100.0);
        assert!(resolution.special_consideration);
        assert!(resolution.flags.iter().any(|f| f.contains(">100mm")));

        let at_threshold = resolve(&[side(460, 100.0), top(460, 90.0)], 100.0);
        assert!(!at_threshold.special_consideration);
    }

    #[test]
    fn a_single_known_plate_governs_with_a_flag() {
        let mut bare_top = top(390, 0.0);
        bare_top.thickness = None;
        let resolution = resolve(&[side(390, 80.0), bare_top], 100.0);
        assert_eq!(resolution.values.t_control, Some(80.0));
        assert!(resolution.flags[0].starts_with("CTRL-T-01"));
    }

    #[test]
    fn non_finite_thickness_counts_as_unspecified() {
        let resolution = resolve(&[side(390, f64::NAN), top(390, f64::INFINITY)], 100.0);
        assert_eq!(resolution.values.t_control, None);
        assert!(!resolution.special_consideration);
        assert!(resolution.flags[0].starts_with("CTRL-T-03"));
    }

    #[test]
    fn missing_plates_leave_values_unspecified() {
        let deck = Member::new("D", MemberRole::UpperDeckPlate, Zone::CargoHoldRegion)
            .with_material(390, 80.0);
        let resolution = resolve(&[deck], 100.0);
        assert_eq!(resolution.values, ControlValues::default());
        assert!(resolution.flags.iter().any(|f| f.starts_with("CTRL-T-03")));
        assert!(resolution.flags.iter().any(|f| f.starts_with("CTRL-Y-04")));
    }

    #[test]
    fn the_first_plate_of_each_role_is_used() {
        let mut second = side(460, 95.0);
        second.member_id = "S2".to_string();
        let resolution = resolve(&[side(390, 70.0), second, top(390, 72.0)], 100.0);
        assert_eq!(resolution.values.side_thickness, Some(70.0));
        assert_eq!(resolution.values.y_control, Some(390));
    }
}
