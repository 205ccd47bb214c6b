use coamingx::{EvaluationResult, MeasureRequirement, RuleTable, TargetResult};
use std::collections::BTreeMap;
use std::fmt;

/// Textual summary of an evaluation, printed by `coamingx evaluate`.
pub struct EvaluationReport<'a>(pub &'a EvaluationResult);

impl fmt::Display for EvaluationReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        let summary = result.summary();

        writeln!(
            f,
            "Hatch coaming measures for {} (table {})",
            display_or_unspecified(&result.project_id),
            result.table_revision
        )?;

        // Governing values first; the rest of the report depends on them.
        let values = &result.control_values;
        writeln!(
            f,
            "Control values: t_control = {}, y_control = {}",
            optional(values.t_control.map(|t| format!("{t} mm"))),
            optional(values.y_control.map(|y| format!("{y} N/mm²")))
        )?;
        match &result.table_821_row_used {
            Some(row) => writeln!(f, "Table 8.2.1 row: {}", row.label())?,
            None => writeln!(f, "Table 8.2.1 row: none")?,
        }
        writeln!(
            f,
            "Required measures: {}",
            id_list(&result.required_measures_global)
        )?;
        writeln!(
            f,
            "Conditional measures (Note 2): {}",
            id_list(&result.conditional_measures_global)
        )?;
        if result.special_consideration {
            writeln!(f, "Special consideration: required")?;
        }

        write_targets(f, "Members", &result.member_results)?;
        write_targets(f, "Joints", &result.joint_results)?;

        writeln!(
            f,
            "Applied entries: {} ({} noncompliant)",
            summary.total_applied, summary.total_noncompliant
        )?;
        write_flags(f, "Manual review", &result.manual_review_flags)?;
        write_flags(f, "Noncompliance", &result.noncompliance_flags)
    }
}

/// Tabular listing of a rule table revision, printed by `coamingx table`.
pub struct TableReport<'a>(pub &'a RuleTable);

impl fmt::Display for TableReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.0;
        writeln!(f, "Table 8.2.1 (revision {})", table.revision)?;
        writeln!(f, "{:<6} {:<12} M1 M2 M3 M4 M5", "YS", "range")?;
        for row in &table.table_821 {
            write!(
                f,
                "{:<6} {:<12}",
                row.yield_strength_nmm2,
                row.thickness.to_string()
            )?;
            for requirement in row.measures {
                let cell = match requirement {
                    MeasureRequirement::Required => "R",
                    MeasureRequirement::SeeNote2 => "N2",
                    MeasureRequirement::NotRequired => "-",
                };
                write!(f, " {cell:<2}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Table 8.2.2")?;
        for row in &table.table_822 {
            writeln!(
                f,
                "{:<18} YS >= {:<4} {:<12} {}",
                row.member_category.to_string(),
                row.min_yield_nmm2,
                row.thickness.to_string(),
                row.bca_type
            )?;
        }
        Ok(())
    }
}

fn write_targets(
    f: &mut fmt::Formatter<'_>,
    heading: &str,
    targets: &BTreeMap<String, TargetResult>,
) -> fmt::Result {
    if targets.is_empty() {
        return Ok(());
    }
    writeln!(f, "{heading}:")?;
    for (id, target) in targets {
        let statuses: Vec<String> = target
            .applied_measures
            .iter()
            .map(|m| format!("M{} {:?}", m.measure_id, m.status))
            .collect();
        writeln!(f, "  {id}: {}", statuses.join(", "))?;
    }
    Ok(())
}

fn write_flags(f: &mut fmt::Formatter<'_>, heading: &str, flags: &[String]) -> fmt::Result {
    writeln!(f, "{heading} flags: {}", flags.len())?;
    for flag in flags {
        writeln!(f, "  - {flag}")?;
    }
    Ok(())
}

fn id_list(ids: &[u8]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "unspecified".to_string())
}

fn display_or_unspecified(text: &str) -> &str {
    if text.is_empty() {
        "unnamed project"
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coamingx::{evaluate, Member, MemberRole, ProjectInput, Zone};

    #[test]
    fn formats_human_readable_report() {
        let mut project = ProjectInput::default();
        project.project_meta.project_id = "HC-1".to_string();
        project.members = vec![
            Member::new("M01", MemberRole::HatchCoamingSidePlate, Zone::CargoHoldRegion)
                .with_material(390, 90.0),
            Member::new("M02", MemberRole::HatchCoamingTopPlate, Zone::CargoHoldRegion)
                .with_material(390, 92.0),
        ];
        let report = EvaluationReport(&evaluate(&project)).to_string();
        assert!(report.contains("Hatch coaming measures for HC-1"));
        assert!(report.contains("t_control = 92 mm"));
        assert!(report.contains("Table 8.2.1 row: YS=390, 85<t<=100"));
        assert!(report.contains("Required measures: 1, 3, 4, 5"));
        assert!(report.contains("M01: M3 Applied"));
        assert!(report.contains("M3-OPT-UNSPEC"));
    }

    #[test]
    fn lists_the_builtin_table() {
        let listing = TableReport(&RuleTable::builtin()).to_string();
        assert!(listing.contains("revision LR-8.2-2024.1"));
        assert!(listing.contains("460    50<t<=85     R  N2 R  R  R"));
        assert!(listing.contains("hatch_coaming_side YS >= 390  0<t<=100     BCA2"));
    }
}
