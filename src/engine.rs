//! The evaluation pipeline: control values, global lookup, per-target
//! application and assembly of the result.

use tracing::{debug, info, info_span};

use crate::applicator::{Applicator, Findings};
use crate::config::EngineOptions;
use crate::control::{self, ControlResolution};
use crate::input::ProjectInput;
use crate::requirements::{self, GlobalRequirements};
use crate::result::EvaluationResult;
use crate::rules::RuleTable;
use crate::structure::StructuralGraph;

/// A rule table revision together with the options it is evaluated under.
///
/// The engine holds only immutable data, so one instance can serve any number
/// of evaluations, also from several threads.
///
/// # Examples
/// ```
/// use coamingx::{Engine, EngineOptions, ProjectInput, RuleTable};
///
/// let engine = Engine::new(RuleTable::builtin(), EngineOptions::default());
/// let result = engine.evaluate(&ProjectInput::default());
/// assert!(result.required_measures_global.is_empty());
/// assert!(!result.manual_review_flags.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Engine {
    /// Rule table revision used for every lookup.
    table: RuleTable,
    /// Numeric policy.
    options: EngineOptions,
}

impl Engine {
    /// Create an engine from a table revision and options.
    #[must_use]
    pub fn new(table: RuleTable, options: EngineOptions) -> Self {
        Self { table, options }
    }

    /// Replace the rule table.
    #[must_use]
    pub fn with_table(mut self, table: RuleTable) -> Self {
        self.table = table;
        self
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// The rule table in use.
    #[must_use]
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// The options in use.
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Determine the measures for a project.
    ///
    /// Never fails: every ambiguity in the input is reported as a manual review
    /// flag and every rule violation as a noncompliance flag of the result.
    #[must_use]
    pub fn evaluate(&self, project: &ProjectInput) -> EvaluationResult {
        let span = info_span!("evaluate", project = %project.project_meta.project_id);
        let _guard = span.enter();

        let resolution = control::resolve(
            &project.members,
            self.options.special_consideration_threshold_mm,
        );
        let global = requirements::lookup(
            &self.table,
            &resolution.values,
            project.measure3_choice.option,
            self.options.above_ceiling,
        );
        let graph = StructuralGraph::build(project);
        debug!(
            members = graph.member_count(),
            joints = graph.joint_count(),
            links = graph.link_count(),
            unresolved = graph.unresolved().len(),
            "structural graph built"
        );
        let findings = Applicator::new(
            &self.table,
            &self.options,
            &graph,
            &project.measure3_choice,
            &global,
        )
        .apply();

        let result = self.assemble(project, resolution, global, findings);
        info!(
            required = ?result.required_measures_global,
            manual_review = result.manual_review_flags.len(),
            noncompliance = result.noncompliance_flags.len(),
            "evaluation complete"
        );
        result
    }

    /// Combine the outputs of every stage into one result.
    fn assemble(
        &self,
        project: &ProjectInput,
        resolution: ControlResolution,
        global: GlobalRequirements,
        findings: Findings,
    ) -> EvaluationResult {
        let mut manual_review_flags = resolution.flags;
        manual_review_flags.extend(global.flags);
        manual_review_flags.extend(findings.manual_review_flags);
        let (member_results, joint_results) = findings.ledger.into_parts();

        EvaluationResult {
            project_id: project.project_meta.project_id.clone(),
            table_revision: self.table.revision.clone(),
            control_values: resolution.values,
            required_measures_global: global.required,
            conditional_measures_global: global.conditional,
            table_821_row_used: global.row,
            special_consideration: resolution.special_consideration,
            member_results,
            joint_results,
            manual_review_flags,
            noncompliance_flags: findings.noncompliance_flags,
        }
    }
}

/// Evaluate a project with the built-in rule table and default options.
#[must_use]
pub fn evaluate(project: &ProjectInput) -> EvaluationResult {
    Engine::default().evaluate(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Member, MemberRole, Zone};
    use crate::rules::TABLE_REVISION;

    fn coaming(yield_strength: u32, side: f64, top: f64) -> ProjectInput {
        let mut project = ProjectInput::default();
        project.project_meta.project_id = "P-001".to_string();
        project.members = vec![
            Member::new("M01", MemberRole::HatchCoamingSidePlate, Zone::CargoHoldRegion)
                .with_material(yield_strength, side),
            Member::new("M02", MemberRole::HatchCoamingTopPlate, Zone::CargoHoldRegion)
                .with_material(yield_strength, top),
        ];
        project
    }

    #[test]
    fn result_echoes_project_and_revision() {
        let result = evaluate(&coaming(355, 60.0, 55.0));
        assert_eq!(result.project_id, "P-001");
        assert_eq!(result.table_revision, TABLE_REVISION);
        assert_eq!(result.control_values.t_control, Some(60.0));
        assert!(result.manual_review_flags.is_empty());
    }

    #[test]
    fn flags_keep_stage_order() {
        let result = evaluate(&coaming(460, 120.0, 90.0));
        assert!(result.special_consideration);
        let prefixes: Vec<&str> = result
            .manual_review_flags
            .iter()
            .filter_map(|flag| flag.split(':').next())
            .collect();
        assert_eq!(
            prefixes,
            vec![
                "CTRL-SPECIAL",
                "T821-EXTRAP-01",
                "SPECIAL-M01",
                "M3-M01-BCA",
                "M3-OPT-UNSPEC"
            ]
        );
    }

    #[test]
    fn a_revised_table_is_used_and_labelled() {
        let mut table = RuleTable::builtin();
        table.revision = "test-revision".to_string();
        table.table_821.retain(|row| row.yield_strength_nmm2 != 355);
        let engine = Engine::default().with_table(table);
        let result = engine.evaluate(&coaming(355, 60.0, 55.0));
        assert_eq!(result.table_revision, "test-revision");
        assert!(result.table_821_row_used.is_none());
    }
}
