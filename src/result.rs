//! Evaluation output: applied measures, per-target records and the aggregate result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::Table821Row;

/// Decision recorded for one measure on one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureStatus {
    /// The measure applies.
    Applied,
    /// The measure applies subject to a stated condition.
    Conditional,
    /// A Measure 3 option has to be chosen first.
    PendingManualChoice,
    /// A parameter is missing and the result has to be confirmed by hand.
    PendingManualReview,
    /// The design violates the measure.
    Noncompliant,
}

/// Kind of target a measure is recorded against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// A structural member.
    Member,
    /// A weld joint.
    Joint,
}

/// A requirement line with the rule it comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// What has to be done.
    pub text: String,
    /// Clause or table reference.
    pub rule_ref: String,
}

impl Requirement {
    /// Create a requirement line.
    #[must_use]
    pub fn new(text: impl Into<String>, rule_ref: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rule_ref: rule_ref.into(),
        }
    }
}

/// One measure applied to one target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedMeasure {
    /// Measure number; 0 is used for welding detail rules that always apply.
    pub measure_id: u8,
    /// Decision for the target.
    pub status: MeasureStatus,
    /// Kind of target.
    pub target_type: TargetType,
    /// Member or joint id.
    pub target_id: String,
    /// Requirements in the order they were raised.
    pub requirements: Vec<Requirement>,
    /// Condition that triggered the measure, for audit.
    pub condition_expr: String,
    /// Free-text annotations without duplicates.
    pub notes: Vec<String>,
}

impl AppliedMeasure {
    /// Start an entry for `measure_id` on a target.
    #[must_use]
    pub fn new(
        measure_id: u8,
        status: MeasureStatus,
        target_type: TargetType,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            measure_id,
            status,
            target_type,
            target_id: target_id.into(),
            requirements: Vec::new(),
            condition_expr: String::new(),
            notes: Vec::new(),
        }
    }

    /// Append a requirement line.
    #[must_use]
    pub fn requirement(mut self, text: impl Into<String>, rule_ref: impl Into<String>) -> Self {
        self.requirements.push(Requirement::new(text, rule_ref));
        self
    }

    /// Set the audit condition.
    #[must_use]
    pub fn condition(mut self, condition_expr: impl Into<String>) -> Self {
        self.condition_expr = condition_expr.into();
        self
    }

    /// Append a note unless it is already present.
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        if !self.notes.contains(&note) {
            self.notes.push(note);
        }
        self
    }

    /// Fold a repeated trigger into this entry.
    ///
    /// Notes not yet present are appended. A repeat that reports a violation
    /// makes the entry noncompliant and contributes its missing requirements.
    fn absorb(&mut self, repeat: AppliedMeasure) {
        for note in repeat.notes {
            if !self.notes.contains(&note) {
                self.notes.push(note);
            }
        }
        if repeat.status == MeasureStatus::Noncompliant {
            self.status = MeasureStatus::Noncompliant;
            for requirement in repeat.requirements {
                if !self.requirements.contains(&requirement) {
                    self.requirements.push(requirement);
                }
            }
        }
    }
}

/// All measures recorded against one target, ascending by measure id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetResult {
    /// Member or joint id.
    pub target_id: String,
    /// Kind of target.
    pub target_type: TargetType,
    /// Applied measures, at most one per measure id.
    pub applied_measures: Vec<AppliedMeasure>,
}

impl TargetResult {
    /// Measure ids present on the target, ascending.
    #[must_use]
    pub fn measure_ids(&self) -> Vec<u8> {
        self.applied_measures.iter().map(|m| m.measure_id).collect()
    }

    /// The entry for `measure_id`, if any.
    #[must_use]
    pub fn measure(&self, measure_id: u8) -> Option<&AppliedMeasure> {
        self.applied_measures
            .iter()
            .find(|m| m.measure_id == measure_id)
    }

    /// Insert or merge an entry, keeping the list sorted.
    fn record(&mut self, measure: AppliedMeasure) {
        if let Some(existing) = self
            .applied_measures
            .iter_mut()
            .find(|m| m.measure_id == measure.measure_id)
        {
            existing.absorb(measure);
        } else {
            self.applied_measures.push(measure);
        }
        self.applied_measures.sort_by_key(|m| m.measure_id);
    }
}

/// Append-only accumulator of applied measures for one evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetLedger {
    /// Member targets by id.
    members: BTreeMap<String, TargetResult>,
    /// Joint targets by id.
    joints: BTreeMap<String, TargetResult>,
}

impl TargetLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measure against its target, merging with an existing entry for
    /// the same `(target_id, measure_id)`.
    ///
    /// # Examples
    /// ```
    /// use coamingx::{AppliedMeasure, MeasureStatus, TargetLedger, TargetType};
    ///
    /// let mut ledger = TargetLedger::new();
    /// ledger.record(AppliedMeasure::new(3, MeasureStatus::Applied, TargetType::Joint, "J01").note("a"));
    /// ledger.record(AppliedMeasure::new(1, MeasureStatus::Applied, TargetType::Joint, "J01"));
    /// ledger.record(AppliedMeasure::new(3, MeasureStatus::Applied, TargetType::Joint, "J01").note("b"));
    ///
    /// let joint = ledger.joint("J01").expect("joint recorded");
    /// assert_eq!(joint.measure_ids(), vec![1, 3]);
    /// assert_eq!(joint.measure(3).map(|m| m.notes.len()), Some(2));
    /// ```
    pub fn record(&mut self, measure: AppliedMeasure) {
        let targets = match measure.target_type {
            TargetType::Member => &mut self.members,
            TargetType::Joint => &mut self.joints,
        };
        targets
            .entry(measure.target_id.clone())
            .or_insert_with(|| TargetResult {
                target_id: measure.target_id.clone(),
                target_type: measure.target_type,
                applied_measures: Vec::new(),
            })
            .record(measure);
    }

    /// Recorded member target, if any.
    #[must_use]
    pub fn member(&self, member_id: &str) -> Option<&TargetResult> {
        self.members.get(member_id)
    }

    /// Recorded joint target, if any.
    #[must_use]
    pub fn joint(&self, joint_id: &str) -> Option<&TargetResult> {
        self.joints.get(joint_id)
    }

    /// Total number of applied measure entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members
            .values()
            .chain(self.joints.values())
            .map(|target| target.applied_measures.len())
            .sum()
    }

    /// Return `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.joints.is_empty()
    }

    /// Split into member and joint maps.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<String, TargetResult>,
        BTreeMap<String, TargetResult>,
    ) {
        (self.members, self.joints)
    }
}

/// Governing values derived from the hatch coaming plates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlValues {
    /// Governing thickness in millimetres.
    pub t_control: Option<f64>,
    /// Governing yield strength in N/mm².
    pub y_control: Option<u32>,
    /// Thickness of the coaming side plate in millimetres.
    pub side_thickness: Option<f64>,
    /// Thickness of the coaming top plate in millimetres.
    pub top_thickness: Option<f64>,
    /// Yield strength of the coaming side plate in N/mm².
    pub side_yield: Option<u32>,
    /// Yield strength of the coaming top plate in N/mm².
    pub top_yield: Option<u32>,
}

/// Complete outcome of one evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Project identifier from the input.
    pub project_id: String,
    /// Revision of the rule table used.
    pub table_revision: String,
    /// Governing thickness and yield.
    pub control_values: ControlValues,
    /// Measures required by Table 8.2.1, ascending.
    pub required_measures_global: Vec<u8>,
    /// Measures marked conditional (Note 2) by Table 8.2.1, ascending.
    pub conditional_measures_global: Vec<u8>,
    /// Table 8.2.1 row used for the lookup.
    pub table_821_row_used: Option<Table821Row>,
    /// Set when the governing thickness exceeds the rule ceiling.
    pub special_consideration: bool,
    /// Member targets by id.
    pub member_results: BTreeMap<String, TargetResult>,
    /// Joint targets by id.
    pub joint_results: BTreeMap<String, TargetResult>,
    /// Points an engineer has to confirm.
    pub manual_review_flags: Vec<String>,
    /// Violations found in the design.
    pub noncompliance_flags: Vec<String>,
}

/// Condensed view of an [`EvaluationResult`] for reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    /// Measure ids per member, by member id.
    pub member_measures: BTreeMap<String, Vec<u8>>,
    /// Measure ids per joint, by joint id.
    pub joint_measures: BTreeMap<String, Vec<u8>>,
    /// Number of applied measure entries across all targets.
    pub total_applied: usize,
    /// Number of noncompliant entries across all targets.
    pub total_noncompliant: usize,
    /// Number of manual review flags.
    pub manual_review_count: usize,
    /// Number of noncompliance flags.
    pub noncompliance_count: usize,
}

impl EvaluationResult {
    /// Summarise the result.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let ids = |targets: &BTreeMap<String, TargetResult>| {
            targets
                .iter()
                .map(|(id, target)| (id.clone(), target.measure_ids()))
                .collect::<BTreeMap<_, _>>()
        };
        let entries = || {
            self.member_results
                .values()
                .chain(self.joint_results.values())
                .flat_map(|target| target.applied_measures.iter())
        };
        Summary {
            member_measures: ids(&self.member_results),
            joint_measures: ids(&self.joint_results),
            total_applied: entries().count(),
            total_noncompliant: entries()
                .filter(|m| m.status == MeasureStatus::Noncompliant)
                .count(),
            manual_review_count: self.manual_review_flags.len(),
            noncompliance_count: self.noncompliance_flags.len(),
        }
    }

    /// Serialise the result as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; the result types themselves always serialise.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
