//! Per-target application of Measures 0 to 5.
//!
//! Measures are applied in the fixed order 1, 3, 4, 5, 2, 0 so that the ledger
//! and the flag lists come out the same for the same input. Every entry goes
//! through [`TargetLedger::record`], which merges repeats on a target instead
//! of duplicating them.

use tracing::{debug, warn};

use crate::config::EngineOptions;
use crate::input::{Joint, JointType, Measure3Choice, Measure3Option, Member, MemberRole, WeldProcess, Zone};
use crate::requirements::GlobalRequirements;
use crate::result::{AppliedMeasure, MeasureStatus, TargetLedger, TargetType};
use crate::rules::{MemberCategory, RuleTable};
use crate::structure::{StructuralGraph, UnresolvedReference};

const REF_MEASURE_1: &str = "Pt 4, Ch 8, 8.2.3 Measure 1 (construction NDE)";
const REF_MEASURE_2: &str = "Pt 4, Ch 8, 8.2.3 Measure 2 (periodic in-service NDE), Table 8.2.1 Note 2";
const REF_MEASURE_3: &str = "Pt 4, Ch 8, 8.2.3 Measure 3 (crack arrest design)";
const REF_MEASURE_4: &str = "Pt 4, Ch 8, 8.2.3 Measure 4 (upper deck BCA steel)";
const REF_MEASURE_5: &str = "Pt 4, Ch 8, 8.2.3 Measure 5 (upper deck BCA steel, extended)";
const REF_TABLE_822: &str = "Table 8.2.2";
const REF_WELD_DETAIL: &str = "Pt 4, Ch 8, 8.2.4 welding details";

/// Everything the applicator produced for one evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Findings {
    /// Applied measures per target.
    pub ledger: TargetLedger,
    /// Points an engineer has to confirm.
    pub manual_review_flags: Vec<String>,
    /// Violations found in the design.
    pub noncompliance_flags: Vec<String>,
}

/// Walks the structural graph and records the measures each target needs.
#[derive(Debug)]
pub struct Applicator<'a> {
    /// Table 8.2.2 for BCA types.
    table: &'a RuleTable,
    /// Thresholds and switches.
    options: &'a EngineOptions,
    /// Members and joints of the project.
    graph: &'a StructuralGraph<'a>,
    /// Measure 3 option and parameters.
    choice: &'a Measure3Choice,
    /// Outcome of the Table 8.2.1 lookup.
    global: &'a GlobalRequirements,
    /// Accumulated output.
    findings: Findings,
}

impl<'a> Applicator<'a> {
    /// Prepare an applicator for one project.
    #[must_use]
    pub fn new(
        table: &'a RuleTable,
        options: &'a EngineOptions,
        graph: &'a StructuralGraph<'a>,
        choice: &'a Measure3Choice,
        global: &'a GlobalRequirements,
    ) -> Self {
        Self {
            table,
            options,
            graph,
            choice,
            global,
            findings: Findings::default(),
        }
    }

    /// Apply every measure and return the accumulated findings.
    #[must_use]
    pub fn apply(mut self) -> Findings {
        self.screen_references();
        self.screen_thickness();
        if self.global.requires(1) {
            self.measure_1();
        }
        if self.global.requires(3) {
            self.measure_3();
        }
        if self.global.requires(4) {
            self.measure_upper_deck(4);
        }
        if self.global.requires(5) {
            self.measure_upper_deck(5);
        }
        self.measure_2();
        self.measure_0();
        debug!(
            entries = self.findings.ledger.len(),
            manual_review = self.findings.manual_review_flags.len(),
            noncompliance = self.findings.noncompliance_flags.len(),
            "measures applied"
        );
        self.findings
    }

    /// Flag joint references that resolve to nothing.
    fn screen_references(&mut self) {
        let flags: Vec<String> = self
            .graph
            .unresolved()
            .iter()
            .map(|reference| match reference {
                UnresolvedReference::Member {
                    joint_id,
                    member_id,
                } => format!(
                    "REF-{joint_id}: joint {joint_id} connects unknown member {member_id}; \
                     it is ignored for rule matching"
                ),
                UnresolvedReference::Joint {
                    joint_id,
                    related_id,
                } => format!(
                    "REF-{joint_id}: joint {joint_id} lists unknown related joint {related_id}"
                ),
            })
            .collect();
        for flag in flags {
            self.review(flag);
        }
    }

    /// Flag every member thicker than the special consideration threshold,
    /// naming the welds that join it.
    fn screen_thickness(&mut self) {
        let threshold = self.options.special_consideration_threshold_mm;
        let graph = self.graph;
        let flags: Vec<String> = graph
            .members()
            .filter_map(|member| {
                let thickness = member.thickness.filter(|t| *t > threshold)?;
                let welds: Vec<&str> = graph
                    .joints_of_member(member)
                    .into_iter()
                    .map(|joint| joint.joint_id.as_str())
                    .collect();
                let welds = if welds.is_empty() {
                    "no joints".to_string()
                } else {
                    format!("joints {}", welds.join(", "))
                };
                Some(format!(
                    "SPECIAL-{id}: member {id} thickness {thickness} mm > {threshold} mm; \
                     special consideration required for {welds}",
                    id = member.member_id
                ))
            })
            .collect();
        for flag in flags {
            self.review(flag);
        }
    }

    /// Measure 1: 100% UT of upper flange block-to-block butts.
    fn measure_1(&mut self) {
        let graph = self.graph;
        let joints: Vec<&Joint> = graph
            .joints()
            .filter(|joint| joint.joint_type == JointType::BlockToBlockButt)
            .collect();
        for joint in joints {
            match joint.zone {
                Zone::CargoHoldRegion => {}
                Zone::Unspecified | Zone::Unknown => {
                    self.review(format!(
                        "M1-{id}-ZONE: zone of block-to-block butt {id} is unspecified or not recognised; \
                         Measure 1 applicability cannot be confirmed",
                        id = joint.joint_id
                    ));
                    continue;
                }
                Zone::OutsideCargoHold => continue,
            }
            let upper_flange = graph
                .connected_members(joint)
                .into_iter()
                .any(|member| member.member_role.is_upper_flange_longitudinal());
            if !upper_flange {
                continue;
            }
            self.record(
                AppliedMeasure::new(1, MeasureStatus::Applied, TargetType::Joint, &joint.joint_id)
                    .requirement("NDE: UT 100% of block-to-block butt welds", REF_MEASURE_1)
                    .condition(format!(
                        "zone=cargo_hold_region AND joint_type=block_to_block_butt AND \
                         connected_to_upper_flange_member ({})",
                        joint.joint_id
                    )),
            );
        }
    }

    /// Measure 3: BCA side plate plus the chosen crack arrest option.
    fn measure_3(&mut self) {
        let graph = self.graph;
        let side_plates: Vec<&Member> = graph
            .members()
            .filter(|m| {
                m.member_role == MemberRole::HatchCoamingSidePlate
                    && m.zone == Zone::CargoHoldRegion
            })
            .collect();
        for member in side_plates {
            let bca = self.bca_label(member, MemberCategory::HatchCoamingSide, 3);
            self.record(
                AppliedMeasure::new(3, MeasureStatus::Applied, TargetType::Member, &member.member_id)
                    .requirement(
                        format!("Provide brittle crack arrest (BCA) steel, type: {bca}"),
                        REF_TABLE_822,
                    )
                    .requirement(
                        "Per Table 8.2.2 for hatch coaming side plate",
                        REF_MEASURE_3,
                    )
                    .condition("Measure 3 required AND role=hatch_coaming_side_plate AND zone=cargo_hold_region"),
            );
        }

        match self.choice.option {
            Measure3Option::BlockShift => self.block_shift(),
            Measure3Option::EnhancedNde => self.enhanced_nde(),
            Measure3Option::CrackArrestHole => self.crack_arrest_hole(),
            Measure3Option::CrackArrestInsert => self.crack_arrest_insert(),
            Measure3Option::Unspecified => self.option_pending(),
            Measure3Option::Unknown => self.option_unrecognised(),
        }
    }

    /// Block shift: stagger of adjacent butts against the minimum offset.
    fn block_shift(&mut self) {
        let min_offset = self.options.block_shift_min_offset_mm;
        let Some(offset) = self.choice.parameters.block_shift_offset_mm else {
            for joint in self.butt_joints() {
                self.record(
                    AppliedMeasure::new(
                        3,
                        MeasureStatus::PendingManualReview,
                        TargetType::Joint,
                        &joint.joint_id,
                    )
                    .requirement(
                        format!("Block shift: offset >= {min_offset} mm required (offset unspecified)"),
                        REF_MEASURE_3,
                    )
                    .condition("measure3_choice.option=block_shift AND block_shift_offset_mm unspecified")
                    .note("block_shift_offset_mm is unspecified; compliance cannot be verified"),
                );
            }
            self.review(format!(
                "M3-BS-OFFSET: block_shift_offset_mm is unspecified; verify offset >= {min_offset} mm"
            ));
            return;
        };

        let graph = self.graph;
        let pass = offset >= min_offset;
        let verdict = if pass { "PASS" } else { "FAIL" };
        for joint in self.butt_joints() {
            let status = if pass {
                MeasureStatus::Applied
            } else {
                MeasureStatus::Noncompliant
            };
            let mut measure = AppliedMeasure::new(3, status, TargetType::Joint, &joint.joint_id)
                .requirement(
                    format!("Block shift offset = {offset} mm (required >= {min_offset} mm): {verdict}"),
                    REF_MEASURE_3,
                )
                .condition(format!("offset={offset}mm >= {min_offset}mm -> {verdict}"));
            let related: Vec<&str> = graph
                .related_joints(joint)
                .into_iter()
                .map(|related| related.joint_id.as_str())
                .collect();
            if !related.is_empty() {
                measure = measure.note(format!("staggered against joints {}", related.join(", ")));
            }
            if !pass {
                measure = measure.note(format!(
                    "NONCOMPLIANCE: offset {offset} mm < required {min_offset} mm"
                ));
                self.noncompliance(format!(
                    "M3-BS-FAIL-{id}: block shift offset {offset} mm < {min_offset} mm at joint {id}",
                    id = joint.joint_id
                ));
            }
            self.record(measure);
        }
    }

    /// Enhanced NDE: stricter acceptance, CTOD demand and no electrogas welding.
    fn enhanced_nde(&mut self) {
        let ctod_min = self.options.ctod_min_mm;
        let egw_permitted = self.options.egw_permitted_with_enhanced_nde;
        let choice = self.choice;
        let parameters = &choice.parameters;
        let method = parameters
            .enhanced_nde_method
            .as_deref()
            .unwrap_or("unspecified");
        let criteria = parameters.enhanced_nde_acceptance_criteria_ref.as_deref();

        for joint in self.butt_joints() {
            let mut status = match criteria {
                Some(_) => MeasureStatus::Applied,
                None => MeasureStatus::Conditional,
            };
            let mut measure = AppliedMeasure::new(3, status, TargetType::Joint, &joint.joint_id)
                .requirement(format!("Enhanced NDE method: {method}"), REF_MEASURE_3)
                .requirement(
                    match criteria {
                        Some(reference) => format!("Stricter acceptance criteria per {reference}"),
                        None => "Stricter acceptance criteria per ShipRight procedure".to_string(),
                    },
                    REF_MEASURE_3,
                )
                .requirement(format!("CTOD >= {ctod_min} mm required"), REF_MEASURE_3)
                .condition(format!(
                    "measure3_choice.option=enhanced_NDE; CTOD>={ctod_min}; EGW_permitted={egw_permitted}"
                ));
            if !egw_permitted {
                measure = measure.requirement(
                    "Electrogas welding (EGW) is not permitted",
                    REF_MEASURE_3,
                );
            }
            if criteria.is_none() {
                measure = measure.note(
                    "enhanced_nde_acceptance_criteria_ref is unspecified; ShipRight document required",
                );
                self.review(format!(
                    "M3-ENDE-REF-{}: enhanced NDE acceptance criteria reference is unspecified",
                    joint.joint_id
                ));
            }
            if joint.weld_process == WeldProcess::Egw && !egw_permitted {
                status = MeasureStatus::Noncompliant;
                measure = measure
                    .note("NONCOMPLIANCE: EGW process used but not permitted with enhanced NDE");
                self.noncompliance(format!(
                    "M3-EGW-{id}: EGW not permitted at joint {id} when enhanced NDE is selected",
                    id = joint.joint_id
                ));
            }
            measure.status = status;
            self.record(measure);
        }
    }

    /// Crack arrest holes at each butt.
    fn crack_arrest_hole(&mut self) {
        let diameter = match self.choice.parameters.hole_diameter_mm {
            Some(diameter) => format!("{diameter} mm"),
            None => "unspecified".to_string(),
        };
        for joint in self.butt_joints() {
            self.record(
                AppliedMeasure::new(3, MeasureStatus::Applied, TargetType::Joint, &joint.joint_id)
                    .requirement(
                        format!("Crack arrest hole fitted (diameter: {diameter})"),
                        REF_MEASURE_3,
                    )
                    .requirement(
                        "Fatigue strength at hole corners and intersections: special assessment required",
                        REF_MEASURE_3,
                    )
                    .condition("measure3_choice.option=crack_arrest_hole")
                    .note("fatigue assessment of the hole detail to be submitted"),
            );
        }
    }

    /// Crack arrest inserts at each butt.
    fn crack_arrest_insert(&mut self) {
        let insert = self
            .choice
            .parameters
            .insert_type
            .clone()
            .unwrap_or_else(|| "unspecified".to_string());
        for joint in self.butt_joints() {
            self.record(
                AppliedMeasure::new(3, MeasureStatus::Applied, TargetType::Joint, &joint.joint_id)
                    .requirement(
                        format!("Crack arrest insert applied (type: {insert})"),
                        REF_MEASURE_3,
                    )
                    .requirement(
                        "Insert plate or weld metal insert as per approved design",
                        REF_MEASURE_3,
                    )
                    .condition("measure3_choice.option=crack_arrest_insert"),
            );
        }
    }

    /// No option chosen: every butt waits for the choice.
    fn option_pending(&mut self) {
        self.review(
            "M3-OPT-UNSPEC: Measure 3 option is unspecified; select one of block_shift, \
             crack_arrest_hole, crack_arrest_insert, enhanced_NDE"
                .to_string(),
        );
        for joint in self.butt_joints() {
            self.record(
                AppliedMeasure::new(
                    3,
                    MeasureStatus::PendingManualChoice,
                    TargetType::Joint,
                    &joint.joint_id,
                )
                .requirement(
                    "Measure 3 option not selected. Choose: block_shift / crack_arrest_hole / \
                     crack_arrest_insert / enhanced_NDE",
                    REF_MEASURE_3,
                )
                .condition("Measure 3 required AND measure3_choice.option unspecified")
                .note("available options listed for user selection"),
            );
        }
    }

    /// Option given but not one the rules define: every butt waits for review.
    fn option_unrecognised(&mut self) {
        let given = self
            .choice
            .unrecognised_option
            .as_deref()
            .unwrap_or("unknown");
        self.review(format!(
            "M3-OPT-UNKNOWN: Measure 3 option {given:?} is not recognised; use one of \
             block_shift, crack_arrest_hole, crack_arrest_insert, enhanced_NDE"
        ));
        for joint in self.butt_joints() {
            self.record(
                AppliedMeasure::new(
                    3,
                    MeasureStatus::PendingManualReview,
                    TargetType::Joint,
                    &joint.joint_id,
                )
                .requirement(
                    format!("Measure 3 option {given:?} is not recognised; no option rule applied"),
                    REF_MEASURE_3,
                )
                .condition("Measure 3 required AND measure3_choice.option unrecognised")
                .note("option value to be corrected before compliance can be assessed"),
            );
        }
    }

    /// Measures 4 and 5: BCA steel for cargo hold upper deck plates.
    fn measure_upper_deck(&mut self, measure_id: u8) {
        let graph = self.graph;
        let decks: Vec<&Member> = graph
            .members()
            .filter(|m| m.member_role == MemberRole::UpperDeckPlate && m.zone == Zone::CargoHoldRegion)
            .collect();
        let (rule_ref, scope) = if measure_id == 4 {
            (REF_MEASURE_4, "upper deck plate in cargo hold region")
        } else {
            (REF_MEASURE_5, "upper deck plate, extended range with separate traceability")
        };
        for member in decks {
            let bca = self.bca_label(member, MemberCategory::UpperDeck, measure_id);
            self.record(
                AppliedMeasure::new(measure_id, MeasureStatus::Applied, TargetType::Member, &member.member_id)
                    .requirement(
                        format!("Provide BCA steel (Measure {measure_id}), type: {bca}"),
                        REF_TABLE_822,
                    )
                    .requirement(format!("Per Table 8.2.2 for {scope}"), rule_ref)
                    .condition(format!(
                        "Measure {measure_id} required AND role=upper_deck_plate AND zone=cargo_hold_region"
                    )),
            );
        }
    }

    /// Measure 2: periodic in-service NDE, required outright or through Note 2.
    fn measure_2(&mut self) {
        let status = if self.global.requires(2) {
            MeasureStatus::Applied
        } else if self.global.is_conditional(2) && self.global.note_2_resolved {
            MeasureStatus::Conditional
        } else {
            return;
        };
        for joint in self.butt_joints() {
            let mut measure = AppliedMeasure::new(2, status, TargetType::Joint, &joint.joint_id)
                .requirement("Periodic in-service NDE required", REF_MEASURE_2)
                .requirement("Frequency and extent to be agreed with the classification society", REF_MEASURE_2);
            measure = match status {
                MeasureStatus::Conditional => measure
                    .condition("Table 8.2.1 see_note_2 AND measure3_choice.option=enhanced_NDE")
                    .note("conditional per Note 2"),
                _ => measure.condition("Table 8.2.1 required"),
            };
            self.record(measure);
        }
    }

    /// Measure 0: welding detail rules that hold regardless of the table.
    fn measure_0(&mut self) {
        let egw_check = self.global.requires(3)
            && self.choice.option == Measure3Option::EnhancedNde
            && !self.options.egw_permitted_with_enhanced_nde;
        let graph = self.graph;
        let joints: Vec<&Joint> = graph.joints().collect();
        for joint in joints {
            if joint.joint_type == JointType::CoamingToDeckConnection {
                self.record(
                    AppliedMeasure::new(0, MeasureStatus::Applied, TargetType::Joint, &joint.joint_id)
                        .requirement(
                            "Approved partial joint penetration (PJP) welding required",
                            REF_WELD_DETAIL,
                        )
                        .condition("joint_type=coaming_to_deck_connection")
                        .note("welding detail rule, always applicable for coaming-to-deck connections"),
                );
            }
            if egw_check && joint.weld_process == WeldProcess::Egw {
                self.record(
                    AppliedMeasure::new(0, MeasureStatus::Noncompliant, TargetType::Joint, &joint.joint_id)
                        .requirement(
                            "Electrogas welding (EGW) is not permitted where enhanced NDE is applied",
                            REF_WELD_DETAIL,
                        )
                        .condition("weld_process=EGW AND measure3_choice.option=enhanced_NDE AND Measure 3 required")
                        .note("NONCOMPLIANCE: EGW weld under enhanced NDE"),
                );
                self.noncompliance(format!(
                    "EGW-NC-{id}: EGW not permitted at joint {id} where enhanced NDE is required",
                    id = joint.joint_id
                ));
            }
        }
    }

    /// Cargo hold block-to-block butts in input order.
    fn butt_joints(&self) -> Vec<&'a Joint> {
        self.graph
            .joints()
            .filter(|joint| {
                joint.joint_type == JointType::BlockToBlockButt
                    && joint.zone == Zone::CargoHoldRegion
            })
            .collect()
    }

    /// BCA type label for a member, flagging what cannot be determined.
    fn bca_label(
        &mut self,
        member: &Member,
        category: MemberCategory,
        measure_id: u8,
    ) -> String {
        let bca = member
            .yield_strength
            .zip(member.thickness)
            .and_then(|(yield_strength, thickness)| {
                self.table.bca_type(category, yield_strength, thickness)
            });
        match bca {
            Some(bca) => bca.to_string(),
            None => {
                self.review(format!(
                    "M{measure_id}-{id}-BCA: BCA type of member {id} cannot be determined \
                     from Table 8.2.2 for {category} (yield strength or thickness unspecified, \
                     or no row matches)",
                    id = member.member_id
                ));
                "unspecified".to_string()
            }
        }
    }

    /// Add an entry to the ledger.
    fn record(&mut self, measure: AppliedMeasure) {
        debug!(
            measure = measure.measure_id,
            target = %measure.target_id,
            status = ?measure.status,
            "measure recorded"
        );
        self.findings.ledger.record(measure);
    }

    /// Raise a manual review flag.
    fn review(&mut self, flag: String) {
        warn!(%flag, "manual review");
        self.findings.manual_review_flags.push(flag);
    }

    /// Raise a noncompliance flag.
    fn noncompliance(&mut self, flag: String) {
        warn!(%flag, "noncompliance");
        self.findings.noncompliance_flags.push(flag);
    }
}
