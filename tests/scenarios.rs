#![warn(clippy::pedantic)]

use approx::assert_relative_eq;
use coamingx::{
    evaluate, AboveCeilingPolicy, Engine, EngineOptions, EvaluationResult, Joint, JointType,
    Measure3Choice, Measure3Option, MeasureStatus, Member, MemberRole, ProjectInput,
    ThicknessRange, WeldProcess, Zone, TABLE_REVISION,
};

/// Coaming with one deck plate, two cargo hold butts, one butt forward of the
/// hold and one coaming-to-deck connection.
fn coaming(yield_strength: u32, side: f64, top: f64, option: Measure3Option) -> ProjectInput {
    let mut project = ProjectInput::default();
    project.project_meta.project_id = "HC-TEST".to_string();
    project.members = vec![
        Member::new("M01", MemberRole::HatchCoamingSidePlate, Zone::CargoHoldRegion)
            .with_material(yield_strength, side)
            .with_grade("EH40"),
        Member::new("M02", MemberRole::HatchCoamingTopPlate, Zone::CargoHoldRegion)
            .with_material(yield_strength, top),
        Member::new("M03", MemberRole::UpperDeckPlate, Zone::CargoHoldRegion)
            .with_material(yield_strength, 80.0),
    ];
    project.joints = vec![
        Joint::new("J01", JointType::BlockToBlockButt, Zone::CargoHoldRegion, ["M01", "M02"])
            .with_process(WeldProcess::Fcaw),
        Joint::new("J02", JointType::BlockToBlockButt, Zone::CargoHoldRegion, ["M03"])
            .with_process(WeldProcess::Saw),
        Joint::new("J03", JointType::BlockToBlockButt, Zone::OutsideCargoHold, ["M03"])
            .with_process(WeldProcess::Fcaw),
        Joint::new(
            "J04",
            JointType::CoamingToDeckConnection,
            Zone::CargoHoldRegion,
            ["M01", "M03"],
        )
        .with_process(WeldProcess::Gmaw),
    ];
    project.measure3_choice = Measure3Choice::new(option);
    project
}

fn status(result: &EvaluationResult, joint_id: &str, measure_id: u8) -> Option<MeasureStatus> {
    result
        .joint_results
        .get(joint_id)
        .and_then(|target| target.measure(measure_id))
        .map(|measure| measure.status)
}

#[test]
fn scenario_a_thin_355_coaming_needs_no_measure() {
    let result = evaluate(&coaming(355, 60.0, 55.0, Measure3Option::Unspecified));

    assert_relative_eq!(result.control_values.t_control.unwrap_or_default(), 60.0);
    assert_eq!(result.control_values.y_control, Some(355));
    let row = result.table_821_row_used.expect("row matched");
    assert_eq!(row.thickness, ThicknessRange::new(50.0, 65.0));
    assert!(result.required_measures_global.is_empty());
    assert!(result.member_results.is_empty());
    // Only the welding detail rule remains.
    assert_eq!(result.joint_results.len(), 1);
    assert_eq!(status(&result, "J04", 0), Some(MeasureStatus::Applied));
    assert!(result.noncompliance_flags.is_empty());
}

#[test]
fn scenario_b_enhanced_nde_makes_measure_2_conditional() {
    let result = evaluate(&coaming(390, 90.0, 92.0, Measure3Option::EnhancedNde));

    assert_eq!(result.control_values.t_control, Some(92.0));
    let row = result.table_821_row_used.expect("row matched");
    assert_eq!(row.thickness, ThicknessRange::new(85.0, 100.0));
    assert_eq!(result.required_measures_global, vec![1, 3, 4, 5]);
    assert_eq!(result.conditional_measures_global, vec![2]);

    for joint_id in ["J01", "J02"] {
        assert_eq!(status(&result, joint_id, 2), Some(MeasureStatus::Conditional));
        assert_eq!(status(&result, joint_id, 1), Some(MeasureStatus::Applied));
    }
    assert!(!result.joint_results.contains_key("J03"));
    assert_eq!(result.member_results["M01"].measure_ids(), vec![3]);
    assert_eq!(result.member_results["M03"].measure_ids(), vec![4, 5]);
}

#[test]
fn scenario_b_other_options_leave_measure_2_out() {
    let result = evaluate(&coaming(390, 90.0, 92.0, Measure3Option::CrackArrestHole));
    assert_eq!(result.conditional_measures_global, vec![2]);
    assert_eq!(status(&result, "J01", 2), None);
    assert_eq!(status(&result, "J01", 3), Some(MeasureStatus::Applied));
}

#[test]
fn scenario_c_thick_460_coaming_needs_special_consideration() {
    let project = coaming(460, 120.0, 100.0, Measure3Option::CrackArrestInsert);
    let result = evaluate(&project);

    assert!(result.special_consideration);
    assert!(result
        .manual_review_flags
        .iter()
        .any(|flag| flag.contains(">100mm")));
    let row = result.table_821_row_used.expect("top row used");
    assert_eq!(row.thickness, ThicknessRange::new(85.0, 100.0));
    assert_eq!(result.required_measures_global, vec![1, 3, 4, 5]);

    let strict = Engine::default().with_options(EngineOptions {
        above_ceiling: AboveCeilingPolicy::Unmatched,
        ..EngineOptions::default()
    });
    let unmatched = strict.evaluate(&project);
    assert!(unmatched.special_consideration);
    assert!(unmatched.table_821_row_used.is_none());
    assert!(unmatched.required_measures_global.is_empty());
}

#[test]
fn scenario_d_egw_under_enhanced_nde_is_noncompliant() {
    let mut project = coaming(390, 90.0, 92.0, Measure3Option::EnhancedNde);
    project.joints[1].weld_process = WeldProcess::Egw;
    let result = evaluate(&project);

    assert_eq!(status(&result, "J02", 0), Some(MeasureStatus::Noncompliant));
    assert_eq!(status(&result, "J02", 3), Some(MeasureStatus::Noncompliant));
    assert!(!result.noncompliance_flags.is_empty());
    assert!(result
        .noncompliance_flags
        .iter()
        .all(|flag| flag.contains("J02")));
}

#[test]
fn scenario_e_unspecified_option_is_pending_without_noncompliance() {
    let result = evaluate(&coaming(390, 90.0, 92.0, Measure3Option::Unspecified));

    for joint_id in ["J01", "J02"] {
        assert_eq!(
            status(&result, joint_id, 3),
            Some(MeasureStatus::PendingManualChoice)
        );
    }
    assert_eq!(status(&result, "J03", 3), None);
    assert!(result.noncompliance_flags.is_empty());
    assert!(result
        .manual_review_flags
        .iter()
        .any(|flag| flag.contains("block_shift") && flag.contains("enhanced_NDE")));
}

#[test]
fn thickness_boundaries_follow_the_table() {
    let at_85 = evaluate(&coaming(355, 85.0, 80.0, Measure3Option::Unspecified));
    assert_eq!(
        at_85.table_821_row_used.map(|row| row.thickness),
        Some(ThicknessRange::new(65.0, 85.0))
    );
    assert_eq!(at_85.required_measures_global, vec![1]);

    let above_85 = evaluate(&coaming(355, 85.000_000_1, 80.0, Measure3Option::Unspecified));
    assert_eq!(
        above_85.table_821_row_used.map(|row| row.thickness),
        Some(ThicknessRange::new(85.0, 100.0))
    );

    let at_50 = evaluate(&coaming(390, 50.0, 45.0, Measure3Option::Unspecified));
    assert!(at_50.table_821_row_used.is_none());
    assert!(at_50.required_measures_global.is_empty());
    assert!(!at_50.manual_review_flags.is_empty());
}

#[test]
fn egw_on_a_coaming_connection_merges_into_one_entry() {
    let mut project = coaming(390, 90.0, 92.0, Measure3Option::EnhancedNde);
    project.joints[3].weld_process = WeldProcess::Egw;
    let result = evaluate(&project);

    let connection = &result.joint_results["J04"];
    assert_eq!(connection.measure_ids(), vec![0]);
    let entry = connection.measure(0).expect("measure 0 on J04");
    assert_eq!(entry.status, MeasureStatus::Noncompliant);
    assert_eq!(entry.requirements.len(), 2);
    assert_eq!(entry.notes.len(), 2);
}

#[test]
fn project_documents_parse_and_evaluate() {
    let text = include_str!("fixtures/project.json");
    let project = ProjectInput::from_json(text).expect("fixture parses");
    assert_eq!(project.members[3].thickness, None);
    assert_eq!(project.project_meta.vessel_name, None);

    let result = evaluate(&project);
    assert_eq!(result.project_id, "HC-2041");
    assert_eq!(result.table_revision, TABLE_REVISION);
    assert_eq!(result.joint_results["J02"].measure_ids(), vec![0, 1, 2, 3]);
    assert_eq!(status(&result, "J01", 3), Some(MeasureStatus::Conditional));
    assert_eq!(result.noncompliance_flags.len(), 2);

    let json: serde_json::Value =
        serde_json::from_str(&result.to_json_pretty().expect("serialises")).expect("valid JSON");
    assert_eq!(json["control_values"]["t_control"], 92.0);
    assert_eq!(json["joint_results"]["J02"]["applied_measures"][0]["status"], "noncompliant");
    assert_eq!(json["table_821_row_used"]["measures"][1], "see_note_2");
}

#[test]
fn unspecified_scalars_serialise_as_null() {
    let result = evaluate(&ProjectInput::default());
    let json = serde_json::to_value(&result).expect("serialises");
    assert!(json["control_values"]["t_control"].is_null());
    assert!(json["control_values"]["y_control"].is_null());
    assert!(json["table_821_row_used"].is_null());
    assert_eq!(json["special_consideration"], false);
}

#[test]
fn a_misspelled_option_is_reported_by_name() {
    let text = include_str!("fixtures/project.json").replace("\"enhanced_NDE\"", "\"enhanced_nde\"");
    let project = ProjectInput::from_json(&text).expect("fixture parses");
    assert_eq!(project.measure3_choice.option, Measure3Option::Unknown);

    let result = evaluate(&project);
    assert_eq!(result.required_measures_global, vec![1, 3, 4, 5]);
    assert_eq!(status(&result, "J01", 3), Some(MeasureStatus::PendingManualReview));
    assert_eq!(status(&result, "J01", 2), None);
    assert!(result
        .manual_review_flags
        .iter()
        .any(|flag| flag.starts_with("M3-OPT-UNKNOWN") && flag.contains("enhanced_nde")));
    assert!(!result
        .manual_review_flags
        .iter()
        .any(|flag| flag.starts_with("M3-OPT-UNSPEC")));
}

#[test]
fn nan_thickness_never_selects_a_row() {
    let text = include_str!("fixtures/project.json").replace(
        "\"thickness_mm_as_built\": 92",
        "\"thickness_mm_as_built\": \"NaN\"",
    );
    assert!(ProjectInput::from_json(&text).is_err());

    let result = evaluate(&coaming(390, f64::NAN, f64::NAN, Measure3Option::EnhancedNde));
    assert_eq!(result.control_values.t_control, None);
    assert!(result.table_821_row_used.is_none());
    assert!(result.required_measures_global.is_empty());
    assert!(!result.special_consideration);
    assert!(!result
        .manual_review_flags
        .iter()
        .any(|flag| flag.starts_with("T821-EXTRAP-01")));
}
