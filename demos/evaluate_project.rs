use coamingx::{
    Engine, EngineOptions, Joint, JointType, Measure3Choice, Measure3Option, Member, MemberRole,
    ProjectInput, RuleTable, WeldProcess, Zone,
};

fn main() {
    let mut project = ProjectInput::default();
    project.project_meta.project_id = "HC-DEMO".to_string();
    project.members = vec![
        Member::new("M01", MemberRole::HatchCoamingSidePlate, Zone::CargoHoldRegion)
            .with_material(390, 90.0)
            .with_grade("EH40"),
        Member::new("M02", MemberRole::HatchCoamingTopPlate, Zone::CargoHoldRegion)
            .with_material(390, 92.0)
            .with_grade("EH40"),
        Member::new("M03", MemberRole::UpperDeckPlate, Zone::CargoHoldRegion)
            .with_material(390, 85.0)
            .with_grade("EH40"),
    ];
    project.joints = vec![
        Joint::new("J01", JointType::BlockToBlockButt, Zone::CargoHoldRegion, ["M01", "M02"])
            .with_process(WeldProcess::Fcaw)
            .with_related(["J02"]),
        Joint::new("J02", JointType::BlockToBlockButt, Zone::CargoHoldRegion, ["M03"])
            .with_process(WeldProcess::Saw),
        Joint::new("J03", JointType::CoamingToDeckConnection, Zone::CargoHoldRegion, ["M01", "M03"])
            .with_process(WeldProcess::Gmaw),
    ];

    // Block shift with a stagger short of the 300 mm minimum.
    project.measure3_choice = Measure3Choice::new(Measure3Option::BlockShift);
    project.measure3_choice.parameters.block_shift_offset_mm = Some(250.0);

    let engine = Engine::new(RuleTable::builtin(), EngineOptions::default());
    let result = engine.evaluate(&project);

    println!("Required measures: {:?}", result.required_measures_global);
    for (id, target) in result.member_results.iter().chain(&result.joint_results) {
        println!("{id}: measures {:?}", target.measure_ids());
    }
    for flag in &result.noncompliance_flags {
        println!("noncompliance: {flag}");
    }
    for flag in &result.manual_review_flags {
        println!("review: {flag}");
    }
}
