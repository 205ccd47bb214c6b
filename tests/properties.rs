use coamingx::{
    evaluate, AppliedMeasure, Joint, JointType, Measure3Choice, Measure3Option, MeasureStatus,
    Member, MemberRole, ProjectInput, TargetLedger, TargetType, WeldProcess, Zone,
};
use proptest::prelude::*;
use proptest::sample::select;

fn role() -> impl Strategy<Value = MemberRole> {
    select(vec![
        MemberRole::UpperDeckPlate,
        MemberRole::HatchCoamingSidePlate,
        MemberRole::HatchCoamingTopPlate,
        MemberRole::AttachedLongitudinal,
        MemberRole::Other,
        MemberRole::Unknown,
    ])
}

fn zone() -> impl Strategy<Value = Zone> {
    select(vec![
        Zone::CargoHoldRegion,
        Zone::CargoHoldRegion,
        Zone::OutsideCargoHold,
        Zone::Unspecified,
        Zone::Unknown,
    ])
}

fn joint_type() -> impl Strategy<Value = JointType> {
    select(vec![
        JointType::BlockToBlockButt,
        JointType::BlockToBlockButt,
        JointType::CoamingToDeckConnection,
        JointType::AttachmentWeld,
        JointType::Unknown,
    ])
}

fn weld_process() -> impl Strategy<Value = WeldProcess> {
    select(vec![
        WeldProcess::Fcaw,
        WeldProcess::Egw,
        WeldProcess::Saw,
        WeldProcess::Unspecified,
        WeldProcess::Unknown,
    ])
}

fn option() -> impl Strategy<Value = Measure3Option> {
    select(vec![
        Measure3Option::BlockShift,
        Measure3Option::CrackArrestHole,
        Measure3Option::CrackArrestInsert,
        Measure3Option::EnhancedNde,
        Measure3Option::Unspecified,
        Measure3Option::Unknown,
    ])
}

fn member(index: usize) -> impl Strategy<Value = Member> {
    (
        role(),
        zone(),
        proptest::option::of(select(vec![315u32, 355, 390, 420, 460])),
        proptest::option::of(30.0f64..130.0),
    )
        .prop_map(move |(role, zone, yield_strength, thickness)| {
            let mut member = Member::new(format!("M{index:02}"), role, zone);
            member.yield_strength = yield_strength;
            member.thickness = thickness;
            member
        })
}

fn project() -> impl Strategy<Value = ProjectInput> {
    (1usize..6, 1usize..6).prop_flat_map(|(member_count, joint_count)| {
        let members: Vec<_> = (0..member_count).map(member).collect();
        let joints: Vec<_> = (0..joint_count)
            .map(|index| {
                (
                    joint_type(),
                    zone(),
                    weld_process(),
                    proptest::collection::vec(0..member_count + 1, 1..3),
                )
                    .prop_map(move |(joint_type, zone, process, connected)| {
                        // Index `member_count` names a member that does not exist.
                        let names: Vec<String> =
                            connected.iter().map(|m| format!("M{m:02}")).collect();
                        Joint::new(format!("J{index:02}"), joint_type, zone, names)
                            .with_process(process)
                    })
            })
            .collect();
        (
            members,
            joints,
            option(),
            proptest::option::of(200.0f64..400.0),
        )
            .prop_map(|(members, joints, option, offset)| {
                let mut project = ProjectInput::default();
                project.members = members;
                project.joints = joints;
                project.measure3_choice = Measure3Choice::new(option);
                project.measure3_choice.parameters.block_shift_offset_mm = offset;
                project
            })
    })
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(project in project()) {
        prop_assert_eq!(evaluate(&project), evaluate(&project.clone()));
    }

    #[test]
    fn targets_hold_one_sorted_entry_per_measure(project in project()) {
        let result = evaluate(&project);
        for target in result.member_results.values().chain(result.joint_results.values()) {
            let ids = target.measure_ids();
            prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "ids {:?}", ids);
            for measure in &target.applied_measures {
                prop_assert_eq!(&measure.target_id, &target.target_id);
                prop_assert_eq!(measure.target_type, target.target_type);
            }
        }
    }

    #[test]
    fn noncompliant_entries_come_with_flags(project in project()) {
        let result = evaluate(&project);
        let summary = result.summary();
        prop_assert_eq!(summary.total_noncompliant > 0, !result.noncompliance_flags.is_empty());
    }

    #[test]
    fn measures_outside_the_table_need_a_global_requirement(project in project()) {
        let result = evaluate(&project);
        for target in result.member_results.values() {
            for id in target.measure_ids() {
                prop_assert!(result.required_measures_global.contains(&id));
            }
        }
    }

    #[test]
    fn the_ledger_never_shrinks(
        entries in proptest::collection::vec(
            (0u8..6, select(vec!["A", "B", "C"]), any::<bool>(), select(vec!["n1", "n2", "n3"])),
            1..40,
        )
    ) {
        let mut ledger = TargetLedger::new();
        let mut previous: Vec<(String, Vec<u8>, Vec<String>, MeasureStatus)> = Vec::new();
        for (measure_id, target, noncompliant, note) in entries {
            let status = if noncompliant { MeasureStatus::Noncompliant } else { MeasureStatus::Applied };
            ledger.record(AppliedMeasure::new(measure_id, status, TargetType::Joint, target).note(note));

            for (target_id, ids, notes, old_status) in &previous {
                let current = ledger.joint(target_id).expect("target kept");
                for id in ids {
                    prop_assert!(current.measure(*id).is_some());
                }
                let kept = current.measure(ids[0]).expect("first measure kept");
                for note in notes {
                    prop_assert!(kept.notes.contains(note));
                }
                if *old_status == MeasureStatus::Noncompliant {
                    prop_assert_eq!(kept.status, MeasureStatus::Noncompliant);
                }
            }
            previous = ["A", "B", "C"]
                .iter()
                .filter_map(|id| ledger.joint(id))
                .map(|t| {
                    let first = &t.applied_measures[0];
                    (t.target_id.clone(), t.measure_ids(), first.notes.clone(), first.status)
                })
                .collect();
        }
    }
}
