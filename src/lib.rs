#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

pub mod applicator;
pub mod config;
pub mod control;
pub mod engine;
pub mod errors;
pub mod input;
pub mod requirements;
pub mod result;
pub mod rules;
pub mod structure;

pub use applicator::{Applicator, Findings};
pub use config::{AboveCeilingPolicy, EngineOptions};
pub use control::ControlResolution;
pub use engine::{evaluate, Engine};
pub use errors::{InputError, OptionsError, RuleTableError};
pub use input::{
    Joint, JointType, Measure3Choice, Measure3Option, Measure3Parameters, Member, MemberRole,
    ProjectInput, ProjectMeta, WeldProcess, Zone, UNSPECIFIED_PLACEHOLDER,
};
pub use requirements::GlobalRequirements;
pub use result::{
    AppliedMeasure, ControlValues, EvaluationResult, MeasureStatus, Requirement, Summary,
    TargetLedger, TargetResult, TargetType,
};
pub use rules::{
    BcaType, MeasureRequirement, MemberCategory, RuleTable, Table821Row, Table822Row,
    ThicknessRange, TABLE_821, TABLE_822, TABLE_REVISION,
};
pub use structure::{StructuralGraph, UnresolvedReference};
