//! Project input model and its JSON boundary.
//!
//! Every scalar that a drawing or a rule scan may leave blank is an [`Option`].
//! Documents produced by the drafting tools use the placeholder string `"미지정"`
//! for such values; it is accepted here together with `null` and an absent key,
//! and never reaches the engine as a string.

use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::errors::InputError;

/// Placeholder the drafting tools write for a value nobody has filled in yet.
pub const UNSPECIFIED_PLACEHOLDER: &str = "미지정";

/// Structural role of a member within the hatch-coaming arrangement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Strength deck plating.
    UpperDeckPlate,
    /// Vertical side plate of the longitudinal hatch coaming.
    HatchCoamingSidePlate,
    /// Top plate of the longitudinal hatch coaming.
    HatchCoamingTopPlate,
    /// Longitudinal stiffener attached to the upper flange.
    AttachedLongitudinal,
    /// Any other recognised member.
    Other,
    /// A role the engine does not recognise; matches no rule.
    #[serde(other)]
    Unknown,
}

impl Default for MemberRole {
    fn default() -> Self {
        Self::Unknown
    }
}

impl MemberRole {
    /// Return `true` for the roles that make up the hull girder upper flange.
    #[must_use]
    pub fn is_upper_flange_longitudinal(self) -> bool {
        matches!(
            self,
            Self::UpperDeckPlate
                | Self::HatchCoamingSidePlate
                | Self::HatchCoamingTopPlate
                | Self::AttachedLongitudinal
        )
    }
}

/// Longitudinal region of the hull a member or joint belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Within the cargo hold length.
    CargoHoldRegion,
    /// Forward or aft of the cargo hold length.
    OutsideCargoHold,
    /// Not stated on the drawing.
    #[serde(alias = "미지정", alias = "")]
    Unspecified,
    /// A zone the engine does not recognise; matches no rule.
    #[serde(other)]
    Unknown,
}

impl Default for Zone {
    fn default() -> Self {
        Self::Unspecified
    }
}

/// Kind of weld connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointType {
    /// Butt weld joining two construction blocks.
    BlockToBlockButt,
    /// Connection of the coaming side plate to the deck.
    CoamingToDeckConnection,
    /// Fillet attachment of a secondary member.
    AttachmentWeld,
    /// Any other recognised joint.
    Other,
    /// A joint type the engine does not recognise; matches no rule.
    #[serde(other)]
    Unknown,
}

impl Default for JointType {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Welding process used for a joint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeldProcess {
    /// Flux-cored arc welding.
    #[serde(rename = "FCAW")]
    Fcaw,
    /// Gas metal arc welding.
    #[serde(rename = "GMAW")]
    Gmaw,
    /// Electrogas welding.
    #[serde(rename = "EGW")]
    Egw,
    /// Submerged arc welding.
    #[serde(rename = "SAW")]
    Saw,
    /// Shielded metal arc welding.
    #[serde(rename = "SMAW")]
    Smaw,
    /// Any other process.
    #[serde(rename = "other")]
    Other,
    /// Not stated on the drawing.
    #[serde(rename = "unspecified", alias = "미지정", alias = "")]
    Unspecified,
    /// A process the engine does not recognise; matches no rule.
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl Default for WeldProcess {
    fn default() -> Self {
        Self::Unspecified
    }
}

impl fmt::Display for WeldProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fcaw => "FCAW",
            Self::Gmaw => "GMAW",
            Self::Egw => "EGW",
            Self::Saw => "SAW",
            Self::Smaw => "SMAW",
            Self::Other => "other",
            Self::Unspecified => "unspecified",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Crack arrest design option selected for Measure 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure3Option {
    /// Stagger block-to-block butts of adjacent members.
    #[serde(rename = "block_shift")]
    BlockShift,
    /// Crack arrest holes at the butt weld.
    #[serde(rename = "crack_arrest_hole")]
    CrackArrestHole,
    /// Crack arrest insert plates or weld metal inserts.
    #[serde(rename = "crack_arrest_insert")]
    CrackArrestInsert,
    /// Enhanced NDE with stricter acceptance criteria.
    #[serde(rename = "enhanced_NDE")]
    EnhancedNde,
    /// No option chosen yet.
    #[serde(rename = "unspecified", alias = "미지정", alias = "")]
    Unspecified,
    /// An option the rules do not define; matches no option rule.
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl Default for Measure3Option {
    fn default() -> Self {
        Self::Unspecified
    }
}

impl fmt::Display for Measure3Option {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BlockShift => "block_shift",
            Self::CrackArrestHole => "crack_arrest_hole",
            Self::CrackArrestInsert => "crack_arrest_insert",
            Self::EnhancedNde => "enhanced_NDE",
            Self::Unspecified => "unspecified",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

impl Measure3Option {
    /// Options a project document may name, `unspecified` included.
    const LABELLED: [Self; 5] = [
        Self::BlockShift,
        Self::CrackArrestHole,
        Self::CrackArrestInsert,
        Self::EnhancedNde,
        Self::Unspecified,
    ];

    /// Option spelled exactly `label`, if any.
    fn from_label(label: &str) -> Option<Self> {
        Self::LABELLED
            .into_iter()
            .find(|option| option.to_string() == label)
    }
}

/// Descriptive project header carried through to the result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    /// Identifier echoed in the result.
    #[serde(default)]
    pub project_id: String,
    /// Vessel name, when known.
    #[serde(default, deserialize_with = "optional_text")]
    pub vessel_name: Option<String>,
    /// Local date of the assessment.
    #[serde(default, deserialize_with = "optional_text")]
    pub date_local: Option<String>,
    /// IANA timezone of `date_local`.
    #[serde(default, deserialize_with = "optional_text")]
    pub timezone: Option<String>,
}

/// Structural plate as it appears in the project input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Unique member identifier.
    pub member_id: String,
    /// Structural role.
    #[serde(default, deserialize_with = "null_as_default")]
    pub member_role: MemberRole,
    /// Hull region.
    #[serde(default, deserialize_with = "null_as_default")]
    pub zone: Zone,
    /// Specified minimum yield strength in N/mm².
    #[serde(
        default,
        rename = "yield_strength_nmm2",
        deserialize_with = "optional_yield"
    )]
    pub yield_strength: Option<u32>,
    /// Steel grade, e.g. `EH40`.
    #[serde(default, deserialize_with = "optional_text")]
    pub grade: Option<String>,
    /// As-built plate thickness in millimetres.
    #[serde(
        default,
        rename = "thickness_mm_as_built",
        deserialize_with = "optional_number"
    )]
    pub thickness: Option<f64>,
    /// Reference into the drawing set.
    #[serde(default, deserialize_with = "optional_text")]
    pub geometry_ref: Option<String>,
}

impl Member {
    /// Create a member with the given identity and no material data.
    ///
    /// # Examples
    /// ```
    /// use coamingx::{Member, MemberRole, Zone};
    ///
    /// let side = Member::new("M01", MemberRole::HatchCoamingSidePlate, Zone::CargoHoldRegion)
    ///     .with_material(390, 90.0);
    /// assert_eq!(side.yield_strength, Some(390));
    /// ```
    #[must_use]
    pub fn new(member_id: impl Into<String>, member_role: MemberRole, zone: Zone) -> Self {
        Self {
            member_id: member_id.into(),
            member_role,
            zone,
            yield_strength: None,
            grade: None,
            thickness: None,
            geometry_ref: None,
        }
    }

    /// Set yield strength in N/mm² and as-built thickness in millimetres.
    #[must_use]
    pub fn with_material(mut self, yield_strength: u32, thickness: f64) -> Self {
        self.yield_strength = Some(yield_strength);
        self.thickness = Some(thickness);
        self
    }

    /// Set the steel grade.
    #[must_use]
    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = Some(grade.into());
        self
    }
}

/// Weld connection as it appears in the project input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Unique joint identifier.
    pub joint_id: String,
    /// Kind of connection.
    #[serde(default, deserialize_with = "null_as_default")]
    pub joint_type: JointType,
    /// Hull region.
    #[serde(default, deserialize_with = "null_as_default")]
    pub zone: Zone,
    /// Members joined by the weld, in drawing order.
    #[serde(default)]
    pub connected_members: Vec<String>,
    /// Welding process.
    #[serde(default, deserialize_with = "null_as_default")]
    pub weld_process: WeldProcess,
    /// Joints the drawing associates with this one, e.g. the staggered butt of a block shift.
    #[serde(default)]
    pub related_joint_ids: Vec<String>,
}

impl Joint {
    /// Create a joint connecting the given members.
    ///
    /// # Examples
    /// ```
    /// use coamingx::{Joint, JointType, WeldProcess, Zone};
    ///
    /// let butt = Joint::new("J01", JointType::BlockToBlockButt, Zone::CargoHoldRegion, ["M01", "M03"])
    ///     .with_process(WeldProcess::Fcaw);
    /// assert_eq!(butt.connected_members, vec!["M01", "M03"]);
    /// ```
    #[must_use]
    pub fn new<I, S>(joint_id: impl Into<String>, joint_type: JointType, zone: Zone, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            joint_id: joint_id.into(),
            joint_type,
            zone,
            connected_members: members.into_iter().map(Into::into).collect(),
            weld_process: WeldProcess::Unspecified,
            related_joint_ids: Vec::new(),
        }
    }

    /// Set the welding process.
    #[must_use]
    pub fn with_process(mut self, weld_process: WeldProcess) -> Self {
        self.weld_process = weld_process;
        self
    }

    /// Associate related joints.
    #[must_use]
    pub fn with_related<I, S>(mut self, related: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_joint_ids = related.into_iter().map(Into::into).collect();
        self
    }
}

/// Option-specific parameters for Measure 3.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Measure3Parameters {
    /// Stagger between adjacent block butts in millimetres.
    #[serde(default, deserialize_with = "optional_number")]
    pub block_shift_offset_mm: Option<f64>,
    /// Diameter of crack arrest holes in millimetres.
    #[serde(default, deserialize_with = "optional_number")]
    pub hole_diameter_mm: Option<f64>,
    /// Kind of crack arrest insert.
    #[serde(default, deserialize_with = "optional_text")]
    pub insert_type: Option<String>,
    /// Enhanced NDE method, e.g. `UT`, `PAUT` or `TOFD`.
    #[serde(default, deserialize_with = "optional_text")]
    pub enhanced_nde_method: Option<String>,
    /// Document holding the enhanced NDE acceptance criteria.
    #[serde(default, deserialize_with = "optional_text")]
    pub enhanced_nde_acceptance_criteria_ref: Option<String>,
}

/// Selected Measure 3 option with its parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMeasure3Choice")]
pub struct Measure3Choice {
    /// Selected option.
    pub option: Measure3Option,
    /// Parameters of the selected option.
    pub parameters: Measure3Parameters,
    /// Spelling of the option as given, when it is [`Measure3Option::Unknown`].
    #[serde(skip)]
    pub unrecognised_option: Option<String>,
}

impl Measure3Choice {
    /// Create a choice with default parameters.
    ///
    /// # Examples
    /// ```
    /// use coamingx::{Measure3Choice, Measure3Option};
    ///
    /// let choice = Measure3Choice::new(Measure3Option::BlockShift);
    /// assert_eq!(choice.parameters.block_shift_offset_mm, None);
    /// ```
    #[must_use]
    pub fn new(option: Measure3Option) -> Self {
        Self {
            option,
            parameters: Measure3Parameters::default(),
            unrecognised_option: None,
        }
    }
}

/// Measure 3 choice as written in the document, before the option is resolved.
#[derive(Deserialize)]
struct RawMeasure3Choice {
    /// Option spelling; placeholder and blank mean not chosen.
    #[serde(default, deserialize_with = "optional_text")]
    option: Option<String>,
    /// Parameters of the selected option.
    #[serde(default)]
    parameters: Measure3Parameters,
}

impl From<RawMeasure3Choice> for Measure3Choice {
    fn from(raw: RawMeasure3Choice) -> Self {
        let mut choice = Self {
            parameters: raw.parameters,
            ..Self::default()
        };
        if let Some(label) = raw.option {
            let label = label.trim();
            match Measure3Option::from_label(label) {
                Some(option) => choice.option = option,
                None => {
                    choice.option = Measure3Option::Unknown;
                    choice.unrecognised_option = Some(label.to_string());
                }
            }
        }
        choice
    }
}

/// Complete project input for one evaluation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    /// Project header.
    #[serde(default)]
    pub project_meta: ProjectMeta,
    /// Structural members.
    #[serde(default)]
    pub members: Vec<Member>,
    /// Weld joints.
    #[serde(default)]
    pub joints: Vec<Joint>,
    /// Measure 3 design choice.
    #[serde(default)]
    pub measure3_choice: Measure3Choice,
}

impl ProjectInput {
    /// Parse and validate a project document.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Json`] when the document cannot be parsed and the
    /// structural variants of [`InputError`] when [`ProjectInput::validate`] fails.
    pub fn from_json(text: &str) -> Result<Self, InputError> {
        let project: Self =
            serde_json::from_str(text).map_err(|source| InputError::Json { source })?;
        project.validate()?;
        Ok(project)
    }

    /// Check the structural invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::DuplicateMember`], [`InputError::DuplicateJoint`] or
    /// [`InputError::EmptyConnection`] for the first offending entry in input order.
    pub fn validate(&self) -> Result<(), InputError> {
        let mut members = HashSet::new();
        for member in &self.members {
            if !members.insert(member.member_id.as_str()) {
                return Err(InputError::DuplicateMember(member.member_id.clone()));
            }
        }
        let mut joints = HashSet::new();
        for joint in &self.joints {
            if !joints.insert(joint.joint_id.as_str()) {
                return Err(InputError::DuplicateJoint(joint.joint_id.clone()));
            }
            if joint.connected_members.is_empty() {
                return Err(InputError::EmptyConnection(joint.joint_id.clone()));
            }
        }
        Ok(())
    }
}

/// Treat an explicit `null` like an absent key for enum fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Free text where the placeholder and blank strings mean "not given".
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| {
        let trimmed = text.trim();
        !trimmed.is_empty() && trimmed != UNSPECIFIED_PLACEHOLDER
    }))
}

/// Numeric field that may also be `null` or the placeholder string.
fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(NumberVisitor)
}

/// Yield strength field: an integral number of N/mm², `null` or the placeholder.
fn optional_yield<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match deserializer.deserialize_any(NumberVisitor)? {
        None => Ok(None),
        Some(value) if value.fract() == 0.0 && value > 0.0 && value <= f64::from(u32::MAX) => {
            // Integral and in range, so the cast is exact.
            Ok(Some(value as u32))
        }
        Some(value) => Err(de::Error::invalid_value(
            de::Unexpected::Float(value),
            &"a positive integral yield strength in N/mm²",
        )),
    }
}

/// Visitor mapping numbers to `Some` and the "unspecified" spellings to `None`.
struct NumberVisitor;

impl<'de> Visitor<'de> for NumberVisitor {
    type Value = Option<f64>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a finite number, null or {UNSPECIFIED_PLACEHOLDER:?}")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Some(value as f64))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Some(value as f64))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        if value.is_finite() {
            Ok(Some(value))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(value), &self))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == UNSPECIFIED_PLACEHOLDER {
            return Ok(None);
        }
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(Some(number)),
            _ => Err(E::invalid_value(de::Unexpected::Str(value), &self)),
        }
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}
