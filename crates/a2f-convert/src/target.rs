//! FrontISTR-side model produced by the converter.

use std::collections::BTreeMap;

use a2f_model::{
    AnalysisFlags, ElementSection, FrequencyCase, Hardening, IdSet, PropertyKind, Sliding,
};

/// Maps a name onto the character set accepted by FrontISTR group names.
///
/// # Examples
///
/// ```
/// use a2f_convert::name_mod;
///
/// assert_eq!(name_mod("fix#1/a"), "FIX_SHRP_1_SLSH_A");
/// assert_eq!(name_mod("all"), "SETALL_GENERATED_BY_A2FCONV");
/// ```
pub fn name_mod(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '#' => out.push_str("_shrp_"),
            '/' => out.push_str("_slsh_"),
            '@' => out.push_str("_at_"),
            '+' => out.push_str("_plus_"),
            '$' => out.push_str("_dl_"),
            '%' => out.push_str("_per_"),
            '~' => out.push_str("_tilda_"),
            ',' => out.push_str("_comma_"),
            '(' => out.push_str("_lb_"),
            ')' => out.push_str("_rb_"),
            other => out.push(other),
        }
    }
    let out = out.to_ascii_uppercase();
    if out == "ALL" {
        "SETALL_GENERATED_BY_A2FCONV".to_string()
    } else {
        out
    }
}

/// Leading field of a boundary, load or initial-condition record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordTarget {
    /// Group name or node/element ID.
    Ref(String),
    /// The whole model.
    All,
}

/// One data row addressed to a group, node or the whole model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub target: RecordTarget,
    pub values: Vec<String>,
}

impl Record {
    pub fn new(target: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            target: RecordTarget::Ref(target.into()),
            values,
        }
    }

    pub fn all(values: Vec<String>) -> Self {
        Self {
            target: RecordTarget::All,
            values,
        }
    }

    /// Group name when the record addresses a named group or ID.
    pub fn reference(&self) -> Option<&str> {
        match &self.target {
            RecordTarget::Ref(name) => Some(name),
            RecordTarget::All => None,
        }
    }

    /// `target, v1, v2, ...` with the target passed through [`name_mod`].
    pub fn render(&self) -> String {
        let mut out = match &self.target {
            RecordTarget::Ref(name) => name_mod(name),
            RecordTarget::All => "ALL".to_string(),
        };
        for value in &self.values {
            out.push_str(", ");
            out.push_str(value);
        }
        out
    }
}

/// Element-face pair of a surface group; faces are 1-based.
pub type SurfaceFace = (u64, usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub elset: String,
    pub material: String,
    pub orientation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProperty {
    pub kind: PropertyKind,
    pub orthotropic: bool,
    /// Temperature-dependent data.
    pub dependent: bool,
    /// Yield criterion and hardening rule for `PLASTIC`.
    pub hardening: Option<Hardening>,
    /// Hyperelastic model tag, with `_A<N>` for Ogden.
    pub model: Option<String>,
    /// `EXPANSION` reference temperature.
    pub reference_temperature: Option<String>,
    /// `TRS` definition.
    pub definition: Option<String>,
    pub lines: Vec<String>,
}

impl TargetProperty {
    pub fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            orthotropic: false,
            dependent: false,
            hardening: None,
            model: None,
            reference_temperature: None,
            definition: None,
            lines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMaterial {
    /// Property cards keyed (and therefore ordered) by kind.
    Solid(BTreeMap<PropertyKind, TargetProperty>),
    /// Synthetic material of a `*SPRING` element set.
    Spring { stiffness: String, dof: String },
}

impl TargetMaterial {
    pub fn property(&self, kind: PropertyKind) -> Option<&TargetProperty> {
        match self {
            TargetMaterial::Solid(props) => props.get(&kind),
            TargetMaterial::Spring { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetContact {
    pub sliding: Sliding,
    pub friction: String,
    pub adjust: Option<String>,
    /// Node group.
    pub slave: String,
    /// Surface group.
    pub master: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLoadKind {
    Cload,
    /// Surface pressure or, with `gravity`, a body load.
    Dload { gravity: bool },
    Temperature,
    Acceleration,
    /// Unsupported source load kept only to preserve numbering.
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLoad {
    pub kind: TargetLoadKind,
    pub amplitude: Option<String>,
    pub frequency_case: Option<FrequencyCase>,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInitialCondition {
    pub kind: String,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyResponse {
    pub scale: String,
    pub interval: String,
    pub low: String,
    pub high: String,
    pub points: String,
    pub alpha: String,
    pub beta: String,
}

impl FrequencyResponse {
    /// Result interval code of the `!DYNAMIC` output line.
    pub fn interval_code(&self) -> u32 {
        let mut code = 1;
        if self.scale == "LOGARITHMIC" {
            code += 1;
        }
        if self.interval == "EIGENFREQUENCY" {
            code += 2;
        }
        code
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetProcedure {
    Static,
    /// First two fields of the `*VISCO` data line.
    Visco(String),
    Eigen { count: String, max_iter: u64 },
    FrequencyResponse(FrequencyResponse),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetStep {
    /// 0-based boundary group indices.
    pub boundaries: Vec<usize>,
    /// 0-based load indices.
    pub loads: Vec<usize>,
    pub procedure: Option<TargetProcedure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidAxis {
    /// Rotation about global axis 1, 2 or 3.
    Rotation(u8),
    AllTranslational,
}

impl RigidAxis {
    /// `DOF=` value of `!RIGIDLINK`.
    pub fn dof(self) -> String {
        match self {
            RigidAxis::Rotation(axis) => (axis + 3).to_string(),
            RigidAxis::AllTranslational => "123".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RigidLink {
    pub master: u64,
    pub slaves: Vec<u64>,
    pub axis: RigidAxis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAmplitude {
    pub value: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOutput {
    pub group: String,
    pub frequency: String,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPlan {
    /// `VARIABLE=PRESELECT` was requested.
    pub vtk_default: bool,
    pub vtk: Vec<String>,
    pub node_text: Vec<TextOutput>,
    pub element_text: Vec<TextOutput>,
}

impl OutputPlan {
    pub fn push_vtk(&mut self, variable: &str) {
        if !self.vtk.iter().any(|v| v == variable) {
            self.vtk.push(variable.to_string());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TargetModel {
    pub nodes: Vec<String>,
    pub element_sections: Vec<ElementSection>,
    pub node_groups: BTreeMap<String, IdSet>,
    pub element_groups: BTreeMap<String, IdSet>,
    pub surface_groups: BTreeMap<String, Vec<SurfaceFace>>,
    pub sections: Vec<Section>,
    pub materials: BTreeMap<String, TargetMaterial>,
    pub contact_pairs: Vec<TargetContact>,
    pub boundaries: Vec<Vec<Record>>,
    pub loads: Vec<TargetLoad>,
    pub initial_conditions: Vec<TargetInitialCondition>,
    pub steps: Vec<TargetStep>,
    pub orientations: BTreeMap<String, String>,
    pub rigid_links: Vec<RigidLink>,
    pub amplitudes: BTreeMap<String, TargetAmplitude>,
    pub outputs: OutputPlan,
    pub reference_temperature: Option<String>,
    pub flags: AnalysisFlags,
}

impl TargetModel {
    /// Groups defined inherently by element blocks.
    pub fn inherent_groups(&self) -> impl Iterator<Item = &str> {
        self.element_sections
            .iter()
            .filter_map(|sec| sec.group.as_deref())
    }

    /// Node IDs of a node group, or the ID itself for a numeric reference.
    pub fn resolve_nodes(&self, reference: &str) -> Option<Vec<u64>> {
        if let Ok(id) = reference.parse::<u64>() {
            return Some(vec![id]);
        }
        self.node_groups.get(reference).map(IdSet::members)
    }
}
