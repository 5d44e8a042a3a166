//! In-memory image of an Abaqus deck after ingestion.
//!
//! Every name (sets, surfaces, materials, amplitudes, ...) is stored
//! upper-cased, and every data row is stored as its comma-separated fields
//! with blanks removed.

use std::collections::BTreeMap;

use a2f_inp::Keyword;

use crate::elements::ElementSection;
use crate::sets::IdSet;

/// Material property blocks, ordered as their cards are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKind {
    Density,
    Elastic,
    Expansion,
    Hyperelastic,
    Plastic,
    Viscoelastic,
    Trs,
    DruckerPrager,
    Creep,
}

impl PropertyKind {
    pub fn from_keyword(keyword: &Keyword) -> Option<Self> {
        match keyword {
            Keyword::Density => Some(PropertyKind::Density),
            Keyword::Elastic => Some(PropertyKind::Elastic),
            Keyword::Expansion => Some(PropertyKind::Expansion),
            Keyword::Hyperelastic => Some(PropertyKind::Hyperelastic),
            Keyword::Plastic => Some(PropertyKind::Plastic),
            Keyword::Viscoelastic => Some(PropertyKind::Viscoelastic),
            Keyword::Trs => Some(PropertyKind::Trs),
            Keyword::DruckerPrager => Some(PropertyKind::DruckerPrager),
            Keyword::Creep => Some(PropertyKind::Creep),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Density => "DENSITY",
            PropertyKind::Elastic => "ELASTIC",
            PropertyKind::Expansion => "EXPANSION",
            PropertyKind::Hyperelastic => "HYPERELASTIC",
            PropertyKind::Plastic => "PLASTIC",
            PropertyKind::Viscoelastic => "VISCOELASTIC",
            PropertyKind::Trs => "TRS",
            PropertyKind::DruckerPrager => "DRUCKER PRAGER",
            PropertyKind::Creep => "CREEP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hardening {
    Isotropic,
    Kinematic,
    Multilinear,
    Bilinear,
}

impl Hardening {
    pub fn as_str(self) -> &'static str {
        match self {
            Hardening::Isotropic => "ISOTROPIC",
            Hardening::Kinematic => "KINEMATIC",
            Hardening::Multilinear => "MULTILINEAR",
            Hardening::Bilinear => "BILINEAR",
        }
    }
}

/// Property-specific header options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyDetail {
    Plain,
    Expansion { reference_temperature: String },
    Hyperelastic { model: String, order: Option<String> },
    Plastic { hardening: Hardening },
    Trs { definition: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub kind: PropertyKind,
    pub orthotropic: bool,
    pub detail: PropertyDetail,
    /// Data lines with the trailing comma removed.
    pub lines: Vec<String>,
}

impl Property {
    pub fn new(kind: PropertyKind, detail: PropertyDetail) -> Self {
        Self {
            kind,
            orthotropic: false,
            detail,
            lines: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Material {
    pub properties: BTreeMap<PropertyKind, Property>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidSection {
    pub elset: String,
    pub material: String,
    pub orientation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Element,
    Node,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub rows: Vec<Vec<String>>,
}

/// `*SURFACE INTERACTION` and the cards that refine it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interaction {
    pub friction: Option<String>,
    pub no_separation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sliding {
    Small,
    Finite,
    Tied,
    SlideOnly,
}

impl Sliding {
    pub fn as_str(self) -> &'static str {
        match self {
            Sliding::Small => "SSLID",
            Sliding::Finite => "FSLID",
            Sliding::Tied => "TIED",
            Sliding::SlideOnly => "SLIDONLY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactPair {
    pub sliding: Sliding,
    pub interaction: Option<String>,
    pub position_tolerance: Option<String>,
    pub adjust: Option<String>,
    pub slave: String,
    pub master: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amplitude {
    pub value: String,
    /// Flattened `time, value, time, value, ...` fields.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadKind {
    Cload,
    Dsload,
    Dload,
    Temperature,
    /// `*BASE MOTION, TYPE=ACCELERATION`
    Acceleration,
    /// Any other `*BASE MOTION` type.
    BaseMotion(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyCase {
    Real,
    Imaginary,
}

impl FrequencyCase {
    pub fn load_case(self) -> u8 {
        match self {
            FrequencyCase::Real => 1,
            FrequencyCase::Imaginary => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Load {
    pub kind: LoadKind,
    pub amplitude: Option<String>,
    pub frequency_case: Option<FrequencyCase>,
    pub dof: Option<String>,
    pub scale: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialCondition {
    pub kind: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Accumulate,
    Replace,
}

/// Boundary or load record switched on by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub id: usize,
    pub op: Operation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteadyStateDynamics {
    pub scale: String,
    pub interval: String,
    pub range: Vec<String>,
    pub damping: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Procedure {
    Static(Vec<Vec<String>>),
    Visco(Vec<Vec<String>>),
    Frequency(Vec<Vec<String>>),
    SteadyState(SteadyStateDynamics),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub boundaries: Vec<Activation>,
    pub loads: Vec<Activation>,
    pub procedure: Option<Procedure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Orientation {
    /// Header options other than `NAME`.
    pub options: BTreeMap<String, String>,
    pub lines: Vec<String>,
}

/// `*SPRING` data: an optional dof line followed by the stiffness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spring {
    pub lines: Vec<String>,
}

impl Spring {
    pub fn dof(&self) -> &str {
        if self.lines.len() >= 2 {
            &self.lines[0]
        } else {
            ""
        }
    }

    pub fn stiffness(&self) -> &str {
        match self.lines.len() {
            0 => "",
            1 => &self.lines[0],
            _ => &self.lines[1],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpcKind {
    Beam,
    Tie,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mpc {
    pub kind: MpcKind,
    pub slave: String,
    pub master: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Field,
    History,
    Diagnostics,
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputScope {
    Model,
    Nodes(String),
    Elements(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEntry {
    pub scope: OutputScope,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRequest {
    pub kind: OutputKind,
    pub frequency: String,
    pub variable: Option<String>,
    pub entries: Vec<OutputEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisFlags {
    pub nlgeom: bool,
    pub eigen: bool,
    pub frequency_response: bool,
}

#[derive(Debug, Clone)]
pub struct SourceModel {
    pub nodes: Vec<String>,
    pub element_sections: Vec<ElementSection>,
    pub nsets: BTreeMap<String, IdSet>,
    pub elsets: BTreeMap<String, IdSet>,
    pub solid_sections: Vec<SolidSection>,
    pub surfaces: BTreeMap<String, Surface>,
    pub materials: BTreeMap<String, Material>,
    pub interactions: BTreeMap<String, Interaction>,
    pub contact_pairs: Vec<ContactPair>,
    pub amplitudes: BTreeMap<String, Amplitude>,
    pub boundaries: Vec<Vec<Vec<String>>>,
    pub loads: Vec<Load>,
    pub initial_conditions: Vec<InitialCondition>,
    /// Index 0 holds model-level activations.
    pub steps: Vec<Step>,
    pub orientations: BTreeMap<String, Orientation>,
    pub springs: BTreeMap<String, Spring>,
    pub mpcs: Vec<Mpc>,
    pub outputs: Vec<OutputRequest>,
    pub flags: AnalysisFlags,
}

impl Default for SourceModel {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            element_sections: Vec::new(),
            nsets: BTreeMap::new(),
            elsets: BTreeMap::new(),
            solid_sections: Vec::new(),
            surfaces: BTreeMap::new(),
            materials: BTreeMap::new(),
            interactions: BTreeMap::new(),
            contact_pairs: Vec::new(),
            amplitudes: BTreeMap::new(),
            boundaries: Vec::new(),
            loads: Vec::new(),
            initial_conditions: Vec::new(),
            steps: vec![Step::default()],
            orientations: BTreeMap::new(),
            springs: BTreeMap::new(),
            mpcs: Vec::new(),
            outputs: Vec::new(),
            flags: AnalysisFlags::default(),
        }
    }
}

impl SourceModel {
    /// Element section holding `id`, with the element's node list.
    pub fn find_element(&self, id: u64) -> Option<(&ElementSection, &[u64])> {
        self.element_sections
            .iter()
            .find(|sec| sec.contains(id))
            .and_then(|sec| sec.nodes_of(id).map(|nodes| (sec, nodes)))
    }

    /// Groups defined inherently by `*ELEMENT, ELSET=`.
    pub fn inherent_groups(&self) -> impl Iterator<Item = &str> {
        self.element_sections
            .iter()
            .filter_map(|sec| sec.group.as_deref())
    }

    /// Number of user steps (excluding the model-level entry).
    pub fn step_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }
}
