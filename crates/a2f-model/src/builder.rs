//! Single-pass ingestion of a deck into a [`SourceModel`].
//!
//! Each header switches the builder into the section's mode and runs its
//! entry routine (validating options, opening an accumulator); each data
//! line is then routed to the mode's ingestion routine. All cursors live in
//! an explicit [`ParseContext`] owned by the builder.

use a2f_inp::{DataLine, Header, Keyword, Line, LineStream, split_fields};
use log::{debug, info, trace, warn};
use nalgebra::Vector3;

use crate::elements::ElementSection;
use crate::error::{ConvertError, Result};
use crate::frame::{CoordinateFrame, NodeLineFormat};
use crate::sets::{SetBlock, parse_id};
use crate::source::{
    Activation, Amplitude, ContactPair, FrequencyCase, Hardening, InitialCondition, Interaction,
    Load, LoadKind, Material, Mpc, MpcKind, Operation, Orientation, OutputEntry, OutputKind,
    OutputRequest, OutputScope, Procedure, Property, PropertyDetail, PropertyKind, Sliding,
    SolidSection, SourceModel, Spring, SteadyStateDynamics, Step, Surface, SurfaceKind,
};
use crate::topology::ElementType;

/// Parses deck text into a source model.
pub fn build_source_model(input: &str) -> Result<SourceModel> {
    SourceModelBuilder::new().build(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementFixup {
    None,
    Tet10,
    Spring1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetTarget {
    Node,
    Element,
}

/// Defaults of the open `*CONTACT PAIR` / `*TIE` block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PairDefaults {
    sliding: Sliding,
    interaction: Option<String>,
    position_tolerance: Option<String>,
    adjust: Option<String>,
}

/// Cursor state carried between lines.
#[derive(Debug, Default)]
pub struct ParseContext {
    mode: Option<Keyword>,
    frame: CoordinateFrame,
    node_format: Option<NodeLineFormat>,
    element_fixup: Option<ElementFixup>,
    set: Option<(SetTarget, String)>,
    surface: Option<String>,
    material: Option<String>,
    property: Option<PropertyKind>,
    interaction: Option<String>,
    pair: Option<PairDefaults>,
    amplitude: Option<String>,
    spring: Option<String>,
    orientation: Option<String>,
}

#[derive(Debug, Default)]
pub struct SourceModelBuilder {
    model: SourceModel,
    ctx: ParseContext,
}

impl SourceModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self, input: &str) -> Result<SourceModel> {
        let mut stream = LineStream::new(input);
        while let Some(line) = stream.next_line()? {
            match line {
                Line::Header(header) => self.enter(&header)?,
                Line::Data(data) => {
                    let mode = self.ctx.mode.take();
                    let outcome = self.ingest(mode.as_ref(), data, &mut stream);
                    self.ctx.mode = mode;
                    outcome?;
                }
            }
        }

        let model = self.model;
        info!(
            "read {} node lines, {} element blocks, {} materials, {} steps",
            model.nodes.len(),
            model.element_sections.len(),
            model.materials.len(),
            model.step_count()
        );
        Ok(model)
    }

    fn enter(&mut self, header: &Header) -> Result<()> {
        trace!("*{} (line {})", header.name, header.line);
        match &header.keyword {
            Keyword::Node => self.ctx.node_format = None,
            Keyword::System => self.ctx.frame = CoordinateFrame::default(),
            Keyword::Element => self.enter_element(header)?,
            Keyword::Nset => self.enter_set(header, SetTarget::Node)?,
            Keyword::Elset => self.enter_set(header, SetTarget::Element)?,
            Keyword::SolidSection => {
                let elset = canonical(required(header, "ELSET")?);
                let material = canonical(required(header, "MATERIAL")?);
                self.model.solid_sections.push(SolidSection {
                    elset,
                    material,
                    orientation: header.option("ORIENTATION").map(canonical),
                });
            }
            Keyword::Surface => self.enter_surface(header)?,
            Keyword::Material => {
                let name = canonical(required(header, "NAME")?);
                self.model.materials.insert(name.clone(), Material::default());
                self.ctx.material = Some(name);
                self.ctx.property = None;
            }
            Keyword::Density
            | Keyword::Elastic
            | Keyword::Expansion
            | Keyword::Hyperelastic
            | Keyword::Plastic
            | Keyword::Viscoelastic
            | Keyword::Trs
            | Keyword::DruckerPrager
            | Keyword::Creep => self.enter_property(header)?,
            Keyword::SurfaceInteraction => {
                let name = canonical(required(header, "NAME")?);
                self.model.interactions.insert(name.clone(), Interaction::default());
                self.ctx.interaction = Some(name);
            }
            Keyword::SurfaceBehavior => {
                let interaction = self.open_interaction(header)?;
                if header.has_flag("NOSEPARATION") {
                    interaction.no_separation = true;
                }
            }
            Keyword::Friction => {
                self.open_interaction(header)?;
            }
            Keyword::ContactPair => {
                let interaction = canonical(required(header, "INTERACTION")?);
                let sliding = if header.has_flag("SMALLSLIDING") {
                    Sliding::Small
                } else {
                    Sliding::Finite
                };
                let adjust = upper_option(header, "ADJUST").filter(|a| a != "NO");
                self.ctx.pair = Some(PairDefaults {
                    sliding,
                    interaction: Some(interaction),
                    position_tolerance: None,
                    adjust,
                });
            }
            Keyword::Tie => {
                let tolerance = header.option("POSITIONTOLERANCE").unwrap_or("0.0");
                let adjust = upper_option(header, "ADJUST")
                    .filter(|a| a == "YES")
                    .map(|_| "0.0".to_string());
                self.ctx.pair = Some(PairDefaults {
                    sliding: Sliding::Tied,
                    interaction: None,
                    position_tolerance: Some(tolerance.to_string()),
                    adjust,
                });
            }
            Keyword::Amplitude => {
                let name = canonical(required(header, "NAME")?);
                if upper_option(header, "TIME").as_deref() == Some("TOTALTIME") {
                    return Err(ConvertError::unsupported("AMPLITUDE", "TIME=TOTAL TIME"));
                }
                let value = header.option("VALUE").unwrap_or("RELATIVE").to_ascii_uppercase();
                self.model.amplitudes.insert(
                    name.clone(),
                    Amplitude {
                        value,
                        values: Vec::new(),
                    },
                );
                self.ctx.amplitude = Some(name);
            }
            Keyword::Boundary => {
                self.model.boundaries.push(Vec::new());
                let activation = Activation {
                    id: self.model.boundaries.len() - 1,
                    op: operation(header),
                };
                self.current_step().boundaries.push(activation);
            }
            Keyword::Cload
            | Keyword::Dsload
            | Keyword::Dload
            | Keyword::Temperature
            | Keyword::BaseMotion => self.enter_load(header)?,
            Keyword::InitialConditions => {
                let kind = required(header, "TYPE")?.to_ascii_uppercase();
                self.model.initial_conditions.push(InitialCondition {
                    kind,
                    rows: Vec::new(),
                });
            }
            Keyword::Step => {
                self.model.steps.push(Step::default());
                let nlgeom = upper_option(header, "NLGEOM");
                if nlgeom.as_deref() == Some("YES") || header.has_flag("NLGEOM") {
                    self.model.flags.nlgeom = true;
                }
                debug!("step {} opened", self.model.step_count());
            }
            Keyword::Static => self.set_procedure(header, Procedure::Static(Vec::new()))?,
            Keyword::Visco => {
                self.model.flags.nlgeom = true;
                self.set_procedure(header, Procedure::Visco(Vec::new()))?;
            }
            Keyword::Frequency => {
                self.model.flags.eigen = true;
                self.set_procedure(header, Procedure::Frequency(Vec::new()))?;
            }
            Keyword::SteadyStateDynamics => self.enter_steady_state(header)?,
            Keyword::ModalDamping => {
                if header.has_flag("STRUCTURAL") {
                    return Err(ConvertError::unsupported("MODAL DAMPING", "STRUCTURAL"));
                }
                if header.has_flag("MODAL") || !header.has_flag("RAYLEIGH") {
                    return Err(ConvertError::unsupported("MODAL DAMPING", "MODAL"));
                }
                self.require_user_step(header)?;
            }
            Keyword::Spring => {
                let elset = canonical(required(header, "ELSET")?);
                self.model.springs.insert(elset.clone(), Spring::default());
                self.ctx.spring = Some(elset);
            }
            Keyword::Orientation => {
                let name = canonical(required(header, "NAME")?);
                let options = header
                    .options
                    .iter()
                    .filter(|(k, _)| k.as_str() != "NAME")
                    .map(|(k, v)| (k.clone(), v.to_ascii_uppercase()))
                    .collect();
                self.model.orientations.insert(
                    name.clone(),
                    Orientation {
                        options,
                        lines: Vec::new(),
                    },
                );
                self.ctx.orientation = Some(name);
            }
            Keyword::Mpc => {}
            Keyword::Output => {
                let kind = if header.has_flag("FIELD") {
                    OutputKind::Field
                } else if header.has_flag("HISTORY") {
                    OutputKind::History
                } else if header.has_flag("DIAGNOSTICS") {
                    OutputKind::Diagnostics
                } else {
                    OutputKind::Unspecified
                };
                self.model.outputs.push(OutputRequest {
                    kind,
                    frequency: header.option("FREQUENCY").unwrap_or("1").to_string(),
                    variable: upper_option(header, "VARIABLE"),
                    entries: Vec::new(),
                });
            }
            Keyword::NodeOutput | Keyword::ContactOutput | Keyword::ElementOutput => {
                let scope = match (&header.keyword, header.option("NSET"), header.option("ELSET")) {
                    (Keyword::ElementOutput, _, Some(elset)) => OutputScope::Elements(canonical(elset)),
                    (Keyword::ElementOutput, _, None) => OutputScope::Model,
                    (_, Some(nset), _) => OutputScope::Nodes(canonical(nset)),
                    (_, None, _) => OutputScope::Model,
                };
                let Some(request) = self.model.outputs.last_mut() else {
                    return Err(ConvertError::structural(format!(
                        "*{} (line {}) appears before any *OUTPUT",
                        header.name, header.line
                    )));
                };
                request.entries.push(OutputEntry {
                    scope,
                    variables: Vec::new(),
                });
            }
            Keyword::Part => {
                return Err(ConvertError::unsupported("PART", "part/assembly structured input"));
            }
            Keyword::Unknown(name) => info!("*{name} was skipped"),
        }
        self.ctx.mode = Some(header.keyword.clone());
        Ok(())
    }

    fn ingest(&mut self, mode: Option<&Keyword>, data: DataLine, stream: &mut LineStream) -> Result<()> {
        let Some(mode) = mode else {
            warn!("line {}: data before the first card ignored", data.line);
            return Ok(());
        };
        match mode {
            Keyword::Node => self.ingest_node(&data)?,
            Keyword::System => {
                let values = reals(&data)?;
                self.ctx.frame.accept(&values)?;
            }
            Keyword::Element => self.ingest_element(data, stream)?,
            Keyword::Nset | Keyword::Elset => {
                let Some((target, name)) = &self.ctx.set else {
                    return Ok(());
                };
                let sets = match target {
                    SetTarget::Node => &mut self.model.nsets,
                    SetTarget::Element => &mut self.model.elsets,
                };
                if let Some(set) = sets.get_mut(name) {
                    set.push_line(&data.fields(), data.line)?;
                }
            }
            Keyword::Surface => {
                if let Some(surface) = self
                    .ctx
                    .surface
                    .as_ref()
                    .and_then(|name| self.model.surfaces.get_mut(name))
                {
                    surface.rows.push(named_row(&data));
                }
            }
            Keyword::Density
            | Keyword::Elastic
            | Keyword::Expansion
            | Keyword::Hyperelastic
            | Keyword::Plastic
            | Keyword::Viscoelastic
            | Keyword::Trs
            | Keyword::DruckerPrager
            | Keyword::Creep => {
                let (Some(material), Some(kind)) = (&self.ctx.material, self.ctx.property) else {
                    return Ok(());
                };
                if let Some(property) = self
                    .model
                    .materials
                    .get_mut(material)
                    .and_then(|m| m.properties.get_mut(&kind))
                {
                    property.lines.push(normalize_property_line(&data.text));
                }
            }
            Keyword::Friction => {
                if let Some(interaction) = self
                    .ctx
                    .interaction
                    .as_ref()
                    .and_then(|name| self.model.interactions.get_mut(name))
                {
                    interaction.friction = data.fields().into_iter().next();
                }
            }
            Keyword::ContactPair | Keyword::Tie => {
                let Some(defaults) = self.ctx.pair.as_mut() else {
                    return Ok(());
                };
                let fields = row_fields(&data);
                if fields.len() < 2 {
                    return Err(ConvertError::parse(
                        data.line,
                        "contact pair needs a slave and a master surface",
                    ));
                }
                self.model.contact_pairs.push(ContactPair {
                    sliding: defaults.sliding,
                    interaction: defaults.interaction.clone(),
                    position_tolerance: defaults.position_tolerance.clone(),
                    // only the first pair of a block is adjusted
                    adjust: defaults.adjust.take(),
                    slave: canonical(&fields[0]),
                    master: canonical(&fields[1]),
                });
            }
            Keyword::Amplitude => {
                if let Some(amplitude) = self
                    .ctx
                    .amplitude
                    .as_ref()
                    .and_then(|name| self.model.amplitudes.get_mut(name))
                {
                    amplitude
                        .values
                        .extend(data.fields().into_iter().filter(|f| !f.is_empty()));
                }
            }
            Keyword::Boundary => {
                if let Some(block) = self.model.boundaries.last_mut() {
                    block.push(named_row(&data));
                }
            }
            Keyword::Cload
            | Keyword::Dsload
            | Keyword::Dload
            | Keyword::Temperature
            | Keyword::BaseMotion => {
                if let Some(load) = self.model.loads.last_mut() {
                    load.rows.push(named_row(&data));
                }
            }
            Keyword::InitialConditions => {
                if let Some(ic) = self.model.initial_conditions.last_mut() {
                    ic.rows.push(named_row(&data));
                }
            }
            Keyword::Static | Keyword::Visco | Keyword::Frequency => {
                let fields = row_fields(&data);
                match self.current_step().procedure.as_mut() {
                    Some(Procedure::Static(lines))
                    | Some(Procedure::Visco(lines))
                    | Some(Procedure::Frequency(lines)) => lines.push(fields),
                    _ => {}
                }
            }
            Keyword::SteadyStateDynamics => {
                let fields = row_fields(&data);
                if let Some(Procedure::SteadyState(ssd)) = self.current_step().procedure.as_mut() {
                    ssd.range = fields;
                }
            }
            Keyword::ModalDamping => {
                let fields = row_fields(&data);
                match self.current_step().procedure.as_mut() {
                    Some(Procedure::SteadyState(ssd)) => ssd.damping = fields,
                    _ => {
                        return Err(ConvertError::structural(format!(
                            "*MODAL DAMPING (line {}) needs a *STEADY STATE DYNAMICS step",
                            data.line
                        )));
                    }
                }
            }
            Keyword::Spring => {
                if let Some(spring) = self
                    .ctx
                    .spring
                    .as_ref()
                    .and_then(|name| self.model.springs.get_mut(name))
                {
                    let compact: String = data.text.chars().filter(|c| !c.is_whitespace()).collect();
                    spring.lines.push(normalize_property_line(&compact));
                }
            }
            Keyword::Orientation => {
                if let Some(orientation) = self
                    .ctx
                    .orientation
                    .as_ref()
                    .and_then(|name| self.model.orientations.get_mut(name))
                {
                    orientation.lines.push(data.text.trim().to_string());
                }
            }
            Keyword::Mpc => self.ingest_mpc(&data)?,
            Keyword::NodeOutput | Keyword::ContactOutput | Keyword::ElementOutput => {
                if let Some(entry) = self
                    .model
                    .outputs
                    .last_mut()
                    .and_then(|request| request.entries.last_mut())
                {
                    entry.variables.extend(
                        data.fields()
                            .into_iter()
                            .filter(|f| !f.is_empty())
                            .map(|f| f.to_ascii_uppercase()),
                    );
                }
            }
            Keyword::SolidSection
            | Keyword::Material
            | Keyword::SurfaceInteraction
            | Keyword::SurfaceBehavior
            | Keyword::Step
            | Keyword::Output
            | Keyword::Part
            | Keyword::Unknown(_) => {}
        }
        Ok(())
    }

    fn enter_element(&mut self, header: &Header) -> Result<()> {
        let type_name = required(header, "TYPE")?.to_ascii_uppercase();
        let element_type = ElementType::from_abaqus(&type_name)
            .ok_or_else(|| ConvertError::unsupported("ELEMENT", format!("TYPE={type_name}")))?;
        let fixup = if element_type.needs_tet10_renumbering() {
            ElementFixup::Tet10
        } else if type_name == "SPRING1" {
            ElementFixup::Spring1
        } else {
            ElementFixup::None
        };
        info!("reading *ELEMENT, TYPE={type_name}");
        self.model.element_sections.push(ElementSection::new(
            element_type,
            header.option("ELSET").map(canonical),
        ));
        self.ctx.element_fixup = Some(fixup);
        Ok(())
    }

    fn enter_set(&mut self, header: &Header, target: SetTarget) -> Result<()> {
        let key = match target {
            SetTarget::Node => "NSET",
            SetTarget::Element => "ELSET",
        };
        let name = canonical(required(header, key)?);
        let block = if header.has_flag("GENERATE") {
            SetBlock::Generate(Vec::new())
        } else {
            SetBlock::Explicit(Vec::new())
        };
        let sets = match target {
            SetTarget::Node => &mut self.model.nsets,
            SetTarget::Element => &mut self.model.elsets,
        };
        sets.entry(name.clone()).or_default().blocks.push(block);
        self.ctx.set = Some((target, name));
        Ok(())
    }

    fn enter_surface(&mut self, header: &Header) -> Result<()> {
        let name = canonical(required(header, "NAME")?);
        let kind = match upper_option(header, "TYPE").as_deref() {
            None | Some("ELEMENT") => SurfaceKind::Element,
            Some("NODE") => SurfaceKind::Node,
            Some(other) => return Err(ConvertError::unsupported("SURFACE", format!("TYPE={other}"))),
        };
        self.model.surfaces.insert(
            name.clone(),
            Surface {
                kind,
                rows: Vec::new(),
            },
        );
        self.ctx.surface = Some(name);
        Ok(())
    }

    fn enter_property(&mut self, header: &Header) -> Result<()> {
        let Some(kind) = PropertyKind::from_keyword(&header.keyword) else {
            return Ok(());
        };
        let Some(material) = self.ctx.material.clone() else {
            return Err(ConvertError::structural(format!(
                "*{} (line {}) appears outside of a *MATERIAL",
                kind.as_str(),
                header.line
            )));
        };

        let mut orthotropic = false;
        let detail = match kind {
            PropertyKind::Elastic => {
                match upper_option(header, "TYPE").as_deref() {
                    None | Some("ISOTROPIC") => {}
                    Some("ENGINEERINGCONSTANTS") => orthotropic = true,
                    Some(other) => {
                        return Err(ConvertError::unsupported("ELASTIC", format!("TYPE={other}")));
                    }
                }
                PropertyDetail::Plain
            }
            PropertyKind::Expansion => {
                orthotropic = upper_option(header, "TYPE").as_deref() == Some("ORTHO");
                PropertyDetail::Expansion {
                    reference_temperature: header.option("ZERO").unwrap_or("0.0").to_string(),
                }
            }
            PropertyKind::Hyperelastic => {
                self.model.flags.nlgeom = true;
                let (model, order) = if header.has_flag("MOONEY-RIVLIN") {
                    ("MOONEY-RIVLIN", None)
                } else if header.has_flag("OGDEN") {
                    ("OGDEN", Some(header.option("N").unwrap_or("1").to_string()))
                } else if header.has_flag("NEOHOOKE") {
                    ("NEOHOOKE", None)
                } else if header.has_flag("ARRUDA-BOYCE") {
                    ("ARRUDA-BOYCE", None)
                } else {
                    ("NONE", None)
                };
                PropertyDetail::Hyperelastic {
                    model: model.to_string(),
                    order,
                }
            }
            PropertyKind::Viscoelastic => {
                if let Some(time) = upper_option(header, "TIME")
                    && time != "PRONY"
                {
                    return Err(ConvertError::unsupported("VISCOELASTIC", format!("TIME={time}")));
                }
                PropertyDetail::Plain
            }
            PropertyKind::Trs => PropertyDetail::Trs {
                definition: upper_option(header, "DEFINITION"),
            },
            PropertyKind::Plastic => {
                let hardening = match upper_option(header, "HARDENING").as_deref() {
                    None | Some("ISOTROPIC") => Hardening::Isotropic,
                    Some("KINEMATIC") => Hardening::Kinematic,
                    Some(other) => {
                        return Err(ConvertError::unsupported("PLASTIC", format!("HARDENING={other}")));
                    }
                };
                PropertyDetail::Plastic { hardening }
            }
            PropertyKind::DruckerPrager => PropertyDetail::Plastic {
                hardening: Hardening::Isotropic,
            },
            PropertyKind::Creep => {
                let law = upper_option(header, "LAW").unwrap_or_else(|| "STRAIN".to_string());
                if law != "TIME" {
                    return Err(ConvertError::unsupported("CREEP", format!("LAW={law}")));
                }
                PropertyDetail::Plain
            }
            PropertyKind::Density => PropertyDetail::Plain,
        };

        let mut property = Property::new(kind, detail);
        property.orthotropic = orthotropic;
        if let Some(mat) = self.model.materials.get_mut(&material) {
            mat.properties.insert(kind, property);
        }
        self.ctx.property = Some(kind);
        Ok(())
    }

    fn enter_load(&mut self, header: &Header) -> Result<()> {
        let kind = match header.keyword {
            Keyword::Cload => LoadKind::Cload,
            Keyword::Dsload => LoadKind::Dsload,
            Keyword::Dload => LoadKind::Dload,
            Keyword::Temperature => LoadKind::Temperature,
            _ => match upper_option(header, "TYPE") {
                Some(t) if t == "ACCELERATION" => {
                    required(header, "DOF")?;
                    LoadKind::Acceleration
                }
                other => LoadKind::BaseMotion(other),
            },
        };
        let frequency_case = if header.has_flag("IMAGINARY") {
            Some(FrequencyCase::Imaginary)
        } else if header.has_flag("REAL") {
            Some(FrequencyCase::Real)
        } else {
            None
        };
        self.model.loads.push(Load {
            kind,
            amplitude: header.option("AMPLITUDE").map(canonical),
            frequency_case,
            dof: header.option("DOF").map(str::to_string),
            scale: header.option("SCALE").unwrap_or("1.0").to_string(),
            rows: Vec::new(),
        });
        let activation = Activation {
            id: self.model.loads.len() - 1,
            op: operation(header),
        };
        self.current_step().loads.push(activation);
        Ok(())
    }

    fn enter_steady_state(&mut self, header: &Header) -> Result<()> {
        if header.has_option("SUBSPACEPROJECTION") || header.has_flag("SUBSPACEPROJECTION") {
            return Err(ConvertError::unsupported(
                "STEADY STATE DYNAMICS",
                "SUBSPACE PROJECTION",
            ));
        }
        if header.has_option("DIRECT") || header.has_flag("DIRECT") {
            return Err(ConvertError::unsupported("STEADY STATE DYNAMICS", "DIRECT"));
        }
        self.model.flags.frequency_response = true;
        let procedure = Procedure::SteadyState(SteadyStateDynamics {
            scale: upper_option(header, "FREQUENCYSCALE").unwrap_or_else(|| "LOGARITHMIC".to_string()),
            interval: upper_option(header, "INTERVAL").unwrap_or_else(|| "EIGENFREQUENCY".to_string()),
            range: Vec::new(),
            damping: ["1", "1", "0.0", "0.0"].map(String::from).to_vec(),
        });
        self.set_procedure(header, procedure)
    }

    fn set_procedure(&mut self, header: &Header, procedure: Procedure) -> Result<()> {
        self.require_user_step(header)?;
        self.current_step().procedure = Some(procedure);
        Ok(())
    }

    fn require_user_step(&self, header: &Header) -> Result<()> {
        if self.model.step_count() == 0 {
            return Err(ConvertError::structural(format!(
                "*{} (line {}) appears outside of a *STEP",
                header.name, header.line
            )));
        }
        Ok(())
    }

    fn open_interaction(&mut self, header: &Header) -> Result<&mut Interaction> {
        self.ctx
            .interaction
            .as_ref()
            .and_then(|name| self.model.interactions.get_mut(name))
            .ok_or_else(|| {
                ConvertError::structural(format!(
                    "*{} (line {}) appears outside of a *SURFACE INTERACTION",
                    header.name, header.line
                ))
            })
    }

    fn current_step(&mut self) -> &mut Step {
        if self.model.steps.is_empty() {
            self.model.steps.push(Step::default());
        }
        let last = self.model.steps.len() - 1;
        &mut self.model.steps[last]
    }

    fn ingest_node(&mut self, data: &DataLine) -> Result<()> {
        let text = data.text.trim_end();
        if !self.ctx.frame.is_active() {
            self.model.nodes.push(text.to_string());
            return Ok(());
        }
        let format = *self
            .ctx
            .node_format
            .get_or_insert_with(|| NodeLineFormat::from_raw(text));
        let fields = data.fields();
        let id = parse_id(&fields[0], data.line)?;
        let mut local = Vector3::zeros();
        for (slot, field) in local.iter_mut().zip(fields.iter().skip(1)) {
            if !field.is_empty() {
                *slot = parse_real(field, data.line)?;
            }
        }
        let global = self.ctx.frame.to_global(&local);
        self.model.nodes.push(format.render(id, &global));
        Ok(())
    }

    fn ingest_element(&mut self, data: DataLine, stream: &mut LineStream) -> Result<()> {
        let mut text = data.text.trim_end().to_string();
        while text.ends_with(',') {
            match stream.take_continuation() {
                Some(next) => text.push_str(next.text.trim()),
                None => break,
            }
        }
        let mut fields = split_fields(&text);
        while fields.last().is_some_and(|f| f.is_empty()) {
            fields.pop();
        }

        match self.ctx.element_fixup {
            Some(ElementFixup::Tet10) => {
                if fields.len() < 11 {
                    return Err(ConvertError::parse(data.line, "10-node tetrahedron needs 10 nodes"));
                }
                fields[5..8].rotate_left(1);
            }
            Some(ElementFixup::Spring1) => {
                if fields.len() < 2 {
                    return Err(ConvertError::parse(data.line, "SPRING1 element needs a node"));
                }
                fields = vec![fields[0].clone(), fields[1].clone(), fields[1].clone()];
            }
            Some(ElementFixup::None) | None => {}
        }

        let Some((id_field, node_fields)) = fields.split_first() else {
            return Ok(());
        };
        let id = parse_id(id_field, data.line)?;
        let nodes = node_fields
            .iter()
            .map(|f| parse_id(f, data.line))
            .collect::<Result<Vec<_>>>()?;
        if let Some(section) = self.model.element_sections.last_mut() {
            section.push(id, nodes);
        }
        Ok(())
    }

    fn ingest_mpc(&mut self, data: &DataLine) -> Result<()> {
        let fields = row_fields(data);
        if fields.len() < 3 {
            return Err(ConvertError::parse(data.line, "*MPC line needs type, slave and master"));
        }
        let kind = match fields[0].to_ascii_uppercase().as_str() {
            "BEAM" => MpcKind::Beam,
            "TIE" => MpcKind::Tie,
            other => return Err(ConvertError::unsupported("MPC", other.to_string())),
        };
        self.model.mpcs.push(Mpc {
            kind,
            slave: canonical(&fields[1]),
            master: canonical(&fields[2]),
        });
        Ok(())
    }
}

fn required<'h>(header: &'h Header, key: &str) -> Result<&'h str> {
    header
        .option(key)
        .ok_or_else(|| ConvertError::missing(header.name.clone(), key))
}

fn upper_option(header: &Header, key: &str) -> Option<String> {
    header.option(key).map(str::to_ascii_uppercase)
}

fn operation(header: &Header) -> Operation {
    match upper_option(header, "OP").as_deref() {
        Some("NEW") => Operation::Replace,
        _ => Operation::Accumulate,
    }
}

/// Names are case-insensitive and stored upper-cased.
pub fn canonical(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Blank-free fields of a data line, trailing empty fields dropped.
fn row_fields(data: &DataLine) -> Vec<String> {
    let mut fields = data.fields();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Like [`row_fields`] with the leading group reference canonicalized.
fn named_row(data: &DataLine) -> Vec<String> {
    let mut fields = row_fields(data);
    if let Some(first) = fields.first_mut() {
        *first = canonical(first);
    }
    fields
}

fn reals(data: &DataLine) -> Result<Vec<f64>> {
    data.fields()
        .iter()
        .filter(|f| !f.is_empty())
        .map(|f| parse_real(f, data.line))
        .collect()
}

pub fn parse_real(field: &str, line: usize) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|_| ConvertError::parse(line, format!("expected a number, found '{field}'")))
}

/// Drops the trailing comma and turns integer-mantissa exponents such as
/// `2e5` into `2.e5`.
pub fn normalize_property_line(text: &str) -> String {
    let mut line = text.trim().trim_end_matches(',').to_string();
    if !line.contains('.') {
        if line.contains('e') {
            line = line.replace('e', ".e");
        } else if line.contains('E') {
            line = line.replace('E', ".E");
        }
    }
    line
}
