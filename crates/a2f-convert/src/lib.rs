//! Conversion of an ingested Abaqus model into a FrontISTR model.
//!
//! [`convert_model`] runs every sub-conversion in dependency order and prunes
//! the result down to what the emitters need to write:
//!
//! 1. groups, surfaces, sections and orientations ([`groups`])
//! 2. materials and the reference temperature ([`materials`])
//! 3. contact pairs ([`contacts`])
//! 4. boundaries, loads, initial conditions and amplitudes ([`loads`])
//! 5. rigid links, which rewrite master boundaries and loads ([`rigid`])
//! 6. step activation lists ([`steps`])
//! 7. field outputs ([`outputs`])
//! 8. the write-list ([`write_list`])

pub mod contacts;
pub mod groups;
pub mod loads;
pub mod materials;
pub mod outputs;
pub mod rigid;
pub mod steps;
pub mod target;
pub mod write_list;

pub use target::{
    FrequencyResponse, OutputPlan, Record, RecordTarget, RigidAxis, RigidLink, Section,
    SurfaceFace, TargetAmplitude, TargetContact, TargetInitialCondition, TargetLoad,
    TargetLoadKind, TargetMaterial, TargetModel, TargetProcedure, TargetProperty, TargetStep,
    TextOutput, name_mod,
};
pub use write_list::WriteList;

use a2f_model::{Result, SourceModel};
use log::info;

/// Converts a source model and prunes unreachable groups and materials.
pub fn convert_model(source: &SourceModel) -> Result<TargetModel> {
    let mut target = TargetModel {
        nodes: source.nodes.clone(),
        element_sections: source.element_sections.clone(),
        flags: source.flags,
        ..TargetModel::default()
    };

    groups::convert_groups(source, &mut target)?;
    groups::convert_sections(source, &mut target)?;
    groups::convert_orientations(source, &mut target)?;
    materials::convert_materials(source, &mut target)?;
    contacts::convert_contacts(source, &mut target)?;
    loads::convert_boundaries(source, &mut target);
    loads::convert_loads(source, &mut target)?;
    loads::convert_initial_conditions(source, &mut target);
    loads::convert_amplitudes(source, &mut target)?;
    rigid::convert_rigid_links(source, &mut target)?;
    steps::convert_steps(source, &mut target)?;
    outputs::convert_outputs(source, &mut target);

    let list = write_list::prune(&mut target);
    info!(
        "converted model: {} materials, {} node groups, {} element groups, {} surface groups written",
        list.materials.len(),
        list.node_groups.len(),
        list.element_groups.len(),
        list.surface_groups.len()
    );
    Ok(target)
}
