//! End-to-end conversion of small decks.

use a2f_convert::{RigidAxis, TargetLoadKind, TargetProcedure, WriteList, convert_model};
use a2f_model::{ConvertError, Sliding, build_source_model};
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures/decks");
    path.push(name);
    std::fs::read_to_string(&path).expect("fixture should be readable")
}

fn convert(deck: &str) -> Result<a2f_convert::TargetModel, ConvertError> {
    let source = build_source_model(deck)?;
    convert_model(&source)
}

#[test]
fn tet_static_converts_and_prunes() {
    let model = convert(&fixture("tet_static.inp")).expect("conversion");

    assert_eq!(model.sections.len(), 1);
    assert!(model.materials.contains_key("STEEL"));
    assert_eq!(model.steps.len(), 1);
    assert_eq!(model.steps[0].boundaries, vec![0]);
    assert_eq!(model.steps[0].loads, vec![0]);
    assert_eq!(model.steps[0].procedure, Some(TargetProcedure::Static));
    assert_eq!(model.boundaries[0][0].render(), "FIXED, 1, 6");
    // NALL has no consumer.
    assert!(!model.node_groups.contains_key("NALL"));
    assert!(model.node_groups.contains_key("TIP"));
    assert!(model.outputs.vtk_default);
}

#[test]
fn generated_face_set_slave_becomes_sorted_node_group() {
    let model = convert(&fixture("hex_contact.inp")).expect("conversion");

    let pair = &model.contact_pairs[0];
    assert_eq!(pair.sliding, Sliding::Small);
    assert_eq!(pair.friction, "0.2");
    assert_eq!(pair.slave, "SLAVE_SURF_NGRP_");
    assert_eq!(model.node_groups["SLAVE_SURF_NGRP_"].members(), vec![5, 6, 7, 8]);
    assert!(model.surface_groups.contains_key("MASTER_SURF"));
    assert!(!model.surface_groups.contains_key("SLAVE_SURF"));
}

#[test]
fn shared_face_nodes_are_deduplicated() {
    let deck = "\
*ELEMENT, TYPE=C3D8, ELSET=BLOCKS
1, 1, 2, 3, 4, 5, 6, 7, 8
2, 5, 6, 7, 8, 9, 10, 11, 12
*ELSET, ELSET=BOTH, GENERATE
1, 2
*SURFACE, NAME=STACK
BOTH, S2
BOTH, S1
*SURFACE, NAME=TARGET
2, S2
*SOLID SECTION, ELSET=BLOCKS, MATERIAL=M
*MATERIAL, NAME=M
*ELASTIC
1., 0.3
*SURFACE INTERACTION, NAME=SI
*CONTACT PAIR, INTERACTION=SI
STACK, TARGET
";
    let model = convert(deck).expect("conversion");
    assert_eq!(
        model.node_groups["STACK_NGRP_"].members(),
        vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]
    );
}

#[test]
fn ten_amplitude_pairs_fill_two_lines_and_a_remainder() {
    let deck = "\
*AMPLITUDE, NAME=RAMP
0., 0., 1., 1., 2., 4., 3., 9.
4., 16., 5., 25., 6., 36., 7., 49.
8., 64., 9., 81.
";
    let model = convert(deck).expect("conversion");
    let amplitude = &model.amplitudes["RAMP"];
    assert_eq!(amplitude.value, "RELATIVE");
    assert_eq!(
        amplitude.lines,
        vec![
            "0., 0., 1., 1., 4., 2., 9., 3.",
            "16., 4., 25., 5., 36., 6., 49., 7.",
            "64., 8., 81., 9.",
        ]
    );
}

const HUB: &str = "\
*NODE
1, 1., 0., 0.
2, 0., 1., 0.
100, 0., 0., 0.
*NSET, NSET=HUB
100
*NSET, NSET=RIM
1, 2
*MPC
BEAM, RIM, HUB
";

#[test]
fn translational_load_against_rotational_boundary_is_structural() {
    let deck = format!(
        "{HUB}\
*BOUNDARY
HUB, 1, 4
HUB, 6, 6
*STEP
*STATIC
*CLOAD
HUB, 3, 50.
"
    );
    let err = convert(&deck).expect_err("axis 3 load against free rotation about axis 2");
    assert!(matches!(err, ConvertError::Structural(_)));
}

#[test]
fn consistent_master_yields_a_rigid_link() {
    let deck = format!(
        "{HUB}\
*BOUNDARY
HUB, 1, 2
HUB, 4, 6
*STEP
*STATIC
*CLOAD
HUB, 3, 50.
"
    );
    let model = convert(&deck).expect("conversion");
    assert_eq!(model.rigid_links[0].axis, RigidAxis::Rotation(3));
    assert_eq!(model.rigid_links[0].slaves, vec![1, 2]);
    assert_eq!(model.loads[0].kind, TargetLoadKind::Cload);
    assert_eq!(model.loads[0].records[0].render(), "100, 1, 50.");
    let rendered: Vec<String> = model.boundaries[0].iter().map(|r| r.render()).collect();
    assert_eq!(rendered, vec!["100, 2, 2", "100, 3, 3"]);
}

#[test]
fn write_list_matches_consumers_after_conversion() {
    let model = convert(&fixture("hex_contact.inp")).expect("conversion");
    let list = WriteList::resolve(&model);
    for name in model.node_groups.keys() {
        assert!(list.node_groups.contains(name), "{name} was written without a consumer");
    }
    assert!(list.node_groups.contains("BASE"));
    assert!(list.node_groups.contains("TOP"));
    assert!(list.materials.contains("MAT1"));
}
