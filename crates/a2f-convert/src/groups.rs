//! Node, element and surface groups, and the sections and orientations built on them.

use std::collections::BTreeSet;

use a2f_model::{ConvertError, IdSet, Result, SetBlock, SourceModel, SurfaceKind};
use log::{debug, warn};

use crate::target::{Section, SurfaceFace, TargetMaterial, TargetModel};

/// Copies node and element sets and resolves every surface.
pub fn convert_groups(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    target.node_groups = source.nsets.clone();
    target.element_groups = source.elsets.clone();

    for (name, surface) in &source.surfaces {
        match surface.kind {
            SurfaceKind::Element => {
                let mut faces = Vec::new();
                for row in &surface.rows {
                    faces.extend(surface_faces(source, name, row)?);
                }
                debug!("surface {name}: {} element faces", faces.len());
                target.surface_groups.insert(name.clone(), faces);
            }
            SurfaceKind::Node => {
                let mut group = IdSet::default();
                for row in &surface.rows {
                    let Some(reference) = row.first() else {
                        continue;
                    };
                    if let Some(set) = source.nsets.get(reference) {
                        group.blocks.extend(set.blocks.iter().cloned());
                    } else if let Ok(id) = reference.parse::<u64>() {
                        group.blocks.push(SetBlock::Explicit(vec![id]));
                    } else {
                        return Err(ConvertError::structural(format!(
                            "node surface {name} references undefined node set {reference}"
                        )));
                    }
                }
                target.node_groups.insert(name.clone(), group);
            }
        }
    }
    Ok(())
}

/// Resolves one `ref, S<n>` surface row into element-face pairs.
fn surface_faces(source: &SourceModel, surface: &str, row: &[String]) -> Result<Vec<SurfaceFace>> {
    let (Some(reference), Some(face)) = (row.first(), row.get(1)) else {
        return Err(ConvertError::structural(format!(
            "surface {surface} has a row without a face identifier"
        )));
    };
    let face = face
        .trim_start_matches(['S', 's'])
        .parse::<usize>()
        .map_err(|_| {
            ConvertError::structural(format!("surface {surface}: bad face identifier {face}"))
        })?;

    let elements = if let Some(set) = source.elsets.get(reference) {
        set.members()
    } else if let Ok(id) = reference.parse::<u64>() {
        vec![id]
    } else {
        return Err(ConvertError::structural(format!(
            "surface {surface} references undefined element set {reference}"
        )));
    };
    Ok(elements.into_iter().map(|e| (e, face)).collect())
}

/// Node group covering every node on the faces of a surface group.
///
/// Node IDs come back sorted and deduplicated.
pub fn nodes_of_faces(source: &SourceModel, surface: &str, faces: &[SurfaceFace]) -> Result<Vec<u64>> {
    let mut nodes = BTreeSet::new();
    for &(element, face) in faces {
        let (section, element_nodes) = source.find_element(element).ok_or_else(|| {
            ConvertError::structural(format!("surface {surface}: element {element} is not defined"))
        })?;
        let local = section.element_type.face_nodes(face).ok_or_else(|| {
            ConvertError::structural(format!(
                "surface {surface}: element {element} of type {} has no face S{face}",
                section.element_type.code()
            ))
        })?;
        for &i in local {
            let node = element_nodes.get(i).ok_or_else(|| {
                ConvertError::structural(format!(
                    "surface {surface}: element {element} has too few nodes for face S{face}"
                ))
            })?;
            nodes.insert(*node);
        }
    }
    Ok(nodes.into_iter().collect())
}

/// Builds sections from solid sections and springs.
///
/// A section over an element set that is neither a defined set nor the
/// inherent group of an element block is dropped.
pub fn convert_sections(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    for solid in &source.solid_sections {
        let defined = source.elsets.contains_key(&solid.elset)
            || source.inherent_groups().any(|g| g == solid.elset);
        if !defined {
            warn!(
                "section over undefined element set {} dropped",
                solid.elset
            );
            continue;
        }
        if !source.materials.contains_key(&solid.material) {
            return Err(ConvertError::structural(format!(
                "section over {} references undefined material {}",
                solid.elset, solid.material
            )));
        }
        target.sections.push(Section {
            elset: solid.elset.clone(),
            material: solid.material.clone(),
            orientation: solid.orientation.clone(),
        });
    }

    for (index, (elset, spring)) in source.springs.iter().enumerate() {
        let name = format!("SPRING-{}", index + 1);
        let dof = spring.dof().to_string();
        let mut stiffness = spring.stiffness().to_string();
        if !dof.is_empty() {
            stiffness.push_str(", ");
            stiffness.push_str(&dof);
        }
        target.sections.push(Section {
            elset: elset.clone(),
            material: name.clone(),
            orientation: None,
        });
        target
            .materials
            .insert(name, TargetMaterial::Spring { stiffness, dof });
    }
    Ok(())
}

/// Converts orientations defined by coordinates.
///
/// A line holding only the two direction points is padded with a zero origin.
pub fn convert_orientations(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    for (name, orientation) in &source.orientations {
        if let Some(definition) = orientation.options.get("DEFINITION")
            && definition != "COORDINATES"
        {
            return Err(ConvertError::unsupported(
                "ORIENTATION",
                format!("DEFINITION={definition}"),
            ));
        }
        let Some(first) = orientation.lines.first() else {
            warn!("orientation {name} has no data line, dropped");
            continue;
        };
        let fields: Vec<&str> = first
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        let mut line = fields.join(",");
        if fields.len() == 6 {
            line.push_str(",0.0,0.0,0.0");
        }
        target.orientations.insert(name.clone(), line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2f_model::build_source_model;

    const WEDGE_DECK: &str = "\
*ELEMENT, TYPE=C3D6, ELSET=W
5, 10, 11, 12, 13, 14, 15
*ELSET, ELSET=WSET
5
*SURFACE, NAME=TOP
WSET, S2
*SURFACE, NAME=SIDE
5, S3
*NSET, NSET=PTS
10, 11
*SURFACE, NAME=NS, TYPE=NODE
PTS
99
";

    #[test]
    fn surfaces_resolve_sets_and_literal_ids() {
        let source = build_source_model(WEDGE_DECK).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_groups(&source, &mut target).expect("groups");

        assert_eq!(target.surface_groups["TOP"], vec![(5, 2)]);
        assert_eq!(target.surface_groups["SIDE"], vec![(5, 3)]);
        assert_eq!(target.node_groups["NS"].members(), vec![10, 11, 99]);

        let nodes = nodes_of_faces(&source, "SIDE", &target.surface_groups["SIDE"]).expect("nodes");
        assert_eq!(nodes, vec![10, 11, 13, 14]);
    }

    #[test]
    fn undefined_surface_set_is_structural() {
        let source = build_source_model("*SURFACE, NAME=S\nNOPE, S1\n").expect("deck should parse");
        let mut target = TargetModel::default();
        let err = convert_groups(&source, &mut target).expect_err("missing elset");
        assert!(matches!(err, ConvertError::Structural(_)));
    }

    #[test]
    fn face_out_of_range_is_structural() {
        let source = build_source_model(WEDGE_DECK).expect("deck should parse");
        assert!(nodes_of_faces(&source, "X", &[(5, 6)]).is_err());
        assert!(nodes_of_faces(&source, "X", &[(6, 1)]).is_err());
    }

    #[test]
    fn sections_skip_undefined_sets_and_add_springs() {
        let deck = "\
*ELEMENT, TYPE=C3D4, ELSET=E1
1, 1, 2, 3, 4
*ELEMENT, TYPE=SPRING1, ELSET=SP
2, 7
*SOLID SECTION, ELSET=E1, MATERIAL=M
*SOLID SECTION, ELSET=GHOST, MATERIAL=M
*MATERIAL, NAME=M
*ELASTIC
1., 0.3
*SPRING, ELSET=SP
3
150.
";
        let source = build_source_model(deck).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_sections(&source, &mut target).expect("sections");

        assert_eq!(target.sections.len(), 2);
        assert_eq!(target.sections[0].elset, "E1");
        assert_eq!(target.sections[1].material, "SPRING-1");
        assert_eq!(
            target.materials["SPRING-1"],
            TargetMaterial::Spring {
                stiffness: "150., 3".into(),
                dof: "3".into()
            }
        );
    }

    #[test]
    fn orientations_are_padded_and_checked() {
        let deck = "*ORIENTATION, NAME=OR1\n1., 0., 0., 0., 1., 0.\n*ORIENTATION, NAME=OR2, SYSTEM=RECTANGULAR\n1., 0., 0., 0., 0., 1., 5., 5., 5.\n";
        let source = build_source_model(deck).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_orientations(&source, &mut target).expect("orientations");
        assert_eq!(target.orientations["OR1"], "1.,0.,0.,0.,1.,0.,0.0,0.0,0.0");
        assert_eq!(target.orientations["OR2"], "1.,0.,0.,0.,0.,1.,5.,5.,5.");

        let source = build_source_model("*ORIENTATION, NAME=C, DEFINITION=NODES\n1, 2, 3\n")
            .expect("deck should parse");
        let err = convert_orientations(&source, &mut target).expect_err("nodes definition");
        assert!(matches!(err, ConvertError::Unsupported { .. }));
    }

    #[test]
    fn section_with_unknown_material_is_structural() {
        let deck = "*ELEMENT, TYPE=C3D4, ELSET=E1\n1, 1, 2, 3, 4\n*SOLID SECTION, ELSET=E1, MATERIAL=NONE\n";
        let source = build_source_model(deck).expect("deck should parse");
        let mut target = TargetModel::default();
        assert!(convert_sections(&source, &mut target).is_err());
    }
}
