//! Contact pairs and ties.

use a2f_model::{ConvertError, IdSet, Result, Sliding, SourceModel, SurfaceKind};
use log::debug;

use crate::groups::nodes_of_faces;
use crate::target::{TargetContact, TargetModel};

/// Converts contact pairs, deriving a node group for element-face slaves.
///
/// Runs after [`crate::groups::convert_groups`].
pub fn convert_contacts(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    for pair in &source.contact_pairs {
        let mut sliding = pair.sliding;
        let friction = match &pair.interaction {
            Some(name) => {
                let interaction = source.interactions.get(name).ok_or_else(|| {
                    ConvertError::structural(format!(
                        "contact pair {}/{} references undefined interaction {name}",
                        pair.slave, pair.master
                    ))
                })?;
                if interaction.no_separation {
                    sliding = Sliding::SlideOnly;
                    "0.001".to_string()
                } else {
                    interaction.friction.clone().unwrap_or_else(|| "0.".to_string())
                }
            }
            None => pair
                .position_tolerance
                .clone()
                .unwrap_or_else(|| "0.".to_string()),
        };

        let master_faces = matches!(
            source.surfaces.get(&pair.master).map(|s| s.kind),
            Some(SurfaceKind::Element)
        );
        if !master_faces || !target.surface_groups.contains_key(&pair.master) {
            return Err(ConvertError::structural(format!(
                "contact master {} is not an element-face surface",
                pair.master
            )));
        }

        let slave = match source.surfaces.get(&pair.slave).map(|s| s.kind) {
            Some(SurfaceKind::Element) => {
                let faces = target
                    .surface_groups
                    .get(&pair.slave)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                let nodes = nodes_of_faces(source, &pair.slave, faces)?;
                let name = format!("{}_NGRP_", pair.slave);
                debug!("derived node group {name} with {} nodes", nodes.len());
                target.node_groups.insert(name.clone(), IdSet::explicit(nodes));
                name
            }
            Some(SurfaceKind::Node) => pair.slave.clone(),
            None => {
                return Err(ConvertError::structural(format!(
                    "contact slave {} is not a defined surface",
                    pair.slave
                )));
            }
        };

        target.contact_pairs.push(TargetContact {
            sliding,
            friction,
            adjust: pair.adjust.clone(),
            slave,
            master: pair.master.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::convert_groups;
    use a2f_model::build_source_model;

    const MESH: &str = "\
*ELEMENT, TYPE=C3D8, ELSET=BLOCK
1, 1, 2, 3, 4, 5, 6, 7, 8
2, 5, 6, 7, 8, 9, 10, 11, 12
*ELSET, ELSET=LOW
1
*ELSET, ELSET=HIGH
2
*SURFACE, NAME=S_LOW
LOW, S2
*SURFACE, NAME=S_HIGH
HIGH, S1
*NSET, NSET=PTS
5, 6
*SURFACE, NAME=N_PTS, TYPE=NODE
PTS
";

    fn convert(extra: &str) -> Result<TargetModel> {
        let source = build_source_model(&format!("{MESH}{extra}")).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_groups(&source, &mut target)?;
        convert_contacts(&source, &mut target)?;
        Ok(target)
    }

    #[test]
    fn friction_and_derived_slave_group() {
        let target = convert(
            "\
*SURFACE INTERACTION, NAME=SI
*FRICTION
0.3
*CONTACT PAIR, INTERACTION=SI, ADJUST=no
S_LOW, S_HIGH
",
        )
        .expect("contacts");
        let pair = &target.contact_pairs[0];
        assert_eq!(pair.sliding, Sliding::Finite);
        assert_eq!(pair.friction, "0.3");
        assert_eq!(pair.slave, "S_LOW_NGRP_");
        assert_eq!(target.node_groups["S_LOW_NGRP_"].members(), vec![5, 6, 7, 8]);
    }

    #[test]
    fn no_separation_overrides_friction() {
        let target = convert(
            "\
*SURFACE INTERACTION, NAME=SI
*SURFACE BEHAVIOR, NO SEPARATION
*FRICTION
0.3
*CONTACT PAIR, INTERACTION=SI, SMALL SLIDING
N_PTS, S_HIGH
",
        )
        .expect("contacts");
        let pair = &target.contact_pairs[0];
        assert_eq!(pair.sliding, Sliding::SlideOnly);
        assert_eq!(pair.friction, "0.001");
        assert_eq!(pair.slave, "N_PTS");
    }

    #[test]
    fn tie_uses_position_tolerance() {
        let target = convert("*TIE, NAME=T, POSITION TOLERANCE=0.05\nS_LOW, S_HIGH\n").expect("tie");
        assert_eq!(target.contact_pairs[0].sliding, Sliding::Tied);
        assert_eq!(target.contact_pairs[0].friction, "0.05");
    }

    #[test]
    fn bad_references_are_structural() {
        for extra in [
            "*SURFACE INTERACTION, NAME=SI\n*CONTACT PAIR, INTERACTION=OTHER\nS_LOW, S_HIGH\n",
            "*SURFACE INTERACTION, NAME=SI\n*CONTACT PAIR, INTERACTION=SI\nNOPE, S_HIGH\n",
            "*SURFACE INTERACTION, NAME=SI\n*CONTACT PAIR, INTERACTION=SI\nS_LOW, N_PTS\n",
        ] {
            let err = convert(extra).expect_err("reference should fail");
            assert!(matches!(err, ConvertError::Structural(_)), "{extra}");
        }
    }
}
