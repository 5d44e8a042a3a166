//! Multi-point constraints re-expressed as rigid links.
//!
//! A `BEAM` constraint couples one master node to its slaves about a single
//! global axis. The axis is inferred from what acts on the master: nonzero
//! forces and moments, plus every master dof that is left free or driven by a
//! nonzero prescribed value. Master loads and boundaries are then rewritten
//! onto the link's local dofs (1: axis translation, 2: axis rotation,
//! 3: fixed).

use a2f_model::numfmt::format_f;
use a2f_model::{ConvertError, MpcKind, Result, SourceModel, parse_real};
use log::debug;

use crate::target::{Record, RigidAxis, RigidLink, TargetLoadKind, TargetModel};

const NONZERO: f64 = 1.0e-10;

/// Master dof table; `None` marks a free dof.
type DofTable = [Option<f64>; 6];

/// Node ID a single-node reference resolves to.
fn resolve_master(target: &TargetModel, reference: &str) -> Result<u64> {
    let nodes = target.resolve_nodes(reference).unwrap_or_default();
    match nodes.as_slice() {
        [node] => Ok(*node),
        [] => Err(ConvertError::structural(format!(
            "MPC master {reference} does not resolve to a node"
        ))),
        _ => Err(ConvertError::structural(format!(
            "MPC master {reference} holds {} nodes, expected one",
            nodes.len()
        ))),
    }
}

/// Whether a record reference names the master group or resolves to the
/// master node alone.
fn addresses(target: &TargetModel, reference: &str, group: &str, master: u64) -> bool {
    reference == group || target.resolve_nodes(reference).as_deref() == Some(&[master][..])
}

/// Fills the master dof table from the source boundary rows addressing it.
///
/// Returns the indices of the boundary blocks that touch the master.
fn master_boundaries(
    source: &SourceModel,
    target: &TargetModel,
    group: &str,
    master: u64,
    dofs: &mut DofTable,
) -> Result<Vec<usize>> {
    let mut blocks = Vec::new();
    for (index, block) in source.boundaries.iter().enumerate() {
        let mut touched = false;
        for row in block {
            let (Some(reference), Some(code)) = (row.first(), row.get(1)) else {
                continue;
            };
            if !addresses(target, reference, group, master) {
                continue;
            }
            touched = true;
            if let Ok(low) = code.parse::<usize>() {
                let high = row
                    .get(2)
                    .and_then(|f| f.parse::<usize>().ok())
                    .unwrap_or(low);
                let value = match row.get(3).filter(|v| !v.is_empty()) {
                    Some(v) => parse_real(v, 0)?,
                    None => 0.0,
                };
                for dof in low.max(1)..=high.min(6) {
                    dofs[dof - 1] = Some(value);
                }
            } else {
                let range = match code.to_ascii_uppercase().as_str() {
                    "PINNED" => 0..3,
                    "ENCASTRE" => 0..6,
                    other => {
                        return Err(ConvertError::structural(format!(
                            "MPC master {master}: boundary code {other} cannot be mapped onto a rigid link"
                        )));
                    }
                };
                for dof in range {
                    dofs[dof] = Some(0.0);
                }
            }
        }
        if touched {
            blocks.push(index);
        }
    }
    Ok(blocks)
}

/// Nonzero master forces and moments; returns the loads touching the master.
fn master_loads(
    target: &TargetModel,
    group: &str,
    master: u64,
    loads: &mut [Option<String>; 6],
) -> Vec<usize> {
    let mut touched = Vec::new();
    for (index, load) in target.loads.iter().enumerate() {
        if load.kind != TargetLoadKind::Cload {
            continue;
        }
        for record in &load.records {
            let Some(reference) = record.reference() else {
                continue;
            };
            if !addresses(target, reference, group, master) {
                continue;
            }
            if !touched.contains(&index) {
                touched.push(index);
            }
            let (Some(dof), Some(value)) = (record.values.first(), record.values.get(1)) else {
                continue;
            };
            let Ok(dof) = dof.parse::<usize>() else {
                continue;
            };
            let magnitude = value.parse::<f64>().map(f64::abs).unwrap_or(0.0);
            if (1..=6).contains(&dof) && magnitude > NONZERO {
                loads[dof - 1] = Some(value.clone());
            }
        }
    }
    touched
}

/// Records one axis observation, failing on a second distinct axis.
fn observe(axis: &mut Option<u8>, seen: u8, master: u64, origin: &str) -> Result<()> {
    match *axis {
        Some(current) if current != seen => Err(ConvertError::structural(format!(
            "MPC master {master}: {origin} implies axis {seen}, conflicting with axis {current}"
        ))),
        _ => {
            *axis = Some(seen);
            Ok(())
        }
    }
}

fn infer_axis(master: u64, loads: &[Option<String>; 6], dofs: &DofTable) -> Result<u8> {
    let mut axis = None;
    for (i, load) in loads.iter().enumerate() {
        if load.is_some() {
            observe(&mut axis, (i % 3) as u8 + 1, master, "a concentrated load")?;
        }
    }
    for (i, dof) in dofs.iter().enumerate() {
        let active = match dof {
            None => true,
            Some(v) => v.abs() > NONZERO,
        };
        if active {
            observe(&mut axis, (i % 3) as u8 + 1, master, "a boundary condition")?;
        }
    }
    axis.ok_or_else(|| {
        ConvertError::structural(format!(
            "MPC master {master}: no load or free dof defines a rotation axis"
        ))
    })
}

fn boundary_value(master: u64, local: u8, value: Option<f64>) -> Option<Record> {
    let value = value?;
    let mut values = vec![local.to_string(), local.to_string()];
    if value.abs() > NONZERO {
        values.push(format_f(value, 9, 6));
    }
    Some(Record::new(master.to_string(), values))
}

fn beam_axis(source: &SourceModel, target: &mut TargetModel, group: &str, master: u64) -> Result<u8> {
    let mut dofs: DofTable = [None; 6];
    let boundary_blocks = master_boundaries(source, target, group, master, &mut dofs)?;
    if boundary_blocks.is_empty() {
        return Err(ConvertError::structural(format!(
            "MPC master {master} has no boundary condition"
        )));
    }
    let mut loads: [Option<String>; 6] = Default::default();
    let load_ids = master_loads(target, group, master, &mut loads);
    let axis = infer_axis(master, &loads, &dofs)?;
    debug!("MPC master {master}: rotation axis {axis}");

    let a = usize::from(axis) - 1;
    let force = loads[a].clone();
    let moment = loads[a + 3].clone();
    for id in load_ids {
        let records = std::mem::take(&mut target.loads[id].records);
        let mut rewritten = Vec::with_capacity(records.len());
        for record in records {
            let on_master = record
                .reference()
                .is_some_and(|r| addresses(target, r, group, master));
            if !on_master {
                rewritten.push(record);
                continue;
            }
            let dof = record.values.first().and_then(|d| d.parse::<usize>().ok());
            match (dof, &force, &moment) {
                (Some(d), Some(f), _) if d == a + 1 => {
                    rewritten.push(Record::new(master.to_string(), vec!["1".into(), f.clone()]));
                }
                (Some(d), _, Some(m)) if d == a + 4 => {
                    rewritten.push(Record::new(master.to_string(), vec!["2".into(), m.clone()]));
                }
                _ => {}
            }
        }
        target.loads[id].records = rewritten;
    }

    let fixed = Record::new(master.to_string(), vec!["3".into(), "3".into()]);
    for (n, &id) in boundary_blocks.iter().enumerate() {
        let Some(records) = target.boundaries.get_mut(id).map(std::mem::take) else {
            continue;
        };
        let mut block: Vec<Record> = records
            .into_iter()
            .filter(|r| {
                !r.reference()
                    .is_some_and(|name| addresses(target, name, group, master))
            })
            .collect();
        if n == 0 {
            block.extend(boundary_value(master, 1, dofs[a]));
            block.extend(boundary_value(master, 2, dofs[a + 3]));
        }
        block.push(fixed.clone());
        target.boundaries[id] = block;
    }
    Ok(axis)
}

/// Converts every MPC into a rigid link.
///
/// Runs after boundaries and loads, whose master records it rewrites.
pub fn convert_rigid_links(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    for mpc in &source.mpcs {
        let master = resolve_master(target, &mpc.master)?;
        let slaves = target.resolve_nodes(&mpc.slave).unwrap_or_default();
        if slaves.is_empty() {
            return Err(ConvertError::structural(format!(
                "MPC slave group {} is empty or undefined",
                mpc.slave
            )));
        }
        let axis = match mpc.kind {
            MpcKind::Tie => RigidAxis::AllTranslational,
            MpcKind::Beam => RigidAxis::Rotation(beam_axis(source, target, &mpc.master, master)?),
        };
        target.rigid_links.push(RigidLink {
            master,
            slaves,
            axis,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::convert_groups;
    use crate::loads::{convert_boundaries, convert_loads};
    use a2f_model::build_source_model;

    const NODES: &str = "\
*NSET, NSET=HUB
100
*NSET, NSET=RIM
1, 2, 3, 4
*MPC
BEAM, RIM, HUB
";

    fn convert(extra: &str) -> Result<TargetModel> {
        let source = build_source_model(&format!("{NODES}{extra}")).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_groups(&source, &mut target)?;
        convert_boundaries(&source, &mut target);
        convert_loads(&source, &mut target)?;
        convert_rigid_links(&source, &mut target)?;
        Ok(target)
    }

    fn rendered(records: &[Record]) -> Vec<String> {
        records.iter().map(Record::render).collect()
    }

    #[test]
    fn moment_and_free_rotation_agree_on_one_axis() {
        let target = convert(
            "\
*BOUNDARY
HUB, 1, 5
*STEP
*STATIC
*CLOAD
HUB, 6, 250.
",
        )
        .expect("rigid link");
        assert_eq!(
            target.rigid_links,
            vec![RigidLink {
                master: 100,
                slaves: vec![1, 2, 3, 4],
                axis: RigidAxis::Rotation(3)
            }]
        );
        assert_eq!(rendered(&target.loads[0].records), vec!["100, 2, 250."]);
        assert_eq!(
            rendered(&target.boundaries[0]),
            vec!["100, 1, 1", "100, 3, 3"]
        );
    }

    #[test]
    fn prescribed_rotation_keeps_its_value() {
        let target = convert(
            "\
*BOUNDARY
HUB, 1, 4
HUB, 6, 6
*BOUNDARY
HUB, 5, 5, 0.25
",
        )
        .expect("rigid link");
        assert_eq!(target.rigid_links[0].axis, RigidAxis::Rotation(2));
        assert_eq!(
            rendered(&target.boundaries[0]),
            vec!["100, 1, 1", "100, 2, 2,  0.250000", "100, 3, 3"]
        );
        assert_eq!(rendered(&target.boundaries[1]), vec!["100, 3, 3"]);
    }

    #[test]
    fn conflicting_axes_are_structural() {
        let err = convert(
            "\
*BOUNDARY
HUB, 1, 4
HUB, 6, 6
*STEP
*STATIC
*CLOAD
HUB, 1, 10.
",
        )
        .expect_err("axis 1 load against free rotation about axis 2");
        assert!(matches!(err, ConvertError::Structural(_)));
    }

    #[test]
    fn master_needs_a_boundary() {
        let err = convert("*STEP\n*STATIC\n*CLOAD\nHUB, 1, 10.\n").expect_err("no boundary");
        assert!(matches!(err, ConvertError::Structural(_)));
    }

    #[test]
    fn symmetry_codes_on_the_master_are_structural() {
        assert!(convert("*BOUNDARY\nHUB, XSYMM\n").is_err());
    }

    #[test]
    fn tie_links_all_translations() {
        let deck = "*NSET, NSET=M\n7\n*MPC\nTIE, 8, M\n";
        let source = build_source_model(deck).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_groups(&source, &mut target).expect("groups");
        convert_rigid_links(&source, &mut target).expect("tie");
        assert_eq!(target.rigid_links[0].axis, RigidAxis::AllTranslational);
        assert_eq!(target.rigid_links[0].slaves, vec![8]);
    }
}
