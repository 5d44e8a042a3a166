//! Reachability pruning of groups and materials before emission.

use std::collections::{BTreeMap, BTreeSet};

use a2f_model::PropertyKind;
use log::debug;

use crate::target::{TargetLoadKind, TargetModel};

const NODE_OUTPUT_PREFIXES: [&str; 3] = ["DISPLACEMENT_OUTPUT", "STRESS_OUTPUT", "STRAIN_OUTPUT"];
const ELEMENT_OUTPUT_PREFIXES: [&str; 5] = [
    "STRESS_OUTPUT",
    "STRAIN_OUTPUT",
    "PLSTRAIN_OUTPUT",
    "NDSTRAIN_OUTPUT",
    "NDSTRESS_OUTPUT",
];

/// Names of the defined entries that have at least one consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteList {
    pub materials: BTreeSet<String>,
    pub node_groups: BTreeSet<String>,
    pub element_groups: BTreeSet<String>,
    pub surface_groups: BTreeSet<String>,
}

fn defined<V>(wanted: BTreeSet<&str>, map: &BTreeMap<String, V>) -> BTreeSet<String> {
    map.keys()
        .filter(|name| wanted.contains(name.as_str()))
        .cloned()
        .collect()
}

impl WriteList {
    pub fn resolve(model: &TargetModel) -> Self {
        let materials: BTreeSet<&str> = model.sections.iter().map(|s| s.material.as_str()).collect();

        let mut nodes: BTreeSet<&str> = BTreeSet::new();
        let mut elements: BTreeSet<&str> = BTreeSet::new();
        let mut surfaces: BTreeSet<&str> = BTreeSet::new();

        for block in &model.boundaries {
            nodes.extend(block.iter().filter_map(|r| r.reference()));
        }
        for load in &model.loads {
            let references = load.records.iter().filter_map(|r| r.reference());
            match load.kind {
                TargetLoadKind::Cload | TargetLoadKind::Temperature => nodes.extend(references),
                TargetLoadKind::Dload { gravity: true } => elements.extend(references),
                TargetLoadKind::Dload { gravity: false } => surfaces.extend(references),
                TargetLoadKind::Acceleration | TargetLoadKind::Dropped => {}
            }
        }
        for ic in model.initial_conditions.iter().filter(|ic| ic.kind == "TEMPERATURE") {
            nodes.extend(ic.records.iter().filter_map(|r| r.reference()));
        }
        for pair in &model.contact_pairs {
            nodes.insert(&pair.slave);
            surfaces.insert(&pair.master);
        }
        nodes.extend(model.outputs.node_text.iter().map(|o| o.group.as_str()));
        nodes.extend(
            model
                .node_groups
                .keys()
                .filter(|name| NODE_OUTPUT_PREFIXES.iter().any(|p| name.starts_with(p)))
                .map(String::as_str),
        );

        elements.extend(model.sections.iter().map(|s| s.elset.as_str()));
        elements.extend(model.outputs.element_text.iter().map(|o| o.group.as_str()));
        elements.extend(
            model
                .element_groups
                .keys()
                .filter(|name| ELEMENT_OUTPUT_PREFIXES.iter().any(|p| name.starts_with(p)))
                .map(String::as_str),
        );
        for inherent in model.inherent_groups() {
            elements.remove(inherent);
        }

        Self {
            materials: defined(materials, &model.materials),
            node_groups: defined(nodes, &model.node_groups),
            element_groups: defined(elements, &model.element_groups),
            surface_groups: defined(surfaces, &model.surface_groups),
        }
    }
}

/// Drops unreachable groups and materials, then adds the result variables
/// implied by what remains.
pub fn prune(model: &mut TargetModel) -> WriteList {
    let list = WriteList::resolve(model);

    fn retain<V>(kind: &str, map: &mut BTreeMap<String, V>, keep: &BTreeSet<String>) {
        map.retain(|name, _| {
            let reachable = keep.contains(name);
            if !reachable {
                debug!("{kind} {name} has no consumer, not written");
            }
            reachable
        });
    }
    retain("material", &mut model.materials, &list.materials);
    retain("node group", &mut model.node_groups, &list.node_groups);
    retain("element group", &mut model.element_groups, &list.element_groups);
    retain("surface group", &mut model.surface_groups, &list.surface_groups);

    if model.outputs.vtk_default {
        let has = |kind| model.materials.values().any(|m| m.property(kind).is_some());
        let creep = has(PropertyKind::Creep);
        let plastic = has(PropertyKind::Plastic);
        if creep {
            model.outputs.push_vtk("CEEQ");
        }
        if plastic {
            model.outputs.push_vtk("PEEQ");
        }
        if !model.contact_pairs.is_empty() {
            model.outputs.push_vtk("CREAC");
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{Record, Section, TargetContact, TargetLoad, TargetMaterial, TextOutput};
    use a2f_model::{IdSet, Sliding};

    fn group() -> IdSet {
        IdSet::explicit(vec![1])
    }

    fn model() -> TargetModel {
        let mut model = TargetModel::default();
        for name in ["FIX", "LOADED", "SLAVE_NGRP_", "SPARE", "STRESS_OUTPUT_1", "TIPS"] {
            model.node_groups.insert(name.into(), group());
        }
        for name in ["SOLID", "GRAVITY_SET", "UNUSED", "PLSTRAIN_OUTPUT_A", "CORE"] {
            model.element_groups.insert(name.into(), group());
        }
        for name in ["MASTER", "PRESSED", "IDLE"] {
            model.surface_groups.insert(name.into(), vec![(1, 1)]);
        }
        for name in ["STEEL", "RUBBER"] {
            model.materials.insert(name.into(), TargetMaterial::Solid(BTreeMap::new()));
        }
        model.sections.push(Section {
            elset: "SOLID".into(),
            material: "STEEL".into(),
            orientation: None,
        });
        model.boundaries.push(vec![Record::new("FIX", vec!["1".into(), "3".into()])]);
        let load = |kind, target: &str| TargetLoad {
            kind,
            amplitude: None,
            frequency_case: None,
            records: vec![Record::new(target, vec!["1".into()])],
        };
        model.loads.push(load(TargetLoadKind::Cload, "LOADED"));
        model.loads.push(load(TargetLoadKind::Dload { gravity: true }, "GRAVITY_SET"));
        model.loads.push(load(TargetLoadKind::Dload { gravity: false }, "PRESSED"));
        model.contact_pairs.push(TargetContact {
            sliding: Sliding::Small,
            friction: "0.".into(),
            adjust: None,
            slave: "SLAVE_NGRP_".into(),
            master: "MASTER".into(),
        });
        model.outputs.node_text.push(TextOutput {
            group: "TIPS".into(),
            frequency: "1".into(),
            variables: vec!["DISP".into()],
        });
        model.outputs.element_text.push(TextOutput {
            group: "CORE".into(),
            frequency: "1".into(),
            variables: vec!["STRESS".into()],
        });
        model
    }

    fn names(set: &BTreeSet<String>) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn keeps_exactly_the_consumed_entries() {
        let list = WriteList::resolve(&model());
        assert_eq!(names(&list.materials), vec!["STEEL"]);
        assert_eq!(
            names(&list.node_groups),
            vec!["FIX", "LOADED", "SLAVE_NGRP_", "STRESS_OUTPUT_1", "TIPS"]
        );
        assert_eq!(
            names(&list.element_groups),
            vec!["CORE", "GRAVITY_SET", "PLSTRAIN_OUTPUT_A", "SOLID"]
        );
        assert_eq!(names(&list.surface_groups), vec!["MASTER", "PRESSED"]);
    }

    #[test]
    fn undefined_references_never_appear() {
        let mut model = model();
        model.boundaries.push(vec![Record::new("GHOST", vec!["1".into(), "1".into()])]);
        let list = WriteList::resolve(&model);
        assert!(!list.node_groups.contains("GHOST"));
    }

    #[test]
    fn inherent_groups_are_not_written_twice() {
        let mut model = model();
        model.element_sections.push(a2f_model::ElementSection::new(
            a2f_model::ElementType::Tet4,
            Some("SOLID".into()),
        ));
        let list = WriteList::resolve(&model);
        assert!(!list.element_groups.contains("SOLID"));
    }

    #[test]
    fn prune_drops_unreachable_and_adds_implied_outputs() {
        let mut model = model();
        model.outputs.vtk_default = true;
        prune(&mut model);
        assert!(!model.materials.contains_key("RUBBER"));
        assert!(!model.node_groups.contains_key("SPARE"));
        assert!(!model.element_groups.contains_key("UNUSED"));
        assert!(!model.surface_groups.contains_key("IDLE"));
        assert_eq!(model.outputs.vtk, vec!["CREAC"]);
    }
}
