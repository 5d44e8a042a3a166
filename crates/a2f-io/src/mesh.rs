//! Mesh artifact (`<job>.msh`).

use a2f_convert::{TargetMaterial, TargetModel, name_mod};
use a2f_model::numfmt::{digit_count, format_e};
use a2f_model::{ElementType, IdSet, PropertyKind, SetBlock};
use log::{info, warn};

use crate::deck::Deck;

/// Rigid-link elements written per link.
const ROTATION_LINK_SLAVES: usize = 100;
const PER_LINE: usize = 10;

pub fn write_mesh(model: &TargetModel) -> String {
    let mut deck = Deck::new();

    deck.line("!NODE");
    for line in &model.nodes {
        match rewrite_node_line(line) {
            Some(rewritten) => deck.line(rewritten),
            None => deck.line(line),
        }
    }

    let max_element = write_elements(&mut deck, model);
    write_rotation_links(&mut deck, model, max_element);

    for (name, set) in &model.node_groups {
        write_id_set(&mut deck, &format!("!NGROUP, NGRP={}", name_mod(name)), set);
    }
    for (name, set) in &model.element_groups {
        write_id_set(&mut deck, &format!("!EGROUP, EGRP={}", name_mod(name)), set);
    }
    for (name, faces) in &model.surface_groups {
        deck.line(format!("!SGROUP, SGRP={}", name_mod(name)));
        let items: Vec<String> = faces.iter().map(|(e, f)| format!("{e},{f},")).collect();
        deck.packed(&items, PER_LINE);
    }

    for (name, material) in &model.materials {
        write_material(&mut deck, name, material);
    }
    if !model.rigid_links.is_empty() {
        deck.line("!MATERIAL, NAME=ROTATION_MAT, ITEM=1");
        deck.line("!ITEM=1, SUBITEM=1");
        deck.line(" 0.0");
    }

    for (n, pair) in model.contact_pairs.iter().enumerate() {
        deck.line(format!("!CONTACT PAIR, NAME=CP{}", n + 1));
        deck.line(format!("{}, {}", name_mod(&pair.slave), name_mod(&pair.master)));
    }

    for section in &model.sections {
        deck.line(format!(
            "!SECTION, TYPE=SOLID, EGRP={}, MATERIAL={}",
            name_mod(&section.elset),
            name_mod(&section.material)
        ));
        deck.line("1.0");
    }
    if !model.rigid_links.is_empty() {
        deck.line("!SECTION, TYPE=SOLID, EGRP=ROTATIONLINK, MATERIAL=ROTATION_MAT");
        deck.line("1.0");
    }

    for ic in &model.initial_conditions {
        deck.line(format!("!INITIAL CONDITION, TYPE={}", ic.kind));
        deck.lines(ic.records.iter().map(|r| r.render()));
    }

    for (name, amplitude) in &model.amplitudes {
        deck.line(format!(
            "!AMPLITUDE, NAME={}, VALUE={}",
            name_mod(name),
            amplitude.value
        ));
        deck.lines(amplitude.lines.iter().map(|l| format!(" {l}")));
    }

    deck.into_string()
}

/// True when the line holds an exponent on a mantissa without a decimal
/// point, such as `-1e+02`, which FrontISTR reads as an integer.
fn has_integer_mantissa_exponent(line: &str) -> bool {
    let bytes = line.as_bytes();
    for (i, &lead) in bytes.iter().enumerate() {
        if !(matches!(lead, b'+' | b'-' | b'|') || lead.is_ascii_whitespace()) {
            continue;
        }
        let mut j = i + 1;
        while j < bytes.len() && (b'1'..=b'9').contains(&bytes[j]) {
            j += 1;
        }
        if j > i + 1
            && j + 1 < bytes.len()
            && matches!(bytes[j], b'e' | b'E')
            && matches!(bytes[j + 1], b'+' | b'-')
        {
            return true;
        }
    }
    false
}

/// Rewrites the coordinates of a node line as `%e`, keeping the width of
/// the first coordinate field.
fn rewrite_node_line(line: &str) -> Option<String> {
    if !has_integer_mantissa_exponent(line) {
        return None;
    }
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    let fields: Vec<&str> = compact.split(',').collect();
    if fields.len() < 4 {
        warn!("node line '{line}' has fewer than three coordinates, written as is");
        return None;
    }
    let width = fields[1].len().saturating_sub(2);
    let mut coords = Vec::with_capacity(3);
    for field in &fields[1..4] {
        match field.parse::<f64>() {
            Ok(value) => coords.push(format!("  {}", format_e(value, width, 5, false))),
            Err(_) => {
                warn!("node line '{line}' has a malformed coordinate, written as is");
                return None;
            }
        }
    }
    Some(format!("{},{}", fields[0], coords.join(",")))
}

/// Writes every element block and returns the largest element ID written.
fn write_elements(deck: &mut Deck, model: &TargetModel) -> u64 {
    let width = digit_count(model.nodes.len() as u64) + 1;
    let mut max_element = 0;
    for section in &model.element_sections {
        if section.element_type == ElementType::Mass {
            info!("MASS elements are not converted");
            continue;
        }
        let mut header = format!("!ELEMENT, TYPE={}", section.element_type.code());
        if let Some(group) = &section.group {
            header.push_str(&format!(", EGRP={}", name_mod(group)));
        }
        deck.line(header);
        for (id, nodes) in section.sorted() {
            let mut row = format!("{id:7}");
            for node in nodes {
                row.push_str(&format!(",{node:>width$}"));
            }
            deck.line(row);
        }
        max_element = max_element.max(section.max_id().unwrap_or(0));
    }
    max_element
}

fn write_rotation_links(deck: &mut Deck, model: &TargetModel, max_element: u64) {
    if model.rigid_links.is_empty() {
        return;
    }
    deck.line("!ELEMENT, TYPE=111, EGRP=ROTATIONLINK");
    let mut id = max_element;
    for link in &model.rigid_links {
        if link.slaves.len() > ROTATION_LINK_SLAVES {
            warn!(
                "rigid link on node {} has {} slaves, rotation elements written for the first {ROTATION_LINK_SLAVES}",
                link.master,
                link.slaves.len()
            );
        }
        for slave in link.slaves.iter().take(ROTATION_LINK_SLAVES) {
            id += 1;
            deck.line(format!("{id:7}, {}, {slave}", link.master));
        }
    }
}

fn write_id_set(deck: &mut Deck, header: &str, set: &IdSet) {
    for block in &set.blocks {
        match block {
            SetBlock::Generate(ranges) => {
                deck.line(format!("{header}, GENERATE"));
                for range in ranges {
                    deck.line(format!("{}, {}, {}", range.start, range.end, range.stride));
                }
            }
            SetBlock::Explicit(ids) => {
                deck.line(header);
                let width = ids.iter().max().map_or(1, |&max| digit_count(max) + 1);
                let items: Vec<String> = ids.iter().map(|id| format!("{id:>width$},")).collect();
                deck.packed(&items, PER_LINE);
            }
        }
    }
}

fn write_material(deck: &mut Deck, name: &str, material: &TargetMaterial) {
    match material {
        TargetMaterial::Spring { stiffness, dof } => {
            deck.line(format!("!MATERIAL, NAME={}, ITEM=1", name_mod(name)));
            let subitems = if dof.is_empty() { 1 } else { 2 };
            deck.line(format!("!ITEM=1, SUBITEM={subitems}"));
            deck.line(stiffness);
        }
        TargetMaterial::Solid(props) => {
            let density = props.get(&PropertyKind::Density);
            let expansion = props.get(&PropertyKind::Expansion);
            let items = if expansion.is_some() {
                3
            } else if density.is_some() {
                2
            } else {
                1
            };
            deck.line(format!("!MATERIAL, NAME={}, ITEM={items}", name_mod(name)));

            deck.line("!ITEM=1, SUBITEM=2");
            match props.get(&PropertyKind::Elastic) {
                Some(elastic) if !elastic.dependent && !elastic.orthotropic => {
                    deck.lines(&elastic.lines)
                }
                _ => deck.line("1000.,  0.3"),
            }
            if items > 1 {
                deck.line("!ITEM=2, SUBITEM=1");
                match density {
                    Some(density) if !density.dependent => deck.lines(&density.lines),
                    _ => deck.line("1.0"),
                }
            }
            if let Some(expansion) = expansion {
                deck.line("!ITEM=3, SUBITEM=1");
                if expansion.dependent || expansion.orthotropic {
                    deck.line("1.0E-7");
                } else {
                    deck.lines(&expansion.lines);
                }
            }
        }
    }
}
