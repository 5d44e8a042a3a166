//! Control artifact (`<job>.cnt`).

use a2f_convert::outputs::DEFAULT_VTK_VARIABLES;
use a2f_convert::{
    FrequencyResponse, TargetLoadKind, TargetMaterial, TargetModel, TargetProcedure,
    TargetProperty, name_mod,
};
use a2f_model::numfmt::format_e;
use a2f_model::{PropertyKind, Sliding};
use log::debug;

use crate::deck::Deck;
use crate::options::{ConvertOptions, StepControl};

const DEFAULT_CONVERGENCE: f64 = 1.0e-6;
const FULL_TEXT_OUTPUT_ABOVE: u64 = 1000;

fn banner(deck: &mut Deck, title: &str) {
    let rule = "#".repeat(35);
    deck.line(&rule);
    deck.line(format!("#####{title:^25}#####"));
    deck.line(&rule);
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

/// `!SOLUTION` type implied by the analysis flags and contacts.
pub fn solution_type(model: &TargetModel) -> &'static str {
    let flags = model.flags;
    if flags.nlgeom {
        "NLSTATIC"
    } else if flags.eigen {
        if flags.frequency_response { "DYNAMIC" } else { "EIGEN" }
    } else if !model.contact_pairs.is_empty() {
        "NLSTATIC"
    } else {
        "STATIC"
    }
}

pub fn write_control(model: &TargetModel, options: &ConvertOptions) -> String {
    let mut deck = Deck::new();
    write_solver(&mut deck, model, options);
    write_conditions(&mut deck, model, options);
    write_materials(&mut deck, model, options);
    write_steps(&mut deck, model, options);

    if options.avs_output {
        banner(&mut deck, "FOR VISUALIZER");
        deck.line("!WRITE,VISUAL");
        deck.line("!VISUAL, method=PSR");
        deck.line("!surface_num=1");
        deck.line("!surface 1");
        deck.line("!output_type = COMPLETE_REORDER_AVS");
    }
    deck.line("!END");
    deck.into_string()
}

fn write_solver(deck: &mut Deck, model: &TargetModel, options: &ConvertOptions) {
    banner(deck, "SOLVER INFORMATION");
    deck.line("!VERSION");
    deck.line(" 3");
    deck.line(format!("!SOLUTION, TYPE={}", solution_type(model)));
    if !model.contact_pairs.is_empty() {
        deck.line("!CONTACT_ALGO,TYPE=ALAGRANGE");
    }
    let ac = &options.auto_contact;
    if ac.enabled {
        deck.line(format!("!AUTO_CONTACT,TYPE={},LOG={}", ac.kind, ac.log));
        deck.line(ac.contact_line());
        deck.line(ac.search_line());
    }

    let nodal = &options.log_nodal;
    let element = &options.log_element;
    deck.line("!WRITE,LOG");
    deck.line("!NODE_OUTPUT");
    deck.line(format!("DISP,{}", on_off(nodal.disp)));
    deck.line(format!("REAC,{}", on_off(nodal.reac)));
    deck.line(format!("STRAIN,{}", on_off(nodal.strain)));
    deck.line(format!("STRESS,{}", on_off(nodal.stress)));
    deck.line("!ELEMENT_OUTPUT, POSITION=INTEG");
    deck.line(format!("STRAIN,{}", on_off(element.strain)));
    deck.line(format!("STRESS,{}", on_off(element.stress)));
    deck.line(format!("PLSTRAIN,{}", on_off(element.plastic_strain)));

    if options.distributed.enabled {
        deck.line("!SOLVER,METHOD=CG,PRECOND=3,NSET=0,ITERLOG=NO,TIMELOG=YES");
    } else {
        deck.line("!SOLVER,METHOD=DIRECT,PRECOND=1,NSET=0,ITERLOG=YES,TIMELOG=YES");
    }
    deck.lines([" 500000, 2", " 1.00e-08, 1.00, 0.0", " 0.100, 0.100"]);

    if options.stabilize.enabled {
        deck.line(format!(
            "!STABILIZE, STAB={}",
            format_e(options.stabilize.factor, 10, 4, true)
        ));
    }
    let smoothing = &options.contact_smoothing;
    if smoothing.length > 1.0e-10 {
        deck.line(format!(
            "!CONTACT_SMOOTHING, STAB={},DISTANCE={}",
            format_e(smoothing.factor, 9, 3, true),
            format_e(smoothing.length, 9, 3, true)
        ));
    }
    if options.output_collected_data {
        deck.line("!OUTPUT_COLL_DATA");
    }

    let outputs = &model.outputs;
    deck.line("!VTK_OUTPUT_CONTROL");
    for variable in DEFAULT_VTK_VARIABLES {
        let on = outputs.vtk.iter().any(|v| v == variable);
        deck.line(format!("{variable},{}", on_off(on)));
    }
    for variable in outputs
        .vtk
        .iter()
        .filter(|v| !DEFAULT_VTK_VARIABLES.contains(&v.as_str()))
    {
        deck.line(format!("{variable},ON"));
    }

    for output in &outputs.node_text {
        if !model.node_groups.contains_key(&output.group) {
            debug!("node output on undefined group {} skipped", output.group);
            continue;
        }
        deck.line(format!(
            "!TXT_OUTPUT_NODE, NGRP={}, FORMAT={}, FREQ={}",
            name_mod(&output.group),
            text_format(&output.frequency),
            output.frequency
        ));
        deck.lines(&output.variables);
    }
    for output in &outputs.element_text {
        if !model.element_groups.contains_key(&output.group) {
            debug!("element output on undefined group {} skipped", output.group);
            continue;
        }
        deck.line(format!(
            "!TXT_OUTPUT_ELEM, EGRP={}, FORMAT={}, FREQ={}",
            name_mod(&output.group),
            text_format(&output.frequency),
            output.frequency
        ));
        deck.lines(&output.variables);
    }
}

fn text_format(frequency: &str) -> &'static str {
    match frequency.trim().parse::<u64>() {
        Ok(freq) if freq > FULL_TEXT_OUTPUT_ABOVE => "FULL",
        _ => "SUMMARY",
    }
}

fn write_conditions(deck: &mut Deck, model: &TargetModel, options: &ConvertOptions) {
    banner(deck, "BOUNDARY CONDITIONS");
    for (n, block) in model.boundaries.iter().enumerate() {
        if block.is_empty() {
            continue;
        }
        deck.line(format!("!BOUNDARY, GRPID={}", n + 1));
        deck.lines(block.iter().map(|r| r.render()));
    }

    for (n, load) in model.loads.iter().enumerate() {
        if load.records.is_empty() {
            continue;
        }
        let grpid = n + 1;
        let mut header = match (load.kind, load.frequency_case) {
            (TargetLoadKind::Dropped, _) => continue,
            (TargetLoadKind::Cload | TargetLoadKind::Dload { .. }, Some(case)) => {
                format!("!FLOAD, LOAD CASE={}", case.load_case())
            }
            (TargetLoadKind::Cload, None) => format!("!CLOAD, GRPID={grpid}"),
            (TargetLoadKind::Dload { .. }, None) => format!("!DLOAD, GRPID={grpid}"),
            (TargetLoadKind::Temperature, _) => format!("!TEMPERATURE, GRPID={grpid}"),
            (TargetLoadKind::Acceleration, _) => "!ACCELERATION".to_string(),
        };
        if let Some(amplitude) = &load.amplitude {
            header.push_str(&format!(", AMP={}", name_mod(amplitude)));
        }
        deck.line(header);
        deck.lines(load.records.iter().map(|r| r.render()));
    }

    if !model.contact_pairs.is_empty() {
        banner(deck, "CONTACT DEFINITIONS");
        for (n, pair) in model.contact_pairs.iter().enumerate() {
            let id = n + 1;
            let mut header = format!("!CONTACT, INTERACTION={}, ", pair.sliding.as_str());
            if let Some(adjust) = &pair.adjust {
                header.push_str(&format!("ADJUST={adjust}, "));
            }
            header.push_str(&format!("GRPID={id}"));
            deck.line(header);
            let penalty = match pair.sliding {
                Sliding::Small | Sliding::Finite => &options.contact_penalty,
                Sliding::Tied | Sliding::SlideOnly => &options.tie_penalty,
            };
            deck.line(format!("CP{id}, {}, {penalty}", pair.friction));
        }
    }

    for link in &model.rigid_links {
        deck.line(format!("!RIGIDLINK, DOF={}", link.axis.dof()));
        deck.lines(link.slaves.iter().map(|s| format!(" {}, {s}", link.master)));
    }
}

fn property_card(property: &TargetProperty, options: &ConvertOptions) -> String {
    let mut card = match property.kind {
        PropertyKind::Elastic if options.hypoelastic => "!ELASTIC, CAUCHY".to_string(),
        PropertyKind::Elastic => "!ELASTIC".to_string(),
        PropertyKind::Density => "!DENSITY".to_string(),
        PropertyKind::Expansion => match property.reference_temperature.as_deref() {
            Some(zero) if zero != "0.0" => format!("!EXPANSION_COEFF, ZERO={zero}"),
            _ => "!EXPANSION_COEFF".to_string(),
        },
        PropertyKind::Plastic => match property.hardening {
            Some(hardening) => format!("!PLASTIC, YIELD=MISES, HARDEN={}", hardening.as_str()),
            None => "!PLASTIC, YIELD=MISES".to_string(),
        },
        PropertyKind::Hyperelastic => format!(
            "!HYPERELASTIC, TYPE={}",
            property.model.as_deref().unwrap_or("NONE")
        ),
        PropertyKind::Viscoelastic => "!VISCOELASTIC".to_string(),
        PropertyKind::Trs => match &property.definition {
            Some(definition) => format!("!TRS, DEFINITION={definition}"),
            None => "!TRS".to_string(),
        },
        PropertyKind::Creep => "!CREEP".to_string(),
        PropertyKind::DruckerPrager => "!DRUCKER_PRAGER".to_string(),
    };
    if property.orthotropic {
        card.push_str(", TYPE=ORTHOTROPIC");
    }
    if property.dependent {
        card.push_str(", DEPENDENCIES=1");
    }
    card
}

fn write_materials(deck: &mut Deck, model: &TargetModel, options: &ConvertOptions) {
    banner(deck, "MATERIAL");
    if let Some(temperature) = &model.reference_temperature {
        deck.line("!REFTEMP");
        deck.line(format!(" {temperature}"));
    }
    for (name, line) in &model.orientations {
        deck.line(format!("!ORIENTATION, NAME={}", name_mod(name)));
        deck.line(line);
    }
    for (n, section) in model.sections.iter().enumerate() {
        if let Some(orientation) = &section.orientation {
            deck.line(format!(
                "!SECTION, SECNUM={}, ORIENTATION={}",
                n + 1,
                name_mod(orientation)
            ));
        }
    }
    for (name, material) in &model.materials {
        let TargetMaterial::Solid(props) = material else {
            continue;
        };
        deck.line(format!("!MATERIAL, NAME={}", name_mod(name)));
        for property in props.values() {
            deck.line(property_card(property, options));
            deck.lines(&property.lines);
        }
    }
}

fn step_header(visco: bool, nlgeom: bool, control: &StepControl) -> String {
    let mut header = String::from("!STEP");
    if visco {
        header.push_str(", TYPE=VISCO");
    }
    if !nlgeom {
        header.push_str(", SUBSTEPS=1");
        return header;
    }
    header.push_str(&format!(", SUBSTEPS={}", control.substeps.max(1)));
    header.push_str(&format!(", OUTFREQ={}", control.output_frequency.max(1)));
    if control.smoothing > 0 {
        header.push_str(&format!(", SMOOTHING={}", control.smoothing));
    }
    header.push_str(&format!(", MAXITER={}", control.max_iter));
    if control.convergence != DEFAULT_CONVERGENCE {
        header.push_str(&format!(", CONVERG={}", format_e(control.convergence, 9, 3, true)));
    }
    header
}

fn write_dynamic(deck: &mut Deck, response: &FrequencyResponse, eigen_count: &str, nlgeom: bool) {
    deck.line("!EIGENREAD, TYPE=VTK");
    deck.line(" dummy.vtk");
    deck.line(format!(" 1, {eigen_count}"));
    deck.line(if nlgeom { "!DYNAMIC, TYPE=NONLINEAR" } else { "!DYNAMIC" });
    deck.line(" 1, 2");
    deck.line(format!(
        " {}, {}, {}, 1.0",
        response.low, response.high, response.points
    ));
    deck.line(" 0.0, 1.0");
    deck.line(format!(" 1, 1, {}, {}", response.alpha, response.beta));
    deck.line(" 1, 1, 1");
    deck.line(format!(" 0, 0, 0, {}, 0, 0", response.interval_code()));
}

fn write_steps(deck: &mut Deck, model: &TargetModel, options: &ConvertOptions) {
    banner(deck, "STEP CONTROL");
    let nlgeom = model.flags.nlgeom;
    let mut eigen_count = "1".to_string();
    for (index, step) in model.steps.iter().enumerate() {
        match &step.procedure {
            None => debug!("step {} has no procedure, nothing written", index + 1),
            Some(procedure @ (TargetProcedure::Static | TargetProcedure::Visco(_))) => {
                let visco = match procedure {
                    TargetProcedure::Visco(line) => Some(line),
                    _ => None,
                };
                deck.line(step_header(visco.is_some(), nlgeom, &options.step_control(index)));
                if let Some(line) = visco {
                    deck.line(line);
                }
                deck.lines(step.boundaries.iter().map(|b| format!("BOUNDARY,{}", b + 1)));
                deck.lines(step.loads.iter().map(|l| format!("LOAD,{}", l + 1)));
                deck.lines((1..=model.contact_pairs.len()).map(|c| format!("CONTACT,{c}")));
            }
            Some(TargetProcedure::Eigen { count, max_iter }) => {
                deck.line("!EIGEN");
                deck.line(format!("{count}, 1.0E-8, {max_iter}"));
                eigen_count = count.clone();
            }
            Some(TargetProcedure::FrequencyResponse(response)) => {
                write_dynamic(deck, response, &eigen_count, nlgeom);
            }
        }
    }
}
