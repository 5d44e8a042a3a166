//! Field output requests.

use a2f_model::{OutputKind, OutputScope, SourceModel};
use log::debug;

use crate::target::{OutputPlan, TargetModel, TextOutput};

/// Variables written when `VARIABLE=PRESELECT` is requested.
pub const DEFAULT_VTK_VARIABLES: [&str; 4] = ["DISP", "REAC", "STRAIN", "STRESS"];

/// FrontISTR result name of an output variable.
pub fn target_variable(name: &str) -> Option<&'static str> {
    Some(match name {
        "U" => "DISP",
        "V" => "VELOCITY",
        "A" => "ACCELERATION",
        "UR" => "ROTATION",
        "RF" => "REAC",
        "RM" => "REACMOMENT",
        "LE" => "STRAIN",
        "S" => "STRESS",
        "NT" => "TEMPERATURE",
        "PEEQ" => "PEEQ",
        "CEEQ" => "CEEQ",
        "CFORCE" => "CONTREAC",
        "CPRESS" => "CONTPRESS",
        _ => return None,
    })
}

fn push_text(list: &mut Vec<TextOutput>, output: TextOutput) {
    let duplicate = list
        .iter()
        .any(|o| o.group == output.group && o.variables == output.variables);
    if !duplicate {
        list.push(output);
    }
}

pub fn convert_outputs(source: &SourceModel, target: &mut TargetModel) {
    let mut plan = OutputPlan::default();
    for request in &source.outputs {
        if request.kind != OutputKind::Field {
            continue;
        }
        if request.variable.as_deref() == Some("PRESELECT") {
            plan.vtk_default = true;
            for variable in DEFAULT_VTK_VARIABLES {
                plan.push_vtk(variable);
            }
            continue;
        }
        for entry in &request.entries {
            let variables: Vec<String> = entry
                .variables
                .iter()
                .filter_map(|v| target_variable(v))
                .map(str::to_string)
                .collect();
            if variables.is_empty() {
                debug!("output line without known variables skipped");
                continue;
            }
            match &entry.scope {
                OutputScope::Nodes(group) => push_text(
                    &mut plan.node_text,
                    TextOutput {
                        group: group.clone(),
                        frequency: request.frequency.clone(),
                        variables,
                    },
                ),
                OutputScope::Elements(group) => push_text(
                    &mut plan.element_text,
                    TextOutput {
                        group: group.clone(),
                        frequency: request.frequency.clone(),
                        variables,
                    },
                ),
                OutputScope::Model => {
                    for variable in &variables {
                        plan.push_vtk(variable);
                    }
                }
            }
        }
    }
    target.outputs = plan;
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2f_model::build_source_model;

    fn plan(deck: &str) -> OutputPlan {
        let source = build_source_model(deck).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_outputs(&source, &mut target);
        target.outputs
    }

    #[test]
    fn preselect_enables_defaults() {
        let plan = plan("*OUTPUT, FIELD, VARIABLE=PRESELECT\n");
        assert!(plan.vtk_default);
        assert_eq!(plan.vtk, DEFAULT_VTK_VARIABLES.to_vec());
    }

    #[test]
    fn scoped_lines_become_text_outputs() {
        let plan = plan(
            "\
*OUTPUT, FIELD, FREQUENCY=5
*NODE OUTPUT, NSET=TIP
U, RF, BOGUS
*NODE OUTPUT, NSET=TIP
U, RF
*ELEMENT OUTPUT, ELSET=CORE
S
*NODE OUTPUT
NT, U
*CONTACT OUTPUT
CPRESS, U
*OUTPUT, HISTORY
*NODE OUTPUT
V
",
        );
        assert!(!plan.vtk_default);
        assert_eq!(plan.node_text.len(), 1);
        assert_eq!(plan.node_text[0].group, "TIP");
        assert_eq!(plan.node_text[0].frequency, "5");
        assert_eq!(plan.node_text[0].variables, vec!["DISP", "REAC"]);
        assert_eq!(plan.element_text[0].variables, vec!["STRESS"]);
        assert_eq!(plan.vtk, vec!["TEMPERATURE", "DISP", "CONTPRESS"]);
    }
}
