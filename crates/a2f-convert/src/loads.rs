//! Boundary conditions, loads, initial conditions and amplitudes.

use a2f_model::{ConvertError, LoadKind, Result, SourceModel};
use log::warn;

use crate::target::{
    Record, TargetAmplitude, TargetInitialCondition, TargetLoad, TargetLoadKind, TargetModel,
};

/// Values per amplitude output line.
const AMPLITUDE_VALUES_PER_LINE: usize = 8;

fn dof_range(low: u8, high: u8) -> Vec<String> {
    vec![low.to_string(), high.to_string()]
}

/// Expands one boundary row into explicit `node, low, high[, value]` records.
///
/// Unrecognized dof codes yield no record.
pub fn boundary_records(row: &[String]) -> Vec<Record> {
    let (Some(target), Some(code)) = (row.first(), row.get(1)) else {
        return Vec::new();
    };
    let single = |low, high| vec![Record::new(target.clone(), dof_range(low, high))];

    if let Ok(low) = code.parse::<u8>()
        && (1..=6).contains(&low)
    {
        let high = row
            .get(2)
            .and_then(|f| f.parse::<u8>().ok())
            .filter(|d| (1..=6).contains(d))
            .unwrap_or(low);
        let mut values = dof_range(low, high);
        if let Some(value) = row.get(3).filter(|v| !v.is_empty()) {
            values.push(value.clone());
        }
        return vec![Record::new(target.clone(), values)];
    }

    match code.to_ascii_uppercase().as_str() {
        "PINNED" => single(1, 3),
        "ENCASTRE" => single(1, 6),
        "XSYMM" => single(1, 1),
        "YSYMM" => single(2, 2),
        "ZSYMM" => single(3, 3),
        "XASYMM" => single(2, 3),
        "YASYMM" => {
            let mut records = single(1, 1);
            records.extend(single(3, 3));
            records
        }
        "ZASYMM" => single(1, 2),
        other => {
            warn!("boundary on {target}: unrecognized dof code {other} skipped");
            Vec::new()
        }
    }
}

pub fn convert_boundaries(source: &SourceModel, target: &mut TargetModel) {
    target.boundaries = source
        .boundaries
        .iter()
        .map(|block| block.iter().flat_map(|row| boundary_records(row)).collect())
        .collect();
}

fn passthrough(rows: &[Vec<String>]) -> Vec<Record> {
    rows.iter()
        .filter_map(|row| {
            let (first, rest) = row.split_first()?;
            Some(Record::new(first.clone(), rest.to_vec()))
        })
        .collect()
}

pub fn convert_loads(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    for (id, load) in source.loads.iter().enumerate() {
        let (kind, records) = match &load.kind {
            LoadKind::Cload => (TargetLoadKind::Cload, passthrough(&load.rows)),
            LoadKind::Temperature => (TargetLoadKind::Temperature, passthrough(&load.rows)),
            LoadKind::Dsload => {
                let mut records = Vec::with_capacity(load.rows.len());
                for row in &load.rows {
                    let (Some(surface), Some(value)) = (row.first(), row.get(2)) else {
                        return Err(ConvertError::structural(format!(
                            "*DSLOAD record {} needs a surface, a load type and a value",
                            row.join(",")
                        )));
                    };
                    records.push(Record::new(surface.clone(), vec!["S".into(), value.clone()]));
                }
                (TargetLoadKind::Dload { gravity: false }, records)
            }
            LoadKind::Dload => {
                let records = load
                    .rows
                    .first()
                    .map(|row| {
                        let values = row.get(1..).unwrap_or_default().to_vec();
                        match row.first().map(String::as_str) {
                            None | Some("") => Record::all(values),
                            Some(scope) => Record::new(scope, values),
                        }
                    })
                    .into_iter()
                    .collect();
                (TargetLoadKind::Dload { gravity: true }, records)
            }
            LoadKind::Acceleration => {
                let mut records = passthrough(&load.rows);
                let dof = load.dof.clone().ok_or_else(|| {
                    ConvertError::missing("BASE MOTION", "DOF")
                })?;
                records.push(Record::all(vec![dof.clone(), dof, load.scale.clone()]));
                (TargetLoadKind::Acceleration, records)
            }
            LoadKind::BaseMotion(kind) => {
                warn!(
                    "load {}: *BASE MOTION of type {} has no equivalent, dropped",
                    id + 1,
                    kind.as_deref().unwrap_or("(none)")
                );
                (TargetLoadKind::Dropped, Vec::new())
            }
        };
        target.loads.push(TargetLoad {
            kind,
            amplitude: load.amplitude.clone(),
            frequency_case: load.frequency_case,
            records,
        });
    }
    Ok(())
}

pub fn convert_initial_conditions(source: &SourceModel, target: &mut TargetModel) {
    target.initial_conditions = source
        .initial_conditions
        .iter()
        .map(|ic| TargetInitialCondition {
            kind: ic.kind.clone(),
            records: passthrough(&ic.rows),
        })
        .collect();
}

/// Re-pairs `(time, value)` amplitude data as `(value, time)` lines.
pub fn amplitude_lines(name: &str, values: &[String]) -> Result<Vec<String>> {
    if values.len() % 2 != 0 {
        return Err(ConvertError::structural(format!(
            "amplitude {name} has an odd number of values ({})",
            values.len()
        )));
    }
    let swapped: Vec<&str> = values
        .chunks(2)
        .flat_map(|pair| [pair[1].as_str(), pair[0].as_str()])
        .collect();
    Ok(swapped
        .chunks(AMPLITUDE_VALUES_PER_LINE)
        .map(|chunk| chunk.join(", "))
        .collect())
}

pub fn convert_amplitudes(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    for (name, amplitude) in &source.amplitudes {
        let lines = amplitude_lines(name, &amplitude.values)?;
        target.amplitudes.insert(
            name.clone(),
            TargetAmplitude {
                value: amplitude.value.clone(),
                lines,
            },
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2f_model::{FrequencyCase, build_source_model};

    fn row(text: &str) -> Vec<String> {
        text.split(',').map(|f| f.trim().to_string()).collect()
    }

    fn rendered(records: &[Record]) -> Vec<String> {
        records.iter().map(Record::render).collect()
    }

    #[test]
    fn symbolic_boundary_codes() {
        assert_eq!(rendered(&boundary_records(&row("FIX, PINNED"))), vec!["FIX, 1, 3"]);
        assert_eq!(rendered(&boundary_records(&row("FIX, encastre"))), vec!["FIX, 1, 6"]);
        assert_eq!(rendered(&boundary_records(&row("7, XASYMM"))), vec!["7, 2, 3"]);
        assert_eq!(
            rendered(&boundary_records(&row("7, YASYMM"))),
            vec!["7, 1, 1", "7, 3, 3"]
        );
        assert!(boundary_records(&row("7, SOMETHING")).is_empty());
    }

    #[test]
    fn numeric_boundary_codes() {
        assert_eq!(rendered(&boundary_records(&row("N, 2"))), vec!["N, 2, 2"]);
        assert_eq!(rendered(&boundary_records(&row("N, 1, 3"))), vec!["N, 1, 3"]);
        assert_eq!(
            rendered(&boundary_records(&row("N, 3, 3, -0.5"))),
            vec!["N, 3, 3, -0.5"]
        );
        assert_eq!(rendered(&boundary_records(&row("N, 4, , 0.1"))), vec!["N, 4, 4, 0.1"]);
    }

    #[test]
    fn ten_pairs_become_three_lines() {
        let values: Vec<String> = (0..10)
            .flat_map(|i| [format!("{i}."), format!("v{i}")])
            .collect();
        let lines = amplitude_lines("A", &values).expect("even count");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "v0, 0., v1, 1., v2, 2., v3, 3.");
        assert_eq!(lines[2], "v8, 8., v9, 9.");
    }

    #[test]
    fn odd_amplitude_is_structural() {
        let values = vec!["0.".to_string(), "1.".to_string(), "2.".to_string()];
        assert!(matches!(
            amplitude_lines("A", &values),
            Err(ConvertError::Structural(_))
        ));
    }

    #[test]
    fn load_kinds() {
        let deck = "\
*STEP
*STATIC
*DSLOAD, AMPLITUDE=ramp
SURF, P, 2.5
*DLOAD
, GRAV, 9810., 0., 0., -1.
EALL, GRAV, 1., 0., 0., 1.
*BASE MOTION, TYPE=ACCELERATION, DOF=2, SCALE=3.
*BASE MOTION, TYPE=DISPLACEMENT, DOF=1
*CLOAD, IMAGINARY
10, 2, 5.
";
        let source = build_source_model(deck).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_loads(&source, &mut target).expect("loads");

        let dsload = &target.loads[0];
        assert_eq!(dsload.kind, TargetLoadKind::Dload { gravity: false });
        assert_eq!(dsload.amplitude.as_deref(), Some("RAMP"));
        assert_eq!(rendered(&dsload.records), vec!["SURF, S, 2.5"]);

        let dload = &target.loads[1];
        assert_eq!(dload.kind, TargetLoadKind::Dload { gravity: true });
        assert_eq!(rendered(&dload.records), vec!["ALL, GRAV, 9810., 0., 0., -1."]);

        assert_eq!(rendered(&target.loads[2].records), vec!["ALL, 2, 2, 3."]);
        assert_eq!(target.loads[3].kind, TargetLoadKind::Dropped);
        assert!(target.loads[3].records.is_empty());
        assert_eq!(target.loads[4].frequency_case, Some(FrequencyCase::Imaginary));
    }
}
