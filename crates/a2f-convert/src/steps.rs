//! Step activation lists and analysis procedures.

use a2f_model::{Activation, ConvertError, Operation, Procedure, Result, SourceModel};
use log::info;

use crate::target::{FrequencyResponse, TargetModel, TargetProcedure, TargetStep};

/// Running set of active IDs carried from step to step.
///
/// Model-level activations seed the set. A step holding a replace activation
/// restarts the set from its own activations; otherwise they are appended.
/// Only IDs accepted by `keep` enter the set.
fn accumulate(
    model_level: &[Activation],
    steps: &[&[Activation]],
    keep: impl Fn(usize) -> bool,
) -> Vec<Vec<usize>> {
    let mut active: Vec<usize> = Vec::new();
    let push = |active: &mut Vec<usize>, id: usize| {
        if keep(id) && !active.contains(&id) {
            active.push(id);
        }
    };
    for activation in model_level {
        push(&mut active, activation.id);
    }

    steps
        .iter()
        .map(|own| {
            if own.iter().any(|a| a.op == Operation::Replace) {
                active.clear();
            }
            for activation in own.iter() {
                push(&mut active, activation.id);
            }
            active.clone()
        })
        .collect()
}

fn convert_procedure(step: usize, procedure: &Procedure) -> Result<TargetProcedure> {
    let malformed = |what: &str| ConvertError::structural(format!("step {step}: {what}"));
    Ok(match procedure {
        Procedure::Static(_) => TargetProcedure::Static,
        Procedure::Visco(lines) => TargetProcedure::Visco(
            lines
                .first()
                .map(|fields| fields.iter().take(2).cloned().collect::<Vec<_>>().join(","))
                .unwrap_or_default(),
        ),
        Procedure::Frequency(lines) => {
            let count = lines
                .first()
                .and_then(|fields| fields.first())
                .ok_or_else(|| malformed("*FREQUENCY needs the number of eigenvalues"))?;
            let n = count
                .parse::<u64>()
                .map_err(|_| malformed("*FREQUENCY eigenvalue count is not an integer"))?;
            let max_iter = n
                .checked_mul(5)
                .ok_or_else(|| malformed("*FREQUENCY eigenvalue count is too large"))?;
            TargetProcedure::Eigen {
                count: count.clone(),
                max_iter,
            }
        }
        Procedure::SteadyState(ssd) => {
            let [low, high, points, ..] = ssd.range.as_slice() else {
                return Err(malformed(
                    "*STEADY STATE DYNAMICS needs a lower, upper frequency and point count",
                ));
            };
            let (Some(alpha), Some(beta)) = (ssd.damping.get(2), ssd.damping.get(3)) else {
                return Err(malformed("*MODAL DAMPING needs the Rayleigh alpha and beta"));
            };
            TargetProcedure::FrequencyResponse(FrequencyResponse {
                scale: ssd.scale.clone(),
                interval: ssd.interval.clone(),
                low: low.clone(),
                high: high.clone(),
                points: points.clone(),
                alpha: alpha.clone(),
                beta: beta.clone(),
            })
        }
    })
}

/// Builds the per-step activation lists and procedures.
///
/// Runs after boundaries, loads and rigid links so that records emptied by
/// those passes are left out of every step.
pub fn convert_steps(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    let Some((model_level, user_steps)) = source.steps.split_first() else {
        return Ok(());
    };

    let boundary_steps: Vec<&[Activation]> =
        user_steps.iter().map(|s| s.boundaries.as_slice()).collect();
    let load_steps: Vec<&[Activation]> = user_steps.iter().map(|s| s.loads.as_slice()).collect();

    let boundaries = accumulate(&model_level.boundaries, &boundary_steps, |id| {
        target.boundaries.get(id).is_some_and(|b| !b.is_empty())
    });
    let loads = accumulate(&model_level.loads, &load_steps, |id| {
        target.loads.get(id).is_some_and(|l| !l.records.is_empty())
    });

    let mut steps = Vec::with_capacity(user_steps.len());
    for (index, ((step, boundaries), loads)) in
        user_steps.iter().zip(boundaries).zip(loads).enumerate()
    {
        let procedure = match &step.procedure {
            Some(p) => Some(convert_procedure(index + 1, p)?),
            None => {
                info!("step {} has no supported procedure", index + 1);
                None
            }
        };
        steps.push(TargetStep {
            boundaries,
            loads,
            procedure,
        });
    }
    target.steps = steps;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loads::{convert_boundaries, convert_loads};
    use a2f_model::build_source_model;

    fn convert(deck: &str) -> Result<TargetModel> {
        let source = build_source_model(deck).expect("deck should parse");
        let mut target = TargetModel::default();
        convert_boundaries(&source, &mut target);
        convert_loads(&source, &mut target)?;
        convert_steps(&source, &mut target)?;
        Ok(target)
    }

    fn act(id: usize, op: Operation) -> Activation {
        Activation { id, op }
    }

    #[test]
    fn replace_restarts_the_running_set() {
        use Operation::*;
        let model = [act(0, Accumulate)];
        let s1 = [act(1, Accumulate)];
        let s2 = [act(2, Replace)];
        let s3: [Activation; 0] = [];
        let sets = accumulate(&model, &[&s1[..], &s2[..], &s3[..]], |_| true);
        assert_eq!(sets, vec![vec![0, 1], vec![2], vec![2]]);
    }

    #[test]
    fn eigen_iterations_are_five_per_mode() {
        let target = convert("*STEP\n*FREQUENCY\n12\n*END STEP\n").expect("convert");
        assert!(matches!(
            target.steps[0].procedure,
            Some(TargetProcedure::Eigen { max_iter: 60, .. })
        ));
    }

    #[test]
    fn huge_eigenvalue_count_is_structural() {
        let err = convert("*STEP\n*FREQUENCY\n4000000000000000000\n*END STEP\n")
            .expect_err("count overflows the iteration limit");
        assert!(matches!(err, ConvertError::Structural(_)));
    }

    #[test]
    fn empty_records_are_never_activated() {
        let model = [act(0, Operation::Accumulate)];
        let own = [act(1, Operation::Accumulate)];
        let sets = accumulate(&model, &[&own[..]], |id| id != 0);
        assert_eq!(sets, vec![vec![1]]);
    }

    #[test]
    fn steps_carry_boundaries_loads_and_procedures() {
        let target = convert(
            "\
*BOUNDARY
FIX, ENCASTRE
*BOUNDARY
FIX, BOGUS
*STEP
*VISCO
0.1, 10., 1e-5, 1.
*CLOAD
5, 3, -1.
*STEP
*FREQUENCY
12
*BOUNDARY, OP=NEW
FIX, 1, 1
*STEP
*CLOAD, OP=NEW
",
        )
        .expect("steps");
        assert_eq!(target.steps.len(), 3);
        assert_eq!(target.steps[0].boundaries, vec![0]);
        assert_eq!(target.steps[0].loads, vec![0]);
        assert_eq!(target.steps[0].procedure, Some(TargetProcedure::Visco("0.1,10.".into())));
        assert_eq!(target.steps[1].boundaries, vec![2]);
        assert_eq!(
            target.steps[1].procedure,
            Some(TargetProcedure::Eigen {
                count: "12".into(),
                max_iter: 60
            })
        );
        assert_eq!(target.steps[2].boundaries, vec![2]);
        assert!(target.steps[2].loads.is_empty());
        assert_eq!(target.steps[2].procedure, None);
    }

    #[test]
    fn steady_state_reads_range_and_damping() {
        let target = convert(
            "\
*STEP
*STEADY STATE DYNAMICS, FREQUENCY SCALE=LINEAR, INTERVAL=RANGE
1., 100., 20
*MODAL DAMPING, RAYLEIGH
1, 10, 0.5, 0.01
",
        )
        .expect("steps");
        let Some(TargetProcedure::FrequencyResponse(fr)) = &target.steps[0].procedure else {
            panic!("expected a frequency response procedure");
        };
        assert_eq!((fr.low.as_str(), fr.high.as_str(), fr.points.as_str()), ("1.", "100.", "20"));
        assert_eq!((fr.alpha.as_str(), fr.beta.as_str()), ("0.5", "0.01"));
        assert_eq!(fr.interval_code(), 1);
    }
}
