//! Material property conversion.

use std::collections::{BTreeMap, BTreeSet};

use a2f_model::numfmt::format_g;
use a2f_model::{
    ConvertError, Hardening, Material, Property, PropertyDetail, PropertyKind, Result,
    SourceModel, parse_real,
};
use log::debug;

use crate::target::{TargetMaterial, TargetModel, TargetProperty};

/// Converts every material and settles the model reference temperature.
pub fn convert_materials(source: &SourceModel, target: &mut TargetModel) -> Result<()> {
    for (name, material) in &source.materials {
        let converted = convert_material(name, material)?;
        target
            .materials
            .insert(name.clone(), TargetMaterial::Solid(converted));
    }
    target.reference_temperature = reference_temperature(target)?;
    Ok(())
}

fn convert_material(name: &str, material: &Material) -> Result<BTreeMap<PropertyKind, TargetProperty>> {
    if material.properties.contains_key(&PropertyKind::Trs)
        && !material.properties.contains_key(&PropertyKind::Viscoelastic)
    {
        return Err(ConvertError::structural(format!(
            "material {name}: *TRS needs a *VISCOELASTIC definition"
        )));
    }

    let mut out = BTreeMap::new();
    for (kind, property) in &material.properties {
        let converted = convert_property(property).map_err(|err| match err {
            ConvertError::Structural(message) => {
                ConvertError::Structural(format!("material {name}, {}: {message}", kind.as_str()))
            }
            other => other,
        })?;
        out.insert(*kind, converted);
    }
    Ok(out)
}

fn field_count(line: &str) -> usize {
    line.split(',').count()
}

fn convert_property(property: &Property) -> Result<TargetProperty> {
    let mut out = TargetProperty::new(property.kind);
    out.orthotropic = property.orthotropic;
    out.lines = property.lines.clone();
    let first = property.lines.first().map_or(0, |l| field_count(l));
    let has_data = !property.lines.is_empty();

    match (&property.kind, &property.detail) {
        (PropertyKind::Elastic, _) => {
            if property.orthotropic {
                if let Some(second) = property.lines.get(1) {
                    out.dependent = field_count(second) > 1;
                }
                out.lines = merge_pairs(&property.lines);
            } else {
                out.dependent = first > 2;
            }
        }
        (PropertyKind::Expansion, PropertyDetail::Expansion { reference_temperature }) => {
            let limit = if property.orthotropic { 3 } else { 1 };
            out.dependent = has_data && first > limit;
            out.reference_temperature = Some(reference_temperature.clone());
        }
        (PropertyKind::Density, _) => out.dependent = first > 1,
        (PropertyKind::Hyperelastic, PropertyDetail::Hyperelastic { model, order }) => {
            if matches!(order.as_deref(), Some("3") | Some("4")) {
                out.lines = merge_pairs(&property.lines);
            }
            out.model = Some(match order {
                Some(n) if model == "OGDEN" => format!("{model}_A{n}"),
                _ => model.clone(),
            });
        }
        (PropertyKind::Viscoelastic, _) => {
            out.lines = property.lines.iter().map(|l| drop_second_field(l)).collect();
        }
        (PropertyKind::Plastic, PropertyDetail::Plastic { hardening }) => {
            let mut hardening = *hardening;
            match hardening {
                Hardening::Isotropic if has_data => {
                    hardening = if property.lines.len() > 1 {
                        Hardening::Multilinear
                    } else {
                        Hardening::Bilinear
                    };
                    if first > 2 {
                        out.dependent = true;
                        out.lines = resample_plastic(&property.lines)?;
                    }
                }
                Hardening::Kinematic => out.dependent = first > 2,
                _ => out.dependent = first > 3,
            }
            out.hardening = Some(hardening);
        }
        (PropertyKind::Trs, PropertyDetail::Trs { definition }) => {
            out.definition = definition.clone();
        }
        (PropertyKind::DruckerPrager, _) => {
            return Err(ConvertError::unsupported("DRUCKER PRAGER", "no FrontISTR equivalent"));
        }
        (PropertyKind::Creep, _) => out.dependent = first > 3,
        _ => {}
    }
    Ok(out)
}

/// Joins consecutive lines two at a time; a trailing odd line stands alone.
fn merge_pairs(lines: &[String]) -> Vec<String> {
    lines
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|l| l.chars().filter(|c| !c.is_whitespace()).collect::<String>())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect()
}

fn drop_second_field(line: &str) -> String {
    let mut fields: Vec<&str> = line.split(',').collect();
    if fields.len() > 1 {
        fields.remove(1);
    }
    fields.join(",")
}

/// Resamples temperature-dependent isotropic hardening data.
///
/// Every temperature is brought onto the union of all plastic-strain
/// break-points. Missing stresses are linearly interpolated between the
/// neighbouring known points of the same temperature and held constant past
/// the last one.
///
/// # Arguments
///
/// * `lines` - `stress, plastic strain, temperature` records
///
/// # Returns
///
/// `%12.6G` formatted `stress, strain, temperature` lines, grouped by
/// ascending temperature.
pub fn resample_plastic(lines: &[String]) -> Result<Vec<String>> {
    if lines.len() < 2 {
        return Ok(lines.to_vec());
    }
    let mut records = Vec::with_capacity(lines.len());
    for line in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            return Err(ConvertError::structural(format!(
                "plastic record '{line}' needs stress, strain and temperature"
            )));
        }
        records.push([
            parse_real(fields[0], 0)?,
            parse_real(fields[1], 0)?,
            parse_real(fields[2], 0)?,
        ]);
    }

    let table = resample_table(&records)?;
    Ok(table
        .iter()
        .map(|[stress, strain, temp]| {
            format!(
                "{}, {}, {}",
                format_g(*stress, 12, 6, true),
                format_g(*strain, 12, 6, true),
                format_g(*temp, 12, 6, true)
            )
        })
        .collect())
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup();
    v
}

pub(crate) fn resample_table(records: &[[f64; 3]]) -> Result<Vec<[f64; 3]>> {
    let strains = sorted_unique(records.iter().map(|r| r[1]));
    let temps = sorted_unique(records.iter().map(|r| r[2]));
    debug!(
        "resampling plastic table: {} strains x {} temperatures",
        strains.len(),
        temps.len()
    );

    let mut out = Vec::with_capacity(strains.len() * temps.len());
    for &temp in &temps {
        let mut column: Vec<Option<f64>> = strains
            .iter()
            .map(|&strain| {
                records
                    .iter()
                    .rev()
                    .find(|r| r[1] == strain && r[2] == temp)
                    .map(|r| r[0])
            })
            .collect();

        if column[0].is_none() {
            return Err(ConvertError::structural(format!(
                "initial plastic strain must be defined at temperature {temp}"
            )));
        }
        for i in 1..strains.len() {
            if column[i].is_some() {
                continue;
            }
            let prev = column[i - 1].unwrap_or_default();
            let next = (i + 1..strains.len()).find_map(|j| column[j].map(|s| (strains[j], s)));
            column[i] = Some(match next {
                None => prev,
                Some((next_strain, next_stress)) => {
                    let span = next_strain - strains[i - 1];
                    let w_prev = (next_strain - strains[i]) / span;
                    let w_next = (strains[i] - strains[i - 1]) / span;
                    w_prev * prev + w_next * next_stress
                }
            });
        }
        for (strain, stress) in strains.iter().zip(column) {
            out.push([stress.unwrap_or_default(), *strain, temp]);
        }
    }
    Ok(out)
}

/// Common reference temperature of all temperature-dependent expansions.
fn reference_temperature(target: &TargetModel) -> Result<Option<String>> {
    let temps: BTreeSet<&str> = target
        .materials
        .values()
        .filter_map(|m| m.property(PropertyKind::Expansion))
        .filter(|p| p.dependent)
        .filter_map(|p| p.reference_temperature.as_deref())
        .collect();
    match temps.len() {
        0 => Ok(None),
        1 => Ok(temps.into_iter().next().map(str::to_string)),
        _ => Err(ConvertError::structural(format!(
            "all reference temperatures must be the same, found {}",
            temps.into_iter().collect::<Vec<_>>().join(", ")
        ))),
    }
}
