//! Emission options.
//!
//! Everything here is optional in an options file; missing fields take the
//! values FrontISTR users get from the stock converter.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Stem of the `.msh` and `.cnt` file names.
    pub job_name: String,
    pub log_nodal: NodalLog,
    pub log_element: ElementLog,
    /// Penalty of sliding contact pairs.
    pub contact_penalty: String,
    /// Penalty of tied and slide-only pairs.
    pub tie_penalty: String,
    pub stabilize: Stabilize,
    pub contact_smoothing: ContactSmoothing,
    pub output_collected_data: bool,
    /// Writes `!ELASTIC, CAUCHY`.
    pub hypoelastic: bool,
    pub auto_contact: AutoContact,
    /// Per-step solver controls; later steps reuse the last entry.
    pub step_controls: Vec<StepControl>,
    /// Adds the `!VISUAL` block for AVS output.
    pub avs_output: bool,
    pub distributed: Distributed,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            job_name: "model".to_string(),
            log_nodal: NodalLog::default(),
            log_element: ElementLog::default(),
            contact_penalty: "1.0E+3".to_string(),
            tie_penalty: "1.0E+3".to_string(),
            stabilize: Stabilize::default(),
            contact_smoothing: ContactSmoothing::default(),
            output_collected_data: false,
            hypoelastic: false,
            auto_contact: AutoContact::default(),
            step_controls: vec![StepControl::default(); 3],
            avs_output: false,
            distributed: Distributed::default(),
        }
    }
}

impl ConvertOptions {
    /// Reads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Controls for the 0-based step `index`.
    pub fn step_control(&self, index: usize) -> StepControl {
        match self.step_controls.len() {
            0 => StepControl::default(),
            len => self.step_controls[index.min(len - 1)].clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodalLog {
    pub disp: bool,
    pub reac: bool,
    pub strain: bool,
    pub stress: bool,
}

impl Default for NodalLog {
    fn default() -> Self {
        Self {
            disp: false,
            reac: true,
            strain: false,
            stress: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementLog {
    pub strain: bool,
    pub stress: bool,
    pub plastic_strain: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stabilize {
    pub enabled: bool,
    pub factor: f64,
}

impl Default for Stabilize {
    fn default() -> Self {
        Self {
            enabled: false,
            factor: 1.0e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactSmoothing {
    /// Smoothing is written only when this exceeds 1e-10.
    pub length: f64,
    pub factor: f64,
}

impl Default for ContactSmoothing {
    fn default() -> Self {
        Self {
            length: 0.0,
            factor: 0.001,
        }
    }
}

/// `!AUTO_CONTACT` parameters; numeric fields are written as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoContact {
    pub enabled: bool,
    pub kind: String,
    pub log: String,
    pub friction: String,
    pub penalty: String,
    pub local_angle: String,
    pub global_angle: String,
    pub distance: String,
    pub margin: String,
}

impl Default for AutoContact {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: "SSLID".to_string(),
            log: "SUMMARY".to_string(),
            friction: "0.2".to_string(),
            penalty: "1.0e+3".to_string(),
            local_angle: "60.0".to_string(),
            global_angle: "30.0".to_string(),
            distance: "10.0".to_string(),
            margin: "-1.0e-6".to_string(),
        }
    }
}

impl AutoContact {
    pub fn contact_line(&self) -> String {
        format!("{},{}", self.friction, self.penalty)
    }

    pub fn search_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.local_angle, self.global_angle, self.distance, self.margin
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepControl {
    pub substeps: u32,
    pub smoothing: u32,
    pub max_iter: u32,
    pub output_frequency: u32,
    pub convergence: f64,
}

impl Default for StepControl {
    fn default() -> Self {
        Self {
            substeps: 1,
            smoothing: 0,
            max_iter: 50,
            output_frequency: 1,
            convergence: 1.0e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distributed {
    pub enabled: bool,
    pub domains: u32,
}

impl Default for Distributed {
    fn default() -> Self {
        Self {
            enabled: false,
            domains: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let options: ConvertOptions = serde_json::from_str(
            r#"{"job_name": "bracket", "log_nodal": {"disp": true}, "distributed": {"enabled": true, "domains": 4}}"#,
        )
        .expect("options should parse");
        assert_eq!(options.job_name, "bracket");
        assert!(options.log_nodal.disp);
        assert!(options.log_nodal.reac);
        assert_eq!(options.distributed.domains, 4);
        assert_eq!(options.tie_penalty, "1.0E+3");
        assert_eq!(options.step_controls.len(), 3);
    }

    #[test]
    fn later_steps_reuse_last_control() {
        let mut options = ConvertOptions::default();
        options.step_controls = vec![
            StepControl::default(),
            StepControl {
                substeps: 10,
                ..StepControl::default()
            },
        ];
        assert_eq!(options.step_control(0).substeps, 1);
        assert_eq!(options.step_control(1).substeps, 10);
        assert_eq!(options.step_control(7).substeps, 10);

        options.step_controls.clear();
        assert_eq!(options.step_control(2), StepControl::default());
    }

    #[test]
    fn auto_contact_lines() {
        let ac = AutoContact::default();
        assert_eq!(ac.contact_line(), "0.2,1.0e+3");
        assert_eq!(ac.search_line(), "60.0,30.0,10.0,-1.0e-6");
    }

    #[test]
    fn loads_options_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("options.json");
        fs::write(&path, r#"{"avs_output": true}"#).expect("write options");
        let options = ConvertOptions::load(&path).expect("load options");
        assert!(options.avs_output);
        assert_eq!(options.job_name, "model");
    }
}
