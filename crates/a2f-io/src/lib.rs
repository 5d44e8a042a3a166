//! FrontISTR artifacts for an Abaqus deck.
//!
//! This crate provides:
//! - **[`convert`]**, the whole pipeline from deck text to artifact text
//! - **Mesh** (`.msh`), **control** (`.cnt`) and **job** (`hecmw_ctrl.dat`)
//!   emitters
//! - **[`ConvertOptions`]**, loadable from JSON
//! - **[`ConvertedJob`]**, committed to a directory all at once

pub mod bundle;
pub mod control;
mod deck;
pub mod error;
pub mod job;
pub mod mesh;
pub mod options;

pub use bundle::ConvertedJob;
pub use control::write_control;
pub use error::{IoError, Result};
pub use job::{write_job, write_partition};
pub use mesh::write_mesh;
pub use options::{
    AutoContact, ContactSmoothing, ConvertOptions, Distributed, ElementLog, NodalLog, Stabilize,
    StepControl,
};

use a2f_convert::convert_model;
use a2f_model::build_source_model;
use log::info;

/// Parses, converts and emits `input`; nothing is produced unless every
/// stage succeeds.
pub fn convert(input: &str, options: &ConvertOptions) -> Result<ConvertedJob> {
    let source = build_source_model(input)?;
    let model = convert_model(&source)?;
    info!("emitting job {}", options.job_name);
    Ok(ConvertedJob {
        job_name: options.job_name.clone(),
        mesh: write_mesh(&model),
        control: write_control(&model, options),
        job: write_job(&options.job_name, &options.distributed),
        partition: write_partition(&options.distributed),
    })
}
