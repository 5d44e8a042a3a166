//! Source-side model of an Abaqus deck.
//!
//! This crate provides:
//! - **Ingestion** of a tokenized deck into a [`SourceModel`] ([`builder`])
//! - **Element topology** tables (target codes, face node lists)
//! - **Id sets** with generate ranges and explicit lists
//! - **Coordinate frames** for `*SYSTEM`
//! - **printf-style number formatting** shared by the emitters

pub mod builder;
pub mod elements;
pub mod error;
pub mod frame;
pub mod numfmt;
pub mod sets;
pub mod source;
pub mod topology;

pub use builder::{SourceModelBuilder, build_source_model, canonical, parse_real};
pub use elements::{ElementSection, RangeIndex};
pub use error::{ConvertError, Result};
pub use frame::{CoordinateFrame, NodeLineFormat};
pub use sets::{IdRange, IdSet, SetBlock, parse_id};
pub use source::{
    Activation, AnalysisFlags, Amplitude, ContactPair, FrequencyCase, Hardening, InitialCondition,
    Interaction, Load, LoadKind, Material, Mpc, MpcKind, Operation, Orientation, OutputEntry,
    OutputKind, OutputRequest, OutputScope, Procedure, Property, PropertyDetail, PropertyKind,
    Sliding, SolidSection, SourceModel, Spring, SteadyStateDynamics, Step, Surface, SurfaceKind,
};
pub use topology::ElementType;
