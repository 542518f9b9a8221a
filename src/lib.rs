//! MLTD avatar to PMX model conversion.
//!
//! Takes a decoded Unity avatar skeleton and its merged mesh and assembles an
//! in-memory PMX model: bones with IK and eye rigs, skinned vertices, emotion
//! morphs, display groups and materials. Reading Unity bundles and writing
//! PMX files are left to the host.

pub mod config;
pub mod convert;
pub mod coords;
pub mod correction;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod naming;
pub mod physics;
pub mod pmx;
pub mod source;

pub use config::{ConversionConfig, PMX_SCALE, SkeletonFormat};
pub use convert::{
    ConversionOutput, ConversionReport, PmxBuilder, Severity, Side, ValidationIssue,
    build_pmx_model,
};
pub use error::{ConvertError, Result};
