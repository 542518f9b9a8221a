//! Physics import seam.
//!
//! Turning sway controllers into rigid bodies and joints is done by the host;
//! the builder only calls it once the bone list is final.

use crate::error::Result;
use crate::pmx::{PmxBone, PmxJoint, PmxRigidBody};
use crate::source::SwayController;

/// Rigid bodies and joints produced by a [`PhysicsImporter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhysicsData {
    pub rigid_bodies: Vec<PmxRigidBody>,
    pub joints: Vec<PmxJoint>,
}

/// Imports physics bodies from the body and head sway controllers.
///
/// `bones` is the final bone list; rigid bodies must reference bones by index
/// into it.
pub trait PhysicsImporter {
    fn import(
        &self,
        bones: &[PmxBone],
        body_sway: &SwayController,
        head_sway: &SwayController,
    ) -> Result<PhysicsData>;
}
