use std::sync::Arc;

use robotex_core::VisionSnapshot;
use robotex_simulator::RobotHandle;

/// The part of a robot the remote protocol can reach.
pub trait RobotLink {
    /// Sets left and right drive power, each in [-1, 1].
    fn set_wheels(&self, left: f64, right: f64);

    /// Arms the coilgun for the next tick.
    fn kick(&self);

    fn vision(&self) -> Arc<VisionSnapshot>;
}

impl RobotLink for RobotHandle {
    fn set_wheels(&self, left: f64, right: f64) {
        RobotHandle::set_wheels(self, left, right);
    }

    fn kick(&self) {
        RobotHandle::kick(self);
    }

    fn vision(&self) -> Arc<VisionSnapshot> {
        RobotHandle::vision(self)
    }
}
