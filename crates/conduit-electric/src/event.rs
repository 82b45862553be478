//! Electric faults and where they are reported.

use conduit_core::id::Dim;
use conduit_core::pos::Pos;
use serde::{Deserialize, Serialize};

/// Receives faults as the controller finds them.
pub trait ElectricEvents {
    /// A cable on a route was rated below the attempted voltage.
    fn cable_over_voltage(&mut self, dim: Dim, pos: Pos, voltage: i32);

    /// A cable carried more amperage than it is rated for, either on one
    /// route or summed across routes sharing it.
    fn cable_over_amperage(&mut self, dim: Dim, pos: Pos, amperage: i32);

    /// A consumer is rated below its producer's output voltage.
    fn node_over_voltage(&mut self, dim: Dim, pos: Pos, voltage: i32);
}

/// A recorded fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectricEvent {
    CableOverVoltage { dim: Dim, pos: Pos, voltage: i32 },
    CableOverAmperage { dim: Dim, pos: Pos, amperage: i32 },
    NodeOverVoltage { dim: Dim, pos: Pos, voltage: i32 },
}

impl ElectricEvent {
    pub fn pos(&self) -> Pos {
        match *self {
            ElectricEvent::CableOverVoltage { pos, .. }
            | ElectricEvent::CableOverAmperage { pos, .. }
            | ElectricEvent::NodeOverVoltage { pos, .. } => pos,
        }
    }
}

impl ElectricEvents for Vec<ElectricEvent> {
    fn cable_over_voltage(&mut self, dim: Dim, pos: Pos, voltage: i32) {
        self.push(ElectricEvent::CableOverVoltage { dim, pos, voltage });
    }

    fn cable_over_amperage(&mut self, dim: Dim, pos: Pos, amperage: i32) {
        self.push(ElectricEvent::CableOverAmperage { dim, pos, amperage });
    }

    fn node_over_voltage(&mut self, dim: Dim, pos: Pos, voltage: i32) {
        self.push(ElectricEvent::NodeOverVoltage { dim, pos, voltage });
    }
}
