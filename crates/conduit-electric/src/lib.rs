//! Electric distribution for Conduit networks.
//!
//! Nodes store energy and push it to each other through cables at a fixed
//! voltage and a bounded amperage. Each tick every producer serves the
//! consumers it can reach, cheapest route first as discovered, and the
//! controller checks the cables on the way:
//!
//! - a route whose weakest cable cannot carry the attempted voltage or
//!   amperage is *corrupted*: every failing cable is reported and the tick
//!   stops there;
//! - traffic crossing a crossroad cable is totalled across all routes, and a
//!   cable whose total exceeds its rating is reported once the tick is done.
//!
//! Faults go to an [`ElectricEvents`] sink passed into the tick.

use conduit_core::connectivity::Connectable;
use conduit_core::network::Network;
use conduit_core::pos::Dir;
use serde::{Deserialize, Serialize};

pub mod consumer;
pub mod controller;
pub mod device;
pub mod event;

pub use consumer::ElectricConsumer;
pub use controller::ElectricController;
pub use device::{Cable, ElectricDevice};
pub use event::{ElectricEvent, ElectricEvents};

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// A node that stores energy and may output or accept it.
pub trait ElectricNode: Connectable {
    fn energy(&self) -> i64;

    fn capacity(&self) -> i64;

    fn output_voltage(&self) -> i32;

    /// Amperage the node can push per tick.
    fn output_amperage(&self) -> i32;

    /// Highest voltage the node tolerates on input.
    fn input_voltage(&self) -> i32;

    fn input_amperage(&self) -> i32;

    fn can_output(&self) -> bool;

    fn can_output_towards(&self, dir: Dir) -> bool;

    fn can_input(&self) -> bool;

    /// Store up to `amount`, returning how much was (or would be) accepted.
    fn insert(&mut self, amount: i64, simulate: bool) -> i64;

    /// Take up to `amount`, returning how much was (or would be) removed.
    fn extract(&mut self, amount: i64, simulate: bool) -> i64;
}

/// Outcome of putting a given voltage and amperage through a cable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    FailVoltage,
    FailAmperage,
}

/// A cable segment.
pub trait ElectricCable: Connectable {
    /// Voltage lost crossing this segment.
    fn loss(&self) -> i32;

    /// Rated voltage.
    fn voltage(&self) -> i32;

    /// Rated amperage.
    fn amps(&self) -> i32;

    fn handler(&self, voltage: i32, amperage: i32) -> Status {
        if voltage > self.voltage() {
            Status::FailVoltage
        } else if amperage > self.amps() {
            Status::FailAmperage
        } else {
            Status::Ok
        }
    }
}

/// An electric network over the reference device types.
pub type ElectricNetwork<C = Cable, N = ElectricDevice> = Network<C, N, ElectricController>;
