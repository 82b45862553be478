//! Reference node and cable types.

use crate::{ElectricCable, ElectricNode};
use conduit_core::connectivity::{Connectable, Sides};
use conduit_core::pos::Dir;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// A buffered machine: a generator, a battery or a consumer, depending on
/// which of its ratings are non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectricDevice {
    pub energy: i64,
    pub capacity: i64,
    pub output_voltage: i32,
    pub output_amperage: i32,
    pub input_voltage: i32,
    pub input_amperage: i32,
    /// Sides the device links on.
    #[serde(default)]
    pub sides: Sides,
    /// Sides the device may output through.
    #[serde(default)]
    pub output_sides: Sides,
}

impl ElectricDevice {
    /// A full generator outputting `amperage` at `voltage`.
    pub fn producer(voltage: i32, amperage: i32, energy: i64) -> Self {
        Self {
            energy,
            capacity: energy,
            output_voltage: voltage,
            output_amperage: amperage,
            input_voltage: 0,
            input_amperage: 0,
            sides: Sides::ALL,
            output_sides: Sides::ALL,
        }
    }

    /// An empty consumer tolerating up to `voltage`.
    pub fn consumer(voltage: i32, amperage: i32, capacity: i64) -> Self {
        Self {
            energy: 0,
            capacity,
            output_voltage: 0,
            output_amperage: 0,
            input_voltage: voltage,
            input_amperage: amperage,
            sides: Sides::ALL,
            output_sides: Sides::NONE,
        }
    }

    pub fn with_sides(mut self, sides: Sides) -> Self {
        self.sides = sides;
        self
    }

    pub fn with_output_sides(mut self, sides: Sides) -> Self {
        self.output_sides = sides;
        self
    }
}

impl Connectable for ElectricDevice {
    fn connects(&self, dir: Dir) -> bool {
        self.sides.contains(dir)
    }
}

impl ElectricNode for ElectricDevice {
    fn energy(&self) -> i64 {
        self.energy
    }

    fn capacity(&self) -> i64 {
        self.capacity
    }

    fn output_voltage(&self) -> i32 {
        self.output_voltage
    }

    fn output_amperage(&self) -> i32 {
        self.output_amperage
    }

    fn input_voltage(&self) -> i32 {
        self.input_voltage
    }

    fn input_amperage(&self) -> i32 {
        self.input_amperage
    }

    fn can_output(&self) -> bool {
        self.output_amperage > 0 && self.output_sides != Sides::NONE
    }

    fn can_output_towards(&self, dir: Dir) -> bool {
        self.can_output() && self.output_sides.contains(dir)
    }

    fn can_input(&self) -> bool {
        self.input_amperage > 0 && self.input_voltage > 0
    }

    fn insert(&mut self, amount: i64, simulate: bool) -> i64 {
        let accepted = amount.min(self.capacity - self.energy).max(0);
        if !simulate {
            self.energy += accepted;
        }
        accepted
    }

    fn extract(&mut self, amount: i64, simulate: bool) -> i64 {
        let taken = amount.min(self.energy).max(0);
        if !simulate {
            self.energy -= taken;
        }
        taken
    }
}

// ---------------------------------------------------------------------------
// Cables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cable {
    pub voltage: i32,
    pub amps: i32,
    pub loss: i32,
    #[serde(default)]
    pub sides: Sides,
    /// Never counted as a crossroad.
    #[serde(default)]
    pub pass_through: bool,
}

impl Cable {
    pub fn new(voltage: i32, amps: i32, loss: i32) -> Self {
        Self {
            voltage,
            amps,
            loss,
            sides: Sides::ALL,
            pass_through: false,
        }
    }

    pub fn with_sides(mut self, sides: Sides) -> Self {
        self.sides = sides;
        self
    }

    pub fn pass_through(mut self) -> Self {
        self.pass_through = true;
        self
    }
}

impl Connectable for Cable {
    fn connects(&self, dir: Dir) -> bool {
        self.sides.contains(dir)
    }

    fn is_pass_through(&self) -> bool {
        self.pass_through
    }
}

impl ElectricCable for Cable {
    fn loss(&self) -> i32 {
        self.loss
    }

    fn voltage(&self) -> i32 {
        self.voltage
    }

    fn amps(&self) -> i32 {
        self.amps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    #[test]
    fn insert_and_extract_respect_bounds() {
        let mut device = ElectricDevice::consumer(120, 5, 100);
        assert_eq!(device.insert(150, true), 100);
        assert_eq!(device.energy, 0);
        assert_eq!(device.insert(60, false), 60);
        assert_eq!(device.insert(60, false), 40);
        assert_eq!(device.extract(30, false), 30);
        assert_eq!(device.extract(500, true), 70);
        assert_eq!(device.energy, 70);
    }

    #[test]
    fn output_permissions() {
        let producer =
            ElectricDevice::producer(100, 5, 1000).with_output_sides(Sides::NONE.with(Dir::East));
        assert!(producer.can_output());
        assert!(producer.can_output_towards(Dir::East));
        assert!(!producer.can_output_towards(Dir::West));
        assert!(!producer.can_input());

        let consumer = ElectricDevice::consumer(120, 5, 100);
        assert!(!consumer.can_output());
        assert!(consumer.can_input());
    }

    #[test]
    fn cable_handler_checks_voltage_first() {
        let cable = Cable::new(100, 4, 1);
        assert_eq!(cable.handler(100, 4), Status::Ok);
        assert_eq!(cable.handler(101, 9), Status::FailVoltage);
        assert_eq!(cable.handler(100, 5), Status::FailAmperage);
    }
}
