//! Serde structs for declarative network layouts.
//!
//! A layout names cable and device types once, then places them: one block
//! at a time, or as straight runs of cable. Positions are `[x, y, z]`.

use conduit_core::pos::Dir;
use serde::Deserialize;

// ===========================================================================
// Layout
// ===========================================================================

/// One dimension's worth of cables and devices.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutData {
    #[serde(default)]
    pub dim: i32,
    #[serde(default)]
    pub cables: Vec<CableData>,
    #[serde(default)]
    pub devices: Vec<DeviceData>,
    #[serde(default)]
    pub placements: Vec<PlacementData>,
    #[serde(default)]
    pub runs: Vec<RunData>,
}

// ===========================================================================
// Types
// ===========================================================================

/// A cable type.
#[derive(Debug, Clone, Deserialize)]
pub struct CableData {
    pub name: String,
    pub voltage: i32,
    pub amps: i32,
    #[serde(default)]
    pub loss: i32,
    #[serde(default)]
    pub pass_through: bool,
}

/// A device type. Non-zero output ratings make it a producer, non-zero input
/// ratings a consumer.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceData {
    pub name: String,
    pub capacity: i64,
    #[serde(default)]
    pub energy: i64,
    #[serde(default)]
    pub output_voltage: i32,
    #[serde(default)]
    pub output_amperage: i32,
    #[serde(default)]
    pub input_voltage: i32,
    #[serde(default)]
    pub input_amperage: i32,
}

// ===========================================================================
// Placement
// ===========================================================================

/// One cable or device at one position.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacementData {
    /// Name of a cable or device type.
    pub kind: String,
    pub pos: [i32; 3],
    /// Sides it links on. All six when absent.
    #[serde(default)]
    pub sides: Option<Vec<Dir>>,
    /// Sides a device may output through. All six when absent.
    #[serde(default)]
    pub output_sides: Option<Vec<Dir>>,
}

/// A straight, axis-aligned run of one cable type, both ends included.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub cable: String,
    pub from: [i32; 3],
    pub to: [i32; 3],
}
