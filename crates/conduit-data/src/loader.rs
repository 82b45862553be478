//! Reading layout files and turning them into electric networks.
//!
//! Provides format detection (RON/JSON/TOML), parsing, and a builder that
//! resolves type names and places every block.

use crate::schema::{CableData, DeviceData, LayoutData, PlacementData, RunData};
use conduit_core::connectivity::Sides;
use conduit_core::id::Dim;
use conduit_core::pos::{Dir, Pos};
use conduit_electric::{Cable, ElectricDevice, ElectricNetwork};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or building a layout.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}'")]
    UnresolvedRef {
        name: String,
        expected_kind: &'static str,
    },

    /// Two cable or device types share a name.
    #[error("duplicate name '{name}'")]
    DuplicateName { name: String },

    /// Something was placed where something already is.
    #[error("position {pos} is already occupied")]
    Occupied { pos: Pos },

    /// A run whose ends differ on more than one axis.
    #[error("cable run from {from:?} to {to:?} is not axis-aligned")]
    MalformedRun { from: [i32; 3], to: [i32; 3] },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported layout file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Parsing
// ===========================================================================

fn parse_from(content: &str, format: Format, file: &Path) -> Result<LayoutData, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Parse a layout held in memory.
pub fn parse_layout(content: &str, format: Format) -> Result<LayoutData, DataLoadError> {
    parse_from(content, format, Path::new("<memory>"))
}

/// Read a layout file, picking the format from its extension.
pub fn load_layout(path: &Path) -> Result<LayoutData, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let layout = parse_from(&content, format, path)?;
    log::debug!(
        "loaded layout {}: {} placements, {} runs",
        path.display(),
        layout.placements.len(),
        layout.runs.len()
    );
    Ok(layout)
}

// ===========================================================================
// Building
// ===========================================================================

enum Kind<'a> {
    Cable(&'a CableData),
    Device(&'a DeviceData),
}

fn registry(layout: &LayoutData) -> Result<HashMap<&str, Kind<'_>>, DataLoadError> {
    let mut kinds = HashMap::new();
    let entries = layout
        .cables
        .iter()
        .map(|cable| (cable.name.as_str(), Kind::Cable(cable)))
        .chain(
            layout
                .devices
                .iter()
                .map(|device| (device.name.as_str(), Kind::Device(device))),
        );
    for (name, kind) in entries {
        if kinds.insert(name, kind).is_some() {
            return Err(DataLoadError::DuplicateName {
                name: name.to_string(),
            });
        }
    }
    Ok(kinds)
}

fn sides(dirs: Option<&Vec<Dir>>) -> Sides {
    dirs.map_or(Sides::ALL, |dirs| dirs.iter().copied().collect())
}

fn cable(data: &CableData) -> Cable {
    let cable = Cable::new(data.voltage, data.amps, data.loss);
    if data.pass_through {
        cable.pass_through()
    } else {
        cable
    }
}

fn device(data: &DeviceData) -> ElectricDevice {
    ElectricDevice {
        energy: data.energy.min(data.capacity),
        capacity: data.capacity,
        output_voltage: data.output_voltage,
        output_amperage: data.output_amperage,
        input_voltage: data.input_voltage,
        input_amperage: data.input_amperage,
        sides: Sides::ALL,
        output_sides: Sides::ALL,
    }
}

fn place(
    network: &mut ElectricNetwork,
    kinds: &HashMap<&str, Kind<'_>>,
    placement: &PlacementData,
) -> Result<(), DataLoadError> {
    let [x, y, z] = placement.pos;
    let pos = Pos::new(x, y, z);
    if network.contains(pos) {
        return Err(DataLoadError::Occupied { pos });
    }

    let linked = sides(placement.sides.as_ref());
    match kinds.get(placement.kind.as_str()) {
        Some(Kind::Cable(data)) => {
            network.add_connector(pos, cable(data).with_sides(linked));
        }
        Some(Kind::Device(data)) => {
            let node = device(data)
                .with_sides(linked)
                .with_output_sides(sides(placement.output_sides.as_ref()));
            network.add_node(pos, node);
        }
        None => {
            return Err(DataLoadError::UnresolvedRef {
                name: placement.kind.clone(),
                expected_kind: "cable or device",
            });
        }
    }
    Ok(())
}

/// Every position of a run, `from` first.
fn run_positions(run: &RunData) -> Result<Vec<Pos>, DataLoadError> {
    let differing = (0..3).filter(|&axis| run.from[axis] != run.to[axis]).count();
    if differing > 1 {
        return Err(DataLoadError::MalformedRun {
            from: run.from,
            to: run.to,
        });
    }

    let length = (0..3)
        .map(|axis| (run.to[axis] - run.from[axis]).abs())
        .max()
        .unwrap_or(0);
    let step = |axis: usize| (run.to[axis] - run.from[axis]).signum();
    Ok((0..=length)
        .map(|i| {
            Pos::new(
                run.from[0] + step(0) * i,
                run.from[1] + step(1) * i,
                run.from[2] + step(2) * i,
            )
        })
        .collect())
}

fn lay(
    network: &mut ElectricNetwork,
    kinds: &HashMap<&str, Kind<'_>>,
    run: &RunData,
) -> Result<(), DataLoadError> {
    let Some(Kind::Cable(data)) = kinds.get(run.cable.as_str()) else {
        return Err(DataLoadError::UnresolvedRef {
            name: run.cable.clone(),
            expected_kind: "cable",
        });
    };
    for pos in run_positions(run)? {
        if network.contains(pos) {
            return Err(DataLoadError::Occupied { pos });
        }
        network.add_connector(pos, cable(data));
    }
    Ok(())
}

/// Build a ready-to-tick network: single placements first, then runs.
pub fn build_network(layout: &LayoutData) -> Result<ElectricNetwork, DataLoadError> {
    let kinds = registry(layout)?;
    let mut network = ElectricNetwork::new(Dim(layout.dim));

    for placement in &layout.placements {
        place(&mut network, &kinds, placement)?;
    }
    for run in &layout.runs {
        lay(&mut network, &kinds, run)?;
    }

    log::debug!(
        "built network in {:?}: {} groups",
        network.dim(),
        network.graph().count_groups()
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_electric::ElectricEvent;
    use std::fs;

    /// Create a temporary directory for test data files.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "conduit_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const RON_LAYOUT: &str = r#"(
        dim: 1,
        cables: [(name: "copper", voltage: 128, amps: 8, loss: 1)],
        devices: [
            (name: "generator", capacity: 10000, energy: 10000, output_voltage: 100, output_amperage: 4),
            (name: "machine", capacity: 1000, input_voltage: 120, input_amperage: 4),
        ],
        placements: [
            (kind: "generator", pos: (0, 64, 0)),
            (kind: "machine", pos: (4, 64, 0)),
        ],
        runs: [(cable: "copper", from: (1, 64, 0), to: (3, 64, 0))],
    )"#;

    const TOML_LAYOUT: &str = r#"
dim = 0

[[cables]]
name = "tin"
voltage = 32
amps = 1

[[devices]]
name = "panel"
capacity = 100
energy = 100
output_voltage = 32
output_amperage = 1

[[placements]]
kind = "panel"
pos = [0, 0, 0]
output_sides = ["east"]

[[placements]]
kind = "tin"
pos = [1, 0, 0]
"#;

    const JSON_LAYOUT: &str = r#"{
        "cables": [{"name": "gold", "voltage": 512, "amps": 2}],
        "devices": [{"name": "battery", "capacity": 500}],
        "runs": [{"cable": "gold", "from": [0, 0, 5], "to": [0, 0, 2]}]
    }"#;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_known_extensions() {
        assert_eq!(detect_format(Path::new("a.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("a.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("a.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_rejects_other_extensions() {
        let err = detect_format(Path::new("layout.yaml")).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat { .. }));
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parse_every_format() {
        let ron = parse_layout(RON_LAYOUT, Format::Ron).unwrap();
        assert_eq!(ron.dim, 1);
        assert_eq!(ron.devices.len(), 2);
        assert_eq!(ron.runs[0].to, [3, 64, 0]);

        let toml = parse_layout(TOML_LAYOUT, Format::Toml).unwrap();
        assert_eq!(toml.placements[0].output_sides, Some(vec![Dir::East]));
        assert!(toml.runs.is_empty());

        let json = parse_layout(JSON_LAYOUT, Format::Json).unwrap();
        assert_eq!(json.dim, 0);
        assert_eq!(json.cables[0].loss, 0);
    }

    #[test]
    fn parse_errors_carry_detail() {
        let err = parse_layout("{ not json", Format::Json).unwrap_err();
        match err {
            DataLoadError::Parse { detail, .. } => assert!(!detail.is_empty()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn load_layout_from_disk() {
        let dir = make_test_dir("load");
        let path = dir.join("layout.ron");
        fs::write(&path, RON_LAYOUT).unwrap();

        let layout = load_layout(&path).unwrap();
        assert_eq!(layout.placements.len(), 2);

        let missing = load_layout(&dir.join("missing.toml")).unwrap_err();
        assert!(matches!(missing, DataLoadError::Io(_)));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    #[test]
    fn built_network_distributes() {
        let layout = parse_layout(RON_LAYOUT, Format::Ron).unwrap();
        let mut network = build_network(&layout).unwrap();
        assert_eq!(network.dim(), Dim(1));
        assert_eq!(network.graph().count_groups(), 1);

        let mut events: Vec<ElectricEvent> = Vec::new();
        assert_eq!(network.tick(&mut events), 0);
        assert!(events.is_empty());
        // Three cables at loss 1 each: 97 per amp, 4 amps.
        assert_eq!(network.node(Pos::new(4, 64, 0)).unwrap().energy, 388);
        assert_eq!(network.node(Pos::new(0, 64, 0)).unwrap().energy, 9600);
    }

    #[test]
    fn placement_overrides_sides() {
        let layout = parse_layout(TOML_LAYOUT, Format::Toml).unwrap();
        let network = build_network(&layout).unwrap();
        let panel = network.node(Pos::new(0, 0, 0)).unwrap();
        assert_eq!(panel.output_sides, Sides::NONE.with(Dir::East));
        assert!(network.connector(Pos::new(1, 0, 0)).is_some());
    }

    #[test]
    fn runs_walk_backwards_too() {
        let layout = parse_layout(JSON_LAYOUT, Format::Json).unwrap();
        let network = build_network(&layout).unwrap();
        for z in 2..=5 {
            assert!(network.connector(Pos::new(0, 0, z)).is_some());
        }
        assert_eq!(network.graph().count_groups(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut layout = parse_layout(JSON_LAYOUT, Format::Json).unwrap();
        layout.devices[0].name = "gold".to_string();
        let err = build_network(&layout).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateName { name } if name == "gold"));
    }

    #[test]
    fn unknown_kinds_are_rejected() {
        let mut layout = parse_layout(RON_LAYOUT, Format::Ron).unwrap();
        layout.placements[1].kind = "reactor".to_string();
        let err = build_network(&layout).unwrap_err();
        assert!(matches!(err, DataLoadError::UnresolvedRef { name, .. } if name == "reactor"));

        let mut layout = parse_layout(RON_LAYOUT, Format::Ron).unwrap();
        layout.runs[0].cable = "machine".to_string();
        let err = build_network(&layout).unwrap_err();
        assert!(matches!(err, DataLoadError::UnresolvedRef { expected_kind: "cable", .. }));
    }

    #[test]
    fn overlapping_blocks_are_rejected() {
        let mut layout = parse_layout(RON_LAYOUT, Format::Ron).unwrap();
        layout.runs[0].to = [4, 64, 0];
        let err = build_network(&layout).unwrap_err();
        assert!(matches!(err, DataLoadError::Occupied { pos } if pos == Pos::new(4, 64, 0)));
    }

    #[test]
    fn diagonal_runs_are_rejected() {
        let mut layout = parse_layout(JSON_LAYOUT, Format::Json).unwrap();
        layout.runs[0].to = [1, 0, 2];
        let err = build_network(&layout).unwrap_err();
        assert!(matches!(err, DataLoadError::MalformedRun { .. }));
    }
}
