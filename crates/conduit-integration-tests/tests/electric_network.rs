//! Integration test: electric networks driven through topology changes.
//!
//! Blocks are placed and broken through an `ElectricNetwork`, which keeps
//! one controller per group; each test ticks the network and checks where
//! the energy went and which faults were raised.

use conduit_core::id::Dim;
use conduit_core::pos::Pos;
use conduit_core::test_utils::pos;
use conduit_electric::{Cable, ElectricDevice, ElectricEvent, ElectricNetwork};

fn network() -> ElectricNetwork {
    ElectricNetwork::new(Dim(0))
}

fn energy(network: &ElectricNetwork, at: Pos) -> i64 {
    network.node(at).map_or(-1, |node| node.energy)
}

/// Producer at x = 0, `cables` cables, consumer right after them.
fn line(
    network: &mut ElectricNetwork,
    cables: i32,
    cable: Cable,
    producer: ElectricDevice,
    consumer: ElectricDevice,
) -> Pos {
    network.add_node(pos(0, 0, 0), producer);
    for x in 1..=cables {
        network.add_connector(pos(x, 0, 0), cable.clone());
    }
    let end = pos(cables + 1, 0, 0);
    network.add_node(end, consumer);
    end
}

#[test]
fn consumer_fills_over_several_ticks() {
    let mut network = network();
    let consumer = line(
        &mut network,
        2,
        Cable::new(128, 8, 0),
        ElectricDevice::producer(100, 5, 10_000),
        ElectricDevice::consumer(120, 5, 1200),
    );
    let mut events: Vec<ElectricEvent> = Vec::new();

    for expected in [500, 1000, 1200, 1200] {
        assert_eq!(network.tick(&mut events), 0);
        assert_eq!(energy(&network, consumer), expected);
    }
    assert_eq!(energy(&network, pos(0, 0, 0)), 8800);
    assert!(events.is_empty());
}

#[test]
fn breaking_a_cable_cuts_supply_until_replaced() {
    let mut network = network();
    let consumer = line(
        &mut network,
        3,
        Cable::new(128, 8, 0),
        ElectricDevice::producer(100, 1, 10_000),
        ElectricDevice::consumer(120, 1, 100_000),
    );
    let mut events: Vec<ElectricEvent> = Vec::new();

    network.tick(&mut events);
    assert_eq!(energy(&network, consumer), 100);

    let broken = network.remove_at(pos(2, 0, 0));
    assert!(broken.is_some_and(|block| block.is_connector()));
    assert_eq!(network.graph().count_groups(), 2);
    assert_eq!(network.controllers().len(), 2);
    network.tick(&mut events);
    assert_eq!(energy(&network, consumer), 100);

    network.add_connector(pos(2, 0, 0), Cable::new(128, 8, 0));
    assert_eq!(network.controllers().len(), 1);
    network.tick(&mut events);
    assert_eq!(energy(&network, consumer), 200);
    assert!(events.is_empty());
}

#[test]
fn joining_two_networks_pools_their_producers() {
    let mut network = network();
    // Two producer/consumer pairs, side by side but not touching.
    network.add_node(pos(0, 0, 0), ElectricDevice::producer(100, 2, 10_000));
    network.add_connector(pos(1, 0, 0), Cable::new(128, 8, 0));
    network.add_node(pos(2, 0, 0), ElectricDevice::consumer(120, 4, 100_000));
    network.add_node(pos(0, 0, 2), ElectricDevice::producer(100, 2, 10_000));
    network.add_connector(pos(1, 0, 2), Cable::new(128, 8, 0));
    assert_eq!(network.graph().count_groups(), 2);

    // Joining cable at (1,0,1).
    network.add_connector(pos(1, 0, 1), Cable::new(128, 8, 0));
    assert_eq!(network.graph().count_groups(), 1);

    let mut events: Vec<ElectricEvent> = Vec::new();
    assert_eq!(network.tick(&mut events), 0);
    assert_eq!(energy(&network, pos(2, 0, 0)), 400);
    assert_eq!(energy(&network, pos(0, 0, 0)), 9800);
    assert_eq!(energy(&network, pos(0, 0, 2)), 9800);
}

#[test]
fn corrupted_groups_are_counted() {
    let mut network = network();
    // Two separate weak lines.
    for z in [0, 5] {
        network.add_node(pos(0, 0, z), ElectricDevice::producer(100, 5, 10_000));
        network.add_connector(pos(1, 0, z), Cable::new(128, 1, 0));
        network.add_node(pos(2, 0, z), ElectricDevice::consumer(120, 5, 1000));
    }
    let mut events: Vec<ElectricEvent> = Vec::new();

    assert_eq!(network.tick(&mut events), 2);
    let faulted: Vec<Pos> = events.iter().map(ElectricEvent::pos).collect();
    assert_eq!(faulted, vec![pos(1, 0, 0), pos(1, 0, 5)]);
}

#[test]
fn shared_cable_overload_is_reported_once_per_tick() {
    let mut network = network();
    network.add_node(pos(0, 0, 0), ElectricDevice::producer(100, 6, 10_000));
    for x in 1..4 {
        network.add_connector(pos(x, 0, 0), Cable::new(200, 10, 0));
    }
    network.add_node(pos(4, 0, 0), ElectricDevice::consumer(120, 12, 100_000));
    network.add_node(pos(2, 1, 0), ElectricDevice::producer(100, 6, 10_000));
    let mut events: Vec<ElectricEvent> = Vec::new();

    assert_eq!(network.tick(&mut events), 0);
    assert_eq!(
        events,
        vec![ElectricEvent::CableOverAmperage {
            dim: Dim(0),
            pos: pos(2, 0, 0),
            amperage: 12
        }]
    );

    events.clear();
    network.tick(&mut events);
    assert_eq!(events.len(), 1);
}

#[test]
fn node_overvoltage_clears_after_upgrade_and_invalidate() {
    let mut network = network();
    network.add_node(pos(0, 0, 0), ElectricDevice::producer(200, 1, 10_000));
    network.add_node(pos(1, 0, 0), ElectricDevice::consumer(120, 1, 1000));
    let mut events: Vec<ElectricEvent> = Vec::new();

    network.tick(&mut events);
    assert_eq!(
        events,
        vec![ElectricEvent::NodeOverVoltage {
            dim: Dim(0),
            pos: pos(1, 0, 0),
            voltage: 200
        }]
    );
    assert_eq!(energy(&network, pos(1, 0, 0)), 0);

    // Reported at admission only; nothing new without a rebuild.
    events.clear();
    network.tick(&mut events);
    assert!(events.is_empty());

    if let Some(node) = network.node_mut(pos(1, 0, 0)) {
        node.input_voltage = 240;
    }
    network.invalidate();
    network.tick(&mut events);
    assert!(events.is_empty());
    assert_eq!(energy(&network, pos(1, 0, 0)), 200);
}

#[test]
fn pass_through_junction_is_not_a_crossroad() {
    let mut network = network();
    network.add_node(pos(0, 0, 0), ElectricDevice::producer(100, 6, 10_000));
    network.add_connector(pos(1, 0, 0), Cable::new(200, 10, 0));
    network.add_connector(pos(2, 0, 0), Cable::new(200, 10, 0).pass_through());
    network.add_connector(pos(3, 0, 0), Cable::new(200, 10, 0));
    network.add_node(pos(4, 0, 0), ElectricDevice::consumer(120, 12, 100_000));
    network.add_node(pos(2, 1, 0), ElectricDevice::producer(100, 6, 10_000));
    let mut events: Vec<ElectricEvent> = Vec::new();

    // Same shape as the shared overload, but nothing is totalled.
    assert_eq!(network.tick(&mut events), 0);
    assert!(events.is_empty());
    assert_eq!(energy(&network, pos(4, 0, 0)), 1200);
}

#[test]
fn producers_pay_in_placement_order() {
    let mut network = network();
    // The first producer sits at the higher position; the consumer placed
    // last merges both into one group.
    network.add_node(pos(2, 0, 0), ElectricDevice::producer(100, 3, 1000));
    network.add_node(pos(0, 0, 0), ElectricDevice::producer(100, 4, 1000));
    network.add_node(pos(1, 0, 0), ElectricDevice::consumer(120, 5, 500));
    let mut events: Vec<ElectricEvent> = Vec::new();

    assert_eq!(network.tick(&mut events), 0);
    assert_eq!(energy(&network, pos(2, 0, 0)), 700);
    assert_eq!(energy(&network, pos(0, 0, 0)), 800);
    assert_eq!(energy(&network, pos(1, 0, 0)), 500);
    assert!(events.is_empty());
}
