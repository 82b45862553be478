//! A consumer reachable from a producer, with the route it is reached by.

use crate::{ElectricCable, ElectricNode};
use conduit_core::controller::{ConnectionType, Consumer};
use conduit_core::group::Group;
use conduit_core::path::Path;
use conduit_core::pos::Pos;

/// One consumer of one producer. Caches what the tick needs about the route:
/// the cables on it, their total loss and the ratings of the weakest ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectricConsumer {
    node: Pos,
    full: Vec<Pos>,
    cross: Vec<Pos>,
    loss: i32,
    min_voltage: i32,
    min_amperage: i32,
    connection: ConnectionType,
}

impl ElectricConsumer {
    pub fn new<C: ElectricCable, N>(group: &Group<C, N>, node: Pos, path: &Path) -> Self {
        let mut loss = 0i32;
        let mut min_voltage = i32::MAX;
        let mut min_amperage = i32::MAX;
        for cable in path.full().iter().filter_map(|&pos| group.connector(pos)) {
            loss = loss.saturating_add(cable.loss());
            min_voltage = min_voltage.min(cable.voltage());
            min_amperage = min_amperage.min(cable.amps());
        }

        Self {
            node,
            full: path.full().to_vec(),
            cross: path.cross().to_vec(),
            loss,
            min_voltage,
            min_amperage,
            connection: ConnectionType::of(path),
        }
    }

    /// Amperage needed to fill `node` at `voltage`: its free capacity over the
    /// voltage, rounded up, capped at its input amperage. Never negative.
    pub fn required_amperage<N: ElectricNode + ?Sized>(node: &N, voltage: i32) -> i32 {
        if voltage <= 0 {
            return 0;
        }
        let free = node.capacity() - node.energy();
        if free <= 0 {
            return 0;
        }
        let voltage = i64::from(voltage);
        let needed = (free + voltage - 1) / voltage;
        let capped = needed.min(i64::from(node.input_amperage())).max(0);
        i32::try_from(capped).unwrap_or(i32::MAX)
    }

    /// Whether the weakest cables on the route carry this voltage and amperage.
    pub fn can_handle(&self, voltage: i32, amperage: i32) -> bool {
        voltage <= self.min_voltage && amperage <= self.min_amperage
    }

    /// Every cable on the route, producer side first.
    pub fn full(&self) -> &[Pos] {
        &self.full
    }

    /// The crossroad cables on the route.
    pub fn cross(&self) -> &[Pos] {
        &self.cross
    }

    pub fn connection(&self) -> ConnectionType {
        self.connection
    }
}

impl Consumer for ElectricConsumer {
    fn node(&self) -> Pos {
        self.node
    }

    fn loss(&self) -> i32 {
        self.loss
    }

    fn replace_route(&mut self, other: Self) {
        *self = Self {
            node: self.node,
            ..other
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Cable, ElectricDevice};
    use conduit_core::connectivity::Cache;

    fn at(x: i32) -> Pos {
        Pos::new(x, 0, 0)
    }

    fn route(cables: &[Cable]) -> (Group<Cable, ElectricDevice>, Path) {
        let mut group =
            Group::single_node(at(0), Cache::new(ElectricDevice::producer(100, 5, 1000)));
        for (i, cable) in cables.iter().enumerate() {
            group.add_connector(at(i as i32 + 1), Cache::new(cable.clone()));
        }
        let end = at(cables.len() as i32 + 1);
        group.add_node(end, Cache::new(ElectricDevice::consumer(120, 10, 1000)));
        group.update_paths();
        let path = group.paths_from(at(0))[0].clone();
        (group, path)
    }

    #[test]
    fn route_totals_loss_and_weakest_ratings() {
        let (group, path) = route(&[
            Cable::new(200, 10, 1),
            Cable::new(100, 4, 2),
            Cable::new(300, 8, 0),
        ]);
        let consumer = ElectricConsumer::new(&group, at(4), &path);
        assert_eq!(consumer.loss(), 3);
        assert_eq!(consumer.full(), &[at(1), at(2), at(3)]);
        assert_eq!(consumer.connection(), ConnectionType::Simple);
        assert!(consumer.can_handle(100, 4));
        assert!(!consumer.can_handle(101, 4));
        assert!(!consumer.can_handle(100, 5));
    }

    #[test]
    fn adjacent_route_has_no_limits() {
        let (group, path) = route(&[]);
        let consumer = ElectricConsumer::new(&group, at(1), &path);
        assert_eq!(consumer.connection(), ConnectionType::Adjacent);
        assert_eq!(consumer.loss(), 0);
        assert!(consumer.can_handle(i32::MAX, i32::MAX));
    }

    #[test]
    fn required_amperage_rounds_up_and_caps() {
        let mut node = ElectricDevice::consumer(120, 10, 1000);
        assert_eq!(ElectricConsumer::required_amperage(&node, 100), 10);
        node.energy = 950;
        assert_eq!(ElectricConsumer::required_amperage(&node, 100), 1);
        node.energy = 899;
        assert_eq!(ElectricConsumer::required_amperage(&node, 100), 2);
        node.energy = 1000;
        assert_eq!(ElectricConsumer::required_amperage(&node, 100), 0);
        assert_eq!(ElectricConsumer::required_amperage(&node, 0), 0);
    }

    #[test]
    fn replace_route_keeps_the_node() {
        let (group, path) = route(&[Cable::new(200, 10, 5)]);
        let mut long = ElectricConsumer::new(&group, at(2), &path);
        let short = ElectricConsumer::new(&group, at(2), &Path::adjacent(at(0), at(2)));
        long.replace_route(short.clone());
        assert_eq!(long, short);
        assert_eq!(long.node(), at(2));
    }
}
