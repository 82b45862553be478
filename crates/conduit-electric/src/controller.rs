//! The electric tick.

use crate::consumer::ElectricConsumer;
use crate::event::ElectricEvents;
use crate::{ElectricCable, ElectricNode, Status};
use conduit_core::controller::{
    Absorber, ConnectionType, Consumer, Controller, ControllerCore, TickOutcome,
};
use conduit_core::group::Group;
use conduit_core::id::{Dim, GroupId};
use conduit_core::path::Path;
use conduit_core::pos::{Dir, Pos};
use std::collections::BTreeMap;

/// Distributes energy through one group.
#[derive(Debug, Clone)]
pub struct ElectricController {
    core: ControllerCore<ElectricConsumer>,
    /// Amperage each consumer has received so far this tick.
    obtains: BTreeMap<Pos, i32>,
}

impl ElectricController {
    pub fn core(&self) -> &ControllerCore<ElectricConsumer> {
        &self.core
    }

    /// Amperage delivered to the consumer at `pos` during the last tick.
    pub fn obtained(&self, pos: Pos) -> i32 {
        self.obtains.get(&pos).copied().unwrap_or(0)
    }
}

/// Report every cable on a corrupted route that fails the attempted flow.
fn report_corruption<C: ElectricCable, N>(
    group: &Group<C, N>,
    dim: Dim,
    consumer: &ElectricConsumer,
    voltage: i32,
    amperage: i32,
    events: &mut dyn ElectricEvents,
) {
    for &pos in consumer.full() {
        let Some(cable) = group.connector(pos) else {
            continue;
        };
        match cable.handler(voltage, amperage) {
            Status::FailVoltage => events.cable_over_voltage(dim, pos, voltage),
            Status::FailAmperage => events.cable_over_amperage(dim, pos, amperage),
            Status::Ok => {}
        }
    }
}

impl<C: ElectricCable, N: ElectricNode> Controller<C, N> for ElectricController {
    type Consumer = ElectricConsumer;
    type Events = dyn ElectricEvents;

    fn create(dim: Dim, group: GroupId) -> Self {
        Self {
            core: ControllerCore::new(dim, group),
            obtains: BTreeMap::new(),
        }
    }

    fn core(&self) -> &ControllerCore<ElectricConsumer> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ControllerCore<ElectricConsumer> {
        &mut self.core
    }

    fn is_valid(&self, group: &Group<C, N>, node: Pos, dir: Option<Dir>) -> bool {
        let Some(producer) = group.node(node) else {
            return false;
        };
        match dir {
            Some(dir) => producer.can_output_towards(dir),
            None => producer.can_output() && producer.output_voltage() > 0,
        }
    }

    fn on_check(
        &self,
        group: &Group<C, N>,
        producer: Pos,
        consumers: &mut Vec<ElectricConsumer>,
        path: &Path,
        consumer: Pos,
        events: &mut Self::Events,
    ) {
        let (Some(source), Some(target)) = (group.node(producer), group.node(consumer)) else {
            return;
        };
        if !target.can_input() {
            return;
        }

        let voltage = source.output_voltage();
        if voltage > target.input_voltage() {
            events.node_over_voltage(self.core.dim(), consumer, voltage);
            return;
        }

        let candidate = ElectricConsumer::new(group, consumer, path);
        if voltage > candidate.loss() {
            consumers.push(candidate);
        }
    }

    fn tick(&mut self, group: &mut Group<C, N>, events: &mut Self::Events) -> TickOutcome {
        self.obtains.clear();
        self.core.begin_tick();
        let dim = self.core.dim();
        let (data, absorbs) = self.core.parts_mut();

        for (producer, consumers) in data {
            let Some(source) = group.node(*producer) else {
                continue;
            };
            let voltage = source.output_voltage();
            let mut available = source.output_amperage();
            if available <= 0 {
                continue;
            }

            for consumer in consumers {
                let target = consumer.node();
                let Some(node) = group.node(target) else {
                    continue;
                };
                // Free capacity already reflects earlier deliveries; what
                // is left of the input amperage caps the rest of the tick.
                let obtained = self.obtains.get(&target).copied().unwrap_or(0);
                let needed = ElectricConsumer::required_amperage(node, voltage)
                    .min(node.input_amperage() - obtained);
                if needed <= 0 {
                    continue;
                }

                let amperage = needed.min(available);
                self.obtains.insert(target, obtained + amperage);

                let delivered = i64::from(voltage - consumer.loss()) * i64::from(amperage);
                if let Some(node) = group.node_mut(target) {
                    node.insert(delivered, false);
                }
                if let Some(source) = group.node_mut(*producer) {
                    source.extract(i64::from(voltage) * i64::from(amperage), false);
                }

                if consumer.connection() != ConnectionType::Adjacent
                    && !consumer.can_handle(voltage, amperage)
                {
                    report_corruption(group, dim, consumer, voltage, amperage, events);
                    log::warn!(
                        "route {producer} -> {target} cannot carry {voltage} V at {amperage} A; tick aborted"
                    );
                    return TickOutcome::Aborted;
                }

                if consumer.connection() == ConnectionType::Variate {
                    for &pos in consumer.cross() {
                        match absorbs.get_mut(&pos) {
                            Some(absorber) => absorber.add(amperage),
                            None => {
                                let rated = group.connector(pos).map_or(0, |cable| cable.amps());
                                absorbs.insert(pos, Absorber::new(rated, amperage));
                            }
                        }
                    }
                }

                available -= amperage;
                if available <= 0 {
                    break;
                }
            }
        }

        for (&pos, absorber) in absorbs.iter() {
            if absorber.is_over() {
                log::warn!(
                    "cable at {pos} carried {} A across routes, rated {} A",
                    absorber.total(),
                    absorber.max
                );
                events.cable_over_amperage(dim, pos, absorber.total());
            }
        }

        TickOutcome::Completed
    }
}
