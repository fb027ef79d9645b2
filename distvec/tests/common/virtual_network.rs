use std::collections::{BTreeMap, VecDeque};
use serde::{Deserialize, Serialize};
use distvec::concepts::neighbour::PeerKind;
use distvec::concepts::packet::{DataPacket, Packet};
use distvec::framework::RoutingSystem;
use distvec::router::{Router, INF};
use crate::common::Port;

#[derive(Serialize, Deserialize, Clone)]
pub struct Link {
    pub a: String,
    pub port_a: Port,
    pub b: String,
    pub port_b: Port,
    pub up: bool,
}

/// Deterministic in-memory network. Every tick delivers all packets in flight, then collects
/// what the routers sent. The network owns ttl, it is decremented on every hop.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VirtualSystem<T: RoutingSystem<NodeAddress = String, Port = Port>> {
    pub routers: Vec<Router<T>>,
    pub hosts: Vec<String>,
    pub links: Vec<Link>,
    /// (link, receiver, arrival port, packet)
    pub in_flight: Vec<(usize, String, Port, Packet<T>)>,
    /// data packets that reached a host
    pub delivered: Vec<(String, DataPacket<T>)>,
}

impl<T: RoutingSystem<NodeAddress = String, Port = Port>> VirtualSystem<T> {
    /// Ports are numbered per node from 0, in the order links are listed
    pub fn create(routers: &[&str], hosts: &[&str], links: &[(&str, &str)]) -> Self {
        let mut network = VirtualSystem {
            routers: routers.iter().map(|id| Router::new(id.to_string())).collect(),
            hosts: hosts.iter().map(|id| id.to_string()).collect(),
            links: Vec::new(),
            in_flight: Vec::new(),
            delivered: Vec::new(),
        };
        for (a, b) in links {
            let port_a = network.next_port(a);
            let port_b = network.next_port(b);
            network.links.push(Link {
                a: a.to_string(),
                port_a,
                b: b.to_string(),
                port_b,
                up: false,
            });
            network.set_link(network.links.len() - 1, true);
        }
        network
    }

    fn next_port(&self, node: &str) -> Port {
        self.links.iter().filter(|l| l.a == node || l.b == node).count() as Port
    }

    fn kind_of(&self, node: &str) -> PeerKind {
        if self.hosts.iter().any(|h| h == node) {
            PeerKind::Host
        } else {
            PeerKind::Router
        }
    }

    fn find_link(&self, a: &str, b: &str) -> usize {
        self.links
            .iter()
            .position(|l| (l.a == a && l.b == b) || (l.a == b && l.b == a))
            .unwrap_or_else(|| panic!("No link between {a} and {b}"))
    }

    /// Notifies both ends of a link state change, like the physical layer would
    fn set_link(&mut self, idx: usize, up: bool) {
        self.links[idx].up = up;
        let link = self.links[idx].clone();
        for (me, port, other) in [(&link.a, link.port_a, &link.b), (&link.b, link.port_b, &link.a)] {
            let kind = self.kind_of(other);
            if let Some(router) = self.routers.iter_mut().find(|r| r.address == *me) {
                router.handle_packet(
                    &Packet::Discovery {
                        peer: other.clone(),
                        kind,
                        link_up: up,
                    },
                    port,
                );
            }
        }
        self.flush_packets();
    }

    pub fn link_down(&mut self, a: &str, b: &str) {
        let idx = self.find_link(a, b);
        self.set_link(idx, false);
    }

    pub fn link_up(&mut self, a: &str, b: &str) {
        let idx = self.find_link(a, b);
        self.set_link(idx, true);
    }

    pub fn get_node(&self, node: &str) -> &Router<T> {
        self.routers.iter().find(|r| r.address == node).unwrap_or_else(|| panic!("No node {node} found"))
    }

    pub fn get_port(&self, cur: &str, dest: &str) -> Option<Port> {
        self.get_node(cur).get_port(&dest.to_string())
    }

    pub fn get_next_hop(&self, cur: &str, dest: &str) -> String {
        self.get_node(cur)
            .next_hop(&dest.to_string())
            .unwrap_or_else(|| panic!("No route found from {cur} to {dest}"))
            .clone()
    }

    pub fn get_metric_to(&self, cur: &str, dest: &str) -> u16 {
        self.get_node(cur).distance_to(&dest.to_string())
    }

    /// Injects a data packet from a host onto its first live link
    pub fn send_data(&mut self, from: &str, to: &str, ttl: i32) {
        let idx = self
            .links
            .iter()
            .position(|l| l.up && (l.a == from || l.b == from))
            .unwrap_or_else(|| panic!("{from} has no live link"));
        let link = &self.links[idx];
        let (receiver, port) = if link.a == from { (&link.b, link.port_b) } else { (&link.a, link.port_a) };
        let packet = Packet::Data(DataPacket {
            src: from.to_string(),
            dst: to.to_string(),
            ttl,
            payload: b"hello".to_vec(),
        });
        self.in_flight.push((idx, receiver.clone(), port, packet));
    }

    pub fn flush_packets(&mut self) {
        let mut outbound = Vec::new();
        for router in &mut self.routers {
            for packet in router.outbound_packets.drain(..) {
                outbound.push((router.address.clone(), packet));
            }
        }
        for (sender, out) in outbound {
            let Some(idx) = self.links.iter().position(|l| {
                (l.a == sender && l.port_a == out.port) || (l.b == sender && l.port_b == out.port)
            }) else {
                continue;
            };
            let link = &self.links[idx];
            if !link.up {
                continue;
            }
            let (receiver, port) = if link.a == sender { (&link.b, link.port_b) } else { (&link.a, link.port_a) };
            let packet = match out.packet {
                Packet::Data(mut data) => {
                    data.ttl -= 1;
                    Packet::Data(data)
                }
                other => other,
            };
            self.in_flight.push((idx, receiver.clone(), port, packet));
        }
    }

    pub fn tick(&mut self) {
        let packets = std::mem::take(&mut self.in_flight);
        for (idx, receiver, port, packet) in packets {
            if !self.links[idx].up {
                continue; // lost on a dead link
            }
            if let Some(router) = self.routers.iter_mut().find(|r| r.address == receiver) {
                router.handle_packet(&packet, port);
            } else if let Packet::Data(data) = packet {
                self.delivered.push((receiver, data));
            }
        }
        self.flush_packets();
    }

    pub fn tick_n(&mut self, times: i32) {
        for _ in 0..times {
            self.tick();
        }
    }

    /// Ticks until nothing is in flight, returns the number of ticks it took
    pub fn converge(&mut self, max_ticks: usize) -> usize {
        let mut ticks = 0;
        while !self.in_flight.is_empty() {
            assert!(ticks < max_ticks, "network did not settle within {max_ticks} ticks");
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// True hop counts over live links. Hosts are leaves, nothing is routed through them.
    pub fn shortest_paths(&self, from: &str) -> BTreeMap<String, u16> {
        let mut dist = BTreeMap::new();
        let mut queue = VecDeque::new();
        dist.insert(from.to_string(), 0u16);
        queue.push_back(from.to_string());
        while let Some(node) = queue.pop_front() {
            if node != from && self.kind_of(&node) == PeerKind::Host {
                continue;
            }
            let d = dist[&node];
            for link in self.links.iter().filter(|l| l.up) {
                let next = if link.a == node {
                    &link.b
                } else if link.b == node {
                    &link.a
                } else {
                    continue;
                };
                if !dist.contains_key(next) {
                    dist.insert(next.clone(), d + 1);
                    queue.push_back(next.clone());
                }
            }
        }
        dist.remove(from);
        dist
    }

    /// Every router has the true shortest distance to every node, and no route to unreachable ones
    pub fn assert_converged(&self) {
        let nodes: Vec<String> = self
            .routers
            .iter()
            .map(|r| r.address.clone())
            .chain(self.hosts.iter().cloned())
            .collect();
        for router in &self.routers {
            let expected = self.shortest_paths(&router.address);
            for node in nodes.iter().filter(|n| **n != router.address) {
                match expected.get(node) {
                    Some(d) => {
                        assert_eq!(router.distance_to(node), *d, "distance from {} to {node}", router.address);
                        assert!(router.get_port(node).is_some(), "{} has no port for {node}", router.address);
                    }
                    None => {
                        assert_eq!(router.get_port(node), None, "{} should not reach {node}", router.address);
                        assert_eq!(router.distance_to(node), INF);
                    }
                }
            }
        }
    }

    pub fn assert_consistent(&self) {
        for router in &self.routers {
            if let Err(err) = router.check_invariants() {
                panic!("{}: {err}", router.address);
            }
        }
    }

    pub fn freeze(&mut self) -> String {
        serde_json::to_string(&self).unwrap()
    }

    pub fn restore(state: String) -> VirtualSystem<T> {
        serde_json::from_str(&state).unwrap()
    }
}
