use crate::concepts::distance_vector::DistanceVectors;
use crate::concepts::neighbour::{Neighbour, PeerKind};
use crate::concepts::packet::{DataPacket, OutboundPacket, Packet, RoutingUpdate};
use crate::concepts::route::Route;
use crate::feedback::{RoutingError, RoutingWarning};
use crate::framework::{Horizon, RoutingSystem};
use crate::util::{hop, reachable};
use educe::Educe;
use log::{debug, trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_with::serde_as;
use std::collections::{HashMap, HashSet};

/// Distances at or above this are unreachable. Bounds count-to-infinity.
pub const INF: u16 = 100;

#[cfg_attr(feature = "serde", serde_as)]
#[derive(Educe)]
#[educe(Debug(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Router<T: RoutingSystem + ?Sized> {
    pub address: T::NodeAddress,
    /// Directly attached peers, by address
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, _)>"))]
    pub neighbours: HashMap<T::NodeAddress, Neighbour<T>>,
    pub vectors: DistanceVectors<T>,
    /// Destination, Route
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, _)>"))]
    pub routes: HashMap<T::NodeAddress, Route<T>>,
    pub outbound_packets: Vec<OutboundPacket<T>>,
}

impl<T: RoutingSystem> Router<T> {
    pub fn new(address: T::NodeAddress) -> Self {
        Self {
            address,
            neighbours: HashMap::new(),
            vectors: DistanceVectors::new(),
            routes: HashMap::new(),
            outbound_packets: Vec::new(),
        }
    }

    // region Interface
    /// handle a single packet that arrived on `port`
    pub fn handle_packet(&mut self, packet: &Packet<T>, port: T::Port) {
        match packet {
            Packet::Discovery { peer, kind, link_up } => {
                trace!("{:?} link {} for {:?} on port {:?}", self.address, if *link_up { "up" } else { "down" }, peer, port);
                if *link_up {
                    self.add_neighbour(peer, *kind, port);
                } else {
                    self.remove_neighbour(peer, port);
                }
            }
            Packet::RoutingUpdate(update) => {
                if self.neighbours.contains_key(&update.src) {
                    trace!("{:?} got routing update from {:?}: {:?}", self.address, update.src, update.paths);
                    self.handle_routing_update(update, port);
                } else {
                    warn!("{}", RoutingWarning::<T>::UnknownSource { src: update.src.clone() });
                }
            }
            Packet::Data(data) => self.forward(data),
        }
    }

    /// The port to send packets for `dest` out of, if the destination is reachable
    pub fn get_port(&self, dest: &T::NodeAddress) -> Option<T::Port> {
        self.routes
            .get(dest)
            .filter(|route| reachable(route.distance))
            .map(|route| route.port)
    }

    pub fn distance_to(&self, dest: &T::NodeAddress) -> u16 {
        self.routes.get(dest).map_or(INF, |route| route.distance)
    }

    pub fn next_hop(&self, dest: &T::NodeAddress) -> Option<&T::NodeAddress> {
        let port = self.get_port(dest)?;
        self.neighbour_on(port).map(|neigh| &neigh.addr)
    }

    pub fn neighbour_on(&self, port: T::Port) -> Option<&Neighbour<T>> {
        self.neighbours.values().find(|neigh| neigh.port == port)
    }

    fn forward(&mut self, data: &DataPacket<T>) {
        if data.ttl < 0 {
            trace!("{:?} dropping expired packet for {:?}", self.address, data.dst);
            return;
        }
        if data.dst == self.address {
            trace!("{:?} dropping packet addressed to itself", self.address);
            return;
        }
        match self.get_port(&data.dst) {
            Some(port) => self.outbound_packets.push(OutboundPacket {
                port,
                packet: Packet::Data(data.clone()),
            }),
            None => debug!("{:?} has no route to {:?}, dropping packet from {:?}", self.address, data.dst, data.src),
        }
    }
    // endregion

    // region Neighbours
    fn add_neighbour(&mut self, peer: &T::NodeAddress, kind: PeerKind, port: T::Port) {
        if *peer == self.address {
            trace!("{:?} ignoring link to itself", self.address);
            return;
        }
        if let Some(existing) = self.neighbours.get_mut(peer) {
            // re-registration, keep what we learned through this neighbour
            let old_port = existing.port;
            existing.port = port;
            existing.kind = kind;
            if old_port != port {
                for route in self.routes.values_mut() {
                    if route.port == old_port {
                        route.port = port;
                    }
                }
            }
        } else {
            self.neighbours.insert(peer.clone(), Neighbour::new(peer.clone(), port, kind));
        }
        self.vectors.add_column(peer);
        self.routes.insert(peer.clone(), Route::new(port, 1));
        debug!("{:?} added {:?} neighbour {:?} on port {:?}", self.address, kind, peer, port);

        self.broadcast_routes();
    }

    fn remove_neighbour(&mut self, peer: &T::NodeAddress, port: T::Port) {
        let Some(neigh) = self.neighbours.remove(peer) else {
            warn!("{}", RoutingWarning::<T>::UnknownPeer { peer: peer.clone() });
            return;
        };
        if neigh.port != port {
            warn!("{}", RoutingWarning::<T>::PortMismatch { src: peer.clone(), registered: neigh.port, arrival: port });
        }
        self.vectors.remove_column(peer);
        debug!("{:?} removed neighbour {:?} on port {:?}", self.address, peer, neigh.port);

        let affected: Vec<T::NodeAddress> = self
            .routes
            .iter()
            .filter(|(_, route)| route.port == neigh.port)
            .map(|(dest, _)| dest.clone())
            .collect();
        let mut changed = false;
        for dest in affected {
            if self.reselect(&dest) {
                changed = true;
            }
        }

        if changed {
            self.broadcast_routes();
        }
    }
    // endregion

    // region Route Selection
    /// Recomputes the route to `dest` from all columns, returns true if the route changed
    fn reselect(&mut self, dest: &T::NodeAddress) -> bool {
        let old = self.routes.get(dest).cloned();
        match self.vectors.select_path(dest, &self.neighbours) {
            (Some(port), distance) => {
                let route = Route::new(port, distance);
                let changed = old.as_ref() != Some(&route);
                if changed {
                    debug!("{:?} now reaches {:?} via port {:?} at {}", self.address, dest, port, distance);
                }
                self.routes.insert(dest.clone(), route);
                changed
            }
            (None, _) => {
                if old.is_some() {
                    debug!("{:?} lost its route to {:?}", self.address, dest);
                }
                self.routes.remove(dest).is_some()
            }
        }
    }

    /// Applies a changed column entry for `dest`, learned through `port`, to the route table.
    /// Returns true if the forwarding decision changed in a way neighbours must hear about.
    fn reconcile(&mut self, dest: &T::NodeAddress, distance: u16, port: T::Port) -> bool {
        let Some(route) = self.routes.get_mut(dest) else {
            return false;
        };
        if distance < route.distance {
            debug!("{:?} found a better route to {:?} via port {:?} at {}", self.address, dest, port, distance);
            route.port = port;
            route.distance = distance;
            true
        } else if distance == route.distance && port < route.port {
            // equal cost, prefer the lower port. Not announced, see tests/tie_break.rs
            route.port = port;
            false
        } else if route.port == port && distance > route.distance {
            // the selected route got worse
            self.reselect(dest);
            true
        } else {
            false
        }
    }

    /// Like reconcile, but also installs a route for a destination that has none
    fn learn(&mut self, dest: &T::NodeAddress, distance: u16, port: T::Port) -> bool {
        if self.routes.contains_key(dest) {
            return self.reconcile(dest, distance, port);
        }
        if !reachable(distance) {
            return false;
        }
        debug!("{:?} learned {:?} via port {:?} at {}", self.address, dest, port, distance);
        self.routes.insert(dest.clone(), Route::new(port, distance));
        true
    }
    // endregion

    // region Routing Updates
    fn handle_routing_update(&mut self, update: &RoutingUpdate<T>, arrival: T::Port) {
        let Some(neigh) = self.neighbours.get(&update.src) else {
            return;
        };
        let port = neigh.port;
        if port != arrival {
            warn!("{}", RoutingWarning::<T>::PortMismatch { src: update.src.clone(), registered: port, arrival });
        }
        let src = update.src.clone();
        let Some(column) = self.vectors.column(&src) else {
            return;
        };
        let known: Vec<T::NodeAddress> = column.keys().cloned().collect();
        let new_dests: Vec<T::NodeAddress> = update
            .paths
            .keys()
            .filter(|dest| **dest != self.address && !column.contains_key(*dest))
            .cloned()
            .collect();

        let mut changed = false;

        for dest in known {
            if dest == src || dest == self.address {
                continue;
            }
            // absent from the update means withdrawn
            let distance = update.get_distance(&dest).map_or(INF, hop);
            self.vectors.set(&src, &dest, distance);
            if self.learn(&dest, distance, port) {
                changed = true;
            }
        }

        for dest in new_dests {
            let distance = update.get_distance(&dest).map_or(INF, hop);
            self.vectors.set(&src, &dest, distance);
            self.vectors.backfill(&dest);
            if self.learn(&dest, distance, port) {
                changed = true;
            }
        }

        if changed {
            self.broadcast_routes();
        }
    }

    /// Sends every router neighbour its own view of our route table
    pub fn broadcast_routes(&mut self) {
        let horizon = T::config().horizon;
        let mut targets: Vec<&Neighbour<T>> = self
            .neighbours
            .values()
            .filter(|neigh| neigh.is_router())
            .collect();
        targets.sort_by_key(|neigh| neigh.port);

        let mut packets = Vec::with_capacity(targets.len());
        for neigh in targets {
            let mut update = RoutingUpdate::new(self.address.clone(), neigh.addr.clone());
            for (dest, route) in &self.routes {
                if *dest == neigh.addr {
                    continue; // never tell a neighbour how to reach itself
                }
                if route.port != neigh.port {
                    update.add_destination(dest.clone(), route.distance);
                    continue;
                }
                match horizon {
                    Horizon::PoisonReverse => update.add_destination(dest.clone(), INF),
                    Horizon::SplitHorizon => {}
                    Horizon::Unfiltered => update.add_destination(dest.clone(), route.distance),
                }
            }
            packets.push(OutboundPacket {
                port: neigh.port,
                packet: Packet::RoutingUpdate(update),
            });
        }
        self.outbound_packets.extend(packets);
    }
    // endregion

    /// Verifies the tables are consistent with each other
    pub fn check_invariants(&self) -> Result<(), RoutingError<T>> {
        let destinations = self.vectors.destinations();
        for (neigh, column) in self.vectors.columns() {
            if let Some(dest) = destinations.iter().find(|dest| !column.contains_key(*dest)) {
                return Err(RoutingError::IncompleteColumn {
                    neighbour: neigh.clone(),
                    destination: dest.clone(),
                });
            }
        }

        let mut all: HashSet<&T::NodeAddress> = destinations.iter().collect();
        all.extend(self.routes.keys());
        for dest in all {
            let best = self
                .vectors
                .columns()
                .filter_map(|(_, column)| column.get(dest).copied())
                .min()
                .unwrap_or(INF);
            match self.routes.get(dest) {
                Some(route) => {
                    if route.distance != best {
                        return Err(RoutingError::StaleDistance {
                            destination: dest.clone(),
                            expected: best,
                            actual: route.distance,
                        });
                    }
                    let offered = self
                        .neighbour_on(route.port)
                        .and_then(|neigh| self.vectors.get(&neigh.addr, dest));
                    if offered != Some(route.distance) {
                        return Err(RoutingError::DanglingPort {
                            destination: dest.clone(),
                            port: route.port,
                            distance: route.distance,
                        });
                    }
                }
                None if reachable(best) => {
                    return Err(RoutingError::MissingRoute {
                        destination: dest.clone(),
                        distance: best,
                    });
                }
                None => {}
            }
        }
        Ok(())
    }
}
