use std::collections::{HashMap, HashSet};

use educe::Educe;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_with::serde_as;

use crate::concepts::neighbour::Neighbour;
use crate::framework::RoutingSystem;
use crate::router::INF;

/// The distance vector store: one column per neighbour, holding the distance to every known
/// destination when travelling through that neighbour (the extra hop is already included).
///
/// Every column holds the same set of destinations. Destinations a neighbour has not told us
/// about yet are kept as INF placeholders.
#[cfg_attr(feature = "serde", serde_as)]
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), Default(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct DistanceVectors<T: RoutingSystem + ?Sized> {
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, Vec<(_, _)>)>"))]
    columns: HashMap<T::NodeAddress, HashMap<T::NodeAddress, u16>>,
}

impl<T: RoutingSystem + ?Sized> DistanceVectors<T> {
    pub fn new() -> Self {
        Self {
            columns: HashMap::new(),
        }
    }

    /// Creates the column for a directly attached neighbour, at distance 1.
    /// If the column already exists, only the direct distance is reset.
    pub fn add_column(&mut self, neigh: &T::NodeAddress) {
        if let Some(column) = self.columns.get_mut(neigh) {
            column.insert(neigh.clone(), 1);
            return;
        }
        self.backfill(neigh);
        let mut column: HashMap<T::NodeAddress, u16> = self
            .destinations()
            .into_iter()
            .map(|dest| (dest, INF))
            .collect();
        column.insert(neigh.clone(), 1);
        self.columns.insert(neigh.clone(), column);
    }

    pub fn remove_column(&mut self, neigh: &T::NodeAddress) -> Option<HashMap<T::NodeAddress, u16>> {
        self.columns.remove(neigh)
    }

    /// Inserts an INF placeholder for `dest` into every column that does not know it yet
    pub fn backfill(&mut self, dest: &T::NodeAddress) {
        for column in self.columns.values_mut() {
            column.entry(dest.clone()).or_insert(INF);
        }
    }

    /// Sets the distance to `dest` through `neigh`, returns false if there is no such column
    pub fn set(&mut self, neigh: &T::NodeAddress, dest: &T::NodeAddress, distance: u16) -> bool {
        if let Some(column) = self.columns.get_mut(neigh) {
            column.insert(dest.clone(), distance);
            true
        } else {
            false
        }
    }

    pub fn get(&self, neigh: &T::NodeAddress, dest: &T::NodeAddress) -> Option<u16> {
        self.columns.get(neigh).and_then(|column| column.get(dest).copied())
    }

    pub fn column(&self, neigh: &T::NodeAddress) -> Option<&HashMap<T::NodeAddress, u16>> {
        self.columns.get(neigh)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&T::NodeAddress, &HashMap<T::NodeAddress, u16>)> {
        self.columns.iter()
    }

    /// Every destination known to any column
    pub fn destinations(&self) -> HashSet<T::NodeAddress> {
        self.columns
            .values()
            .flat_map(|column| column.keys().cloned())
            .collect()
    }

    /// Finds the best port and distance to `dest` across all columns.
    /// Equal distances are broken by the lowest port. Returns (None, INF) if no column
    /// has a finite distance.
    pub fn select_path(
        &self,
        dest: &T::NodeAddress,
        neighbours: &HashMap<T::NodeAddress, Neighbour<T>>,
    ) -> (Option<T::Port>, u16) {
        let mut best_port: Option<T::Port> = None;
        let mut best_dist = INF;
        for (addr, column) in &self.columns {
            let Some(neigh) = neighbours.get(addr) else {
                continue;
            };
            let dist = column.get(dest).copied().unwrap_or(INF);
            if dist >= INF {
                continue;
            }
            let better = match best_port {
                None => true,
                Some(port) => dist < best_dist || (dist == best_dist && neigh.port < port),
            };
            if better {
                best_port = Some(neigh.port);
                best_dist = dist;
            }
        }
        (best_port, best_dist)
    }
}
