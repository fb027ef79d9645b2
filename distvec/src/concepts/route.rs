#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use educe::Educe;

use crate::framework::RoutingSystem;

/// A forwarding table entry: where to send packets for a destination, and how far it is.
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()), PartialEq(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Route<T: RoutingSystem + ?Sized> {
    /// the egress port towards the next hop
    pub port: T::Port,
    /// hop count to the destination, always below INF while the route exists
    pub distance: u16,
}

impl<T: RoutingSystem + ?Sized> Route<T> {
    pub fn new(port: T::Port, distance: u16) -> Self {
        Self { port, distance }
    }
}
