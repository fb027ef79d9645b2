#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use educe::Educe;

use crate::framework::RoutingSystem;

/// Whether a directly attached peer takes part in the protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PeerKind {
    Router,
    /// a terminal host, never sent routing updates
    Host,
}

#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct Neighbour<T: RoutingSystem + ?Sized> {
    /// the routing network address
    pub addr: T::NodeAddress,
    /// the local port this neighbour is attached to
    pub port: T::Port,
    pub kind: PeerKind,
}

impl<T: RoutingSystem + ?Sized> Neighbour<T> {
    pub fn new(addr: T::NodeAddress, port: T::Port, kind: PeerKind) -> Self {
        Self { addr, port, kind }
    }

    pub fn is_router(&self) -> bool {
        self.kind == PeerKind::Router
    }
}
