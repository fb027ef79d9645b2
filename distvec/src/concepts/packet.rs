use std::collections::BTreeMap;

use educe::Educe;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use serde_with::serde_as;

use crate::concepts::neighbour::PeerKind;
use crate::framework::RoutingSystem;

#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub enum Packet<T: RoutingSystem + ?Sized> {
    /// the host reports that the link to `peer` came up or went down
    Discovery {
        peer: T::NodeAddress,
        kind: PeerKind,
        link_up: bool,
    },
    /// a distance vector advertisement from a neighbouring router
    RoutingUpdate(RoutingUpdate<T>),
    Data(DataPacket<T>),
}

/// The distances `src` advertises to `dst`. Built per neighbour, never broadcast verbatim.
#[cfg_attr(feature = "serde", serde_as)]
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct RoutingUpdate<T: RoutingSystem + ?Sized> {
    pub src: T::NodeAddress,
    pub dst: T::NodeAddress,
    #[cfg_attr(feature = "serde", serde_as(as = "Vec<(_, _)>"))]
    pub paths: BTreeMap<T::NodeAddress, u16>,
}

impl<T: RoutingSystem + ?Sized> RoutingUpdate<T> {
    pub fn new(src: T::NodeAddress, dst: T::NodeAddress) -> Self {
        Self {
            src,
            dst,
            paths: BTreeMap::new(),
        }
    }

    pub fn add_destination(&mut self, dest: T::NodeAddress, distance: u16) {
        self.paths.insert(dest, distance);
    }

    pub fn get_distance(&self, dest: &T::NodeAddress) -> Option<u16> {
        self.paths.get(dest).copied()
    }
}

/// Ordinary traffic. The payload is opaque to the router, ttl is decremented by the host.
#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct DataPacket<T: RoutingSystem + ?Sized> {
    pub src: T::NodeAddress,
    pub dst: T::NodeAddress,
    pub ttl: i32,
    pub payload: Vec<u8>,
}

#[derive(Educe)]
#[educe(Clone(bound()), Debug(bound()))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(bound = ""))]
pub struct OutboundPacket<T: RoutingSystem + ?Sized> {
    /// send out of this port
    pub port: T::Port,
    pub packet: Packet<T>,
}
