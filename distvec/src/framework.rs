use std::fmt::Debug;
use std::hash::Hash;

use cfg_if::cfg_if;

pub trait RoutingSystem {
    /// Address of the node on the routing network, MUST be globally unique
    type NodeAddress: Ord + PartialOrd + RootData + RootKey + Debug;
    /// Port number local to a router. Lower ports win equal-cost ties.
    type Port: Ord + PartialOrd + Copy + RootData + RootKey + Debug;
    fn config() -> ProtocolParams {
        Default::default()
    }
}

cfg_if! {
    if #[cfg(feature = "serde")] {
        use serde::de::DeserializeOwned;
        use serde::Serialize;

        pub trait RootData: Clone + Serialize + DeserializeOwned + Sized {}
        impl<T: Clone + Serialize + DeserializeOwned + Sized> RootData for T {}
    } else {
        pub trait RootData: Clone + Sized {}
        impl<T: Clone + Sized> RootData for T {}
    }
}

pub trait RootKey: Eq + PartialEq + Hash {}
impl<T: Eq + PartialEq + Hash> RootKey for T {}

/// How a route is advertised back towards the neighbour it egresses through
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Horizon {
    /// advertise the route as INF
    PoisonReverse,
    /// leave the route out, the receiver treats it as an implicit withdrawal
    SplitHorizon,
    /// advertise the real distance, loops are only bounded by INF
    Unfiltered,
}

pub struct ProtocolParams {
    pub horizon: Horizon,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            horizon: Horizon::PoisonReverse,
        }
    }
}
