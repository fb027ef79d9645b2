use educe::Educe;
use thiserror::Error;
use crate::framework::RoutingSystem;

/// Table corruption found by [`crate::router::Router::check_invariants`].
/// None of these should ever occur, they indicate a bug in the table maintenance.
#[derive(Error)]
#[derive(Educe)]
#[educe(Debug(bound()))]
pub enum RoutingError<T: RoutingSystem + ?Sized> {
    /// Every neighbour column must hold an entry (possibly INF) for every known destination
    #[error("Column of {neighbour:?} has no entry for {destination:?}")]
    IncompleteColumn {
        neighbour: T::NodeAddress,
        destination: T::NodeAddress,
    },
    #[error("Route to {destination:?} has distance {actual}, but the best column offers {expected}")]
    StaleDistance {
        destination: T::NodeAddress,
        expected: u16,
        actual: u16,
    },
    /// The route egresses through a port whose neighbour does not offer the route's distance
    #[error("Route to {destination:?} uses port {port:?}, which does not offer distance {distance}")]
    DanglingPort {
        destination: T::NodeAddress,
        port: T::Port,
        distance: u16,
    },
    #[error("{destination:?} is reachable at distance {distance}, but has no route")]
    MissingRoute {
        destination: T::NodeAddress,
        distance: u16,
    },
}

/// Although this is an error enum, these should be treated as warnings.
/// The router logs them and carries on, the offending input is discarded.
#[derive(Error)]
#[derive(Educe)]
#[educe(Debug(bound()))]
pub enum RoutingWarning<T: RoutingSystem + ?Sized> {
    /// Routing updates are only accepted from registered neighbours
    #[error("Discarded routing update from unknown source {src:?}")]
    UnknownSource {
        src: T::NodeAddress
    },
    #[error("Link down for {peer:?}, which is not a neighbour")]
    UnknownPeer {
        peer: T::NodeAddress
    },
    /// The packet came in on a different port than the one the neighbour is registered on.
    /// The registered port is used.
    #[error("Packet from {src:?} arrived on port {arrival:?}, expected {registered:?}")]
    PortMismatch {
        src: T::NodeAddress,
        registered: T::Port,
        arrival: T::Port,
    },
}
