use crate::router::INF;
use std::cmp::min;

/// Distance to a destination when travelling through the neighbour that advertised it.
/// Anything at or past INF stays INF.
///
/// # Arguments
///
/// * `advertised`: the distance carried in the neighbour's advertisement
///
/// returns: u16
///
/// # Examples
///
/// ```
/// use distvec::router::INF;
/// assert_eq!(distvec::util::hop(2), 3);
/// assert_eq!(distvec::util::hop(INF - 1), INF);
/// assert_eq!(distvec::util::hop(INF), INF);
/// assert_eq!(distvec::util::hop(u16::MAX), INF);
/// ```
pub fn hop(advertised: u16) -> u16 {
    if advertised >= INF {
        INF
    } else {
        min(INF, advertised + 1)
    }
}

/// Shortcut for distance < INF
pub fn reachable(distance: u16) -> bool {
    distance < INF
}
