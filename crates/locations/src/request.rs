/// Sequence number of a network load.
///
/// Tickets are issued in increasing order; only the newest ticket may write
/// the cache.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub u64);
