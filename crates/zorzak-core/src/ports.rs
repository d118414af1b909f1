/// Free-port allocation for locally launched backends.
///
/// Ports are probed by attempting a TCP connection to the host the backend
/// will bind (loopback by default): a refused connection means nothing is
/// listening and the port is taken for this process. Claimed ports are remembered for the lifetime of the allocator
/// and never handed out twice, even if nothing ever binds them.
///
/// The probe is a snapshot. Another process may bind the port between the
/// probe and its use; that race is not solved here.
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, trace, warn};

/// How long a single connection probe may take.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("no free port in range {min}..{max}")]
    Exhausted { min: u16, max: u16 },
}

/// A set of claimed ports plus the probe used to find new ones.
#[derive(Debug)]
pub struct PortAllocator {
    claimed: Mutex<BTreeSet<u16>>,
    host: IpAddr,
}

impl Default for PortAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PortAllocator {
    /// Allocator probing `127.0.0.1`.
    pub const fn new() -> Self {
        Self {
            claimed: parking_lot::const_mutex(BTreeSet::new()),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }
    }

    /// Claim the lowest free port in `[min, max)`.
    ///
    /// The scan and the claim happen under one lock, so concurrent callers
    /// never receive the same port.
    pub fn allocate(&self, min: u16, max: u16) -> Result<u16, PortError> {
        self.allocate_on(self.host, min, max)
    }

    /// Like [`allocate`](Self::allocate), probing `host` instead of the
    /// allocator's default. Claims are shared across hosts.
    pub fn allocate_on(&self, host: IpAddr, min: u16, max: u16) -> Result<u16, PortError> {
        let mut claimed = self.claimed.lock();
        for port in min..max {
            if claimed.contains(&port) {
                continue;
            }
            if is_listening(host, port) {
                trace!(port, %host, "Port in use");
                continue;
            }
            claimed.insert(port);
            info!(port, "Allocated port");
            return Ok(port);
        }
        warn!(min, max, "No free port in range");
        Err(PortError::Exhausted { min, max })
    }

    /// `true` if this allocator has already handed out `port`.
    pub fn is_claimed(&self, port: u16) -> bool {
        self.claimed.lock().contains(&port)
    }

    /// Number of ports handed out so far.
    pub fn claimed_count(&self) -> usize {
        self.claimed.lock().len()
    }

    /// Number of ports in `[min, max)` handed out so far.
    pub fn claimed_in(&self, min: u16, max: u16) -> usize {
        if min >= max {
            return 0;
        }
        self.claimed.lock().range(min..max).count()
    }
}

fn is_listening(host: IpAddr, port: u16) -> bool {
    TcpStream::connect_timeout(&SocketAddr::new(host, port), PROBE_TIMEOUT).is_ok()
}

/// Address to probe for a backend bound to `host`.
///
/// Wildcard addresses are probed through the loopback of the same family.
/// Host names are not resolved and fall back to `127.0.0.1`.
pub fn probe_host(host: &str) -> IpAddr {
    match host.trim().parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) if addr.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Ok(IpAddr::V6(addr)) if addr.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        Ok(addr) => addr,
        Err(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
    }
}

static GLOBAL: PortAllocator = PortAllocator::new();

/// The process-wide allocator.
pub fn global() -> &'static PortAllocator {
    &GLOBAL
}

/// Claim a free port in `[min, max)` from the process-wide allocator.
pub fn allocate_port(min: u16, max: u16) -> Result<u16, PortError> {
    GLOBAL.allocate(min, max)
}

/// Claim a free port in `[min, max)` for a backend bound to `host`.
pub fn allocate_port_for(host: &str, min: u16, max: u16) -> Result<u16, PortError> {
    GLOBAL.allocate_on(probe_host(host), min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn sequential_allocations_never_repeat() {
        let allocator = PortAllocator::new();
        let first = allocator.allocate(41_000, 41_200).unwrap();
        let second = allocator.allocate(41_000, 41_200).unwrap();
        assert_ne!(first, second);
        assert!(second > first, "scan is ascending");
        assert!(allocator.is_claimed(first));
        assert!(allocator.is_claimed(second));
        assert_eq!(allocator.claimed_count(), 2);
        assert_eq!(allocator.claimed_in(41_000, 41_200), 2);
        assert_eq!(allocator.claimed_in(first + 1, 41_200), 1);
        assert_eq!(allocator.claimed_in(41_200, 41_000), 0);
    }

    #[test]
    fn listening_port_is_skipped() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let busy = listener.local_addr().unwrap().port();
        let allocator = PortAllocator::new();
        assert_eq!(
            allocator.allocate(busy, busy + 1),
            Err(PortError::Exhausted {
                min: busy,
                max: busy + 1
            })
        );
        assert!(!allocator.is_claimed(busy));
    }

    #[test]
    fn probe_host_maps_wildcards_to_loopback() {
        assert_eq!(probe_host("0.0.0.0"), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(probe_host("::"), IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(probe_host("::1"), IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(
            probe_host("192.168.1.20"),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))
        );
        assert_eq!(probe_host("localhost"), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn wildcard_host_probes_loopback_listeners() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let busy = listener.local_addr().unwrap().port();
        let allocator = PortAllocator::new();
        assert!(allocator
            .allocate_on(probe_host("0.0.0.0"), busy, busy + 1)
            .is_err());
        assert!(!allocator.is_claimed(busy));
    }

    #[test]
    fn empty_range_is_exhausted() {
        let allocator = PortAllocator::new();
        assert_eq!(
            allocator.allocate(9_000, 9_000),
            Err(PortError::Exhausted {
                min: 9_000,
                max: 9_000
            })
        );
    }

    #[test]
    fn single_port_range_is_handed_out_once() {
        let allocator = PortAllocator::new();
        // Find a free port first, then pin the range to it.
        let port = allocator.allocate(42_000, 42_200).unwrap();
        let fresh = PortAllocator::new();
        assert_eq!(fresh.allocate(port, port + 1), Ok(port));
        assert!(fresh.allocate(port, port + 1).is_err());
    }

    #[test]
    fn global_allocator_is_shared() {
        let port = allocate_port(43_000, 43_200).unwrap();
        assert!(global().is_claimed(port));
        assert_ne!(allocate_port(43_000, 43_200).unwrap(), port);
    }

    #[test]
    fn concurrent_allocations_are_unique() {
        let allocator = std::sync::Arc::new(PortAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let allocator = allocator.clone();
                std::thread::spawn(move || allocator.allocate(44_000, 44_200).unwrap())
            })
            .collect();
        let mut ports: Vec<u16> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ports.sort_unstable();
        ports.dedup();
        assert_eq!(ports.len(), 4);
    }
}
