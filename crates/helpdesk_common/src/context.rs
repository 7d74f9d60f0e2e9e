//! Local system context attached to every ticket.
//!
//! Host reads go through [`HostIdentity`] and [`HostNetwork`] so tests can
//! supply fixed answers. Resolution failures never surface: the address
//! degrades to `"unknown"`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::io;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use tracing::{debug, warn};

use crate::UNKNOWN;

/// Timestamp format stored in tickets
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who and where a question was asked from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemContext {
    pub timestamp: String,
    pub username: String,
    #[serde(rename = "computer_name")]
    pub hostname: String,
    pub ip_address: String,
}

/// Identity of the process owner and machine
pub trait HostIdentity {
    fn username(&self) -> Option<String>;
    fn hostname(&self) -> Option<String>;
}

/// Name resolution for the local machine
pub trait HostNetwork {
    /// Primary IPv4 address the name resolves to
    fn resolve_ipv4(&self, host: &str) -> io::Result<Ipv4Addr>;
    /// Every IPv4 address bound to the name, in resolver order
    fn enumerate_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>>;
}

/// The real host
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHost;

impl HostIdentity for LocalHost {
    fn username(&self) -> Option<String> {
        let uid = nix::unistd::geteuid();
        match nix::unistd::User::from_uid(uid) {
            Ok(Some(user)) => Some(user.name),
            _ => std::env::var("USER").ok().filter(|u| !u.is_empty()),
        }
    }

    fn hostname(&self) -> Option<String> {
        nix::unistd::gethostname()
            .ok()
            .and_then(|name| name.into_string().ok())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

impl HostNetwork for LocalHost {
    fn resolve_ipv4(&self, host: &str) -> io::Result<Ipv4Addr> {
        self.enumerate_ipv4(host)?
            .into_iter()
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no IPv4 address for host"))
    }

    fn enumerate_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>> {
        let addrs = (host, 0u16)
            .to_socket_addrs()?
            .filter_map(|addr| match addr.ip() {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .collect();
        Ok(addrs)
    }
}

impl SystemContext {
    /// Collect context from the real host at the current local time
    pub fn collect() -> Self {
        collect_with(&LocalHost, &LocalHost, Local::now())
    }
}

/// Collect context from the real host
pub fn collect() -> SystemContext {
    SystemContext::collect()
}

/// Collect context from injected accessors and a fixed clock value
pub fn collect_with(
    identity: &dyn HostIdentity,
    network: &dyn HostNetwork,
    now: DateTime<Local>,
) -> SystemContext {
    let username = identity.username().unwrap_or_else(|| UNKNOWN.to_string());
    let (hostname, ip_address) = match identity.hostname() {
        Some(hostname) => {
            let ip_address = resolve_address(network, &hostname);
            (hostname, ip_address)
        }
        None => (UNKNOWN.to_string(), UNKNOWN.to_string()),
    };

    debug!("context: {}@{} ({})", username, hostname, ip_address);

    SystemContext {
        timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
        username,
        hostname,
        ip_address,
    }
}

/// Resolve the hostname, preferring a non-loopback address when the first
/// answer is loopback.
fn resolve_address(network: &dyn HostNetwork, hostname: &str) -> String {
    let primary = match network.resolve_ipv4(hostname) {
        Ok(addr) => addr,
        Err(e) => {
            warn!("could not resolve {}: {}", hostname, e);
            return UNKNOWN.to_string();
        }
    };

    if !primary.is_loopback() {
        return primary.to_string();
    }

    match network.enumerate_ipv4(hostname) {
        Ok(candidates) => candidates
            .into_iter()
            .find(|addr| !addr.is_loopback())
            .unwrap_or(primary)
            .to_string(),
        Err(e) => {
            warn!("could not enumerate addresses for {}: {}", hostname, e);
            UNKNOWN.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedIdentity(Option<&'static str>, Option<&'static str>);

    impl HostIdentity for FixedIdentity {
        fn username(&self) -> Option<String> {
            self.0.map(String::from)
        }
        fn hostname(&self) -> Option<String> {
            self.1.map(String::from)
        }
    }

    struct FixedNetwork {
        primary: Option<Ipv4Addr>,
        all: Option<Vec<Ipv4Addr>>,
    }

    impl HostNetwork for FixedNetwork {
        fn resolve_ipv4(&self, _host: &str) -> io::Result<Ipv4Addr> {
            self.primary
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "lookup failed"))
        }
        fn enumerate_ipv4(&self, _host: &str) -> io::Result<Vec<Ipv4Addr>> {
            self.all
                .clone()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "lookup failed"))
        }
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 12, 0, 9).unwrap()
    }

    fn identity() -> FixedIdentity {
        FixedIdentity(Some("alice"), Some("ws-042"))
    }

    #[test]
    fn test_non_loopback_primary_kept() {
        let net = FixedNetwork {
            primary: Some(Ipv4Addr::new(10, 0, 0, 7)),
            all: None,
        };
        let ctx = collect_with(&identity(), &net, noon());
        assert_eq!(ctx.ip_address, "10.0.0.7");
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.hostname, "ws-042");
        assert_eq!(ctx.timestamp, "2024-03-05 12:00:09");
    }

    #[test]
    fn test_loopback_prefers_interface_address() {
        let net = FixedNetwork {
            primary: Some(Ipv4Addr::new(127, 0, 1, 1)),
            all: Some(vec![
                Ipv4Addr::new(127, 0, 1, 1),
                Ipv4Addr::new(192, 168, 1, 20),
                Ipv4Addr::new(192, 168, 1, 21),
            ]),
        };
        let ctx = collect_with(&identity(), &net, noon());
        assert_eq!(ctx.ip_address, "192.168.1.20");
    }

    #[test]
    fn test_loopback_only_kept() {
        let net = FixedNetwork {
            primary: Some(Ipv4Addr::LOCALHOST),
            all: Some(vec![Ipv4Addr::LOCALHOST]),
        };
        let ctx = collect_with(&identity(), &net, noon());
        assert_eq!(ctx.ip_address, "127.0.0.1");
    }

    #[test]
    fn test_resolution_failure_is_unknown() {
        let net = FixedNetwork {
            primary: None,
            all: None,
        };
        let ctx = collect_with(&identity(), &net, noon());
        assert_eq!(ctx.ip_address, UNKNOWN);

        let net = FixedNetwork {
            primary: Some(Ipv4Addr::LOCALHOST),
            all: None,
        };
        let ctx = collect_with(&identity(), &net, noon());
        assert_eq!(ctx.ip_address, UNKNOWN);
    }

    #[test]
    fn test_missing_identity_is_unknown() {
        let net = FixedNetwork {
            primary: Some(Ipv4Addr::new(10, 1, 1, 1)),
            all: None,
        };
        let ctx = collect_with(&FixedIdentity(None, None), &net, noon());
        assert_eq!(ctx.username, UNKNOWN);
        assert_eq!(ctx.hostname, UNKNOWN);
    }

    struct UnreachableNetwork;

    impl HostNetwork for UnreachableNetwork {
        fn resolve_ipv4(&self, host: &str) -> io::Result<Ipv4Addr> {
            panic!("resolver consulted for {}", host)
        }
        fn enumerate_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>> {
            panic!("resolver consulted for {}", host)
        }
    }

    #[test]
    fn test_unreadable_hostname_skips_resolution() {
        let ctx = collect_with(&FixedIdentity(Some("alice"), None), &UnreachableNetwork, noon());
        assert_eq!(ctx.hostname, UNKNOWN);
        assert_eq!(ctx.ip_address, UNKNOWN);
        assert_eq!(ctx.username, "alice");
    }

    #[test]
    fn test_serializes_hostname_as_computer_name() {
        let net = FixedNetwork {
            primary: Some(Ipv4Addr::new(10, 1, 1, 1)),
            all: None,
        };
        let ctx = collect_with(&identity(), &net, noon());
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["computer_name"], "ws-042");
        assert!(value.get("hostname").is_none());
    }

    #[test]
    fn test_collect_real_host_never_empty() {
        let ctx = collect();
        assert!(!ctx.username.is_empty());
        assert!(!ctx.hostname.is_empty());
        assert!(!ctx.ip_address.is_empty());
        assert_eq!(ctx.timestamp.len(), 19);
    }
}
