use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{GatewayError, Result};

/// The local interface multicast groups are joined on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NetworkInterface {
    /// Let the kernel pick (`INADDR_ANY`).
    #[default]
    Any,
    /// An interface by name, e.g. `eth0`; resolved to its first IPv4 address.
    Named(String),
    /// An interface by its IPv4 address.
    Address(Ipv4Addr),
}

impl NetworkInterface {
    /// The IPv4 address passed to `IP_ADD_MEMBERSHIP`.
    pub fn resolve(&self) -> std::result::Result<Ipv4Addr, String> {
        match self {
            NetworkInterface::Any => Ok(Ipv4Addr::UNSPECIFIED),
            NetworkInterface::Address(addr) => Ok(*addr),
            NetworkInterface::Named(name) => interface_ipv4(name),
        }
    }
}

impl FromStr for NetworkInterface {
    type Err = std::convert::Infallible;

    /// `""`/`"any"`/`"0.0.0.0"` → [`Any`](Self::Any), an IPv4 literal →
    /// [`Address`](Self::Address), anything else → [`Named`](Self::Named).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("any") {
            return Ok(NetworkInterface::Any);
        }
        Ok(match s.parse::<Ipv4Addr>() {
            Ok(addr) if addr.is_unspecified() => NetworkInterface::Any,
            Ok(addr) => NetworkInterface::Address(addr),
            Err(_) => NetworkInterface::Named(s.to_string()),
        })
    }
}

impl fmt::Display for NetworkInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkInterface::Any => f.write_str("any"),
            NetworkInterface::Named(name) => f.write_str(name),
            NetworkInterface::Address(addr) => write!(f, "{}", addr),
        }
    }
}

#[cfg(unix)]
fn interface_ipv4(name: &str) -> std::result::Result<Ipv4Addr, String> {
    let addrs = nix::ifaddrs::getifaddrs().map_err(|e| format!("getifaddrs: {}", e))?;
    let mut found = false;
    for ifaddr in addrs {
        if ifaddr.interface_name != name {
            continue;
        }
        found = true;
        if let Some(sin) = ifaddr.address.as_ref().and_then(|a| a.as_sockaddr_in()) {
            return Ok(*SocketAddrV4::from(*sin).ip());
        }
    }
    if found {
        Err("interface has no IPv4 address".to_string())
    } else {
        Err("no such interface".to_string())
    }
}

#[cfg(not(unix))]
fn interface_ipv4(_name: &str) -> std::result::Result<Ipv4Addr, String> {
    Err("interface names are not supported on this platform; use an IPv4 address".to_string())
}

/// Bind a UDP socket on the group's port and join the group on `iface`.
///
/// The socket allows address reuse so several sessions can receive the
/// same group concurrently, each with its own membership.
pub fn join_group(group: SocketAddrV4, iface: &NetworkInterface) -> Result<UdpSocket> {
    let join_error = |reason: String| GatewayError::Join {
        group: group.to_string(),
        interface: iface.to_string(),
        reason,
    };

    let iface_addr = iface.resolve().map_err(&join_error)?;
    let socket = bind_reusable(group).map_err(|e| join_error(e.to_string()))?;
    socket
        .join_multicast_v4(group.ip(), &iface_addr)
        .map_err(|e| join_error(e.to_string()))?;

    tracing::info!(%group, interface = %iface, %iface_addr, "joined multicast group");

    UdpSocket::from_std(socket.into()).map_err(|e| join_error(e.to_string()))
}

fn bind_reusable(group: SocketAddrV4) -> std::io::Result<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nonblocking(true)?;

    // Binding the group address filters out other groups sharing the port.
    #[cfg(unix)]
    let bind = SocketAddr::V4(group);
    #[cfg(not(unix))]
    let bind = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port()));

    socket.bind(&bind.into())?;
    Ok(socket)
}
