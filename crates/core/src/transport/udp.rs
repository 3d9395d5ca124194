use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::error::Result;

/// Secondary relay sink: repeats datagrams to one unicast destination.
///
/// Binds an ephemeral socket and connects it to the destination, so
/// [`send`](Self::send) needs no address and the kernel can report a
/// closed receiver on later sends.
pub struct UnicastSink {
    socket: UdpSocket,
    dest: SocketAddr,
}

impl UnicastSink {
    pub async fn connect(dest: SocketAddr) -> Result<Self> {
        let bind: SocketAddr = match dest {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(dest).await?;
        Ok(Self { socket, dest })
    }

    pub fn dest(&self) -> SocketAddr {
        self.dest
    }

    /// Send one datagram to the destination.
    pub async fn send(&self, payload: &[u8]) -> std::io::Result<usize> {
        self.socket.send(payload).await
    }
}
