//! Multicast socket setup

use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::UdpSocket;

use crate::error::{GroupError, Result};

/// Bind a UDP socket joined to `group` on `port`.
///
/// `SO_REUSEADDR` so multiple peers on one host can share the port;
/// multicast loopback on so a peer hears its own announcements (that is
/// how a sender sees its own chat lines).
pub fn bind_multicast(group: Ipv4Addr, port: u16) -> Result<UdpSocket> {
    if !group.is_multicast() {
        return Err(GroupError::NotMulticast(group));
    }

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SocketAddr::from(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)).into())?;
    socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
    socket.set_multicast_loop_v4(true)?;
    socket.set_nonblocking(true)?;

    Ok(UdpSocket::from_std(socket.into())?)
}
