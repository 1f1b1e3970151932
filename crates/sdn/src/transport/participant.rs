// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Socket-level participant core shared by all transport roles.
//!
//! State machine: Closed -> Open -> {Publishing | Receiving} -> Closed.
//! `open_*` is a precondition for all I/O; `close` is idempotent and a
//! closed socket is never implicitly reopened. One core owns exactly one
//! socket and one receive buffer; I/O calls are not reentrant.

use crate::config::{DEFAULT_BUFFER_DEPTH, MAX_IPV4_PAYLOAD, MAX_MCAST_PAYLOAD, MAX_UCAST_PAYLOAD};
use crate::error::{Error, Result};
use crate::transport::iface::resolve_interface;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::Duration;

/// Transport topology of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Multicast,
    Unicast,
}

/// Synchronous transformation hook run on the datagram buffer
/// (after receive for subscribers/messengers, before send for publishers).
pub type Callback = Box<dyn FnMut(&mut [u8]) + Send>;

/// Shared capability contract of every transport role.
pub trait Endpoint {
    /// Open the socket for this role. Not idempotent: opening an already
    /// open participant is an error.
    fn open(&mut self) -> Result<()>;
    /// Close the socket. Idempotent; a no-op when already closed.
    fn close(&mut self);
    fn is_open(&self) -> bool;
    /// Receive/staging buffer owned by the participant.
    fn buffer(&self) -> &[u8];
    fn buffer_mut(&mut self) -> &mut [u8];
    /// Map the requested depth to SO_SNDBUF/SO_RCVBUF.
    fn set_buffer_depth(&mut self, depth: usize) -> Result<()>;
}

/// One socket-level endpoint: interface binding, socket lifecycle,
/// buffer and depth management, timeout-bounded readiness wait.
pub struct ParticipantCore {
    topology: Topology,
    iface_name: String,
    iface_addr: Ipv4Addr,
    addr: Ipv4Addr,
    port: u16,
    socket: Option<UdpSocket>,
    buffer: Vec<u8>,
    depth: usize,
}

impl ParticipantCore {
    /// Resolve the interface and stage a closed participant.
    ///
    /// `addr:port` is the multicast group or the unicast peer/bind address
    /// depending on topology and role.
    pub fn new(topology: Topology, iface_name: &str, addr: Ipv4Addr, port: u16) -> Result<Self> {
        let iface_addr = resolve_interface(iface_name)?;
        if port == 0 {
            return Err(Error::InvalidMapping("port 0".to_string()));
        }
        if topology == Topology::Multicast && !addr.is_multicast() {
            return Err(Error::InvalidMapping(format!("{} is not class-D", addr)));
        }
        Ok(Self {
            topology,
            iface_name: iface_name.to_string(),
            iface_addr,
            addr,
            port,
            socket: None,
            buffer: vec![0u8; MAX_IPV4_PAYLOAD],
            depth: DEFAULT_BUFFER_DEPTH,
        })
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn iface_name(&self) -> &str {
        &self.iface_name
    }

    pub fn iface_addr(&self) -> Ipv4Addr {
        self.iface_addr
    }

    /// Destination (publish) or group (receive) address.
    pub fn destination(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.addr, self.port))
    }

    /// Payload ceiling for this topology: multicast reserves envelope room.
    pub fn max_payload(&self) -> usize {
        match self.topology {
            Topology::Multicast => MAX_MCAST_PAYLOAD,
            Topology::Unicast => MAX_UCAST_PAYLOAD,
        }
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    pub fn socket(&self) -> Result<&UdpSocket> {
        self.socket.as_ref().ok_or(Error::NotOpen)
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    fn raw_socket(&self) -> Result<Socket> {
        if self.socket.is_some() {
            // Sockets are never implicitly reopened.
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "participant already open",
            )));
        }
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        Ok(socket)
    }

    fn apply_depth(&self, socket: &Socket) -> Result<()> {
        socket.set_send_buffer_size(self.depth)?;
        socket.set_recv_buffer_size(self.depth)?;
        Ok(())
    }

    /// Open for sending: outbound interface pinned, source port explicit or
    /// ephemeral, socket non-blocking (best-effort sends drop on would-block).
    pub fn open_sender(&mut self, source_port: u16) -> Result<()> {
        let socket = self.raw_socket()?;
        if self.topology == Topology::Multicast {
            socket.set_multicast_if_v4(&self.iface_addr)?;
            socket.set_multicast_loop_v4(true)?;
            socket.set_multicast_ttl_v4(1)?;
        }
        let bind = SocketAddrV4::new(self.iface_addr, source_port);
        socket.bind(&SocketAddr::V4(bind).into())?;
        self.apply_depth(&socket)?;
        socket.set_nonblocking(true)?;
        let socket: UdpSocket = socket.into();
        log::debug!(
            "[PART] sender open iface={} bind={} dest={}",
            self.iface_name,
            bind,
            self.destination()
        );
        self.socket = Some(socket);
        Ok(())
    }

    /// Open for receiving: bind to the group/interface port and, for
    /// multicast, join the group on the bound interface.
    pub fn open_receiver(&mut self) -> Result<()> {
        let socket = self.raw_socket()?;
        match self.topology {
            Topology::Multicast => {
                let bind = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port);
                socket.bind(&SocketAddr::V4(bind).into())?;
                socket.join_multicast_v4(&self.addr, &self.iface_addr)?;
                socket.set_multicast_loop_v4(true)?;
                log::debug!(
                    "[PART] receiver open group={}:{} iface={}",
                    self.addr,
                    self.port,
                    self.iface_name
                );
            }
            Topology::Unicast => {
                let bind = SocketAddrV4::new(self.iface_addr, self.port);
                socket.bind(&SocketAddr::V4(bind).into())?;
                log::debug!("[PART] receiver open bind={}", bind);
            }
        }
        self.apply_depth(&socket)?;
        self.socket = Some(socket.into());
        Ok(())
    }

    /// Open for bidirectional traffic on one socket (messenger): receiver
    /// binding plus outbound multicast interface pinning.
    pub fn open_duplex(&mut self) -> Result<()> {
        let socket = self.raw_socket()?;
        match self.topology {
            Topology::Multicast => {
                let bind = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port);
                socket.bind(&SocketAddr::V4(bind).into())?;
                socket.join_multicast_v4(&self.addr, &self.iface_addr)?;
                socket.set_multicast_if_v4(&self.iface_addr)?;
                socket.set_multicast_loop_v4(true)?;
                socket.set_multicast_ttl_v4(1)?;
                log::debug!(
                    "[PART] duplex open group={}:{} iface={}",
                    self.addr,
                    self.port,
                    self.iface_name
                );
            }
            Topology::Unicast => {
                let bind = SocketAddrV4::new(self.iface_addr, self.port);
                socket.bind(&SocketAddr::V4(bind).into())?;
                log::debug!("[PART] duplex open bind={}", bind);
            }
        }
        self.apply_depth(&socket)?;
        self.socket = Some(socket.into());
        Ok(())
    }

    /// Idempotent; safe on an already-closed participant.
    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            log::debug!("[PART] closed {}:{}", self.addr, self.port);
        }
    }

    /// Map depth to SO_SNDBUF/SO_RCVBUF on the open socket (stored and
    /// applied at open time otherwise). The kernel's accounting is exposed,
    /// not absorbed: a depth smaller than the payload makes later sends or
    /// receives fail at the socket.
    pub fn set_buffer_depth(&mut self, depth: usize) -> Result<()> {
        if depth == 0 || depth > MAX_IPV4_PAYLOAD * 1024 {
            return Err(Error::InvalidBufferDepth {
                depth,
                max: MAX_IPV4_PAYLOAD * 1024,
            });
        }
        if depth < self.max_payload() {
            log::warn!(
                "[PART] buffer depth {} below payload ceiling {}, datagrams may drop",
                depth,
                self.max_payload()
            );
        }
        self.depth = depth;
        if let Some(socket) = self.socket.as_ref() {
            let raw = socket2::SockRef::from(socket);
            raw.set_send_buffer_size(depth)?;
            raw.set_recv_buffer_size(depth)?;
        }
        Ok(())
    }

    pub fn buffer_depth(&self) -> usize {
        self.depth
    }

    /// Best-effort datagram send to the participant's destination.
    pub fn send(&self, payload: &[u8]) -> Result<usize> {
        self.send_to(payload, self.destination())
    }

    /// Best-effort datagram send to an explicit endpoint (messenger reply).
    pub fn send_to(&self, payload: &[u8], dest: SocketAddr) -> Result<usize> {
        if payload.len() > self.max_payload() {
            return Err(Error::SizeMismatch {
                declared: payload.len(),
                computed: self.max_payload(),
            });
        }
        match self.socket()?.send_to(payload, dest) {
            Ok(sent) => Ok(sent),
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                // Best effort: a full send buffer drops the datagram.
                log::warn!("[PART] send would block, dropped {} bytes to {}", payload.len(), dest);
                Ok(0)
            }
            Err(err) => Err(Error::Io(err)),
        }
    }

    /// Blocking read into the participant's buffer.
    ///
    /// A read that expires under a socket-level timeout surfaces as
    /// [`Error::Timeout`], matching the readiness-wait path.
    pub fn recv(&mut self) -> Result<(usize, SocketAddr)> {
        let socket = self.socket.as_ref().ok_or(Error::NotOpen)?;
        match socket.recv_from(&mut self.buffer) {
            Ok((len, from)) => Ok((len, from)),
            Err(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut =>
            {
                Err(Error::Timeout)
            }
            Err(err) => Err(Error::Io(err)),
        }
    }

    /// Readiness wait bounded by `timeout` before a blocking read.
    ///
    /// Returns `false` on expiry without data.
    #[cfg(unix)]
    pub fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        use std::os::unix::io::AsRawFd;

        let fd = self.socket()?.as_raw_fd();
        let mut readfds: libc::fd_set = unsafe { std::mem::zeroed() };
        // SAFETY: FD_ZERO/FD_SET on a locally owned, zero-initialized fd_set
        // with a valid descriptor below FD_SETSIZE.
        unsafe {
            libc::FD_ZERO(&mut readfds);
            libc::FD_SET(fd, &mut readfds);
        }
        let ts = libc::timespec {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_nsec: timeout.subsec_nanos() as libc::c_long,
        };
        // SAFETY: pselect FFI with a valid nfds bound, initialized fd_set and
        // timespec, and null write/except sets and sigmask.
        let ret = unsafe {
            libc::pselect(
                fd + 1,
                &mut readfds,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                &ts,
                std::ptr::null(),
            )
        };
        match ret {
            -1 => Err(Error::Io(std::io::Error::last_os_error())),
            0 => Ok(false),
            _ => Ok(true),
        }
    }

    /// Portable fallback: bound the following read with SO_RCVTIMEO. The
    /// expired read surfaces as [`Error::Timeout`] from [`Self::recv`].
    #[cfg(not(unix))]
    pub fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        self.socket()?.set_read_timeout(Some(timeout))?;
        Ok(true)
    }

    /// Portable fallback companion: drop a previously set SO_RCVTIMEO so an
    /// untimed receive blocks indefinitely again.
    #[cfg(not(unix))]
    pub fn clear_read_timeout(&self) -> Result<()> {
        self.socket()?.set_read_timeout(None)?;
        Ok(())
    }
}

impl Drop for ParticipantCore {
    fn drop(&mut self) {
        self.close();
    }
}

/// Legacy convention for multicast: a zero-length receive means "full
/// buffer received"; the actual size is the NUL-terminated text length.
/// Kept for compatibility with one legacy text message shape; it is not a
/// general truth about binary UDP payloads.
pub fn zero_length_text_size(buffer: &[u8]) -> usize {
    buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback_core(topology: Topology, addr: Ipv4Addr, port: u16) -> ParticipantCore {
        ParticipantCore::new(topology, "lo", addr, port).expect("core")
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_open_close_idempotent() {
        let mut core = loopback_core(Topology::Multicast, Ipv4Addr::new(239, 0, 99, 1), 41999);
        assert!(!core.is_open());
        core.open_receiver().expect("open");
        assert!(core.is_open());
        // No implicit reopen.
        assert!(core.open_receiver().is_err());
        core.close();
        assert!(!core.is_open());
        core.close(); // no-op, not an error
    }

    #[test]
    fn test_mapping_validation() {
        assert!(ParticipantCore::new(
            Topology::Multicast,
            "lo",
            Ipv4Addr::new(10, 0, 0, 1),
            4000
        )
        .is_err());
        assert!(
            ParticipantCore::new(Topology::Multicast, "lo", Ipv4Addr::new(239, 0, 1, 1), 0)
                .is_err()
        );
    }

    #[test]
    fn test_buffer_depth_bounds() {
        let mut core = loopback_core(Topology::Multicast, Ipv4Addr::new(239, 0, 99, 2), 42000);
        assert!(matches!(
            core.set_buffer_depth(0),
            Err(Error::InvalidBufferDepth { .. })
        ));
        core.set_buffer_depth(4096).expect("small depth accepted");
        assert_eq!(core.buffer_depth(), 4096);
    }

    #[test]
    fn test_max_payload_per_topology() {
        let mcast = loopback_core(Topology::Multicast, Ipv4Addr::new(239, 0, 99, 3), 42001);
        let ucast = loopback_core(Topology::Unicast, Ipv4Addr::new(127, 0, 0, 1), 42002);
        assert!(mcast.max_payload() < ucast.max_payload());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_wait_readable_times_out() {
        let mut core = loopback_core(Topology::Multicast, Ipv4Addr::new(239, 0, 99, 4), 42003);
        core.open_receiver().expect("open");
        let ready = core
            .wait_readable(Duration::from_millis(20))
            .expect("wait");
        assert!(!ready);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_recv_maps_socket_timeout() {
        let mut core = loopback_core(Topology::Multicast, Ipv4Addr::new(239, 0, 99, 5), 42004);
        core.open_receiver().expect("open");
        core.socket()
            .expect("socket")
            .set_read_timeout(Some(Duration::from_millis(20)))
            .expect("read timeout");
        // An expired socket-level timeout is Timeout, not a raw I/O error.
        assert!(matches!(core.recv(), Err(Error::Timeout)));
    }

    #[test]
    fn test_zero_length_text_size() {
        assert_eq!(zero_length_text_size(b"hello\0garbage"), 5);
        assert_eq!(zero_length_text_size(b"\0"), 0);
        assert_eq!(zero_length_text_size(b"ab"), 2);
    }
}
