use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ConnectError, Result};
use crate::traits::{Connector, LinkStream};

/// TCP bridge transport.
///
/// Serial device servers (and most embedded radio bridges) expose a remote
/// serial port as a TCP endpoint. This connector treats the link address
/// as a `host:port` string and hands back a non-blocking [`TcpLink`].
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
}

impl TcpConnector {
    /// Default connection timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the connection timeout.
    pub fn with_connect_timeout(timeout: Duration) -> Self {
        Self {
            connect_timeout: timeout,
        }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector for TcpConnector {
    type Stream = TcpLink;

    fn connect(&self, address: &str) -> Result<TcpLink> {
        let addr: SocketAddr = address
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConnectError::Unresolved {
                address: address.to_string(),
            })?;

        let stream =
            TcpStream::connect_timeout(&addr, self.connect_timeout).map_err(|source| {
                ConnectError::Refused {
                    address: address.to_string(),
                    source,
                }
            })?;

        // Poll-style reads require the socket in non-blocking mode.
        stream
            .set_nonblocking(true)
            .map_err(|source| ConnectError::Refused {
                address: address.to_string(),
                source,
            })?;

        info!(%address, "connected to link endpoint");

        Ok(TcpLink { stream, open: true })
    }
}

/// A connected TCP bridge link.
///
/// EOF and fatal write errors mark the link closed; the session loop
/// observes this through [`LinkStream::is_open`].
#[derive(Debug)]
pub struct TcpLink {
    stream: TcpStream,
    open: bool,
}

impl LinkStream for TcpLink {
    fn poll_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.open {
            return Ok(0);
        }
        match self.stream.read(buf) {
            // EOF: the peer closed its end.
            Ok(0) => {
                self.open = false;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(0),
            Err(err) => Err(err),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.stream.write(&bytes[offset..]) {
                Ok(0) => {
                    self.open = false;
                    return Err(io::Error::from(ErrorKind::WriteZero));
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => {
                    self.open = false;
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        if let Err(err) = self.stream.shutdown(Shutdown::Both) {
            debug!(%err, "link shutdown reported an error");
        }
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    fn poll_until(link: &mut TcpLink, want: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 256];
        for _ in 0..500 {
            let n = link.poll_read(&mut buf).unwrap();
            out.extend_from_slice(&buf[..n]);
            if out.len() >= want {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        out
    }

    #[test]
    fn connect_and_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (mut stream, _addr) = listener.accept().unwrap();
            stream.write_all(b"hello").unwrap();
        });

        let mut link = TcpConnector::new().connect(&address).unwrap();
        let got = poll_until(&mut link, 5);
        assert_eq!(got, b"hello");

        server.join().unwrap();
    }

    #[test]
    fn write_reaches_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (mut stream, _addr) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            buf.to_vec()
        });

        let mut link = TcpConnector::new().connect(&address).unwrap();
        link.write_all(b"ping").unwrap();

        assert_eq!(server.join().unwrap(), b"ping");
    }

    #[test]
    fn poll_read_returns_zero_when_idle() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || listener.accept().unwrap());

        let mut link = TcpConnector::new().connect(&address).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(link.poll_read(&mut buf).unwrap(), 0);
        assert!(link.is_open());

        drop(server.join().unwrap());
    }

    #[test]
    fn peer_close_marks_link_lost() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || {
            let (stream, _addr) = listener.accept().unwrap();
            drop(stream);
        });

        let mut link = TcpConnector::new().connect(&address).unwrap();
        server.join().unwrap();

        let mut buf = [0u8; 16];
        for _ in 0..500 {
            link.poll_read(&mut buf).unwrap();
            if !link.is_open() {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(!link.is_open());
    }

    #[test]
    fn close_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = thread::spawn(move || listener.accept().unwrap());

        let mut link = TcpConnector::new().connect(&address).unwrap();
        link.close();
        link.close();
        assert!(!link.is_open());

        drop(server.join().unwrap());
    }

    #[test]
    fn unresolvable_address_rejected() {
        let err = TcpConnector::new()
            .connect("not-an-endpoint")
            .unwrap_err();
        assert!(matches!(err, ConnectError::Unresolved { .. }));
    }

    #[test]
    fn refused_connection_reported() {
        // Bind then drop to get a loopback port with no listener behind it.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = TcpConnector::with_connect_timeout(Duration::from_secs(1))
            .connect(&address)
            .unwrap_err();
        assert!(matches!(err, ConnectError::Refused { .. }));
    }
}
