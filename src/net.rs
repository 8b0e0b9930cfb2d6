//! Minimal TCP reactor
//!
//! Single-threaded, non-blocking accept/read loop that feeds a
//! [`SessionRegistry`]. No telnet option negotiation is done: clients are
//! expected to send keystrokes unbuffered (e.g. `nc` with a raw tty).
//!
//! Sessions never write to their socket directly. Output lands in a
//! per-connection outbox which the reactor drains as the socket accepts
//! more, so a slow reader delays output instead of losing it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::{SessionId, SessionRegistry, SessionStatus};

/// Idle back-off between polls
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Session output not yet taken by the socket
#[derive(Clone, Default)]
struct Outbox(Rc<RefCell<Vec<u8>>>);

impl Outbox {
    fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn pending(&self) -> usize {
        self.0.borrow().len()
    }

    /// Write as much as `stream` takes without blocking.
    ///
    /// Returns the number of bytes sent.
    fn flush_into(&self, stream: &mut TcpStream) -> io::Result<usize> {
        let mut queue = self.0.borrow_mut();
        let mut sent = 0;
        while sent < queue.len() {
            match stream.write(&queue[sent..]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => sent += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        queue.drain(..sent);
        Ok(sent)
    }
}

impl Write for Outbox {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Connection {
    stream: TcpStream,
    outbox: Outbox,
    /// Session already released; waiting for the outbox to drain
    closing: bool,
}

/// Listening socket plus one stream per open session
pub struct Reactor {
    listener: TcpListener,
    connections: HashMap<SessionId, Connection>,
}

impl Reactor {
    pub fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!("Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            connections: HashMap::new(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Serve until `shutdown` is set
    pub fn run(&mut self, registry: &mut SessionRegistry, shutdown: &AtomicBool) -> io::Result<()> {
        while !shutdown.load(Ordering::SeqCst) {
            if !self.poll_once(registry)? {
                thread::sleep(POLL_INTERVAL);
            }
        }

        info!("Shutting down, {} connection(s) open", self.connections.len());
        for (id, mut conn) in self.connections.drain() {
            if let Err(e) = conn.outbox.flush_into(&mut conn.stream) {
                debug!("Session {}: final flush failed: {}", id, e);
            }
            let _ = conn.stream.shutdown(Shutdown::Both);
            if !conn.closing {
                let _ = registry.on_connection_closed(id);
            }
        }
        Ok(())
    }

    /// Accept pending clients, read whatever is available and flush
    /// queued output.
    ///
    /// Returns whether anything happened.
    pub fn poll_once(&mut self, registry: &mut SessionRegistry) -> io::Result<bool> {
        let mut busy = self.accept_pending(registry)?;

        let mut dead = Vec::new();
        let mut buf = [0u8; 1024];
        for (&id, conn) in self.connections.iter_mut() {
            if !conn.closing {
                match conn.stream.read(&mut buf) {
                    Ok(0) => {
                        dead.push(id);
                        continue;
                    }
                    Ok(n) => {
                        busy = true;
                        match registry.deliver_bytes(id, &buf[..n]) {
                            Ok(SessionStatus::Open) => {}
                            Ok(SessionStatus::CloseRequested) => {
                                conn.closing = true;
                                if let Err(e) = registry.on_connection_closed(id) {
                                    warn!("{}", e);
                                }
                            }
                            Err(e) => {
                                warn!("{}", e);
                                dead.push(id);
                                continue;
                            }
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        debug!("Session {}: read failed: {}", id, e);
                        dead.push(id);
                        continue;
                    }
                }
            }

            match conn.outbox.flush_into(&mut conn.stream) {
                Ok(0) => {}
                Ok(_) => busy = true,
                Err(e) => {
                    debug!(
                        "Session {}: write failed with {} byte(s) queued: {}",
                        id,
                        conn.outbox.pending(),
                        e
                    );
                    dead.push(id);
                    continue;
                }
            }
            if conn.closing && conn.outbox.is_empty() {
                dead.push(id);
            }
        }

        for id in dead {
            busy = true;
            let Some(conn) = self.connections.remove(&id) else {
                continue;
            };
            let _ = conn.stream.shutdown(Shutdown::Both);
            if conn.closing {
                debug!("Session {}: output drained, disconnecting", id);
            } else if let Err(e) = registry.on_connection_closed(id) {
                warn!("{}", e);
            }
        }
        Ok(busy)
    }

    fn accept_pending(&mut self, registry: &mut SessionRegistry) -> io::Result<bool> {
        let mut accepted = false;
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(true)?;
                    let _ = stream.set_nodelay(true);
                    let outbox = Outbox::default();
                    let id = registry.open(Box::new(outbox.clone()));
                    info!("Session {} connected from {}", id, peer);
                    self.connections.insert(
                        id,
                        Connection {
                            stream,
                            outbox,
                            closing: false,
                        },
                    );
                    accepted = true;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(accepted),
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::CommandTree;
    use crate::core::{Terminal, TerminalSettings};
    use std::time::Instant;

    const DUMP_SIZE: usize = 8 * 1024 * 1024;

    fn registry() -> SessionRegistry {
        let mut tree = CommandTree::new();
        tree.root_mut()
            .leaf("quit", "Close the session", |s, _| {
                s.write_line("bye");
                s.request_close();
                Ok(())
            })
            .unwrap()
            .leaf("dump", "Write a lot, then close", |s, _| {
                s.write(&"x".repeat(DUMP_SIZE));
                s.write_line("END");
                s.request_close();
                Ok(())
            })
            .unwrap();
        let settings = TerminalSettings {
            hostname: "lab".to_string(),
            ..TerminalSettings::default()
        };
        SessionRegistry::new(Terminal::new(tree, settings))
    }

    fn poll_until(reactor: &mut Reactor, registry: &mut SessionRegistry, done: impl Fn(&Reactor) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(&*reactor) && Instant::now() < deadline {
            reactor.poll_once(registry).unwrap();
            thread::sleep(POLL_INTERVAL);
        }
    }

    #[test]
    fn test_connect_type_and_quit() {
        let mut registry = registry();
        let mut reactor = Reactor::bind("127.0.0.1:0").unwrap();
        let addr = reactor.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        poll_until(&mut reactor, &mut registry, |r| r.connection_count() == 1);
        assert_eq!(registry.len(), 1);

        client.write_all(b"quit\r").unwrap();
        poll_until(&mut reactor, &mut registry, |r| r.connection_count() == 0);
        assert!(registry.is_empty());

        let mut received = Vec::new();
        client.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"lab> quit\r\nbye\r\n");
    }

    #[test]
    fn test_large_output_reaches_slow_reader() {
        let mut registry = registry();
        let mut reactor = Reactor::bind("127.0.0.1:0").unwrap();
        let addr = reactor.local_addr().unwrap();

        let client = thread::spawn(move || {
            let mut client = TcpStream::connect(addr).unwrap();
            client.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
            client.write_all(b"dump\r").unwrap();
            // Let the server fill the socket buffers first
            thread::sleep(Duration::from_millis(300));
            let mut received = Vec::new();
            client.read_to_end(&mut received).unwrap();
            received
        });

        let deadline = Instant::now() + Duration::from_secs(20);
        while !client.is_finished() && Instant::now() < deadline {
            if !reactor.poll_once(&mut registry).unwrap() {
                thread::sleep(POLL_INTERVAL);
            }
        }
        let received = client.join().unwrap();

        let head = b"lab> dump\r\n";
        assert_eq!(received.len(), head.len() + DUMP_SIZE + b"END\r\n".len());
        assert!(received.starts_with(head));
        assert!(received.ends_with(b"xEND\r\n"));
        assert_eq!(reactor.connection_count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_run_stops_on_shutdown_flag() {
        let mut registry = registry();
        let mut reactor = Reactor::bind("127.0.0.1:0").unwrap();
        let addr = reactor.local_addr().unwrap();

        let _client = TcpStream::connect(addr).unwrap();
        poll_until(&mut reactor, &mut registry, |r| r.connection_count() == 1);
        assert_eq!(registry.len(), 1);

        let shutdown = AtomicBool::new(true);
        reactor.run(&mut registry, &shutdown).unwrap();
        assert_eq!(reactor.connection_count(), 0);
        assert!(registry.is_empty());
    }
}
