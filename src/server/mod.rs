//! TCP broadcast server.
//!
//! [Server::run] binds the listener, then spawns two threads: `rtcm-server`
//! drives a single threaded event loop (acceptor, sessions and the room),
//! `rtcm-bridge` drains the producer FIFO into the room. Producers publish
//! through a [Publisher], from any thread, and never block.
use log::{debug, error, info};

use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    thread::JoinHandle,
};

use thiserror::Error;

use tokio::{
    net::TcpListener,
    sync::{
        mpsc::{UnboundedSender, unbounded_channel},
        watch,
    },
};

mod bridge;
mod room;
mod session;

pub mod packet;

use room::{Event, Room};
use session::Session;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("server is already running")]
    AlreadyRunning,
    #[error("server is not running")]
    NotRunning,
    #[error("invalid packet header")]
    Header,
    #[error("runtime error: {0}")]
    Runtime(io::Error),
}

/// Server [Settings]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Listening address
    pub address: IpAddr,
    /// Listening port. 0 picks an ephemeral port.
    pub port: u16,
    /// Serve bare RTCM frames, without the packet header
    pub raw: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 2101,
            raw: false,
        }
    }
}

impl Settings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }
}

/// Producer FIFO content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// One RTCM frame to broadcast
    Frame(Vec<u8>),
    /// End of stream
    Shutdown,
}

/// Producer handle. Cheap to clone and usable from any thread.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: UnboundedSender<Message>,
}

impl Publisher {
    /// Queues one frame for broadcast
    pub fn publish(&self, frame: impl Into<Vec<u8>>) -> Result<(), Error> {
        self.tx
            .send(Message::Frame(frame.into()))
            .map_err(|_| Error::NotRunning)
    }

    /// Terminates the bridge once every queued frame has been relayed
    pub fn close(&self) {
        let _ = self.tx.send(Message::Shutdown);
    }
}

/// Counters shared with the event loop
#[derive(Debug, Default)]
pub(crate) struct Stats {
    pub sessions: AtomicUsize,
    pub delivered: AtomicU64,
}

struct Running {
    local_addr: SocketAddr,
    publisher: Publisher,
    shutdown: watch::Sender<bool>,
    event_loop: JoinHandle<()>,
    bridge: JoinHandle<usize>,
}

/// TCP broadcast [Server]
pub struct Server {
    settings: Settings,
    stats: Arc<Stats>,
    running: Option<Running>,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            stats: Default::default(),
            running: None,
        }
    }

    /// Binds the listener and starts serving in the background.
    /// Bind failures are reported here.
    pub fn run(&mut self) -> Result<(), Error> {
        if self.running.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let addr = self.settings.socket_addr();

        let listener =
            StdTcpListener::bind(addr).map_err(|source| Error::Bind { addr, source })?;

        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;

        let (room_tx, room_rx) = unbounded_channel();
        let (fifo_tx, fifo_rx) = unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let room = Room::new(self.stats.clone());
        let raw = self.settings.raw;
        let loop_room_tx = room_tx.clone();

        let event_loop = std::thread::Builder::new()
            .name("rtcm-server".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    tokio::spawn(room.run(room_rx));
                    serve(listener, loop_room_tx, raw, shutdown_rx).await;
                });
            })
            .map_err(Error::Runtime)?;

        let bridge = std::thread::Builder::new()
            .name("rtcm-bridge".to_string())
            .spawn(move || bridge::run(fifo_rx, room_tx))
            .map_err(Error::Runtime)?;

        info!("serving on {}", local_addr);

        self.running = Some(Running {
            local_addr,
            shutdown: shutdown_tx,
            event_loop,
            bridge,
            publisher: Publisher { tx: fifo_tx },
        });

        Ok(())
    }

    /// Closes the acceptor and every live session.
    /// Pending writes are discarded.
    pub fn stop(&mut self) -> Result<(), Error> {
        let running = self.running.take().ok_or(Error::NotRunning)?;

        running.publisher.close();
        let _ = running.shutdown.send(true);

        if running.event_loop.join().is_err() {
            error!("event loop panicked");
        }

        match running.bridge.join() {
            Ok(relayed) => debug!("bridge relayed {} packets", relayed),
            Err(_) => error!("bridge panicked"),
        }

        self.stats.sessions.store(0, Ordering::Relaxed);
        info!("server stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Queues one RTCM frame for broadcast
    pub fn send(&self, frame: impl Into<Vec<u8>>) -> Result<(), Error> {
        self.publisher()?.publish(frame)
    }

    /// Returns a new [Publisher] to feed this [Server] from another thread
    pub fn publisher(&self) -> Result<Publisher, Error> {
        self.running
            .as_ref()
            .map(|running| running.publisher.clone())
            .ok_or(Error::NotRunning)
    }

    /// Bound address, once running
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Number of live sessions
    pub fn sessions(&self) -> usize {
        self.stats.sessions.load(Ordering::Relaxed)
    }

    /// Number of packets delivered to the room so far
    pub fn delivered(&self) -> u64 {
        self.stats.delivered.load(Ordering::Relaxed)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

/// Acceptor loop
async fn serve(
    listener: StdTcpListener,
    room: UnboundedSender<Event>,
    raw: bool,
    mut shutdown: watch::Receiver<bool>,
) {
    let listener = match TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to register listener: {}", e);
            return;
        },
    };

    let mut next_id = 0u64;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("acceptor: shutdown");
                break;
            },
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!("{} connected", peer);
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("{}: {}", peer, e);
                    }

                    next_id += 1;
                    let session = Session::new(next_id, &peer.to_string(), stream, room.clone(), raw);
                    tokio::spawn(session.run());
                },
                Err(e) => {
                    error!("accept error: {}", e);
                },
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{
        io::{Read, Write},
        net::TcpStream,
        time::{Duration, Instant},
    };

    fn local_settings(raw: bool) -> Settings {
        Settings {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            raw,
        }
    }

    fn wait_for<F: Fn() -> bool>(condition: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "timed out");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn connect(server: &Server) -> TcpStream {
        let stream = TcpStream::connect(server.local_addr().unwrap()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream
    }

    fn read_packet(stream: &mut TcpStream) -> Vec<u8> {
        let mut header = [0; packet::HEADER_LEN];
        stream.read_exact(&mut header).unwrap();
        let len = packet::Packet::decode_header(&header).unwrap();
        let mut body = vec![0; len];
        stream.read_exact(&mut body).unwrap();
        body
    }

    #[test]
    fn lifecycle() {
        let mut server = Server::new(local_settings(false));
        assert!(!server.is_running());
        assert!(matches!(server.send(vec![1]), Err(Error::NotRunning)));
        assert!(matches!(server.stop(), Err(Error::NotRunning)));

        server.run().unwrap();
        assert!(server.is_running());
        assert!(matches!(server.run(), Err(Error::AlreadyRunning)));

        let addr = server.local_addr().unwrap();
        let mut other = Server::new(Settings {
            address: addr.ip(),
            port: addr.port(),
            raw: false,
        });
        assert!(matches!(other.run(), Err(Error::Bind { .. })));

        server.stop().unwrap();
        assert!(!server.is_running());
        assert!(server.local_addr().is_none());
    }

    #[test]
    fn broadcast_and_replay() {
        let mut server = Server::new(local_settings(false));
        server.run().unwrap();

        let mut first = connect(&server);
        wait_for(|| server.sessions() == 1);

        let publisher = server.publisher().unwrap();
        std::thread::spawn(move || {
            publisher.publish(vec![0xD3, 0x00, 0x01]).unwrap();
        })
        .join()
        .unwrap();

        server.send(vec![0xD3, 0x00, 0x02]).unwrap();

        assert_eq!(read_packet(&mut first), vec![0xD3, 0x00, 0x01]);
        assert_eq!(read_packet(&mut first), vec![0xD3, 0x00, 0x02]);
        wait_for(|| server.delivered() == 2);

        // late joiner gets the latest frame first
        let mut second = connect(&server);
        wait_for(|| server.sessions() == 2);
        assert_eq!(read_packet(&mut second), vec![0xD3, 0x00, 0x02]);

        server.send(vec![0xD3, 0x00, 0x03]).unwrap();
        assert_eq!(read_packet(&mut first), vec![0xD3, 0x00, 0x03]);
        assert_eq!(read_packet(&mut second), vec![0xD3, 0x00, 0x03]);

        // clients may publish too
        second.write_all(b"hi caster\nGS0002\xD3\x04").unwrap();
        assert_eq!(read_packet(&mut first), vec![0xD3, 0x04]);

        // desync drops the offending client only
        second.write_all(b"GS0000").unwrap();
        wait_for(|| server.sessions() == 1);

        server.stop().unwrap();
        let mut buf = [0; 1];
        assert!(matches!(first.read(&mut buf), Ok(0) | Err(_)));
    }

    #[test]
    fn raw_mode() {
        let mut server = Server::new(local_settings(true));
        server.run().unwrap();

        let mut client = connect(&server);
        wait_for(|| server.sessions() == 1);

        server.send(vec![0xD3, 0x00, 0x00, 0x47, 0xEA, 0x4B]).unwrap();

        let mut buf = [0; 6];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0xD3, 0x00, 0x00, 0x47, 0xEA, 0x4B]);
    }
}
