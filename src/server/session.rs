//! One client connection.
//!
//! The read side runs a small state machine: it waits for a packet header,
//! then for the announced body, and goes back to waiting for a header.
//! Bytes that do not belong to a packet are client chatter and only get
//! logged. The write side drains the session outbox in order.
use log::{debug, error, info};

use std::sync::Arc;

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc::{UnboundedSender, unbounded_channel},
};

use crate::server::{
    Error,
    packet::{HEADER_LEN, Packet},
    room::Event,
};

/// Chatter is logged by lines of this many characters
const CHATTER_LINE: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Body(usize),
}

/// Incoming byte stream to [Packet]s
#[derive(Debug)]
pub(crate) struct Decoder {
    state: State,
    buf: Vec<u8>,
    chatter: String,
    peer: String,
}

impl Decoder {
    pub fn new(peer: &str) -> Self {
        Self {
            state: State::Header,
            buf: Vec::with_capacity(1024),
            chatter: String::with_capacity(CHATTER_LINE),
            peer: peer.to_string(),
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Returns the next complete [Packet], if any.
    /// A header with an invalid length is a protocol desync.
    pub fn next_packet(&mut self) -> Result<Option<Packet>, Error> {
        loop {
            match self.state {
                State::Header => {
                    let start = match self.buf.windows(2).position(|w| w == b"GS") {
                        Some(start) => start,
                        None if self.buf.last() == Some(&b'G') => self.buf.len() - 1,
                        None => self.buf.len(),
                    };

                    if start > 0 {
                        let chatter = self.buf.drain(..start).collect::<Vec<_>>();
                        self.chatter(&chatter);
                    }

                    if self.buf.len() < HEADER_LEN {
                        return Ok(None);
                    }

                    let len = Packet::decode_header(&self.buf[..HEADER_LEN])?;
                    self.buf.drain(..HEADER_LEN);
                    self.state = State::Body(len);
                },
                State::Body(len) => {
                    if self.buf.len() < len {
                        return Ok(None);
                    }

                    let packet = Packet::encode(&self.buf[..len]);
                    self.buf.drain(..len);
                    self.state = State::Header;
                    return Ok(Some(packet));
                },
            }
        }
    }

    fn chatter(&mut self, bytes: &[u8]) {
        for c in String::from_utf8_lossy(bytes).chars() {
            if c == '\n' || c == '\r' {
                self.flush_chatter();
            } else {
                self.chatter.push(c);
                if self.chatter.chars().count() >= CHATTER_LINE {
                    self.flush_chatter();
                }
            }
        }
    }

    fn flush_chatter(&mut self) {
        if !self.chatter.is_empty() {
            info!("{} says: {}", self.peer, self.chatter);
            self.chatter.clear();
        }
    }
}

/// Connected client
pub(crate) struct Session<S> {
    id: u64,
    peer: String,
    stream: S,
    room: UnboundedSender<Event>,
    raw: bool,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Creates a new [Session]. In `raw` mode, packets are written
    /// without their header.
    pub fn new(id: u64, peer: &str, stream: S, room: UnboundedSender<Event>, raw: bool) -> Self {
        Self {
            id,
            raw,
            room,
            stream,
            peer: peer.to_string(),
        }
    }

    /// Joins the room and serves the connection until the peer leaves,
    /// an I/O error occurs or the peer desynchronizes.
    pub async fn run(self) {
        let (outbox, mut inbox) = unbounded_channel::<Arc<Packet>>();

        if self.room.send(Event::Join { id: self.id, outbox }).is_err() {
            debug!("session #{}: room is closed", self.id);
            return;
        }

        let (mut reader, mut writer) = tokio::io::split(self.stream);
        let room = self.room.clone();
        let raw = self.raw;
        let mut decoder = Decoder::new(&self.peer);

        let read = async move {
            let mut buf = [0; 1024];
            loop {
                let size = reader.read(&mut buf).await?;
                if size == 0 {
                    return Ok::<_, Error>(());
                }

                decoder.feed(&buf[..size]);
                while let Some(packet) = decoder.next_packet()? {
                    debug!("received {} bytes packet", packet.body_len());
                    if room.send(Event::Deliver(packet)).is_err() {
                        return Ok(());
                    }
                }
            }
        };

        let write = async move {
            while let Some(packet) = inbox.recv().await {
                let bytes = if raw {
                    packet.body()
                } else {
                    packet.as_bytes()
                };
                writer.write_all(bytes).await?;
            }
            Ok::<_, Error>(())
        };

        let result = tokio::select! {
            result = read => result,
            result = write => result,
        };

        match result {
            Ok(_) => info!("{} disconnected", self.peer),
            Err(e) => error!("{} session error: {}", self.peer, e),
        }

        let _ = self.room.send(Event::Leave(self.id));
    }
}
