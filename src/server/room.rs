//! Fan-out of published packets to every connected session.
use log::{debug, trace};

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, atomic::Ordering},
};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::server::{Stats, packet::Packet};

/// Number of packets replayed to late joiners
const HISTORY: usize = 1;

/// Outbound queue of one session
pub(crate) type Outbox = UnboundedSender<Arc<Packet>>;

/// Requests handled by the [Room]
#[derive(Debug)]
pub(crate) enum Event {
    Join { id: u64, outbox: Outbox },
    Leave(u64),
    Deliver(Packet),
}

#[derive(Debug)]
pub(crate) struct Room {
    sessions: HashMap<u64, Outbox>,
    recent: VecDeque<Arc<Packet>>,
    stats: Arc<Stats>,
}

impl Room {
    pub fn new(stats: Arc<Stats>) -> Self {
        Self {
            stats,
            sessions: HashMap::new(),
            recent: VecDeque::with_capacity(HISTORY),
        }
    }

    /// Registers a session and replays the retained history to it
    pub fn join(&mut self, id: u64, outbox: Outbox) {
        for packet in self.recent.iter() {
            let _ = outbox.send(packet.clone());
        }
        self.sessions.insert(id, outbox);
        self.stats.sessions.store(self.sessions.len(), Ordering::Relaxed);
        debug!("session #{} joined ({} live)", id, self.sessions.len());
    }

    pub fn leave(&mut self, id: u64) {
        if self.sessions.remove(&id).is_some() {
            self.stats.sessions.store(self.sessions.len(), Ordering::Relaxed);
            debug!("session #{} left ({} live)", id, self.sessions.len());
        }
    }

    /// Retains `packet` and queues it for every session.
    /// Sessions whose queue is closed are dropped.
    pub fn deliver(&mut self, packet: Packet) {
        let packet = Arc::new(packet);

        self.recent.push_back(packet.clone());
        while self.recent.len() > HISTORY {
            self.recent.pop_front();
        }

        self.sessions
            .retain(|_, outbox| outbox.send(packet.clone()).is_ok());

        self.stats.sessions.store(self.sessions.len(), Ordering::Relaxed);
        self.stats.delivered.fetch_add(1, Ordering::Relaxed);
        trace!(
            "delivered {} bytes to {} session(s)",
            packet.body_len(),
            self.sessions.len()
        );
    }

    /// Serves [Event]s until every sender is gone
    pub async fn run(mut self, mut rx: UnboundedReceiver<Event>) {
        while let Some(event) = rx.recv().await {
            match event {
                Event::Join { id, outbox } => self.join(id, outbox),
                Event::Leave(id) => self.leave(id),
                Event::Deliver(packet) => self.deliver(packet),
            }
        }
        debug!("room closed");
    }
}
