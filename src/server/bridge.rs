//! Producer bridge: drains the producer FIFO from its own thread and
//! hands framed packets over to the room.
use log::{debug, info, warn};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::server::{
    Message,
    packet::{MAX_BODY_LEN, Packet},
    room::Event,
};

/// Runs until [Message::Shutdown] is received, every producer is gone,
/// or the room has closed. Returns the number of relayed packets.
pub(crate) fn run(mut fifo: UnboundedReceiver<Message>, room: UnboundedSender<Event>) -> usize {
    let mut relayed = 0;

    while let Some(msg) = fifo.blocking_recv() {
        match msg {
            Message::Frame(frame) => {
                if frame.is_empty() {
                    debug!("bridge: dropping empty frame");
                    continue;
                }
                if frame.len() > MAX_BODY_LEN {
                    warn!(
                        "bridge: {} bytes frame clamped to {} bytes",
                        frame.len(),
                        MAX_BODY_LEN
                    );
                }

                if room.send(Event::Deliver(Packet::encode(&frame))).is_err() {
                    debug!("bridge: room is closed");
                    break;
                }
                relayed += 1;
            },
            Message::Shutdown => break,
        }
    }

    info!("bridge: end of stream ({} packets relayed)", relayed);
    relayed
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn relays_until_shutdown() {
        let (fifo_tx, fifo_rx) = unbounded_channel();
        let (room_tx, mut room_rx) = unbounded_channel();

        fifo_tx.send(Message::Frame(vec![0xD3, 0x00, 0x00])).unwrap();
        fifo_tx.send(Message::Frame(vec![])).unwrap();
        fifo_tx.send(Message::Frame(vec![0x11; 1500])).unwrap();
        fifo_tx.send(Message::Shutdown).unwrap();
        fifo_tx.send(Message::Frame(vec![0x22])).unwrap();

        let handle = std::thread::spawn(move || run(fifo_rx, room_tx));
        assert_eq!(handle.join().unwrap(), 2);

        match room_rx.try_recv() {
            Ok(Event::Deliver(packet)) => assert_eq!(packet.as_bytes(), b"GS0003\xD3\x00\x00"),
            other => panic!("unexpected event: {:?}", other),
        }
        match room_rx.try_recv() {
            Ok(Event::Deliver(packet)) => assert_eq!(packet.body_len(), MAX_BODY_LEN),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(room_rx.try_recv().is_err());
    }

    #[test]
    fn stops_when_producers_are_gone() {
        let (fifo_tx, fifo_rx) = unbounded_channel();
        let (room_tx, _room_rx) = unbounded_channel();

        fifo_tx.send(Message::Frame(vec![1, 2, 3])).unwrap();
        drop(fifo_tx);

        assert_eq!(run(fifo_rx, room_tx), 1);
    }
}
