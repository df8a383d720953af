use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use crate::drivers::assembler::AssembledSweep;
use crate::drivers::source::SourceEnd;
use crate::drivers::SweepError;
/// Default number of completed sweeps the queue holds before dropping the oldest.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;
/// Item handed from the producer thread to the consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum SweepEvent {
    Sweep(AssembledSweep),
    /// Last event of a stream; nothing follows it.
    End(SourceEnd),
}
/// Producer half. Never blocks: a full queue loses its oldest entry instead.
pub struct SweepSender {
    tx: Sender<SweepEvent>,
    evict: Receiver<SweepEvent>,
    dropped: Arc<AtomicU64>,
}
/// Consumer half, read with non-blocking `try_next` only.
pub struct SweepReceiver {
    rx: Receiver<SweepEvent>,
    dropped: Arc<AtomicU64>,
}
/// Creates the hand-off queue. `depth == 0` means unbounded.
pub fn handoff(depth: usize) -> (SweepSender, SweepReceiver) {
    let (tx, rx) = if depth == 0 {
        crossbeam_channel::unbounded()
    } else {
        crossbeam_channel::bounded(depth)
    };
    let dropped = Arc::new(AtomicU64::new(0));
    (
        SweepSender {
            tx,
            evict: rx.clone(),
            dropped: dropped.clone(),
        },
        SweepReceiver { rx, dropped },
    )
}
impl SweepSender {
    /// Queues `event`, evicting the oldest queued sweep while the queue is full.
    ///
    /// The sender holds a receiver of its own, so the channel never reports a
    /// disconnect here; the producer is ended through the stop flag instead.
    pub fn send(&self, mut event: SweepEvent) {
        loop {
            match self.tx.try_send(event) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
                Err(TrySendError::Full(returned)) => {
                    if let Ok(SweepEvent::Sweep(old)) = self.evict.try_recv() {
                        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        log::debug!("queue full, dropped sweep {} ({total} so far)", old.timestamp);
                    }
                    event = returned;
                }
            }
        }
    }
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
impl SweepReceiver {
    /// Next queued event, `Ok(None)` if the queue is currently empty.
    pub fn try_next(&self) -> Result<Option<SweepEvent>, SweepError> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SweepError::QueueDisconnected),
        }
    }
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
    /// Events queued right now.
    pub fn len(&self) -> usize {
        self.rx.len()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn sweep(ts: &str) -> SweepEvent {
        SweepEvent::Sweep(AssembledSweep {
            timestamp: ts.into(),
            freqs: vec![1.0],
            power: vec![0.0],
        })
    }
    fn timestamp(event: SweepEvent) -> String {
        match event {
            SweepEvent::Sweep(s) => s.timestamp,
            SweepEvent::End(end) => end.to_string(),
        }
    }
    #[test]
    fn full_queue_drops_oldest() {
        let (tx, rx) = handoff(2);
        tx.send(sweep("a"));
        tx.send(sweep("b"));
        tx.send(sweep("c"));
        tx.send(SweepEvent::End(SourceEnd::Finished));
        assert_eq!(rx.dropped(), 2);
        assert_eq!(timestamp(rx.try_next().unwrap().unwrap()), "c");
        assert_eq!(
            rx.try_next().unwrap(),
            Some(SweepEvent::End(SourceEnd::Finished))
        );
        assert_eq!(rx.try_next().unwrap(), None);
    }
    #[test]
    fn unbounded_queue_keeps_everything() {
        let (tx, rx) = handoff(0);
        for i in 0..1000 {
            tx.send(sweep(&i.to_string()));
        }
        assert_eq!(rx.len(), 1000);
        assert_eq!(tx.dropped(), 0);
    }
    #[test]
    fn dropped_sender_disconnects() {
        let (tx, rx) = handoff(4);
        tx.send(sweep("a"));
        drop(tx);
        assert!(rx.try_next().unwrap().is_some());
        assert!(matches!(rx.try_next(), Err(SweepError::QueueDisconnected)));
    }
}
