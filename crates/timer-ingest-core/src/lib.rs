//! Source traits and channel plumbing shared by the sample feeds

use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, Sender, TrySendError};

pub use model::Sample;

/// Samples buffered between a live feed and the timer.
pub const DEFAULT_QUEUE_DEPTH: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    Msg(String),
    #[error("sample receiver disconnected")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Producer half of a sample queue.
///
/// A bounded queue keeps a receiver of its own so a full queue can give up its
/// oldest sample instead of the newest one.
#[derive(Clone, Debug)]
pub struct SampleTx {
    tx: Sender<Sample>,
    evict: Option<Receiver<Sample>>,
    consumer: Weak<()>,
}

/// Consumer half of a sample queue. Iteration ends once every producer is gone.
#[derive(Clone, Debug)]
pub struct SampleRx {
    rx: Receiver<Sample>,
    _alive: Arc<()>,
}

impl SampleTx {
    /// True once every consumer half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.consumer.strong_count() == 0
    }

    /// Blocking send.
    pub fn send(&self, sample: Sample) -> Result<(), IngestError> {
        if self.is_closed() {
            return Err(IngestError::Closed);
        }
        self.tx.send(sample).map_err(|_| IngestError::Closed)
    }

    /// Hand a sample to the consumer without blocking the feed.
    ///
    /// When the queue is full the oldest queued sample is discarded to make
    /// room. Returns `Ok(false)` if a sample was lost on the way.
    pub fn offer(&self, sample: Sample) -> Result<bool, IngestError> {
        if self.is_closed() {
            return Err(IngestError::Closed);
        }
        let sample = match self.tx.try_send(sample) {
            Ok(()) => return Ok(true),
            Err(TrySendError::Full(s)) => s,
            Err(TrySendError::Disconnected(_)) => return Err(IngestError::Closed),
        };

        let evicted = match &self.evict {
            Some(evict) => evict.try_recv().is_ok(),
            None => false,
        };
        match self.tx.try_send(sample) {
            Ok(()) => Ok(!evicted),
            // consumer refilled nothing and we still have no room: newest is lost
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(IngestError::Closed),
        }
    }
}

impl SampleRx {
    pub fn recv(&self) -> Result<Sample, RecvError> {
        self.rx.recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Sample, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    pub fn iter(&self) -> crossbeam_channel::Iter<'_, Sample> {
        self.rx.iter()
    }

    pub fn try_iter(&self) -> crossbeam_channel::TryIter<'_, Sample> {
        self.rx.try_iter()
    }
}

/// Trait for any live sample feed
#[async_trait::async_trait]
pub trait SampleSource: Send + Sync {
    async fn run(&self, tx: SampleTx) -> Result<(), IngestError>;
}

fn pair(tx: Sender<Sample>, rx: Receiver<Sample>, evict: bool) -> (SampleTx, SampleRx) {
    let alive = Arc::new(());
    let consumer = Arc::downgrade(&alive);
    let evict = evict.then(|| rx.clone());
    (SampleTx { tx, evict, consumer }, SampleRx { rx, _alive: alive })
}

pub fn channel() -> (SampleTx, SampleRx) {
    let (tx, rx) = crossbeam_channel::unbounded();
    pair(tx, rx, false)
}

/// Queue holding at most `depth` samples (at least one) that drops the oldest when full.
pub fn bounded(depth: usize) -> (SampleTx, SampleRx) {
    let (tx, rx) = crossbeam_channel::bounded(depth.max(1));
    pair(tx, rx, true)
}
