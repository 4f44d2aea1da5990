//! Per-fork queues.
//!
//! Every fork owns one unbounded single-producer/single-consumer queue. The
//! forking walk is the only producer; it pushes each source element and
//! finally one [`Message::EndOfStream`]. Queues never apply backpressure, so a
//! slow fork cannot stall delivery to the others, at the cost of buffering
//! whatever that fork has not consumed yet.

use crate::{Characteristics, Error, Result, Spliterator};
use crossbeam_channel::{Receiver, Sender, unbounded};

/// What travels through a fork queue.
#[derive(Debug)]
pub(crate) enum Message<T> {
    Element(T),
    EndOfStream,
}

pub(crate) fn fork_queue<T>() -> (Sender<Message<T>>, ForkSource<T>) {
    let (tx, rx) = unbounded();
    (tx, ForkSource::new(rx))
}

/// The source handed to a fork's transform.
///
/// Reads block until the forking walk delivers the next element or the end of
/// the stream. It yields exactly the elements of the original source, in
/// order, and cannot be split.
///
/// `ForkSource` is also an [`Iterator`], so transforms can use ordinary
/// iterator combinators:
///
/// ```
/// use streamfork::{IterSource, StreamForker};
///
/// let mut forker = StreamForker::new(IterSource::new(1..=4_u32));
/// forker.fork("sum", |src| src.sum::<u32>()).unwrap();
/// let results = forker.get_results().unwrap();
/// assert_eq!(results.get::<u32>(&"sum").unwrap(), 10);
/// ```
#[derive(Debug)]
pub struct ForkSource<T> {
    rx: Receiver<Message<T>>,
    lookahead: Option<T>,
    finished: bool,
}

impl<T> ForkSource<T> {
    const fn new(rx: Receiver<Message<T>>) -> Self {
        Self {
            rx,
            lookahead: None,
            finished: false,
        }
    }

    /// Blocks for the next element. `None` marks the end of the stream.
    fn recv(&mut self) -> Option<T> {
        match self.rx.recv() {
            Ok(Message::Element(item)) => Some(item),
            // A disconnected queue means the producer is gone; the walk always
            // sends the sentinel first, so treat both as the end.
            Ok(Message::EndOfStream) | Err(_) => {
                self.finished = true;
                None
            }
        }
    }
}

impl<T> Spliterator for ForkSource<T> {
    type Item = T;

    fn try_advance(&mut self) -> Result<(T, bool)> {
        let item = match self.lookahead.take() {
            Some(item) => item,
            None if self.finished => return Err(Error::Exhausted),
            None => self.recv().ok_or(Error::Exhausted)?,
        };

        if self.finished {
            return Ok((item, false));
        }
        self.lookahead = self.recv();
        Ok((item, self.lookahead.is_some()))
    }

    fn try_split(&mut self) -> Option<Self> {
        None
    }

    fn estimate_size(&self) -> usize {
        0
    }

    fn characteristics(&self) -> Characteristics {
        Characteristics::ORDERED
    }
}

impl<T> Iterator for ForkSource<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(item) = self.lookahead.take() {
            return Some(item);
        }
        if self.finished {
            return None;
        }
        self.recv()
    }
}

/// Pushes source elements to every fork queue and terminates each queue with
/// exactly one [`Message::EndOfStream`].
///
/// The sentinel is sent by [`Self::finish`] or, failing that, on drop, so
/// every consumer is released even when the walk errors or panics.
pub(crate) struct FanOut<T> {
    queues: Vec<Sender<Message<T>>>,
    #[cfg(any(test, feature = "tracing"))]
    delivered: usize,
    finished: bool,
}

impl<T> FanOut<T> {
    pub(crate) const fn new(queues: Vec<Sender<Message<T>>>) -> Self {
        Self {
            queues,
            #[cfg(any(test, feature = "tracing"))]
            delivered: 0,
            finished: false,
        }
    }

    /// Number of source elements pushed so far.
    #[cfg(any(test, feature = "tracing"))]
    pub(crate) const fn delivered(&self) -> usize {
        self.delivered
    }

    pub(crate) fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        for queue in &self.queues {
            Self::send(queue, Message::EndOfStream);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(
            queues = self.queues.len(),
            delivered = self.delivered,
            "sent end of stream"
        );
    }

    fn send(queue: &Sender<Message<T>>, message: Message<T>) {
        // Only fails once the consumer dropped its source; it no longer cares.
        if let Err(_e) = queue.send(message) {
            #[cfg(feature = "tracing")]
            tracing::trace!("fork consumer already gone");
        }
    }
}

impl<T: Clone> FanOut<T> {
    pub(crate) fn push(&mut self, item: T) {
        if let Some((last, rest)) = self.queues.split_last() {
            for queue in rest {
                Self::send(queue, Message::Element(item.clone()));
            }
            Self::send(last, Message::Element(item));
        }
        #[cfg(any(test, feature = "tracing"))]
        {
            self.delivered += 1;
        }
    }
}

impl<T> Drop for FanOut<T> {
    fn drop(&mut self) {
        self.finish();
    }
}
