// ── Reactive snapshot stream ──
//
// Subscription type for consuming snapshot replacements from the Poller.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures_util::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::snapshot::Snapshot;

/// A subscription to the latest snapshot.
///
/// Provides both point-in-time access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct SnapshotStream {
    current: Option<Arc<Snapshot>>,
    receiver: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Option<Arc<Snapshot>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation or at the last `changed()`.
    pub fn current(&self) -> Option<&Arc<Snapshot>> {
        self.current.as_ref()
    }

    /// Wait for the next snapshot.
    /// Returns `None` once the Poller has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        loop {
            self.receiver.changed().await.ok()?;
            let next = self.receiver.borrow_and_update().clone();
            if let Some(snapshot) = next {
                self.current = Some(Arc::clone(&snapshot));
                return Some(snapshot);
            }
        }
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The first item is the snapshot current at conversion time, if any.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`, skipping the empty
/// state before the first successful poll.
pub struct SnapshotWatchStream {
    inner: WatchStream<Option<Arc<Snapshot>>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Some(snapshot)) => return Poll::Ready(Some(snapshot)),
                Some(None) => {}
                None => return Poll::Ready(None),
            }
        }
    }
}
