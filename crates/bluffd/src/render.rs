use std::io::{self, Write};
use std::thread::JoinHandle;

use bluff_core::Overlay;
use tokio::sync::mpsc;

/// Receives one draw call per tick. `None` clears the overlay.
pub trait OverlaySink {
    fn draw(&mut self, overlay: Option<&Overlay>) -> io::Result<()>;
}

/// Writes each tick as one JSON line (`null` for a cleared overlay).
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OverlaySink for JsonLinesSink<W> {
    fn draw(&mut self, overlay: Option<&Overlay>) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, &overlay)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }
}

/// Default number of overlays queued for the writer thread.
pub const DEFAULT_WRITE_QUEUE: usize = 64;

/// JSON-lines output on a dedicated writer thread.
///
/// `draw` never blocks: when the consumer falls behind and the queue is full,
/// that tick's overlay is dropped and counted.
pub struct BackgroundSink<W> {
    tx: mpsc::Sender<Option<Overlay>>,
    writer: JoinHandle<io::Result<W>>,
    dropped: u64,
}

impl<W: Write + Send + 'static> BackgroundSink<W> {
    pub fn spawn(out: W, capacity: usize) -> io::Result<Self> {
        let (tx, mut rx) = mpsc::channel::<Option<Overlay>>(capacity.max(1));

        let writer = std::thread::Builder::new()
            .name("bluff-overlay-writer".into())
            .spawn(move || {
                tracing::debug!("overlay writer started");
                let mut sink = JsonLinesSink::new(out);
                while let Some(overlay) = rx.blocking_recv() {
                    sink.draw(overlay.as_ref())?;
                }
                tracing::debug!("overlay writer exiting");
                Ok(sink.into_inner())
            })?;

        Ok(Self {
            tx,
            writer,
            dropped: 0,
        })
    }

    /// Overlays discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Write out everything queued, then stop the writer thread.
    pub fn finish(self) -> io::Result<W> {
        let Self {
            tx,
            writer,
            dropped,
        } = self;
        drop(tx);
        if dropped > 0 {
            tracing::warn!(dropped, "overlays dropped by a slow consumer");
        }
        writer
            .join()
            .map_err(|_| io::Error::other("overlay writer thread panicked"))?
    }
}

impl<W> OverlaySink for BackgroundSink<W> {
    fn draw(&mut self, overlay: Option<&Overlay>) -> io::Result<()> {
        match self.tx.try_send(overlay.cloned()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped += 1;
                tracing::debug!(dropped = self.dropped, "overlay queue full");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "overlay writer stopped",
            )),
        }
    }
}
