//! Frame source: reads the detector's JSON-lines stream and hands frames to
//! the render loop.
//!
//! A live stream (stdin) keeps only the most recent frame: if the loop is
//! still busy when newer frames arrive, the older ones are overwritten and
//! never processed. A recorded file is read in lockstep with the loop, one
//! frame in flight at a time, so every frame is processed exactly once.
//!
//! Stdin is read on a dedicated OS thread. A blocking read there cannot hold
//! up runtime shutdown after Ctrl-C.

use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};

use bluff_core::detection::parse_line;
use bluff_core::Detection;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot, watch};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("frame source unavailable: {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame source read failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to spawn frame reader thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// One tick's worth of detector output.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// 1-based position in the stream; gaps seen by the loop are dropped frames.
    pub seq: u64,
    pub detection: Option<Detection>,
}

/// An opened frame source.
pub enum Input {
    Stdin,
    File(tokio::fs::File),
}

/// Resolves to the number of frames published once the reader stops.
pub type ReaderDone = oneshot::Receiver<Result<u64, SourceError>>;

/// Open the frame source: a file, or stdin when `input` is `None`.
///
/// Failure here is terminal; the caller does not retry.
pub async fn open(input: Option<&Path>) -> Result<Input, SourceError> {
    match input {
        None => {
            tracing::info!("reading frames from stdin");
            Ok(Input::Stdin)
        }
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| SourceError::Unavailable {
                    path: path.to_path_buf(),
                    source,
                })?;
            tracing::info!(path = %path.display(), "reading frames from file");
            Ok(Input::File(file))
        }
    }
}

/// Start reading `input`: latest-wins for stdin, lockstep for files.
pub fn spawn(input: Input) -> Result<(FrameFeed, ReaderDone), SourceError> {
    match input {
        Input::Stdin => spawn_live_reader(std::io::stdin()),
        Input::File(file) => Ok(spawn_recorded_reader(BufReader::new(file))),
    }
}

/// Frames as seen by the render loop.
pub enum FrameFeed {
    /// Newest frame only; older unseen frames are lost.
    Latest {
        rx: watch::Receiver<Option<Frame>>,
        seen: u64,
    },
    /// Every frame, in order.
    Queued(mpsc::Receiver<Frame>),
}

/// Result of a non-blocking look at the feed.
#[derive(Debug, PartialEq)]
pub enum Poll {
    Frame(Frame),
    Empty,
    Closed,
}

impl FrameFeed {
    pub fn latest(rx: watch::Receiver<Option<Frame>>) -> Self {
        Self::Latest { rx, seen: 0 }
    }

    pub fn queued(rx: mpsc::Receiver<Frame>) -> Self {
        Self::Queued(rx)
    }

    /// Wait for the next frame; `None` once the source has ended.
    pub async fn next(&mut self) -> Option<Frame> {
        match self {
            Self::Latest { rx, seen } => loop {
                if let Some(frame) = take_unseen(rx, seen) {
                    return Some(frame);
                }
                rx.changed().await.ok()?;
            },
            Self::Queued(rx) => rx.recv().await,
        }
    }

    /// Take a frame if one is ready, without waiting.
    pub fn poll(&mut self) -> Poll {
        match self {
            Self::Latest { rx, seen } => {
                if let Some(frame) = take_unseen(rx, seen) {
                    return Poll::Frame(frame);
                }
                if rx.has_changed().is_err() {
                    // Closed; a last frame may have landed just before the close.
                    return match take_unseen(rx, seen) {
                        Some(frame) => Poll::Frame(frame),
                        None => Poll::Closed,
                    };
                }
                Poll::Empty
            }
            Self::Queued(rx) => match rx.try_recv() {
                Ok(frame) => Poll::Frame(frame),
                Err(mpsc::error::TryRecvError::Empty) => Poll::Empty,
                Err(mpsc::error::TryRecvError::Disconnected) => Poll::Closed,
            },
        }
    }
}

fn take_unseen(rx: &mut watch::Receiver<Option<Frame>>, seen: &mut u64) -> Option<Frame> {
    let frame = rx.borrow_and_update().clone()?;
    if frame.seq <= *seen {
        return None;
    }
    *seen = frame.seq;
    Some(frame)
}

/// Line parsing shared by both readers: skips malformed lines, numbers frames.
#[derive(Default)]
struct Framer {
    line_no: usize,
    seq: u64,
}

impl Framer {
    fn frame(&mut self, line: &str) -> Option<Frame> {
        self.line_no += 1;
        match parse_line(line, self.line_no) {
            Ok(detection) => {
                self.seq += 1;
                Some(Frame {
                    seq: self.seq,
                    detection,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed frame");
                None
            }
        }
    }

    fn finish(&self) -> u64 {
        tracing::debug!(frames = self.seq, lines = self.line_no, "frame stream ended");
        self.seq
    }
}

/// Read a live stream on its own OS thread, publishing latest-wins.
pub fn spawn_live_reader<R>(reader: R) -> Result<(FrameFeed, ReaderDone), SourceError>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = watch::channel(None);
    let (done_tx, done_rx) = oneshot::channel();

    std::thread::Builder::new()
        .name("bluff-frame-reader".into())
        .spawn(move || {
            let mut framer = Framer::default();
            let mut result = Ok(());
            for line in std::io::BufReader::new(reader).lines() {
                match line {
                    Ok(line) => {
                        if let Some(frame) = framer.frame(&line) {
                            tx.send_replace(Some(frame));
                        }
                    }
                    Err(e) => {
                        result = Err(SourceError::Read(e));
                        break;
                    }
                }
            }
            // Close the feed before reporting so the loop sees the end first.
            drop(tx);
            let _ = done_tx.send(result.map(|()| framer.finish()));
        })
        .map_err(SourceError::Spawn)?;

    Ok((FrameFeed::latest(rx), done_rx))
}

/// Read a recorded stream on a task; each send waits until the loop has
/// taken the previous frame.
pub fn spawn_recorded_reader<R>(reader: R) -> (FrameFeed, ReaderDone)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let result = read_recorded(reader, tx).await;
        let _ = done_tx.send(result);
    });

    (FrameFeed::queued(rx), done_rx)
}

async fn read_recorded<R>(reader: R, tx: mpsc::Sender<Frame>) -> Result<u64, SourceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut framer = Framer::default();

    while let Some(line) = lines.next_line().await.map_err(SourceError::Read)? {
        if let Some(frame) = framer.frame(&line) {
            if tx.send(frame).await.is_err() {
                tracing::debug!("render loop gone; stopping reader");
                break;
            }
        }
    }

    Ok(framer.finish())
}
