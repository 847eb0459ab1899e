use std::fmt;
use std::time::Duration;

use agentic_core::{AbortSignal, DecodeError, Event, Frame, decode_frame};
use futures::{Stream, StreamExt as _};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::DecodeFailurePolicy;
use crate::errors::{SessionError, TransportError};
use crate::sse::SseDecoder;

/// Outcome of one [`StreamSession::next`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStep {
    Event(Event),
    /// A frame failed to decode under [`DecodeFailurePolicy::Skip`].
    Skipped(DecodeError),
    /// The stream closed normally.
    Ended,
    /// The cancellation signal fired.
    Cancelled,
}

/// A live event stream for one run.
///
/// A background task reads the response body and queues decoded SSE frames
/// in a bounded channel; a full queue pauses the reader. Dropping the session
/// stops the reader and releases the connection.
#[derive(Debug)]
pub struct StreamSession {
    frames: mpsc::Receiver<Frame>,
    errors: mpsc::Receiver<TransportError>,
    pending_error: Option<TransportError>,
    policy: DecodeFailurePolicy,
    reader: JoinHandle<()>,
}

impl StreamSession {
    /// Spawns the reader task over a body byte stream.
    pub(crate) fn spawn<S, B, E>(
        body: S,
        buffer_size: usize,
        read_timeout: Duration,
        policy: DecodeFailurePolicy,
    ) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let (frame_tx, frames) = mpsc::channel(buffer_size);
        let (error_tx, errors) = mpsc::channel(1);
        let reader = tokio::spawn(read_frames(body, frame_tx, error_tx, read_timeout));
        Self {
            frames,
            errors,
            pending_error: None,
            policy,
            reader,
        }
    }

    /// Waits for the next event, stream end, transport failure or cancellation.
    ///
    /// Frames queued before a transport failure are delivered before the
    /// failure itself.
    pub async fn next(&mut self, cancel: &mut AbortSignal) -> Result<SessionStep, SessionError> {
        if self.pending_error.is_some() {
            return self.drain_after_error();
        }
        tokio::select! {
            _ = cancel.aborted() => {
                debug!("stream session cancelled");
                Ok(SessionStep::Cancelled)
            }
            frame = self.frames.recv() => match frame {
                Some(frame) => self.on_frame(frame),
                None => match self.errors.try_recv() {
                    Ok(err) => Err(err.into()),
                    Err(_) => Ok(SessionStep::Ended),
                },
            },
            Some(err) = self.errors.recv() => {
                warn!(error = %err, "stream transport failed");
                self.pending_error = Some(err);
                self.drain_after_error()
            }
        }
    }

    fn drain_after_error(&mut self) -> Result<SessionStep, SessionError> {
        match self.frames.try_recv() {
            Ok(frame) => self.on_frame(frame),
            Err(_) => match self.pending_error.take() {
                Some(err) => Err(err.into()),
                None => Ok(SessionStep::Ended),
            },
        }
    }

    fn on_frame(&self, frame: Frame) -> Result<SessionStep, SessionError> {
        match decode_frame(&frame) {
            Ok(event) => {
                debug!(event_type = %event.event_type(), "decoded stream event");
                Ok(SessionStep::Event(event))
            }
            Err(err) => match self.policy {
                DecodeFailurePolicy::Terminate => Err(SessionError::EventProcessing(err)),
                DecodeFailurePolicy::Skip => {
                    warn!(error = %err, "skipping undecodable frame");
                    Ok(SessionStep::Skipped(err))
                }
            },
        }
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_frames<S, B, E>(
    body: S,
    frames: mpsc::Sender<Frame>,
    errors: mpsc::Sender<TransportError>,
    read_timeout: Duration,
) where
    S: Stream<Item = Result<B, E>> + Send,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    let mut body = Box::pin(body);
    let mut decoder = SseDecoder::default();
    loop {
        let chunk = match tokio::time::timeout(read_timeout, body.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => {
                let _ = errors.send(TransportError::Read(e.to_string())).await;
                return;
            }
            Ok(None) => break,
            Err(_) => {
                let _ = errors.send(TransportError::ReadTimeout(read_timeout)).await;
                return;
            }
        };
        for frame in decoder.push_chunk(chunk.as_ref()) {
            if frames.send(frame).await.is_err() {
                return;
            }
        }
    }
    if let Some(frame) = decoder.finish() {
        let _ = frames.send(frame).await;
    }
    debug!("stream body ended");
}
