//! Trait for upstream detection adapters.

use std::convert::Infallible;

use crate::tracker::Detection;

/// One frame's worth of detections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub frame_index: u64,
    pub detections: Vec<Detection>,
    /// Raw detections the adapter could not convert (unknown class, bad box)
    pub rejected: usize,
}

impl Frame {
    pub fn new(frame_index: u64, detections: Vec<Detection>) -> Self {
        Self {
            frame_index,
            detections,
            rejected: 0,
        }
    }
}

/// Trait for anything that produces detection frames in order.
///
/// Implement this trait to connect a detector, a recording, or a message queue
/// to a `CountingPipeline`.
///
/// # Example
///
/// ```ignore
/// use linecount_rs::integration::{DetectionSource, Frame};
///
/// struct MyDetector {
///     // Your model and video reader here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
///         // Decode, run inference, map classes
///         Ok(None)
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Produce the next frame, or `None` at the end of the stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error>;
}

/// `DetectionSource` over an in-memory sequence of frames.
#[derive(Debug, Clone)]
pub struct FrameIter<I> {
    inner: I,
}

impl<I: Iterator<Item = Frame>> DetectionSource for FrameIter<I> {
    type Error = Infallible;

    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
        Ok(self.inner.next())
    }
}

/// Wrap already-built frames as a `DetectionSource`.
pub fn frames<I: IntoIterator<Item = Frame>>(frames: I) -> FrameIter<I::IntoIter> {
    FrameIter {
        inner: frames.into_iter(),
    }
}
