//! JSON Lines detection recordings, one frame per line.
//!
//! ```text
//! {"frame_index": 1, "width": 1280, "height": 720,
//!  "detections": [{"bbox": [100, 40, 180, 120], "class": "car", "confidence": 0.91}]}
//! ```
//!
//! Boxes are in pixels when `width` and `height` are present, otherwise they are
//! taken as already normalized.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::integration::builder::DetectionBuilder;
use crate::integration::detector::{DetectionSource, Frame};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// `[x1, y1, x2, y2]`
    pub bbox: [f64; 4],
    /// Detector class name, e.g. `"motorcycle"`
    pub class: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    pub frame_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

impl RawFrame {
    /// Convert to a `Frame`, counting detections that cannot be mapped.
    pub fn into_frame(self) -> Frame {
        let mut frame = Frame::new(self.frame_index, Vec::with_capacity(self.detections.len()));
        let frame_size = self.width.zip(self.height);

        for (idx, raw) in self.detections.into_iter().enumerate() {
            let [x1, y1, x2, y2] = raw.bbox;
            let mut builder = DetectionBuilder::new()
                .tlbr(x1, y1, x2, y2)
                .class_name(raw.class)
                .confidence(raw.confidence)
                .frame(self.frame_index);
            if let Some((w, h)) = frame_size {
                builder = builder.pixels(w, h);
            }
            match builder.build() {
                Ok(det) => frame.detections.push(det),
                Err(reason) => {
                    debug!("frame {}: skipping raw detection {idx}: {reason}", self.frame_index);
                    frame.rejected += 1;
                }
            }
        }
        frame
    }
}

/// Reads `Frame`s from a JSON Lines stream.
pub struct JsonLinesSource<R> {
    reader: R,
    path: PathBuf,
    line: usize,
    buf: String,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    /// `name` is only used in error messages.
    pub fn new(reader: R, name: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: name.into(),
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> DetectionSource for JsonLinesSource<R> {
    type Error = Error;

    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_line(&mut self.buf)
                .map_err(|source| Error::Io {
                    path: self.path.clone(),
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line += 1;

            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            let raw: RawFrame = serde_json::from_str(text).map_err(|source| Error::SourceParse {
                path: self.path.clone(),
                line: self.line,
                source,
            })?;
            return Ok(Some(raw.into_frame()));
        }
    }
}
