//! Append-only per-frame event log and the snapshot trigger.
//!
//! Every processed frame produces exactly one CSV row, including frames
//! without a face, so row count always equals frame count.

use crate::types::{BoundingBox, Identity, SmoothedDecision};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// CSV header, in column order.
pub const EVENT_LOG_HEADER: [&str; 8] = ["ts", "frame_idx", "identity", "distance", "x", "y", "w", "h"];

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("event log write failed at frame {frame_index}: {source}")]
    Write {
        frame_index: u64,
        #[source]
        source: csv::Error,
    },
    #[error("event log header write failed: {0}")]
    Header(#[source] csv::Error),
    #[error("event log flush failed: {0}")]
    Flush(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot crop is empty: {bbox:?} within {frame_width}x{frame_height} frame")]
    EmptyCrop {
        bbox: BoundingBox,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("failed to write snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode snapshot {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

/// One row of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Seconds since the Unix epoch.
    #[serde(rename = "ts")]
    pub timestamp: f64,
    #[serde(rename = "frame_idx")]
    pub frame_index: u64,
    pub identity: Identity,
    pub distance: Option<f32>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub w: Option<i32>,
    pub h: Option<i32>,
}

impl EventRecord {
    pub fn new(frame_index: u64, timestamp: f64, decision: &SmoothedDecision) -> Self {
        let bbox = decision.raw_bbox;
        Self {
            timestamp,
            frame_index,
            identity: decision.identity.clone(),
            distance: decision.raw_distance,
            x: bbox.map(|b| b.x),
            y: bbox.map(|b| b.y),
            w: bbox.map(|b| b.width),
            h: bbox.map(|b| b.height),
        }
    }
}

/// Writes a face-region snapshot for a frame.
pub trait SnapshotSink {
    /// Frame representation the sink can crop from.
    type Frame: ?Sized;

    /// Crop `bbox` from `frame` and persist it, returning the written path.
    fn write_snapshot(
        &mut self,
        frame: &Self::Frame,
        bbox: BoundingBox,
        frame_index: u64,
        timestamp: f64,
    ) -> Result<PathBuf, SnapshotError>;
}

/// Snapshot file name for a frame: `unknown_{whole seconds}_{frame index}.jpg`.
pub fn snapshot_file_name(timestamp: f64, frame_index: u64) -> String {
    format!("unknown_{}_{frame_index}.jpg", timestamp.floor() as i64)
}

/// Box to snapshot for this frame, if any.
///
/// Fires on every frame whose smoothed identity is unknown and that has a
/// face box; consecutive unknown frames each get their own snapshot.
pub fn should_snapshot(decision: &SmoothedDecision) -> Option<BoundingBox> {
    match (&decision.identity, decision.raw_bbox) {
        (Identity::Unknown, Some(bbox)) => Some(bbox),
        _ => None,
    }
}

/// Append-only CSV event log.
///
/// Each record is flushed as soon as it is written; the underlying
/// `csv::Writer` also flushes when dropped.
pub struct EventSink<W: io::Write> {
    writer: csv::Writer<W>,
    records: u64,
}

impl<W: io::Write> EventSink<W> {
    /// Wrap `inner` and write the header row.
    pub fn new(inner: W) -> Result<Self, EventLogError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer
            .write_record(EVENT_LOG_HEADER)
            .map_err(EventLogError::Header)?;
        writer.flush()?;
        Ok(Self { writer, records: 0 })
    }

    /// Append one row for the frame and return it.
    pub fn record(
        &mut self,
        frame_index: u64,
        timestamp: f64,
        decision: &SmoothedDecision,
    ) -> Result<EventRecord, EventLogError> {
        let record = EventRecord::new(frame_index, timestamp, decision);
        self.writer
            .serialize(&record)
            .map_err(|source| EventLogError::Write {
                frame_index,
                source,
            })?;
        self.writer.flush()?;
        self.records += 1;
        Ok(record)
    }

    /// Number of rows written so far (excluding the header).
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> Result<W, EventLogError> {
        self.writer
            .into_inner()
            .map_err(|e| EventLogError::Flush(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawDecision;

    fn smoothed(identity: &str, raw: RawDecision) -> SmoothedDecision {
        SmoothedDecision::new(Identity::from(identity), &raw)
    }

    fn sink_output(sink: EventSink<Vec<u8>>) -> String {
        String::from_utf8(sink.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_header_written_on_open() {
        let sink = EventSink::new(Vec::new()).unwrap();
        assert_eq!(sink_output(sink), "ts,frame_idx,identity,distance,x,y,w,h\n");
    }

    #[test]
    fn test_no_face_row_has_empty_cells() {
        let mut sink = EventSink::new(Vec::new()).unwrap();
        sink.record(0, 12.5, &smoothed("no_face", RawDecision::no_face()))
            .unwrap();
        let out = sink_output(sink);
        assert_eq!(out.lines().nth(1), Some("12.5,0,no_face,,,,,"));
    }

    #[test]
    fn test_face_row_has_box_and_distance() {
        let mut sink = EventSink::new(Vec::new()).unwrap();
        let raw = RawDecision::face(
            Identity::Known("alice".into()),
            0.25,
            BoundingBox::new(10, 20, 30, 40),
        );
        let rec = sink.record(3, 100.5, &smoothed("alice", raw)).unwrap();
        assert_eq!(rec.x, Some(10));
        assert_eq!(rec.h, Some(40));

        let out = sink_output(sink);
        assert_eq!(out.lines().nth(1), Some("100.5,3,alice,0.25,10,20,30,40"));
    }

    #[test]
    fn test_zero_coordinates_are_written() {
        let mut sink = EventSink::new(Vec::new()).unwrap();
        let raw = RawDecision::face(Identity::Unknown, 0.9, BoundingBox::new(0, 0, 8, 8));
        sink.record(1, 1.5, &smoothed("unknown", raw)).unwrap();
        let out = sink_output(sink);
        assert_eq!(out.lines().nth(1), Some("1.5,1,unknown,0.9,0,0,8,8"));
    }

    #[test]
    fn test_one_row_per_frame() {
        let mut sink = EventSink::new(Vec::new()).unwrap();
        for i in 0..7u64 {
            let raw = if i % 2 == 0 {
                RawDecision::no_face()
            } else {
                RawDecision::face(Identity::Unknown, 1.0, BoundingBox::new(1, 1, 1, 1))
            };
            let label = raw.identity().to_string();
            sink.record(i, i as f64, &smoothed(&label, raw)).unwrap();
        }
        assert_eq!(sink.records_written(), 7);
        assert_eq!(sink_output(sink).lines().count(), 8);
    }

    #[test]
    fn test_records_read_back() {
        let mut sink = EventSink::new(Vec::new()).unwrap();
        let raw = RawDecision::face(Identity::Known("bob".into()), 0.3, BoundingBox::new(1, 2, 3, 4));
        let written = sink.record(9, 5.0, &smoothed("bob", raw)).unwrap();
        let bytes = sink.finish().unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let rows: Vec<EventRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, vec![written]);
    }

    #[test]
    fn test_should_snapshot_only_unknown_with_box() {
        let bbox = BoundingBox::new(1, 1, 5, 5);
        let unknown = RawDecision::face(Identity::Unknown, 0.9, bbox);
        let known = RawDecision::face(Identity::Known("alice".into()), 0.1, bbox);

        assert_eq!(should_snapshot(&smoothed("unknown", unknown.clone())), Some(bbox));
        assert_eq!(should_snapshot(&smoothed("alice", unknown)), None);
        // Smoothed unknown while the current raw frame has a known face still snapshots.
        assert_eq!(should_snapshot(&smoothed("unknown", known)), Some(bbox));
        // Smoothed unknown with no face this frame has nothing to crop.
        assert_eq!(should_snapshot(&smoothed("unknown", RawDecision::no_face())), None);
    }

    #[test]
    fn test_snapshot_file_name() {
        assert_eq!(snapshot_file_name(1700000000.987, 42), "unknown_1700000000_42.jpg");
    }
}
