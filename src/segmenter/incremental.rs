//! Keyframe-aligned and duration-aligned incremental segmenters built on a
//! shared core (spec §4.5). Both specializations are actor-style handles:
//! cloning shares the same underlying state behind an async mutex.

use super::{EncodedFrame, FrameKind, LiveSegment, SegmentTransform};
use crate::config::SegmenterConfig;
use crate::error::SegmentationError;
use crate::metrics;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

struct Core {
    config: SegmenterConfig,
    keyframe_aligned: bool,
    buffer: Vec<EncodedFrame>,
    buffer_duration: f64,
    last_timestamp: Option<f64>,
    next_index: u32,
    finished: bool,
    ring_buffer: VecDeque<LiveSegment>,
    subscribers: Vec<mpsc::UnboundedSender<LiveSegment>>,
    transform: Option<SegmentTransform>,
    wall_clock_origin: Option<(f64, DateTime<Utc>)>,
    cumulative_duration: f64,
}

impl Core {
    fn new(config: SegmenterConfig, keyframe_aligned: bool) -> Self {
        Self {
            config,
            keyframe_aligned,
            buffer: Vec::new(),
            buffer_duration: 0.0,
            last_timestamp: None,
            next_index: 0,
            finished: false,
            ring_buffer: VecDeque::new(),
            subscribers: Vec::new(),
            transform: None,
            wall_clock_origin: None,
            cumulative_duration: 0.0,
        }
    }

    fn ingest(&mut self, frame: EncodedFrame) -> Result<Vec<LiveSegment>, SegmentationError> {
        if self.finished {
            return Err(SegmentationError::Finished);
        }
        if frame.data.is_empty() {
            return Err(SegmentationError::EmptyFrame);
        }
        if let Some(last) = self.last_timestamp {
            if frame.timestamp < last {
                return Err(SegmentationError::OutOfOrderTimestamp { last, got: frame.timestamp });
            }
        }

        if self.wall_clock_origin.is_none() {
            self.wall_clock_origin = Some((frame.timestamp, Utc::now()));
        }

        let mut emitted = Vec::new();

        if self.keyframe_aligned {
            if !self.buffer.is_empty()
                && frame.is_keyframe
                && self.buffer_duration >= self.config.target_duration
            {
                emitted.push(self.emit_current_buffer());
            }
            if self.buffer.is_empty() && !frame.is_keyframe {
                return Err(SegmentationError::KeyframeExpected);
            }
        }

        self.last_timestamp = Some(frame.timestamp);
        self.buffer_duration += frame.duration;
        self.buffer.push(frame);

        if self.buffer_duration >= self.config.max_duration {
            emitted.push(self.emit_current_buffer());
        } else if !self.keyframe_aligned && self.buffer_duration >= self.config.target_duration {
            emitted.push(self.emit_current_buffer());
        }

        Ok(emitted)
    }

    fn finish(&mut self) -> Option<LiveSegment> {
        self.finished = true;
        let last = if !self.buffer.is_empty() { Some(self.emit_current_buffer()) } else { None };
        self.subscribers.clear();
        last
    }

    fn force_boundary(&mut self) -> Option<LiveSegment> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.emit_current_buffer())
        }
    }

    fn emit_current_buffer(&mut self) -> LiveSegment {
        let frames = std::mem::take(&mut self.buffer);
        let duration = self.buffer_duration;
        self.buffer_duration = 0.0;

        let index = self.config.start_index + self.next_index;
        self.next_index += 1;

        let is_independent = match frames.first() {
            Some(f) => f.kind == FrameKind::Audio || f.is_keyframe,
            None => true,
        };

        let program_date_time = if self.config.track_program_date_time {
            self.wall_clock_origin.map(|(first_ts, first_wall)| {
                let offset_seconds = first_ts + self.cumulative_duration;
                first_wall + chrono::Duration::milliseconds((offset_seconds * 1000.0) as i64)
            })
        } else {
            None
        };

        let timestamp = frames.first().map(|f| f.timestamp).unwrap_or(0.0);
        let frame_count = frames.len() as u32;
        let data: Vec<u8> = frames.iter().flat_map(|f| f.data.clone()).collect();

        let mut segment = LiveSegment {
            index,
            data,
            duration,
            timestamp,
            is_independent,
            program_date_time,
            filename: self.config.format_filename(index),
            frame_count,
            codecs: Vec::new(),
        };

        if let Some(transform) = &self.transform {
            segment = transform(segment, &frames);
        }

        self.cumulative_duration += duration;

        if let Some(limit) = self.config.ring_buffer_size {
            while self.ring_buffer.len() as u32 >= limit {
                self.ring_buffer.pop_front();
            }
        }
        self.ring_buffer.push_back(segment.clone());

        let kind = if frames.first().map(|f| f.kind) == Some(FrameKind::Audio) { "audio" } else { "video" };
        metrics::record_segment_emitted(kind, segment.duration);
        tracing::debug!(index, kind, duration = segment.duration, frame_count = segment.frame_count, "segment emitted");

        self.subscribers.retain(|tx| tx.send(segment.clone()).is_ok());

        segment
    }
}

/// Shared handle to a single-track incremental segmenter. Both
/// [`AudioSegmenter`] and [`VideoSegmenter`] wrap one of these.
#[derive(Clone)]
pub struct IncrementalSegmenter {
    core: Arc<Mutex<Core>>,
}

impl IncrementalSegmenter {
    fn new(config: SegmenterConfig, keyframe_aligned: bool) -> Self {
        Self { core: Arc::new(Mutex::new(Core::new(config, keyframe_aligned))) }
    }

    /// Installs a transform applied to every segment before it is emitted.
    pub async fn set_transform(&self, transform: SegmentTransform) {
        self.core.lock().await.transform = Some(transform);
    }

    /// Feeds one frame; returns any segments this ingest closed (usually 0 or 1).
    pub async fn ingest(&self, frame: EncodedFrame) -> Result<Vec<LiveSegment>, SegmentationError> {
        self.core.lock().await.ingest(frame)
    }

    /// Closes the current buffer early regardless of accumulated duration.
    pub async fn force_segment_boundary(&self) -> Option<LiveSegment> {
        self.core.lock().await.force_boundary()
    }

    /// Flushes any buffered frames as a final short segment and closes the
    /// stream. Further `ingest` calls return [`SegmentationError::Finished`].
    pub async fn finish(&self) -> Option<LiveSegment> {
        self.core.lock().await.finish()
    }

    /// Snapshot of the retained ring buffer, oldest first.
    pub async fn recent_segments(&self) -> Vec<LiveSegment> {
        self.core.lock().await.ring_buffer.iter().cloned().collect()
    }

    /// Subscribes a new consumer; it receives every segment emitted from
    /// this point on, in order, over an unbounded per-consumer queue.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<LiveSegment> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.core.lock().await.subscribers.push(tx);
        rx
    }
}

/// Duration-aligned segmenter for audio tracks: closes purely on
/// accumulated duration, no keyframe constraint.
#[derive(Clone)]
pub struct AudioSegmenter {
    inner: IncrementalSegmenter,
}

impl AudioSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { inner: IncrementalSegmenter::new(config, false) }
    }

    pub async fn ingest(&self, frame: EncodedFrame) -> Result<Vec<LiveSegment>, SegmentationError> {
        self.inner.ingest(frame).await
    }

    pub async fn force_segment_boundary(&self) -> Option<LiveSegment> {
        self.inner.force_segment_boundary().await
    }

    pub async fn finish(&self) -> Option<LiveSegment> {
        self.inner.finish().await
    }

    pub async fn recent_segments(&self) -> Vec<LiveSegment> {
        self.inner.recent_segments().await
    }

    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<LiveSegment> {
        self.inner.subscribe().await
    }

    pub async fn set_transform(&self, transform: SegmentTransform) {
        self.inner.set_transform(transform).await
    }
}

/// Keyframe-aligned segmenter for video tracks, optionally pairing an
/// interleaved audio sub-stream: the audio segment paired with video
/// segment `k` contains every buffered audio frame whose timestamp is
/// earlier than the boundary that opened video segment `k + 1`.
#[derive(Clone)]
pub struct VideoSegmenter {
    inner: IncrementalSegmenter,
    audio_buffer: Arc<Mutex<Vec<EncodedFrame>>>,
    audio_config: Option<SegmenterConfig>,
}

impl VideoSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { inner: IncrementalSegmenter::new(config, true), audio_buffer: Arc::new(Mutex::new(Vec::new())), audio_config: None }
    }

    /// Enables audio pairing: paired audio segments are named and ring-buffered
    /// using `audio_config` (typically the same target/max duration as the video
    /// config, with a distinct naming pattern).
    pub fn with_paired_audio(mut self, audio_config: SegmenterConfig) -> Self {
        self.audio_config = Some(audio_config);
        self
    }

    pub async fn set_transform(&self, transform: SegmentTransform) {
        self.inner.set_transform(transform).await
    }

    pub async fn ingest_audio(&self, frame: EncodedFrame) -> Result<(), SegmentationError> {
        if frame.data.is_empty() {
            return Err(SegmentationError::EmptyFrame);
        }
        self.audio_buffer.lock().await.push(frame);
        Ok(())
    }

    /// Feeds one video frame, returning closed video segments paired (where
    /// audio pairing is enabled) with the audio drained up to each boundary.
    pub async fn ingest(&self, frame: EncodedFrame) -> Result<Vec<super::SegmentOutput>, SegmentationError> {
        let boundary_timestamp = frame.timestamp;
        let video_segments = self.inner.ingest(frame).await?;
        if video_segments.is_empty() {
            return Ok(Vec::new());
        }

        let mut outputs = Vec::with_capacity(video_segments.len());
        for video_segment in video_segments {
            let audio_segment = self.drain_paired_audio(Some(boundary_timestamp)).await;
            outputs.push(super::SegmentOutput { video_segment, audio_segment });
        }
        Ok(outputs)
    }

    /// Drains buffered audio frames earlier than `boundary_timestamp`, or
    /// every remaining buffered frame when `boundary_timestamp` is `None`
    /// (there's no next video boundary to compare against at stream end).
    async fn drain_paired_audio(&self, boundary_timestamp: Option<f64>) -> Option<LiveSegment> {
        let audio_config = self.audio_config.as_ref()?;
        let mut buffer = self.audio_buffer.lock().await;
        if buffer.is_empty() {
            return None;
        }
        let drained: Vec<EncodedFrame> = match boundary_timestamp {
            Some(boundary) => {
                let split = buffer.partition_point(|f| f.timestamp < boundary);
                buffer.drain(..split).collect()
            }
            None => buffer.drain(..).collect(),
        };
        if drained.is_empty() {
            return None;
        }
        let duration: f64 = drained.iter().map(|f| f.duration).sum();
        let frame_count = drained.len() as u32;
        let data: Vec<u8> = drained.iter().flat_map(|f| f.data.clone()).collect();
        Some(LiveSegment {
            index: 0,
            data,
            duration,
            timestamp: drained.first().map(|f| f.timestamp).unwrap_or(0.0),
            is_independent: true,
            program_date_time: None,
            filename: audio_config.format_filename(0),
            frame_count,
            codecs: Vec::new(),
        })
    }

    /// Forces the current video buffer closed. When audio pairing is
    /// enabled, also drains every buffered audio frame earlier than the
    /// closed segment's end, pairing it the same way `ingest` does.
    pub async fn force_segment_boundary(&self) -> Option<super::SegmentOutput> {
        let video_segment = self.inner.force_segment_boundary().await?;
        let boundary = video_segment.timestamp + video_segment.duration;
        let audio_segment = self.drain_paired_audio(Some(boundary)).await;
        Some(super::SegmentOutput { video_segment, audio_segment })
    }

    /// Flushes any remaining buffered video, and (with audio pairing
    /// enabled) every remaining buffered audio frame regardless of
    /// timestamp, since there is no further boundary to drain against.
    pub async fn finish(&self) -> Option<super::SegmentOutput> {
        let video_segment = self.inner.finish().await;
        let audio_segment = self.drain_paired_audio(None).await;
        let video_segment = video_segment?;
        Some(super::SegmentOutput { video_segment, audio_segment })
    }

    pub async fn recent_segments(&self) -> Vec<LiveSegment> {
        self.inner.recent_segments().await
    }

    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<LiveSegment> {
        self.inner.subscribe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::FrameKind;

    fn frame(ts: f64, dur: f64, key: bool) -> EncodedFrame {
        EncodedFrame { timestamp: ts, duration: dur, data: vec![1, 2, 3], is_keyframe: key, kind: FrameKind::Video }
    }

    #[tokio::test]
    async fn audio_segmenter_closes_on_target_duration() {
        let config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let segmenter = AudioSegmenter::new(config);
        let mut emitted = Vec::new();
        for i in 0..5 {
            let f = EncodedFrame::audio(i as f64, 0.5, vec![0u8; 4]);
            emitted.extend(segmenter.ingest(f).await.unwrap());
        }
        assert_eq!(emitted.len(), 1);
        assert!((emitted[0].duration - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn video_segmenter_requires_keyframe_to_start() {
        let config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let segmenter = VideoSegmenter::new(config);
        let err = segmenter.ingest(frame(0.0, 0.5, false)).await.unwrap_err();
        assert_eq!(err, SegmentationError::KeyframeExpected);
    }

    #[tokio::test]
    async fn video_segmenter_waits_for_next_keyframe_past_target() {
        let config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let segmenter = VideoSegmenter::new(config);
        assert!(segmenter.ingest(frame(0.0, 1.0, true)).await.unwrap().is_empty());
        assert!(segmenter.ingest(frame(1.0, 1.0, false)).await.unwrap().is_empty());
        assert!(segmenter.ingest(frame(2.0, 1.0, false)).await.unwrap().is_empty());
        let out = segmenter.ingest(frame(3.0, 1.0, true)).await.unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].video_segment.duration - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn video_segmenter_forces_boundary_at_max_duration() {
        let mut config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        config.max_duration = 3.0;
        let segmenter = VideoSegmenter::new(config);
        assert!(segmenter.ingest(frame(0.0, 1.0, true)).await.unwrap().is_empty());
        assert!(segmenter.ingest(frame(1.0, 1.0, false)).await.unwrap().is_empty());
        let out = segmenter.ingest(frame(2.0, 1.0, false)).await.unwrap();
        assert_eq!(out.len(), 1);
        assert!((out[0].video_segment.duration - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rejects_out_of_order_timestamps() {
        let config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let segmenter = VideoSegmenter::new(config);
        segmenter.ingest(frame(2.0, 1.0, true)).await.unwrap();
        let err = segmenter.ingest(frame(1.0, 1.0, false)).await.unwrap_err();
        assert!(matches!(err, SegmentationError::OutOfOrderTimestamp { .. }));
    }

    #[tokio::test]
    async fn rejects_empty_frame_data() {
        let config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let segmenter = AudioSegmenter::new(config);
        let err = segmenter.ingest(EncodedFrame::audio(0.0, 0.5, Vec::new())).await.unwrap_err();
        assert_eq!(err, SegmentationError::EmptyFrame);
    }

    #[tokio::test]
    async fn finish_flushes_remaining_buffer_and_then_errors() {
        let config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let segmenter = AudioSegmenter::new(config);
        segmenter.ingest(EncodedFrame::audio(0.0, 0.5, vec![1])).await.unwrap();
        let last = segmenter.finish().await;
        assert!(last.is_some());
        let err = segmenter.ingest(EncodedFrame::audio(1.0, 0.5, vec![1])).await.unwrap_err();
        assert_eq!(err, SegmentationError::Finished);
    }

    #[tokio::test]
    async fn subscribers_receive_emitted_segments_in_order() {
        let config = SegmenterConfig::new(1.0, "segment_%d.m4s");
        let segmenter = AudioSegmenter::new(config);
        let mut rx = segmenter.subscribe().await;
        segmenter.ingest(EncodedFrame::audio(0.0, 0.5, vec![1])).await.unwrap();
        segmenter.ingest(EncodedFrame::audio(0.5, 0.6, vec![1])).await.unwrap();
        let seg = rx.recv().await.unwrap();
        assert_eq!(seg.index, 0);
    }

    #[tokio::test]
    async fn ring_buffer_retains_only_configured_count() {
        let mut config = SegmenterConfig::new(1.0, "segment_%d.m4s");
        config.ring_buffer_size = Some(2);
        let segmenter = AudioSegmenter::new(config);
        for i in 0..4 {
            segmenter.ingest(EncodedFrame::audio(i as f64, 1.0, vec![1])).await.unwrap();
        }
        let recent = segmenter.recent_segments().await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].index, 2);
        assert_eq!(recent[1].index, 3);
    }

    #[tokio::test]
    async fn video_segmenter_pairs_audio_up_to_next_video_boundary() {
        let video_config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let audio_config = SegmenterConfig::new(2.0, "segment_%d.m4s").with_start_index(0);
        let segmenter = VideoSegmenter::new(video_config).with_paired_audio(audio_config);

        segmenter.ingest_audio(EncodedFrame::audio(0.0, 0.5, vec![9])).await.unwrap();
        segmenter.ingest_audio(EncodedFrame::audio(0.5, 0.5, vec![9])).await.unwrap();
        segmenter.ingest_audio(EncodedFrame::audio(1.0, 0.5, vec![9])).await.unwrap();

        assert!(segmenter.ingest(frame(0.0, 1.0, true)).await.unwrap().is_empty());
        assert!(segmenter.ingest(frame(1.0, 1.0, false)).await.unwrap().is_empty());
        let out = segmenter.ingest(frame(2.0, 1.0, true)).await.unwrap();
        assert_eq!(out.len(), 1);
        let audio = out[0].audio_segment.as_ref().expect("paired audio segment");
        assert_eq!(audio.frame_count, 3);
    }

    #[tokio::test]
    async fn video_segmenter_finish_drains_all_remaining_paired_audio() {
        let video_config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let audio_config = SegmenterConfig::new(2.0, "segment_%d.m4s").with_start_index(0);
        let segmenter = VideoSegmenter::new(video_config).with_paired_audio(audio_config);

        segmenter.ingest(frame(0.0, 1.0, true)).await.unwrap();
        segmenter.ingest_audio(EncodedFrame::audio(0.0, 0.5, vec![9])).await.unwrap();
        segmenter.ingest_audio(EncodedFrame::audio(0.5, 0.5, vec![9])).await.unwrap();
        segmenter.ingest_audio(EncodedFrame::audio(5.0, 0.5, vec![9])).await.unwrap();

        let last = segmenter.finish().await.expect("buffered video frame flushed on finish");
        let audio = last.audio_segment.as_ref().expect("all buffered audio drained on finish, not just up to a boundary");
        assert_eq!(audio.frame_count, 3);
    }

    #[tokio::test]
    async fn video_segmenter_force_boundary_pairs_audio_up_to_the_forced_segment_end() {
        let video_config = SegmenterConfig::new(2.0, "segment_%d.m4s");
        let audio_config = SegmenterConfig::new(2.0, "segment_%d.m4s").with_start_index(0);
        let segmenter = VideoSegmenter::new(video_config).with_paired_audio(audio_config);

        segmenter.ingest(frame(0.0, 1.0, true)).await.unwrap();
        segmenter.ingest_audio(EncodedFrame::audio(0.0, 0.5, vec![9])).await.unwrap();
        segmenter.ingest_audio(EncodedFrame::audio(0.5, 0.5, vec![9])).await.unwrap();

        let forced = segmenter.force_segment_boundary().await.expect("buffered video frame flushed");
        let audio = forced.audio_segment.as_ref().expect("paired audio drained on forced boundary");
        assert_eq!(audio.frame_count, 2);
    }
}
