//! Motion recorder: samples the calibrated pose into a frame buffer.
//!
//! Time is passed in by the caller, so the state machine itself never touches
//! a clock. [`crate::runtime::SimulatorHandle`] drives `tick` from a tokio
//! interval.

use std::time::{Duration, Instant};

use crate::sequence::{format_sequence, RecordedFrame};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
}

#[derive(Debug)]
pub struct MotionRecorder {
    state: RecorderState,
    frames: Vec<RecordedFrame>,
    last_sample: Option<Instant>,
    min_frame_duration: Duration,
}

impl MotionRecorder {
    pub fn new(min_frame_duration: Duration) -> Self {
        Self {
            state: RecorderState::Idle,
            frames: Vec::new(),
            last_sample: None,
            min_frame_duration,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// Start or resume. Starting from idle clears the buffer; resuming keeps it.
    ///
    /// Returns false if already recording.
    pub fn start(&mut self, now: Instant) -> bool {
        match self.state {
            RecorderState::Recording => return false,
            RecorderState::Idle => {
                self.frames.clear();
                tracing::info!("Recording started");
            }
            RecorderState::Paused => {
                tracing::info!("Recording resumed ({} frames so far)", self.frames.len());
            }
        }
        self.state = RecorderState::Recording;
        self.last_sample = Some(now);
        true
    }

    /// Pause a running recording. Returns false in any other state.
    pub fn pause(&mut self) -> bool {
        if self.state != RecorderState::Recording {
            return false;
        }
        self.state = RecorderState::Paused;
        tracing::info!("Recording paused ({} frames)", self.frames.len());
        true
    }

    /// Stop and hand back the serialized recording.
    ///
    /// `None` when nothing was recorded (or the recorder was idle). The buffer
    /// is discarded either way.
    pub fn stop(&mut self) -> Option<String> {
        if self.state == RecorderState::Idle {
            return None;
        }
        self.state = RecorderState::Idle;
        self.last_sample = None;
        let frames = std::mem::take(&mut self.frames);
        tracing::info!("Recording stopped: {} frames", frames.len());
        if frames.is_empty() {
            None
        } else {
            Some(format_sequence(&frames))
        }
    }

    /// Append a frame if recording.
    ///
    /// The frame holds for the time since the previous sample, but never less
    /// than the minimum frame duration.
    pub fn tick(&mut self, now: Instant, angles: [i32; 5]) -> Option<RecordedFrame> {
        if self.state != RecorderState::Recording {
            return None;
        }
        let elapsed = self
            .last_sample
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        let duration = elapsed.max(self.min_frame_duration);
        let duration_ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        let frame = RecordedFrame::from_angles(angles, duration_ms);
        self.frames.push(frame);
        self.last_sample = Some(now);
        Some(frame)
    }
}

impl Default for MotionRecorder {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::parse_sequence;

    #[test]
    fn test_start_pause_stop() {
        let mut rec = MotionRecorder::default();
        let t0 = Instant::now();
        assert!(rec.start(t0));
        assert!(!rec.start(t0));
        rec.tick(t0 + Duration::from_millis(50), [1, 2, 3, 4, 5]);
        assert!(rec.pause());
        assert!(rec.tick(t0 + Duration::from_millis(100), [9, 9, 9, 9, 9]).is_none());
        assert!(rec.start(t0 + Duration::from_millis(200)));
        rec.tick(t0 + Duration::from_millis(250), [6, 7, 8, 9, 10]);
        assert_eq!(rec.frames().len(), 2);

        let text = rec.stop().unwrap();
        assert_eq!(rec.state(), RecorderState::Idle);
        assert!(rec.frames().is_empty());
        let frames = parse_sequence(&text);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].angles(), [6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_duration_floor() {
        let mut rec = MotionRecorder::default();
        let t0 = Instant::now();
        rec.start(t0);
        let fast = rec.tick(t0 + Duration::from_millis(50), [0; 5]).unwrap();
        assert_eq!(fast.duration_ms, 1000);
        let slow = rec
            .tick(t0 + Duration::from_millis(50 + 2500), [0; 5])
            .unwrap();
        assert_eq!(slow.duration_ms, 2500);
    }

    #[test]
    fn test_stop_empty_returns_none() {
        let mut rec = MotionRecorder::default();
        assert!(rec.stop().is_none());
        rec.start(Instant::now());
        assert!(rec.stop().is_none());
    }

    #[test]
    fn test_restart_from_idle_clears_buffer() {
        let mut rec = MotionRecorder::default();
        let t0 = Instant::now();
        rec.start(t0);
        rec.tick(t0, [1; 5]);
        rec.pause();
        rec.stop();
        rec.start(t0);
        assert!(rec.frames().is_empty());
    }

    #[test]
    fn test_pause_only_from_recording() {
        let mut rec = MotionRecorder::default();
        assert!(!rec.pause());
        rec.start(Instant::now());
        assert!(rec.pause());
        assert!(!rec.pause());
    }
}
