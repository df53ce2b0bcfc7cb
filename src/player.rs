//! Sequence playback state.
//!
//! The player only decides *what* comes next; applying a frame to the arm and
//! waiting between frames belong to the caller (see
//! [`crate::Simulator::playback_step`] and the async driver in
//! [`crate::runtime`]).

use std::time::Duration;

use crate::sequence::{parse_sequence, RecordedFrame};

/// One frame to apply and how long to hold it before the next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackStep {
    /// 0-based position in the sequence.
    pub index: usize,
    pub frame: RecordedFrame,
    pub wait: Duration,
}

#[derive(Debug, Default)]
pub struct SequencePlayer {
    frames: Vec<RecordedFrame>,
    index: usize,
    /// IK flag saved by `begin`, `Some` while a playback is active.
    saved_ik: Option<bool>,
}

impl SequencePlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sequence with the frames parsed from `text`.
    ///
    /// Any active playback is dropped; its saved IK flag is returned so the
    /// caller can restore it.
    pub fn load(&mut self, text: &str) -> (usize, Option<bool>) {
        let restored = self.cancel();
        self.frames = parse_sequence(text);
        self.index = 0;
        tracing::info!("Loaded sequence with {} steps", self.frames.len());
        (self.frames.len(), restored)
    }

    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_playing(&self) -> bool {
        self.saved_ik.is_some()
    }

    /// Sum of all frame durations.
    pub fn total_duration(&self) -> Duration {
        self.frames.iter().map(RecordedFrame::duration).sum()
    }

    /// Start playback from the first frame, saving the current IK flag.
    ///
    /// Returns false if there is nothing to play. Restarting while playing
    /// keeps the flag saved by the first `begin`.
    pub fn begin(&mut self, ik_enabled: bool) -> bool {
        if self.frames.is_empty() {
            return false;
        }
        self.index = 0;
        if self.saved_ik.is_none() {
            self.saved_ik = Some(ik_enabled);
        }
        true
    }

    /// Next frame, or `None` once the sequence is exhausted (the index then
    /// rewinds to 0).
    pub fn next_step(&mut self) -> Option<PlaybackStep> {
        if !self.is_playing() {
            return None;
        }
        match self.frames.get(self.index) {
            Some(frame) => {
                let step = PlaybackStep {
                    index: self.index,
                    frame: *frame,
                    wait: frame.duration(),
                };
                self.index += 1;
                Some(step)
            }
            None => {
                self.index = 0;
                None
            }
        }
    }

    /// End playback normally. Returns the IK flag to restore.
    pub fn finish(&mut self) -> Option<bool> {
        self.index = 0;
        self.saved_ik.take()
    }

    /// Abort playback. Returns the IK flag to restore, if one was saved.
    pub fn cancel(&mut self) -> Option<bool> {
        let saved = self.saved_ik.take();
        if saved.is_some() {
            tracing::info!("Playback cancelled at step {}", self.index);
        }
        self.index = 0;
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_STEPS: &str = "{ 10, 20, 30, 40, 50, 2000 },\n{ 350, 0, 0, 0, 0, 1000 }";

    #[test]
    fn test_steps_in_order_then_rewind() {
        let mut player = SequencePlayer::new();
        assert_eq!(player.load(TWO_STEPS), (2, None));
        assert!(player.begin(true));

        let first = player.next_step().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.frame.base, 10);
        assert_eq!(first.wait, Duration::from_millis(2000));
        let second = player.next_step().unwrap();
        assert_eq!(second.frame.base, 350);
        assert!(player.next_step().is_none());
        assert_eq!(player.index(), 0);

        assert_eq!(player.finish(), Some(true));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_total_duration() {
        let mut player = SequencePlayer::new();
        player.load(TWO_STEPS);
        assert_eq!(player.total_duration(), Duration::from_millis(3000));
    }

    #[test]
    fn test_begin_requires_frames() {
        let mut player = SequencePlayer::new();
        assert!(!player.begin(true));
        player.load("nothing here");
        assert!(!player.begin(true));
        assert!(player.next_step().is_none());
    }

    #[test]
    fn test_load_cancels_active_playback() {
        let mut player = SequencePlayer::new();
        player.load(TWO_STEPS);
        player.begin(false);
        player.next_step();
        let (count, restored) = player.load("1,2,3,4,5,100");
        assert_eq!(count, 1);
        assert_eq!(restored, Some(false));
        assert!(!player.is_playing());
        assert_eq!(player.index(), 0);
    }

    #[test]
    fn test_restart_keeps_first_saved_flag() {
        let mut player = SequencePlayer::new();
        player.load(TWO_STEPS);
        player.begin(true);
        // IK is off during playback, so a restart sees `false`.
        player.begin(false);
        assert_eq!(player.cancel(), Some(true));
        assert_eq!(player.cancel(), None);
    }
}
