// SPDX-License-Identifier: GPL-3.0-only

//! Per-pipeline frame counters

use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames handed to `process`, including rejected ones
    pub frames_processed: u64,
    /// Frames written back with effects applied
    pub frames_beautified: u64,
    /// Frames where the detector found no face
    pub frames_without_face: u64,
    /// Frames left untouched because a step failed
    pub frames_passed_through: u64,
    /// Wall time of the most recent frame
    pub last_frame_time: Option<Duration>,
}

impl PipelineStats {
    /// Share of frames that failed, in [0, 1]
    pub fn failure_rate(&self) -> f64 {
        if self.frames_processed == 0 {
            return 0.0;
        }
        self.frames_passed_through as f64 / self.frames_processed as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_rate_handles_no_frames() {
        let mut stats = PipelineStats::default();
        assert_eq!(stats.failure_rate(), 0.0);
        stats.frames_processed = 4;
        stats.frames_passed_through = 1;
        assert_eq!(stats.failure_rate(), 0.25);
    }
}
