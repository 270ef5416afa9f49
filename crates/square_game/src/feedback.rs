//! Feedback sink that writes notifications to the log.

use square_game_core::{Feedback, FeedbackSink};
use tracing::{debug, info, trace, warn};

/// Logs every notification; stands in for sound and haptics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn notify(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::Tap => trace!(%feedback, "Feedback"),
            Feedback::Match | Feedback::Mismatch => debug!(%feedback, "Feedback"),
            Feedback::Win | Feedback::Loss | Feedback::BonusLife => info!(%feedback, "Feedback"),
            Feedback::Error => warn!(%feedback, "Feedback"),
        }
    }
}
