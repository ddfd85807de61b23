//! Scripted reply sequence for the chat screen
//!
//! Whatever the user types, the "assistant" answers with the same itinerary,
//! then asks whether to use the pass, then offers it. The script runs as a
//! state machine whose steps are deadlines in a [`Scheduler`].

use std::time::Instant;
use tracing::{debug, warn};

use crate::config::ScriptTimings;
use crate::scheduler::{Scheduler, SessionToken};
use crate::state::{ChatRole, MapEmbed, Transcript};

/// Replies containing this get the map entry appended after them
pub const ITINERARY_MARKER: &str = "Bus ADX";

pub const ITINERARY_REPLY: &str = "🚍 For your trip from Ajman Beach to City Center Ajman, take **Bus ADX** from Ajman Beach Stop (2-min walk) to City Center Stop, then walk 3 min to the entrance.\n\n⏱ Total ≈ 21 minutes.";

pub const FOLLOW_UP_QUESTION: &str = "Would you like to use your valid pass for this trip?";

pub const MAP_LABEL: &str = "Ajman Beach, UAE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStep {
    Itinerary,
    FollowUp,
    OfferPass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    #[default]
    Idle,
    AwaitingItinerary,
    AwaitingFollowUp,
    AwaitingPassOffer,
    PassOffered,
}

pub struct ChatSequencer {
    transcript: Transcript,
    pass_offer_visible: bool,
    state: SequenceState,
    session: SessionToken,
    scheduler: Scheduler<ChatStep>,
    timings: ScriptTimings,
    map_url: String,
}

impl ChatSequencer {
    pub fn new(timings: ScriptTimings, map_url: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::default(),
            pass_offer_visible: false,
            state: SequenceState::Idle,
            session: SessionToken::default(),
            scheduler: Scheduler::new(),
            timings,
            map_url: map_url.into(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pass_offer_visible(&self) -> bool {
        self.pass_offer_visible
    }

    #[cfg(test)]
    pub fn state(&self) -> SequenceState {
        self.state
    }

    /// True while an assistant message is still on its way
    pub fn is_replying(&self) -> bool {
        matches!(
            self.state,
            SequenceState::AwaitingItinerary | SequenceState::AwaitingFollowUp
        )
    }

    /// Clear the transcript, hide the pass offer and drop any pending steps
    /// of the previous run.
    pub fn reset(&mut self) {
        let cancelled = self.scheduler.cancel_session(self.session);
        if cancelled > 0 {
            debug!(cancelled, "dropped pending scripted steps on chat reset");
        }
        self.session = self.session.next();
        self.transcript.clear();
        self.pass_offer_visible = false;
        self.state = SequenceState::Idle;
    }

    /// Append the user's message and start the script if none is running.
    /// Returns false when the input was blank and nothing happened.
    pub fn submit(&mut self, text: &str, now: Instant) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        self.transcript.push_message(ChatRole::User, text);

        match self.state {
            SequenceState::Idle | SequenceState::PassOffered => {
                self.scheduler.schedule(
                    now,
                    self.timings.itinerary,
                    self.session,
                    ChatStep::Itinerary,
                );
                self.state = SequenceState::AwaitingItinerary;
                debug!("scripted reply scheduled");
            }
            state => {
                debug!(?state, "reply already in flight, not restarting script");
            }
        }
        true
    }

    /// Fire every step due by `now`. Returns true if anything visible changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Some(fired) = self.scheduler.pop_due(now) {
            if fired.session != self.session {
                debug!(step = ?fired.step, "skipping step from stale session");
                continue;
            }
            changed |= self.advance(fired.step, fired.due);
        }
        changed
    }

    // Follow-up steps are timed from the due time of the step before, so a
    // late poll never shortens the gaps between messages.
    fn advance(&mut self, step: ChatStep, due: Instant) -> bool {
        match (self.state, step) {
            (SequenceState::AwaitingItinerary, ChatStep::Itinerary) => {
                self.append_assistant(ITINERARY_REPLY);
                self.scheduler
                    .schedule(due, self.timings.follow_up, self.session, ChatStep::FollowUp);
                self.state = SequenceState::AwaitingFollowUp;
            }
            (SequenceState::AwaitingFollowUp, ChatStep::FollowUp) => {
                self.append_assistant(FOLLOW_UP_QUESTION);
                self.scheduler
                    .schedule(due, self.timings.pass_offer, self.session, ChatStep::OfferPass);
                self.state = SequenceState::AwaitingPassOffer;
            }
            (SequenceState::AwaitingPassOffer, ChatStep::OfferPass) => {
                self.pass_offer_visible = true;
                self.state = SequenceState::PassOffered;
            }
            (state, step) => {
                warn!(?state, ?step, "ignoring out-of-order scripted step");
                return false;
            }
        }
        debug!(?step, state = ?self.state, "scripted step fired");
        true
    }

    fn append_assistant(&mut self, content: &str) {
        self.transcript.push_message(ChatRole::Assistant, content);
        if content.contains(ITINERARY_MARKER) {
            self.transcript.push_map(MapEmbed {
                label: MAP_LABEL.to_string(),
                url: self.map_url.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ChatMessage, TranscriptEntry};
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn sequencer() -> ChatSequencer {
        ChatSequencer::new(ScriptTimings::default(), "https://maps.example/embed")
    }

    fn user(text: &str) -> TranscriptEntry {
        TranscriptEntry::Message(ChatMessage {
            role: ChatRole::User,
            content: text.to_string(),
        })
    }

    fn assistant(text: &str) -> TranscriptEntry {
        TranscriptEntry::Message(ChatMessage {
            role: ChatRole::Assistant,
            content: text.to_string(),
        })
    }

    fn map() -> TranscriptEntry {
        TranscriptEntry::Map(MapEmbed {
            label: MAP_LABEL.to_string(),
            url: "https://maps.example/embed".to_string(),
        })
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let t0 = Instant::now();
        let mut chat = sequencer();

        assert!(!chat.submit("", t0));
        assert!(!chat.submit("   ", t0));
        assert!(!chat.poll(t0 + ms(10_000)));
        assert!(chat.transcript().is_empty());
        assert_eq!(chat.state(), SequenceState::Idle);
    }

    #[test]
    fn test_full_script_timeline() {
        let t0 = Instant::now();
        let mut chat = sequencer();

        assert!(chat.submit("trip?", t0));
        assert_eq!(chat.transcript().entries(), &[user("trip?")]);

        assert!(!chat.poll(t0 + ms(1999)));
        assert_eq!(chat.transcript().len(), 1);

        assert!(chat.poll(t0 + ms(2000)));
        assert_eq!(
            chat.transcript().entries(),
            &[user("trip?"), assistant(ITINERARY_REPLY), map()]
        );
        assert!(!chat.pass_offer_visible());

        assert!(!chat.poll(t0 + ms(3499)));
        assert!(chat.poll(t0 + ms(3500)));
        assert_eq!(chat.transcript().len(), 4);
        assert_eq!(chat.transcript().entries()[3], assistant(FOLLOW_UP_QUESTION));
        assert!(!chat.pass_offer_visible());

        assert!(!chat.poll(t0 + ms(3999)));
        assert!(chat.poll(t0 + ms(4000)));
        assert!(chat.pass_offer_visible());
        assert_eq!(chat.state(), SequenceState::PassOffered);
    }

    #[test]
    fn test_late_poll_fires_everything_in_order() {
        let t0 = Instant::now();
        let mut chat = sequencer();
        chat.submit("hello", t0);

        assert!(chat.poll(t0 + ms(60_000)));
        assert_eq!(
            chat.transcript().entries(),
            &[
                user("hello"),
                assistant(ITINERARY_REPLY),
                map(),
                assistant(FOLLOW_UP_QUESTION),
            ]
        );
        assert!(chat.pass_offer_visible());
    }

    #[test]
    fn test_second_submit_during_script_does_not_duplicate_replies() {
        let t0 = Instant::now();
        let mut chat = sequencer();
        chat.submit("one", t0);
        chat.submit("two", t0 + ms(500));
        chat.poll(t0 + ms(60_000));

        let assistant_count = chat
            .transcript()
            .entries()
            .iter()
            .filter_map(TranscriptEntry::as_message)
            .filter(|m| m.role == ChatRole::Assistant)
            .count();
        assert_eq!(assistant_count, 2);
        assert_eq!(chat.transcript().entries()[1], user("two"));
    }

    #[test]
    fn test_submit_after_pass_offer_replays_script() {
        let t0 = Instant::now();
        let mut chat = sequencer();
        chat.submit("one", t0);
        chat.poll(t0 + ms(4000));

        chat.submit("again", t0 + ms(5000));
        assert_eq!(chat.state(), SequenceState::AwaitingItinerary);
        assert!(chat.pass_offer_visible());

        chat.poll(t0 + ms(7000));
        assert_eq!(chat.transcript().entries().last(), Some(&map()));
    }

    #[test]
    fn test_reset_cancels_pending_steps() {
        let t0 = Instant::now();
        let mut chat = sequencer();
        chat.submit("trip?", t0);
        chat.poll(t0 + ms(2500));
        assert_eq!(chat.transcript().len(), 3);

        chat.reset();
        assert!(chat.transcript().is_empty());
        assert!(!chat.pass_offer_visible());

        assert!(!chat.poll(t0 + ms(60_000)));
        assert!(chat.transcript().is_empty());
        assert!(!chat.pass_offer_visible());
        assert_eq!(chat.state(), SequenceState::Idle);
    }

    #[test]
    fn test_is_replying_until_follow_up_delivered() {
        let t0 = Instant::now();
        let mut chat = sequencer();
        assert!(!chat.is_replying());

        chat.submit("hi", t0);
        assert!(chat.is_replying());
        chat.poll(t0 + ms(2000));
        assert!(chat.is_replying());
        chat.poll(t0 + ms(3500));
        assert!(!chat.is_replying());
    }
}
