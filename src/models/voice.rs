use std::fmt;

/// Operational state of the voice pipeline. Exactly one instance per active
/// session; `Listening` and `Speaking` are mutually exclusive because the
/// microphone and the synthesizer share the audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceState {
    /// Nothing in flight. Ready to start a voice turn.
    Idle,
    /// Microphone open, recognition running.
    Listening,
    /// Transcript captured, chat request in flight.
    Sending,
    /// Synthesizing the assistant's reply.
    Speaking,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Listening => write!(f, "Listening"),
            VoiceState::Sending => write!(f, "Sending"),
            VoiceState::Speaking => write!(f, "Speaking"),
        }
    }
}

impl VoiceState {
    /// Returns whether a transition from `self` to `target` is legal.
    /// Returning to `Idle` is always allowed from a non-idle state (stop,
    /// cancel, error recovery); self-transitions are not.
    pub fn can_transition_to(&self, target: &VoiceState) -> bool {
        if self == target {
            return false;
        }
        matches!(
            (self, target),
            (VoiceState::Idle, VoiceState::Listening)
                | (VoiceState::Listening, VoiceState::Sending)
                | (VoiceState::Sending, VoiceState::Speaking)
                | (_, VoiceState::Idle)
        )
    }
}
