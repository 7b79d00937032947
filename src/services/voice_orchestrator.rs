use log::{debug, warn};

use crate::models::voice::VoiceState;

/// Events delivered to the orchestrator: user actions plus completions from
/// the platform speech APIs and the chat request. Feeding synthetic events
/// is how the machine is tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    /// User asked to start a voice turn.
    StartListening,
    /// Recognition produced a final transcript.
    Transcript(String),
    /// Recognition finished without a transcript (cancel or silence).
    RecognitionEnded,
    /// Recognition failed. Silently recoverable, never fatal.
    RecognitionError(String),
    /// The chat request resolved. `spoken_text` is the reply's plain-text
    /// portion, or `None` when the send failed or the reply carries only a
    /// structured payload; payload turns are never spoken.
    ReplyReady { spoken_text: Option<String> },
    /// Synthesis finished playing.
    SynthesisFinished,
    /// User asked to stop everything.
    StopAll,
}

/// Side effects requested by a transition, executed by the platform binding
/// outside the core. The machine itself only mutates `VoiceState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEffect {
    StartRecognition,
    CancelRecognition,
    SendMessage(String),
    Speak(String),
    CancelSynthesis,
}

/// Thin adapter over the platform speech APIs. The capability flags gate
/// voice affordances: a platform without recognition simply never leaves
/// `Idle` via voice.
pub trait SpeechPlatform: Send + Sync {
    fn recognition_supported(&self) -> bool;
    fn synthesis_supported(&self) -> bool;
    fn start_recognition(&self);
    fn cancel_recognition(&self);
    fn speak(&self, text: &str);
    fn cancel_speech(&self);
}

/// Platform with no speech APIs at all. Voice affordances are disabled
/// rather than erroring.
pub struct NullSpeechPlatform;

impl SpeechPlatform for NullSpeechPlatform {
    fn recognition_supported(&self) -> bool {
        false
    }
    fn synthesis_supported(&self) -> bool {
        false
    }
    fn start_recognition(&self) {}
    fn cancel_recognition(&self) {}
    fn speak(&self, _text: &str) {}
    fn cancel_speech(&self) {}
}

#[derive(Debug, Clone, Copy)]
pub struct VoiceCapabilities {
    pub recognition: bool,
    pub synthesis: bool,
}

impl VoiceCapabilities {
    pub fn of(platform: &dyn SpeechPlatform) -> VoiceCapabilities {
        VoiceCapabilities {
            recognition: platform.recognition_supported(),
            synthesis: platform.synthesis_supported(),
        }
    }

    pub fn none() -> VoiceCapabilities {
        VoiceCapabilities {
            recognition: false,
            synthesis: false,
        }
    }
}

/// Synchronous state machine coordinating microphone capture, the outbound
/// send, and speech playback. One instance per active session. The
/// transition table lives in `VoiceState::can_transition_to`; illegal
/// requests are no-ops, so `Listening` and `Speaking` stay mutually
/// exclusive under any interleaving of start/stop calls.
pub struct VoiceOrchestrator {
    state: VoiceState,
    capabilities: VoiceCapabilities,
}

impl VoiceOrchestrator {
    pub fn new(capabilities: VoiceCapabilities) -> VoiceOrchestrator {
        VoiceOrchestrator {
            state: VoiceState::Idle,
            capabilities,
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Applies one event, returning the side effects the binding layer must
    /// execute. Events that do not apply in the current state are dropped.
    pub fn handle(&mut self, event: VoiceEvent) -> Vec<VoiceEffect> {
        match event {
            VoiceEvent::StartListening => {
                if self.state != VoiceState::Idle || !self.capabilities.recognition {
                    return Vec::new();
                }
                self.transition(VoiceState::Listening);
                vec![VoiceEffect::StartRecognition]
            }
            VoiceEvent::Transcript(text) => {
                if self.state != VoiceState::Listening {
                    return Vec::new();
                }
                self.transition(VoiceState::Sending);
                vec![VoiceEffect::SendMessage(text)]
            }
            VoiceEvent::RecognitionEnded => {
                if self.state == VoiceState::Listening {
                    self.transition(VoiceState::Idle);
                }
                Vec::new()
            }
            VoiceEvent::RecognitionError(reason) => {
                warn!("Speech recognition error: {}", reason);
                if self.state == VoiceState::Listening {
                    self.transition(VoiceState::Idle);
                }
                Vec::new()
            }
            VoiceEvent::ReplyReady { spoken_text } => {
                if self.state != VoiceState::Sending {
                    return Vec::new();
                }
                match spoken_text {
                    Some(text) if self.capabilities.synthesis => {
                        self.transition(VoiceState::Speaking);
                        vec![VoiceEffect::Speak(text)]
                    }
                    _ => {
                        self.transition(VoiceState::Idle);
                        Vec::new()
                    }
                }
            }
            VoiceEvent::SynthesisFinished => {
                if self.state == VoiceState::Speaking {
                    self.transition(VoiceState::Idle);
                }
                Vec::new()
            }
            VoiceEvent::StopAll => {
                let effects = match self.state {
                    VoiceState::Listening => vec![VoiceEffect::CancelRecognition],
                    VoiceState::Speaking => vec![VoiceEffect::CancelSynthesis],
                    _ => Vec::new(),
                };
                if self.state != VoiceState::Idle {
                    self.transition(VoiceState::Idle);
                }
                effects
            }
        }
    }

    fn transition(&mut self, target: VoiceState) {
        debug_assert!(self.state.can_transition_to(&target));
        debug!("Voice state: {} -> {}", self.state, target);
        self.state = target;
    }
}
