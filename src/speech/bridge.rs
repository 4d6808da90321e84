/// Result code of a speech call. Zero is success on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechStatus {
    Ok,
    Failed(i32),
}

impl SpeechStatus {
    pub fn from_code(code: i32) -> Self {
        if code == 0 {
            SpeechStatus::Ok
        } else {
            SpeechStatus::Failed(code)
        }
    }

    pub fn is_ok(self) -> bool {
        self == SpeechStatus::Ok
    }
}

/// Interface to an external screen reader.
pub trait SpeechBridge {
    /// Whether the screen reader is running and accepting text.
    fn is_ready(&self) -> bool;

    fn speak(&mut self, text: &str) -> SpeechStatus;

    /// Interrupt whatever is being spoken now.
    fn cancel(&mut self) -> SpeechStatus;
}

impl<B: SpeechBridge + ?Sized> SpeechBridge for Box<B> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn speak(&mut self, text: &str) -> SpeechStatus {
        (**self).speak(text)
    }

    fn cancel(&mut self) -> SpeechStatus {
        (**self).cancel()
    }
}

/// No screen reader attached; everything is logged only.
#[derive(Debug, Default)]
pub struct NullBridge;

impl SpeechBridge for NullBridge {
    fn is_ready(&self) -> bool {
        false
    }

    fn speak(&mut self, _text: &str) -> SpeechStatus {
        SpeechStatus::Failed(-1)
    }

    fn cancel(&mut self) -> SpeechStatus {
        SpeechStatus::Failed(-1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    Cancel,
    Speak(String),
}

/// Bridge that records every call, for scenarios and tests.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    ready: bool,
    calls: Vec<BridgeCall>,
    fail_next: Vec<i32>,
}

impl RecordingBridge {
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Queue failure codes returned by the next `speak` calls.
    pub fn fail_with(mut self, codes: &[i32]) -> Self {
        self.fail_next.extend_from_slice(codes);
        self
    }

    pub fn calls(&self) -> &[BridgeCall] {
        &self.calls
    }

    /// Texts passed to `speak`, including failed attempts.
    pub fn spoken(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BridgeCall::Speak(text) => Some(text.as_str()),
                BridgeCall::Cancel => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl SpeechBridge for RecordingBridge {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn speak(&mut self, text: &str) -> SpeechStatus {
        self.calls.push(BridgeCall::Speak(text.to_string()));
        if self.fail_next.is_empty() {
            SpeechStatus::Ok
        } else {
            SpeechStatus::from_code(self.fail_next.remove(0))
        }
    }

    fn cancel(&mut self) -> SpeechStatus {
        self.calls.push(BridgeCall::Cancel);
        SpeechStatus::Ok
    }
}
