use thiserror::Error;

/// Terminal result of one transcription request
pub type Outcome = std::result::Result<String, TranscriptionError>;

/// Error codes reported by a recognition service
///
/// Numeric values follow the platform speech recognizer convention so host
/// adapters can forward raw codes through [`RecognitionErrorCode::from_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionErrorCode {
    NetworkTimeout,
    Network,
    Audio,
    Server,
    Client,
    SpeechTimeout,
    NoMatch,
    RecognizerBusy,
    InsufficientPermissions,
    Unknown(i32),
}

impl RecognitionErrorCode {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::NetworkTimeout,
            2 => Self::Network,
            3 => Self::Audio,
            4 => Self::Server,
            5 => Self::Client,
            6 => Self::SpeechTimeout,
            7 => Self::NoMatch,
            8 => Self::RecognizerBusy,
            9 => Self::InsufficientPermissions,
            other => Self::Unknown(other),
        }
    }

    /// Human-readable message sent back to the caller
    pub fn message(&self) -> &'static str {
        match self {
            Self::Audio => "Audio recording error",
            Self::Client => "Client side error",
            Self::InsufficientPermissions => "Insufficient permissions",
            Self::Network => "Network error",
            Self::NetworkTimeout => "Network timeout",
            Self::NoMatch => "No speech match found",
            Self::RecognizerBusy => "Recognition service busy",
            Self::Server => "Server error",
            Self::SpeechTimeout => "No speech input",
            Self::Unknown(_) => "Unknown error",
        }
    }
}

/// Every way a transcription request can fail
///
/// The `Display` text is the message delivered over the method channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptionError {
    #[error("Audio path is required")]
    InvalidArgument,

    #[error("Audio file not found at path: {0}")]
    FileNotFound(String),

    #[error("{}", .0.message())]
    Recognition(RecognitionErrorCode),

    #[error("Error playing audio: {0}")]
    Playback(String),

    #[error("No transcription results")]
    NoResults,

    #[error("Failed to transcribe: {0}")]
    Failed(String),
}

impl TranscriptionError {
    /// Wire code for the error reply
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::FileNotFound(_) => "FILE_NOT_FOUND",
            Self::Recognition(_) => "TRANSCRIPTION_ERROR",
            Self::Playback(_) => "PLAYBACK_ERROR",
            Self::NoResults => "NO_RESULTS",
            Self::Failed(_) => "TRANSCRIPTION_FAILED",
        }
    }

    /// Build a setup failure from an internal error chain
    pub fn failed(err: &anyhow::Error) -> Self {
        Self::Failed(format!("{:#}", err))
    }

    pub fn playback(err: &anyhow::Error) -> Self {
        Self::Playback(format!("{:#}", err))
    }
}
