use base64::Engine;
use transcribe_bridge::nats::messages::{AudioFrameMessage, TranscriptMessage};

#[test]
fn test_audio_frame_serialization() {
    let msg = AudioFrameMessage {
        session_id: "transcription-test".to_string(),
        sequence: 0,
        pcm: base64::engine::general_purpose::STANDARD.encode([0u8; 100]),
        sample_rate: 16000,
        channels: 1,
        timestamp: "2025-10-27T14:30:00Z".to_string(),
        final_frame: false,
        language: Some("en-US".to_string()),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("transcription-test"));
    assert!(json.contains("\"final\":false"));
    assert!(json.contains("\"language\":\"en-US\""));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.session_id, "transcription-test");
    assert_eq!(deserialized.sample_rate, 16000);
    assert_eq!(deserialized.sequence, 0);
    assert!(!deserialized.final_frame);
}

#[test]
fn test_audio_frame_final_marker_omits_language() {
    let msg = AudioFrameMessage {
        session_id: "transcription-test".to_string(),
        sequence: 10,
        pcm: String::new(), // Empty for final marker
        sample_rate: 16000,
        channels: 1,
        timestamp: "2025-10-27T14:30:00Z".to_string(),
        final_frame: true,
        language: None,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"final\":true"));
    assert!(!json.contains("language"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert!(deserialized.final_frame);
    assert!(deserialized.pcm.is_empty());
    assert_eq!(deserialized.language, None);
}

#[test]
fn test_transcript_deserialization() {
    let json = r#"{
        "session_id": "transcription-test",
        "text": "Hello world",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "transcription-test");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
    assert_eq!(msg.candidates(), vec!["Hello world".to_string()]);
}

#[test]
fn test_transcript_candidates_with_alternatives() {
    let json = r#"{
        "session_id": "transcription-test",
        "text": " hello world ",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "alternatives": ["hollow world", ""]
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.confidence, None);
    assert_eq!(
        msg.candidates(),
        vec!["hello world".to_string(), "hollow world".to_string()]
    );
}

#[test]
fn test_empty_transcript_has_no_candidates() {
    let json = r#"{
        "session_id": "transcription-test",
        "text": "   ",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert!(msg.candidates().is_empty());
}
