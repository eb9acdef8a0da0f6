//! Twilio media stream protocol
//!
//! Inbound and outbound messages are JSON objects tagged by an `event` field.
//! Only the fields this gateway uses are modelled; unknown fields are ignored
//! and unknown events deserialize to [`InboundMessage::Unknown`].

use serde::{Deserialize, Serialize};

use crate::core::stt::TranscriptEvent;

// =============================================================================
// Inbound
// =============================================================================

/// Messages received from the telephony leg
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum InboundMessage {
    Connected {
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },
    Start {
        start: StartPayload,
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
    },
    Media {
        media: InboundMedia,
    },
    Stop {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
    },
    Mark {
        mark: MarkPayload,
    },
    Dtmf {
        dtmf: DtmfPayload,
    },
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Event name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Start { .. } => "start",
            Self::Media { .. } => "media",
            Self::Stop { .. } => "stop",
            Self::Mark { .. } => "mark",
            Self::Dtmf { .. } => "dtmf",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StartPayload {
    #[serde(rename = "streamSid", default)]
    pub stream_sid: Option<String>,
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
    #[serde(rename = "mediaFormat", default)]
    pub media_format: Option<MediaFormat>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MediaFormat {
    pub encoding: String,
    #[serde(rename = "sampleRate")]
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InboundMedia {
    /// Base64 mu-law audio
    pub payload: String,
    #[serde(default)]
    pub track: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkPayload {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DtmfPayload {
    pub digit: String,
}

// =============================================================================
// Outbound
// =============================================================================

/// Named markers bracketing every synthesized reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotMarker {
    SpeakingStart,
    SpeakingEnd,
}

impl BotMarker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpeakingStart => "bot_speaking_start",
            Self::SpeakingEnd => "bot_speaking_end",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bot_speaking_start" => Some(Self::SpeakingStart),
            "bot_speaking_end" => Some(Self::SpeakingEnd),
            _ => None,
        }
    }
}

/// Messages sent to the telephony leg
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundMessage {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkPayload,
    },
    /// Transcript echo for observers; ignored by Twilio
    Transcription {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        #[serde(flatten)]
        transcript: TranscriptEvent,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutboundMedia {
    /// Base64 mu-law audio
    pub payload: String,
}

impl OutboundMessage {
    pub fn media(stream_sid: &str, payload: String) -> Self {
        Self::Media {
            stream_sid: stream_sid.to_string(),
            media: OutboundMedia { payload },
        }
    }

    pub fn mark(stream_sid: &str, marker: BotMarker) -> Self {
        Self::Mark {
            stream_sid: stream_sid.to_string(),
            mark: MarkPayload {
                name: marker.as_str().to_string(),
            },
        }
    }

    pub fn transcription(stream_sid: &str, transcript: TranscriptEvent) -> Self {
        Self::Transcription {
            stream_sid: stream_sid.to_string(),
            transcript,
        }
    }
}

/// Routing for the single socket writer
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRoute {
    Message(OutboundMessage),
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        let json = r#"{
            "event": "start",
            "sequenceNumber": "1",
            "start": {
                "accountSid": "AC123",
                "streamSid": "MZ123",
                "callSid": "CA123",
                "tracks": ["inbound"],
                "customParameters": {},
                "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1}
            },
            "streamSid": "MZ123"
        }"#;

        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        match msg {
            InboundMessage::Start { start, stream_sid } => {
                assert_eq!(start.stream_sid.as_deref(), Some("MZ123"));
                assert_eq!(start.call_sid.as_deref(), Some("CA123"));
                assert_eq!(start.media_format.unwrap().sample_rate, 8000);
                assert_eq!(stream_sid.as_deref(), Some("MZ123"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_parse_media_mark_dtmf_stop() {
        let media: InboundMessage = serde_json::from_str(
            r#"{"event":"media","sequenceNumber":"3","media":{"track":"inbound","chunk":"1","timestamp":"5","payload":"//8="},"streamSid":"MZ1"}"#,
        )
        .unwrap();
        assert!(matches!(media, InboundMessage::Media { ref media } if media.payload == "//8="));

        let mark: InboundMessage = serde_json::from_str(
            r#"{"event":"mark","streamSid":"MZ1","mark":{"name":"bot_speaking_end"}}"#,
        )
        .unwrap();
        assert_eq!(mark.kind(), "mark");

        let dtmf: InboundMessage = serde_json::from_str(
            r#"{"event":"dtmf","streamSid":"MZ1","dtmf":{"track":"inbound_track","digit":"5"}}"#,
        )
        .unwrap();
        assert!(matches!(dtmf, InboundMessage::Dtmf { ref dtmf } if dtmf.digit == "5"));

        let stop: InboundMessage = serde_json::from_str(
            r#"{"event":"stop","streamSid":"MZ1","stop":{"accountSid":"AC1","callSid":"CA1"}}"#,
        )
        .unwrap();
        assert_eq!(stop.kind(), "stop");
    }

    #[test]
    fn test_unknown_event() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"event":"something-new","foo":1}"#).unwrap();
        assert_eq!(msg, InboundMessage::Unknown);
    }

    #[test]
    fn test_outbound_media_serialization() {
        let msg = OutboundMessage::media("MZ1", "AAAA".to_string());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "media", "streamSid": "MZ1", "media": {"payload": "AAAA"}})
        );
    }

    #[test]
    fn test_outbound_mark_serialization() {
        let json = serde_json::to_string(&OutboundMessage::mark("MZ1", BotMarker::SpeakingEnd))
            .unwrap();
        assert!(json.contains(r#""event":"mark""#));
        assert!(json.contains(r#""streamSid":"MZ1""#));
        assert!(json.contains(r#""name":"bot_speaking_end""#));
    }

    #[test]
    fn test_outbound_transcription_serialization() {
        let msg = OutboundMessage::transcription(
            "MZ1",
            TranscriptEvent::final_result("hello there", 0.75),
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "transcription");
        assert_eq!(json["is_final"], true);
        assert_eq!(json["text"], "hello there");
        assert_eq!(json["confidence"], 0.75);
    }

    #[test]
    fn test_marker_names() {
        for marker in [BotMarker::SpeakingStart, BotMarker::SpeakingEnd] {
            assert_eq!(BotMarker::from_name(marker.as_str()), Some(marker));
        }
        assert_eq!(BotMarker::from_name("other"), None);
    }
}
