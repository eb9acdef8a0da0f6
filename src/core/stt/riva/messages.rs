//! Riva ASR protobuf messages (`nvidia.riva.asr`)
//!
//! Only the fields this gateway reads or writes are declared; prost skips
//! unknown fields on decode.

use crate::core::grpc::AudioEncoding;
use crate::core::stt::base::{
    RecognitionAlternative, RecognitionBatch, RecognitionResult, RecognitionSettings,
};

#[derive(Clone, PartialEq, prost::Message)]
pub struct RecognitionConfig {
    #[prost(enumeration = "AudioEncoding", tag = "1")]
    pub encoding: i32,
    #[prost(int32, tag = "2")]
    pub sample_rate_hertz: i32,
    #[prost(string, tag = "3")]
    pub language_code: String,
    #[prost(int32, tag = "4")]
    pub max_alternatives: i32,
    #[prost(int32, tag = "7")]
    pub audio_channel_count: i32,
    #[prost(bool, tag = "8")]
    pub enable_word_time_offsets: bool,
    #[prost(bool, tag = "11")]
    pub enable_automatic_punctuation: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StreamingRecognitionConfig {
    #[prost(message, optional, tag = "1")]
    pub config: Option<RecognitionConfig>,
    #[prost(bool, tag = "2")]
    pub interim_results: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StreamingRecognizeRequest {
    #[prost(oneof = "streaming_recognize_request::StreamingRequest", tags = "1, 2")]
    pub streaming_request: Option<streaming_recognize_request::StreamingRequest>,
}

pub mod streaming_recognize_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum StreamingRequest {
        #[prost(message, tag = "1")]
        StreamingConfig(super::StreamingRecognitionConfig),
        #[prost(bytes, tag = "2")]
        AudioContent(Vec<u8>),
    }
}

impl StreamingRecognizeRequest {
    /// First message of every stream
    pub fn config(settings: &RecognitionSettings) -> Self {
        let config = RecognitionConfig {
            encoding: AudioEncoding::LinearPcm as i32,
            sample_rate_hertz: settings.sample_rate_hz as i32,
            language_code: settings.language_code.clone(),
            max_alternatives: settings.max_alternatives as i32,
            audio_channel_count: settings.channels as i32,
            enable_word_time_offsets: settings.word_time_offsets,
            enable_automatic_punctuation: settings.automatic_punctuation,
        };

        Self {
            streaming_request: Some(streaming_recognize_request::StreamingRequest::StreamingConfig(
                StreamingRecognitionConfig {
                    config: Some(config),
                    interim_results: settings.interim_results,
                },
            )),
        }
    }

    pub fn audio(pcm: Vec<u8>) -> Self {
        Self {
            streaming_request: Some(streaming_recognize_request::StreamingRequest::AudioContent(
                pcm,
            )),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SpeechRecognitionAlternative {
    #[prost(string, tag = "1")]
    pub transcript: String,
    #[prost(float, tag = "2")]
    pub confidence: f32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StreamingRecognitionResult {
    #[prost(message, repeated, tag = "1")]
    pub alternatives: Vec<SpeechRecognitionAlternative>,
    #[prost(bool, tag = "2")]
    pub is_final: bool,
    #[prost(float, tag = "3")]
    pub stability: f32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StreamingRecognizeResponse {
    #[prost(message, repeated, tag = "1")]
    pub results: Vec<StreamingRecognitionResult>,
}

impl From<StreamingRecognizeResponse> for RecognitionBatch {
    fn from(response: StreamingRecognizeResponse) -> Self {
        Self {
            results: response
                .results
                .into_iter()
                .map(|result| RecognitionResult {
                    is_final: result.is_final,
                    alternatives: result
                        .alternatives
                        .into_iter()
                        .map(|alt| RecognitionAlternative {
                            transcript: alt.transcript,
                            confidence: alt.confidence,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
