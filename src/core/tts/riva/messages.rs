//! Riva TTS protobuf messages (`nvidia.riva.tts`)

use crate::core::grpc::AudioEncoding;
use crate::core::tts::base::SynthesisRequest;

#[derive(Clone, PartialEq, prost::Message)]
pub struct SynthesizeSpeechRequest {
    #[prost(string, tag = "1")]
    pub text: String,
    #[prost(string, tag = "2")]
    pub language_code: String,
    #[prost(enumeration = "AudioEncoding", tag = "3")]
    pub encoding: i32,
    #[prost(int32, tag = "4")]
    pub sample_rate_hz: i32,
    #[prost(string, tag = "5")]
    pub voice_name: String,
}

impl From<&SynthesisRequest> for SynthesizeSpeechRequest {
    fn from(request: &SynthesisRequest) -> Self {
        Self {
            text: request.text.clone(),
            language_code: request.language_code.clone(),
            encoding: AudioEncoding::LinearPcm as i32,
            sample_rate_hz: request.sample_rate_hz as i32,
            voice_name: request.voice_name.clone(),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SynthesizeSpeechResponse {
    #[prost(bytes = "bytes", tag = "1")]
    pub audio: ::prost::bytes::Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_from_synthesis_request() {
        let request = SynthesisRequest::new("Hello", "en-US", "English-US.Female-1");
        let proto = SynthesizeSpeechRequest::from(&request);

        assert_eq!(proto.text, "Hello");
        assert_eq!(proto.language_code, "en-US");
        assert_eq!(proto.voice_name, "English-US.Female-1");
        assert_eq!(proto.sample_rate_hz, 8000);
        assert_eq!(proto.encoding(), AudioEncoding::LinearPcm);
    }
}
