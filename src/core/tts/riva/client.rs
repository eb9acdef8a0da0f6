use async_trait::async_trait;
use futures::StreamExt;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Status};
use tracing::{debug, info};

use super::messages::{SynthesizeSpeechRequest, SynthesizeSpeechResponse};
use crate::core::grpc::create_channel;
use crate::core::tts::base::{
    AudioChunkStream, SynthesisRequest, SynthesisService, TTSError, TTSResult,
};

/// gRPC service path for RivaSpeechSynthesis.SynthesizeOnline
const GRPC_SERVICE_PATH: &str = "/nvidia.riva.tts.RivaSpeechSynthesis/SynthesizeOnline";

/// Riva online (streaming) synthesizer
#[derive(Clone)]
pub struct RivaSpeechSynthesizer {
    channel: Channel,
}

impl RivaSpeechSynthesizer {
    pub fn new(address: &str, use_tls: bool) -> TTSResult<Self> {
        let channel = create_channel(address, use_tls).map_err(TTSError::InvalidConfiguration)?;
        info!(address, use_tls, "Configured Riva TTS client");
        Ok(Self { channel })
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl SynthesisService for RivaSpeechSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> TTSResult<AudioChunkStream> {
        let message = SynthesizeSpeechRequest::from(&request);

        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| TTSError::ConnectionFailed(format!("Service not ready: {e}")))?;

        let codec = tonic::codec::ProstCodec::<SynthesizeSpeechRequest, SynthesizeSpeechResponse>::default();
        let path = PathAndQuery::from_static(GRPC_SERVICE_PATH);

        let response = grpc
            .server_streaming(Request::new(message), path, codec)
            .await
            .map_err(grpc_status_to_tts_error)?;

        debug!(
            voice = %request.voice_name,
            chars = request.text.len(),
            "Riva online synthesis started"
        );

        let chunks = response.into_inner().map(|item| {
            item.map(|response| response.audio)
                .map_err(grpc_status_to_tts_error)
        });
        Ok(chunks.boxed())
    }

    fn provider_name(&self) -> &'static str {
        "riva"
    }
}

/// Convert gRPC status to TTS error
pub fn grpc_status_to_tts_error(status: Status) -> TTSError {
    let code = status.code();
    let message = status.message().to_string();

    match code {
        tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
            TTSError::AuthenticationFailed(format!("{:?}: {}", code, message))
        }
        tonic::Code::Unavailable => {
            TTSError::ConnectionFailed(format!("Service unavailable: {}", message))
        }
        tonic::Code::InvalidArgument | tonic::Code::NotFound => {
            TTSError::InvalidConfiguration(format!("{:?}: {}", code, message))
        }
        tonic::Code::DeadlineExceeded => {
            TTSError::NetworkError(format!("Request timed out: {}", message))
        }
        _ => TTSError::ProviderError(format!("gRPC error {:?}: {}", code, message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_voice_maps_to_configuration_error() {
        let err = grpc_status_to_tts_error(Status::not_found("voice English-US.Robot-1"));
        assert!(matches!(err, TTSError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_unavailable_maps_to_connection_error() {
        let err = grpc_status_to_tts_error(Status::unavailable("connection refused"));
        assert_eq!(
            err,
            TTSError::ConnectionFailed("Service unavailable: connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn test_synthesize_against_closed_port_fails() {
        // Nothing listens on port 9 of localhost in the test environment
        let synth = RivaSpeechSynthesizer::new("127.0.0.1:9", false).unwrap();
        let result = synth
            .synthesize(SynthesisRequest::new("hi", "en-US", "English-US.Female-1"))
            .await;
        assert!(result.is_err());
    }
}
