use async_trait::async_trait;
use futures::StreamExt;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::{Request, Status};
use tracing::{debug, info};

use super::messages::{StreamingRecognizeRequest, StreamingRecognizeResponse};
use crate::core::grpc::create_channel;
use crate::core::stt::base::{
    AudioFrameStream, RecognitionBatch, RecognitionSettings, RecognitionStream, STTError,
    STTResult, TranscriptionService,
};

/// gRPC service path for RivaSpeechRecognition.StreamingRecognize
const GRPC_SERVICE_PATH: &str = "/nvidia.riva.asr.RivaSpeechRecognition/StreamingRecognize";

/// Riva streaming recognizer.
///
/// Cheap to clone; every call to `streaming_recognize` opens a new
/// bidirectional stream over the shared channel.
#[derive(Clone)]
pub struct RivaSpeechRecognizer {
    channel: Channel,
}

impl RivaSpeechRecognizer {
    pub fn new(address: &str, use_tls: bool) -> STTResult<Self> {
        let channel = create_channel(address, use_tls).map_err(STTError::ConfigurationError)?;
        info!(address, use_tls, "Configured Riva ASR client");
        Ok(Self { channel })
    }

    pub fn from_channel(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl TranscriptionService for RivaSpeechRecognizer {
    async fn streaming_recognize(
        &self,
        settings: RecognitionSettings,
        audio: AudioFrameStream,
    ) -> STTResult<RecognitionStream> {
        let config = StreamingRecognizeRequest::config(&settings);
        let requests = futures::stream::once(async move { config }).chain(
            audio.map(|frame| StreamingRecognizeRequest::audio(frame.into_bytes().to_vec())),
        );

        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| STTError::ConnectionFailed(format!("Service not ready: {e}")))?;

        let codec =
            tonic::codec::ProstCodec::<StreamingRecognizeRequest, StreamingRecognizeResponse>::default();
        let path = PathAndQuery::from_static(GRPC_SERVICE_PATH);

        let response = grpc
            .streaming(Request::new(requests), path, codec)
            .await
            .map_err(grpc_status_to_stt_error)?;

        debug!("Riva streaming recognition call established");

        let results = response.into_inner().map(|item| {
            item.map(RecognitionBatch::from)
                .map_err(grpc_status_to_stt_error)
        });
        Ok(results.boxed())
    }

    fn provider_name(&self) -> &'static str {
        "riva"
    }
}

/// Convert gRPC status to STT error
pub fn grpc_status_to_stt_error(status: Status) -> STTError {
    let code = status.code();
    let message = status.message().to_string();

    match code {
        tonic::Code::Unauthenticated | tonic::Code::PermissionDenied => {
            STTError::AuthenticationFailed(format!("{:?}: {}", code, message))
        }
        tonic::Code::Unavailable => {
            STTError::ConnectionFailed(format!("Service unavailable: {}", message))
        }
        tonic::Code::InvalidArgument => {
            STTError::ConfigurationError(format!("Invalid argument: {}", message))
        }
        tonic::Code::DeadlineExceeded => {
            STTError::NetworkError(format!("Request timed out: {}", message))
        }
        _ => STTError::ProviderError(format!("gRPC error {:?}: {}", code, message)),
    }
}
