//! Shared gRPC plumbing for the Riva speech services
//!
//! Channels are created lazily: the TCP/TLS handshake happens on the first
//! call, so a misconfigured address surfaces as a call failure inside the
//! session rather than at server startup.

use std::time::Duration;

use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

/// Default connect timeout for Riva channels
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Audio encodings understood by Riva (`nvidia.riva.AudioEncoding`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum AudioEncoding {
    EncodingUnspecified = 0,
    LinearPcm = 1,
    Flac = 2,
    Mulaw = 3,
    OggOpus = 4,
    Alaw = 20,
}

/// Build a lazily connecting channel for `host:port`.
pub fn create_channel(address: &str, use_tls: bool) -> Result<Channel, String> {
    let scheme = if use_tls { "https" } else { "http" };
    let uri = if address.contains("://") {
        address.to_string()
    } else {
        format!("{scheme}://{address}")
    };

    let mut endpoint = Endpoint::from_shared(uri.clone())
        .map_err(|e| format!("Invalid gRPC address '{address}': {e}"))?
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_nodelay(true);

    if use_tls {
        endpoint = endpoint
            .tls_config(ClientTlsConfig::new())
            .map_err(|e| format!("TLS config error: {e}"))?;
    }

    debug!(uri = %uri, tls = use_tls, "Created lazy gRPC channel");
    Ok(endpoint.connect_lazy())
}
