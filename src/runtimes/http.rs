//! HTTP implementation of the [`Transport`] boundary.
//!
//! Posts the run request as JSON, then reads the chunked response body,
//! pushing each chunk through a [`FrameDecoder`] and forwarding decoded
//! events over the stream channel from a spawned task. The reducer side
//! never blocks on the wire.

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, warn};

use super::config::RuntimeConfig;
use super::transport::{FrameDecoder, RunEventStream, RunRequest, Transport, TransportError};

/// [`Transport`] over a streaming HTTP backend.
///
/// # Examples
///
/// ```rust,no_run
/// use loomflow::runtimes::{HttpTransport, RuntimeConfig};
///
/// let transport = HttpTransport::new(RuntimeConfig::new("http://backend:8787"))
///     .expect("client construction");
/// ```
pub struct HttpTransport {
    client: reqwest::Client,
    config: RuntimeConfig,
}

impl HttpTransport {
    /// Build a transport over the given configuration.
    pub fn new(config: RuntimeConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|err| TransportError::Connect {
                message: err.to_string(),
            })?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(&self, request: RunRequest) -> Result<RunEventStream, TransportError> {
        let response = self
            .client
            .post(self.config.run_url())
            .json(&request)
            .send()
            .await
            .map_err(|err| TransportError::Connect {
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Rejected {
                status: status.as_u16(),
            });
        }

        let (tx, stream) = RunEventStream::channel();
        let run_id = request.run_id;
        tokio::spawn(async move {
            let mut decoder = FrameDecoder::new();
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        for event in decoder.feed(&bytes) {
                            if tx.send(event).is_err() {
                                // Receiver dropped: the session is gone,
                                // stop reading.
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        warn!(run = %run_id, error = %err, "event stream read failed");
                        break;
                    }
                }
            }
            if let Some(event) = decoder.finish() {
                let _ = tx.send(event);
            }
            debug!(run = %run_id, "event stream closed");
        });

        Ok(stream)
    }

    async fn cancel(&self, execution_id: &str) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.config.stop_url(execution_id))
            .send()
            .await
            .map_err(|err| TransportError::Cancel {
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Cancel {
                message: format!("stop endpoint returned status {}", response.status()),
            });
        }
        Ok(())
    }
}
