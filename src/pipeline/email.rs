//! QR email pipeline: allocate, render, compose, send, clean up.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::artifacts::ArtifactStore;
use crate::mail::{DeliveryResult, MailDispatcher, NotificationComposer, SendError};
use crate::observability::metrics;
use crate::pipeline::request::EmailRequest;
use crate::qr::{EncodingError, QrEncoder};

/// Errors surfaced after validation succeeded.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Send(#[from] SendError),

    /// The blocking render task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Everything needed to turn an [`EmailRequest`] into a delivered message.
#[derive(Clone)]
pub struct EmailPipeline {
    store: ArtifactStore,
    encoder: QrEncoder,
    composer: NotificationComposer,
    dispatcher: Arc<dyn MailDispatcher>,
}

impl EmailPipeline {
    pub fn new(
        store: ArtifactStore,
        encoder: QrEncoder,
        composer: NotificationComposer,
        dispatcher: Arc<dyn MailDispatcher>,
    ) -> Self {
        Self {
            store,
            encoder,
            composer,
            dispatcher,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Render the QR code, mail it, and delete the image.
    ///
    /// Once an artifact is allocated it is removed on every path out of this
    /// function. Render failures and send results go through
    /// [`ArtifactStore::remove`]; a panic or a dropped request future falls
    /// back to the artifact's own drop cleanup.
    pub async fn send_qr_email(
        &self,
        request: EmailRequest,
    ) -> Result<DeliveryResult, PipelineError> {
        let started = Instant::now();
        let artifact = self.store.allocate();

        // The artifact travels with the blocking task so a render that
        // finishes after the request is gone still cleans up its file.
        let encoder = self.encoder.clone();
        let target_url = request.target_url.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            let result = encoder.render(&target_url, artifact.path());
            (artifact, result)
        })
        .await;

        let artifact = match rendered {
            Ok((artifact, Ok(()))) => artifact,
            Ok((artifact, Err(e))) => {
                tracing::error!(error = %e, target_url = %request.target_url, "QR rendering failed");
                self.store.remove(artifact).await;
                metrics::record_email("render_failed", started);
                return Err(e.into());
            }
            Err(e) => {
                tracing::error!(error = %e, target_url = %request.target_url, "QR render task failed");
                metrics::record_email("render_failed", started);
                return Err(PipelineError::Internal(e.to_string()));
            }
        };

        let message = self.composer.compose(&request.recipient, &artifact);
        let sent = self.dispatcher.send(&message).await;

        self.store.remove(artifact).await;

        match sent {
            Ok(result) => {
                tracing::info!(
                    recipient = %request.recipient,
                    message_id = %result.message_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "QR email sent"
                );
                metrics::record_email("sent", started);
                Ok(result)
            }
            Err(e) => {
                tracing::error!(recipient = %request.recipient, error = %e, "QR email failed");
                metrics::record_email("send_failed", started);
                Err(e.into())
            }
        }
    }
}

impl std::fmt::Debug for EmailPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailPipeline")
            .field("store", &self.store)
            .field("composer", &self.composer)
            .finish()
    }
}
