//! Receive loop: one inbound message in, one launch request (or one
//! rejection) out.

use anyhow::Result;
use tokio::sync::watch;

use tasklaunch_common::{BuildError, IncomingMessage, OutgoingMessage, TransformConfig};

// ── Channel ports ─────────────────────────────────────────────────────────────

/// Source of inbound messages.
///
/// A received message stays claimed by this consumer until it is
/// acknowledged; unacknowledged messages are redelivered after a restart.
#[allow(async_fn_in_trait)]
pub trait MessageSource {
    /// Token identifying one claimed message.
    type Receipt;

    /// Wait for the next message, up to the source's poll timeout.
    /// Returns `None` when the timeout elapses with nothing to read.
    async fn receive(&self) -> Result<Option<(IncomingMessage, Self::Receipt)>>;

    /// Release a message once its result has been published.
    async fn ack(&self, receipt: Self::Receipt) -> Result<()>;
}

/// Destination for transform results.
#[allow(async_fn_in_trait)]
pub trait MessageSink {
    /// Publish a launch request to the output channel.
    async fn emit(&self, message: &OutgoingMessage) -> Result<()>;
    /// Route a message that could not be transformed to the error channel.
    async fn reject(&self, message: &IncomingMessage, error: &BuildError) -> Result<()>;
}

// ── Processor ─────────────────────────────────────────────────────────────────

/// Outcome of handling a single message.
#[derive(Debug)]
pub enum Disposition {
    Emit(OutgoingMessage),
    Reject(BuildError),
}

/// Counters reported when the loop stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorStats {
    pub received: u64,
    pub emitted: u64,
    pub rejected: u64,
}

pub struct Processor {
    config: TransformConfig,
}

impl Processor {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Transform one message. Never touches a channel.
    pub fn handle(&self, message: &IncomingMessage) -> Disposition {
        match tasklaunch_common::transform(&self.config, message) {
            Ok(out) => Disposition::Emit(out),
            Err(e) => Disposition::Reject(e),
        }
    }

    /// Pull messages from `source` until `shutdown` flips to `true`.
    ///
    /// The flag is checked between messages, so an in-flight message is
    /// always finished. Channel errors end the loop; a message whose
    /// result could not be published is left unacknowledged.
    pub async fn run<S, K>(
        &self,
        source: &S,
        sink: &K,
        shutdown: watch::Receiver<bool>,
    ) -> Result<ProcessorStats>
    where
        S: MessageSource,
        K: MessageSink,
    {
        let mut stats = ProcessorStats::default();

        while !*shutdown.borrow() {
            let Some((message, receipt)) = source.receive().await? else {
                continue;
            };
            stats.received += 1;
            tracing::debug!(
                payload = %message.payload,
                headers = message.headers.len(),
                "received message",
            );

            match self.handle(&message) {
                Disposition::Emit(out) => {
                    sink.emit(&out).await?;
                    stats.emitted += 1;
                    tracing::info!(bytes = out.payload.len(), "emitted launch request");
                }
                Disposition::Reject(error) => {
                    tracing::warn!(
                        error = %error,
                        code = error.code(),
                        "rejected message",
                    );
                    sink.reject(&message, &error).await?;
                    stats.rejected += 1;
                }
            }
            source.ack(receipt).await?;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use tasklaunch_common::{APPLICATION_JSON, LaunchRequest};

    /// In-memory channels; requests shutdown once the inbox drains.
    /// Receipts are the message's position in the inbox.
    struct FakeChannels {
        inbox: Mutex<VecDeque<(IncomingMessage, usize)>>,
        acked: Mutex<Vec<usize>>,
        emitted: Mutex<Vec<OutgoingMessage>>,
        rejected: Mutex<Vec<(IncomingMessage, BuildError)>>,
        shutdown: watch::Sender<bool>,
        fail_emit: bool,
    }

    impl FakeChannels {
        fn new(payloads: &[&str]) -> (Self, watch::Receiver<bool>) {
            let (tx, rx) = watch::channel(false);
            let channels = Self {
                inbox: Mutex::new(
                    payloads
                        .iter()
                        .enumerate()
                        .map(|(i, p)| (IncomingMessage::new(*p), i))
                        .collect(),
                ),
                acked: Mutex::new(Vec::new()),
                emitted: Mutex::new(Vec::new()),
                rejected: Mutex::new(Vec::new()),
                shutdown: tx,
                fail_emit: false,
            };
            (channels, rx)
        }
    }

    impl MessageSource for FakeChannels {
        type Receipt = usize;

        async fn receive(&self) -> Result<Option<(IncomingMessage, usize)>> {
            let next = self.inbox.lock().unwrap().pop_front();
            if next.is_none() {
                self.shutdown.send_replace(true);
            }
            Ok(next)
        }

        async fn ack(&self, receipt: usize) -> Result<()> {
            self.acked.lock().unwrap().push(receipt);
            Ok(())
        }
    }

    impl MessageSink for FakeChannels {
        async fn emit(&self, message: &OutgoingMessage) -> Result<()> {
            if self.fail_emit {
                anyhow::bail!("output channel unavailable");
            }
            self.emitted.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn reject(&self, message: &IncomingMessage, error: &BuildError) -> Result<()> {
            self.rejected
                .lock()
                .unwrap()
                .push((message.clone(), error.clone()));
            Ok(())
        }
    }

    #[test]
    fn handle_emits_json_request() {
        let processor = Processor::new(TransformConfig::with_uri("MY_URI"));
        let Disposition::Emit(out) = processor.handle(&IncomingMessage::new("hello")) else {
            panic!("expected emit");
        };
        assert_eq!(out.content_type(), Some(APPLICATION_JSON));
        let req: LaunchRequest = serde_json::from_str(&out.payload).unwrap();
        assert_eq!(req.uri, "MY_URI");
    }

    #[test]
    fn handle_rejects_without_uri() {
        let processor = Processor::new(TransformConfig::default());
        assert!(matches!(
            processor.handle(&IncomingMessage::new("hello")),
            Disposition::Reject(BuildError::MissingUri)
        ));
    }

    #[tokio::test]
    async fn run_emits_one_request_per_message() {
        let (channels, shutdown) = FakeChannels::new(&["hello", "hello world", "hi!", ""]);
        let processor = Processor::new(TransformConfig::with_uri("MY_URI"));

        let stats = processor.run(&channels, &channels, shutdown).await.unwrap();

        assert_eq!(
            stats,
            ProcessorStats {
                received: 4,
                emitted: 4,
                rejected: 0
            }
        );
        let emitted = channels.emitted.lock().unwrap();
        for out in emitted.iter() {
            let req: LaunchRequest = serde_json::from_str(&out.payload).unwrap();
            assert_eq!(req.uri, "MY_URI");
        }
        assert_eq!(*channels.acked.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn run_routes_rejections_to_sink() {
        let (channels, shutdown) = FakeChannels::new(&["hello"]);
        let processor = Processor::new(TransformConfig::default());

        let stats = processor.run(&channels, &channels, shutdown).await.unwrap();

        assert_eq!(stats.rejected, 1);
        assert!(channels.emitted.lock().unwrap().is_empty());
        let rejected = channels.rejected.lock().unwrap();
        assert_eq!(rejected[0].0.payload, "hello");
        assert_eq!(rejected[0].1, BuildError::MissingUri);
        assert_eq!(*channels.acked.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn run_stops_immediately_when_already_shut_down() {
        let (channels, _) = FakeChannels::new(&["hello"]);
        let (_tx, rx) = watch::channel(true);
        let processor = Processor::new(TransformConfig::with_uri("MY_URI"));

        let stats = processor.run(&channels, &channels, rx).await.unwrap();

        assert_eq!(stats, ProcessorStats::default());
        assert_eq!(channels.inbox.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn run_propagates_channel_errors() {
        let (mut channels, shutdown) = FakeChannels::new(&["hello"]);
        channels.fail_emit = true;
        let processor = Processor::new(TransformConfig::with_uri("MY_URI"));

        let err = processor
            .run(&channels, &channels, shutdown)
            .await
            .expect_err("emit failure must end the loop");
        assert!(err.to_string().contains("output channel unavailable"));
        assert!(channels.acked.lock().unwrap().is_empty());
    }
}
