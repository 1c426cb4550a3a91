//! Batched, retried delivery of messages through a [`PushTransport`]

use crate::client::PushTransport;
use crate::error::PushError;
use crate::models::{ExpoMessage, PushTicket};
use crate::retry::RetryPolicy;
use std::ops::Range;
use tracing::{debug, info, warn};

/// Largest batch the Expo gateway accepts in one request
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Tickets the gateway returned for one chunk
#[derive(Debug)]
pub struct BatchTickets {
    /// Positions of the chunk's messages in the sent slice
    pub range: Range<usize>,
    pub tickets: Vec<PushTicket>,
}

#[derive(Debug)]
pub enum SendOutcome {
    /// Nothing was sent; the messages were only logged
    DryRun,
    /// Tickets of every chunk the gateway accepted, in message order
    ///
    /// `failure` holds the error of the chunk that stopped the send when at
    /// least one earlier chunk had already been delivered.
    Sent {
        batches: Vec<BatchTickets>,
        failure: Option<PushError>,
    },
}

pub struct BatchSender<T> {
    transport: T,
    retry: RetryPolicy,
    dry_run: bool,
    batch_size: usize,
}

impl<T: PushTransport> BatchSender<T> {
    pub fn new(transport: T, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            dry_run: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `messages`, chunked to the batch size, each chunk under the retry policy
    ///
    /// The first chunk that fails after retries stops the send. Chunks after
    /// it are not attempted, while tickets of chunks before it are kept in the
    /// outcome together with the failure.
    ///
    /// # Errors
    ///
    /// Returns the error directly when the very first chunk fails.
    pub async fn send(&self, messages: &[ExpoMessage]) -> Result<SendOutcome, PushError> {
        if self.dry_run {
            for message in messages {
                info!(to = %message.to, title = ?message.title, "Dry run, push message not sent");
            }
            return Ok(SendOutcome::DryRun);
        }

        let mut batches = Vec::new();
        let mut start = 0;
        for (index, chunk) in messages.chunks(self.batch_size).enumerate() {
            debug!(batch = index, size = chunk.len(), "Sending push batch");
            match self.retry.run(|| self.transport.send_batch(chunk)).await {
                Ok(tickets) => batches.push(BatchTickets {
                    range: start..start + chunk.len(),
                    tickets,
                }),
                Err(err) if batches.is_empty() => return Err(err),
                Err(err) => {
                    warn!(
                        batch = index,
                        delivered_batches = batches.len(),
                        "Push batch failed after earlier batches were sent: {}",
                        err
                    );
                    return Ok(SendOutcome::Sent {
                        batches,
                        failure: Some(err),
                    });
                }
            }
            start += chunk.len();
        }

        Ok(SendOutcome::Sent {
            batches,
            failure: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TicketStatus;
    use std::sync::Mutex;

    /// Records every batch and replays scripted results, then answers ok
    struct ScriptedTransport {
        batches: Mutex<Vec<usize>>,
        script: Mutex<Vec<Result<(), PushError>>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<(), PushError>>) -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                script: Mutex::new(script),
            }
        }

        fn calls(&self) -> Vec<usize> {
            self.batches.lock().unwrap().clone()
        }
    }

    impl PushTransport for ScriptedTransport {
        async fn send_batch(&self, messages: &[ExpoMessage]) -> Result<Vec<PushTicket>, PushError> {
            self.batches.lock().unwrap().push(messages.len());
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.is_empty() {
                    Ok(())
                } else {
                    script.remove(0)
                }
            };
            next?;
            Ok(messages
                .iter()
                .map(|m| PushTicket {
                    status: TicketStatus::Ok,
                    id: Some(format!("receipt-{}", m.to)),
                    message: None,
                    details: None,
                })
                .collect())
        }
    }

    fn messages(n: usize) -> Vec<ExpoMessage> {
        (0..n)
            .map(|i| ExpoMessage {
                to: format!("ExponentPushToken[{i}]"),
                title: Some("Reminder".to_string()),
                body: None,
                data: None,
                sound: None,
                priority: None,
                channel_id: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_dry_run_never_calls_transport() {
        let sender = BatchSender::new(ScriptedTransport::new(vec![]), RetryPolicy::default()).dry_run(true);
        let outcome = sender.send(&messages(3)).await.unwrap();
        assert!(matches!(outcome, SendOutcome::DryRun));
        assert!(sender.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_messages_are_chunked() {
        let sender = BatchSender::new(ScriptedTransport::new(vec![]), RetryPolicy::default()).batch_size(2);
        let outcome = sender.send(&messages(5)).await.unwrap();

        match outcome {
            SendOutcome::Sent { batches, failure } => {
                assert!(failure.is_none());
                let ranges: Vec<_> = batches.iter().map(|b| b.range.clone()).collect();
                assert_eq!(ranges, vec![0..2, 2..4, 4..5]);
                assert_eq!(batches.iter().map(|b| b.tickets.len()).sum::<usize>(), 5);
            }
            SendOutcome::DryRun => panic!("expected a real send"),
        }
        assert_eq!(sender.transport().calls(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_once() {
        let transport = ScriptedTransport::new(vec![Err(PushError::TransientTransport(
            "connection reset".to_string(),
        ))]);
        let sender = BatchSender::new(transport, RetryPolicy::default());

        assert!(sender.send(&messages(2)).await.is_ok());
        assert_eq!(sender.transport().calls(), vec![2, 2]);
    }

    #[tokio::test]
    async fn test_later_chunk_failure_keeps_earlier_tickets() {
        let transport = ScriptedTransport::new(vec![
            Ok(()),
            Err(PushError::Gateway {
                status: 500,
                message: "internal".to_string(),
            }),
        ]);
        let sender = BatchSender::new(transport, RetryPolicy::default()).batch_size(1);

        match sender.send(&messages(3)).await.unwrap() {
            SendOutcome::Sent { batches, failure } => {
                assert_eq!(batches.len(), 1);
                assert_eq!(batches[0].range, 0..1);
                assert_eq!(
                    batches[0].tickets[0].id.as_deref(),
                    Some("receipt-ExponentPushToken[0]")
                );
                assert!(matches!(failure, Some(PushError::Gateway { status: 500, .. })));
            }
            SendOutcome::DryRun => panic!("expected a real send"),
        }
        // the third chunk is never attempted
        assert_eq!(sender.transport().calls(), vec![1, 1]);
    }

    #[tokio::test]
    async fn test_first_chunk_failure_is_an_error() {
        let transport = ScriptedTransport::new(vec![Err(PushError::Gateway {
            status: 503,
            message: "unavailable".to_string(),
        })]);
        let sender = BatchSender::new(transport, RetryPolicy::default()).batch_size(2);

        let err = sender.send(&messages(4)).await.unwrap_err();
        assert!(matches!(err, PushError::Gateway { status: 503, .. }));
        assert_eq!(sender.transport().calls(), vec![2]);
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_clamped() {
        let sender = BatchSender::new(ScriptedTransport::new(vec![]), RetryPolicy::default()).batch_size(0);
        sender.send(&messages(2)).await.unwrap();
        assert_eq!(sender.transport().calls(), vec![1, 1]);
    }
}
