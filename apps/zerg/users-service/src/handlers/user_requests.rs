//! Request/reply loop for the user patterns

use crate::messaging::{
    MessageBroker, MessageStream, ReceivedMessage, ReplyEnvelope, RequestEnvelope,
};
use domain_users::{UserDispatcher, UserError, UserRepository};
use eyre::{Result, WrapErr};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

/// Answers user requests: one subscription per pattern, bounded concurrency
pub struct UserRequestHandler<B: MessageBroker, R: UserRepository> {
    broker: Arc<B>,
    dispatcher: UserDispatcher<R>,
    queue_group: String,
    limit: Arc<Semaphore>,
}

impl<B, R> UserRequestHandler<B, R>
where
    B: MessageBroker + 'static,
    R: UserRepository + 'static,
{
    pub fn new(
        broker: Arc<B>,
        dispatcher: UserDispatcher<R>,
        queue_group: impl Into<String>,
        max_concurrent_handlers: usize,
    ) -> Self {
        Self {
            broker,
            dispatcher,
            queue_group: queue_group.into(),
            limit: Arc::new(Semaphore::new(max_concurrent_handlers.max(1))),
        }
    }

    /// Serve `patterns` until `shutdown` resolves or every subscription
    /// closes, then wait for in-flight requests and flush the broker.
    pub async fn run(
        self: Arc<Self>,
        patterns: &[&str],
        shutdown: impl Future<Output = ()>,
    ) -> Result<()> {
        let mut streams: Vec<Box<dyn MessageStream>> = Vec::new();
        for pattern in patterns {
            let stream = self
                .broker
                .queue_subscribe(pattern, &self.queue_group)
                .await?;
            streams.push(stream);
        }

        info!(
            patterns = ?patterns,
            queue_group = %self.queue_group,
            "User request handler started"
        );

        // Fan all subscriptions into one channel. On shutdown each listener
        // unsubscribes and forwards whatever its subscription already holds.
        let (stop, _) = watch::channel(false);
        let (tx, mut rx) = mpsc::channel::<ReceivedMessage>(self.limit.available_permits());
        let mut listeners = JoinSet::new();
        for stream in streams {
            listeners.spawn(forward(stream, tx.clone(), stop.subscribe()));
        }
        drop(tx);

        let mut in_flight = JoinSet::new();
        let mut accepting = true;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown, if accepting => {
                    info!("Shutdown requested, no longer accepting requests");
                    accepting = false;
                    stop.send_replace(true);
                }
                next = next_request(&mut rx, &self.limit) => match next? {
                    Some((msg, permit)) => {
                        let this = Arc::clone(&self);
                        in_flight.spawn(async move {
                            this.process(msg).await;
                            drop(permit);
                        });
                    }
                    None => {
                        if accepting {
                            warn!("All subscriptions closed");
                        }
                        break;
                    }
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Request task failed");
                    }
                }
            }
        }

        while let Some(joined) = listeners.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Subscription listener failed");
            }
        }

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "Waiting for in-flight requests");
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Request task failed");
            }
        }

        self.broker.flush().await?;
        info!("User request handler stopped");
        Ok(())
    }

    /// Handle one message and publish the reply
    async fn process(&self, msg: ReceivedMessage) {
        let Some(reply_to) = msg.reply.clone() else {
            warn!(subject = %msg.subject, "Request has no reply subject, dropping");
            return;
        };

        let reply = self.handle_message(&msg).await;
        let body = match serde_json::to_vec(&reply) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, subject = %msg.subject, "Failed to encode reply");
                return;
            }
        };

        if let Err(e) = self.broker.publish_raw(&reply_to, &body).await {
            error!(error = %e, subject = %msg.subject, "Failed to send reply");
        }
    }

    #[instrument(skip(self, msg), fields(subject = %msg.subject))]
    async fn handle_message(&self, msg: &ReceivedMessage) -> ReplyEnvelope {
        let started = Instant::now();

        let envelope: RequestEnvelope = match msg.parse_payload() {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Request body is not valid JSON");
                let fault = UserError::BadRequest("Invalid JSON payload".to_string());
                return ReplyEnvelope::fault(None, &fault);
            }
        };

        let reply = match self.dispatcher.dispatch(&msg.subject, envelope.data).await {
            Ok(response) => ReplyEnvelope::success(envelope.id, response),
            Err(e) => {
                warn!(status = e.status().as_u16(), message = %e, "Request failed");
                ReplyEnvelope::fault(envelope.id, &e)
            }
        };

        info!(
            status = reply.err.as_ref().map_or(200, |f| f.status),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request handled"
        );
        reply
    }
}

/// Wait for a free handler slot, then for the next request.
/// `None` once every listener has finished.
async fn next_request(
    rx: &mut mpsc::Receiver<ReceivedMessage>,
    limit: &Arc<Semaphore>,
) -> Result<Option<(ReceivedMessage, OwnedSemaphorePermit)>> {
    let permit = Arc::clone(limit)
        .acquire_owned()
        .await
        .wrap_err("Request limiter closed")?;
    Ok(rx.recv().await.map(|msg| (msg, permit)))
}

/// Pump one subscription into the request channel until it closes or
/// `stop` flips, then unsubscribe and drain what was already delivered.
async fn forward(
    mut stream: Box<dyn MessageStream>,
    tx: mpsc::Sender<ReceivedMessage>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            received = stream.next() => match received {
                Some(msg) => {
                    if tx.send(msg).await.is_err() {
                        return;
                    }
                }
                None => return,
            },
        }
    }

    if let Err(e) = stream.unsubscribe().await {
        warn!(error = %e, "Failed to unsubscribe");
        return;
    }
    while let Some(msg) = stream.next().await {
        if tx.send(msg).await.is_err() {
            return;
        }
    }
}
