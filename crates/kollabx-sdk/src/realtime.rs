//! Typed realtime change feeds.
//!
//! A [`ChangeFeed`] wraps one NATS subscription and decodes every payload
//! into a [`ChangeEvent`]. Delivery stops only when the feed is explicitly
//! torn down with [`ChangeFeed::unsubscribe`] (or dropped along with the
//! connection); callers that switch row sets must tear down the old feed
//! before opening the next one.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::de::DeserializeOwned;

use kollabx_models::ChangeEvent;

use crate::error::SdkError;

/// Decode one raw payload, logging and discarding malformed ones.
///
/// A bad payload must never wedge the feed: the event is skipped and the
/// subscription keeps delivering.
fn decode<T: DeserializeOwned>(subject: &str, payload: &[u8]) -> Option<ChangeEvent<T>> {
    match serde_json::from_slice(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(%subject, error = %e, "ignoring malformed change event");
            None
        }
    }
}

/// A live subscription to one row set's change events.
///
/// `T` is the row type carried by the events (e.g. `Message`,
/// `Notification`).
pub struct ChangeFeed<T> {
    subscriber: async_nats::Subscriber,
    subject: String,
    established_at: DateTime<Utc>,
    _row: PhantomData<fn() -> T>,
}

impl<T> ChangeFeed<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(subscriber: async_nats::Subscriber, subject: String) -> Self {
        Self {
            subscriber,
            subject,
            established_at: Utc::now(),
            _row: PhantomData,
        }
    }

    /// The subject this feed is subscribed to.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// When the subscription was established (UTC).
    ///
    /// Consumers use this to tell live events from backend replays of
    /// events that predate the subscription.
    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    /// Await the next decodable change event.
    ///
    /// Returns `None` once the subscription ends (unsubscribed or the
    /// connection closed).
    pub async fn next(&mut self) -> Option<ChangeEvent<T>> {
        while let Some(message) = self.subscriber.next().await {
            if let Some(event) = decode(&self.subject, &message.payload) {
                return Some(event);
            }
        }
        None
    }

    /// Tear the subscription down; no further events are delivered.
    pub async fn unsubscribe(mut self) -> Result<(), SdkError> {
        self.subscriber.unsubscribe().await?;
        Ok(())
    }

    /// Expose the feed as a plain event stream.
    ///
    /// Downstream state machines consume this without knowing anything
    /// about the underlying transport.
    pub fn into_stream(self) -> BoxStream<'static, ChangeEvent<T>> {
        let subject = self.subject;
        self.subscriber
            .filter_map(move |message| {
                let subject = subject.clone();
                async move { decode(&subject, &message.payload) }
            })
            .boxed()
    }
}
