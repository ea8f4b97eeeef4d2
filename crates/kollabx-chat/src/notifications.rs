//! Notification feed and unread badge.

use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;

use kollabx_models::{ChangeEvent, ChangeKind, Notification, NotificationId};

use crate::backend::{NotificationBackend, NotificationEvents};
use crate::error::ChatError;

pub use kollabx_sdk::notifications::FEED_LIMIT;

/// Events older than this at subscription time never toast. The bus can
/// replay recent events on connect; replays must not re-alert the user.
const TOAST_GRACE: Duration = Duration::seconds(3);

/// The signed-in user's notification state: a bounded newest-first feed,
/// the unread badge count, and the live subscription keeping both fresh.
pub struct NotificationCenter<B> {
    backend: B,
    /// Newest first, at most [`FEED_LIMIT`] entries.
    items: Vec<Notification>,
    unread: usize,
    feed: Option<NotificationEvents>,
    established_at: Option<DateTime<Utc>>,
}

impl<B: NotificationBackend> NotificationCenter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            items: Vec::new(),
            unread: 0,
            feed: None,
            established_at: None,
        }
    }

    /// Load the initial feed and badge count, then open the live
    /// subscription.
    pub async fn start(&mut self) -> Result<(), ChatError> {
        self.unread = self.backend.unread_count().await?;
        self.items = self.backend.recent_notifications().await?;
        self.feed = Some(self.backend.subscribe_notifications().await?);
        self.established_at = Some(Utc::now());
        Ok(())
    }

    /// Await the next live change and apply it.
    ///
    /// Returns the notification when the change warrants an alert (a
    /// fresh unread insert); replayed or silent changes return `None`.
    /// Pends forever while no subscription is live.
    pub async fn pump(&mut self) -> Result<Option<Notification>, ChatError> {
        match self.feed.as_mut() {
            Some(feed) => match feed.next().await {
                Some(event) => Ok(self.apply_event(event)),
                None => {
                    self.feed = None;
                    Ok(None)
                }
            },
            None => futures::future::pending().await,
        }
    }

    /// Apply one change event; returns the notification to alert with,
    /// if any.
    pub fn apply_event(&mut self, event: ChangeEvent<Notification>) -> Option<Notification> {
        match event.kind {
            ChangeKind::Insert => event.new.and_then(|n| self.apply_insert(n)),
            ChangeKind::Update => {
                if let Some(n) = event.new {
                    self.apply_update(n);
                }
                None
            }
            ChangeKind::Delete => {
                if let Some(n) = event.old {
                    self.apply_delete(n.id);
                }
                None
            }
        }
    }

    fn apply_insert(&mut self, notification: Notification) -> Option<Notification> {
        if self.items.iter().any(|n| n.id == notification.id) {
            return None;
        }
        if !notification.read {
            self.unread += 1;
        }
        self.items.insert(0, notification.clone());
        self.items.truncate(FEED_LIMIT);

        let fresh = self
            .established_at
            .is_some_and(|at| notification.created_at >= at - TOAST_GRACE);
        (fresh && !notification.read).then_some(notification)
    }

    fn apply_update(&mut self, notification: Notification) {
        let Some(slot) = self.items.iter_mut().find(|n| n.id == notification.id) else {
            return;
        };
        if !slot.read && notification.read {
            self.unread = self.unread.saturating_sub(1);
        }
        *slot = notification;
    }

    fn apply_delete(&mut self, id: NotificationId) {
        if let Some(pos) = self.items.iter().position(|n| n.id == id) {
            if !self.items[pos].read {
                self.unread = self.unread.saturating_sub(1);
            }
            self.items.remove(pos);
        }
    }

    /// Mark one notification read, patching local state immediately.
    pub async fn mark_read(&mut self, id: NotificationId) -> Result<(), ChatError> {
        self.backend.mark_read(id).await?;
        if let Some(slot) = self.items.iter_mut().find(|n| n.id == id) {
            if !slot.read {
                slot.read = true;
                self.unread = self.unread.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Mark everything read. Local state is patched without a refetch so
    /// the badge clears instantly.
    pub async fn mark_all_read(&mut self) -> Result<(), ChatError> {
        self.backend.mark_all_read().await?;
        for item in &mut self.items {
            item.read = true;
        }
        self.unread = 0;
        Ok(())
    }

    /// Current unread badge count.
    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Feed entries, newest first.
    pub fn items(&self) -> &[Notification] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{notification_for, FakeNotifier};
    use kollabx_models::UserId;

    #[tokio::test]
    async fn start_loads_badge_and_feed() {
        let user = UserId::generate();
        let backend = FakeNotifier::new();
        backend.seed(notification_for(user, Utc::now() - Duration::hours(2), "old"));
        let mut read_one = notification_for(user, Utc::now() - Duration::hours(1), "seen");
        read_one.read = true;
        backend.seed(read_one);

        let mut center = NotificationCenter::new(backend);
        center.start().await.unwrap();

        assert_eq!(center.unread(), 1);
        assert_eq!(center.items().len(), 2);
        assert_eq!(center.items()[0].title, "seen", "newest first");
    }

    #[tokio::test]
    async fn live_insert_bumps_badge_and_alerts() {
        let user = UserId::generate();
        let backend = FakeNotifier::new();
        let mut center = NotificationCenter::new(backend.clone());
        center.start().await.unwrap();

        backend.emit(notification_for(user, Utc::now(), "fresh"));
        let alert = center.pump().await.unwrap();

        assert_eq!(center.unread(), 1);
        assert_eq!(center.items().len(), 1);
        assert_eq!(alert.unwrap().title, "fresh");
    }

    #[tokio::test]
    async fn replayed_event_updates_the_feed_but_never_alerts() {
        let user = UserId::generate();
        let backend = FakeNotifier::new();
        let mut center = NotificationCenter::new(backend.clone());
        center.start().await.unwrap();

        // Created well before the subscription was established.
        backend.emit(notification_for(
            user,
            Utc::now() - Duration::minutes(10),
            "replayed",
        ));
        let alert = center.pump().await.unwrap();

        assert!(alert.is_none());
        assert_eq!(center.unread(), 1, "badge still counts it");
        assert_eq!(center.items().len(), 1);
    }

    #[tokio::test]
    async fn feed_is_capped() {
        let user = UserId::generate();
        let backend = FakeNotifier::new();
        let mut center = NotificationCenter::new(backend.clone());
        center.start().await.unwrap();

        for i in 0..(FEED_LIMIT + 5) {
            backend.emit(notification_for(user, Utc::now(), &format!("n{i}")));
            center.pump().await.unwrap();
        }
        assert_eq!(center.items().len(), FEED_LIMIT);
        assert_eq!(center.unread(), FEED_LIMIT + 5);
    }

    #[tokio::test]
    async fn mark_all_read_clears_the_badge_locally() {
        let user = UserId::generate();
        let backend = FakeNotifier::new();
        backend.seed(notification_for(user, Utc::now(), "a"));
        backend.seed(notification_for(user, Utc::now(), "b"));

        let mut center = NotificationCenter::new(backend.clone());
        center.start().await.unwrap();
        assert_eq!(center.unread(), 2);

        center.mark_all_read().await.unwrap();
        assert_eq!(center.unread(), 0);
        assert!(center.items().iter().all(|n| n.read));
        assert!(backend.stored().iter().all(|n| n.read));
    }

    #[tokio::test]
    async fn mark_read_patches_one_entry() {
        let user = UserId::generate();
        let backend = FakeNotifier::new();
        let target = notification_for(user, Utc::now(), "target");
        backend.seed(target.clone());
        backend.seed(notification_for(user, Utc::now(), "other"));

        let mut center = NotificationCenter::new(backend);
        center.start().await.unwrap();
        center.mark_read(target.id).await.unwrap();

        assert_eq!(center.unread(), 1);
        assert!(center
            .items()
            .iter()
            .find(|n| n.id == target.id)
            .unwrap()
            .read);
    }

    #[tokio::test]
    async fn duplicate_insert_is_ignored() {
        let user = UserId::generate();
        let backend = FakeNotifier::new();
        let n = notification_for(user, Utc::now(), "once");
        let mut center = NotificationCenter::new(backend.clone());
        center.start().await.unwrap();

        center.apply_event(ChangeEvent::insert(n.clone()));
        center.apply_event(ChangeEvent::insert(n));
        assert_eq!(center.items().len(), 1);
        assert_eq!(center.unread(), 1);
    }
}
