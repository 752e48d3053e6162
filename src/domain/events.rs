use crate::domain::model::Session;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// A session change published by an auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub change: AuthChange,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            change: AuthChange::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            change: AuthChange::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            change: AuthChange::TokenRefreshed,
            session: Some(session),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionPoll {
    Event(AuthEvent),
    /// Some notifications were dropped; the listener must resynchronize.
    Missed(u64),
    Empty,
    Closed,
}

/// Publishing side, held by auth service implementations.
#[derive(Debug, Clone)]
pub struct SessionNotifier {
    sender: broadcast::Sender<AuthEvent>,
}

impl SessionNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: AuthEvent) {
        // No subscribers is fine: nobody is listening yet.
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!("🔔 Session change delivered to {} subscriber(s)", delivered);
    }

    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Listening side. Dropping it (or calling [`unsubscribe`](Self::unsubscribe))
/// ends the subscription.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl SessionSubscription {
    /// Non-blocking poll used by the event loop between user actions.
    pub fn poll(&mut self) -> SubscriptionPoll {
        match self.receiver.try_recv() {
            Ok(event) => SubscriptionPoll::Event(event),
            Err(broadcast::error::TryRecvError::Lagged(missed)) => SubscriptionPoll::Missed(missed),
            Err(broadcast::error::TryRecvError::Empty) => SubscriptionPoll::Empty,
            Err(broadcast::error::TryRecvError::Closed) => SubscriptionPoll::Closed,
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}
