//! Authentication state and the per-client observer list.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use strum::Display;

use crate::types::User;

/// Where the client is in the session lifecycle.
///
/// `Unauthenticated -> Authenticated -> Refreshing -> Authenticated`, or back
/// to `Unauthenticated` when a refresh fails or the user signs out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated,
    Refreshing,
}

/// Notifications delivered to listeners registered with
/// [`crate::PlintoClient::on_auth_change`].
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn { user: Option<User> },
    SignedUp { user: Option<User> },
    SignedOut,
    TokenRefreshed,
    /// The refresh token was rejected; local credentials were cleared.
    SessionExpired,
    UserUpdated { user: User },
}

impl AuthEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SignedIn { .. } => "signed_in",
            Self::SignedUp { .. } => "signed_up",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed => "token_refreshed",
            Self::SessionExpired => "session_expired",
            Self::UserUpdated { .. } => "user_updated",
        }
    }
}

/// Callback invoked for every [`AuthEvent`].
pub type AuthListener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

/// Handle returned by `on_auth_change`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct EventRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, AuthListener)>>,
}

impl EventRegistry {
    fn listeners(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, AuthListener)>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn subscribe(&self, listener: AuthListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Listeners run outside the lock so they may (un)subscribe themselves.
    pub(crate) fn emit(&self, event: &AuthEvent) {
        let snapshot: Vec<AuthListener> = self
            .listeners()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        tracing::debug!(event = event.name(), listeners = snapshot.len(), "Auth event");
        for listener in snapshot {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, AuthListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: AuthListener = Arc::new(move |event: &AuthEvent| {
            sink.lock().unwrap().push(event.name());
        });
        (seen, listener)
    }

    #[test]
    fn emits_to_every_listener_in_order() {
        let registry = EventRegistry::default();
        let (first, listener_a) = recorder();
        let (second, listener_b) = recorder();
        registry.subscribe(listener_a);
        registry.subscribe(listener_b);

        registry.emit(&AuthEvent::SignedOut);
        registry.emit(&AuthEvent::TokenRefreshed);

        assert_eq!(*first.lock().unwrap(), vec!["signed_out", "token_refreshed"]);
        assert_eq!(*second.lock().unwrap(), vec!["signed_out", "token_refreshed"]);
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let registry = EventRegistry::default();
        let (seen, listener) = recorder();
        let id = registry.subscribe(listener);

        registry.emit(&AuthEvent::SignedOut);
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.emit(&AuthEvent::SessionExpired);

        assert_eq!(*seen.lock().unwrap(), vec!["signed_out"]);
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_emit() {
        let registry = Arc::new(EventRegistry::default());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let (reg, slot_ref) = (registry.clone(), slot.clone());
        let id = registry.subscribe(Arc::new(move |_event: &AuthEvent| {
            if let Some(id) = *slot_ref.lock().unwrap() {
                reg.unsubscribe(id);
            }
        }));
        *slot.lock().unwrap() = Some(id);

        registry.emit(&AuthEvent::SignedOut);
        assert!(!registry.unsubscribe(id));
    }

    #[test]
    fn state_displays_snake_case() {
        assert_eq!(AuthState::Unauthenticated.to_string(), "unauthenticated");
        assert_eq!(AuthState::Refreshing.to_string(), "refreshing");
    }
}
