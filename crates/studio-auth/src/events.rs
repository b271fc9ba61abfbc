//! Auth state change events and subscriber bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use studio_storage::Session;

/// Event delivered to auth state subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthChangeEvent {
    /// Sent once to each new subscriber with the state at registration time.
    InitialSession,
    SignedIn,
    SignedOut,
}

impl AuthChangeEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthChangeEvent::InitialSession => "INITIAL_SESSION",
            AuthChangeEvent::SignedIn => "SIGNED_IN",
            AuthChangeEvent::SignedOut => "SIGNED_OUT",
        }
    }
}

impl fmt::Display for AuthChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscriber callback.
pub type AuthCallback = Arc<dyn Fn(AuthChangeEvent, Option<&Session>) + Send + Sync>;

/// Ordered subscriber list. Registration order is notification order.
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: Mutex<Vec<(u64, AuthCallback)>>,
    next_id: AtomicU64,
}

impl Subscribers {
    pub fn add(&self, callback: AuthCallback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().unwrap().push((id, callback));
        id
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Invoke every subscriber registered right now. The list lock is
    /// released before any callback runs, so callbacks may subscribe or
    /// unsubscribe.
    pub fn notify(&self, event: AuthChangeEvent, session: Option<&Session>) {
        let callbacks: Vec<AuthCallback> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        for callback in callbacks {
            invoke(&callback, event, session);
        }
    }
}

/// Run one callback; a panic is logged and swallowed.
pub(crate) fn invoke(callback: &AuthCallback, event: AuthChangeEvent, session: Option<&Session>) {
    if catch_unwind(AssertUnwindSafe(|| callback(event, session))).is_err() {
        tracing::warn!(event = %event, "Auth state subscriber panicked");
    }
}

/// Handle returned by [`crate::SessionManager::on_auth_state_change`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to stop receiving events.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    subscribers: Weak<Subscribers>,
}

impl Subscription {
    pub(crate) fn new(id: u64, subscribers: &Arc<Subscribers>) -> Self {
        Self {
            id,
            subscribers: Arc::downgrade(subscribers),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove this registration. Safe to call more than once.
    pub fn unsubscribe(&self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.remove(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, name: &'static str) -> AuthCallback {
        let log = log.clone();
        Arc::new(move |event: AuthChangeEvent, _session: Option<&Session>| {
            log.lock().unwrap().push(format!("{}:{}", name, event))
        })
    }

    #[test]
    fn test_notify_in_registration_order() {
        let subscribers = Subscribers::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        subscribers.add(recorder(&log, "a"));
        subscribers.add(recorder(&log, "b"));

        subscribers.notify(AuthChangeEvent::SignedOut, None);

        assert_eq!(*log.lock().unwrap(), vec!["a:SIGNED_OUT", "b:SIGNED_OUT"]);
    }

    #[test]
    fn test_remove_by_id_only_removes_that_entry() {
        let subscribers = Subscribers::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        let callback = recorder(&log, "same");
        let first = subscribers.add(callback.clone());
        subscribers.add(callback);

        assert!(subscribers.remove(first));
        assert!(!subscribers.remove(first));
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn test_panicking_subscriber_does_not_stop_others() {
        let subscribers = Subscribers::default();
        let log = Arc::new(Mutex::new(Vec::new()));
        subscribers.add(Arc::new(|_: AuthChangeEvent, _: Option<&Session>| {
            panic!("broken subscriber")
        }));
        subscribers.add(recorder(&log, "after"));

        subscribers.notify(AuthChangeEvent::SignedIn, None);

        assert_eq!(*log.lock().unwrap(), vec!["after:SIGNED_IN"]);
    }

    #[test]
    fn test_unsubscribe_after_list_dropped_is_noop() {
        let subscribers = Arc::new(Subscribers::default());
        let subscription = Subscription::new(7, &subscribers);
        drop(subscribers);
        subscription.unsubscribe();
    }

    #[test]
    fn test_event_wire_names() {
        assert_eq!(
            serde_json::to_value(AuthChangeEvent::InitialSession).unwrap(),
            "INITIAL_SESSION"
        );
        assert_eq!(AuthChangeEvent::SignedOut.to_string(), "SIGNED_OUT");
    }
}
