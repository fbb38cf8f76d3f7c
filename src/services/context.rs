use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::models::{AuthIdentity, Locale, ThemePreference};
use crate::services::auth::{AuthSession, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivePreferences {
    pub theme: ThemePreference,
    pub locale: Locale,
}

/// Immutable snapshot handed to everything that renders or acts on behalf
/// of the visitor. A change produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppContext {
    pub preferences: ActivePreferences,
    pub current_user: Option<AuthIdentity>,
}

impl AppContext {
    pub fn new(locale: Locale) -> Self {
        Self {
            preferences: ActivePreferences {
                theme: ThemePreference::System,
                locale,
            },
            current_user: None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}

#[derive(Debug, Clone)]
pub enum ContextUpdate {
    SetTheme(ThemePreference),
    SetLocale(Locale),
    SignedIn(AuthIdentity),
    SignedOut,
}

#[derive(Clone)]
pub struct ContextHub {
    tx: Arc<watch::Sender<Arc<AppContext>>>,
}

impl ContextHub {
    pub fn new(initial: AppContext) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Arc<AppContext> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppContext>> {
        self.tx.subscribe()
    }

    /// Applies one update and returns the resulting snapshot. Subscribers
    /// are only woken when the snapshot actually changed.
    pub fn apply(&self, update: ContextUpdate) -> Arc<AppContext> {
        self.tx.send_if_modified(|ctx| {
            let mut next = AppContext::clone(ctx);
            match update {
                ContextUpdate::SetTheme(theme) => next.preferences.theme = theme,
                ContextUpdate::SetLocale(locale) => next.preferences.locale = locale,
                ContextUpdate::SignedIn(identity) => next.current_user = Some(identity),
                ContextUpdate::SignedOut => next.current_user = None,
            }
            if next == **ctx {
                return false;
            }
            *ctx = Arc::new(next);
            true
        });
        self.current()
    }

    /// Mirrors the session's identity into the context until the returned
    /// subscription is dropped.
    pub fn follow(&self, session: &AuthSession) -> Subscription {
        let hub = self.clone();
        session.subscribe(move |identity| {
            let update = match identity {
                Some(identity) => ContextUpdate::SignedIn(identity),
                None => ContextUpdate::SignedOut,
            };
            hub.apply(update);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> AuthIdentity {
        AuthIdentity {
            uid: "uid-1".to_string(),
            email: "jane@example.com".to_string(),
            display_name: Some("Jane".to_string()),
            email_verified: true,
        }
    }

    #[test]
    fn test_updates_produce_new_snapshots() {
        let hub = ContextHub::new(AppContext::new(Locale::En));
        let before = hub.current();

        let after = hub.apply(ContextUpdate::SetTheme(ThemePreference::Dark));
        assert_eq!(before.preferences.theme, ThemePreference::System);
        assert_eq!(after.preferences.theme, ThemePreference::Dark);

        let after = hub.apply(ContextUpdate::SetLocale(Locale::Fr));
        assert_eq!(after.preferences.locale, Locale::Fr);
        assert_eq!(after.preferences.theme, ThemePreference::Dark);
    }

    #[test]
    fn test_sign_in_and_out() {
        let hub = ContextHub::new(AppContext::new(Locale::En));
        assert!(hub.apply(ContextUpdate::SignedIn(identity())).current_user.is_some());
        assert!(hub.current().is_signed_in());
        assert!(!hub.apply(ContextUpdate::SignedOut).is_signed_in());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let hub = ContextHub::new(AppContext::new(Locale::En));
        let mut rx = hub.subscribe();

        hub.apply(ContextUpdate::SetLocale(Locale::En));
        assert!(!rx.has_changed().unwrap());

        hub.apply(ContextUpdate::SetLocale(Locale::De));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().preferences.locale, Locale::De);
    }
}
