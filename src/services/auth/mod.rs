pub mod firebase;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::AuthIdentity;

/// Result of a successful sign-up or sign-in. The token is only needed for
/// follow-up calls made on the user's behalf.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub identity: AuthIdentity,
    pub id_token: String,
}

/// Email/password identity backend. Implementations map their own failure
/// codes onto `AppError` so callers see validation, conflict and
/// unauthorized cases rather than raw HTTP errors.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthGrant, AppError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AppError>;
    async fn sign_out(&self, grant: &AuthGrant) -> Result<(), AppError>;
    async fn send_password_reset(&self, email: &str) -> Result<(), AppError>;
    async fn send_email_verification(&self, id_token: &str) -> Result<(), AppError>;
    /// Resolves an ID token to the identity it was issued for. Expired or
    /// forged tokens are `Unauthorized`.
    async fn verify_id_token(&self, id_token: &str) -> Result<AuthIdentity, AppError>;
}

/// Handle returned by `AuthSession::subscribe`. Delivery stops on
/// `unsubscribe()` or drop.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One signed-in user at a time, with change notifications.
pub struct AuthSession {
    provider: Arc<dyn AuthProvider>,
    grant: tokio::sync::Mutex<Option<AuthGrant>>,
    identity: watch::Sender<Option<AuthIdentity>>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        let (identity, _rx) = watch::channel(None);
        Self {
            provider,
            grant: tokio::sync::Mutex::new(None),
            identity,
        }
    }

    pub fn current_user(&self) -> Option<AuthIdentity> {
        self.identity.borrow().clone()
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity, AppError> {
        let grant = self.provider.sign_up(email, password).await?;
        Ok(self.replace(grant).await)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity, AppError> {
        let grant = self.provider.sign_in(email, password).await?;
        Ok(self.replace(grant).await)
    }

    /// Clears the local identity even when the provider call fails.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        let grant = self.grant.lock().await.take();
        self.identity.send_replace(None);
        match grant {
            Some(grant) => self.provider.sign_out(&grant).await,
            None => Ok(()),
        }
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        self.provider.send_password_reset(email).await
    }

    pub async fn send_email_verification(&self) -> Result<(), AppError> {
        let token = self
            .grant
            .lock()
            .await
            .as_ref()
            .map(|g| g.id_token.clone())
            .ok_or(AppError::Unauthorized)?;
        self.provider.send_email_verification(&token).await
    }

    /// Calls `callback` right away with the current identity, then once per
    /// change until the subscription is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<AuthIdentity>) + Send + 'static,
    {
        let rx = self.identity.subscribe();
        let current = rx.borrow().clone();
        callback(current);

        let mut changes = WatchStream::from_changes(rx);
        let task = tokio::spawn(async move {
            while let Some(identity) = changes.next().await {
                callback(identity);
            }
        });
        Subscription { task }
    }

    async fn replace(&self, grant: AuthGrant) -> AuthIdentity {
        let identity = grant.identity.clone();
        *self.grant.lock().await = Some(grant);
        self.identity.send_replace(Some(identity.clone()));
        tracing::info!(uid = %identity.uid, "signed in");
        identity
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Accepts any password except "wrong"; records verification requests.
    #[derive(Default)]
    pub(crate) struct MockAuth {
        pub verifications: Mutex<Vec<String>>,
        pub resets: Mutex<Vec<String>>,
    }

    fn grant(email: &str) -> AuthGrant {
        AuthGrant {
            identity: AuthIdentity {
                uid: format!("uid-{email}"),
                email: email.to_string(),
                display_name: None,
                email_verified: false,
            },
            id_token: format!("token-{email}"),
        }
    }

    #[async_trait]
    impl AuthProvider for MockAuth {
        async fn sign_up(&self, email: &str, _password: &str) -> Result<AuthGrant, AppError> {
            Ok(grant(email))
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AppError> {
            if password == "wrong" {
                return Err(AppError::Unauthorized);
            }
            Ok(grant(email))
        }

        async fn sign_out(&self, _grant: &AuthGrant) -> Result<(), AppError> {
            Ok(())
        }

        async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
            self.resets.lock().unwrap().push(email.to_string());
            Ok(())
        }

        async fn send_email_verification(&self, id_token: &str) -> Result<(), AppError> {
            self.verifications.lock().unwrap().push(id_token.to_string());
            Ok(())
        }

        async fn verify_id_token(&self, id_token: &str) -> Result<AuthIdentity, AppError> {
            id_token
                .strip_prefix("token-")
                .map(|email| grant(email).identity)
                .ok_or(AppError::Unauthorized)
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Option<AuthIdentity>>) -> Option<AuthIdentity> {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("no notification")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_subscriber_gets_current_then_changes() {
        let session = AuthSession::new(Arc::new(MockAuth::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = session.subscribe(move |identity| {
            let _ = tx.send(identity);
        });

        assert_eq!(next(&mut rx).await, None);

        session.sign_in("jane@example.com", "secret").await.unwrap();
        let signed_in = next(&mut rx).await.unwrap();
        assert_eq!(signed_in.email, "jane@example.com");

        session.sign_out().await.unwrap();
        assert_eq!(next(&mut rx).await, None);
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let session = AuthSession::new(Arc::new(MockAuth::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = session.subscribe(move |identity| {
            let _ = tx.send(identity);
        });
        assert_eq!(next(&mut rx).await, None);

        sub.unsubscribe();
        session.sign_in("jane@example.com", "secret").await.unwrap();
        // The sender lived in the aborted task, so the channel closes.
        let got = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_state() {
        let session = AuthSession::new(Arc::new(MockAuth::default()));
        let err = session.sign_in("jane@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_email_verification_needs_signed_in_user() {
        let provider = Arc::new(MockAuth::default());
        let session = AuthSession::new(provider.clone());
        assert!(matches!(
            session.send_email_verification().await.unwrap_err(),
            AppError::Unauthorized
        ));

        session.sign_up("new@example.com", "secret").await.unwrap();
        session.send_email_verification().await.unwrap();
        assert_eq!(
            *provider.verifications.lock().unwrap(),
            vec!["token-new@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn test_context_follows_session() {
        use crate::models::Locale;
        use crate::services::context::{AppContext, ContextHub};

        let session = AuthSession::new(Arc::new(MockAuth::default()));
        let hub = ContextHub::new(AppContext::new(Locale::En));
        let mut rx = hub.subscribe();
        let _sub = hub.follow(&session);

        session.sign_in("jane@example.com", "secret").await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            hub.current().current_user.as_ref().map(|u| u.email.as_str()),
            Some("jane@example.com")
        );
    }
}
