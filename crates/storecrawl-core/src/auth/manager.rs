use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::{Credentials, Session};
use crate::api::AuthError;

/// Exchanges credentials for a session with one upstream service.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Replace `stale`, which upstream refused. Implementations that reuse
    /// issued tokens must not hand back the refused one.
    async fn refresh(&self, credentials: &Credentials, stale: &Session) -> Result<Session, AuthError> {
        let _ = stale;
        self.authenticate(credentials).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Authenticating,
    Active,
    Expired,
    /// Upstream refused the credentials; only new credentials leave this phase.
    Invalid,
}

#[derive(Default)]
struct Slot {
    credentials: Option<Credentials>,
    session: Option<Session>,
    rejection: Option<String>,
}

/// Owns the credentials and the cached session for one credential set.
///
/// The slot lock is held for the whole credential exchange, so concurrent
/// callers queue behind an in-flight refresh and then reuse its result.
pub struct SessionManager<A> {
    authenticator: A,
    slot: Mutex<Slot>,
    phase: watch::Sender<SessionPhase>,
}

impl<A: Authenticator> SessionManager<A> {
    pub fn new(authenticator: A, credentials: Credentials) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Unauthenticated);
        Self {
            authenticator,
            slot: Mutex::new(Slot {
                credentials: Some(credentials),
                ..Slot::default()
            }),
            phase,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Watch phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Return the cached session, authenticating first if there is none or
    /// it is about to expire.
    pub async fn ensure_session(&self) -> Result<Session, AuthError> {
        let mut slot = self.slot.lock().await;
        if let Some(reason) = &slot.rejection {
            return Err(AuthError::UpstreamRejected(reason.clone()));
        }
        if let Some(session) = &slot.session {
            if !session.needs_refresh_at(Utc::now()) {
                return Ok(session.clone());
            }
            debug!(expires_at = %session.expires_at(), "Session close to expiry");
            self.set_phase(SessionPhase::Expired);
        }
        self.refresh_locked(&mut slot, None).await
    }

    /// Replace a session upstream reported as expired.
    ///
    /// If another caller already refreshed past `stale`, that session is
    /// returned without a second exchange.
    pub async fn force_refresh(&self, stale: &Session) -> Result<Session, AuthError> {
        let mut slot = self.slot.lock().await;
        if let Some(reason) = &slot.rejection {
            return Err(AuthError::UpstreamRejected(reason.clone()));
        }
        if let Some(current) = &slot.session {
            if !current.same_token(stale) && !current.needs_refresh_at(Utc::now()) {
                debug!("Session already refreshed by another caller");
                return Ok(current.clone());
            }
        }

        slot.session = None;
        if let Some(credentials) = slot.credentials.as_mut() {
            credentials.forget_token(stale.token());
        }
        self.set_phase(SessionPhase::Expired);
        self.refresh_locked(&mut slot, Some(stale)).await
    }

    /// Swap in new credentials, leaving the `Invalid` phase.
    pub async fn replace_credentials(&self, credentials: Credentials) {
        let mut slot = self.slot.lock().await;
        *slot = Slot {
            credentials: Some(credentials),
            ..Slot::default()
        };
        self.set_phase(SessionPhase::Unauthenticated);
    }

    /// Drop the session and the credentials.
    pub async fn logout(&self) {
        let mut slot = self.slot.lock().await;
        *slot = Slot::default();
        self.set_phase(SessionPhase::Unauthenticated);
        info!("Logged out");
    }

    async fn refresh_locked(
        &self,
        slot: &mut Slot,
        stale: Option<&Session>,
    ) -> Result<Session, AuthError> {
        let result = match slot.credentials.as_ref() {
            None => Err(AuthError::InvalidCredentials("no credentials supplied".into())),
            Some(credentials) => match credentials.validate() {
                Err(err) => Err(err),
                Ok(()) => {
                    self.set_phase(SessionPhase::Authenticating);
                    info!("Authenticating");
                    match stale {
                        Some(stale) => self.authenticator.refresh(credentials, stale).await,
                        None => self.authenticator.authenticate(credentials).await,
                    }
                }
            },
        };

        match result {
            Ok(session) if session.is_expired_at(Utc::now()) => {
                warn!("Upstream issued an already expired session");
                slot.session = None;
                self.set_phase(SessionPhase::Unauthenticated);
                Err(AuthError::Expired)
            }
            Ok(session) => {
                debug!(expires_at = %session.expires_at(), "Session established");
                slot.session = Some(session.clone());
                self.set_phase(SessionPhase::Active);
                Ok(session)
            }
            Err(AuthError::UpstreamRejected(reason)) => {
                warn!(reason = %reason, "Upstream rejected credentials, session invalidated");
                slot.session = None;
                slot.rejection = Some(reason.clone());
                self.set_phase(SessionPhase::Invalid);
                Err(AuthError::UpstreamRejected(reason))
            }
            Err(err) => {
                slot.session = None;
                self.set_phase(SessionPhase::Unauthenticated);
                Err(err)
            }
        }
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.phase.send_replace(phase);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use chrono::Duration;

    use super::*;

    /// Hands out numbered tokens, or scripted errors, and counts exchanges.
    #[derive(Default)]
    pub struct FakeAuthenticator {
        calls: AtomicUsize,
        failures: StdMutex<Vec<AuthError>>,
        lifetime_minutes: Option<i64>,
    }

    impl FakeAuthenticator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_with(err: AuthError) -> Self {
            let fake = Self::default();
            fake.failures.lock().unwrap().push(err);
            fake
        }

        pub fn with_lifetime(minutes: i64) -> Self {
            Self {
                lifetime_minutes: Some(minutes),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Authenticator for FakeAuthenticator {
        async fn authenticate(&self, _credentials: &Credentials) -> Result<Session, AuthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            // Give concurrent callers a chance to pile up behind the lock.
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            let failure = self.failures.lock().unwrap().pop();
            if let Some(err) = failure {
                return Err(err);
            }
            let token = if n == 0 { "abc".to_string() } else { format!("abc-{}", n) };
            let lifetime = Duration::minutes(self.lifetime_minutes.unwrap_or(60));
            Ok(Session::new(token, Utc::now() + lifetime))
        }
    }

    #[async_trait]
    impl<T: Authenticator> Authenticator for std::sync::Arc<T> {
        async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
            (**self).authenticate(credentials).await
        }

        async fn refresh(&self, credentials: &Credentials, stale: &Session) -> Result<Session, AuthError> {
            (**self).refresh(credentials, stale).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use super::testing::FakeAuthenticator;
    use super::*;

    fn manager(fake: &Arc<FakeAuthenticator>) -> SessionManager<Arc<FakeAuthenticator>> {
        SessionManager::new(fake.clone(), Credentials::new("user", "pw"))
    }

    #[tokio::test]
    async fn test_second_call_reuses_cached_session() {
        let fake = Arc::new(FakeAuthenticator::new());
        let sessions = manager(&fake);
        assert_eq!(sessions.phase(), SessionPhase::Unauthenticated);

        let first = sessions.ensure_session().await.unwrap();
        let second = sessions.ensure_session().await.unwrap();

        assert_eq!(first.token(), "abc");
        assert_eq!(first, second);
        assert_eq!(fake.calls(), 1);
        assert_eq!(sessions.phase(), SessionPhase::Active);
    }

    #[tokio::test]
    async fn test_empty_credentials_fail_without_exchange() {
        let fake = Arc::new(FakeAuthenticator::new());
        let sessions = SessionManager::new(fake.clone(), Credentials::new("", ""));

        let err = sessions.ensure_session().await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials(_)));
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let fake = Arc::new(FakeAuthenticator::new());
        let sessions = manager(&fake);

        let results = join_all((0..8).map(|_| sessions.ensure_session())).await;

        assert_eq!(fake.calls(), 1);
        for result in results {
            assert_eq!(result.unwrap().token(), "abc");
        }
    }

    #[tokio::test]
    async fn test_rejection_is_terminal_until_new_credentials() {
        let fake = Arc::new(FakeAuthenticator::failing_with(AuthError::UpstreamRejected(
            "BadAuthentication".into(),
        )));
        let sessions = manager(&fake);
        let mut phases = sessions.subscribe();

        assert!(matches!(
            sessions.ensure_session().await,
            Err(AuthError::UpstreamRejected(_))
        ));
        assert_eq!(sessions.phase(), SessionPhase::Invalid);
        assert!(phases.has_changed().unwrap());
        assert_eq!(*phases.borrow_and_update(), SessionPhase::Invalid);

        // No further exchanges while invalid.
        assert!(sessions.ensure_session().await.is_err());
        assert_eq!(fake.calls(), 1);

        sessions.replace_credentials(Credentials::new("user", "new-pw")).await;
        assert_eq!(sessions.phase(), SessionPhase::Unauthenticated);
        assert!(sessions.ensure_session().await.is_ok());
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_transient_failure_does_not_invalidate() {
        let fake = Arc::new(FakeAuthenticator::failing_with(AuthError::exchange(
            crate::api::ClientError::Timeout,
        )));
        let sessions = manager(&fake);

        assert!(matches!(
            sessions.ensure_session().await,
            Err(AuthError::Exchange(_))
        ));
        assert_eq!(sessions.phase(), SessionPhase::Unauthenticated);
        assert!(sessions.ensure_session().await.is_ok());
    }

    #[tokio::test]
    async fn test_force_refresh_replaces_stale_session_once() {
        let fake = Arc::new(FakeAuthenticator::new());
        let sessions = manager(&fake);

        let stale = sessions.ensure_session().await.unwrap();
        let fresh = sessions.force_refresh(&stale).await.unwrap();
        assert_eq!(fresh.token(), "abc-1");

        // A second caller holding the same stale session gets the fresh one.
        let again = sessions.force_refresh(&stale).await.unwrap();
        assert_eq!(again, fresh);
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_session_near_expiry_is_refreshed() {
        let fake = Arc::new(FakeAuthenticator::with_lifetime(2));
        let sessions = manager(&fake);

        sessions.ensure_session().await.unwrap();
        sessions.ensure_session().await.unwrap();
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_already_expired_session_is_an_error() {
        let fake = Arc::new(FakeAuthenticator::with_lifetime(-1));
        let sessions = manager(&fake);

        assert!(matches!(sessions.ensure_session().await, Err(AuthError::Expired)));
        assert_eq!(sessions.phase(), SessionPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_drops_credentials() {
        let fake = Arc::new(FakeAuthenticator::new());
        let sessions = manager(&fake);
        sessions.ensure_session().await.unwrap();

        sessions.logout().await;
        assert!(matches!(
            sessions.ensure_session().await,
            Err(AuthError::InvalidCredentials(_))
        ));
    }
}
