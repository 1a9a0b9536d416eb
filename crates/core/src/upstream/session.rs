//! Scoped upstream sessions.

use std::future::Future;

use tracing::{error, info, warn};

use super::{AuthError, Credentials, SessionApi};

/// Run `body` with a freshly issued session token, revoking the session
/// afterwards whatever the outcome of `body`.
///
/// If the token cannot be issued `body` never runs. When `body` fails its
/// error is returned even if revocation also fails. When `body` succeeds but
/// revocation fails, the revocation error is returned; work done by `body`
/// stays done.
pub async fn with_session<T, E, F, Fut>(
    api: &dyn SessionApi,
    credentials: &Credentials,
    body: F,
) -> Result<T, E>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<AuthError> + std::fmt::Display,
{
    let session = api.create_session(credentials).await?;
    info!(session_id = session.session_id.as_str(), "Upstream session opened");

    let result = body(session.token.clone()).await;
    let revoked = api.revoke_session(&session).await;

    match (result, revoked) {
        (Ok(value), Ok(())) => {
            info!(session_id = session.session_id.as_str(), "Upstream session closed");
            Ok(value)
        }
        (Ok(_), Err(e)) => {
            warn!(
                session_id = session.session_id.as_str(),
                error = %e,
                "Work completed but session revocation failed"
            );
            Err(e.into())
        }
        (Err(e), Ok(())) => {
            info!(session_id = session.session_id.as_str(), "Upstream session closed after failure");
            Err(e)
        }
        (Err(e), Err(revoke_err)) => {
            error!(
                session_id = session.session_id.as_str(),
                error = %e,
                revoke_error = %revoke_err,
                "Session revocation failed after error, session left open"
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockUpstream;
    use crate::upstream::FetchError;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error(transparent)]
        Auth(#[from] AuthError),
        #[error(transparent)]
        Fetch(#[from] FetchError),
    }

    fn creds() -> Credentials {
        Credentials::new("myUsername", "myPassword")
    }

    #[tokio::test]
    async fn test_with_session_passes_token_and_revokes() {
        let upstream = MockUpstream::new();
        upstream.set_session("ABC123", "mySessionId").await;

        let token = with_session(&upstream, &creds(), |token| async move {
            Ok::<_, TestError>(token)
        })
        .await
        .unwrap();

        assert_eq!(token, "ABC123");
        assert_eq!(upstream.sessions_created().await, 1);
        assert_eq!(upstream.revoked_sessions().await, vec!["mySessionId"]);
        assert_eq!(upstream.last_credentials().await, Some(creds()));
    }

    #[tokio::test]
    async fn test_with_session_revokes_when_body_fails() {
        let upstream = MockUpstream::new();

        let result: Result<(), TestError> = with_session(&upstream, &creds(), |_| async {
            Err(TestError::Fetch(FetchError::Download {
                id: "x".to_string(),
                status: 500,
            }))
        })
        .await;

        assert!(matches!(result, Err(TestError::Fetch(_))));
        assert_eq!(upstream.revoked_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_with_session_body_skipped_when_issuance_fails() {
        let upstream = MockUpstream::new();
        upstream
            .fail_create_session(AuthError::TokenRejected {
                status: 401,
                message: "invalid_grant".to_string(),
            })
            .await;
        let ran = AtomicBool::new(false);

        let result: Result<(), TestError> = with_session(&upstream, &creds(), |_| async {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(TestError::Auth(AuthError::TokenRejected { status: 401, .. }))
        ));
        assert!(!ran.load(Ordering::SeqCst));
        assert!(upstream.revoked_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn test_with_session_reports_revocation_failure_after_success() {
        let upstream = MockUpstream::new();
        upstream.fail_revoke(503).await;
        let ran = AtomicBool::new(false);

        let result: Result<(), TestError> = with_session(&upstream, &creds(), |_| async {
            ran.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(ran.load(Ordering::SeqCst));
        assert!(matches!(
            result,
            Err(TestError::Auth(AuthError::RevokeRejected { status: 503, .. }))
        ));
    }

    #[tokio::test]
    async fn test_with_session_body_error_wins_over_revocation_error() {
        let upstream = MockUpstream::new();
        upstream.fail_revoke(503).await;

        let result: Result<(), TestError> = with_session(&upstream, &creds(), |_| async {
            Err(TestError::Fetch(FetchError::Download {
                id: "x".to_string(),
                status: 404,
            }))
        })
        .await;

        assert!(matches!(
            result,
            Err(TestError::Fetch(FetchError::Download { status: 404, .. }))
        ));
        assert_eq!(upstream.revoked_sessions().await.len(), 1);
    }
}
