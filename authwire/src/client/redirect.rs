//! Navigation on expired sessions.
//!
//! The client only classifies failures. [`LoginRedirect`] owns the reaction:
//! an unauthorized result sends the user to the login location.

use tokio::sync::broadcast;
use tracing::info;

use super::ClientError;

pub const LOGIN_PATH: &str = "/login";

pub trait Navigator: Send + Sync {
    fn navigate(&self, location: &str);
}

/// Publishes navigation targets to whoever renders the UI.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: broadcast::Sender<String>,
}

impl ChannelNavigator {
    pub fn new(capacity: usize) -> (Self, broadcast::Receiver<String>) {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, location: &str) {
        // No subscribers means nobody is rendering; nothing to do.
        let _ = self.tx.send(location.to_string());
    }
}

#[derive(Debug, Clone)]
pub struct LoginRedirect<N> {
    navigator: N,
    location: String,
}

impl<N: Navigator> LoginRedirect<N> {
    pub fn new(navigator: N) -> Self {
        Self::with_location(navigator, LOGIN_PATH)
    }

    pub fn with_location(navigator: N, location: impl Into<String>) -> Self {
        Self {
            navigator,
            location: location.into(),
        }
    }

    /// Navigates to the login location on an unauthorized error, then hands
    /// the result back unchanged.
    pub fn observe<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(err) = &result {
            if err.is_unauthorized() {
                info!(location = %self.location, "session expired; redirecting");
                self.navigator.navigate(&self.location);
            }
        }
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use reqwest::StatusCode;

    use super::{ChannelNavigator, LoginRedirect, Navigator, LOGIN_PATH};
    use crate::client::ClientError;

    #[derive(Debug, Clone, Default)]
    struct RecordingNavigator {
        visits: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingNavigator {
        fn visits(&self) -> Vec<String> {
            self.visits.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, location: &str) {
            self.visits.lock().unwrap().push(location.to_string());
        }
    }

    #[test]
    fn unauthorized_navigates_to_login_once() {
        let navigator = RecordingNavigator::default();
        let redirect = LoginRedirect::new(navigator.clone());
        let result: Result<(), ClientError> = Err(ClientError::Unauthorized {
            body: String::from("expired"),
        });

        let err = redirect.observe(result).unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(err.body(), Some("expired"));
        assert_eq!(navigator.visits(), vec![LOGIN_PATH.to_string()]);
    }

    #[test]
    fn other_failures_do_not_navigate() {
        let navigator = RecordingNavigator::default();
        let redirect = LoginRedirect::new(navigator.clone());
        let result: Result<(), ClientError> = Err(ClientError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::from("boom"),
        });

        let err = redirect.observe(result).unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.body(), Some("boom"));
        assert!(navigator.visits().is_empty());
    }

    #[test]
    fn success_does_not_navigate() {
        let navigator = RecordingNavigator::default();
        let redirect = LoginRedirect::new(navigator.clone());
        assert_eq!(redirect.observe(Ok::<_, ClientError>(7)).unwrap(), 7);
        assert!(navigator.visits().is_empty());
    }

    #[test]
    fn channel_navigator_publishes_location() {
        let (navigator, mut rx) = ChannelNavigator::new(4);
        let redirect = LoginRedirect::with_location(navigator, "/signin-page");

        let _ = redirect.observe::<()>(Err(ClientError::Unauthorized {
            body: String::new(),
        }));

        assert_eq!(rx.try_recv().unwrap(), "/signin-page");
        assert!(rx.try_recv().is_err());
    }
}
