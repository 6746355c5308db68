//! Session lifecycle events.

/// A change in the client's session, broadcast to every subscriber of
/// [`ApiClient::subscribe`](crate::ApiClient::subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A credential was stored after login, email verification or password reset.
    Established,
    /// The access token was replaced by a refresh.
    Refreshed,
    /// The session could not be recovered; the user must log in again.
    LoginRequired { reason: String },
    /// The user logged out and the credential was cleared.
    LoggedOut,
}
