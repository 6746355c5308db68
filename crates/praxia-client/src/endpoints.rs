//! Endpoint paths, relative to the API base URL.

// ============================================================================
// Authentication
// ============================================================================

pub const REGISTER: &str = "auth/register/";
pub const LOGIN: &str = "auth/login/";
pub const LOGOUT: &str = "auth/logout/";
pub const LOGOUT_ALL: &str = "auth/logout-all/";
pub const REFRESH_TOKEN: &str = "auth/refresh-token/";
pub const VERIFY_EMAIL: &str = "auth/verify_email/";
pub const RESEND_VERIFICATION_EMAIL: &str = "auth/resend-verification-email/";
pub const PASSWORD_RESET_REQUEST: &str = "auth/password-reset-request/";
pub const PASSWORD_RESET_CONFIRM: &str = "auth/password-reset-confirm/";
pub const CHECK_EMAIL_VERIFICATION: &str = "auth/check-email-verification/";
pub const SESSIONS: &str = "auth/sessions/";
pub const TOTP_SETUP: &str = "auth/2fa/setup/";
pub const TOTP_VERIFY: &str = "auth/2fa/verify/";
pub const TOTP_DISABLE: &str = "auth/2fa/disable/";
pub const TOTP_STATUS: &str = "auth/2fa/status/";

// ============================================================================
// Profile
// ============================================================================

pub const PROFILE: &str = "profile/";
pub const CONFIRM_GENDER: &str = "profile/confirm-gender/";

// ============================================================================
// Chat, consultations, X-ray, research, health
// ============================================================================

pub const CHAT_SESSIONS: &str = "chat-sessions/";
pub const CONSULTATIONS: &str = "consultations/";
pub const XRAY_ANALYSES: &str = "xray-analyses/";
pub const RESEARCH: &str = "research/";
pub const HEALTH: &str = "health/";
pub const HEALTH_AUTHENTICATED: &str = "health/authenticated/";

pub fn chat_session(id: i64) -> String {
    format!("chat-sessions/{}/", id)
}

pub fn chat_messages(session_id: i64) -> String {
    format!("chat-sessions/{}/messages/", session_id)
}

pub fn xray_analysis(id: i64) -> String {
    format!("xray-analyses/{}/", id)
}
