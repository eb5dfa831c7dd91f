use crate::config::Language;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Transport-level failure (connect, TLS, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response, normalized into a displayable message.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Refresh failed or no refresh credential was available.
    /// The session has been cleared; the user must re-authenticate.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// Response arrived but did not contain a field the operation requires.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Displayable message for UI surfaces: the normalized backend message
    /// where one exists, else the error's own rendering.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::SessionExpired(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Fixed human-readable message for a known status code, in the UI language.
///
/// The backend does not always supply a message; these cover the codes the
/// admin console surfaces directly (wrong credentials, missing route,
/// forbidden, server fault).
#[must_use]
pub(crate) fn status_message(language: Language, status: u16) -> Option<&'static str> {
    let msg = match (language, status) {
        (Language::Ar, 400) => "طلب غير صالح",
        (Language::Ar, 401) => "اسم المستخدم أو كلمة المرور غير صحيحة",
        (Language::Ar, 403) => "غير مصرح لك بهذه العملية",
        (Language::Ar, 404) => "الرابط غير موجود",
        (Language::Ar, 500) => "خطأ في الخادم",
        (Language::En, 400) => "Invalid request",
        (Language::En, 401) => "Incorrect username or password",
        (Language::En, 403) => "You are not authorized for this operation",
        (Language::En, 404) => "Not found",
        (Language::En, 500) => "Server error",
        _ => return None,
    };
    Some(msg)
}

/// Generic fallback when neither the backend nor the status table has a message.
#[must_use]
pub(crate) fn generic_message(language: Language) -> &'static str {
    match language {
        Language::Ar => "حدث خطأ ما",
        Language::En => "Something went wrong",
    }
}
