use url::Url;

use crate::error::Error;

/// UI language, sent as `Accept-Language` on every request and used to pick
/// fixed error messages when the backend supplies none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    /// Arabic (backend default).
    #[default]
    Ar,
    /// English.
    En,
}

impl Language {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ar" => Ok(Self::Ar),
            "en" => Ok(Self::En),
            other => Err(Error::Config(format!(
                "unsupported language '{other}' (expected 'ar' or 'en')"
            ))),
        }
    }
}

/// Fahmaan backend client configuration.
///
/// Defaults target the production backend; override with `with_*` methods
/// or use [`from_env()`](ClientConfig::from_env) for convention-based setup.
///
/// ```rust,ignore
/// use fahmaan_client::{ClientConfig, Language};
///
/// let config = ClientConfig::new()
///     .with_base_url("https://localhost:7087".parse()?)
///     .with_language(Language::En);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) base_url: Url,
    pub(crate) language: Language,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfig {
    /// Create a configuration pointing at the production backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: "http://fahmaan.runasp.net"
                .parse()
                .expect("valid default URL"),
            language: Language::default(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Optional env vars
    /// - `FAHMAAN_BASE_URL`: Override the backend base URL (must be a valid URL)
    /// - `FAHMAAN_LANG`: UI language, `ar` or `en`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a set variable does not parse.
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::new();

        if let Ok(url_str) = std::env::var("FAHMAAN_BASE_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("FAHMAAN_BASE_URL: {e}")))?;
            config = config.with_base_url(url);
        }
        if let Ok(lang) = std::env::var("FAHMAAN_LANG") {
            config = config.with_language(lang.parse()?);
        }

        Ok(config)
    }

    /// Override the backend base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = url;
        self
    }

    /// Override the UI language (default: Arabic).
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current UI language.
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_production() {
        let config = ClientConfig::new();
        assert_eq!(config.base_url().as_str(), "http://fahmaan.runasp.net/");
        assert_eq!(config.language(), Language::Ar);
    }

    #[test]
    fn with_overrides() {
        let config = ClientConfig::new()
            .with_base_url("https://localhost:7087".parse().unwrap())
            .with_language(Language::En);
        assert_eq!(config.base_url().as_str(), "https://localhost:7087/");
        assert_eq!(config.language(), Language::En);
    }

    #[test]
    fn language_parse() {
        assert_eq!("ar".parse::<Language>().unwrap(), Language::Ar);
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }
}
