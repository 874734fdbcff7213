//! `tp_refresh_auth`: pick up a fresh session cookie from a logged-in browser.
//!
//! Reading browser cookie stores is delegated to a [`CookieSource`]. The
//! cookie only ever travels from the source to the validator and the
//! resolver; the returned map carries identity fields and messages only.

use std::fmt;

use serde_json::{json, Map, Value};

use super::auth_status::to_map;
use crate::auth::storage::CredentialResolver;
use crate::auth::types::SessionSecret;
use crate::auth::validator::SessionValidator;

/// Browsers a cookie source may be asked for. `auto` means "try them all".
pub const SUPPORTED_BROWSERS: [&str; 7] =
    ["chrome", "firefox", "safari", "edge", "chromium", "brave", "opera"];

/// Result of extracting the session cookie from a browser.
#[derive(Clone, PartialEq, Eq)]
pub struct BrowserCookieResult {
    pub success: bool,
    pub cookie: Option<SessionSecret>,
    /// Never contains the cookie value.
    pub message: String,
    pub browser: Option<String>,
    /// False when this build has no browser extraction at all.
    pub available: bool,
}

impl BrowserCookieResult {
    pub fn found(browser: impl Into<String>, cookie: SessionSecret) -> Self {
        let browser = browser.into();
        Self {
            success: true,
            cookie: Some(cookie),
            message: format!("Found cookie in {}", browser),
            browser: Some(browser),
            available: true,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            cookie: None,
            message: message.into(),
            browser: None,
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::failed("Browser cookie extraction is not available in this build")
        }
    }
}

impl fmt::Debug for BrowserCookieResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cookie = if self.cookie.is_some() { "<present>" } else { "<absent>" };
        f.debug_struct("BrowserCookieResult")
            .field("success", &self.success)
            .field("cookie", &format_args!("{}", cookie))
            .field("message", &self.message)
            .field("browser", &self.browser)
            .finish()
    }
}

/// Something that can read the TrainingPeaks session cookie out of a
/// browser profile. `browser` is `None` to try every supported browser.
pub trait CookieSource: Send + Sync {
    fn extract(&self, browser: Option<&str>) -> BrowserCookieResult;
}

/// Source used when no browser integration is compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowserSource;

impl CookieSource for NoBrowserSource {
    fn extract(&self, _browser: Option<&str>) -> BrowserCookieResult {
        BrowserCookieResult::unavailable()
    }
}

/// Extract, validate and store a fresh cookie.
pub async fn refresh_auth(
    source: &dyn CookieSource,
    browser: &str,
    validator: &dyn SessionValidator,
    resolver: &CredentialResolver,
) -> Map<String, Value> {
    let browser = browser.trim().to_lowercase();
    let extracted = if browser == "auto" || browser.is_empty() {
        source.extract(None)
    } else if SUPPORTED_BROWSERS.contains(&browser.as_str()) {
        source.extract(Some(&browser))
    } else {
        BrowserCookieResult::failed(format!("Unknown browser: {}", browser))
    };

    if !extracted.available {
        return to_map(json!({
            "success": false,
            "message": "Browser extraction not available",
            "details": extracted.message,
            "action_needed": "Run 'tp-mcp auth' and paste the cookie manually.",
        }));
    }

    let Some(cookie) = extracted.cookie.as_ref().filter(|_| extracted.success) else {
        return to_map(json!({
            "success": false,
            "message": "Could not extract cookie from browser",
            "details": extracted.message,
            "action_needed": "Make sure you're logged into TrainingPeaks at app.trainingpeaks.com in your browser, then try again. Or run 'tp-mcp auth' manually.",
        }));
    };

    let validation = validator.validate(cookie.expose()).await;
    if !validation.is_valid() {
        return to_map(json!({
            "success": false,
            "message": "Extracted cookie is invalid or expired",
            "details": validation.message,
            "action_needed": "Log into TrainingPeaks at app.trainingpeaks.com in your browser, then try again.",
        }));
    }

    let stored = resolver.store(cookie.expose());
    if !stored.success {
        return to_map(json!({
            "success": false,
            "message": "Could not store the refreshed cookie",
            "details": stored.message,
            "action_needed": "Run 'tp-mcp auth' manually.",
        }));
    }

    let source_name = extracted.browser.as_deref().unwrap_or("browser");
    tracing::info!(browser = source_name, "session refreshed from browser");
    to_map(json!({
        "success": true,
        "message": format!("Authentication refreshed from {}", source_name),
        "athlete_id": validation.athlete_id,
        "email": validation.email,
        "action_needed": null,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validator::{AuthResult, AuthStatus};
    use crate::tools::testing::{resolver, FakeValidator};
    use std::sync::Mutex;

    const COOKIE: &str = "SECRET_COOKIE_VALUE_12345";

    struct FakeSource {
        result: BrowserCookieResult,
        asked: Mutex<Vec<Option<String>>>,
    }

    impl FakeSource {
        fn new(result: BrowserCookieResult) -> Self {
            Self {
                result,
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl CookieSource for FakeSource {
        fn extract(&self, browser: Option<&str>) -> BrowserCookieResult {
            self.asked.lock().unwrap().push(browser.map(str::to_string));
            self.result.clone()
        }
    }

    fn found() -> BrowserCookieResult {
        BrowserCookieResult::found("chrome", SessionSecret::new(COOKIE).unwrap())
    }

    fn assert_no_cookie(result: &Map<String, Value>) {
        let rendered = Value::Object(result.clone()).to_string();
        assert!(!rendered.contains(COOKIE));
        assert!(!rendered.contains("SECRET_COOKIE"));
    }

    #[tokio::test]
    async fn success_stores_and_hides_cookie() {
        let (_temp, resolver) = resolver(None);
        let source = FakeSource::new(found());
        let validator = FakeValidator::valid(123, "test@example.com");

        let result = refresh_auth(&source, "auto", &validator, &resolver).await;
        assert_eq!(result["success"], true);
        assert_eq!(result["message"], "Authentication refreshed from chrome");
        assert_eq!(result["athlete_id"], 123);
        assert_eq!(result["email"], "test@example.com");
        assert_no_cookie(&result);

        assert_eq!(*source.asked.lock().unwrap(), vec![None]);
        assert_eq!(resolver.get().secret().unwrap().expose(), COOKIE);
    }

    #[tokio::test]
    async fn specific_browser_is_passed_through() {
        let (_temp, resolver) = resolver(None);
        let source = FakeSource::new(found());
        let validator = FakeValidator::valid(1, "a@b.com");

        refresh_auth(&source, " Firefox ", &validator, &resolver).await;
        assert_eq!(
            *source.asked.lock().unwrap(),
            vec![Some("firefox".to_string())]
        );
    }

    #[tokio::test]
    async fn unknown_browser_is_rejected_without_extraction() {
        let (_temp, resolver) = resolver(None);
        let source = FakeSource::new(found());
        let validator = FakeValidator::valid(1, "a@b.com");

        let result = refresh_auth(&source, "netscape", &validator, &resolver).await;
        assert_eq!(result["success"], false);
        assert_eq!(result["details"], "Unknown browser: netscape");
        assert!(source.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn extraction_failure() {
        let (_temp, resolver) = resolver(None);
        let source = FakeSource::new(BrowserCookieResult::failed(
            "No TrainingPeaks cookie found in any browser",
        ));
        let validator = FakeValidator::valid(1, "a@b.com");

        let result = refresh_auth(&source, "auto", &validator, &resolver).await;
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Could not extract cookie from browser");
        assert!(validator.seen().is_empty());
    }

    #[tokio::test]
    async fn no_browser_support() {
        let (_temp, resolver) = resolver(None);
        let validator = FakeValidator::valid(1, "a@b.com");

        let result = refresh_auth(&NoBrowserSource, "auto", &validator, &resolver).await;
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Browser extraction not available");
    }

    #[tokio::test]
    async fn invalid_cookie_is_not_stored() {
        let (_temp, resolver) = resolver(None);
        let source = FakeSource::new(found());
        let validator =
            FakeValidator::returning(AuthResult::new(AuthStatus::Expired, "Session expired"));

        let result = refresh_auth(&source, "chrome", &validator, &resolver).await;
        assert_eq!(result["success"], false);
        assert_eq!(result["message"], "Extracted cookie is invalid or expired");
        assert_no_cookie(&result);
        assert!(!resolver.get().success);
    }

    #[test]
    fn debug_never_shows_cookie() {
        let rendered = format!("{:?}", found());
        assert!(!rendered.contains(COOKIE));
        assert!(rendered.contains("<present>"));
        assert!(rendered.contains("chrome"));

        let missing = format!("{:?}", BrowserCookieResult::failed("nothing"));
        assert!(missing.contains("<absent>"));
    }
}
