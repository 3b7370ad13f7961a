//! Local bootstrap page loaded by every web widget window.
//!
//! The page never navigates itself. It waits for a `widget-info` message
//! carrying the full widget definition and renders the widget's URL in an
//! inner frame, so a reload only needs the definition pushed again.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use widgetry_core::error::Result;
use widgetry_window::{WindowError, WindowMessage};

/// File name the page is installed under.
pub const BOOTSTRAP_FILE_NAME: &str = "widget-bootstrap.html";

/// The bootstrap page. Self-contained: inline CSS and JS only.
pub const WIDGET_BOOTSTRAP_HTML: &str = include_str!("../assets/widget-bootstrap.html");

/// Write the bootstrap page into `dir` and return its path.
///
/// An existing file with identical content is left untouched.
pub fn install_bootstrap_page(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(BOOTSTRAP_FILE_NAME);

    let current = fs::read_to_string(&path).ok();
    if current.as_deref() != Some(WIDGET_BOOTSTRAP_HTML) {
        fs::write(&path, WIDGET_BOOTSTRAP_HTML)?;
        debug!(path = %path.display(), "Bootstrap page installed");
    }
    Ok(path)
}

/// Script that hands `message` to the loaded page's `window.widgetry.receive`.
///
/// The JSON is passed as a string literal so the page parses it the same
/// way it parses `postMessage` data.
#[cfg_attr(not(feature = "webview"), allow(dead_code))]
pub(crate) fn delivery_script(
    message: &WindowMessage,
) -> std::result::Result<String, WindowError> {
    let json = message.to_json()?;
    let literal = serde_json::to_string(&json).map_err(|e| WindowError::Send(e.to_string()))?;
    Ok(format!(
        "window.widgetry && window.widgetry.receive({});",
        literal
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_html_is_valid_html() {
        assert!(WIDGET_BOOTSTRAP_HTML.starts_with("<!DOCTYPE html>"));
        assert!(WIDGET_BOOTSTRAP_HTML.contains("<html"));
        assert!(WIDGET_BOOTSTRAP_HTML.contains("</html>"));
    }

    #[test]
    fn bootstrap_html_listens_for_widget_info() {
        assert!(WIDGET_BOOTSTRAP_HTML.contains("'widget-info'"));
        assert!(WIDGET_BOOTSTRAP_HTML.contains("request-widget-info"));
    }

    #[test]
    fn bootstrap_html_has_no_external_urls() {
        assert!(!WIDGET_BOOTSTRAP_HTML.contains("https://"));
        assert!(!WIDGET_BOOTSTRAP_HTML.contains("http://"));
    }

    #[test]
    fn bootstrap_html_exposes_receive() {
        assert!(WIDGET_BOOTSTRAP_HTML.contains("window.widgetry = { receive: receive }"));
    }

    #[test]
    fn delivery_script_quotes_message() {
        use widgetry_core::types::{WidgetDraft, WidgetId};

        let widget = WidgetDraft::web("Say \"hi\"", "https://hi.example/?a=1&b=</script>")
            .into_definition(WidgetId::from("w"), chrono::Utc::now());
        let message = WindowMessage::WidgetInfo(widget);
        let script = delivery_script(&message).unwrap();

        assert!(script.starts_with("window.widgetry && window.widgetry.receive(\""));
        assert!(script.ends_with("\");"));

        let start = script.find('(').unwrap() + 1;
        let end = script.rfind(')').unwrap();
        let literal: String = serde_json::from_str(&script[start..end]).unwrap();
        assert_eq!(literal, message.to_json().unwrap());
    }

    #[test]
    fn install_writes_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = install_bootstrap_page(&dir.path().join("pages")).unwrap();

        assert_eq!(path.file_name().unwrap(), BOOTSTRAP_FILE_NAME);
        assert_eq!(fs::read_to_string(&path).unwrap(), WIDGET_BOOTSTRAP_HTML);
    }

    #[test]
    fn install_overwrites_stale_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(BOOTSTRAP_FILE_NAME);
        fs::write(&path, "old").unwrap();

        install_bootstrap_page(dir.path()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), WIDGET_BOOTSTRAP_HTML);
    }
}
