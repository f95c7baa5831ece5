//! Best-effort translation of user input into the engine's working language.
//!
//! The engine treats translation as strictly best-effort: any failure here is
//! reported as an `EngineError::Translation` and the caller degrades to the
//! original text. Queries are never aborted over a translation problem.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::core::errors::EngineError;

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` (BCP-47-ish code, possibly with a
    /// regional suffix) into English.
    async fn translate(&self, text: &str, source_lang: &str) -> Result<String, EngineError>;
}

/// Translator backed by the public Google Translate web endpoint.
pub struct HttpTranslator {
    base_url: String,
    client: Client,
}

impl HttpTranslator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }
}

/// `ta-IN` → `ta`; empty → `auto`.
fn normalize_lang(source_lang: &str) -> &str {
    let lang = source_lang.split(['-', '_']).next().unwrap_or("");
    if lang.is_empty() {
        "auto"
    } else {
        lang
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, source_lang: &str) -> Result<String, EngineError> {
        let lang = normalize_lang(source_lang);
        if lang == "en" || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let url = format!(
            "{}/translate_a/single?client=gtx&sl={}&tl=en&dt=t&q={}",
            self.base_url,
            lang,
            urlencoding::encode(text)
        );

        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| EngineError::Translation(err.to_string()))?;

        if !res.status().is_success() {
            return Err(EngineError::Translation(format!(
                "translation request failed: {}",
                res.status()
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|err| EngineError::Translation(err.to_string()))?;

        // Response shape: [[["translated","original",...], ...], ...]
        let segments = payload
            .get(0)
            .and_then(|v| v.as_array())
            .ok_or_else(|| EngineError::Translation("unexpected response shape".to_string()))?;

        let translated: String = segments
            .iter()
            .filter_map(|seg| seg.get(0).and_then(|s| s.as_str()))
            .collect();

        if translated.is_empty() {
            return Err(EngineError::Translation("empty translation".to_string()));
        }
        Ok(translated)
    }
}

/// Pass-through translator used when translation is disabled.
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str, _source_lang: &str) -> Result<String, EngineError> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_regional_suffixes() {
        assert_eq!(normalize_lang("ta-IN"), "ta");
        assert_eq!(normalize_lang("ml_IN"), "ml");
        assert_eq!(normalize_lang("en"), "en");
        assert_eq!(normalize_lang(""), "auto");
    }

    #[tokio::test]
    async fn english_input_short_circuits() {
        let translator = HttpTranslator::new("http://127.0.0.1:1");
        let out = translator
            .translate("already english", "en-IN")
            .await
            .expect("no network call expected");
        assert_eq!(out, "already english");
    }

    #[tokio::test]
    async fn noop_returns_input_unchanged() {
        let translator = NoopTranslator;
        let out = translator.translate("வணக்கம்", "ta").await.expect("noop");
        assert_eq!(out, "வணக்கம்");
    }
}
