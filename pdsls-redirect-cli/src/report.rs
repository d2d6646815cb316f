//! What gets printed for each input.

use pdsls_redirect::{Outcome, Translator};
use serde::Serialize;

/// Which URL the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The navigation decision, viewer or API URL.
    Translate,
    /// The `at://` URI behind the input.
    AtUri,
    /// The human-facing page for the record type.
    PublicViewer,
}

/// One line of output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub input: String,
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_tab: Option<bool>,
}

impl Report {
    /// Translate `input` in `mode`.
    pub async fn run(translator: &Translator, mode: Mode, input: &str) -> Self {
        let (url, new_tab) = match mode {
            Mode::Translate => match translator.translate(Some(input)).await {
                Outcome::Navigate { url, new_tab } => (Some(url), Some(new_tab)),
                Outcome::Stay => (None, None),
            },
            Mode::AtUri => (translator.at_uri(input).await, None),
            Mode::PublicViewer => (translator.public_url(input).await, None),
        };
        Self {
            input: input.to_string(),
            url,
            new_tab,
        }
    }

    /// Plain URL, or empty when there is nothing to open.
    pub fn to_line(&self, json: bool) -> serde_json::Result<String> {
        if json {
            return serde_json::to_string(self);
        }
        Ok(self.url.clone().unwrap_or_default())
    }
}
