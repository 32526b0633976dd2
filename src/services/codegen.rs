//! Code and website generation through an OpenAI-compatible chat API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arboard::Clipboard;
use serde_json::json;
use tracing::{debug, info};

use crate::config::LlmConfig;

const MIN_DESCRIPTION_LEN: usize = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const EXTENSIONS: &[(&str, &str)] = &[
    ("python", "py"),
    ("javascript", "js"),
    ("java", "java"),
    ("c++", "cpp"),
    ("c", "c"),
    ("ruby", "rb"),
    ("go", "go"),
    ("rust", "rs"),
    ("php", "php"),
    ("html", "html"),
    ("css", "css"),
    ("typescript", "ts"),
];

pub const DEFAULT_LANGUAGE: &str = "python";

/// Canonical language name for a spoken one ("c plus plus" -> "c++").
pub fn normalize_language(spoken: &str) -> String {
    let spoken = spoken.trim().to_lowercase();
    match spoken.as_str() {
        "" => DEFAULT_LANGUAGE.to_string(),
        "c plus plus" | "cpp" | "c++" => "c++".to_string(),
        "js" | "java script" => "javascript".to_string(),
        "ts" | "type script" => "typescript".to_string(),
        "golang" => "go".to_string(),
        other => other.to_string(),
    }
}

pub fn extension(language: &str) -> &'static str {
    EXTENSIONS
        .iter()
        .find(|(lang, _)| *lang == language)
        .map(|(_, ext)| *ext)
        .unwrap_or("txt")
}

/// Drop markdown code fences around model output.
pub fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

pub fn validate_description(description: &str) -> anyhow::Result<()> {
    if description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        anyhow::bail!("That description is too short. Please describe it in more detail.");
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct GeneratedCode {
    pub path: PathBuf,
    pub code: String,
    pub copied: bool,
}

pub struct CodeGenerator {
    llm: LlmConfig,
    out_dir: PathBuf,
    client: reqwest::Client,
}

impl CodeGenerator {
    pub fn new(llm: LlmConfig, data_dir: &Path) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            llm,
            out_dir: data_dir.join("generated"),
            client,
        }
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let Some(key) = self.llm.api_key.as_deref() else {
            anyhow::bail!("Code generation needs an LLM API key in the config.");
        };
        let url = format!("{}/chat/completions", self.llm.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.llm.model,
            "messages": [
                {"role": "system", "content": "You write complete, working code. Reply with code only."},
                {"role": "user", "content": prompt},
            ],
        });
        debug!(model = %self.llm.model, "Requesting completion");
        let resp = self.client.post(url).bearer_auth(key).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error {}: {}", status, text);
        }
        let json: serde_json::Value = resp.json().await?;
        let content = json["choices"][0]["message"]["content"].as_str().unwrap_or("");
        let code = strip_code_fences(content);
        if code.is_empty() {
            anyhow::bail!("The model returned nothing");
        }
        Ok(code)
    }

    pub async fn generate_code(
        &self,
        description: &str,
        language: &str,
    ) -> anyhow::Result<GeneratedCode> {
        validate_description(description)?;
        let prompt = format!(
            "Generate a complete, working {language} program for this description:\n{}\n\n\
             Write clean, commented code with error handling where appropriate.",
            description.trim()
        );
        let code = self.complete(&prompt).await?;

        let dir = self.out_dir.join("code");
        std::fs::create_dir_all(&dir)?;
        let file = format!(
            "{}_code_{}.{}",
            language.replace('+', "p"),
            timestamp(),
            extension(language)
        );
        let path = dir.join(file);
        std::fs::write(&path, &code)?;
        let copied = copy_to_clipboard(&code);
        info!(path = %path.display(), copied, "Code generated");
        Ok(GeneratedCode { path, code, copied })
    }

    /// A single-file page with inline CSS and JavaScript.
    pub async fn generate_website(&self, description: &str) -> anyhow::Result<PathBuf> {
        validate_description(description)?;
        let prompt = format!(
            "Create a complete single-file website (one index.html with inline CSS and \
             JavaScript) for: {}\nMake it responsive and modern.",
            description.trim()
        );
        let html = self.complete(&prompt).await?;

        let dir = self.out_dir.join("sites").join(format!("site_{}", timestamp()));
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("index.html");
        std::fs::write(&path, html)?;
        info!(path = %path.display(), "Website generated");
        Ok(path)
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Best effort; a headless session has no clipboard.
fn copy_to_clipboard(text: &str) -> bool {
    match Clipboard::new().and_then(|mut c| c.set_text(text)) {
        Ok(()) => true,
        Err(e) => {
            debug!("Clipboard unavailable: {}", e);
            false
        }
    }
}
