//! Code and website generation into `generated/`.

use super::Reply;
use crate::dialogue::{Dialogue, DialogueAbort};
use crate::input::VoiceInput;
use crate::services::codegen::{normalize_language, validate_description, CodeGenerator};

async fn description<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    prompt: &str,
) -> anyhow::Result<String> {
    let text = dlg.ask(prompt).await?;
    validate_description(&text).map_err(|e| DialogueAbort::Invalid(e.to_string()))?;
    Ok(text)
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Language from "generate rust code", otherwise asked with python as the
/// default.
pub async fn code<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    generator: &CodeGenerator,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let language = match arg {
        Some(lang) => normalize_language(lang),
        None => normalize_language(
            &dlg.ask_optional("Which language? Python is the default.")
                .await?
                .unwrap_or_default(),
        ),
    };
    let text = description(dlg, "Describe what the code should do.").await?;
    dlg.say(format!("Generating {} code. This can take a moment.", language))
        .await;
    let generated = generator.generate_code(&text, &language).await?;
    let mut lines = vec![format!(
        "Your {} code is saved as {}.",
        language,
        file_name(&generated.path)
    )];
    if generated.copied {
        lines.push("It's also on your clipboard.".to_string());
    }
    Ok(Reply::lines(lines))
}

pub async fn website<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    generator: &CodeGenerator,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let text = match arg.filter(|a| validate_description(a).is_ok()) {
        Some(a) => a.to_string(),
        None => description(dlg, "Describe the website you want.").await?,
    };
    dlg.say("Building your website. This can take a moment.").await;
    let path = generator.generate_website(&text).await?;
    Ok(Reply::say(format!(
        "Your website is saved in {}.",
        path.parent().map(file_name).unwrap_or_default()
    )))
}
