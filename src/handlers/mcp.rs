//! Tool-server listing and analysis.

use super::{arg_or_ask, plural, spoken_list, Reply};
use crate::dialogue::Dialogue;
use crate::input::VoiceInput;
use crate::services::mcp::McpClient;

pub async fn list_tools(mcp: &McpClient) -> anyhow::Result<Reply> {
    let tools = mcp.list_tools().await?;
    if tools.is_empty() {
        return Ok(Reply::say("The tool server has no tools."));
    }
    Ok(spoken_list(
        format!("I have {} available.", plural(tools.len(), "tool")),
        tools
            .into_iter()
            .map(|t| match t.description.as_str() {
                "" => t.name,
                d => format!("{}: {}", t.name, d),
            })
            .collect(),
    ))
}

pub async fn analyze<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    mcp: &McpClient,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let text = arg_or_ask(dlg, arg, "What text should I analyze?").await?;
    let sentiment = mcp.analyze_sentiment(&text).await?;
    Ok(Reply::say(format!("The sentiment is {}.", sentiment)))
}
