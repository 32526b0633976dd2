//! Self-evaluation report and spoken feedback.

use super::Reply;
use crate::classifier::first_number;
use crate::dialogue::{Dialogue, DialogueAbort};
use crate::input::VoiceInput;
use crate::services::evaluator::AgentEvaluator;

pub fn report(evaluator: &AgentEvaluator) -> Reply {
    Reply::say(evaluator.report().describe())
}

/// Score first, then an optional comment.
pub async fn feedback<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    evaluator: &mut AgentEvaluator,
) -> anyhow::Result<Reply> {
    let answer = dlg.ask("On a scale of 1 to 10, how am I doing?").await?;
    let score = first_number(&answer)
        .filter(|s| (1..=10).contains(s))
        .ok_or_else(|| DialogueAbort::Invalid("Scores go from 1 to 10.".to_string()))?;
    let comment = dlg.ask_optional("Any comments?").await?.unwrap_or_default();
    evaluator.add_feedback(&comment, score)?;
    Ok(Reply::say("Thanks for the feedback!"))
}
