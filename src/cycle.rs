//! One FocusLock run: context → prompt → model → deliver → log.
//!
//! A model failure aborts before anything is delivered or logged. A delivery
//! failure is logged and swallowed; the suggestion is still recorded.

use anyhow::{Context, Result};

use crate::activity::{ActivityLog, HistoryEntry};
use crate::model::LanguageModel;
use crate::notify::{Ack, Notifier};
use crate::prompt::{self, DomainSelector, ProblemDomain};

/// What a completed cycle did.
#[derive(Debug)]
pub struct CycleReport {
    pub domain: &'static ProblemDomain,
    pub context_source: &'static str,
    pub idea: String,
    pub ack: Option<Ack>,
    pub entry: HistoryEntry,
}

impl CycleReport {
    pub fn delivered(&self) -> bool {
        self.ack.is_some()
    }
}

pub async fn run_cycle<M, N>(
    log: &mut ActivityLog,
    model: &M,
    notifier: &N,
    selector: &mut DomainSelector,
    window: usize,
) -> Result<CycleReport>
where
    M: LanguageModel,
    N: Notifier,
{
    let context = log.context_window(window);
    let domain = selector.pick();
    tracing::info!(
        source = context.source(),
        domain = domain.name,
        "context selected"
    );

    let prompt = prompt::build_prompt(&context.render(), domain);
    let idea = model
        .complete(&prompt)
        .await
        .with_context(|| format!("idea generation with {} failed", model.name()))?;

    let message = prompt::format_message(&idea);
    let ack = match notifier.notify(&message).await {
        Ok(ack) => Some(ack),
        Err(e) => {
            tracing::error!(error = %e, "delivery failed; suggestion will still be logged");
            None
        }
    };

    let title = prompt::project_title(&idea);
    let entry = log
        .log_activity(&format!("Suggested {title} [{}]", domain.name))
        .context("failed to record suggestion in history")?;

    Ok(CycleReport {
        domain,
        context_source: context.source(),
        idea,
        ack,
        entry,
    })
}
