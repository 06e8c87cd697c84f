//! The cost gate consulted before an expensive run.

use async_trait::async_trait;
use dialoguer::Confirm;

use crate::estimate::CostEstimate;

#[async_trait]
pub trait CostApproval: Send + Sync {
    /// Return `Ok(true)` to proceed with the run.
    async fn approve(&self, estimate: &CostEstimate) -> anyhow::Result<bool>;
}

/// Approves everything. Used with `--yes` and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl CostApproval for AutoApprove {
    async fn approve(&self, _estimate: &CostEstimate) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Always declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDecline;

#[async_trait]
impl CostApproval for AutoDecline {
    async fn approve(&self, _estimate: &CostEstimate) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// Asks on the terminal. Defaults to "no".
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalApproval;

#[async_trait]
impl CostApproval for TerminalApproval {
    async fn approve(&self, estimate: &CostEstimate) -> anyhow::Result<bool> {
        let prompt = format!(
            "Generating {} row(s) will cost about ${:.2} and take ~{:.0} min. Continue?",
            estimate.rows, estimate.cost_usd, estimate.minutes
        );
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new().with_prompt(prompt).default(false).interact()
        })
        .await??;
        Ok(answer)
    }
}
