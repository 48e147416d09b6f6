// Click bursts: drive the batchers from the CLI the way a UI would.
//
// Each burst fires `clicks` mutations `spacing` apart. Spacing must stay
// below the quiet period so the whole burst coalesces into one flush per
// key; the burst then waits for that flush's callback. Several games run
// concurrently, one batcher per key so outcomes can be attributed.

use std::time::Duration;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use crate::batcher::presets::{dislike_batcher, reaction_batcher, reaction_key};
use crate::batcher::ThrottledMutationBuilder;
use crate::output::terminal::BurstOutcome;
use crate::validate::MAX_INCREMENT;

/// How long to wait for the server after the quiet period elapses.
pub const FLUSH_WAIT: Duration = Duration::from_secs(10);

/// Shape of one simulated burst.
#[derive(Debug, Clone, Copy)]
pub struct BurstPlan {
    pub clicks: u64,
    pub spacing: Duration,
    pub quiet_period: Duration,
}

impl BurstPlan {
    pub fn validate(&self) -> Result<()> {
        if self.clicks == 0 {
            anyhow::bail!("--clicks must be at least 1");
        }
        // The whole burst goes out as a single increment.
        if self.clicks > MAX_INCREMENT as u64 {
            anyhow::bail!(
                "--clicks ({}) can't exceed {MAX_INCREMENT}: a burst is sent as one increment",
                self.clicks
            );
        }
        if self.spacing >= self.quiet_period {
            anyhow::bail!(
                "--spacing-ms ({}ms) must be shorter than the quiet period ({}ms) \
                 or the burst won't coalesce",
                self.spacing.as_millis(),
                self.quiet_period.as_millis()
            );
        }
        Ok(())
    }
}

/// Dislike every game in `game_ids` concurrently, one burst each.
pub async fn dislike_bursts(
    api_url: &str,
    game_ids: &[String],
    plan: BurstPlan,
) -> Result<Vec<(String, BurstOutcome)>> {
    plan.validate()?;
    let bars = MultiProgress::new();

    let results: Vec<Result<(String, BurstOutcome)>> =
        stream::iter(game_ids.iter().map(|game_id| {
            let bar = bars.add(burst_bar(game_id, plan.clicks));
            async move {
                let outcome =
                    run_burst(dislike_batcher(api_url), game_id.clone(), plan, bar).await?;
                Ok::<_, anyhow::Error>((game_id.clone(), outcome))
            }
        }))
        .buffer_unordered(game_ids.len().max(1))
        .collect()
        .await;

    results.into_iter().collect()
}

/// One reaction burst for `emoji` on `game_id`.
pub async fn reaction_burst(
    api_url: &str,
    game_id: &str,
    emoji: &str,
    plan: BurstPlan,
) -> Result<BurstOutcome> {
    plan.validate()?;
    let key = reaction_key(game_id, emoji);
    let bar = burst_bar(&key, plan.clicks);
    run_burst(reaction_batcher(api_url), key, plan, bar).await
}

/// Fire the burst through a fresh batcher and wait for its single flush.
pub async fn run_burst(
    builder: ThrottledMutationBuilder,
    key: String,
    plan: BurstPlan,
    bar: ProgressBar,
) -> Result<BurstOutcome> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let tx_err = tx.clone();
    let optimistic_bar = bar.clone();

    let batcher = builder
        .quiet_period(plan.quiet_period)
        .on_optimistic(move |increment| optimistic_bar.inc(increment))
        .on_success(move || {
            let _ = tx.send(BurstOutcome::Sent);
        })
        .on_error(move |error, accumulated| {
            let _ = tx_err.send(BurstOutcome::Failed {
                accumulated,
                reason: error.to_string(),
            });
        })
        .build()?;

    for click in 0..plan.clicks {
        batcher.mutate(&key);
        if click + 1 < plan.clicks {
            sleep(plan.spacing).await;
        }
    }

    let outcome = match timeout(plan.quiet_period + FLUSH_WAIT, rx.recv()).await {
        Ok(Some(outcome)) => outcome,
        _ => BurstOutcome::TimedOut,
    };
    bar.finish();
    Ok(outcome)
}

fn burst_bar(label: &str, clicks: u64) -> ProgressBar {
    let bar = ProgressBar::new(clicks);
    if let Ok(style) = ProgressStyle::default_bar().template("  {prefix:>24} [{bar:30}] {pos}/{len}") {
        bar.set_style(style);
    }
    bar.set_prefix(label.to_string());
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(clicks: u64, spacing_ms: u64) -> BurstPlan {
        BurstPlan {
            clicks,
            spacing: Duration::from_millis(spacing_ms),
            quiet_period: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_plan_accepts_tight_spacing() {
        assert!(plan(10, 50).validate().is_ok());
    }

    #[test]
    fn test_plan_rejects_spacing_at_quiet_period() {
        let err = plan(10, 500).validate().unwrap_err();
        assert!(err.to_string().contains("quiet period"));
    }

    #[test]
    fn test_plan_rejects_zero_clicks() {
        assert!(plan(0, 10).validate().is_err());
    }

    #[test]
    fn test_plan_rejects_more_clicks_than_one_flush_carries() {
        let err = plan(101, 10).validate().unwrap_err();
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_plan_accepts_max_clicks() {
        assert!(plan(100, 10).validate().is_ok());
    }
}
