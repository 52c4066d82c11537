//! Read-only views: month summary, daily series, limit cards

use crate::display::{format_daily_series, format_limit_cards, format_month_summary};
use crate::error::LedgerResult;
use crate::services::{
    resolve_previous, Aggregator, ClassificationRules, LimitTracker, TrendEngine,
};

use super::context::{parse_month, LedgerContext};

/// Totals, planned totals and trends against the previous month
pub async fn handle_summary_command(ctx: &LedgerContext, month: Option<&str>) -> LedgerResult<()> {
    let key = parse_month(month)?;
    let current = ctx.coordinator.load(key).await?;

    // The previous month is only read, never created
    let months = ctx.storage.months.for_user(ctx.coordinator.user())?;
    let previous = resolve_previous(&months, &current);

    let taxonomy = ctx.taxonomy()?;
    let wallets = ctx.wallets()?;
    let engine = TrendEngine::new(Aggregator::new(ClassificationRules::new(&taxonomy)));
    let comparison = engine.compare(&current, previous, &wallets);

    print!("{}", format_month_summary(&comparison, &ctx.style));
    Ok(())
}

/// Per-day totals for the month
pub async fn handle_daily_command(
    ctx: &LedgerContext,
    month: Option<&str>,
    all_days: bool,
) -> LedgerResult<()> {
    let key = parse_month(month)?;
    let current = ctx.coordinator.load(key).await?;

    let taxonomy = ctx.taxonomy()?;
    let wallets = ctx.wallets()?;
    let summary = Aggregator::new(ClassificationRules::new(&taxonomy)).aggregate(
        key,
        &current.transactions,
        &wallets,
    );

    print!("{}", format_daily_series(key, &summary.by_day, all_days, &ctx.style));
    Ok(())
}

/// Limit cards and overall progress
pub async fn handle_limits_command(ctx: &LedgerContext, month: Option<&str>) -> LedgerResult<()> {
    let key = parse_month(month)?;
    let current = ctx.coordinator.load(key).await?;

    let taxonomy = ctx.taxonomy()?;
    let wallets = ctx.wallets()?;
    let summary = Aggregator::new(ClassificationRules::new(&taxonomy)).aggregate(
        key,
        &current.transactions,
        &wallets,
    );

    let tracker = LimitTracker::new(&taxonomy);
    let cards = tracker.cards(&current, &summary);
    println!("Limits for {}", key);
    print!("{}", format_limit_cards(&cards, &tracker.overall(&cards), &ctx.style));
    Ok(())
}
