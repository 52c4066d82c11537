//! Category limit CLI commands

use clap::Subcommand;

use crate::error::LedgerResult;
use crate::models::CategoryId;

use super::context::{parse_amount, parse_month, LedgerContext};

/// Limit subcommands
#[derive(Subcommand)]
pub enum LimitCommands {
    /// Set a category's spending limit for a month (0 means unlimited)
    Set {
        /// Category name
        category: String,
        /// Limit amount (e.g., "200" or "200.00")
        amount: String,
        /// Month (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Remove a category's limit entry for a month
    Clear {
        /// Category name
        category: String,
        /// Month (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },
}

/// Handle a limit command
pub async fn handle_limit_command(ctx: &LedgerContext, cmd: LimitCommands) -> LedgerResult<()> {
    match cmd {
        LimitCommands::Set {
            category,
            amount,
            month,
        } => {
            let key = parse_month(month.as_deref())?;
            let amount = parse_amount(&amount)?;
            ctx.coordinator.load(key).await?;

            let previous = ctx
                .coordinator
                .submit_limit(key, &CategoryId::new(category.as_str()), Some(amount))
                .await?;

            println!(
                "Set limit for {} in {}: {}",
                category,
                key,
                ctx.style.money(amount)
            );
            if let Some(previous) = previous {
                println!("  Previously: {}", ctx.style.money(previous));
            }
        }

        LimitCommands::Clear { category, month } => {
            let key = parse_month(month.as_deref())?;
            ctx.coordinator.load(key).await?;

            let previous = ctx
                .coordinator
                .submit_limit(key, &CategoryId::new(category.as_str()), None)
                .await?;

            match previous {
                Some(previous) => {
                    println!(
                        "Cleared limit for {} in {} (was {})",
                        category,
                        key,
                        ctx.style.money(previous)
                    )
                }
                None => println!("No limit set for {} in {}", category, key),
            }
        }
    }

    Ok(())
}
