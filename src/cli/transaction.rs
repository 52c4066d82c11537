//! Transaction CLI commands
//!
//! Every change goes through the mutation coordinator, which applies it to the
//! cache, writes it to the store and records the audit entry.

use clap::Subcommand;

use crate::display::{format_transaction_details, format_transaction_register};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    resolve_wallet, CategoryId, Taxonomy, Transaction, TransactionKind, Wallet, WalletId,
};
use crate::services::ClassificationRules;

use super::context::{parse_amount, parse_date, parse_month, LedgerContext};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a new transaction
    Add {
        /// Transaction name
        name: String,
        /// Amount (e.g., "50.00"); the category decides the direction
        amount: String,
        /// Category name (defaults to "Transfer" with --to)
        #[arg(short, long)]
        category: Option<String>,
        /// Source wallet name or ID (optional when there is only one)
        #[arg(short, long)]
        wallet: Option<String>,
        /// Transaction date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Planned amount
        #[arg(short, long)]
        planned: Option<String>,
        /// Explicit type: income, expense, savings or transfer
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// Destination wallet; makes this a transfer
        #[arg(long)]
        to: Option<String>,
    },

    /// List a month's transactions
    List {
        /// Month (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show transaction details
    Show {
        /// Transaction ID
        id: String,
    },

    /// Edit a transaction
    Edit {
        /// Transaction ID
        id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New amount
        #[arg(short, long)]
        amount: Option<String>,
        /// New planned amount
        #[arg(short, long)]
        planned: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New date (YYYY-MM-DD); may move the transaction to another month
        #[arg(short, long)]
        date: Option<String>,
        /// New explicit type
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: String,
    },
}

/// Handle a transaction command
pub async fn handle_transaction_command(
    ctx: &LedgerContext,
    cmd: TransactionCommands,
) -> LedgerResult<()> {
    match cmd {
        TransactionCommands::Add {
            name,
            amount,
            category,
            wallet,
            date,
            planned,
            kind,
            to,
        } => {
            let date = parse_date(date.as_deref())?;
            let amount = parse_amount(&amount)?;
            ctx.coordinator.load(crate::models::MonthKey::of(date)).await?;

            let wallets = ctx.wallets()?;
            let source = pick_wallet(&wallets, wallet.as_deref())?;

            let category = match (category, &to) {
                (Some(category), _) => resolve_category(&ctx.taxonomy()?, &category)?,
                (None, Some(_)) => CategoryId::new("Transfer"),
                (None, None) => {
                    return Err(LedgerError::Validation(
                        "A category is required (use --category)".into(),
                    ))
                }
            };

            let mut txn = Transaction::new(name, category, amount, date, source);
            if let Some(planned) = planned {
                txn = txn.with_planned(parse_amount(&planned)?);
            }
            if let Some(kind) = kind {
                txn = txn.with_kind(parse_kind(&kind)?);
            }
            if let Some(to) = to {
                let destination = resolve_wallet(&wallets, &to)
                    .ok_or_else(|| LedgerError::wallet_not_found(&to))?;
                txn = txn.transfer_to(destination.id);
            }

            let created = ctx.coordinator.submit_create(txn).await?;

            println!("Created transaction: {}", created.id);
            println!("  Date:     {}", ctx.style.date(created.date));
            println!("  Name:     {}", created.name);
            println!("  Amount:   {}", ctx.style.money(created.actual_amount));
            println!("  Category: {}", created.category);
        }

        TransactionCommands::List { month } => {
            let key = parse_month(month.as_deref())?;
            let current = ctx.coordinator.load(key).await?;

            let taxonomy = ctx.taxonomy()?;
            let rules = ClassificationRules::new(&taxonomy);
            println!("Transactions for {}", key);
            print!(
                "{}",
                format_transaction_register(
                    &current.transactions,
                    &rules,
                    &ctx.wallets()?,
                    &ctx.style
                )
            );
        }

        TransactionCommands::Show { id } => {
            let id = ctx.resolve_transaction(&id)?;
            let (_, txn) = ctx
                .storage
                .months
                .find_transaction(ctx.coordinator.user(), id)?
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;

            ctx.coordinator.refresh_reference_data().await?;
            print!("{}", format_transaction_details(&txn, &ctx.wallets()?, &ctx.style));
        }

        TransactionCommands::Edit {
            id,
            name,
            amount,
            planned,
            category,
            date,
            kind,
        } => {
            let id = ctx.resolve_transaction(&id)?;
            let (key, mut txn) = ctx
                .storage
                .months
                .find_transaction(ctx.coordinator.user(), id)?
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;
            ctx.coordinator.load(key.key).await?;

            if let Some(name) = name {
                txn.name = name;
            }
            if let Some(amount) = amount {
                txn.actual_amount = parse_amount(&amount)?;
            }
            if let Some(planned) = planned {
                txn.planned_amount = parse_amount(&planned)?;
            }
            if let Some(category) = category {
                txn.category = resolve_category(&ctx.taxonomy()?, &category)?;
            }
            if let Some(date) = date {
                txn.date = parse_date(Some(&date))?;
            }
            if let Some(kind) = kind {
                txn.kind = Some(parse_kind(&kind)?);
            }

            let updated = ctx.coordinator.submit_update(txn).await?;
            println!("Updated transaction: {}", updated.id);
            if updated.month() != key.key {
                println!("  Moved from {} to {}", key.key, updated.month());
            }
        }

        TransactionCommands::Delete { id } => {
            let id = ctx.resolve_transaction(&id)?;
            let (key, _) = ctx
                .storage
                .months
                .find_transaction(ctx.coordinator.user(), id)?
                .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))?;
            ctx.coordinator.load(key.key).await?;

            let removed = ctx.coordinator.submit_delete(id).await?;
            println!(
                "Deleted transaction: {} ({}, {})",
                removed.name,
                ctx.style.date(removed.date),
                ctx.style.money(removed.actual_amount)
            );
        }
    }

    Ok(())
}

/// Pick the source wallet; with a single wallet the argument is optional
fn pick_wallet(wallets: &[Wallet], needle: Option<&str>) -> LedgerResult<WalletId> {
    match (needle, wallets) {
        (Some(needle), _) => resolve_wallet(wallets, needle)
            .map(|w| w.id)
            .ok_or_else(|| LedgerError::wallet_not_found(needle)),
        (None, [only]) => Ok(only.id),
        (None, []) => Err(LedgerError::Validation(
            "No wallets found; add one through the wallet service first".into(),
        )),
        (None, _) => Err(LedgerError::Validation(
            "Several wallets exist; pick one with --wallet".into(),
        )),
    }
}

/// Canonical id for a category name; "Transfer" is accepted as-is
fn resolve_category(taxonomy: &Taxonomy, name: &str) -> LedgerResult<CategoryId> {
    let id = CategoryId::new(name.trim());
    if id.matches("Transfer") {
        return Ok(CategoryId::new("Transfer"));
    }
    taxonomy
        .get(&id)
        .map(|c| c.id)
        .ok_or_else(|| LedgerError::category_not_found(name))
}

fn parse_kind(kind: &str) -> LedgerResult<TransactionKind> {
    TransactionKind::parse(kind).ok_or_else(|| {
        LedgerError::Validation(format!(
            "Invalid type: '{}'. Use income, expense, savings or transfer",
            kind
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, SemanticType, WalletType};

    #[test]
    fn test_pick_wallet() {
        let checking = Wallet::new("Checking", WalletType::Checking);
        let vault = Wallet::new("Vault", WalletType::Savings);

        assert_eq!(pick_wallet(&[checking.clone()], None).unwrap(), checking.id);
        assert_eq!(
            pick_wallet(&[checking.clone(), vault.clone()], Some("vault")).unwrap(),
            vault.id
        );
        assert!(pick_wallet(&[checking.clone(), vault], None).unwrap_err().is_validation());
        assert!(pick_wallet(&[], None).unwrap_err().is_validation());
        assert!(pick_wallet(&[checking], Some("nope")).unwrap_err().is_not_found());
    }

    #[test]
    fn test_resolve_category() {
        let taxonomy = Taxonomy::with_custom([Category::new("Pets", SemanticType::Expense)]);
        assert_eq!(resolve_category(&taxonomy, "food").unwrap().as_str(), "Food");
        assert_eq!(resolve_category(&taxonomy, "pets").unwrap().as_str(), "Pets");
        assert_eq!(resolve_category(&taxonomy, "transfer").unwrap().as_str(), "Transfer");
        assert!(resolve_category(&taxonomy, "Yachts").unwrap_err().is_not_found());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("Savings").unwrap(), TransactionKind::Savings);
        assert!(parse_kind("gift").unwrap_err().is_validation());
    }
}
