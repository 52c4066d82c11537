//! Wallet CLI commands
//!
//! Wallets belong to the wallet service; the ledger can only list them.

use clap::Subcommand;

use crate::display::format_wallet_list;
use crate::error::LedgerResult;

use super::context::LedgerContext;

/// Wallet subcommands
#[derive(Subcommand)]
pub enum WalletCommands {
    /// List wallets with their savings flag
    List,
}

/// Handle a wallet command
pub async fn handle_wallet_command(ctx: &LedgerContext, cmd: WalletCommands) -> LedgerResult<()> {
    match cmd {
        WalletCommands::List => {
            ctx.coordinator.refresh_reference_data().await?;
            println!("{}", format_wallet_list(&ctx.wallets()?, &ctx.style));
        }
    }

    Ok(())
}
