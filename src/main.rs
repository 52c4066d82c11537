use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use monthwise::cli::{
    handle_audit_command, handle_category_command, handle_daily_command, handle_limit_command,
    handle_limits_command, handle_summary_command, handle_transaction_command,
    handle_wallet_command, CategoryCommands, LedgerContext, LimitCommands, TransactionCommands,
    WalletCommands,
};
use monthwise::config::{MonthwisePaths, Settings};
use monthwise::storage::initialize_storage;

#[derive(Parser)]
#[command(
    name = "monthwise",
    version,
    about = "Monthly personal-finance ledger",
    long_about = "Monthwise groups your transactions into monthly budgets, \
                  classifies them as income, expenses, savings or transfers, \
                  and tracks spending against per-category limits."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new ledger
    Init,

    /// Show current configuration and paths
    Config,

    /// Month totals, planned totals and trends
    Summary {
        /// Month (YYYY-MM, "current" or "last")
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Per-day income, expenses, savings and running balance
    Daily {
        /// Month (YYYY-MM, "current" or "last")
        #[arg(short, long)]
        month: Option<String>,
        /// Include days without activity
        #[arg(long)]
        all: bool,
    },

    /// Spending against category limits
    Limits {
        /// Month (YYYY-MM, "current" or "last")
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Category limit commands
    #[command(subcommand)]
    Limit(LimitCommands),

    /// Transaction management commands
    #[command(subcommand, alias = "transaction")]
    Txn(TransactionCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Wallet commands
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        count: usize,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = MonthwisePaths::new()?;

    let command = match cli.command {
        Some(Commands::Init) => {
            println!("Initializing Monthwise at: {}", paths.base_dir().display());
            let settings = initialize_storage(&paths)?;
            println!("Initialization complete!");
            println!("  User ID: {}", settings.user_id.as_uuid());
            println!();
            println!("Wallets are read from: {}", paths.wallets_file().display());
            println!("Run 'monthwise category list' to see all categories.");
            return Ok(());
        }
        Some(Commands::Config) => {
            let settings = Settings::load_or_create(&paths)?;
            println!("Monthwise Configuration");
            println!("=======================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  User ID:            {}", settings.user_id.as_uuid());
            println!("  Currency symbol:    {}", settings.currency_symbol);
            println!("  Date format:        {}", settings.date_format);
            println!("  Invalidation delay: {}ms", settings.invalidation_delay_ms);
            match settings.rate_limit {
                Some(limit) => println!(
                    "  Rate limit:         {} per {}s",
                    limit.max_mutations, limit.window_secs
                ),
                None => println!("  Rate limit:         off"),
            }
            println!("  Audit enabled:      {}", settings.audit_enabled);
            return Ok(());
        }
        Some(command) => command,
        None => {
            println!("Monthwise - monthly personal-finance ledger");
            println!();
            println!("Run 'monthwise --help' for usage information.");
            println!("Run 'monthwise init' to get started.");
            return Ok(());
        }
    };

    if !paths.is_initialized() {
        anyhow::bail!("Monthwise is not initialized. Run 'monthwise init' first.");
    }

    let settings = Settings::load_or_create(&paths)?;
    let ctx = LedgerContext::open(paths, settings)?;

    let result = match command {
        Commands::Summary { month } => handle_summary_command(&ctx, month.as_deref()).await,
        Commands::Daily { month, all } => handle_daily_command(&ctx, month.as_deref(), all).await,
        Commands::Limits { month } => handle_limits_command(&ctx, month.as_deref()).await,
        Commands::Limit(cmd) => handle_limit_command(&ctx, cmd).await,
        Commands::Txn(cmd) => handle_transaction_command(&ctx, cmd).await,
        Commands::Category(cmd) => handle_category_command(&ctx, cmd).await,
        Commands::Wallet(cmd) => handle_wallet_command(&ctx, cmd).await,
        Commands::Audit { count } => handle_audit_command(&ctx, count),
        Commands::Init | Commands::Config => Ok(()),
    };

    ctx.flush_notifications();
    result?;

    Ok(())
}
