//! Category CLI commands
//!
//! Built-in categories are fixed; only custom ones can be added or removed.

use clap::Subcommand;

use crate::display::format_category_list;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Category, CategoryId, SemanticType};

use super::context::LedgerContext;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// List all categories by type
    List,

    /// Add a custom category
    Add {
        /// Category name
        name: String,
        /// Semantic type: income, expense or savings
        #[arg(short = 't', long = "type", default_value = "expense")]
        semantic_type: String,
    },

    /// Remove a custom category and its limits
    Remove {
        /// Category name
        category: String,
    },
}

/// Handle a category command
pub async fn handle_category_command(ctx: &LedgerContext, cmd: CategoryCommands) -> LedgerResult<()> {
    ctx.coordinator.refresh_reference_data().await?;

    match cmd {
        CategoryCommands::List => {
            print!("{}", format_category_list(&ctx.taxonomy()?));
        }

        CategoryCommands::Add {
            name,
            semantic_type,
        } => {
            let ty = SemanticType::parse(&semantic_type).ok_or_else(|| {
                LedgerError::Validation(format!(
                    "Invalid category type: '{}'. Use income, expense or savings",
                    semantic_type
                ))
            })?;

            let added = ctx
                .coordinator
                .submit_add_category(Category::new(name.trim(), ty))
                .await?;
            println!("Added category: {} ({})", added.label, added.semantic_type);
        }

        CategoryCommands::Remove { category } => {
            let removed = ctx
                .coordinator
                .submit_remove_category(&CategoryId::new(category.as_str()))
                .await?;
            println!("Removed category: {}", removed.label);
        }
    }

    Ok(())
}
