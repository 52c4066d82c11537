//! Category display formatting

use crate::models::{Category, Taxonomy};

/// Format the taxonomy grouped by semantic type, custom entries marked
pub fn format_category_list(taxonomy: &Taxonomy) -> String {
    let mut output = String::new();

    for (heading, ty) in [
        ("Income", crate::models::SemanticType::Income),
        ("Expense", crate::models::SemanticType::Expense),
        ("Savings", crate::models::SemanticType::Savings),
    ] {
        let entries: Vec<Category> = taxonomy
            .all()
            .into_iter()
            .filter(|c| c.semantic_type == ty)
            .collect();
        if entries.is_empty() {
            continue;
        }

        output.push_str(&format!("{}:\n", heading));
        for category in entries {
            let custom = if Taxonomy::is_built_in(&category.id) {
                ""
            } else {
                " (custom)"
            };
            output.push_str(&format!("  {}{}\n", category.label, custom));
        }
    }

    output
}
