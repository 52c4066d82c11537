//! Category taxonomy
//!
//! Categories map a transaction's category name to a semantic type. The
//! built-in table is fixed; custom categories are user-owned and may be added
//! or removed at any time, so anything holding a category id must tolerate it
//! disappearing.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Category identifier, compared case-insensitively
///
/// The original spelling is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for comparisons
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive comparison against a plain name
    pub fn matches(&self, name: &str) -> bool {
        self.0.to_lowercase() == name.to_lowercase()
    }
}

impl PartialEq for CategoryId {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for CategoryId {}

impl Hash for CategoryId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl PartialOrd for CategoryId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CategoryId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// What a category means for the monthly totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Income,
    Expense,
    Savings,
}

impl SemanticType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" | "expenses" => Some(Self::Expense),
            "savings" | "saving" => Some(Self::Savings),
            _ => None,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
            Self::Savings => write!(f, "Savings"),
        }
    }
}

/// A category entry in the taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique (case-insensitive) identifier
    pub id: CategoryId,

    /// Display label
    pub label: String,

    /// Semantic type used when a transaction carries no explicit type
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
}

impl Category {
    /// Create a category whose id is its label
    pub fn new(label: impl Into<String>, semantic_type: SemanticType) -> Self {
        let label = label.into();
        Self {
            id: CategoryId::new(label.clone()),
            label,
            semantic_type,
        }
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.id.is_empty() || self.label.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.label.len() > 50 {
            return Err(CategoryValidationError::NameTooLong(self.label.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// The fixed built-in categories
const BUILT_IN_CATEGORIES: &[(&str, SemanticType)] = &[
    ("Paycheck", SemanticType::Income),
    ("Bonus", SemanticType::Income),
    ("Debt Added", SemanticType::Income),
    ("Side Hustle", SemanticType::Income),
    ("Freelance", SemanticType::Income),
    ("Gifts Received", SemanticType::Income),
    ("Refund", SemanticType::Income),
    ("Loan Repaid", SemanticType::Income),
    ("Income", SemanticType::Income),
    ("Savings", SemanticType::Savings),
    ("Investments", SemanticType::Savings),
    ("Food", SemanticType::Expense),
    ("Housing", SemanticType::Expense),
    ("Transportation", SemanticType::Expense),
    ("Utilities", SemanticType::Expense),
    ("Healthcare", SemanticType::Expense),
    ("Insurance", SemanticType::Expense),
    ("Entertainment", SemanticType::Expense),
    ("Shopping", SemanticType::Expense),
    ("Education", SemanticType::Expense),
    ("Personal Care", SemanticType::Expense),
    ("Subscriptions", SemanticType::Expense),
    ("Travel", SemanticType::Expense),
    ("Debt Payment", SemanticType::Expense),
    ("Gifts Given", SemanticType::Expense),
    ("Other", SemanticType::Expense),
];

/// Built-in categories plus the user's custom ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    custom: Vec<Category>,
}

impl Taxonomy {
    /// A taxonomy with only the built-in table
    pub fn new() -> Self {
        Self::default()
    }

    /// A taxonomy with the given custom categories
    ///
    /// Custom entries colliding with a built-in or with an earlier entry are skipped.
    pub fn with_custom(custom: impl IntoIterator<Item = Category>) -> Self {
        let mut taxonomy = Self::new();
        for category in custom {
            let _ = taxonomy.add_custom(category);
        }
        taxonomy
    }

    /// All built-in categories in table order
    pub fn built_ins() -> Vec<Category> {
        BUILT_IN_CATEGORIES
            .iter()
            .map(|(label, ty)| Category::new(*label, *ty))
            .collect()
    }

    /// Check if an id names a built-in category
    pub fn is_built_in(id: &CategoryId) -> bool {
        BUILT_IN_CATEGORIES.iter().any(|(label, _)| id.matches(label))
    }

    /// Custom categories in insertion order
    pub fn custom(&self) -> &[Category] {
        &self.custom
    }

    /// Built-ins followed by custom categories
    pub fn all(&self) -> Vec<Category> {
        let mut all = Self::built_ins();
        all.extend(self.custom.iter().cloned());
        all
    }

    /// Look up a category by id
    pub fn get(&self, id: &CategoryId) -> Option<Category> {
        BUILT_IN_CATEGORIES
            .iter()
            .find(|(label, _)| id.matches(label))
            .map(|(label, ty)| Category::new(*label, *ty))
            .or_else(|| self.custom.iter().find(|c| &c.id == id).cloned())
    }

    /// Check if an id is part of the currently valid taxonomy
    pub fn contains(&self, id: &CategoryId) -> bool {
        Self::is_built_in(id) || self.custom.iter().any(|c| &c.id == id)
    }

    /// The semantic type of a category, if it exists
    pub fn semantic_type(&self, id: &CategoryId) -> Option<SemanticType> {
        self.get(id).map(|c| c.semantic_type)
    }

    /// Add a custom category
    pub fn add_custom(&mut self, category: Category) -> Result<(), CategoryValidationError> {
        category.validate()?;
        if self.contains(&category.id) {
            return Err(CategoryValidationError::Duplicate(category.id.to_string()));
        }
        self.custom.push(category);
        Ok(())
    }

    /// Remove a custom category, returning it
    pub fn remove_custom(&mut self, id: &CategoryId) -> Result<Category, CategoryValidationError> {
        if Self::is_built_in(id) {
            return Err(CategoryValidationError::BuiltIn(id.to_string()));
        }
        let index = self
            .custom
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| CategoryValidationError::Unknown(id.to_string()))?;
        Ok(self.custom.remove(index))
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
    Duplicate(String),
    BuiltIn(String),
    Unknown(String),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Category name too long ({} chars, max 50)", len)
            }
            Self::Duplicate(id) => write!(f, "Category already exists: {}", id),
            Self::BuiltIn(id) => write!(f, "Built-in category cannot be removed: {}", id),
            Self::Unknown(id) => write!(f, "Unknown category: {}", id),
        }
    }
}

impl std::error::Error for CategoryValidationError {}
