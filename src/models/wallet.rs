//! Wallet model
//!
//! Wallets are owned by an external wallet service. The ledger only reads
//! them, most importantly the `is_savings_wallet` flag that decides whether a
//! transfer counts as savings.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::WalletId;
use super::money::Money;

/// Type of wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletType {
    #[default]
    Checking,
    Savings,
    Credit,
    Cash,
    Investment,
    Other,
}

impl WalletType {
    /// Parse wallet type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "checking" | "bank" => Some(Self::Checking),
            "savings" => Some(Self::Savings),
            "credit" | "credit_card" | "creditcard" => Some(Self::Credit),
            "cash" => Some(Self::Cash),
            "investment" => Some(Self::Investment),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for WalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "Checking"),
            Self::Savings => write!(f, "Savings"),
            Self::Credit => write!(f, "Credit Card"),
            Self::Cash => write!(f, "Cash"),
            Self::Investment => write!(f, "Investment"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// A wallet as reported by the wallet service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: WalletId,

    pub name: String,

    #[serde(rename = "type", default)]
    pub wallet_type: WalletType,

    #[serde(default)]
    pub balance: Money,

    /// Transfers into this wallet count as savings
    #[serde(default)]
    pub is_savings_wallet: bool,
}

impl Wallet {
    pub fn new(name: impl Into<String>, wallet_type: WalletType) -> Self {
        Self {
            id: WalletId::new(),
            name: name.into(),
            wallet_type,
            balance: Money::zero(),
            is_savings_wallet: false,
        }
    }

    /// Builder-style savings flag
    pub fn savings(mut self, is_savings_wallet: bool) -> Self {
        self.is_savings_wallet = is_savings_wallet;
        self
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.wallet_type)
    }
}

/// Find a wallet by id
pub fn find_wallet(wallets: &[Wallet], id: WalletId) -> Option<&Wallet> {
    wallets.iter().find(|w| w.id == id)
}

/// Resolve a wallet by full id, short id ("wal-1234abcd"), or name
pub fn resolve_wallet<'a>(wallets: &'a [Wallet], needle: &str) -> Option<&'a Wallet> {
    if let Ok(id) = needle.parse::<WalletId>() {
        if let Some(wallet) = find_wallet(wallets, id) {
            return Some(wallet);
        }
    }
    wallets.iter().find(|w| {
        w.id.to_string() == needle || w.name.eq_ignore_ascii_case(needle.trim())
    })
}
