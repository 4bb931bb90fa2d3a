//! Wallet balances.

use serde::{Deserialize, Serialize};

/// Balance of a single coin.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Balance {
    /// Coin code (e.g., "USDT", "BTC").
    pub coin: String,
    /// Equity including unrealised PnL.
    pub equity: f64,
    /// Wallet balance.
    pub wallet_balance: f64,
    /// Amount free for trading or withdrawal.
    pub available: f64,
}

impl Balance {
    /// Returns true if the wallet balance is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wallet_balance == 0.0
    }
}

/// Trading account summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Account {
    /// Exchange account type (e.g., "UNIFIED").
    pub account_type: String,
    /// Total equity in the account's valuation currency.
    pub total_equity: f64,
    /// Total wallet balance.
    pub total_wallet_balance: f64,
    /// Total available balance.
    pub total_available_balance: f64,
    /// Per-coin balances.
    pub balances: Vec<Balance>,
}

impl Account {
    /// Looks up the balance for `coin`.
    #[must_use]
    pub fn balance(&self, coin: &str) -> Option<&Balance> {
        self.balances.iter().find(|b| b.coin == coin)
    }

    /// Balances that are not empty.
    pub fn non_empty_balances(&self) -> impl Iterator<Item = &Balance> {
        self.balances.iter().filter(|b| !b.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_lookup() {
        let account = Account {
            account_type: "UNIFIED".to_string(),
            balances: vec![
                Balance {
                    coin: "USDT".to_string(),
                    wallet_balance: 100.0,
                    ..Balance::default()
                },
                Balance {
                    coin: "BTC".to_string(),
                    ..Balance::default()
                },
            ],
            ..Account::default()
        };
        assert_eq!(account.balance("USDT").unwrap().wallet_balance, 100.0);
        assert!(account.balance("ETH").is_none());
        assert_eq!(account.non_empty_balances().count(), 1);
    }
}
