//! Per-wallet balance adjustments for entry and transfer mutations.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Which kind of entry a mutation concerns.
///
/// Only incomes move wallet balances. Expenses are tracked for reporting and
/// leave the stored balance untouched on every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Adjusts the linked wallet's balance on create/update/delete.
    Income,
    /// Never adjusts any balance.
    Expense,
}

/// An entry's wallet linkage: the wallet it is booked against (if any) and
/// the amount it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletLink {
    /// Linked wallet, `None` for entries not booked against a wallet.
    pub wallet_id: Option<Uuid>,
    /// Entry amount (always positive).
    pub amount: Decimal,
}

impl WalletLink {
    /// Creates a linkage.
    #[must_use]
    pub const fn new(wallet_id: Option<Uuid>, amount: Decimal) -> Self {
        Self { wallet_id, amount }
    }
}

/// A signed adjustment to one wallet's stored balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletDelta {
    /// Wallet to adjust.
    pub wallet_id: Uuid,
    /// Signed amount to add to the stored balance.
    pub delta: Decimal,
}

/// Adjustments for creating an entry.
///
/// An income linked to a wallet credits that wallet by its amount; anything
/// else produces no adjustment.
#[must_use]
pub fn creation_deltas(kind: EntryKind, link: WalletLink) -> Vec<WalletDelta> {
    match (kind, link.wallet_id) {
        (EntryKind::Income, Some(wallet_id)) => vec![WalletDelta {
            wallet_id,
            delta: link.amount,
        }],
        _ => Vec::new(),
    }
}

/// Adjustments for deleting an entry. Mirrors [`creation_deltas`] with the
/// sign flipped, so create followed by delete nets to zero.
#[must_use]
pub fn deletion_deltas(kind: EntryKind, link: WalletLink) -> Vec<WalletDelta> {
    match (kind, link.wallet_id) {
        (EntryKind::Income, Some(wallet_id)) => vec![WalletDelta {
            wallet_id,
            delta: -link.amount,
        }],
        _ => Vec::new(),
    }
}

/// Adjustments for updating an entry from `old` to `new`.
///
/// When the wallet is unchanged and non-null, the single wallet moves by the
/// amount difference. When the wallet identity changes (including to or from
/// null), the old wallet gives back the old amount and the new wallet
/// receives the new amount.
#[must_use]
pub fn reconciliation_deltas(kind: EntryKind, old: WalletLink, new: WalletLink) -> Vec<WalletDelta> {
    if kind == EntryKind::Expense {
        return Vec::new();
    }

    match (old.wallet_id, new.wallet_id) {
        (Some(old_wallet), Some(new_wallet)) if old_wallet == new_wallet => {
            vec![WalletDelta {
                wallet_id: old_wallet,
                delta: new.amount - old.amount,
            }]
        }
        (old_wallet, new_wallet) => {
            let mut deltas = Vec::with_capacity(2);
            if let Some(wallet_id) = old_wallet {
                deltas.push(WalletDelta {
                    wallet_id,
                    delta: -old.amount,
                });
            }
            if let Some(wallet_id) = new_wallet {
                deltas.push(WalletDelta {
                    wallet_id,
                    delta: new.amount,
                });
            }
            deltas
        }
    }
}

/// Adjustments for a transfer between two distinct wallets.
///
/// The pair always sums to zero: money moves, it is never created or
/// destroyed.
#[must_use]
pub fn transfer_deltas(from_wallet: Uuid, to_wallet: Uuid, amount: Decimal) -> [WalletDelta; 2] {
    [
        WalletDelta {
            wallet_id: from_wallet,
            delta: -amount,
        },
        WalletDelta {
            wallet_id: to_wallet,
            delta: amount,
        },
    ]
}

/// Whether a wallet holds enough to send `amount`.
///
/// Transfers require the full amount up front. Balances may still go
/// negative through income deletion; that is legal and never clamped.
#[must_use]
pub fn has_sufficient_balance(balance: Decimal, amount: Decimal) -> bool {
    balance >= amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn link(wallet: Option<Uuid>, amount: Decimal) -> WalletLink {
        WalletLink::new(wallet, amount)
    }

    #[test]
    fn test_income_create_credits_wallet() {
        let wallet = Uuid::new_v4();
        let deltas = creation_deltas(EntryKind::Income, link(Some(wallet), dec!(500)));
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].wallet_id, wallet);
        assert_eq!(deltas[0].delta, dec!(500));
    }

    #[test]
    fn test_detached_income_create_is_noop() {
        let deltas = creation_deltas(EntryKind::Income, link(None, dec!(500)));
        assert!(deltas.is_empty());
    }

    #[test]
    fn test_income_delete_debits_wallet() {
        let wallet = Uuid::new_v4();
        let deltas = deletion_deltas(EntryKind::Income, link(Some(wallet), dec!(500)));
        assert_eq!(deltas, vec![WalletDelta {
            wallet_id: wallet,
            delta: dec!(-500),
        }]);
    }

    #[test]
    fn test_expense_mutations_never_touch_balance() {
        let wallet = Uuid::new_v4();
        let old = link(Some(wallet), dec!(120));
        let new = link(Some(Uuid::new_v4()), dec!(360));

        assert!(creation_deltas(EntryKind::Expense, old).is_empty());
        assert!(deletion_deltas(EntryKind::Expense, old).is_empty());
        assert!(reconciliation_deltas(EntryKind::Expense, old, new).is_empty());
        assert!(reconciliation_deltas(EntryKind::Expense, old, link(None, dec!(1))).is_empty());
    }

    #[test]
    fn test_same_wallet_amount_change() {
        let wallet = Uuid::new_v4();
        let deltas = reconciliation_deltas(
            EntryKind::Income,
            link(Some(wallet), dec!(100)),
            link(Some(wallet), dec!(75)),
        );
        assert_eq!(deltas, vec![WalletDelta {
            wallet_id: wallet,
            delta: dec!(-25),
        }]);
    }

    #[test]
    fn test_same_wallet_same_amount_is_zero_delta() {
        let wallet = Uuid::new_v4();
        let deltas = reconciliation_deltas(
            EntryKind::Income,
            link(Some(wallet), dec!(100)),
            link(Some(wallet), dec!(100)),
        );
        assert_eq!(deltas, vec![WalletDelta {
            wallet_id: wallet,
            delta: dec!(0),
        }]);
    }

    #[test]
    fn test_wallet_move_debits_old_credits_new() {
        let old_wallet = Uuid::new_v4();
        let new_wallet = Uuid::new_v4();
        let deltas = reconciliation_deltas(
            EntryKind::Income,
            link(Some(old_wallet), dec!(100)),
            link(Some(new_wallet), dec!(100)),
        );
        assert_eq!(deltas, vec![
            WalletDelta {
                wallet_id: old_wallet,
                delta: dec!(-100),
            },
            WalletDelta {
                wallet_id: new_wallet,
                delta: dec!(100),
            },
        ]);
    }

    #[test]
    fn test_attach_to_wallet() {
        let wallet = Uuid::new_v4();
        let deltas = reconciliation_deltas(
            EntryKind::Income,
            link(None, dec!(40)),
            link(Some(wallet), dec!(60)),
        );
        assert_eq!(deltas, vec![WalletDelta {
            wallet_id: wallet,
            delta: dec!(60),
        }]);
    }

    #[test]
    fn test_detach_from_wallet() {
        let wallet = Uuid::new_v4();
        let deltas = reconciliation_deltas(
            EntryKind::Income,
            link(Some(wallet), dec!(60)),
            link(None, dec!(40)),
        );
        assert_eq!(deltas, vec![WalletDelta {
            wallet_id: wallet,
            delta: dec!(-60),
        }]);
    }

    #[test]
    fn test_detached_on_both_sides() {
        let deltas = reconciliation_deltas(
            EntryKind::Income,
            link(None, dec!(10)),
            link(None, dec!(20)),
        );
        assert!(deltas.is_empty());
    }

    #[test]
    fn test_transfer_pair_sums_to_zero() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let [out, into] = transfer_deltas(from, to, dec!(200));
        assert_eq!(out.delta + into.delta, dec!(0));
        assert_eq!(out.wallet_id, from);
        assert_eq!(out.delta, dec!(-200));
        assert_eq!(into.wallet_id, to);
        assert_eq!(into.delta, dec!(200));
    }

    #[test]
    fn test_sufficient_balance_boundary() {
        assert!(has_sufficient_balance(dec!(200), dec!(200)));
        assert!(has_sufficient_balance(dec!(200.01), dec!(200)));
        assert!(!has_sufficient_balance(dec!(199.99), dec!(200)));
        assert!(!has_sufficient_balance(dec!(-10), dec!(1)));
    }
}
