//! Property-based tests for wallet balance reconciliation.
//!
//! The model under test: a wallet's balance equals the sum of income amounts
//! currently linked to it, shifted by transfers. Properties drive the delta
//! functions against an in-memory ledger and check that the materialized
//! balances always match what the linked incomes imply.

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::reconcile::{
    EntryKind, WalletDelta, WalletLink, creation_deltas, deletion_deltas, has_sufficient_balance,
    reconciliation_deltas, transfer_deltas,
};

/// Applies signed adjustments to an in-memory balance map.
fn apply(ledger: &mut HashMap<Uuid, Decimal>, deltas: &[WalletDelta]) {
    for d in deltas {
        *ledger.entry(d.wallet_id).or_insert(Decimal::ZERO) += d.delta;
    }
}

/// What a link contributes to a given wallet's balance.
fn contribution(link: WalletLink, wallet: Uuid) -> Decimal {
    if link.wallet_id == Some(wallet) {
        link.amount
    } else {
        Decimal::ZERO
    }
}

/// Strategy for positive decimal amounts (0.01 to 10,000.00).
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a wallet slot: index into a small pool, or detached.
fn slot_strategy() -> impl Strategy<Value = Option<usize>> {
    proptest::option::of(0usize..3)
}

fn pool() -> [Uuid; 3] {
    [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The net of a reconciliation equals the change in total linked amount.
    #[test]
    fn prop_reconcile_conserves_linked_total(
        old_slot in slot_strategy(),
        new_slot in slot_strategy(),
        old_amount in amount_strategy(),
        new_amount in amount_strategy(),
    ) {
        let wallets = pool();
        let old = WalletLink::new(old_slot.map(|i| wallets[i]), old_amount);
        let new = WalletLink::new(new_slot.map(|i| wallets[i]), new_amount);

        let deltas = reconciliation_deltas(EntryKind::Income, old, new);
        let net: Decimal = deltas.iter().map(|d| d.delta).sum();

        let old_linked = if old.wallet_id.is_some() { old_amount } else { Decimal::ZERO };
        let new_linked = if new.wallet_id.is_some() { new_amount } else { Decimal::ZERO };
        prop_assert_eq!(net, new_linked - old_linked);
    }

    /// Per wallet, a reconciliation moves the balance exactly from the old
    /// link's contribution to the new link's contribution.
    #[test]
    fn prop_reconcile_is_exact_per_wallet(
        old_slot in slot_strategy(),
        new_slot in slot_strategy(),
        old_amount in amount_strategy(),
        new_amount in amount_strategy(),
    ) {
        let wallets = pool();
        let old = WalletLink::new(old_slot.map(|i| wallets[i]), old_amount);
        let new = WalletLink::new(new_slot.map(|i| wallets[i]), new_amount);

        // Start from balances implied by the old link
        let mut ledger: HashMap<Uuid, Decimal> = wallets
            .iter()
            .map(|&w| (w, contribution(old, w)))
            .collect();

        apply(&mut ledger, &reconciliation_deltas(EntryKind::Income, old, new));

        for &w in &wallets {
            prop_assert_eq!(ledger[&w], contribution(new, w), "wallet {}", w);
        }
    }

    /// Create followed by delete always nets to zero, regardless of linkage.
    #[test]
    fn prop_create_delete_round_trip(
        slot in slot_strategy(),
        amount in amount_strategy(),
    ) {
        let wallets = pool();
        let link = WalletLink::new(slot.map(|i| wallets[i]), amount);

        let mut ledger: HashMap<Uuid, Decimal> = HashMap::new();
        apply(&mut ledger, &creation_deltas(EntryKind::Income, link));
        apply(&mut ledger, &deletion_deltas(EntryKind::Income, link));

        prop_assert!(ledger.values().all(|b| b.is_zero()));
    }

    /// A chain of updates leaves balances matching only the final link.
    #[test]
    fn prop_update_chain_matches_final_link(
        first_slot in slot_strategy(),
        first_amount in amount_strategy(),
        chain in proptest::collection::vec((slot_strategy(), amount_strategy()), 1..8),
    ) {
        let wallets = pool();
        let mut current = WalletLink::new(first_slot.map(|i| wallets[i]), first_amount);

        let mut ledger: HashMap<Uuid, Decimal> = HashMap::new();
        apply(&mut ledger, &creation_deltas(EntryKind::Income, current));

        for (slot, amount) in chain {
            let next = WalletLink::new(slot.map(|i| wallets[i]), amount);
            apply(&mut ledger, &reconciliation_deltas(EntryKind::Income, current, next));
            current = next;
        }

        for &w in &wallets {
            let balance = ledger.get(&w).copied().unwrap_or(Decimal::ZERO);
            prop_assert_eq!(balance, contribution(current, w));
        }
    }

    /// A transfer conserves the combined balance and moves exactly `amount`.
    #[test]
    fn prop_transfer_conservation(
        from_balance in amount_strategy(),
        to_balance in amount_strategy(),
        amount in amount_strategy(),
    ) {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let mut ledger: HashMap<Uuid, Decimal> =
            [(from, from_balance), (to, to_balance)].into_iter().collect();

        apply(&mut ledger, &transfer_deltas(from, to, amount));

        prop_assert_eq!(ledger[&from], from_balance - amount);
        prop_assert_eq!(ledger[&to], to_balance + amount);
        prop_assert_eq!(ledger[&from] + ledger[&to], from_balance + to_balance);
    }

    /// Expense mutations never produce adjustments for any linkage.
    #[test]
    fn prop_expense_is_inert(
        old_slot in slot_strategy(),
        new_slot in slot_strategy(),
        old_amount in amount_strategy(),
        new_amount in amount_strategy(),
    ) {
        let wallets = pool();
        let old = WalletLink::new(old_slot.map(|i| wallets[i]), old_amount);
        let new = WalletLink::new(new_slot.map(|i| wallets[i]), new_amount);

        prop_assert!(creation_deltas(EntryKind::Expense, old).is_empty());
        prop_assert!(deletion_deltas(EntryKind::Expense, old).is_empty());
        prop_assert!(reconciliation_deltas(EntryKind::Expense, old, new).is_empty());
    }
}

/// Walks the full lifecycle: create income on W1, move it to W2, transfer
/// between wallets, then delete the income. Deleting after an unrelated
/// transfer legitimately drives W2 negative; no clamping, no error.
#[test]
fn scenario_income_move_transfer_delete() {
    let w1 = Uuid::new_v4();
    let w2 = Uuid::new_v4();
    let mut ledger: HashMap<Uuid, Decimal> =
        [(w1, dec!(0)), (w2, dec!(0))].into_iter().collect();

    // Income of 500 booked against W1
    let on_w1 = WalletLink::new(Some(w1), dec!(500));
    apply(&mut ledger, &creation_deltas(EntryKind::Income, on_w1));
    assert_eq!(ledger[&w1], dec!(500));
    assert_eq!(ledger[&w2], dec!(0));

    // Move the income to W2, amount unchanged
    let on_w2 = WalletLink::new(Some(w2), dec!(500));
    apply(
        &mut ledger,
        &reconciliation_deltas(EntryKind::Income, on_w1, on_w2),
    );
    assert_eq!(ledger[&w1], dec!(0));
    assert_eq!(ledger[&w2], dec!(500));

    // Transfer 200 from W2 back to W1
    assert!(has_sufficient_balance(ledger[&w2], dec!(200)));
    apply(&mut ledger, &transfer_deltas(w2, w1, dec!(200)));
    assert_eq!(ledger[&w1], dec!(200));
    assert_eq!(ledger[&w2], dec!(300));

    // Delete the income; it still points at W2
    apply(&mut ledger, &deletion_deltas(EntryKind::Income, on_w2));
    assert_eq!(ledger[&w2], dec!(-200));

    // An oversized transfer is rejected before any adjustment is applied
    assert!(!has_sufficient_balance(ledger[&w1], dec!(1_000_000)));
    assert_eq!(ledger[&w1], dec!(200));
    assert_eq!(ledger[&w2], dec!(-200));
}
