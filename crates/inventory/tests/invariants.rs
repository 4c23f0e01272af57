//! Structural properties of the virtual-balance model: these hold for every
//! state, not just the happy paths.

#[path = "setup.rs"]
mod setup;

use alloy_primitives::{I256, U256};
use config::ONE;
use inventory::fixed;
use setup::*;

// The cumulative balance is exactly the sum of per-chain balances.
#[test]
fn cumulative_is_sum_of_chain_balances() {
    let harness = build(vec![token(&[
        (CHAIN_A, "0.4", "0.3"),
        (CHAIN_B, "0.4", "0.3"),
    ])]);
    harness.set_balance(HUB, amount(123));
    harness.set_balance(CHAIN_A, amount(456));
    harness.set_balance(CHAIN_B, amount(789));

    let by_chain: U256 = [HUB, CHAIN_A, CHAIN_B, CHAIN_C]
        .iter()
        .map(|chain| harness.manager.balance_on_chain(TOKEN_L1, *chain))
        .fold(U256::ZERO, |acc, b| acc + b);

    assert_eq!(harness.manager.cumulative_balance(TOKEN_L1), by_chain);
    assert_eq!(by_chain, amount(123 + 456 + 789));
}

// Unmanaged non-hub chains hold zero and never appear in distributions;
// the hub contributes unconditionally.
#[test]
fn unmanaged_chains_are_invisible_except_hub() {
    let harness = build(vec![token(&[(CHAIN_A, "0.4", "0.3")])]);
    harness.set_balance(HUB, amount(100));
    harness.set_balance(CHAIN_A, amount(100));

    // Chain B is unmanaged: even a stray ledger balance there is ignored.
    harness.tracker.set_balance(CHAIN_B, TOKEN_B, amount(999));

    assert_eq!(
        harness.manager.balance_on_chain(TOKEN_L1, CHAIN_B),
        U256::ZERO
    );
    assert_eq!(harness.manager.cumulative_balance(TOKEN_L1), amount(200));

    let distribution = harness.manager.chain_distribution(TOKEN_L1);
    assert!(distribution.contains_key(&HUB));
    assert!(distribution.contains_key(&CHAIN_A));
    assert!(!distribution.contains_key(&CHAIN_B));
}

// Every planned candidate is strictly under threshold with a positive amount.
#[test]
fn candidates_are_under_threshold_with_positive_amounts() {
    let harness = build(vec![token(&[
        (CHAIN_A, "0.4", "0.3"),
        (CHAIN_B, "0.4", "0.3"),
    ])]);
    harness.set_balance(HUB, amount(700));
    harness.set_balance(CHAIN_A, amount(100));
    harness.set_balance(CHAIN_B, amount(500));

    let candidates = harness.manager.plan_rebalances().unwrap();
    assert!(!candidates.is_empty());

    for candidate in &candidates {
        assert!(candidate.current_alloc_pct < fixed::to_signed(candidate.threshold_pct));
        assert!(candidate.threshold_pct <= candidate.target_pct);
        assert!(candidate.amount > U256::ZERO);
    }
}

// Accepting a rebalance moves exactly `amount` from hub to destination in
// the virtual view; the cumulative is conserved.
#[tokio::test]
async fn accepted_rebalance_conserves_cumulative() {
    let harness = build(vec![token(&[
        (CHAIN_A, "0.3", "0.2"),
        (CHAIN_B, "0.1", "0.05"),
    ])]);
    harness.set_balance(HUB, amount(800));
    harness.set_balance(CHAIN_A, amount(0));
    harness.set_balance(CHAIN_B, amount(200));

    let hub_before = harness.manager.balance_on_chain(TOKEN_L1, HUB);
    let dest_before = harness.manager.balance_on_chain(TOKEN_L1, CHAIN_A);
    let cumulative_before = harness.manager.cumulative_balance(TOKEN_L1);

    let report = harness.manager.rebalance_inventory_if_needed().await;
    assert_eq!(report.executed.len(), 1);
    let (candidate, _) = &report.executed[0];
    let moved = candidate.amount;

    assert_eq!(
        harness.manager.balance_on_chain(TOKEN_L1, CHAIN_A),
        dest_before + moved
    );
    assert_eq!(
        harness.manager.balance_on_chain(TOKEN_L1, HUB),
        hub_before - moved
    );
    assert_eq!(
        harness.manager.cumulative_balance(TOKEN_L1),
        cumulative_before
    );
}

// Distributions recomputed after a rebalance match the updated virtual
// balances exactly.
#[tokio::test]
async fn distribution_tracks_virtual_balances_after_rebalance() {
    let harness = build(vec![token(&[(CHAIN_A, "0.5", "0.4")])]);
    harness.set_balance(HUB, amount(1000));
    harness.set_balance(CHAIN_A, amount(0));

    let report = harness.manager.rebalance_inventory_if_needed().await;
    assert_eq!(report.executed.len(), 1);

    let cumulative = harness.manager.cumulative_balance(TOKEN_L1);
    let distribution = harness.manager.chain_distribution(TOKEN_L1);

    for (chain, pct) in distribution {
        let expected = fixed::ratio(
            fixed::to_signed(harness.manager.balance_on_chain(TOKEN_L1, chain)),
            fixed::to_signed(cumulative),
        );
        assert_eq!(pct, expected);
    }
}

// Shortfalls depress the allocation fraction, possibly below zero, and the
// fractions are then allowed to sum under one.
#[test]
fn shortfalls_depress_allocations() {
    let harness = build(vec![token(&[(CHAIN_A, "0.5", "0.4")])]);
    harness.set_balance(HUB, amount(100));
    harness.set_balance(CHAIN_A, amount(100));
    harness.set_shortfall(CHAIN_A, amount(150));

    let pct = harness.manager.current_alloc_pct(TOKEN_L1, CHAIN_A);
    assert!(pct.is_negative());

    // (100 - 150) * ONE / 200 = -0.25
    let expected = fixed::ratio(
        I256::try_from(-50i64).unwrap(),
        fixed::to_signed(amount(200)),
    );
    assert_eq!(pct, expected);
}

// Zero cumulative yields a zero allocation and an empty distribution.
#[test]
fn zero_cumulative_is_all_zeroes() {
    let harness = build(vec![token(&[(CHAIN_A, "0.5", "0.4")])]);

    assert_eq!(
        harness.manager.current_alloc_pct(TOKEN_L1, CHAIN_A),
        I256::ZERO
    );
    assert!(harness.manager.chain_distribution(TOKEN_L1).is_empty());
}

// With zero output and no refunds, the selector's projection collapses to
// the current allocation: a target set exactly there is accepted, one
// fixed-point step lower is not.
#[tokio::test]
async fn zero_output_projection_equals_current_allocation() {
    // 10 of 110 on chain A: current allocation is floor(10 * ONE / 110).
    let current = U256::from(10) * ONE / U256::from(110);

    for (target, expect_dest) in [(current, true), (current - U256::from(1), false)] {
        let mut cfg = token(&[(CHAIN_A, "0.5", "0.4")]);
        cfg.chains.get_mut(&CHAIN_A).unwrap().target_pct = target;
        cfg.chains.get_mut(&CHAIN_A).unwrap().threshold_pct = U256::ZERO;

        let harness = build(vec![cfg]);
        harness.set_balance(HUB, amount(100));
        harness.set_balance(CHAIN_A, amount(10));

        let chain = harness
            .manager
            .determine_refund_chain(&fill(HUB, CHAIN_A, 0))
            .await
            .unwrap();

        assert_eq!(chain == CHAIN_A, expect_dest, "target {target}");
        if !expect_dest {
            assert_eq!(chain, HUB);
        }
    }
}
