#![cfg(test)]
extern crate std;

use soroban_sdk::{
    contract, contractimpl, symbol_short,
    testutils::{Address as _, Ledger},
    token, Address, Env,
};

use crate::common::types::{CoinKey, RateConfig, RiskFactors, Side};
use crate::{MoneyMarket, MoneyMarketClient};

/// Identity price oracle: volume == amount in a shared unit, so the numbers
/// in the scenarios below can be read directly as the corresponding
/// utilization percentages.
#[contract]
struct MockOracle;

#[contractimpl]
impl MockOracle {
    pub fn volume(_env: Env, _key: CoinKey, amount: u64) -> u64 {
        amount
    }

    pub fn amt4vol(_env: Env, _key: CoinKey, volume: u64) -> u64 {
        volume
    }
}

#[contract]
struct MockDex;

#[contractimpl]
impl MockDex {
    pub fn has_liq(_env: Env, _key: CoinKey) -> bool {
        true
    }
}

fn shadow_key() -> CoinKey {
    symbol_short!("SHADOW")
}

struct Harness<'a> {
    env: Env,
    client: MoneyMarketClient<'a>,
    treasury: Address,
}

fn setup(env: &Env) -> Harness<'_> {
    env.mock_all_auths();

    let admin = Address::generate(env);
    let contract_id = env.register(MoneyMarket, (admin.clone(), RiskFactors::default_shadow_lt()));
    let client = MoneyMarketClient::new(env, &contract_id);

    let oracle_id = env.register(MockOracle, ());
    let dex_id = env.register(MockDex, ());
    let treasury = Address::generate(env);

    client.set_oracle(&oracle_id);
    client.set_dex(&dex_id);
    client.set_treasury(&treasury);

    Harness { env: env.clone(), client, treasury }
}

fn new_token(env: &Env) -> Address {
    let sac_admin = Address::generate(env);
    env.register_stellar_asset_contract_v2(sac_admin).address()
}

fn mint(env: &Env, token: &Address, to: &Address, amount: i128) {
    token::StellarAssetClient::new(env, token).mint(to, &amount);
}

fn balance(env: &Env, token: &Address, who: &Address) -> i128 {
    token::Client::new(env, token).balance(who)
}

fn onboard_asset(h: &Harness, key: &CoinKey, risk: RiskFactors) -> Address {
    let token = new_token(&h.env);
    h.client.onboard_coin(key, &token, &risk, &RateConfig::default_for_asset());
    token
}

fn onboard_shadow(h: &Harness) -> Address {
    let token = new_token(&h.env);
    h.client.onboard_coin(&shadow_key(), &token, &RiskFactors::default_for_asset(), &RateConfig::default_for_asset());
    token
}

// S1: basic deposit/borrow/repay on the asset side.
#[test]
fn s1_basic_deposit_borrow_repay_asset_side() {
    let env = Env::default();
    let h = setup(&env);
    let weth = symbol_short!("WETH");

    let weth_token = onboard_asset(&h, &weth, RiskFactors::default_for_asset());
    let shadow_token = onboard_shadow(&h);

    // liquidity provider funds the shadow side so the user has something to borrow
    let lp = Address::generate(&env);
    mint(&env, &shadow_token, &lp, 1_000_000);
    h.client.deposit(&lp, &lp, &Side::ShadowToAsset, &weth, &1_000_000, &false);

    let user = Address::generate(&env);
    mint(&env, &weth_token, &user, 10_000);
    h.client.deposit(&user, &user, &Side::AssetToShadow, &weth, &10_000, &false);

    h.client.borrow(&user, &user, &Side::AssetToShadow, &weth, &6_999);
    assert_eq!(h.client.borrowed(&user, &Side::AssetToShadow, &weth), 6_999);

    let rejected = h.client.try_borrow(&user, &user, &Side::AssetToShadow, &weth, &1);
    assert!(rejected.is_err());

    h.client.repay(&user, &Side::AssetToShadow, &weth, &6_999);
    assert_eq!(h.client.borrowed(&user, &Side::AssetToShadow, &weth), 0);
}

// S2: a coin entry can't mix normal and collateral-only deposits.
#[test]
fn s2_deposit_mode_exclusivity() {
    let env = Env::default();
    let h = setup(&env);
    let weth = symbol_short!("WETH");
    let weth_token = onboard_asset(&h, &weth, RiskFactors::default_for_asset());

    let user = Address::generate(&env);
    mint(&env, &weth_token, &user, 101);
    h.client.deposit(&user, &user, &Side::AssetToShadow, &weth, &100, &false);

    let rejected = h.client.try_deposit(&user, &user, &Side::AssetToShadow, &weth, &1, &true);
    assert!(rejected.is_err());
}

// S3: shadow LT at 100% — borrowing the full deposited volume is unsafe,
// one unit under it is not.
#[test]
fn s3_shadow_side_full_ltv_boundary() {
    let env = Env::default();
    let h = setup(&env);
    let weth = symbol_short!("WETH");

    let weth_token = onboard_asset(&h, &weth, RiskFactors::default_for_asset());
    let shadow_token = onboard_shadow(&h);

    let asset_lp = Address::generate(&env);
    mint(&env, &weth_token, &asset_lp, 1_000_000);
    h.client.deposit(&asset_lp, &asset_lp, &Side::AssetToShadow, &weth, &1_000_000, &false);

    let user = Address::generate(&env);
    mint(&env, &shadow_token, &user, 10_000);
    h.client.deposit(&user, &user, &Side::ShadowToAsset, &weth, &10_000, &false);

    h.client.borrow(&user, &user, &Side::ShadowToAsset, &weth, &9_999);
    assert_eq!(h.client.borrowed(&user, &Side::ShadowToAsset, &weth), 9_999);

    let rejected = h.client.try_borrow(&user, &user, &Side::ShadowToAsset, &weth, &1);
    assert!(rejected.is_err());
}

// S4: rebalance rescue moves shadow collateral from an over-collateralized
// key to one that's short, without any token leaving the contract.
#[test]
fn s4_rebalance_rescue_between_shadow_keys() {
    let env = Env::default();
    let h = setup(&env);
    let weth = symbol_short!("WETH");
    let uni = symbol_short!("UNI");

    let weth_token = onboard_asset(&h, &weth, RiskFactors::default_for_asset());
    let uni_token = onboard_asset(&h, &uni, RiskFactors::default_for_asset());
    let shadow_token = onboard_shadow(&h);

    // asset-side liquidity providers so the shadow-collateralized borrows below can settle
    let weth_lp = Address::generate(&env);
    mint(&env, &weth_token, &weth_lp, 1_000_000);
    h.client.deposit(&weth_lp, &weth_lp, &Side::AssetToShadow, &weth, &1_000_000, &false);

    let uni_lp = Address::generate(&env);
    mint(&env, &uni_token, &uni_lp, 1_000_000);
    h.client.deposit(&uni_lp, &uni_lp, &Side::AssetToShadow, &uni, &1_000_000, &false);

    let user = Address::generate(&env);
    mint(&env, &shadow_token, &user, 200_000);
    h.client.deposit(&user, &user, &Side::ShadowToAsset, &weth, &100_000, &false);
    h.client.deposit(&user, &user, &Side::ShadowToAsset, &uni, &100_000, &false);

    h.client.borrow(&user, &user, &Side::ShadowToAsset, &weth, &50_000);
    h.client.borrow(&user, &user, &Side::ShadowToAsset, &uni, &60_000);

    // push UNI further so it goes unsafe (shadow_lt = 100%)
    h.client.borrow(&user, &user, &Side::ShadowToAsset, &uni, &50_000);
    assert!(!h.client.is_safe(&user, &Side::ShadowToAsset, &uni));
    assert!(h.client.is_safe(&user, &Side::ShadowToAsset, &weth));

    h.client.rebalance_shadow(&user, &weth, &uni);

    assert!(h.client.is_safe(&user, &Side::ShadowToAsset, &uni));
    assert!(h.client.is_safe(&user, &Side::ShadowToAsset, &weth));
    assert_eq!(h.client.deposited(&user, &Side::ShadowToAsset, &weth), 90_000);
    assert_eq!(h.client.deposited(&user, &Side::ShadowToAsset, &uni), 110_000);
}

// S5: liquidating an unsafe asset-side position zeroes it out and hands the
// deposited collateral back for settlement.
#[test]
fn s5_liquidation_of_asset_side() {
    let env = Env::default();
    let h = setup(&env);
    let weth = symbol_short!("WETH");

    // onboard with generous LT so the initial borrow is allowed, then tighten it
    let generous = RiskFactors { ltv: 900_000_000, lt: 950_000_000, ..RiskFactors::default_for_asset() };
    let weth_token = onboard_asset(&h, &weth, generous);
    let shadow_token = onboard_shadow(&h);

    let lp = Address::generate(&env);
    mint(&env, &shadow_token, &lp, 1_000_000);
    h.client.deposit(&lp, &lp, &Side::ShadowToAsset, &weth, &1_000_000, &false);

    let user = Address::generate(&env);
    mint(&env, &weth_token, &user, 100);
    h.client.deposit(&user, &user, &Side::AssetToShadow, &weth, &100, &false);
    h.client.borrow(&user, &user, &Side::AssetToShadow, &weth, &90);

    h.client.set_risk_factors(&weth, &RiskFactors::default_for_asset());
    assert!(!h.client.is_safe(&user, &Side::AssetToShadow, &weth));

    let liquidator = Address::generate(&env);
    let (amount, is_conly) = h.client.liquidate(&liquidator, &user, &Side::AssetToShadow, &weth);
    assert_eq!(amount, 100);
    assert!(!is_conly);
    assert_eq!(h.client.deposited(&user, &Side::AssetToShadow, &weth), 0);
    assert_eq!(h.client.borrowed(&user, &Side::AssetToShadow, &weth), 0);
}

// S6: interest accrues over a week of borrowing, protocol fees become
// positive, and harvesting them moves exactly that amount to the treasury.
#[test]
fn s6_interest_accrual_and_harvest() {
    let env = Env::default();
    let h = setup(&env);
    let uni = symbol_short!("UNI");

    let uni_token = onboard_asset(&h, &uni, RiskFactors::default_for_asset());
    let shadow_token = onboard_shadow(&h);

    let asset_lp = Address::generate(&env);
    mint(&env, &uni_token, &asset_lp, 10_000_000);
    h.client.deposit(&asset_lp, &asset_lp, &Side::AssetToShadow, &uni, &10_000_000, &false);

    let borrower = Address::generate(&env);
    mint(&env, &shadow_token, &borrower, 3_000_000);
    h.client.deposit(&borrower, &borrower, &Side::ShadowToAsset, &uni, &3_000_000, &false);
    h.client.borrow(&borrower, &borrower, &Side::ShadowToAsset, &uni, &1_000_000);

    env.ledger().with_mut(|li| li.timestamp += 604_800);

    h.client.repay(&borrower, &Side::ShadowToAsset, &uni, &1_000_000);

    let pool = h.client.asset_pool_state(&uni);
    assert!(pool.protocol_fees > 0);

    let treasury_before = balance(&env, &uni_token, &h.treasury);
    let (asset_take, _shadow_take) = h.client.harvest_protocol_fees(&uni);
    let treasury_after = balance(&env, &uni_token, &h.treasury);

    assert_eq!(asset_take, pool.protocol_fees);
    assert_eq!(treasury_after - treasury_before, asset_take as i128);
}

// General invariant: collateral-only can never exceed total deposited, and
// withdrawing the collateral-only remainder clears both fields together.
#[test]
fn invariant_conly_deposited_never_exceeds_deposited() {
    let env = Env::default();
    let h = setup(&env);
    let weth = symbol_short!("WETH");
    let weth_token = onboard_asset(&h, &weth, RiskFactors::default_for_asset());

    let user = Address::generate(&env);
    mint(&env, &weth_token, &user, 500);
    h.client.deposit(&user, &user, &Side::AssetToShadow, &weth, &500, &true);

    assert!(h.client.conly_deposited(&user, &Side::AssetToShadow, &weth) <= h.client.deposited(&user, &Side::AssetToShadow, &weth));

    h.client.withdraw(&user, &user, &Side::AssetToShadow, &weth, &500, &true);
    assert_eq!(h.client.deposited(&user, &Side::AssetToShadow, &weth), 0);
    assert_eq!(h.client.conly_deposited(&user, &Side::AssetToShadow, &weth), 0);
}
