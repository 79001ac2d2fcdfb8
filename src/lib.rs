#![no_std]

use soroban_sdk::{contract, contractimpl, panic_with_error, Address, BytesN, Env};

pub mod admin;
pub mod asset_pool;
pub mod collaborators;
pub mod common;
pub mod interest;
pub mod pool_status;
pub mod position;
pub mod risk;
pub mod shadow_pool;
pub mod share_math;

pub use common::error::Error;

use admin::Admin;
use asset_pool::AssetPool;
use collaborators::{RemoteDex, RemoteOracle, TokenTransport, TokenTreasury};
use common::storage::{Config, Storage};
use common::types::{AssetStorage, CoinKey, PoolStatusFlags, RateConfig, RiskFactors, Side};
use position::Position;
use shadow_pool::ShadowPool;

fn token_transport(config: &Config) -> TokenTransport<'_> {
    TokenTransport { token_addresses: &config.token_addresses }
}

fn treasury<'a>(env: &Env, config: &'a Config) -> TokenTreasury<'a> {
    TokenTreasury {
        token_addresses: &config.token_addresses,
        custodian: config.treasury.as_ref().unwrap_or_else(|| panic_not_initialized(env)),
    }
}

fn oracle<'a>(env: &Env, config: &'a Config) -> RemoteOracle<'a> {
    RemoteOracle { address: config.oracle.as_ref().unwrap_or_else(|| panic_not_initialized(env)) }
}

fn dex<'a>(env: &Env, config: &'a Config) -> RemoteDex<'a> {
    RemoteDex { address: config.dex.as_ref().unwrap_or_else(|| panic_not_initialized(env)) }
}

fn panic_not_initialized(env: &Env) -> ! {
    panic_with_error!(env, Error::NotInitialized)
}

#[contract]
pub struct MoneyMarket;

#[contractimpl]
impl MoneyMarket {
    pub fn __constructor(env: &Env, admin: Address, shadow_lt: u64) {
        Admin::initialize(env, &admin, shadow_lt);
    }

    pub fn upgrade(env: &Env, new_wasm_hash: BytesN<32>) {
        Admin::upgrade(env, &new_wasm_hash);
    }

    // ==================== Admin / onboarding ====================

    pub fn onboard_coin(
        env: &Env,
        key: CoinKey,
        token: Address,
        risk_factors: RiskFactors,
        rate_config: RateConfig,
    ) -> Result<(), Error> {
        let config = Storage::get(env);
        let dex_facade = dex(env, &config);
        Admin::onboard_coin(env, &dex_facade, &key, &token, risk_factors, rate_config)
    }

    pub fn set_risk_factors(env: &Env, key: CoinKey, factors: RiskFactors) -> Result<(), Error> {
        Admin::set_risk_factors(env, &key, factors)
    }

    pub fn set_rate_config(env: &Env, key: CoinKey, cfg: RateConfig) {
        Admin::set_rate_config(env, &key, cfg)
    }

    pub fn set_shadow_lt(env: &Env, lt: u64) {
        Admin::set_shadow_lt(env, lt)
    }

    pub fn set_system_active(env: &Env, active: bool) {
        Admin::set_system_active(env, active)
    }

    pub fn set_asset_status(env: &Env, key: CoinKey, flags: PoolStatusFlags) {
        Admin::set_asset_status(env, &key, flags)
    }

    pub fn set_shadow_status(env: &Env, key: CoinKey, flags: PoolStatusFlags) {
        Admin::set_shadow_status(env, &key, flags)
    }

    pub fn set_oracle(env: &Env, address: Address) {
        Admin::set_oracle(env, &address)
    }

    pub fn set_dex(env: &Env, address: Address) {
        Admin::set_dex(env, &address)
    }

    pub fn set_treasury(env: &Env, address: Address) {
        Admin::set_treasury(env, &address)
    }

    // ==================== Core operations ====================

    #[allow(clippy::too_many_arguments)]
    pub fn deposit(
        env: &Env,
        caller: Address,
        beneficiary: Address,
        side: Side,
        key: CoinKey,
        amount: u64,
        is_conly: bool,
    ) -> Result<(), Error> {
        caller.require_auth();
        let config = Storage::get(env);
        let transport = token_transport(&config);

        match side {
            Side::AssetToShadow => {
                AssetPool::deposit_for(env, &transport, &caller, &beneficiary, &key, amount, is_conly)?;
            }
            Side::ShadowToAsset => {
                ShadowPool::deposit_for(env, &transport, &caller, &beneficiary, &key, amount, is_conly)?;
            }
        }
        Position::deposit(env, &beneficiary, side, &key, amount, is_conly)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn withdraw(
        env: &Env,
        caller: Address,
        receiver: Address,
        side: Side,
        key: CoinKey,
        amount: u64,
        is_conly: bool,
    ) -> Result<(), Error> {
        caller.require_auth();
        let config = Storage::get(env);
        let transport = token_transport(&config);
        let price_oracle = oracle(env, &config);

        match side {
            Side::AssetToShadow => {
                AssetPool::withdraw_for(env, &transport, &caller, &receiver, &key, amount as u128, is_conly, false, 0)?;
            }
            Side::ShadowToAsset => {
                ShadowPool::withdraw_for(env, &transport, &caller, &receiver, &key, amount as u128, is_conly, false, 0)?;
            }
        }
        Position::withdraw(env, &price_oracle, &caller, side, &key, amount, is_conly)
    }

    pub fn borrow(
        env: &Env,
        caller: Address,
        receiver: Address,
        side: Side,
        key: CoinKey,
        amount: u64,
    ) -> Result<(), Error> {
        caller.require_auth();
        let config = Storage::get(env);
        let transport = token_transport(&config);
        let treasury_facade = treasury(env, &config);
        let price_oracle = oracle(env, &config);

        match side {
            Side::AssetToShadow => {
                ShadowPool::borrow_for(env, &transport, &treasury_facade, &caller, &receiver, &key, amount)?;
            }
            Side::ShadowToAsset => {
                AssetPool::borrow_for(env, &transport, &treasury_facade, &caller, &receiver, &key, amount)?;
            }
        }
        Position::borrow(env, &price_oracle, &caller, side, &key, amount)
    }

    pub fn repay(env: &Env, caller: Address, side: Side, key: CoinKey, amount: u64) -> Result<(), Error> {
        caller.require_auth();
        let config = Storage::get(env);
        let transport = token_transport(&config);

        let outstanding = Position::borrowed(env, &caller, side, &key);
        let amount = amount.min(outstanding);
        if amount == 0 {
            return Err(Error::AmountIsZero);
        }

        match side {
            Side::AssetToShadow => {
                ShadowPool::repay(env, &transport, &caller, &key, amount as u128, false)?;
            }
            Side::ShadowToAsset => {
                AssetPool::repay(env, &transport, &caller, &key, amount as u128, false)?;
            }
        }
        Position::repay(env, &caller, side, &key, amount)
    }

    /// Move a user's entire deposit for `key` between the normal and
    /// collateral-only buckets, at both the pool and position level.
    pub fn switch_collateral(env: &Env, caller: Address, side: Side, key: CoinKey, to_conly: bool) -> Result<(), Error> {
        caller.require_auth();

        let deposited = Position::deposited(env, &caller, side, &key);
        if deposited == 0 {
            return Err(Error::NotExisted);
        }
        let is_conly = Position::conly_deposited(env, &caller, side, &key) > 0;
        if is_conly == to_conly {
            return Err(Error::AlreadyExisted);
        }

        let share = match side {
            Side::AssetToShadow => {
                let pool = interest::accrue_asset_pool(env, &key)?;
                let (total_amount, total_share) = if is_conly {
                    (pool.total_conly_deposited_amount, pool.total_conly_deposited_share)
                } else {
                    (pool.total_normal_deposited_amount, pool.total_normal_deposited_share)
                };
                share_math::to_share_roundup(deposited as u128, total_amount, total_share)?
            }
            Side::ShadowToAsset => {
                let pool = interest::accrue_shadow_pool(env, &key)?;
                let (total_amount, total_share) = if is_conly {
                    (pool.total_conly_deposited_amount, pool.total_conly_deposited_share)
                } else {
                    (pool.total_normal_deposited_amount, pool.total_normal_deposited_share)
                };
                share_math::to_share_roundup(deposited as u128, total_amount, total_share)?
            }
        };

        match side {
            Side::AssetToShadow => {
                AssetPool::switch_collateral(env, &caller, &key, share, to_conly)?;
            }
            Side::ShadowToAsset => {
                ShadowPool::switch_collateral(env, &caller, &key, share, to_conly)?;
            }
        }

        let config = Storage::get(env);
        Position::withdraw(env, &oracle(env, &config), &caller, side, &key, deposited, is_conly)?;
        Position::deposit(env, &caller, side, &key, deposited, to_conly)
    }

    /// Liquidate an unsafe position. On the shadow side this first tries an
    /// auto-rescue rebalance from another of the target's shadow keys; only
    /// if none covers the shortfall does it force-close and settle at the
    /// pool level. Returns `(amount_withdrawn, was_collateral_only)`, zero
    /// amount signalling a rescue with no forced close.
    pub fn liquidate(env: &Env, liquidator: Address, target: Address, side: Side, key: CoinKey) -> Result<(u64, bool), Error> {
        liquidator.require_auth();
        let config = Storage::get(env);
        let price_oracle = oracle(env, &config);

        Position::require_unsafe(env, &price_oracle, &target, side, &key)?;

        if side == Side::ShadowToAsset {
            if let Some((candidate, amount)) = Position::find_rescue(env, &price_oracle, &target, &key)? {
                let position = Storage::get_position(env, &target, Side::ShadowToAsset);
                let from_is_conly = position
                    .balance
                    .get(candidate.clone())
                    .map(|b| b.conly_deposited > 0)
                    .unwrap_or(false);
                let to_is_conly = position
                    .balance
                    .get(key.clone())
                    .map(|b| b.conly_deposited > 0)
                    .unwrap_or(from_is_conly);

                ShadowPool::rebalance_shadow(env, &candidate, &key, amount, from_is_conly, to_is_conly)?;
                Position::apply_rebalance(env, &target, &candidate, &key, amount, from_is_conly, to_is_conly)?;
                return Ok((0, false));
            }
        }

        let (amount, is_conly) = Position::force_close(env, &target, side, &key)?;
        if amount == 0 {
            return Ok((0, is_conly));
        }

        let transport = token_transport(&config);
        match side {
            Side::AssetToShadow => {
                let withdrawn = AssetPool::withdraw_for_liquidation(env, &transport, &liquidator, &target, &key, amount as u128, is_conly)?;
                ShadowPool::repay(env, &transport, &liquidator, &key, withdrawn, false)?;
            }
            Side::ShadowToAsset => {
                let withdrawn = ShadowPool::withdraw_for_liquidation(env, &transport, &liquidator, &target, &key, amount as u128, is_conly)?;
                AssetPool::repay(env, &transport, &liquidator, &key, withdrawn, false)?;
            }
        }
        Ok((amount, is_conly))
    }

    pub fn rebalance_shadow(env: &Env, caller: Address, key_from: CoinKey, key_to: CoinKey) -> Result<(), Error> {
        caller.require_auth();
        if key_from == key_to {
            return Err(Error::SameCoinKey);
        }
        let config = Storage::get(env);
        let price_oracle = oracle(env, &config);

        let amount = Position::can_rebalance_shadow_between(env, &price_oracle, &caller, &key_from, &key_to)?
            .ok_or(Error::CannotRebalance)?;

        let position = Storage::get_position(env, &caller, Side::ShadowToAsset);
        let from_is_conly = position.balance.get(key_from.clone()).map(|b| b.conly_deposited > 0).unwrap_or(false);
        let to_is_conly = position.balance.get(key_to.clone()).map(|b| b.conly_deposited > 0).unwrap_or(from_is_conly);

        ShadowPool::rebalance_shadow(env, &key_from, &key_to, amount, from_is_conly, to_is_conly)?;
        Position::apply_rebalance(env, &caller, &key_from, &key_to, amount, from_is_conly, to_is_conly)
    }

    /// Borrow shadow against `key1`'s spare collateral headroom, sized to
    /// exactly cover `key2`'s shortfall, and stake it as shadow collateral
    /// under `key2`.
    pub fn borrow_and_rebalance(env: &Env, caller: Address, key1: CoinKey, key2: CoinKey, is_conly: bool) -> Result<(), Error> {
        caller.require_auth();
        if key1 == key2 {
            return Err(Error::SameCoinKey);
        }
        let config = Storage::get(env);
        let price_oracle = oracle(env, &config);
        let transport = token_transport(&config);
        let treasury_facade = treasury(env, &config);

        let amount = Position::borrow_and_rebalance_amount(env, &price_oracle, &caller, &key1, &key2)?;
        let amount = amount.min(u64::MAX as u128) as u64;
        if amount == 0 {
            return Err(Error::CannotRebalance);
        }

        ShadowPool::borrow_for(env, &transport, &treasury_facade, &caller, &caller, &key1, amount)?;
        Position::borrow(env, &price_oracle, &caller, Side::AssetToShadow, &key1, amount)?;

        ShadowPool::deposit_for(env, &transport, &caller, &caller, &key2, amount, is_conly)?;
        Position::deposit(env, &caller, Side::ShadowToAsset, &key2, amount, is_conly)
    }

    pub fn protect_coin(env: &Env, caller: Address, side: Side, key: CoinKey) -> Result<(), Error> {
        caller.require_auth();
        Position::protect_coin(env, &caller, side, &key)
    }

    pub fn unprotect_coin(env: &Env, caller: Address, side: Side, key: CoinKey) -> Result<(), Error> {
        caller.require_auth();
        Position::unprotect_coin(env, &caller, side, &key)
    }

    pub fn harvest_protocol_fees(env: &Env, key: CoinKey) -> Result<(u128, u128), Error> {
        let config = Storage::get(env);
        let transport = token_transport(&config);
        let treasury_facade = treasury(env, &config);

        let asset_take = AssetPool::harvest_protocol_fees(env, &transport, &treasury_facade, &key)?;
        let shadow_take = ShadowPool::harvest_protocol_fees(env, &treasury_facade, &key)?;
        Ok((asset_take, shadow_take))
    }

    // ==================== Views ====================

    pub fn deposited(env: &Env, owner: Address, side: Side, key: CoinKey) -> u64 {
        Position::deposited(env, &owner, side, &key)
    }

    pub fn conly_deposited(env: &Env, owner: Address, side: Side, key: CoinKey) -> u64 {
        Position::conly_deposited(env, &owner, side, &key)
    }

    pub fn borrowed(env: &Env, owner: Address, side: Side, key: CoinKey) -> u64 {
        Position::borrowed(env, &owner, side, &key)
    }

    pub fn is_safe(env: &Env, owner: Address, side: Side, key: CoinKey) -> Result<bool, Error> {
        let config = Storage::get(env);
        let price_oracle = oracle(env, &config);
        Position::is_safe(env, &price_oracle, &owner, side, &key)
    }

    pub fn asset_pool_state(env: &Env, key: CoinKey) -> AssetStorage {
        Storage::get_asset_pool(env, &key)
    }

    pub fn shadow_pool_state(env: &Env, key: CoinKey) -> AssetStorage {
        Storage::get_shadow_pool(env, &key)
    }
}

#[cfg(test)]
mod test;
