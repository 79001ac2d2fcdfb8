//! Per-(paired-asset) accounting for the synthetic shadow coin. Same
//! bucket shape as [`crate::asset_pool::AssetPool`], but storage is keyed
//! by the *asset* the shadow is paired with, and rebalancing between two
//! keys is a pure bookkeeping move with no token transfer.

use soroban_sdk::{symbol_short, Address, Env};

use crate::collaborators::{CoinTransport, Treasury};
use crate::common::error::Error;
use crate::common::events::Events;
use crate::common::storage::Storage;
use crate::common::types::CoinKey;
use crate::interest::accrue_shadow_pool;
use crate::pool_status::{require_shadow_available, Op};
use crate::share_math::{to_amount, to_share, to_share_roundup};

/// The shadow coin is a single synthetic asset; all per-key pools draw
/// from and settle to the same underlying token at the transport layer.
pub fn shadow_transport_key() -> CoinKey {
    symbol_short!("SHADOW")
}

pub struct ShadowPool;

impl ShadowPool {
    /// `liquidity = pool balance not pledged as collateral-only`, mirroring
    /// [`crate::asset_pool::AssetPool::liquidity`].
    pub fn liquidity(env: &Env, transport: &dyn CoinTransport, key: &CoinKey) -> Result<u128, Error> {
        let pool = Storage::get_shadow_pool(env, key);
        let balance = transport.balance_of(env, &shadow_transport_key(), &env.current_contract_address())? as u128;
        balance
            .checked_sub(pool.total_conly_deposited_amount)
            .ok_or(Error::ArithmeticError)
    }

    pub fn deposit_for(
        env: &Env,
        transport: &dyn CoinTransport,
        caller: &Address,
        beneficiary: &Address,
        key: &CoinKey,
        amount: u64,
        is_collateral_only: bool,
    ) -> Result<(u128, u128), Error> {
        if amount == 0 {
            return Err(Error::AmountIsZero);
        }
        require_shadow_available(env, key, Op::Deposit)?;

        let mut pool = accrue_shadow_pool(env, key)?;

        let total_deposited = pool
            .total_normal_deposited_amount
            .checked_add(pool.total_conly_deposited_amount)
            .ok_or(Error::ArithmeticError)?;
        if total_deposited
            .checked_add(amount as u128)
            .ok_or(Error::ArithmeticError)?
            > u64::MAX as u128
        {
            return Err(Error::ExceedCoinInPool);
        }

        transport.withdraw_from(env, &shadow_transport_key(), caller, amount)?;

        let amount = amount as u128;
        let share = if is_collateral_only {
            let share = to_share(amount, pool.total_conly_deposited_amount, pool.total_conly_deposited_share)?;
            pool.total_conly_deposited_amount = pool
                .total_conly_deposited_amount
                .checked_add(amount)
                .ok_or(Error::ArithmeticError)?;
            pool.total_conly_deposited_share = pool
                .total_conly_deposited_share
                .checked_add(share)
                .ok_or(Error::ArithmeticError)?;
            share
        } else {
            let share = to_share(amount, pool.total_normal_deposited_amount, pool.total_normal_deposited_share)?;
            pool.total_normal_deposited_amount = pool
                .total_normal_deposited_amount
                .checked_add(amount)
                .ok_or(Error::ArithmeticError)?;
            pool.total_normal_deposited_share = pool
                .total_normal_deposited_share
                .checked_add(share)
                .ok_or(Error::ArithmeticError)?;
            share
        };

        Storage::set_shadow_pool(env, key, &pool);
        Events::deposit(env, caller, beneficiary, key, true, amount, share);
        Ok((amount, share))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn withdraw_for(
        env: &Env,
        transport: &dyn CoinTransport,
        caller: &Address,
        receiver: &Address,
        key: &CoinKey,
        value: u128,
        is_collateral_only: bool,
        by_share: bool,
        liquidation_fee: u128,
    ) -> Result<(u128, u128), Error> {
        require_shadow_available(env, key, Op::Withdraw)?;
        let mut pool = accrue_shadow_pool(env, key)?;

        let (total_amount, total_share) = if is_collateral_only {
            (pool.total_conly_deposited_amount, pool.total_conly_deposited_share)
        } else {
            (pool.total_normal_deposited_amount, pool.total_normal_deposited_share)
        };

        let (amount, share) = if by_share {
            let share = value;
            let amount = to_amount(share, total_amount, total_share)?;
            (amount, share)
        } else {
            let amount = value;
            let share = to_share_roundup(amount, total_amount, total_share)?;
            (amount, share)
        };

        if is_collateral_only {
            pool.total_conly_deposited_amount = pool
                .total_conly_deposited_amount
                .checked_sub(amount)
                .ok_or(Error::InsufficientConlyDeposited)?;
            pool.total_conly_deposited_share = pool.total_conly_deposited_share.saturating_sub(share);
        } else {
            pool.total_normal_deposited_amount = pool
                .total_normal_deposited_amount
                .checked_sub(amount)
                .ok_or(Error::InsufficientLiquidity)?;
            pool.total_normal_deposited_share = pool.total_normal_deposited_share.saturating_sub(share);
        }

        if !is_collateral_only {
            let liquidity = Self::liquidity(env, transport, key)?;
            if amount > liquidity {
                return Err(Error::InsufficientLiquidity);
            }
        }

        let amount_to_transfer = amount.checked_sub(liquidation_fee).ok_or(Error::ArithmeticError)?;
        Storage::set_shadow_pool(env, key, &pool);

        if amount_to_transfer > 0 {
            transport.deposit_to(env, &shadow_transport_key(), receiver, amount_to_transfer as u64)?;
        }

        Events::withdraw(env, caller, receiver, key, true, amount, share);
        Ok((amount, share))
    }

    pub fn borrow_for(
        env: &Env,
        transport: &dyn CoinTransport,
        treasury: &dyn Treasury,
        borrower: &Address,
        receiver: &Address,
        key: &CoinKey,
        amount: u64,
    ) -> Result<(u128, u128, u128), Error> {
        if amount == 0 {
            return Err(Error::AmountIsZero);
        }
        require_shadow_available(env, key, Op::Borrow)?;

        let mut pool = accrue_shadow_pool(env, key)?;
        let risk = Storage::get_risk_factors(env, key);
        let amount = amount as u128;
        let fee = risk.calculate_entry_fee(amount)?;
        let amount_with_fee = amount.checked_add(fee).ok_or(Error::ArithmeticError)?;

        let liquidity = Self::liquidity(env, transport, key)?;
        if amount_with_fee > liquidity {
            return Err(Error::InsufficientLiquidity);
        }

        let share = to_share(amount_with_fee, pool.total_borrowed_amount, pool.total_borrowed_share)?;
        pool.total_borrowed_amount = pool
            .total_borrowed_amount
            .checked_add(amount_with_fee)
            .ok_or(Error::OverBorrowedAmount)?;
        pool.total_borrowed_share = pool
            .total_borrowed_share
            .checked_add(share)
            .ok_or(Error::ArithmeticError)?;

        Storage::set_shadow_pool(env, key, &pool);

        if fee > 0 {
            treasury.collect_fee(env, &shadow_transport_key(), fee)?;
        }
        transport.deposit_to(env, &shadow_transport_key(), receiver, amount as u64)?;

        Events::borrow(env, borrower, receiver, key, true, amount, fee, share);
        Ok((amount, fee, share))
    }

    pub fn repay(
        env: &Env,
        transport: &dyn CoinTransport,
        account: &Address,
        key: &CoinKey,
        value: u128,
        by_share: bool,
    ) -> Result<(u128, u128), Error> {
        require_shadow_available(env, key, Op::Repay)?;
        let mut pool = accrue_shadow_pool(env, key)?;

        let (amount, share) = if by_share {
            let share = value;
            let amount = to_amount(share, pool.total_borrowed_amount, pool.total_borrowed_share)?;
            (amount, share)
        } else {
            let amount = value;
            let share = to_share_roundup(amount, pool.total_borrowed_amount, pool.total_borrowed_share)?;
            (amount, share)
        };

        transport.withdraw_from(env, &shadow_transport_key(), account, amount as u64)?;

        pool.total_borrowed_amount = pool.total_borrowed_amount.saturating_sub(amount);
        pool.total_borrowed_share = pool.total_borrowed_share.saturating_sub(share);
        Storage::set_shadow_pool(env, key, &pool);

        Events::repay(env, account, key, true, amount, share);
        Ok((amount, share))
    }

    pub fn withdraw_for_liquidation(
        env: &Env,
        transport: &dyn CoinTransport,
        liquidator: &Address,
        target: &Address,
        key: &CoinKey,
        withdrawing: u128,
        is_collateral_only: bool,
    ) -> Result<u128, Error> {
        let risk = Storage::get_risk_factors(env, key);
        let fee = risk.calculate_liquidation_fee(withdrawing)?;
        let (amount, _share) = Self::withdraw_for(
            env,
            transport,
            target,
            liquidator,
            key,
            withdrawing,
            is_collateral_only,
            false,
            fee,
        )?;
        Events::liquidate(env, liquidator, target, key, true, amount);
        Ok(amount)
    }

    pub fn switch_collateral(
        env: &Env,
        caller: &Address,
        key: &CoinKey,
        share: u128,
        to_collateral_only: bool,
    ) -> Result<(u128, u128, u128), Error> {
        require_shadow_available(env, key, Op::SwitchCollateral)?;
        let mut pool = accrue_shadow_pool(env, key)?;

        let (from_total_amount, from_total_share) = if to_collateral_only {
            (pool.total_normal_deposited_amount, pool.total_normal_deposited_share)
        } else {
            (pool.total_conly_deposited_amount, pool.total_conly_deposited_share)
        };

        if share > from_total_share {
            return Err(if to_collateral_only {
                Error::InsufficientLiquidity
            } else {
                Error::InsufficientConlyDeposited
            });
        }

        let amount = to_amount(share, from_total_amount, from_total_share)?;

        let (to_total_amount, to_total_share) = if to_collateral_only {
            (pool.total_conly_deposited_amount, pool.total_conly_deposited_share)
        } else {
            (pool.total_normal_deposited_amount, pool.total_normal_deposited_share)
        };
        let to_share_amount = to_share(amount, to_total_amount, to_total_share)?;

        if to_collateral_only {
            pool.total_normal_deposited_amount = pool.total_normal_deposited_amount.saturating_sub(amount);
            pool.total_normal_deposited_share = pool.total_normal_deposited_share.saturating_sub(share);
            pool.total_conly_deposited_amount = pool
                .total_conly_deposited_amount
                .checked_add(amount)
                .ok_or(Error::ArithmeticError)?;
            pool.total_conly_deposited_share = pool
                .total_conly_deposited_share
                .checked_add(to_share_amount)
                .ok_or(Error::ArithmeticError)?;
        } else {
            pool.total_conly_deposited_amount = pool.total_conly_deposited_amount.saturating_sub(amount);
            pool.total_conly_deposited_share = pool.total_conly_deposited_share.saturating_sub(share);
            pool.total_normal_deposited_amount = pool
                .total_normal_deposited_amount
                .checked_add(amount)
                .ok_or(Error::ArithmeticError)?;
            pool.total_normal_deposited_share = pool
                .total_normal_deposited_share
                .checked_add(to_share_amount)
                .ok_or(Error::ArithmeticError)?;
        }

        Storage::set_shadow_pool(env, key, &pool);
        Events::switch_collateral(env, caller, key, true, amount, to_collateral_only);
        Ok((amount, share, to_share_amount))
    }

    /// Pure bookkeeping move of deposited shadow collateral from one
    /// paired-asset key to another. No tokens move; value is neither
    /// created nor destroyed beyond the usual rounding of one unit per
    /// side.
    pub fn rebalance_shadow(
        env: &Env,
        key_from: &CoinKey,
        key_to: &CoinKey,
        amount: u128,
        from_is_conly: bool,
        to_is_conly: bool,
    ) -> Result<(), Error> {
        require_shadow_available(env, key_from, Op::SwitchCollateral)?;
        require_shadow_available(env, key_to, Op::SwitchCollateral)?;

        let mut from_pool = accrue_shadow_pool(env, key_from)?;
        let (from_total_amount, from_total_share) = if from_is_conly {
            (from_pool.total_conly_deposited_amount, from_pool.total_conly_deposited_share)
        } else {
            (from_pool.total_normal_deposited_amount, from_pool.total_normal_deposited_share)
        };
        let from_share = to_share_roundup(amount, from_total_amount, from_total_share)?;

        if from_is_conly {
            from_pool.total_conly_deposited_amount = from_pool
                .total_conly_deposited_amount
                .checked_sub(amount)
                .ok_or(Error::InsufficientConlyDeposited)?;
            from_pool.total_conly_deposited_share = from_pool.total_conly_deposited_share.saturating_sub(from_share);
        } else {
            from_pool.total_normal_deposited_amount = from_pool
                .total_normal_deposited_amount
                .checked_sub(amount)
                .ok_or(Error::InsufficientLiquidity)?;
            from_pool.total_normal_deposited_share =
                from_pool.total_normal_deposited_share.saturating_sub(from_share);
        }
        Storage::set_shadow_pool(env, key_from, &from_pool);

        let mut to_pool = accrue_shadow_pool(env, key_to)?;
        let (to_total_amount, to_total_share) = if to_is_conly {
            (to_pool.total_conly_deposited_amount, to_pool.total_conly_deposited_share)
        } else {
            (to_pool.total_normal_deposited_amount, to_pool.total_normal_deposited_share)
        };
        let to_share = to_share(amount, to_total_amount, to_total_share)?;

        if to_is_conly {
            to_pool.total_conly_deposited_amount = to_pool
                .total_conly_deposited_amount
                .checked_add(amount)
                .ok_or(Error::ArithmeticError)?;
            to_pool.total_conly_deposited_share = to_pool
                .total_conly_deposited_share
                .checked_add(to_share)
                .ok_or(Error::ArithmeticError)?;
        } else {
            to_pool.total_normal_deposited_amount = to_pool
                .total_normal_deposited_amount
                .checked_add(amount)
                .ok_or(Error::ArithmeticError)?;
            to_pool.total_normal_deposited_share = to_pool
                .total_normal_deposited_share
                .checked_add(to_share)
                .ok_or(Error::ArithmeticError)?;
        }
        Storage::set_shadow_pool(env, key_to, &to_pool);

        Ok(())
    }

    pub fn harvest_protocol_fees(
        env: &Env,
        treasury: &dyn Treasury,
        key: &CoinKey,
    ) -> Result<u128, Error> {
        let mut pool = accrue_shadow_pool(env, key)?;
        let unharvested = pool
            .protocol_fees
            .checked_sub(pool.harvested_protocol_fees)
            .ok_or(Error::ArithmeticError)?;
        if unharvested == 0 {
            return Ok(0);
        }
        pool.harvested_protocol_fees = pool
            .harvested_protocol_fees
            .checked_add(unharvested)
            .ok_or(Error::ArithmeticError)?;
        Storage::set_shadow_pool(env, key, &pool);
        treasury.collect_fee(env, &shadow_transport_key(), unharvested)?;
        Ok(unharvested)
    }
}
