//! Per-coin accounting for a real asset: normal deposits, collateral-only
//! deposits, and borrows, all accruing interest and moving real tokens
//! through the [`CoinTransport`] collaborator.

use soroban_sdk::{Address, Env};

use crate::collaborators::{CoinTransport, Treasury};
use crate::common::error::Error;
use crate::common::events::Events;
use crate::common::storage::Storage;
use crate::common::types::CoinKey;
use crate::interest::accrue_asset_pool;
use crate::pool_status::{require_asset_available, Op};
use crate::share_math::{to_amount, to_share, to_share_roundup};

pub struct AssetPool;

impl AssetPool {
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
        require_asset_available(env, key, Op::Deposit)?;

        let mut pool = accrue_asset_pool(env, key)?;

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

        transport.withdraw_from(env, key, caller, amount)?;

        let amount = amount as u128;
        let share = if is_collateral_only {
            let share = to_share(
                amount,
                pool.total_conly_deposited_amount,
                pool.total_conly_deposited_share,
            )?;
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
            let share = to_share(
                amount,
                pool.total_normal_deposited_amount,
                pool.total_normal_deposited_share,
            )?;
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

        Storage::set_asset_pool(env, key, &pool);
        Events::deposit(env, caller, beneficiary, key, false, amount, share);
        Ok((amount, share))
    }

    /// `liquidity = pool balance not pledged as collateral-only`.
    pub fn liquidity(env: &Env, transport: &dyn CoinTransport, key: &CoinKey) -> Result<u128, Error> {
        let pool = Storage::get_asset_pool(env, key);
        let balance = transport.balance_of(env, key, &env.current_contract_address())? as u128;
        balance
            .checked_sub(pool.total_conly_deposited_amount)
            .ok_or(Error::ArithmeticError)
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
        require_asset_available(env, key, Op::Withdraw)?;
        let mut pool = accrue_asset_pool(env, key)?;

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
        Storage::set_asset_pool(env, key, &pool);

        if amount_to_transfer > 0 {
            transport.deposit_to(env, key, receiver, amount_to_transfer as u64)?;
        }

        Events::withdraw(env, caller, receiver, key, false, amount, share);
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
        require_asset_available(env, key, Op::Borrow)?;

        let mut pool = accrue_asset_pool(env, key)?;
        let risk = Storage::get_risk_factors(env, key);
        let amount = amount as u128;
        let fee = risk.calculate_entry_fee(amount)?;
        let amount_with_fee = amount.checked_add(fee).ok_or(Error::ArithmeticError)?;

        let liquidity = Self::liquidity(env, transport, key)?;
        if amount_with_fee > liquidity {
            return Err(Error::InsufficientLiquidity);
        }

        let share = to_share(
            amount_with_fee,
            pool.total_borrowed_amount,
            pool.total_borrowed_share,
        )?;
        pool.total_borrowed_amount = pool
            .total_borrowed_amount
            .checked_add(amount_with_fee)
            .ok_or(Error::OverBorrowedAmount)?;
        pool.total_borrowed_share = pool
            .total_borrowed_share
            .checked_add(share)
            .ok_or(Error::ArithmeticError)?;

        Storage::set_asset_pool(env, key, &pool);

        if fee > 0 {
            treasury.collect_fee(env, key, fee)?;
        }
        transport.deposit_to(env, key, receiver, amount as u64)?;

        Events::borrow(env, borrower, receiver, key, false, amount, fee, share);
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
        require_asset_available(env, key, Op::Repay)?;
        let mut pool = accrue_asset_pool(env, key)?;

        let (amount, share) = if by_share {
            let share = value;
            let amount = to_amount(share, pool.total_borrowed_amount, pool.total_borrowed_share)?;
            (amount, share)
        } else {
            let amount = value;
            let share = to_share_roundup(amount, pool.total_borrowed_amount, pool.total_borrowed_share)?;
            (amount, share)
        };

        transport.withdraw_from(env, key, account, amount as u64)?;

        pool.total_borrowed_amount = pool.total_borrowed_amount.saturating_sub(amount);
        pool.total_borrowed_share = pool.total_borrowed_share.saturating_sub(share);
        Storage::set_asset_pool(env, key, &pool);

        Events::repay(env, account, key, false, amount, share);
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
        Events::liquidate(env, liquidator, target, key, false, amount);
        Ok(amount)
    }

    /// Move `share` between the normal and collateral-only buckets without
    /// moving any tokens.
    pub fn switch_collateral(
        env: &Env,
        caller: &Address,
        key: &CoinKey,
        share: u128,
        to_collateral_only: bool,
    ) -> Result<(u128, u128, u128), Error> {
        require_asset_available(env, key, Op::SwitchCollateral)?;
        let mut pool = accrue_asset_pool(env, key)?;

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

        Storage::set_asset_pool(env, key, &pool);
        Events::switch_collateral(env, caller, key, false, amount, to_collateral_only);
        Ok((amount, share, to_share_amount))
    }

    pub fn harvest_protocol_fees(
        env: &Env,
        transport: &dyn CoinTransport,
        treasury: &dyn Treasury,
        key: &CoinKey,
    ) -> Result<u128, Error> {
        let mut pool = accrue_asset_pool(env, key)?;
        let unharvested = pool
            .protocol_fees
            .checked_sub(pool.harvested_protocol_fees)
            .ok_or(Error::ArithmeticError)?;
        let liquidity = Self::liquidity(env, transport, key)?;
        let take = unharvested.min(liquidity);
        if take == 0 {
            return Ok(0);
        }
        pool.harvested_protocol_fees = pool
            .harvested_protocol_fees
            .checked_add(take)
            .ok_or(Error::ArithmeticError)?;
        Storage::set_asset_pool(env, key, &pool);
        treasury.collect_fee(env, key, take)?;
        Ok(take)
    }
}
