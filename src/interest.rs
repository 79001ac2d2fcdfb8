//! Utilization-driven interest-rate model: piecewise-linear rate, compound
//! factor, and accrual against one pool's [`AssetStorage`].

use soroban_sdk::Env;

use crate::common::error::Error;
use crate::common::storage::Storage;
use crate::common::types::{AssetStorage, CoinKey, RateConfig, PRECISION, SECONDS_PER_YEAR};

pub struct Interest;

impl Interest {
    /// Utilization = borrowed / deposited, in PRECISION units. Zero if
    /// nothing has been deposited.
    pub fn utilization(deposited: u128, borrowed: u128) -> Result<u128, Error> {
        if deposited == 0 {
            return Ok(0);
        }
        let u = borrowed
            .checked_mul(PRECISION)
            .ok_or(Error::ArithmeticError)?
            .checked_div(deposited)
            .ok_or(Error::ArithmeticError)?;
        Ok(u.min(PRECISION))
    }

    /// Piecewise-linear annual rate, in PRECISION units.
    fn rate(u: u128, cfg: &RateConfig) -> Result<u128, Error> {
        let uopt = cfg.uopt as u128;
        let ucrit = cfg.ucrit as u128;
        let rb = cfg.rb as u128;
        let rslope1 = cfg.rslope1 as u128;
        let rslope2 = cfg.rslope2 as u128;

        if u <= uopt {
            // rb + u * rslope1 / uopt
            let slope = u
                .checked_mul(rslope1)
                .ok_or(Error::ArithmeticError)?
                .checked_div(uopt)
                .ok_or(Error::ArithmeticError)?;
            rb.checked_add(slope).ok_or(Error::ArithmeticError)
        } else {
            // (rb + rslope1) + rslope2 * (u - uopt) / ucrit
            let over = u.checked_sub(uopt).ok_or(Error::ArithmeticError)?;
            let slope = over
                .checked_mul(rslope2)
                .ok_or(Error::ArithmeticError)?
                .checked_div(ucrit)
                .ok_or(Error::ArithmeticError)?;
            rb.checked_add(rslope1)
                .ok_or(Error::ArithmeticError)?
                .checked_add(slope)
                .ok_or(Error::ArithmeticError)
        }
    }

    /// Compound factor over `t` seconds at annual rate `r`, both in
    /// PRECISION units. Taylor expansion to the cubic term, matching the
    /// accrual precision a per-block compounding scheme would reach over
    /// short intervals.
    fn compound_factor(r: u128, t: u128) -> Result<u128, Error> {
        if t == 0 {
            return Ok(PRECISION);
        }
        let rate_per_sec = r.checked_div(SECONDS_PER_YEAR as u128).ok_or(Error::ArithmeticError)?;

        let term1 = rate_per_sec.checked_mul(t).ok_or(Error::ArithmeticError)?;

        let t_minus_1 = t.checked_sub(1).unwrap_or(0);
        let term2 = if t_minus_1 == 0 {
            0
        } else {
            rate_per_sec
                .checked_mul(rate_per_sec)
                .and_then(|r2| r2.checked_mul(t))
                .and_then(|v| v.checked_mul(t_minus_1))
                .ok_or(Error::ArithmeticError)?
                .checked_div(2)
                .ok_or(Error::ArithmeticError)?
                .checked_div(PRECISION)
                .ok_or(Error::ArithmeticError)?
        };

        let t_minus_2 = t.checked_sub(2).unwrap_or(0);
        let term3 = if t_minus_1 == 0 || t_minus_2 == 0 {
            0
        } else {
            rate_per_sec
                .checked_mul(rate_per_sec)
                .and_then(|r2| r2.checked_mul(rate_per_sec))
                .and_then(|r3| r3.checked_mul(t))
                .and_then(|v| v.checked_mul(t_minus_1))
                .and_then(|v| v.checked_mul(t_minus_2))
                .ok_or(Error::ArithmeticError)?
                .checked_div(6)
                .ok_or(Error::ArithmeticError)?
                .checked_div(PRECISION)
                .ok_or(Error::ArithmeticError)?
                .checked_div(PRECISION)
                .ok_or(Error::ArithmeticError)?
        };

        PRECISION
            .checked_add(term1)
            .ok_or(Error::InterestOverflow)?
            .checked_add(term2)
            .ok_or(Error::InterestOverflow)?
            .checked_add(term3)
            .ok_or(Error::InterestOverflow)
    }

    /// Accrue interest on a pool bucket up to `now`. Idempotent within the
    /// same timestamp; a no-op if nothing is deposited or borrowed.
    pub fn accrue(storage: &mut AssetStorage, cfg: &RateConfig, share_fee: u128, now: u64) -> Result<(), Error> {
        if storage.last_updated == 0 {
            storage.last_updated = now;
            return Ok(());
        }
        if now <= storage.last_updated {
            return Ok(());
        }
        if storage.total_normal_deposited_amount == 0 {
            storage.last_updated = now;
            return Ok(());
        }

        let total_deposited = storage
            .total_normal_deposited_amount
            .checked_add(storage.total_conly_deposited_amount)
            .ok_or(Error::ArithmeticError)?;
        let u = Self::utilization(total_deposited, storage.total_borrowed_amount)?;
        if u == 0 {
            storage.last_updated = now;
            return Ok(());
        }

        let r = Self::rate(u, cfg)?;
        let t = (now - storage.last_updated) as u128;
        let rcomp = Self::compound_factor(r, t)?;

        let accrued = storage
            .total_borrowed_amount
            .checked_mul(rcomp.checked_sub(PRECISION).ok_or(Error::ArithmeticError)?)
            .ok_or(Error::InterestOverflow)?
            .checked_div(PRECISION)
            .ok_or(Error::ArithmeticError)?;

        let protocol_share = accrued
            .checked_mul(share_fee)
            .ok_or(Error::ArithmeticError)?
            .checked_div(PRECISION)
            .ok_or(Error::ArithmeticError)?;
        let depositors_share = accrued.checked_sub(protocol_share).ok_or(Error::ArithmeticError)?;

        storage.total_borrowed_amount = storage
            .total_borrowed_amount
            .checked_add(accrued)
            .ok_or(Error::InterestOverflow)?;
        storage.total_normal_deposited_amount = storage
            .total_normal_deposited_amount
            .checked_add(depositors_share)
            .ok_or(Error::InterestOverflow)?;
        storage.protocol_fees = storage
            .protocol_fees
            .checked_add(protocol_share)
            .ok_or(Error::InterestOverflow)?;
        storage.rcomp = rcomp;
        storage.last_updated = now;

        Ok(())
    }
}

/// Accrue interest on the named asset-pool coin and persist the result.
pub fn accrue_asset_pool(env: &Env, key: &CoinKey) -> Result<AssetStorage, Error> {
    let mut pool = Storage::get_asset_pool(env, key);
    let cfg = Storage::get_rate_config(env, key);
    let risk = Storage::get_risk_factors(env, key);
    Interest::accrue(&mut pool, &cfg, risk.share_fee as u128, env.ledger().timestamp())?;
    Storage::set_asset_pool(env, key, &pool);
    Ok(pool)
}

/// Accrue interest on the named shadow-pool coin and persist the result.
pub fn accrue_shadow_pool(env: &Env, key: &CoinKey) -> Result<AssetStorage, Error> {
    let mut pool = Storage::get_shadow_pool(env, key);
    let cfg = Storage::get_rate_config(env, key);
    let risk = Storage::get_risk_factors(env, key);
    Interest::accrue(&mut pool, &cfg, risk.share_fee as u128, env.ledger().timestamp())?;
    Storage::set_shadow_pool(env, key, &pool);
    Ok(pool)
}

#[cfg(test)]
mod test {
    use super::*;

    fn cfg() -> RateConfig {
        RateConfig::default_for_asset()
    }

    #[test]
    fn utilization_zero_when_no_deposits() {
        assert_eq!(Interest::utilization(0, 0).unwrap(), 0);
    }

    #[test]
    fn utilization_is_borrowed_over_deposited() {
        let u = Interest::utilization(1_000_000, 500_000).unwrap();
        assert_eq!(u, PRECISION / 2);
    }

    #[test]
    fn accrue_is_idempotent_within_same_timestamp() {
        let mut storage = AssetStorage::new(100);
        storage.total_normal_deposited_amount = 1_000_000;
        storage.total_normal_deposited_share = 1_000_000;
        storage.total_borrowed_amount = 800_000;
        storage.total_borrowed_share = 800_000;

        let cfg = cfg();
        Interest::accrue(&mut storage, &cfg, 100_000_000, 200).unwrap();
        let after_first = storage.total_borrowed_amount;
        Interest::accrue(&mut storage, &cfg, 100_000_000, 200).unwrap();
        assert_eq!(storage.total_borrowed_amount, after_first);
    }

    #[test]
    fn accrue_noop_when_fully_unutilized() {
        let mut storage = AssetStorage::new(100);
        storage.total_normal_deposited_amount = 1_000_000;
        storage.total_normal_deposited_share = 1_000_000;

        Interest::accrue(&mut storage, &cfg(), 100_000_000, 1_000_000).unwrap();
        assert_eq!(storage.total_borrowed_amount, 0);
        assert_eq!(storage.total_normal_deposited_amount, 1_000_000);
    }

    #[test]
    fn accrue_grows_borrowed_and_splits_fee() {
        let mut storage = AssetStorage::new(0);
        storage.total_normal_deposited_amount = 3_000_000;
        storage.total_normal_deposited_share = 3_000_000;
        storage.total_borrowed_amount = 1_000_000;
        storage.total_borrowed_share = 1_000_000;
        storage.last_updated = 1_000;

        Interest::accrue(&mut storage, &cfg(), 200_000_000, 1_000 + 604_800).unwrap();

        assert!(storage.total_borrowed_amount > 1_000_000);
        assert!(storage.protocol_fees > 0);
        assert!(storage.total_normal_deposited_amount > 3_000_000);
    }
}
