//! Per-user, per-side position bookkeeping: which coins are touched, the
//! deposit/borrow balances for each, and the safety checks that gate
//! every mutation.
//!
//! A coin key `C` has two correlated balance entries, one per [`Side`]:
//! `Position<P>.balance[C].deposited` is the collateral posted under `P`,
//! while the debt drawn against that collateral lives in
//! `Position<opposite(P)>.balance[C].borrowed` — `borrow<C, P>` writes
//! there, and `is_safe<C, P>` reads deposited from `P` and borrowed from
//! `opposite(P)` for the same key.

use soroban_sdk::{Address, Env};

use crate::collaborators::PriceOracle;
use crate::common::error::Error;
use crate::common::events::Events;
use crate::common::storage::Storage;
use crate::common::types::{CoinKey, PositionData, Side, PRECISION};

pub struct Position;

impl Position {
    pub fn deposited(env: &Env, owner: &Address, side: Side, key: &CoinKey) -> u64 {
        Storage::get_position(env, owner, side)
            .balance
            .get(key.clone())
            .unwrap_or_default()
            .deposited
    }

    pub fn conly_deposited(env: &Env, owner: &Address, side: Side, key: &CoinKey) -> u64 {
        Storage::get_position(env, owner, side)
            .balance
            .get(key.clone())
            .unwrap_or_default()
            .conly_deposited
    }

    /// The debt drawn against `side`'s collateral at `key`, which per the
    /// bookkeeping rule above lives in `opposite(side)`'s balance entry.
    pub fn borrowed(env: &Env, owner: &Address, side: Side, key: &CoinKey) -> u64 {
        Storage::get_position(env, owner, side.opposite())
            .balance
            .get(key.clone())
            .unwrap_or_default()
            .borrowed
    }

    fn threshold(env: &Env, side: Side, key: &CoinKey) -> u64 {
        match side {
            Side::AssetToShadow => Storage::get_risk_factors(env, key).lt,
            Side::ShadowToAsset => Storage::get_shadow_lt(env),
        }
    }

    /// `utilization_of = volume(borrowed) * PRECISION / volume(deposited)`,
    /// zero if nothing is deposited.
    fn utilization(
        env: &Env,
        oracle: &dyn PriceOracle,
        key: &CoinKey,
        deposited: u64,
        borrowed: u64,
    ) -> Result<u128, Error> {
        if deposited == 0 {
            return Ok(0);
        }
        let deposited_volume = oracle.volume(env, key, deposited) as u128;
        if deposited_volume == 0 {
            return Ok(0);
        }
        let borrowed_volume = oracle.volume(env, key, borrowed) as u128;
        borrowed_volume
            .checked_mul(PRECISION)
            .ok_or(Error::ArithmeticError)?
            .checked_div(deposited_volume)
            .ok_or(Error::ArithmeticError)
    }

    fn is_safe_with(
        env: &Env,
        oracle: &dyn PriceOracle,
        key: &CoinKey,
        side: Side,
        deposited: u64,
        borrowed: u64,
    ) -> Result<bool, Error> {
        let utilization = Self::utilization(env, oracle, key, deposited, borrowed)?;
        Ok(utilization < Self::threshold(env, side, key) as u128)
    }

    pub fn is_safe(
        env: &Env,
        oracle: &dyn PriceOracle,
        owner: &Address,
        side: Side,
        key: &CoinKey,
    ) -> Result<bool, Error> {
        let deposited = Self::deposited(env, owner, side, key);
        let borrowed = Self::borrowed(env, owner, side, key);
        Self::is_safe_with(env, oracle, key, side, deposited, borrowed)
    }

    fn upsert_key(position: &mut PositionData, key: &CoinKey) {
        if !position.coins.iter().any(|k| k == *key) {
            position.coins.push_back(key.clone());
        }
    }

    fn remove_key_if_empty(position: &mut PositionData, key: &CoinKey) {
        let still_used = position
            .balance
            .get(key.clone())
            .map(|b| !b.is_empty())
            .unwrap_or(false);
        if !still_used {
            position.balance.remove(key.clone());
            if let Some(idx) = position.coins.iter().position(|k| k == *key) {
                position.coins.remove(idx as u32);
            }
        }
    }

    pub fn deposit(
        env: &Env,
        owner: &Address,
        side: Side,
        key: &CoinKey,
        amount: u64,
        is_conly: bool,
    ) -> Result<(), Error> {
        let mut position = Storage::get_position(env, owner, side);
        let mut balance = position.balance.get(key.clone()).unwrap_or_default();

        if is_conly && balance.deposited > balance.conly_deposited {
            return Err(Error::AlreadyDepositedAsNormal);
        }
        if !is_conly && balance.conly_deposited > 0 {
            return Err(Error::AlreadyDepositedAsCollateralOnly);
        }

        balance.deposited = balance.deposited.checked_add(amount).ok_or(Error::OverDepositedAmount)?;
        if is_conly {
            balance.conly_deposited = balance
                .conly_deposited
                .checked_add(amount)
                .ok_or(Error::OverDepositedAmount)?;
        }

        Self::upsert_key(&mut position, key);
        position.balance.set(key.clone(), balance);
        Storage::set_position(env, owner, side, &position);

        Events::update_position(env, owner, side, key, balance.deposited, balance.conly_deposited, balance.borrowed);
        Ok(())
    }

    pub fn withdraw(
        env: &Env,
        oracle: &dyn PriceOracle,
        owner: &Address,
        side: Side,
        key: &CoinKey,
        amount: u64,
        is_conly: bool,
    ) -> Result<(), Error> {
        let mut position = Storage::get_position(env, owner, side);
        let mut balance = position.balance.get(key.clone()).unwrap_or_default();

        balance.deposited = balance
            .deposited
            .checked_sub(amount)
            .ok_or(Error::OverDepositedAmount)?;
        if is_conly {
            balance.conly_deposited = balance
                .conly_deposited
                .checked_sub(amount)
                .ok_or(Error::InsufficientConlyDeposited)?;
        }

        let borrowed = Self::borrowed(env, owner, side, key);
        if !Self::is_safe_with(env, oracle, key, side, balance.deposited, borrowed)? {
            return Err(Error::NoSafePosition);
        }

        position.balance.set(key.clone(), balance);
        Self::remove_key_if_empty(&mut position, key);
        Storage::set_position(env, owner, side, &position);

        Events::update_position(env, owner, side, key, balance.deposited, balance.conly_deposited, balance.borrowed);
        Ok(())
    }

    /// `borrow<C, P>`: the debt is recorded against `opposite(side)`'s
    /// balance entry, then safety is checked on `side` itself (its
    /// deposited collateral against the debt that now lives opposite).
    pub fn borrow(
        env: &Env,
        oracle: &dyn PriceOracle,
        owner: &Address,
        side: Side,
        key: &CoinKey,
        amount: u64,
    ) -> Result<(), Error> {
        let opposite = side.opposite();
        let mut opp_position = Storage::get_position(env, owner, opposite);
        let mut opp_balance = opp_position.balance.get(key.clone()).unwrap_or_default();

        opp_balance.borrowed = opp_balance.borrowed.checked_add(amount).ok_or(Error::OverBorrowedAmount)?;

        let deposited = Self::deposited(env, owner, side, key);
        if !Self::is_safe_with(env, oracle, key, side, deposited, opp_balance.borrowed)? {
            return Err(Error::NoSafePosition);
        }

        Self::upsert_key(&mut opp_position, key);
        opp_position.balance.set(key.clone(), opp_balance);
        Storage::set_position(env, owner, opposite, &opp_position);

        Events::update_position(
            env,
            owner,
            opposite,
            key,
            opp_balance.deposited,
            opp_balance.conly_deposited,
            opp_balance.borrowed,
        );
        Ok(())
    }

    pub fn repay(
        env: &Env,
        owner: &Address,
        side: Side,
        key: &CoinKey,
        amount: u64,
    ) -> Result<(), Error> {
        let opposite = side.opposite();
        let mut opp_position = Storage::get_position(env, owner, opposite);
        let mut opp_balance = opp_position.balance.get(key.clone()).unwrap_or_default();

        opp_balance.borrowed = opp_balance
            .borrowed
            .checked_sub(amount)
            .ok_or(Error::OverBorrowedAmount)?;
        opp_position.balance.set(key.clone(), opp_balance);

        Self::remove_key_if_empty(&mut opp_position, key);
        Storage::set_position(env, owner, opposite, &opp_position);

        Events::update_position(
            env,
            owner,
            opposite,
            key,
            opp_balance.deposited,
            opp_balance.conly_deposited,
            opp_balance.borrowed,
        );
        Ok(())
    }

    pub fn protect_coin(env: &Env, owner: &Address, side: Side, key: &CoinKey) -> Result<(), Error> {
        let mut position = Storage::get_position(env, owner, side);
        if position.is_protected(key) {
            return Err(Error::AlreadyProtected);
        }
        position.protected.push_back(key.clone());
        Storage::set_position(env, owner, side, &position);
        Ok(())
    }

    pub fn unprotect_coin(env: &Env, owner: &Address, side: Side, key: &CoinKey) -> Result<(), Error> {
        let mut position = Storage::get_position(env, owner, side);
        match position.protected.iter().position(|k| k == *key) {
            Some(idx) => {
                position.protected.remove(idx as u32);
                Storage::set_position(env, owner, side, &position);
                Ok(())
            }
            None => Err(Error::NotProtected),
        }
    }

    /// Required shadow deposit amount for a borrowed volume to sit exactly
    /// at the safety threshold. The debt it secures lives on the
    /// AssetToShadow side under the same key.
    fn required_deposit(
        env: &Env,
        oracle: &dyn PriceOracle,
        owner: &Address,
        key: &CoinKey,
    ) -> Result<u128, Error> {
        let lt = Storage::get_shadow_lt(env) as u128;
        if lt == 0 {
            return Err(Error::ArithmeticError);
        }
        let borrowed = Self::borrowed(env, owner, Side::ShadowToAsset, key);
        let borrowed_volume = oracle.volume(env, key, borrowed) as u128;
        let required_volume = borrowed_volume
            .checked_mul(PRECISION)
            .ok_or(Error::ArithmeticError)?
            .checked_div(lt)
            .ok_or(Error::ArithmeticError)?;
        Ok(oracle.amount_for_volume(env, key, required_volume.min(u64::MAX as u128) as u64) as u128)
    }

    /// Move shadow collateral from an over-collateralized key to an
    /// under-collateralized one. Returns the amount moved from K1 to K2.
    pub fn can_rebalance_shadow_between(
        env: &Env,
        oracle: &dyn PriceOracle,
        owner: &Address,
        key_from: &CoinKey,
        key_to: &CoinKey,
    ) -> Result<Option<u128>, Error> {
        let position = Storage::get_position(env, owner, Side::ShadowToAsset);
        if position.is_protected(key_from) || position.is_protected(key_to) {
            return Ok(None);
        }

        let from_balance = position.balance.get(key_from.clone()).unwrap_or_default();
        let to_balance = position.balance.get(key_to.clone()).unwrap_or_default();

        let from_required = Self::required_deposit(env, oracle, owner, key_from)?;
        let extra = (from_balance.deposited as u128).saturating_sub(from_required);

        let to_required = Self::required_deposit(env, oracle, owner, key_to)?;
        let insufficient = to_required.saturating_sub(to_balance.deposited as u128);

        if insufficient > 0 && extra >= insufficient {
            Ok(Some(insufficient))
        } else {
            Ok(None)
        }
    }

    /// Update position bookkeeping for a rebalance move already applied at
    /// the pool level. Only the ShadowToAsset deposited/conly buckets move;
    /// debt is untouched.
    pub fn apply_rebalance(
        env: &Env,
        owner: &Address,
        key_from: &CoinKey,
        key_to: &CoinKey,
        amount: u128,
        from_is_conly: bool,
        to_is_conly: bool,
    ) -> Result<(), Error> {
        let mut position = Storage::get_position(env, owner, Side::ShadowToAsset);
        let amount = amount as u64;

        let mut from_balance = position.balance.get(key_from.clone()).unwrap_or_default();
        from_balance.deposited = from_balance
            .deposited
            .checked_sub(amount)
            .ok_or(Error::ArithmeticError)?;
        if from_is_conly {
            from_balance.conly_deposited = from_balance
                .conly_deposited
                .checked_sub(amount)
                .ok_or(Error::ArithmeticError)?;
        }
        position.balance.set(key_from.clone(), from_balance);
        Self::remove_key_if_empty(&mut position, key_from);

        let mut to_balance = position.balance.get(key_to.clone()).unwrap_or_default();
        to_balance.deposited = to_balance.deposited.checked_add(amount).ok_or(Error::ArithmeticError)?;
        if to_is_conly {
            to_balance.conly_deposited = to_balance
                .conly_deposited
                .checked_add(amount)
                .ok_or(Error::ArithmeticError)?;
        }
        Self::upsert_key(&mut position, key_to);
        position.balance.set(key_to.clone(), to_balance);

        Storage::set_position(env, owner, Side::ShadowToAsset, &position);

        Events::update_position(
            env,
            owner,
            Side::ShadowToAsset,
            key_from,
            from_balance.deposited,
            from_balance.conly_deposited,
            from_balance.borrowed,
        );
        Events::update_position(
            env,
            owner,
            Side::ShadowToAsset,
            key_to,
            to_balance.deposited,
            to_balance.conly_deposited,
            to_balance.borrowed,
        );
        Ok(())
    }

    /// Find a shadow key that can rescue `key` by rebalance, without
    /// applying anything. Iterates `coins` in reverse, matching the order
    /// the teacher's auction code walks collateral candidates.
    pub fn find_rescue(
        env: &Env,
        oracle: &dyn PriceOracle,
        target: &Address,
        key: &CoinKey,
    ) -> Result<Option<(CoinKey, u128)>, Error> {
        let position = Storage::get_position(env, target, Side::ShadowToAsset);
        let candidates = position.coins.clone();
        for idx in (0..candidates.len()).rev() {
            let candidate = candidates.get(idx).unwrap();
            if candidate == *key {
                continue;
            }
            if let Some(amount) = Self::can_rebalance_shadow_between(env, oracle, target, &candidate, key)? {
                return Ok(Some((candidate, amount)));
            }
        }
        Ok(None)
    }

    /// Forcibly zero a target's collateral (on `side`) and the debt it
    /// secures (on `opposite(side)`) for `key`. Returns
    /// `(withdrawn_amount, was_collateral_only)`.
    pub fn force_close(env: &Env, target: &Address, side: Side, key: &CoinKey) -> Result<(u64, bool), Error> {
        let mut position = Storage::get_position(env, target, side);
        let balance = position.balance.get(key.clone()).unwrap_or_default();
        let is_conly = balance.conly_deposited > 0;
        let withdrawn = balance.deposited;

        position.balance.remove(key.clone());
        if let Some(idx) = position.coins.iter().position(|k| k == *key) {
            position.coins.remove(idx as u32);
        }
        Storage::set_position(env, target, side, &position);

        let opposite = side.opposite();
        let mut opp_position = Storage::get_position(env, target, opposite);
        if opp_position.balance.get(key.clone()).is_some() {
            opp_position.balance.remove(key.clone());
            if let Some(idx) = opp_position.coins.iter().position(|k| k == *key) {
                opp_position.coins.remove(idx as u32);
            }
            Storage::set_position(env, target, opposite, &opp_position);
        }

        let reloaded = Storage::get_position(env, target, side);
        if reloaded.balance.get(key.clone()).is_some() {
            return Err(Error::PositionExisted);
        }

        Events::update_position(env, target, side, key, 0, 0, 0);
        Events::update_position(env, target, opposite, key, 0, 0, 0);
        Ok((withdrawn, is_conly))
    }

    /// Require the position to be unsafe before liquidation proceeds.
    pub fn require_unsafe(
        env: &Env,
        oracle: &dyn PriceOracle,
        target: &Address,
        side: Side,
        key: &CoinKey,
    ) -> Result<(), Error> {
        if Self::is_safe(env, oracle, target, side, key)? {
            Err(Error::NoSafePosition)
        } else {
            Ok(())
        }
    }

    /// `borrow_and_rebalance<C1, C2>`: size a shadow borrow against C1's
    /// spare headroom to cover C2's shortfall, in volume space, then
    /// convert back to a shadow amount.
    pub fn borrow_and_rebalance_amount(
        env: &Env,
        oracle: &dyn PriceOracle,
        owner: &Address,
        key1: &CoinKey,
        key2: &CoinKey,
    ) -> Result<u128, Error> {
        let risk1 = Storage::get_risk_factors(env, key1);
        let deposited1 = Self::deposited(env, owner, Side::AssetToShadow, key1);
        let borrowed1 = Self::borrowed(env, owner, Side::AssetToShadow, key1);

        let deposited1_volume = oracle.volume(env, key1, deposited1) as u128;
        let borrowable1_volume = deposited1_volume
            .checked_mul(risk1.ltv as u128)
            .ok_or(Error::ArithmeticError)?
            .checked_div(PRECISION)
            .ok_or(Error::ArithmeticError)?;
        let borrowed1_volume = oracle.volume(env, key1, borrowed1) as u128;
        let headroom = borrowable1_volume.saturating_sub(borrowed1_volume);

        let required2 = Self::required_deposit(env, oracle, owner, key2)?;
        let deposited2 = Self::deposited(env, owner, Side::ShadowToAsset, key2) as u128;
        let insufficient = required2.saturating_sub(deposited2);

        if insufficient == 0 || headroom < insufficient {
            return Err(Error::CannotRebalance);
        }

        let shadow_volume = insufficient.min(headroom);
        Ok(oracle.amount_for_volume(env, key2, shadow_volume.min(u64::MAX as u128) as u64) as u128)
    }

    #[cfg(test)]
    pub(crate) fn utilization_for_test(
        env: &Env,
        oracle: &dyn PriceOracle,
        key: &CoinKey,
        deposited: u64,
        borrowed: u64,
    ) -> Result<u128, Error> {
        Self::utilization(env, oracle, key, deposited, borrowed)
    }
}
