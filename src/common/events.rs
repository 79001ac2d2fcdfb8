use soroban_sdk::{contractevent, Address, Env};

use crate::common::types::{CoinKey, Side};

#[contractevent]
pub struct UpdatePositionEvent {
    pub owner: Address,
    pub side: Side,
    pub key: CoinKey,
    pub deposited: u64,
    pub conly_deposited: u64,
    pub borrowed: u64,
}

#[contractevent]
pub struct DepositEvent {
    pub caller: Address,
    pub beneficiary: Address,
    pub key: CoinKey,
    pub is_shadow: bool,
    pub amount: u128,
    pub share: u128,
}

#[contractevent]
pub struct WithdrawEvent {
    pub caller: Address,
    pub receiver: Address,
    pub key: CoinKey,
    pub is_shadow: bool,
    pub amount: u128,
    pub share: u128,
}

#[contractevent]
pub struct BorrowEvent {
    pub borrower: Address,
    pub receiver: Address,
    pub key: CoinKey,
    pub is_shadow: bool,
    pub amount: u128,
    pub fee: u128,
    pub share: u128,
}

#[contractevent]
pub struct RepayEvent {
    pub account: Address,
    pub key: CoinKey,
    pub is_shadow: bool,
    pub amount: u128,
    pub share: u128,
}

#[contractevent]
pub struct LiquidateEvent {
    pub liquidator: Address,
    pub target: Address,
    pub key: CoinKey,
    pub is_shadow: bool,
    pub amount: u128,
}

#[contractevent]
pub struct SwitchCollateralEvent {
    pub caller: Address,
    pub key: CoinKey,
    pub is_shadow: bool,
    pub amount: u128,
    pub to_collateral_only: bool,
}

#[contractevent]
pub struct PoolStatusUpdateEvent {
    pub key: CoinKey,
    pub is_shadow: bool,
    pub can_deposit: bool,
    pub can_withdraw: bool,
    pub can_borrow: bool,
    pub can_repay: bool,
    pub can_switch_collateral: bool,
}

#[contractevent]
pub struct SetConfigEvent {
    pub key: CoinKey,
}

/// Helper struct for publishing events.
pub struct Events;

impl Events {
    pub fn update_position(
        env: &Env,
        owner: &Address,
        side: Side,
        key: &CoinKey,
        deposited: u64,
        conly_deposited: u64,
        borrowed: u64,
    ) {
        UpdatePositionEvent {
            owner: owner.clone(),
            side,
            key: key.clone(),
            deposited,
            conly_deposited,
            borrowed,
        }
        .publish(env);
    }

    pub fn deposit(
        env: &Env,
        caller: &Address,
        beneficiary: &Address,
        key: &CoinKey,
        is_shadow: bool,
        amount: u128,
        share: u128,
    ) {
        DepositEvent {
            caller: caller.clone(),
            beneficiary: beneficiary.clone(),
            key: key.clone(),
            is_shadow,
            amount,
            share,
        }
        .publish(env);
    }

    pub fn withdraw(
        env: &Env,
        caller: &Address,
        receiver: &Address,
        key: &CoinKey,
        is_shadow: bool,
        amount: u128,
        share: u128,
    ) {
        WithdrawEvent {
            caller: caller.clone(),
            receiver: receiver.clone(),
            key: key.clone(),
            is_shadow,
            amount,
            share,
        }
        .publish(env);
    }

    pub fn borrow(
        env: &Env,
        borrower: &Address,
        receiver: &Address,
        key: &CoinKey,
        is_shadow: bool,
        amount: u128,
        fee: u128,
        share: u128,
    ) {
        BorrowEvent {
            borrower: borrower.clone(),
            receiver: receiver.clone(),
            key: key.clone(),
            is_shadow,
            amount,
            fee,
            share,
        }
        .publish(env);
    }

    pub fn repay(
        env: &Env,
        account: &Address,
        key: &CoinKey,
        is_shadow: bool,
        amount: u128,
        share: u128,
    ) {
        RepayEvent {
            account: account.clone(),
            key: key.clone(),
            is_shadow,
            amount,
            share,
        }
        .publish(env);
    }

    pub fn liquidate(
        env: &Env,
        liquidator: &Address,
        target: &Address,
        key: &CoinKey,
        is_shadow: bool,
        amount: u128,
    ) {
        LiquidateEvent {
            liquidator: liquidator.clone(),
            target: target.clone(),
            key: key.clone(),
            is_shadow,
            amount,
        }
        .publish(env);
    }

    pub fn switch_collateral(
        env: &Env,
        caller: &Address,
        key: &CoinKey,
        is_shadow: bool,
        amount: u128,
        to_collateral_only: bool,
    ) {
        SwitchCollateralEvent {
            caller: caller.clone(),
            key: key.clone(),
            is_shadow,
            amount,
            to_collateral_only,
        }
        .publish(env);
    }

    pub fn pool_status_update(env: &Env, key: &CoinKey, is_shadow: bool, flags: crate::common::types::PoolStatusFlags) {
        PoolStatusUpdateEvent {
            key: key.clone(),
            is_shadow,
            can_deposit: flags.can_deposit,
            can_withdraw: flags.can_withdraw,
            can_borrow: flags.can_borrow,
            can_repay: flags.can_repay,
            can_switch_collateral: flags.can_switch_collateral,
        }
        .publish(env);
    }

    pub fn set_config(env: &Env, key: &CoinKey) {
        SetConfigEvent { key: key.clone() }.publish(env);
    }
}
