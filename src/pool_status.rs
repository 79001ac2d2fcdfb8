//! Per-(coin, operation) availability flags, gated by a system-wide switch.

use soroban_sdk::Env;

use crate::common::error::Error;
use crate::common::storage::Storage;
use crate::common::types::CoinKey;

pub enum Op {
    Deposit,
    Withdraw,
    Borrow,
    Repay,
    SwitchCollateral,
}

/// Require that the system is active and the named operation is enabled
/// for the given coin on the asset side.
pub fn require_asset_available(env: &Env, key: &CoinKey, op: Op) -> Result<(), Error> {
    if !Storage::is_system_active(env) {
        return Err(Error::NotAvailable);
    }
    let flags = Storage::get_asset_status(env, key);
    let ok = match op {
        Op::Deposit => flags.can_deposit,
        Op::Withdraw => flags.can_withdraw,
        Op::Borrow => flags.can_borrow,
        Op::Repay => flags.can_repay,
        Op::SwitchCollateral => flags.can_switch_collateral,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::NotAvailable)
    }
}

/// Same as [`require_asset_available`] but against the shadow side.
pub fn require_shadow_available(env: &Env, key: &CoinKey, op: Op) -> Result<(), Error> {
    if !Storage::is_system_active(env) {
        return Err(Error::NotAvailable);
    }
    let flags = Storage::get_shadow_status(env, key);
    let ok = match op {
        Op::Deposit => flags.can_deposit,
        Op::Withdraw => flags.can_withdraw,
        Op::Borrow => flags.can_borrow,
        Op::Repay => flags.can_repay,
        Op::SwitchCollateral => flags.can_switch_collateral,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::NotAvailable)
    }
}
