//! Trait boundaries for the systems the core composes with but does not
//! implement: price discovery, custody, DEX liquidity, and token transport.
//! Production deployments wire these to real contract clients; tests wire
//! in deterministic fakes.

use soroban_sdk::{Address, Env, IntoVal};

use crate::common::error::Error;
use crate::common::types::CoinKey;

/// Converts an amount of a coin into a common value unit. The core never
/// interprets the unit itself — it only compares volumes against each
/// other and against a percentage threshold.
pub trait PriceOracle {
    fn volume(&self, env: &Env, key: &CoinKey, amount: u64) -> u64;

    /// Inverse of [`Self::volume`]: how much of `key` is worth `volume`.
    /// Needed only by operations that size a borrow from a value gap
    /// (`borrow_and_rebalance`).
    fn amount_for_volume(&self, env: &Env, key: &CoinKey, volume: u64) -> u64;
}

/// Protocol-owned custodian for harvested fees.
pub trait Treasury {
    fn collect_fee(&self, env: &Env, key: &CoinKey, amount: u128) -> Result<(), Error>;
}

/// Liquidity check performed once when a coin is onboarded.
pub trait DexFacade {
    fn has_liquidity(&self, env: &Env, key: &CoinKey) -> bool;
}

/// Token movement primitives. The core only ever moves whole `u64` amounts
/// at the transport boundary.
pub trait CoinTransport {
    fn withdraw_from(&self, env: &Env, key: &CoinKey, account: &Address, amount: u64) -> Result<(), Error>;
    fn deposit_to(&self, env: &Env, key: &CoinKey, receiver: &Address, amount: u64) -> Result<(), Error>;
    fn balance_of(&self, env: &Env, key: &CoinKey, holder: &Address) -> Result<u64, Error>;
}

/// Global kill-switch consulted ahead of every operation, independent of
/// the per-coin [`crate::pool_status`] flags.
pub trait SystemStatus {
    fn is_active(&self, env: &Env) -> bool;
}

/// [`CoinTransport`] backed by a real SEP-41 token contract, the same
/// `token::Client` the teacher calls directly in its liquidation and
/// auction fill paths. One client per coin key, looked up from the
/// per-coin token address registered at onboarding.
pub struct TokenTransport<'a> {
    pub token_addresses: &'a soroban_sdk::Map<CoinKey, Address>,
}

impl<'a> CoinTransport for TokenTransport<'a> {
    fn withdraw_from(&self, env: &Env, key: &CoinKey, account: &Address, amount: u64) -> Result<(), Error> {
        let token = self.token_addresses.get(key.clone()).ok_or(Error::TokenNotRegistered)?;
        let client = soroban_sdk::token::Client::new(env, &token);
        client.transfer(account, &env.current_contract_address(), &(amount as i128));
        Ok(())
    }

    fn deposit_to(&self, env: &Env, key: &CoinKey, receiver: &Address, amount: u64) -> Result<(), Error> {
        let token = self.token_addresses.get(key.clone()).ok_or(Error::TokenNotRegistered)?;
        let client = soroban_sdk::token::Client::new(env, &token);
        client.transfer(&env.current_contract_address(), receiver, &(amount as i128));
        Ok(())
    }

    fn balance_of(&self, env: &Env, key: &CoinKey, holder: &Address) -> Result<u64, Error> {
        let token = self.token_addresses.get(key.clone()).ok_or(Error::TokenNotRegistered)?;
        let client = soroban_sdk::token::Client::new(env, &token);
        Ok(client.balance(holder) as u64)
    }
}

/// [`Treasury`] backed by a plain token transfer to a custodian address —
/// the core does not implement what the custodian does with the funds.
pub struct TokenTreasury<'a> {
    pub token_addresses: &'a soroban_sdk::Map<CoinKey, Address>,
    pub custodian: &'a Address,
}

impl<'a> Treasury for TokenTreasury<'a> {
    fn collect_fee(&self, env: &Env, key: &CoinKey, amount: u128) -> Result<(), Error> {
        let token = self.token_addresses.get(key.clone()).ok_or(Error::TokenNotRegistered)?;
        let client = soroban_sdk::token::Client::new(env, &token);
        client.transfer(&env.current_contract_address(), self.custodian, &(amount as i128));
        Ok(())
    }
}

/// [`PriceOracle`] backed by an external contract invoked by a fixed
/// function-name convention, mirroring the way the teacher's `Oracles`
/// module wraps a sibling contract client — the callee's own logic is out
/// of scope here, only the call shape is specified.
pub struct RemoteOracle<'a> {
    pub address: &'a Address,
}

impl<'a> PriceOracle for RemoteOracle<'a> {
    fn volume(&self, env: &Env, key: &CoinKey, amount: u64) -> u64 {
        env.invoke_contract(
            self.address,
            &soroban_sdk::symbol_short!("volume"),
            soroban_sdk::vec![env, key.into_val(env), amount.into_val(env)],
        )
    }

    fn amount_for_volume(&self, env: &Env, key: &CoinKey, volume: u64) -> u64 {
        env.invoke_contract(
            self.address,
            &soroban_sdk::symbol_short!("amt4vol"),
            soroban_sdk::vec![env, key.into_val(env), volume.into_val(env)],
        )
    }
}

/// [`DexFacade`] backed by an external contract, same invocation
/// convention as [`RemoteOracle`].
pub struct RemoteDex<'a> {
    pub address: &'a Address,
}

impl<'a> DexFacade for RemoteDex<'a> {
    fn has_liquidity(&self, env: &Env, key: &CoinKey) -> bool {
        env.invoke_contract(
            self.address,
            &soroban_sdk::symbol_short!("has_liq"),
            soroban_sdk::vec![env, key.into_val(env)],
        )
    }
}
