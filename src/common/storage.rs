use soroban_sdk::{panic_with_error, Address, Env, Map};

use crate::common::error::Error;
use crate::common::types::{
    AssetStorage, CoinKey, PoolStatusFlags, PositionData, RateConfig, RiskFactors, Side,
    ADMIN_KEY, INSTANCE_BUMP, INSTANCE_TTL, STORAGE, USER_BUMP, USER_TTL,
};

/// Process-wide configuration and per-coin pool accounting, held in instance storage.
#[derive(Clone)]
#[soroban_sdk::contracttype]
pub struct Config {
    pub system_active: bool,
    pub shadow_lt: u64,
    pub rate_configs: Map<CoinKey, RateConfig>,
    pub risk_factors: Map<CoinKey, RiskFactors>,
    pub asset_status: Map<CoinKey, PoolStatusFlags>,
    pub shadow_status: Map<CoinKey, PoolStatusFlags>,
    pub asset_pool: Map<CoinKey, AssetStorage>,
    pub shadow_pool: Map<CoinKey, AssetStorage>,
    /// Token contract per coin key, consumed by [`crate::collaborators::TokenTransport`].
    pub token_addresses: Map<CoinKey, Address>,
    pub oracle: Option<Address>,
    pub dex: Option<Address>,
    pub treasury: Option<Address>,
}

/// Storage operations for the money market.
pub struct Storage;

impl Storage {
    // ========== TTL Management ==========

    pub fn extend_instance_ttl(env: &Env) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_TTL, INSTANCE_BUMP);
    }

    // ========== Instance Storage ==========

    pub fn get(env: &Env) -> Config {
        Self::extend_instance_ttl(env);
        env.storage()
            .instance()
            .get(&STORAGE)
            .unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
    }

    pub fn set(env: &Env, config: &Config) {
        env.storage().instance().set(&STORAGE, config);
        Self::extend_instance_ttl(env);
    }

    pub fn is_initialized(env: &Env) -> bool {
        env.storage().instance().has(&STORAGE)
    }

    pub fn get_admin(env: &Env) -> Address {
        Self::extend_instance_ttl(env);
        env.storage()
            .instance()
            .get(&ADMIN_KEY)
            .unwrap_or_else(|| panic_with_error!(env, Error::NotInitialized))
    }

    pub fn set_admin(env: &Env, admin: &Address) {
        if env.storage().instance().has(&ADMIN_KEY) {
            panic_with_error!(env, Error::AlreadyInitialized);
        }
        env.storage().instance().set(&ADMIN_KEY, admin);
        Self::extend_instance_ttl(env);
    }

    // ========== Rate / Risk Config ==========

    pub fn get_rate_config(env: &Env, key: &CoinKey) -> RateConfig {
        Self::get(env)
            .rate_configs
            .get(key.clone())
            .unwrap_or_else(RateConfig::default_for_asset)
    }

    pub fn set_rate_config(env: &Env, key: &CoinKey, cfg: &RateConfig) {
        let mut config = Self::get(env);
        config.rate_configs.set(key.clone(), cfg.clone());
        Self::set(env, &config);
    }

    pub fn get_risk_factors(env: &Env, key: &CoinKey) -> RiskFactors {
        Self::get(env)
            .risk_factors
            .get(key.clone())
            .unwrap_or_else(RiskFactors::default_for_asset)
    }

    pub fn set_risk_factors(env: &Env, key: &CoinKey, factors: &RiskFactors) {
        let mut config = Self::get(env);
        config.risk_factors.set(key.clone(), factors.clone());
        Self::set(env, &config);
    }

    pub fn get_shadow_lt(env: &Env) -> u64 {
        Self::get(env).shadow_lt
    }

    pub fn set_shadow_lt(env: &Env, lt: u64) {
        let mut config = Self::get(env);
        config.shadow_lt = lt;
        Self::set(env, &config);
    }

    // ========== Pool Status ==========

    pub fn is_system_active(env: &Env) -> bool {
        Self::get(env).system_active
    }

    pub fn set_system_active(env: &Env, active: bool) {
        let mut config = Self::get(env);
        config.system_active = active;
        Self::set(env, &config);
    }

    pub fn get_asset_status(env: &Env, key: &CoinKey) -> PoolStatusFlags {
        Self::get(env)
            .asset_status
            .get(key.clone())
            .unwrap_or_else(PoolStatusFlags::all_enabled)
    }

    pub fn set_asset_status(env: &Env, key: &CoinKey, flags: &PoolStatusFlags) {
        let mut config = Self::get(env);
        config.asset_status.set(key.clone(), *flags);
        Self::set(env, &config);
    }

    pub fn get_shadow_status(env: &Env, key: &CoinKey) -> PoolStatusFlags {
        Self::get(env)
            .shadow_status
            .get(key.clone())
            .unwrap_or_else(PoolStatusFlags::all_enabled)
    }

    pub fn set_shadow_status(env: &Env, key: &CoinKey, flags: &PoolStatusFlags) {
        let mut config = Self::get(env);
        config.shadow_status.set(key.clone(), *flags);
        Self::set(env, &config);
    }

    // ========== Asset Pool ==========

    pub fn get_asset_pool(env: &Env, key: &CoinKey) -> AssetStorage {
        Self::get(env)
            .asset_pool
            .get(key.clone())
            .unwrap_or_else(|| AssetStorage::new(env.ledger().timestamp()))
    }

    pub fn set_asset_pool(env: &Env, key: &CoinKey, data: &AssetStorage) {
        let mut config = Self::get(env);
        config.asset_pool.set(key.clone(), data.clone());
        Self::set(env, &config);
    }

    pub fn has_asset_pool(env: &Env, key: &CoinKey) -> bool {
        Self::get(env).asset_pool.contains_key(key.clone())
    }

    // ========== Shadow Pool ==========

    pub fn get_shadow_pool(env: &Env, key: &CoinKey) -> AssetStorage {
        Self::get(env)
            .shadow_pool
            .get(key.clone())
            .unwrap_or_else(|| AssetStorage::new(env.ledger().timestamp()))
    }

    pub fn set_shadow_pool(env: &Env, key: &CoinKey, data: &AssetStorage) {
        let mut config = Self::get(env);
        config.shadow_pool.set(key.clone(), data.clone());
        Self::set(env, &config);
    }

    pub fn has_shadow_pool(env: &Env, key: &CoinKey) -> bool {
        Self::get(env).shadow_pool.contains_key(key.clone())
    }

    // ========== Collaborator wiring ==========

    pub fn get_token_address(env: &Env, key: &CoinKey) -> Option<Address> {
        Self::get(env).token_addresses.get(key.clone())
    }

    pub fn set_token_address(env: &Env, key: &CoinKey, token: &Address) {
        let mut config = Self::get(env);
        config.token_addresses.set(key.clone(), token.clone());
        Self::set(env, &config);
    }

    pub fn get_oracle(env: &Env) -> Option<Address> {
        Self::get(env).oracle
    }

    pub fn set_oracle(env: &Env, address: &Address) {
        let mut config = Self::get(env);
        config.oracle = Some(address.clone());
        Self::set(env, &config);
    }

    pub fn get_dex(env: &Env) -> Option<Address> {
        Self::get(env).dex
    }

    pub fn set_dex(env: &Env, address: &Address) {
        let mut config = Self::get(env);
        config.dex = Some(address.clone());
        Self::set(env, &config);
    }

    pub fn get_treasury(env: &Env) -> Option<Address> {
        Self::get(env).treasury
    }

    pub fn set_treasury(env: &Env, address: &Address) {
        let mut config = Self::get(env);
        config.treasury = Some(address.clone());
        Self::set(env, &config);
    }

    // ========== Account Position (persistent, per user per side) ==========

    fn position_key(owner: &Address, side: Side) -> (Address, Side) {
        (owner.clone(), side)
    }

    pub fn get_position(env: &Env, owner: &Address, side: Side) -> PositionData {
        let key = Self::position_key(owner, side);
        let position: Option<PositionData> = env.storage().persistent().get(&key);
        if position.is_some() {
            env.storage()
                .persistent()
                .extend_ttl(&key, USER_TTL, USER_BUMP);
        }
        position.unwrap_or_else(|| PositionData::empty(env))
    }

    pub fn set_position(env: &Env, owner: &Address, side: Side, data: &PositionData) {
        let key = Self::position_key(owner, side);
        env.storage().persistent().set(&key, data);
        env.storage()
            .persistent()
            .extend_ttl(&key, USER_TTL, USER_BUMP);
    }
}
