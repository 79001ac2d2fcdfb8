use soroban_sdk::{panic_with_error, Address, BytesN, Env, Map};

use crate::common::error::Error;
use crate::common::storage::{Config, Storage};
use crate::common::types::{PoolStatusFlags, RateConfig, RiskFactors};

/// Administrative functions for the money market.
pub struct Admin;

impl Admin {
    pub fn initialize(env: &Env, admin: &Address, shadow_lt: u64) {
        if Storage::is_initialized(env) {
            panic_with_error!(env, Error::AlreadyInitialized);
        }
        Storage::set_admin(env, admin);

        let config = Config {
            system_active: true,
            shadow_lt,
            rate_configs: Map::new(env),
            risk_factors: Map::new(env),
            asset_status: Map::new(env),
            shadow_status: Map::new(env),
            asset_pool: Map::new(env),
            shadow_pool: Map::new(env),
            token_addresses: Map::new(env),
            oracle: None,
            dex: None,
            treasury: None,
        };
        Storage::set(env, &config);
    }

    pub fn get_admin(env: &Env) -> Address {
        Storage::get_admin(env)
    }

    pub fn require_admin(env: &Env) {
        Self::get_admin(env).require_auth();
    }

    pub fn onboard_coin(
        env: &Env,
        dex: &dyn crate::collaborators::DexFacade,
        key: &crate::common::types::CoinKey,
        token: &Address,
        risk_factors: RiskFactors,
        rate_config: RateConfig,
    ) -> Result<(), Error> {
        Self::require_admin(env);

        if Storage::get_token_address(env, key).is_some() {
            return Err(Error::AlreadyExisted);
        }
        if !dex.has_liquidity(env, key) {
            return Err(Error::DexHasNoLiquidity);
        }
        risk_factors.validate()?;

        Storage::set_token_address(env, key, token);
        Storage::set_risk_factors(env, key, &risk_factors);
        Storage::set_rate_config(env, key, &rate_config);
        crate::common::events::Events::set_config(env, key);
        Ok(())
    }

    pub fn set_risk_factors(
        env: &Env,
        key: &crate::common::types::CoinKey,
        factors: RiskFactors,
    ) -> Result<(), Error> {
        Self::require_admin(env);
        factors.validate()?;
        Storage::set_risk_factors(env, key, &factors);
        crate::common::events::Events::set_config(env, key);
        Ok(())
    }

    pub fn set_rate_config(env: &Env, key: &crate::common::types::CoinKey, cfg: RateConfig) {
        Self::require_admin(env);
        Storage::set_rate_config(env, key, &cfg);
        crate::common::events::Events::set_config(env, key);
    }

    pub fn set_shadow_lt(env: &Env, lt: u64) {
        Self::require_admin(env);
        Storage::set_shadow_lt(env, lt);
    }

    pub fn set_system_active(env: &Env, active: bool) {
        Self::require_admin(env);
        Storage::set_system_active(env, active);
    }

    pub fn set_asset_status(env: &Env, key: &crate::common::types::CoinKey, flags: PoolStatusFlags) {
        Self::require_admin(env);
        Storage::set_asset_status(env, key, &flags);
        crate::common::events::Events::pool_status_update(env, key, false, flags);
    }

    pub fn set_shadow_status(env: &Env, key: &crate::common::types::CoinKey, flags: PoolStatusFlags) {
        Self::require_admin(env);
        Storage::set_shadow_status(env, key, &flags);
        crate::common::events::Events::pool_status_update(env, key, true, flags);
    }

    pub fn set_oracle(env: &Env, address: &Address) {
        Self::require_admin(env);
        Storage::set_oracle(env, address);
    }

    pub fn set_dex(env: &Env, address: &Address) {
        Self::require_admin(env);
        Storage::set_dex(env, address);
    }

    pub fn set_treasury(env: &Env, address: &Address) {
        Self::require_admin(env);
        Storage::set_treasury(env, address);
    }

    pub fn upgrade(env: &Env, new_wasm_hash: &BytesN<32>) {
        Self::require_admin(env);
        env.deployer().update_current_contract_wasm(new_wasm_hash.clone());
    }
}
