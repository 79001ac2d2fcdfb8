use soroban_sdk::{contracttype, symbol_short, Symbol};

// ============================================================================
// SCALAR CONSTANTS
// ============================================================================

/// 9 decimals. 1.0 == PRECISION. Used for utilization, rates, risk factors.
pub const PRECISION: u128 = 1_000_000_000;

/// Seconds per year for interest calculations.
pub const SECONDS_PER_YEAR: u64 = 31_536_000; // 365 days

// ============================================================================
// TTL CONSTANTS
// ============================================================================

/// Ledgers per day (~5 seconds per ledger on Stellar)
pub const ONE_DAY_LEDGERS: u32 = 17280;

/// Instance storage TTL (admin, risk/rate config, pool status) - 30 days
pub const INSTANCE_TTL: u32 = ONE_DAY_LEDGERS * 30;
pub const INSTANCE_BUMP: u32 = ONE_DAY_LEDGERS * 31;

/// User storage TTL (positions) - 100 days
pub const USER_TTL: u32 = ONE_DAY_LEDGERS * 100;
pub const USER_BUMP: u32 = ONE_DAY_LEDGERS * 120;

// ============================================================================
// COIN KEY
// ============================================================================

/// Stable per-coin identifier. Short asset symbols (e.g. `WETH`, `UNI`) are
/// already interned by the host, so this is just a `Symbol` alias.
pub type CoinKey = Symbol;

// ============================================================================
// SIDE
// ============================================================================

/// Which side of the dual-sided market a position sits on.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    /// User deposited the real coin, borrowed shadow.
    AssetToShadow,
    /// User deposited shadow, borrowed the real coin.
    ShadowToAsset,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::AssetToShadow => Side::ShadowToAsset,
            Side::ShadowToAsset => Side::AssetToShadow,
        }
    }
}

// ============================================================================
// INTEREST RATE CONFIG
// ============================================================================

/// Interest rate configuration for one coin. All values in PRECISION (9 decimals).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RateConfig {
    /// Utilization above which the steeper slope applies.
    pub uopt: u64,
    /// Utilization ceiling used by the steep-slope segment.
    pub ucrit: u64,
    /// Base rate, always applied.
    pub rb: u64,
    /// Slope applied up to `uopt`.
    pub rslope1: u64,
    /// Slope applied from `uopt` to `ucrit`.
    pub rslope2: u64,
}

impl RateConfig {
    pub fn default_for_asset() -> Self {
        RateConfig {
            uopt: 700_000_000,     // 70%
            ucrit: 950_000_000,    // 95%
            rb: 20_000_000,        // 2%
            rslope1: 70_000_000,   // 7%
            rslope2: 1_500_000_000, // 150%
        }
    }
}

// ============================================================================
// RISK FACTORS
// ============================================================================

/// Risk parameters for one coin. All values in PRECISION (9 decimals).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RiskFactors {
    pub ltv: u64,
    pub lt: u64,
    pub entry_fee: u64,
    pub share_fee: u64,
    pub liquidation_fee: u64,
}

impl RiskFactors {
    pub fn default_for_asset() -> Self {
        RiskFactors {
            ltv: 650_000_000,            // 65%
            lt: 700_000_000,             // 70%
            entry_fee: 1_000_000,        // 0.1%
            share_fee: 100_000_000,      // 10%
            liquidation_fee: 50_000_000, // 5%
        }
    }

    /// Single global liquidation threshold used for shadow-side safety checks.
    pub fn default_shadow_lt() -> u64 {
        PRECISION as u64 // 100%
    }
}

// ============================================================================
// POOL STATUS
// ============================================================================

/// Per-(coin, operation) availability flags.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PoolStatusFlags {
    pub can_deposit: bool,
    pub can_withdraw: bool,
    pub can_borrow: bool,
    pub can_repay: bool,
    pub can_switch_collateral: bool,
}

impl PoolStatusFlags {
    pub fn all_enabled() -> Self {
        PoolStatusFlags {
            can_deposit: true,
            can_withdraw: true,
            can_borrow: true,
            can_repay: true,
            can_switch_collateral: true,
        }
    }
}

// ============================================================================
// ASSET STORAGE (per-coin pool accounting)
// ============================================================================

/// Accounting state for one coin inside one pool (asset or shadow).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssetStorage {
    pub total_normal_deposited_amount: u128,
    pub total_normal_deposited_share: u128,
    pub total_conly_deposited_amount: u128,
    pub total_conly_deposited_share: u128,
    pub total_borrowed_amount: u128,
    pub total_borrowed_share: u128,
    pub last_updated: u64,
    pub protocol_fees: u128,
    pub harvested_protocol_fees: u128,
    /// Last computed compound factor, for observability only.
    pub rcomp: u128,
}

impl AssetStorage {
    pub fn new(now: u64) -> Self {
        AssetStorage {
            total_normal_deposited_amount: 0,
            total_normal_deposited_share: 0,
            total_conly_deposited_amount: 0,
            total_conly_deposited_share: 0,
            total_borrowed_amount: 0,
            total_borrowed_share: 0,
            last_updated: now,
            protocol_fees: 0,
            harvested_protocol_fees: 0,
            rcomp: PRECISION,
        }
    }
}

// ============================================================================
// BALANCE (per user, per coin, per side)
// ============================================================================

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default)]
pub struct Balance {
    pub deposited: u64,
    pub conly_deposited: u64,
    pub borrowed: u64,
}

impl Balance {
    pub fn is_empty(&self) -> bool {
        self.deposited == 0 && self.conly_deposited == 0 && self.borrowed == 0
    }
}

// ============================================================================
// ACCOUNT POSITION
// ============================================================================

use soroban_sdk::{Env, Map, Vec};

/// Per-user, per-side bookkeeping: which coins are touched, which are
/// protected from rebalance, and the balance entry for each.
#[contracttype]
#[derive(Clone, Debug)]
pub struct PositionData {
    pub coins: Vec<CoinKey>,
    pub protected: Vec<CoinKey>,
    pub balance: Map<CoinKey, Balance>,
}

impl PositionData {
    pub fn empty(env: &Env) -> Self {
        PositionData {
            coins: Vec::new(env),
            protected: Vec::new(env),
            balance: Map::new(env),
        }
    }

    pub fn is_protected(&self, key: &CoinKey) -> bool {
        self.protected.iter().any(|k| k == *key)
    }
}

// ============================================================================
// STORAGE KEYS
// ============================================================================

pub const STORAGE: Symbol = symbol_short!("STORAGE");
pub const ADMIN_KEY: Symbol = symbol_short!("ADMIN");
