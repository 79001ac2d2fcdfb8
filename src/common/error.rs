use soroban_sdk::contracterror;

/// Contract-wide error codes, grouped by subsystem.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Lifecycle
    NotInitialized = 1,
    AlreadyInitialized = 2,
    AlreadyExisted = 3,
    NotExisted = 4,

    // Availability / capacity
    NotAvailable = 10,
    AmountIsZero = 11,
    InsufficientLiquidity = 12,
    InsufficientConlyDeposited = 13,
    ExceedCoinInPool = 14,
    OverDepositedAmount = 15,
    OverBorrowedAmount = 16,
    DexHasNoLiquidity = 17,
    TokenNotRegistered = 18,

    // Position safety
    NoSafePosition = 30,
    AlreadyDepositedAsNormal = 31,
    AlreadyDepositedAsCollateralOnly = 32,
    AlreadyProtected = 33,
    NotProtected = 34,

    // Rebalance / liquidation
    CannotRebalance = 50,
    PositionExisted = 51,
    SameCoinKey = 52,

    // Interest / onboarding / config
    InterestOverflow = 70,
    InvalidRiskFactors = 71,
    InvalidRateConfig = 72,

    // Arithmetic
    ArithmeticError = 90,
}
