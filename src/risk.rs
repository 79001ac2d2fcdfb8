//! Per-coin risk parameters and the fee math derived from them.

use crate::common::error::Error;
use crate::common::types::{RiskFactors, PRECISION};

impl RiskFactors {
    /// Fee charged on entry to a borrow, rounded up against the borrower.
    pub fn calculate_entry_fee(&self, amount: u128) -> Result<u128, Error> {
        ceil_mul_div(amount, self.entry_fee as u128, PRECISION)
    }

    /// Fee withheld from a liquidated withdrawal, rounded up against the
    /// liquidated position.
    pub fn calculate_liquidation_fee(&self, amount: u128) -> Result<u128, Error> {
        ceil_mul_div(amount, self.liquidation_fee as u128, PRECISION)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.ltv as u128 >= self.lt as u128 || self.lt as u128 >= PRECISION {
            return Err(Error::InvalidRiskFactors);
        }
        if (self.entry_fee as u128) + (self.share_fee as u128) >= PRECISION {
            return Err(Error::InvalidRiskFactors);
        }
        Ok(())
    }
}

fn ceil_mul_div(amount: u128, numerator: u128, denominator: u128) -> Result<u128, Error> {
    if numerator == 0 {
        return Ok(0);
    }
    let product = amount.checked_mul(numerator).ok_or(Error::ArithmeticError)?;
    product
        .checked_add(denominator - 1)
        .ok_or(Error::ArithmeticError)?
        .checked_div(denominator)
        .ok_or(Error::ArithmeticError)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn entry_fee_rounds_up() {
        let factors = RiskFactors {
            ltv: 0,
            lt: 1,
            entry_fee: 1, // 1e-9
            share_fee: 0,
            liquidation_fee: 0,
        };
        // amount * 1 / 1e9, rounded up, for amount < 1e9 is 1.
        assert_eq!(factors.calculate_entry_fee(1).unwrap(), 1);
    }

    #[test]
    fn default_factors_validate() {
        RiskFactors::default_for_asset().validate().unwrap();
    }

    #[test]
    fn ltv_must_be_below_lt() {
        let factors = RiskFactors {
            ltv: 800_000_000,
            lt: 700_000_000,
            ..RiskFactors::default_for_asset()
        };
        assert!(factors.validate().is_err());
    }
}
