//! Conversion between deposited/borrowed amount and the share units that
//! represent a claim on a pool bucket whose backing amount grows with
//! accrued interest.

use crate::common::error::Error;

/// `amount -> share`, rounded down. Used when the caller is adding value
/// to a bucket (deposit, borrow): the protocol never mints more share
/// than the amount actually backs.
pub fn to_share(amount: u128, total_amount: u128, total_share: u128) -> Result<u128, Error> {
    if total_amount == 0 || total_share == 0 {
        return Ok(amount);
    }
    amount
        .checked_mul(total_share)
        .ok_or(Error::ArithmeticError)?
        .checked_div(total_amount)
        .ok_or(Error::ArithmeticError)
}

/// `amount -> share`, rounded up. Used when the caller is taking value
/// out of a bucket (withdraw, repay): rounding against the user means the
/// pool is never left short.
pub fn to_share_roundup(amount: u128, total_amount: u128, total_share: u128) -> Result<u128, Error> {
    if total_amount == 0 || total_share == 0 {
        return Ok(amount);
    }
    let numerator = amount
        .checked_mul(total_share)
        .ok_or(Error::ArithmeticError)?
        .checked_add(total_amount)
        .ok_or(Error::ArithmeticError)?
        .checked_sub(1)
        .ok_or(Error::ArithmeticError)?;
    numerator.checked_div(total_amount).ok_or(Error::ArithmeticError)
}

/// `share -> amount`, rounded down.
pub fn to_amount(share: u128, total_amount: u128, total_share: u128) -> Result<u128, Error> {
    if total_amount == 0 || total_share == 0 {
        return Ok(share);
    }
    share
        .checked_mul(total_amount)
        .ok_or(Error::ArithmeticError)?
        .checked_div(total_share)
        .ok_or(Error::ArithmeticError)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn to_share_before_any_deposit_is_identity() {
        assert_eq!(to_share(100, 0, 0).unwrap(), 100);
        assert_eq!(to_share_roundup(100, 0, 0).unwrap(), 100);
        assert_eq!(to_amount(100, 0, 0).unwrap(), 100);
    }

    #[test]
    fn to_share_rounds_down() {
        // total_amount=3, total_share=2: share = floor(10 * 2 / 3) = 6
        assert_eq!(to_share(10, 3, 2).unwrap(), 6);
    }

    #[test]
    fn to_share_roundup_rounds_up() {
        // amount=10, total_amount=3, total_share=2: ceil(10*2/3) = 7
        assert_eq!(to_share_roundup(10, 3, 2).unwrap(), 7);
    }

    #[test]
    fn to_amount_inverts_to_share_up_to_rounding() {
        let share = to_share(1000, 5000, 4000).unwrap();
        let amount = to_amount(share, 5000, 4000).unwrap();
        assert!(amount <= 1000);
    }

    #[test]
    fn interest_inflates_amount_per_share() {
        // Before accrual: 1 share == 1 amount.
        let share = to_share(100, 100, 100).unwrap();
        assert_eq!(share, 100);
        // After interest bumps total_amount to 110 with share unchanged:
        let amount = to_amount(share, 110, 100).unwrap();
        assert_eq!(amount, 110);
    }
}
