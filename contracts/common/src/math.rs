//! Fixed-point conversions between raw currency amounts, USD and shares.
//!
//! All inputs are non-negative. Every rounding step favors the fund: shares
//! minted and value reported round down, shares burned round up.

use crate::error::FundError;
use crate::types::MAX_INTEREST_FEE_RATE_BPS;

pub fn pow10(decimals: u32) -> Result<i128, FundError> {
    10_i128
        .checked_pow(decimals)
        .ok_or(FundError::ArithmeticOverflow)
}

pub fn mul_div_floor(a: i128, b: i128, denominator: i128) -> Result<i128, FundError> {
    if denominator <= 0 {
        return Err(FundError::ArithmeticOverflow);
    }
    a.checked_mul(b)
        .ok_or(FundError::ArithmeticOverflow)?
        .checked_div(denominator)
        .ok_or(FundError::ArithmeticOverflow)
}

pub fn mul_div_ceil(a: i128, b: i128, denominator: i128) -> Result<i128, FundError> {
    if denominator <= 0 {
        return Err(FundError::ArithmeticOverflow);
    }
    let product = a.checked_mul(b).ok_or(FundError::ArithmeticOverflow)?;
    let quotient = product / denominator;
    if product % denominator == 0 {
        Ok(quotient)
    } else {
        quotient.checked_add(1).ok_or(FundError::ArithmeticOverflow)
    }
}

/// USD value of `amount` raw units of a currency with `decimals` places at
/// `price` (USD per whole unit).
pub fn to_usd(amount: i128, decimals: u32, price: i128) -> Result<i128, FundError> {
    mul_div_floor(amount, price, pow10(decimals)?)
}

/// Shares to mint for a deposit worth `usd`, priced before the deposit joins
/// the fund. An empty fund mints one share per dollar.
pub fn shares_for_deposit(usd: i128, supply: i128, fund_balance: i128) -> Result<i128, FundError> {
    if supply <= 0 || fund_balance <= 0 {
        return Ok(usd);
    }
    mul_div_floor(usd, supply, fund_balance)
}

/// Shares to burn for a withdrawal worth `usd`.
pub fn shares_for_withdrawal(
    usd: i128,
    supply: i128,
    fund_balance: i128,
) -> Result<i128, FundError> {
    if supply <= 0 || fund_balance <= 0 {
        return Err(FundError::InsufficientShares);
    }
    mul_div_ceil(usd, supply, fund_balance)
}

/// USD value of `shares` at the current exchange rate.
pub fn share_value(shares: i128, supply: i128, fund_balance: i128) -> Result<i128, FundError> {
    if supply <= 0 || fund_balance <= 0 {
        return Ok(0);
    }
    mul_div_floor(shares, fund_balance, supply)
}

/// Interest fees generated and not yet claimed.
///
/// `interest_accrued` is everything the fund holds beyond net deposits,
/// counting fees already paid out.
pub fn interest_fees_unclaimed(
    raw_fund_balance: i128,
    net_deposits: i128,
    interest_fees_claimed: i128,
    interest_fee_rate: u32,
) -> Result<i128, FundError> {
    let accrued = interest_accrued(raw_fund_balance, net_deposits, interest_fees_claimed)?;
    let generated = mul_div_floor(
        accrued,
        interest_fee_rate as i128,
        MAX_INTEREST_FEE_RATE_BPS as i128,
    )?;
    Ok((generated - interest_fees_claimed).max(0))
}

pub fn interest_accrued(
    raw_fund_balance: i128,
    net_deposits: i128,
    interest_fees_claimed: i128,
) -> Result<i128, FundError> {
    let gross = raw_fund_balance
        .checked_add(interest_fees_claimed)
        .ok_or(FundError::ArithmeticOverflow)?;
    let accrued = gross
        .checked_sub(net_deposits)
        .ok_or(FundError::ArithmeticOverflow)?;
    Ok(accrued.max(0))
}
