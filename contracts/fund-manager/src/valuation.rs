//! Fund valuation.
//!
//! A [`Valuation`] is taken fresh at the start of every operation that needs
//! one and dropped at its end. Prices and pool balances move between
//! operations, so nothing here is ever written to storage.

use soroban_sdk::{Env, Map, Symbol};

use fund_common::interfaces::{ControllerClient, PriceOracleClient, ShareLedgerClient};
use fund_common::math::{interest_fees_unclaimed, mul_div_ceil, pow10, to_usd};
use fund_common::{Currency, FundError};

use crate::storage::{read_address, read_currencies, read_i128, read_interest_fee_rate, DataKey};

pub struct Valuation {
    prices: Map<Symbol, i128>,
    /// USD value of every idle and deployed balance
    pub raw_fund_balance: i128,
    /// `raw_fund_balance` less interest fees owed to the fund operator
    pub fund_balance: i128,
    pub share_supply: i128,
}

impl Valuation {
    /// Reads the oracle once, every raw balance through the controller, and
    /// the share supply.
    pub fn take(env: &Env) -> Result<Self, FundError> {
        let prices = Self::prices(env)?;
        let controller = ControllerClient::new(env, &read_address(env, &DataKey::FundController)?);

        let mut raw_fund_balance = 0_i128;
        for currency in read_currencies(env).values() {
            let raw = controller.get_raw_fund_balance(&currency.code);
            if raw == 0 {
                continue;
            }
            let price = price_of(&prices, &currency.code)?;
            raw_fund_balance = raw_fund_balance
                .checked_add(to_usd(raw, currency.decimals, price)?)
                .ok_or(FundError::ArithmeticOverflow)?;
        }

        let fees = interest_fees_unclaimed(
            raw_fund_balance,
            read_i128(env, &DataKey::NetDeposits),
            read_i128(env, &DataKey::InterestFeesClaimed),
            read_interest_fee_rate(env),
        )?;
        let share_supply =
            ShareLedgerClient::new(env, &read_address(env, &DataKey::ShareToken)?).total_supply();

        Ok(Self {
            prices,
            raw_fund_balance,
            fund_balance: raw_fund_balance - fees,
            share_supply,
        })
    }

    pub fn prices(env: &Env) -> Result<Map<Symbol, i128>, FundError> {
        let oracle = read_address(env, &DataKey::PriceOracle)?;
        Ok(PriceOracleClient::new(env, &oracle).prices_in_usd())
    }

    /// USD value of `amount`, rounded down. Used when value enters the fund.
    pub fn value_of(&self, currency: &Currency, amount: i128) -> Result<i128, FundError> {
        to_usd(amount, currency.decimals, price_of(&self.prices, &currency.code)?)
    }

    /// USD value of `amount`, rounded up. Used when value leaves the fund, so
    /// no withdrawal is ever free.
    pub fn value_of_ceil(&self, currency: &Currency, amount: i128) -> Result<i128, FundError> {
        let price = price_of(&self.prices, &currency.code)?;
        mul_div_ceil(amount, price, pow10(currency.decimals)?)
    }

    pub fn interest_fees_unclaimed(&self) -> i128 {
        self.raw_fund_balance - self.fund_balance
    }
}

pub fn price_of(prices: &Map<Symbol, i128>, code: &Symbol) -> Result<i128, FundError> {
    match prices.get(code.clone()) {
        Some(price) if price > 0 => Ok(price),
        _ => Err(FundError::InvalidPrice),
    }
}
