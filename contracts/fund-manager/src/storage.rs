use soroban_sdk::{contracttype, Address, Env, Map, Symbol, Vec};

use fund_common::{AccessControl, Currency, FundError};

/// Storage keys for the fund manager.
///
/// Raw balances live with the fund controller and share balances with the
/// share ledger; this contract stores only configuration, the currency
/// registry and fee accounting.
#[contracttype]
pub enum DataKey {
    /// Owner and rebalancer role slots
    Access,
    ShareToken,
    FundController,
    PriceOracle,
    /// Safety gate; true blocks deposits, withdrawals and fee withdrawals
    Disabled,
    Version,
    /// `Map<Symbol, Currency>` keyed by currency code
    Currencies,
    /// `Map<Symbol, bool>` of deposit acceptance per currency code
    Accepted,
    /// USD deposited minus USD withdrawn by depositors
    NetDeposits,
    /// USD of interest fees paid out so far
    InterestFeesClaimed,
    /// Interest fee rate in basis points
    InterestFeeRate,
    /// Predecessor allowed to push its state into this instance, once
    DataSource,
    /// Instance this manager handed its state to
    Successor,
}

pub fn read_access(env: &Env) -> Result<AccessControl, FundError> {
    env.storage()
        .instance()
        .get(&DataKey::Access)
        .ok_or(FundError::NotInitialized)
}

pub fn write_access(env: &Env, access: &AccessControl) {
    env.storage().instance().set(&DataKey::Access, access);
}

pub fn read_address(env: &Env, key: &DataKey) -> Result<Address, FundError> {
    env.storage()
        .instance()
        .get(key)
        .ok_or(FundError::NotInitialized)
}

pub fn read_i128(env: &Env, key: &DataKey) -> i128 {
    env.storage().instance().get(key).unwrap_or(0)
}

pub fn write_i128(env: &Env, key: &DataKey, value: i128) {
    env.storage().instance().set(key, &value);
}

pub fn read_interest_fee_rate(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::InterestFeeRate)
        .unwrap_or(0)
}

/// True once this instance handed its state to a successor.
pub fn is_retired(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Successor)
}

pub fn read_successor(env: &Env) -> Option<Address> {
    env.storage().instance().get(&DataKey::Successor)
}

pub fn is_disabled(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Disabled)
        .unwrap_or(false)
}

pub fn read_currencies(env: &Env) -> Map<Symbol, Currency> {
    env.storage()
        .instance()
        .get(&DataKey::Currencies)
        .unwrap_or(Map::new(env))
}

pub fn write_currencies(env: &Env, currencies: &Map<Symbol, Currency>) {
    env.storage().instance().set(&DataKey::Currencies, currencies);
}

pub fn read_currency(env: &Env, code: &Symbol) -> Result<Currency, FundError> {
    read_currencies(env)
        .get(code.clone())
        .ok_or(FundError::UnknownCurrency)
}

pub fn read_accepted(env: &Env) -> Map<Symbol, bool> {
    env.storage()
        .instance()
        .get(&DataKey::Accepted)
        .unwrap_or(Map::new(env))
}

pub fn write_accepted(env: &Env, accepted: &Map<Symbol, bool>) {
    env.storage().instance().set(&DataKey::Accepted, accepted);
}

/// Codes of currencies currently accepted for deposit.
pub fn accepted_codes(env: &Env) -> Vec<Symbol> {
    let mut codes = Vec::new(env);
    for (code, accepted) in read_accepted(env).iter() {
        if accepted {
            codes.push_back(code);
        }
    }
    codes
}

pub fn read_version(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::Version)
        .unwrap_or(1)
}
