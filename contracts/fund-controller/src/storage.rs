use soroban_sdk::{contracttype, Address, Env, Map, Symbol};

use fund_common::{AccessControl, Currency, FundError, Pool};

/// Storage keys for the fund controller.
///
/// Everything lives in instance storage: the registries are bounded by
/// `MAX_CURRENCIES` and `MAX_POOLS`, and balances are never stored here, they
/// are read live from the token contracts and pool adapters.
#[contracttype]
pub enum DataKey {
    /// Owner and rebalancer role slots
    Access,
    /// Fund manager allowed to pay out idle balances
    FundManager,
    /// Safety gate; true blocks every value-moving operation
    Disabled,
    Version,
    /// `Map<Symbol, Currency>` keyed by currency code
    Currencies,
    /// `Map<u32, Pool>` keyed by pool id
    Pools,
    /// Predecessor allowed to push its registries into this instance, once
    DataSource,
    /// Instance this controller migrated its balances to
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

pub fn read_fund_manager(env: &Env) -> Result<Address, FundError> {
    env.storage()
        .instance()
        .get(&DataKey::FundManager)
        .ok_or(FundError::NotInitialized)
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

pub fn read_pools(env: &Env) -> Map<u32, Pool> {
    env.storage()
        .instance()
        .get(&DataKey::Pools)
        .unwrap_or(Map::new(env))
}

pub fn write_pools(env: &Env, pools: &Map<u32, Pool>) {
    env.storage().instance().set(&DataKey::Pools, pools);
}

pub fn read_pool(env: &Env, pool_id: u32) -> Result<Pool, FundError> {
    read_pools(env).get(pool_id).ok_or(FundError::UnknownPool)
}

pub fn read_version(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::Version)
        .unwrap_or(1)
}
