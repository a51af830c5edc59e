use soroban_sdk::{contracttype, Address, Env};

use fund_common::FundError;

/// Storage keys for the share ledger.
///
/// Ledger-wide values live in instance storage; balances and allowances are
/// per-account and live in persistent storage.
#[contracttype]
pub enum DataKey {
    Owner,
    /// The fund manager currently allowed to mint and burn
    Minter,
    Name,
    Symbol,
    TotalSupply,
    Version,
    Balance(Address),
    Allowance(AllowanceKey),
}

#[contracttype]
pub struct AllowanceKey {
    pub from: Address,
    pub spender: Address,
}

#[contracttype]
pub struct AllowanceValue {
    pub amount: i128,
    pub expiration_ledger: u32,
}

pub fn read_address(env: &Env, key: &DataKey) -> Result<Address, FundError> {
    env.storage()
        .instance()
        .get(key)
        .ok_or(FundError::NotInitialized)
}

pub fn read_balance(env: &Env, id: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Balance(id.clone()))
        .unwrap_or(0)
}

pub fn write_balance(env: &Env, id: &Address, amount: i128) {
    env.storage()
        .persistent()
        .set(&DataKey::Balance(id.clone()), &amount);
}

pub fn read_total_supply(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalSupply)
        .unwrap_or(0)
}

pub fn write_total_supply(env: &Env, amount: i128) {
    env.storage().instance().set(&DataKey::TotalSupply, &amount);
}

/// Expired allowances read as zero.
pub fn read_allowance(env: &Env, from: &Address, spender: &Address) -> i128 {
    let key = DataKey::Allowance(AllowanceKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    match env.storage().persistent().get::<_, AllowanceValue>(&key) {
        Some(allowance) if allowance.expiration_ledger >= env.ledger().sequence() => {
            allowance.amount
        }
        _ => 0,
    }
}

pub fn write_allowance(
    env: &Env,
    from: &Address,
    spender: &Address,
    amount: i128,
    expiration_ledger: u32,
) {
    let key = DataKey::Allowance(AllowanceKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    env.storage().persistent().set(
        &key,
        &AllowanceValue {
            amount,
            expiration_ledger,
        },
    );
}

/// Reduces an allowance, keeping its expiration.
pub fn spend_allowance(env: &Env, from: &Address, spender: &Address, amount: i128) {
    let key = DataKey::Allowance(AllowanceKey {
        from: from.clone(),
        spender: spender.clone(),
    });
    if let Some(mut allowance) = env.storage().persistent().get::<_, AllowanceValue>(&key) {
        allowance.amount -= amount;
        env.storage().persistent().set(&key, &allowance);
    }
}
