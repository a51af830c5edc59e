//! Stand-ins for the external collaborators, for tests only.

use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Env, Map, Symbol};

#[contracttype]
enum MockKey {
    Prices,
    Deposit(Address, Address),
}

/// Price oracle whose prices are set directly by the test.
#[contract]
pub struct MockPriceOracle;

#[contractimpl]
impl MockPriceOracle {
    pub fn set_price(env: Env, code: Symbol, price: i128) {
        let mut prices = Self::prices_in_usd(env.clone());
        prices.set(code, price);
        env.storage().instance().set(&MockKey::Prices, &prices);
    }

    pub fn prices_in_usd(env: Env) -> Map<Symbol, i128> {
        env.storage()
            .instance()
            .get(&MockKey::Prices)
            .unwrap_or(Map::new(&env))
    }
}

/// Lending pool that holds deposits per depositor and token.
///
/// `accrue` credits yield to a position; the test mints the matching tokens
/// to the pool so withdrawals stay backed.
#[contract]
pub struct MockPool;

#[contractimpl]
impl MockPool {
    pub fn deposit(env: Env, depositor: Address, token: Address, amount: i128) {
        depositor.require_auth();
        let pool = env.current_contract_address();
        token::Client::new(&env, &token).transfer_from(&pool, &depositor, &pool, &amount);
        let balance = Self::balance(env.clone(), depositor.clone(), token.clone());
        Self::store(&env, depositor, token, balance + amount);
    }

    pub fn withdraw(env: Env, depositor: Address, token: Address, amount: i128) {
        depositor.require_auth();
        let balance = Self::balance(env.clone(), depositor.clone(), token.clone());
        assert!(amount <= balance, "Insufficient pool balance");
        Self::store(&env, depositor.clone(), token.clone(), balance - amount);
        token::Client::new(&env, &token).transfer(
            &env.current_contract_address(),
            &depositor,
            &amount,
        );
    }

    pub fn balance(env: Env, depositor: Address, token: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&MockKey::Deposit(depositor, token))
            .unwrap_or(0)
    }

    pub fn accrue(env: Env, depositor: Address, token: Address, amount: i128) {
        let balance = Self::balance(env.clone(), depositor.clone(), token.clone());
        Self::store(&env, depositor, token, balance + amount);
    }
}

impl MockPool {
    fn store(env: &Env, depositor: Address, token: Address, balance: i128) {
        env.storage()
            .persistent()
            .set(&MockKey::Deposit(depositor, token), &balance);
    }
}
