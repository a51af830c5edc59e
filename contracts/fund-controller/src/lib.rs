//! # Fund Controller
//!
//! Decides where the fund's raw currency balances sit. Deposits made through
//! the fund manager land here as *idle* balances; the rebalancer then moves
//! them into lending pools (*deployed*) through pool adapters, and back.
//!
//! ## Balances
//!
//! The controller stores no balances of its own. For each currency:
//!
//! ```text
//! raw balance = token.balance(controller)                 idle
//!             + Σ pool.adapter.balance(controller, token)  deployed
//! ```
//!
//! Both terms are read live, so yield accrued inside a pool shows up in the
//! next read without any bookkeeping step.
//!
//! ## Allocation Flow
//!
//! ```text
//! Rebalancer → approve_to_pool()  → token.approve(controller → adapter)
//! Rebalancer → deposit_to_pool()  → adapter.deposit()  idle → deployed
//! Rebalancer → withdraw_from_pool() → adapter.withdraw() deployed → idle
//! FundManager → transfer_to_account() → idle → depositor
//! ```
//!
//! ## Upgrade Model
//!
//! - **In place** ([`FundController::upgrade`]): the code behind this address is
//!   replaced and storage survives, so pool positions stay valid untouched.
//! - **Full migration** ([`FundController::upgrade_fund_controller`]): every pool
//!   position is unwound, the registries are pushed to a successor that
//!   authorized this instance as its data source, and all idle balances are
//!   transferred. The fund manager is then repointed with `set_fund_controller`.
//!   The old instance records its successor and stays retired: it cannot be
//!   re-enabled and rejects every value-moving call.
//!
//! Both require the safety gate to be closed first.

#![no_std]

use soroban_sdk::{
    contract, contractimpl, log, symbol_short, token, Address, BytesN, Env, Symbol, Vec,
};

use fund_common::interfaces::{ControllerMigrationClient, PoolAdapterClient};
use fund_common::types::{APPROVAL_LEDGERS, MAX_CURRENCIES, MAX_POOLS};
use fund_common::{AccessControl, Currency, FundControllerData, FundError, Pool};

mod events;
mod storage;

pub use events::{GateEvent, MigrationEvent, PoolEvent, RoleEvent, UpgradeEvent};
use storage::{
    is_disabled, is_retired, read_access, read_currencies, read_currency, read_fund_manager,
    read_pool, read_pools, read_successor, read_version, write_access, write_currencies,
    write_pools, DataKey,
};

#[contract]
pub struct FundController;

#[contractimpl]
impl FundController {
    // ==========================================================================
    // INITIALIZATION
    // ==========================================================================

    /// Sets the role slots and the fund manager allowed to pay out balances.
    /// Currencies and pools are registered afterwards, or imported from a
    /// predecessor during a full migration.
    ///
    /// # Errors
    /// - `AlreadyInitialized` if called twice
    pub fn initialize(
        env: Env,
        owner: Address,
        rebalancer: Address,
        fund_manager: Address,
    ) -> Result<(), FundError> {
        if env.storage().instance().has(&DataKey::Access) {
            return Err(FundError::AlreadyInitialized);
        }

        write_access(&env, &AccessControl::new(owner, rebalancer));
        env.storage().instance().set(&DataKey::FundManager, &fund_manager);
        env.storage().instance().set(&DataKey::Disabled, &false);
        env.storage().instance().set(&DataKey::Version, &1_u32);
        Ok(())
    }

    // ==========================================================================
    // REGISTRY ADMINISTRATION
    // ==========================================================================

    /// Registers a currency. Owner only.
    ///
    /// # Errors
    /// - `AlreadyRegistered` if the code exists; decimals never change
    /// - `TooManyCurrencies` past `MAX_CURRENCIES`
    pub fn add_currency(env: Env, caller: Address, currency: Currency) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;

        let mut currencies = read_currencies(&env);
        if currencies.contains_key(currency.code.clone()) {
            return Err(FundError::AlreadyRegistered);
        }
        if currencies.len() >= MAX_CURRENCIES {
            return Err(FundError::TooManyCurrencies);
        }
        currencies.set(currency.code.clone(), currency);
        write_currencies(&env, &currencies);
        Ok(())
    }

    /// Registers a pool. Owner only. Every currency the pool lists must
    /// already be registered.
    ///
    /// # Errors
    /// - `AlreadyRegistered` if the id exists
    /// - `TooManyPools` past `MAX_POOLS`
    /// - `UnknownCurrency` for an unregistered currency code
    pub fn add_pool(env: Env, caller: Address, pool: Pool) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;
        Self::register_pool(&env, pool)
    }

    pub fn get_currencies(env: Env) -> Vec<Currency> {
        read_currencies(&env).values()
    }

    pub fn get_pools(env: Env) -> Vec<Pool> {
        read_pools(&env).values()
    }

    // ==========================================================================
    // ALLOCATION
    // ==========================================================================

    /// Lets a pool adapter pull up to `amount` of a currency from the idle
    /// balance. Moves nothing; `deposit_to_pool` does. An amount of 0 revokes.
    ///
    /// # Errors
    /// - `FundControllerDisabled` while the gate is closed
    /// - `Unauthorized` unless called by the owner or rebalancer
    /// - `UnknownPool`, `UnsupportedPoolCurrency`, `UnknownCurrency`
    pub fn approve_to_pool(
        env: Env,
        caller: Address,
        pool_id: u32,
        code: Symbol,
        amount: i128,
    ) -> Result<(), FundError> {
        Self::require_enabled(&env)?;
        read_access(&env)?.require_operator(&caller)?;
        if amount < 0 {
            return Err(FundError::InvalidAmount);
        }
        let (pool, currency) = Self::pool_position(&env, pool_id, &code)?;

        let expiration_ledger = env.ledger().sequence() + APPROVAL_LEDGERS;
        token::Client::new(&env, &currency.token).approve(
            &env.current_contract_address(),
            &pool.adapter,
            &amount,
            &expiration_ledger,
        );

        events::pool(&env, symbol_short!("pool_appr"), pool_id, code, amount);
        Ok(())
    }

    /// Moves `amount` from idle into the pool through its adapter.
    ///
    /// # Errors
    /// - everything `approve_to_pool` returns
    /// - `InsufficientAllowance` if the adapter was not approved for `amount`
    /// - `InsufficientLiquidity` if the idle balance is short
    ///
    /// Adapter failures trap and abort the call as they are.
    pub fn deposit_to_pool(
        env: Env,
        caller: Address,
        pool_id: u32,
        code: Symbol,
        amount: i128,
    ) -> Result<(), FundError> {
        Self::require_enabled(&env)?;
        read_access(&env)?.require_operator(&caller)?;
        if amount <= 0 {
            return Err(FundError::InvalidAmount);
        }
        let (pool, currency) = Self::pool_position(&env, pool_id, &code)?;

        let this = env.current_contract_address();
        let token = token::Client::new(&env, &currency.token);
        if token.allowance(&this, &pool.adapter) < amount {
            return Err(FundError::InsufficientAllowance);
        }
        if token.balance(&this) < amount {
            return Err(FundError::InsufficientLiquidity);
        }

        PoolAdapterClient::new(&env, &pool.adapter).deposit(&this, &currency.token, &amount);

        events::pool(&env, symbol_short!("pool_dep"), pool_id, code, amount);
        Ok(())
    }

    /// Moves `amount` from the pool back to idle.
    pub fn withdraw_from_pool(
        env: Env,
        caller: Address,
        pool_id: u32,
        code: Symbol,
        amount: i128,
    ) -> Result<(), FundError> {
        Self::require_enabled(&env)?;
        read_access(&env)?.require_operator(&caller)?;
        if amount <= 0 {
            return Err(FundError::InvalidAmount);
        }
        let (pool, currency) = Self::pool_position(&env, pool_id, &code)?;

        let adapter = PoolAdapterClient::new(&env, &pool.adapter);
        let this = env.current_contract_address();
        if adapter.balance(&this, &currency.token) < amount {
            return Err(FundError::InsufficientLiquidity);
        }
        adapter.withdraw(&this, &currency.token, &amount);

        events::pool(&env, symbol_short!("pool_wd"), pool_id, code, amount);
        Ok(())
    }

    /// Moves the whole position in a pool back to idle and returns the amount.
    pub fn withdraw_all_from_pool(
        env: Env,
        caller: Address,
        pool_id: u32,
        code: Symbol,
    ) -> Result<i128, FundError> {
        Self::require_enabled(&env)?;
        read_access(&env)?.require_operator(&caller)?;
        let (pool, currency) = Self::pool_position(&env, pool_id, &code)?;

        let amount = Self::unwind(&env, &pool, &currency);
        if amount > 0 {
            events::pool(&env, symbol_short!("pool_wd"), pool_id, code, amount);
        }
        Ok(amount)
    }

    /// Pays `amount` of idle balance out to `to`. Fund manager only.
    ///
    /// Not gated by this contract's own safety gate: withdrawals depend only
    /// on the fund manager's gate.
    ///
    /// # Errors
    /// - `InsufficientLiquidity` if the idle balance is short; pool positions
    ///   are never unwound implicitly
    /// - `FundRetired` once the controller migrated to a successor
    pub fn transfer_to_account(
        env: Env,
        code: Symbol,
        to: Address,
        amount: i128,
    ) -> Result<(), FundError> {
        read_fund_manager(&env)?.require_auth();
        Self::require_active(&env)?;
        if amount <= 0 {
            return Err(FundError::InvalidAmount);
        }

        let currency = read_currency(&env, &code)?;
        let this = env.current_contract_address();
        let token = token::Client::new(&env, &currency.token);
        if token.balance(&this) < amount {
            return Err(FundError::InsufficientLiquidity);
        }
        token.transfer(&this, &to, &amount);
        Ok(())
    }

    // ==========================================================================
    // READ FUNCTIONS
    // ==========================================================================

    /// Idle plus deployed balance of a currency, in its raw units.
    pub fn get_raw_fund_balance(env: Env, code: Symbol) -> Result<i128, FundError> {
        let currency = read_currency(&env, &code)?;
        let this = env.current_contract_address();

        let mut total = token::Client::new(&env, &currency.token).balance(&this);
        for pool in read_pools(&env).values() {
            if pool.supports(&code) {
                let deployed =
                    PoolAdapterClient::new(&env, &pool.adapter).balance(&this, &currency.token);
                total = total
                    .checked_add(deployed)
                    .ok_or(FundError::ArithmeticOverflow)?;
            }
        }
        Ok(total)
    }

    pub fn get_idle_balance(env: Env, code: Symbol) -> Result<i128, FundError> {
        let currency = read_currency(&env, &code)?;
        Ok(token::Client::new(&env, &currency.token).balance(&env.current_contract_address()))
    }

    pub fn get_pool_balance(env: Env, pool_id: u32, code: Symbol) -> Result<i128, FundError> {
        let (pool, currency) = Self::pool_position(&env, pool_id, &code)?;
        Ok(PoolAdapterClient::new(&env, &pool.adapter)
            .balance(&env.current_contract_address(), &currency.token))
    }

    pub fn is_fund_disabled(env: Env) -> bool {
        is_disabled(&env)
    }

    pub fn get_owner(env: Env) -> Result<Address, FundError> {
        Ok(read_access(&env)?.owner)
    }

    pub fn get_rebalancer(env: Env) -> Result<Address, FundError> {
        Ok(read_access(&env)?.rebalancer)
    }

    pub fn get_fund_manager(env: Env) -> Result<Address, FundError> {
        read_fund_manager(&env)
    }

    pub fn get_version(env: Env) -> u32 {
        read_version(&env)
    }

    /// Instance this controller migrated to, if any.
    pub fn get_successor(env: Env) -> Option<Address> {
        read_successor(&env)
    }

    // ==========================================================================
    // ADMINISTRATIVE - SAFETY GATE AND ROLES
    // ==========================================================================

    /// Closes the safety gate. Owner or rebalancer. A no-op when already closed.
    pub fn disable_fund(env: Env, caller: Address) -> Result<(), FundError> {
        Self::set_disabled(&env, caller, true)
    }

    /// Opens the safety gate. Owner or rebalancer. A no-op when already open.
    ///
    /// # Errors
    /// - `FundRetired` once the controller migrated to a successor
    pub fn enable_fund(env: Env, caller: Address) -> Result<(), FundError> {
        Self::set_disabled(&env, caller, false)
    }

    pub fn transfer_ownership(
        env: Env,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), FundError> {
        let mut access = read_access(&env)?;
        access.require_owner(&caller)?;

        let old = core::mem::replace(&mut access.owner, new_owner.clone());
        write_access(&env, &access);
        events::role(&env, symbol_short!("owner"), old, new_owner);
        Ok(())
    }

    pub fn set_fund_rebalancer(
        env: Env,
        caller: Address,
        new_rebalancer: Address,
    ) -> Result<(), FundError> {
        let mut access = read_access(&env)?;
        access.require_owner(&caller)?;

        let old = core::mem::replace(&mut access.rebalancer, new_rebalancer.clone());
        write_access(&env, &access);
        events::role(&env, symbol_short!("rebalancr"), old, new_rebalancer);
        Ok(())
    }

    /// Repoints the payout authority. Callable by the owner or by the current
    /// fund manager, which hands it to its successor during a migration.
    pub fn set_fund_manager(
        env: Env,
        caller: Address,
        fund_manager: Address,
    ) -> Result<(), FundError> {
        caller.require_auth();
        let old = read_fund_manager(&env)?;
        if caller != old && caller != read_access(&env)?.owner {
            log!(&env, "set_fund_manager rejected for {}", caller);
            return Err(FundError::Unauthorized);
        }

        env.storage().instance().set(&DataKey::FundManager, &fund_manager);
        events::role(&env, symbol_short!("fund_mgr"), old, fund_manager);
        Ok(())
    }

    // ==========================================================================
    // UPGRADES
    // ==========================================================================

    /// Replaces this contract's code in place. Owner only, gate closed.
    ///
    /// Constant cost: storage, the address and therefore every pool position
    /// are kept as they are.
    pub fn upgrade(env: Env, caller: Address, new_wasm_hash: BytesN<32>) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;
        Self::require_disabled(&env)?;

        let version = read_version(&env) + 1;
        env.storage().instance().set(&DataKey::Version, &version);
        env.events().publish(
            (symbol_short!("upgrade"),),
            UpgradeEvent { version, wasm_hash: new_wasm_hash.clone() },
        );
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    /// Names the one predecessor allowed to push its registries into this
    /// instance. `None` revokes. Owner only.
    pub fn authorize_data_source(
        env: Env,
        caller: Address,
        source: Option<Address>,
    ) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;

        match source {
            Some(source) => env.storage().instance().set(&DataKey::DataSource, &source),
            None => env.storage().instance().remove(&DataKey::DataSource),
        }
        Ok(())
    }

    /// Receives the registries of the authorized predecessor. Consumes the
    /// authorization, so it cannot be replayed.
    ///
    /// # Errors
    /// - `DataSourceNotAuthorized` if no predecessor is authorized
    pub fn import_fund_controller_data(
        env: Env,
        data: FundControllerData,
    ) -> Result<(), FundError> {
        let source: Address = env
            .storage()
            .instance()
            .get(&DataKey::DataSource)
            .ok_or(FundError::DataSourceNotAuthorized)?;
        source.require_auth();

        let mut currencies = read_currencies(&env);
        for currency in data.currencies.iter() {
            if !currencies.contains_key(currency.code.clone()) {
                if currencies.len() >= MAX_CURRENCIES {
                    return Err(FundError::TooManyCurrencies);
                }
                currencies.set(currency.code.clone(), currency);
            }
        }
        write_currencies(&env, &currencies);

        let pools = read_pools(&env);
        for pool in data.pools.iter() {
            if !pools.contains_key(pool.id) {
                Self::register_pool(&env, pool)?;
            }
        }

        env.storage().instance().remove(&DataKey::DataSource);
        log!(&env, "fund controller data imported from {}", source);
        Ok(())
    }

    /// Moves everything this controller holds to `successor`. Owner only,
    /// gate closed.
    ///
    /// 1. Every live pool position is withdrawn back to idle.
    /// 2. The registries are pushed to the successor, which must have
    ///    authorized this instance with `authorize_data_source`.
    /// 3. Every idle balance is transferred to the successor.
    ///
    /// The work is bounded by `MAX_POOLS × MAX_CURRENCIES` positions plus
    /// `MAX_CURRENCIES` transfers. Returns the number of positions unwound.
    ///
    /// # Errors
    /// - `FundEnabled` while the gate is open
    /// - `DataSourceNotAuthorized` if the successor did not authorize us
    /// - `MigrationIntegrityFailure` if a position could not be fully unwound
    ///   or the successor did not receive exactly what was sent
    /// - `FundRetired` if this instance already migrated
    pub fn upgrade_fund_controller(
        env: Env,
        caller: Address,
        successor: Address,
    ) -> Result<u32, FundError> {
        read_access(&env)?.require_owner(&caller)?;
        Self::require_disabled(&env)?;

        let this = env.current_contract_address();
        let currencies = read_currencies(&env);
        let pools = read_pools(&env);

        let mut positions_unwound = 0_u32;
        for pool in pools.values() {
            for code in pool.currencies.iter() {
                let currency = currencies.get(code).ok_or(FundError::UnknownCurrency)?;
                if Self::unwind(&env, &pool, &currency) > 0 {
                    positions_unwound += 1;
                }
                let left = PoolAdapterClient::new(&env, &pool.adapter).balance(&this, &currency.token);
                if left != 0 {
                    log!(&env, "pool {} still holds {} after unwind", pool.id, left);
                    return Err(FundError::MigrationIntegrityFailure);
                }
            }
        }

        let data = FundControllerData {
            currencies: currencies.values(),
            pools: pools.values(),
        };
        match ControllerMigrationClient::new(&env, &successor).try_import_fund_controller_data(&data) {
            Ok(Ok(())) => {}
            Err(Ok(err)) => return Err(err),
            _ => return Err(FundError::MigrationIntegrityFailure),
        }

        for currency in currencies.values() {
            let token = token::Client::new(&env, &currency.token);
            let idle = token.balance(&this);
            if idle == 0 {
                continue;
            }
            let before = token.balance(&successor);
            token.transfer(&this, &successor, &idle);
            if token.balance(&successor) - before != idle || token.balance(&this) != 0 {
                return Err(FundError::MigrationIntegrityFailure);
            }
        }

        env.storage().instance().set(&DataKey::Successor, &successor);
        env.events().publish(
            (symbol_short!("migrated"),),
            MigrationEvent { successor, positions_unwound },
        );
        Ok(positions_unwound)
    }
}

impl FundController {
    fn require_enabled(env: &Env) -> Result<(), FundError> {
        Self::require_active(env)?;
        if is_disabled(env) {
            return Err(FundError::FundControllerDisabled);
        }
        Ok(())
    }

    fn require_disabled(env: &Env) -> Result<(), FundError> {
        Self::require_active(env)?;
        if !is_disabled(env) {
            return Err(FundError::FundEnabled);
        }
        Ok(())
    }

    /// A retired instance no longer holds balances and must stay shut.
    fn require_active(env: &Env) -> Result<(), FundError> {
        if is_retired(env) {
            return Err(FundError::FundRetired);
        }
        Ok(())
    }

    fn set_disabled(env: &Env, caller: Address, disabled: bool) -> Result<(), FundError> {
        read_access(env)?.require_operator(&caller)?;
        if !disabled {
            Self::require_active(env)?;
        }

        if is_disabled(env) != disabled {
            env.storage().instance().set(&DataKey::Disabled, &disabled);
            events::gate(env, disabled, caller);
        }
        Ok(())
    }

    fn pool_position(env: &Env, pool_id: u32, code: &Symbol) -> Result<(Pool, Currency), FundError> {
        let pool = read_pool(env, pool_id)?;
        if !pool.supports(code) {
            return Err(FundError::UnsupportedPoolCurrency);
        }
        Ok((pool, read_currency(env, code)?))
    }

    fn register_pool(env: &Env, pool: Pool) -> Result<(), FundError> {
        let mut pools = read_pools(env);
        if pools.contains_key(pool.id) {
            return Err(FundError::AlreadyRegistered);
        }
        if pools.len() >= MAX_POOLS {
            return Err(FundError::TooManyPools);
        }
        let currencies = read_currencies(env);
        for code in pool.currencies.iter() {
            if !currencies.contains_key(code) {
                return Err(FundError::UnknownCurrency);
            }
        }
        pools.set(pool.id, pool);
        write_pools(env, &pools);
        Ok(())
    }

    /// Withdraws the full position of `currency` in `pool`; returns the amount.
    fn unwind(env: &Env, pool: &Pool, currency: &Currency) -> i128 {
        let this = env.current_contract_address();
        let adapter = PoolAdapterClient::new(env, &pool.adapter);
        let deployed = adapter.balance(&this, &currency.token);
        if deployed > 0 {
            adapter.withdraw(&this, &currency.token, &deployed);
        }
        deployed
    }
}
