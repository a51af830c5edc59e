//! Cross-contract interfaces.
//!
//! The price oracle and pool adapters are external collaborators; only their
//! boundary is fixed here. The remaining traits describe the slice of a
//! sibling fund contract that another fund contract calls into.

use soroban_sdk::{contractclient, Address, Env, Map, Symbol, Vec};

use crate::error::FundError;
use crate::types::{Currency, FundControllerData, FundManagerData};

/// Supplies the current USD price of one whole unit of each currency, with
/// [`crate::types::USD_DECIMALS`] decimals.
#[contractclient(name = "PriceOracleClient")]
pub trait PriceOracle {
    fn prices_in_usd(env: Env) -> Map<Symbol, i128>;
}

/// A lending venue integration.
///
/// `deposit` pulls `amount` of `token` from `depositor` using the allowance
/// the depositor granted the adapter beforehand. `withdraw` sends it back.
/// Failures trap and are never caught by the fund.
#[contractclient(name = "PoolAdapterClient")]
pub trait PoolAdapter {
    fn deposit(env: Env, depositor: Address, token: Address, amount: i128);
    fn withdraw(env: Env, depositor: Address, token: Address, amount: i128);
    fn balance(env: Env, depositor: Address, token: Address) -> i128;
}

/// What the fund manager needs from the fund controller.
#[contractclient(name = "ControllerClient")]
pub trait FundControllerInterface {
    fn get_raw_fund_balance(env: Env, code: Symbol) -> Result<i128, FundError>;
    fn get_idle_balance(env: Env, code: Symbol) -> Result<i128, FundError>;
    fn transfer_to_account(
        env: Env,
        code: Symbol,
        to: Address,
        amount: i128,
    ) -> Result<(), FundError>;
    fn is_fund_disabled(env: Env) -> bool;
    fn get_currencies(env: Env) -> Vec<Currency>;
    fn set_fund_manager(env: Env, caller: Address, fund_manager: Address) -> Result<(), FundError>;
}

/// What the fund manager needs from the share ledger.
#[contractclient(name = "ShareLedgerClient")]
pub trait ShareLedgerInterface {
    fn balance(env: Env, id: Address) -> i128;
    fn total_supply(env: Env) -> i128;
    fn mint(env: Env, to: Address, amount: i128) -> Result<(), FundError>;
    fn burn_from_fund(env: Env, from: Address, amount: i128) -> Result<(), FundError>;
    fn set_minter(env: Env, caller: Address, new_minter: Address) -> Result<(), FundError>;
}

/// Entry points a migrating fund manager calls on its successor.
#[contractclient(name = "ManagerMigrationClient")]
pub trait FundManagerMigration {
    fn import_fund_manager_data(env: Env, data: FundManagerData) -> Result<(), FundError>;
    fn get_raw_fund_balance(env: Env) -> Result<i128, FundError>;
    fn get_fund_balance(env: Env) -> Result<i128, FundError>;
}

/// Entry points a migrating fund controller calls on its successor.
#[contractclient(name = "ControllerMigrationClient")]
pub trait FundControllerMigration {
    fn import_fund_controller_data(env: Env, data: FundControllerData) -> Result<(), FundError>;
}
