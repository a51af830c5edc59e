//! # Fund Manager
//!
//! The accounting side of the fund: it knows what the fund owes each
//! depositor. Deposits of any accepted stablecoin are valued in USD through
//! the price oracle and paid for with fund shares; withdrawals burn shares for
//! the USD value taken out.
//!
//! ## Architecture Overview
//!
//! ```text
//! Deposit Flow:
//! User → [FundManager.deposit()] → token.transfer_from(user → FundController)
//!                               ↓
//!                      shares minted on the share ledger
//!
//! Withdraw Flow:
//! User → [FundManager.withdraw()] → shares burned
//!                                ↓
//!                      FundController.transfer_to_account(user)
//! ```
//!
//! Currency sits idle in the fund controller until the rebalancer deploys it
//! into a pool. Withdrawals only draw on idle balances; unwinding a pool
//! position is a separate rebalancer action.
//!
//! ## Share Accounting Model
//!
//! ```text
//! fund balance   = Σ raw balance × price − unclaimed interest fees
//! exchange rate  = fund balance / total shares
//! shares minted  = ⌊deposit USD × total shares / fund balance⌋
//! shares burned  = ⌈withdrawal USD × total shares / fund balance⌉
//! ```
//!
//! The rate is taken before the deposit joins the fund, so a depositor never
//! dilutes themselves, and every rounding step favors the fund. An empty fund
//! mints one share per dollar.
//!
//! ## Upgrade Model
//!
//! Both upgrade paths require this manager *and* its fund controller to be
//! disabled first, so no allocation decision can happen mid-migration.
//!
//! - **In place** ([`FundManager::upgrade`]): new code, same address and storage.
//! - **Full migration** ([`FundManager::upgrade_fund_manager`]): the successor
//!   names this instance with `authorize_data_source`, then this
//!   instance pushes its registry and fee accounting and hands the share
//!   ledger's minter role over. Share balances are never touched. The call
//!   reverts unless the successor reports a raw and net fund balance at
//!   least as high as this instance did. The fund controller's payout
//!   authority moves to the successor in the same call, and this instance
//!   stays retired: it cannot be re-enabled and moves no value.

#![no_std]

use soroban_sdk::{
    contract, contractimpl, log, symbol_short, token, Address, BytesN, Env, Map, Symbol, Vec,
};

use fund_common::interfaces::{ControllerClient, ManagerMigrationClient, ShareLedgerClient};
use fund_common::math::{interest_accrued, share_value, shares_for_deposit, shares_for_withdrawal};
use fund_common::types::{MAX_CURRENCIES, MAX_INTEREST_FEE_RATE_BPS};
use fund_common::{AccessControl, Currency, FundError, FundManagerData};

mod events;
mod storage;
mod valuation;

pub use events::{
    AcceptedEvent, FeesWithdrawnEvent, FundFlowEvent, GateEvent, MigrationEvent, RoleEvent,
    UpgradeEvent,
};
use storage::{
    accepted_codes, is_disabled, is_retired, read_access, read_accepted, read_address,
    read_currencies, read_currency, read_i128, read_interest_fee_rate, read_successor,
    read_version, write_access, write_accepted, write_currencies, write_i128, DataKey,
};
use valuation::{price_of, Valuation};

#[contract]
pub struct FundManager;

#[contractimpl]
impl FundManager {
    // ==========================================================================
    // INITIALIZATION
    // ==========================================================================

    /// Wires the manager to its collaborators.
    ///
    /// # Arguments
    /// * `owner` - Full control, including upgrades and role reassignment
    /// * `rebalancer` - Operational role: currency acceptance and the safety gate
    /// * `share_token` - Share ledger; this contract must be its minter
    /// * `fund_controller` - Holds and allocates the raw balances
    /// * `price_oracle` - Supplies USD prices
    ///
    /// # Errors
    /// - `AlreadyInitialized` if called twice
    pub fn initialize(
        env: Env,
        owner: Address,
        rebalancer: Address,
        share_token: Address,
        fund_controller: Address,
        price_oracle: Address,
    ) -> Result<(), FundError> {
        if env.storage().instance().has(&DataKey::Access) {
            return Err(FundError::AlreadyInitialized);
        }

        write_access(&env, &AccessControl::new(owner, rebalancer));
        env.storage().instance().set(&DataKey::ShareToken, &share_token);
        env.storage().instance().set(&DataKey::FundController, &fund_controller);
        env.storage().instance().set(&DataKey::PriceOracle, &price_oracle);
        env.storage().instance().set(&DataKey::Disabled, &false);
        env.storage().instance().set(&DataKey::Version, &1_u32);
        Ok(())
    }

    /// Registers a currency. Owner only. `decimals` never changes afterwards.
    ///
    /// The fund controller must already hold the same code with the same
    /// token and decimals, so both sides price and move the same asset.
    ///
    /// # Errors
    /// - `AlreadyRegistered` if the code exists
    /// - `TooManyCurrencies` past `MAX_CURRENCIES`
    /// - `UnknownCurrency` if the fund controller does not know the code
    /// - `CurrencyMismatch` if the fund controller registered it differently
    pub fn add_currency(
        env: Env,
        caller: Address,
        currency: Currency,
        accepted: bool,
    ) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;

        let mut currencies = read_currencies(&env);
        if currencies.contains_key(currency.code.clone()) {
            return Err(FundError::AlreadyRegistered);
        }
        if currencies.len() >= MAX_CURRENCIES {
            return Err(FundError::TooManyCurrencies);
        }
        let registered = Self::controller(&env)?
            .get_currencies()
            .iter()
            .find(|c| c.code == currency.code)
            .ok_or(FundError::UnknownCurrency)?;
        if registered != currency {
            log!(&env, "currency {} differs from the fund controller's", currency.code);
            return Err(FundError::CurrencyMismatch);
        }

        let mut acceptance = read_accepted(&env);
        acceptance.set(currency.code.clone(), accepted);
        currencies.set(currency.code.clone(), currency);
        write_currencies(&env, &currencies);
        write_accepted(&env, &acceptance);
        Ok(())
    }

    // ==========================================================================
    // CORE LIFECYCLE - DEPOSIT
    // ==========================================================================

    /// Deposits `amount` of an accepted currency and mints shares to `caller`.
    ///
    /// The caller must first approve this contract on the currency's token for
    /// at least `amount`. Returns the number of shares minted.
    ///
    /// # Errors
    /// - `FundManagerDisabled` while the safety gate is closed
    /// - `CurrencyNotAccepted` for an unknown or disabled currency
    /// - `InsufficientAllowance` if the token approval is short
    /// - `InvalidAmount` if `amount` is not positive or worth less than one share unit
    /// - `InvalidPrice` if the oracle has no usable price
    ///
    /// # Events
    /// Emits `FundFlowEvent` under `deposit`
    pub fn deposit(env: Env, caller: Address, code: Symbol, amount: i128) -> Result<i128, FundError> {
        caller.require_auth();
        Self::require_enabled(&env)?;
        if amount <= 0 {
            return Err(FundError::InvalidAmount);
        }
        let currency = Self::accepted_currency(&env, &code)?;

        let this = env.current_contract_address();
        let token = token::Client::new(&env, &currency.token);
        if token.allowance(&caller, &this) < amount {
            return Err(FundError::InsufficientAllowance);
        }

        let valuation = Valuation::take(&env)?;
        let usd = valuation.value_of(&currency, amount)?;
        let shares = shares_for_deposit(usd, valuation.share_supply, valuation.fund_balance)?;
        if shares <= 0 {
            return Err(FundError::InvalidAmount);
        }

        let controller = read_address(&env, &DataKey::FundController)?;
        token.transfer_from(&this, &caller, &controller, &amount);
        Self::share_ledger(&env)?.mint(&caller, &shares);

        let net_deposits = read_i128(&env, &DataKey::NetDeposits)
            .checked_add(usd)
            .ok_or(FundError::ArithmeticOverflow)?;
        write_i128(&env, &DataKey::NetDeposits, net_deposits);

        events::flow(
            &env,
            symbol_short!("deposit"),
            FundFlowEvent { account: caller, code, amount, usd, shares },
        );
        Ok(shares)
    }

    // ==========================================================================
    // CORE LIFECYCLE - WITHDRAW
    // ==========================================================================

    /// Withdraws `amount` of a currency to `caller`, burning shares worth its
    /// USD value (rounded up). Returns the number of shares burned.
    ///
    /// Only the fund controller's idle balance can be drawn; this never
    /// unwinds a pool position.
    ///
    /// # Errors
    /// - `FundManagerDisabled` while the safety gate is closed
    /// - `UnknownCurrency` for an unregistered currency
    /// - `InsufficientShares` if the caller's shares are worth less than `amount`
    /// - `InsufficientLiquidity` if the idle balance of the currency is short
    ///
    /// # Events
    /// Emits `FundFlowEvent` under `withdraw`
    pub fn withdraw(env: Env, caller: Address, code: Symbol, amount: i128) -> Result<i128, FundError> {
        caller.require_auth();
        Self::require_enabled(&env)?;
        if amount <= 0 {
            return Err(FundError::InvalidAmount);
        }
        let currency = read_currency(&env, &code)?;

        let valuation = Valuation::take(&env)?;
        let usd = valuation.value_of_ceil(&currency, amount)?;
        let shares = shares_for_withdrawal(usd, valuation.share_supply, valuation.fund_balance)?;

        let share_ledger = Self::share_ledger(&env)?;
        if share_ledger.balance(&caller) < shares {
            return Err(FundError::InsufficientShares);
        }
        let controller = Self::controller(&env)?;
        if controller.get_idle_balance(&code) < amount {
            return Err(FundError::InsufficientLiquidity);
        }

        share_ledger.burn_from_fund(&caller, &shares);
        controller.transfer_to_account(&code, &caller, &amount);

        let net_deposits = read_i128(&env, &DataKey::NetDeposits)
            .checked_sub(usd)
            .ok_or(FundError::ArithmeticOverflow)?;
        write_i128(&env, &DataKey::NetDeposits, net_deposits);

        events::flow(
            &env,
            symbol_short!("withdraw"),
            FundFlowEvent { account: caller, code, amount, usd, shares },
        );
        Ok(shares)
    }

    // ==========================================================================
    // READ FUNCTIONS
    // ==========================================================================

    /// USD value of `account`'s shares at the current exchange rate.
    pub fn balance_of(env: Env, account: Address) -> Result<i128, FundError> {
        let shares = Self::share_ledger(&env)?.balance(&account);
        if shares == 0 {
            return Ok(0);
        }
        let valuation = Valuation::take(&env)?;
        share_value(shares, valuation.share_supply, valuation.fund_balance)
    }

    /// USD value of every idle and deployed balance, before interest fees.
    pub fn get_raw_fund_balance(env: Env) -> Result<i128, FundError> {
        Ok(Valuation::take(&env)?.raw_fund_balance)
    }

    /// Idle plus deployed balance of one currency, in its raw units.
    pub fn get_raw_currency_balance(env: Env, code: Symbol) -> Result<i128, FundError> {
        read_currency(&env, &code)?;
        Ok(Self::controller(&env)?.get_raw_fund_balance(&code))
    }

    /// Total USD value owed to depositors.
    pub fn get_fund_balance(env: Env) -> Result<i128, FundError> {
        Ok(Valuation::take(&env)?.fund_balance)
    }

    pub fn get_interest_accrued(env: Env) -> Result<i128, FundError> {
        let valuation = Valuation::take(&env)?;
        interest_accrued(
            valuation.raw_fund_balance,
            read_i128(&env, &DataKey::NetDeposits),
            read_i128(&env, &DataKey::InterestFeesClaimed),
        )
    }

    pub fn get_interest_fees_unclaimed(env: Env) -> Result<i128, FundError> {
        Ok(Valuation::take(&env)?.interest_fees_unclaimed())
    }

    pub fn get_interest_fees_claimed(env: Env) -> i128 {
        read_i128(&env, &DataKey::InterestFeesClaimed)
    }

    pub fn get_interest_fee_rate(env: Env) -> u32 {
        read_interest_fee_rate(&env)
    }

    pub fn get_net_deposits(env: Env) -> i128 {
        read_i128(&env, &DataKey::NetDeposits)
    }

    /// Current oracle price of every registered currency.
    ///
    /// # Errors
    /// - `InvalidPrice` if any registered currency lacks a usable price
    pub fn get_currency_prices_in_usd(env: Env) -> Result<Map<Symbol, i128>, FundError> {
        let oracle_prices = Valuation::prices(&env)?;
        let mut prices = Map::new(&env);
        for code in read_currencies(&env).keys() {
            let price = price_of(&oracle_prices, &code)?;
            prices.set(code, price);
        }
        Ok(prices)
    }

    pub fn get_currencies(env: Env) -> Vec<Currency> {
        read_currencies(&env).values()
    }

    pub fn get_accepted_currencies(env: Env) -> Vec<Symbol> {
        accepted_codes(&env)
    }

    pub fn is_currency_accepted(env: Env, code: Symbol) -> bool {
        read_accepted(&env).get(code).unwrap_or(false)
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

    pub fn get_share_token(env: Env) -> Result<Address, FundError> {
        read_address(&env, &DataKey::ShareToken)
    }

    pub fn get_fund_controller(env: Env) -> Result<Address, FundError> {
        read_address(&env, &DataKey::FundController)
    }

    pub fn get_price_oracle(env: Env) -> Result<Address, FundError> {
        read_address(&env, &DataKey::PriceOracle)
    }

    pub fn get_version(env: Env) -> u32 {
        read_version(&env)
    }

    /// The instance this manager migrated to, if any.
    pub fn get_successor(env: Env) -> Option<Address> {
        read_successor(&env)
    }

    // ==========================================================================
    // ADMINISTRATIVE - SAFETY GATE
    // ==========================================================================

    /// Closes the safety gate: deposits and withdrawals fail with
    /// `FundManagerDisabled` until `enable_fund`. Owner or rebalancer.
    /// Closing an already closed gate is a no-op.
    ///
    /// # Events
    /// Emits `GateEvent` under `disabled` when the state changes
    pub fn disable_fund(env: Env, caller: Address) -> Result<(), FundError> {
        Self::set_disabled(&env, caller, true)
    }

    /// Opens the safety gate. Owner or rebalancer. A no-op when already open.
    ///
    /// # Errors
    /// - `FundRetired` once the manager migrated to a successor
    pub fn enable_fund(env: Env, caller: Address) -> Result<(), FundError> {
        Self::set_disabled(&env, caller, false)
    }

    // ==========================================================================
    // ADMINISTRATIVE - CONFIGURATION
    // ==========================================================================

    /// Toggles deposit acceptance per currency. Owner or rebalancer.
    ///
    /// # Errors
    /// - `LengthMismatch` if `codes` and `accepted` differ in length
    /// - `UnknownCurrency` if any code is unregistered; nothing is changed
    pub fn set_accepted_currencies(
        env: Env,
        caller: Address,
        codes: Vec<Symbol>,
        accepted: Vec<bool>,
    ) -> Result<(), FundError> {
        read_access(&env)?.require_operator(&caller)?;
        if codes.len() != accepted.len() {
            return Err(FundError::LengthMismatch);
        }

        let currencies = read_currencies(&env);
        let mut acceptance = read_accepted(&env);
        for (code, flag) in codes.iter().zip(accepted.iter()) {
            if !currencies.contains_key(code.clone()) {
                return Err(FundError::UnknownCurrency);
            }
            acceptance.set(code.clone(), flag);
            env.events().publish(
                (symbol_short!("accepted"),),
                AcceptedEvent { code, accepted: flag },
            );
        }
        write_accepted(&env, &acceptance);
        Ok(())
    }

    /// Sets the interest fee rate in basis points. Owner only.
    ///
    /// The rate applies to all interest accrued so far that has not been
    /// claimed, so it should be changed right after fees are withdrawn.
    pub fn set_interest_fee_rate(env: Env, caller: Address, rate: u32) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;
        if rate > MAX_INTEREST_FEE_RATE_BPS {
            return Err(FundError::InvalidFeeRate);
        }
        env.storage().instance().set(&DataKey::InterestFeeRate, &rate);
        Ok(())
    }

    /// Pays out `amount` of a currency from unclaimed interest fees. Owner only.
    ///
    /// # Errors
    /// - `FundManagerDisabled` while the safety gate is closed
    /// - `InvalidAmount` if the USD value exceeds the unclaimed fees
    /// - `InsufficientLiquidity` if the idle balance is short
    pub fn withdraw_interest_fees(
        env: Env,
        caller: Address,
        code: Symbol,
        amount: i128,
        to: Address,
    ) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;
        Self::require_enabled(&env)?;
        if amount <= 0 {
            return Err(FundError::InvalidAmount);
        }
        let currency = read_currency(&env, &code)?;

        let valuation = Valuation::take(&env)?;
        let usd = valuation.value_of_ceil(&currency, amount)?;
        if usd > valuation.interest_fees_unclaimed() {
            return Err(FundError::InvalidAmount);
        }
        let controller = Self::controller(&env)?;
        if controller.get_idle_balance(&code) < amount {
            return Err(FundError::InsufficientLiquidity);
        }
        controller.transfer_to_account(&code, &to, &amount);

        let claimed = read_i128(&env, &DataKey::InterestFeesClaimed)
            .checked_add(usd)
            .ok_or(FundError::ArithmeticOverflow)?;
        write_i128(&env, &DataKey::InterestFeesClaimed, claimed);

        env.events().publish(
            (symbol_short!("fees"),),
            FeesWithdrawnEvent { code, amount, usd, to },
        );
        Ok(())
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

    /// Repoints the manager at a new fund controller, as the last step of a
    /// controller migration. Owner only.
    pub fn set_fund_controller(
        env: Env,
        caller: Address,
        fund_controller: Address,
    ) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;

        let old = read_address(&env, &DataKey::FundController)?;
        env.storage().instance().set(&DataKey::FundController, &fund_controller);
        events::role(&env, symbol_short!("fund_ctrl"), old, fund_controller);
        Ok(())
    }

    pub fn set_price_oracle(env: Env, caller: Address, oracle: Address) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;

        let old = read_address(&env, &DataKey::PriceOracle)?;
        env.storage().instance().set(&DataKey::PriceOracle, &oracle);
        events::role(&env, symbol_short!("oracle"), old, oracle);
        Ok(())
    }

    // ==========================================================================
    // UPGRADES
    // ==========================================================================

    /// Replaces this contract's code in place. Owner only; this manager and
    /// its fund controller must both be disabled.
    pub fn upgrade(env: Env, caller: Address, new_wasm_hash: BytesN<32>) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;
        Self::require_maintenance_window(&env)?;

        let version = read_version(&env) + 1;
        env.storage().instance().set(&DataKey::Version, &version);
        env.events().publish(
            (symbol_short!("upgrade"),),
            UpgradeEvent { version, wasm_hash: new_wasm_hash.clone() },
        );
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    /// Names the one predecessor allowed to push its state into this
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

    /// Receives the state of the authorized predecessor. The authorization is
    /// consumed, so the handoff cannot be replayed.
    ///
    /// Registry entries this instance already has are kept as they are; fee
    /// accounting is added to this instance's own.
    ///
    /// # Errors
    /// - `DataSourceNotAuthorized` if no predecessor is authorized
    pub fn import_fund_manager_data(env: Env, data: FundManagerData) -> Result<(), FundError> {
        let source: Address = env
            .storage()
            .instance()
            .get(&DataKey::DataSource)
            .ok_or(FundError::DataSourceNotAuthorized)?;
        source.require_auth();

        let mut currencies = read_currencies(&env);
        let mut acceptance = read_accepted(&env);
        for currency in data.currencies.iter() {
            if currencies.contains_key(currency.code.clone()) {
                continue;
            }
            if currencies.len() >= MAX_CURRENCIES {
                return Err(FundError::TooManyCurrencies);
            }
            acceptance.set(currency.code.clone(), data.accepted.contains(&currency.code));
            currencies.set(currency.code.clone(), currency);
        }
        write_currencies(&env, &currencies);
        write_accepted(&env, &acceptance);

        let net_deposits = read_i128(&env, &DataKey::NetDeposits)
            .checked_add(data.net_deposits)
            .ok_or(FundError::ArithmeticOverflow)?;
        let claimed = read_i128(&env, &DataKey::InterestFeesClaimed)
            .checked_add(data.interest_fees_claimed)
            .ok_or(FundError::ArithmeticOverflow)?;
        write_i128(&env, &DataKey::NetDeposits, net_deposits);
        write_i128(&env, &DataKey::InterestFeesClaimed, claimed);
        env.storage()
            .instance()
            .set(&DataKey::InterestFeeRate, &data.interest_fee_rate);

        env.storage().instance().remove(&DataKey::DataSource);
        log!(&env, "fund manager data imported from {}", source);
        Ok(())
    }

    /// Hands this manager's state to `successor`. Owner only; this manager
    /// and its fund controller must both be disabled.
    ///
    /// 1. Registry and fee accounting are pushed to the successor, which must
    ///    have authorized this instance as its data source.
    /// 2. The share ledger's minter role moves to the successor. No share
    ///    balance changes.
    /// 3. The fund controller's payout authority moves to the successor
    ///    through `set_fund_manager`.
    /// 4. The successor's raw and net fund balances are compared with the
    ///    values read here before the handoff; any decrease reverts the whole
    ///    call.
    ///
    /// This instance is retired afterwards and rejects every value-moving call.
    ///
    /// # Errors
    /// - `FundEnabled` if either gate is open
    /// - `FundRetired` if this instance already migrated
    /// - `DataSourceNotAuthorized` if the successor did not authorize us
    /// - `MigrationIntegrityFailure` if the successor values the fund lower
    pub fn upgrade_fund_manager(
        env: Env,
        caller: Address,
        successor: Address,
    ) -> Result<(), FundError> {
        read_access(&env)?.require_owner(&caller)?;
        Self::require_maintenance_window(&env)?;

        let before = Valuation::take(&env)?;
        let data = FundManagerData {
            currencies: read_currencies(&env).values(),
            accepted: accepted_codes(&env),
            net_deposits: read_i128(&env, &DataKey::NetDeposits),
            interest_fees_claimed: read_i128(&env, &DataKey::InterestFeesClaimed),
            interest_fee_rate: read_interest_fee_rate(&env),
        };

        let migration = ManagerMigrationClient::new(&env, &successor);
        match migration.try_import_fund_manager_data(&data) {
            Ok(Ok(())) => {}
            Err(Ok(err)) => return Err(err),
            _ => return Err(FundError::MigrationIntegrityFailure),
        }

        let this = env.current_contract_address();
        Self::share_ledger(&env)?.set_minter(&this, &successor);
        Self::controller(&env)?.set_fund_manager(&this, &successor);

        let raw_fund_balance = match migration.try_get_raw_fund_balance() {
            Ok(Ok(balance)) => balance,
            _ => return Err(FundError::MigrationIntegrityFailure),
        };
        let fund_balance = match migration.try_get_fund_balance() {
            Ok(Ok(balance)) => balance,
            _ => return Err(FundError::MigrationIntegrityFailure),
        };
        if raw_fund_balance < before.raw_fund_balance || fund_balance < before.fund_balance {
            log!(
                &env,
                "successor values fund at {} (raw {}), expected at least {} (raw {})",
                fund_balance,
                raw_fund_balance,
                before.fund_balance,
                before.raw_fund_balance
            );
            return Err(FundError::MigrationIntegrityFailure);
        }

        env.storage().instance().set(&DataKey::Successor, &successor);
        env.events().publish(
            (symbol_short!("migrated"),),
            MigrationEvent { successor, raw_fund_balance, fund_balance },
        );
        Ok(())
    }
}

impl FundManager {
    fn require_enabled(env: &Env) -> Result<(), FundError> {
        Self::require_active(env)?;
        if is_disabled(env) {
            return Err(FundError::FundManagerDisabled);
        }
        Ok(())
    }

    /// Both this manager and its fund controller must be disabled.
    fn require_maintenance_window(env: &Env) -> Result<(), FundError> {
        Self::require_active(env)?;
        if !is_disabled(env) || !Self::controller(env)?.is_fund_disabled() {
            return Err(FundError::FundEnabled);
        }
        Ok(())
    }

    /// A retired instance no longer mints shares and must stay shut.
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

    fn accepted_currency(env: &Env, code: &Symbol) -> Result<Currency, FundError> {
        if !read_accepted(env).get(code.clone()).unwrap_or(false) {
            return Err(FundError::CurrencyNotAccepted);
        }
        read_currency(env, code).map_err(|_| FundError::CurrencyNotAccepted)
    }

    fn share_ledger(env: &Env) -> Result<ShareLedgerClient<'_>, FundError> {
        Ok(ShareLedgerClient::new(env, &read_address(env, &DataKey::ShareToken)?))
    }

    fn controller(env: &Env) -> Result<ControllerClient<'_>, FundError> {
        Ok(ControllerClient::new(env, &read_address(env, &DataKey::FundController)?))
    }
}

mod test;
