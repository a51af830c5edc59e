#![cfg(test)]
extern crate std;

use super::*;
use fund_common::testutils::{MockPool, MockPoolClient, MockPriceOracle, MockPriceOracleClient};
use fund_common::Pool;
use fund_controller::{FundController, FundControllerClient};
use fund_token::{FundToken, FundTokenClient};
use soroban_sdk::{
    testutils::{Address as _, Events},
    token::StellarAssetClient,
    vec, Bytes, IntoVal, String, TryFromVal, Val,
};

const DOLLAR: i128 = 10_000_000; // $1 and one share, 7 decimals
const TOKEN: i128 = 10_000_000; // one whole unit at 7 decimals

struct Fund<'a> {
    env: Env,
    manager: FundManagerClient<'a>,
    controller: FundControllerClient<'a>,
    shares: FundTokenClient<'a>,
    oracle: MockPriceOracleClient<'a>,
    pool: MockPoolClient<'a>,
    owner: Address,
    rebalancer: Address,
    usdc: Currency,
    dai: Currency,
}

fn create_currency(env: &Env, code: Symbol) -> Currency {
    let issuer = Address::generate(env);
    Currency {
        code,
        decimals: 7,
        token: env.register_stellar_asset_contract(issuer),
    }
}

fn register_manager<'a>(
    env: &Env,
    owner: &Address,
    rebalancer: &Address,
    shares: &Address,
    controller: &Address,
    oracle: &Address,
) -> FundManagerClient<'a> {
    let manager = FundManagerClient::new(env, &env.register_contract(None, FundManager));
    manager.initialize(owner, rebalancer, shares, controller, oracle);
    manager
}

fn register_controller<'a>(
    env: &Env,
    owner: &Address,
    rebalancer: &Address,
    fund_manager: &Address,
) -> FundControllerClient<'a> {
    let controller = FundControllerClient::new(env, &env.register_contract(None, FundController));
    controller.initialize(owner, rebalancer, fund_manager);
    controller
}

/// A complete fund: USDC and DAI accepted at $1, one pool taking both.
fn setup_fund<'a>() -> Fund<'a> {
    let env = Env::default();
    env.mock_all_auths();
    env.budget().reset_unlimited();

    let owner = Address::generate(&env);
    let rebalancer = Address::generate(&env);

    let manager_id = env.register_contract(None, FundManager);
    let shares = FundTokenClient::new(&env, &env.register_contract(None, FundToken));
    shares.initialize(
        &owner,
        &manager_id,
        &String::from_str(&env, "Stable Pool Share"),
        &String::from_str(&env, "RSPT"),
    );
    let controller = register_controller(&env, &owner, &rebalancer, &manager_id);
    let oracle = MockPriceOracleClient::new(&env, &env.register_contract(None, MockPriceOracle));
    let pool = MockPoolClient::new(&env, &env.register_contract(None, MockPool));

    let manager = FundManagerClient::new(&env, &manager_id);
    manager.initialize(
        &owner,
        &rebalancer,
        &shares.address,
        &controller.address,
        &oracle.address,
    );

    let usdc = create_currency(&env, symbol_short!("USDC"));
    let dai = create_currency(&env, symbol_short!("DAI"));
    for currency in [&usdc, &dai] {
        controller.add_currency(&owner, currency);
        manager.add_currency(&owner, currency, &true);
        oracle.set_price(&currency.code, &DOLLAR);
    }
    controller.add_pool(
        &owner,
        &Pool {
            id: 0,
            adapter: pool.address.clone(),
            currencies: vec![&env, usdc.code.clone(), dai.code.clone()],
        },
    );

    Fund {
        env,
        manager,
        controller,
        shares,
        oracle,
        pool,
        owner,
        rebalancer,
        usdc,
        dai,
    }
}

fn mint(env: &Env, currency: &Currency, to: &Address, amount: i128) {
    StellarAssetClient::new(env, &currency.token).mint(to, &amount);
}

impl<'a> Fund<'a> {
    fn balance(&self, currency: &Currency, account: &Address) -> i128 {
        token::Client::new(&self.env, &currency.token).balance(account)
    }

    fn approve(&self, currency: &Currency, user: &Address, amount: i128) {
        let expiration_ledger = self.env.ledger().sequence() + 100;
        token::Client::new(&self.env, &currency.token).approve(
            user,
            &self.manager.address,
            &amount,
            &expiration_ledger,
        );
    }

    /// Mints `amount` to a fresh depositor, deposits it and returns the depositor.
    fn depositor(&self, currency: &Currency, amount: i128) -> Address {
        let user = Address::generate(&self.env);
        mint(&self.env, currency, &user, amount);
        self.approve(currency, &user, amount);
        self.manager.deposit(&user, &currency.code, &amount);
        user
    }

    /// Idle yield: currency lands in the controller without a deposit.
    fn accrue_idle(&self, currency: &Currency, amount: i128) {
        mint(&self.env, currency, &self.controller.address, amount);
    }

    fn deploy(&self, currency: &Currency, amount: i128) {
        self.controller
            .approve_to_pool(&self.rebalancer, &0, &currency.code, &amount);
        self.controller
            .deposit_to_pool(&self.rebalancer, &0, &currency.code, &amount);
    }

    fn close_gates(&self) {
        self.manager.disable_fund(&self.owner);
        self.controller.disable_fund(&self.owner);
    }
}

// ============================================================================
// DEPOSIT AND WITHDRAW
// ============================================================================

#[test]
fn test_initialize_twice_fails() {
    let fund = setup_fund();
    let result = fund.manager.try_initialize(
        &fund.owner,
        &fund.rebalancer,
        &fund.shares.address,
        &fund.controller.address,
        &fund.oracle.address,
    );
    assert_eq!(result, Err(Ok(FundError::AlreadyInitialized)));
    assert_eq!(fund.manager.get_version(), 1);
    assert_eq!(fund.manager.get_share_token(), fund.shares.address);
}

#[test]
fn test_first_deposit_mints_one_share_per_dollar() {
    let fund = setup_fund();
    let user = fund.depositor(&fund.usdc, 100 * TOKEN);

    assert_eq!(fund.shares.balance(&user), 100 * DOLLAR);
    assert_eq!(fund.shares.total_supply(), 100 * DOLLAR);
    assert_eq!(fund.manager.balance_of(&user), 100 * DOLLAR);
    assert_eq!(fund.manager.get_fund_balance(), 100 * DOLLAR);
    assert_eq!(fund.manager.get_net_deposits(), 100 * DOLLAR);

    // the currency sits idle in the controller
    assert_eq!(fund.balance(&fund.usdc, &user), 0);
    assert_eq!(fund.controller.get_idle_balance(&fund.usdc.code), 100 * TOKEN);
    assert_eq!(fund.manager.get_raw_currency_balance(&fund.usdc.code), 100 * TOKEN);
}

#[test]
fn test_deposit_emits_flow_event() {
    let fund = setup_fund();
    let user = fund.depositor(&fund.dai, 5 * TOKEN);

    let deposit_topics: soroban_sdk::Vec<Val> = (symbol_short!("deposit"),).into_val(&fund.env);
    let deposits: std::vec::Vec<_> = fund
        .env
        .events()
        .all()
        .iter()
        .filter(|e| e.0 == fund.manager.address && e.1 == deposit_topics)
        .collect();
    assert_eq!(deposits.len(), 1);

    let event = FundFlowEvent::try_from_val(&fund.env, &deposits[0].2).unwrap();
    assert_eq!(
        event,
        FundFlowEvent {
            account: user,
            code: fund.dai.code.clone(),
            amount: 5 * TOKEN,
            usd: 5 * DOLLAR,
            shares: 5 * DOLLAR,
        }
    );
}

#[test]
fn test_deposit_after_yield_mints_fewer_shares() {
    let fund = setup_fund();
    let early = fund.depositor(&fund.usdc, 100 * TOKEN);
    fund.accrue_idle(&fund.usdc, TOKEN);
    assert_eq!(fund.manager.get_fund_balance(), 101 * DOLLAR);

    let late = fund.depositor(&fund.usdc, TOKEN);

    // ⌊$1 × 100 shares / $101⌋
    assert_eq!(fund.shares.balance(&late), 9_900_990);
    assert_eq!(fund.manager.balance_of(&early), 101 * DOLLAR);
    // rounding never hands the late depositor more than they brought
    assert_eq!(fund.manager.balance_of(&late), DOLLAR - 1);
}

#[test]
fn test_deposit_is_priced_by_the_oracle() {
    let fund = setup_fund();
    fund.oracle.set_price(&fund.dai.code, &(DOLLAR * 99 / 100));

    let user = fund.depositor(&fund.dai, 100 * TOKEN);

    assert_eq!(fund.shares.balance(&user), 99 * DOLLAR);
    assert_eq!(
        fund.manager.get_currency_prices_in_usd(),
        soroban_sdk::map![
            &fund.env,
            (fund.dai.code.clone(), DOLLAR * 99 / 100),
            (fund.usdc.code.clone(), DOLLAR)
        ]
    );
}

#[test]
fn test_deposit_rejections() {
    let fund = setup_fund();
    let user = Address::generate(&fund.env);
    mint(&fund.env, &fund.usdc, &user, 10 * TOKEN);

    fund.approve(&fund.usdc, &user, 5 * TOKEN);
    assert_eq!(
        fund.manager.try_deposit(&user, &fund.usdc.code, &(10 * TOKEN)),
        Err(Ok(FundError::InsufficientAllowance))
    );
    assert_eq!(
        fund.manager.try_deposit(&user, &fund.usdc.code, &0),
        Err(Ok(FundError::InvalidAmount))
    );
    assert_eq!(
        fund.manager.try_deposit(&user, &symbol_short!("EURC"), &TOKEN),
        Err(Ok(FundError::CurrencyNotAccepted))
    );

    fund.manager.set_accepted_currencies(
        &fund.rebalancer,
        &vec![&fund.env, fund.usdc.code.clone()],
        &vec![&fund.env, false],
    );
    assert_eq!(
        fund.manager.try_deposit(&user, &fund.usdc.code, &TOKEN),
        Err(Ok(FundError::CurrencyNotAccepted))
    );

    fund.oracle.set_price(&fund.dai.code, &0);
    mint(&fund.env, &fund.dai, &user, TOKEN);
    fund.approve(&fund.dai, &user, TOKEN);
    assert_eq!(
        fund.manager.try_deposit(&user, &fund.dai.code, &TOKEN),
        Err(Ok(FundError::InvalidPrice))
    );

    // nothing left the depositor
    assert_eq!(fund.balance(&fund.usdc, &user), 10 * TOKEN);
    assert_eq!(fund.shares.total_supply(), 0);
}

#[test]
fn test_withdraw_burns_shares_and_lowers_balance() {
    let fund = setup_fund();
    let user = fund.depositor(&fund.usdc, 100 * TOKEN);
    let balance_before = fund.manager.balance_of(&user);

    let burned = fund.manager.withdraw(&user, &fund.usdc.code, &(40 * TOKEN));

    assert_eq!(burned, 40 * DOLLAR);
    assert_eq!(fund.shares.balance(&user), 60 * DOLLAR);
    assert_eq!(fund.balance(&fund.usdc, &user), 40 * TOKEN);
    assert!(fund.manager.balance_of(&user) < balance_before);
    assert_eq!(fund.manager.balance_of(&user), 60 * DOLLAR);
    assert_eq!(fund.manager.get_net_deposits(), 60 * DOLLAR);
}

#[test]
fn test_withdraw_in_another_currency() {
    let fund = setup_fund();
    let usdc_user = fund.depositor(&fund.usdc, 50 * TOKEN);
    fund.depositor(&fund.dai, 50 * TOKEN);

    fund.manager.withdraw(&usdc_user, &fund.dai.code, &(20 * TOKEN));

    assert_eq!(fund.balance(&fund.dai, &usdc_user), 20 * TOKEN);
    assert_eq!(fund.manager.balance_of(&usdc_user), 30 * DOLLAR);
}

#[test]
fn test_withdraw_rejections() {
    let fund = setup_fund();
    let user = fund.depositor(&fund.usdc, 100 * TOKEN);
    let stranger = Address::generate(&fund.env);

    assert_eq!(
        fund.manager.try_withdraw(&stranger, &fund.usdc.code, &TOKEN),
        Err(Ok(FundError::InsufficientShares))
    );
    assert_eq!(
        fund.manager.try_withdraw(&user, &fund.usdc.code, &(101 * TOKEN)),
        Err(Ok(FundError::InsufficientShares))
    );
    assert_eq!(
        fund.manager.try_withdraw(&user, &symbol_short!("EURC"), &TOKEN),
        Err(Ok(FundError::UnknownCurrency))
    );

    // deployed balances are not drawn on
    fund.deploy(&fund.usdc, 80 * TOKEN);
    assert_eq!(
        fund.manager.try_withdraw(&user, &fund.usdc.code, &(50 * TOKEN)),
        Err(Ok(FundError::InsufficientLiquidity))
    );
    assert_eq!(fund.shares.balance(&user), 100 * DOLLAR);
    assert_eq!(fund.manager.get_raw_fund_balance(), 100 * DOLLAR);
}

// ============================================================================
// SAFETY GATES AND ROLES
// ============================================================================

#[test]
fn test_disabled_manager_blocks_deposits_and_withdrawals_until_reenabled() {
    let fund = setup_fund();
    let user = fund.depositor(&fund.usdc, 10 * TOKEN);
    mint(&fund.env, &fund.usdc, &user, TOKEN);
    fund.approve(&fund.usdc, &user, TOKEN);

    fund.manager.disable_fund(&fund.rebalancer);
    assert!(fund.manager.is_fund_disabled());
    assert_eq!(
        fund.manager.try_deposit(&user, &fund.usdc.code, &TOKEN),
        Err(Ok(FundError::FundManagerDisabled))
    );
    assert_eq!(
        fund.manager.try_withdraw(&user, &fund.usdc.code, &TOKEN),
        Err(Ok(FundError::FundManagerDisabled))
    );
    // reads stay available
    assert_eq!(fund.manager.balance_of(&user), 10 * DOLLAR);

    fund.manager.enable_fund(&fund.rebalancer);
    fund.manager.deposit(&user, &fund.usdc.code, &TOKEN);
    fund.manager.withdraw(&user, &fund.usdc.code, &TOKEN);
    assert_eq!(fund.manager.balance_of(&user), 10 * DOLLAR);
}

#[test]
fn test_gates_are_independent() {
    let fund = setup_fund();
    let user = fund.depositor(&fund.usdc, 10 * TOKEN);

    // a closed controller gate still lets depositors in and out
    fund.controller.disable_fund(&fund.owner);
    fund.manager.withdraw(&user, &fund.usdc.code, &TOKEN);
    assert_eq!(fund.balance(&fund.usdc, &user), TOKEN);

    // a closed manager gate still lets the rebalancer allocate
    fund.controller.enable_fund(&fund.owner);
    fund.manager.disable_fund(&fund.owner);
    fund.deploy(&fund.usdc, 5 * TOKEN);
    assert_eq!(fund.controller.get_pool_balance(&0, &fund.usdc.code), 5 * TOKEN);
}

#[test]
fn test_gate_toggles_are_idempotent_and_restricted() {
    let fund = setup_fund();
    let stranger = Address::generate(&fund.env);

    fund.manager.enable_fund(&fund.owner);
    assert!(!fund.manager.is_fund_disabled());
    fund.manager.disable_fund(&fund.owner);
    fund.manager.disable_fund(&fund.rebalancer);
    assert!(fund.manager.is_fund_disabled());

    assert_eq!(
        fund.manager.try_enable_fund(&stranger),
        Err(Ok(FundError::Unauthorized))
    );
    assert!(fund.manager.is_fund_disabled());
}

#[test]
fn test_rebalancer_sets_accepted_currencies() {
    let fund = setup_fund();
    let stranger = Address::generate(&fund.env);

    fund.manager.set_accepted_currencies(
        &fund.rebalancer,
        &vec![&fund.env, fund.dai.code.clone()],
        &vec![&fund.env, false],
    );
    assert!(!fund.manager.is_currency_accepted(&fund.dai.code));
    assert!(fund.manager.is_currency_accepted(&fund.usdc.code));
    assert_eq!(
        fund.manager.get_accepted_currencies(),
        vec![&fund.env, fund.usdc.code.clone()]
    );

    assert_eq!(
        fund.manager.try_set_accepted_currencies(
            &fund.rebalancer,
            &vec![&fund.env, fund.dai.code.clone(), fund.usdc.code.clone()],
            &vec![&fund.env, true],
        ),
        Err(Ok(FundError::LengthMismatch))
    );
    assert_eq!(
        fund.manager.try_set_accepted_currencies(
            &fund.rebalancer,
            &vec![&fund.env, fund.dai.code.clone(), symbol_short!("EURC")],
            &vec![&fund.env, true, true],
        ),
        Err(Ok(FundError::UnknownCurrency))
    );
    assert!(!fund.manager.is_currency_accepted(&fund.dai.code));

    assert_eq!(
        fund.manager.try_set_accepted_currencies(
            &stranger,
            &vec![&fund.env, fund.dai.code.clone()],
            &vec![&fund.env, true],
        ),
        Err(Ok(FundError::Unauthorized))
    );

    // operational only
    let result = fund
        .manager
        .try_transfer_ownership(&fund.rebalancer, &fund.rebalancer);
    assert_eq!(result, Err(Ok(FundError::Unauthorized)));
    let result = fund.manager.try_set_interest_fee_rate(&fund.rebalancer, &1_000);
    assert_eq!(result, Err(Ok(FundError::Unauthorized)));
}

#[test]
fn test_transfer_ownership_is_a_full_handoff() {
    let fund = setup_fund();
    let new_owner = Address::generate(&fund.env);

    fund.manager.transfer_ownership(&fund.owner, &new_owner);
    assert_eq!(fund.manager.get_owner(), new_owner);

    let result = fund.manager.try_set_interest_fee_rate(&fund.owner, &500);
    assert_eq!(result, Err(Ok(FundError::Unauthorized)));
    let result = fund.manager.try_disable_fund(&fund.owner);
    assert_eq!(result, Err(Ok(FundError::Unauthorized)));

    fund.manager.set_interest_fee_rate(&new_owner, &500);
    fund.manager.transfer_ownership(&new_owner, &fund.owner);
    assert_eq!(fund.manager.get_owner(), fund.owner);
    assert_eq!(fund.manager.get_interest_fee_rate(), 500);
}

#[test]
fn test_owner_rewires_collaborators() {
    let fund = setup_fund();
    let new_rebalancer = Address::generate(&fund.env);
    let new_oracle = MockPriceOracleClient::new(
        &fund.env,
        &fund.env.register_contract(None, MockPriceOracle),
    );
    new_oracle.set_price(&fund.usdc.code, &(2 * DOLLAR));
    new_oracle.set_price(&fund.dai.code, &DOLLAR);
    fund.depositor(&fund.usdc, 10 * TOKEN);

    fund.manager.set_fund_rebalancer(&fund.owner, &new_rebalancer);
    fund.manager.set_price_oracle(&fund.owner, &new_oracle.address);

    assert_eq!(fund.manager.get_rebalancer(), new_rebalancer);
    assert_eq!(fund.manager.get_price_oracle(), new_oracle.address);
    assert_eq!(fund.manager.get_fund_balance(), 20 * DOLLAR);
    assert_eq!(
        fund.manager.try_disable_fund(&fund.rebalancer),
        Err(Ok(FundError::Unauthorized))
    );
}

#[test]
fn test_add_currency_must_match_the_controller() {
    let fund = setup_fund();
    let usdt = create_currency(&fund.env, symbol_short!("USDT"));
    fund.oracle.set_price(&usdt.code, &DOLLAR);

    assert_eq!(
        fund.manager.try_add_currency(&fund.owner, &usdt, &true),
        Err(Ok(FundError::UnknownCurrency))
    );

    fund.controller.add_currency(&fund.owner, &usdt);
    let other_token = Currency {
        token: create_currency(&fund.env, symbol_short!("USDT")).token,
        ..usdt.clone()
    };
    assert_eq!(
        fund.manager.try_add_currency(&fund.owner, &other_token, &true),
        Err(Ok(FundError::CurrencyMismatch))
    );
    let other_decimals = Currency { decimals: 6, ..usdt.clone() };
    assert_eq!(
        fund.manager.try_add_currency(&fund.owner, &other_decimals, &true),
        Err(Ok(FundError::CurrencyMismatch))
    );
    assert_eq!(fund.manager.get_currencies().len(), 2);

    fund.manager.add_currency(&fund.owner, &usdt, &false);
    assert_eq!(fund.manager.get_currencies().len(), 3);
    assert!(!fund.manager.is_currency_accepted(&usdt.code));
}

// ============================================================================
// INTEREST FEES
// ============================================================================

#[test]
fn test_interest_fees_come_out_of_yield_only() {
    let fund = setup_fund();
    fund.manager.set_interest_fee_rate(&fund.owner, &2_000);
    fund.depositor(&fund.usdc, 100 * TOKEN);
    assert_eq!(fund.manager.get_interest_fees_unclaimed(), 0);

    fund.accrue_idle(&fund.usdc, 10 * TOKEN);
    assert_eq!(fund.manager.get_raw_fund_balance(), 110 * DOLLAR);
    assert_eq!(fund.manager.get_interest_accrued(), 10 * DOLLAR);
    assert_eq!(fund.manager.get_interest_fees_unclaimed(), 2 * DOLLAR);
    assert_eq!(fund.manager.get_fund_balance(), 108 * DOLLAR);

    let treasury = Address::generate(&fund.env);
    assert_eq!(
        fund.manager
            .try_withdraw_interest_fees(&fund.owner, &fund.usdc.code, &(3 * TOKEN), &treasury),
        Err(Ok(FundError::InvalidAmount))
    );
    assert_eq!(
        fund.manager
            .try_withdraw_interest_fees(&fund.rebalancer, &fund.usdc.code, &TOKEN, &treasury),
        Err(Ok(FundError::Unauthorized))
    );

    fund.manager
        .withdraw_interest_fees(&fund.owner, &fund.usdc.code, &(2 * TOKEN), &treasury);

    assert_eq!(fund.balance(&fund.usdc, &treasury), 2 * TOKEN);
    assert_eq!(fund.manager.get_interest_fees_claimed(), 2 * DOLLAR);
    assert_eq!(fund.manager.get_interest_fees_unclaimed(), 0);
    assert_eq!(fund.manager.get_interest_accrued(), 10 * DOLLAR);
    // depositors are not charged for the payout
    assert_eq!(fund.manager.get_fund_balance(), 108 * DOLLAR);
}

#[test]
fn test_interest_fee_rate_is_bounded() {
    let fund = setup_fund();
    assert_eq!(
        fund.manager.try_set_interest_fee_rate(&fund.owner, &10_001),
        Err(Ok(FundError::InvalidFeeRate))
    );
    fund.manager.set_interest_fee_rate(&fund.owner, &10_000);
    assert_eq!(fund.manager.get_interest_fee_rate(), 10_000);
}

// ============================================================================
// UPGRADES
// ============================================================================

#[test]
fn test_in_place_upgrade_requires_owner_and_both_gates_closed() {
    let fund = setup_fund();
    let wasm_hash = BytesN::from_array(&fund.env, &[7; 32]);

    assert_eq!(
        fund.manager.try_upgrade(&fund.rebalancer, &wasm_hash),
        Err(Ok(FundError::Unauthorized))
    );
    assert_eq!(
        fund.manager.try_upgrade(&fund.owner, &wasm_hash),
        Err(Ok(FundError::FundEnabled))
    );

    fund.manager.disable_fund(&fund.owner);
    assert_eq!(
        fund.manager.try_upgrade(&fund.owner, &wasm_hash),
        Err(Ok(FundError::FundEnabled))
    );
    assert_eq!(fund.manager.get_version(), 1);
}

#[test]
fn test_in_place_upgrade_keeps_shares_and_valuation() {
    let fund = setup_fund();
    fund.manager.set_interest_fee_rate(&fund.owner, &1_000);
    let alice = fund.depositor(&fund.usdc, 100 * TOKEN);
    let bob = fund.depositor(&fund.dai, 50 * TOKEN);
    fund.deploy(&fund.usdc, 60 * TOKEN);
    fund.accrue_idle(&fund.usdc, 10 * TOKEN);

    let fund_before = fund.manager.get_fund_balance();
    let raw_before = fund.manager.get_raw_fund_balance();
    let alice_shares = fund.shares.balance(&alice);
    let bob_shares = fund.shares.balance(&bob);
    let alice_value = fund.manager.balance_of(&alice);
    let supply = fund.shares.total_supply();
    assert_eq!(fund_before, 159 * DOLLAR);

    fund.close_gates();
    let wasm_hash = fund.env.deployer().upload_contract_wasm(Bytes::new(&fund.env));
    fund.manager.upgrade(&fund.owner, &wasm_hash);
    // same address, new code
    fund.env.register_contract(Some(&fund.manager.address), FundManager);

    assert_eq!(fund.manager.get_version(), 2);
    assert_eq!(fund.manager.get_successor(), None);
    assert_eq!(fund.manager.get_fund_balance(), fund_before);
    assert_eq!(fund.manager.get_raw_fund_balance(), raw_before);
    assert_eq!(fund.manager.get_interest_fees_unclaimed(), DOLLAR);
    assert_eq!(fund.manager.get_interest_fee_rate(), 1_000);
    assert_eq!(fund.shares.balance(&alice), alice_shares);
    assert_eq!(fund.shares.balance(&bob), bob_shares);
    assert_eq!(fund.shares.total_supply(), supply);
    assert_eq!(fund.manager.balance_of(&alice), alice_value);
    assert_eq!(fund.shares.minter(), fund.manager.address);
    assert_eq!(fund.controller.get_fund_manager(), fund.manager.address);

    // the same address keeps serving depositors
    fund.manager.enable_fund(&fund.owner);
    fund.manager.withdraw(&alice, &fund.usdc.code, &(10 * TOKEN));
    assert_eq!(fund.balance(&fund.usdc, &alice), 10 * TOKEN);
}

#[test]
fn test_manager_migration_requires_closed_gates_and_authorization() {
    let fund = setup_fund();
    fund.depositor(&fund.usdc, 10 * TOKEN);
    let successor = register_manager(
        &fund.env,
        &fund.owner,
        &fund.rebalancer,
        &fund.shares.address,
        &fund.controller.address,
        &fund.oracle.address,
    );

    fund.manager.disable_fund(&fund.owner);
    assert_eq!(
        fund.manager
            .try_upgrade_fund_manager(&fund.owner, &successor.address),
        Err(Ok(FundError::FundEnabled))
    );

    fund.controller.disable_fund(&fund.owner);
    assert_eq!(
        fund.manager
            .try_upgrade_fund_manager(&fund.owner, &successor.address),
        Err(Ok(FundError::DataSourceNotAuthorized))
    );
    assert_eq!(
        fund.manager
            .try_upgrade_fund_manager(&fund.rebalancer, &successor.address),
        Err(Ok(FundError::Unauthorized))
    );

    // nothing moved
    assert_eq!(fund.shares.minter(), fund.manager.address);
    assert_eq!(successor.get_currencies().len(), 0);
    assert_eq!(successor.get_net_deposits(), 0);
}

#[test]
fn test_manager_migration_preserves_shares_and_balances() {
    let fund = setup_fund();
    fund.manager.set_interest_fee_rate(&fund.owner, &1_000);
    let alice = fund.depositor(&fund.usdc, 100 * TOKEN);
    let bob = fund.depositor(&fund.dai, 50 * TOKEN);
    fund.deploy(&fund.usdc, 60 * TOKEN);
    fund.accrue_idle(&fund.usdc, 10 * TOKEN);
    fund.manager.set_accepted_currencies(
        &fund.owner,
        &vec![&fund.env, fund.dai.code.clone()],
        &vec![&fund.env, false],
    );

    let raw_before = fund.manager.get_raw_fund_balance();
    let fund_before = fund.manager.get_fund_balance();
    let alice_shares = fund.shares.balance(&alice);
    let bob_shares = fund.shares.balance(&bob);
    let supply = fund.shares.total_supply();
    assert_eq!(fund_before, 159 * DOLLAR);

    let successor = register_manager(
        &fund.env,
        &fund.owner,
        &fund.rebalancer,
        &fund.shares.address,
        &fund.controller.address,
        &fund.oracle.address,
    );
    successor.authorize_data_source(&fund.owner, &Some(fund.manager.address.clone()));
    fund.close_gates();

    fund.manager.upgrade_fund_manager(&fund.owner, &successor.address);

    assert_eq!(fund.shares.minter(), successor.address);
    assert_eq!(fund.shares.balance(&alice), alice_shares);
    assert_eq!(fund.shares.balance(&bob), bob_shares);
    assert_eq!(fund.shares.total_supply(), supply);
    assert!(successor.get_raw_fund_balance() >= raw_before);
    assert!(successor.get_fund_balance() >= fund_before);
    assert_eq!(successor.get_currencies(), fund.manager.get_currencies());
    assert_eq!(successor.get_accepted_currencies(), fund.manager.get_accepted_currencies());
    assert_eq!(successor.get_net_deposits(), fund.manager.get_net_deposits());
    assert_eq!(successor.get_interest_fee_rate(), 1_000);
    assert_eq!(successor.balance_of(&alice), fund.manager.balance_of(&alice));

    // the handoff is consumed and cannot be replayed
    let data = FundManagerData {
        currencies: fund.manager.get_currencies(),
        accepted: fund.manager.get_accepted_currencies(),
        net_deposits: fund.manager.get_net_deposits(),
        interest_fees_claimed: 0,
        interest_fee_rate: 1_000,
    };
    assert_eq!(
        successor.try_import_fund_manager_data(&data),
        Err(Ok(FundError::DataSourceNotAuthorized))
    );

    // the successor takes over deposits and withdrawals
    assert_eq!(fund.controller.get_fund_manager(), successor.address);
    fund.controller.enable_fund(&fund.owner);
    successor.withdraw(&alice, &fund.usdc.code, &(10 * TOKEN));
    assert_eq!(fund.balance(&fund.usdc, &alice), 10 * TOKEN);
    assert!(fund.shares.balance(&alice) < alice_shares);
}

#[test]
fn test_migrated_manager_cannot_pay_out_fees_twice() {
    let fund = setup_fund();
    fund.manager.set_interest_fee_rate(&fund.owner, &1_000);
    let alice = fund.depositor(&fund.usdc, 100 * TOKEN);
    fund.accrue_idle(&fund.usdc, 10 * TOKEN);
    assert_eq!(fund.manager.get_interest_fees_unclaimed(), DOLLAR);

    let successor = register_manager(
        &fund.env,
        &fund.owner,
        &fund.rebalancer,
        &fund.shares.address,
        &fund.controller.address,
        &fund.oracle.address,
    );
    successor.authorize_data_source(&fund.owner, &Some(fund.manager.address.clone()));
    fund.close_gates();
    fund.manager.upgrade_fund_manager(&fund.owner, &successor.address);

    assert_eq!(fund.manager.get_successor(), Some(successor.address.clone()));
    assert_eq!(fund.controller.get_fund_manager(), successor.address);

    // the old instance cannot be reopened
    assert_eq!(
        fund.manager.try_enable_fund(&fund.owner),
        Err(Ok(FundError::FundRetired))
    );
    assert_eq!(
        fund.manager.try_enable_fund(&fund.rebalancer),
        Err(Ok(FundError::FundRetired))
    );
    assert!(fund.manager.is_fund_disabled());

    // and moves no value even with the controller open again
    fund.controller.enable_fund(&fund.owner);
    let treasury = Address::generate(&fund.env);
    assert_eq!(
        fund.manager
            .try_withdraw_interest_fees(&fund.owner, &fund.usdc.code, &TOKEN, &treasury),
        Err(Ok(FundError::FundRetired))
    );
    assert_eq!(
        fund.manager.try_withdraw(&alice, &fund.usdc.code, &TOKEN),
        Err(Ok(FundError::FundRetired))
    );
    assert_eq!(
        fund.manager
            .try_upgrade_fund_manager(&fund.owner, &successor.address),
        Err(Ok(FundError::FundRetired))
    );
    assert_eq!(fund.balance(&fund.usdc, &treasury), 0);

    // the fee is claimed once, through the successor
    assert_eq!(successor.get_interest_fees_unclaimed(), DOLLAR);
    successor.withdraw_interest_fees(&fund.owner, &fund.usdc.code, &TOKEN, &treasury);
    assert_eq!(fund.balance(&fund.usdc, &treasury), TOKEN);
    assert_eq!(successor.get_interest_fees_unclaimed(), 0);
    assert_eq!(successor.get_interest_fees_claimed(), DOLLAR);
}

#[test]
fn test_controller_migration_keeps_fund_valuation() {
    let fund = setup_fund();
    let user = fund.depositor(&fund.usdc, 100 * TOKEN);
    fund.depositor(&fund.dai, 40 * TOKEN);
    fund.deploy(&fund.usdc, 60 * TOKEN);
    fund.deploy(&fund.dai, 40 * TOKEN);

    mint(&fund.env, &fund.usdc, &fund.pool.address, 5 * TOKEN);
    fund.pool
        .accrue(&fund.controller.address, &fund.usdc.token, &(5 * TOKEN));
    let fund_before = fund.manager.get_fund_balance();
    assert_eq!(fund_before, 145 * DOLLAR);

    let successor =
        register_controller(&fund.env, &fund.owner, &fund.rebalancer, &fund.manager.address);
    successor
        .authorize_data_source(&fund.owner, &Some(fund.controller.address.clone()));
    fund.controller.disable_fund(&fund.owner);
    fund.controller
        .upgrade_fund_controller(&fund.owner, &successor.address);
    fund.manager
        .set_fund_controller(&fund.owner, &successor.address);

    assert_eq!(fund.manager.get_fund_controller(), successor.address);
    assert!(fund.manager.get_fund_balance() >= fund_before);
    assert_eq!(successor.get_idle_balance(&fund.usdc.code), 105 * TOKEN);

    fund.manager.withdraw(&user, &fund.usdc.code, &(10 * TOKEN));
    assert_eq!(fund.balance(&fund.usdc, &user), 10 * TOKEN);
}
