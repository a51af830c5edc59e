//! # Fund Share Ledger
//!
//! Tracks every depositor's share of the fund. Shares are minted and burned
//! only by the current fund manager (the *minter*); holders may transfer and
//! approve them like any token.
//!
//! The ledger deliberately knows nothing about USD values: the fund manager
//! converts between shares and value. This keeps the ledger stable across
//! fund manager migrations, which only move the minter role and never touch
//! a balance.
//!
//! ## Invariant
//!
//! `total_supply() == Σ balance(account)` after every operation.

#![no_std]

use soroban_sdk::{
    contract, contractimpl, contracttype, log, symbol_short, Address, BytesN, Env, String,
};

use fund_common::types::SHARE_DECIMALS;
use fund_common::FundError;

mod storage;

use storage::{
    read_address, read_allowance, read_balance, read_total_supply, spend_allowance,
    write_allowance, write_balance, write_total_supply, DataKey,
};

// ============================================================================
// EVENTS
// ============================================================================

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApproveEvent {
    pub from: Address,
    pub spender: Address,
    pub amount: i128,
    pub expiration_ledger: u32,
}

/// Emitted on mint (`symbol_short!("mint")`) and burn (`symbol_short!("burn")`).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SupplyEvent {
    pub account: Address,
    pub amount: i128,
    pub total_supply: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleEvent {
    pub old: Address,
    pub new: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpgradeEvent {
    pub version: u32,
    pub wasm_hash: BytesN<32>,
}

// ============================================================================
// CONTRACT
// ============================================================================

#[contract]
pub struct FundToken;

#[contractimpl]
impl FundToken {
    /// Sets up the ledger. `minter` is the fund manager that will issue shares.
    ///
    /// # Errors
    /// - `AlreadyInitialized` if called twice
    pub fn initialize(
        env: Env,
        owner: Address,
        minter: Address,
        name: String,
        symbol: String,
    ) -> Result<(), FundError> {
        if env.storage().instance().has(&DataKey::Owner) {
            return Err(FundError::AlreadyInitialized);
        }

        env.storage().instance().set(&DataKey::Owner, &owner);
        env.storage().instance().set(&DataKey::Minter, &minter);
        env.storage().instance().set(&DataKey::Name, &name);
        env.storage().instance().set(&DataKey::Symbol, &symbol);
        env.storage().instance().set(&DataKey::Version, &1_u32);
        write_total_supply(&env, 0);
        Ok(())
    }

    // ==========================================================================
    // TOKEN INTERFACE
    // ==========================================================================

    pub fn balance(env: Env, id: Address) -> i128 {
        read_balance(&env, &id)
    }

    pub fn total_supply(env: Env) -> i128 {
        read_total_supply(&env)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        read_allowance(&env, &from, &spender)
    }

    pub fn approve(
        env: Env,
        from: Address,
        spender: Address,
        amount: i128,
        expiration_ledger: u32,
    ) -> Result<(), FundError> {
        from.require_auth();

        if amount < 0 || (amount > 0 && expiration_ledger < env.ledger().sequence()) {
            return Err(FundError::InvalidAmount);
        }
        write_allowance(&env, &from, &spender, amount, expiration_ledger);

        env.events().publish(
            (symbol_short!("approve"),),
            ApproveEvent { from, spender, amount, expiration_ledger },
        );
        Ok(())
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) -> Result<(), FundError> {
        from.require_auth();
        Self::move_shares(&env, from, to, amount)
    }

    pub fn transfer_from(
        env: Env,
        spender: Address,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), FundError> {
        spender.require_auth();

        let allowance = read_allowance(&env, &from, &spender);
        if allowance < amount {
            return Err(FundError::InsufficientAllowance);
        }
        if amount > 0 {
            spend_allowance(&env, &from, &spender, amount);
        }
        Self::move_shares(&env, from, to, amount)
    }

    pub fn decimals(_env: Env) -> u32 {
        SHARE_DECIMALS
    }

    pub fn name(env: Env) -> Result<String, FundError> {
        env.storage()
            .instance()
            .get(&DataKey::Name)
            .ok_or(FundError::NotInitialized)
    }

    pub fn symbol(env: Env) -> Result<String, FundError> {
        env.storage()
            .instance()
            .get(&DataKey::Symbol)
            .ok_or(FundError::NotInitialized)
    }

    // ==========================================================================
    // FUND MANAGER ENTRY POINTS
    // ==========================================================================

    /// Issues `amount` new shares to `to`. Minter only.
    pub fn mint(env: Env, to: Address, amount: i128) -> Result<(), FundError> {
        read_address(&env, &DataKey::Minter)?.require_auth();
        if amount <= 0 {
            return Err(FundError::InvalidAmount);
        }

        let balance = read_balance(&env, &to);
        let total_supply = read_total_supply(&env)
            .checked_add(amount)
            .ok_or(FundError::ArithmeticOverflow)?;
        write_balance(&env, &to, balance + amount);
        write_total_supply(&env, total_supply);

        env.events().publish(
            (symbol_short!("mint"),),
            SupplyEvent { account: to, amount, total_supply },
        );
        Ok(())
    }

    /// Destroys `amount` of `from`'s shares on redemption. Minter only.
    pub fn burn_from_fund(env: Env, from: Address, amount: i128) -> Result<(), FundError> {
        read_address(&env, &DataKey::Minter)?.require_auth();
        if amount <= 0 {
            return Err(FundError::InvalidAmount);
        }

        let balance = read_balance(&env, &from);
        if balance < amount {
            return Err(FundError::InsufficientShares);
        }
        let total_supply = read_total_supply(&env) - amount;
        write_balance(&env, &from, balance - amount);
        write_total_supply(&env, total_supply);

        env.events().publish(
            (symbol_short!("burn"),),
            SupplyEvent { account: from, amount, total_supply },
        );
        Ok(())
    }

    // ==========================================================================
    // ADMINISTRATIVE
    // ==========================================================================

    /// Hands minting to a new fund manager.
    ///
    /// Callable by the owner or by the current minter, so a fund manager can
    /// pass the role to its successor during migration.
    pub fn set_minter(env: Env, caller: Address, new_minter: Address) -> Result<(), FundError> {
        caller.require_auth();
        let owner = read_address(&env, &DataKey::Owner)?;
        let minter = read_address(&env, &DataKey::Minter)?;
        if caller != owner && caller != minter {
            log!(&env, "set_minter rejected for {}", caller);
            return Err(FundError::Unauthorized);
        }

        env.storage().instance().set(&DataKey::Minter, &new_minter);
        env.events().publish(
            (symbol_short!("minter"),),
            RoleEvent { old: minter, new: new_minter },
        );
        Ok(())
    }

    pub fn transfer_ownership(
        env: Env,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), FundError> {
        let owner = Self::require_owner(&env, &caller)?;
        env.storage().instance().set(&DataKey::Owner, &new_owner);
        env.events().publish(
            (symbol_short!("owner"),),
            RoleEvent { old: owner, new: new_owner },
        );
        Ok(())
    }

    /// Replaces the ledger's code in place. Balances, allowances and roles are
    /// kept in storage and survive untouched.
    pub fn upgrade(env: Env, caller: Address, new_wasm_hash: BytesN<32>) -> Result<(), FundError> {
        Self::require_owner(&env, &caller)?;

        let version = Self::version(env.clone()) + 1;
        env.storage().instance().set(&DataKey::Version, &version);
        env.events().publish(
            (symbol_short!("upgrade"),),
            UpgradeEvent { version, wasm_hash: new_wasm_hash.clone() },
        );
        env.deployer().update_current_contract_wasm(new_wasm_hash);
        Ok(())
    }

    pub fn owner(env: Env) -> Result<Address, FundError> {
        read_address(&env, &DataKey::Owner)
    }

    pub fn minter(env: Env) -> Result<Address, FundError> {
        read_address(&env, &DataKey::Minter)
    }

    pub fn version(env: Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::Version)
            .unwrap_or(1)
    }
}

impl FundToken {
    fn require_owner(env: &Env, caller: &Address) -> Result<Address, FundError> {
        caller.require_auth();
        let owner = read_address(env, &DataKey::Owner)?;
        if *caller != owner {
            return Err(FundError::Unauthorized);
        }
        Ok(owner)
    }

    fn move_shares(env: &Env, from: Address, to: Address, amount: i128) -> Result<(), FundError> {
        if amount < 0 {
            return Err(FundError::InvalidAmount);
        }
        let from_balance = read_balance(env, &from);
        if from_balance < amount {
            return Err(FundError::InsufficientShares);
        }
        write_balance(env, &from, from_balance - amount);
        write_balance(env, &to, read_balance(env, &to) + amount);

        env.events().publish(
            (symbol_short!("transfer"),),
            TransferEvent { from, to, amount },
        );
        Ok(())
    }
}
