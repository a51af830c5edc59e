use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env, Symbol};

/// Emitted as `deposit` and `withdraw`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundFlowEvent {
    pub account: Address,
    pub code: Symbol,
    /// Raw currency units moved
    pub amount: i128,
    /// USD value credited or debited
    pub usd: i128,
    /// Shares minted or burned
    pub shares: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GateEvent {
    pub caller: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleEvent {
    pub old: Address,
    pub new: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AcceptedEvent {
    pub code: Symbol,
    pub accepted: bool,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeesWithdrawnEvent {
    pub code: Symbol,
    pub amount: i128,
    pub usd: i128,
    pub to: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpgradeEvent {
    pub version: u32,
    pub wasm_hash: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MigrationEvent {
    pub successor: Address,
    pub raw_fund_balance: i128,
    pub fund_balance: i128,
}

pub fn flow(env: &Env, topic: Symbol, event: FundFlowEvent) {
    env.events().publish((topic,), event);
}

pub fn gate(env: &Env, disabled: bool, caller: Address) {
    let topic = if disabled {
        symbol_short!("disabled")
    } else {
        symbol_short!("enabled")
    };
    env.events().publish((topic,), GateEvent { caller });
}

pub fn role(env: &Env, topic: Symbol, old: Address, new: Address) {
    env.events().publish((topic,), RoleEvent { old, new });
}
