use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env, Symbol};

/// Emitted when the safety gate is closed (`disabled`) or opened (`enabled`).
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GateEvent {
    pub caller: Address,
}

/// Emitted for `pool_appr`, `pool_dep` and `pool_wd`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolEvent {
    pub pool_id: u32,
    pub code: Symbol,
    pub amount: i128,
}

/// Emitted for every role or collaborator reassignment.
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

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MigrationEvent {
    pub successor: Address,
    pub positions_unwound: u32,
}

pub fn gate(env: &Env, disabled: bool, caller: Address) {
    let topic = if disabled {
        symbol_short!("disabled")
    } else {
        symbol_short!("enabled")
    };
    env.events().publish((topic,), GateEvent { caller });
}

pub fn pool(env: &Env, topic: Symbol, pool_id: u32, code: Symbol, amount: i128) {
    env.events()
        .publish((topic,), PoolEvent { pool_id, code, amount });
}

pub fn role(env: &Env, topic: Symbol, old: Address, new: Address) {
    env.events().publish((topic,), RoleEvent { old, new });
}
