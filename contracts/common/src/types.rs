use soroban_sdk::{contracttype, Address, Symbol, Vec};

// ============================================================================
// STATIC BOUNDS
// ============================================================================

/// Decimal places of USD values and oracle prices.
pub const USD_DECIMALS: u32 = 7;

/// Decimal places of fund shares. Equal to [`USD_DECIMALS`] so the bootstrap
/// exchange rate is exactly one share per dollar.
pub const SHARE_DECIMALS: u32 = USD_DECIMALS;

/// Maximum number of currencies a fund contract may register.
pub const MAX_CURRENCIES: u32 = 8;

/// Maximum number of pools the fund controller may register.
///
/// Together with [`MAX_CURRENCIES`] this caps a full controller migration at
/// 64 pool positions, which keeps it inside [`UPGRADE_CPU_INSTRUCTION_CEILING`].
pub const MAX_POOLS: u32 = 8;

/// Interest fee rates are expressed in basis points.
pub const MAX_INTEREST_FEE_RATE_BPS: u32 = 10_000;

/// Lifetime, in ledgers, of the allowance granted to a pool adapter (~1 day).
pub const APPROVAL_LEDGERS: u32 = 17_280;

/// CPU instruction ceiling a controller upgrade must stay within, even with
/// live positions in every pool for every currency.
pub const UPGRADE_CPU_INSTRUCTION_CEILING: u64 = 100_000_000;

// ============================================================================
// REGISTRIES
// ============================================================================

/// An accepted currency. `code` is unique and `decimals` never changes once
/// registered.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Currency {
    /// Short currency code, e.g. `USDC`
    pub code: Symbol,
    /// Decimal places of the underlying token
    pub decimals: u32,
    /// Token contract holding balances of this currency
    pub token: Address,
}

/// An allocation target. The id is the cross-version addressing key used
/// during migration and is never reassigned.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pool {
    pub id: u32,
    /// Adapter contract implementing [`crate::interfaces::PoolAdapter`]
    pub adapter: Address,
    /// Currency codes this pool accepts
    pub currencies: Vec<Symbol>,
}

impl Pool {
    pub fn supports(&self, code: &Symbol) -> bool {
        self.currencies.contains(code)
    }
}

// ============================================================================
// MIGRATION PAYLOADS
// ============================================================================

/// State a fund manager hands to its successor.
///
/// Raw balances stay with the fund controller and share balances stay with
/// the share ledger, so only registries and fee accounting travel here.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundManagerData {
    pub currencies: Vec<Currency>,
    pub accepted: Vec<Symbol>,
    pub net_deposits: i128,
    pub interest_fees_claimed: i128,
    pub interest_fee_rate: u32,
}

/// Registries a fund controller hands to its successor before moving balances.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundControllerData {
    pub currencies: Vec<Currency>,
    pub pools: Vec<Pool>,
}
