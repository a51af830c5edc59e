use soroban_sdk::contracterror;

/// Error codes returned by every fund contract.
///
/// Codes are part of the on-chain interface and must never be renumbered:
/// a contract upgraded in place keeps answering with the same values.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum FundError {
    /// The contract has not been initialized yet.
    NotInitialized = 1,
    /// `initialize` was called a second time.
    AlreadyInitialized = 2,
    /// This fund manager contract is disabled. This may be due to an upgrade.
    FundManagerDisabled = 3,
    /// This fund controller contract is disabled. This may be due to an upgrade.
    FundControllerDisabled = 4,
    /// An upgrade was attempted while a safety gate is still open.
    FundEnabled = 5,
    /// The caller does not hold the role the operation requires.
    Unauthorized = 6,
    /// The currency code is not in the registry.
    UnknownCurrency = 7,
    /// The currency is registered but deposits of it are not accepted.
    CurrencyNotAccepted = 8,
    /// The pool id is not in the registry.
    UnknownPool = 9,
    /// The pool exists but does not support the currency.
    UnsupportedPoolCurrency = 10,
    /// Registering another currency would exceed `MAX_CURRENCIES`.
    TooManyCurrencies = 11,
    /// Registering another pool would exceed `MAX_POOLS`.
    TooManyPools = 12,
    /// Amount is zero, negative, or too small to mint a single share unit.
    InvalidAmount = 13,
    /// Parallel argument vectors differ in length.
    LengthMismatch = 14,
    /// The account does not hold enough shares.
    InsufficientShares = 15,
    /// Not enough idle balance of the currency is held by the controller.
    InsufficientLiquidity = 16,
    /// The token allowance granted to the contract is too small.
    InsufficientAllowance = 17,
    /// The price oracle returned no price or a non-positive price.
    InvalidPrice = 18,
    /// Fixed-point arithmetic overflowed.
    ArithmeticOverflow = 19,
    /// A migration step would lose or fail to deliver value.
    MigrationIntegrityFailure = 20,
    /// The caller is not the authorized migration data source.
    DataSourceNotAuthorized = 21,
    /// Interest fee rate above 100%.
    InvalidFeeRate = 22,
    /// The registry entry already exists.
    AlreadyRegistered = 23,
    /// The contract handed its state to a successor and no longer moves value.
    FundRetired = 24,
    /// The fund manager and fund controller registries disagree on a currency.
    CurrencyMismatch = 25,
}
