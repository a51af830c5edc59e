use soroban_sdk::{contracttype, Address};

use crate::error::FundError;

/// Role slots of a governed fund contract.
///
/// The owner has full control. The rebalancer is operational only: it may move
/// funds between idle and deployed, toggle currency acceptance and flip the
/// safety gate. Each contract stores its own value; reassignment is a single
/// step performed by the current owner.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccessControl {
    pub owner: Address,
    pub rebalancer: Address,
}

impl AccessControl {
    pub fn new(owner: Address, rebalancer: Address) -> Self {
        Self { owner, rebalancer }
    }

    /// Authenticates `caller` and checks it is the owner.
    pub fn require_owner(&self, caller: &Address) -> Result<(), FundError> {
        caller.require_auth();
        if *caller != self.owner {
            return Err(FundError::Unauthorized);
        }
        Ok(())
    }

    /// Authenticates `caller` and checks it is the owner or the rebalancer.
    pub fn require_operator(&self, caller: &Address) -> Result<(), FundError> {
        caller.require_auth();
        if *caller != self.owner && *caller != self.rebalancer {
            return Err(FundError::Unauthorized);
        }
        Ok(())
    }
}
