use common::membership;
use soroban_sdk::{Address, Env, String};

use crate::ContractError;

/// Resolves who is performing a write.
pub trait IdentityResolver {
    /// The principal recorded as `created_by` / `last_updated_by`.
    fn caller_principal(&self) -> Result<String, ContractError>;
}

/// An authenticated address attributed to the organization it was
/// enrolled under.
pub struct EnrolledMember {
    env: Env,
    address: Address,
}

impl EnrolledMember {
    pub fn new(env: &Env, address: Address) -> Self {
        EnrolledMember {
            env: env.clone(),
            address,
        }
    }
}

impl IdentityResolver for EnrolledMember {
    fn caller_principal(&self) -> Result<String, ContractError> {
        self.address.require_auth();
        membership::org_of(&self.env, &self.address).ok_or(ContractError::UnknownIdentity)
    }
}
