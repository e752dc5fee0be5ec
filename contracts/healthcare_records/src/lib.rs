#![no_std]

#[cfg(test)]
extern crate std;

pub mod events;
pub mod history;
pub mod identity;
pub mod ledger;
pub mod record;
pub mod seed;
pub mod store;
pub mod validation;

#[cfg(test)]
mod testutils;

use common::membership;
use soroban_sdk::{contract, contractimpl, symbol_short, Address, Bytes, Env, String, Symbol, Vec};

pub use history::{HistoryEntry, Snapshot};
pub use record::{NewPatientRecord, PatientRecord, RecordStatus, RecordUpdate};

use identity::EnrolledMember;
use ledger::RecordLedger;
use seed::BOOTSTRAP_RECORDS;
use store::WorldState;

/// Storage keys for the contract
const ADMIN: Symbol = symbol_short!("ADMIN");
const INITIALIZED: Symbol = symbol_short!("INIT");

const INSTANCE_TTL_THRESHOLD: u32 = 518_400; // ~30 days
const INSTANCE_TTL_EXTEND_TO: u32 = 3_110_400; // ~180 days

/// Contract errors
#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    Unauthorized = 3,
    RecordNotFound = 4,
    RecordAlreadyExists = 5,
    InvalidInput = 6,
    InvalidStatus = 7,
    DecodeFailed = 8,
    StoreFailure = 9,
    MalformedQuery = 10,
    UnknownIdentity = 11,
}

#[contract]
pub struct HealthcareContract;

fn require_admin(env: &Env, caller: &Address) -> Result<(), ContractError> {
    caller.require_auth();
    let admin: Address = env
        .storage()
        .instance()
        .get(&ADMIN)
        .ok_or(ContractError::NotInitialized)?;
    if *caller != admin {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

/// One ledger per invocation, so each entry point is one transaction.
fn ledger(env: &Env) -> RecordLedger<WorldState> {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND_TO);
    RecordLedger::new(env, WorldState::begin(env))
}

#[contractimpl]
impl HealthcareContract {
    /// Initialize the contract with an admin address
    pub fn initialize(env: Env, admin: Address) -> Result<(), ContractError> {
        admin.require_auth();

        if env.storage().instance().has(&INITIALIZED) {
            return Err(ContractError::AlreadyInitialized);
        }

        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&INITIALIZED, &true);

        events::publish_initialized(&env, admin);

        Ok(())
    }

    /// Get the admin address
    pub fn get_admin(env: Env) -> Result<Address, ContractError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(ContractError::NotInitialized)
    }

    /// Check if the contract is initialized
    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&INITIALIZED)
    }

    /// Enroll a member address under the organization it writes for
    pub fn enroll_member(
        env: Env,
        admin: Address,
        member: Address,
        org: String,
    ) -> Result<(), ContractError> {
        require_admin(&env, &admin)?;
        validation::validate_org(&org)?;

        membership::enroll(&env, &member, &org);
        events::publish_member_enrolled(&env, member, org);

        Ok(())
    }

    /// Remove a member; its past writes keep their attribution
    pub fn revoke_member(env: Env, admin: Address, member: Address) -> Result<(), ContractError> {
        require_admin(&env, &admin)?;
        if !membership::is_enrolled(&env, &member) {
            return Err(ContractError::UnknownIdentity);
        }

        membership::revoke(&env, &member);
        events::publish_member_revoked(&env, member);

        Ok(())
    }

    /// Organization a member writes for, if enrolled
    pub fn get_member_org(env: Env, member: Address) -> Option<String> {
        membership::org_of(&env, &member)
    }

    /// Seed the ledger with the bootstrap patient records.
    ///
    /// Not idempotent: a second call fails with `RecordAlreadyExists`.
    pub fn init_ledger(env: Env, admin: Address) -> Result<(), ContractError> {
        require_admin(&env, &admin)?;

        let count = ledger(&env).seed(&BOOTSTRAP_RECORDS)?;
        events::publish_ledger_seeded(&env, count);

        Ok(())
    }

    /// Create a patient record attributed to the caller's organization
    pub fn create_record(
        env: Env,
        caller: Address,
        input: NewPatientRecord,
    ) -> Result<(), ContractError> {
        let identity = EnrolledMember::new(&env, caller);
        let record = ledger(&env).create(&identity, input)?;

        events::publish_record_created(&env, &record);

        Ok(())
    }

    /// Get a patient record by ID
    pub fn read_record(env: Env, record_id: String) -> Result<PatientRecord, ContractError> {
        ledger(&env).read(&record_id)
    }

    /// Check whether a record ID is taken
    pub fn record_exists(env: Env, record_id: String) -> Result<bool, ContractError> {
        ledger(&env).exists(&record_id)
    }

    /// Update the clinical fields and status of a record
    pub fn update_record(
        env: Env,
        caller: Address,
        record_id: String,
        changes: RecordUpdate,
    ) -> Result<(), ContractError> {
        let identity = EnrolledMember::new(&env, caller);
        let record = ledger(&env).update(&identity, &record_id, changes)?;

        events::publish_record_updated(&env, &record);

        Ok(())
    }

    /// Get every record in key order
    pub fn get_all_records(env: Env) -> Result<Vec<PatientRecord>, ContractError> {
        ledger(&env).enumerate_all()
    }

    /// Get records with `start_key <= id < end_key`; empty bounds are open
    pub fn get_records_by_range(
        env: Env,
        start_key: String,
        end_key: String,
    ) -> Result<Vec<PatientRecord>, ContractError> {
        ledger(&env).enumerate_range(&start_key, &end_key)
    }

    /// Get patient records with exactly this diagnosis
    pub fn query_records_by_diagnosis(
        env: Env,
        diagnosis: String,
    ) -> Result<Vec<PatientRecord>, ContractError> {
        ledger(&env).query_by_diagnosis(&diagnosis)
    }

    /// Get the XDR-encoded `Vec<HistoryEntry>` of a record, oldest first
    pub fn get_record_history(env: Env, record_id: String) -> Result<Bytes, ContractError> {
        ledger(&env).history_payload(&record_id)
    }

    /// Contract version
    pub fn version() -> u32 {
        1
    }
}
