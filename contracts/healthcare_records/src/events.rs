use soroban_sdk::{contracttype, symbol_short, Address, Env, String};

use crate::record::PatientRecord;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberEnrolledEvent {
    pub member: Address,
    pub org: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemberRevokedEvent {
    pub member: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LedgerSeededEvent {
    pub count: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordCreatedEvent {
    pub record_id: String,
    pub created_by: String,
    pub created_at: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordUpdatedEvent {
    pub record_id: String,
    pub updated_by: String,
    pub updated_at: String,
    pub status: String,
}

pub fn publish_initialized(env: &Env, admin: Address) {
    env.events()
        .publish((symbol_short!("INIT"),), InitializedEvent { admin });
}

pub fn publish_member_enrolled(env: &Env, member: Address, org: String) {
    env.events().publish(
        (symbol_short!("MEM_ENR"), member.clone()),
        MemberEnrolledEvent { member, org },
    );
}

pub fn publish_member_revoked(env: &Env, member: Address) {
    env.events().publish(
        (symbol_short!("MEM_REV"), member.clone()),
        MemberRevokedEvent { member },
    );
}

pub fn publish_ledger_seeded(env: &Env, count: u32) {
    env.events()
        .publish((symbol_short!("SEEDED"),), LedgerSeededEvent { count });
}

pub fn publish_record_created(env: &Env, record: &PatientRecord) {
    env.events().publish(
        (symbol_short!("REC_NEW"), record.record_id.clone()),
        RecordCreatedEvent {
            record_id: record.record_id.clone(),
            created_by: record.created_by.clone(),
            created_at: record.created_at.clone(),
        },
    );
}

pub fn publish_record_updated(env: &Env, record: &PatientRecord) {
    env.events().publish(
        (symbol_short!("REC_UPD"), record.record_id.clone()),
        RecordUpdatedEvent {
            record_id: record.record_id.clone(),
            updated_by: record.last_updated_by.clone(),
            updated_at: record.last_updated_at.clone(),
            status: record.status.clone(),
        },
    );
}
