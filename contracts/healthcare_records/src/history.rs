use common::timefmt::format_rfc3339;
use soroban_sdk::{contracttype, Env, String, Vec};

use crate::record::PatientRecord;
use crate::store::Modification;
use crate::ContractError;

/// Record state captured by a history entry.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Snapshot {
    /// Deletions and values that no longer decode.
    Absent,
    Record(PatientRecord),
}

impl Snapshot {
    pub fn record(&self) -> Option<&PatientRecord> {
        match self {
            Snapshot::Record(record) => Some(record),
            Snapshot::Absent => None,
        }
    }
}

/// One step of a record's audit trail.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HistoryEntry {
    pub tx_id: String,
    pub timestamp: String,
    pub is_delete: bool,
    pub record: Snapshot,
}

/// Projects a change-log into an audit trail, preserving its order.
///
/// Undecodable snapshots are kept as entries without a record; only an
/// error from the change-log itself fails the projection.
pub fn project<I>(env: &Env, changes: I) -> Result<Vec<HistoryEntry>, ContractError>
where
    I: Iterator<Item = Result<Modification, ContractError>>,
{
    let mut trail = Vec::new(env);
    for change in changes {
        let change = change?;
        let record = match (&change.value, change.is_delete) {
            (Some(value), false) => PatientRecord::decode(env, value)
                .map(Snapshot::Record)
                .unwrap_or(Snapshot::Absent),
            _ => Snapshot::Absent,
        };
        trail.push_back(HistoryEntry {
            tx_id: change.tx_id,
            timestamp: format_rfc3339(env, change.seconds, change.nanos),
            is_delete: change.is_delete,
            record,
        });
    }
    Ok(trail)
}
