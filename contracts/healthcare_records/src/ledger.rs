use common::timefmt::format_rfc3339;
use soroban_sdk::{log, xdr::ToXdr, Bytes, Env, String, Vec};

use crate::history::{self, HistoryEntry};
use crate::identity::IdentityResolver;
use crate::record::{
    kind_field, NewPatientRecord, PatientRecord, RecordUpdate, DIAGNOSIS_FIELD, RECORD_KIND,
};
use crate::seed::SeedRecord;
use crate::store::{LedgerStore, Selector};
use crate::validation::validate_record_id;
use crate::ContractError;

/// Record lifecycle and queries over an injected world-state store.
///
/// Holds no state of its own; every operation is a single pass through
/// `store`, which is expected to be scoped to one transaction.
pub struct RecordLedger<S: LedgerStore> {
    env: Env,
    store: S,
}

impl<S: LedgerStore> RecordLedger<S> {
    pub fn new(env: &Env, store: S) -> Self {
        RecordLedger {
            env: env.clone(),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn now(&self) -> String {
        format_rfc3339(&self.env, self.env.ledger().timestamp(), 0)
    }

    fn ensure_absent(&self, record_id: &String) -> Result<(), ContractError> {
        if self.store.get(record_id)?.is_some() {
            log!(&self.env, "record already exists", record_id.clone());
            return Err(ContractError::RecordAlreadyExists);
        }
        Ok(())
    }

    fn write(&mut self, key: &String, record: &PatientRecord) -> Result<(), ContractError> {
        let encoded = record.encode(&self.env);
        self.store.put(key, &encoded)
    }

    /// Writes each bootstrap record, stopping at the first failure.
    pub fn seed(&mut self, records: &[SeedRecord]) -> Result<u32, ContractError> {
        let now = self.now();
        for seed in records {
            let record = seed.to_record(&self.env, &now);
            let written = self
                .ensure_absent(&record.record_id)
                .and_then(|()| self.write(&record.record_id, &record));
            if let Err(err) = written {
                log!(&self.env, "seed failed at record", record.record_id);
                return Err(err);
            }
        }
        Ok(records.len() as u32)
    }

    /// Creates an `active` record attributed to the caller.
    pub fn create<I: IdentityResolver>(
        &mut self,
        identity: &I,
        input: NewPatientRecord,
    ) -> Result<PatientRecord, ContractError> {
        validate_record_id(&input.record_id)?;
        self.ensure_absent(&input.record_id)?;

        let principal = identity.caller_principal()?;
        let record = PatientRecord::new(&self.env, input, principal, self.now());
        self.write(&record.record_id, &record)?;
        Ok(record)
    }

    pub fn exists(&self, record_id: &String) -> Result<bool, ContractError> {
        Ok(self.store.get(record_id)?.is_some())
    }

    pub fn read(&self, record_id: &String) -> Result<PatientRecord, ContractError> {
        let Some(bytes) = self.store.get(record_id)? else {
            log!(&self.env, "record not found", record_id.clone());
            return Err(ContractError::RecordNotFound);
        };
        PatientRecord::decode(&self.env, &bytes).map_err(|err| {
            log!(&self.env, "stored record does not decode", record_id.clone());
            err
        })
    }

    /// Applies a sparse update and re-attributes the record to the caller.
    pub fn update<I: IdentityResolver>(
        &mut self,
        identity: &I,
        record_id: &String,
        changes: RecordUpdate,
    ) -> Result<PatientRecord, ContractError> {
        let mut record = self.read(record_id)?;
        let principal = identity.caller_principal()?;
        let now = self.now();
        record.apply_update(&self.env, changes, principal, now)?;
        self.write(record_id, &record)?;
        Ok(record)
    }

    pub fn enumerate_all(&self) -> Result<Vec<PatientRecord>, ContractError> {
        let open = String::from_str(&self.env, "");
        self.enumerate_range(&open, &open)
    }

    /// Records with `start <= id < end`; empty bounds are open.
    pub fn enumerate_range(
        &self,
        start: &String,
        end: &String,
    ) -> Result<Vec<PatientRecord>, ContractError> {
        let scan = self.store.range_scan(start, end)?;
        self.decode_all(scan)
    }

    /// Patient records whose diagnosis equals `diagnosis` exactly.
    pub fn query_by_diagnosis(
        &self,
        diagnosis: &String,
    ) -> Result<Vec<PatientRecord>, ContractError> {
        let selector = Selector::new(&self.env)
            .field_eq(kind_field(&self.env), String::from_str(&self.env, RECORD_KIND))
            .field_eq(DIAGNOSIS_FIELD, diagnosis.clone());
        let scan = self.store.rich_query(&selector)?;
        self.decode_all(scan)
    }

    /// Decodes every scanned value; one bad entry fails the whole read.
    fn decode_all(&self, scan: S::Scan) -> Result<Vec<PatientRecord>, ContractError> {
        let mut records = Vec::new(&self.env);
        for entry in scan {
            let entry = entry?;
            let record = PatientRecord::decode(&self.env, &entry.value).map_err(|err| {
                log!(&self.env, "scanned value does not decode", entry.key.clone());
                err
            })?;
            records.push_back(record);
        }
        Ok(records)
    }

    /// Audit trail of a record, oldest first.
    pub fn history(&self, record_id: &String) -> Result<Vec<HistoryEntry>, ContractError> {
        let trail = history::project(&self.env, self.store.history_for(record_id)?)?;
        if trail.is_empty() {
            log!(&self.env, "no history for record", record_id.clone());
            return Err(ContractError::RecordNotFound);
        }
        Ok(trail)
    }

    /// The audit trail serialized as one XDR payload.
    pub fn history_payload(&self, record_id: &String) -> Result<Bytes, ContractError> {
        Ok(self.history(record_id)?.to_xdr(&self.env))
    }
}
