use soroban_sdk::{
    contracttype, symbol_short,
    xdr::{FromXdr, ToXdr},
    Bytes, Env, IntoVal, Map, String, Symbol, TryFromVal, Val,
};

use crate::ContractError;

/// Discriminator stored in every patient record.
pub const RECORD_KIND: &str = "patientRecord";

/// Encoded field names of [`PatientRecord`].
pub const RECORD_FIELDS: [&str; 15] = [
    "allergies",
    "blood_type",
    "created_at",
    "created_by",
    "date_of_birth",
    "diagnosis",
    "gender",
    "last_updated_at",
    "last_updated_by",
    "medications",
    "patient_name",
    "record_id",
    "record_kind",
    "status",
    "treatment",
];

/// Selector field holding the discriminator.
pub fn kind_field(env: &Env) -> Symbol {
    Symbol::new(env, "record_kind")
}

/// Selector field holding the diagnosis.
pub const DIAGNOSIS_FIELD: Symbol = symbol_short!("diagnosis");

/// Lifecycle status of a patient record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordStatus {
    Active,
    Discharged,
    Transferred,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 3] = [
        RecordStatus::Active,
        RecordStatus::Discharged,
        RecordStatus::Transferred,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Discharged => "discharged",
            RecordStatus::Transferred => "transferred",
        }
    }

    pub fn to_text(&self, env: &Env) -> String {
        String::from_str(env, self.as_str())
    }

    /// Parses the wire form; anything outside the closed set is rejected.
    pub fn parse(env: &Env, value: &String) -> Result<Self, ContractError> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.to_text(env) == *value)
            .ok_or(ContractError::InvalidStatus)
    }
}

/// A patient health record as persisted in world state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PatientRecord {
    pub record_kind: String,
    pub record_id: String,
    pub patient_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub blood_type: String,
    pub diagnosis: String,
    pub treatment: String,
    pub allergies: String,
    pub medications: String,
    pub created_by: String,
    pub created_at: String,
    pub last_updated_by: String,
    pub last_updated_at: String,
    pub status: String,
}

/// Caller-supplied fields of a new record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewPatientRecord {
    pub record_id: String,
    pub patient_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub blood_type: String,
    pub diagnosis: String,
    pub treatment: String,
    pub allergies: String,
    pub medications: String,
}

/// Sparse update. `None` leaves the stored field as it is.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordUpdate {
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub medications: Option<String>,
    pub status: Option<String>,
}

impl PatientRecord {
    /// Builds an `active` record attributed to `principal` at `now`.
    pub fn new(env: &Env, input: NewPatientRecord, principal: String, now: String) -> Self {
        PatientRecord {
            record_kind: String::from_str(env, RECORD_KIND),
            record_id: input.record_id,
            patient_name: input.patient_name,
            date_of_birth: input.date_of_birth,
            gender: input.gender,
            blood_type: input.blood_type,
            diagnosis: input.diagnosis,
            treatment: input.treatment,
            allergies: input.allergies,
            medications: input.medications,
            created_by: principal.clone(),
            created_at: now.clone(),
            last_updated_by: principal,
            last_updated_at: now,
            status: RecordStatus::Active.to_text(env),
        }
    }

    /// Applies a sparse update and stamps the writer.
    ///
    /// The status is checked before anything is modified, so a rejected
    /// update leaves the record untouched.
    pub fn apply_update(
        &mut self,
        env: &Env,
        changes: RecordUpdate,
        principal: String,
        now: String,
    ) -> Result<(), ContractError> {
        if let Some(status) = &changes.status {
            RecordStatus::parse(env, status)?;
        }

        if let Some(diagnosis) = changes.diagnosis {
            self.diagnosis = diagnosis;
        }
        if let Some(treatment) = changes.treatment {
            self.treatment = treatment;
        }
        if let Some(medications) = changes.medications {
            self.medications = medications;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.last_updated_by = principal;
        self.last_updated_at = now;
        Ok(())
    }

    pub fn encode(&self, env: &Env) -> Bytes {
        self.clone().to_xdr(env)
    }

    /// Decodes stored bytes, rejecting any value that is not exactly a
    /// patient record.
    ///
    /// Bytes that are not XDR at all are refused by the host and abort the
    /// invocation.
    pub fn decode(env: &Env, bytes: &Bytes) -> Result<Self, ContractError> {
        let doc = Map::<Symbol, Val>::from_xdr(env, bytes)
            .map_err(|_| ContractError::DecodeFailed)?;

        if doc.len() != RECORD_FIELDS.len() as u32 {
            return Err(ContractError::DecodeFailed);
        }
        for name in RECORD_FIELDS {
            let is_text = doc
                .get(Symbol::new(env, name))
                .map(|value| String::try_from_val(env, &value).is_ok())
                .unwrap_or(false);
            if !is_text {
                return Err(ContractError::DecodeFailed);
            }
        }

        let value: Val = doc.into_val(env);
        PatientRecord::try_from_val(env, &value).map_err(|_| ContractError::DecodeFailed)
    }
}
