use soroban_sdk::{Env, String};

use crate::record::{NewPatientRecord, PatientRecord};

/// A bootstrap record and the organization it is attributed to.
#[derive(Clone, Copy, Debug)]
pub struct SeedRecord {
    pub record_id: &'static str,
    pub patient_name: &'static str,
    pub date_of_birth: &'static str,
    pub gender: &'static str,
    pub blood_type: &'static str,
    pub diagnosis: &'static str,
    pub treatment: &'static str,
    pub allergies: &'static str,
    pub medications: &'static str,
    pub created_by: &'static str,
}

/// Records written by `init_ledger`.
pub const BOOTSTRAP_RECORDS: [SeedRecord; 2] = [
    SeedRecord {
        record_id: "PAT-001",
        patient_name: "Ahmad Khan",
        date_of_birth: "1985-03-15",
        gender: "Male",
        blood_type: "O+",
        diagnosis: "Type 2 Diabetes",
        treatment: "Metformin 500mg, lifestyle counseling",
        allergies: "Penicillin",
        medications: "Metformin",
        created_by: "OHGHospitalOrg",
    },
    SeedRecord {
        record_id: "PAT-002",
        patient_name: "Fatima Ali",
        date_of_birth: "1990-07-22",
        gender: "Female",
        blood_type: "A+",
        diagnosis: "Hypertension Stage 1",
        treatment: "Amlodipine 5mg, dietary changes",
        allergies: "None",
        medications: "Amlodipine",
        created_by: "OHGClinicOrg",
    },
];

impl SeedRecord {
    /// Materializes the record, last-modified fields mirroring creation.
    pub fn to_record(&self, env: &Env, now: &String) -> PatientRecord {
        let text = |value: &str| String::from_str(env, value);
        PatientRecord::new(
            env,
            NewPatientRecord {
                record_id: text(self.record_id),
                patient_name: text(self.patient_name),
                date_of_birth: text(self.date_of_birth),
                gender: text(self.gender),
                blood_type: text(self.blood_type),
                diagnosis: text(self.diagnosis),
                treatment: text(self.treatment),
                allergies: text(self.allergies),
                medications: text(self.medications),
            },
            text(self.created_by),
            now.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_ids_are_distinct() {
        for (i, a) in BOOTSTRAP_RECORDS.iter().enumerate() {
            for b in &BOOTSTRAP_RECORDS[i + 1..] {
                assert_ne!(a.record_id, b.record_id);
            }
        }
    }

    #[test]
    fn test_to_record_mirrors_creator() {
        let env = Env::default();
        let now = String::from_str(&env, "2024-01-01T00:00:00Z");
        let record = BOOTSTRAP_RECORDS[1].to_record(&env, &now);

        assert_eq!(record.record_id, String::from_str(&env, "PAT-002"));
        assert_eq!(record.created_by, String::from_str(&env, "OHGClinicOrg"));
        assert_eq!(record.last_updated_by, record.created_by);
        assert_eq!(record.last_updated_at, now);
        assert_eq!(record.status, String::from_str(&env, "active"));
    }
}
