#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use healthcare_records::{
    ContractError, HealthcareContract, HealthcareContractClient, HistoryEntry, NewPatientRecord,
    RecordUpdate,
};
use libfuzzer_sys::fuzz_target;
use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::xdr::FromXdr;
use soroban_sdk::{Address, Env, String};

const ORGS: [&str; 3] = ["OrgA", "OrgB", "OrgC"];
const DIAGNOSES: [&str; 3] = ["Flu", "Asthma", "Migraine"];
const STATUSES: [&str; 4] = ["active", "discharged", "transferred", "unknown"];

#[derive(Arbitrary, Debug)]
enum Op {
    Create { slot: u8, org: u8, diagnosis: u8 },
    Update { slot: u8, org: u8, diagnosis: Option<u8>, status: Option<u8> },
    Tick { seconds: u16 },
}

struct Expected {
    created_by: usize,
    diagnosis: usize,
    writes: u32,
}

fn record_id(env: &Env, slot: u8) -> String {
    String::from_str(env, &format!("PAT-{:03}", slot % 8))
}

fn input(env: &Env, slot: u8, diagnosis: usize) -> NewPatientRecord {
    NewPatientRecord {
        record_id: record_id(env, slot),
        patient_name: String::from_str(env, "Fuzz Patient"),
        date_of_birth: String::from_str(env, "1990-05-05"),
        gender: String::from_str(env, "Other"),
        blood_type: String::from_str(env, "AB+"),
        diagnosis: String::from_str(env, DIAGNOSES[diagnosis]),
        treatment: String::from_str(env, "Observation"),
        allergies: String::from_str(env, "None"),
        medications: String::from_str(env, "None"),
    }
}

fuzz_target!(|ops: Vec<Op>| {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_704_067_200);

    let contract_id = env.register(HealthcareContract, ());
    let client = HealthcareContractClient::new(&env, &contract_id);
    let admin = Address::generate(&env);
    client.initialize(&admin);

    let members: Vec<Address> = ORGS
        .iter()
        .map(|org| {
            let member = Address::generate(&env);
            client.enroll_member(&admin, &member, &String::from_str(&env, org));
            member
        })
        .collect();

    let mut model: BTreeMap<u8, Expected> = BTreeMap::new();

    for op in ops.iter().take(32) {
        match *op {
            Op::Create { slot, org, diagnosis } => {
                let slot = slot % 8;
                let org = org as usize % ORGS.len();
                let diagnosis = diagnosis as usize % DIAGNOSES.len();
                let result = client.try_create_record(&members[org], &input(&env, slot, diagnosis));
                if model.contains_key(&slot) {
                    assert_eq!(result, Err(Ok(ContractError::RecordAlreadyExists)));
                } else {
                    assert!(result.is_ok());
                    model.insert(
                        slot,
                        Expected {
                            created_by: org,
                            diagnosis,
                            writes: 1,
                        },
                    );
                }
            }
            Op::Update {
                slot,
                org,
                diagnosis,
                status,
            } => {
                let slot = slot % 8;
                let org = org as usize % ORGS.len();
                let diagnosis = diagnosis.map(|d| d as usize % DIAGNOSES.len());
                let status = status.map(|s| s as usize % STATUSES.len());
                let changes = RecordUpdate {
                    diagnosis: diagnosis.map(|d| String::from_str(&env, DIAGNOSES[d])),
                    treatment: None,
                    medications: None,
                    status: status.map(|s| String::from_str(&env, STATUSES[s])),
                };
                let result = client.try_update_record(&members[org], &record_id(&env, slot), &changes);
                match model.get_mut(&slot) {
                    None => assert_eq!(result, Err(Ok(ContractError::RecordNotFound))),
                    Some(_) if status == Some(STATUSES.len() - 1) => {
                        assert_eq!(result, Err(Ok(ContractError::InvalidStatus)))
                    }
                    Some(expected) => {
                        assert!(result.is_ok());
                        if let Some(d) = diagnosis {
                            expected.diagnosis = d;
                        }
                        expected.writes += 1;
                        let record = client.read_record(&record_id(&env, slot));
                        assert_eq!(record.last_updated_by, String::from_str(&env, ORGS[org]));
                    }
                }
            }
            Op::Tick { seconds } => {
                let now = env.ledger().timestamp();
                env.ledger().set_timestamp(now + seconds as u64);
            }
        }
    }

    let records = client.get_all_records();
    assert_eq!(records.len() as usize, model.len());
    for (record, (slot, expected)) in records.iter().zip(model.iter()) {
        assert_eq!(record.record_id, record_id(&env, *slot));
        assert_eq!(record.created_by, String::from_str(&env, ORGS[expected.created_by]));
        assert_eq!(record.diagnosis, String::from_str(&env, DIAGNOSES[expected.diagnosis]));
        assert!(record.created_at <= record.last_updated_at);

        let history = client.get_record_history(&record.record_id);
        let entries = soroban_sdk::Vec::<HistoryEntry>::from_xdr(&env, &history)
            .expect("history payload decodes");
        assert_eq!(entries.len(), expected.writes);
    }

    for (d, diagnosis) in DIAGNOSES.iter().enumerate() {
        let matches = client.query_records_by_diagnosis(&String::from_str(&env, diagnosis));
        let want = model.values().filter(|e| e.diagnosis == d).count();
        assert_eq!(matches.len() as usize, want);
    }
});
