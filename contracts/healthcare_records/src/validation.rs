use core::ops::RangeInclusive;

use soroban_sdk::String;

use crate::ContractError;

const MIN_RECORD_ID_LEN: u32 = 1;
const MAX_RECORD_ID_LEN: u32 = 64;

const MIN_ORG_LEN: u32 = 2;
const MAX_ORG_LEN: u32 = 64;

const MAX_CHECKED_LEN: usize = 64;

/// Checks the length bounds and that every byte lies in `allowed`.
fn validate_ascii(
    value: &String,
    min_len: u32,
    max_len: u32,
    allowed: RangeInclusive<u8>,
) -> Result<(), ContractError> {
    let len = value.len();
    if !(min_len..=max_len).contains(&len) || len as usize > MAX_CHECKED_LEN {
        return Err(ContractError::InvalidInput);
    }

    let mut buf = [0u8; MAX_CHECKED_LEN];
    value.copy_into_slice(&mut buf[..len as usize]);

    if buf[..len as usize].iter().all(|b| allowed.contains(b)) {
        Ok(())
    } else {
        Err(ContractError::InvalidInput)
    }
}

/// Validate a record identifier.
/// Identifiers are world-state keys: 1-64 bytes of printable ASCII with no
/// spaces.
pub fn validate_record_id(record_id: &String) -> Result<(), ContractError> {
    validate_ascii(record_id, MIN_RECORD_ID_LEN, MAX_RECORD_ID_LEN, b'!'..=b'~')
}

/// Validate an organization principal.
/// Principals are recorded verbatim in attribution fields, so only printable
/// ASCII (space to tilde) is accepted.
pub fn validate_org(org: &String) -> Result<(), ContractError> {
    validate_ascii(org, MIN_ORG_LEN, MAX_ORG_LEN, b' '..=b'~')
}
