#![cfg(test)]

use std::cell::Cell;
use std::rc::Rc;

use soroban_sdk::{Bytes, Env, String};

use crate::identity::IdentityResolver;
use crate::record::NewPatientRecord;
use crate::store::{LedgerStore, Selector};
use crate::ContractError;

/// Resolves every caller to the same principal.
pub struct FixedPrincipal(pub String);

impl FixedPrincipal {
    pub fn new(env: &Env, principal: &str) -> Self {
        FixedPrincipal(String::from_str(env, principal))
    }
}

impl IdentityResolver for FixedPrincipal {
    fn caller_principal(&self) -> Result<String, ContractError> {
        Ok(self.0.clone())
    }
}

/// A caller that cannot be resolved.
pub struct NoPrincipal;

impl IdentityResolver for NoPrincipal {
    fn caller_principal(&self) -> Result<String, ContractError> {
        Err(ContractError::UnknownIdentity)
    }
}

pub fn new_record(env: &Env, record_id: &str, diagnosis: &str) -> NewPatientRecord {
    NewPatientRecord {
        record_id: String::from_str(env, record_id),
        patient_name: String::from_str(env, "Jane Doe"),
        date_of_birth: String::from_str(env, "1992-01-01"),
        gender: String::from_str(env, "Female"),
        blood_type: String::from_str(env, "O-"),
        diagnosis: String::from_str(env, diagnosis),
        treatment: String::from_str(env, "Rest"),
        allergies: String::from_str(env, "None"),
        medications: String::from_str(env, "Ibuprofen"),
    }
}

#[derive(Default)]
struct CursorCounts {
    opened: Cell<u32>,
    live: Cell<u32>,
}

/// Store wrapper that counts cursors handed out and still alive.
pub struct TrackedStore<S> {
    inner: S,
    counts: Rc<CursorCounts>,
}

impl<S> TrackedStore<S> {
    pub fn new(inner: S) -> Self {
        TrackedStore {
            inner,
            counts: Rc::new(CursorCounts::default()),
        }
    }

    pub fn opened(&self) -> u32 {
        self.counts.opened.get()
    }

    pub fn live(&self) -> u32 {
        self.counts.live.get()
    }

    fn track<I>(&self, inner: I) -> Tracked<I> {
        self.counts.opened.set(self.counts.opened.get() + 1);
        self.counts.live.set(self.counts.live.get() + 1);
        Tracked {
            inner,
            counts: self.counts.clone(),
        }
    }
}

pub struct Tracked<I> {
    inner: I,
    counts: Rc<CursorCounts>,
}

impl<I: Iterator> Iterator for Tracked<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        self.inner.next()
    }
}

impl<I> Drop for Tracked<I> {
    fn drop(&mut self) {
        self.counts.live.set(self.counts.live.get() - 1);
    }
}

impl<S: LedgerStore> LedgerStore for TrackedStore<S> {
    type Scan = Tracked<S::Scan>;
    type History = Tracked<S::History>;

    fn get(&self, key: &String) -> Result<Option<Bytes>, ContractError> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &String, value: &Bytes) -> Result<(), ContractError> {
        self.inner.put(key, value)
    }

    fn delete(&mut self, key: &String) -> Result<(), ContractError> {
        self.inner.delete(key)
    }

    fn range_scan(&self, start: &String, end: &String) -> Result<Self::Scan, ContractError> {
        Ok(self.track(self.inner.range_scan(start, end)?))
    }

    fn rich_query(&self, selector: &Selector) -> Result<Self::Scan, ContractError> {
        Ok(self.track(self.inner.rich_query(selector)?))
    }

    fn history_for(&self, key: &String) -> Result<Self::History, ContractError> {
        Ok(self.track(self.inner.history_for(key)?))
    }
}
