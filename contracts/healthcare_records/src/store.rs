//! World-state store used by the record ledger.
//!
//! [`LedgerStore`] is the transactional key-value contract the ledger is
//! written against. [`WorldState`] implements it on Soroban persistent
//! storage. The host offers point reads and writes only, so `WorldState`
//! keeps its own ordered key index and per-key change-log next to the
//! values:
//!
//! | key                       | value                               |
//! |---------------------------|-------------------------------------|
//! | `(STATE, key)`            | current value bytes                 |
//! | `KEY_DIR`                 | [`KeyDirectory`] of index pages     |
//! | `(KEY_PAGE, page)`        | sorted `Vec<String>` of keys        |
//! | `(HIST_LEN, key)`         | change-log length                   |
//! | `(HIST, key, n)`          | `n`-th [`Modification`]             |
//!
//! The index is split into pages of at most [`PAGE_CAPACITY`] keys, in
//! key order, and holds at most [`MAX_PAGES`] pages. A write that needs a
//! page beyond that fails with `StoreFailure`.
//!
//! Reading a live key extends the TTL of its value, its change-log and
//! the index page holding it, so none of them is archived before the
//! others.
//!
//! Cursors returned by scans and history lookups are owned values; they
//! are released when dropped, including on early `?` returns.

use common::text::hex_string;
use soroban_sdk::{
    contracttype, log, symbol_short,
    xdr::{FromXdr, ToXdr},
    Bytes, Env, IntoVal, Map, String, Symbol, TryFromVal, Val, Vec,
};

use crate::ContractError;

const STATE: Symbol = symbol_short!("STATE");
const KEY_DIR: Symbol = symbol_short!("KEY_DIR");
const KEY_PAGE: Symbol = symbol_short!("KEY_PAGE");
const HIST: Symbol = symbol_short!("HIST");
const HIST_LEN: Symbol = symbol_short!("HIST_LEN");
const TX_SEQ: Symbol = symbol_short!("TX_SEQ");

const STATE_TTL_THRESHOLD: u32 = 518_400; // ~30 days
const STATE_TTL_EXTEND_TO: u32 = 3_110_400; // ~180 days

/// Keys per index page before it splits.
pub const PAGE_CAPACITY: u32 = 128;
/// Index pages the directory may reference.
pub const MAX_PAGES: u32 = 256;

/// A key and the bytes stored under it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Bytes,
}

/// One entry of a key's change-log.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Modification {
    pub tx_id: String,
    pub seconds: u64,
    pub nanos: u32,
    pub is_delete: bool,
    pub value: Option<Bytes>,
}

/// Directory entry for one index page.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexPage {
    /// Smallest key on the page.
    pub first: String,
    pub page: u32,
}

/// Index pages in key order.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyDirectory {
    pub pages: Vec<IndexPage>,
    pub next_page: u32,
}

/// Page sizing of the key index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexLimits {
    pub page_capacity: u32,
    pub max_pages: u32,
}

impl Default for IndexLimits {
    fn default() -> Self {
        IndexLimits {
            page_capacity: PAGE_CAPACITY,
            max_pages: MAX_PAGES,
        }
    }
}

/// Structured rich-query filter: every clause must hold.
///
/// Values are compared as data, so quotes or braces in a value are matched
/// literally and can never alter the shape of the query.
#[derive(Clone, Debug)]
pub struct Selector {
    clauses: Vec<(Symbol, String)>,
}

impl Selector {
    pub fn new(env: &Env) -> Self {
        Selector {
            clauses: Vec::new(env),
        }
    }

    /// Adds a `field == value` clause.
    pub fn field_eq(mut self, field: Symbol, value: String) -> Self {
        self.clauses.push_back((field, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluates the selector against an encoded document. Values that are
    /// not field-tagged maps never match.
    pub fn matches(&self, env: &Env, value: &Bytes) -> bool {
        let Ok(doc) = Map::<Symbol, Val>::from_xdr(env, value) else {
            return false;
        };
        self.clauses.iter().all(|(field, expected)| {
            doc.get(field)
                .and_then(|actual| String::try_from_val(env, &actual).ok())
                .map(|actual| actual == expected)
                .unwrap_or(false)
        })
    }
}

/// Transactional key-value store with range, rich-query and history access.
pub trait LedgerStore {
    type Scan: Iterator<Item = Result<KeyValue, ContractError>>;
    type History: Iterator<Item = Result<Modification, ContractError>>;

    fn get(&self, key: &String) -> Result<Option<Bytes>, ContractError>;

    /// Writes `value` under `key` and appends it to the key's change-log.
    fn put(&mut self, key: &String, value: &Bytes) -> Result<(), ContractError>;

    /// Removes `key`, recording a tombstone in its change-log. Removing an
    /// absent key is a no-op.
    fn delete(&mut self, key: &String) -> Result<(), ContractError>;

    /// Entries with `start <= key < end` in key order. An empty bound is
    /// open.
    fn range_scan(&self, start: &String, end: &String) -> Result<Self::Scan, ContractError>;

    /// Entries matching `selector` in key order.
    fn rich_query(&self, selector: &Selector) -> Result<Self::Scan, ContractError>;

    /// The change-log of `key`, oldest first. Empty for a key that was
    /// never written.
    fn history_for(&self, key: &String) -> Result<Self::History, ContractError>;
}

fn keep_alive<K: IntoVal<Env, Val>>(env: &Env, key: &K) {
    env.storage()
        .persistent()
        .extend_ttl(key, STATE_TTL_THRESHOLD, STATE_TTL_EXTEND_TO);
}

fn load_directory(env: &Env) -> KeyDirectory {
    let directory: Option<KeyDirectory> = env.storage().persistent().get(&KEY_DIR);
    match directory {
        Some(directory) => {
            keep_alive(env, &KEY_DIR);
            directory
        }
        None => KeyDirectory {
            pages: Vec::new(env),
            next_page: 0,
        },
    }
}

fn store_directory(env: &Env, directory: &KeyDirectory) {
    env.storage().persistent().set(&KEY_DIR, directory);
    keep_alive(env, &KEY_DIR);
}

fn load_page(env: &Env, page: u32) -> Result<Vec<String>, ContractError> {
    let page_key = (KEY_PAGE, page);
    let keys: Option<Vec<String>> = env.storage().persistent().get(&page_key);
    let Some(keys) = keys else {
        log!(env, "index page missing", page);
        return Err(ContractError::StoreFailure);
    };
    keep_alive(env, &page_key);
    Ok(keys)
}

fn store_page(env: &Env, page: u32, keys: &Vec<String>) {
    let page_key = (KEY_PAGE, page);
    env.storage().persistent().set(&page_key, keys);
    keep_alive(env, &page_key);
}

/// Slot of the page that holds, or would hold, `key`.
fn page_slot(pages: &Vec<IndexPage>, key: &String) -> u32 {
    let (mut low, mut high) = (0, pages.len());
    while low < high {
        let mid = low + (high - low) / 2;
        if pages.get_unchecked(mid).first <= *key {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low.saturating_sub(1)
}

fn lower_bound(keys: &Vec<String>, key: &String) -> u32 {
    match keys.binary_search(key) {
        Ok(pos) | Err(pos) => pos,
    }
}

/// [`LedgerStore`] over the contract's persistent storage.
///
/// One instance is one transaction: every write made through it carries
/// the same transaction id, allocated on the first write.
pub struct WorldState {
    env: Env,
    tx_id: Option<String>,
    limits: IndexLimits,
}

impl WorldState {
    pub fn begin(env: &Env) -> Self {
        WorldState {
            env: env.clone(),
            tx_id: None,
            limits: IndexLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: IndexLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Id of the transaction this instance writes under.
    pub fn tx_id(&mut self) -> String {
        if let Some(tx_id) = &self.tx_id {
            return tx_id.clone();
        }
        let tx_id = allocate_tx_id(&self.env);
        self.tx_id = Some(tx_id.clone());
        tx_id
    }

    fn index_insert(&self, key: &String) -> Result<(), ContractError> {
        let mut directory = load_directory(&self.env);
        if directory.pages.is_empty() {
            let page = directory.next_page;
            store_page(&self.env, page, &Vec::from_array(&self.env, [key.clone()]));
            directory.pages.push_back(IndexPage {
                first: key.clone(),
                page,
            });
            directory.next_page += 1;
            store_directory(&self.env, &directory);
            return Ok(());
        }

        let slot = page_slot(&directory.pages, key);
        let mut entry = directory.pages.get_unchecked(slot);
        let mut keys = load_page(&self.env, entry.page)?;
        let pos = match keys.binary_search(key) {
            Ok(_) => return Ok(()),
            Err(pos) => pos,
        };
        keys.insert(pos, key.clone());

        let mut directory_changed = false;
        if pos == 0 {
            entry.first = key.clone();
            directory.pages.set(slot, entry.clone());
            directory_changed = true;
        }

        if keys.len() > self.limits.page_capacity {
            if directory.pages.len() >= self.limits.max_pages {
                log!(&self.env, "key index full", key.clone());
                return Err(ContractError::StoreFailure);
            }
            let mid = keys.len() / 2;
            let upper = keys.slice(mid..);
            let page = directory.next_page;
            store_page(&self.env, entry.page, &keys.slice(..mid));
            store_page(&self.env, page, &upper);
            directory.pages.insert(
                slot + 1,
                IndexPage {
                    first: upper.get_unchecked(0),
                    page,
                },
            );
            directory.next_page += 1;
            directory_changed = true;
        } else {
            store_page(&self.env, entry.page, &keys);
        }

        if directory_changed {
            store_directory(&self.env, &directory);
        }
        Ok(())
    }

    fn index_remove(&self, key: &String) -> Result<(), ContractError> {
        let mut directory = load_directory(&self.env);
        if directory.pages.is_empty() {
            return Ok(());
        }

        let slot = page_slot(&directory.pages, key);
        let mut entry = directory.pages.get_unchecked(slot);
        let mut keys = load_page(&self.env, entry.page)?;
        let Ok(pos) = keys.binary_search(key) else {
            return Ok(());
        };
        keys.remove_unchecked(pos);

        if keys.is_empty() {
            self.env.storage().persistent().remove(&(KEY_PAGE, entry.page));
            directory.pages.remove_unchecked(slot);
            store_directory(&self.env, &directory);
            return Ok(());
        }

        store_page(&self.env, entry.page, &keys);
        if pos == 0 {
            entry.first = keys.get_unchecked(0);
            directory.pages.set(slot, entry);
            store_directory(&self.env, &directory);
        }
        Ok(())
    }

    /// Keeps the change-log and index page of a live key as long-lived as
    /// its value.
    fn retain(&self, key: &String) -> Result<(), ContractError> {
        let len_key = (HIST_LEN, key.clone());
        let len: u32 = self.env.storage().persistent().get(&len_key).unwrap_or(0);
        if len > 0 {
            keep_alive(&self.env, &len_key);
        }
        for n in 0..len {
            keep_alive(&self.env, &(HIST, key.clone(), n));
        }

        let directory = load_directory(&self.env);
        if !directory.pages.is_empty() {
            let entry = directory.pages.get_unchecked(page_slot(&directory.pages, key));
            load_page(&self.env, entry.page)?;
        }
        Ok(())
    }

    fn append_change(&mut self, key: &String, is_delete: bool, value: Option<Bytes>) {
        let change = Modification {
            tx_id: self.tx_id(),
            seconds: self.env.ledger().timestamp(),
            nanos: 0,
            is_delete,
            value,
        };

        let storage = self.env.storage().persistent();
        let len_key = (HIST_LEN, key.clone());
        let len: u32 = storage.get(&len_key).unwrap_or(0);
        let entry_key = (HIST, key.clone(), len);

        storage.set(&entry_key, &change);
        keep_alive(&self.env, &entry_key);
        storage.set(&len_key, &(len + 1));
        keep_alive(&self.env, &len_key);
    }

    fn scan(
        &self,
        start: Option<String>,
        end: Option<String>,
        selector: Option<Selector>,
    ) -> WorldScan {
        let directory = load_directory(&self.env);
        let slot = match &start {
            Some(start) if !directory.pages.is_empty() => page_slot(&directory.pages, start),
            _ => 0,
        };
        WorldScan {
            env: self.env.clone(),
            pages: directory.pages,
            slot,
            keys: Vec::new(&self.env),
            pos: 0,
            start,
            end,
            selector,
            done: false,
        }
    }
}

fn allocate_tx_id(env: &Env) -> String {
    let seq: u64 = env
        .storage()
        .instance()
        .get(&TX_SEQ)
        .unwrap_or(0u64)
        .saturating_add(1);
    env.storage().instance().set(&TX_SEQ, &seq);

    let material = (env.ledger().sequence(), env.ledger().timestamp(), seq).to_xdr(env);
    let digest = env.crypto().sha256(&material).to_bytes().to_array();
    hex_string(env, &digest)
}

fn bound(key: &String) -> Option<String> {
    if key.is_empty() {
        None
    } else {
        Some(key.clone())
    }
}

impl LedgerStore for WorldState {
    type Scan = WorldScan;
    type History = WorldHistory;

    fn get(&self, key: &String) -> Result<Option<Bytes>, ContractError> {
        let state_key = (STATE, key.clone());
        let value: Option<Bytes> = self.env.storage().persistent().get(&state_key);
        if value.is_some() {
            keep_alive(&self.env, &state_key);
            self.retain(key)?;
        }
        Ok(value)
    }

    fn put(&mut self, key: &String, value: &Bytes) -> Result<(), ContractError> {
        let state_key = (STATE, key.clone());
        let storage = self.env.storage().persistent();

        if !storage.has(&state_key) {
            self.index_insert(key)?;
        }

        storage.set(&state_key, value);
        keep_alive(&self.env, &state_key);
        self.append_change(key, false, Some(value.clone()));
        Ok(())
    }

    fn delete(&mut self, key: &String) -> Result<(), ContractError> {
        let state_key = (STATE, key.clone());
        let storage = self.env.storage().persistent();
        if !storage.has(&state_key) {
            return Ok(());
        }

        self.index_remove(key)?;
        storage.remove(&state_key);
        self.append_change(key, true, None);
        Ok(())
    }

    fn range_scan(&self, start: &String, end: &String) -> Result<WorldScan, ContractError> {
        Ok(self.scan(bound(start), bound(end), None))
    }

    fn rich_query(&self, selector: &Selector) -> Result<WorldScan, ContractError> {
        if selector.is_empty() {
            return Err(ContractError::MalformedQuery);
        }
        Ok(self.scan(None, None, Some(selector.clone())))
    }

    fn history_for(&self, key: &String) -> Result<WorldHistory, ContractError> {
        let len_key = (HIST_LEN, key.clone());
        let len: u32 = self.env.storage().persistent().get(&len_key).unwrap_or(0);
        if len > 0 {
            keep_alive(&self.env, &len_key);
        }
        Ok(WorldHistory {
            env: self.env.clone(),
            key: key.clone(),
            next: 0,
            len,
        })
    }
}

/// Cursor over the key index, loading one page at a time.
pub struct WorldScan {
    env: Env,
    pages: Vec<IndexPage>,
    slot: u32,
    keys: Vec<String>,
    pos: u32,
    start: Option<String>,
    end: Option<String>,
    selector: Option<Selector>,
    done: bool,
}

impl Iterator for WorldScan {
    type Item = Result<KeyValue, ContractError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.pos >= self.keys.len() {
                if self.slot >= self.pages.len() {
                    self.done = true;
                    break;
                }
                let entry = self.pages.get_unchecked(self.slot);
                self.slot += 1;
                match load_page(&self.env, entry.page) {
                    Ok(keys) => {
                        self.pos = match &self.start {
                            Some(start) => lower_bound(&keys, start),
                            None => 0,
                        };
                        self.keys = keys;
                    }
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
                continue;
            }

            let key = self.keys.get_unchecked(self.pos);
            self.pos += 1;
            if let Some(end) = &self.end {
                if key >= *end {
                    self.done = true;
                    break;
                }
            }

            let state_key = (STATE, key.clone());
            let value: Option<Bytes> = self.env.storage().persistent().get(&state_key);
            let Some(value) = value else {
                // Index entry without a value.
                self.done = true;
                return Some(Err(ContractError::StoreFailure));
            };
            keep_alive(&self.env, &state_key);

            if let Some(selector) = &self.selector {
                if !selector.matches(&self.env, &value) {
                    continue;
                }
            }
            return Some(Ok(KeyValue { key, value }));
        }
        None
    }
}

/// Cursor over one key's change-log.
pub struct WorldHistory {
    env: Env,
    key: String,
    next: u32,
    len: u32,
}

impl Iterator for WorldHistory {
    type Item = Result<Modification, ContractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let entry_key = (HIST, self.key.clone(), self.next);
        self.next += 1;

        let change: Option<Modification> = self.env.storage().persistent().get(&entry_key);
        match change {
            Some(change) => {
                keep_alive(&self.env, &entry_key);
                Some(Ok(change))
            }
            None => {
                self.next = self.len;
                Some(Err(ContractError::StoreFailure))
            }
        }
    }
}
