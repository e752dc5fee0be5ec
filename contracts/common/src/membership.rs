use soroban_sdk::{symbol_short, Address, Env, String, Symbol};

const MEMBER: Symbol = symbol_short!("MEMBER");
const MEMBER_TTL_THRESHOLD: u32 = 518_400; // ~30 days
const MEMBER_TTL_EXTEND_TO: u32 = 3_110_400; // ~180 days

fn member_key(address: &Address) -> (Symbol, Address) {
    (MEMBER, address.clone())
}

fn extend_member_ttl(env: &Env, key: &(Symbol, Address)) {
    env.storage()
        .persistent()
        .extend_ttl(key, MEMBER_TTL_THRESHOLD, MEMBER_TTL_EXTEND_TO);
}

/// Enrolls an address under an organization principal, replacing any
/// previous enrollment.
pub fn enroll(env: &Env, address: &Address, org: &String) {
    let key = member_key(address);
    env.storage().persistent().set(&key, org);
    extend_member_ttl(env, &key);
}

/// Removes an address from the registry.
pub fn revoke(env: &Env, address: &Address) {
    env.storage().persistent().remove(&member_key(address));
}

/// Returns the organization an address is enrolled under.
pub fn org_of(env: &Env, address: &Address) -> Option<String> {
    let key = member_key(address);
    let org: Option<String> = env.storage().persistent().get(&key);
    if org.is_some() {
        extend_member_ttl(env, &key);
    }
    org
}

/// Returns whether the address is enrolled at all.
pub fn is_enrolled(env: &Env, address: &Address) -> bool {
    env.storage().persistent().has(&member_key(address))
}
