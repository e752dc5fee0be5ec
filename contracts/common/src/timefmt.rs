//! UTC timestamp rendering for ledger attribution fields.
//!
//! Timestamps are rendered as `YYYY-MM-DDTHH:MM:SSZ` (RFC 3339 without
//! fractional seconds), so lexicographic order matches chronological order.

use soroban_sdk::{Env, String};

use crate::text::ascii_string;

/// Length of a rendered timestamp.
pub const RFC3339_LEN: usize = 20;

/// Last instant representable with a four-digit year.
pub const MAX_SECONDS: u64 = 253_402_300_799; // 9999-12-31T23:59:59Z

const SECONDS_PER_DAY: u64 = 86_400;
const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Converts days since 1970-01-01 into a proleptic Gregorian date.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

fn put_digits(buf: &mut [u8], mut value: u64) {
    for slot in buf.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }
}

/// Renders seconds and nanoseconds since the Unix epoch.
///
/// Nanoseconds past a whole second carry into `seconds`; the fraction is
/// dropped. Instants past year 9999 saturate at [`MAX_SECONDS`].
pub fn rfc3339_bytes(seconds: u64, nanos: u32) -> [u8; RFC3339_LEN] {
    let seconds = seconds
        .saturating_add(u64::from(nanos / NANOS_PER_SECOND))
        .min(MAX_SECONDS);

    let (year, month, day) = civil_from_days(seconds / SECONDS_PER_DAY);
    let secs_of_day = seconds % SECONDS_PER_DAY;

    let mut buf = *b"0000-00-00T00:00:00Z";
    put_digits(&mut buf[0..4], year);
    put_digits(&mut buf[5..7], month);
    put_digits(&mut buf[8..10], day);
    put_digits(&mut buf[11..13], secs_of_day / 3_600);
    put_digits(&mut buf[14..16], (secs_of_day % 3_600) / 60);
    put_digits(&mut buf[17..19], secs_of_day % 60);
    buf
}

/// Renders a timestamp as a contract string.
pub fn format_rfc3339(env: &Env, seconds: u64, nanos: u32) -> String {
    ascii_string(env, &rfc3339_bytes(seconds, nanos))
}
