//! crates/lookup_core/src/oracle.rs
//!
//! The deterministic stand-in for a real lookup backend.

use crate::domain::{ResultData, SearchResult};

/// Rolling 31-multiplier hash over UTF-16 code units, wrapped to `i32` at every step.
pub fn username_hash(username: &str) -> i32 {
    username
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Maps a username to a stable verdict. Case is normalized before hashing.
pub fn oracle(username: &str) -> SearchResult {
    // unsigned_abs keeps i32::MIN in range
    let hash = username_hash(&username.to_lowercase()).unsigned_abs();
    if hash % 10 < 2 {
        SearchResult::found(ResultData::Text(format!("شماره: {}", hash % 1_000_000)))
    } else {
        SearchResult::not_found()
    }
}
