//! Password digests.
//!
//! Digests are plain unsalted SHA-256 rendered as lowercase hex, so they match
//! records written by earlier deployments of the service byte for byte.

use data_encoding::HEXLOWER;
use ring::digest;

/// Length in characters of every digest returned by [`hash_password`].
pub const DIGEST_LEN: usize = 64;

pub fn hash_password(password: &str) -> String {
    HEXLOWER.encode(digest::digest(&digest::SHA256, password.as_bytes()).as_ref())
}

/// Returns true when `password` hashes to `digest`.
pub fn verify_password(password: &str, digest: &str) -> bool {
    hash_password(password) == digest
}
