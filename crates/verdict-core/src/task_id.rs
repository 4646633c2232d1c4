//! Deterministic task identification.
//!
//! A task id is the BLAKE3 digest of `(submitter, task_type, input)`.
//! The id is both the task's sole identifier and a content-binding
//! commitment: resubmitting the same triple yields the same id (and is
//! rejected as a duplicate), while any change to submitter, type, or
//! input yields a different id.

use crate::identity::Identity;
use crate::task::TaskType;

/// Task identifier — BLAKE3 digest of the submission triple.
pub type TaskId = [u8; 32];

/// Compute the id for a `(submitter, task_type, input)` triple.
///
/// The submitter is fixed-width and the type is a single byte, so the
/// concatenation is unambiguous without length prefixes.
pub fn task_id(submitter: &Identity, task_type: TaskType, input: &[u8]) -> TaskId {
    let mut h = blake3::Hasher::new();
    h.update(submitter);
    h.update(&[task_type.as_u8()]);
    h.update(input);
    *h.finalize().as_bytes()
}

/// Hash a byte slice, returning a 32-byte BLAKE3 digest.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}
