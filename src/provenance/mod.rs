//! Provenance: BLAKE3 descriptor hashing and the append-only event log.

pub mod eventlog;
pub mod hasher;
