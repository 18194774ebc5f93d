#[cfg(test)]
pub mod common;

mod atomic_persistence;
mod expiration_and_cache;
mod token_round_trip;
