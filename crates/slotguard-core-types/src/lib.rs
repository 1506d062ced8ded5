//! Core types shared across slotguard facilities
//!
//! This crate provides the canonical field keys and event names used by the
//! logging facility and by anything that inspects structured log output.

pub mod schema;
