#![forbid(unsafe_code)]

pub mod classify;
pub mod ids;
pub mod record;
pub mod schedule;
