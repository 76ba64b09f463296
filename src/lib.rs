//! Cutoff-block analysis of Brazilian proportional elections.
//!
//! Given a candidate slug such as `pe-maria-souza`, the crate resolves the
//! candidate against the TSE vote tables served by PostgREST, picks the most
//! recent elections they ran in, and measures how close they came to a seat:
//! their place in the cutoff block, the nearest rivals above them and how
//! efficiently each party converted block presence into seats.

pub mod analysis;
pub mod commands;
pub mod config;
pub mod database;
pub mod model;
pub mod server;
pub mod service;
pub mod slug;
pub mod source;
