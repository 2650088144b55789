//! Library crate for seven-seconds: the client-side scoring core, its ledger
//! collaborators and the reference ledger server, shared by the binaries and
//! integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod routes;
pub mod scoring;
pub mod services;
pub mod state;
