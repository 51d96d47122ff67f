//! franklinbridge - Bridge between a FranklinWH energy gateway and Home Assistant.
//! A polling coordinator keeps the gateway data, entities project it into Home Assistant states.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod coordinator;
pub mod core;
pub mod diagnostics;
pub mod entities;
pub mod integration;
pub mod server;
pub mod services;
