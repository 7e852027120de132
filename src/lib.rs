pub mod abi;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod confirm;
pub mod entity;
pub mod events;
pub mod mirror;
pub mod monitor;
pub mod networks;
pub mod relay;
pub mod signer;
pub mod stats;
