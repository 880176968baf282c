pub mod assembler;
pub mod config;
pub mod error;
pub mod flows;
pub mod instructions;
pub mod layout;
pub mod pda;
pub mod selector;
pub mod solana_client;
pub mod state;
pub mod telemetry;
