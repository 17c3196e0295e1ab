//! monday.com board source.

pub mod client;

pub use client::MondayClient;
