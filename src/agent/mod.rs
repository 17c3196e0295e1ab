//! LLM agent modules for business-intelligence questions.
//!
//! This module provides the tool-calling agent and the registry of analysis
//! tools it can call.

pub mod agent_loop;
pub mod tools;

pub use agent_loop::{AgentConfig, BiAgent};
