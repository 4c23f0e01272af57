//! Contract bindings for all external contracts.
//!
//! This crate consolidates all Solidity contract interfaces used across the project:
//! - ERC20 tokens and the WETH9 wrapped-native token
//! - OP Stack canonical bridge (L1StandardBridge, L2StandardBridge)
//! - Across SpokePool (relayer refund surface)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod bridge;
pub mod spoke;
pub mod token;
