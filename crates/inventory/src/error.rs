use alloy_primitives::Address;
use thiserror::Error;

/// Errors surfaced by the inventory core.
///
/// Selector errors propagate to the caller deciding one fill's repayment.
/// Cycle-level operations catch everything at the cycle boundary instead.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// A fill's input and output tokens are not the same underlying asset.
    /// The core assumes 1:1 fills and cannot reason about mixed tokens.
    #[error(
        "input token {input} on chain {origin} is not equivalent to \
         output token {output} on chain {destination}"
    )]
    TokenMismatch {
        input: Address,
        origin: u64,
        output: Address,
        destination: u64,
    },

    /// A managed L1 token has no metadata in the route registry.
    /// The configuration is broken; the cycle cannot proceed.
    #[error("no token info for managed token {0}")]
    MissingTokenInfo(Address),

    /// A token observed on a chain has no known canonical counterpart.
    #[error("no canonical token known for {token} on chain {chain_id}")]
    UnknownL2Token { token: Address, chain_id: u64 },

    /// Collaborator failure (RPC read, bundle fetch, adapter submission).
    #[error(transparent)]
    Other(#[from] eyre::Report),
}
