//! Across SpokePool bindings.
//!
//! The keeper only touches the refund surface of the SpokePool: claimable
//! relayer refunds from settled bundles, and `FilledRelay` events used to
//! estimate refunds from the not-yet-settled bundle.

use alloy_sol_types::sol;

sol! {
    /// SpokePool - per-chain contract paying relayer refunds
    #[sol(rpc)]
    interface ISpokePool {
        /// Emitted when a relay is filled on the destination chain
        event FilledRelay(
            bytes32 inputToken,
            bytes32 outputToken,
            uint256 inputAmount,
            uint256 outputAmount,
            uint256 repaymentChainId,
            uint256 indexed originChainId,
            uint256 indexed depositId,
            uint32 fillDeadline,
            uint32 exclusivityDeadline,
            bytes32 exclusiveRelayer,
            bytes32 indexed relayer,
            bytes32 depositor,
            bytes32 recipient,
            bytes32 messageHash
        );

        /// Emitted when a relayer refund is claimed
        event ClaimedRelayerRefund(
            address indexed token,
            address indexed relayer,
            uint256 amount
        );

        /// Query claimable relayer refund for a given token
        function getRelayerRefund(address token, address relayer)
            external view returns (uint256);
    }
}
