//! OP Stack canonical bridge bindings.
//!
//! The keeper moves hub-chain capital to L2s through the canonical standard
//! bridge:
//! - L1StandardBridge (hub side, deposits)
//! - L2StandardBridge (L2 side, finalization events only)

use alloy_sol_types::sol;

sol! {
    /// L1StandardBridge - hub-side entry point for canonical ERC20 deposits
    #[sol(rpc)]
    interface L1StandardBridge {
        /// Emitted when an ERC20 deposit toward L2 is initiated
        event ERC20DepositInitiated(
            address indexed l1Token,
            address indexed l2Token,
            address indexed from,
            address to,
            uint256 amount,
            bytes extraData
        );

        /// Bridge ERC20 tokens to a recipient on L2
        function depositERC20To(
            address _l1Token,
            address _l2Token,
            address _to,
            uint256 _amount,
            uint32 _minGasLimit,
            bytes calldata _extraData
        ) external;
    }

    /// L2StandardBridge - L2 predeploy, observed for deposit finalization
    /// Address: 0x4200000000000000000000000000000000000010 (on all OP Stack chains)
    #[sol(rpc)]
    interface L2StandardBridge {
        /// Emitted when a deposit from L1 is credited on L2
        event DepositFinalized(
            address indexed l1Token,
            address indexed l2Token,
            address indexed from,
            address to,
            uint256 amount,
            bytes extraData
        );
    }
}
