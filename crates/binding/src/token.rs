//! ERC20 and wrapped-native token contract bindings.

use alloy_sol_types::sol;

sol! {
    /// Standard ERC20 token interface
    #[sol(rpc)]
    interface ERC20 {
        /// Emitted when tokens are transferred
        event Transfer(
            address indexed from,
            address indexed to,
            uint256 value
        );

        /// Emitted when an allowance is set
        event Approval(
            address indexed owner,
            address indexed spender,
            uint256 value
        );

        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Get allowance granted by owner to spender
        function allowance(address owner, address spender) external view returns (uint256);

        /// Approve spender to spend tokens
        function approve(address spender, uint256 amount) external returns (bool);

        /// Get token symbol
        function symbol() external view returns (string memory);

        /// Get token decimals
        function decimals() external view returns (uint8);
    }
}

sol! {
    /// WETH9 wrapped-native token.
    ///
    /// `deposit` wraps native into WETH, `withdraw` unwraps WETH back into
    /// the native gas token on the same chain.
    #[sol(rpc)]
    interface WETH9 {
        /// Emitted when native is wrapped
        event Deposit(address indexed dst, uint256 wad);

        /// Emitted when WETH is unwrapped
        event Withdrawal(address indexed src, uint256 wad);

        /// Wrap msg.value native into WETH
        function deposit() external payable;

        /// Unwrap WETH into native, credited to the caller
        function withdraw(uint256 wad) external;

        /// Get WETH balance of an account
        function balanceOf(address account) external view returns (uint256);
    }
}
