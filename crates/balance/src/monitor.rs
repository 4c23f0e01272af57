use crate::{Balance, BalanceQuery, Monitor};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use binding::token::ERC20;
use client::ProviderPool;
use tracing::debug;

const NATIVE_TOKEN_ADDRESS: Address = Address::ZERO;

/// Balance monitor backed by the per-chain provider pool.
#[derive(Clone)]
pub struct ChainMonitor {
    pool: ProviderPool,
}

impl ChainMonitor {
    pub const fn new(pool: ProviderPool) -> Self {
        Self { pool }
    }

    async fn query_erc20(
        &self,
        chain_id: u64,
        token: Address,
        holder: Address,
    ) -> eyre::Result<Balance> {
        debug!(chain_id, %token, %holder, "Querying ERC20 balance");

        let provider = self.pool.get(chain_id)?;
        let contract = ERC20::new(token, provider.clone());
        let amount: U256 = contract.balanceOf(holder).call().await?;

        Ok(Balance {
            chain_id,
            holder,
            asset: token,
            amount,
        })
    }

    async fn query_native(&self, chain_id: u64, holder: Address) -> eyre::Result<Balance> {
        debug!(chain_id, %holder, "Querying native balance");

        let provider = self.pool.get(chain_id)?;
        let amount = provider.get_balance(holder).await?;

        Ok(Balance {
            chain_id,
            holder,
            asset: NATIVE_TOKEN_ADDRESS,
            amount,
        })
    }
}

impl Monitor for ChainMonitor {
    async fn query_balance(&self, query: BalanceQuery) -> eyre::Result<Balance> {
        match query {
            BalanceQuery::Erc20 {
                chain_id,
                token,
                holder,
            } => self.query_erc20(chain_id, token, holder).await,
            BalanceQuery::Native { chain_id, holder } => {
                self.query_native(chain_id, holder).await
            }
        }
    }
}
