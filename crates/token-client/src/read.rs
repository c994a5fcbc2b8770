//! Read path.
//!
//! Reads degrade instead of failing: a field that cannot be fetched is logged
//! and left at its previous value.

use alloy_primitives::{Address, U256};
use chain_eth::contracts::INftCollection;
use futures::stream::{self, StreamExt};

use crate::token::TokenContract;
use crate::types::{AssetMetadata, BalanceState, TokenRef};

/// Upper bound on tokens enumerated for one account.
pub const MAX_ENUMERATED_TOKENS: u64 = 10_000;

/// Index lookups in flight at once.
const INDEX_READ_CONCURRENCY: usize = 16;

impl TokenContract {
    /// Reads `name()` and `symbol()` independently; either may stay unset.
    pub async fn fetch_metadata(&mut self) -> &AssetMetadata {
        let contract = self.handle.instance();

        match contract.read(INftCollection::nameCall {}).await {
            Ok(name) => self.metadata.name = Some(name),
            Err(e) => {
                tracing::warn!(contract = %contract.address(), error = %e, "name() read failed")
            }
        }

        match contract.read(INftCollection::symbolCall {}).await {
            Ok(symbol) => self.metadata.symbol = Some(symbol),
            Err(e) => {
                tracing::warn!(contract = %contract.address(), error = %e, "symbol() read failed")
            }
        }

        &self.metadata
    }

    /// Reads `balanceOf(identity)`. On failure the balance stays unknown and
    /// 0 is returned.
    pub async fn fetch_balance(&mut self, identity: Address) -> u64 {
        self.forget_other_account(identity);
        let contract = self.handle.instance();

        let balance = match contract.read(INftCollection::balanceOfCall { owner: identity }).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(contract = %contract.address(), %identity, error = %e, "balanceOf read failed");
                return self.metadata.balance.value();
            }
        };

        match u64::try_from(balance) {
            Ok(balance) => {
                self.metadata.balance = BalanceState::Fetched {
                    owner: identity,
                    balance,
                };
                balance
            }
            Err(_) => {
                tracing::warn!(contract = %contract.address(), %identity, %balance, "balance out of range");
                self.metadata.balance.value()
            }
        }
    }

    /// Enumerates the tokens `identity` owns.
    ///
    /// Uses the balance already fetched for `identity` when there is one.
    /// Index lookups run concurrently in bounded batches and results keep
    /// index order. At most [`MAX_ENUMERATED_TOKENS`] are enumerated. If any
    /// lookup fails the token list is left unchanged.
    pub async fn fetch_owned_tokens(&mut self, identity: Address) -> Vec<TokenRef> {
        self.forget_other_account(identity);
        let balance = match self.metadata.balance.known_for(identity) {
            Some(balance) => balance,
            None => self.fetch_balance(identity).await,
        };

        let contract = self.handle.instance();
        let count = if balance > MAX_ENUMERATED_TOKENS {
            tracing::warn!(
                contract = %contract.address(),
                %identity,
                balance,
                limit = MAX_ENUMERATED_TOKENS,
                "balance above enumeration limit, truncating"
            );
            MAX_ENUMERATED_TOKENS
        } else {
            balance
        };

        let results: Vec<_> = stream::iter(0..count)
            .map(move |index| {
                contract.read(INftCollection::tokenOfOwnerByIndexCall {
                    owner: identity,
                    index: U256::from(index),
                })
            })
            .buffered(INDEX_READ_CONCURRENCY)
            .collect()
            .await;

        let token_ids: Result<Vec<U256>, _> = results.into_iter().collect();
        match token_ids {
            Ok(token_ids) => {
                tracing::debug!(contract = %contract.address(), %identity, count = token_ids.len(), "owned tokens enumerated");
                let contract_address = contract.address();
                self.metadata.tokens = token_ids
                    .into_iter()
                    .map(|token_id| TokenRef {
                        token_id,
                        contract_address,
                        owner_address: identity,
                    })
                    .collect();
            }
            Err(e) => {
                tracing::warn!(contract = %contract.address(), %identity, error = %e, "token enumeration failed");
            }
        }

        self.metadata.tokens.clone()
    }

    /// Drops a balance or token list read for a different account.
    fn forget_other_account(&mut self, identity: Address) {
        let balance_owner = self.metadata.balance.owner();
        let tokens_owner = self.metadata.tokens.first().map(|token| token.owner_address);
        let stale = |owner: Option<Address>| owner.is_some_and(|owner| owner != identity);

        if stale(balance_owner) || stale(tokens_owner) {
            tracing::debug!(contract = %self.address(), %identity, "discarding reads for another account");
            self.metadata.balance = BalanceState::Unknown;
            self.metadata.tokens.clear();
        }
    }

    /// Metadata, balance and owned tokens for `identity`, fetched in that order.
    pub async fn get_object_for_user(&mut self, identity: Address) -> AssetMetadata {
        tracing::info!(contract = %self.address(), %identity, "loading collection for user");
        self.fetch_metadata().await;
        self.fetch_balance(identity).await;
        self.fetch_owned_tokens(identity).await;
        self.metadata.clone()
    }

    /// `totalSupply()`, or zero when it cannot be read.
    pub async fn total_supply(&self) -> U256 {
        let contract = self.handle.instance();
        match contract.read(INftCollection::totalSupplyCall {}).await {
            Ok(supply) => supply,
            Err(e) => {
                tracing::warn!(contract = %contract.address(), error = %e, "totalSupply read failed");
                U256::ZERO
            }
        }
    }
}
