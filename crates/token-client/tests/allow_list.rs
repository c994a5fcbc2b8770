//! Allow-list registration, listing and permission checks.

mod common;

use alloy_primitives::{Address, U256};
use chain_eth::contracts::EffectInfo;
use common::*;
use token_client::{
    AbiKind, AllowListRegistration, ClientError, ContractMeta, RpcError, TokenContract,
};

const MODIFIER: Address = COLLECTION;
const SECOND_MODIFIER: Address = SECOND_COLLECTION;

fn setup() -> std::sync::Arc<MockChain> {
    let chain = MockChain::new();
    chain.deploy(ALLOW_LIST, MockContract::named("Allow list", "ALW"));
    chain.deploy(MODIFIER, MockContract::named("Glow", "GLW").with_tokens(USER, &[1, 2]));
    chain.deploy(SECOND_MODIFIER, MockContract::named("Frame", "FRM"));
    chain
}

fn registration(contract: Address, only_for: Option<Address>) -> AllowListRegistration {
    AllowListRegistration {
        contract_address: contract,
        server_url: "https://effects.example".to_string(),
        owner: USER,
        only_for,
    }
}

#[tokio::test]
async fn unrestricted_entry_is_stored_with_zero_address() {
    let chain = setup();
    let session = session(&chain, USER);
    let allow_list = TokenContract::new(&session, None, AbiKind::AllowList).unwrap();

    allow_list
        .add_contract_to_white_list(registration(MODIFIER, None))
        .await
        .unwrap();

    let stored: Vec<EffectInfo> = chain.contract(ALLOW_LIST).effect_infos;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].originalContract, Address::ZERO);
    assert_eq!(stored[0].modificatorsContract, MODIFIER);

    let entries = allow_list.get_white_list_contracts(false).await.unwrap();
    assert_eq!(entries[0].only_for, None);
    assert_eq!(entries[0].server_url, "https://effects.example");
    assert!(entries[0].meta.is_none());
}

#[tokio::test]
async fn listing_with_meta_reads_each_modifier() {
    let chain = setup();
    let session = session(&chain, USER);
    let allow_list = TokenContract::at(&session, ALLOW_LIST, AbiKind::AllowList);

    allow_list
        .add_contract_to_white_list(registration(MODIFIER, None))
        .await
        .unwrap();
    allow_list
        .add_contract_to_white_list(registration(SECOND_MODIFIER, Some(BUNDLE)))
        .await
        .unwrap();

    let entries = allow_list.get_white_list_contracts(true).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0].meta,
        Some(ContractMeta {
            name: Some("Glow".to_string()),
            symbol: Some("GLW".to_string()),
            total_supply: U256::from(2),
        })
    );
    assert_eq!(entries[1].only_for, Some(BUNDLE));
    assert_eq!(
        entries[1].meta.as_ref().and_then(|meta| meta.name.as_deref()),
        Some("Frame")
    );
}

#[tokio::test]
async fn removal_and_permission_check() {
    let chain = setup();
    chain
        .state()
        .contracts
        .get_mut(&ALLOW_LIST)
        .unwrap()
        .permissions
        .insert((BUNDLE, MODIFIER));
    let session = session(&chain, USER);
    let allow_list = TokenContract::at(&session, ALLOW_LIST, AbiKind::AllowList);

    assert!(allow_list.check_apply_effect(BUNDLE, MODIFIER).await.unwrap());
    assert!(!allow_list.check_apply_effect(BUNDLE, SECOND_MODIFIER).await.unwrap());

    allow_list
        .add_contract_to_white_list(registration(MODIFIER, None))
        .await
        .unwrap();
    allow_list.remove_contract_from_white_list(MODIFIER).await.unwrap();
    assert!(allow_list.get_white_list_contracts(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_registration() {
    let chain = setup();
    chain.state().reject_next_send = Some(RpcError::Response {
        code: 4001,
        message: "User denied transaction signature.".to_string(),
    });
    let session = session(&chain, USER);
    let allow_list = TokenContract::at(&session, ALLOW_LIST, AbiKind::AllowList);

    let err = allow_list
        .add_contract_to_white_list(registration(MODIFIER, None))
        .await
        .unwrap_err();
    assert_eq!(err, ClientError::UserRejected);
    assert!(chain.contract(ALLOW_LIST).effect_infos.is_empty());
}

#[tokio::test]
async fn unreadable_list_is_an_error() {
    let chain = setup();
    let session = session(&chain, USER);
    let allow_list = TokenContract::at(&session, BUNDLE, AbiKind::AllowList);

    // No contract deployed at the address.
    let err = allow_list.get_white_list_contracts(false).await.unwrap_err();
    assert!(matches!(err, ClientError::TransactionFailed(_)));
}
