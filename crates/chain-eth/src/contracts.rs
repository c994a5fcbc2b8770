//! Contract method catalog.
//!
//! Every method the client can call is a typed `sol!` call struct. An
//! [`AbiKind`] names which method set a contract handle is bound to and owns a
//! table of the 4-byte selectors that set contains.

use std::fmt;
use std::str::FromStr;

use alloy_sol_types::{sol, SolCall};
use serde::{Deserialize, Serialize};

use crate::error::EthError;

sol! {
    #![sol(all_derives)]

    /// One constituent token of a bundle.
    struct BundleItem {
        address token;
        uint256 tokenId;
    }

    /// A registered modifier contract on the allow-list.
    struct EffectInfo {
        address modificatorsContract;
        string serverUrl;
        address owner;
        address originalContract;
    }

    /// Enumerable NFT collection with the minting extension.
    interface INftCollection {
        function name() external view returns (string name);
        function symbol() external view returns (string symbol);
        function totalSupply() external view returns (uint256 supply);
        function balanceOf(address owner) external view returns (uint256 balance);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256 tokenId);
        function tokenURI(uint256 tokenId) external view returns (string uri);
        function getApproved(uint256 tokenId) external view returns (address operator);
        function approve(address to, uint256 tokenId) external;
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
        function mintItem(address owner, string metaCid) external returns (uint256 tokenId);
    }

    /// Bundle operations layered on top of a collection.
    interface IBundle {
        function bundleWithTokenURI(BundleItem[] tokens, string tokenUri) external returns (uint256 bundleId);
        function addNFTsToBundle(uint256 bundleId, BundleItem[] tokens, string tokenUri) external;
        function removeNFTsFromBundle(uint256 bundleId, BundleItem[] tokens, string tokenUri) external;
    }

    /// Registry of modifier contracts allowed to apply effects.
    interface IAllowList {
        function name() external view returns (string name);
        function symbol() external view returns (string symbol);
        function totalSupply() external view returns (uint256 supply);
        function getEffectInfos() external view returns (EffectInfo[] infos);
        function addToList(EffectInfo info) external;
        function removeFromList(address modificatorsContract) external;
        function checkPermission(address applyTo, address modifyWith) external view returns (bool allowed);
    }
}

const COLLECTION_METHODS: &[[u8; 4]] = &[
    INftCollection::nameCall::SELECTOR,
    INftCollection::symbolCall::SELECTOR,
    INftCollection::totalSupplyCall::SELECTOR,
    INftCollection::balanceOfCall::SELECTOR,
    INftCollection::tokenOfOwnerByIndexCall::SELECTOR,
    INftCollection::tokenURICall::SELECTOR,
    INftCollection::getApprovedCall::SELECTOR,
    INftCollection::approveCall::SELECTOR,
    INftCollection::safeTransferFromCall::SELECTOR,
    INftCollection::mintItemCall::SELECTOR,
];

const BUNDLE_METHODS: &[[u8; 4]] = &[
    IBundle::bundleWithTokenURICall::SELECTOR,
    IBundle::addNFTsToBundleCall::SELECTOR,
    IBundle::removeNFTsFromBundleCall::SELECTOR,
];

const ALLOW_LIST_METHODS: &[[u8; 4]] = &[
    IAllowList::nameCall::SELECTOR,
    IAllowList::symbolCall::SELECTOR,
    IAllowList::totalSupplyCall::SELECTOR,
    IAllowList::getEffectInfosCall::SELECTOR,
    IAllowList::addToListCall::SELECTOR,
    IAllowList::removeFromListCall::SELECTOR,
    IAllowList::checkPermissionCall::SELECTOR,
];

/// Which method set a contract handle is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiKind {
    /// Plain NFT collection.
    #[default]
    Collection,
    /// Collection that can also aggregate tokens into bundles.
    Bundle,
    AllowList,
}

impl AbiKind {
    /// Whether the method with `selector` belongs to this method set.
    pub fn supports(&self, selector: [u8; 4]) -> bool {
        match self {
            AbiKind::Collection => COLLECTION_METHODS.contains(&selector),
            AbiKind::Bundle => {
                COLLECTION_METHODS.contains(&selector) || BUNDLE_METHODS.contains(&selector)
            }
            AbiKind::AllowList => ALLOW_LIST_METHODS.contains(&selector),
        }
    }

    pub fn supports_call<C: SolCall>(&self) -> bool {
        self.supports(C::SELECTOR)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AbiKind::Collection => "collection",
            AbiKind::Bundle => "bundle",
            AbiKind::AllowList => "allow_list",
        }
    }
}

impl fmt::Display for AbiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbiKind {
    type Err = EthError;

    /// Accepts the snake_case names as well as the legacy `common` and
    /// `allowList` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collection" | "common" => Ok(AbiKind::Collection),
            "bundle" => Ok(AbiKind::Bundle),
            "allow_list" | "allowList" => Ok(AbiKind::AllowList),
            other => Err(EthError::EncodingError(format!("unknown abi kind: {other}"))),
        }
    }
}
