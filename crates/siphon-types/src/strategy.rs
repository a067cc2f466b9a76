use std::{collections::HashMap, fmt, str::FromStr, sync::LazyLock};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A category of indexing interest. Each strategy claims a fixed set of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexingStrategy {
    NftCurrentBids,
    NftCurrentPrices,
    TokensAvailableToBorrow,
    TokenCrossPlatformPrices,
}

const NFT_CURRENT_BIDS: &[&str] = &[
    "NFT_BID",
    "NFT_BID_CANCELLED",
    "NFT_GLOBAL_BID",
    "NFT_GLOBAL_BID_CANCELLED",
    "NFT_AUCTION_CREATED",
    "NFT_AUCTION_UPDATED",
    "NFT_AUCTION_CANCELLED",
    "NFT_SALE",
];

const NFT_CURRENT_PRICES: &[&str] = &[
    "NFT_LISTING",
    "NFT_CANCEL_LISTING",
    "NFT_SALE",
    "UPDATE_ITEM",
    "LIST_ITEM",
    "DELIST_ITEM",
    "NFT_RENT_LISTING",
    "NFT_RENT_UPDATE_LISTING",
    "NFT_RENT_CANCEL_LISTING",
];

const TOKENS_AVAILABLE_TO_BORROW: &[&str] = &[
    "LOAN",
    "RESCIND_LOAN",
    "OFFER_LOAN",
    "REPAY_LOAN",
    "TAKE_LOAN",
    "FORECLOSE_LOAN",
    "ADD_TO_POOL",
    "REMOVE_FROM_POOL",
    "DEPOSIT",
    "WITHDRAW",
];

const TOKEN_CROSS_PLATFORM_PRICES: &[&str] = &[
    "SWAP",
    "INIT_SWAP",
    "CANCEL_SWAP",
    "REJECT_SWAP",
    "TOKEN_MINT",
    "TRANSFER",
    "PLATFORM_FEE",
    "FILL_ORDER",
    "UPDATE_ORDER",
    "CREATE_ORDER",
    "CLOSE_ORDER",
    "CANCEL_ORDER",
];

/// Precedence used when two strategies claim the same event type: the earlier one wins.
const PRECEDENCE: [IndexingStrategy; 4] = [
    IndexingStrategy::NftCurrentPrices,
    IndexingStrategy::NftCurrentBids,
    IndexingStrategy::TokensAvailableToBorrow,
    IndexingStrategy::TokenCrossPlatformPrices,
];

static BY_EVENT_TYPE: LazyLock<HashMap<&'static str, IndexingStrategy>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for strategy in PRECEDENCE {
        for event_type in strategy.event_types() {
            table.entry(*event_type).or_insert(strategy);
        }
    }
    table
});

impl IndexingStrategy {
    pub const ALL: [IndexingStrategy; 4] = [
        IndexingStrategy::NftCurrentBids,
        IndexingStrategy::NftCurrentPrices,
        IndexingStrategy::TokensAvailableToBorrow,
        IndexingStrategy::TokenCrossPlatformPrices,
    ];

    /// Map an event type string to the strategy that owns it, if any.
    pub fn classify(event_type: &str) -> Option<IndexingStrategy> {
        BY_EVENT_TYPE.get(event_type).copied()
    }

    pub fn event_types(&self) -> &'static [&'static str] {
        match self {
            IndexingStrategy::NftCurrentBids => NFT_CURRENT_BIDS,
            IndexingStrategy::NftCurrentPrices => NFT_CURRENT_PRICES,
            IndexingStrategy::TokensAvailableToBorrow => TOKENS_AVAILABLE_TO_BORROW,
            IndexingStrategy::TokenCrossPlatformPrices => TOKEN_CROSS_PLATFORM_PRICES,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexingStrategy::NftCurrentBids => "nft_current_bids",
            IndexingStrategy::NftCurrentPrices => "nft_current_prices",
            IndexingStrategy::TokensAvailableToBorrow => "tokens_available_to_borrow",
            IndexingStrategy::TokenCrossPlatformPrices => "token_cross_platform_prices",
        }
    }
}

impl fmt::Display for IndexingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown indexing strategy `{0}`")]
pub struct UnknownStrategy(pub String);

impl FromStr for IndexingStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndexingStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("NFT_BID", IndexingStrategy::NftCurrentBids)]
    #[case("NFT_AUCTION_CANCELLED", IndexingStrategy::NftCurrentBids)]
    #[case("NFT_LISTING", IndexingStrategy::NftCurrentPrices)]
    #[case("NFT_RENT_CANCEL_LISTING", IndexingStrategy::NftCurrentPrices)]
    #[case("NFT_SALE", IndexingStrategy::NftCurrentPrices)]
    #[case("FORECLOSE_LOAN", IndexingStrategy::TokensAvailableToBorrow)]
    #[case("WITHDRAW", IndexingStrategy::TokensAvailableToBorrow)]
    #[case("SWAP", IndexingStrategy::TokenCrossPlatformPrices)]
    #[case("CANCEL_ORDER", IndexingStrategy::TokenCrossPlatformPrices)]
    fn test_classify(#[case] event_type: &str, #[case] expected: IndexingStrategy) {
        assert_eq!(IndexingStrategy::classify(event_type), Some(expected));
    }

    #[rstest]
    #[case("UNKNOWN")]
    #[case("")]
    #[case("nft_sale")]
    #[case("COMPRESSED_NFT_MINT")]
    fn test_classify_unknown(#[case] event_type: &str) {
        assert_eq!(IndexingStrategy::classify(event_type), None);
    }

    #[test]
    fn test_every_owned_type_classifies_to_its_owner_unless_shared() {
        for strategy in IndexingStrategy::ALL {
            for event_type in strategy.event_types() {
                let owners: Vec<_> = IndexingStrategy::ALL
                    .into_iter()
                    .filter(|s| s.event_types().contains(event_type))
                    .collect();
                let classified = IndexingStrategy::classify(event_type).unwrap();
                if owners.len() == 1 {
                    assert_eq!(classified, strategy, "{event_type}");
                } else {
                    assert!(owners.contains(&classified), "{event_type}");
                }
            }
        }
    }

    #[test]
    fn test_round_trips_through_str() {
        for strategy in IndexingStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<IndexingStrategy>().unwrap(), strategy);
            assert_eq!(
                serde_json::to_string(&strategy).unwrap(),
                format!("\"{}\"", strategy.as_str())
            );
        }
        assert_eq!(
            "nft_bids".parse::<IndexingStrategy>(),
            Err(UnknownStrategy("nft_bids".to_string()))
        );
    }
}
