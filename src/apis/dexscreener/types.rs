use serde::{Deserialize, Serialize};

// ============================================================================
// NORMALIZED PAIR METADATA
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

/// Values for the 5m/1h/6h/24h buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeframes<T> {
    pub m5: T,
    pub h1: T,
    pub h6: T,
    pub h24: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnCounts {
    pub buys: u64,
    pub sells: u64,
}

/// Pair as shown in the report header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairMetadata {
    pub chain_id: String,
    pub dex_id: String,
    pub url: String,
    pub pair_address: String,
    pub base_token: TokenMeta,
    pub quote_token: TokenMeta,
    pub price_native: String,
    pub price_usd: String,
    pub volume: Timeframes<f64>,
    pub liquidity_usd: f64,
    pub txns: Timeframes<TxnCounts>,
    pub price_change: Timeframes<f64>,
    pub boosts_active: u64,
    /// Epoch milliseconds
    pub pair_created_at: i64,
}

// ============================================================================
// RAW API RESPONSES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexScreenerPairRaw>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawToken {
    pub address: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTimeframes<T> {
    pub m5: Option<T>,
    pub h1: Option<T>,
    pub h6: Option<T>,
    pub h24: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTxnCounts {
    pub buys: Option<u64>,
    pub sells: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLiquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawBoosts {
    pub active: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexScreenerPairRaw {
    pub chain_id: Option<String>,
    pub dex_id: Option<String>,
    pub url: Option<String>,
    pub pair_address: Option<String>,
    pub base_token: Option<RawToken>,
    pub quote_token: Option<RawToken>,
    pub price_native: Option<String>,
    pub price_usd: Option<String>,
    pub txns: Option<RawTimeframes<RawTxnCounts>>,
    pub volume: Option<RawTimeframes<f64>>,
    pub price_change: Option<RawTimeframes<f64>>,
    pub liquidity: Option<RawLiquidity>,
    pub pair_created_at: Option<i64>,
    pub boosts: Option<RawBoosts>,
}

impl RawToken {
    fn to_meta(&self) -> TokenMeta {
        TokenMeta {
            address: self.address.clone().unwrap_or_default(),
            name: self.name.clone().unwrap_or_default(),
            symbol: self.symbol.clone().unwrap_or_default(),
        }
    }
}

impl RawTimeframes<f64> {
    fn to_values(&self) -> Timeframes<f64> {
        Timeframes {
            m5: self.m5.unwrap_or_default(),
            h1: self.h1.unwrap_or_default(),
            h6: self.h6.unwrap_or_default(),
            h24: self.h24.unwrap_or_default(),
        }
    }
}

impl RawTimeframes<RawTxnCounts> {
    fn to_counts(&self) -> Timeframes<TxnCounts> {
        let counts = |raw: &Option<RawTxnCounts>| {
            raw.as_ref()
                .map(|c| TxnCounts {
                    buys: c.buys.unwrap_or_default(),
                    sells: c.sells.unwrap_or_default(),
                })
                .unwrap_or_default()
        };
        Timeframes {
            m5: counts(&self.m5),
            h1: counts(&self.h1),
            h6: counts(&self.h6),
            h24: counts(&self.h24),
        }
    }
}

impl DexScreenerPairRaw {
    /// Normalize, defaulting every missing field
    pub fn to_metadata(&self) -> PairMetadata {
        PairMetadata {
            chain_id: self.chain_id.clone().unwrap_or_default(),
            dex_id: self.dex_id.clone().unwrap_or_default(),
            url: self.url.clone().unwrap_or_default(),
            pair_address: self.pair_address.clone().unwrap_or_default(),
            base_token: self
                .base_token
                .as_ref()
                .map(RawToken::to_meta)
                .unwrap_or_default(),
            quote_token: self
                .quote_token
                .as_ref()
                .map(RawToken::to_meta)
                .unwrap_or_default(),
            price_native: self.price_native.clone().unwrap_or_default(),
            price_usd: self.price_usd.clone().unwrap_or_default(),
            volume: self
                .volume
                .as_ref()
                .map(|v| v.to_values())
                .unwrap_or_default(),
            liquidity_usd: self
                .liquidity
                .as_ref()
                .and_then(|l| l.usd)
                .unwrap_or_default(),
            txns: self
                .txns
                .as_ref()
                .map(|t| t.to_counts())
                .unwrap_or_default(),
            price_change: self
                .price_change
                .as_ref()
                .map(|p| p.to_values())
                .unwrap_or_default(),
            boosts_active: self
                .boosts
                .as_ref()
                .and_then(|b| b.active)
                .unwrap_or_default(),
            pair_created_at: self.pair_created_at.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_BODY: &str = r#"{
        "schemaVersion": "1.0.0",
        "pairs": [
            {
                "chainId": "ethereum",
                "dexId": "uniswap",
                "url": "https://dexscreener.com/ethereum/0xpair",
                "pairAddress": "0xpair",
                "labels": ["v2"],
                "baseToken": { "address": "0xbase", "name": "Pepe", "symbol": "PEPE" },
                "quoteToken": { "address": "0xquote", "name": "Wrapped Ether", "symbol": "WETH" },
                "priceNative": "0.000000004",
                "priceUsd": "0.00001234",
                "txns": {
                    "m5": { "buys": 3, "sells": 1 },
                    "h1": { "buys": 40, "sells": 22 },
                    "h24": { "buys": 900, "sells": 850 }
                },
                "volume": { "m5": 1200.5, "h1": 30000, "h6": 150000.25, "h24": 700000 },
                "priceChange": { "m5": -0.12, "h1": 1.5, "h6": 3.25 },
                "liquidity": { "usd": 25000000.75, "base": 1, "quote": 2 },
                "fdv": 5000000000,
                "pairCreatedAt": 1681000000000,
                "boosts": { "active": 2 }
            },
            { "chainId": "bsc", "pairAddress": "0xsecond" }
        ]
    }"#;

    #[test]
    fn test_search_response_to_metadata() {
        let response: SearchResponse = serde_json::from_str(SEARCH_BODY).unwrap();
        let pairs = response.pairs.unwrap();
        assert_eq!(pairs.len(), 2);

        let pair = pairs[0].to_metadata();
        assert_eq!(pair.chain_id, "ethereum");
        assert_eq!(pair.dex_id, "uniswap");
        assert_eq!(pair.base_token.symbol, "PEPE");
        assert_eq!(pair.quote_token.name, "Wrapped Ether");
        assert_eq!(pair.price_usd, "0.00001234");
        assert_eq!(pair.volume.h1, 30000.0);
        assert_eq!(pair.liquidity_usd, 25000000.75);
        assert_eq!(pair.txns.h1, TxnCounts { buys: 40, sells: 22 });
        assert_eq!(pair.txns.h6, TxnCounts::default());
        assert_eq!(pair.price_change.m5, -0.12);
        assert_eq!(pair.price_change.h24, 0.0);
        assert_eq!(pair.boosts_active, 2);
        assert_eq!(pair.pair_created_at, 1681000000000);
    }

    #[test]
    fn test_sparse_pair_defaults_to_zero() {
        let raw: DexScreenerPairRaw =
            serde_json::from_str(r#"{ "chainId": "bsc", "pairAddress": "0xsecond" }"#).unwrap();
        let pair = raw.to_metadata();

        assert_eq!(pair.pair_address, "0xsecond");
        assert_eq!(pair.base_token, TokenMeta::default());
        assert_eq!(pair.volume, Timeframes::default());
        assert_eq!(pair.liquidity_usd, 0.0);
        assert_eq!(pair.boosts_active, 0);
        assert_eq!(pair.pair_created_at, 0);
    }

    #[test]
    fn test_null_pairs() {
        let response: SearchResponse =
            serde_json::from_str(r#"{ "schemaVersion": "1.0.0", "pairs": null }"#).unwrap();
        assert!(response.pairs.is_none());
    }
}
