// Event log decoding - buy/sell hint and base token amount
//
// Decoding is driven by a registry mapping an exact event name to a schema.
// A schema lists which parameter names carry which role; every matching
// parameter becomes a typed value. The decoder then folds the typed values of
// all known events in scan order, so later values overwrite earlier ones.

use bigdecimal::{BigDecimal, Zero};
use std::collections::HashMap;
use std::str::FromStr;

use super::classifier::normalize_units;
use super::types::{LogEvent, TradeSide};
use crate::logger::{self, LogTag};

// =============================================================================
// SCHEMAS
// =============================================================================

/// Event shapes the registry knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownEvent {
    /// DEX pair `Swap` log
    Swap,
    /// Router `execute` log
    Execute,
}

/// Meaning of a parameter inside a known event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    /// Address that bought the base token
    Buyer,
    /// Address that sold the base token
    Seller,
    /// Raw base token amount (18 decimals)
    BaseAmount,
}

/// Parameter layout of one known event
#[derive(Debug, Clone)]
pub struct EventSchema {
    pub kind: KnownEvent,
    /// Exact, case-sensitive decoded event name
    pub name: &'static str,
    pub params: &'static [(&'static str, ParamRole)],
}

impl EventSchema {
    pub fn role_of(&self, param_name: &str) -> Option<ParamRole> {
        self.params
            .iter()
            .find(|(name, _)| *name == param_name)
            .map(|(_, role)| *role)
    }
}

const TRADE_PARAMS: &[(&str, ParamRole)] = &[
    ("buyer", ParamRole::Buyer),
    ("seller", ParamRole::Seller),
    ("amount0Out", ParamRole::BaseAmount),
    ("amount1Out", ParamRole::BaseAmount),
    ("value", ParamRole::BaseAmount),
];

pub const SWAP_SCHEMA: EventSchema = EventSchema {
    kind: KnownEvent::Swap,
    name: "Swap",
    params: TRADE_PARAMS,
};

pub const EXECUTE_SCHEMA: EventSchema = EventSchema {
    kind: KnownEvent::Execute,
    name: "execute",
    params: TRADE_PARAMS,
};

// =============================================================================
// TYPED OUTPUT
// =============================================================================

/// A parameter value checked against its schema role
#[derive(Debug, Clone, PartialEq)]
pub enum TypedParam {
    Buyer(String),
    Seller(String),
    /// Already normalized (divided by 10^18)
    BaseAmount(BigDecimal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub kind: KnownEvent,
    /// In the order the provider listed them
    pub params: Vec<TypedParam>,
}

/// Decoder output for one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedHint {
    pub side: TradeSide,
    /// Zero when no amount parameter was found
    pub base_amount: BigDecimal,
}

impl Default for DecodedHint {
    fn default() -> Self {
        Self {
            side: TradeSide::Unknown,
            base_amount: BigDecimal::zero(),
        }
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

pub struct DecoderRegistry {
    schemas: HashMap<&'static str, EventSchema>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Registry with the `Swap` and `execute` schemas
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(SWAP_SCHEMA);
        registry.register(EXECUTE_SCHEMA);
        registry
    }

    pub fn register(&mut self, schema: EventSchema) {
        self.schemas.insert(schema.name, schema);
    }

    pub fn schema_for(&self, event_name: &str) -> Option<&EventSchema> {
        self.schemas.get(event_name)
    }

    /// Decode one log against its schema
    ///
    /// Returns `None` for undecoded logs and for names with no schema.
    /// Null values and non-string addresses are dropped; amounts that do not
    /// parse become zero.
    pub fn decode_event(&self, event: &LogEvent) -> Option<DecodedEvent> {
        let name = event.name.as_deref()?;
        let schema = self.schema_for(name)?;

        let params = event
            .params
            .iter()
            .filter(|param| !param.value.is_null())
            .filter_map(|param| match schema.role_of(&param.name)? {
                ParamRole::Buyer => param.value.as_str().map(|s| TypedParam::Buyer(s.to_string())),
                ParamRole::Seller => {
                    param.value.as_str().map(|s| TypedParam::Seller(s.to_string()))
                }
                ParamRole::BaseAmount => Some(TypedParam::BaseAmount(parse_base_amount(
                    &param.value,
                ))),
            })
            .collect();

        Some(DecodedEvent {
            kind: schema.kind,
            params,
        })
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Render the scalar as text, parse it and scale it down by 10^18
fn parse_base_amount(value: &serde_json::Value) -> BigDecimal {
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match BigDecimal::from_str(text.trim())
        .ok()
        .and_then(|raw| normalize_units(&raw))
    {
        Some(amount) => amount,
        None => {
            logger::debug(
                LogTag::Decoder,
                &format!("Unparseable base amount '{}', using zero", text),
            );
            BigDecimal::zero()
        }
    }
}

// =============================================================================
// DECODER
// =============================================================================

pub struct LogEventDecoder {
    registry: DecoderRegistry,
}

impl LogEventDecoder {
    pub fn new(registry: DecoderRegistry) -> Self {
        Self { registry }
    }

    pub fn standard() -> Self {
        Self::new(DecoderRegistry::standard())
    }

    /// Derive the trade side and base amount from a transaction's logs
    ///
    /// Buyer/Seller only count when the address string-equals `sender`
    /// (case-sensitive). The last matching value scanned wins.
    pub fn decode(&self, events: &[LogEvent], sender: Option<&str>) -> DecodedHint {
        let mut hint = DecodedHint::default();

        for decoded in events.iter().filter_map(|e| self.registry.decode_event(e)) {
            for param in decoded.params {
                match param {
                    TypedParam::Buyer(address) if Some(address.as_str()) == sender => {
                        hint.side = TradeSide::Buy;
                    }
                    TypedParam::Seller(address) if Some(address.as_str()) == sender => {
                        hint.side = TradeSide::Sell;
                    }
                    TypedParam::BaseAmount(amount) => hint.base_amount = amount,
                    _ => {}
                }
            }
        }

        hint
    }
}

impl Default for LogEventDecoder {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::types::LogParam;
    use bigdecimal::ToPrimitive;
    use serde_json::json;

    const WALLET: &str = "0xabc0000000000000000000000000000000000001";
    const OTHER: &str = "0xdef0000000000000000000000000000000000002";

    fn swap(params: Vec<LogParam>) -> LogEvent {
        LogEvent::decoded("Swap", params)
    }

    #[test]
    fn test_buyer_matching_sender_is_buy() {
        let decoder = LogEventDecoder::standard();
        let events = vec![swap(vec![LogParam::new("buyer", WALLET)])];

        let hint = decoder.decode(&events, Some(WALLET));
        assert_eq!(hint.side, TradeSide::Buy);
        assert!(hint.base_amount.is_zero());
    }

    #[test]
    fn test_seller_matching_sender_is_sell() {
        let decoder = LogEventDecoder::standard();
        let events = vec![LogEvent::decoded(
            "execute",
            vec![LogParam::new("seller", WALLET)],
        )];

        assert_eq!(decoder.decode(&events, Some(WALLET)).side, TradeSide::Sell);
    }

    #[test]
    fn test_non_matching_address_stays_unknown() {
        let decoder = LogEventDecoder::standard();
        let events = vec![swap(vec![
            LogParam::new("buyer", OTHER),
            LogParam::new("seller", OTHER),
        ])];

        assert_eq!(decoder.decode(&events, Some(WALLET)).side, TradeSide::Unknown);
    }

    #[test]
    fn test_address_comparison_is_case_sensitive() {
        let decoder = LogEventDecoder::standard();
        let events = vec![swap(vec![LogParam::new("buyer", WALLET.to_uppercase())])];

        assert_eq!(decoder.decode(&events, Some(WALLET)).side, TradeSide::Unknown);
    }

    #[test]
    fn test_event_name_must_match_exactly() {
        let decoder = LogEventDecoder::standard();
        let events = vec![
            LogEvent::decoded("swap", vec![LogParam::new("buyer", WALLET)]),
            LogEvent::decoded("Execute", vec![LogParam::new("buyer", WALLET)]),
            LogEvent::decoded("SwapV2", vec![LogParam::new("buyer", WALLET)]),
            LogEvent::decoded("Transfer", vec![LogParam::new("value", "5000000000000000000")]),
        ];

        let hint = decoder.decode(&events, Some(WALLET));
        assert_eq!(hint, DecodedHint::default());
    }

    #[test]
    fn test_last_event_wins() {
        let decoder = LogEventDecoder::standard();
        let events = vec![
            swap(vec![LogParam::new("buyer", WALLET)]),
            swap(vec![LogParam::new("seller", WALLET)]),
        ];
        assert_eq!(decoder.decode(&events, Some(WALLET)).side, TradeSide::Sell);

        let reversed = vec![
            swap(vec![LogParam::new("seller", WALLET)]),
            swap(vec![LogParam::new("buyer", WALLET)]),
        ];
        assert_eq!(decoder.decode(&reversed, Some(WALLET)).side, TradeSide::Buy);
    }

    #[test]
    fn test_base_amount_is_normalized() {
        let decoder = LogEventDecoder::standard();
        let events = vec![swap(vec![
            LogParam::new("amount0In", "0"),
            LogParam::new("amount1Out", "2500000000000000000"),
        ])];

        let hint = decoder.decode(&events, Some(WALLET));
        assert_eq!(hint.base_amount.to_f64(), Some(2.5));
    }

    #[test]
    fn test_numeric_amount_value_is_accepted() {
        let decoder = LogEventDecoder::standard();
        let events = vec![swap(vec![LogParam::new("value", json!(3000000000000000000u64))])];

        assert_eq!(decoder.decode(&events, None).base_amount.to_f64(), Some(3.0));
    }

    #[test]
    fn test_later_amount_overwrites_even_when_unparseable() {
        let decoder = LogEventDecoder::standard();
        let events = vec![
            swap(vec![LogParam::new("amount0Out", "1000000000000000000")]),
            LogEvent::decoded("execute", vec![LogParam::new("value", "not-a-number")]),
        ];

        assert!(decoder.decode(&events, None).base_amount.is_zero());
    }

    #[test]
    fn test_out_of_range_exponent_gives_zero_amount() {
        let decoder = LogEventDecoder::standard();
        let events = vec![
            swap(vec![LogParam::new("amount0Out", "1000000000000000000")]),
            swap(vec![LogParam::new("amount1Out", "1e-9223372036854775800")]),
        ];

        assert!(decoder.decode(&events, None).base_amount.is_zero());
    }

    #[test]
    fn test_undecoded_and_null_values_are_skipped() {
        let decoder = LogEventDecoder::standard();
        let events = vec![
            swap(vec![LogParam::new("amount0Out", "4000000000000000000")]),
            LogEvent::undecoded(),
            swap(vec![
                LogParam::new("amount1Out", serde_json::Value::Null),
                LogParam::new("buyer", serde_json::Value::Null),
            ]),
        ];

        let hint = decoder.decode(&events, Some(WALLET));
        assert_eq!(hint.base_amount.to_f64(), Some(4.0));
        assert_eq!(hint.side, TradeSide::Unknown);
    }

    #[test]
    fn test_non_string_buyer_is_ignored() {
        let registry = DecoderRegistry::standard();
        let event = swap(vec![
            LogParam::new("buyer", json!(42)),
            LogParam::new("seller", WALLET),
        ]);

        let decoded = registry.decode_event(&event).unwrap();
        assert_eq!(decoded.kind, KnownEvent::Swap);
        assert_eq!(decoded.params, vec![TypedParam::Seller(WALLET.to_string())]);
    }

    #[test]
    fn test_registry_lookup() {
        let registry = DecoderRegistry::standard();
        assert_eq!(registry.schema_for("execute").map(|s| s.kind), Some(KnownEvent::Execute));
        assert!(registry.schema_for("Sync").is_none());
        assert_eq!(SWAP_SCHEMA.role_of("amount0Out"), Some(ParamRole::BaseAmount));
        assert_eq!(SWAP_SCHEMA.role_of("to"), None);
    }

    #[test]
    fn test_empty_registry_decodes_nothing() {
        let decoder = LogEventDecoder::new(DecoderRegistry::new());
        let events = vec![swap(vec![LogParam::new("buyer", WALLET)])];
        assert_eq!(decoder.decode(&events, Some(WALLET)), DecodedHint::default());
    }
}
