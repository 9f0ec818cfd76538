// Transaction classification - row filters, unit normalization and pricing
//
// A raw record either becomes a ClassifiedTransaction or is skipped with a
// reason. Skips never fail the scan; they only shrink the output.

use bigdecimal::{BigDecimal, ToPrimitive, Zero};

use super::decoder::DecodedHint;
use super::types::{ClassifiedTransaction, RawTransaction, DATE_FORMAT};
use crate::errors::SkipReason;

/// Decimal places assumed for every token (no per-token lookup)
pub const TOKEN_DECIMALS: i64 = 18;

/// Result of classifying one record
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Accepted(ClassifiedTransaction),
    Skipped(SkipReason),
}

impl Classification {
    pub fn accepted(self) -> Option<ClassifiedTransaction> {
        match self {
            Classification::Accepted(tx) => Some(tx),
            Classification::Skipped(_) => None,
        }
    }
}

/// Divide a raw integer amount by 10^18
///
/// Done by shifting the decimal scale, so the result is exact. `None` when
/// the shifted scale no longer fits in an `i64`.
pub fn normalize_units(raw: &BigDecimal) -> Option<BigDecimal> {
    let (digits, scale) = raw.as_bigint_and_exponent();
    let scale = scale.checked_add(TOKEN_DECIMALS)?;
    Some(BigDecimal::new(digits, scale))
}

#[derive(Debug, Default, Clone)]
pub struct TransactionClassifier;

impl TransactionClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Filter, normalize and price one record
    pub fn classify(&self, raw: &RawTransaction, hint: DecodedHint) -> Classification {
        let timestamp = match raw.timestamp {
            Some(ts) => ts,
            None => return Classification::Skipped(SkipReason::MissingTimestamp),
        };
        let value = match raw.value.as_ref() {
            Some(value) => value,
            None => return Classification::Skipped(SkipReason::MissingValue),
        };
        let amount_usd = match raw.value_usd {
            Some(usd) => usd,
            None => return Classification::Skipped(SkipReason::MissingUsdValue),
        };
        let wallet = match raw.sender.as_ref() {
            Some(sender) => sender.clone(),
            None => return Classification::Skipped(SkipReason::MissingSender),
        };

        if value.is_zero() {
            return Classification::Skipped(SkipReason::ZeroValue);
        }

        let token_count_quote = match normalize_units(value) {
            Some(quote) => quote.to_f64().unwrap_or(0.0),
            None => return Classification::Skipped(SkipReason::MissingValue),
        };
        // A value too small to survive the f64 conversion would divide by zero
        if token_count_quote == 0.0 || token_count_quote.is_nan() {
            return Classification::Skipped(SkipReason::ZeroQuote);
        }

        let token_count_base = hint.base_amount.to_f64().unwrap_or(0.0);

        Classification::Accepted(ClassifiedTransaction {
            date: timestamp.format(DATE_FORMAT).to_string(),
            amount_usd,
            token_count_quote,
            token_count_base,
            price: amount_usd / token_count_quote,
            wallet,
            side: hint.side,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transactions::types::TradeSide;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn raw(value: Option<&str>, usd: Option<f64>) -> RawTransaction {
        RawTransaction {
            tx_hash: Some("0x01".to_string()),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 2, 9, 3, 7).unwrap()),
            value: value.map(|v| BigDecimal::from_str(v).unwrap()),
            value_usd: usd,
            sender: Some("0xwallet".to_string()),
            log_events: Vec::new(),
        }
    }

    #[test]
    fn test_two_tokens_for_hundred_dollars() {
        let classifier = TransactionClassifier::new();
        let hint = DecodedHint {
            side: TradeSide::Buy,
            base_amount: BigDecimal::from_str("1234.5").unwrap(),
        };

        let tx = classifier
            .classify(&raw(Some("2000000000000000000"), Some(100.0)), hint)
            .accepted()
            .unwrap();

        assert_eq!(tx.token_count_quote, 2.0);
        assert_eq!(tx.price, 50.0);
        assert_eq!(tx.amount_usd, 100.0);
        assert_eq!(tx.token_count_base, 1234.5);
        assert_eq!(tx.date, "2024-05-02 09:03:07");
        assert_eq!(tx.wallet, "0xwallet");
        assert_eq!(tx.side, TradeSide::Buy);
    }

    #[test]
    fn test_price_matches_ratio() {
        let classifier = TransactionClassifier::new();
        for (value, usd) in [
            ("1", 0.5),
            ("333333333333333333", 12.75),
            ("98765432109876543210987", 4321.0),
        ] {
            let tx = classifier
                .classify(&raw(Some(value), Some(usd)), DecodedHint::default())
                .accepted()
                .unwrap();
            let expected = usd / tx.token_count_quote;
            assert!((tx.price - expected).abs() <= expected.abs() * 1e-12);
        }
    }

    #[test]
    fn test_zero_value_is_skipped() {
        let classifier = TransactionClassifier::new();
        assert_eq!(
            classifier.classify(&raw(Some("0"), Some(10.0)), DecodedHint::default()),
            Classification::Skipped(SkipReason::ZeroValue)
        );
        assert_eq!(
            classifier.classify(&raw(Some("0.000"), Some(10.0)), DecodedHint::default()),
            Classification::Skipped(SkipReason::ZeroValue)
        );
    }

    #[test]
    fn test_missing_fields_are_skipped() {
        let classifier = TransactionClassifier::new();

        assert_eq!(
            classifier.classify(&raw(None, Some(10.0)), DecodedHint::default()),
            Classification::Skipped(SkipReason::MissingValue)
        );
        assert_eq!(
            classifier.classify(&raw(Some("5"), None), DecodedHint::default()),
            Classification::Skipped(SkipReason::MissingUsdValue)
        );

        let mut no_sender = raw(Some("5"), Some(1.0));
        no_sender.sender = None;
        assert_eq!(
            classifier.classify(&no_sender, DecodedHint::default()),
            Classification::Skipped(SkipReason::MissingSender)
        );

        let mut no_time = raw(Some("5"), Some(1.0));
        no_time.timestamp = None;
        assert_eq!(
            classifier.classify(&no_time, DecodedHint::default()),
            Classification::Skipped(SkipReason::MissingTimestamp)
        );
    }

    #[test]
    fn test_tiny_value_gives_large_price() {
        let classifier = TransactionClassifier::new();
        let tx = classifier
            .classify(&raw(Some("1"), Some(1.0)), DecodedHint::default())
            .accepted()
            .unwrap();

        assert!((tx.token_count_quote - 1e-18).abs() < 1e-30);
        assert!(tx.price > 9.9e17);
    }

    #[test]
    fn test_normalize_units_is_exact() {
        let raw = BigDecimal::from_str("123456789012345678901234567890").unwrap();
        assert_eq!(
            normalize_units(&raw),
            Some(BigDecimal::from_str("123456789012.345678901234567890").unwrap())
        );
    }

    #[test]
    fn test_extreme_exponent_is_unparseable() {
        let raw_value = BigDecimal::from_str("1e-9223372036854775800").unwrap();
        assert_eq!(normalize_units(&raw_value), None);

        let classifier = TransactionClassifier::new();
        assert_eq!(
            classifier.classify(
                &raw(Some("1e-9223372036854775800"), Some(10.0)),
                DecodedHint::default()
            ),
            Classification::Skipped(SkipReason::MissingValue)
        );
    }
}
