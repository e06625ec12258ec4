use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whether a seasonal discount is presented as a whole-cart or a per-product
/// fee. Label only: both variants apply to the cart subtotal.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DiscountScope {
    #[default]
    Cart,
    Product,
}

impl DiscountScope {
    /// Label attached to the cart adjustment when the discount applies.
    pub fn fee_label(&self) -> &'static str {
        match self {
            DiscountScope::Cart => "Cart Discount Applied",
            DiscountScope::Product => "Product Discount Applied",
        }
    }
}

/// Promotion settings exactly as submitted by the admin form. Values are kept
/// as raw strings and validated at evaluation time, so a bad submission never
/// breaks storefront requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PromotionSettings {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<String>,
    #[serde(default)]
    pub discount_type: Option<String>,
}

/// Reasons a stored promotion fails validation. Distinct from "disabled":
/// a blank form disables the promotion, a malformed one is an error that
/// evaluation treats as inactive (fail closed).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize)]
pub enum InvalidPromotion {
    #[error("start date {0:?} is not a calendar date (expected YYYY-MM-DD)")]
    BadStartDate(String),

    #[error("end date {0:?} is not a calendar date (expected YYYY-MM-DD)")]
    BadEndDate(String),

    #[error("discount percentage {0:?} is not a number")]
    BadPercentage(String),

    #[error("discount percentage {0} is outside 0..=100")]
    PercentageOutOfRange(Decimal),

    #[error("promotion window ends ({end}) before it starts ({start})")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("unknown discount type {0:?}")]
    UnknownScope(String),
}

/// Outcome of parsing stored settings: either nothing is configured or a
/// validated promotion schedule exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromotionRule {
    Disabled,
    Scheduled(PromotionConfig),
}

impl PromotionRule {
    pub fn as_config(&self) -> Option<&PromotionConfig> {
        match self {
            PromotionRule::Disabled => None,
            PromotionRule::Scheduled(config) => Some(config),
        }
    }
}

/// A validated promotion window. `start_date <= end_date` when both are set
/// and `percentage` is within 0..=100.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PromotionConfig {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub percentage: Decimal,
    pub scope: DiscountScope,
}

impl PromotionConfig {
    /// Storefront banner check. Intentionally looser than
    /// [`PromotionConfig::is_discount_active`]: the banner only requires the
    /// window to have started and keeps showing after the end date passes.
    pub fn is_banner_active(&self, today: NaiveDate) -> bool {
        today >= self.start_date
    }

    /// Fee application check. Requires a bounded window and is inclusive at
    /// both ends; an open-ended schedule never applies the fee.
    pub fn is_discount_active(&self, today: NaiveDate) -> bool {
        match self.end_date {
            Some(end) => today >= self.start_date && today <= end,
            None => false,
        }
    }

    /// Discount for a subtotal: `subtotal * percentage / 100`.
    pub fn discount_amount(&self, subtotal: Decimal) -> Decimal {
        subtotal * self.percentage / Decimal::from(100)
    }
}

impl PromotionSettings {
    /// Parses and validates the stored settings.
    ///
    /// A promotion needs a start date and a percentage to exist; either one
    /// missing (or blank) means `Disabled`. The end date is optional and the
    /// discount type defaults to cart scope.
    pub fn parse(&self) -> Result<PromotionRule, InvalidPromotion> {
        let (Some(start_raw), Some(percentage_raw)) = (
            present(self.start_date.as_deref()),
            present(self.discount_percentage.as_deref()),
        ) else {
            return Ok(PromotionRule::Disabled);
        };

        let start_date = NaiveDate::parse_from_str(start_raw, DATE_FORMAT)
            .map_err(|_| InvalidPromotion::BadStartDate(start_raw.to_string()))?;

        let end_date = match present(self.end_date.as_deref()) {
            Some(end_raw) => Some(
                NaiveDate::parse_from_str(end_raw, DATE_FORMAT)
                    .map_err(|_| InvalidPromotion::BadEndDate(end_raw.to_string()))?,
            ),
            None => None,
        };

        if let Some(end) = end_date {
            if end < start_date {
                return Err(InvalidPromotion::InvalidWindow {
                    start: start_date,
                    end,
                });
            }
        }

        let percentage: Decimal = percentage_raw
            .parse()
            .map_err(|_| InvalidPromotion::BadPercentage(percentage_raw.to_string()))?;
        if percentage < Decimal::ZERO || percentage > Decimal::from(100) {
            return Err(InvalidPromotion::PercentageOutOfRange(percentage));
        }

        let scope = match present(self.discount_type.as_deref()) {
            Some(raw) => raw
                .parse()
                .map_err(|_| InvalidPromotion::UnknownScope(raw.to_string()))?,
            None => DiscountScope::default(),
        };

        Ok(PromotionRule::Scheduled(PromotionConfig {
            start_date,
            end_date,
            percentage,
            scope,
        }))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn settings(
        start: Option<&str>,
        end: Option<&str>,
        percentage: Option<&str>,
        scope: Option<&str>,
    ) -> PromotionSettings {
        PromotionSettings {
            start_date: start.map(String::from),
            end_date: end.map(String::from),
            discount_percentage: percentage.map(String::from),
            discount_type: scope.map(String::from),
        }
    }

    fn june_window() -> PromotionConfig {
        PromotionConfig {
            start_date: date("2024-06-01"),
            end_date: Some(date("2024-06-07")),
            percentage: dec!(10),
            scope: DiscountScope::Cart,
        }
    }

    #[test]
    fn blank_settings_are_disabled() {
        assert_eq!(
            PromotionSettings::default().parse(),
            Ok(PromotionRule::Disabled)
        );
        assert_eq!(
            settings(Some("  "), None, Some(""), None).parse(),
            Ok(PromotionRule::Disabled)
        );
    }

    #[test]
    fn missing_start_or_percentage_disables() {
        assert_eq!(
            settings(None, Some("2024-06-07"), Some("10"), None).parse(),
            Ok(PromotionRule::Disabled)
        );
        assert_eq!(
            settings(Some("2024-06-01"), Some("2024-06-07"), None, None).parse(),
            Ok(PromotionRule::Disabled)
        );
    }

    #[test]
    fn full_settings_parse_to_schedule() {
        let rule = settings(
            Some("2024-06-01"),
            Some("2024-06-07"),
            Some("10"),
            Some("cart"),
        )
        .parse()
        .unwrap();
        assert_eq!(rule, PromotionRule::Scheduled(june_window()));
    }

    #[test]
    fn end_date_is_optional_and_scope_defaults_to_cart() {
        let rule = settings(Some("2024-06-01"), None, Some("25"), None)
            .parse()
            .unwrap();
        let config = rule.as_config().unwrap();
        assert_eq!(config.end_date, None);
        assert_eq!(config.scope, DiscountScope::Cart);
        assert_eq!(config.percentage, dec!(25));
    }

    #[test]
    fn malformed_settings_are_errors_not_disabled() {
        assert_matches!(
            settings(Some("June 1st"), None, Some("10"), None).parse(),
            Err(InvalidPromotion::BadStartDate(_))
        );
        assert_matches!(
            settings(Some("2024-06-01"), Some("soon"), Some("10"), None).parse(),
            Err(InvalidPromotion::BadEndDate(_))
        );
        assert_matches!(
            settings(Some("2024-06-01"), None, Some("ten"), None).parse(),
            Err(InvalidPromotion::BadPercentage(_))
        );
        assert_matches!(
            settings(Some("2024-06-01"), None, Some("10"), Some("order")).parse(),
            Err(InvalidPromotion::UnknownScope(_))
        );
    }

    #[test_case("-1"; "negative")]
    #[test_case("100.5"; "above hundred")]
    fn out_of_range_percentage_is_rejected(raw: &str) {
        assert_matches!(
            settings(Some("2024-06-01"), None, Some(raw), None).parse(),
            Err(InvalidPromotion::PercentageOutOfRange(_))
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        assert_matches!(
            settings(Some("2024-06-07"), Some("2024-06-01"), Some("10"), None).parse(),
            Err(InvalidPromotion::InvalidWindow { .. })
        );
    }

    #[test_case("2024-05-31", false; "day before start")]
    #[test_case("2024-06-01", true; "start day")]
    #[test_case("2024-06-07", true; "end day")]
    #[test_case("2024-06-10", true; "after end still shows")]
    fn banner_ignores_end_date(today: &str, expected: bool) {
        assert_eq!(june_window().is_banner_active(date(today)), expected);
    }

    #[test_case("2024-05-31", false; "day before start")]
    #[test_case("2024-06-01", true; "start day inclusive")]
    #[test_case("2024-06-03", true; "inside window")]
    #[test_case("2024-06-07", true; "end day inclusive")]
    #[test_case("2024-06-08", false; "day after end")]
    #[test_case("2024-06-10", false; "well after end")]
    fn discount_window_is_inclusive_and_bounded(today: &str, expected: bool) {
        assert_eq!(june_window().is_discount_active(date(today)), expected);
    }

    #[test]
    fn open_ended_window_never_applies_the_fee() {
        let config = PromotionConfig {
            end_date: None,
            ..june_window()
        };
        assert!(!config.is_discount_active(date("2030-01-01")));
        assert!(config.is_banner_active(date("2030-01-01")));
    }

    #[test]
    fn ten_percent_of_two_hundred_inside_the_window() {
        let config = june_window();
        assert!(config.is_discount_active(date("2024-06-03")));
        assert_eq!(config.discount_amount(dec!(200)), dec!(20));
        assert_eq!(config.scope.fee_label(), "Cart Discount Applied");
    }

    proptest! {
        #[test]
        fn discount_amount_matches_formula(subtotal_cents in 0u64..10_000_000, pct in 0u32..=100) {
            let subtotal = Decimal::from(subtotal_cents) / Decimal::from(100);
            let config = PromotionConfig { percentage: Decimal::from(pct), ..june_window() };
            let amount = config.discount_amount(subtotal);
            prop_assert_eq!(amount, subtotal * Decimal::from(pct) / Decimal::from(100));
            prop_assert!(amount >= Decimal::ZERO);
            prop_assert!(amount <= subtotal);
            if pct == 0 {
                prop_assert_eq!(amount, Decimal::ZERO);
            }
            if pct == 100 {
                prop_assert_eq!(amount, subtotal);
            }
        }

        #[test]
        fn banner_is_monotonic_once_started(offset in 0i64..1000, later in 0i64..1000) {
            let config = june_window();
            let first = config.start_date + chrono::Duration::days(offset);
            if config.is_banner_active(first) {
                prop_assert!(config.is_banner_active(first + chrono::Duration::days(later)));
            }
        }
    }
}
