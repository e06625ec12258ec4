use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether an order's food box has been physically handed over.
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
pub enum FoodBoxStatus {
    #[default]
    Pending,
    Received,
}

/// Food box tracking state for one order. Created implicitly with the order
/// and mutated by admin action or by the order completing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FulfillmentRecord {
    pub status: FoodBoxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_date: Option<NaiveDate>,
}

impl FulfillmentRecord {
    /// Automatic transition taken when the owning order completes: the box is
    /// considered received, and the received date is stamped only if it was
    /// never set. Returns whether anything changed.
    pub fn mark_order_completed(&mut self, today: NaiveDate) -> bool {
        let mut changed = false;
        if self.status != FoodBoxStatus::Received {
            self.status = FoodBoxStatus::Received;
            changed = true;
        }
        if self.received_date.is_none() {
            self.received_date = Some(today);
            changed = true;
        }
        changed
    }

    /// Manual admin update. Both directions are allowed; the submitted date
    /// replaces the stored one as-is.
    pub fn apply_manual(&mut self, status: FoodBoxStatus, received_date: Option<NaiveDate>) {
        self.status = status;
        self.received_date = received_date;
    }
}
