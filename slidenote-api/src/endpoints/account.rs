use super::{AccountId, DataEnvelope};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Method, Request, RequestData};

/// `until` values at or beyond this mark an open-ended subscription.
pub const OPEN_ENDED_UNTIL: i64 = 9_999_999_998;

// Common

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(rename = "id")]
    pub plan_id: i64,
    /// Expiry as epoch seconds
    pub until: Option<i64>,
    pub credit_balance: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Renews until cancelled.
    Active,
    /// Cancelled, still usable until the given epoch second.
    CancelPending { until: i64 },
    /// Expired or never subscribed.
    Lapsed,
}

impl SubscriptionRecord {
    pub fn status(&self, now_epoch_secs: i64) -> SubscriptionStatus {
        match self.until {
            Some(until) if until >= OPEN_ENDED_UNTIL => SubscriptionStatus::Active,
            Some(until) if until > now_epoch_secs => SubscriptionStatus::CancelPending { until },
            _ => SubscriptionStatus::Lapsed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionAction {
    Cancel,
    Reactivate,
}

impl std::fmt::Display for SubscriptionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancel => f.write_str("CANCEL"),
            Self::Reactivate => f.write_str("REACTIVATE"),
        }
    }
}

// Requests

#[derive(Default, Debug, Clone, Serialize)]
pub struct GetUserData {}

impl GetUserData {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Request for GetUserData {
    type Data = Self;
    type Response = UserDataResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/get_user_data".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModifySubscription {
    action: SubscriptionAction,
}

impl ModifySubscription {
    pub fn new(action: SubscriptionAction) -> Self {
        Self { action }
    }
}

impl Request for ModifySubscription {
    type Data = Self;
    type Response = SubscriptionResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/modify_subscription".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

// Responses

pub type UserDataResponse = DataEnvelope<UserData>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub subscription: Option<SubscriptionRecord>,
    pub id: Option<AccountId>,
}

pub type SubscriptionResponse = DataEnvelope<SubscriptionData>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionData {
    pub subscription: Option<SubscriptionRecord>,
}
