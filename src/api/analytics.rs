use serde::{Deserialize, Serialize};

use super::ticket::{Area, Kind};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Error-kind ticket counts per area, zeros included, count-descending.
    pub errors_by_area: Vec<AreaErrors>,
    /// Most frequent ticket kind per area, ranked by that top count.
    pub top_kind_by_area: Vec<AreaTopKind>,
    /// Resolved/total as a one-decimal percent, `"0.0"` when empty.
    pub resolution_rate: String,
    pub total_tickets: usize,
    /// Years present in the data, newest first, for the period filter.
    pub years: Vec<i32>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaErrors {
    pub area: Area,
    pub count: usize,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaTopKind {
    pub area: Area,
    pub kind: Kind,
    pub count: usize,
}
