use kernel::model::{
    billing::display_amount,
    id::LotId,
    summary::{LotUsage, UserLotUsage},
};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotUsageResponse {
    pub lot_id: LotId,
    pub lot_name: String,
    pub revenue: Decimal,
    pub available_spots: i64,
    pub occupied_spots: i64,
}

impl From<LotUsage> for LotUsageResponse {
    fn from(value: LotUsage) -> Self {
        let LotUsage {
            lot_id,
            lot_name,
            revenue,
            available_spots,
            occupied_spots,
        } = value;
        Self {
            lot_id,
            lot_name,
            revenue: display_amount(revenue),
            available_spots,
            occupied_spots,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLotUsageResponse {
    pub lot_name: String,
    pub reservations: i64,
}

impl From<UserLotUsage> for UserLotUsageResponse {
    fn from(value: UserLotUsage) -> Self {
        let UserLotUsage {
            lot_name,
            reservations,
        } = value;
        Self {
            lot_name,
            reservations,
        }
    }
}

// 管理者は駐車場ごとの売上、一般ユーザーは自分の利用回数
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SummaryResponse {
    Admin { lots: Vec<LotUsageResponse> },
    User { lots: Vec<UserLotUsageResponse> },
}

impl From<Vec<LotUsage>> for SummaryResponse {
    fn from(value: Vec<LotUsage>) -> Self {
        Self::Admin {
            lots: value.into_iter().map(LotUsageResponse::from).collect(),
        }
    }
}

impl From<Vec<UserLotUsage>> for SummaryResponse {
    fn from(value: Vec<UserLotUsage>) -> Self {
        Self::User {
            lots: value.into_iter().map(UserLotUsageResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn admin_summary_rounds_revenue() {
        let summary = SummaryResponse::from(vec![LotUsage {
            lot_id: LotId::new(),
            lot_name: "Phoenix Mall".into(),
            revenue: Decimal::from_str("41.666666").unwrap(),
            available_spots: 4,
            occupied_spots: 1,
        }]);
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["kind"], "admin");
        assert_eq!(json["lots"][0]["revenue"], "41.67");
        assert_eq!(json["lots"][0]["occupiedSpots"], 1);
    }

    #[test]
    fn user_summary_counts_reservations() {
        let summary = SummaryResponse::from(vec![UserLotUsage {
            lot_name: "BKC".into(),
            reservations: 3,
        }]);
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["kind"], "user");
        assert_eq!(json["lots"][0]["reservations"], 3);
    }
}
