use crate::model::spot::SpotResponse;
use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{LotId, UserId},
    lot::{
        event::{CreateLot, UpdateLot},
        LotDetail, LotSearch, ParkingLot,
    },
    pincode::Pincode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use std::str::FromStr;

// 1 時間あたりの料金は 0 以上 999 以下
fn validate_price(value: &Decimal, _ctx: &()) -> garde::Result {
    if *value < Decimal::ZERO || *value > Decimal::from(999) {
        return Err(garde::Error::new("price must be between 0 and 999"));
    }
    Ok(())
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLotRequest {
    #[garde(length(min = 2, max = 100))]
    name: String,
    #[garde(custom(validate_price))]
    price: Decimal,
    #[garde(length(min = 1))]
    address: String,
    #[garde(ascii, length(min = 6, max = 6))]
    pincode: String,
    #[garde(range(min = 1, max = 10_000))]
    max_spots: i32,
}

impl TryFrom<CreateLotRequest> for CreateLot {
    type Error = AppError;

    fn try_from(value: CreateLotRequest) -> Result<Self, Self::Error> {
        let CreateLotRequest {
            name,
            price,
            address,
            pincode,
            max_spots,
        } = value;
        Ok(Self {
            name: name.trim().to_string(),
            hourly_rate: price.round_dp(2),
            address: address.trim().to_string(),
            pincode: Pincode::parse(&pincode)?,
            max_spots,
        })
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLotRequest {
    #[garde(length(min = 2, max = 100))]
    name: String,
    #[garde(custom(validate_price))]
    price: Decimal,
    #[garde(length(min = 1))]
    address: String,
    #[garde(ascii, length(min = 6, max = 6))]
    pincode: String,
    #[garde(range(min = 1, max = 10_000))]
    max_spots: i32,
}

#[derive(new)]
pub struct UpdateLotRequestWithId(LotId, UpdateLotRequest);

impl TryFrom<UpdateLotRequestWithId> for UpdateLot {
    type Error = AppError;

    fn try_from(value: UpdateLotRequestWithId) -> Result<Self, Self::Error> {
        let UpdateLotRequestWithId(
            lot_id,
            UpdateLotRequest {
                name,
                price,
                address,
                pincode,
                max_spots,
            },
        ) = value;
        Ok(Self {
            lot_id,
            name: name.trim().to_string(),
            hourly_rate: price.round_dp(2),
            address: address.trim().to_string(),
            pincode: Pincode::parse(&pincode)?,
            max_spots,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotResponse {
    pub id: LotId,
    pub name: String,
    pub price: Decimal,
    pub address: String,
    pub pincode: String,
    pub max_spots: i32,
    pub available_spots: i64,
    pub occupied_spots: i64,
}

impl From<ParkingLot> for LotResponse {
    fn from(value: ParkingLot) -> Self {
        let ParkingLot {
            lot_id,
            name,
            hourly_rate,
            address,
            pincode,
            max_spots,
            available_spots,
            occupied_spots,
            ..
        } = value;
        Self {
            id: lot_id,
            name,
            price: hourly_rate,
            address,
            pincode,
            max_spots,
            available_spots,
            occupied_spots,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotsResponse {
    pub items: Vec<LotResponse>,
}

impl From<Vec<ParkingLot>> for LotsResponse {
    fn from(value: Vec<ParkingLot>) -> Self {
        Self {
            items: value.into_iter().map(LotResponse::from).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotDetailResponse {
    #[serde(flatten)]
    pub lot: LotResponse,
    pub spots: Vec<SpotResponse>,
}

impl From<LotDetail> for LotDetailResponse {
    fn from(value: LotDetail) -> Self {
        let LotDetail { lot, spots } = value;
        Self {
            lot: lot.into(),
            spots: spots
                .into_iter()
                .filter(|spot| spot.is_active)
                .map(SpotResponse::from)
                .collect(),
        }
    }
}

// 管理者ダッシュボード
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotDashboardResponse {
    pub items: Vec<LotDetailResponse>,
}

impl From<Vec<LotDetail>> for LotDashboardResponse {
    fn from(value: Vec<LotDetail>) -> Self {
        Self {
            items: value.into_iter().map(LotDetailResponse::from).collect(),
        }
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SearchLotsRequest {
    #[serde(default)]
    #[garde(length(max = 200))]
    pub query: String,
}

impl From<SearchLotsRequest> for LotSearch {
    fn from(value: SearchLotsRequest) -> Self {
        LotSearch::from_keyword(&value.query)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotAvailabilityResponse {
    pub id: LotId,
    pub name: String,
    pub address: String,
    pub pincode: String,
    pub price: Decimal,
    pub availability: i64,
}

impl From<ParkingLot> for LotAvailabilityResponse {
    fn from(value: ParkingLot) -> Self {
        let ParkingLot {
            lot_id,
            name,
            hourly_rate,
            address,
            pincode,
            available_spots,
            ..
        } = value;
        Self {
            id: lot_id,
            name,
            address,
            pincode,
            price: hourly_rate,
            availability: available_spots,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchLotsResponse {
    pub lots: Vec<LotAvailabilityResponse>,
}

impl From<Vec<ParkingLot>> for SearchLotsResponse {
    fn from(value: Vec<ParkingLot>) -> Self {
        Self {
            lots: value
                .into_iter()
                .map(LotAvailabilityResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBy {
    UserId,
    Address,
    Pincode,
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminSearchRequest {
    #[garde(skip)]
    pub search_by: SearchBy,
    #[garde(length(min = 1, max = 200))]
    pub query: String,
}

impl TryFrom<AdminSearchRequest> for LotSearch {
    type Error = AppError;

    fn try_from(value: AdminSearchRequest) -> Result<Self, Self::Error> {
        let AdminSearchRequest { search_by, query } = value;
        let query = query.trim().to_string();
        Ok(match search_by {
            SearchBy::UserId => LotSearch::UsedBy(UserId::from_str(&query)?),
            SearchBy::Address => LotSearch::AddressContains(query),
            SearchBy::Pincode => LotSearch::PincodeEquals(query),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::model::{
        lot::capacity::MAX_SPOTS_PER_LOT,
        spot::{ParkingSpot, SpotStatus},
    };

    fn create_request(price: &str, max_spots: i32) -> CreateLotRequest {
        serde_json::from_value(serde_json::json!({
            "name": "City Centre",
            "price": price,
            "address": "MG Road",
            "pincode": "560001",
            "maxSpots": max_spots,
        }))
        .unwrap()
    }

    #[test]
    fn lot_request_bounds() {
        assert!(create_request("25.5", 10).validate(&()).is_ok());
        assert!(create_request("999", 1).validate(&()).is_ok());
        assert!(create_request("999.01", 1).validate(&()).is_err());
        assert!(create_request("-1", 1).validate(&()).is_err());
        assert!(create_request("10", 0).validate(&()).is_err());
    }

    #[test]
    fn spot_count_is_capped() {
        assert!(create_request("10", MAX_SPOTS_PER_LOT).validate(&()).is_ok());
        assert!(create_request("10", MAX_SPOTS_PER_LOT + 1)
            .validate(&())
            .is_err());
        assert!(create_request("10", i32::MAX).validate(&()).is_err());

        let update: UpdateLotRequest = serde_json::from_value(serde_json::json!({
            "name": "City Centre",
            "price": "10",
            "address": "MG Road",
            "pincode": "560001",
            "maxSpots": i32::MAX,
        }))
        .unwrap();
        assert!(update.validate(&()).is_err());
    }

    #[test]
    fn price_is_rounded_to_two_places() {
        // round_dp は偶数丸め
        let lot = CreateLot::try_from(create_request("12.345", 4)).unwrap();
        assert_eq!(lot.hourly_rate, Decimal::from_str("12.34").unwrap());
        let lot = CreateLot::try_from(create_request("12.355", 4)).unwrap();
        assert_eq!(lot.hourly_rate, Decimal::from_str("12.36").unwrap());
        assert_eq!(lot.max_spots, 4);
    }

    #[test]
    fn admin_search_maps_to_lot_search() {
        let user_id = UserId::new();
        let by_user: AdminSearchRequest = serde_json::from_value(serde_json::json!({
            "searchBy": "user_id",
            "query": user_id.to_string(),
        }))
        .unwrap();
        assert_eq!(
            LotSearch::try_from(by_user).unwrap(),
            LotSearch::UsedBy(user_id)
        );

        let by_pincode: AdminSearchRequest = serde_json::from_value(serde_json::json!({
            "searchBy": "pincode",
            "query": " 560001 ",
        }))
        .unwrap();
        assert_eq!(
            LotSearch::try_from(by_pincode).unwrap(),
            LotSearch::PincodeEquals("560001".into())
        );

        let bad_id: AdminSearchRequest = serde_json::from_value(serde_json::json!({
            "searchBy": "user_id",
            "query": "not-a-uuid",
        }))
        .unwrap();
        assert!(LotSearch::try_from(bad_id).is_err());
    }

    #[test]
    fn search_response_reports_availability() {
        let lot = ParkingLot {
            lot_id: LotId::new(),
            name: "City Centre".into(),
            hourly_rate: Decimal::from(30),
            address: "MG Road".into(),
            pincode: "560001".into(),
            max_spots: 5,
            is_active: true,
            available_spots: 3,
            occupied_spots: 2,
        };
        let json = serde_json::to_value(SearchLotsResponse::from(vec![lot])).unwrap();
        assert_eq!(json["lots"][0]["availability"], 3);
        assert_eq!(json["lots"][0]["pincode"], "560001");
    }

    #[test]
    fn detail_lists_only_active_spots() {
        let lot_id = LotId::new();
        let spot = |spot_no, is_active| ParkingSpot {
            spot_id: Default::default(),
            lot_id,
            spot_no,
            status: SpotStatus::Available,
            is_active,
        };
        let detail = LotDetail {
            lot: ParkingLot {
                lot_id,
                name: "Depot".into(),
                hourly_rate: Decimal::from(10),
                address: "Ring Road".into(),
                pincode: "110001".into(),
                max_spots: 1,
                is_active: true,
                available_spots: 1,
                occupied_spots: 0,
            },
            spots: vec![spot(1, true), spot(2, false)],
        };
        let response = LotDetailResponse::from(detail);
        assert_eq!(response.spots.len(), 1);
        assert_eq!(response.spots[0].spot_no, 1);
    }
}
