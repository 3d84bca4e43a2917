use crate::model::reservation::ReleasePreviewResponse;
use chrono::{DateTime, Utc};
use kernel::model::{
    id::{LotId, SpotId},
    spot::{ParkingSpot, SpotDetail, SpotStatus},
};
use serde::Serialize;
use shared::error::AppResult;

#[derive(Debug, PartialEq, Eq, Serialize)]
pub enum SpotStatusName {
    Available,
    Occupied,
}

impl From<SpotStatus> for SpotStatusName {
    fn from(value: SpotStatus) -> Self {
        match value {
            SpotStatus::Available => Self::Available,
            SpotStatus::Occupied => Self::Occupied,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotResponse {
    pub id: SpotId,
    pub spot_no: i32,
    pub status: SpotStatusName,
}

impl From<ParkingSpot> for SpotResponse {
    fn from(value: ParkingSpot) -> Self {
        let ParkingSpot {
            spot_id,
            spot_no,
            status,
            ..
        } = value;
        Self {
            id: spot_id,
            spot_no,
            status: status.into(),
        }
    }
}

// 管理者向けスポット詳細。駐車中なら現在までの料金見込みを含む
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDetailResponse {
    pub id: SpotId,
    pub lot_id: LotId,
    pub lot_name: String,
    pub spot_no: i32,
    pub status: SpotStatusName,
    pub occupancy: Option<ReleasePreviewResponse>,
}

impl SpotDetailResponse {
    pub fn at(detail: SpotDetail, now: DateTime<Utc>) -> AppResult<Self> {
        let SpotDetail {
            spot,
            lot_name,
            current_reservation,
        } = detail;
        let occupancy = current_reservation
            .map(|reservation| ReleasePreviewResponse::at(reservation, now))
            .transpose()?;
        Ok(Self {
            id: spot.spot_id,
            lot_id: spot.lot_id,
            lot_name,
            spot_no: spot.spot_no,
            status: spot.status.into(),
            occupancy,
        })
    }
}
