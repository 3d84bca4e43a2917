//! Time-based parking fees.
//!
//! Fees are computed at full precision and stored unrounded; rounding to
//! currency precision happens only when an amount is rendered.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult};

const MILLIS_PER_HOUR: i64 = 3_600_000;
const CURRENCY_SCALE: u32 = 2;

/// Fee for parking from `start` to `end` at `hourly_rate`:
/// elapsed hours (millisecond resolution) times the rate.
pub fn parking_fee(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    hourly_rate: Decimal,
) -> AppResult<Decimal> {
    if end < start {
        return Err(AppError::ValidationError(format!(
            "leaving time {end} is earlier than parking time {start}"
        )));
    }
    if hourly_rate < Decimal::ZERO {
        return Err(AppError::ValidationError(format!(
            "hourly rate must not be negative: {hourly_rate}"
        )));
    }

    // 先に掛けてから割ることで 1/3600 の丸め誤差を持ち込まない
    let elapsed_millis = Decimal::from((end - start).num_milliseconds());
    Ok(elapsed_millis * hourly_rate / Decimal::from(MILLIS_PER_HOUR))
}

// round_dp は偶数丸め（12.345 -> 12.34）。駐車場の料金設定も同じ規則で丸める
pub fn display_amount(amount: Decimal) -> Decimal {
    amount.round_dp(CURRENCY_SCALE)
}
