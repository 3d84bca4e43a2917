//! Growing and shrinking a lot's pool of spots.
//!
//! Shrinking deactivates the highest-numbered available spots. Growing first
//! reactivates deactivated spots, highest number first, and only then
//! allocates new numbers above the highest number the lot has ever used.

use crate::model::{
    id::SpotId,
    spot::{ParkingSpot, SpotStatus},
};
use shared::error::{AppError, AppResult};
use std::cmp::Ordering;

/// Upper bound on a lot's configured number of spots.
pub const MAX_SPOTS_PER_LOT: i32 = 10_000;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResizePlan {
    pub deactivate: Vec<SpotId>,
    pub reactivate: Vec<SpotId>,
    pub create: Vec<i32>,
}

impl ResizePlan {
    pub fn is_empty(&self) -> bool {
        self.deactivate.is_empty() && self.reactivate.is_empty() && self.create.is_empty()
    }
}

fn ensure_spot_count(max_spots: i32) -> AppResult<()> {
    if !(1..=MAX_SPOTS_PER_LOT).contains(&max_spots) {
        return Err(AppError::ValidationError(format!(
            "a lot needs between 1 and {MAX_SPOTS_PER_LOT} spots"
        )));
    }
    Ok(())
}

/// Spot numbers for a brand new lot.
pub fn initial_spot_numbers(max_spots: i32) -> AppResult<Vec<i32>> {
    ensure_spot_count(max_spots)?;
    Ok((1..=max_spots).collect())
}

/// `spots` must hold every spot of the lot, active or not.
pub fn plan_resize(spots: &[ParkingSpot], new_max: i32) -> AppResult<ResizePlan> {
    ensure_spot_count(new_max)?;
    let target = new_max as usize;

    let occupied = spots
        .iter()
        .filter(|s| s.is_active && s.is_occupied())
        .count();
    if target < occupied {
        return Err(AppError::Conflict(format!(
            "cannot set max spots to {new_max}: {occupied} spots are occupied"
        )));
    }

    let active = spots.iter().filter(|s| s.is_active).count();
    let mut plan = ResizePlan::default();

    match target.cmp(&active) {
        Ordering::Less => {
            let mut candidates: Vec<&ParkingSpot> = spots
                .iter()
                .filter(|s| s.is_active && s.status == SpotStatus::Available)
                .collect();
            candidates.sort_by(|a, b| b.spot_no.cmp(&a.spot_no));
            plan.deactivate = candidates
                .into_iter()
                .take(active - target)
                .map(|s| s.spot_id)
                .collect();
        }
        Ordering::Greater => {
            let mut to_add = target - active;

            let mut dormant: Vec<&ParkingSpot> = spots
                .iter()
                .filter(|s| !s.is_active && s.status == SpotStatus::Available)
                .collect();
            dormant.sort_by(|a, b| b.spot_no.cmp(&a.spot_no));
            plan.reactivate = dormant
                .into_iter()
                .take(to_add)
                .map(|s| s.spot_id)
                .collect();
            to_add -= plan.reactivate.len();

            // 番号は一度使ったものより大きくする
            let out_of_numbers =
                || AppError::ValidationError("no spot numbers left for this lot".into());
            let next_no = spots
                .iter()
                .map(|s| s.spot_no)
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or_else(out_of_numbers)?;
            let end = i32::try_from(to_add)
                .ok()
                .and_then(|n| next_no.checked_add(n))
                .ok_or_else(out_of_numbers)?;
            plan.create = (next_no..end).collect();
        }
        Ordering::Equal => {}
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::LotId;

    struct Fixture {
        spots: Vec<ParkingSpot>,
    }

    impl Fixture {
        fn new(max: i32) -> Self {
            let lot_id = LotId::new();
            let spots = initial_spot_numbers(max)
                .unwrap()
                .into_iter()
                .map(|spot_no| ParkingSpot {
                    spot_id: SpotId::new(),
                    lot_id,
                    spot_no,
                    status: SpotStatus::Available,
                    is_active: true,
                })
                .collect();
            Self { spots }
        }

        fn occupy(mut self, numbers: &[i32]) -> Self {
            for s in self.spots.iter_mut().filter(|s| numbers.contains(&s.spot_no)) {
                s.status = SpotStatus::Occupied;
            }
            self
        }

        fn deactivate(mut self, numbers: &[i32]) -> Self {
            for s in self.spots.iter_mut().filter(|s| numbers.contains(&s.spot_no)) {
                s.is_active = false;
            }
            self
        }

        fn ids(&self, numbers: &[i32]) -> Vec<SpotId> {
            numbers
                .iter()
                .map(|n| {
                    self.spots
                        .iter()
                        .find(|s| s.spot_no == *n)
                        .map(|s| s.spot_id)
                        .unwrap()
                })
                .collect()
        }
    }

    #[test]
    fn shrink_keeps_occupied_spots() {
        let lot = Fixture::new(5).occupy(&[1, 2]);
        let plan = plan_resize(&lot.spots, 3).unwrap();
        assert_eq!(plan.deactivate, lot.ids(&[5, 4]));
        assert!(plan.reactivate.is_empty());
        assert!(plan.create.is_empty());
    }

    #[test]
    fn shrink_skips_occupied_high_numbers() {
        let lot = Fixture::new(5).occupy(&[4, 5]);
        let plan = plan_resize(&lot.spots, 3).unwrap();
        assert_eq!(plan.deactivate, lot.ids(&[3, 2]));
    }

    #[test]
    fn shrink_below_occupied_count_is_a_conflict() {
        let lot = Fixture::new(5).occupy(&[1, 2, 3]);
        assert!(matches!(
            plan_resize(&lot.spots, 2),
            Err(AppError::Conflict(_))
        ));
        assert!(plan_resize(&lot.spots, 3).is_ok());
    }

    #[test]
    fn grow_reuses_deactivated_spots_first() {
        let lot = Fixture::new(6).deactivate(&[4, 5, 6]);
        let plan = plan_resize(&lot.spots, 5).unwrap();
        assert_eq!(plan.reactivate, lot.ids(&[6, 5]));
        assert!(plan.create.is_empty());
        assert!(plan.deactivate.is_empty());
    }

    #[test]
    fn grow_allocates_above_highest_number_ever_used() {
        let lot = Fixture::new(5).deactivate(&[5]);
        let plan = plan_resize(&lot.spots, 7).unwrap();
        assert_eq!(plan.reactivate, lot.ids(&[5]));
        assert_eq!(plan.create, vec![6, 7]);
    }

    #[test]
    fn grow_from_empty_lot_starts_at_one() {
        let plan = plan_resize(&[], 3).unwrap();
        assert_eq!(plan.create, vec![1, 2, 3]);
    }

    #[test]
    fn same_size_is_a_no_op() {
        let lot = Fixture::new(4).occupy(&[2]);
        assert!(plan_resize(&lot.spots, 4).unwrap().is_empty());
    }

    #[test]
    fn repeated_resizes_do_not_grow_numbers() {
        let mut lot = Fixture::new(3);
        let plan = plan_resize(&lot.spots, 1).unwrap();
        lot = lot.deactivate(&[3, 2]);
        assert_eq!(plan.deactivate.len(), 2);

        let plan = plan_resize(&lot.spots, 3).unwrap();
        assert_eq!(plan.reactivate, lot.ids(&[3, 2]));
        assert!(plan.create.is_empty());
    }

    #[test]
    fn oversized_targets_are_rejected() {
        let lot = Fixture::new(2);
        assert!(matches!(
            plan_resize(&lot.spots, i32::MAX),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            plan_resize(&lot.spots, MAX_SPOTS_PER_LOT + 1),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            initial_spot_numbers(i32::MAX),
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(
            plan_resize(&lot.spots, MAX_SPOTS_PER_LOT).unwrap().create.len(),
            (MAX_SPOTS_PER_LOT - 2) as usize
        );
    }

    #[test]
    fn spot_numbers_near_the_integer_limit_do_not_wrap() {
        let lot_id = LotId::new();
        let spots = vec![ParkingSpot {
            spot_id: SpotId::new(),
            lot_id,
            spot_no: i32::MAX - 1,
            status: SpotStatus::Available,
            is_active: true,
        }];
        assert!(matches!(
            plan_resize(&spots, 3),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn zero_spots_is_invalid() {
        let lot = Fixture::new(2);
        assert!(matches!(
            plan_resize(&lot.spots, 0),
            Err(AppError::ValidationError(_))
        ));
    }
}
