//! Nearest-observation computation. Pure functions over a position and an
//! observation snapshot; no state of its own.
use crate::geo::{GeoPoint, haversine_distance};
use crate::observations::{Category, Observation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One category's closest observation and its distance from the observer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestObservation {
    pub observation: Observation,
    pub distance_m: f64,
}

/// Nearest observation per category for one tick. Categories without
/// observations stay empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceSummary {
    pub cell_tower: Option<NearestObservation>,
    pub wifi: Option<NearestObservation>,
    pub bluetooth: Option<NearestObservation>,
    pub drone: Option<NearestObservation>,
    pub camera: Option<NearestObservation>,
}

impl DistanceSummary {
    pub fn get(&self, category: Category) -> Option<&NearestObservation> {
        match category {
            Category::CellTower => self.cell_tower.as_ref(),
            Category::Wifi => self.wifi.as_ref(),
            Category::Bluetooth => self.bluetooth.as_ref(),
            Category::Drone => self.drone.as_ref(),
            Category::Camera => self.camera.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_none())
    }
}

/// Computes the nearest observation for every category in `sets`.
pub fn summarize(
    position: GeoPoint,
    sets: &HashMap<Category, Vec<Observation>>,
) -> DistanceSummary {
    let mut summary = DistanceSummary::default();
    for (category, observations) in sets {
        let Some(nearest) = nearest_observation(position, observations) else {
            continue;
        };
        let slot = match category {
            Category::CellTower => &mut summary.cell_tower,
            Category::Wifi => &mut summary.wifi,
            Category::Bluetooth => &mut summary.bluetooth,
            Category::Drone => &mut summary.drone,
            Category::Camera => &mut summary.camera,
        };
        *slot = Some(nearest);
    }
    summary
}

/// The observation closest to `position`, by great-circle distance. Ties
/// keep the first-encountered observation.
pub fn nearest_observation(
    position: GeoPoint,
    observations: &[Observation],
) -> Option<NearestObservation> {
    let mut best: Option<NearestObservation> = None;
    for observation in observations {
        let distance_m = haversine_distance(&position, &observation.point);
        if best.as_ref().is_none_or(|b| distance_m < b.distance_m) {
            best = Some(NearestObservation {
                observation: observation.clone(),
                distance_m,
            });
        }
    }
    best
}
