use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::timestamp;

/// Registro inmutable de un viaje completado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripHistory {
    pub id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    pub driver_name: String,
    pub start_location: String,
    pub destination: String,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,
    /// Minutos completos entre inicio y fin
    pub duration: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Duración en minutos, truncada hacia abajo
pub fn trip_duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds().div_euclid(60_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn duration_floors_partial_minutes() {
        let start = Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap();
        assert_eq!(trip_duration_minutes(start, start + Duration::minutes(47)), 47);
        assert_eq!(
            trip_duration_minutes(start, start + Duration::seconds(47 * 60 + 59)),
            47
        );
        assert_eq!(trip_duration_minutes(start, start), 0);
    }
}
