//! Reservation document shape.

use serde::{Deserialize, Serialize};

use crate::services::Validate;

pub const RESERVATIONS: &str = "reservation";

/// A bike reservation as stored and served.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReservationDetails {
    pub reservation_id: String,
    pub bike_id: String,
    pub user_id: String,
    pub request_time: String,
    pub start_time: String,
    pub end_time: String,
    pub state: String,
    pub request_id: String,
}

impl Validate for ReservationDetails {
    fn violations(&self) -> Vec<&'static str> {
        let required = [
            (&self.reservation_id, "Must specify reservationId string"),
            (&self.bike_id, "Must specify bikeId string"),
            (&self.user_id, "Must specify userId string"),
            (&self.request_time, "Must specify requestTime string"),
            (&self.start_time, "Must specify startTime string"),
            (&self.state, "Must specify state string"),
            (&self.request_id, "Must specify requestId string"),
        ];
        required
            .into_iter()
            .filter(|(value, _)| value.is_empty())
            .map(|(_, message)| message)
            .collect()
    }
}
