pub mod channel;
pub mod eventsub;
pub mod game;
pub mod user;

use serde::Deserialize;

/// Helix wraps every list result in `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub cursor: Option<String>,
}
