use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadId(pub String);

impl std::fmt::Display for LoadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A shipment offered on the load board. Read-only from the call flow's
/// point of view; `loadboard_rate` is the posted asking rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Load {
    pub load_id: LoadId,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub pickup_datetime: Option<String>,
    #[serde(default)]
    pub delivery_datetime: Option<String>,
    #[serde(default)]
    pub equipment_type: Option<String>,
    #[serde(default)]
    pub weight: Option<u32>,
    pub loadboard_rate: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub commodity_type: Option<String>,
    #[serde(default)]
    pub num_of_pieces: Option<u32>,
    #[serde(default)]
    pub miles: Option<u32>,
    #[serde(default)]
    pub dimensions: Option<String>,
}

impl Load {
    /// Case-insensitive substring match on origin and destination,
    /// each tested independently. Empty needles match everything.
    pub fn matches_route(&self, origin: &str, destination: &str) -> bool {
        let origin_needle = origin.trim().to_lowercase();
        let destination_needle = destination.trim().to_lowercase();

        self.origin.trim().to_lowercase().contains(&origin_needle)
            && self.destination.trim().to_lowercase().contains(&destination_needle)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Load, LoadId};

    fn load(origin: &str, destination: &str) -> Load {
        Load {
            load_id: LoadId("L-1".to_string()),
            origin: origin.to_string(),
            destination: destination.to_string(),
            pickup_datetime: None,
            delivery_datetime: None,
            equipment_type: None,
            weight: None,
            loadboard_rate: Decimal::new(1500, 0),
            notes: None,
            commodity_type: None,
            num_of_pieces: None,
            miles: None,
            dimensions: None,
        }
    }

    #[test]
    fn route_match_is_case_insensitive_substring() {
        let load = load("Los Angeles, CA", "Phoenix, AZ");
        assert!(load.matches_route("los angeles", "phoenix"));
        assert!(load.matches_route("  LOS ANGELES ", "az"));
        assert!(!load.matches_route("san diego", "phoenix"));
    }

    #[test]
    fn route_fields_are_tested_independently() {
        let load = load("Dallas, TX", "Miami, FL");
        assert!(!load.matches_route("dallas, tx miami", ""));
        assert!(!load.matches_route("miami", "dallas"));
    }

    #[test]
    fn empty_needles_match_everything() {
        assert!(load("Dallas, TX", "Miami, FL").matches_route("", ""));
    }
}
