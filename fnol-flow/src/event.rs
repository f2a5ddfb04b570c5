use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Category of the reported incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    TowingOnly,
    Collision,
    InjuredAsPedestrian,
    InjuredAPedestrian,
    DamageCausedByWeather,
    DamageCausedByFire,
    DamageCausedByAnimals,
    VehicleVandalized,
    VehicleBrokenIntoOrStolen,
    OtherVehicleDamage,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        EventType::TowingOnly,
        EventType::Collision,
        EventType::InjuredAsPedestrian,
        EventType::InjuredAPedestrian,
        EventType::DamageCausedByWeather,
        EventType::DamageCausedByFire,
        EventType::DamageCausedByAnimals,
        EventType::VehicleVandalized,
        EventType::VehicleBrokenIntoOrStolen,
        EventType::OtherVehicleDamage,
    ];

    /// Substituted whenever the classifier returns something outside the enumeration
    pub const FALLBACK: EventType = EventType::OtherVehicleDamage;

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TowingOnly => "towing-only",
            EventType::Collision => "collision",
            EventType::InjuredAsPedestrian => "injured-as-pedestrian",
            EventType::InjuredAPedestrian => "injured-a-pedestrian",
            EventType::DamageCausedByWeather => "damage-caused-by-weather",
            EventType::DamageCausedByFire => "damage-caused-by-fire",
            EventType::DamageCausedByAnimals => "damage-caused-by-animals",
            EventType::VehicleVandalized => "vehicle-vandalized",
            EventType::VehicleBrokenIntoOrStolen => "vehicle-broken-into-or-stolen",
            EventType::OtherVehicleDamage => "other-vehicle-damage",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::TowingOnly => "Towing Only",
            EventType::Collision => "Collision",
            EventType::InjuredAsPedestrian => "Injured as Pedestrian/Bicyclist",
            EventType::InjuredAPedestrian => "Injured a Pedestrian/Bicyclist",
            EventType::DamageCausedByWeather => "Damage Caused by Weather",
            EventType::DamageCausedByFire => "Damage Caused by Fire",
            EventType::DamageCausedByAnimals => "Damage Caused by Animals",
            EventType::VehicleVandalized => "Vehicle Vandalized",
            EventType::VehicleBrokenIntoOrStolen => "Vehicle Broken Into or Stolen",
            EventType::OtherVehicleDamage => "Other Vehicle Damage",
        }
    }

    pub fn definition(&self) -> &'static str {
        match self {
            EventType::TowingOnly => "Vehicle requires towing without additional damage.",
            EventType::Collision => "Involvement in a vehicular accident.",
            EventType::InjuredAsPedestrian => {
                "Policyholder was injured while on foot or cycling."
            }
            EventType::InjuredAPedestrian => {
                "Policyholder's vehicle injured a pedestrian or cyclist."
            }
            EventType::DamageCausedByWeather => {
                "Vehicle damaged due to weather events such as flooding or hail."
            }
            EventType::DamageCausedByFire => "Vehicle damaged due to fire.",
            EventType::DamageCausedByAnimals => {
                "Vehicle damaged due to an animal-related incident."
            }
            EventType::VehicleVandalized => "Vehicle intentionally damaged by a third party.",
            EventType::VehicleBrokenIntoOrStolen => "Vehicle was broken into or stolen.",
            EventType::OtherVehicleDamage => {
                "Any vehicle damage that does not fit the above categories."
            }
        }
    }

    /// Validates a raw classifier answer, falling back to [`EventType::FALLBACK`]
    pub fn parse_or_fallback(raw: &str) -> EventType {
        match raw.parse() {
            Ok(event_type) => event_type,
            Err(_) => {
                warn!(
                    raw_event_type = %raw,
                    fallback = %EventType::FALLBACK,
                    "Classifier returned an unknown event type, using fallback"
                );
                EventType::FALLBACK
            }
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().trim_matches('"');
        EventType::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for event_type in EventType::ALL {
            assert_eq!(event_type.as_str().parse::<EventType>(), Ok(event_type));
        }
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&EventType::VehicleBrokenIntoOrStolen).unwrap();
        assert_eq!(json, "\"vehicle-broken-into-or-stolen\"");
    }

    #[test]
    fn invalid_classification_falls_back() {
        assert_eq!(EventType::parse_or_fallback("spaceship"), EventType::FALLBACK);
        assert_eq!(EventType::parse_or_fallback(""), EventType::FALLBACK);
        assert_eq!(EventType::parse_or_fallback(" Collision "), EventType::Collision);
    }
}
