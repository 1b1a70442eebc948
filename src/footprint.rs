use serde::{Deserialize, Serialize};

const ENERGY_KG_CO2_PER_KWH: f64 = 0.233;
const TRANSPORT_KG_CO2_PER_KM: f64 = 0.12;
const WASTE_KG_CO2_PER_KG: f64 = 0.5;

/// Total carbon footprint in kg CO2 for the given usage figures.
pub fn calculate_footprint(energy_kwh: f64, transport_km: f64, waste_kg: f64) -> f64 {
    energy_kwh * ENERGY_KG_CO2_PER_KWH
        + transport_km * TRANSPORT_KG_CO2_PER_KM
        + waste_kg * WASTE_KG_CO2_PER_KG
}

/// One submission, laid out in store column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(rename = "Client")]
    pub client: String,
    pub energy_kwh: f64,
    pub transport_km: f64,
    pub waste_kg: f64,
    pub total_footprint: f64,
}

impl ClientRecord {
    pub fn new(client: impl Into<String>, energy_kwh: f64, transport_km: f64, waste_kg: f64) -> Self {
        ClientRecord {
            client: client.into(),
            energy_kwh,
            transport_km,
            waste_kg,
            total_footprint: calculate_footprint(energy_kwh, transport_km, waste_kg),
        }
    }
}

/// Formats a value the way the store writes it: `10.0`, `3.93`.
pub fn display_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
