//! Carbon-footprint accounting for containerized runs: a wall-clock
//! power-draw estimate plus the everyday-equivalence report.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// kg CO2 emitted per mile driven by an average car
pub const CAR_KG_PER_MILE: f64 = 0.409;

/// kg CO2 per hour of watching a 32-inch LCD TV
pub const TV_KG_PER_HOUR: f64 = 0.097;

pub const MILES_TO_KM: f64 = 1.60934;

/// Default whole-node power draw while processing, in watts
pub const DEFAULT_POWER_WATTS: f64 = 85.0;

/// Default grid carbon intensity (world average), kg CO2 per kWh
pub const DEFAULT_CARBON_INTENSITY: f64 = 0.475;

/// Distance an average car would cover for the same emissions, in km.
pub fn car_kms_equivalent(emissions_kg: f64) -> f64 {
    emissions_kg / CAR_KG_PER_MILE * MILES_TO_KM
}

/// TV time with the same footprint, as "Hh MMmin".
pub fn tv_time_equivalent(emissions_kg: f64) -> String {
    let hours = emissions_kg / TV_KG_PER_HOUR;
    let whole_hours = hours.floor() as u64;
    let minutes = ((hours - whole_hours as f64) * 60.0).round() as u64;
    format!("{}h {:02}min", whole_hours, minutes)
}

/// Estimates emissions from elapsed wall time, assuming a constant power
/// draw and grid intensity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionsModel {
    pub power_watts: f64,
    pub carbon_intensity_kg_per_kwh: f64,
}

impl Default for EmissionsModel {
    fn default() -> Self {
        Self {
            power_watts: DEFAULT_POWER_WATTS,
            carbon_intensity_kg_per_kwh: DEFAULT_CARBON_INTENSITY,
        }
    }
}

impl EmissionsModel {
    pub fn emissions_kg(&self, elapsed_secs: f64) -> f64 {
        let kwh = self.power_watts / 1000.0 * (elapsed_secs / 3600.0);
        kwh * self.carbon_intensity_kg_per_kwh
    }
}

/// Running tracker around a processing interval.
pub struct EmissionsTracker {
    model: EmissionsModel,
    started: Instant,
}

impl EmissionsTracker {
    pub fn start(model: EmissionsModel) -> Self {
        Self {
            model,
            started: Instant::now(),
        }
    }

    /// Emissions in kg CO2 for the elapsed interval.
    pub fn stop(&self) -> f64 {
        self.model.emissions_kg(self.started.elapsed().as_secs_f64())
    }
}

/// Multi-line footprint report for a finished run: measured emissions plus
/// a projection to a 100-subject study.
pub fn footprint_report(emissions_kg: f64, n_subjects: usize) -> String {
    let n_subjects = n_subjects.max(1);
    let mut report = String::new();
    report.push_str("############################################################\n");
    report.push_str(&format!(
        "CARBON FOOTPRINT OF {} SUBJECT(S) PROCESSED\n",
        n_subjects
    ));
    report.push_str("############################################################\n");
    report.push_str(&format!(" * Estimated Co2 emissions: {:.6} kg\n", emissions_kg));
    report.push_str(&format!(
        " * Equivalent in distance travelled by avg car: {:.3} kms\n",
        car_kms_equivalent(emissions_kg)
    ));
    report.push_str(&format!(
        " * Equivalent in amount of time watching a 32-inch LCD flat screen TV: {}\n",
        tv_time_equivalent(emissions_kg)
    ));
    report.push_str("############################################################\n");
    report.push_str("PREDICTED CARBON FOOTPRINT OF 100 SUBJECTS PROCESSED\n");
    report.push_str("############################################################\n");
    let predicted = 100.0 * emissions_kg / n_subjects as f64;
    report.push_str(&format!(" * Estimated Co2 emissions: {:.6} kg\n", predicted));
    report.push_str(&format!(
        " * Equivalent in distance travelled by avg car: {:.3} kms\n",
        car_kms_equivalent(predicted)
    ));
    report.push_str(&format!(
        " * Equivalent in amount of time watching a 32-inch LCD flat screen TV: {}\n",
        tv_time_equivalent(predicted)
    ));
    report
}
