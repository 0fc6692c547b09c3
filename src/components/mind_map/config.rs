use force_graph::SimulationParameters;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Force simulation tuning, handed to `force_graph` as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsConfig {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}
}

impl PhysicsConfig {
	pub fn simulation_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

/// Every tunable of the layered visualization.
///
/// Deserializes from camelCase JSON; missing fields keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualizationConfig {
	/// Inner layer switches back to outer below this zoom.
	pub zoom_out_threshold: f64,
	/// Outer layer switches into the hovered node above this zoom.
	pub zoom_in_threshold: f64,
	/// Zoom-based switching is suppressed this long after an explicit transition.
	pub cooldown_ms: f64,
	pub double_click_ms: f64,
	/// Camera scale used when focusing an entered node.
	pub focus_scale: f64,
	pub focus_duration_ms: f64,
	pub fade_steps: u32,
	pub fade_interval_ms: u32,
	/// Radius ghost nodes fan out to during a cross-fade.
	pub ghost_spread: f64,
	pub settle_delay_ms: u32,
	pub stabilization_iterations: u32,
	/// Radius step between layers in the concentric bootstrap layout.
	pub ring_spacing: f64,
	/// How many nodes the outer layer shows when no root can be found.
	pub fallback_prefix: usize,
	pub physics: PhysicsConfig,
}

impl Default for VisualizationConfig {
	fn default() -> Self {
		Self {
			zoom_out_threshold: 0.5,
			zoom_in_threshold: 1.5,
			cooldown_ms: 650.0,
			double_click_ms: 300.0,
			focus_scale: 1.0,
			focus_duration_ms: 500.0,
			fade_steps: 12,
			fade_interval_ms: 40,
			ghost_spread: 150.0,
			settle_delay_ms: 400,
			stabilization_iterations: 200,
			ring_spacing: 160.0,
			fallback_prefix: 5,
			physics: PhysicsConfig::default(),
		}
	}
}

impl VisualizationConfig {
	pub fn from_json(input: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if !(self.zoom_out_threshold < self.zoom_in_threshold) {
			return Err(config_error(format!(
				"zoom-out threshold {} must be below zoom-in threshold {}",
				self.zoom_out_threshold, self.zoom_in_threshold
			)));
		}
		if self.focus_scale <= self.zoom_out_threshold {
			return Err(config_error(format!(
				"focus scale {} would immediately trigger a zoom-out (threshold {})",
				self.focus_scale, self.zoom_out_threshold
			)));
		}
		if self.fade_steps == 0 {
			return Err(config_error("fade steps must be at least 1".into()));
		}
		Ok(())
	}
}

fn config_error(message: String) -> Error {
	Error::Config { message }
}
