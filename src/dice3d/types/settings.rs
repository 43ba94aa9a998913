//! Simulation settings types and loading
//!
//! Settings are plain serde structs so they can be read from a JSON or RON
//! file. Every field has a default, so a partial file only overrides what it
//! names. [`SimulationSettings::validate`] rejects configurations the
//! simulation cannot run with.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::dice::FaceTable;

/// Fatal configuration problems, surfaced to the host before anything runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid step size {0}: must be finite and greater than zero")]
    InvalidStepSize(f32),

    #[error("gravity must be finite, got {0:?}")]
    InvalidGravity([f32; 3]),

    #[error("degenerate die: {0}")]
    DegenerateDie(String),

    #[error("degenerate arena: {0}")]
    DegenerateArena(String),

    #[error("face table {0:?} must assign the labels 1 through 6 exactly once")]
    FaceTableNotBijective([u8; 6]),

    #[error("indicator reach {reach} must exceed the die edge length {edge_length}")]
    IndicatorReach { reach: f32, edge_length: f32 },

    #[error("invalid camera setting: {0}")]
    InvalidCamera(String),

    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {message}")]
    Parse { path: String, message: String },
}

/// How the die orientation is renormalized after every step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuatNormalization {
    /// Divide by the exact length
    Exact,
    /// First-order correction `q * (3 - |q|^2) / 2`, accurate near unit length
    #[default]
    Fast,
}

impl QuatNormalization {
    pub fn apply(self, q: Quat) -> Quat {
        match self {
            QuatNormalization::Exact => q.normalize(),
            QuatNormalization::Fast => q * ((3.0 - q.length_squared()) * 0.5),
        }
    }
}

/// When the face mapper is allowed to read a new face
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceReportMode {
    /// Resolve the face on every settled frame
    #[default]
    Continuous,
    /// Resolve once per settle, and only after the die was lifted above one
    /// edge length since the previous read
    OncePerSettle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSettings {
    #[serde(default = "default_timestep")]
    pub timestep: f32,

    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],

    #[serde(default)]
    pub quat_normalization: QuatNormalization,
}

fn default_timestep() -> f32 {
    1.0 / 60.0
}
fn default_gravity() -> [f32; 3] {
    [0.0, -9.82, 0.0]
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            timestep: default_timestep(),
            gravity: default_gravity(),
            quat_normalization: QuatNormalization::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DieSettings {
    #[serde(default = "default_edge_length")]
    pub edge_length: f32,

    #[serde(default = "default_mass")]
    pub mass: f32,

    #[serde(default = "default_angular_damping")]
    pub angular_damping: f32,

    /// Combined with the floor and walls by taking the minimum
    #[serde(default = "default_restitution")]
    pub restitution: f32,

    #[serde(default = "default_friction")]
    pub friction: f32,

    #[serde(default = "default_start_position")]
    pub start_position: [f32; 3],

    /// Distance of each indicator point from the die center, in body units
    #[serde(default = "default_indicator_reach")]
    pub indicator_reach: f32,

    #[serde(default)]
    pub face_table: FaceTable,
}

fn default_edge_length() -> f32 {
    0.2
}
fn default_mass() -> f32 {
    3.0
}
fn default_angular_damping() -> f32 {
    0.01
}
fn default_restitution() -> f32 {
    0.0
}
fn default_friction() -> f32 {
    0.7
}
fn default_start_position() -> [f32; 3] {
    [0.0, 5.0, 0.0]
}
fn default_indicator_reach() -> f32 {
    1.0
}

impl Default for DieSettings {
    fn default() -> Self {
        Self {
            edge_length: default_edge_length(),
            mass: default_mass(),
            angular_damping: default_angular_damping(),
            restitution: default_restitution(),
            friction: default_friction(),
            start_position: default_start_position(),
            indicator_reach: default_indicator_reach(),
            face_table: FaceTable::default(),
        }
    }
}

impl DieSettings {
    pub fn half_extent(&self) -> f32 {
        self.edge_length * 0.5
    }

    pub fn density(&self) -> f32 {
        self.mass / self.edge_length.powi(3)
    }

    /// Start pose: configured position, identity orientation
    pub fn start_transform(&self) -> Transform {
        Transform::from_translation(Vec3::from_array(self.start_position))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSettings {
    #[serde(default)]
    pub floor_height: f32,

    /// Walls stand at +-this distance from the origin along x and z
    #[serde(default = "default_wall_half_extent")]
    pub wall_half_extent: f32,
}

fn default_wall_half_extent() -> f32 {
    10.0
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            floor_height: 0.0,
            wall_half_extent: default_wall_half_extent(),
        }
    }
}

impl ArenaSettings {
    /// Pull `point` in along x and z so anything within `margin` of it stays
    /// between the walls.
    pub fn clamp_inside(&self, point: Vec3, margin: f32) -> Vec3 {
        let limit = (self.wall_half_extent - margin).max(0.0);
        Vec3::new(
            point.x.clamp(-limit, limit),
            point.y,
            point.z.clamp(-limit, limit),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "default_target_offset")]
    pub target_offset: [f32; 3],

    #[serde(default = "default_recoil_decay")]
    pub recoil_decay: f32,

    /// Vertical field of view in degrees
    #[serde(default = "default_fov_degrees")]
    pub fov_degrees: f32,
}

fn default_target_offset() -> [f32; 3] {
    [0.0, 1.0, 1.0]
}
fn default_recoil_decay() -> f32 {
    0.95
}
fn default_fov_degrees() -> f32 {
    70.0
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            target_offset: default_target_offset(),
            recoil_decay: default_recoil_decay(),
            fov_degrees: default_fov_degrees(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSettings {
    /// Acceleration components at or below this magnitude are ignored
    #[serde(default = "default_dead_band")]
    pub dead_band: f32,

    #[serde(default = "default_motion_scale")]
    pub scale: [f32; 3],
}

fn default_dead_band() -> f32 {
    1.0
}
fn default_motion_scale() -> [f32; 3] {
    [0.05, 0.05, 0.05]
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            dead_band: default_dead_band(),
            scale: default_motion_scale(),
        }
    }
}

/// Complete configuration of one die simulation
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    #[serde(default)]
    pub physics: PhysicsSettings,

    #[serde(default)]
    pub die: DieSettings,

    #[serde(default)]
    pub arena: ArenaSettings,

    #[serde(default)]
    pub camera: CameraSettings,

    #[serde(default)]
    pub motion: MotionSettings,

    #[serde(default)]
    pub face_report_mode: FaceReportMode,
}

impl SimulationSettings {
    /// Load settings from a `.ron` or `.json` file and validate them.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

        let is_ron = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ron"));

        let settings = if is_ron {
            Self::from_ron_str(&text)
        } else {
            Self::from_json_str(&text)
        }
        .map_err(|message| ConfigError::Parse {
            path: display,
            message,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    pub fn from_ron_str(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|e| e.to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let dt = self.physics.timestep;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidStepSize(dt));
        }

        if !self.physics.gravity.iter().all(|g| g.is_finite()) {
            return Err(ConfigError::InvalidGravity(self.physics.gravity));
        }

        let die = &self.die;
        if !die.edge_length.is_finite() || die.edge_length <= 0.0 {
            return Err(ConfigError::DegenerateDie(format!(
                "edge length {} must be greater than zero",
                die.edge_length
            )));
        }
        if !die.mass.is_finite() || die.mass <= 0.0 {
            return Err(ConfigError::DegenerateDie(format!(
                "mass {} must be greater than zero",
                die.mass
            )));
        }
        if die.angular_damping < 0.0 {
            return Err(ConfigError::DegenerateDie(format!(
                "angular damping {} must not be negative",
                die.angular_damping
            )));
        }
        if !die.start_position.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::DegenerateDie(format!(
                "start position {:?} must be finite",
                die.start_position
            )));
        }
        if die.indicator_reach <= die.edge_length {
            return Err(ConfigError::IndicatorReach {
                reach: die.indicator_reach,
                edge_length: die.edge_length,
            });
        }
        if !die.face_table.is_bijection() {
            return Err(ConfigError::FaceTableNotBijective(die.face_table.0));
        }

        if self.arena.wall_half_extent <= die.edge_length {
            return Err(ConfigError::DegenerateArena(format!(
                "wall half extent {} must exceed the die edge length {}",
                self.arena.wall_half_extent, die.edge_length
            )));
        }
        if die.start_position[1] - self.arena.floor_height < die.half_extent() {
            return Err(ConfigError::DegenerateArena(
                "die start position lies below the floor".to_string(),
            ));
        }

        let camera = &self.camera;
        if !(0.0..1.0).contains(&camera.recoil_decay) {
            return Err(ConfigError::InvalidCamera(format!(
                "recoil decay {} must be in [0, 1)",
                camera.recoil_decay
            )));
        }
        if !(1.0..179.0).contains(&camera.fov_degrees) {
            return Err(ConfigError::InvalidCamera(format!(
                "field of view {} must be between 1 and 179 degrees",
                camera.fov_degrees
            )));
        }
        if Vec3::from_array(camera.target_offset).length_squared() <= f32::EPSILON {
            return Err(ConfigError::InvalidCamera(
                "target offset must not be zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.physics.gravity)
    }

    /// Height of the die center above the floor
    pub fn elevation_of(&self, position: Vec3) -> f32 {
        position.y - self.arena.floor_height
    }
}

/// Command-line options shared by the windowed app and the CLI
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Settings file (.json or .ron); defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Renormalize the die orientation exactly instead of the fast approximation
    #[arg(long)]
    pub exact_normalization: bool,

    /// Read the face once per settle instead of on every settled frame
    #[arg(long)]
    pub report_once: bool,
}

impl SettingsArgs {
    /// Load the settings file (if any), then apply the flag overrides.
    pub fn resolve(&self) -> Result<SimulationSettings, ConfigError> {
        let mut settings = match &self.config {
            Some(path) => SimulationSettings::load(path)?,
            None => SimulationSettings::default(),
        };
        if self.exact_normalization {
            settings.physics.quat_normalization = QuatNormalization::Exact;
        }
        if self.report_once {
            settings.face_report_mode = FaceReportMode::OncePerSettle;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = SimulationSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.physics.timestep, 1.0 / 60.0);
        assert_eq!(settings.die.start_position, [0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_rejects_non_positive_step() {
        let mut settings = SimulationSettings::default();
        settings.physics.timestep = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidStepSize(_))
        ));
        settings.physics.timestep = -0.1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_die() {
        let mut settings = SimulationSettings::default();
        settings.die.edge_length = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::DegenerateDie(_))
        ));

        let mut settings = SimulationSettings::default();
        settings.die.mass = -1.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::DegenerateDie(_))
        ));
    }

    #[test]
    fn test_rejects_broken_face_table() {
        let mut settings = SimulationSettings::default();
        settings.die.face_table = FaceTable([1, 2, 3, 4, 5, 5]);
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::FaceTableNotBijective(_))
        ));
    }

    #[test]
    fn test_rejects_short_indicator_reach() {
        let mut settings = SimulationSettings::default();
        settings.die.indicator_reach = settings.die.edge_length;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::IndicatorReach { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = SimulationSettings::from_json_str(
            r#"{ "physics": { "quat_normalization": "exact" }, "face_report_mode": "once_per_settle" }"#,
        )
        .unwrap();
        assert_eq!(settings.physics.quat_normalization, QuatNormalization::Exact);
        assert_eq!(settings.face_report_mode, FaceReportMode::OncePerSettle);
        assert_eq!(settings.die, DieSettings::default());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let settings =
            SimulationSettings::from_ron_str("(die: (edge_length: 0.5, indicator_reach: 2.0))")
                .unwrap();
        assert_eq!(settings.die.edge_length, 0.5);
        assert_eq!(settings.die.mass, 3.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = SettingsArgs {
            config: None,
            exact_normalization: true,
            report_once: true,
        };
        let settings = args.resolve().unwrap();
        assert_eq!(settings.physics.quat_normalization, QuatNormalization::Exact);
        assert_eq!(settings.face_report_mode, FaceReportMode::OncePerSettle);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = SimulationSettings::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_fast_normalization_pulls_toward_unit_length() {
        let q = Quat::from_xyzw(0.0, 0.0, 0.0, 1.02);
        let fast = QuatNormalization::Fast.apply(q);
        let exact = QuatNormalization::Exact.apply(q);
        assert!((exact.length() - 1.0).abs() < 1e-6);
        assert!((fast.length() - 1.0).abs() < (q.length() - 1.0).abs());
    }

    #[test]
    fn test_clamp_inside_keeps_margin_from_walls() {
        let arena = ArenaSettings {
            floor_height: 0.0,
            wall_half_extent: 1.0,
        };
        let clamped = arena.clamp_inside(Vec3::new(2.5, 0.3, -4.0), 0.25);
        assert_eq!(clamped, Vec3::new(0.75, 0.3, -0.75));

        let inside = Vec3::new(0.2, 0.1, -0.5);
        assert_eq!(arena.clamp_inside(inside, 0.25), inside);
    }
}
