use anyhow::{Context, Result};
use pantograph_core::linkage::{JointAngles, Linkage, Point};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Main configuration for the pantograph runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Linkage geometry
    #[serde(default)]
    pub linkage: LinkageConfig,

    /// Robot startup state
    #[serde(default)]
    pub robot: RobotConfig,

    /// Motion limits and control loop timing
    #[serde(default)]
    pub motion: MotionConfig,
}

/// Linkage geometry, meters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkageConfig {
    /// Distance between the two motor pivots
    #[serde(default = "default_motor_distance")]
    pub motor_distance: f64,

    /// Length of the motor-driven arms
    #[serde(default = "default_base_arm_length")]
    pub base_arm_length: f64,

    /// Length of the passive link arms
    #[serde(default = "default_link_arm_length")]
    pub link_arm_length: f64,

    /// Tool-center-point offset from the end-effector joint
    #[serde(default)]
    pub tcp_offset: [f64; 2],
}

impl Default for LinkageConfig {
    fn default() -> Self {
        Self {
            motor_distance: default_motor_distance(),
            base_arm_length: default_base_arm_length(),
            link_arm_length: default_link_arm_length(),
            tcp_offset: [0.0, 0.0],
        }
    }
}

/// Robot startup state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Motor angles at startup, radians
    #[serde(default = "default_initial_joint_position")]
    pub initial_joint_position: [f64; 2],
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            initial_joint_position: default_initial_joint_position(),
        }
    }
}

/// Motion limits and control loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Cartesian straight-line speed, m/s
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,

    /// Single-axis profile acceleration, units/s^2
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,

    /// Control loop period, seconds
    #[serde(default = "default_sampling_time")]
    pub sampling_time: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_velocity: default_max_velocity(),
            acceleration: default_acceleration(),
            sampling_time: default_sampling_time(),
        }
    }
}

fn default_motor_distance() -> f64 {
    0.08
}

fn default_base_arm_length() -> f64 {
    0.08
}

fn default_link_arm_length() -> f64 {
    0.12
}

fn default_initial_joint_position() -> [f64; 2] {
    [std::f64::consts::FRAC_PI_2, std::f64::consts::FRAC_PI_2]
}

fn default_max_velocity() -> f64 {
    0.1
}

fn default_acceleration() -> f64 {
    2.0
}

fn default_sampling_time() -> f64 {
    0.001
}

impl Config {
    /// Load configuration from a file, auto-detecting TOML or JSON format
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let extension = path.extension().and_then(|s| s.to_str());

        match extension {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            _ => {
                // Try TOML first (preferred), fall back to JSON
                Self::from_toml(&content).or_else(|_| Self::from_json(&content))
            }
        }
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse config as TOML")
    }

    /// Parse configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse config as JSON")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.linkage.motor_distance > 0.0) {
            anyhow::bail!("linkage.motor_distance must be positive");
        }
        if !(self.linkage.base_arm_length > 0.0) {
            anyhow::bail!("linkage.base_arm_length must be positive");
        }
        if !(self.linkage.link_arm_length > 0.0) {
            anyhow::bail!("linkage.link_arm_length must be positive");
        }
        if !(self.motion.max_velocity > 0.0) {
            anyhow::bail!("motion.max_velocity must be positive");
        }
        if !(self.motion.acceleration > 0.0) {
            anyhow::bail!("motion.acceleration must be positive");
        }
        if !(self.motion.sampling_time > 0.0) {
            anyhow::bail!("motion.sampling_time must be positive");
        }

        // The startup pose has to close the linkage, otherwise the robot is
        // born with a NaN cartesian position.
        self.linkage()
            .try_forward(self.initial_joint_position())
            .context("robot.initial_joint_position does not close the linkage")?;

        Ok(())
    }

    pub fn linkage(&self) -> Linkage {
        Linkage::new(
            self.linkage.motor_distance,
            self.linkage.base_arm_length,
            self.linkage.link_arm_length,
        )
        .with_tcp_offset(Point::new(
            self.linkage.tcp_offset[0],
            self.linkage.tcp_offset[1],
        ))
    }

    pub fn initial_joint_position(&self) -> JointAngles {
        JointAngles::new(
            self.robot.initial_joint_position[0],
            self.robot.initial_joint_position[1],
        )
    }
}
