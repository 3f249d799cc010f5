// Fixed-rate control loop driving a robot from queued cartesian commands.
//
// One waypoint is consumed per tick, commands are only picked up between
// moves, and telemetry is republished every tick.

use crate::config::Config;
use pantograph_core::{linkage::Point, robot::Robot, trajectory::constant_velocity};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Duration, MissedTickBehavior};

const COMMAND_QUEUE_DEPTH: usize = 64;

/// Snapshot of the robot state, published once per control tick.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Telemetry {
    pub joint_position: [f64; 2],
    pub cartesian_position: [f64; 2],
    pub drawing: bool,
}

impl Telemetry {
    fn capture(robot: &Robot) -> Self {
        let joints = robot.joint_position();
        let position = robot.cartesian_position();
        Self {
            joint_position: [joints.theta1, joints.theta4],
            cartesian_position: [position.x, position.y],
            drawing: robot.drawing(),
        }
    }
}

/// A point-to-point move request.
#[derive(Debug, Clone, Copy)]
pub struct Command {
    pub target: Point,
    pub drawing: bool,
}

/// Channel pair for talking to a running simulation.
pub struct SimulationHandle {
    pub commands: mpsc::Sender<Command>,
    pub telemetry: watch::Receiver<Telemetry>,
}

pub struct Simulation {
    robot: Robot,
    max_velocity: f64,
    sampling_time: f64,
    commands: mpsc::Receiver<Command>,
    telemetry: watch::Sender<Telemetry>,
}

impl Simulation {
    /// Build a simulation from a validated config, returning the handle
    /// used to feed commands and observe telemetry.
    pub fn new(config: &Config) -> (Self, SimulationHandle) {
        let robot = Robot::new(config.linkage(), config.initial_joint_position());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (telemetry_tx, telemetry_rx) = watch::channel(Telemetry::capture(&robot));

        (
            Self {
                robot,
                max_velocity: config.motion.max_velocity,
                sampling_time: config.motion.sampling_time,
                commands: command_rx,
                telemetry: telemetry_tx,
            },
            SimulationHandle {
                commands: command_tx,
                telemetry: telemetry_rx,
            },
        )
    }

    /// Run the control loop until the command channel closes and the last
    /// move finishes.
    ///
    /// Each command expands into a constant-velocity waypoint list from the
    /// current position; one waypoint is applied per tick. Waypoints that
    /// fall outside the workspace are skipped without aborting the move.
    pub async fn run(mut self) {
        let mut interval = time::interval(Duration::from_secs_f64(self.sampling_time));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut waypoints = Vec::new().into_iter();

        loop {
            interval.tick().await;

            self.telemetry.send_replace(Telemetry::capture(&self.robot));

            if let Some(point) = waypoints.next() {
                if self.robot.in_workspace(point) {
                    self.robot.set_cartesian_position(point);
                } else {
                    tracing::debug!(x = point.x, y = point.y, "skipping waypoint outside workspace");
                }
                continue;
            }

            match self.commands.try_recv() {
                Ok(command) => {
                    tracing::info!(
                        x = command.target.x,
                        y = command.target.y,
                        drawing = command.drawing,
                        "starting move"
                    );
                    self.robot.set_drawing(command.drawing);
                    waypoints = constant_velocity(
                        self.robot.cartesian_position(),
                        command.target,
                        self.max_velocity,
                        self.sampling_time,
                    )
                    .into_iter();
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }
        }

        self.telemetry.send_replace(Telemetry::capture(&self.robot));
        tracing::info!("command channel closed, simulation stopped");
    }
}
