use anyhow::{Result, bail};
use clap::Args;
use pantograph_core::trajectory::TrapezoidProfile;
use serde::Serialize;

#[derive(Args)]
pub struct PlanArgs {
    /// Axis position at the start of the move.
    #[arg(long, default_value_t = 0.0)]
    pub from: f64,

    /// Axis position to move to.
    #[arg(long)]
    pub to: f64,

    /// Velocity limit (magnitude).
    #[arg(long, default_value_t = 0.5)]
    pub max_velocity: f64,

    /// Acceleration limit (magnitude).
    #[arg(long, default_value_t = 2.0)]
    pub acceleration: f64,

    /// Tick period in seconds.
    #[arg(long, default_value_t = 0.01)]
    pub time_step: f64,
}

#[derive(Serialize)]
struct PlanOutput {
    t1: f64,
    t2: f64,
    t3: f64,
    samples: Vec<Sample>,
}

#[derive(Serialize)]
struct Sample {
    time: f64,
    position: f64,
}

impl PlanArgs {
    pub fn run(&self) -> Result<()> {
        if !(self.time_step > 0.0) {
            bail!("time step must be positive");
        }

        let mut profile =
            TrapezoidProfile::plan(self.from, self.to, self.max_velocity, self.acceleration)?;
        let (t1, t2, t3) = profile.phase_times();

        let mut samples = Vec::new();
        while profile.is_active() {
            profile.tick(self.time_step);
            if !profile.is_active() {
                break;
            }
            samples.push(Sample {
                time: profile.elapsed(),
                position: profile.position(),
            });
        }

        let output = PlanOutput { t1, t2, t3, samples };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
