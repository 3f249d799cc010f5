use crate::{
    config::Config,
    sim::{Command, Simulation},
};
use anyhow::{Context, Result, bail};
use clap::Args;
use pantograph_core::linkage::Point;
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;

#[derive(Args)]
pub struct StartArgs {
    /// Path to the configuration file (TOML or JSON).
    pub config: PathBuf,

    /// Print every telemetry update as a JSON line.
    #[arg(long)]
    pub telemetry: bool,
}

impl StartArgs {
    pub fn run(&self) -> Result<()> {
        tracing_subscriber::fmt::init();

        let config = Config::from_file(&self.config)?;
        config.validate()?;

        tracing::info!("starting pantograph with config {}", self.config.display());
        tracing::info!(
            motor_distance = config.linkage.motor_distance,
            base_arm_length = config.linkage.base_arm_length,
            link_arm_length = config.linkage.link_arm_length,
            "linkage geometry"
        );

        run_runtime(config, self.telemetry)
    }
}

/// Drive the simulation from stdin: one `x,y[,draw]` command per line.
#[tokio::main]
async fn run_runtime(config: Config, echo_telemetry: bool) -> Result<()> {
    let (simulation, handle) = Simulation::new(&config);
    let sim_task = tokio::spawn(simulation.run());

    if echo_telemetry {
        let mut updates = handle.telemetry.clone();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let snapshot = *updates.borrow_and_update();
                if let Ok(line) = serde_json::to_string(&snapshot) {
                    println!("{line}");
                }
            }
        });
    }

    let commands = handle.commands;
    let mut telemetry = handle.telemetry;

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_command(line) {
            Ok(command) => {
                commands
                    .send(command)
                    .await
                    .context("simulation stopped unexpectedly")?;
            }
            Err(err) => tracing::warn!(%err, line, "ignoring malformed command"),
        }
    }

    // Closing the command channel lets the loop finish its queue and stop.
    drop(commands);
    sim_task.await.context("simulation task panicked")?;

    let final_state = *telemetry.borrow_and_update();
    println!("{}", serde_json::to_string(&final_state)?);
    Ok(())
}

fn parse_command(line: &str) -> Result<Command> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let (x, y, draw) = match fields.as_slice() {
        [x, y] => (x, y, false),
        [x, y, draw] => (x, y, parse_draw_flag(draw)?),
        _ => bail!("expected `x,y` or `x,y,draw`"),
    };

    let x: f64 = x.parse().context("invalid x coordinate")?;
    let y: f64 = y.parse().context("invalid y coordinate")?;

    Ok(Command {
        target: Point::new(x, y),
        drawing: draw,
    })
}

fn parse_draw_flag(field: &str) -> Result<bool> {
    match field {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => bail!("invalid draw flag `{other}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_moves() {
        let command = parse_command("0.05, 0.15").unwrap();
        assert_eq!(command.target, Point::new(0.05, 0.15));
        assert!(!command.drawing);
    }

    #[test]
    fn parses_draw_flag() {
        assert!(parse_command("0.05,0.15,true").unwrap().drawing);
        assert!(parse_command("0.05,0.15,1").unwrap().drawing);
        assert!(!parse_command("0.05,0.15,false").unwrap().drawing);
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_command("0.05").is_err());
        assert!(parse_command("a,b").is_err());
        assert!(parse_command("0.05,0.15,maybe").is_err());
        assert!(parse_command("0.05,0.15,true,extra").is_err());
    }
}
