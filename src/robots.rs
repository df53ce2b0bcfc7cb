//! In-memory robot and command store.
//!
//! Holds one demo robot and every command sent to it. `set_motors` updates the
//! motor angles right away; any other command is "executed" by a tokio task
//! that sets the robot's status to the command name after a fixed delay.
//! Nothing here talks to hardware.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const SET_MOTORS: &str = "set_motors";
pub const MOTOR1_MAX: f64 = 360.0;
pub const MOTOR2_MAX: f64 = 180.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RobotError {
    #[error("robot {0} not found")]
    NotFound(u32),

    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Robot {
    pub id: u32,
    pub name: String,
    pub status: String,
    pub position: Position,
    pub battery_level: u8,
    pub is_connected: bool,
    /// 0..=360 degrees.
    pub motor1_angle: i32,
    /// 0..=180 degrees.
    pub motor2_angle: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotCommand {
    pub id: u32,
    pub robot_id: u32,
    pub command: String,
    pub params: Option<Value>,
    pub status: String,
}

/// A command as submitted, before it gets an id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCommand {
    pub command: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl NewCommand {
    pub fn new(command: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }
}

#[derive(Debug)]
struct Inner {
    robots: BTreeMap<u32, Robot>,
    commands: Vec<RobotCommand>,
    next_command_id: u32,
}

fn demo_robot() -> Robot {
    Robot {
        id: 1,
        name: "Home Assistant Bot".to_string(),
        status: "idle".to_string(),
        position: Position::default(),
        battery_level: 85,
        is_connected: true,
        motor1_angle: 0,
        motor2_angle: 0,
    }
}

/// Clamp a motor parameter into `0..=max` and round to whole degrees.
fn motor_angle(value: f64, max: f64) -> i32 {
    value.max(0.0).min(max).round() as i32
}

#[derive(Clone, Debug)]
pub struct RobotStore {
    inner: Arc<Mutex<Inner>>,
    command_delay: Duration,
}

impl RobotStore {
    /// A store holding the demo robot (id 1).
    pub fn new(command_delay: Duration) -> Self {
        let robot = demo_robot();
        let mut robots = BTreeMap::new();
        robots.insert(robot.id, robot);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                robots,
                commands: Vec::new(),
                next_command_id: 1,
            })),
            command_delay,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn robots(&self) -> Vec<Robot> {
        self.lock().robots.values().cloned().collect()
    }

    pub fn robot(&self, id: u32) -> Option<Robot> {
        self.lock().robots.get(&id).cloned()
    }

    /// Commands sent to one robot, oldest first.
    pub fn commands(&self, robot_id: u32) -> Vec<RobotCommand> {
        self.lock()
            .commands
            .iter()
            .filter(|c| c.robot_id == robot_id)
            .cloned()
            .collect()
    }

    pub fn update_status(&self, id: u32, status: &str) -> Result<Robot, RobotError> {
        let mut inner = self.lock();
        let robot = inner.robots.get_mut(&id).ok_or(RobotError::NotFound(id))?;
        robot.status = status.to_string();
        Ok(robot.clone())
    }

    pub fn update_motor_angles(&self, id: u32, motor1: f64, motor2: f64) -> Result<Robot, RobotError> {
        let mut inner = self.lock();
        let robot = inner.robots.get_mut(&id).ok_or(RobotError::NotFound(id))?;
        robot.motor1_angle = motor_angle(motor1, MOTOR1_MAX);
        robot.motor2_angle = motor_angle(motor2, MOTOR2_MAX);
        Ok(robot.clone())
    }

    /// Record a command and start executing it. Must run inside a tokio runtime.
    ///
    /// The returned command is always `pending`; the robot's state changes
    /// either immediately (`set_motors` with params) or after the command delay.
    pub fn send_command(&self, robot_id: u32, new: NewCommand) -> Result<RobotCommand, RobotError> {
        if new.command.trim().is_empty() {
            return Err(RobotError::InvalidCommand("command name is empty".to_string()));
        }
        let motors = match (&new.command[..], &new.params) {
            (SET_MOTORS, Some(params)) => Some(motor_params(params)?),
            _ => None,
        };

        let command = {
            let mut inner = self.lock();
            if !inner.robots.contains_key(&robot_id) {
                return Err(RobotError::NotFound(robot_id));
            }
            let command = RobotCommand {
                id: inner.next_command_id,
                robot_id,
                command: new.command,
                params: new.params,
                status: "pending".to_string(),
            };
            inner.next_command_id += 1;
            inner.commands.push(command.clone());
            command
        };
        tracing::info!("Robot {} command #{}: {}", robot_id, command.id, command.command);

        if let Some((motor1, motor2)) = motors {
            self.update_motor_angles(robot_id, motor1, motor2)?;
        } else {
            let store = self.clone();
            let status = command.command.clone();
            let delay = self.command_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = store.update_status(robot_id, &status) {
                    tracing::warn!("Command completion failed: {}", e);
                }
            });
        }
        Ok(command)
    }
}

impl Default for RobotStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

fn motor_params(params: &Value) -> Result<(f64, f64), RobotError> {
    let field = |name: &str| {
        params.get(name).and_then(Value::as_f64).ok_or_else(|| {
            RobotError::InvalidCommand(format!("{} requires a numeric {}", SET_MOTORS, name))
        })
    };
    Ok((field("motor1")?, field("motor2")?))
}
