// schedule.rs - Ordered (temperature, duration) annealing schedules

use crate::error::{check_temperature, Result, SimError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a stage duration counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Single Metropolis trials.
    #[default]
    Steps,
    /// Sweeps of L trials each, one snapshot per sweep.
    Sweeps,
}

impl FromStr for TimeUnit {
    type Err = SimError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "steps" => Ok(Self::Steps),
            "sweeps" => Ok(Self::Sweeps),
            _ => Err(SimError::config(format!(
                "unknown time unit '{s}', expected 'steps' or 'sweeps'"
            ))),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Steps => "steps",
            Self::Sweeps => "sweeps",
        })
    }
}

/// One leg of a schedule: `duration` steps at `temperature`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub temperature: f64,
    pub duration: usize,
}

/// A validated sequence of stages, applied strictly in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct Schedule {
    stages: Vec<Stage>,
}

impl Schedule {
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        for stage in &stages {
            check_temperature(stage.temperature)?;
        }
        Ok(Self { stages })
    }

    /// Single stage at a constant temperature.
    pub fn constant(temperature: f64, duration: usize) -> Result<Self> {
        Self::new(vec![Stage { temperature, duration }])
    }

    /// `frames` batches of `per_frame` at a constant temperature.
    pub fn frames(temperature: f64, frames: usize, per_frame: usize) -> Result<Self> {
        let duration = frames.checked_mul(per_frame).ok_or_else(|| {
            SimError::config(format!("{frames} frames of {per_frame} overflow the run length"))
        })?;
        Self::constant(temperature, duration)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Σ durations.
    pub fn total_steps(&self) -> usize {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Cut every stage into chunks of at most `size` steps, in order. A
    /// renderer draws one frame per chunk. Zero-duration stages yield nothing.
    pub fn batches(&self, size: usize) -> impl Iterator<Item = Stage> + '_ {
        let size = size.max(1);
        self.stages.iter().flat_map(move |stage| {
            let full = stage.duration / size;
            let rest = stage.duration % size;
            std::iter::repeat(size)
                .take(full)
                .chain((rest > 0).then_some(rest))
                .map(move |duration| Stage { temperature: stage.temperature, duration })
        })
    }
}

impl TryFrom<Vec<Stage>> for Schedule {
    type Error = SimError;
    fn try_from(stages: Vec<Stage>) -> Result<Self> {
        Self::new(stages)
    }
}

impl From<Schedule> for Vec<Stage> {
    fn from(schedule: Schedule) -> Self {
        schedule.stages
    }
}

/// Raw pairs as a caller would write them; durations may be negative here
/// and are rejected.
impl TryFrom<&[(f64, i64)]> for Schedule {
    type Error = SimError;
    fn try_from(pairs: &[(f64, i64)]) -> Result<Self> {
        let stages = pairs
            .iter()
            .map(|&(temperature, duration)| {
                let duration = usize::try_from(duration).map_err(|_| {
                    SimError::config(format!("duration must be >= 0, got {duration}"))
                })?;
                Ok(Stage { temperature, duration })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(stages)
    }
}

/// Parses `"3:100,2:50,1:50,0.5:10"`.
impl FromStr for Schedule {
    type Err = SimError;
    fn from_str(s: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (t, n) = item.split_once(':').ok_or_else(|| {
                SimError::config(format!("schedule entry '{item}' is not 'T:n'"))
            })?;
            let temperature: f64 = t.trim().parse().map_err(|_| {
                SimError::config(format!("bad temperature '{t}' in schedule"))
            })?;
            let duration: i64 = n.trim().parse().map_err(|_| {
                SimError::config(format!("bad duration '{n}' in schedule"))
            })?;
            pairs.push((temperature, duration));
        }
        Self::try_from(pairs.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schedule() {
        let s: Schedule = "3:100, 2:50,1:50,0.5:10".parse().unwrap();
        assert_eq!(s.stages().len(), 4);
        assert_eq!(s.total_steps(), 210);
        assert_eq!(s.stages()[3], Stage { temperature: 0.5, duration: 10 });
    }

    #[test]
    fn test_reject_bad_entries() {
        assert!("3:-1".parse::<Schedule>().is_err());
        assert!("0:10".parse::<Schedule>().is_err());
        assert!("-2:10".parse::<Schedule>().is_err());
        assert!("3".parse::<Schedule>().is_err());
        assert!("hot:10".parse::<Schedule>().is_err());
    }

    #[test]
    fn test_batches_split_each_stage() {
        let s: Schedule = "3:25,2:0,1:10".parse().unwrap();
        let chunks: Vec<(f64, usize)> = s
            .batches(10)
            .map(|b| (b.temperature, b.duration))
            .collect();
        assert_eq!(
            chunks,
            vec![(3.0, 10), (3.0, 10), (3.0, 5), (1.0, 10)]
        );
    }

    #[test]
    fn test_frames_multiplies_or_rejects_overflow() {
        let s = Schedule::frames(2.0, 100, 10).unwrap();
        assert_eq!(s.total_steps(), 1000);
        assert!(matches!(
            Schedule::frames(2.0, usize::MAX, 2),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_parse_time_unit() {
        assert_eq!("sweeps".parse::<TimeUnit>().unwrap(), TimeUnit::Sweeps);
        assert_eq!(TimeUnit::default(), TimeUnit::Steps);
        assert!("ticks".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_nan_temperature_rejected() {
        assert!(Schedule::constant(f64::NAN, 1).is_err());
    }
}
