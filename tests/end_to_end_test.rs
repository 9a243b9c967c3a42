//! Full pipeline: config -> controller -> annealing schedule -> frames.

use ising_chain::{Boundary, Frame, InitialState, Schedule, SimConfig};

#[test]
fn test_annealing_schedule_runs_210_steps() {
    let cfg = SimConfig {
        length: 100,
        coupling: -1.0,
        seed: Some(0xDEADBEEF),
        ..SimConfig::default()
    };
    let mut sim = cfg.build().unwrap();
    let pairs: [(f64, i64); 4] = [(3.0, 100), (2.0, 50), (1.0, 50), (0.5, 10)];
    let schedule = Schedule::try_from(&pairs[..]).unwrap();
    assert_eq!(schedule.total_steps(), 210);

    sim.schedule_update(&schedule).unwrap();

    assert_eq!(sim.steps_taken(), 210);
    assert!((-1.0..=1.0).contains(&sim.magnetization()));
    // 210 steps with coarse = 10 -> 21 snapshots.
    assert_eq!(sim.history_len(), 21);
    assert_eq!(sim.temperature(), Some(0.5));
}

#[test]
fn test_frames_follow_batched_schedule() {
    let cfg = SimConfig {
        initial: InitialState::Random,
        boundary: Boundary::Open,
        coarse: 5,
        num_past_states: 8,
        seed: Some(17),
        ..SimConfig::with_length(20)
    };
    let mut sim = cfg.build().unwrap();
    let schedule: Schedule = "2:12,1:8".parse().unwrap();

    let empty = Frame::capture(&sim, 19);
    assert_eq!(empty.correlation, None);
    assert_eq!(empty.step, 0);

    let mut frames = Vec::new();
    for batch in schedule.batches(cfg.coarse) {
        sim.run_steps(batch.temperature, batch.duration).unwrap();
        frames.push(Frame::capture(&sim, 19));
    }

    let steps: Vec<u64> = frames.iter().map(|f| f.step).collect();
    assert_eq!(steps, vec![5, 10, 12, 17, 20]);
    let last = frames.last().unwrap();
    assert_eq!(last.temperature, Some(1.0));
    assert_eq!(last.spins.len(), 20);
    assert_eq!(last.spin_row().len(), 20);
    let corr = last.correlation.as_ref().unwrap();
    assert_eq!(corr.len(), 20);
    assert_eq!(corr[0], 1.0);
    assert!((last.energy - sim.total_energy()).abs() < 1e-12);
}

#[test]
fn test_frame_record_matches_header() {
    let mut sim = SimConfig { seed: Some(3), ..SimConfig::with_length(6) }.build().unwrap();
    sim.record_snapshot();
    let frame = Frame::capture(&sim, 3);
    let header = Frame::csv_header(3);
    let record = frame.to_record(3);
    assert_eq!(header.len(), record.len());
    assert_eq!(header[5], "c0");
    assert_eq!(record[5], "1");
    assert_eq!(record[4], "++++++");
}

#[test]
fn test_uniform_start_reports_ground_state_energy() {
    let sim = SimConfig { seed: Some(1), ..SimConfig::with_length(50) }.build().unwrap();
    let frame = Frame::capture(&sim, 100);
    assert_eq!(frame.magnetization, 1.0);
    assert!((frame.energy_density() + 1.0).abs() < 1e-12);
}
