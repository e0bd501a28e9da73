// Character-counting streaming of whole programs in simulated time.

#[cfg(test)]
mod tests {
    use grbl_shared::Position;
    use grbl_sim::streamer::read_program;
    use grbl_sim::{SimClock, Simulator, StreamEvent, Streamer};
    use grbl_simulator::MachineState;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    fn streamer() -> Streamer {
        let clock = SimClock::new();
        let sim = Simulator::with_clock(Arc::new(clock.clone()));
        Streamer::new(sim, clock, Duration::from_millis(10))
    }

    fn responses(events: &[StreamEvent]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Response { line, response, .. } => Some((line.clone(), response.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_stream_square() {
        let mut streamer = streamer();
        let program = ["G21 G90", "G1 X10 F600", "Y10", "X0", "Y0", "M2"];
        let summary = streamer.run(program).unwrap();
        assert_eq!(summary.lines, 6);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.alarms, 0);
        // Four 10mm sides at 600 mm/min.
        assert!(summary.elapsed >= Duration::from_secs(4));
        assert!(summary.elapsed < Duration::from_secs(5));
        let sim = streamer.simulator();
        assert_eq!(sim.state(), MachineState::Idle);
        assert_eq!(sim.machine_position(), Position::ORIGIN);
    }

    #[test]
    fn test_responses_arrive_in_program_order() {
        let mut streamer = streamer();
        let program: Vec<String> = (0..40).map(|i| format!("G0 X{} Y{}", i % 7, i % 5)).collect();
        let summary = streamer.run(&program).unwrap();
        let answered: Vec<String> = responses(&summary.events).into_iter().map(|(line, _)| line).collect();
        assert_eq!(answered, program);
        assert!(responses(&summary.events).iter().all(|(_, r)| r == "ok\r\n"));
    }

    #[test]
    fn test_dwell_blocks_following_lines() {
        let mut streamer = streamer();
        let summary = streamer.run(["G4 P1", "G0 X1"]).unwrap();
        let times: Vec<u128> = summary
            .events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Response { at_ms, .. } => Some(*at_ms),
                _ => None,
            })
            .collect();
        assert_eq!(times.len(), 2);
        assert!(times[0] >= 1000);
        assert!(times[1] >= times[0]);
    }

    #[test]
    fn test_errors_are_counted() {
        let mut streamer = streamer();
        let summary = streamer.run(["G1 X10", "G4", "G0 X1"]).unwrap();
        assert_eq!(summary.errors, 2);
        let all = responses(&summary.events);
        assert_eq!(all[0].1, "error:22\r\n");
        assert_eq!(all[1].1, "error:27\r\n");
        assert_eq!(all[2].1, "ok\r\n");
    }

    #[test]
    fn test_soft_limit_alarm_is_pushed() {
        let mut streamer = streamer();
        let summary = streamer.run(["$20=1", "$130=5", "G1 X10 F600"]).unwrap();
        assert_eq!(summary.alarms, 1);
        assert!(summary
            .events
            .iter()
            .any(|e| matches!(e, StreamEvent::Push { message, .. } if message == "ALARM:2\r\n")));
        assert_eq!(streamer.simulator().state(), MachineState::Alarm);
    }

    #[test]
    fn test_status_snapshots_are_recorded() {
        let mut streamer = streamer().with_status_interval(Duration::from_millis(250));
        let summary = streamer.run(["G1 X10 F600"]).unwrap();
        let statuses: Vec<_> = summary
            .events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Status { status, .. } => Some(status.clone()),
                _ => None,
            })
            .collect();
        assert!(statuses.len() >= 4);
        assert!(statuses.iter().any(|s| s.state == MachineState::Run));
    }

    #[test]
    fn test_events_serialize_as_json_lines() {
        let mut streamer = streamer();
        let summary = streamer.run(["G21"]).unwrap();
        let json = serde_json::to_string(&summary.events[0]).unwrap();
        assert_eq!(json, r#"{"kind":"response","line":"G21","response":"ok\r\n","at_ms":0}"#);
    }

    #[test]
    fn test_read_program_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "G21\n(comment)\nG0 X1").unwrap();
        let program = read_program(file.path()).unwrap();
        assert_eq!(program.len(), 3);
        let summary = streamer().run(&program).unwrap();
        assert_eq!(summary.lines, 2);
    }
}
