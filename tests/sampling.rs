use scpi_dmm::{
    DiagnosticKind, DmmError, Multimeter, SamplingConfig, ScriptedChannel, SerialChannel,
};
use std::time::Duration;

fn fast_config(count: usize) -> SamplingConfig {
    SamplingConfig::new("/dev/ttyUSB1")
        .with_sample_count(count)
        .with_delays(Duration::ZERO, Duration::from_millis(1), Duration::from_millis(1))
}

#[test]
fn ten_sample_run_with_empty_and_garbage_replies() {
    let tail = ["10.5", "11.25", "9.75", "1000", "0.001", "42", "+1.5E+01"];
    let mut replies = vec!["123.45", "", "abc"];
    replies.extend(tail);

    let channel = ScriptedChannel::with_replies("/dev/ttyUSB1", replies);
    let mut dmm = Multimeter::with_channel(channel, fast_config(10));
    let run = dmm.run_sampling_series(10);

    let expected = [123.45, 0.0, 0.0, 10.5, 11.25, 9.75, 1000.0, 0.001, 42.0, 15.0];
    assert_eq!(run.data_r.len(), 10);
    for (got, want) in run.data_r.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "got {} want {}", got, want);
    }

    assert_eq!(run.elapsed.len(), 10);
    assert_eq!(run.cumulative.len(), 10);
    assert_eq!(run.cumulative[0], run.elapsed[0]);
    assert!(run.cumulative.windows(2).all(|w| w[1] >= w[0]));
    assert!((run.total - run.elapsed.iter().sum::<f64>()).abs() < 1e-12);

    assert_eq!(run.diagnostics.len(), 2);
    assert_eq!(run.count(DiagnosticKind::EmptyResponse), 1);
    assert_eq!(run.count(DiagnosticKind::ConversionFailed), 1);
    assert_eq!(run.diagnostics[0].sample, Some(1));
    assert_eq!(run.diagnostics[1].sample, Some(2));

    let channel = dmm.into_channel();
    assert_eq!(channel.written().len(), 10);
    assert!(channel.written().iter().all(|w| w == "MEAS:FRESistance?\n"));
}

#[test]
fn silent_instrument_still_fills_every_slot() {
    let mut dmm = Multimeter::with_channel(ScriptedChannel::new("sim"), fast_config(5));
    let run = dmm.run_sampling_series(5);

    assert_eq!(run.data_r, vec![0.0; 5]);
    assert_eq!(run.cumulative.len(), 5);
    assert_eq!(run.count(DiagnosticKind::EmptyResponse), 5);
}

#[test]
fn full_session_returns_instrument_to_local() {
    let replies = ["1.0", "2.0", "3.0", "4.0"];
    let mut dmm = Multimeter::with_channel(ScriptedChannel::with_replies("sim", replies), fast_config(3));
    let run = dmm.acquire();
    dmm.close();

    assert_eq!(run.data_r, vec![2.0, 3.0, 4.0]);
    assert!(run.diagnostics.is_empty());

    let channel = dmm.into_channel();
    assert_eq!(channel.written().first().map(String::as_str), Some("SYSTem:LOCal\n"));
    assert_eq!(channel.written()[1], "SYSTem:REMote\n");
    assert_eq!(channel.written().last().map(String::as_str), Some("SYSTem:LOCal\n"));
    assert!(!channel.is_open());
    assert_eq!(channel.releases(), 1);
}

#[test]
fn channel_rejects_io_after_close() {
    let mut channel = ScriptedChannel::with_replies("sim", ["1.0"]);
    channel.close();
    channel.close();

    assert!(matches!(channel.write_line("MEAS:FRESistance?\n"), Err(DmmError::ChannelClosed)));
    assert!(matches!(channel.read_line(), Err(DmmError::ChannelClosed)));
    assert_eq!(channel.releases(), 1);
}

#[test]
fn open_failure_is_fatal() {
    let config = SamplingConfig::new("/dev/scpi-dmm-missing");
    match Multimeter::open(config) {
        Err(DmmError::OpenFailed { port, .. }) => assert_eq!(port, "/dev/scpi-dmm-missing"),
        Err(other) => panic!("expected OpenFailed, got {:?}", other),
        Ok(_) => panic!("opening a missing device must fail"),
    }
}

#[test]
fn run_serialises_to_json() {
    let mut dmm = Multimeter::with_channel(ScriptedChannel::with_replies("sim", ["5.5", ""]), fast_config(2));
    let run = dmm.run_sampling_series(2);

    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(json["data_r"], serde_json::json!([5.5, 0.0]));
    assert_eq!(json["cumulative"].as_array().unwrap().len(), 2);
    assert_eq!(json["diagnostics"][0]["kind"], "EmptyResponse");
}
