//! Console driver against the production runtime and real clock.

use std::{io, time::Duration};

use huddle_app::Runtime;
use huddle_cli::{ConsoleDriver, MockAudioMeter, MockMediaDevices, SystemEnv};
use huddle_core::SessionConfig;
use tokio::sync::mpsc;

async fn run_lines(lines: &[&str], close: bool) -> Result<(), huddle_cli::RuntimeError> {
    let (tx, rx) = mpsc::channel(lines.len() + 1);
    for line in lines {
        tx.send(Ok((*line).to_owned())).await.unwrap();
    }
    // An open sender means only `quit` can end the session.
    let _sender = (!close).then_some(tx);

    let devices = MockMediaDevices::new(Duration::from_millis(1));
    let driver = ConsoleDriver::from_receiver(rx, devices.clone());
    let runtime = Runtime::new(
        driver,
        SystemEnv::new(),
        devices,
        Box::new(MockAudioMeter::new(3, 0.5)),
        SessionConfig::default(),
    );
    runtime.run().await
}

#[tokio::test]
async fn commands_run_until_quit() {
    let lines = [
        "resize 390 844",
        "video",
        "say hello everyone",
        "recv 2 hi!",
        "pinch 100 200",
        "release",
        "share",
        "share-ended",
        "join 13 Ada",
        "leave 13",
        "bogus",
        "end",
        "rejoin",
        "quit",
    ];

    let result = tokio::time::timeout(Duration::from_secs(5), run_lines(&lines, false)).await;

    assert!(matches!(result, Ok(Ok(()))), "session did not quit cleanly: {result:?}");
}

#[tokio::test]
async fn end_of_input_quits() {
    let result = tokio::time::timeout(Duration::from_secs(5), run_lines(&["mute"], true)).await;

    assert!(matches!(result, Ok(Ok(()))));
}

#[tokio::test]
async fn read_error_stops_the_session() {
    let (tx, rx) = mpsc::channel(1);
    tx.send(Err(io::Error::other("broken pipe"))).await.unwrap();
    let devices = MockMediaDevices::new(Duration::ZERO);
    let runtime = Runtime::new(
        ConsoleDriver::from_receiver(rx, devices.clone()),
        SystemEnv::new(),
        devices,
        Box::new(MockAudioMeter::new(3, 0.0)),
        SessionConfig::default(),
    );

    let result = runtime.run().await;

    assert!(matches!(result, Err(huddle_cli::RuntimeError::Io(_))));
}
