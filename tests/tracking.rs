mod common;

use common::{write, Event, MockTransport};
use dls_protocol::{Dls, DlsError, Response, TrackingSample, TrackingState};

#[test]
fn start_poll_stop_alternates_strictly() {
    let mut dls = Dls::new(MockTransport::with_replies(&[
        "g0?\r\n",
        "g0g+00001001\r\n",
        "g0g+00001002\r\n",
        "g0g+00001003\r\n",
        "g0g+00001004\r\n",
        "g0g+00001005\r\n",
        "g0?\r\n",
    ]));

    dls.start_tracking().unwrap();
    let samples: Vec<Response> = (0..5)
        .map(|_| dls.poll_tracking_sample().unwrap())
        .collect();
    dls.stop_tracking().unwrap();

    assert_eq!(
        samples,
        (1001..=1005).map(Response::Value).collect::<Vec<_>>()
    );
    // Seven exchanges; polls only read what the device streams
    assert_eq!(
        dls.transport().events,
        [
            write("s0h\r\n"),
            Event::Read,
            Event::Read,
            Event::Read,
            Event::Read,
            Event::Read,
            Event::Read,
            write("s0c\r\n"),
            Event::Read,
        ]
    );
    assert_eq!(dls.transport().reads(), 7);
}

#[test]
fn tracking_state_follows_device() {
    let mut dls = Dls::new(MockTransport::with_replies(&[
        "g0?\r\n",
        "g0?\r\n",
        "g0@E212\r\n",
        "g0@E210\r\n",
    ]));
    assert_eq!(dls.tracking_state(), TrackingState::Idle);

    dls.start_tracking().unwrap();
    assert_eq!(dls.tracking_state(), TrackingState::Tracking);

    dls.stop_tracking().unwrap();
    assert_eq!(dls.tracking_state(), TrackingState::Idle);

    // The device says it is still tracking
    assert_eq!(dls.measure_once().unwrap(), Response::Error(-212));
    assert_eq!(dls.tracking_state(), TrackingState::Tracking);

    // ...and later that it is not
    assert_eq!(dls.stop_tracking().unwrap(), Response::Error(-210));
    assert_eq!(dls.tracking_state(), TrackingState::Idle);
}

#[test]
fn track_streams_until_cancelled() {
    let mut dls = Dls::new(MockTransport::with_replies(&[
        "g0@E210\r\n",
        "g0?\r\n",
        "g0g+00002000\r\n",
        "g0@E255\r\n",
        "g0g+00002002\r\n",
        "g0?\r\n",
    ]));

    let mut checks = 0;
    let mut samples: Vec<TrackingSample> = Vec::new();
    let response = dls
        .track(
            None,
            || {
                checks += 1;
                checks > 3
            },
            |sample| samples.push(sample.clone()),
        )
        .unwrap();

    assert_eq!(response, Response::Confirmed);
    assert_eq!(dls.tracking_state(), TrackingState::Idle);
    assert_eq!(
        samples.iter().map(|s| s.response).collect::<Vec<_>>(),
        [
            Response::Value(2000),
            Response::Error(-255),
            Response::Value(2002)
        ]
    );
    assert!(samples
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert_eq!(
        dls.transport().events,
        [
            write("s0c\r\n"),
            Event::Read,
            write("s0h\r\n"),
            Event::Read,
            Event::Read,
            Event::Read,
            Event::Read,
            write("s0c\r\n"),
            Event::Read,
        ]
    );
}

#[test]
fn track_with_delay_starts_delayed() {
    let mut dls = Dls::new(MockTransport::with_replies(&["g0?\r\n", "g0?\r\n", "g0?\r\n"]));
    dls.track(Some(std::time::Duration::from_millis(1000)), || true, |_| {})
        .unwrap();
    assert_eq!(
        dls.transport().writes(),
        ["s0c\r\n", "s0h+100\r\n", "s0c\r\n"]
    );
}

#[test]
fn refused_start_skips_streaming() {
    let mut dls = Dls::new(MockTransport::with_replies(&["g0?\r\n", "g0@E211\r\n"]));
    let mut polled = false;
    let response = dls
        .track(None, || false, |_| polled = true)
        .unwrap();
    assert_eq!(response, Response::Error(-211));
    assert!(!polled);
    assert_eq!(dls.transport().writes(), ["s0c\r\n", "s0h\r\n"]);
}

#[test]
fn read_failure_still_stops_tracking() {
    let mock = MockTransport::with_replies(&["g0?\r\n", "g0?\r\n", "g0g+00000500\r\n"])
        .then_timeout()
        .then("g0?\r\n");
    let mut dls = Dls::new(mock);

    let result = dls.track(None, || false, |_| {});
    assert!(matches!(result, Err(DlsError::Timeout)));
    assert_eq!(
        dls.transport().writes(),
        ["s0c\r\n", "s0h\r\n", "s0c\r\n"]
    );
    assert_eq!(dls.tracking_state(), TrackingState::Idle);
}

#[test]
fn tracking_sample_serializes() {
    let mut dls = Dls::new(MockTransport::with_replies(&[
        "g0?\r\n",
        "g0?\r\n",
        "g0g+00000042\r\n",
        "g0?\r\n",
    ]));
    let mut first = None;
    let mut remaining: u32 = 1;
    dls.track(
        None,
        || {
            let done = remaining == 0;
            remaining = remaining.saturating_sub(1);
            done
        },
        |sample| first = Some(sample.clone()),
    )
    .unwrap();

    let sample = first.expect("one sample");
    let json = serde_json::to_value(&sample).unwrap();
    assert_eq!(json["response"]["Value"], 42);
    assert!(json["timestamp"].is_string());
}
