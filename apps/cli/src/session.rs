use std::thread::{self, JoinHandle};

use log::{log, warn, Level};
use model::{Event, Sample};
use timer::RaceTimer;
use timer_ingest_core::SampleRx;

/// Where race events end up.
pub trait EventSink {
    fn emit(&mut self, event: &Event);
}

/// Renders events as log lines, optionally mirrored as JSON on stdout.
pub struct LogSink {
    pub json: bool,
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &Event) {
        for (level, line) in render(event) {
            log!(level, "{}", line);
        }
        if self.json {
            match serde_json::to_string(event) {
                Ok(s) => println!("{}", s),
                Err(e) => warn!("could not encode event: {}", e),
            }
        }
    }
}

pub fn render(event: &Event) -> Vec<(Level, String)> {
    match event {
        Event::WaitingForStart => vec![(Level::Info, "Waiting for car to start...".into())],
        Event::Started { .. } => vec![(Level::Info, "START!!!!!".into())],
        Event::GoalReached { race_duration_s, max_speed_mps } => vec![
            (Level::Info, "GOAL!!!!!".into()),
            (
                Level::Info,
                format!("Time: {}s, max speed = {} m/s", race_duration_s, max_speed_mps),
            ),
        ],
        Event::AwaitingRestart => vec![(Level::Warn, "Restart the node to time again...".into())],
    }
}

pub fn feed<S: EventSink>(timer: &mut RaceTimer, sample: &Sample, sink: &mut S) {
    for ev in timer.on_sample(sample) {
        sink.emit(&ev);
    }
}

/// Time a recorded run front to back.
pub fn time_samples<S: EventSink>(samples: &[Sample], sink: &mut S) -> RaceTimer {
    let mut timer = RaceTimer::new();
    for s in samples {
        feed(&mut timer, s, sink);
    }
    timer
}

/// Drain samples on a dedicated thread that owns the timer.
/// The thread ends, handing back the timer, once every sender is gone.
pub fn spawn_pump<S: EventSink + Send + 'static>(rx: SampleRx, mut sink: S) -> JoinHandle<RaceTimer> {
    thread::spawn(move || {
        let mut timer = RaceTimer::new();
        for sample in rx.iter() {
            feed(&mut timer, &sample, &mut sink);
        }
        timer
    })
}
