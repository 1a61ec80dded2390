mod common;

use std::sync::Arc;
use std::time::Duration;

use bob::audio::alert::{ALARM_DURATION, ALARM_FREQUENCY_HZ};
use bob::kernel::scheduler::{AlarmRegistry, ScheduleKind, MAX_TIMER_SECONDS};
use bob::kernel::speech::phrases::TIMER_DONE;
use bob::kernel::ticker::Ticker;
use bob::kernel::time::{Clock, ManualClock};
use bob::mocks::{RecordingAlert, RecordingSpeaker};
use common::{at, fixed_now};
use tokio_util::sync::CancellationToken;

struct Bench {
    clock: Arc<ManualClock>,
    registry: Arc<AlarmRegistry>,
    alert: Arc<RecordingAlert>,
    speaker: Arc<RecordingSpeaker>,
}

impl Bench {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(fixed_now()));
        Self {
            registry: Arc::new(AlarmRegistry::new(clock.clone())),
            clock,
            alert: Arc::new(RecordingAlert::new()),
            speaker: Arc::new(RecordingSpeaker::new()),
        }
    }

    fn ticker(&self) -> Ticker {
        Ticker::new(self.registry.clone(), self.alert.clone(), self.speaker.clone())
    }
}

#[test]
fn confirmations_use_spoken_formats() {
    let bench = Bench::new();
    assert_eq!(bench.registry.set_alarm(at(16, 7, 0)), "Alarm set for 07:00 AM.");
    assert_eq!(bench.registry.set_alarm(at(15, 19, 30)), "Alarm set for 07:30 PM.");
    assert_eq!(bench.registry.set_timer(120), "Timer set for 120 seconds.");
    assert_eq!(bench.registry.pending_alarms().len(), 2);
    assert_eq!(bench.registry.pending_timers().len(), 1);
}

#[test]
fn oversized_timer_is_capped_and_reported_capped() {
    let bench = Bench::new();
    let reply = bench.registry.set_timer(MAX_TIMER_SECONDS + 10);
    assert_eq!(reply, format!("Timer set for {} seconds.", MAX_TIMER_SECONDS));

    let timers = bench.registry.pending_timers();
    assert_eq!(timers[0].kind, ScheduleKind::Timer { seconds: MAX_TIMER_SECONDS });
    assert_eq!(
        timers[0].due - timers[0].created_at,
        chrono::Duration::seconds(MAX_TIMER_SECONDS as i64)
    );
}

#[tokio::test]
async fn timer_fires_on_time_exactly_once() {
    let bench = Bench::new();
    let ticker = bench.ticker();
    bench.registry.set_timer(30);

    bench.clock.advance(Duration::from_secs(29));
    assert!(ticker.tick_once().await.is_empty());
    assert_eq!(bench.alert.count(), 0);

    bench.clock.advance(Duration::from_secs(1));
    let fired = ticker.tick_once().await;
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].kind, ScheduleKind::Timer { seconds: 30 });

    assert!(ticker.tick_once().await.is_empty());
    assert_eq!(bench.alert.beeps(), vec![(ALARM_FREQUENCY_HZ, ALARM_DURATION)]);
    assert_eq!(bench.speaker.spoken(), vec![TIMER_DONE.to_string()]);
    assert!(bench.registry.is_empty());
}

#[tokio::test]
async fn alarm_beeps_without_speaking() {
    let bench = Bench::new();
    let ticker = bench.ticker();
    bench.registry.set_alarm(at(15, 10, 5));

    bench.clock.set(at(15, 10, 4));
    assert!(ticker.tick_once().await.is_empty());

    bench.clock.set(at(15, 10, 5));
    assert_eq!(ticker.tick_once().await.len(), 1);
    assert_eq!(bench.alert.count(), 1);
    assert!(bench.speaker.spoken().is_empty());
}

#[tokio::test]
async fn past_due_alarm_fires_on_next_tick() {
    let bench = Bench::new();
    let ticker = bench.ticker();
    bench.registry.set_alarm(at(15, 9, 0));

    let fired = ticker.tick_once().await;
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].kind, ScheduleKind::Alarm);
    assert!(bench.registry.is_empty());
}

#[tokio::test]
async fn alarms_fire_before_timers_in_one_tick() {
    let bench = Bench::new();
    let ticker = bench.ticker();
    bench.registry.set_timer(5);
    bench.registry.set_alarm(at(15, 10, 0));

    bench.clock.advance(Duration::from_secs(10));
    let kinds: Vec<_> = ticker.tick_once().await.into_iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![ScheduleKind::Alarm, ScheduleKind::Timer { seconds: 5 }]);
}

#[tokio::test]
async fn late_tick_still_fires_everything_due() {
    let bench = Bench::new();
    let ticker = bench.ticker();
    for secs in [1, 2, 3] {
        bench.registry.set_timer(secs);
    }
    bench.clock.advance(Duration::from_secs(60));
    assert_eq!(ticker.tick_once().await.len(), 3);
    assert_eq!(bench.alert.count(), 3);
}

#[test]
fn cancelled_entry_is_removed() {
    let bench = Bench::new();
    bench.registry.set_timer(10);
    let id = bench.registry.pending_timers()[0].id;

    assert!(bench.registry.cancel(id));
    assert!(!bench.registry.cancel(id));
    assert!(bench.registry.is_empty());
}

#[test]
fn claimed_entries_are_not_claimed_twice() {
    let bench = Bench::new();
    bench.registry.set_timer(1);
    bench.clock.advance(Duration::from_secs(1));

    let first = bench.registry.claim_due(bench.clock.now());
    assert_eq!(first.len(), 1);
    assert!(bench.registry.claim_due(bench.clock.now()).is_empty());
    assert!(!bench.registry.cancel(first[0].id));

    assert!(bench.registry.complete(first[0].id));
    assert!(!bench.registry.complete(first[0].id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_all_fire() {
    const N: u64 = 50;
    let bench = Bench::new();
    let shutdown = CancellationToken::new();
    let handle = bench
        .ticker()
        .with_period(Duration::from_millis(5))
        .spawn(shutdown.clone());

    let mut writers = Vec::new();
    for i in 0..N {
        let registry = bench.registry.clone();
        writers.push(tokio::spawn(async move {
            registry.set_timer(1 + i % 3);
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }

    bench.clock.advance(Duration::from_secs(5));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while bench.alert.count() < N as usize && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // A few more ticks must not re-fire anything.
    tokio::time::sleep(Duration::from_millis(50)).await;

    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(bench.alert.count(), N as usize);
    assert_eq!(bench.speaker.spoken().len(), N as usize);
    assert!(bench.registry.is_empty());
}

#[tokio::test]
async fn ticker_stops_on_cancel() {
    let bench = Bench::new();
    let shutdown = CancellationToken::new();
    let handle = bench.ticker().with_period(Duration::from_millis(5)).spawn(shutdown.clone());
    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("ticker did not stop")
        .unwrap();
}
