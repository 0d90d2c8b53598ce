//! End-to-end schedule flow: editor → store → cache → planner → relay.
//!
//! Time is simulated by `MockRtc::advance_to`; an asserted alarm line is
//! fed through the same edge handler the GPIO ISR uses.

use crate::mock_hw::{MockRelay, MockRtc, RecordingSink};

use irrigation::adapters::fs::SimFs;
use irrigation::app::commands::ScheduleEditor;
use irrigation::app::events::AppEvent;
use irrigation::app::ports::{ActuatorPort, StorageError};
use irrigation::app::service::{PassReport, ScheduleService};
use irrigation::config::SystemConfig;
use irrigation::events::{Notification, NotifyFlags};
use irrigation::interrupt::on_alarm_edge;
use irrigation::planner::AlarmPlanner;
use irrigation::schedule::{ScheduleCache, ScheduleStore};

type Service<'r> = ScheduleService<'static, SimFs, MockRtc, &'r MockRelay, RecordingSink>;

/// 2024-05-01 07:00 at the default +07:00 offset.
const T1: i64 = 1_714_521_600;
/// 2024-05-01 09:00 local.
const T2: i64 = T1 + 7_200;
/// Boot at 06:00 local.
const BOOT: i64 = T1 - 3_600;

fn store(fs: &SimFs) -> ScheduleStore<SimFs> {
    let cfg = SystemConfig::default();
    ScheduleStore::new(fs.clone(), cfg.schedule_path, cfg.schedule_staging_path)
}

fn service<'r>(fs: &SimFs, relay: &'r MockRelay, now: i64) -> Service<'r> {
    ScheduleService::new(
        store(fs),
        ScheduleCache::new(SystemConfig::default().utc_offset()),
        AlarmPlanner::new(MockRtc::new(now)),
        relay,
        RecordingSink::new(),
    )
}

fn record(id: &str, time: &str, duration: u32) -> String {
    format!(
        r#"{{"identifier":"{id}","mode":0,"date":"2024-05-01","time":"{time}","durationSeconds":{duration},"intervalValue":0,"intervalUnit":""}}"#
    )
}

/// Advance simulated time and run the pass the ISR would trigger.
fn tick(svc: &mut Service<'_>, flags: &NotifyFlags, t: i64) -> PassReport {
    let asserted = svc.planner_mut().clock_mut().advance_to(t);
    on_alarm_edge(flags, asserted);
    svc.process(flags.take())
}

fn armed_at(report: &PassReport) -> Option<(i64, i64)> {
    report.armed.map(|p| (p.activation, p.deactivation))
}

// ── Full day ──────────────────────────────────────────────────

#[test]
fn two_schedules_run_back_to_back() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("morning", "07:00", 120)).unwrap();
    editor.upload(&record("late", "09:00", 60)).unwrap();

    let report = svc.process(flags.take());
    assert_eq!(report.reloaded.unwrap().loaded, 2);
    assert_eq!(armed_at(&report), Some((T1, T1 + 120)));
    assert_eq!(svc.planner().clock().alarms, [Some(T1), Some(T1 + 120)]);

    let report = tick(&mut svc, &flags, T1);
    assert!(report.fired.activation);
    assert!(relay.is_on());
    assert_eq!(armed_at(&report), Some((T1, T1 + 120)), "in-flight pair is kept");

    let report = tick(&mut svc, &flags, T1 + 120);
    assert!(report.fired.deactivation);
    assert!(!relay.is_on());
    assert_eq!(armed_at(&report), Some((T2, T2 + 60)));

    tick(&mut svc, &flags, T2);
    let report = tick(&mut svc, &flags, T2 + 60);
    assert_eq!(report.armed, None);
    assert_eq!(svc.sink().last(), Some(&AppEvent::NothingToArm));

    assert_eq!(relay.history(), [true, false, true, false]);
}

#[test]
fn no_alarm_means_no_actuation() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("morning", "07:00", 120)).unwrap();
    svc.process(flags.take());

    let report = tick(&mut svc, &flags, T1 - 1);
    assert_eq!(report, PassReport::default());
    assert!(relay.history().is_empty());
}

// ── Edits ─────────────────────────────────────────────────────

#[test]
fn earlier_upload_takes_over_the_alarm() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("late", "09:00", 60)).unwrap();
    assert_eq!(armed_at(&svc.process(flags.take())), Some((T2, T2 + 60)));

    editor.upload(&record("morning", "07:00", 120)).unwrap();
    assert_eq!(armed_at(&svc.process(flags.take())), Some((T1, T1 + 120)));
}

#[test]
fn deleting_the_armed_schedule_moves_to_the_next() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("morning", "07:00", 120)).unwrap();
    editor.upload(&record("late", "09:00", 60)).unwrap();
    svc.process(flags.take());

    assert_eq!(editor.delete("morning"), Ok(1));
    let report = svc.process(flags.take());
    assert_eq!(report.reloaded.unwrap().loaded, 1);
    assert_eq!(armed_at(&report), Some((T2, T2 + 60)));
    assert_eq!(editor.list().unwrap().len(), 1);
}

#[test]
fn deleting_everything_leaves_the_last_pair_programmed() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("morning", "07:00", 120)).unwrap();
    svc.process(flags.take());
    editor.delete("morning").unwrap();

    let report = svc.process(flags.take());
    assert_eq!(report.reloaded.unwrap().loaded, 0);
    assert_eq!(report.armed, None);
    assert!(svc.cache().is_empty());
    assert_eq!(svc.planner().clock().alarms, [Some(T1), Some(T1 + 120)]);
    assert!(svc.planner().armed().is_some());
}

#[test]
fn upload_during_watering_keeps_the_running_pair() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("morning", "07:00", 120)).unwrap();
    svc.process(flags.take());
    tick(&mut svc, &flags, T1 + 30);
    assert!(relay.is_on());

    editor.upload(&record("late", "09:00", 60)).unwrap();
    assert_eq!(armed_at(&svc.process(flags.take())), Some((T1, T1 + 120)));

    tick(&mut svc, &flags, T1 + 120);
    assert!(!relay.is_on());
}

#[test]
fn upload_landing_with_the_stop_alarm_still_stops_the_valve() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("morning", "07:00", 120)).unwrap();
    svc.process(flags.take());
    tick(&mut svc, &flags, T1);
    assert!(relay.is_on());

    // Slot B fires and an upload lands before the task wakes.
    let asserted = svc.planner_mut().clock_mut().advance_to(T1 + 120);
    on_alarm_edge(&flags, asserted);
    editor.upload(&record("late", "09:00", 60)).unwrap();
    let report = svc.process(flags.take());

    assert!(report.fired.deactivation);
    assert!(!relay.is_on());
    assert_eq!(relay.history(), [true, false]);
    assert_eq!(armed_at(&report), Some((T2, T2 + 60)));
}

#[test]
fn edit_after_the_stop_instant_waits_for_slot_b() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("morning", "07:00", 90)).unwrap();
    svc.process(flags.take());
    tick(&mut svc, &flags, T1);

    // The clock is past 07:01:30 but slot B has not been reported yet.
    let clock = svc.planner_mut().clock_mut();
    clock.alarms[1] = Some(T1 + 120);
    clock.now = T1 + 100;
    editor.upload(&record("late", "09:00", 60)).unwrap();
    assert_eq!(armed_at(&svc.process(flags.take())), Some((T1, T1 + 90)));
    assert_eq!(svc.planner().clock().alarms, [Some(T1), Some(T1 + 120)]);

    let report = tick(&mut svc, &flags, T1 + 120);
    assert!(!relay.is_on());
    assert_eq!(armed_at(&report), Some((T2, T2 + 60)));
}

// ── Notifications ─────────────────────────────────────────────

#[test]
fn coalesced_notifications_reload_once() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);

    editor.upload(&record("a", "07:00", 60)).unwrap();
    editor.upload(&record("b", "08:00", 60)).unwrap();
    flags.notify(Notification::NEEDS_RELOAD);

    let before = fs.read_opens();
    let report = svc.process(flags.take());
    assert_eq!(fs.read_opens() - before, 1);
    assert_eq!(report.reloaded.unwrap().loaded, 2);

    assert_eq!(svc.process(flags.take()), PassReport::default());
    assert_eq!(fs.read_opens() - before, 1);
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn unavailable_storage_is_reported_and_nothing_is_armed() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let mut svc = service(&fs, &relay, BOOT);

    fs.set_available(false);
    flags.notify(Notification::NEEDS_RELOAD | Notification::NEEDS_REARM);
    let report = svc.process(flags.take());

    assert_eq!(report.reloaded.unwrap().error, Some(StorageError::Unavailable));
    assert_eq!(report.armed, None);
    assert_eq!(svc.planner().clock().alarms, [None, None]);
    assert_eq!(
        svc.sink().count(|e| matches!(e, AppEvent::StorageFailed(StorageError::Unavailable))),
        1
    );
}

#[test]
fn corrupted_tail_hides_later_records_until_rewritten() {
    let fs = SimFs::new();
    let flags = NotifyFlags::new();
    let relay = MockRelay::new();
    let editor = ScheduleEditor::new(store(&fs), &flags);
    let mut svc = service(&fs, &relay, BOOT);
    let path = SystemConfig::default().schedule_path;

    editor.upload(&record("a", "07:00", 60)).unwrap();
    fs.append_raw(&path, b"{\"identifier\":\n");
    editor.upload(&record("b", "08:00", 60)).unwrap();

    assert_eq!(svc.process(flags.take()).reloaded.unwrap().loaded, 1);

    // Any delete rewrites the log without the unreadable tail.
    assert_eq!(editor.delete("nobody"), Ok(0));
    let text = fs.contents(&path).unwrap();
    assert!(text.contains("\"a\""));
    assert!(!text.contains("\"b\""));
    assert_eq!(svc.process(flags.take()).reloaded.unwrap().loaded, 1);
}
