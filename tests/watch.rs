#[path = "../demos/watch/machine.rs"]
mod machine;

use machine::{watch, Watch, WatchEvent, WatchState};

fn started() -> Watch {
    let mut watch = watch().unwrap();
    watch.on_start().unwrap();
    watch
}

fn press(watch: &mut Watch, event: WatchEvent, times: u32) {
    for _ in 0..times {
        watch.on_event(event).unwrap();
    }
}

/// Walk through hour, minute, day and month without changing anything.
fn leave_setting(watch: &mut Watch) {
    press(watch, WatchEvent::Set, 4);
}

#[test]
fn starts_adjusting_hours() {
    let watch = started();
    assert_eq!(watch.current_state(), Some(WatchState::Hour));
    assert!(watch.is_in(&WatchState::Setting));
    assert!(watch.context().display.is_empty());
}

#[test]
fn first_return_to_timekeeping_shows_time() {
    let mut watch = started();
    leave_setting(&mut watch);

    assert_eq!(watch.current_state(), Some(WatchState::Time));
    assert_eq!(watch.context().display, vec!["time:  0:00:00"]);
}

#[test]
fn timekeeping_resumes_date_after_setting() {
    let mut watch = started();
    leave_setting(&mut watch);
    watch.on_event(WatchEvent::Mode).unwrap();
    assert_eq!(watch.current_state(), Some(WatchState::Date));

    watch.on_event(WatchEvent::Set).unwrap();
    assert_eq!(watch.current_state(), Some(WatchState::Hour));
    assert_eq!(watch.context().history, WatchState::Date);

    press(&mut watch, WatchEvent::Mode, 7);
    watch.on_event(WatchEvent::Set).unwrap();
    press(&mut watch, WatchEvent::Mode, 7);
    watch.on_event(WatchEvent::Set).unwrap();
    press(&mut watch, WatchEvent::Mode, 4);
    watch.on_event(WatchEvent::Set).unwrap();
    press(&mut watch, WatchEvent::Mode, 11);
    watch.on_event(WatchEvent::Set).unwrap();

    assert_eq!(watch.current_state(), Some(WatchState::Date));
    assert_eq!(
        watch.context().display.last().map(String::as_str),
        Some("date: 05-12-2018")
    );
    let clock = watch.context();
    assert_eq!((clock.hour, clock.min), (7, 7));
}

#[test]
fn timekeeping_resumes_time_after_toggling_back() {
    let mut watch = started();
    leave_setting(&mut watch);
    press(&mut watch, WatchEvent::Mode, 2);

    watch.on_event(WatchEvent::Set).unwrap();
    leave_setting(&mut watch);

    assert_eq!(watch.current_state(), Some(WatchState::Time));
}

#[test]
fn ticks_in_setting_mode_only_advance_seconds() {
    let mut watch = started();
    watch.context_mut().sec = 58;

    press(&mut watch, WatchEvent::Tick, 3);

    let clock = watch.context();
    assert_eq!((clock.min, clock.sec), (0, 1));
    assert_eq!(clock.display.last().map(String::as_str), Some("time:  0:00:01"));
    assert_eq!(watch.current_state(), Some(WatchState::Hour));
    assert_eq!(watch.unhandled_events(), 0);
}

#[test]
fn ticks_advance_the_clock_in_timekeeping() {
    let mut watch = started();
    leave_setting(&mut watch);

    press(&mut watch, WatchEvent::Tick, 61);

    assert_eq!((watch.context().min, watch.context().sec), (1, 1));
    assert_eq!(
        watch.context().display.last().map(String::as_str),
        Some("time:  0:01:01")
    );
}

#[test]
fn tick_rolls_over_the_year_end() {
    let mut watch = started();
    leave_setting(&mut watch);
    {
        let clock = watch.context_mut();
        clock.sec = 59;
        clock.min = 59;
        clock.hour = 23;
        clock.day = 31;
        clock.month = 12;
    }

    watch.on_event(WatchEvent::Tick).unwrap();

    let clock = watch.context();
    assert_eq!((clock.hour, clock.min, clock.sec), (0, 0, 0));
    assert_eq!((clock.day, clock.month), (1, 1));
}

#[test]
fn day_adjustment_wraps_by_month_length() {
    let mut watch = started();
    press(&mut watch, WatchEvent::Set, 2);
    assert_eq!(watch.current_state(), Some(WatchState::Day));
    watch.context_mut().month = 2;
    watch.context_mut().day = 28;

    watch.on_event(WatchEvent::Mode).unwrap();

    assert_eq!(watch.context().day, 1);
}
