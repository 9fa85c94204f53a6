//! Digital watch hierarchy
//!
//! - Top
//!   - timekeeping (remembers whether time or date was shown last)
//!     - time, date
//!   - setting
//!     - hour, minute, day, month
//!
//! In timekeeping mode MODE toggles between time and date and TICK advances
//! the clock. SET enters setting mode, where MODE increments the field being
//! adjusted and SET moves on: hour, minute, day, month, then back to
//! timekeeping. In setting mode ticks fall through to top, which only
//! advances the seconds.

#![allow(dead_code)]

use hsm_engine::prelude::*;
use hsm_engine::EventCode;
use tracing::info;

const DAYS_PER_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchState {
    Top,
    Timekeeping,
    Time,
    Date,
    Setting,
    Hour,
    Minute,
    Day,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    Mode,
    Set,
    Tick,
}

impl Signal for WatchEvent {
    fn code(&self) -> EventCode {
        *self as EventCode
    }
}

impl WatchEvent {
    pub fn from_code(code: EventCode) -> Option<Self> {
        match code {
            0 => Some(WatchEvent::Mode),
            1 => Some(WatchEvent::Set),
            2 => Some(WatchEvent::Tick),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Clock {
    pub sec: u32,
    pub min: u32,
    pub hour: u32,
    pub day: u32,
    pub month: u32,
    pub year: u32,
    /// Substate of timekeeping to resume on re-entry
    pub history: WatchState,
    pub display: Vec<String>,
}

impl Default for Clock {
    fn default() -> Self {
        Self {
            sec: 0,
            min: 0,
            hour: 0,
            day: 1,
            month: 1,
            year: 2018,
            history: WatchState::Time,
            display: Vec::new(),
        }
    }
}

impl Clock {
    fn days_in_month(&self) -> u32 {
        DAYS_PER_MONTH[(self.month as usize - 1) % 12]
    }

    /// Advance by one second, carrying into minutes, hours, days and months.
    pub fn tick(&mut self) {
        self.sec += 1;
        if self.sec < 60 {
            return;
        }
        self.sec = 0;
        self.min += 1;
        if self.min < 60 {
            return;
        }
        self.min = 0;
        self.hour += 1;
        if self.hour < 24 {
            return;
        }
        self.hour = 0;
        self.day += 1;
        if self.day <= self.days_in_month() {
            return;
        }
        self.day = 1;
        self.month = self.month % 12 + 1;
    }

    fn show_time(&mut self) {
        let line = format!("time: {:2}:{:02}:{:02}", self.hour, self.min, self.sec);
        info!("{}", line);
        self.display.push(line);
    }

    fn show_date(&mut self) {
        let line = format!("date: {:02}-{:02}-{:04}", self.day, self.month, self.year);
        info!("{}", line);
        self.display.push(line);
    }
}

pub type Watch = StateMachine<WatchState, Clock, WatchEvent>;

struct WatchHandler(WatchState);

impl Stateful<WatchState, Clock, WatchEvent> for WatchHandler {
    fn on_event(
        &mut self,
        msg: &Msg<WatchEvent>,
        hsm: &mut Dispatch<'_, WatchState>,
        clock: &mut Clock,
    ) -> Response {
        use WatchEvent::*;
        use WatchState::*;

        match (self.0, msg) {
            (Top, Msg::Start) => hsm.start(Setting),
            (Top, Msg::Event(Tick)) => {
                clock.sec = (clock.sec + 1) % 60;
                clock.show_time();
                Response::Handled
            }

            (Timekeeping, Msg::Start) => hsm.start(clock.history),
            (Timekeeping, Msg::Exit) => {
                // still the leaf that was active before leaving
                clock.history = *hsm.current();
                Response::Handled
            }
            (Timekeeping, Msg::Event(Set)) => hsm.transition(Setting),

            (Time, Msg::Entry) => {
                clock.show_time();
                Response::Handled
            }
            (Time, Msg::Event(Mode)) => hsm.transition(Date),
            (Time, Msg::Event(Tick)) => {
                clock.tick();
                clock.show_time();
                Response::Handled
            }

            (Date, Msg::Entry) => {
                clock.show_date();
                Response::Handled
            }
            (Date, Msg::Event(Mode)) => hsm.transition(Time),
            (Date, Msg::Event(Tick)) => {
                clock.tick();
                clock.show_date();
                Response::Handled
            }

            (Setting, Msg::Start) => hsm.start(Hour),

            (Hour, Msg::Event(Set)) => hsm.transition(Minute),
            (Hour, Msg::Event(Mode)) => {
                clock.hour = (clock.hour + 1) % 24;
                info!("hour: {}", clock.hour);
                Response::Handled
            }

            (Minute, Msg::Event(Set)) => hsm.transition(Day),
            (Minute, Msg::Event(Mode)) => {
                clock.min = (clock.min + 1) % 60;
                info!("minute: {}", clock.min);
                Response::Handled
            }

            (Day, Msg::Event(Set)) => hsm.transition(Month),
            (Day, Msg::Event(Mode)) => {
                clock.day = clock.day % clock.days_in_month() + 1;
                info!("day: {}", clock.day);
                Response::Handled
            }

            (Month, Msg::Event(Set)) => hsm.transition(Timekeeping),
            (Month, Msg::Event(Mode)) => {
                clock.month = clock.month % 12 + 1;
                info!("month: {}", clock.month);
                Response::Handled
            }

            _ => Response::Super,
        }
    }
}

pub fn watch() -> Result<Watch, Error<WatchState>> {
    use WatchState::*;

    let superstate = |state: &WatchState| match state {
        Timekeeping | Setting => Some(Top),
        Time | Date => Some(Timekeeping),
        Hour | Minute | Day | Month => Some(Setting),
        Top => None,
    };

    let mut builder = StateMachineBuilder::new("Watch", Clock::default())
        .top(Top, WatchHandler(Top))
        .superstate_fn(superstate);
    for state in [Timekeeping, Time, Date, Setting, Hour, Minute, Day, Month] {
        builder = builder.state(state, WatchHandler(state));
    }
    builder.build()
}
