//! Car state hierarchy
//!
//! - Top
//!   - OFF
//!   - ON
//!     - PARK
//!     - DRIVE
//!       - IDLE, DRIVE1, DRIVE2, REVERSE_GEAR
//!
//! SET moves forward through the gears, BACK moves backward, REVERSE is only
//! accepted while idling and STATUS reports the active state.

#![allow(dead_code)]

use hsm_engine::prelude::*;
use hsm_engine::EventCode;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarState {
    Top,
    Off,
    On,
    Park,
    Drive,
    Idle,
    Drive1,
    Drive2,
    ReverseGear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarEvent {
    Back,
    Set,
    Status,
    Reverse,
}

impl Signal for CarEvent {
    fn code(&self) -> EventCode {
        *self as EventCode
    }
}

impl CarEvent {
    pub fn from_code(code: EventCode) -> Option<Self> {
        match code {
            0 => Some(CarEvent::Back),
            1 => Some(CarEvent::Set),
            2 => Some(CarEvent::Status),
            3 => Some(CarEvent::Reverse),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CarLog {
    pub entered: Vec<CarState>,
    pub exited: Vec<CarState>,
    pub status: Vec<String>,
}

pub type Car = StateMachine<CarState, CarLog, CarEvent>;

/// Entry and exit bookkeeping shared by every car state.
fn track(state: CarState, msg: &Msg<CarEvent>, log: &mut CarLog) -> Option<Response> {
    match msg {
        Msg::Entry => {
            info!("{:?} entered", state);
            log.entered.push(state);
            Some(Response::Handled)
        }
        Msg::Exit => {
            log.exited.push(state);
            Some(Response::Handled)
        }
        _ => None,
    }
}

fn status(hsm: &Dispatch<'_, CarState>, log: &mut CarLog) -> Response {
    let name = hsm.hierarchy().name(hsm.source()).unwrap_or_default().to_string();
    info!("Car::{}", name);
    log.status.push(name);
    Response::Handled
}

struct TopState;

impl Stateful<CarState, CarLog, CarEvent> for TopState {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        match msg {
            Msg::Start => {
                info!("TOP -> OFF");
                hsm.start(CarState::Off)
            }
            Msg::Event(CarEvent::Status) => status(hsm, log),
            _ => Response::Super,
        }
    }
}

struct OffState;

impl Stateful<CarState, CarLog, CarEvent> for OffState {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        if let Some(response) = track(CarState::Off, msg, log) {
            return response;
        }
        match msg {
            Msg::Event(CarEvent::Status) => status(hsm, log),
            Msg::Event(CarEvent::Set) => {
                info!("OFF -> ON");
                hsm.transition(CarState::On)
            }
            Msg::Event(CarEvent::Back) => {
                info!("OFF: already off");
                Response::Handled
            }
            _ => Response::Super,
        }
    }
}

struct OnState;

impl Stateful<CarState, CarLog, CarEvent> for OnState {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        if let Some(response) = track(CarState::On, msg, log) {
            return response;
        }
        match msg {
            Msg::Event(CarEvent::Status) => status(hsm, log),
            Msg::Event(CarEvent::Set) => {
                info!("ON -> PARK");
                hsm.transition(CarState::Park)
            }
            Msg::Event(CarEvent::Back) => {
                info!("ON -> OFF");
                hsm.transition(CarState::Off)
            }
            _ => Response::Super,
        }
    }
}

struct ParkState;

impl Stateful<CarState, CarLog, CarEvent> for ParkState {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        if let Some(response) = track(CarState::Park, msg, log) {
            return response;
        }
        match msg {
            Msg::Event(CarEvent::Status) => status(hsm, log),
            Msg::Event(CarEvent::Set) => {
                info!("PARK -> DRIVE");
                hsm.transition(CarState::Drive)
            }
            Msg::Event(CarEvent::Back) => {
                info!("PARK -> OFF");
                hsm.transition(CarState::Off)
            }
            _ => Response::Super,
        }
    }
}

struct DriveState;

impl Stateful<CarState, CarLog, CarEvent> for DriveState {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        if let Some(response) = track(CarState::Drive, msg, log) {
            return response;
        }
        match msg {
            Msg::Event(CarEvent::Status) => status(hsm, log),
            Msg::Event(CarEvent::Set) => {
                info!("DRIVE -> IDLE");
                hsm.transition(CarState::Idle)
            }
            Msg::Event(CarEvent::Back) => {
                info!("DRIVE -> PARK");
                hsm.transition(CarState::Park)
            }
            _ => Response::Super,
        }
    }
}

struct IdleState;

impl Stateful<CarState, CarLog, CarEvent> for IdleState {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        if let Some(response) = track(CarState::Idle, msg, log) {
            return response;
        }
        match msg {
            Msg::Event(CarEvent::Status) => status(hsm, log),
            Msg::Event(CarEvent::Set) => hsm.transition(CarState::Drive1),
            Msg::Event(CarEvent::Back) => hsm.transition(CarState::Drive),
            Msg::Event(CarEvent::Reverse) => hsm.transition(CarState::ReverseGear),
            _ => Response::Super,
        }
    }
}

struct Drive1State;

impl Stateful<CarState, CarLog, CarEvent> for Drive1State {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        if let Some(response) = track(CarState::Drive1, msg, log) {
            return response;
        }
        match msg {
            Msg::Event(CarEvent::Status) => status(hsm, log),
            Msg::Event(CarEvent::Set) => hsm.transition(CarState::Drive2),
            Msg::Event(CarEvent::Back) => hsm.transition(CarState::Idle),
            _ => Response::Super,
        }
    }
}

struct Drive2State;

impl Stateful<CarState, CarLog, CarEvent> for Drive2State {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        if let Some(response) = track(CarState::Drive2, msg, log) {
            return response;
        }
        match msg {
            Msg::Event(CarEvent::Status) => status(hsm, log),
            Msg::Event(CarEvent::Set) => {
                info!("DRIVE2 is already the highest gear");
                Response::Handled
            }
            Msg::Event(CarEvent::Back) => hsm.transition(CarState::Idle),
            _ => Response::Super,
        }
    }
}

struct ReverseGearState;

impl Stateful<CarState, CarLog, CarEvent> for ReverseGearState {
    fn on_event(
        &mut self,
        msg: &Msg<CarEvent>,
        hsm: &mut Dispatch<'_, CarState>,
        log: &mut CarLog,
    ) -> Response {
        if let Some(response) = track(CarState::ReverseGear, msg, log) {
            return response;
        }
        match msg {
            Msg::Event(CarEvent::Status) => status(hsm, log),
            Msg::Event(CarEvent::Set) | Msg::Event(CarEvent::Back) => {
                hsm.transition(CarState::Idle)
            }
            _ => Response::Super,
        }
    }
}

pub fn car() -> Result<Car, Error<CarState>> {
    use CarState::*;

    StateMachineBuilder::new("Car", CarLog::default())
        .top(Top, TopState)
        .substate(Off, Top, OffState)
        .substate(On, Top, OnState)
        .substate(Park, On, ParkState)
        .substate(Drive, On, DriveState)
        .substate(Idle, Drive, IdleState)
        .substate(Drive1, Drive, Drive1State)
        .substate(Drive2, Drive, Drive2State)
        .substate(ReverseGear, Drive, ReverseGearState)
        .display_name(Top, "top")
        .display_name(Off, "OFF")
        .display_name(On, "ON")
        .display_name(Park, "ON:PARK")
        .display_name(Drive, "ON:DRIVE")
        .display_name(Idle, "ON:DRIVE:IDLE")
        .display_name(Drive1, "ON:DRIVE:DRIVE1")
        .display_name(Drive2, "ON:DRIVE:DRIVE2")
        .display_name(ReverseGear, "ON:DRIVE:REVERSE_GEAR")
        .build()
}
