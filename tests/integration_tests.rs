use hsm_engine::{
    Dispatch, Error, Msg, Response, StateMachine, StateMachineBuilder, Stateful,
    DEFAULT_MAX_NESTING,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DeviceState {
    Top,
    Off,
    Powered,
    Standby,
    Active,
    Low,
    High,
    Fault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceEvent {
    PowerOn,
    PowerOff,
    Activate,
    Deactivate,
    Boost,
    ErrorOccurred,
    Reset,
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Entry(DeviceState),
    Exit(DeviceState),
}

#[derive(Debug, Default)]
struct DeviceContext {
    journal: Vec<Action>,
    power_level: u8,
    error_count: u32,
}

impl DeviceContext {
    fn take_journal(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.journal)
    }
}

struct DeviceHandler(DeviceState);

impl Stateful<DeviceState, DeviceContext, DeviceEvent> for DeviceHandler {
    fn on_event(
        &mut self,
        msg: &Msg<DeviceEvent>,
        hsm: &mut Dispatch<'_, DeviceState>,
        context: &mut DeviceContext,
    ) -> Response {
        use DeviceEvent::*;
        use DeviceState::*;

        match (self.0, msg) {
            (state, Msg::Entry) => {
                context.journal.push(Action::Entry(state));
                match state {
                    Off => context.power_level = 0,
                    Standby => context.power_level = 25,
                    Low => context.power_level = 60,
                    High => context.power_level = 100,
                    Fault => context.error_count += 1,
                    _ => {}
                }
                Response::Handled
            }
            (state, Msg::Exit) => {
                context.journal.push(Action::Exit(state));
                Response::Handled
            }

            (Top, Msg::Start) => hsm.start(Off),
            (Top, Msg::Event(ErrorOccurred)) => hsm.transition(Fault),

            (Off, Msg::Event(PowerOn)) => hsm.transition(Powered),

            (Powered, Msg::Start) => hsm.start(Standby),
            (Powered, Msg::Event(PowerOff)) => hsm.transition(Off),
            (Powered, Msg::Event(Deactivate)) => hsm.transition(Standby),

            (Standby, Msg::Event(Activate)) => hsm.transition(Active),

            (Active, Msg::Start) => hsm.start(Low),
            (Active, Msg::Event(Boost)) => hsm.transition(High),

            (High, Msg::Event(Boost)) => hsm.transition(High),

            (Fault, Msg::Event(Reset)) if context.error_count < 3 => hsm.transition(Powered),
            (Fault, Msg::Event(Reset)) => hsm.transition(Off),

            _ => Response::Super,
        }
    }
}

const STATES: [DeviceState; 8] = [
    DeviceState::Top,
    DeviceState::Off,
    DeviceState::Powered,
    DeviceState::Standby,
    DeviceState::Active,
    DeviceState::Low,
    DeviceState::High,
    DeviceState::Fault,
];

fn create_device() -> StateMachine<DeviceState, DeviceContext, DeviceEvent> {
    use DeviceState::*;

    StateMachineBuilder::new("device", DeviceContext::default())
        .top(Top, DeviceHandler(Top))
        .state(Off, DeviceHandler(Off))
        .state(Powered, DeviceHandler(Powered))
        .state(Standby, DeviceHandler(Standby))
        .state(Active, DeviceHandler(Active))
        .state(Low, DeviceHandler(Low))
        .state(High, DeviceHandler(High))
        .state(Fault, DeviceHandler(Fault))
        .superstate_fn(|state| match state {
            Off | Powered | Fault => Some(Top),
            Standby | Active => Some(Powered),
            Low | High => Some(Active),
            Top => None,
        })
        .build()
        .unwrap()
}

fn started_device() -> StateMachine<DeviceState, DeviceContext, DeviceEvent> {
    let mut device = create_device();
    device.on_start().unwrap();
    device.context_mut().take_journal();
    device
}

/// States whose handler requests an initial transition on START.
fn has_initial_transition(state: DeviceState) -> bool {
    matches!(state, DeviceState::Top | DeviceState::Powered | DeviceState::Active)
}

#[test]
fn every_state_reaches_top_within_nesting_limit() {
    let device = create_device();
    let hierarchy = device.hierarchy();

    for state in STATES {
        let chain: Vec<_> = hierarchy.ancestors(&state).collect();
        assert!(chain.len() <= DEFAULT_MAX_NESTING);
        assert_eq!(chain.last(), Some(&&DeviceState::Top));
        assert_eq!(hierarchy.depth(&state), Some(chain.len()));
    }
}

#[test]
fn start_enters_top_then_initial_leaf() {
    let mut device = create_device();
    device.on_start().unwrap();

    assert_eq!(device.current_state(), Some(DeviceState::Off));
    assert_eq!(
        device.context().journal,
        vec![Action::Entry(DeviceState::Top), Action::Entry(DeviceState::Off)]
    );
}

#[test]
fn machine_settles_in_a_leaf_after_every_event() {
    use DeviceEvent::*;

    let mut device = started_device();
    for event in [PowerOn, Activate, Boost, Deactivate, ErrorOccurred, Reset, PowerOff, Ping] {
        device.on_event(event).unwrap();
        let state = device.current_state().unwrap();
        assert!(!has_initial_transition(state), "{:?} is not a leaf", state);
    }
}

#[test]
fn transition_into_composite_cascades_initial_transitions() {
    use DeviceState::*;

    let mut device = started_device();
    device.on_event(DeviceEvent::PowerOn).unwrap();

    assert_eq!(device.current_state(), Some(Standby));
    assert_eq!(
        device.context_mut().take_journal(),
        vec![Action::Exit(Off), Action::Entry(Powered), Action::Entry(Standby)]
    );

    device.on_event(DeviceEvent::Activate).unwrap();

    assert_eq!(device.current_state(), Some(Low));
    assert_eq!(device.context().power_level, 60);
    assert_eq!(
        device.context_mut().take_journal(),
        vec![Action::Exit(Standby), Action::Entry(Active), Action::Entry(Low)]
    );
}

#[test]
fn exits_innermost_first_and_skips_the_lca() {
    use DeviceState::*;

    let mut device = started_device();
    device.on_event(DeviceEvent::PowerOn).unwrap();
    device.on_event(DeviceEvent::Activate).unwrap();
    device.on_event(DeviceEvent::Boost).unwrap();
    device.context_mut().take_journal();

    // handled by Powered while High is active: LCA is Powered
    device.on_event(DeviceEvent::Deactivate).unwrap();

    assert_eq!(device.current_state(), Some(Standby));
    assert_eq!(
        device.context_mut().take_journal(),
        vec![Action::Exit(High), Action::Exit(Active), Action::Entry(Standby)]
    );

    // handled by Top: LCA is Top
    device.on_event(DeviceEvent::ErrorOccurred).unwrap();

    assert_eq!(device.current_state(), Some(Fault));
    assert_eq!(
        device.context_mut().take_journal(),
        vec![Action::Exit(Standby), Action::Exit(Powered), Action::Entry(Fault)]
    );
}

#[test]
fn self_transition_exits_and_reenters() {
    use DeviceState::*;

    let mut device = started_device();
    device.on_event(DeviceEvent::PowerOn).unwrap();
    device.on_event(DeviceEvent::Activate).unwrap();
    device.on_event(DeviceEvent::Boost).unwrap();
    device.context_mut().take_journal();

    device.on_event(DeviceEvent::Boost).unwrap();

    assert_eq!(device.current_state(), Some(High));
    assert_eq!(
        device.context_mut().take_journal(),
        vec![Action::Exit(High), Action::Entry(High)]
    );
}

#[test]
fn unhandled_event_changes_nothing() {
    let mut device = started_device();
    device.on_event(DeviceEvent::PowerOn).unwrap();
    device.context_mut().take_journal();

    device.on_event(DeviceEvent::Ping).unwrap();
    device.on_event(DeviceEvent::Boost).unwrap();

    assert_eq!(device.current_state(), Some(DeviceState::Standby));
    assert!(device.context().journal.is_empty());
    assert_eq!(device.unhandled_events(), 2);
}

#[test]
fn guard_in_handler_picks_target() {
    use DeviceEvent::*;

    let mut device = started_device();
    for _ in 0..3 {
        device.on_event(ErrorOccurred).unwrap();
        device.on_event(Reset).unwrap();
    }

    assert_eq!(device.context().error_count, 3);
    assert_eq!(device.current_state(), Some(DeviceState::Off));
}

#[test]
fn instances_are_independent() {
    let mut first = started_device();
    let second = started_device();

    first.on_event(DeviceEvent::PowerOn).unwrap();

    assert_eq!(first.current_state(), Some(DeviceState::Standby));
    assert_eq!(second.current_state(), Some(DeviceState::Off));
}

#[test]
fn event_before_start_is_rejected() {
    let mut device = create_device();
    assert_eq!(
        device.on_event(DeviceEvent::PowerOn),
        Err(Error::StateMachineNotInitialized)
    );
}

#[test]
fn nesting_limit_is_enforced_at_build_time() {
    use DeviceState::*;

    let result = StateMachineBuilder::new("device", DeviceContext::default())
        .top(Top, DeviceHandler(Top))
        .substate(Powered, Top, DeviceHandler(Powered))
        .substate(Active, Powered, DeviceHandler(Active))
        .substate(High, Active, DeviceHandler(High))
        .max_nesting(3)
        .build();

    assert!(matches!(
        result,
        Err(Error::NestingTooDeep {
            state: High,
            depth: 4,
            limit: 3
        })
    ));
}

#[cfg(feature = "tokio-integration")]
#[test]
fn pump_drains_queued_events() {
    use hsm_engine::pump;
    use tokio::sync::mpsc;

    let mut device = create_device();
    let (tx, rx) = mpsc::channel(8);

    tokio_test::block_on(async {
        tx.send(DeviceEvent::PowerOn).await.unwrap();
        tx.send(DeviceEvent::Activate).await.unwrap();
        drop(tx);
        pump::run(&mut device, rx).await
    })
    .unwrap();

    assert_eq!(device.current_state(), Some(DeviceState::Low));
}
