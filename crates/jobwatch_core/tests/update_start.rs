use std::sync::Once;

use jobwatch_core::{
    update, Effect, JobParameters, JobState, LimitBounds, MonitorState, Msg, Phase, StartError,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(jobwatch_logging::initialize_for_tests);
}

fn params() -> JobParameters {
    JobParameters::new("plumbers", "Leeds", Some(50))
}

#[test]
fn start_request_enters_starting_and_emits_send() {
    init_logging();
    let (mut state, effects) = update(MonitorState::new(), Msg::StartRequested(params()));

    assert_eq!(*state.job(), JobState::Starting);
    assert_eq!(
        effects,
        vec![Effect::SendStart {
            epoch: 1,
            params: params()
        }]
    );
    assert!(state.consume_dirty());
    assert_eq!(state.view().phase, Phase::Starting);
}

#[test]
fn acknowledgement_moves_to_running_and_arms_polling() {
    init_logging();
    let (state, _) = update(MonitorState::new(), Msg::StartRequested(params()));
    let (state, effects) = update(
        state,
        Msg::StartAcknowledged {
            epoch: 1,
            message: "Scraping started".to_string(),
        },
    );

    assert_eq!(effects, vec![Effect::BeginPolling]);
    let view = state.view();
    assert_eq!(view.phase, Phase::Running);
    assert_eq!(view.status_text, "Scraping started");
    assert_eq!(view.current_count, 0);
    assert_eq!(view.percent, 0);
    assert!(!view.terminal);
}

#[test]
fn rejection_is_terminal_with_server_text() {
    init_logging();
    let (state, _) = update(MonitorState::new(), Msg::StartRequested(params()));
    let (state, effects) = update(
        state,
        Msg::StartFailed {
            epoch: 1,
            error: StartError::rejected(Some("Scraping already in progress".to_string())),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(
        *state.job(),
        JobState::Failed("Scraping already in progress".to_string())
    );
    let view = state.view();
    assert!(view.terminal);
    assert_eq!(view.error.as_deref(), Some("Scraping already in progress"));
}

#[test]
fn retry_after_failure_starts_a_new_generation() {
    init_logging();
    let (state, _) = update(MonitorState::new(), Msg::StartRequested(params()));
    let (state, _) = update(
        state,
        Msg::StartFailed {
            epoch: 1,
            error: StartError::unreachable(),
        },
    );
    let (state, effects) = update(state, Msg::StartRequested(params()));

    assert_eq!(*state.job(), JobState::Starting);
    assert_eq!(state.epoch(), 2);
    assert!(matches!(effects[..], [Effect::SendStart { epoch: 2, .. }]));
}

#[test]
fn second_start_while_running_is_ignored() {
    init_logging();
    let (state, _) = update(MonitorState::new(), Msg::StartRequested(params()));
    let (state, _) = update(
        state,
        Msg::StartAcknowledged {
            epoch: 1,
            message: "ok".to_string(),
        },
    );
    let before = state.clone();

    let (state, effects) = update(state, Msg::StartRequested(params()));

    assert!(effects.is_empty());
    assert_eq!(state.job(), before.job());
    assert_eq!(state.epoch(), before.epoch());
}

#[test]
fn late_acknowledgement_after_stop_stops_remote_job() {
    init_logging();
    let (state, _) = update(MonitorState::new(), Msg::StartRequested(params()));
    let (state, effects) = update(state, Msg::StopRequested);
    assert_eq!(effects, vec![Effect::StopPolling, Effect::NotifyStop]);

    let (state, effects) = update(
        state,
        Msg::StartAcknowledged {
            epoch: 1,
            message: "late".to_string(),
        },
    );

    assert_eq!(effects, vec![Effect::NotifyStop]);
    assert_eq!(*state.job(), JobState::Idle);
    assert!(!state.start_in_flight());
}

#[test]
fn start_waits_for_pending_start_after_stop() {
    init_logging();
    let (state, _) = update(MonitorState::new(), Msg::StartRequested(params()));
    let (state, _) = update(state, Msg::StopRequested);
    assert_eq!(*state.job(), JobState::Idle);
    assert!(state.start_in_flight());

    let (state, effects) = update(state, Msg::StartRequested(params()));
    assert!(effects.is_empty());
    assert_eq!(*state.job(), JobState::Idle);

    let (state, _) = update(
        state,
        Msg::StartFailed {
            epoch: 1,
            error: StartError::unreachable(),
        },
    );
    assert_eq!(*state.job(), JobState::Idle);

    let (state, effects) = update(state, Msg::StartRequested(params()));
    assert_eq!(*state.job(), JobState::Starting);
    assert!(matches!(effects[..], [Effect::SendStart { epoch: 3, .. }]));
}

#[test]
fn rejected_input_only_sets_a_notice() {
    init_logging();
    let err = JobParameters::new("", "Leeds", None)
        .validate(&LimitBounds::default())
        .unwrap_err();
    let StartError::InvalidInput(text) = err else {
        panic!("expected InvalidInput");
    };

    let (mut state, effects) = update(MonitorState::new(), Msg::InputRejected(text.clone()));

    assert!(effects.is_empty());
    assert_eq!(*state.job(), JobState::Idle);
    assert_eq!(state.view().notice, Some(text));
    assert!(state.consume_dirty());
}

#[test]
fn stop_is_noop_outside_busy_states() {
    init_logging();
    let (state, effects) = update(MonitorState::new(), Msg::StopRequested);
    assert!(effects.is_empty());
    assert_eq!(*state.job(), JobState::Idle);
    assert_eq!(state.epoch(), 0);
}

#[test]
fn reset_always_returns_to_idle_and_notifies() {
    init_logging();
    let (state, _) = update(MonitorState::new(), Msg::StartRequested(params()));
    let (state, _) = update(
        state,
        Msg::StartFailed {
            epoch: 1,
            error: StartError::unreachable(),
        },
    );

    let (state, effects) = update(state, Msg::ResetRequested);

    assert_eq!(*state.job(), JobState::Idle);
    assert_eq!(effects, vec![Effect::StopPolling, Effect::NotifyReset]);
}
