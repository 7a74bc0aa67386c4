//! The in-progress session: current state, the field being typed and the stage deadline.

use std::time::{Duration, Instant};
use matecash_gpio::keypad::KeypadKey;

/// Default deadline of an input stage.
pub const INPUT_TIMEOUT: Duration = Duration::from_secs(20);

/// States of the transaction state machine. The machine starts in [State::EnterId] and never
/// terminates, every session end leads back there.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum State {
    #[default]
    EnterId,
    EnterPassword,
    LoggedIn,
    CheckBalance,
    WithdrawMenu,
    ChangePassword,
    /// Waiting for the new password to be typed a second time.
    ConfirmPassword {
        pending: String,
    },
}

impl State {
    /// Name for the transcript. Unlike `Debug`, never includes a pending password.
    pub fn name(&self) -> &'static str {
        match self {
            State::EnterId => "EnterId",
            State::EnterPassword => "EnterPassword",
            State::LoggedIn => "LoggedIn",
            State::CheckBalance => "CheckBalance",
            State::WithdrawMenu => "WithdrawMenu",
            State::ChangePassword => "ChangePassword",
            State::ConfirmPassword { .. } => "ConfirmPassword",
        }
    }
}

/// Result of feeding a key into a fixed-length digit field.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FieldInput {
    /// The key isn't a digit and was ignored.
    Ignored,
    /// The digit was appended, the field isn't full yet.
    Partial,
    /// The digit was appended and completed the field.
    Complete,
}

#[derive(Debug)]
pub struct Session {
    pub state: State,
    /// Characters typed so far for the current field.
    pub input: String,
    /// Index of the account in the directory, once an identifier was accepted.
    pub account: Option<usize>,
    /// When the current input stage began.
    pub stage_started: Instant,
}

impl Session {
    pub fn new(now: Instant) -> Self {
        Session {
            state: State::EnterId,
            input: String::new(),
            account: None,
            stage_started: now,
        }
    }

    /// Back to [State::EnterId] with every buffer cleared and no account.
    pub fn reset(&mut self, now: Instant) {
        *self = Session::new(now);
    }

    /// Clears the field buffer and restarts the stage timer.
    pub fn restart_stage(&mut self, now: Instant) {
        self.input.clear();
        self.stage_started = now;
    }

    /// Appends `key` to a digit field of `length` characters. Anything but a digit is ignored, as is
    /// anything past the field length.
    pub fn push_digit(&mut self, key: KeypadKey, length: usize) -> FieldInput {
        if key.digit().is_none() || self.input.len() >= length {
            return FieldInput::Ignored;
        }
        self.input.push(key.to_char());
        if self.input.len() == length {
            FieldInput::Complete
        } else {
            FieldInput::Partial
        }
    }

    /// Takes the completed field out of the buffer, leaving it empty.
    pub fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }
}

/// The per-stage deadline.
///
/// Only [State::EnterPassword] is timed by default. With `all_input_stages`, identifier entry (once
/// the first digit is in), new password entry and its confirmation are timed too.
#[derive(Copy, Clone, Debug)]
pub struct SessionTimer {
    pub timeout: Duration,
    pub all_input_stages: bool,
}

impl SessionTimer {
    pub fn new(timeout: Duration, all_input_stages: bool) -> Self {
        SessionTimer { timeout, all_input_stages }
    }

    fn applies_to(&self, session: &Session) -> bool {
        match session.state {
            State::EnterPassword => true,
            State::EnterId => self.all_input_stages && !session.input.is_empty(),
            State::ChangePassword | State::ConfirmPassword { .. } => self.all_input_stages,
            State::LoggedIn | State::CheckBalance | State::WithdrawMenu => false,
        }
    }

    /// Whether the session's current stage has run strictly past its deadline.
    pub fn expired(&self, session: &Session, now: Instant) -> bool {
        self.applies_to(session)
            && now.saturating_duration_since(session.stage_started) > self.timeout
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        SessionTimer::new(INPUT_TIMEOUT, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn session_in(state: State, start: Instant) -> Session {
        let mut session = Session::new(start);
        session.state = state;
        session
    }

    #[test]
    fn digit_fields_ignore_other_keys_and_overflow() {
        let mut session = Session::new(Instant::now());
        assert_eq!(session.push_digit(KeypadKey::Key1, 2), FieldInput::Partial);
        assert_eq!(session.push_digit(KeypadKey::KeyA, 2), FieldInput::Ignored);
        assert_eq!(session.push_digit(KeypadKey::KeyHash, 2), FieldInput::Ignored);
        assert_eq!(session.push_digit(KeypadKey::Key2, 2), FieldInput::Complete);
        assert_eq!(session.push_digit(KeypadKey::Key3, 2), FieldInput::Ignored);
        assert_eq!(session.take_input(), "12");
        assert!(session.input.is_empty());
    }

    #[test]
    fn reset_clears_everything() {
        let start = Instant::now();
        let mut session = session_in(State::ConfirmPassword { pending: "9999".into() }, start);
        session.input.push_str("12");
        session.account = Some(3);

        let later = start + Duration::from_secs(3);
        session.reset(later);

        assert_eq!(session.state, State::EnterId);
        assert!(session.input.is_empty());
        assert_eq!(session.account, None);
        assert_eq!(session.stage_started, later);
    }

    #[rstest]
    #[case(19_900, false)]
    #[case(20_000, false)]
    #[case(20_001, true)]
    fn password_stage_deadline_is_strict(#[case] elapsed_ms: u64, #[case] expired: bool) {
        let start = Instant::now();
        let session = session_in(State::EnterPassword, start);
        let timer = SessionTimer::default();
        assert_eq!(timer.expired(&session, start + Duration::from_millis(elapsed_ms)), expired);
    }

    #[rstest]
    #[case(State::EnterId, false, false)]
    #[case(State::LoggedIn, false, false)]
    #[case(State::ChangePassword, false, false)]
    #[case(State::ChangePassword, true, true)]
    #[case(State::ConfirmPassword { pending: "1111".into() }, true, true)]
    #[case(State::CheckBalance, true, false)]
    fn other_stages_are_timed_only_when_enabled(
        #[case] state: State,
        #[case] all_input_stages: bool,
        #[case] expired: bool,
    ) {
        let start = Instant::now();
        let session = session_in(state, start);
        let timer = SessionTimer::new(INPUT_TIMEOUT, all_input_stages);
        assert_eq!(timer.expired(&session, start + Duration::from_secs(60)), expired);
    }

    #[test]
    fn identifier_stage_is_timed_once_typing_started() {
        let start = Instant::now();
        let mut session = session_in(State::EnterId, start);
        let timer = SessionTimer::new(INPUT_TIMEOUT, true);
        let late = start + Duration::from_secs(60);

        assert!(!timer.expired(&session, late));
        session.input.push('1');
        assert!(timer.expired(&session, late));
    }
}
