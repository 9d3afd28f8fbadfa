use crate::alarm::AlarmState;

/// Operating mode. Detection and alerting only run while `Armed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    Armed,
}

impl Mode {
    pub fn is_armed(self) -> bool {
        matches!(self, Mode::Armed)
    }

    fn toggled(self) -> Self {
        match self {
            Mode::Idle => Mode::Armed,
            Mode::Armed => Mode::Idle,
        }
    }
}

/// Operator input polled once per cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Toggle,
    Quit,
    Other(char),
}

impl Key {
    pub fn from_char(c: char) -> Self {
        match c {
            't' => Key::Toggle,
            'q' => Key::Quit,
            other => Key::Other(other),
        }
    }
}

/// Whether the loop keeps going after this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Idle/Armed state machine with a terminal quit.
#[derive(Clone, Debug, Default)]
pub struct ModeController {
    terminated: bool,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Apply one polled key to `state`.
    ///
    /// Toggling resets the counter in both directions. Quit disarms, resets, and
    /// latches: every later call returns `Quit` without touching `state`.
    pub fn handle(&mut self, state: &mut AlarmState, key: Option<Key>) -> Control {
        if self.terminated {
            return Control::Quit;
        }
        match key {
            Some(Key::Toggle) => {
                state.mode = state.mode.toggled();
                state.counter.reset();
                log::info!("mode -> {:?} (counter reset)", state.mode);
                Control::Continue
            }
            Some(Key::Quit) => {
                state.mode = Mode::Idle;
                state.counter.reset();
                self.terminated = true;
                log::info!("quit requested; disarmed");
                Control::Quit
            }
            Some(Key::Other(_)) | None => Control::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_counter(mode: Mode, value: u32) -> AlarmState {
        let mut state = AlarmState::new();
        state.mode = mode;
        for _ in 0..value {
            state.counter.step(true);
        }
        state
    }

    #[test]
    fn starts_idle() {
        assert_eq!(AlarmState::new().mode, Mode::Idle);
    }

    #[test]
    fn toggle_resets_counter_in_both_directions() {
        let mut modes = ModeController::new();

        let mut state = state_with_counter(Mode::Idle, 4);
        assert_eq!(modes.handle(&mut state, Some(Key::Toggle)), Control::Continue);
        assert_eq!(state.mode, Mode::Armed);
        assert_eq!(state.counter.value(), 0);

        let mut state = state_with_counter(Mode::Armed, 7);
        modes.handle(&mut state, Some(Key::Toggle));
        assert_eq!(state.mode, Mode::Idle);
        assert_eq!(state.counter.value(), 0);
    }

    #[test]
    fn quit_disarms_and_latches() {
        let mut modes = ModeController::new();
        let mut state = state_with_counter(Mode::Armed, 3);
        assert_eq!(modes.handle(&mut state, Some(Key::Quit)), Control::Quit);
        assert_eq!(state.mode, Mode::Idle);
        assert_eq!(state.counter.value(), 0);
        assert!(modes.is_terminated());

        assert_eq!(modes.handle(&mut state, Some(Key::Toggle)), Control::Quit);
        assert_eq!(state.mode, Mode::Idle);
    }

    #[test]
    fn quit_from_idle_terminates() {
        let mut modes = ModeController::new();
        let mut state = state_with_counter(Mode::Idle, 5);
        assert_eq!(modes.handle(&mut state, Some(Key::Quit)), Control::Quit);
        assert_eq!(state.mode, Mode::Idle);
        assert_eq!(state.counter.value(), 0);
        assert!(modes.is_terminated());
        assert_eq!(modes.handle(&mut state, None), Control::Quit);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut modes = ModeController::new();
        let mut state = state_with_counter(Mode::Armed, 2);
        assert_eq!(
            modes.handle(&mut state, Some(Key::from_char('x'))),
            Control::Continue
        );
        assert_eq!(modes.handle(&mut state, None), Control::Continue);
        assert_eq!(state.mode, Mode::Armed);
        assert_eq!(state.counter.value(), 2);
    }

    #[test]
    fn key_mapping() {
        assert_eq!(Key::from_char('t'), Key::Toggle);
        assert_eq!(Key::from_char('q'), Key::Quit);
        assert_eq!(Key::from_char('T'), Key::Other('T'));
    }
}
