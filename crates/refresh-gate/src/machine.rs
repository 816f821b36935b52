//! Refresh state machine using rust-fsm.
//!
//! The machine makes the per-context refresh lifecycle explicit instead of
//! deriving it from a pile of booleans:
//!
//! ```text
//! Idle ──Begin──► InFlight ──Succeed──► Idle
//!                    │
//!                  Fail
//!                    ▼
//!                 Latched ──Reset──► Idle
//! ```
//!
//! `Latched` is sticky on purpose: once a refresh fails, every further
//! attempt in this context is rejected without a network call until an
//! explicit reset after a fresh login.

use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_machine(Idle)

    Idle => {
        Begin => InFlight
    },
    InFlight => {
        Succeed => Idle,
        Fail => Latched
    },
    Latched => {
        Reset => Idle
    }
}

// Re-export the generated types with clearer names
pub use refresh_machine::Input as RefreshMachineInput;
pub use refresh_machine::State as RefreshMachineState;
pub use refresh_machine::StateMachine as RefreshMachine;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_idle() {
        let machine = RefreshMachine::new();
        assert_eq!(*machine.state(), RefreshMachineState::Idle);
    }

    #[test]
    fn success_returns_to_idle() {
        let mut machine = RefreshMachine::new();
        machine.consume(&RefreshMachineInput::Begin).unwrap();
        assert_eq!(*machine.state(), RefreshMachineState::InFlight);

        machine.consume(&RefreshMachineInput::Succeed).unwrap();
        assert_eq!(*machine.state(), RefreshMachineState::Idle);
    }

    #[test]
    fn failure_latches_until_reset() {
        let mut machine = RefreshMachine::new();
        machine.consume(&RefreshMachineInput::Begin).unwrap();
        machine.consume(&RefreshMachineInput::Fail).unwrap();
        assert_eq!(*machine.state(), RefreshMachineState::Latched);

        // A latched machine cannot begin another refresh.
        assert!(machine.consume(&RefreshMachineInput::Begin).is_err());

        machine.consume(&RefreshMachineInput::Reset).unwrap();
        assert_eq!(*machine.state(), RefreshMachineState::Idle);
    }

    #[test]
    fn idle_cannot_succeed_or_fail() {
        let mut machine = RefreshMachine::new();
        assert!(machine.consume(&RefreshMachineInput::Succeed).is_err());
        assert!(machine.consume(&RefreshMachineInput::Fail).is_err());
    }
}
