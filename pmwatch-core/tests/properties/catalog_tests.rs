//! Property tests for the command catalog's injection defense

use proptest::prelude::*;

use pmwatch_core::catalog::{control_command, validate_identifier, validate_log_path};
use pmwatch_core::{ControlAction, ControlTarget, MonitorError};

const SHELL_METACHARACTERS: &[char] = &[
    ';', '|', '&', '$', '`', '"', '\'', '(', ')', '{', '}', '<', '>', '*', '?', '!', '~', '\\',
    '\n', '\r', '\t', ' ', '#',
];

proptest! {
    /// Property: names from the safe alphabet always validate
    #[test]
    fn safe_names_accepted(name in "[a-zA-Z0-9._-]{1,64}") {
        prop_assert!(validate_identifier(&name).is_ok());
    }

    /// Property: any single shell metacharacter poisons the whole name
    #[test]
    fn metacharacter_anywhere_rejects(
        prefix in "[a-zA-Z0-9._-]{0,20}",
        suffix in "[a-zA-Z0-9._-]{0,20}",
        meta_idx in 0usize..22,
    ) {
        let meta = SHELL_METACHARACTERS[meta_idx % SHELL_METACHARACTERS.len()];
        let name = format!("{prefix}{meta}{suffix}");
        prop_assert!(validate_identifier(&name).is_err());
    }

    /// Property: a rejected name never produces a command string
    #[test]
    fn rejected_names_never_reach_commands(
        prefix in "[a-zA-Z0-9._-]{0,10}",
        payload in "; rm -rf /|\\$\\(reboot\\)|`halt`|&& true",
    ) {
        let hostile = format!("{prefix}{payload}");
        let result = control_command(ControlAction::Stop, &ControlTarget::Name(hostile));
        prop_assert!(matches!(result, Err(MonitorError::InvalidIdentifier(_))));
    }

    /// Property: numeric ids are always dispatchable
    #[test]
    fn id_targets_always_valid(id in 0i64..100_000, action_idx in 0usize..3) {
        let action = [ControlAction::Start, ControlAction::Stop, ControlAction::Restart][action_idx];
        let command = control_command(action, &ControlTarget::Id(id)).expect("id target");
        prop_assert!(command.starts_with("pm2 "));
        prop_assert!(command.ends_with(&id.to_string()));
    }

    /// Property: quote-breaking characters never survive path validation
    #[test]
    fn quote_breakers_rejected_in_paths(
        stem in "/[a-zA-Z0-9/._-]{0,30}",
        breaker_idx in 0usize..5,
    ) {
        let breaker = ['"', '$', '`', '\\', '\n'][breaker_idx % 5];
        let path = format!("{stem}{breaker}tail.log");
        prop_assert!(validate_log_path(&path).is_err());
    }
}
