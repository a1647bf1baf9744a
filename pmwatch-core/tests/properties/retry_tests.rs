//! Property tests for reconnection backoff

use std::time::Duration;

use proptest::prelude::*;

use pmwatch_core::RetryConfig;

/// Strategy for generating valid retry configurations
fn retry_config_strategy() -> impl Strategy<Value = RetryConfig> {
    (
        0u32..10,          // max_attempts
        100u64..10_000,    // initial_delay_ms
        1_000u64..120_000, // max_delay_ms
        1.0f64..5.0,       // backoff_multiplier
    )
        .prop_map(
            |(max_attempts, initial_delay_ms, max_delay_ms, backoff_multiplier)| {
                RetryConfig::new()
                    .with_max_attempts(max_attempts)
                    .with_initial_delay_ms(initial_delay_ms)
                    .with_max_delay_ms(max_delay_ms.max(initial_delay_ms))
                    .with_backoff_multiplier(backoff_multiplier)
            },
        )
}

proptest! {
    /// Property: delay never exceeds the configured cap
    #[test]
    fn delay_never_exceeds_max(
        config in retry_config_strategy(),
        attempt in 0u32..20,
    ) {
        if let Some(delay) = config.delay_for_attempt(attempt) {
            prop_assert!(delay.as_millis() <= u128::from(config.max_delay_ms));
        }
    }

    /// Property: delays are non-decreasing across attempts
    #[test]
    fn delays_non_decreasing(config in retry_config_strategy()) {
        let mut prev = Duration::ZERO;
        for attempt in 0..config.max_attempts.min(10) {
            if let Some(delay) = config.delay_for_attempt(attempt) {
                prop_assert!(delay >= prev, "delay decreased at attempt {}", attempt);
                prev = delay;
            }
        }
    }

    /// Property: exactly max_attempts delays exist, then None forever
    #[test]
    fn attempts_are_bounded(config in retry_config_strategy(), beyond in 0u32..10) {
        for attempt in 0..config.max_attempts {
            prop_assert!(config.delay_for_attempt(attempt).is_some());
        }
        prop_assert!(config.delay_for_attempt(config.max_attempts + beyond).is_none());
    }

    /// Property: the first delay is the configured initial delay (capped)
    #[test]
    fn first_delay_is_initial(config in retry_config_strategy()) {
        if config.max_attempts > 0 {
            let expected = config.initial_delay_ms.min(config.max_delay_ms);
            prop_assert_eq!(
                config.delay_for_attempt(0),
                Some(Duration::from_millis(expected))
            );
        }
    }
}
