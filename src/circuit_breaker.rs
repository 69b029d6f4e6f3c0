use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Breaker type shared by every enrichment call.
pub type EnrichmentBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Creates the circuit breaker placed in front of the enrichment provider.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures trigger the OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before a trial call is let through.
///
/// While open, `call` resolves to `failsafe::Error::Rejected` without touching the provider and
/// the enricher passes the lead through unchanged.
///
/// # Example
///
/// ```rust
/// use leadflow_api::circuit_breaker::create_enrichment_circuit_breaker;
/// use failsafe::futures::CircuitBreaker;
///
/// # async fn demo() {
/// let breaker = create_enrichment_circuit_breaker();
/// let result = breaker.call(async { Ok::<_, ()>("snapshot") }).await;
/// assert!(result.is_ok());
/// # }
/// ```
pub fn create_enrichment_circuit_breaker() -> EnrichmentBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
