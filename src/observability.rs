use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("chatgate.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("chatgate.client.request_errors");
pub(crate) static CLIENT_AUTH_EXPIRED: Counter = Counter::new("chatgate.client.auth_expired");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("chatgate.client.request_duration_seconds");

pub(crate) static SESSIONS_CREATED: Counter = Counter::new("chatgate.session.created");
pub(crate) static SESSIONS_RESUMED: Counter = Counter::new("chatgate.session.resumed");
pub(crate) static TOKEN_EXPIRIES: Counter = Counter::new("chatgate.session.token_expiries");

pub(crate) static MESSAGES_SENT: Counter = Counter::new("chatgate.messages.sent");
pub(crate) static MESSAGES_DROPPED: Counter = Counter::new("chatgate.messages.dropped");
pub(crate) static MESSAGES_RENDERED: Counter = Counter::new("chatgate.messages.rendered");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_AUTH_EXPIRED);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSIONS_CREATED);
    collector.register_counter(&SESSIONS_RESUMED);
    collector.register_counter(&TOKEN_EXPIRIES);

    collector.register_counter(&MESSAGES_SENT);
    collector.register_counter(&MESSAGES_DROPPED);
    collector.register_counter(&MESSAGES_RENDERED);
}
