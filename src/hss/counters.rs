//! The metrics counters adapter (§6): a fixed, route-scoped counter set fed
//! from every handler decision edge. Out of scope as a full system (no SNMP
//! exporter is built here) but the trait and an in-memory reference adapter
//! are carried so the handlers' counter-increment calls are real code, not a
//! stub.

use std::collections::HashMap;
use std::sync::Mutex;

/// The four S6a routes this HSS counts requests/answers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Air,
    Ulr,
    Pur,
    Nor,
}

impl Route {
    fn name(&self) -> &'static str {
        match self {
            Route::Air => "air",
            Route::Ulr => "ulr",
            Route::Pur => "pur",
            Route::Nor => "nor",
        }
    }
}

/// The answer kind a route's counter names after `:num_answers:` (§6, §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerKind {
    Success,
    MissingAvp,
    InvalidAvpValue,
    UserUnknown,
    UnknownServingNode,
    AuthenticationDataUnavailable,
    RatNotAllowed,
    RoamingNotAllowed,
    RealmNotServed,
    UnknownEpsSubscription,
}

impl AnswerKind {
    fn name(&self) -> &'static str {
        match self {
            AnswerKind::Success => "success",
            AnswerKind::MissingAvp => "missing_avp",
            AnswerKind::InvalidAvpValue => "invalid_avp_value",
            AnswerKind::UserUnknown => "user_unknown",
            AnswerKind::UnknownServingNode => "unknown_serving_node",
            AnswerKind::AuthenticationDataUnavailable => "authentication_data_unavailable",
            AnswerKind::RatNotAllowed => "rat_not_allowed",
            AnswerKind::RoamingNotAllowed => "roaming_not_allowed",
            AnswerKind::RealmNotServed => "realm_not_served",
            AnswerKind::UnknownEpsSubscription => "unknown_eps_subscription",
        }
    }
}

/// Increments a named counter. A real backend's `incr` is specified to
/// swallow its own errors and log them (§6) — a missing or unreachable
/// counter store must never fail a request.
pub trait Counters: Send + Sync {
    fn incr(&self, name: &str);

    fn incr_request(&self, route: Route) {
        self.incr(&format!("{}:num_requests", route.name()));
    }

    fn incr_answer(&self, route: Route, kind: AnswerKind) {
        self.incr(&format!("{}:num_answers:{}", route.name(), kind.name()));
    }
}

/// An in-memory reference adapter, used by local runs and the handler test
/// suite. Never fails `incr`, so it never needs the log-and-swallow path a
/// real backend would.
#[derive(Debug, Default)]
pub struct InMemoryCounters {
    counts: Mutex<HashMap<String, u64>>,
}

impl InMemoryCounters {
    pub fn new() -> InMemoryCounters {
        InMemoryCounters::default()
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counts.lock().unwrap().get(name).copied().unwrap_or(0)
    }
}

impl Counters for InMemoryCounters {
    fn incr(&self, name: &str) {
        *self.counts.lock().unwrap().entry(name.to_string()).or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incr_request_and_answer() {
        let counters = InMemoryCounters::new();
        counters.incr_request(Route::Air);
        counters.incr_request(Route::Air);
        counters.incr_answer(Route::Air, AnswerKind::Success);

        assert_eq!(counters.get("air:num_requests"), 2);
        assert_eq!(counters.get("air:num_answers:success"), 1);
        assert_eq!(counters.get("air:num_answers:user_unknown"), 0);
    }
}
