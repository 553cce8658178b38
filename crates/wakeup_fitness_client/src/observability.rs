use serde::Serialize;

use crate::HealthDataSource;

/// Counter of aggregator queries, labelled by `query` and `outcome`.
pub const QUERIES_TOTAL: &str = "wakeup_fitness_queries_total";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryKind {
    Steps,
    Sleep,
}

impl QueryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Steps => "steps",
            QueryKind::Sleep => "sleep",
        }
    }
}

pub fn record_query(kind: QueryKind, ok: bool) {
    let outcome = if ok { "ok" } else { "unavailable" };
    metrics::counter!(QUERIES_TOTAL, "query" => kind.as_str(), "outcome" => outcome).increment(1);
}

/// Body of the `/health` route.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Health {
    /// Liveness constant: always `true` when the process can answer at all.
    pub ready: bool,
    /// Whether fitness figures can be produced. The only field that varies.
    pub session: bool,
}

impl Health {
    pub fn probe(source: &dyn HealthDataSource) -> Self {
        Self {
            ready: true,
            session: source.has_session(),
        }
    }
}
