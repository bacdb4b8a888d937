use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::types::{EventKind, SessionEvent};

pub type EventHandler = Arc<dyn Fn(&SessionEvent) -> anyhow::Result<()> + Send + Sync>;

/// Per-session handler table, at most one handler per kind. A failing or
/// panicking handler is logged and never reaches the stream.
#[derive(Default)]
pub(crate) struct EventDispatcher {
    handlers: Mutex<HashMap<EventKind, EventHandler>>,
}

impl EventDispatcher {
    pub(crate) fn on(&self, kind: EventKind, handler: EventHandler) {
        let replaced = self.lock().insert(kind.clone(), handler).is_some();
        if replaced {
            tracing::debug!(kind = %kind, "replaced event handler");
        }
    }

    /// Runs the kind-specific handler, then the `Any` handler.
    pub(crate) fn dispatch(&self, session_id: &str, event: &SessionEvent) {
        let kind = event.kind();
        let (specific, any) = {
            let handlers = self.lock();
            (handlers.get(&kind).cloned(), handlers.get(&EventKind::Any).cloned())
        };

        if let Some(handler) = specific {
            invoke(session_id, &kind, &handler, event);
        }
        if let Some(handler) = any {
            invoke(session_id, &kind, &handler, event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EventKind, EventHandler>> {
        self.handlers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn invoke(session_id: &str, kind: &EventKind, handler: &EventHandler, event: &SessionEvent) {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(session_id, kind = %kind, "event handler failed: {:#}", e),
        Err(_) => tracing::error!(session_id, kind = %kind, "event handler panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn other(name: &str) -> SessionEvent {
        SessionEvent::Other {
            event_type: name.to_string(),
            payload: json!({}),
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> EventHandler {
        let log = log.clone();
        Arc::new(move |event: &SessionEvent| -> anyhow::Result<()> {
            log.lock().unwrap().push(format!("{}:{}", tag, event.kind()));
            Ok(())
        })
    }

    #[test]
    fn specific_handler_runs_before_any() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = EventDispatcher::default();
        dispatcher.on(EventKind::Any, recorder(&log, "any"));
        dispatcher.on(EventKind::Other("usageEvent".into()), recorder(&log, "usage"));

        dispatcher.dispatch("s-1", &other("usageEvent"));
        dispatcher.dispatch("s-1", &other("completionStart"));

        assert_eq!(
            *log.lock().unwrap(),
            ["usage:usageEvent", "any:usageEvent", "any:completionStart"]
        );
    }

    #[test]
    fn failing_handlers_are_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = EventDispatcher::default();
        dispatcher.on(
            EventKind::Error,
            Arc::new(|_: &SessionEvent| -> anyhow::Result<()> { panic!("handler bug") }),
        );
        dispatcher.on(
            EventKind::StreamComplete,
            Arc::new(|_: &SessionEvent| -> anyhow::Result<()> {
                Err(anyhow::anyhow!("socket gone"))
            }),
        );
        dispatcher.on(EventKind::Any, recorder(&log, "any"));

        let error =
            SessionEvent::Error(crate::types::events::ErrorEvent::new("responseStream", "boom"));
        dispatcher.dispatch("s-1", &error);
        dispatcher.dispatch("s-1", &SessionEvent::StreamComplete { timestamp: "now".into() });

        assert_eq!(*log.lock().unwrap(), ["any:error", "any:streamComplete"]);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = EventDispatcher::default();
        dispatcher.on(EventKind::Other("x".into()), recorder(&log, "first"));
        dispatcher.on(EventKind::Other("x".into()), recorder(&log, "second"));
        dispatcher.dispatch("s-1", &other("x"));
        assert_eq!(*log.lock().unwrap(), ["second:x"]);
    }
}
