use axum::{
    Extension, Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::{self, Stream};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::domain::events::LabEvent;
use crate::services::access::{Actor, Scope};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(lab_events))
}

/// Staff follow the whole lab. Students only hear about their own bookings
/// and sessions.
fn visible_to(scope: &Scope, event: &LabEvent) -> bool {
    match scope {
        Scope::All => true,
        Scope::Own(user_id) => event.subject() == Some(user_id.as_str()),
    }
}

fn to_sse(event: &LabEvent) -> Event {
    match Event::default().json_data(event) {
        Ok(sse) => sse,
        Err(e) => Event::default().event("error").data(e.to_string()),
    }
}

/// GET /events
async fn lab_events(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Actor>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_bus().subscribe();
    let scope = actor.scope();
    debug!(user_id = %actor.user_id, "Event stream opened");

    let stream = stream::unfold((rx, scope), |(mut rx, scope)| async move {
        loop {
            match rx.recv().await {
                Ok(event) if visible_to(&scope, &event) => {
                    return Some((Ok(to_sse(&event)), (rx, scope)));
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(event = "sse_lagged", missed, "Event stream fell behind the bus");
                    let notice = Event::default()
                        .event("lagged")
                        .data(format!("{missed} events dropped"));
                    return Some((Ok(notice), (rx, scope)));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_students_only_see_events_about_themselves() {
        let own = Scope::Own("u-1".to_string());
        let mine = LabEvent::SessionStarted {
            session_id: "s-1".to_string(),
            computer_id: "c-1".to_string(),
            user_id: "u-1".to_string(),
        };
        let theirs = LabEvent::BookingCreated {
            booking_id: "b-1".to_string(),
            computer_id: "c-1".to_string(),
            user_id: "u-2".to_string(),
            conflicts: 0,
        };
        let lab_wide = LabEvent::IssuesPurged { deleted: 3 };

        assert!(visible_to(&own, &mine));
        assert!(!visible_to(&own, &theirs));
        assert!(!visible_to(&own, &lab_wide));

        assert!(visible_to(&Scope::All, &theirs));
        assert!(visible_to(&Scope::All, &lab_wide));
    }
}
