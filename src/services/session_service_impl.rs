//! `SeaORM` implementation of the `SessionService` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::info;

use crate::db::Store;
use crate::domain::events::LabEvent;
use crate::domain::{clock, session};
use crate::entities::session_logs;
use crate::services::access::Actor;
use crate::services::session_service::{
    Attendance, SessionError, SessionService, SessionView, StartSession,
};

pub struct SeaOrmSessionService {
    store: Store,
    event_bus: broadcast::Sender<LabEvent>,
}

impl SeaOrmSessionService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<LabEvent>) -> Self {
        Self { store, event_bus }
    }
}

#[async_trait]
impl SessionService for SeaOrmSessionService {
    async fn list(
        &self,
        actor: &Actor,
        user_id: Option<&str>,
    ) -> Result<Vec<SessionView>, SessionError> {
        let rows = self.store.sessions().list(&actor.scope(), user_id).await?;

        let computers: HashMap<String, String> = self
            .store
            .computers()
            .labels()
            .await?
            .into_iter()
            .map(|(id, _, name)| (id, name))
            .collect();

        let mut user_ids: Vec<String> = rows.iter().map(|s| s.user_id.clone()).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let names = self.store.profiles().names_for(&user_ids).await?;

        Ok(rows
            .into_iter()
            .map(|session| SessionView {
                computer_name: computers.get(&session.computer_id).cloned(),
                user_name: names.get(&session.user_id).cloned(),
                session,
            })
            .collect())
    }

    async fn start(
        &self,
        actor: &Actor,
        request: StartSession,
    ) -> Result<session_logs::Model, SessionError> {
        actor.require_staff()?;

        if !self.store.computers().exists(&request.computer_id).await? {
            return Err(SessionError::Validation(format!(
                "Unknown computer: {}",
                request.computer_id
            )));
        }
        if self.store.profiles().get(&request.user_id).await?.is_none() {
            return Err(SessionError::Validation(format!(
                "Unknown user: {}",
                request.user_id
            )));
        }

        let started = self
            .store
            .sessions()
            .start(&request.computer_id, &request.user_id, &clock::now_stamp())
            .await?;

        info!(
            event = "session_started",
            session_id = %started.id,
            computer_id = %started.computer_id,
            user_id = %started.user_id,
            "Session started"
        );

        let _ = self.event_bus.send(LabEvent::SessionStarted {
            session_id: started.id.clone(),
            computer_id: started.computer_id.clone(),
            user_id: started.user_id.clone(),
        });

        Ok(started)
    }

    async fn end(&self, actor: &Actor, id: &str) -> Result<session_logs::Model, SessionError> {
        actor.require_staff()?;

        let sessions = self.store.sessions();
        let open = sessions
            .get(id)
            .await?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        if open.logout_time.is_some() {
            return Err(SessionError::AlreadyEnded(id.to_string()));
        }

        let now = Utc::now();
        let minutes = session::duration_minutes(clock::parse_stored(&open.login_time), now);

        if !sessions.end(id, &clock::stamp(now), minutes).await? {
            return Err(SessionError::AlreadyEnded(id.to_string()));
        }

        let ended = sessions
            .get(id)
            .await?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        info!(
            event = "session_ended",
            session_id = %ended.id,
            duration_minutes = minutes,
            "Session ended"
        );

        let _ = self.event_bus.send(LabEvent::SessionEnded {
            session_id: ended.id.clone(),
            duration_minutes: minutes,
        });

        Ok(ended)
    }

    async fn attendance(&self, actor: &Actor, user_id: &str) -> Result<Attendance, SessionError> {
        actor.require_owner_or_staff(user_id)?;

        let sessions = self
            .store
            .sessions()
            .list(&actor.scope(), Some(user_id))
            .await?;

        let samples: Vec<_> = sessions
            .iter()
            .map(|s| (clock::parse_stored(&s.login_time), s.duration_minutes))
            .collect();

        Ok(Attendance {
            user_id: user_id.to_string(),
            stats: session::attendance(&samples, Utc::now()),
            sessions,
        })
    }
}
