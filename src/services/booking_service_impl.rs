//! `SeaORM` implementation of the `BookingService` trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::{limits::MAX_TEXT_LENGTH, notification_kinds};
use crate::db::Store;
use crate::db::repositories::booking::NewBooking;
use crate::db::repositories::notification::Message;
use crate::domain::booking::{OverlapPolicy, can_transition, validate_window};
use crate::domain::events::LabEvent;
use crate::domain::{BookingStatus, clock};
use crate::entities::bookings;
use crate::services::access::Actor;
use crate::services::booking_service::{
    BookingCreated, BookingError, BookingRequest, BookingService, BookingView,
};

pub struct SeaOrmBookingService {
    store: Store,
    config: Arc<RwLock<Config>>,
    event_bus: broadcast::Sender<LabEvent>,
    /// Held across the reject-policy check and insert. `SQLite` cannot upgrade
    /// two deferred transactions to writers at once.
    reject_lock: Mutex<()>,
}

impl SeaOrmBookingService {
    #[must_use]
    pub fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<LabEvent>,
    ) -> Self {
        Self {
            store,
            config,
            event_bus,
            reject_lock: Mutex::new(()),
        }
    }

    async fn computer_label(&self, computer_id: &str) -> String {
        match self.store.computers().get(computer_id).await {
            Ok(Some(c)) => format!("{} ({})", c.name, c.system_id),
            _ => computer_id.to_string(),
        }
    }

    async fn notify_staff_of_overlap(&self, booking: &bookings::Model, conflicts: &[String]) {
        let computer = self.computer_label(&booking.computer_id).await;
        let msg = Message {
            kind: notification_kinds::BOOKING.to_string(),
            title: "Booking conflict needs review".to_string(),
            message: format!(
                "A booking on {computer} from {} to {} overlaps {} existing booking(s).",
                booking.start_time,
                booking.end_time,
                conflicts.len()
            ),
            link: Some("/bookings".to_string()),
        };

        let result = async {
            let staff = self.store.profiles().staff_ids().await?;
            self.store.notifications().send_many(&staff, &msg).await
        }
        .await;

        match result {
            Ok(count) => {
                let _ = self.event_bus.send(LabEvent::NotificationsSent { count });
            }
            Err(e) => warn!(error = %e, booking_id = %booking.id, "Failed to notify staff of booking overlap"),
        }
    }

    async fn notify_owner(&self, booking: &bookings::Model) {
        let computer = self.computer_label(&booking.computer_id).await;
        let msg = Message {
            kind: notification_kinds::BOOKING.to_string(),
            title: format!("Booking {}", booking.status),
            message: format!(
                "Your booking for {computer} starting {} is now {}.",
                booking.start_time, booking.status
            ),
            link: Some("/bookings".to_string()),
        };

        if let Err(e) = self.store.notifications().send(&booking.user_id, &msg).await {
            warn!(error = %e, booking_id = %booking.id, "Failed to notify booking owner");
        }
    }
}

#[async_trait]
impl BookingService for SeaOrmBookingService {
    async fn list(
        &self,
        actor: &Actor,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingView>, BookingError> {
        let rows = self.store.bookings().list(&actor.scope(), status).await?;

        let computers: HashMap<String, (String, String)> = self
            .store
            .computers()
            .labels()
            .await?
            .into_iter()
            .map(|(id, system_id, name)| (id, (system_id, name)))
            .collect();

        let mut user_ids: Vec<String> = rows.iter().map(|b| b.user_id.clone()).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let names = self.store.profiles().names_for(&user_ids).await?;

        Ok(rows
            .into_iter()
            .map(|booking| {
                let computer = computers.get(&booking.computer_id);
                BookingView {
                    computer_name: computer.map(|(_, name)| name.clone()),
                    computer_system_id: computer.map(|(system_id, _)| system_id.clone()),
                    user_name: names.get(&booking.user_id).cloned(),
                    booking,
                }
            })
            .collect())
    }

    async fn get(&self, actor: &Actor, id: &str) -> Result<bookings::Model, BookingError> {
        let booking = self
            .store
            .bookings()
            .get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(id.to_string()))?;

        // Other users' bookings are reported as missing
        if !actor.scope().permits(&booking.user_id) {
            return Err(BookingError::NotFound(id.to_string()));
        }

        Ok(booking)
    }

    async fn create(
        &self,
        actor: &Actor,
        request: BookingRequest,
    ) -> Result<BookingCreated, BookingError> {
        let start = clock::parse(&request.start_time).map_err(BookingError::Validation)?;
        let end = clock::parse(&request.end_time).map_err(BookingError::Validation)?;
        validate_window(start, end).map_err(BookingError::Validation)?;

        let purpose = request
            .purpose
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if purpose.as_ref().is_some_and(|p| p.len() > MAX_TEXT_LENGTH) {
            return Err(BookingError::Validation(format!(
                "Purpose must be {MAX_TEXT_LENGTH} characters or less"
            )));
        }

        if !self.store.computers().exists(&request.computer_id).await? {
            return Err(BookingError::ComputerNotFound(request.computer_id));
        }

        let new_booking = NewBooking {
            computer_id: request.computer_id,
            user_id: actor.user_id.clone(),
            start_time: clock::stamp(start),
            end_time: clock::stamp(end),
            purpose,
        };

        let policy = self.config.read().await.booking.overlap_policy;
        let bookings = self.store.bookings();

        let (booking, conflicts) = match policy {
            OverlapPolicy::Reject => {
                let _guard = self.reject_lock.lock().await;
                match bookings.create_exclusive(new_booking).await? {
                    Ok(booking) => (booking, Vec::new()),
                    Err(conflicts) => {
                        return Err(BookingError::Overlap {
                            conflicts: conflicts.into_iter().map(|b| b.id).collect(),
                        });
                    }
                }
            }
            OverlapPolicy::Warn | OverlapPolicy::StaffReview => {
                let conflicts: Vec<String> = bookings
                    .overlapping(
                        &new_booking.computer_id,
                        &new_booking.start_time,
                        &new_booking.end_time,
                    )
                    .await?
                    .into_iter()
                    .map(|b| b.id)
                    .collect();
                (bookings.create(new_booking).await?, conflicts)
            }
        };

        if policy == OverlapPolicy::StaffReview && !conflicts.is_empty() {
            self.notify_staff_of_overlap(&booking, &conflicts).await;
        }

        metrics::counter!("bookings_created_total").increment(1);
        info!(
            event = "booking_created",
            booking_id = %booking.id,
            computer_id = %booking.computer_id,
            user_id = %booking.user_id,
            conflicts = conflicts.len(),
            "Booking created"
        );

        let _ = self.event_bus.send(LabEvent::BookingCreated {
            booking_id: booking.id.clone(),
            computer_id: booking.computer_id.clone(),
            user_id: booking.user_id.clone(),
            conflicts: conflicts.len(),
        });

        Ok(BookingCreated { booking, conflicts })
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: &str,
        to: BookingStatus,
    ) -> Result<bookings::Model, BookingError> {
        actor.require_staff()?;

        let booking = self
            .store
            .bookings()
            .get(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(id.to_string()))?;

        if !can_transition(booking.status, to) {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to,
            });
        }

        let from = booking.status;
        let updated = self.store.bookings().set_status(booking, to).await?;

        info!(
            event = "booking_status_changed",
            booking_id = %updated.id,
            from = %from,
            to = %to,
            actor_id = %actor.user_id,
            "Booking status changed"
        );

        self.notify_owner(&updated).await;

        let _ = self.event_bus.send(LabEvent::BookingStatusChanged {
            booking_id: updated.id.clone(),
            status: to,
        });

        Ok(updated)
    }
}
