use std::collections::BTreeMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use crate::domain::{BookingStatus, clock};
use crate::entities::{bookings, prelude::*};
use crate::services::access::Scope;

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub computer_id: String,
    pub user_id: String,
    /// Normalised stamps.
    pub start_time: String,
    pub end_time: String,
    pub purpose: Option<String>,
}

fn scoped(scope: &Scope) -> Select<Bookings> {
    let query = Bookings::find();
    match scope.owner() {
        Some(owner) => query.filter(bookings::Column::UserId.eq(owner)),
        None => query,
    }
}

fn active_statuses() -> [BookingStatus; 2] {
    [BookingStatus::Pending, BookingStatus::Confirmed]
}

async fn find_overlapping<C: ConnectionTrait>(
    conn: &C,
    computer_id: &str,
    start_time: &str,
    end_time: &str,
) -> Result<Vec<bookings::Model>> {
    Bookings::find()
        .filter(bookings::Column::ComputerId.eq(computer_id))
        .filter(bookings::Column::Status.is_in(active_statuses()))
        .filter(bookings::Column::StartTime.lt(end_time))
        .filter(bookings::Column::EndTime.gt(start_time))
        .order_by_asc(bookings::Column::StartTime)
        .all(conn)
        .await
        .context("Failed to query overlapping bookings")
}

async fn insert<C: ConnectionTrait>(conn: &C, booking: NewBooking) -> Result<bookings::Model> {
    let now = clock::now_stamp();
    bookings::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        computer_id: Set(booking.computer_id),
        user_id: Set(booking.user_id),
        start_time: Set(booking.start_time),
        end_time: Set(booking.end_time),
        purpose: Set(booking.purpose),
        status: Set(BookingStatus::Pending),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
    .context("Failed to insert booking")
}

pub struct BookingRepository {
    conn: DatabaseConnection,
}

impl BookingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        scope: &Scope,
        status: Option<BookingStatus>,
    ) -> Result<Vec<bookings::Model>> {
        let mut query = scoped(scope).order_by_desc(bookings::Column::StartTime);
        if let Some(status) = status {
            query = query.filter(bookings::Column::Status.eq(status));
        }
        query
            .all(&self.conn)
            .await
            .context("Failed to list bookings")
    }

    pub async fn get(&self, id: &str) -> Result<Option<bookings::Model>> {
        Bookings::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query booking")
    }

    /// Active bookings on the computer whose window intersects `[start, end)`.
    pub async fn overlapping(
        &self,
        computer_id: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<Vec<bookings::Model>> {
        find_overlapping(&self.conn, computer_id, start_time, end_time).await
    }

    /// Always inserts with status `pending`.
    pub async fn create(&self, booking: NewBooking) -> Result<bookings::Model> {
        insert(&self.conn, booking).await
    }

    /// Checks for overlaps and inserts inside one transaction. Returns the
    /// overlapping bookings instead of inserting when there are any.
    pub async fn create_exclusive(
        &self,
        booking: NewBooking,
    ) -> Result<Result<bookings::Model, Vec<bookings::Model>>> {
        let txn = self.conn.begin().await?;

        let conflicts = find_overlapping(
            &txn,
            &booking.computer_id,
            &booking.start_time,
            &booking.end_time,
        )
        .await?;
        if !conflicts.is_empty() {
            txn.rollback().await?;
            return Ok(Err(conflicts));
        }

        let created = insert(&txn, booking).await?;
        txn.commit().await?;
        Ok(Ok(created))
    }

    pub async fn set_status(
        &self,
        booking: bookings::Model,
        status: BookingStatus,
    ) -> Result<bookings::Model> {
        let mut active: bookings::ActiveModel = booking.into();
        active.status = Set(status);
        active.updated_at = Set(clock::now_stamp());
        active
            .update(&self.conn)
            .await
            .context("Failed to update booking status")
    }

    /// Active bookings starting within `[from, to]`, soonest first.
    pub async fn starting_between(
        &self,
        scope: &Scope,
        from: &str,
        to: &str,
    ) -> Result<Vec<bookings::Model>> {
        scoped(scope)
            .filter(bookings::Column::Status.is_in(active_statuses()))
            .filter(bookings::Column::StartTime.gte(from))
            .filter(bookings::Column::StartTime.lte(to))
            .order_by_asc(bookings::Column::StartTime)
            .all(&self.conn)
            .await
            .context("Failed to query upcoming bookings")
    }

    pub async fn count(&self, scope: &Scope, status: Option<BookingStatus>) -> Result<u64> {
        let mut query = scoped(scope);
        if let Some(status) = status {
            query = query.filter(bookings::Column::Status.eq(status));
        }
        query
            .count(&self.conn)
            .await
            .context("Failed to count bookings")
    }

    /// Bookings per calendar day of their start time.
    pub async fn count_per_day(&self, from: &str, to: &str) -> Result<BTreeMap<String, i64>> {
        let starts: Vec<String> = Bookings::find()
            .select_only()
            .column(bookings::Column::StartTime)
            .filter(bookings::Column::StartTime.gte(from))
            .filter(bookings::Column::StartTime.lte(to))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query booking days")?;

        let mut per_day = BTreeMap::new();
        for start in starts {
            let day = start.get(..10).unwrap_or(&start).to_string();
            *per_day.entry(day).or_insert(0) += 1;
        }
        Ok(per_day)
    }
}
