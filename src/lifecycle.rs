//! Booking lifecycle: transition rules and the operations desk.
//!
//! The success path is `pending → confirmed → in_progress → completed`;
//! `pending → cancelled` (provider reject) is the abort path. Completed and
//! cancelled bookings are terminal. The local rules run first so an obvious
//! re-invocation fails fast; the backend remains authoritative - a remote
//! conflict triggers a refetch, never a blind retry.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::BookingBackend;
use crate::error::Error;
use crate::models::{Booking, BookingStatus};

/// Actions a provider can take on an assigned booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderAction {
    Accept,
    Reject,
    Start,
    Complete,
}

impl ProviderAction {
    /// Backend endpoint suffix for this action.
    pub fn endpoint(self) -> &'static str {
        match self {
            ProviderAction::Accept => "accept",
            ProviderAction::Reject => "reject",
            ProviderAction::Start => "start",
            ProviderAction::Complete => "complete",
        }
    }

    /// The edge this action walks in the lifecycle graph.
    fn edge(self) -> (BookingStatus, BookingStatus) {
        match self {
            ProviderAction::Accept => (BookingStatus::Pending, BookingStatus::Confirmed),
            ProviderAction::Reject => (BookingStatus::Pending, BookingStatus::Cancelled),
            ProviderAction::Start => (BookingStatus::Confirmed, BookingStatus::InProgress),
            ProviderAction::Complete => (BookingStatus::InProgress, BookingStatus::Completed),
        }
    }
}

/// Check a provider action against the current status.
///
/// Re-invoking an action whose booking has already moved is a conflict, not a
/// silent success - double-completing or double-charging must be impossible.
pub fn provider_transition(
    current: BookingStatus,
    action: ProviderAction,
) -> Result<BookingStatus, Error> {
    let (from, to) = action.edge();
    if current == from {
        Ok(to)
    } else {
        Err(Error::Conflict {
            message: format!("cannot {} a booking that is {current}", action.endpoint()),
            latest: Some(current),
        })
    }
}

/// Provider and admin operations on submitted bookings.
pub struct BookingDesk {
    backend: Arc<dyn BookingBackend>,
}

impl BookingDesk {
    pub fn new(backend: Arc<dyn BookingBackend>) -> Self {
        Self { backend }
    }

    pub async fn fetch(&self, id: &str) -> Result<Booking, Error> {
        self.backend.fetch(id).await
    }

    pub async fn accept(&self, booking: &Booking) -> Result<Booking, Error> {
        self.run_provider_action(booking, ProviderAction::Accept, None)
            .await
    }

    pub async fn reject(&self, booking: &Booking, reason: &str) -> Result<Booking, Error> {
        if reason.trim().is_empty() {
            return Err(Error::validation("a rejection reason is required"));
        }
        self.run_provider_action(booking, ProviderAction::Reject, Some(reason))
            .await
    }

    pub async fn start(&self, booking: &Booking) -> Result<Booking, Error> {
        self.run_provider_action(booking, ProviderAction::Start, None)
            .await
    }

    pub async fn complete(&self, booking: &Booking) -> Result<Booking, Error> {
        self.run_provider_action(booking, ProviderAction::Complete, None)
            .await
    }

    async fn run_provider_action(
        &self,
        booking: &Booking,
        action: ProviderAction,
        reason: Option<&str>,
    ) -> Result<Booking, Error> {
        provider_transition(booking.status, action)?;
        match self.backend.provider_action(&booking.id, action, reason).await {
            Ok(updated) => {
                info!(
                    booking_number = %updated.booking_number,
                    status = %updated.status,
                    "provider {} applied", action.endpoint()
                );
                Ok(updated)
            }
            Err(err) if err.is_conflict() => Err(self.refresh_conflict(&booking.id, err).await),
            Err(err) => Err(err),
        }
    }

    /// Administrative escape hatch: force any status, bypassing the provider
    /// rules.
    pub async fn admin_set_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Booking, Error> {
        match self.backend.update_status(id, status).await {
            Ok(updated) => Ok(updated),
            Err(err) if err.is_conflict() => Err(self.refresh_conflict(id, err).await),
            Err(err) => Err(err),
        }
    }

    /// (Re-)assign a provider. Independent of status, allowed at any
    /// non-terminal state.
    pub async fn assign_provider(
        &self,
        booking: &Booking,
        provider_id: &str,
    ) -> Result<Booking, Error> {
        if booking.status.is_terminal() {
            return Err(Error::Conflict {
                message: format!("booking is already {}", booking.status),
                latest: Some(booking.status),
            });
        }
        match self.backend.assign_provider(&booking.id, provider_id).await {
            Ok(updated) => Ok(updated),
            Err(err) if err.is_conflict() => Err(self.refresh_conflict(&booking.id, err).await),
            Err(err) => Err(err),
        }
    }

    pub async fn bookings_for_customer(&self, customer_id: &str) -> Result<Vec<Booking>, Error> {
        self.backend.bookings_for_customer(customer_id).await
    }

    pub async fn jobs_for_provider(&self, provider_id: &str) -> Result<Vec<Booking>, Error> {
        self.backend.jobs_for_provider(provider_id).await
    }

    /// Lifetime earnings: the immutable totals of the provider's completed
    /// jobs.
    pub async fn provider_earnings(&self, provider_id: &str) -> Result<i64, Error> {
        let jobs = self.backend.jobs_for_provider(provider_id).await?;
        Ok(jobs
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .map(|b| b.total_amount)
            .sum())
    }

    /// Another actor won the race: fetch the authoritative state so the
    /// caller can re-render instead of retrying blindly.
    async fn refresh_conflict(&self, id: &str, err: Error) -> Error {
        let message = match &err {
            Error::Conflict { message, .. } => message.clone(),
            other => other.to_string(),
        };
        match self.backend.fetch(id).await {
            Ok(latest) => Error::Conflict {
                message,
                latest: Some(latest.status),
            },
            Err(fetch_err) => {
                warn!("could not refresh booking {id} after conflict: {fetch_err}");
                err
            }
        }
    }
}
