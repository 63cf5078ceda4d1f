//! reqwest implementation of the collaborator traits against the marketplace
//! REST backend.
//!
//! Transport failures surface as [`Error::Service`]; nothing here retries -
//! every retry is a fresh user action.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::wire::{
    self, AddressWire, BookingReceiptWire, BookingWire, CouponCheckWire,
};
use crate::api::{AddressBackend, BookingBackend, CouponService};
use crate::error::Error;
use crate::lifecycle::ProviderAction;
use crate::models::{
    Address, Booking, BookingReceipt, BookingRequest, BookingStatus, CouponCheck, NewAddress,
};

/// HTTP client for the marketplace backend.
pub struct MarketplaceApi {
    base_url: String,
    client: Client,
}

impl MarketplaceApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let status = response.status();
        let body = response.text().await?;
        wire::parse_response(status, &body)
    }

    async fn fetch_booking(&self, path: &str) -> Result<Booking, Error> {
        let response = self.client.get(self.url(path)).send().await?;
        let wire: BookingWire = Self::decode(response).await?;
        Ok(wire.into())
    }

    async fn fetch_bookings(&self, path: &str) -> Result<Vec<Booking>, Error> {
        let response = self.client.get(self.url(path)).send().await?;
        let wires: Vec<BookingWire> = Self::decode(response).await?;
        Ok(wires.into_iter().map(Booking::from).collect())
    }
}

#[async_trait]
impl CouponService for MarketplaceApi {
    async fn validate(&self, code: &str, order_value: i64) -> Result<CouponCheck, Error> {
        let response = self
            .client
            .post(self.url("/coupons/validate"))
            .json(&serde_json::json!({ "code": code, "orderValue": order_value }))
            .send()
            .await?;
        let wire: CouponCheckWire = Self::decode(response).await?;
        Ok(wire.into())
    }
}

#[async_trait]
impl BookingBackend for MarketplaceApi {
    async fn create(&self, request: &BookingRequest) -> Result<BookingReceipt, Error> {
        debug!(request_id = %request.request_id, "submitting booking request");
        let response = self
            .client
            .post(self.url("/bookings"))
            .json(request)
            .send()
            .await?;
        let wire: BookingReceiptWire = Self::decode(response).await?;
        Ok(wire.into())
    }

    async fn fetch(&self, id: &str) -> Result<Booking, Error> {
        self.fetch_booking(&format!("/bookings/{id}")).await
    }

    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, Error> {
        let response = self
            .client
            .patch(self.url(&format!("/bookings/{id}/status")))
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await?;
        let wire: BookingWire = Self::decode(response).await?;
        Ok(wire.into())
    }

    async fn provider_action(
        &self,
        id: &str,
        action: ProviderAction,
        reason: Option<&str>,
    ) -> Result<Booking, Error> {
        let mut body = serde_json::json!({});
        if let Some(reason) = reason {
            body["reason"] = reason.into();
        }
        let response = self
            .client
            .post(self.url(&format!("/bookings/{id}/{}", action.endpoint())))
            .json(&body)
            .send()
            .await?;
        let wire: BookingWire = Self::decode(response).await?;
        Ok(wire.into())
    }

    async fn assign_provider(&self, id: &str, provider_id: &str) -> Result<Booking, Error> {
        let response = self
            .client
            .post(self.url(&format!("/bookings/{id}/assign")))
            .json(&serde_json::json!({ "providerId": provider_id }))
            .send()
            .await?;
        let wire: BookingWire = Self::decode(response).await?;
        Ok(wire.into())
    }

    async fn bookings_for_customer(&self, customer_id: &str) -> Result<Vec<Booking>, Error> {
        self.fetch_bookings(&format!("/customers/{customer_id}/bookings"))
            .await
    }

    async fn jobs_for_provider(&self, provider_id: &str) -> Result<Vec<Booking>, Error> {
        self.fetch_bookings(&format!("/providers/{provider_id}/bookings"))
            .await
    }
}

#[async_trait]
impl AddressBackend for MarketplaceApi {
    async fn list(&self) -> Result<Vec<Address>, Error> {
        let response = self.client.get(self.url("/addresses")).send().await?;
        let wires: Vec<AddressWire> = Self::decode(response).await?;
        Ok(wires.into_iter().map(Address::from).collect())
    }

    async fn add(&self, address: &NewAddress) -> Result<Address, Error> {
        let response = self
            .client
            .post(self.url("/addresses"))
            .json(address)
            .send()
            .await?;
        let wire: AddressWire = Self::decode(response).await?;
        Ok(wire.into())
    }
}
