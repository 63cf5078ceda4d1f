//! # Integration Tests
//!
//! Drive the whole engine - cart, coupon session, checkout flow, booking
//! desk - end to end against in-memory collaborator fakes. The fake booking
//! backend enforces the same transition rules the real one does, so the
//! optimistic-local vs. authoritative-remote split is exercised on both
//! sides. No live backend or network is required.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use servease_engine::api::{AddressBackend, BookingBackend, CouponService};
    use servease_engine::cart::{CartStore, MemoryCartRepository};
    use servease_engine::checkout::{CheckoutDetails, CheckoutFlow};
    use servease_engine::coupon::{CouponOutcome, CouponSession};
    use servease_engine::error::Error;
    use servease_engine::lifecycle::{provider_transition, BookingDesk, ProviderAction};
    use servease_engine::models::{
        Address, Booking, BookingItem, BookingReceipt, BookingRequest, BookingStatus, CartItem,
        CatalogService, CouponCheck, NewAddress,
    };
    use servease_engine::pricing::{compute_breakdown, FeeSchedule};

    // ========================================================================
    // Fake collaborators
    // ========================================================================

    /// In-memory booking service. Prices requests off a fixed catalog of
    /// effective unit prices and applies the same transition rules the real
    /// backend enforces.
    struct FakeBackend {
        catalog: HashMap<String, (String, i64)>,
        bookings: Mutex<HashMap<String, Booking>>,
        last_request: Mutex<Option<BookingRequest>>,
        reject_create_with: Mutex<Option<String>>,
        counter: AtomicU32,
        fees: FeeSchedule,
    }

    impl FakeBackend {
        fn new() -> Arc<Self> {
            let catalog = [
                ("svc-clean", "Deep Cleaning", 500),
                ("svc-paint", "Wall Painting", 250),
                ("svc-repair", "Tap Repair", 270),
            ];
            Arc::new(Self {
                catalog: catalog
                    .iter()
                    .map(|(id, name, price)| (id.to_string(), (name.to_string(), *price)))
                    .collect(),
                bookings: Mutex::new(HashMap::new()),
                last_request: Mutex::new(None),
                reject_create_with: Mutex::new(None),
                counter: AtomicU32::new(0),
                fees: FeeSchedule::default(),
            })
        }

        fn reject_next_create(&self, message: &str) {
            *self.reject_create_with.lock().unwrap() = Some(message.to_string());
        }

        fn last_request(&self) -> Option<BookingRequest> {
            self.last_request.lock().unwrap().clone()
        }

        fn stored(&self, id: &str) -> Booking {
            self.bookings.lock().unwrap()[id].clone()
        }
    }

    #[async_trait]
    impl BookingBackend for FakeBackend {
        async fn create(&self, request: &BookingRequest) -> Result<BookingReceipt, Error> {
            if let Some(message) = self.reject_create_with.lock().unwrap().take() {
                return Err(Error::Service(message));
            }
            *self.last_request.lock().unwrap() = Some(request.clone());

            let items: Vec<BookingItem> = request
                .items
                .iter()
                .map(|i| {
                    let (name, unit_price) = self.catalog[&i.service_id].clone();
                    BookingItem {
                        service_id: i.service_id.clone(),
                        name,
                        quantity: i.quantity,
                        unit_price,
                    }
                })
                .collect();
            let base: i64 = items.iter().map(|i| i.unit_price * i.quantity).sum();
            let coupon_discount = match request.coupon_code.as_deref() {
                Some("WELCOME10") => base / 10,
                _ => 0,
            };
            let breakdown = compute_breakdown(base, coupon_discount, &self.fees);

            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            let id = format!("b-{n}");
            let booking_number = format!("BK-20260314-{n:04}");
            let booking = Booking {
                id: id.clone(),
                booking_number: booking_number.clone(),
                status: BookingStatus::Pending,
                provider_id: request.provider_id.clone(),
                items,
                subtotal: breakdown.subtotal,
                platform_fee: breakdown.platform_fee,
                tax_amount: breakdown.tax_amount,
                coupon_discount: breakdown.coupon_discount,
                total_amount: breakdown.total_amount,
                date_time: request.date_time,
                payment_method: request.payment_method,
                cancel_reason: None,
                created_at: Some(chrono::Utc::now()),
            };
            self.bookings.lock().unwrap().insert(id, booking);
            Ok(BookingReceipt {
                booking_number,
                total_amount: breakdown.total_amount,
            })
        }

        async fn fetch(&self, id: &str) -> Result<Booking, Error> {
            self.bookings
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| Error::service("booking not found"))
        }

        async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, Error> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .get_mut(id)
                .ok_or_else(|| Error::service("booking not found"))?;
            booking.status = status;
            Ok(booking.clone())
        }

        async fn provider_action(
            &self,
            id: &str,
            action: ProviderAction,
            reason: Option<&str>,
        ) -> Result<Booking, Error> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .get_mut(id)
                .ok_or_else(|| Error::service("booking not found"))?;
            let next = provider_transition(booking.status, action)
                .map_err(|_| Error::conflict("booking was updated by another actor"))?;
            booking.status = next;
            if let Some(reason) = reason {
                booking.cancel_reason = Some(reason.to_string());
            }
            Ok(booking.clone())
        }

        async fn assign_provider(&self, id: &str, provider_id: &str) -> Result<Booking, Error> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings
                .get_mut(id)
                .ok_or_else(|| Error::service("booking not found"))?;
            if booking.status.is_terminal() {
                return Err(Error::conflict("booking already closed"));
            }
            booking.provider_id = Some(provider_id.to_string());
            Ok(booking.clone())
        }

        async fn bookings_for_customer(&self, _customer_id: &str) -> Result<Vec<Booking>, Error> {
            Ok(self.bookings.lock().unwrap().values().cloned().collect())
        }

        async fn jobs_for_provider(&self, provider_id: &str) -> Result<Vec<Booking>, Error> {
            Ok(self
                .bookings
                .lock()
                .unwrap()
                .values()
                .filter(|b| b.provider_id.as_deref() == Some(provider_id))
                .cloned()
                .collect())
        }
    }

    /// 10% off with WELCOME10; everything else is rejected.
    struct FakeCoupons;

    #[async_trait]
    impl CouponService for FakeCoupons {
        async fn validate(&self, code: &str, order_value: i64) -> Result<CouponCheck, Error> {
            if code == "WELCOME10" {
                Ok(CouponCheck {
                    valid: true,
                    calculated_discount: order_value / 10,
                    message: "Coupon applied".to_string(),
                })
            } else {
                Ok(CouponCheck {
                    valid: false,
                    calculated_discount: 0,
                    message: "Coupon expired".to_string(),
                })
            }
        }
    }

    struct FakeAddresses {
        addresses: Mutex<Vec<Address>>,
    }

    impl FakeAddresses {
        fn with_primary_second() -> Arc<Self> {
            Arc::new(Self {
                addresses: Mutex::new(vec![
                    address("addr-1", "Office", false),
                    address("addr-2", "Home", true),
                ]),
            })
        }

        fn without_primary() -> Arc<Self> {
            Arc::new(Self {
                addresses: Mutex::new(vec![
                    address("addr-1", "Office", false),
                    address("addr-2", "Home", false),
                ]),
            })
        }
    }

    #[async_trait]
    impl AddressBackend for FakeAddresses {
        async fn list(&self) -> Result<Vec<Address>, Error> {
            Ok(self.addresses.lock().unwrap().clone())
        }

        async fn add(&self, new: &NewAddress) -> Result<Address, Error> {
            let mut addresses = self.addresses.lock().unwrap();
            let added = Address {
                id: format!("addr-{}", addresses.len() + 1),
                label: new.label.clone(),
                line: new.line.clone(),
                city: new.city.clone(),
                pincode: new.pincode.clone(),
                is_primary: new.is_primary,
            };
            addresses.push(added.clone());
            Ok(added)
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn address(id: &str, label: &str, is_primary: bool) -> Address {
        Address {
            id: id.to_string(),
            label: label.to_string(),
            line: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            pincode: "560001".to_string(),
            is_primary,
        }
    }

    fn seeded_cart_items() -> Vec<CartItem> {
        vec![
            CartItem {
                service_id: "svc-clean".to_string(),
                name: "Deep Cleaning".to_string(),
                unit_price: 500,
                unit_discount: 0,
                quantity: 1,
            },
            CartItem {
                service_id: "svc-paint".to_string(),
                name: "Wall Painting".to_string(),
                unit_price: 300,
                unit_discount: 50,
                quantity: 2,
            },
        ]
    }

    async fn seeded_cart() -> CartStore {
        CartStore::open(Arc::new(MemoryCartRepository::seeded(seeded_cart_items()))).await
    }

    fn flow(backend: &Arc<FakeBackend>, addresses: Arc<FakeAddresses>) -> CheckoutFlow {
        CheckoutFlow::new(
            Arc::clone(backend) as Arc<dyn BookingBackend>,
            addresses as Arc<dyn AddressBackend>,
            FeeSchedule::default(),
        )
    }

    fn coupon_session() -> CouponSession {
        CouponSession::new(Arc::new(FakeCoupons))
    }

    fn details() -> CheckoutDetails {
        CheckoutDetails {
            address_id: Some("addr-2".to_string()),
            ..CheckoutDetails::default()
        }
    }

    fn desk(backend: &Arc<FakeBackend>) -> BookingDesk {
        BookingDesk::new(Arc::clone(backend) as Arc<dyn BookingBackend>)
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    #[tokio::test]
    async fn test_cart_checkout_end_to_end() {
        let backend = FakeBackend::new();
        let mut cart = seeded_cart().await;
        // 500 + (300 - 50) * 2
        assert_eq!(cart.subtotal(), 1000);
        assert_eq!(cart.total_item_count(), 3);

        let session = coupon_session();
        let outcome = session.apply("WELCOME10", cart.subtotal()).await.unwrap();
        assert!(matches!(outcome, CouponOutcome::Applied { discount: 100, .. }));

        let flow = flow(&backend, FakeAddresses::with_primary_second());
        let confirmation = flow
            .checkout_cart(&mut cart, &details(), &session)
            .await
            .unwrap();

        // 1000 + 49 + round(1049 * 0.18) - 100
        assert_eq!(confirmation.breakdown.total_amount, 1138);
        assert_eq!(confirmation.amount_due, 1138);
        assert_eq!(confirmation.items.len(), 2);
        assert_eq!(confirmation.booking_number, "BK-20260314-0001");

        // checkout completion clears cart and coupon
        assert!(cart.is_empty());
        assert_eq!(session.discount(), 0);

        // the coupon rode along because a positive discount was active
        let request = backend.last_request().unwrap();
        assert_eq!(request.coupon_code.as_deref(), Some("WELCOME10"));

        // bookings always start pending, with the breakdown snapshotted
        let created = backend.stored("b-1");
        assert_eq!(created.status, BookingStatus::Pending);
        assert_eq!(created.total_amount, 1138);
        assert_eq!(created.coupon_discount, 100);
    }

    #[tokio::test]
    async fn test_checkout_without_address_fails_before_any_network_call() {
        let backend = FakeBackend::new();
        let mut cart = seeded_cart().await;
        let session = coupon_session();
        let flow = flow(&backend, FakeAddresses::with_primary_second());

        let err = flow
            .checkout_cart(&mut cart, &CheckoutDetails::default(), &session)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(cart.total_item_count(), 3);
        assert!(backend.last_request().is_none());
    }

    #[tokio::test]
    async fn test_backend_rejection_surfaces_verbatim_and_preserves_state() {
        let backend = FakeBackend::new();
        backend.reject_next_create("Selected slot is unavailable");
        let mut cart = seeded_cart().await;
        let session = coupon_session();
        session.apply("WELCOME10", cart.subtotal()).await.unwrap();
        let flow = flow(&backend, FakeAddresses::with_primary_second());

        let err = flow
            .checkout_cart(&mut cart, &details(), &session)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Service(_)));
        assert_eq!(err.to_string(), "Selected slot is unavailable");
        // nothing is partially cleared; the user can retry as-is
        assert_eq!(cart.total_item_count(), 3);
        assert_eq!(session.discount(), 100);
    }

    #[tokio::test]
    async fn test_failed_revalidation_feeds_zero_discount_into_breakdown() {
        let session = coupon_session();
        session.apply("WELCOME10", 1000).await.unwrap();
        assert_eq!(session.discount(), 100);

        let outcome = session.apply("BOGUS", 1000).await.unwrap();
        assert!(matches!(outcome, CouponOutcome::Rejected { .. }));

        let breakdown = compute_breakdown(1000, session.discount(), &FeeSchedule::default());
        assert_eq!(breakdown.coupon_discount, 0);
        assert_eq!(breakdown.total_amount, 1238);
    }

    #[tokio::test]
    async fn test_single_service_checkout_converts_slot_and_prices_upstream() {
        let backend = FakeBackend::new();
        let session = coupon_session();
        let flow = flow(&backend, FakeAddresses::with_primary_second());

        let service = CatalogService {
            id: "svc-repair".to_string(),
            name: "Tap Repair".to_string(),
            price: 300,
            discount_percent: 10,
        };
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let confirmation = flow
            .checkout_service(&service, 2, date, "02:00 PM", &details(), &session)
            .await
            .unwrap();

        let request = backend.last_request().unwrap();
        assert_eq!(request.date_time.to_string(), "2026-03-14 14:00:00");
        assert_eq!(request.coupon_code, None);

        // catalog percentage resolved at the item boundary: (300 - 30) * 2
        assert_eq!(confirmation.breakdown.subtotal, 540);
        // 540 + 49 + round(589 * 0.18)
        assert_eq!(confirmation.amount_due, 695);
    }

    #[tokio::test]
    async fn test_default_address_prefers_primary_then_first() {
        let backend = FakeBackend::new();

        let with_primary = flow(&backend, FakeAddresses::with_primary_second());
        let chosen = with_primary.default_address().await.unwrap().unwrap();
        assert_eq!(chosen.id, "addr-2");

        let without_primary = flow(&backend, FakeAddresses::without_primary());
        let chosen = without_primary.default_address().await.unwrap().unwrap();
        assert_eq!(chosen.id, "addr-1");
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    async fn booked(backend: &Arc<FakeBackend>) -> Booking {
        let mut cart = seeded_cart().await;
        let session = coupon_session();
        let flow = flow(backend, FakeAddresses::with_primary_second());
        flow.checkout_cart(&mut cart, &details(), &session)
            .await
            .unwrap();
        let n = backend.counter.load(Ordering::SeqCst);
        backend.stored(&format!("b-{n}"))
    }

    #[tokio::test]
    async fn test_accept_on_already_confirmed_booking_is_a_conflict() {
        let backend = FakeBackend::new();
        let desk = desk(&backend);
        let booking = booked(&backend).await;
        assert_eq!(booking.status, BookingStatus::Pending);

        let confirmed = desk.accept(&booking).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        // repeat with fresh state: the local rules catch it
        let err = desk.accept(&confirmed).await.unwrap_err();
        assert!(err.is_conflict());

        // repeat with a stale copy: the backend catches it and the desk
        // refetches the authoritative status
        let err = desk.accept(&booking).await.unwrap_err();
        match err {
            Error::Conflict { latest, .. } => assert_eq!(latest, Some(BookingStatus::Confirmed)),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reject_requires_and_records_a_reason() {
        let backend = FakeBackend::new();
        let desk = desk(&backend);
        let booking = booked(&backend).await;

        let err = desk.reject(&booking, "   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let cancelled = desk
            .reject(&booking, "No technicians available in this area")
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(
            cancelled.cancel_reason.as_deref(),
            Some("No technicians available in this area")
        );
    }

    #[tokio::test]
    async fn test_provider_drives_job_to_completion_and_earns_its_total() {
        let backend = FakeBackend::new();
        let desk = desk(&backend);
        let first = booked(&backend).await;
        let second = booked(&backend).await;

        let first = desk.assign_provider(&first, "prov-7").await.unwrap();
        desk.assign_provider(&second, "prov-7").await.unwrap();

        let first = desk.accept(&first).await.unwrap();
        let first = desk.start(&first).await.unwrap();
        let first = desk.complete(&first).await.unwrap();
        assert_eq!(first.status, BookingStatus::Completed);

        assert_eq!(desk.jobs_for_provider("prov-7").await.unwrap().len(), 2);
        // only completed jobs count toward earnings
        assert_eq!(
            desk.provider_earnings("prov-7").await.unwrap(),
            first.total_amount
        );
    }

    #[tokio::test]
    async fn test_admin_override_bypasses_rules_but_not_snapshots() {
        let backend = FakeBackend::new();
        let desk = desk(&backend);
        let booking = booked(&backend).await;
        let total_at_creation = booking.total_amount;

        // straight from pending to in_progress, skipping confirmation
        let moved = desk
            .admin_set_status(&booking.id, BookingStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(moved.status, BookingStatus::InProgress);
        assert_eq!(moved.total_amount, total_at_creation);

        // assignment is status-independent while the booking is open
        let assigned = desk.assign_provider(&moved, "prov-3").await.unwrap();
        assert_eq!(assigned.provider_id.as_deref(), Some("prov-3"));

        let closed = desk
            .admin_set_status(&booking.id, BookingStatus::Completed)
            .await
            .unwrap();
        assert_eq!(closed.total_amount, total_at_creation);

        // but never onto a terminal booking
        let err = desk.assign_provider(&closed, "prov-4").await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_customer_booking_list_reflects_lifecycle() {
        let backend = FakeBackend::new();
        let desk = desk(&backend);
        let booking = booked(&backend).await;
        desk.accept(&booking).await.unwrap();

        let bookings = desk.bookings_for_customer("cust-1").await.unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].status, BookingStatus::Confirmed);
    }
}
