#[cfg(test)]
mod tests {
    use crate::clock::{Clock, ManualClock};
    use crate::types::{Lease, LeaseState, DEFAULT_DURATION_IN_SECS};
    use std::sync::Arc;

    fn lease_at(start_ms: u64, duration_in_secs: Option<u32>) -> (Arc<ManualClock>, Lease<&'static str>) {
        let clock = Arc::new(ManualClock::new(start_ms));
        let lease = Lease::with_clock("instance-1", duration_in_secs, clock.clone());
        (clock, lease)
    }

    #[test]
    fn test_fresh_lease_is_not_expired() {
        for secs in [1, 30, 90, 3600] {
            let (_clock, lease) = lease_at(5_000, Some(secs));
            assert!(!lease.is_expired());
            assert!(!lease.is_expired_with(0));
            assert_eq!(lease.state(), LeaseState::Active);
        }
    }

    #[test]
    fn test_construction_timestamps() {
        let (_clock, lease) = lease_at(1_234, Some(30));

        assert_eq!(lease.registration_timestamp(), 1_234);
        assert_eq!(lease.last_renewal_timestamp(), 1_234);
        assert_eq!(lease.eviction_timestamp(), 0);
        assert_eq!(lease.service_up_timestamp(), 0);
        assert_eq!(lease.duration_ms(), 30_000);
        assert_eq!(*lease.holder(), "instance-1");
    }

    #[test]
    fn test_system_clock_lease() {
        let lease = Lease::new(42u32, Some(5));

        assert!(lease.registration_timestamp() > 0);
        assert!(!lease.is_expired());
        lease.renew();
        assert!(lease.last_renewal_timestamp() >= lease.registration_timestamp() + 5_000);
        assert_eq!(*lease.holder(), 42);
    }

    #[test]
    fn test_default_duration_when_unspecified() {
        let (_clock, lease) = lease_at(0, None);
        assert_eq!(lease.duration_ms(), u64::from(DEFAULT_DURATION_IN_SECS) * 1000);
        assert_eq!(lease.duration_ms(), 90_000);
    }

    #[test]
    fn test_zero_duration_falls_back_to_default() {
        let (_clock, lease) = lease_at(0, Some(0));
        assert_eq!(lease.duration_ms(), 90_000);
    }

    #[test]
    fn test_unrenewed_lease_expires_after_one_duration() {
        let (clock, lease) = lease_at(0, Some(1));

        clock.set(999);
        assert!(!lease.is_expired());

        clock.set(1_000);
        assert!(!lease.is_expired(), "expiry is strictly after the deadline");

        clock.set(1_001);
        assert!(lease.is_expired());
        assert_eq!(lease.state(), LeaseState::Expired);
    }

    // renew() stores now + duration and the expiry check adds duration again,
    // so a renewed lease survives for two durations. Clients depend on this.
    #[test]
    fn test_renewal_grants_double_duration() {
        let (clock, lease) = lease_at(0, None);

        clock.set(1_000);
        lease.renew();
        assert_eq!(lease.last_renewal_timestamp(), 91_000);

        clock.set(1_000 + 90_000 + 90_000 - 1);
        assert!(!lease.is_expired());

        clock.set(181_000);
        assert!(!lease.is_expired());

        clock.set(181_001);
        assert!(lease.is_expired());
    }

    #[test]
    fn test_renewal_window_for_various_durations() {
        for secs in [1u32, 5, 60] {
            let d = u64::from(secs) * 1000;
            let t0 = 10_000;
            let (clock, lease) = lease_at(0, Some(secs));

            clock.set(t0);
            lease.renew();

            clock.set(t0 + 2 * d - 1);
            assert!(!lease.is_expired(), "duration {secs}s expired early");

            clock.set(t0 + 2 * d + 1);
            assert!(lease.is_expired(), "duration {secs}s did not expire");
        }
    }

    #[test]
    fn test_renewal_keeps_pushing_deadline() {
        let (clock, lease) = lease_at(0, Some(10));

        for _ in 0..10 {
            clock.advance(15_000);
            lease.renew();
            assert!(!lease.is_expired());
        }
        assert_eq!(lease.last_renewal_timestamp(), 150_000 + 10_000);
        assert!(lease.last_renewal_timestamp() >= lease.registration_timestamp());
    }

    #[test]
    fn test_cancel_short_circuits_time_check() {
        let (clock, lease) = lease_at(0, None);

        clock.set(50);
        lease.cancel();

        assert!(lease.is_expired());
        assert!(lease.is_expired_with(u64::MAX));
        assert_eq!(lease.eviction_timestamp(), 50);
        assert_eq!(lease.state(), LeaseState::Cancelled);
    }

    #[test]
    fn test_cancel_keeps_first_timestamp() {
        let (clock, lease) = lease_at(100, None);

        lease.cancel();
        let first = lease.eviction_timestamp();
        assert!(first > 0);

        clock.advance(5_000);
        lease.cancel();
        assert_eq!(lease.eviction_timestamp(), first);
    }

    #[test]
    fn test_renew_after_cancel_does_not_revive() {
        let (clock, lease) = lease_at(100, None);

        lease.cancel();
        clock.advance(10);
        lease.renew();

        assert_eq!(lease.last_renewal_timestamp(), 110 + 90_000);
        assert!(lease.is_expired());
    }

    #[test]
    fn test_cancel_at_epoch_zero_is_still_recorded() {
        let (_clock, lease) = lease_at(0, None);

        lease.cancel();
        assert!(lease.eviction_timestamp() > 0);
        assert!(lease.is_expired());
    }

    #[test]
    fn test_service_up_is_write_once() {
        let (clock, lease) = lease_at(100, None);

        clock.set(200);
        lease.service_up();
        assert_eq!(lease.service_up_timestamp(), 200);

        clock.set(300);
        lease.service_up();
        assert_eq!(lease.service_up_timestamp(), 200);
    }

    #[test]
    fn test_set_service_up_timestamp_always_overrides() {
        let (_clock, lease) = lease_at(100, None);

        lease.set_service_up_timestamp(42);
        assert_eq!(lease.service_up_timestamp(), 42);

        lease.service_up();
        assert_eq!(lease.service_up_timestamp(), 42);

        lease.set_service_up_timestamp(7);
        assert_eq!(lease.service_up_timestamp(), 7);

        lease.set_service_up_timestamp(0);
        lease.service_up();
        assert_eq!(lease.service_up_timestamp(), 100);
    }

    #[test]
    fn test_additional_lease_widens_window() {
        let (clock, lease) = lease_at(0, Some(1));

        clock.set(1_500);
        assert!(lease.is_expired_with(0));
        assert!(lease.is_expired_with(499));
        assert!(!lease.is_expired_with(500));
        assert!(!lease.is_expired_with(10_000));
    }

    #[test]
    fn test_additional_lease_is_monotone() {
        let (clock, lease) = lease_at(0, Some(2));
        clock.set(1_000);
        lease.renew();

        for now in (0..8_000).step_by(250) {
            clock.set(now);
            let results: Vec<bool> = (0..5_000)
                .step_by(100)
                .map(|extra| lease.is_expired_with(extra))
                .collect();
            // once false, stays false as the compensation grows
            if let Some(first_valid) = results.iter().position(|expired| !expired) {
                assert!(results[first_valid..].iter().all(|expired| !expired), "at t={now}");
            }
        }
    }

    #[test]
    fn test_additional_lease_saturates() {
        let (clock, lease) = lease_at(0, Some(1));
        clock.set(u64::MAX);
        assert!(!lease.is_expired_with(u64::MAX));
    }

    #[test]
    fn test_snapshot_reflects_lease() {
        let (clock, lease) = lease_at(1_000, Some(20));
        clock.set(2_000);
        lease.service_up();
        lease.renew();

        let snapshot = lease.snapshot();
        assert_eq!(snapshot.registration_timestamp, 1_000);
        assert_eq!(snapshot.last_renewal_timestamp, 22_000);
        assert_eq!(snapshot.service_up_timestamp, 2_000);
        assert_eq!(snapshot.eviction_timestamp, 0);
        assert_eq!(snapshot.duration_ms, 20_000);
        assert_eq!(snapshot.state, LeaseState::Active);
    }

    #[test]
    fn test_concurrent_renew_and_expiry_checks() {
        let (clock, lease) = lease_at(1_000, Some(60));
        let lease = Arc::new(lease);

        std::thread::scope(|s| {
            for _ in 0..4 {
                let clock = clock.clone();
                let lease = lease.clone();
                s.spawn(move || {
                    for _ in 0..1_000 {
                        clock.advance(1);
                        lease.renew();
                    }
                });
            }
            for _ in 0..4 {
                let lease = lease.clone();
                s.spawn(move || {
                    for _ in 0..1_000 {
                        assert!(lease.last_renewal_timestamp() >= lease.registration_timestamp());
                        // total clock movement stays far inside one duration
                        assert!(!lease.is_expired());
                    }
                });
            }
        });

        assert_eq!(clock.now_ms(), 1_000 + 4_000);
        assert!(lease.last_renewal_timestamp() > 1_000);
    }

    #[test]
    fn test_concurrent_cancel_records_single_timestamp() {
        let (clock, lease) = lease_at(500, None);
        let lease = Arc::new(lease);

        std::thread::scope(|s| {
            for _ in 0..8 {
                let clock = clock.clone();
                let lease = lease.clone();
                s.spawn(move || {
                    clock.advance(1);
                    lease.cancel();
                });
            }
        });

        let recorded = lease.eviction_timestamp();
        assert!((501..=508).contains(&recorded));
        lease.cancel();
        assert_eq!(lease.eviction_timestamp(), recorded);
    }
}
