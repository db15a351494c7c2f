#![cfg(feature = "server")]

use modhub_domain::config::ApiConfig;
use modhub_domain::registry::InitializedSlice;
use modhub_kernel::server::{ApiState, ApiStateError};

#[modhub_derive::modhub_slice]
pub struct Counter {
    pub start: u64,
}

#[modhub_derive::modhub_slice]
pub struct Unregistered {}

#[test]
fn registered_slice_is_found_by_type() {
    let state = ApiState::builder()
        .config(ApiConfig::default())
        .register_slice(InitializedSlice::new(Counter::new(CounterInner { start: 7 })))
        .build()
        .expect("state");

    assert_eq!(state.slice_count(), 1);
    assert_eq!(state.try_get_slice::<Counter>().expect("slice").start, 7);
    assert!(matches!(
        state.try_get_slice::<Unregistered>(),
        Err(ApiStateError::MissingSlice { .. })
    ));
}

#[test]
fn config_is_required() {
    let err = ApiState::builder().build().expect_err("config missing");
    assert!(matches!(err, ApiStateError::Validation { .. }));
}
