//! Then steps for backend lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use rstest_bdd_macros::then;
use std::time::Duration;
use transit_hub::backend::BackendWrapper;
use transit_hub::backend::domain::{BackendStatus, Capability};

#[then(r#"the backend status is "{status}""#)]
fn backend_status_is(world: &LifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let expected = BackendStatus::try_from(status.as_str())?;
    let actual = world.backend()?.status();
    if actual != expected {
        return Err(eyre::eyre!("expected status {expected}, found {actual}"));
    }
    Ok(())
}

#[then(r#"the backend advertises "{token}""#)]
fn backend_advertises(world: &LifecycleWorld, token: String) -> Result<(), eyre::Report> {
    let capability = Capability::try_from(token.as_str())?;
    if !world.backend()?.capabilities().contains(capability) {
        return Err(eyre::eyre!("expected capability {capability} to be advertised"));
    }
    Ok(())
}

#[then(r#"the last error is "{message}""#)]
fn last_error_is(world: &LifecycleWorld, message: String) -> Result<(), eyre::Report> {
    let actual = world.backend()?.last_error();
    if actual != message {
        return Err(eyre::eyre!("expected last error '{message}', found '{actual}'"));
    }
    Ok(())
}

#[then(r#"the last error starts with "{prefix}""#)]
fn last_error_starts_with(world: &LifecycleWorld, prefix: String) -> Result<(), eyre::Report> {
    let actual = world.backend()?.last_error();
    if !actual.starts_with(&prefix) {
        return Err(eyre::eyre!("expected last error to start with '{prefix}', found '{actual}'"));
    }
    Ok(())
}

#[then("the backend endpoint is released")]
fn endpoint_is_released(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let endpoint = world.endpoint()?;
    if world.transport.is_registered(&endpoint)? {
        return Err(eyre::eyre!("expected endpoint {endpoint} to be unregistered"));
    }
    Ok(())
}

#[then("the backend stops within {seconds:u64} seconds")]
fn backend_stops_within(world: &LifecycleWorld, seconds: u64) -> Result<(), eyre::Report> {
    let backend = world.backend()?;
    if !run_async(backend.wait_for_stopped(Duration::from_secs(seconds))) {
        return Err(eyre::eyre!(
            "backend still {} after {seconds} seconds",
            backend.status()
        ));
    }
    Ok(())
}
