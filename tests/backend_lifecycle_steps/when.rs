//! When steps for backend lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use transit_hub::backend::BackendWrapper;
use transit_hub::backend::domain::{Capabilities, Capability};

#[when("the backend is launched")]
fn launch_backend(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    let backend = world.backend()?;
    run_async(backend.launch());
    Ok(())
}

#[when("the backend registers with station suggestions")]
fn backend_registers(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    let endpoint = world.endpoint()?;
    let capabilities: Capabilities = [Capability::SuggestStationFromString].into_iter().collect();
    run_async(
        world
            .transport
            .deliver_registration(&endpoint, capabilities, "© Scenario"),
    )
    .wrap_err("deliver registration to the backend endpoint")
}

#[when("the backend is stopped")]
fn stop_backend(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    let backend = world.backend()?;
    run_async(backend.stop());
    Ok(())
}
