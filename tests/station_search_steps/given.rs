//! Given steps for station search BDD scenarios.

use super::world::{LONG_RUNNING, SearchWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use transit_hub::backend::BackendWrapper;
use std::collections::BTreeMap;
use std::sync::Arc;
use transit_hub::backend::domain::{BackendIdentifier, Capabilities, Capability, EndpointId};
use transit_hub::model::StationSearchModel;

#[given(r#"launched backends "{first}" and "{second}" suggesting stations"#)]
fn launched_backends(
    world: &mut SearchWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    for name in [first, second] {
        let identifier = BackendIdentifier::new(name.as_str())?;
        let backend = world
            .manager
            .add_backend(identifier.clone(), LONG_RUNNING, BTreeMap::new());
        run_async(backend.launch());

        let capabilities: Capabilities =
            [Capability::SuggestStationFromString].into_iter().collect();
        run_async(world.transport.deliver_registration(
            &EndpointId::for_backend(&identifier),
            capabilities,
            format!("© {name}"),
        ))
        .wrap_err_with(|| format!("register backend {name}"))?;
    }
    Ok(())
}

#[given("a station search model attached to the manager")]
fn attached_model(world: &mut SearchWorld) {
    let model = StationSearchModel::new();
    model.set_backend_manager(Some(Arc::clone(&world.manager)));
    world.model = Some(model);
}
