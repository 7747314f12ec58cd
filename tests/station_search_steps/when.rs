//! When steps for station search BDD scenarios.

use super::world::SearchWorld;
use rstest_bdd_macros::when;
use transit_hub::backend::domain::{BackendIdentifier, EndpointId, RequestId};
use transit_hub::backend::ports::ProviderReplies;
use transit_hub::entity::Station;

fn answer(
    world: &SearchWorld,
    backend: &str,
    request: RequestId,
    station: &str,
) -> Result<(), eyre::Report> {
    let endpoint = EndpointId::for_backend(&BackendIdentifier::new(backend)?);
    let callbacks = world.transport.callbacks(&endpoint)?;
    let identifier = format!("{backend}:{}", station.to_lowercase().replace(' ', "_"));
    callbacks.suggested_stations_retrieved(request, vec![Station::new(identifier, station)?]);
    Ok(())
}

#[when(r#"the user searches for "{text}""#)]
fn user_searches(world: &mut SearchWorld, text: String) -> Result<(), eyre::Report> {
    world.model()?.search(&text);
    Ok(())
}

#[when(r#"backend "{backend}" answers with station "{station}""#)]
fn backend_answers(
    world: &mut SearchWorld,
    backend: String,
    station: String,
) -> Result<(), eyre::Report> {
    let request = world
        .requests_to(&backend)?
        .last()
        .copied()
        .ok_or_else(|| eyre::eyre!("no request was sent to {backend}"))?;
    answer(world, &backend, request, &station)
}

#[when(r#"backend "{backend}" answers the first request with station "{station}""#)]
fn backend_answers_first(
    world: &mut SearchWorld,
    backend: String,
    station: String,
) -> Result<(), eyre::Report> {
    let request = world
        .requests_to(&backend)?
        .first()
        .copied()
        .ok_or_else(|| eyre::eyre!("no request was sent to {backend}"))?;
    answer(world, &backend, request, &station)
}
