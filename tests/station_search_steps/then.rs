//! Then steps for station search BDD scenarios.

use super::world::SearchWorld;
use rstest_bdd_macros::then;
use transit_hub::backend::BackendWrapper;

#[then("{count:usize} requests are pending")]
fn requests_pending(world: &SearchWorld, count: usize) -> Result<(), eyre::Report> {
    let pending: usize = world
        .manager
        .backends()
        .iter()
        .map(|backend| backend.pending_requests().len())
        .sum();
    if pending != count {
        return Err(eyre::eyre!("expected {count} pending requests, found {pending}"));
    }
    Ok(())
}

#[then(r#"the rows are "{names}""#)]
fn rows_are(world: &SearchWorld, names: String) -> Result<(), eyre::Report> {
    let expected: Vec<&str> = names.split(", ").collect();
    let rows: Vec<String> = world
        .model()?
        .rows()
        .into_iter()
        .map(|row| row.name)
        .collect();
    if rows != expected {
        return Err(eyre::eyre!("expected rows {expected:?}, found {rows:?}"));
    }
    Ok(())
}

#[then("the model has no rows")]
fn no_rows(world: &SearchWorld) -> Result<(), eyre::Report> {
    let count = world.model()?.count();
    if count != 0 {
        return Err(eyre::eyre!("expected no rows, found {count}"));
    }
    Ok(())
}

#[then("the model is loading")]
fn model_is_loading(world: &SearchWorld) -> Result<(), eyre::Report> {
    if !world.model()?.is_loading() {
        return Err(eyre::eyre!("expected the model to be loading"));
    }
    Ok(())
}

#[then("the model is not loading")]
fn model_is_not_loading(world: &SearchWorld) -> Result<(), eyre::Report> {
    if world.model()?.is_loading() {
        return Err(eyre::eyre!("expected the model to be idle"));
    }
    Ok(())
}

#[then("the query is marked short")]
fn query_is_short(world: &SearchWorld) -> Result<(), eyre::Report> {
    if !world.model()?.is_short() {
        return Err(eyre::eyre!("expected the query to be marked short"));
    }
    Ok(())
}
