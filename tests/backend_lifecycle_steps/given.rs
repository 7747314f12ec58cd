//! Given steps for backend lifecycle BDD scenarios.

use super::world::{LONG_RUNNING, LifecycleWorld};
use rstest_bdd_macros::given;

#[given(r#"a process backend named "{name}""#)]
fn a_process_backend(world: &mut LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    world.add(&name, LONG_RUNNING)
}

#[given(r#"a process backend named "{name}" with a missing executable"#)]
fn a_backend_with_missing_executable(
    world: &mut LifecycleWorld,
    name: String,
) -> Result<(), eyre::Report> {
    world.add(&name, "/nonexistent/transit-hub-provider")
}
