// Example: drive a simulated list with a bound window through a few layout cycles.
use reconciler_host::{Scenario, ScenarioError};

fn main() -> Result<(), ScenarioError> {
    // 50 items, 25..35 bound.
    let mut scenario = Scenario::new(50, 25, 10);

    scenario.rm(24, 5)?;
    let counts = scenario.layout()?;
    println!("remove across the window edge: {counts:?}");

    scenario.add(0, 3)?;
    scenario.mv(40, 26)?;
    scenario.up(20, 12)?;
    let counts = scenario.layout()?;
    println!("insert, move and update: {counts:?}");

    scenario.rm(0, 30)?;
    let counts = scenario.layout()?;
    println!("remove everything above: {counts:?}");
    println!("items left: {}", scenario.items().len());

    for item in scenario.host().bound().iter() {
        println!("bound {:>3} at {}", item.key(), item.position());
    }
    Ok(())
}
