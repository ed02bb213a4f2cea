//! Traffic Light State Machine
//!
//! This example demonstrates an active machine that cycles on its own.
//!
//! Key concepts:
//! - Do-actions holding each colour, cancelled when the colour is left early
//! - Completion transitions moving on to the next colour
//! - Shallow history resuming the last colour after a malfunction
//! - Events fired from the main thread while the worker runs
//!
//! Run with: cargo run --example traffic_light
//! Set RUST_LOG=statecraft=debug to follow the machine's own logging.

use statecraft::core::{ActionError, HistoryType, TransitionContext};
use statecraft::{state_ids, MachineConfig, StateMachineBuilder};
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

state_ids! {
    enum Light {
        Operating,
        Red,
        Green,
        Yellow,
        Flashing,
    }
}

state_ids! {
    enum Signal {
        Malfunction,
        Repaired,
    }
}

type Context = TransitionContext<Light, Signal>;

/// Keep the current colour for `duration` unless the state is left earlier.
fn hold(
    duration: Duration,
) -> impl Fn(&Context, CancellationToken) -> Result<(), ActionError> + Send + Sync + 'static {
    move |_: &Context, token: CancellationToken| {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline && !token.is_cancelled() {
            thread::sleep(Duration::from_millis(5));
        }
        Ok(())
    }
}

fn announce(light: Light) -> impl Fn(&Context) -> Result<(), ActionError> + Send + Sync + 'static {
    move |_: &Context| {
        println!("  light is {}", light.name());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let mut builder = StateMachineBuilder::<Light, Signal>::new();
    builder
        .define_hierarchy_on(Light::Operating)
        .with_history_type(HistoryType::Shallow)
        .with_initial_sub_state(Light::Red)?
        .with_sub_state(Light::Green)?
        .with_sub_state(Light::Yellow)?;

    let cycle = [
        (Light::Red, Light::Green, 300),
        (Light::Green, Light::Yellow, 300),
        (Light::Yellow, Light::Red, 100),
    ];
    for (light, next, millis) in cycle {
        builder
            .in_state(light)
            .execute_on_entry(announce(light))
            .execute_while_active_named(
                format!("hold {}", light.name()),
                hold(Duration::from_millis(millis)),
            )
            .on_completion(move |t| t.goto(next));
    }

    builder
        .in_state(Light::Operating)
        .on(Signal::Malfunction, |t| t.goto(Light::Flashing));
    builder
        .in_state(Light::Flashing)
        .execute_on_entry(announce(Light::Flashing))
        .on(Signal::Repaired, |t| t.goto(Light::Operating));

    let machine = builder.build(MachineConfig::active("traffic-light"))?;
    machine.initialize(Light::Operating)?;
    machine.start()?;

    println!("Cycling:");
    thread::sleep(Duration::from_millis(900));

    println!("\nMalfunction:");
    machine.fire(Signal::Malfunction)?;
    thread::sleep(Duration::from_millis(200));
    let interrupted = machine.snapshot().history;
    println!("  remembered: {interrupted:?}");

    println!("\nRepaired, resuming the interrupted colour:");
    machine.fire(Signal::Repaired)?;
    thread::sleep(Duration::from_millis(500));

    machine.stop()?;
    println!("\nStopped in {:?}", machine.current_state_ids());

    println!("\n=== Example Complete ===");
    Ok(())
}
