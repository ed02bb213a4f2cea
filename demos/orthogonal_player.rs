//! Media Player with Orthogonal Regions
//!
//! This example demonstrates a composite state with two independent regions
//! and saving the machine to JSON.
//!
//! Key concepts:
//! - Playback and volume regions changing independently
//! - Deep history restoring both regions after a power cycle
//! - An extension narrating state switches and declined events
//! - Snapshots restoring a fresh machine without running entry actions
//!
//! Run with: cargo run --example orthogonal_player

use statecraft::checkpoint::Snapshot;
use statecraft::core::HistoryType;
use statecraft::{
    state_ids, Extension, HierarchyError, MachineConfig, StateMachineBuilder, TransitionContext,
};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

state_ids! {
    enum Player {
        Off,
        On,
        Stopped,
        Playing,
        Paused,
        Normal,
        Muted,
    }
}

state_ids! {
    enum Button {
        Power,
        Play,
        Pause,
        Stop,
        Mute,
        Unmute,
    }
}

struct Narrator;

impl Extension<Player, Button> for Narrator {
    fn switched_state(&self, _machine: &str, old: Option<&Player>, new: &Player) {
        match old {
            Some(old) => println!("  {} -> {}", old.name(), new.name()),
            None => println!("  start in {}", new.name()),
        }
    }

    fn transition_declined(&self, _machine: &str, context: &TransitionContext<Player, Button>) {
        if let (Some(event), Some(state)) = (context.event_id(), context.source_state()) {
            println!("  {} ignored in {}", event.name(), state.name());
        }
    }
}

fn player() -> Result<StateMachineBuilder<Player, Button>, HierarchyError> {
    let mut builder = StateMachineBuilder::new();
    builder
        .define_hierarchy_on(Player::On)
        .with_history_type(HistoryType::Deep)
        .with_initial_sub_state(Player::Stopped)?
        .with_sub_state(Player::Playing)?
        .with_sub_state(Player::Paused)?;
    builder
        .define_region_on(Player::On)
        .with_initial_sub_state(Player::Normal)?
        .with_sub_state(Player::Muted)?;

    builder
        .in_state(Player::Off)
        .on(Button::Power, |t| t.goto(Player::On));
    builder
        .in_state(Player::On)
        .execute_on_entry(|_| {
            println!("  (amplifier warming up)");
            Ok(())
        })
        .on(Button::Power, |t| t.goto(Player::Off));
    builder
        .in_state(Player::Stopped)
        .on(Button::Play, |t| t.goto(Player::Playing));
    builder
        .in_state(Player::Playing)
        .on(Button::Pause, |t| t.goto(Player::Paused))
        .on(Button::Stop, |t| t.goto(Player::Stopped));
    builder
        .in_state(Player::Paused)
        .on(Button::Play, |t| t.goto(Player::Playing))
        .on(Button::Stop, |t| t.goto(Player::Stopped));
    builder
        .in_state(Player::Normal)
        .on(Button::Mute, |t| t.goto(Player::Muted));
    builder
        .in_state(Player::Muted)
        .on(Button::Unmute, |t| t.goto(Player::Normal));
    Ok(builder)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    println!("=== Media Player with Orthogonal Regions ===\n");

    let machine = player()?.build(MachineConfig::passive("player"))?;
    machine.add_extension(Arc::new(Narrator));
    machine.initialize(Player::Off)?;
    machine.start()?;

    for button in [
        Button::Power,
        Button::Play,
        Button::Mute,
        Button::Power,
        Button::Power,
        Button::Pause,
        Button::Mute,
    ] {
        println!("{}:", button.name());
        machine.fire(button)?;
    }
    println!("\nActive: {:?}", machine.current_state_ids());

    let json = machine.snapshot().to_json()?;
    println!("\nSaved:\n{json}");

    let restored = player()?.build(MachineConfig::passive("player"))?;
    restored.add_extension(Arc::new(Narrator));
    restored.load(&Snapshot::<Player>::from_json(&json)?)?;
    restored.start()?;
    println!("\nRestored without entry actions: {:?}", restored.current_state_ids());

    println!("Unmute:");
    restored.fire(Button::Unmute)?;
    println!("Active: {:?}", restored.current_state_ids());

    println!("\n=== Example Complete ===");
    Ok(())
}
