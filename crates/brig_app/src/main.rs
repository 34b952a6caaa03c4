//! # brig_app — demo host
//!
//! Constructs a [`World`], registers a small sailing-flavoured set of
//! components, resources, and systems, and drives the tick loop.
//!
//! The wiring exercises the full registration surface: an updatable
//! component with a serializer pair, an eager init that self-registers a
//! system once its trigger component exists, a lazy init that publishes a
//! resource asynchronously, and a system that stays skipped until that
//! resource arrives.

mod driver;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use brig_component::Entity;
use brig_ecs::{Phase, World};

use driver::{TickConfig, TickLoop};

/// Seconds of simulation per tick at the configured tick rate.
const TICK_DT: f32 = 1.0 / 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Position {
    x: f32,
    y: f32,
}

fn mk_position(args: (f32, f32)) -> Position {
    Position {
        x: args.0,
        y: args.1,
    }
}

fn update_position(position: &mut Position, args: (f32, f32)) {
    position.x = args.0;
    position.y = args.1;
}

#[derive(Debug, Clone)]
struct Velocity {
    dx: f32,
    dy: f32,
}

fn mk_velocity(args: (f32, f32)) -> Velocity {
    Velocity {
        dx: args.0,
        dy: args.1,
    }
}

fn update_velocity(velocity: &mut Velocity, args: (f32, f32)) {
    velocity.dx = args.0;
    velocity.dy = args.1;
}

#[derive(Debug)]
struct SimClock {
    tick: u64,
}

fn mk_sim_clock(_: ()) -> SimClock {
    SimClock { tick: 0 }
}

#[derive(Debug)]
struct Wind {
    dx: f32,
    dy: f32,
}

fn mk_wind(args: (f32, f32)) -> Wind {
    Wind {
        dx: args.0,
        dy: args.1,
    }
}

struct HelmReady;

fn mk_helm_ready(_: ()) -> HelmReady {
    HelmReady
}

/// Swell table produced by the lazy init, standing in for an asset or GPU
/// bootstrap result.
struct SeaState {
    swell: Vec<f32>,
}

fn mk_sea_state(swell: Vec<f32>) -> SeaState {
    SeaState { swell }
}

fn serialize_position(position: &Position, buf: &mut Vec<u8>) {
    rmp_serde::encode::write(buf, position).expect("position encodes to MessagePack");
}

fn deserialize_position(position: &mut Position, bytes: &[u8]) {
    *position = rmp_serde::from_slice(bytes).expect("position decodes from MessagePack");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("brig_app=info".parse()?))
        .init();

    info!("brig host starting");

    let mut world = World::new();

    // Definitions.
    let position = world.define_component("position", mk_position, update_position)?;
    let velocity = world.define_component("velocity", mk_velocity, update_velocity)?;
    let sim_clock = world.define_resource("sim_clock", mk_sim_clock)?;
    let wind = world.define_resource("wind", mk_wind)?;
    let helm_ready = world.define_resource("helm_ready", mk_helm_ready)?;
    let sea_state = world.define_resource("sea_state", mk_sea_state)?;

    // The networking layer ships positions; the core only stores the pair.
    world.register_serializer_pair(position, serialize_position, deserialize_position)?;

    world.add_resource(sim_clock, ());
    world.add_resource(wind, (0.4, 0.1));

    world.add_system(
        "advance_clock",
        Phase::ReadInputs,
        None,
        &[sim_clock.id()],
        move |world, _| {
            world.resource_mut(sim_clock).tick += 1;
        },
    )?;

    // The helm comes up a few ticks in, gating everything downstream of it.
    world.add_system(
        "raise_helm",
        Phase::ReadInputs,
        None,
        &[sim_clock.id()],
        move |world, _| {
            let tick = world.resource(sim_clock).tick;
            if tick == 5 {
                world.add_resource(helm_ready, ());
                info!(tick, "helm ready");
            }
        },
    )?;
    world.run_after("raise_helm", "advance_clock");

    // Registered before apply_wind but constrained to run after it.
    world.add_system(
        "damp_motion",
        Phase::PrePhysics,
        Some(&[velocity.id()]),
        &[],
        move |world, entities| {
            for &e in entities {
                let vel = world.component_mut(e, velocity);
                vel.dx *= 0.995;
                vel.dy *= 0.995;
            }
        },
    )?;
    world.add_system(
        "apply_wind",
        Phase::PrePhysics,
        Some(&[velocity.id()]),
        &[wind.id()],
        move |world, entities| {
            let (wdx, wdy) = {
                let wind = world.resource(wind);
                (wind.dx, wind.dy)
            };
            for &e in entities {
                let vel = world.component_mut(e, velocity);
                vel.dx += wdx * TICK_DT;
                vel.dy += wdy * TICK_DT;
            }
        },
    )?;
    world.run_after("damp_motion", "apply_wind");

    // Motion integration self-registers the first time a position exists.
    world.add_eager_init(&[position.id()], &[], &[], move |world| {
        world
            .add_system(
                "integrate_motion",
                Phase::Physics,
                Some(&[position.id(), velocity.id()]),
                &[],
                move |world, entities| {
                    for &e in entities {
                        let (dx, dy) = {
                            let vel = world.component(e, velocity);
                            (vel.dx, vel.dy)
                        };
                        let pos = world.component_mut(e, position);
                        pos.x += dx * TICK_DT;
                        pos.y += dy * TICK_DT;
                    }
                },
            )
            .expect("integrate_motion registered once");
    });

    // The sea state needs the wind and the helm before it can be built.
    world.add_lazy_init(&[wind.id(), helm_ready.id()], sea_state, move |world| {
        let strength = {
            let wind = world.resource(wind);
            (wind.dx * wind.dx + wind.dy * wind.dy).sqrt()
        };
        async move {
            let swell = (0..64).map(|i| (i as f32 * 0.1).sin() * strength).collect();
            SeaState { swell }
        }
    });

    // Skipped every tick until the lazy init publishes the sea state.
    world.add_system(
        "report_sea",
        Phase::RenderPreDraw,
        Some(&[position.id()]),
        &[sea_state.id(), sim_clock.id()],
        move |world, entities| {
            let tick = world.resource(sim_clock).tick;
            if tick % 60 == 0 {
                let swell_len = world.resource(sea_state).swell.len();
                info!(tick, boats = entities.len(), swell_len, "sea report");
            }
        },
    )?;

    // A small fleet.
    let mut fleet: Vec<Entity> = Vec::new();
    for i in 0..3 {
        let boat = world.spawn();
        world.ensure_component_on(boat, position, (i as f32 * 10.0, 0.0));
        world.ensure_component_on(boat, velocity, (if i == 0 { 1.0 } else { 0.0 }, 0.0));
        fleet.push(boat);
    }
    let lead = fleet[0];

    // Watch for the sea state from a separate task while the loop runs.
    let sea_wait = world.when_resources(&[sea_state.id()]);
    let watcher = tokio::spawn(async move {
        sea_wait.await;
        info!("sea state ready");
    });

    let ticks = TickLoop::new(TickConfig {
        tick_rate: 60.0,
        max_ticks: 240,
    });
    ticks.run(&mut world).await?;
    watcher.await?;

    if let Some(view) = world.find_entity(lead, &[position.id()]) {
        let pos = view.get(position);
        info!(
            x = f64::from(pos.x),
            y = f64::from(pos.y),
            "lead boat final position"
        );
    }
    info!(
        ticks = world.tick_id(),
        entities = world.entity_count(),
        "brig host shut down"
    );
    Ok(())
}
