use glam::{Affine3A, Mat3, Vec3};
use rand::SeedableRng;
use valency::prelude::*;
use valency_examples::{init_tracing, render_placements};

fn socket_facing(position: Vec3, outward: Vec3) -> Affine3A {
    let z = outward.normalize();
    let y = Vec3::Z;
    Affine3A::from_mat3_translation(Mat3::from_cols(y.cross(z), y, z), position)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut sockets = SocketRules::new();
    let door = sockets.add_type("door")?;
    let vent = sockets.add_type("vent")?;
    sockets.set_compatibility(door, door, true);
    sockets.set_compatibility(vent, vent, true);

    let cell = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
    let socket = |name: &str, kind: usize, dir: Vec3| {
        CompiledSocket::new(name, kind, socket_facing(dir * 0.5, dir))
    };

    let mut rules = CompiledBondingRules::new(1)?;
    for def in [
        ModuleDefinition::new("hub")
            .with_weight(0.3)
            .with_spawn_limits(0, Some(4))
            .with_socket(socket("east", door, Vec3::X))
            .with_socket(socket("west", door, Vec3::NEG_X))
            .with_socket(socket("north", door, Vec3::Y))
            .with_socket(socket("south", vent, Vec3::NEG_Y)),
        ModuleDefinition::new("corridor")
            .with_weight(3.0)
            .with_socket(socket("east", door, Vec3::X))
            .with_socket(socket("west", door, Vec3::NEG_X)),
        ModuleDefinition::new("lab")
            .with_weight(0.5)
            .with_spawn_limits(3, None)
            .with_dead_end(true)
            .with_socket(socket("door", door, Vec3::NEG_X)),
        ModuleDefinition::new("vault")
            .with_weight(0.2)
            .with_spawn_limits(1, Some(1))
            .with_socket(socket("vent", vent, Vec3::Y)),
    ] {
        rules.push_module(def.with_layer(LayerMasks::default()).with_bounds(cell))?;
    }

    let config = GrowthConfig::new(2025)
        .with_strategy(GrowthStrategy::Random)
        .with_max_total_modules(40)
        .with_max_depth(12)
        .with_bounds_inflation(-0.01);
    let engine = GrowthEngine::try_new(config, &rules, &sockets)?;

    let mut sink = VecSink::only([ValencyEventKind::BranchDied]);
    let mut rng = rand::rngs::StdRng::seed_from_u64(engine.config().seed);
    let result = engine.run_with_rng(
        &[SeedPoint::named(Affine3A::IDENTITY, "hub")],
        &mut rng,
        &mut sink,
    )?;

    tracing::debug!("{} open sockets processed", result.sockets_processed);
    println!(
        "{} placements ({:?}), {} dead branches",
        result.placed.len(),
        result.termination,
        sink.len()
    );
    for module in 0..rules.module_count() {
        println!("  {:<9} {}", rules.name(module), result.count_of(module));
    }
    print!("{}", render_placements(&engine.outputs(&result)));

    Ok(())
}
