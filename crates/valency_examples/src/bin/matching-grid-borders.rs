use glam::{Affine3A, Vec3};
use valency::prelude::*;
use valency_examples::{init_tracing, render_grid_annotations};

const WIDTH: usize = 8;
const HEIGHT: usize = 6;

const E: u8 = 0;
const W: u8 = 1;
const N: u8 = 2;
const S: u8 = 3;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Floor everywhere, with a two-cell wall segment in the middle row.
    let floor = 0;
    let wall = 1;

    let mut positions: Vec<mint::Vector3<f32>> = Vec::new();
    let mut edges = Vec::new();
    let mut states = Vec::new();
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let node = y * WIDTH + x;
            positions.push(Vec3::new(x as f32, y as f32, 0.0).into());
            let is_wall = y == HEIGHT / 2 && (3..5).contains(&x);
            states.push(NodeState::Resolved(if is_wall { wall } else { floor }));
            if x + 1 < WIDTH {
                edges.push(Edge::new(node, node + 1));
            }
            if y + 1 < HEIGHT {
                edges.push(Edge::new(node, node + WIDTH));
            }
        }
    }

    let orbitals = OrbitalSet::cardinal("floor");
    let assignment = orbitals.assign(&positions, &edges)?;
    let cache = OrbitalCache::build(&assignment.node_masks, &edges, &assignment.edge_slots, 4)?;

    let patterns = CompiledPatternSet::new(vec![
        // Wall pair spanning two cells, replaced by one piece at the centroid.
        CompiledPattern::new(
            PatternSettings::new("Wall")
                .with_weight(5.0)
                .with_output(OutputStrategy::Collapse),
            vec![
                PatternEntry::accepting([wall]).with_adjacency(1, E, W),
                PatternEntry::accepting([wall]),
            ],
        ),
        // Floor corners: no neighbor to the south and west.
        CompiledPattern::new(
            PatternSettings::new("Corner").with_weight(2.0),
            vec![PatternEntry::accepting([floor]).with_boundary(1u64 << S | 1u64 << W)],
        ),
        CompiledPattern::new(
            PatternSettings::new("Ceiling").with_tag("edge"),
            vec![PatternEntry::accepting([floor]).with_boundary(1u64 << N)],
        ),
    ]);

    let mut matcher =
        PatternMatcher::try_new(MatcherConfig::default(), &patterns, &cache, &states)?;
    let mut sink = VecSink::only([ValencyEventKind::MatchClaimed]);
    let result = matcher.run_with_events(&mut ClaimedNodes::new(), &mut sink);

    println!(
        "{} matches over {} nodes; {} claim events",
        result.patterns_matched,
        result.nodes_annotated,
        sink.len()
    );
    let annotations = matcher.annotate();
    print!("{}", render_grid_annotations(WIDTH, &annotations));

    let transforms: Vec<Affine3A> = positions
        .iter()
        .map(|&p| Affine3A::from_translation(p.into()))
        .collect();
    let plan = RewritePlan::from_matches(
        &patterns,
        matcher.matches(),
        matcher.config().annotation_policy,
        &transforms,
    )?;
    for (node, transform) in &plan.collapsed {
        println!("collapse into node {node} at {}", transform.translation);
    }

    Ok(())
}
