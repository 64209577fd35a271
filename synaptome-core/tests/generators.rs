//! Cross-generator behaviour through the public API.

mod common;

use std::collections::HashSet;

use common::{assert_simple, ids, rng};
use proptest::prelude::*;
use rand::Rng;
use rstest::rstest;
use synaptome_core::{
    AllToAllParams, ConnectionSpec, DegreeType, DistanceRule, DistanceRuleParams, Edge, ErdosRenyiParams,
    FixedDegreeParams, GaussianDegreeParams, GenerationError, GraphModel, GraphOptions, NewmanWattsParams,
    Positions, RandomScaleFreeParams, ReciprocityChoice, circular, circular_full, compute_connections,
    connect_groups, filter_edges, from_degree_list, generate_erdos_renyi, generate_fixed_degree,
    generate_newman_watts, in_degrees, out_degrees, reciprocity,
};
use synaptome_test_support::ci::property_test_profile::ProptestRunProfile;
use test_strategy::Arbitrary;

fn grid(side: usize) -> Positions {
    let points = (0..side * side)
        .map(|index| [(index % side) as f64, (index / side) as f64])
        .collect();
    Positions::planar(points)
}

fn models() -> Vec<GraphModel> {
    vec![
        GraphModel::AllToAll(AllToAllParams::default()),
        GraphModel::ErdosRenyi(ErdosRenyiParams::new(ConnectionSpec::from_density(0.1))),
        GraphModel::ErdosRenyi(ErdosRenyiParams::new(ConnectionSpec::from_avg_deg(4.0)).with_reciprocity(0.4)),
        GraphModel::RandomScaleFree(RandomScaleFreeParams::new(2.2, 2.6).expect("valid exponents")),
        GraphModel::NewmanWatts(NewmanWattsParams::new(4, 0.2).expect("valid")),
        GraphModel::FixedDegree(FixedDegreeParams::new(4)),
        GraphModel::FixedDegree(FixedDegreeParams::new(4).with_degree_type(DegreeType::Total)),
        GraphModel::GaussianDegree(GaussianDegreeParams::new(4.0, 1.0).expect("valid")),
        GraphModel::DistanceRule(
            DistanceRuleParams::new(2.0)
                .expect("valid")
                .with_connections(ConnectionSpec::from_avg_deg(3.0)),
        ),
        GraphModel::DistanceRule(
            DistanceRuleParams::new(2.0)
                .expect("valid")
                .with_rule(DistanceRule::Linear)
                .with_max_proba(0.8)
                .expect("valid"),
        ),
    ]
}

#[rstest]
#[case::directed(GraphOptions::default())]
#[case::undirected(GraphOptions::undirected())]
fn simple_graphs_have_no_loops_or_duplicates(#[case] options: GraphOptions) {
    let nodes = ids(49);
    let positions = grid(7);
    for (seed, model) in models().into_iter().enumerate() {
        let mut rng = rng(seed as u64);
        let out = connect_groups(&mut rng, &nodes, &nodes, &model, options, Some(&positions))
            .unwrap_or_else(|err| panic!("{model:?} failed: {err}"));
        assert_simple(&out.edges, options.directed());
        if let Some(distances) = out.distances {
            assert_eq!(distances.len(), out.edges.len());
        }
    }
}

#[rstest]
fn filtering_generator_output_is_idempotent() {
    let nodes = ids(49);
    let positions = grid(7);
    for (seed, model) in models().into_iter().enumerate() {
        let mut rng = rng(100 + seed as u64);
        let out = connect_groups(&mut rng, &nodes, &nodes, &model, GraphOptions::default(), Some(&positions))
            .expect("feasible");
        assert_eq!(filter_edges(Vec::new(), &out.edges, true, false), out.edges);
    }
}

#[rstest]
fn erdos_renyi_hits_count_and_reciprocity() {
    let nodes = ids(200);
    let params = ErdosRenyiParams::new(ConnectionSpec::from_density(0.05)).with_reciprocity(0.5);
    let mut measured = Vec::new();
    for seed in 0..5 {
        let mut rng = rng(seed);
        let edges = generate_erdos_renyi(&mut rng, &nodes, &nodes, &params, GraphOptions::default())
            .expect("feasible");
        let expected = 200.0 * 199.0 * 0.05;
        assert!((edges.len() as f64 - expected).abs() <= 0.01 * expected, "{} edges", edges.len());
        assert_simple(&edges, true);
        measured.push(reciprocity(&edges));
    }
    let mean = measured.iter().sum::<f64>() / measured.len() as f64;
    assert!((mean - 0.5).abs() < 0.05, "mean reciprocity {mean}");
}

#[rstest]
fn fixed_in_degree_matches_exactly() {
    let nodes = ids(50);
    let mut rng = rng(7);
    let edges = generate_fixed_degree(&mut rng, &nodes, &nodes, &FixedDegreeParams::new(4), GraphOptions::default())
        .expect("feasible");
    assert_eq!(edges.len(), 200);
    assert_eq!(in_degrees(&edges, 50), vec![4; 50]);
}

#[rstest]
fn non_graphical_sequence_is_rejected_before_sampling() {
    let nodes = ids(6);
    let mut rng = rng(1);
    let err = from_degree_list(
        &mut rng,
        &nodes,
        &nodes,
        &[5, 5, 5, 5, 1, 1],
        DegreeType::Total,
        &[],
        GraphOptions::default(),
    )
    .expect_err("not graphical");
    assert!(matches!(err, GenerationError::NotGraphical { .. }));
}

#[rstest]
#[case::directed(true)]
#[case::undirected(false)]
fn newman_watts_without_shortcuts_is_the_ring(#[case] directed: bool) {
    let nodes = ids(30);
    let options = GraphOptions::default().with_directed(directed);
    let params = NewmanWattsParams::new(6, 0.0).expect("valid");
    let mut rng = rng(3);
    let nw: HashSet<Edge> = generate_newman_watts(&mut rng, &nodes, &nodes, &params, options)
        .expect("feasible")
        .into_iter()
        .collect();
    let ring: HashSet<Edge> = circular_full(&nodes, 6, directed).expect("valid").into_iter().collect();
    assert_eq!(nw, ring);
}

#[rstest]
#[case::random(ReciprocityChoice::Random)]
#[case::closest(ReciprocityChoice::Closest)]
#[case::ordered(ReciprocityChoice::ClosestOrdered)]
fn partially_reciprocal_rings_stay_simple(#[case] choice: ReciprocityChoice) {
    let nodes = ids(40);
    let mut rng = rng(5);
    let edges = circular(&mut rng, &nodes, 6, 0.3, true, choice).expect("valid");
    assert_simple(&edges, true);
}

#[rstest]
fn far_pair_connects_with_exponential_probability() {
    let positions = Positions::planar(vec![[0.0, 0.0], [500.0, 0.0]]);
    let params = DistanceRuleParams::new(50.0)
        .expect("valid")
        .with_max_proba(1.0)
        .expect("valid");
    let model = GraphModel::DistanceRule(params);
    let probability = (-500.0f64 / 50.0).exp();
    for seed in 0..32 {
        let draw: f64 = rng(seed).r#gen();
        let mut generator = rng(seed);
        let out = connect_groups(&mut generator, &[0], &[1], &model, GraphOptions::default(), Some(&positions))
            .expect("valid");
        assert_eq!(out.edges.len(), usize::from(draw < probability));
    }
}

/// Model family drawn by the dispatcher property.
#[derive(Clone, Copy, Debug, Arbitrary)]
enum ModelCase {
    #[weight(3)]
    ErdosRenyi,
    #[weight(2)]
    ReciprocalErdosRenyi,
    #[weight(2)]
    ScaleFree,
    #[weight(2)]
    NewmanWatts,
    #[weight(2)]
    FixedDegree,
    #[weight(1)]
    GaussianDegree,
    #[weight(2)]
    DistanceRule,
}

impl ModelCase {
    fn model(self) -> GraphModel {
        match self {
            Self::ErdosRenyi => GraphModel::ErdosRenyi(ErdosRenyiParams::new(ConnectionSpec::from_density(0.08))),
            Self::ReciprocalErdosRenyi => GraphModel::ErdosRenyi(
                ErdosRenyiParams::new(ConnectionSpec::from_density(0.08)).with_reciprocity(0.5),
            ),
            Self::ScaleFree => {
                GraphModel::RandomScaleFree(RandomScaleFreeParams::new(2.5, 2.5).expect("valid exponents"))
            }
            Self::NewmanWatts => GraphModel::NewmanWatts(NewmanWattsParams::new(4, 0.1).expect("valid")),
            Self::FixedDegree => GraphModel::FixedDegree(FixedDegreeParams::new(2)),
            Self::GaussianDegree => GraphModel::GaussianDegree(GaussianDegreeParams::new(3.0, 0.5).expect("valid")),
            Self::DistanceRule => GraphModel::DistanceRule(
                DistanceRuleParams::new(1.5)
                    .expect("valid")
                    .with_max_proba(0.6)
                    .expect("valid"),
            ),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: ProptestRunProfile::load(64, false).cases(),
        ..ProptestConfig::default()
    })]

    #[test]
    fn undirected_connections_are_halved(
        sources in 1usize..60,
        targets in 1usize..60,
        edges in 0usize..2000,
    ) {
        let counts = compute_connections(sources, targets, &ConnectionSpec::from_edges(edges), false, None)
            .expect("edge counts are always valid");
        prop_assert_eq!(counts.edges, edges / 2);
        prop_assert_eq!(counts.pre_reciprocal_edges, edges / 2);
    }

    #[test]
    fn erdos_renyi_outputs_are_simple(
        nodes in 2usize..40,
        density in 0.0f64..0.6,
        directed in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let ids = ids(nodes);
        let options = GraphOptions::default().with_directed(directed);
        let params = ErdosRenyiParams::new(ConnectionSpec::from_density(density));
        let mut rng = rng(seed);
        let edges = generate_erdos_renyi(&mut rng, &ids, &ids, &params, options).expect("feasible");
        let mut seen = HashSet::new();
        for edge in &edges {
            prop_assert!(!edge.is_self_loop());
            let key = if directed { *edge } else { edge.canonical() };
            prop_assert!(seen.insert(key));
        }
        prop_assert_eq!(filter_edges(Vec::new(), &edges, true, false).len(), edges.len());
    }

    #[test]
    fn fixed_out_degrees_are_exact(nodes in 2usize..40, degree in 0usize..6, seed in any::<u64>()) {
        prop_assume!(degree < nodes);
        let ids = ids(nodes);
        let params = FixedDegreeParams::new(degree).with_degree_type(DegreeType::Out);
        let mut rng = rng(seed);
        let edges = generate_fixed_degree(&mut rng, &ids, &ids, &params, GraphOptions::default()).expect("feasible");
        prop_assert_eq!(out_degrees(&edges, nodes), vec![degree; nodes]);
    }

    #[test]
    fn dispatched_models_stay_simple(case in any::<ModelCase>(), directed in any::<bool>(), seed in any::<u64>()) {
        let nodes = ids(36);
        let positions = grid(6);
        let options = GraphOptions::default().with_directed(directed);
        let mut rng = rng(seed);
        let out = connect_groups(&mut rng, &nodes, &nodes, &case.model(), options, Some(&positions))
            .expect("feasible");
        let mut seen = HashSet::new();
        for edge in &out.edges {
            prop_assert!(!edge.is_self_loop());
            let key = if directed { *edge } else { edge.canonical() };
            prop_assert!(seen.insert(key));
        }
    }
}
