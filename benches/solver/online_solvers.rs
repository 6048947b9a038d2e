use adp::math::SimplexOracle;
use adp::mdp::{BasisSet, FunctionBasis, Model, StateDistribution, StateInfo, StateList};
use adp::policy::GreedyPolicyFactory;
use adp::solver::{
    ApproximateLpSolver, KalmanConfig, KalmanFilterSolver, Solver, TdConfig, TdSolver,
};
use adp::Result;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Single-server queue with capacity `capacity`: arrivals with probability
/// `arrival`, and a choice between a slow and a fast (costlier) server.
struct Queue {
    capacity: usize,
    arrival: f64,
}

impl Model for Queue {
    type State = usize;
    type Action = &'static str;

    fn base_state(&self) -> usize {
        0
    }

    fn state_info(&self, state: &usize) -> Result<StateInfo<usize, &'static str>> {
        let up = (*state + 1).min(self.capacity);
        let down = state.saturating_sub(1);
        let mut distributions = Vec::new();
        for service in [0.3, 0.6] {
            let p_up = self.arrival * (1.0 - service);
            let p_down = service * (1.0 - self.arrival);
            distributions.push(StateDistribution::from_pairs(vec![
                (up, p_up),
                (down, p_down),
                (*state, 1.0 - p_up - p_down),
            ])?);
        }
        StateInfo::new(vec!["slow", "fast"], distributions)
    }

    fn enumerate_states(&self) -> Result<Vec<usize>> {
        Ok((0..=self.capacity).collect())
    }
}

fn queue_basis<'a>() -> FunctionBasis<'a, usize> {
    FunctionBasis::new()
        .with("constant", |_: &usize| 1.0, -1e4, 1e4)
        .with("linear", |s: &usize| *s as f64, -1e4, 1e4)
        .with("quadratic", |s: &usize| (*s as f64).powi(2), -1e4, 1e4)
}

fn queue_cost(s: &usize) -> f64 {
    *s as f64
}

fn bench_online(c: &mut Criterion) {
    let model = Queue {
        capacity: 50,
        arrival: 0.4,
    };
    let basis = queue_basis();
    let mut group = c.benchmark_group("online_solvers");

    for steps in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("td", steps), &steps, |b, &steps| {
            b.iter(|| {
                let config = TdConfig {
                    alpha: 0.95,
                    lambda: 0.7,
                    gamma_a: 1e-4,
                    gamma_b: 1_000.0,
                    time_step_count: steps,
                    time_report_count: 0,
                };
                let mut solver = TdSolver::new(
                    &model,
                    &queue_cost,
                    &GreedyPolicyFactory,
                    &basis,
                    Box::new(ChaCha20Rng::seed_from_u64(1)),
                    config,
                )
                .unwrap();
                black_box(solver.solve().unwrap());
            })
        });

        group.bench_with_input(BenchmarkId::new("kalman", steps), &steps, |b, &steps| {
            b.iter(|| {
                let config = KalmanConfig {
                    alpha: 0.95,
                    gamma_a: 0.1,
                    gamma_b: 0.0,
                    time_step_count: steps,
                    time_report_count: 0,
                };
                let mut solver = KalmanFilterSolver::new(
                    &model,
                    &queue_cost,
                    &GreedyPolicyFactory,
                    &basis,
                    Box::new(ChaCha20Rng::seed_from_u64(1)),
                    config,
                )
                .unwrap();
                black_box(solver.solve().unwrap());
            })
        });
    }
    group.finish();
}

fn bench_alp(c: &mut Criterion) {
    let model = Queue {
        capacity: 30,
        arrival: 0.4,
    };
    let basis = queue_basis();
    let states = StateList::enumerate(&model).unwrap();
    let weights = vec![1.0 / states.state_count() as f64; states.state_count()];
    let oracle = SimplexOracle::default();

    c.bench_function("alp_queue_30", |b| {
        b.iter(|| {
            let mut solver =
                ApproximateLpSolver::new(&oracle, &states, &queue_cost, &weights, &basis, 0.95)
                    .unwrap();
            black_box(solver.solve().unwrap());
            black_box(basis.size())
        })
    });
}

criterion_group!(benches, bench_online, bench_alp);
criterion_main!(benches);
