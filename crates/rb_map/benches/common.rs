use std::collections::BTreeMap;
use std::hint::black_box;
use std::time::{Duration, Instant};

use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, BenchmarkId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rb_map::{OrderedMap, RbTreeMap, UnbalancedBst};

const SAMPLE_SIZE: usize = 15;
const WARM_UP_MS: u64 = 100;
const MEASURE_MS: u64 = 200;

const SIZES: [usize; 4] = [1_000, 4_000, 16_000, 64_000];
/// Sorted input makes the unbalanced baseline quadratic; keep it small.
const ASCENDING_SIZES: [usize; 3] = [256, 1_024, 4_096];
const OPS_PER_ITER: usize = 200;
const GET_HIT_RATE_PERCENT: u32 = 80;
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Clone, Copy)]
pub enum Workload {
    /// Gets and lower-bound probes only.
    Read,
    /// Alternating insert / remove of fresh keys.
    Update,
    /// 80% reads, 10% inserts, 10% removes.
    Mixed,
}

impl Workload {
    fn id(self) -> u64 {
        match self {
            Self::Read => 1,
            Self::Update => 2,
            Self::Mixed => 3,
        }
    }

    /// Percentage of operations that are updates (split evenly between
    /// inserts and removes).
    fn update_percent(self) -> u32 {
        match self {
            Self::Read => 0,
            Self::Update => 100,
            Self::Mixed => 20,
        }
    }
}

#[derive(Clone, Copy)]
enum Op {
    Get(u64),
    LowerBound(u64),
    Insert(u64, u64),
    Remove(u64),
}

fn apply_runtime_config<M: Measurement>(group: &mut BenchmarkGroup<'_, M>) {
    group.sample_size(SAMPLE_SIZE);
    group.warm_up_time(Duration::from_millis(WARM_UP_MS));
    group.measurement_time(Duration::from_millis(MEASURE_MS));
}

fn mix_seed(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn read_op(keys: &[u64], rng: &mut StdRng) -> Op {
    if rng.random_bool(0.5) {
        let key = if rng.random_range(0..100) < GET_HIT_RATE_PERCENT {
            keys[rng.random_range(0..keys.len())]
        } else {
            rng.random()
        };
        Op::Get(key)
    } else {
        Op::LowerBound(rng.random())
    }
}

/// Builds one iteration's operations. Every key inserted here is removed
/// again before the batch ends, so the map size stays fixed across
/// iterations.
fn generate_ops(workload: Workload, keys: &[u64], fresh_base: u64, rng: &mut StdRng) -> Vec<Op> {
    let updates = (OPS_PER_ITER as u32 * workload.update_percent() / 100) as usize / 2 * 2;
    let mut ops = Vec::with_capacity(OPS_PER_ITER);
    let mut live = Vec::with_capacity(updates / 2);
    let mut inserts_left = updates / 2;
    let mut removes_left = updates / 2;

    while ops.len() < OPS_PER_ITER {
        let slots = OPS_PER_ITER - ops.len();
        let reads_left = slots - inserts_left - removes_left;
        if reads_left > 0 && rng.random_range(0..slots) < reads_left {
            ops.push(read_op(keys, rng));
            continue;
        }
        let remove = removes_left > 0
            && !live.is_empty()
            && (inserts_left == 0 || rng.random_bool(0.5));
        if remove {
            let key = live.swap_remove(rng.random_range(0..live.len()));
            ops.push(Op::Remove(key));
            removes_left -= 1;
        } else {
            let key = mix_seed(fresh_base ^ inserts_left as u64);
            live.push(key);
            ops.push(Op::Insert(key, rng.random()));
            inserts_left -= 1;
        }
    }
    ops
}

fn run_ops<M>(map: &mut M, ops: &[Op])
where
    M: OrderedMap<Key = u64, Value = u64>,
{
    for op in ops {
        match *op {
            Op::Get(key) => {
                black_box(map.get(&key).copied());
            }
            Op::LowerBound(key) => {
                black_box(map.lower_bound(&key).map(|(k, v)| (*k, *v)));
            }
            Op::Insert(key, value) => {
                black_box(map.insert(key, value));
            }
            Op::Remove(key) => {
                black_box(map.remove(&key));
            }
        }
    }
}

pub fn bench_workload<M, T>(group: &mut BenchmarkGroup<'_, T>, workload: Workload, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedMap<Key = u64, Value = u64>,
{
    for &size in &SIZES {
        apply_runtime_config(group);
        let base_seed = mix_seed((workload.id() << 48) ^ size as u64);
        let keys: Vec<u64> = (0..size).map(|i| mix_seed(base_seed ^ i as u64)).collect();
        let mut init_rng = StdRng::seed_from_u64(base_seed);
        let mut map = M::new();
        for &k in &keys {
            black_box(map.insert(k, init_rng.random()));
        }

        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for iter in 0..iters {
                    let iter_seed = mix_seed(base_seed ^ iter.wrapping_mul(SEED_MIX));
                    let mut rng = StdRng::seed_from_u64(iter_seed);
                    let ops = generate_ops(workload, &keys, !iter_seed, &mut rng);
                    let start = Instant::now();
                    run_ops(&mut map, &ops);
                    black_box(map.len());
                    total += start.elapsed();
                }
                total
            })
        });
    }
}

pub fn bench_ascending<M, T>(group: &mut BenchmarkGroup<'_, T>, label: &str)
where
    T: Measurement<Value = Duration>,
    M: OrderedMap<Key = u64, Value = u64>,
{
    for &size in &ASCENDING_SIZES {
        apply_runtime_config(group);
        group.bench_function(BenchmarkId::new(label, size), |bencher| {
            bencher.iter(|| {
                let mut map = M::new();
                for k in 0..size as u64 {
                    black_box(map.insert(k, k));
                }
                black_box(map.get(&(size as u64 / 2)).copied())
            })
        });
    }
}

pub fn bench_all<T>(group: &mut BenchmarkGroup<'_, T>, workload: Workload)
where
    T: Measurement<Value = Duration>,
{
    bench_workload::<BTreeMap<u64, u64>, _>(group, workload, "std_btree");
    bench_workload::<RbTreeMap<u64, u64>, _>(group, workload, "rb");
    bench_workload::<UnbalancedBst<u64, u64>, _>(group, workload, "bst");
}

pub fn bench_all_ascending<T>(group: &mut BenchmarkGroup<'_, T>)
where
    T: Measurement<Value = Duration>,
{
    bench_ascending::<BTreeMap<u64, u64>, _>(group, "std_btree");
    bench_ascending::<RbTreeMap<u64, u64>, _>(group, "rb");
    bench_ascending::<UnbalancedBst<u64, u64>, _>(group, "bst");
}
