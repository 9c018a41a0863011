use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use knapsack_lll::attack::StructuralAttack;
use knapsack_lll::knapsack::{encode, encrypt, Knapsack};
use knapsack_lll::lattice::{gram_schmidt, lll_reduce, Matrix};
use knapsack_lll::params::{BlockSize, LllParams, SetParams};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn lll_benchmark(c: &mut Criterion) {
    let params = LllParams::default();
    let mut group = c.benchmark_group("lll");
    group.sample_size(10);

    let small = Matrix::from_integer_rows(&[vec![47, 95], vec![215, 460]]).unwrap();
    group.bench_function("2x2", |b| {
        b.iter(|| lll_reduce(small.clone(), &params).unwrap());
    });

    let mut rng = ChaCha20Rng::seed_from_u64(1);
    for bytes in [1, 2] {
        let block_size = BlockSize::new(bytes).unwrap();
        let knapsack = Knapsack::random(block_size, &SetParams::default(), &mut rng).unwrap();
        let cipher = encrypt(&encode(&vec![0x5a; bytes], block_size), knapsack.public_key()).unwrap();

        let attack = StructuralAttack::new(block_size, knapsack.public_key()).unwrap();
        let basis = attack.knapsack_basis(&cipher.blocks()[0]);

        group.bench_with_input(
            BenchmarkId::new("gram_schmidt", format!("n={}", basis.cols())),
            &basis,
            |b, basis| {
                b.iter(|| gram_schmidt(basis).unwrap());
            },
        );

        group.bench_with_input(
            BenchmarkId::new("knapsack_lattice", format!("n={}", basis.cols())),
            &basis,
            |b, basis| {
                b.iter(|| lll_reduce(basis.clone(), &params).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, lll_benchmark);
criterion_main!(benches);
