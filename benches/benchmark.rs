// Benchmarks for filtering, ranking and nearest-neighbour search
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use playsift_core::{
    filter, nearest_neighbors, rank, EmbeddingSpace, FeatureRow, FeatureStore, Field,
    InstrumentalOrVoice, KeyScale, Predicate, RankingSpec, Scale, SortOrder, StyleVocabulary,
    Vector,
};
use rand::prelude::*;
use std::sync::Arc;

const STYLES: usize = 400;

fn vocabulary() -> Arc<StyleVocabulary> {
    let classes = (0..STYLES)
        .map(|i| format!("Genre{}---Style{}", i % 15, i))
        .collect();
    Arc::new(StyleVocabulary::new(classes).unwrap())
}

fn generate_row(rng: &mut StdRng, id: usize) -> FeatureRow {
    let key = KeyScale::new("C", if rng.random_bool(0.5) { Scale::Major } else { Scale::Minor });
    FeatureRow {
        key: format!("audio/track_{}.mp3", id),
        tempo: rng.random_range(60.0..180.0),
        key_scales: [key.clone(), key.clone(), key],
        loudness: rng.random_range(-30.0..0.0),
        instrumental_or_voice: if rng.random_bool(0.5) {
            InstrumentalOrVoice::Voice
        } else {
            InstrumentalOrVoice::Instrumental
        },
        danceability: rng.random_range(0.0..1.0),
        arousal: rng.random_range(1.0..9.0),
        valence: rng.random_range(1.0..9.0),
        genre_activations: (0..STYLES).map(|_| rng.random_range(0.0..1.0)).collect(),
    }
}

fn generate_store(size: usize) -> FeatureStore {
    let mut rng = StdRng::seed_from_u64(42);
    let rows = (0..size).map(|i| generate_row(&mut rng, i)).collect();
    FeatureStore::new(vocabulary(), rows).unwrap()
}

fn generate_space(size: usize, dim: usize) -> EmbeddingSpace {
    let mut rng = StdRng::seed_from_u64(7);
    let entries = (0..size).map(|i| {
        let data: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
        (format!("audio/track_{}.mp3", i), Vector::new(data))
    });
    EmbeddingSpace::new("bench", entries).unwrap()
}

fn benchmark_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");
    let predicates = [
        Predicate::range(Field::Tempo, 100.0, 140.0),
        Predicate::range(Field::style("Genre3---Style3"), 0.5, 1.0),
        Predicate::one_of(Field::InstrumentalOrVoice, ["Voice"]),
    ];

    for size in [1000, 10000].iter() {
        let store = generate_store(*size);
        group.bench_with_input(BenchmarkId::new("conjunction", size), size, |b, _| {
            b.iter(|| filter(black_box(&store), black_box(&predicates)).unwrap());
        });
    }

    group.finish();
}

fn benchmark_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let store = generate_store(10000);
    let all = filter(&store, &[]).unwrap();

    let by_tempo = RankingSpec::by_field(Field::Tempo, SortOrder::Descending);
    group.bench_function("by_field", |b| {
        b.iter(|| rank(black_box(&all), &store, Some(&by_tempo)).unwrap());
    });

    let product =
        RankingSpec::style_product(["Genre1---Style1", "Genre2---Style2", "Genre3---Style3"]);
    group.bench_function("style_product", |b| {
        b.iter(|| rank(black_box(&all), &store, Some(&product)).unwrap());
    });

    group.finish();
}

fn benchmark_nearest_neighbors(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_neighbors");

    // the two embedding spaces produced by the extractor
    for dim in [200, 1280].iter() {
        let space = generate_space(5000, *dim);
        group.bench_with_input(BenchmarkId::new("exact", dim), dim, |b, _| {
            b.iter(|| {
                nearest_neighbors(black_box("audio/track_17.mp3"), &space, true, 10).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_filter, benchmark_rank, benchmark_nearest_neighbors);
criterion_main!(benches);
