// Criterion benchmarks for Minder Match

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use minder_match::core::{
    assemble_pool, calculate_bounding_box, haversine_distance, parse_experience_years, Matcher,
};
use minder_match::models::{
    CandidateRecord, Coordinate, MatchRequest, PersonalityTrait, PreferenceWeights, Requester,
    TraitSet,
};
use serde_json::json;

const TRAITS: &[&str] = &["patient", "creative", "calm", "playful", "musical", "sporty"];

fn create_record(id: usize, lat: f64, lon: f64) -> CandidateRecord {
    CandidateRecord {
        id: id.to_string(),
        name: format!("Minder {}", id),
        bio: None,
        latitude: if id % 7 == 0 { None } else { Some(lat) },
        longitude: Some(lon),
        experience: Some(format!("{} years", id % 15)),
        hourly_rate: Some(10.0 + (id % 8) as f64),
        ratings: (0..id % 6).map(|r| (r % 5 + 1) as i32).collect(),
        personality_traits: Some(json!([TRAITS[id % TRAITS.len()], TRAITS[(id / 2) % TRAITS.len()]])),
        specialized_care: Some(json!(["infants"])),
        last_minute: id % 3 == 0,
        id_verified: true,
        background_checked: true,
    }
}

fn create_requester() -> Requester {
    Requester {
        id: "parent".to_string(),
        coordinate: Some(Coordinate::new(53.3498, -6.2603)),
        weights: PreferenceWeights::default(),
        max_distance_km: Some(15.0),
        personality_traits: Some(TraitSet::from([PersonalityTrait::Patient, PersonalityTrait::Calm])),
    }
}

fn create_records(count: usize) -> Vec<CandidateRecord> {
    (0..count)
        .map(|i| {
            let lat_offset = (i as f64 * 0.001) % 0.3;
            let lon_offset = (i as f64 * 0.0013) % 0.3;
            create_record(i, 53.3498 + lat_offset, -6.2603 + lon_offset)
        })
        .collect()
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(53.3498),
                black_box(-6.2603),
                black_box(53.35),
                black_box(-6.26),
            )
        });
    });
}

fn bench_bounding_box(c: &mut Criterion) {
    c.bench_function("bounding_box_calculation", |b| {
        b.iter(|| calculate_bounding_box(black_box(Coordinate::new(53.3498, -6.2603)), black_box(15.0)));
    });
}

fn bench_experience_parsing(c: &mut Criterion) {
    c.bench_function("parse_experience_years", |b| {
        b.iter(|| parse_experience_years(black_box("Registered for over 12 years, first aid trained")));
    });
}

fn bench_ranking(c: &mut Criterion) {
    let matcher = Matcher::with_defaults();
    let requester = create_requester();
    let request = MatchRequest::default();

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let candidates = assemble_pool(create_records(*candidate_count), &request);

        group.bench_with_input(
            BenchmarkId::new("rank", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    matcher.rank(
                        black_box(&requester),
                        black_box(candidates.clone()),
                        black_box(&request),
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_pool_assembly(c: &mut Criterion) {
    let records = create_records(100);
    let request = MatchRequest {
        last_minute: Some(true),
        ..MatchRequest::default()
    };

    c.bench_function("assemble_pool_100_records", |b| {
        b.iter(|| assemble_pool(black_box(records.clone()), black_box(&request)));
    });
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_bounding_box,
    bench_experience_parsing,
    bench_ranking,
    bench_pool_assembly
);

criterion_main!(benches);
