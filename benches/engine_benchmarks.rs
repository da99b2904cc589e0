use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use readyrs::{
    baseline::BaselineCalculator,
    engine::DailyInput,
    hrv::HrvProcessor,
    models::{HeartRateSample, HeartRateSource, HrvSample, SleepSession},
    strain::StrainCalculator,
    InMemoryScoreRepository, ScoreEngine, ScoreHistory, ScoreRepository,
};

/// Benchmarks for the score calculators and the daily pipeline
///
/// History sizes cover a new user through a fully mature baseline.

fn create_rr_series(beats: usize) -> Vec<f64> {
    (0..beats)
        .map(|i| 800.0 + ((i * 37) % 60) as f64 - 30.0)
        .collect()
}

fn create_hr_day(samples: usize) -> Vec<HeartRateSample> {
    let start = Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap();
    (0..samples)
        .map(|i| HeartRateSample {
            timestamp: start + Duration::seconds(i as i64 * 10),
            beats_per_minute: 55.0 + ((i * 13) % 120) as f64,
            source: HeartRateSource::Watch,
        })
        .collect()
}

fn create_day_input(date: NaiveDate) -> DailyInput {
    let wake = Utc.from_utc_datetime(&date.and_hms_opt(6, 30, 0).unwrap());
    let session = SleepSession {
        start_date: wake - Duration::minutes(450),
        end_date: wake,
        stages: Vec::new(),
    };
    DailyInput {
        hrv_samples: vec![HrvSample {
            timestamp: wake,
            sdnn_ms: 45.0 + (date.ordinal() % 10) as f64,
            rr_intervals_ms: Some(create_rr_series(300)),
        }],
        resting_heart_rate: Some(56.0 + (date.ordinal() % 5) as f64),
        sleep_sessions: vec![session],
        ..DailyInput::new(date)
    }
}

fn seeded_repository(engine: &ScoreEngine, start: NaiveDate, days: i64) -> InMemoryScoreRepository {
    let mut repository = InMemoryScoreRepository::new();
    for offset in 0..days {
        let input = create_day_input(start + Duration::days(offset));
        let _ = engine.process_day(&input, &mut repository);
    }
    repository
}

fn bench_hrv_analysis(c: &mut Criterion) {
    let processor = HrvProcessor::new();
    let mut group = c.benchmark_group("HRV Analysis");

    for &beats in &[60, 300, 3000] {
        let rr = create_rr_series(beats);
        group.throughput(Throughput::Elements(beats as u64));
        group.bench_with_input(BenchmarkId::new("analyze", beats), &rr, |b, rr| {
            b.iter(|| processor.analyze(black_box(rr)));
        });
    }

    group.finish();
}

fn bench_strain(c: &mut Criterion) {
    let mut group = c.benchmark_group("Strain Calculation");
    let date = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();

    for &samples in &[360, 8640] {
        let day = create_hr_day(samples);
        group.throughput(Throughput::Elements(samples as u64));
        group.bench_with_input(BenchmarkId::new("calculate", samples), &day, |b, day| {
            b.iter(|| StrainCalculator::calculate(date, black_box(day), &[], 190.0));
        });
    }

    group.finish();
}

fn bench_baseline(c: &mut Criterion) {
    let calculator = BaselineCalculator::new();
    let date = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
    let mut group = c.benchmark_group("Adaptive Baseline");

    for &days in &[7, 30, 90] {
        let hrv: Vec<f64> = (0..days).map(|i| 45.0 + (i % 11) as f64).collect();
        let rhr: Vec<f64> = (0..days).map(|i| 55.0 + (i % 5) as f64).collect();
        group.bench_with_input(BenchmarkId::new("calculate_adaptive", days), &days, |b, _| {
            b.iter(|| calculator.calculate_adaptive(date, black_box(&hrv), black_box(&rhr), None));
        });
    }

    group.finish();
}

fn bench_score_day(c: &mut Criterion) {
    let engine = ScoreEngine::default();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut group = c.benchmark_group("Daily Pipeline");

    for &days in &[7, 30, 90] {
        let repository = seeded_repository(&engine, start, days);
        let date = start + Duration::days(days);
        let history = ScoreHistory::from_records(
            repository.fetch_range(start, date).unwrap_or_default(),
        );
        let input = create_day_input(date);

        group.bench_with_input(BenchmarkId::new("score_day", days), &days, |b, _| {
            b.iter(|| engine.score_day(black_box(&input), black_box(&history)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hrv_analysis,
    bench_strain,
    bench_baseline,
    bench_score_day
);
criterion_main!(benches);
