//! Benchmarks for dbhandle

use criterion::{criterion_group, criterion_main, Criterion};
use dbhandle::config::DatabaseConfig;
use dbhandle::conninfo::{self, ConnInfo};
use std::hint::black_box;

fn config() -> DatabaseConfig {
    DatabaseConfig {
        driver: "postgres".to_string(),
        host: "db.internal.example.com".to_string(),
        port: 5432,
        user: "app".to_string(),
        password: "it's a secret".to_string(),
        password_env: None,
        name: "app".to_string(),
        schema: "tenant_a".to_string(),
    }
}

fn bench_conninfo_build(c: &mut Criterion) {
    let config = config();
    c.bench_function("conninfo_build", |b| {
        b.iter(|| conninfo::build(black_box(&config), black_box(&config.password)));
    });
}

fn bench_conninfo_parse(c: &mut Criterion) {
    let config = config();
    let built = conninfo::build(&config, &config.password);
    c.bench_function("conninfo_parse", |b| {
        b.iter(|| black_box(&built).parse::<ConnInfo>());
    });
}

criterion_group!(benches, bench_conninfo_build, bench_conninfo_parse);
criterion_main!(benches);
