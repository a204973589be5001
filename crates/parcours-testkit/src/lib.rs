// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

const SERVICES: [&str; 6] = ["api", "auth", "billing", "worker", "search", "gateway"];

const ROUTES: [&str; 8] = [
    "/v1/orders",
    "/v1/orders/{id}",
    "/v1/users/{id}",
    "/v1/login",
    "/v1/search",
    "/v1/invoices",
    "/healthz",
    "/metrics",
];

const INFO_MESSAGES: [&str; 6] = [
    "request completed",
    "cache refreshed",
    "job finished",
    "connection opened",
    "session started",
    "config reloaded",
];

const WARN_MESSAGES: [&str; 4] = [
    "slow response",
    "retrying upstream call",
    "cache miss storm",
    "queue depth rising",
];

const ERROR_MESSAGES: [&str; 5] = [
    "upstream timed out",
    "database connection refused",
    "payment declined",
    "unexpected end of input",
    "permission denied",
];

const DEBUG_MESSAGES: [&str; 3] = ["entering handler", "parsed request body", "lock acquired"];

const REGIONS: [&str; 3] = ["us-east", "eu-west", "ap-south"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: OffsetDateTime,
    pub level: &'static str,
    pub message: String,
    pub service: &'static str,
    pub route: &'static str,
    pub status: u16,
    pub duration_ms: u64,
    pub request_id: String,
    /// JSON document encoded as a string, the way some loggers nest context.
    pub context: Option<String>,
}

impl LogEntry {
    pub fn to_json_line(&self) -> String {
        let mut value = json!({
            "ts": self.timestamp.format(&Rfc3339).unwrap_or_default(),
            "level": self.level,
            "msg": self.message,
            "service": self.service,
            "route": self.route,
            "status": self.status,
            "duration_ms": self.duration_ms,
            "request_id": self.request_id,
        });
        if let (Some(context), Some(object)) = (&self.context, value.as_object_mut()) {
            object.insert("context".to_owned(), json!(context));
        }
        value.to_string()
    }
}

/// Deterministic generator of service-style log lines. The same seed always
/// yields the same sequence, with strictly increasing timestamps.
#[derive(Debug, Clone)]
pub struct LogFaker {
    rng: DeterministicRng,
    clock: OffsetDateTime,
    emitted: u64,
}

impl LogFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            clock: reference_start(),
            emitted: 0,
        }
    }

    pub fn entry(&mut self) -> LogEntry {
        self.clock += Duration::milliseconds(1 + self.rng.int_n(1500) as i64);
        self.emitted += 1;

        let level = match self.rng.int_n(20) {
            0..=2 => "debug",
            3..=14 => "info",
            15..=17 => "warn",
            _ => "error",
        };
        let message = match level {
            "debug" => self.pick(&DEBUG_MESSAGES),
            "warn" => self.pick(&WARN_MESSAGES),
            "error" => self.pick(&ERROR_MESSAGES),
            _ => self.pick(&INFO_MESSAGES),
        }
        .to_owned();
        let status = match level {
            "error" => [500, 502, 503, 504][self.rng.int_n(4)],
            "warn" => [404, 409, 429][self.rng.int_n(3)],
            _ => [200, 201, 204][self.rng.int_n(3)],
        };
        let context = (self.rng.int_n(4) == 0).then(|| {
            let attempt = 1 + self.rng.int_n(3);
            let region = REGIONS[self.rng.int_n(REGIONS.len())];
            json!({ "attempt": attempt, "region": region }).to_string()
        });

        LogEntry {
            timestamp: self.clock,
            level,
            message,
            service: self.pick(&SERVICES),
            route: self.pick(&ROUTES),
            status,
            duration_ms: 1 + self.rng.int_n(2500) as u64,
            request_id: format!("req-{:06}-{:04x}", self.emitted, self.rng.int_n(0xffff)),
            context,
        }
    }

    pub fn lines(&mut self, count: usize) -> Vec<String> {
        (0..count).map(|_| self.entry().to_json_line()).collect()
    }

    fn pick(&mut self, items: &[&'static str]) -> &'static str {
        items[self.rng.int_n(items.len())]
    }
}

/// Small hand-written log with known values, including a line that is not
/// JSON and a message with a quote in it.
pub fn fixture_lines() -> Vec<String> {
    vec![
        r#"{"ts":"2026-02-19T12:00:00Z","level":"info","msg":"server started","service":"api","status":200}"#.to_owned(),
        r#"{"ts":"2026-02-19T12:00:01Z","level":"error","msg":"it's broken","service":"api","status":500}"#.to_owned(),
        r#"{"ts":"2026-02-19T12:00:02Z","level":"warn","msg":"slow response","service":"auth","status":429}"#.to_owned(),
        "plain text line from a crash handler".to_owned(),
        r#"{"ts":"2026-02-19T12:00:04Z","level":"info","msg":"request completed","service":"auth","status":90,"context":"{\"attempt\":2}"}"#.to_owned(),
        r#"{"ts":"2026-02-19T12:00:05Z","level":"error","msg":"upstream timed out","service":"billing","status":504}"#.to_owned(),
    ]
}

pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut file =
        fs::File::create(path).with_context(|| format!("create log file {}", path.display()))?;
    for line in lines {
        writeln!(file, "{line}").with_context(|| format!("write log file {}", path.display()))?;
    }
    Ok(())
}

pub fn temp_log_file(lines: &[String]) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("app.log");
    write_lines(&path, lines)?;
    Ok((dir, path))
}

fn reference_start() -> OffsetDateTime {
    datetime!(2026-01-01 00:00:00 UTC)
}
