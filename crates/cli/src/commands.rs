//! CLI commands, all built on the `serverset` public API.

use std::collections::BTreeMap;

use anyhow::{bail, Context};
use clap::Subcommand;

use serverset::{Bucket, HashRing, ServerSet};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the address that owns a key.
    Pick {
        /// Cache key to route.
        key: String,
        /// Server label, as `label` or `label=weight`. Repeatable.
        #[arg(short, long = "server", required = true)]
        servers: Vec<String>,
    },
    /// Show per-server ring points and sampled key distribution.
    Ring {
        /// Server label, as `label` or `label=weight`. Repeatable.
        #[arg(short, long = "server", required = true)]
        servers: Vec<String>,
        /// Number of synthetic keys to sample.
        #[arg(long, default_value_t = 100_000)]
        sample: usize,
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Command::Pick { key, servers } => pick(&key, &servers),
            Command::Ring {
                servers,
                sample,
                json,
            } => ring(&servers, sample, json),
        }
    }
}

/// Parse `label` or `label=weight` into a bucket.
fn parse_buckets(servers: &[String]) -> anyhow::Result<Vec<Bucket>> {
    servers
        .iter()
        .map(|spec| match spec.rsplit_once('=') {
            Some((label, weight)) => {
                let weight: u32 = weight
                    .parse()
                    .with_context(|| format!("invalid weight in {spec:?}"))?;
                Ok(Bucket::new(label, weight))
            }
            None => Ok(Bucket::new(spec.as_str(), 1)),
        })
        .collect()
}

fn pick(key: &str, servers: &[String]) -> anyhow::Result<()> {
    let set = ServerSet::new();
    set.set_buckets(&parse_buckets(servers)?)?;
    let addr = set.pick_server(key)?;
    println!("{addr}");
    Ok(())
}

fn ring(servers: &[String], sample: usize, json: bool) -> anyhow::Result<()> {
    if sample == 0 {
        bail!("--sample must be at least 1");
    }
    let buckets = parse_buckets(servers)?;
    let ring = HashRing::build(&buckets)?;

    let mut points: BTreeMap<&str, usize> = ring.labels().map(|l| (l, 0)).collect();
    for (_, label) in ring.points() {
        *points.entry(label).or_default() += 1;
    }

    let mut hits: BTreeMap<&str, usize> = ring.labels().map(|l| (l, 0)).collect();
    for i in 0..sample {
        let key = format!("sample-key-{i}");
        let owner = ring.lookup(&key)?;
        *hits.entry(owner).or_default() += 1;
    }

    if json {
        let entries: Vec<serde_json::Value> = points
            .iter()
            .map(|(label, count)| {
                serde_json::json!({
                    "label": label,
                    "points": count,
                    "share": hits[label] as f64 / sample as f64,
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "total_points": ring.point_count(),
                "servers": entries,
            }))?
        );
    } else {
        println!("{} points across {} servers", ring.point_count(), ring.bucket_count());
        for (label, count) in &points {
            println!(
                "{label:>24}  points={count:<4}  share={:.4}",
                hits[label] as f64 / sample as f64
            );
        }
    }
    Ok(())
}
