use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use rdraughts_core::{
    Engine, EngineConfig, HeuristicEvaluator, Position, SearchController, StopFlag, Variant,
};
use serde::Serialize;
use tools::common::{io, logging};

/// English の標準ベンチ局面
const ENGLISH_BENCH: &[&str] = &[
    "startpos",
    "W:W21,22,23,25,27,30:B5,6,9,11,12,14",
    "B:W17,21,22,24,26,29,31:B1,3,6,8,10,12,15",
    "W:WK14,22,27:B7,11,K18",
    "W:W19,22,23,24,26,27:B2,5,9,10,12,13",
];

/// International の標準ベンチ局面
const INTERNATIONAL_BENCH: &[&str] = &[
    "startpos",
    "W:W28,31,32,33,34,36,37,38,39,41,42,43,44,45:B6,7,8,9,11,12,13,14,15,17,18,19,20,24",
    "B:W27,32,33,37,38,42,43,48:B8,12,13,17,18,19,22,24",
];

/// 探索速度の計測。局面ごとに探索して nodes / nps を表示する。
///
/// # 使用例
///
/// - 既定の局面をミニマックスで計測:
///   `cargo run --release -p tools --bin bench_search -- --depth 8`
///
/// - 設定ファイルと局面リストを指定し、結果を JSONL に書き出す:
///   `cargo run --release -p tools --bin bench_search -- --config bench.json --positions fens.txt --out bench.jsonl`
#[derive(Parser, Debug)]
#[command(author, version, about = "Search benchmark over a fixed set of positions")]
struct Cli {
    /// Board variant (english / international)
    #[arg(long, default_value = "english")]
    variant: String,

    /// Engine config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// File with one FEN per line (defaults to the built-in set)
    #[arg(long)]
    positions: Option<PathBuf>,

    /// Override the minimax depth
    #[arg(long)]
    depth: Option<i32>,

    /// Time budget per position in milliseconds
    #[arg(long)]
    time_ms: Option<u64>,

    /// Repetitions per position
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Write one JSON record per search to this file
    #[arg(long)]
    out: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BenchRecord {
    index: usize,
    fen: String,
    best_move: String,
    nodes: u64,
    depth: i32,
    elapsed_ms: u128,
    nps: u64,
    termination: String,
}

fn builtin_positions(variant: Variant) -> Result<Vec<Position>> {
    let fens = match variant {
        Variant::English => ENGLISH_BENCH,
        Variant::International => INTERNATIONAL_BENCH,
    };
    fens.iter().map(|fen| io::parse_position(variant, fen)).collect()
}

fn nps(nodes: u64, elapsed: Duration) -> u64 {
    let micros = elapsed.as_micros().max(1);
    (nodes as u128 * 1_000_000 / micros) as u64
}

fn run(cli: &Cli, config: &EngineConfig, positions: &[Position], variant: Variant) -> Result<()> {
    let mut out = match &cli.out {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => None,
    };

    let controller = SearchController::default();
    let mut engine =
        Engine::with_controller(Arc::new(HeuristicEvaluator::default()), controller.clone());
    let mut total_nodes = 0u64;
    let start = Instant::now();

    for (index, pos) in positions.iter().enumerate() {
        for _ in 0..cli.repeat {
            engine.clear();
            let limits = controller.limits(cli.time_ms.map(Duration::from_millis), StopFlag::new());
            let result = match engine.search(pos, config, &limits) {
                Ok(result) => result,
                Err(e) => {
                    log::warn!("position {index} skipped: {e}");
                    continue;
                }
            };
            total_nodes += result.stats.nodes;
            let record = BenchRecord {
                index,
                fen: pos.to_fen(),
                best_move: result.best_move.notation(variant),
                nodes: result.stats.nodes,
                depth: result.stats.depth,
                elapsed_ms: result.elapsed.as_millis(),
                nps: nps(result.stats.nodes, result.elapsed),
                termination: result.termination.to_string(),
            };
            println!(
                "#{:<3} {:>10} nodes {:>10} depth {:>2} {:>6}ms {:>9} nps",
                record.index,
                record.best_move,
                record.nodes,
                record.depth,
                record.elapsed_ms,
                record.nps
            );
            if let Some(w) = out.as_mut() {
                serde_json::to_writer(&mut *w, &record)?;
                writeln!(w)?;
            }
        }
    }

    let elapsed = start.elapsed();
    println!(
        "total nodes {total_nodes} time {}ms nps {}",
        elapsed.as_millis(),
        nps(total_nodes, elapsed)
    );
    if let Some(mut w) = out {
        w.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let variant = io::parse_variant(&cli.variant)?;
    let mut config = io::load_config(cli.config.as_deref())?;
    if let Some(depth) = cli.depth {
        config.depth = depth;
    }
    let positions = match &cli.positions {
        Some(path) => io::load_positions(path, variant)?,
        None => builtin_positions(variant)?,
    };
    log::info!("benchmarking {} position(s) with {:?}", positions.len(), config.algorithm);
    run(&cli, &config, &positions, variant)
}
