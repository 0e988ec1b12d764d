use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rdraughts_core::{
    Algorithm, Engine, HeuristicEvaluator, Score, SearchController, SearchLimits, StopFlag,
};
use tools::common::{io, logging};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    Minimax,
    Mcts,
}

/// 1局面を探索して最善手を表示する。
///
/// # 使用例
///
/// - 初期局面をミニマックスで6手読み:
///   `cargo run -p tools --bin think -- --depth 6`
///
/// - JSON 設定で MCTS を実行し、結果を JSON で出力:
///   `cargo run -p tools --bin think -- --config mcts.json --fen "W:W21,22,23:B9,10,11" --json`
#[derive(Parser, Debug)]
#[command(author, version, about = "Search a single draughts position")]
struct Cli {
    /// Board variant (english / international)
    #[arg(long, default_value = "english")]
    variant: String,

    /// Position in FEN, or "startpos"
    #[arg(long, default_value = "startpos")]
    fen: String,

    /// Engine config JSON file ("-" for stdin)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the algorithm from the config
    #[arg(long, value_enum)]
    algorithm: Option<AlgorithmArg>,

    /// Override the minimax depth
    #[arg(long)]
    depth: Option<i32>,

    /// Override the MCTS iteration count
    #[arg(long)]
    iterations: Option<u32>,

    /// Time budget in milliseconds
    #[arg(long)]
    time_ms: Option<u64>,

    /// Worker ceiling shared by all searches
    #[arg(long, default_value_t = 8)]
    max_workers: usize,

    /// Print the full result as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let variant = io::parse_variant(&cli.variant)?;
    let pos = io::parse_position(variant, &cli.fen)?;
    let mut config = io::load_config(cli.config.as_deref())?;
    if let Some(algorithm) = cli.algorithm {
        config.algorithm = match algorithm {
            AlgorithmArg::Minimax => Algorithm::Minimax,
            AlgorithmArg::Mcts => Algorithm::Mcts,
        };
    }
    if let Some(depth) = cli.depth {
        config.depth = depth;
    }
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }

    let controller = SearchController::new(cli.max_workers);
    let limits: SearchLimits =
        controller.limits(cli.time_ms.map(Duration::from_millis), StopFlag::new());
    let mut engine = Engine::with_controller(Arc::new(HeuristicEvaluator::default()), controller);

    log::info!("searching {:?} with {:?}", pos, config.algorithm);
    let result = engine
        .search(&pos, &config, &limits)
        .with_context(|| format!("search failed for '{}'", pos.to_fen()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let score = match result.score {
        Score::Value(v) => format!("{v}"),
        Score::WinRate(w) => format!("{w:+.3}"),
    };
    println!("bestmove {}", result.best_move.notation(variant));
    println!("score    {score}");
    let pv: Vec<String> = result.pv().iter().map(|m| m.notation(variant)).collect();
    if !pv.is_empty() {
        println!("pv       {}", pv.join(" "));
    }
    for visit in result.visits() {
        println!(
            "  {:>10} visits {:>6} mean {:+.3}",
            visit.mv.notation(variant),
            visit.visits,
            visit.mean_value
        );
    }
    println!(
        "nodes {} depth {} workers {} time {}ms ({})",
        result.stats.nodes,
        result.stats.depth,
        result.stats.workers,
        result.elapsed.as_millis(),
        result.termination
    );
    Ok(())
}
