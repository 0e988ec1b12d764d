//! MCTSエンジン
//!
//! 1回の反復: 選択 → 展開 → シミュレーション → 逆伝播。
//! 並列時は全ワーカーが同じ木を共有し、共有カウンタから反復を取る。
//! 選択中のノードには virtual loss を付けて、ワーカーが同じ経路に集中しないようにする。

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::thread;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::controller::{AbortReason, SearchController, SearchLimits};
use crate::error::SearchError;
use crate::eval::Evaluator;
use crate::position::Position;
use crate::result::{RootVisit, Score, SearchLine, SearchResult, SearchStats, TerminationReason};

use super::config::MctsConfig;
use super::node::{Edge, Node, NodeId};
use super::policy::{best_one_ply, normalize_eval, simulate};
use super::tree::Tree;

/// 締め切りを確認する間隔（反復数）
const POLL_INTERVAL: u32 = 4;

/// 未訪問の子のUCT値
const UNVISITED_PRIORITY: f64 = 1.0e9;

/// 1ワーカーの結果
#[derive(Debug, Default)]
struct WorkerOutput {
    iterations: u32,
    rollouts: u64,
    max_depth: i32,
    abort: Option<AbortReason>,
}

/// ワーカー間で共有する読み取り専用データ
struct SearchShared<'a> {
    cfg: &'a MctsConfig,
    evaluator: &'a dyn Evaluator,
    tree: &'a Tree,
    limits: &'a SearchLimits,
    next_iteration: &'a AtomicU32,
    virtual_loss: bool,
}

/// 乱数生成器（seed が無ければOSの乱数から）
fn make_rng(seed: Option<u64>, worker: usize) -> Xoshiro256PlusPlus {
    match seed {
        Some(s) => Xoshiro256PlusPlus::seed_from_u64(s.wrapping_add(worker as u64)),
        None => Xoshiro256PlusPlus::from_rng(&mut rand::rng()),
    }
}

/// 子のUCT値（親の手番側から見た値）
fn uct_score(cfg: &MctsConfig, parent_visits: u32, child: &Node) -> f64 {
    let vl = child.virtual_loss();
    let n = child.visits() + vl;
    if n == 0 {
        return UNVISITED_PRIORITY;
    }
    let n = n as f64;
    // virtual loss は負け（-1）を仮に加えたものとして扱う
    let exploit = (child.total_value() - vl as f64) / n;
    let explore = cfg.exploration_constant * ((parent_visits.max(1) as f64).ln() / n).sqrt();
    let bias = if cfg.progressive_bias {
        cfg.pb_weight * child.bias / (child.visits() as f64 + 1.0)
    } else {
        0.0
    };
    exploit + explore + bias
}

/// 展開できる子の数
#[inline]
fn widening_limit(cfg: &MctsConfig, visits: u32) -> usize {
    if !cfg.progressive_widening {
        return usize::MAX;
    }
    (cfg.pw_k * (visits.max(1) as f64).powf(cfg.pw_alpha)).ceil() as usize
}

/// 1回の反復
fn run_iteration(shared: &SearchShared<'_>, rng: &mut Xoshiro256PlusPlus, out: &mut WorkerOutput) {
    let cfg = shared.cfg;
    let tree = shared.tree;
    let mut path: Vec<NodeId> = vec![tree.root()];
    let mut node = tree.node(tree.root());

    // 選択と展開
    loop {
        if node.terminal.is_some() {
            break;
        }
        let mut exp = node.expansion.lock();
        let visits = node.visits();
        if !exp.untried.is_empty() && exp.children.len() < widening_limit(cfg, visits) {
            let idx = rng.random_range(0..exp.untried.len());
            let mv = exp.untried.swap_remove(idx);
            let child_pos = node.position.do_move(&mv);
            let child = tree.get_or_insert(child_pos, &path, |p| {
                if cfg.progressive_bias {
                    // 子の手番側の評価を、子に指した側の値にする
                    -normalize_eval(shared.evaluator.evaluate(p), p.variant())
                } else {
                    0.0
                }
            });
            exp.children.push(Edge { mv, child });
            drop(exp);
            path.push(child);
            node = tree.node(child);
            if shared.virtual_loss {
                node.add_virtual_loss();
            }
            break;
        }

        let mut best: Option<(f64, NodeId)> = None;
        for edge in exp.children.iter().filter(|e| !path.contains(&e.child)) {
            let score = uct_score(cfg, visits, &tree.node(edge.child));
            if best.is_none_or(|(b, _)| score > b) {
                best = Some((score, edge.child));
            }
        }
        drop(exp);
        // 子がない（または全て経路上）ならここを葉にする
        let Some((_, next)) = best else {
            break;
        };
        path.push(next);
        node = tree.node(next);
        if shared.virtual_loss {
            node.add_virtual_loss();
        }
    }

    // シミュレーション
    let reward = match node.terminal {
        Some(r) => r,
        None => {
            out.rollouts += 1;
            simulate(cfg, shared.evaluator, &node.position, rng)
        }
    };
    out.max_depth = out.max_depth.max(path.len() as i32 - 1);

    // 逆伝播（手番が交互に入れ替わる）
    let mut r = reward;
    for (i, &id) in path.iter().enumerate().rev() {
        let n = tree.node(id);
        n.update(r);
        if shared.virtual_loss && i > 0 {
            n.remove_virtual_loss();
        }
        r = -r;
    }
}

/// ワーカーの本体（共有カウンタが尽きるか中断するまで反復する）
fn worker_loop(shared: &SearchShared<'_>, mut rng: Xoshiro256PlusPlus) -> WorkerOutput {
    let mut out = WorkerOutput::default();
    loop {
        if out.iterations % POLL_INTERVAL == 0 {
            if let Some(reason) = shared.limits.poll() {
                out.abort = Some(reason);
                break;
            }
        }
        if shared.next_iteration.fetch_add(1, Ordering::Relaxed) >= shared.cfg.iterations {
            break;
        }
        run_iteration(shared, &mut rng, &mut out);
        out.iterations += 1;
    }
    out
}

/// ワーカーを並列に走らせて合流する（panic したワーカーは None）
///
/// 失敗したワーカーの経路に残った virtual loss はここで外す。
fn run_workers(shared: &SearchShared<'_>, threads: usize, seed: Option<u64>) -> Vec<Option<WorkerOutput>> {
    let outputs: Vec<Option<WorkerOutput>> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let rng = make_rng(seed, i);
                thread::Builder::new()
                    .name(format!("mcts-worker-{i}"))
                    .spawn_scoped(s, move || worker_loop(shared, rng))
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(i, h)| match h {
                Ok(h) => h.join().ok(),
                Err(e) => {
                    log::warn!("failed to spawn mcts worker {i}: {e}");
                    None
                }
            })
            .collect()
    });
    if outputs.iter().any(Option::is_none) {
        let leaked = shared.tree.clear_virtual_loss();
        log::debug!("cleared {leaked} virtual losses left by failed workers");
    }
    outputs
}

/// MCTSエンジン
pub struct MctsEngine {
    evaluator: Arc<dyn Evaluator>,
    controller: SearchController,
    /// 持ち越した木
    previous: Option<Tree>,
}

impl MctsEngine {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self::with_controller(evaluator, SearchController::default())
    }

    pub fn with_controller(evaluator: Arc<dyn Evaluator>, controller: SearchController) -> Self {
        Self {
            evaluator,
            controller,
            previous: None,
        }
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    /// 持ち越した木を捨てる
    pub fn clear(&mut self) {
        self.previous = None;
    }

    /// 持ち越した木のノード数
    pub fn persisted_nodes(&self) -> usize {
        self.previous.as_ref().map_or(0, Tree::len)
    }

    fn build_tree(&mut self, pos: &Position, cfg: &MctsConfig) -> Tree {
        let transposition = cfg.transposition.then_some(cfg.transposition_max_entries);
        if cfg.persist_tree {
            if let Some(mut tree) = self.previous.take() {
                if tree.reroot(pos) {
                    log::debug!("reusing mcts tree with {} nodes", tree.len());
                    return tree;
                }
            }
        }
        Tree::new(pos.clone(), transposition)
    }

    /// 最善手を探索する
    pub fn search(
        &mut self,
        pos: &Position,
        config: &MctsConfig,
        limits: &SearchLimits,
    ) -> Result<SearchResult, SearchError> {
        let (cfg, _) = config.clone().normalize();
        if let Some(outcome) = pos.outcome() {
            return Err(SearchError::TerminalPosition(outcome));
        }
        let limits = limits.tightened(cfg.time_limit);

        let moves = pos.legal_moves();
        if moves.len() == 1 {
            let best = moves[0].clone();
            return Ok(SearchResult {
                score: Score::WinRate(normalize_eval(self.evaluator.evaluate(pos), pos.variant())),
                line: SearchLine::Visits(Vec::new()),
                best_move: best,
                stats: SearchStats {
                    workers: 1,
                    ..SearchStats::default()
                },
                elapsed: limits.elapsed(),
                termination: TerminationReason::ForcedMove,
            });
        }

        let tree = self.build_tree(pos, &cfg);
        let next_iteration = AtomicU32::new(0);
        let lease = cfg.parallel.then(|| self.controller.lease(cfg.workers));
        let threads = lease.as_ref().map_or(1, |l| l.workers());
        let shared = SearchShared {
            cfg: &cfg,
            evaluator: &*self.evaluator,
            tree: &tree,
            limits: &limits,
            next_iteration: &next_iteration,
            virtual_loss: threads > 1,
        };

        let mut stats = SearchStats {
            workers: threads,
            ..SearchStats::default()
        };
        let mut iterations = 0u32;
        let mut abort: Option<AbortReason> = None;
        let mut collect = |out: WorkerOutput, stats: &mut SearchStats| {
            iterations += out.iterations;
            stats.rollouts += out.rollouts;
            stats.sel_depth = stats.sel_depth.max(out.max_depth);
            if abort.is_none() {
                abort = out.abort;
            }
        };

        if threads <= 1 {
            let out = worker_loop(&shared, make_rng(cfg.seed, 0));
            collect(out, &mut stats);
        } else {
            let outputs = run_workers(&shared, threads, cfg.seed);
            for (i, out) in outputs.into_iter().enumerate() {
                match out {
                    Some(out) => collect(out, &mut stats),
                    None => {
                        log::warn!("mcts worker {i} failed");
                        stats.failed_workers += 1;
                    }
                }
            }
            // 全ワーカーが失敗したら呼び出し側で続ける
            if stats.failed_workers == threads {
                let out = worker_loop(&shared, make_rng(cfg.seed, 0));
                collect(out, &mut stats);
            }
        }
        drop(lease);

        let root = tree.node(tree.root());
        let edges: Vec<Edge> = root.expansion.lock().children.clone();
        let visits: Vec<RootVisit> = edges
            .iter()
            .map(|e| {
                let child = tree.node(e.child);
                RootVisit {
                    mv: e.mv.clone(),
                    visits: child.visits(),
                    mean_value: child.mean_value(),
                }
            })
            .collect();

        let termination = match abort {
            Some(AbortReason::Time) => TerminationReason::Time,
            Some(AbortReason::Stopped) => TerminationReason::Stopped,
            None => TerminationReason::IterationsExhausted,
        };

        // 訪問回数が最大の子（同点は平均報酬が高い方）
        let robust = visits
            .iter()
            .filter(|v| v.visits > 0)
            .fold(None, |best: Option<&RootVisit>, v| match best {
                Some(b) if (b.visits, b.mean_value) >= (v.visits, v.mean_value) => Some(b),
                _ => Some(v),
            });
        let (best_move, win_rate) = match robust {
            Some(v) => (v.mv.clone(), v.mean_value),
            None => {
                log::warn!("no mcts iteration completed ({termination}); using the best one-ply move");
                best_one_ply(&*self.evaluator, pos).unwrap_or_else(|| (moves[0].clone(), 0.0))
            }
        };

        stats.nodes = tree.len() as u64;
        log::info!(
            "mcts best {} win rate {:.3} iterations {} nodes {} ({termination})",
            best_move.notation(pos.variant()),
            win_rate,
            iterations,
            stats.nodes
        );

        if cfg.persist_tree && tree.len() <= cfg.max_tree_nodes {
            self.previous = Some(tree);
        } else {
            self.previous = None;
        }

        Ok(SearchResult {
            best_move,
            score: Score::WinRate(win_rate),
            line: SearchLine::Visits(visits),
            stats,
            elapsed: limits.elapsed(),
            termination,
        })
    }
}
