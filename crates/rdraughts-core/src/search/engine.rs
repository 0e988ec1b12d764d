//! ミニマックス探索エンジン
//!
//! 反復深化、aspiration window、並列ルート分割をまとめる。
//! 置換表・History・終盤証明のキャッシュは探索をまたいで保持する。

use std::sync::Arc;

use crate::controller::{AbortReason, SearchController, SearchLimits};
use crate::error::SearchError;
use crate::eval::Evaluator;
use crate::position::Position;
use crate::result::{Score, SearchLine, SearchResult, SearchStats, TerminationReason};
use crate::tt::TranspositionTable;
use crate::types::{Depth, Value};

use super::alpha_beta::{SearchContext, SearchState, search_root};
use super::config::MinimaxConfig;
use super::endgame::EndgameOracle;
use super::history::HistoryTable;
use super::movepicker::order_moves;
use super::parallel::search_root_parallel;
use super::search_helpers::{extract_pv, static_eval};
use super::types::{RootMove, RootMoves};

/// 完了した反復
#[derive(Debug, Clone, Copy)]
struct Completed {
    depth: Depth,
    value: Value,
}

/// ミニマックス探索エンジン
pub struct MinimaxEngine {
    evaluator: Arc<dyn Evaluator>,
    controller: SearchController,
    tt: TranspositionTable,
    history: HistoryTable,
    endgame: Option<EndgameOracle>,
}

impl MinimaxEngine {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self::with_controller(evaluator, SearchController::default())
    }

    /// ワーカー予算を他のエンジンと共有する
    pub fn with_controller(evaluator: Arc<dyn Evaluator>, controller: SearchController) -> Self {
        Self {
            evaluator,
            controller,
            tt: TranspositionTable::new(crate::tt::DEFAULT_CAPACITY),
            history: HistoryTable::new(),
            endgame: None,
        }
    }

    pub fn evaluator(&self) -> &Arc<dyn Evaluator> {
        &self.evaluator
    }

    pub fn controller(&self) -> &SearchController {
        &self.controller
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    /// 探索をまたぐ状態をすべて消去する
    pub fn clear(&mut self) {
        self.tt.clear();
        self.history.clear();
        if let Some(oracle) = &self.endgame {
            oracle.clear();
        }
    }

    /// 設定に合わせて置換表と終盤証明器を用意する
    fn prepare(&mut self, cfg: &MinimaxConfig) {
        if cfg.transposition && self.tt.capacity() != TranspositionTable::capacity_for(cfg.tt_capacity) {
            log::debug!(
                "reallocating transposition table: {} -> {} entries",
                self.tt.capacity(),
                cfg.tt_capacity
            );
            self.tt = TranspositionTable::new(cfg.tt_capacity);
        }
        self.tt.new_search();
        self.history.age();

        let oracle_matches = self.endgame.as_ref().is_some_and(|o| {
            o.max_pieces() == cfg.endgame_max_pieces && o.max_plies() == cfg.endgame_max_plies
        });
        if cfg.endgame_tablebase && !oracle_matches {
            self.endgame = Some(EndgameOracle::new(cfg.endgame_max_pieces, cfg.endgame_max_plies));
        }
    }

    /// 最善手を探索する
    ///
    /// 終局局面ではエラーを返す。締め切りや停止要求で打ち切った場合も、
    /// 完了した最後の反復の結果を返す。
    pub fn search(
        &mut self,
        pos: &Position,
        config: &MinimaxConfig,
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
            log::debug!("single legal move {}", best.notation(pos.variant()));
            return Ok(SearchResult {
                score: Score::Value(self.evaluator.evaluate(pos)),
                line: SearchLine::Pv(vec![best.clone()]),
                best_move: best,
                stats: SearchStats {
                    workers: 1,
                    ..SearchStats::default()
                },
                elapsed: limits.elapsed(),
                termination: TerminationReason::ForcedMove,
            });
        }

        self.prepare(&cfg);
        let mut st = SearchState::new(std::mem::take(&mut self.history));
        let ctx = SearchContext {
            config: &cfg,
            evaluator: &*self.evaluator,
            tt: if cfg.transposition { Some(&self.tt) } else { None },
            endgame: if cfg.endgame_tablebase { self.endgame.as_ref() } else { None },
            limits: &limits,
            thread_id: 0,
        };

        let mut root_moves = RootMoves::new(
            order_moves(&st, &ctx, pos.side_to_move(), moves, None, 0)
                .into_iter()
                .map(|sm| RootMove::new(sm.mv, sm.gen_index))
                .collect(),
        );

        // 並列ワーカー（呼び出し側のスレッドは合流を待つ）
        let lease = cfg.parallel.then(|| self.controller.lease(cfg.workers));
        let threads = lease
            .as_ref()
            .map_or(1, |l| l.workers().min(root_moves.len()));
        let mut helpers: Vec<SearchState> = if threads >= 2 {
            (0..threads).map(|_| SearchState::new(st.history.clone())).collect()
        } else {
            Vec::new()
        };
        if cfg.parallel && helpers.is_empty() {
            log::debug!("parallel search requested but only one worker is available");
        }
        st.stats.workers = threads;

        let depths: Vec<Depth> = if cfg.iterative_deepening {
            (1..=cfg.max_depth).collect()
        } else {
            vec![cfg.max_depth]
        };

        let mut completed: Option<Completed> = None;
        for depth in depths {
            if let Some(reason) = limits.poll() {
                st.abort = Some(reason);
                break;
            }
            let (alpha, beta) = match completed {
                Some(c) if cfg.aspiration && !c.value.is_decisive() => (
                    c.value - cfg.aspiration_window,
                    c.value + cfg.aspiration_window,
                ),
                _ => (-Value::INFINITE, Value::INFINITE),
            };
            let narrowed = alpha > -Value::INFINITE;

            let mut value = run_iteration(
                &mut st,
                &mut helpers,
                &ctx,
                pos,
                &mut root_moves,
                depth,
                alpha,
                beta,
            );
            if st.abort.is_some() {
                break;
            }
            if narrowed && (value <= alpha || value >= beta) {
                st.stats.aspiration_failures += 1;
                log::trace!("aspiration failure at depth {depth}: {value} outside ({alpha}, {beta})");
                value = run_iteration(
                    &mut st,
                    &mut helpers,
                    &ctx,
                    pos,
                    &mut root_moves,
                    depth,
                    -Value::INFINITE,
                    Value::INFINITE,
                );
                if st.abort.is_some() {
                    break;
                }
            }

            root_moves.commit();
            completed = Some(Completed { depth, value });
            st.stats.depth = depth;
            log::debug!(
                "depth {depth} score {value} best {} nodes {}",
                root_moves[0].mv.notation(pos.variant()),
                st.stats.nodes
            );
            #[cfg(feature = "diagnostics")]
            log::debug!("depth {depth} hashfull {}", self.tt.hashfull());

            // 証明済みの勝敗はこれ以上深く読んでも変わらない
            if value.is_decisive() && value.decisive_ply() <= depth {
                break;
            }
        }

        let best = root_moves[0].mv.clone();
        let value = match completed {
            Some(c) => c.value,
            None => static_eval(&ctx, pos),
        };
        let pv_len = completed.map_or(1, |c| c.depth.max(1) as usize);
        let pv = extract_pv(ctx.tt, pos, &best, pv_len);
        let termination = match st.abort {
            Some(AbortReason::Time) => TerminationReason::Time,
            Some(AbortReason::Stopped) => TerminationReason::Stopped,
            None => TerminationReason::DepthLimit,
        };
        if completed.is_none() {
            log::warn!("search stopped before the first iteration completed ({termination})");
        }

        st.stats.sel_depth = st.sel_depth;
        let stats = st.stats;
        self.history = st.history;
        drop(lease);

        log::info!(
            "minimax best {} score {} depth {} nodes {} ({termination})",
            best.notation(pos.variant()),
            value,
            stats.depth,
            stats.nodes
        );
        Ok(SearchResult {
            best_move: best,
            score: Score::Value(value),
            line: SearchLine::Pv(pv),
            stats,
            elapsed: limits.elapsed(),
            termination,
        })
    }
}

/// 1反復分の探索
///
/// 窓の内側で完了したら `root_moves` を評価順に並べ替える。中断した場合や
/// aspiration 窓の外に出た場合は並びを変えない（先頭は前回完了した反復の最善手のまま）。
#[allow(clippy::too_many_arguments)]
fn run_iteration(
    st: &mut SearchState,
    helpers: &mut Vec<SearchState>,
    ctx: &SearchContext<'_>,
    pos: &Position,
    root_moves: &mut RootMoves,
    depth: Depth,
    alpha: Value,
    beta: Value,
) -> Value {
    root_moves.reset_scores();
    if helpers.is_empty() {
        let value = search_root(st, ctx, pos, root_moves, depth, alpha, beta);
        if st.abort.is_none() && alpha < value && value < beta {
            root_moves.sort();
        }
        return value;
    }

    let (value, best) = search_root_parallel(st, helpers, ctx, pos, root_moves, depth, alpha, beta);
    if st.abort.is_none() && alpha < value && value < beta {
        if let Some(idx) = best {
            root_moves.promote(idx);
        }
    }
    value
}
