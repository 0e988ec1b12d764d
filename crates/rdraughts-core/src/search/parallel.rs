//! ルート分割の並列探索
//!
//! ルートの手をワーカーが共有カウンタから1手ずつ取り、共有の alpha を
//! 窓の下限にして探索する。合流時に最大値の手を選ぶ。
//!
//! 決定的モードでは窓の下限を `shared_alpha - 1` にする。最善値と同点の手も
//! 正確な値が出るため、同点は生成順の小さい手を選べばタイミングに依存しない。
//! 非決定的モードでは同点は先に終わった手を選ぶ。

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::thread;

use crate::position::Position;
use crate::types::{Depth, Move, Value};

use super::alpha_beta::{SearchContext, SearchState, search_root_move, store_root};
use super::types::RootMoves;

/// ワーカーが返す1手分の結果
#[derive(Debug, Clone, Copy)]
struct RootResult {
    idx: usize,
    value: Value,
    /// 完了順
    seq: usize,
}

/// ルート窓の下限
#[inline]
fn window_low(ctx: &SearchContext<'_>, shared: Value, alpha: Value, beta: Value) -> Value {
    let cfg = ctx.config;
    if !cfg.alpha_beta {
        return alpha;
    }
    let lo = if !cfg.deterministic_ordering {
        shared.max(alpha)
    } else if shared > alpha {
        shared - 1
    } else {
        alpha
    };
    lo.min(beta - 1)
}

/// 1ワーカーの本体
#[allow(clippy::too_many_arguments)]
fn worker_loop(
    st: &mut SearchState,
    ctx: &SearchContext<'_>,
    pos: &Position,
    moves: &[Move],
    depth: Depth,
    alpha: Value,
    beta: Value,
    next: &AtomicUsize,
    seq: &AtomicUsize,
    shared_alpha: &AtomicI32,
    cutoff: &AtomicBool,
) -> Vec<RootResult> {
    let mut results = Vec::new();
    loop {
        if cutoff.load(Ordering::Relaxed) {
            break;
        }
        let idx = next.fetch_add(1, Ordering::Relaxed);
        if idx >= moves.len() {
            break;
        }
        let shared = Value::new(shared_alpha.load(Ordering::Relaxed));
        let lo = window_low(ctx, shared, alpha, beta);
        let value = search_root_move(st, ctx, pos, &moves[idx], depth, lo, beta);
        if st.abort.is_some() {
            break;
        }
        if ctx.config.alpha_beta && value > lo {
            shared_alpha.fetch_max(value.raw(), Ordering::Relaxed);
            if value >= beta {
                cutoff.store(true, Ordering::Relaxed);
            }
        }
        results.push(RootResult {
            idx,
            value,
            seq: seq.fetch_add(1, Ordering::Relaxed),
        });
    }
    results
}

/// ルート局面の並列探索
///
/// `helpers` はワーカーの状態（1ワーカー1要素）。panic したワーカーは取り除き、
/// そのワーカーが担当した手は呼び出し側のスレッドで探索し直す。
/// 戻り値は最善値と最善手のインデックス。
#[allow(clippy::too_many_arguments)]
pub(super) fn search_root_parallel(
    main: &mut SearchState,
    helpers: &mut Vec<SearchState>,
    ctx: &SearchContext<'_>,
    pos: &Position,
    root_moves: &mut RootMoves,
    depth: Depth,
    alpha: Value,
    beta: Value,
) -> (Value, Option<usize>) {
    let moves: Vec<Move> = root_moves.iter().map(|rm| rm.mv.clone()).collect();
    let next = AtomicUsize::new(0);
    let seq = AtomicUsize::new(0);
    let shared_alpha = AtomicI32::new(alpha.raw());
    let cutoff = AtomicBool::new(false);

    let states = std::mem::take(helpers);
    let joined: Vec<(usize, Option<(SearchState, Vec<RootResult>)>)> = thread::scope(|s| {
        let handles: Vec<_> = states
            .into_iter()
            .enumerate()
            .map(|(i, mut wst)| {
                let wctx = SearchContext {
                    thread_id: i + 1,
                    ..*ctx
                };
                let (moves, next, seq, shared_alpha, cutoff) =
                    (&moves, &next, &seq, &shared_alpha, &cutoff);
                let handle = thread::Builder::new()
                    .name(format!("minimax-worker-{}", i + 1))
                    .spawn_scoped(s, move || {
                        let results = worker_loop(
                            &mut wst,
                            &wctx,
                            pos,
                            moves,
                            depth,
                            alpha,
                            beta,
                            next,
                            seq,
                            shared_alpha,
                            cutoff,
                        );
                        (wst, results)
                    });
                (i, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(i, handle)| match handle {
                Ok(h) => (i, h.join().ok()),
                Err(e) => {
                    log::warn!("failed to spawn minimax worker {}: {e}", i + 1);
                    (i, None)
                }
            })
            .collect()
    });

    let mut results: Vec<RootResult> = Vec::with_capacity(moves.len());
    let mut failed = false;
    for (i, outcome) in joined {
        match outcome {
            Some((wst, res)) => {
                if let Some(reason) = wst.abort {
                    main.abort.get_or_insert(reason);
                }
                main.stats.merge(&wst.stats);
                main.sel_depth = main.sel_depth.max(wst.sel_depth);
                helpers.push(SearchState {
                    stats: Default::default(),
                    ..wst
                });
                results.extend(res);
            }
            None => {
                log::warn!(
                    "minimax worker {} failed at depth {depth}; removing it from the pool",
                    i + 1
                );
                main.stats.failed_workers += 1;
                failed = true;
            }
        }
    }
    if main.abort.is_some() {
        return (-Value::INFINITE, None);
    }

    // 失敗したワーカーが取った手を探索し直す
    if failed && !cutoff.load(Ordering::Relaxed) {
        let mut done = vec![false; moves.len()];
        for r in &results {
            done[r.idx] = true;
        }
        for idx in (0..moves.len()).filter(|&i| !done[i]) {
            let shared = Value::new(shared_alpha.load(Ordering::Relaxed));
            let lo = window_low(ctx, shared, alpha, beta);
            let value = search_root_move(main, ctx, pos, &moves[idx], depth, lo, beta);
            if main.abort.is_some() {
                return (-Value::INFINITE, None);
            }
            if ctx.config.alpha_beta && value > lo {
                shared_alpha.fetch_max(value.raw(), Ordering::Relaxed);
            }
            results.push(RootResult {
                idx,
                value,
                seq: seq.fetch_add(1, Ordering::Relaxed),
            });
            if ctx.config.alpha_beta && value >= beta {
                break;
            }
        }
    }

    // 合流
    let deterministic = ctx.config.deterministic_ordering;
    let mut best: Option<RootResult> = None;
    for r in &results {
        root_moves[r.idx].score = r.value;
        let better = match best {
            None => true,
            Some(b) if r.value != b.value => r.value > b.value,
            Some(b) if deterministic => root_moves[r.idx].gen_index < root_moves[b.idx].gen_index,
            Some(b) => r.seq < b.seq,
        };
        if better {
            best = Some(*r);
        }
    }

    match best {
        Some(b) => {
            store_root(ctx, pos, &moves[b.idx], b.value, depth, alpha, beta);
            (b.value, Some(b.idx))
        }
        None => (-Value::INFINITE, None),
    }
}
