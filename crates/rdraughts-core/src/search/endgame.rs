//! 終盤の勝敗証明
//!
//! 駒数が少ない局面で、ノード数の予算つきの反復深化で勝ち・負け・引き分けを
//! 証明する。事前計算のテーブルは持たない。
//!
//! 結果はキャッシュし、証明できなかった局面（`Unknown`）も記録する。
//! 予算はノード数で決まるため、結果はタイミングに依存しない。

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::controller::SearchLimits;
use crate::position::Position;
use crate::types::{MAX_PLY, Value};

/// 1回の証明に使うノード数の上限
const NODE_BUDGET: u64 = 8192;

/// キャッシュの上限（超えたら全消去）
const CACHE_CAPACITY: usize = 1 << 16;

/// 停止要求を確認する間隔
const STOP_CHECK_INTERVAL: u64 = 1024;

/// 証明結果（手番側視点、数字は終局までのply）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndgameVerdict {
    Win(u32),
    Loss(u32),
    Draw,
    Unknown,
}

struct Prover<'a> {
    limits: &'a SearchLimits,
    nodes: u64,
    exhausted: bool,
    stopped: bool,
}

impl Prover<'_> {
    fn out_of_budget(&mut self) -> bool {
        if self.exhausted || self.stopped {
            return true;
        }
        self.nodes += 1;
        if self.nodes > NODE_BUDGET {
            self.exhausted = true;
        } else if self.nodes % STOP_CHECK_INTERVAL == 0 && self.limits.stop.is_stopped() {
            self.stopped = true;
        }
        self.exhausted || self.stopped
    }

    /// 深さ `depth` plyまでで証明できる結果
    fn prove(&mut self, pos: &Position, depth: u32) -> EndgameVerdict {
        if self.out_of_budget() {
            return EndgameVerdict::Unknown;
        }
        let us = pos.side_to_move();
        if pos.count(us) == 0 {
            return EndgameVerdict::Loss(0);
        }
        let moves = pos.legal_moves();
        if moves.is_empty() {
            return EndgameVerdict::Loss(0);
        }
        if pos.is_quiet_draw() {
            return EndgameVerdict::Draw;
        }
        if depth == 0 {
            return EndgameVerdict::Unknown;
        }

        let mut fastest_win: Option<u32> = None;
        let mut slowest_loss: Option<u32> = None;
        let mut draw = false;
        let mut unknown = false;
        for mv in &moves {
            match self.prove(&pos.do_move(mv), depth - 1) {
                EndgameVerdict::Loss(n) => {
                    fastest_win = Some(fastest_win.map_or(n + 1, |w| w.min(n + 1)));
                }
                EndgameVerdict::Win(n) => {
                    slowest_loss = Some(slowest_loss.map_or(n + 1, |l| l.max(n + 1)));
                }
                EndgameVerdict::Draw => draw = true,
                EndgameVerdict::Unknown => unknown = true,
            }
            if self.exhausted || self.stopped {
                return EndgameVerdict::Unknown;
            }
        }

        match (fastest_win, unknown, draw) {
            (Some(n), _, _) => EndgameVerdict::Win(n),
            (None, true, _) => EndgameVerdict::Unknown,
            (None, false, true) => EndgameVerdict::Draw,
            (None, false, false) => slowest_loss.map_or(EndgameVerdict::Unknown, EndgameVerdict::Loss),
        }
    }
}

/// 終盤の勝敗証明器（全ワーカーで共有）
pub struct EndgameOracle {
    max_pieces: u32,
    max_plies: u32,
    cache: Mutex<HashMap<u64, EndgameVerdict>>,
}

impl EndgameOracle {
    pub fn new(max_pieces: u32, max_plies: u32) -> Self {
        Self {
            max_pieces,
            max_plies,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_pieces(&self) -> u32 {
        self.max_pieces
    }

    pub fn max_plies(&self) -> u32 {
        self.max_plies
    }

    /// 局面を証明する（キャッシュ込み）
    pub fn verdict(&self, pos: &Position, limits: &SearchLimits) -> EndgameVerdict {
        if pos.piece_count() > self.max_pieces {
            return EndgameVerdict::Unknown;
        }
        let key = pos.key_with_clock();
        if let Some(&v) = self.cache.lock().get(&key) {
            return v;
        }

        let mut prover = Prover {
            limits,
            nodes: 0,
            exhausted: false,
            stopped: false,
        };
        let mut verdict = EndgameVerdict::Unknown;
        for depth in 1..=self.max_plies {
            verdict = prover.prove(pos, depth);
            if verdict != EndgameVerdict::Unknown || prover.exhausted || prover.stopped {
                break;
            }
        }
        if prover.stopped {
            return EndgameVerdict::Unknown;
        }

        let mut cache = self.cache.lock();
        if cache.len() >= CACHE_CAPACITY {
            cache.clear();
        }
        cache.insert(key, verdict);
        verdict
    }

    /// 探索用の値に変換した証明結果（証明できなければ None）
    pub fn probe(&self, pos: &Position, ply: i32, limits: &SearchLimits) -> Option<Value> {
        let to_ply = |n: u32| (ply + n as i32).min(MAX_PLY - 1);
        match self.verdict(pos, limits) {
            EndgameVerdict::Win(n) => Some(Value::win_in(to_ply(n))),
            EndgameVerdict::Loss(n) => Some(Value::loss_in(to_ply(n))),
            EndgameVerdict::Draw => Some(Value::DRAW),
            EndgameVerdict::Unknown => None,
        }
    }

    /// キャッシュ済みの局面数
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}
