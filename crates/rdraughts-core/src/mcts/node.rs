//! 木のノード
//!
//! 統計（訪問回数・累積報酬・virtual loss）はアトミックで、並列ワーカーが
//! ロックなしで更新する。子の展開状態だけ `Mutex` で守る。
//!
//! 報酬はすべて「このノードに指した側」から見た値。

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::position::{GameOutcome, Position};
use crate::types::Move;

/// アリーナ内のノード番号
pub type NodeId = usize;

/// 累積報酬の固定小数点の倍率
const VALUE_SCALE: f64 = 1_000_000.0;

/// 展開済みの子
#[derive(Debug, Clone)]
pub struct Edge {
    pub mv: Move,
    pub child: NodeId,
}

/// 子の展開状態
#[derive(Debug, Default)]
pub struct Expansion {
    /// まだ子にしていない合法手
    pub untried: Vec<Move>,
    pub children: Vec<Edge>,
}

/// MCTSのノード
#[derive(Debug)]
pub struct Node {
    pub key: u64,
    pub position: Position,
    /// 終局ならこのノードに指した側から見た結果（勝ち 1.0 / 負け -1.0 / 引き分け 0.0）
    pub terminal: Option<f64>,
    /// progressive bias 用の事前評価（このノードに指した側から見た値）
    pub bias: f64,
    visits: AtomicU32,
    value: AtomicI64,
    virtual_loss: AtomicU32,
    pub expansion: Mutex<Expansion>,
}

/// 終局結果を指定した側から見た報酬に変換する
#[inline]
pub fn outcome_reward(outcome: GameOutcome, perspective: crate::types::Color) -> f64 {
    match outcome {
        GameOutcome::Win(c) if c == perspective => 1.0,
        GameOutcome::Win(_) => -1.0,
        GameOutcome::Draw => 0.0,
    }
}

impl Node {
    pub fn new(position: Position, bias: f64) -> Self {
        let mover = !position.side_to_move();
        let terminal = position.outcome().map(|o| outcome_reward(o, mover));
        let untried = if terminal.is_some() {
            Vec::new()
        } else {
            position.legal_moves().into_vec()
        };
        Self {
            key: position.key(),
            position,
            terminal,
            bias,
            visits: AtomicU32::new(0),
            value: AtomicI64::new(0),
            virtual_loss: AtomicU32::new(0),
            expansion: Mutex::new(Expansion {
                untried,
                children: Vec::new(),
            }),
        }
    }

    #[inline]
    pub fn visits(&self) -> u32 {
        self.visits.load(Ordering::Relaxed)
    }

    /// 累積報酬
    #[inline]
    pub fn total_value(&self) -> f64 {
        self.value.load(Ordering::Relaxed) as f64 / VALUE_SCALE
    }

    /// 平均報酬（未訪問なら 0）
    #[inline]
    pub fn mean_value(&self) -> f64 {
        match self.visits() {
            0 => 0.0,
            n => self.total_value() / n as f64,
        }
    }

    #[inline]
    pub fn virtual_loss(&self) -> u32 {
        self.virtual_loss.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn add_virtual_loss(&self) {
        self.virtual_loss.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn remove_virtual_loss(&self) {
        // 0未満にはしない
        let _ = self
            .virtual_loss
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// 途中で失敗した反復が残した virtual loss を消す
    #[inline]
    pub fn reset_virtual_loss(&self) -> u32 {
        self.virtual_loss.swap(0, Ordering::Relaxed)
    }

    /// 1回分の結果を加算する
    #[inline]
    pub fn update(&self, reward: f64) {
        self.visits.fetch_add(1, Ordering::Relaxed);
        self.value
            .fetch_add((reward * VALUE_SCALE).round() as i64, Ordering::Relaxed);
    }
}
