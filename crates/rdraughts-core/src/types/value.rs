//! 評価値（Value）
//!
//! 兵1枚 = 100 のスケール。`Value::WIN` 付近を勝敗確定スコアとして予約している。
//! 通常の評価値は [-WIN_IN_MAX_PLY, WIN_IN_MAX_PLY] の範囲で用いる。

use serde::{Deserialize, Serialize};

use super::MAX_PLY;

/// 評価値
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Value(i32);

impl Value {
    /// ゼロ
    pub const ZERO: Value = Value(0);
    /// 引き分け
    pub const DRAW: Value = Value(0);
    /// 勝ち（勝ち側の最大スコア）
    pub const WIN: Value = Value(32000);
    /// 無限大
    pub const INFINITE: Value = Value(32001);
    /// 無効値
    pub const NONE: Value = Value(32002);

    /// 最大探索深度内での勝ちスコア
    pub const WIN_IN_MAX_PLY: Value = Value(Self::WIN.0 - MAX_PLY);
    /// 最大探索深度内での負けスコア
    pub const LOSS_IN_MAX_PLY: Value = Value(-Self::WIN_IN_MAX_PLY.0);

    /// 兵の評価値
    pub const MAN_VALUE: i32 = 100;
    /// キングの評価値
    pub const KING_VALUE: i32 = 180;

    /// 値から生成
    #[inline]
    pub const fn new(v: i32) -> Value {
        Value(v)
    }

    /// ply手で勝つスコア
    #[inline]
    pub const fn win_in(ply: i32) -> Value {
        Value(Self::WIN.0 - ply)
    }

    /// ply手で負けるスコア
    #[inline]
    pub const fn loss_in(ply: i32) -> Value {
        Value(-Self::WIN.0 + ply)
    }

    /// 勝ちスコアかどうか
    #[inline]
    pub const fn is_win(self) -> bool {
        self.0 >= Self::WIN_IN_MAX_PLY.0 && self.0 <= Self::WIN.0
    }

    /// 負けスコアかどうか
    #[inline]
    pub const fn is_loss(self) -> bool {
        self.0 <= Self::LOSS_IN_MAX_PLY.0 && self.0 >= -Self::WIN.0
    }

    /// 勝敗確定スコアかどうか
    #[inline]
    pub const fn is_decisive(self) -> bool {
        self.is_win() || self.is_loss()
    }

    /// 勝敗までの手数（確定スコアのみ有効）
    #[inline]
    pub const fn decisive_ply(self) -> i32 {
        if self.is_win() {
            Self::WIN.0 - self.0
        } else if self.is_loss() {
            self.0 + Self::WIN.0
        } else {
            0
        }
    }

    /// 生の値を取得
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::ZERO
    }
}

impl std::ops::Neg for Value {
    type Output = Value;

    #[inline]
    fn neg(self) -> Value {
        Value(-self.0)
    }
}

impl std::ops::Add for Value {
    type Output = Value;

    #[inline]
    fn add(self, rhs: Value) -> Value {
        Value(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Value {
    type Output = Value;

    #[inline]
    fn sub(self, rhs: Value) -> Value {
        Value(self.0 - rhs.0)
    }
}

impl std::ops::Add<i32> for Value {
    type Output = Value;

    #[inline]
    fn add(self, rhs: i32) -> Value {
        Value(self.0 + rhs)
    }
}

impl std::ops::Sub<i32> for Value {
    type Output = Value;

    #[inline]
    fn sub(self, rhs: i32) -> Value {
        Value(self.0 - rhs)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_win() {
            write!(f, "win {}", self.decisive_ply())
        } else if self.is_loss() {
            write!(f, "loss {}", self.decisive_ply())
        } else {
            write!(f, "{}", self.0)
        }
    }
}
