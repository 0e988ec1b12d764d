//! エラー型
//!
//! 呼び出し側に返るのは局面の読み込み失敗、設定JSONの構文エラー、
//! 終局局面での探索要求だけ。設定の矛盾やワーカーの失敗は内部で回復する。

use thiserror::Error;

use crate::position::GameOutcome;
use crate::types::Variant;

/// 局面の読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("square {number} does not exist on a {variant:?} board")]
    InvalidSquare { number: u32, variant: Variant },

    #[error("square {0} is listed more than once")]
    DuplicateSquare(u32),
}

/// 設定の読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Json(#[from] serde_json::Error),
}

/// 探索エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// 合法手がない、または終局している
    #[error("position is terminal ({0:?}); there is no move to search")]
    TerminalPosition(GameOutcome),
}
