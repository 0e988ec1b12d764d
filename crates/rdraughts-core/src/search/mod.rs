//! ミニマックス探索
//!
//! - `alpha_beta`: 内部ノードとルートの探索
//! - `qsearch`: 捕獲だけを読む静止探索
//! - `pruning`: Null move / LMR
//! - `movepicker`: 指し手の並べ替え
//! - `history`: キラー手と History
//! - `endgame`: 少駒局面の勝敗証明
//! - `parallel`: ルート分割の並列探索
//! - `engine`: 反復深化と結果の組み立て

mod alpha_beta;
pub mod config;
pub mod endgame;
mod engine;
pub mod history;
mod movepicker;
mod parallel;
mod pruning;
mod qsearch;
mod search_helpers;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::{ConfigAdjustment, MinimaxConfig};
pub use endgame::{EndgameOracle, EndgameVerdict};
pub use engine::MinimaxEngine;
pub use history::{HistoryTable, KillerTable};
pub use types::{RootMove, RootMoves};
