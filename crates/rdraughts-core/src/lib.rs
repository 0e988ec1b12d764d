//! ドラフツ（チェッカー）の指し手選択エンジン
//!
//! - `search`: アルファベータ法によるミニマックス探索（置換表、静止探索、反復深化、並列ルート分割）
//! - `mcts`: UCTによるモンテカルロ木探索（漸進的拡幅、トランスポジション、並列ワーカー）
//! - `controller`: 締め切り・停止要求・ワーカー予算
//! - `engine`: JSON設定から探索器を選ぶ窓口
//!
//! ```no_run
//! use std::sync::Arc;
//! use rdraughts_core::{Engine, EngineConfig, HeuristicEvaluator, Position, SearchLimits, Variant};
//!
//! let mut engine = Engine::new(Arc::new(HeuristicEvaluator::default()));
//! let config = EngineConfig::from_json(r#"{"depth": 6, "timeLimitMs": 500}"#).unwrap();
//! let result = engine
//!     .search(&Position::startpos(Variant::English), &config, &SearchLimits::unlimited())
//!     .unwrap();
//! println!("{}", result.best_move.notation(Variant::English));
//! ```

pub mod controller;
pub mod engine;
pub mod error;
pub mod eval;
pub mod mcts;
pub mod position;
pub mod result;
pub mod search;
pub mod tt;
pub mod types;

pub use controller::{SearchController, SearchLimits, StopFlag};
pub use engine::{Algorithm, Engine, EngineConfig};
pub use error::{ConfigError, PositionError, SearchError};
pub use eval::{Evaluator, HeuristicEvaluator, MaterialEvaluator};
pub use mcts::{MctsConfig, MctsEngine};
pub use position::{GameOutcome, Position};
pub use result::{Score, SearchResult, SearchStats, TerminationReason};
pub use search::{MinimaxConfig, MinimaxEngine};
pub use types::{Color, Move, Value, Variant};
