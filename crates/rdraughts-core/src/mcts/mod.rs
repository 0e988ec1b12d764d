//! モンテカルロ木探索
//!
//! - `node`: アトミックな統計を持つノード
//! - `tree`: ノードのアリーナと置換表
//! - `policy`: プレイアウトと葉の評価
//! - `engine`: 反復の実行と結果の組み立て

pub mod config;
mod engine;
pub mod node;
pub mod policy;
pub mod tree;

pub use config::{LeafEvaluation, MctsConfig, RolloutPolicy};
pub use engine::MctsEngine;
pub use node::{Node, NodeId};
pub use tree::Tree;
