//! 探索のテスト

mod alpha_beta;
mod engine;
