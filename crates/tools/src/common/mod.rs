//! ツール間で共有する入出力とログ初期化

pub mod io;
pub mod logging;
