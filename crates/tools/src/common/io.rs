//! 設定ファイルと局面リストの読み込み

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use rdraughts_core::{EngineConfig, Position, Variant};

const READER_BUF_CAP: usize = 64 * 1024;

/// ファイル（`-` なら標準入力）を開く
pub fn open_reader<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let p = path.as_ref();
    if p.to_string_lossy() == "-" {
        return Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, io::stdin())));
    }
    let f = File::open(p)?;
    Ok(Box::new(BufReader::with_capacity(READER_BUF_CAP, f)))
}

/// JSON のエンジン設定を読み込む（未指定なら既定値）
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let mut text = String::new();
    open_reader(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .read_to_string(&mut text)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = EngineConfig::from_json(&text)
        .with_context(|| format!("invalid engine config in {}", path.display()))?;
    for key in config.unknown_keys() {
        log::warn!("{}: unknown option '{key}' is ignored", path.display());
    }
    Ok(config)
}

/// `variant` と FEN から局面を作る（`startpos` は初期局面）
pub fn parse_position(variant: Variant, fen: &str) -> Result<Position> {
    let fen = fen.trim();
    if fen.eq_ignore_ascii_case("startpos") {
        return Ok(Position::startpos(variant));
    }
    Position::from_fen(variant, fen).with_context(|| format!("invalid FEN '{fen}'"))
}

/// 1行1局面のリストを読む（空行と `#` 以降は無視）
pub fn load_positions(path: &Path, variant: Variant) -> Result<Vec<Position>> {
    let reader = open_reader(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut positions = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        let body = line.split('#').next().unwrap_or("").trim();
        if body.is_empty() {
            continue;
        }
        let pos = parse_position(variant, body)
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        positions.push(pos);
    }
    if positions.is_empty() {
        bail!("no positions in {}", path.display());
    }
    Ok(positions)
}

/// `english` / `international` を受け付ける
pub fn parse_variant(s: &str) -> Result<Variant> {
    match s.to_ascii_lowercase().as_str() {
        "english" | "checkers" | "8x8" => Ok(Variant::English),
        "international" | "10x10" => Ok(Variant::International),
        other => bail!("unknown variant '{other}' (expected english or international)"),
    }
}
