//! 局面（Position）
//!
//! - `Position`: 盤面、手番、静かな手のカウンタ、Zobristキー
//! - `GameOutcome`: 終局結果
//! - 指し手生成は `movegen`、乱数表は `zobrist`
//!
//! 局面は値型として扱う。`do_move` は新しい局面を返し、元の局面は変更しない。
//! 探索側は呼び出し元の局面を書き換えずに子局面を作って展開する。

mod movegen;
mod zobrist;

pub use movegen::{count_captures, generate_captures, generate_legal, has_capture};
pub use zobrist::{ZOBRIST, zobrist_psq, zobrist_side, zobrist_turn, zobrist_variant};

use serde::{Deserialize, Serialize};

use crate::error::PositionError;
use crate::types::{Color, Move, MoveList, Piece, Square, Variant};

/// 終局結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    /// 指定色の勝ち
    Win(Color),
    /// 引き分け
    Draw,
}

/// 局面
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    variant: Variant,
    board: [Option<Piece>; Square::NUM],
    side_to_move: Color,
    /// [color][0=兵, 1=キング]
    counts: [[u8; 2]; Color::NUM],
    /// 最後に兵が動くか捕獲があってからのply数
    quiet_plies: u16,
    /// 開始局面からのply数
    game_ply: u32,
    key: u64,
}

impl Position {
    /// 空の盤面（白番）
    pub fn empty(variant: Variant) -> Position {
        Position {
            variant,
            board: [None; Square::NUM],
            side_to_move: Color::White,
            counts: [[0; 2]; Color::NUM],
            quiet_plies: 0,
            game_ply: 0,
            key: zobrist_variant(variant),
        }
    }

    /// 初期局面
    pub fn startpos(variant: Variant) -> Position {
        let mut pos = Position::empty(variant);
        let size = variant.size();
        let rows = variant.man_rows();
        for row in 0..size {
            for col in 0..size {
                let sq = Square::new(row, col);
                if !sq.is_dark() {
                    continue;
                }
                if row < rows {
                    pos.put_piece(sq, Piece::BlackMan);
                } else if row >= size - rows {
                    pos.put_piece(sq, Piece::WhiteMan);
                }
            }
        }
        pos
    }

    // =========================================================================
    // アクセサ
    // =========================================================================

    #[inline]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Zobristキー
    ///
    /// 駒の配置と手番だけから作る。静かな手のカウンタは含まないので、
    /// 引き分けまでの残りが違う局面も同じ値になる。
    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// 静かな手のカウンタを混ぜたキー
    ///
    /// 探索結果を保存する表（置換表、MCTSの合流、終盤証明のキャッシュ）はこちらを使う。
    #[inline]
    pub fn key_with_clock(&self) -> u64 {
        self.key ^ (self.quiet_plies as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    #[inline]
    pub fn game_ply(&self) -> u32 {
        self.game_ply
    }

    #[inline]
    pub fn quiet_plies(&self) -> u16 {
        self.quiet_plies
    }

    /// 指定色の駒数
    #[inline]
    pub fn count(&self, color: Color) -> u32 {
        let c = self.counts[color.index()];
        c[0] as u32 + c[1] as u32
    }

    /// 指定色の兵の数
    #[inline]
    pub fn men(&self, color: Color) -> u32 {
        self.counts[color.index()][0] as u32
    }

    /// 指定色のキングの数
    #[inline]
    pub fn kings(&self, color: Color) -> u32 {
        self.counts[color.index()][1] as u32
    }

    /// 盤上の駒の総数
    #[inline]
    pub fn piece_count(&self) -> u32 {
        self.count(Color::White) + self.count(Color::Black)
    }

    /// 指定色の駒を列挙する（行優先）
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        let size = self.variant.size();
        (0..size)
            .flat_map(move |row| (0..size).map(move |col| Square::new(row, col)))
            .filter_map(move |sq| match self.board[sq.index()] {
                Some(pc) if pc.color() == color => Some((sq, pc)),
                _ => None,
            })
    }

    // =========================================================================
    // 盤面編集
    // =========================================================================

    /// 駒を置く（既存の駒は置き換える）
    pub fn put_piece(&mut self, sq: Square, pc: Piece) {
        debug_assert!(sq.is_dark());
        self.remove_piece(sq);
        self.board[sq.index()] = Some(pc);
        self.counts[pc.color().index()][pc.is_king() as usize] += 1;
        self.key ^= zobrist_psq(pc, sq);
    }

    /// 駒を取り除く
    pub fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let pc = self.board[sq.index()].take()?;
        self.counts[pc.color().index()][pc.is_king() as usize] -= 1;
        self.key ^= zobrist_psq(pc, sq);
        Some(pc)
    }

    /// 手番を設定する
    pub fn set_side_to_move(&mut self, color: Color) {
        if self.side_to_move != color {
            self.side_to_move = color;
            self.key ^= zobrist_side();
        }
    }

    // =========================================================================
    // ルール
    // =========================================================================

    /// 手番側の合法手
    pub fn legal_moves(&self) -> MoveList {
        let mut list = MoveList::new();
        generate_legal(self, self.side_to_move, &mut list);
        list
    }

    /// 指定色の合法手（手番に関係なく生成する。機動力の評価用）
    pub fn moves_for(&self, color: Color) -> MoveList {
        let mut list = MoveList::new();
        generate_legal(self, color, &mut list);
        list
    }

    /// 手番側に捕獲が強制されているか
    #[inline]
    pub fn capture_forced(&self) -> bool {
        has_capture(self, self.side_to_move)
    }

    /// 静かな手の連続による引き分けか
    #[inline]
    pub fn is_quiet_draw(&self) -> bool {
        self.quiet_plies >= self.variant.quiet_ply_limit()
    }

    /// 終局判定
    ///
    /// 手番側に駒がない、または合法手がなければ相手の勝ち。
    pub fn outcome(&self) -> Option<GameOutcome> {
        let us = self.side_to_move;
        if self.count(us) == 0 {
            return Some(GameOutcome::Win(!us));
        }
        if self.legal_moves().is_empty() {
            return Some(GameOutcome::Win(!us));
        }
        if self.is_quiet_draw() {
            return Some(GameOutcome::Draw);
        }
        None
    }

    /// 指し手を適用した新しい局面を返す
    pub fn do_move(&self, mv: &Move) -> Position {
        let mut next = self.clone();
        let moved = next.remove_piece(mv.from());
        debug_assert!(moved.is_some(), "no piece on move origin");
        for &sq in mv.captured() {
            next.remove_piece(sq);
        }
        if let Some(pc) = moved {
            let pc = if mv.is_promotion() { pc.promoted() } else { pc };
            next.put_piece(mv.to(), pc);
            if mv.is_capture() || !pc.is_king() || mv.is_promotion() {
                next.quiet_plies = 0;
            } else {
                next.quiet_plies = next.quiet_plies.saturating_add(1);
            }
        }
        next.game_ply += 1;
        next.side_to_move = !next.side_to_move;
        next.key ^= zobrist_side();
        next
    }

    /// パスした局面を返す（探索のnull move用）
    pub fn do_null_move(&self) -> Position {
        let mut next = self.clone();
        next.side_to_move = !next.side_to_move;
        next.key ^= zobrist_side();
        next
    }

    /// Zobristキーを盤面から再計算する（検証用）
    pub fn compute_key(&self) -> u64 {
        let mut key = zobrist_variant(self.variant) ^ zobrist_turn(self.side_to_move);
        for color in [Color::White, Color::Black] {
            for (sq, pc) in self.pieces(color) {
                key ^= zobrist_psq(pc, sq);
            }
        }
        key
    }

    // =========================================================================
    // PDN FEN
    // =========================================================================

    /// PDN FEN から局面を作る
    ///
    /// 例: `W:W21,22,K30:B1-12`。手番、白駒、黒駒の順で、`K` はキング。
    pub fn from_fen(variant: Variant, fen: &str) -> Result<Position, PositionError> {
        let fen = fen.trim().trim_end_matches('.');
        let mut fields = fen.split(':');
        let turn = match fields.next().map(str::trim) {
            Some("W") | Some("w") => Color::White,
            Some("B") | Some("b") => Color::Black,
            _ => return Err(PositionError::InvalidFen(fen.to_string())),
        };

        let mut pos = Position::empty(variant);
        for field in fields {
            let field = field.trim();
            let (color, rest) = match field.chars().next() {
                Some('W') | Some('w') => (Color::White, &field[1..]),
                Some('B') | Some('b') => (Color::Black, &field[1..]),
                _ => return Err(PositionError::InvalidFen(fen.to_string())),
            };
            for token in rest.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                let (king, body) = match token.strip_prefix(['K', 'k']) {
                    Some(body) => (true, body),
                    None => (false, token),
                };
                let (lo, hi) = match body.split_once('-') {
                    Some((a, b)) => (parse_number(a, fen)?, parse_number(b, fen)?),
                    None => {
                        let n = parse_number(body, fen)?;
                        (n, n)
                    }
                };
                for number in lo..=hi {
                    let sq = Square::from_number(variant, number)
                        .ok_or(PositionError::InvalidSquare { number, variant })?;
                    if pos.piece_on(sq).is_some() {
                        return Err(PositionError::DuplicateSquare(number));
                    }
                    pos.put_piece(sq, Piece::new(color, king));
                }
            }
        }
        pos.set_side_to_move(turn);
        Ok(pos)
    }

    /// PDN FEN に変換する
    pub fn to_fen(&self) -> String {
        let turn = match self.side_to_move {
            Color::White => 'W',
            Color::Black => 'B',
        };
        let mut s = String::new();
        s.push(turn);
        for (color, tag) in [(Color::White, 'W'), (Color::Black, 'B')] {
            s.push(':');
            s.push(tag);
            let squares: Vec<String> = self
                .pieces(color)
                .map(|(sq, pc)| {
                    let n = sq.number(self.variant);
                    if pc.is_king() { format!("K{n}") } else { n.to_string() }
                })
                .collect();
            s.push_str(&squares.join(","));
        }
        s
    }
}

fn parse_number(s: &str, fen: &str) -> Result<u32, PositionError> {
    s.trim()
        .parse::<u32>()
        .map_err(|_| PositionError::InvalidFen(fen.to_string()))
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Position({:?}, {})", self.variant, self.to_fen())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.variant.size();
        for row in 0..size {
            for col in 0..size {
                let c = match self.piece_on(Square::new(row, col)) {
                    Some(Piece::WhiteMan) => 'w',
                    Some(Piece::WhiteKing) => 'W',
                    Some(Piece::BlackMan) => 'b',
                    Some(Piece::BlackKing) => 'B',
                    None if (row + col) % 2 == 1 => '.',
                    None => ' ',
                };
                write!(f, "{c}")?;
            }
            writeln!(f)?;
        }
        write!(f, "{} to move", self.side_to_move)
    }
}
