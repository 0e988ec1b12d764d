//! 指し手生成
//!
//! - 捕獲は強制。捕獲手が1つでもあれば非捕獲手は生成しない
//! - 連続ジャンプは深さ優先で列挙し、続きがなくなった時点で1手とする
//! - 取った駒はジャンプ列が終わるまで盤上に残り、二度は飛び越えられない
//! - 動かす駒の元のマスはジャンプ中は空きとして扱う
//! - International では最多捕獲（同数ならキングを多く取る手）のみ合法

use smallvec::SmallVec;

use crate::types::{Color, Move, MoveList, Path, Piece, Square};

use super::Position;

/// 斜め4方向 (dr, dc)
const ALL_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// 駒の移動・捕獲方向
fn directions(pc: Piece, capture: bool, backward_capture: bool) -> SmallVec<[(i8, i8); 4]> {
    if pc.is_king() || (capture && backward_capture) {
        return SmallVec::from_slice(&ALL_DIRECTIONS);
    }
    let f = pc.color().forward();
    SmallVec::from_slice(&[(f, -1), (f, 1)])
}

/// 成る行
#[inline]
pub(crate) fn promotion_row(color: Color, size: u8) -> u8 {
    match color {
        Color::White => 0,
        Color::Black => size - 1,
    }
}

/// 合法手を生成する
pub fn generate_legal(pos: &Position, color: Color, out: &mut MoveList) {
    out.clear();
    generate_captures(pos, color, out);
    if !out.is_empty() {
        if pos.variant().majority_capture() {
            retain_majority(out);
        }
        return;
    }
    generate_quiets(pos, color, out);
}

/// 捕獲手を全駒について生成する（最多捕獲の絞り込みはしない）
pub fn generate_captures(pos: &Position, color: Color, out: &mut MoveList) {
    for (sq, pc) in pos.pieces(color) {
        let mut walker = CaptureWalker {
            pos,
            origin: sq,
            piece: pc,
            path: Path::new(),
            captured: Path::new(),
            captured_kings: 0,
        };
        walker.walk(sq, out);
    }
}

/// 手番側に捕獲手があるか（強制捕獲の判定）
pub fn has_capture(pos: &Position, color: Color) -> bool {
    let size = pos.variant().size();
    let backward = pos.variant().men_capture_backward();
    let flying = pos.variant().flying_kings();
    pos.pieces(color).any(|(sq, pc)| {
        directions(pc, true, backward).iter().any(|&(dr, dc)| {
            first_jump_exists(pos, sq, pc, dr, dc, size, flying && pc.is_king())
        })
    })
}

/// `color` 側の捕獲列の総数（駒ごとの可能な捕獲列を合計する）
pub fn count_captures(pos: &Position, color: Color) -> usize {
    let mut list = MoveList::new();
    generate_captures(pos, color, &mut list);
    list.len()
}

fn first_jump_exists(
    pos: &Position,
    from: Square,
    pc: Piece,
    dr: i8,
    dc: i8,
    size: u8,
    flying: bool,
) -> bool {
    let mut n = 1;
    loop {
        let Some(over) = from.offset(dr, dc, n, size) else {
            return false;
        };
        match pos.piece_on(over) {
            None if flying => n += 1,
            None => return false,
            Some(target) if target.color() == pc.color() => return false,
            Some(_) => {
                return matches!(from.offset(dr, dc, n + 1, size), Some(land) if pos.piece_on(land).is_none());
            }
        }
    }
}

/// 連続ジャンプの深さ優先探索
struct CaptureWalker<'a> {
    pos: &'a Position,
    origin: Square,
    piece: Piece,
    path: Path,
    captured: Path,
    captured_kings: u8,
}

impl CaptureWalker<'_> {
    /// ジャンプ中の占有状況（元のマスは空き）
    #[inline]
    fn occupant(&self, sq: Square) -> Option<Piece> {
        if sq == self.origin {
            None
        } else {
            self.pos.piece_on(sq)
        }
    }

    fn walk(&mut self, cur: Square, out: &mut MoveList) {
        let variant = self.pos.variant();
        let size = variant.size();
        let flying = variant.flying_kings() && self.piece.is_king();
        let mut extended = false;

        for &(dr, dc) in &directions(self.piece, true, variant.men_capture_backward()) {
            // 飛び越える駒を探す
            let mut n = 1;
            let over = loop {
                let Some(sq) = cur.offset(dr, dc, n, size) else {
                    break None;
                };
                if self.occupant(sq).is_some() || !flying {
                    break Some((sq, n));
                }
                n += 1;
            };
            let Some((over, dist)) = over else {
                continue;
            };
            let Some(target) = self.occupant(over) else {
                continue;
            };
            if target.color() == self.piece.color() || self.captured.contains(&over) {
                continue;
            }

            // 着地点（飛びキングは空きマスが続く限りどこでも）
            let mut land_n = dist + 1;
            while let Some(land) = cur.offset(dr, dc, land_n, size) {
                if self.occupant(land).is_some() {
                    break;
                }
                extended = true;
                self.path.push(land);
                self.captured.push(over);
                self.captured_kings += target.is_king() as u8;
                self.walk(land, out);
                self.captured_kings -= target.is_king() as u8;
                self.captured.pop();
                self.path.pop();
                if !flying {
                    break;
                }
                land_n += 1;
            }
        }

        if !extended && !self.path.is_empty() {
            let promotes =
                !self.piece.is_king() && cur.row() == promotion_row(self.piece.color(), size);
            out.push(Move::capture(
                self.origin,
                self.path.clone(),
                self.captured.clone(),
                self.captured_kings,
                promotes,
            ));
        }
    }
}

/// 最多捕獲ルール：捕獲数最大、同数ならキング捕獲数最大の手だけ残す
fn retain_majority(moves: &mut MoveList) {
    let Some(best) = moves
        .iter()
        .map(|m| (m.capture_count(), m.captured_kings()))
        .max()
    else {
        return;
    };
    moves.retain(|m| (m.capture_count(), m.captured_kings()) == best);
}

/// 非捕獲手を生成する
fn generate_quiets(pos: &Position, color: Color, out: &mut MoveList) {
    let size = pos.variant().size();
    let flying = pos.variant().flying_kings();
    let target_row = promotion_row(color, size);
    for (sq, pc) in pos.pieces(color) {
        for &(dr, dc) in &directions(pc, false, false) {
            let mut n = 1;
            while let Some(to) = sq.offset(dr, dc, n, size) {
                if pos.piece_on(to).is_some() {
                    break;
                }
                let promotes = !pc.is_king() && to.row() == target_row;
                out.push(Move::step(sq, to, promotes));
                if !(flying && pc.is_king()) {
                    break;
                }
                n += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variant;

    fn notations(pos: &Position) -> Vec<String> {
        let mut v: Vec<String> = pos
            .legal_moves()
            .iter()
            .map(|m| m.notation(pos.variant()))
            .collect();
        v.sort();
        v
    }

    #[test]
    fn test_startpos_move_counts() {
        // English の初期局面は7手、International は9手
        assert_eq!(Position::startpos(Variant::English).legal_moves().len(), 7);
        assert_eq!(Position::startpos(Variant::International).legal_moves().len(), 9);
    }

    #[test]
    fn test_capture_is_forced() {
        let pos = Position::from_fen(Variant::English, "W:W22,30:B18").unwrap();
        assert_eq!(notations(&pos), vec!["22x15"]);
        assert!(has_capture(&pos, Color::White));
    }

    #[test]
    fn test_english_men_do_not_capture_backward() {
        // 白の兵の後ろにいる黒駒は取れない
        let pos = Position::from_fen(Variant::English, "W:W18:B22").unwrap();
        assert!(!has_capture(&pos, Color::White));
        assert!(notations(&pos).iter().all(|m| m.contains('-')));
    }

    #[test]
    fn test_multi_jump_is_one_move() {
        // 22x15x8 の2連続ジャンプ
        let pos = Position::from_fen(Variant::English, "W:W22:B18,11,1").unwrap();
        assert_eq!(notations(&pos), vec!["22x15x8"]);
        let mv = &pos.legal_moves()[0];
        assert_eq!(mv.capture_count(), 2);
    }

    #[test]
    fn test_promotion_flag() {
        let pos = Position::from_fen(Variant::English, "W:W6:B32").unwrap();
        let moves = pos.legal_moves();
        assert!(moves.iter().all(|m| m.is_promotion()));
    }

    #[test]
    fn test_international_men_capture_backward() {
        // 白28の後ろ(33)に黒、その先(39)が空き
        let pos = Position::from_fen(Variant::International, "W:W28:B33").unwrap();
        assert_eq!(notations(&pos), vec!["28x39"]);
    }

    #[test]
    fn test_international_majority_capture() {
        // 1個取りと2個取りがあるときは2個取りのみ
        let pos = Position::from_fen(Variant::International, "W:W32,35:B27,19,30").unwrap();
        let moves = pos.legal_moves();
        assert!(!moves.is_empty());
        let max = moves.iter().map(|m| m.capture_count()).max().unwrap();
        assert!(moves.iter().all(|m| m.capture_count() == max));
        assert_eq!(max, 2);
    }

    #[test]
    fn test_flying_king_moves_and_captures() {
        // 空盤のキングは対角線上のどこへでも動ける
        let pos = Position::from_fen(Variant::International, "W:WK46:B1").unwrap();
        assert_eq!(pos.legal_moves().len(), 9);

        // 離れた駒を取り、その先の任意の空きマスに着地できる
        let pos = Position::from_fen(Variant::International, "W:WK46:B23").unwrap();
        let moves = pos.legal_moves();
        assert!(moves.iter().all(|m| m.is_capture()));
        assert_eq!(moves.len(), 4);
    }
}
