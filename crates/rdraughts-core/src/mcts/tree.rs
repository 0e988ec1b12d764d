//! ノードのアリーナと置換表
//!
//! ノードは `Vec<Arc<Node>>` に追記するだけで、探索中に削除しない。
//! 子への参照はインデックス（`NodeId`）で持つ。
//!
//! ロックの順序: ノードの展開 `Mutex` → 置換表 `Mutex` → アリーナの書き込みロック。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::position::Position;

use super::node::{Node, NodeId};

/// 置換表（局面のハッシュ → ノード）
struct TranspositionMap {
    map: HashMap<u64, NodeId>,
    max_entries: usize,
}

/// MCTSの木
pub struct Tree {
    nodes: RwLock<Vec<Arc<Node>>>,
    transpositions: Option<Mutex<TranspositionMap>>,
    root: NodeId,
}

impl Tree {
    /// 根だけの木を作る（`transposition_max_entries` が Some なら置換表を使う）
    pub fn new(root: Position, transposition_max_entries: Option<usize>) -> Self {
        let key = root.key_with_clock();
        let transpositions = transposition_max_entries.map(|max_entries| {
            let mut map = HashMap::new();
            map.insert(key, 0);
            Mutex::new(TranspositionMap { map, max_entries })
        });
        Self {
            nodes: RwLock::new(vec![Arc::new(Node::new(root, 0.0))]),
            transpositions,
            root: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// ノード数
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// 置換表の登録数
    pub fn transposition_entries(&self) -> usize {
        self.transpositions.as_ref().map_or(0, |t| t.lock().map.len())
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Arc<Node> {
        Arc::clone(&self.nodes.read()[id])
    }

    /// 局面のノードを返す（置換表にあれば共有し、なければ作る）
    ///
    /// 置換表が上限に達した後は、新しいノードを登録せずに作る。
    /// 合流先が `path` 上にあるときも共有せず、登録しないノードを作る（木に循環を作らない）。
    /// `make_bias` は新しくノードを作るときだけ呼ぶ。
    pub fn get_or_insert(
        &self,
        position: Position,
        path: &[NodeId],
        make_bias: impl FnOnce(&Position) -> f64,
    ) -> NodeId {
        let key = position.key_with_clock();
        let Some(transpositions) = &self.transpositions else {
            return self.push(position, make_bias);
        };
        let mut table = transpositions.lock();
        if let Some(&id) = table.map.get(&key) {
            if !path.contains(&id) {
                return id;
            }
            drop(table);
            log::trace!("transposition {key:016x} is on the current path; creating a separate node");
            return self.push(position, make_bias);
        }
        let id = self.push(position, make_bias);
        if table.map.len() < table.max_entries {
            table.map.insert(key, id);
        }
        id
    }

    fn push(&self, position: Position, make_bias: impl FnOnce(&Position) -> f64) -> NodeId {
        let bias = make_bias(&position);
        let node = Arc::new(Node::new(position, bias));
        let mut nodes = self.nodes.write();
        nodes.push(node);
        nodes.len() - 1
    }

    /// 全ノードの virtual loss を消し、消した数を返す
    ///
    /// どのワーカーも木を触っていないときに呼ぶ。
    pub fn clear_virtual_loss(&self) -> u64 {
        self.nodes
            .read()
            .iter()
            .map(|n| n.reset_virtual_loss() as u64)
            .sum()
    }

    /// 根の子のうち指定した手のノード
    pub fn child_for(&self, parent: NodeId, key: u64) -> Option<NodeId> {
        let node = self.node(parent);
        let children: Vec<NodeId> = node.expansion.lock().children.iter().map(|e| e.child).collect();
        children.into_iter().find(|&c| self.node(c).key == key)
    }

    /// 2ply以内に新しい局面と同じノードがあれば、そこを根にする
    pub fn reroot(&mut self, position: &Position) -> bool {
        let matches = |id: NodeId| {
            let node = self.node(id);
            node.key == position.key() && node.position == *position
        };
        if matches(self.root) {
            return true;
        }
        let first: Vec<NodeId> = {
            let root = self.node(self.root);
            let exp = root.expansion.lock();
            exp.children.iter().map(|e| e.child).collect()
        };
        for &c in &first {
            if matches(c) {
                self.root = c;
                return true;
            }
        }
        for &c in &first {
            let second: Vec<NodeId> = {
                let node = self.node(c);
                let exp = node.expansion.lock();
                exp.children.iter().map(|e| e.child).collect()
            };
            if let Some(&g) = second.iter().find(|&&g| matches(g)) {
                self.root = g;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcts::node::Edge;
    use crate::types::Variant;

    fn expand_all(tree: &Tree, id: NodeId) {
        let node = tree.node(id);
        let mut exp = node.expansion.lock();
        let moves = std::mem::take(&mut exp.untried);
        for mv in moves {
            let child = tree.get_or_insert(node.position.do_move(&mv), &[], |_| 0.0);
            exp.children.push(Edge { mv, child });
        }
    }

    fn play(pos: &Position, notation: &str) -> Position {
        let mv = pos
            .legal_moves()
            .into_iter()
            .find(|m| m.notation(pos.variant()) == notation)
            .unwrap();
        pos.do_move(&mv)
    }

    #[test]
    fn test_transpositions_share_nodes() {
        let pos = Position::startpos(Variant::English);
        let tree = Tree::new(pos.clone(), Some(1000));

        let mut x = pos.clone();
        for n in ["21-17", "9-13", "24-20", "12-16"] {
            x = play(&x, n);
        }
        let mut y = pos.clone();
        for n in ["24-20", "12-16", "21-17", "9-13"] {
            y = play(&y, n);
        }
        assert_eq!(x.key_with_clock(), y.key_with_clock());

        let ix = tree.get_or_insert(x, &[], |_| 0.0);
        let iy = tree.get_or_insert(y, &[], |_| 0.0);
        assert_eq!(ix, iy);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_transposition_on_the_path_gets_its_own_node() {
        let pos = Position::from_fen(Variant::English, "W:WK18:BK3").unwrap();
        let tree = Tree::new(pos.clone(), Some(1000));
        let root = tree.root();
        let child_pos = pos.do_move(&pos.legal_moves()[0]);
        let child = tree.get_or_insert(child_pos.clone(), &[root], |_| 0.0);

        // 経路上のノードと同じ局面は共有しない
        let again = tree.get_or_insert(pos.clone(), &[root, child], |_| 0.0);
        assert_ne!(again, root);
        assert_eq!(tree.node(again).position, pos);
        assert_eq!(tree.len(), 3);

        // 経路外なら共有する
        assert_eq!(tree.get_or_insert(child_pos, &[root], |_| 0.0), child);
        assert_eq!(tree.get_or_insert(pos, &[], |_| 0.0), root);
    }

    #[test]
    fn test_full_table_stops_registering() {
        let pos = Position::startpos(Variant::English);
        let tree = Tree::new(pos.clone(), Some(1));
        let child = pos.do_move(&pos.legal_moves()[0]);
        let a = tree.get_or_insert(child.clone(), &[], |_| 0.0);
        let b = tree.get_or_insert(child, &[], |_| 0.0);
        assert_ne!(a, b);
        assert_eq!(tree.transposition_entries(), 1);
    }

    #[test]
    fn test_reroot_within_two_plies() {
        let pos = Position::startpos(Variant::English);
        let mut tree = Tree::new(pos.clone(), None);
        expand_all(&tree, tree.root());
        let mv = pos.legal_moves()[2].clone();
        let child_pos = pos.do_move(&mv);
        let child = tree.child_for(tree.root(), child_pos.key()).unwrap();
        expand_all(&tree, child);

        let reply = child_pos.legal_moves()[1].clone();
        let grandchild = child_pos.do_move(&reply);
        assert!(tree.reroot(&grandchild));
        assert_eq!(tree.node(tree.root()).position, grandchild);

        let unrelated = Position::startpos(Variant::International);
        assert!(!tree.reroot(&unrelated));
    }
}
