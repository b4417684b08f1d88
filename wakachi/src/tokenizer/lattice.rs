//! ラティス（格子）構造の実装モジュール。
//!
//! このモジュールは、形態素解析におけるViterbiアルゴリズムのための
//! ラティス構造を提供します。ラティスはノードから構成され、
//! 最小累積コストのトークン分割を見つけるために使用されます。

use crate::common::BOS_EOS_CONNECTION_ID;
use crate::dictionary::connector::MatrixConnector;
use crate::dictionary::lexicon::WordParam;
use crate::dictionary::word_idx::{LexType, WordIdx};

const MAX_COST: i32 = i32::MAX;
const INVALID_IDX: u16 = u16::MAX;

/// ラティス内のノード。
///
/// 各ノードは単語の候補を表し、位置情報、接続ID、最小コストなどを保持します。
#[derive(Debug, Clone, Copy)]
pub struct Node {
    /// 単語ID。
    pub word_id: u32,
    /// 語彙タイプ（システム辞書、未知語）。
    pub lex_type: LexType,
    /// ノードの開始位置（文字単位、スキップされた空白を含む）。
    pub start_node: usize,
    /// 単語の開始位置（文字単位）。
    pub start_word: usize,
    /// 左側の接続ID。
    pub left_id: u16,
    /// 右側の接続ID。
    pub right_id: u16,
    /// 最小コストを持つ左側ノードのインデックス。
    pub min_idx: u16,
    /// BOSからこのノードまでの最小コスト。
    pub min_cost: i32,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            word_id: 0,
            lex_type: LexType::System,
            start_node: 0,
            start_word: 0,
            left_id: 0,
            right_id: 0,
            min_idx: 0,
            min_cost: MAX_COST,
        }
    }
}

impl Node {
    /// 単語インデックスを取得します。
    #[inline(always)]
    pub fn word_idx(&self) -> WordIdx {
        WordIdx::new(self.lex_type, self.word_id)
    }

    /// このノードがBOSに接続されているかどうかを判定します。
    #[inline(always)]
    pub fn is_connected_to_bos(&self) -> bool {
        self.min_cost != MAX_COST
    }
}

/// 1-best解用のラティス構造体。
///
/// 終了位置ごとのノード配列と整数インデックスのバックポインタで構成され、
/// 文ごとに確保し直さずに再利用できます。
#[derive(Default)]
pub struct Lattice {
    ends: Vec<Vec<Node>>,
    eos: Option<Node>,
    len_char: usize, // needed for avoiding to free ends
}

impl Lattice {
    /// ラティスをリセットし、新しい文の処理を準備します。
    ///
    /// # 引数
    ///
    /// * `len_char` - 新しい文の文字数
    pub fn reset(&mut self, len_char: usize) {
        Self::reset_vec(&mut self.ends, len_char + 1);
        self.len_char = len_char;
        self.eos = None;
        self.insert_bos();
    }

    fn reset_vec<T>(data: &mut Vec<Vec<T>>, new_len: usize) {
        for v in data.iter_mut() {
            v.clear();
        }
        let cur_len = data.len();
        if cur_len <= new_len {
            data.reserve(new_len - cur_len);
            for _ in cur_len..new_len {
                data.push(Vec::with_capacity(16))
            }
        }
    }

    /// 設定された文の文字数を返します。
    ///
    /// # 戻り値
    ///
    /// 文字数
    #[inline(always)]
    pub const fn len_char(&self) -> usize {
        self.len_char
    }

    /// BOS（文頭）ノードを挿入します。
    ///
    /// 最良パスの抽出は位置0で打ち切られるため、BOSノードの開始位置が
    /// 読まれることはありません。
    fn insert_bos(&mut self) {
        self.ends[0].push(Node {
            word_id: u32::MAX,
            lex_type: LexType::System,
            start_node: 0,
            start_word: 0,
            left_id: u16::MAX,
            right_id: BOS_EOS_CONNECTION_ID,
            min_idx: INVALID_IDX,
            min_cost: 0,
        });
    }

    /// EOS（文末）ノードを挿入します。
    ///
    /// # 引数
    ///
    /// * `start_node` - EOSノードの開始位置
    /// * `connector` - 接続コスト計算用のコネクター
    pub fn insert_eos(&mut self, start_node: usize, connector: &MatrixConnector) {
        let (min_idx, min_cost) =
            self.search_min_node(start_node, BOS_EOS_CONNECTION_ID, connector);
        self.eos = Some(Node {
            word_id: u32::MAX,
            lex_type: LexType::System,
            start_node,
            start_word: self.len_char(),
            left_id: BOS_EOS_CONNECTION_ID,
            right_id: u16::MAX,
            min_idx,
            min_cost,
        });
    }

    /// ラティスに新しいノードを挿入します。
    ///
    /// # 引数
    ///
    /// * `start_node` - ノードの開始位置
    /// * `start_word` - 単語の開始位置
    /// * `end_word` - 単語の終了位置
    /// * `word_idx` - 単語インデックス
    /// * `word_param` - 単語パラメータ（接続ID、コストなど）
    /// * `connector` - 接続コスト計算用のコネクター
    pub fn insert_node(
        &mut self,
        start_node: usize,
        start_word: usize,
        end_word: usize,
        word_idx: WordIdx,
        word_param: WordParam,
        connector: &MatrixConnector,
    ) {
        debug_assert!(start_node <= start_word);
        debug_assert!(start_word < end_word);
        let (min_idx, min_cost) = self.search_min_node(start_node, word_param.left_id, connector);
        self.ends[end_word].push(Node {
            word_id: word_idx.word_id,
            lex_type: word_idx.lex_type,
            start_node,
            start_word,
            left_id: word_param.left_id,
            right_id: word_param.right_id,
            min_idx,
            min_cost: min_cost + i32::from(word_param.word_cost),
        });
    }

    /// 同じ位置で終わる左側ノードのうち、接続後の累積コストが最小となる
    /// ものを探索します。同コストの場合は先に挿入されたノードが勝ちます
    /// （安定な先着順であり、内容に依存しません）。
    fn search_min_node(
        &self,
        start_node: usize,
        left_id: u16,
        connector: &MatrixConnector,
    ) -> (u16, i32) {
        // A position without any incoming node means the single-character
        // unknown fallback was skipped somewhere, which is a defect.
        assert!(
            !self.ends[start_node].is_empty(),
            "no lattice node ends at character position {start_node}",
        );

        let mut min_idx = INVALID_IDX;
        let mut min_cost = MAX_COST;
        for (i, left_node) in self.ends[start_node].iter().enumerate() {
            debug_assert!(left_node.is_connected_to_bos());
            let conn_cost = connector.cost(left_node.right_id, left_id);
            let new_cost = left_node.min_cost + conn_cost;
            if new_cost < min_cost {
                min_idx = i as u16;
                min_cost = new_cost;
            }
        }

        debug_assert_ne!(min_idx, INVALID_IDX);
        (min_idx, min_cost)
    }

    /// 指定位置に少なくとも1つのノードが存在するかチェックします。
    ///
    /// # 引数
    ///
    /// * `i` - チェックする位置
    ///
    /// # 戻り値
    ///
    /// ノードが存在する場合は`true`、存在しない場合は`false`
    #[inline(always)]
    pub fn has_previous_node(&self, i: usize) -> bool {
        self.ends.get(i).map(|d| !d.is_empty()).unwrap_or(false)
    }

    /// 最良パスのノードをベクトルに追加します。
    ///
    /// EOSから後方にたどり、最良パスを構成するすべてのノードを
    /// `(終了位置, ノード)` の組として後ろから順に追加します。
    ///
    /// # 引数
    ///
    /// * `top_nodes` - ノードを追加するベクトル
    pub fn append_top_nodes(&self, top_nodes: &mut Vec<(usize, Node)>) {
        let eos = self
            .eos
            .as_ref()
            .expect("EOS node must be inserted before path extraction");
        let mut end_node = eos.start_node;
        let mut min_idx = eos.min_idx;
        while end_node != 0 {
            let node = &self.ends[end_node][usize::from(min_idx)];
            top_nodes.push((end_node, *node));
            (end_node, min_idx) = (node.start_node, node.min_idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_connector() -> MatrixConnector {
        MatrixConnector::from_reader("2 2".as_bytes()).unwrap()
    }

    #[test]
    fn test_cheapest_path_wins() {
        let conn = uniform_connector();
        let mut lattice = Lattice::default();
        lattice.reset(2);

        // Two segmentations of a two-character input: one long word of cost
        // 5, or two short words of cost 2 each.
        lattice.insert_node(
            0,
            0,
            2,
            WordIdx::new(LexType::System, 0),
            WordParam::new(0, 0, 5),
            &conn,
        );
        lattice.insert_node(
            0,
            0,
            1,
            WordIdx::new(LexType::System, 1),
            WordParam::new(0, 0, 2),
            &conn,
        );
        lattice.insert_node(
            1,
            1,
            2,
            WordIdx::new(LexType::System, 2),
            WordParam::new(0, 0, 2),
            &conn,
        );
        lattice.insert_eos(2, &conn);

        let mut top_nodes = vec![];
        lattice.append_top_nodes(&mut top_nodes);
        assert_eq!(top_nodes.len(), 2);
        assert_eq!(top_nodes[0].1.word_id, 2);
        assert_eq!(top_nodes[1].1.word_id, 1);
        assert_eq!(top_nodes[0].1.min_cost, 4);
    }

    #[test]
    fn test_tie_breaks_first_seen() {
        let conn = uniform_connector();
        let mut lattice = Lattice::default();
        lattice.reset(1);

        // Two candidates with identical costs covering the same range.
        lattice.insert_node(
            0,
            0,
            1,
            WordIdx::new(LexType::System, 7),
            WordParam::new(0, 0, 3),
            &conn,
        );
        lattice.insert_node(
            0,
            0,
            1,
            WordIdx::new(LexType::System, 8),
            WordParam::new(0, 0, 3),
            &conn,
        );
        lattice.insert_eos(1, &conn);

        let mut top_nodes = vec![];
        lattice.append_top_nodes(&mut top_nodes);
        assert_eq!(top_nodes.len(), 1);
        assert_eq!(top_nodes[0].1.word_id, 7);
    }

    #[test]
    fn test_connection_cost_changes_path() {
        // Matrix penalizing the transition 1 -> 1.
        let conn =
            MatrixConnector::from_reader("2 2\n1 1 100".as_bytes()).unwrap();
        let mut lattice = Lattice::default();
        lattice.reset(2);

        lattice.insert_node(
            0,
            0,
            1,
            WordIdx::new(LexType::System, 0),
            WordParam::new(0, 1, 1),
            &conn,
        );
        lattice.insert_node(
            0,
            0,
            1,
            WordIdx::new(LexType::System, 1),
            WordParam::new(0, 0, 2),
            &conn,
        );
        // The second word has left_id 1, so the path through word 0 pays
        // the 100-point penalty and loses despite the cheaper word cost.
        lattice.insert_node(
            1,
            1,
            2,
            WordIdx::new(LexType::System, 2),
            WordParam::new(1, 0, 1),
            &conn,
        );
        lattice.insert_eos(2, &conn);

        let mut top_nodes = vec![];
        lattice.append_top_nodes(&mut top_nodes);
        assert_eq!(top_nodes[1].1.word_id, 1);
        assert_eq!(top_nodes[0].1.min_cost, 3);
    }
}
