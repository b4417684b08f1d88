//! トークン化処理のためのルーチンを提供するモジュール。
//!
//! このモジュールは、形態素解析のための主要なワーカー構造体を提供します。
//! ワーカーは内部データ構造を保持し、再利用することで不要なメモリ
//! アロケーションを避けます。

use crate::sentence::Sentence;
use crate::token::{Morpheme, Token, TokenIter};
use crate::tokenizer::Tokenizer;
use crate::tokenizer::lattice::{Lattice, Node};

/// トークン化処理のためのルーチンを提供する構造体。
///
/// トークン化に使用される内部データ構造を保持し、それらを再利用することで
/// 不要なメモリ再割り当てを回避します。ワーカーは同時に複数の呼び出し元
/// から使用することはできません。並行に解析する場合は、同じ辞書を参照する
/// ワーカーを複数作成してください。
///
/// # 例
///
/// ```ignore
/// let mut worker = tokenizer.new_worker();
/// worker.reset_sentence("日本語の文章");
/// worker.tokenize();
/// for token in worker.token_iter() {
///     println!("{}", token.surface());
/// }
/// ```
pub struct Worker {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) sent: Sentence,
    pub(crate) lattice: Lattice,
    pub(crate) top_nodes: Vec<(usize, Node)>,
}

impl Worker {
    /// 新しいインスタンスを作成します。
    ///
    /// # 引数
    ///
    /// * `tokenizer` - 使用するトークナイザー
    pub(crate) fn new(tokenizer: Tokenizer) -> Self {
        Self {
            tokenizer,
            sent: Sentence::new(),
            lattice: Lattice::default(),
            top_nodes: vec![],
        }
    }

    /// トークン化する入力文をリセットします。
    ///
    /// 新しい文を設定し、以前の状態をクリアします。
    ///
    /// # 引数
    ///
    /// * `input` - トークン化する入力文字列
    pub fn reset_sentence<S>(&mut self, input: S)
    where
        S: AsRef<str>,
    {
        self.sent.clear();
        self.top_nodes.clear();
        let input = input.as_ref();
        if !input.is_empty() {
            self.sent.set_sentence(input);
            self.sent.compile();
        }
    }

    /// 設定された入力文をトークン化します。
    ///
    /// トークン化結果は内部状態に保存され、`token_iter()`や`token()`
    /// メソッドでアクセスできます。空の文が設定されている場合は何も
    /// 行いません。
    pub fn tokenize(&mut self) {
        if self.sent.chars().is_empty() {
            return;
        }
        self.tokenizer.build_lattice(&self.sent, &mut self.lattice);
        self.lattice.append_top_nodes(&mut self.top_nodes);
    }

    /// 入力文への参照を返します。
    ///
    /// # 戻り値
    ///
    /// 入力文への参照
    #[inline(always)]
    pub fn sentence(&self) -> &Sentence {
        &self.sent
    }

    /// トークン化結果のトークン数を取得します。
    ///
    /// # 戻り値
    ///
    /// トークンの総数
    #[inline(always)]
    pub fn num_tokens(&self) -> usize {
        self.top_nodes.len()
    }

    /// `i`番目のトークンを取得します。
    ///
    /// # 引数
    ///
    /// * `i` - トークンのインデックス（0から始まる）
    ///
    /// # 戻り値
    ///
    /// 指定されたインデックスのトークン
    #[inline(always)]
    pub fn token<'w>(&'w self, i: usize) -> Token<'w> {
        // Nodes are stored backward from EOS.
        let index = self.num_tokens() - i - 1;
        Token::new(self, index)
    }

    /// トークン化結果のイテレータを作成します。
    ///
    /// # 戻り値
    ///
    /// トークンのイテレータ
    #[inline(always)]
    pub fn token_iter<'w>(&'w self) -> TokenIter<'w> {
        TokenIter::new(self)
    }

    /// トークン化結果を所有型の形態素列として取り出します。
    ///
    /// 登録された後処理フックが登録順に適用された後、先頭の形態素に
    /// 文頭フラグが設定されます。
    ///
    /// # 戻り値
    ///
    /// 左から右へ、重なりのない順序で並んだ形態素のベクター
    pub fn morphemes(&self) -> Vec<Morpheme> {
        let mut morphemes: Vec<Morpheme> =
            self.token_iter().map(|t| t.to_morpheme()).collect();
        for filter in self.tokenizer.filters() {
            morphemes = filter.apply(morphemes);
        }
        if let Some(first) = morphemes.first_mut() {
            first.is_sentence_start = true;
        }
        morphemes
    }
}
