//! Viterbiアルゴリズムに基づくトークナイザー。
//!
//! このモジュールは、日本語形態素解析のためのメイントークナイザーを提供します。
//! Viterbiアルゴリズムを使用して、入力文を最小累積コストの形態素列に分割します。
//!
//! # 主要な構造体
//!
//! - [`Tokenizer`]: 形態素解析を実行するメイントークナイザー構造体
//! - [`Worker`]: トークナイザーのワーカー。実際の解析処理を行う
//!
//! # 例
//!
//! ```no_run
//! use std::fs::File;
//! use wakachi::{Dictionary, Tokenizer};
//!
//! let dict = Dictionary::read(File::open("path/to/model.dic")?)?;
//! let tokenizer = Tokenizer::new(dict);
//! let mut worker = tokenizer.new_worker();
//!
//! worker.reset_sentence("自然言語処理");
//! worker.tokenize();
//!
//! for token in worker.token_iter() {
//!     println!("{}", token.surface());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub(crate) mod lattice;
pub mod worker;

use std::sync::Arc;

use crate::dictionary::Dictionary;
use crate::dictionary::character::CharClass;
use crate::dictionary::lexicon::LexMatch;
use crate::filter::MorphemeFilter;
use crate::sentence::Sentence;
use crate::tokenizer::lattice::Lattice;
use crate::tokenizer::worker::Worker;

/// 形態素解析を行うトークナイザー。
///
/// `Tokenizer`は辞書への共有参照を保持し、複数の[`Worker`]インスタンスを
/// 生成して並列処理を行うことができます。辞書は読み込み後不変であるため、
/// ロックなしで共有されます。
///
/// # 例
///
/// ```no_run
/// use std::fs::File;
/// use wakachi::{Dictionary, Tokenizer};
///
/// let dict = Dictionary::read(File::open("path/to/model.dic")?)?;
/// let tokenizer = Tokenizer::new(dict);
/// let mut worker = tokenizer.new_worker();
///
/// worker.reset_sentence("形態素解析");
/// worker.tokenize();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Tokenizer {
    dict: Arc<Dictionary>,
    ignore_space: bool,
    max_grouping_len: Option<usize>,
    filters: Vec<Arc<dyn MorphemeFilter>>,
}

impl Tokenizer {
    /// 新しいトークナイザーを作成します。
    ///
    /// 辞書はトークナイザーに所有権が移動します。複数のトークナイザー間で
    /// 辞書を共有する必要がある場合は、[`Tokenizer::from_shared_dictionary`]を
    /// 使用してください。
    ///
    /// # 引数
    ///
    /// * `dict` - 形態素解析に使用する辞書
    ///
    /// # 戻り値
    ///
    /// 新しい`Tokenizer`インスタンス
    pub fn new(dict: Dictionary) -> Self {
        Self {
            dict: Arc::new(dict),
            ignore_space: true,
            max_grouping_len: None,
            filters: vec![],
        }
    }

    /// 共有された辞書から新しいトークナイザーを作成します。
    ///
    /// これは、複数のトークナイザーインスタンスが辞書データを再読み込み
    /// することなく同じ辞書データを共有する必要があるマルチスレッド
    /// シナリオで便利です。
    ///
    /// # 引数
    ///
    /// * `dict` - 共有される辞書への`Arc`参照
    ///
    /// # 戻り値
    ///
    /// 新しい`Tokenizer`インスタンス
    pub fn from_shared_dictionary(dict: Arc<Dictionary>) -> Self {
        Self {
            dict,
            ignore_space: true,
            max_grouping_len: None,
            filters: vec![],
        }
    }

    /// 空白文字をトークンから除外するかどうかを設定します。
    ///
    /// デフォルトでは有効です。有効の場合、空白の連続は後続トークンの
    /// スパンに含められ、表層形には含まれません。文末の空白連続には
    /// 後続トークンが存在しないため、どのトークンのスパンにも
    /// 含まれません。
    ///
    /// # 引数
    ///
    /// * `yes` - `true`の場合、空白文字をトークンから除外します
    ///
    /// # 戻り値
    ///
    /// 設定が適用された`Tokenizer`インスタンス
    pub const fn ignore_space(mut self, yes: bool) -> Self {
        self.ignore_space = yes;
        self
    }

    /// 未知語の最大グルーピング長を指定します。
    ///
    /// デフォルトでは、長さは無限です。
    ///
    /// # 引数
    ///
    /// * `max_grouping_len` - 未知語の最大グルーピング長。
    ///   デフォルト値は0で、無限の長さを示します。
    ///
    /// # 戻り値
    ///
    /// 設定が適用された`Tokenizer`インスタンス
    pub const fn max_grouping_len(mut self, max_grouping_len: usize) -> Self {
        if max_grouping_len != 0 {
            self.max_grouping_len = Some(max_grouping_len);
        } else {
            self.max_grouping_len = None;
        }
        self
    }

    /// 形態素列の後処理フックを登録します。
    ///
    /// フックは登録順に適用され、デコードされた形態素列を別の列に
    /// 置き換えることができます（複合語の分割など）。
    ///
    /// # 引数
    ///
    /// * `filter` - 登録するフック
    ///
    /// # 戻り値
    ///
    /// フックが登録された`Tokenizer`インスタンス
    pub fn append_filter(mut self, filter: Arc<dyn MorphemeFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// 辞書への参照を取得します。
    ///
    /// # 戻り値
    ///
    /// 辞書への参照
    #[inline(always)]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// 登録された後処理フックを返します。
    #[inline(always)]
    pub(crate) fn filters(&self) -> &[Arc<dyn MorphemeFilter>] {
        &self.filters
    }

    /// 新しいワーカーを作成します。
    ///
    /// ワーカーは実際の形態素解析処理を実行するために使用されます。
    /// 各ワーカーは独立したラティス構造を保持するため、複数のワーカーを
    /// 並列に使用して同時に複数の文を解析できます。
    ///
    /// # 戻り値
    ///
    /// 新しい[`Worker`]インスタンス
    pub fn new_worker(&self) -> Worker {
        Worker::new(self.clone())
    }

    /// ラティス構造を構築します。
    ///
    /// 入力文に対してViterbiアルゴリズム用のラティスを構築します。
    ///
    /// # 引数
    ///
    /// * `sent` - 入力文
    /// * `lattice` - 構築するラティス構造
    pub(crate) fn build_lattice(&self, sent: &Sentence, lattice: &mut Lattice) {
        lattice.reset(sent.len_char());

        // These variables indicate the starting character positions of words
        // currently stored in the lattice. If ignore_space() is unset, these
        // always have the same values, and start_node is practically
        // non-functional. If ignore_space() is set, start_node and start_word
        // indicate the starting positions containing and ignoring a space
        // character, respectively.
        let mut start_node = 0;
        let mut start_word = 0;
        let mut matches = vec![];

        while start_word < sent.len_char() {
            if !lattice.has_previous_node(start_node) {
                start_word += 1;
                start_node = start_word;
                continue;
            }

            if self.ignore_space && sent.char_class(start_node) == CharClass::Space {
                // Skips space characters.
                start_word += sent.groupable(start_node);
            }

            // Does the input end with spaces?
            if start_word == sent.len_char() {
                break;
            }

            self.add_lattice_edges(sent, lattice, start_node, start_word, &mut matches);

            start_word += 1;
            start_node = start_word;
        }

        lattice.insert_eos(start_node, self.dict.connector());
    }

    /// ラティスにエッジを追加します。
    ///
    /// 辞書マッチの有無を先に確定してから未知語候補を合成するため、
    /// 辞書マッチは一旦バッファに集められます。未知語候補は辞書由来の
    /// 候補より先に挿入され、同コストの場合は未知語候補が勝ちます。
    ///
    /// # 引数
    ///
    /// * `sent` - 入力文
    /// * `lattice` - エッジを追加するラティス
    /// * `start_node` - ノードの開始位置（スペースを含む）
    /// * `start_word` - 単語の開始位置（スペースを除く）
    /// * `matches` - 辞書マッチを溜める再利用バッファ
    fn add_lattice_edges(
        &self,
        sent: &Sentence,
        lattice: &mut Lattice,
        start_node: usize,
        start_word: usize,
        matches: &mut Vec<LexMatch>,
    ) {
        let connector = self.dict.connector();

        matches.clear();
        let suffix = &sent.chars()[start_word..];
        matches.extend(self.dict.system_lexicon().common_prefix_iterator(suffix));
        let has_matched = !matches.is_empty();

        self.dict.unk_handler().gen_unk_words(
            sent,
            start_word,
            has_matched,
            self.max_grouping_len,
            |w| {
                lattice.insert_node(
                    start_node,
                    w.begin_char(),
                    w.end_char(),
                    w.word_idx(),
                    w.word_param(),
                    connector,
                );
            },
        );

        for m in matches.drain(..) {
            debug_assert!(start_word + m.end_char <= sent.len_char());
            lattice.insert_node(
                start_node,
                start_word,
                start_word + m.end_char,
                m.word_idx,
                m.word_param,
                connector,
            );
        }
    }
}
