//! トークンの結果コンテナ
//!
//! このモジュールは、形態素解析の結果として得られるトークンを表現する型を
//! 提供します。[`Token`]は辞書内の単語への軽量な参照であり、表層形、
//! 品詞情報、位置情報などへ遅延的にアクセスします。[`Morpheme`]はその
//! 所有型版です。

use std::ops::Range;

use crate::dictionary::word_idx::{LexType, WordIdx};
use crate::tokenizer::worker::Worker;

/// 未知語の解決に使用される空の文字列リスト
const NO_STRINGS: &[String] = &[];

/// 形態素解析の結果トークン
///
/// このトークンは[`Worker`]への軽量な参照であり、実際のデータは
/// Workerが保持しています。トークンはWorkerが生存している間のみ有効です。
///
/// トークンからは以下の情報にアクセスできます：
/// - 表層形（元のテキスト中の文字列）
/// - 品詞・活用・読みなどの素性情報
/// - 文字位置およびバイト位置
/// - 単語コストおよび累積コスト
pub struct Token<'w> {
    worker: &'w Worker,
    index: usize,
}

impl<'w> Token<'w> {
    #[inline(always)]
    pub(crate) const fn new(worker: &'w Worker, index: usize) -> Self {
        Self { worker, index }
    }

    #[inline(always)]
    fn node(&self) -> &(usize, crate::tokenizer::lattice::Node) {
        &self.worker.top_nodes[self.index]
    }

    /// トークンの文字単位の位置範囲を取得します。
    ///
    /// # 戻り値
    ///
    /// トークンの開始位置から終了位置までの文字単位の範囲を返します。
    #[inline(always)]
    pub fn range_char(&self) -> Range<usize> {
        let (end_word, node) = self.node();
        node.start_word..*end_word
    }

    /// トークンのスパン（スキップされた空白を含む文字範囲）を取得します。
    ///
    /// 空白の無視が有効な場合、先行する空白の連続はこの範囲に含まれ
    /// ますが、[`range_char`](Self::range_char)には含まれません。勝者
    /// パスのスパンは文全体を隙間なく覆います。
    #[inline(always)]
    pub fn span_char(&self) -> Range<usize> {
        let (end_word, node) = self.node();
        node.start_node..*end_word
    }

    /// トークンのバイト単位の位置範囲を取得します。
    ///
    /// # 戻り値
    ///
    /// トークンの開始位置から終了位置までのバイト単位の範囲を返します。
    #[inline(always)]
    pub fn range_byte(&self) -> Range<usize> {
        let sent = &self.worker.sent;
        let (end_word, node) = self.node();
        sent.byte_position(node.start_word)..sent.byte_position(*end_word)
    }

    /// トークンの表層形（元のテキスト中の文字列）を取得します。
    ///
    /// # 戻り値
    ///
    /// トークンの表層形の文字列参照を返します。
    #[inline(always)]
    pub fn surface(&self) -> &'w str {
        let sent = &self.worker.sent;
        &sent.raw()[self.range_byte()]
    }

    /// トークンの単語インデックスを取得します。
    ///
    /// # 戻り値
    ///
    /// 辞書内の単語を一意に識別する[`WordIdx`]を返します。
    #[inline(always)]
    pub fn word_idx(&self) -> WordIdx {
        self.node().1.word_idx()
    }

    /// トークンが由来する語彙のタイプを取得します。
    ///
    /// # 戻り値
    ///
    /// システム辞書、未知語のいずれかを示す[`LexType`]を返します。
    #[inline(always)]
    pub fn lex_type(&self) -> LexType {
        self.word_idx().lex_type
    }

    /// トークンノードの左文脈IDを取得します。
    #[inline(always)]
    pub fn left_id(&self) -> u16 {
        self.node().1.left_id
    }

    /// トークンノードの右文脈IDを取得します。
    #[inline(always)]
    pub fn right_id(&self) -> u16 {
        self.node().1.right_id
    }

    /// トークンノードの単語コストを取得します。
    ///
    /// # 戻り値
    ///
    /// 単語の生起コストを返します。値が低いほど出現しやすい単語です。
    #[inline(always)]
    pub fn word_cost(&self) -> i16 {
        let dict = self.worker.tokenizer.dictionary();
        let word_idx = self.word_idx();
        match word_idx.lex_type {
            LexType::System => dict.system_lexicon().word_param(word_idx).word_cost,
            LexType::Unknown => dict.unk_handler().word_template(word_idx).word_cost,
        }
    }

    /// 文頭からこのトークンノードまでの累積コストを取得します。
    ///
    /// # 戻り値
    ///
    /// BOS（文頭）からこのトークンまでのパス全体の累積コストを返します。
    #[inline(always)]
    pub fn total_cost(&self) -> i32 {
        self.node().1.min_cost
    }

    /// トークンの品詞文字列を取得します。
    ///
    /// 未知語の場合は、テンプレートに定義された品詞を返します。
    #[inline(always)]
    pub fn part_of_speech(&self) -> &'w str {
        let dict = self.worker.tokenizer.dictionary();
        let word_idx = self.word_idx();
        let pos_id = match word_idx.lex_type {
            LexType::System => dict.system_lexicon().word_record(word_idx).pos_id,
            LexType::Unknown => dict.unk_handler().word_template(word_idx).pos_id,
        };
        dict.features().pos(pos_id)
    }

    /// トークンの活用型文字列を取得します。
    ///
    /// 未知語の場合は`*`を返します。
    #[inline(always)]
    pub fn conjugation_type(&self) -> &'w str {
        let dict = self.worker.tokenizer.dictionary();
        let word_idx = self.word_idx();
        match word_idx.lex_type {
            LexType::System => dict
                .features()
                .conj_type(dict.system_lexicon().word_record(word_idx).conj_type_id),
            LexType::Unknown => "*",
        }
    }

    /// トークンの活用形文字列を取得します。
    ///
    /// 未知語の場合は`*`を返します。
    #[inline(always)]
    pub fn conjugation_form(&self) -> &'w str {
        let dict = self.worker.tokenizer.dictionary();
        let word_idx = self.word_idx();
        match word_idx.lex_type {
            LexType::System => dict
                .features()
                .conj_form(dict.system_lexicon().word_record(word_idx).conj_form_id),
            LexType::Unknown => "*",
        }
    }

    /// トークンの基本形（原形）を取得します。
    ///
    /// 辞書に基本形が定義されていない場合、および未知語の場合は
    /// 表層形を返します。
    #[inline(always)]
    pub fn base_form(&self) -> &'w str {
        let dict = self.worker.tokenizer.dictionary();
        let word_idx = self.word_idx();
        match word_idx.lex_type {
            LexType::System => {
                let record = dict.system_lexicon().word_record(word_idx);
                let base_form = &dict.features().word_data(record.data_id).base_form;
                if base_form.is_empty() {
                    self.surface()
                } else {
                    base_form
                }
            }
            LexType::Unknown => self.surface(),
        }
    }

    /// トークンの読みのリストを取得します。
    ///
    /// 未知語の場合は空のリストを返します。
    #[inline(always)]
    pub fn readings(&self) -> &'w [String] {
        let dict = self.worker.tokenizer.dictionary();
        let word_idx = self.word_idx();
        match word_idx.lex_type {
            LexType::System => {
                let record = dict.system_lexicon().word_record(word_idx);
                &dict.features().word_data(record.data_id).readings
            }
            LexType::Unknown => NO_STRINGS,
        }
    }

    /// トークンの発音のリストを取得します。
    ///
    /// 未知語の場合は空のリストを返します。
    #[inline(always)]
    pub fn pronunciations(&self) -> &'w [String] {
        let dict = self.worker.tokenizer.dictionary();
        let word_idx = self.word_idx();
        match word_idx.lex_type {
            LexType::System => {
                let record = dict.system_lexicon().word_record(word_idx);
                &dict.features().word_data(record.data_id).pronunciations
            }
            LexType::Unknown => NO_STRINGS,
        }
    }

    /// このトークンビューを所有型の[`Morpheme`]に変換します。
    ///
    /// # 戻り値
    ///
    /// このトークンのすべての情報を含む所有型の[`Morpheme`]を返します。
    /// スレッド間でトークン情報を送信したり、長期保存する際に有用です。
    pub fn to_morpheme(&self) -> Morpheme {
        Morpheme {
            surface: self.surface().to_string(),
            range_char: self.range_char(),
            range_byte: self.range_byte(),
            span_char: self.span_char(),
            lex_type: self.lex_type(),
            left_id: self.left_id(),
            right_id: self.right_id(),
            word_cost: self.word_cost(),
            total_cost: self.total_cost(),
            part_of_speech: self.part_of_speech().to_string(),
            base_form: self.base_form().to_string(),
            conjugation_type: self.conjugation_type().to_string(),
            conjugation_form: self.conjugation_form().to_string(),
            readings: self.readings().to_vec(),
            pronunciations: self.pronunciations().to_vec(),
            is_sentence_start: false,
        }
    }
}

impl std::fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("surface", &self.surface())
            .field("range_char", &self.range_char())
            .field("range_byte", &self.range_byte())
            .field("lex_type", &self.lex_type())
            .field("part_of_speech", &self.part_of_speech())
            .field("left_id", &self.left_id())
            .field("right_id", &self.right_id())
            .field("word_cost", &self.word_cost())
            .field("total_cost", &self.total_cost())
            .finish()
    }
}

/// トークンのイテレータ
///
/// 形態素解析の結果得られたトークン列を順次取得するためのイテレータです。
/// 前方および後方からの走査をサポートしています
/// （[`DoubleEndedIterator`]を実装）。
pub struct TokenIter<'w> {
    worker: &'w Worker,
    front: usize,
    back: usize,
}

impl<'w> TokenIter<'w> {
    #[inline(always)]
    pub(crate) fn new(worker: &'w Worker) -> Self {
        let num_tokens = worker.num_tokens();
        Self {
            worker,
            front: 0,
            back: num_tokens,
        }
    }
}

impl<'w> Iterator for TokenIter<'w> {
    type Item = Token<'w>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let t = self.worker.token(self.front);
            self.front += 1;
            Some(t)
        } else {
            None
        }
    }
}

impl<'w> DoubleEndedIterator for TokenIter<'w> {
    #[inline(always)]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            let t = self.worker.token(self.back);
            Some(t)
        } else {
            None
        }
    }
}

/// 所有型の自己完結した形態素
///
/// この構造体は[`Token`]の所有型版です。形態素解析の結果を長期保存
/// したり、スレッド間で送信する際に有用です。すべての情報を自身で
/// 保持するため、[`Worker`]への参照が不要です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    /// 形態素の表層形（元のテキスト中の文字列）
    pub surface: String,

    /// 形態素の文字単位の位置範囲
    pub range_char: Range<usize>,

    /// 形態素のバイト単位の位置範囲
    pub range_byte: Range<usize>,

    /// スキップされた空白を含む文字単位のスパン
    pub span_char: Range<usize>,

    /// 形態素が由来する語彙のタイプ
    pub lex_type: LexType,

    /// 左文脈ID
    pub left_id: u16,

    /// 右文脈ID
    pub right_id: u16,

    /// 単語コスト
    pub word_cost: i16,

    /// 文頭からこの形態素までの累積コスト
    pub total_cost: i32,

    /// 品詞文字列
    pub part_of_speech: String,

    /// 基本形（原形）
    pub base_form: String,

    /// 活用型
    pub conjugation_type: String,

    /// 活用形
    pub conjugation_form: String,

    /// 読みのリスト
    pub readings: Vec<String>,

    /// 発音のリスト
    pub pronunciations: Vec<String>,

    /// この形態素が文の先頭かどうか
    pub is_sentence_start: bool,
}

impl<'w> From<Token<'w>> for Morpheme {
    fn from(token: Token<'w>) -> Self {
        token.to_morpheme()
    }
}

#[cfg(test)]
mod tests {
    use crate::dictionary::builder::SystemDictionaryBuilder;
    use crate::tokenizer::Tokenizer;

    #[test]
    fn test_iter() {
        let lexicon_csv = "\
自然,0,0,1,名詞,*,*,自然,シゼン,シゼン
言語,0,0,4,名詞,*,*,言語,ゲンゴ,ゲンゴ
処理,0,0,3,名詞,*,*,処理,ショリ,ショリ
自然言語,0,0,6,名詞,*,*,自然言語,シゼンゲンゴ,シゼンゲンゴ
言語処理,0,0,5,名詞,*,*,言語処理,ゲンゴショリ,ゲンゴショリ";
        let matrix_def = "1 1\n0 0 0";
        let unk_def = "DEFAULT,0,0,100,補助記号";

        let dict = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            unk_def.as_bytes(),
        )
        .unwrap();

        let tokenizer = Tokenizer::new(dict);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("自然言語処理");
        worker.tokenize();
        assert_eq!(worker.num_tokens(), 2);

        let mut it = worker.token_iter();
        for i in 0..worker.num_tokens() {
            let lhs = worker.token(i);
            let rhs = it.next().unwrap();
            assert_eq!(lhs.surface(), rhs.surface());
        }
        assert!(it.next().is_none());
    }

    #[test]
    fn test_resolved_fields() {
        let lexicon_csv = "読む,0,0,1,動詞,五段,基本形,読む,ヨム/よむ,ヨム";
        let matrix_def = "1 1\n0 0 0";
        let unk_def = "DEFAULT,0,0,100,補助記号";

        let dict = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            unk_def.as_bytes(),
        )
        .unwrap();

        let tokenizer = Tokenizer::new(dict);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("読む");
        worker.tokenize();
        assert_eq!(worker.num_tokens(), 1);

        let token = worker.token(0);
        assert_eq!(token.part_of_speech(), "動詞");
        assert_eq!(token.conjugation_type(), "五段");
        assert_eq!(token.conjugation_form(), "基本形");
        assert_eq!(token.base_form(), "読む");
        assert_eq!(token.readings(), &["ヨム", "よむ"]);
        assert_eq!(token.pronunciations(), &["ヨム"]);
        assert_eq!(token.word_cost(), 1);
    }

    #[test]
    fn test_unknown_fields() {
        let lexicon_csv = "本,0,0,1,名詞";
        let matrix_def = "1 1\n0 0 0";
        let unk_def = "DEFAULT,0,0,100,補助記号\nKATAKANA,0,0,100,名詞";

        let dict = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            unk_def.as_bytes(),
        )
        .unwrap();

        let tokenizer = Tokenizer::new(dict);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("ペン");
        worker.tokenize();
        assert_eq!(worker.num_tokens(), 1);

        let token = worker.token(0);
        assert_eq!(token.part_of_speech(), "名詞");
        assert_eq!(token.conjugation_type(), "*");
        assert_eq!(token.base_form(), "ペン");
        assert!(token.readings().is_empty());
    }

    #[test]
    fn test_morphemes() {
        let lexicon_csv = "本,0,0,1,名詞,*,*,本,ホン,ホン";
        let matrix_def = "1 1\n0 0 0";
        let unk_def = "DEFAULT,0,0,100,補助記号";

        let dict = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            unk_def.as_bytes(),
        )
        .unwrap();

        let tokenizer = Tokenizer::new(dict);
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("本本");
        worker.tokenize();

        let morphemes = worker.morphemes();
        assert_eq!(morphemes.len(), 2);
        assert!(morphemes[0].is_sentence_start);
        assert!(!morphemes[1].is_sentence_start);
        assert_eq!(morphemes[0].surface, "本");
        assert_eq!(morphemes[0].readings, vec!["ホン"]);
    }
}
