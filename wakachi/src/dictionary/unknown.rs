//! 未知語処理モジュール
//!
//! このモジュールは、辞書に登録されていない文字列に対して、文字クラス
//! ごとのテンプレートから未知語候補を合成する機能を提供します。
//! 合成された候補は辞書由来の候補と同じコスト式でデコードされます。

use std::io::{self, BufRead, BufReader, Read, Write};

use crate::dictionary::character::{CharClass, NUM_CHAR_CLASSES};
use crate::dictionary::connector::MatrixConnector;
use crate::dictionary::lexicon::WordParam;
use crate::dictionary::word_idx::{LexType, WordIdx};
use crate::errors::{DictionaryLoadError, Result, WakachiError};
use crate::sentence::Sentence;
use crate::utils::{self, LeReader};

/// 未知語定義ファイルの1エントリ
///
/// 品詞は文字列のままであり、辞書構築時にテーブルへインターンされます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnkEntry {
    /// 文字クラス
    pub class: CharClass,
    /// 左側接続ID
    pub left_id: u16,
    /// 右側接続ID
    pub right_id: u16,
    /// 単語コスト
    pub word_cost: i16,
    /// 品詞文字列
    pub pos: String,
}

/// 文字クラスごとの未知語テンプレート
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnkTemplate {
    /// 左側接続ID
    pub left_id: u16,
    /// 右側接続ID
    pub right_id: u16,
    /// 単語コスト
    pub word_cost: i16,
    /// 品詞テーブルへのインデックス
    pub pos_id: u16,
}

/// 合成された未知語候補
#[derive(Debug, Clone, Copy)]
pub struct UnkWord {
    begin_char: usize,
    end_char: usize,
    template: UnkTemplate,
    class: CharClass,
}

impl UnkWord {
    /// 開始位置（文字単位）を返します。
    #[inline(always)]
    pub const fn begin_char(&self) -> usize {
        self.begin_char
    }

    /// 終了位置（文字単位）を返します。
    #[inline(always)]
    pub const fn end_char(&self) -> usize {
        self.end_char
    }

    /// 接続パラメータを返します。
    #[inline(always)]
    pub const fn word_param(&self) -> WordParam {
        WordParam::new(
            self.template.left_id,
            self.template.right_id,
            self.template.word_cost,
        )
    }

    /// 単語インデックスを返します。
    ///
    /// 未知語の単語IDは文字クラスのインデックスです。
    #[inline(always)]
    pub const fn word_idx(&self) -> WordIdx {
        WordIdx::new(LexType::Unknown, self.class.as_index() as u32)
    }
}

/// 未知語ハンドラー
///
/// 文字クラスでインデックス化されたテンプレート配列を保持します。
pub struct UnkHandler {
    templates: Vec<UnkTemplate>,
}

impl UnkHandler {
    /// テンプレート配列から新しいハンドラーを作成します。
    ///
    /// 配列は文字クラスのインデックス順で、全クラス分が揃っている
    /// 必要があります。
    pub(crate) fn new(templates: Vec<UnkTemplate>) -> Self {
        debug_assert_eq!(templates.len(), NUM_CHAR_CLASSES);
        Self { templates }
    }

    /// 指定クラスのテンプレートを返します。
    #[inline(always)]
    pub fn template(&self, class: CharClass) -> &UnkTemplate {
        &self.templates[class.as_index()]
    }

    /// 未知語の単語IDからテンプレートを返します。
    #[inline(always)]
    pub fn word_template(&self, word_idx: WordIdx) -> &UnkTemplate {
        debug_assert_eq!(word_idx.lex_type, LexType::Unknown);
        &self.templates[word_idx.word_id as usize]
    }

    /// 未知語候補を合成し、コールバックに渡します。
    ///
    /// 辞書マッチが1件以上あり、かつ先頭文字のクラスがひらがな・漢字の
    /// 場合は合成しません（これらのクラスの辞書ヒットは信頼され、
    /// 1文字の未知語候補が競合するのを避けます）。それ以外の場合は
    /// ちょうど1つの候補を合成します。長さは、ひらがな・漢字・その他の
    /// クラスでは1文字、それ以外のクラスでは同一クラスの最大連続長
    /// （`max_grouping_len`が指定されていればその長さまで）です。
    ///
    /// # 引数
    ///
    /// * `sent` - 入力文
    /// * `start_word` - 未知語の開始位置（文字単位）
    /// * `has_matched` - 同じ位置に辞書マッチが存在したかどうか
    /// * `max_grouping_len` - 最大グルーピング長
    /// * `f` - 合成された候補を受け取るコールバック
    pub fn gen_unk_words<F>(
        &self,
        sent: &Sentence,
        start_word: usize,
        has_matched: bool,
        max_grouping_len: Option<usize>,
        mut f: F,
    ) where
        F: FnMut(UnkWord),
    {
        let class = sent.char_class(start_word);
        if has_matched && matches!(class, CharClass::Hiragana | CharClass::Kanji) {
            return;
        }

        let len = if class.groups_unknown_run() {
            let groupable = sent.groupable(start_word);
            max_grouping_len.map_or(groupable, |max| groupable.min(max))
        } else {
            1
        };
        debug_assert!(1 <= len);

        f(UnkWord {
            begin_char: start_word,
            end_char: start_word + len,
            template: self.templates[class.as_index()],
            class,
        });
    }

    /// 左右の接続IDがコネクターの範囲内かどうかをチェックします。
    pub fn verify(&self, conn: &MatrixConnector) -> bool {
        for t in &self.templates {
            if conn.num_left() <= usize::from(t.left_id) {
                return false;
            }
            if conn.num_right() <= usize::from(t.right_id) {
                return false;
            }
        }
        true
    }

    /// シリアライズ後のバイト数を返します。
    #[inline(always)]
    pub(crate) fn serialized_len(&self) -> usize {
        2 + self.templates.len() * 8
    }

    /// 未知語テンプレートリソースを書き出します。
    pub fn write_to<W>(&self, mut wtr: W) -> io::Result<()>
    where
        W: Write,
    {
        wtr.write_all(&(self.templates.len() as u16).to_le_bytes())?;
        for t in &self.templates {
            wtr.write_all(&t.left_id.to_le_bytes())?;
            wtr.write_all(&t.right_id.to_le_bytes())?;
            wtr.write_all(&t.word_cost.to_le_bytes())?;
            wtr.write_all(&t.pos_id.to_le_bytes())?;
        }
        Ok(())
    }

    /// 未知語テンプレートリソースのバイト列からハンドラーを復元します。
    ///
    /// # エラー
    ///
    /// テンプレート数が文字クラス数と一致しない場合は
    /// [`DictionaryLoadError`]を返します。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DictionaryLoadError> {
        let mut rdr = LeReader::new(bytes, "unknown");
        let count = usize::from(rdr.read_u16()?);
        if count != NUM_CHAR_CLASSES {
            return Err(DictionaryLoadError::malformed(
                "unknown",
                format!("expected {NUM_CHAR_CLASSES} templates, found {count}"),
            ));
        }
        let mut templates = Vec::with_capacity(count);
        for _ in 0..count {
            templates.push(UnkTemplate {
                left_id: rdr.read_u16()?,
                right_id: rdr.read_u16()?,
                word_cost: rdr.read_i16()?,
                pos_id: rdr.read_u16()?,
            });
        }
        if !rdr.is_empty() {
            return Err(DictionaryLoadError::malformed(
                "unknown",
                "trailing bytes after templates",
            ));
        }
        Ok(Self { templates })
    }
}

impl UnkEntry {
    /// 未知語定義ファイルからエントリのリストを読み取ります。
    ///
    /// 各行は `CLASS,left_id,right_id,cost,POS` の5列で、`CLASS` は
    /// `DEFAULT`、`SPACE`、`KANJI`、`KATAKANA`、`HIRAGANA`、`HALFWIDTH`
    /// のいずれかです。`DEFAULT` は必須で、定義されなかったクラスは
    /// `DEFAULT` にフォールバックします（フォールバックの解決は辞書
    /// ビルダーが行います）。
    ///
    /// # 引数
    ///
    /// * `rdr` - 未知語定義のリーダー
    ///
    /// # エラー
    ///
    /// 行の形式が不正、またはクラス名が未知の場合は[`WakachiError`]を
    /// 返します。
    pub fn from_reader<R>(rdr: R) -> Result<Vec<Self>>
    where
        R: Read,
    {
        let reader = BufReader::new(rdr);
        let mut entries = vec![];
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let cols = utils::parse_csv_row(&line);
            if cols.len() < 5 {
                return Err(WakachiError::invalid_format(
                    "unk_def",
                    format!("a row must have five columns: {line}"),
                ));
            }
            let class = Self::class_from_name(&cols[0]).ok_or_else(|| {
                WakachiError::invalid_format(
                    "unk_def",
                    format!("undefined character class: {}", cols[0]),
                )
            })?;
            entries.push(Self {
                class,
                left_id: cols[1].parse()?,
                right_id: cols[2].parse()?,
                word_cost: cols[3].parse()?,
                pos: cols[4].clone(),
            });
        }
        Ok(entries)
    }

    /// 未知語定義ファイル中のクラス名を文字クラスに写像します。
    ///
    /// `DEFAULT` は `Other` に対応します。
    fn class_from_name(name: &str) -> Option<CharClass> {
        match name {
            "DEFAULT" => Some(CharClass::Other),
            "SPACE" => Some(CharClass::Space),
            "KANJI" => Some(CharClass::Kanji),
            "KATAKANA" => Some(CharClass::Katakana),
            "HIRAGANA" => Some(CharClass::Hiragana),
            "HALFWIDTH" => Some(CharClass::HalfWidthForm),
            _ => None,
        }
    }
}
