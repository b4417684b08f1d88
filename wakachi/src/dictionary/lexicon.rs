//! 辞書の語彙情報を管理するモジュール
//!
//! このモジュールは、表層形からトークンレコードへの写像を管理します。
//! トライの値は同表層形のレコード群（ポスティンググループ）を指し、
//! グループ内のレコードはレコードバッファ上で連続しています。

use std::io::{self, Write};

use crate::dictionary::connector::MatrixConnector;
use crate::dictionary::trie::Trie;
use crate::dictionary::word_idx::{LexType, WordIdx};
use crate::errors::{DictionaryLoadError, Result, WakachiError};
use crate::utils::{FromU32, LeReader};

/// 単語の接続パラメータ
///
/// ラティス構築時にノードへ複写される、レコードの接続ID・コスト部分です。
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordParam {
    /// 左側接続ID
    pub left_id: u16,
    /// 右側接続ID
    pub right_id: u16,
    /// 単語コスト
    pub word_cost: i16,
}

impl WordParam {
    /// 新しいパラメータを作成します。
    #[inline(always)]
    pub const fn new(left_id: u16, right_id: u16, word_cost: i16) -> Self {
        Self {
            left_id,
            right_id,
            word_cost,
        }
    }
}

/// 固定長の単語レコード
///
/// レコードバッファ上のインデックス（単語ID）で識別され、辞書読み込み
/// 後は変更されません。
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordRecord {
    /// 左側接続ID
    pub left_id: u16,
    /// 右側接続ID
    pub right_id: u16,
    /// 単語コスト
    pub word_cost: i16,
    /// 表層形の文字数
    pub surface_len: u16,
    /// 品詞テーブルへのインデックス
    pub pos_id: u16,
    /// 活用型テーブルへのインデックス
    pub conj_type_id: u16,
    /// 活用形テーブルへのインデックス
    pub conj_form_id: u16,
    /// 単語付随データへのインデックス
    pub data_id: u32,
}

/// 1レコードのシリアライズ後のバイト数
const RECORD_LEN: usize = 18;

impl WordRecord {
    /// 接続パラメータ部分を取り出します。
    #[inline(always)]
    pub const fn param(&self) -> WordParam {
        WordParam::new(self.left_id, self.right_id, self.word_cost)
    }

    fn write_to<W>(&self, mut wtr: W) -> io::Result<()>
    where
        W: Write,
    {
        wtr.write_all(&self.left_id.to_le_bytes())?;
        wtr.write_all(&self.right_id.to_le_bytes())?;
        wtr.write_all(&self.word_cost.to_le_bytes())?;
        wtr.write_all(&self.surface_len.to_le_bytes())?;
        wtr.write_all(&self.pos_id.to_le_bytes())?;
        wtr.write_all(&self.conj_type_id.to_le_bytes())?;
        wtr.write_all(&self.conj_form_id.to_le_bytes())?;
        wtr.write_all(&self.data_id.to_le_bytes())?;
        Ok(())
    }

    fn read_from(rdr: &mut LeReader<'_>) -> Result<Self, DictionaryLoadError> {
        Ok(Self {
            left_id: rdr.read_u16()?,
            right_id: rdr.read_u16()?,
            word_cost: rdr.read_i16()?,
            surface_len: rdr.read_u16()?,
            pos_id: rdr.read_u16()?,
            conj_type_id: rdr.read_u16()?,
            conj_form_id: rdr.read_u16()?,
            data_id: rdr.read_u32()?,
        })
    }
}

/// 語彙マッチング結果
#[derive(Eq, PartialEq, Debug)]
pub struct LexMatch {
    pub word_idx: WordIdx,
    pub word_param: WordParam,
    pub end_char: usize,
}

impl LexMatch {
    /// 新しいマッチング結果を作成します。
    #[inline(always)]
    pub const fn new(word_idx: WordIdx, word_param: WordParam, end_char: usize) -> Self {
        Self {
            word_idx,
            word_param,
            end_char,
        }
    }
}

/// ビルダーが用意する生の単語エントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWordEntry {
    /// 表層形
    pub surface: String,
    /// 固定長レコード
    pub record: WordRecord,
}

/// 単語の語彙情報
///
/// トライ、ポスティンググループ表、レコードバッファの3つの
/// 共インデックスされたリソースを所有します。
pub struct Lexicon {
    trie: Trie,
    groups: Vec<(u32, u32)>,
    records: Vec<WordRecord>,
}

impl Lexicon {
    /// 入力文字列の共通接頭辞に一致する単語を返すイテレータを取得します。
    ///
    /// 同表層形のレコードはすべて展開され、レコードバッファ上の
    /// インデックスが単語IDになります。
    ///
    /// # 引数
    ///
    /// * `input` - 入力文字列
    ///
    /// # 戻り値
    ///
    /// 一致する単語のイテレータ
    #[inline(always)]
    pub fn common_prefix_iterator<'a>(
        &'a self,
        input: &'a [char],
    ) -> impl Iterator<Item = LexMatch> + 'a {
        self.trie.common_prefix_iterator(input).flat_map(move |m| {
            let (begin, len) = self.groups[usize::from_u32(m.value)];
            (begin..begin + len).map(move |word_id| {
                LexMatch::new(
                    WordIdx::new(LexType::System, word_id),
                    self.records[usize::from_u32(word_id)].param(),
                    m.end_char,
                )
            })
        })
    }

    /// 単語のパラメータを取得します。
    ///
    /// # 引数
    ///
    /// * `word_idx` - 単語インデックス
    ///
    /// # 戻り値
    ///
    /// 単語パラメータ
    #[inline(always)]
    pub fn word_param(&self, word_idx: WordIdx) -> WordParam {
        debug_assert_eq!(word_idx.lex_type, LexType::System);
        self.records[usize::from_u32(word_idx.word_id)].param()
    }

    /// 単語のレコードを取得します。
    ///
    /// # 引数
    ///
    /// * `word_idx` - 単語インデックス
    ///
    /// # 戻り値
    ///
    /// 単語レコードへの参照
    #[inline(always)]
    pub fn word_record(&self, word_idx: WordIdx) -> &WordRecord {
        debug_assert_eq!(word_idx.lex_type, LexType::System);
        &self.records[usize::from_u32(word_idx.word_id)]
    }

    /// レコード数を返します。
    #[inline(always)]
    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// 左右の接続IDがコネクターの範囲内かどうかをチェックします。
    ///
    /// # 引数
    ///
    /// * `conn` - コネクター
    ///
    /// # 戻り値
    ///
    /// すべてのIDが有効な場合は `true`
    pub fn verify(&self, conn: &MatrixConnector) -> bool {
        for r in &self.records {
            if conn.num_left() <= usize::from(r.left_id) {
                return false;
            }
            if conn.num_right() <= usize::from(r.right_id) {
                return false;
            }
        }
        true
    }

    /// エントリのリストから新しいインスタンスを構築します。
    ///
    /// エントリは表層形の辞書順にソートされている必要があります。
    /// 同表層形のエントリは連続していなければならず、1つの
    /// ポスティンググループにまとめられます。
    ///
    /// # 引数
    ///
    /// * `entries` - 単語エントリのスライス
    ///
    /// # 戻り値
    ///
    /// 成功時は `Ok(Lexicon)` を返します。
    ///
    /// # エラー
    ///
    /// エントリがソートされていない場合にエラーを返します。
    pub fn from_entries(entries: &[RawWordEntry]) -> Result<Self> {
        let mut keys: Vec<(&str, u32)> = vec![];
        let mut groups: Vec<(u32, u32)> = vec![];
        let mut records = Vec::with_capacity(entries.len());

        for (i, entry) in entries.iter().enumerate() {
            if u32::try_from(i).is_err() {
                return Err(WakachiError::invalid_argument(
                    "entries",
                    "too many word entries",
                ));
            }
            match groups.last_mut() {
                Some(group) if entries[i - 1].surface == entry.surface => {
                    group.1 += 1;
                }
                _ => {
                    let group_id = u32::try_from(groups.len()).map_err(|_| {
                        WakachiError::invalid_argument("entries", "too many surfaces")
                    })?;
                    keys.push((entry.surface.as_str(), group_id));
                    groups.push((i as u32, 1));
                }
            }
            records.push(entry.record);
        }

        let trie = Trie::from_records(&keys)?;
        Ok(Self {
            trie,
            groups,
            records,
        })
    }

    /// 生のパーツから新しいインスタンスを構築します。
    pub(crate) fn from_parts(trie: Trie, groups: Vec<(u32, u32)>, records: Vec<WordRecord>) -> Self {
        Self {
            trie,
            groups,
            records,
        }
    }

    /// トライへの参照を返します。
    #[inline(always)]
    pub(crate) fn trie(&self) -> &Trie {
        &self.trie
    }

    /// トークンリソースのシリアライズ後のバイト数を返します。
    pub(crate) fn token_section_len(&self) -> usize {
        4 + self.groups.len() * 8 + 4 + self.records.len() * RECORD_LEN
    }

    /// トークンリソースを書き出します。
    ///
    /// u32のグループ数、`(u32 begin, u32 len)`のグループ表、u32の
    /// レコード数、固定長レコードの順に書き出します。
    pub fn write_token_section<W>(&self, mut wtr: W) -> io::Result<()>
    where
        W: Write,
    {
        wtr.write_all(&(self.groups.len() as u32).to_le_bytes())?;
        for &(begin, len) in &self.groups {
            wtr.write_all(&begin.to_le_bytes())?;
            wtr.write_all(&len.to_le_bytes())?;
        }
        wtr.write_all(&(self.records.len() as u32).to_le_bytes())?;
        for record in &self.records {
            record.write_to(&mut wtr)?;
        }
        Ok(())
    }

    /// トライリソースとトークンリソースのバイト列から語彙を復元します。
    ///
    /// # エラー
    ///
    /// いずれかのリソースが切り詰められている、グループ表がレコード
    /// バッファの範囲外を指す、またはトライの終端値がグループ表の
    /// 範囲外を指す場合は[`DictionaryLoadError`]を返します。
    pub fn from_section_bytes(
        trie_bytes: &[u8],
        token_bytes: &[u8],
    ) -> Result<Self, DictionaryLoadError> {
        let trie = Trie::from_bytes(trie_bytes)?;

        let mut rdr = LeReader::new(token_bytes, "tokens");
        let num_groups = usize::from_u32(rdr.read_u32()?);
        let mut groups = Vec::with_capacity(num_groups);
        for _ in 0..num_groups {
            let begin = rdr.read_u32()?;
            let len = rdr.read_u32()?;
            groups.push((begin, len));
        }
        let num_records = usize::from_u32(rdr.read_u32()?);
        let mut records = Vec::with_capacity(num_records);
        for _ in 0..num_records {
            records.push(WordRecord::read_from(&mut rdr)?);
        }
        if !rdr.is_empty() {
            return Err(DictionaryLoadError::malformed(
                "tokens",
                "trailing bytes after word records",
            ));
        }
        for &(begin, len) in &groups {
            let end = u64::from(begin) + u64::from(len);
            if len == 0 || (num_records as u64) < end {
                return Err(DictionaryLoadError::malformed(
                    "tokens",
                    format!("posting group [{begin}, {end}) out of record range"),
                ));
            }
        }
        trie.verify_values(groups.len())?;
        Ok(Self {
            trie,
            groups,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(left_id: u16, right_id: u16, word_cost: i16, surface_len: u16) -> WordRecord {
        WordRecord {
            left_id,
            right_id,
            word_cost,
            surface_len,
            ..Default::default()
        }
    }

    fn entries() -> Vec<RawWordEntry> {
        // Sorted by surface; 東京 is a homograph pair.
        vec![
            RawWordEntry {
                surface: "京都".to_string(),
                record: record(10, 11, 12, 2),
            },
            RawWordEntry {
                surface: "東京".to_string(),
                record: record(1, 2, 3, 2),
            },
            RawWordEntry {
                surface: "東京".to_string(),
                record: record(7, 8, 9, 2),
            },
            RawWordEntry {
                surface: "東京都".to_string(),
                record: record(4, 5, 6, 3),
            },
        ]
    }

    #[test]
    fn test_common_prefix_iterator() {
        let lexicon = Lexicon::from_entries(&entries()).unwrap();
        let input: Vec<_> = "東京都".chars().collect();
        let matches: Vec<_> = lexicon.common_prefix_iterator(&input).collect();
        assert_eq!(
            matches,
            vec![
                LexMatch::new(
                    WordIdx::new(LexType::System, 1),
                    WordParam::new(1, 2, 3),
                    2
                ),
                LexMatch::new(
                    WordIdx::new(LexType::System, 2),
                    WordParam::new(7, 8, 9),
                    2
                ),
                LexMatch::new(
                    WordIdx::new(LexType::System, 3),
                    WordParam::new(4, 5, 6),
                    3
                ),
            ]
        );
    }

    #[test]
    fn test_no_match() {
        let lexicon = Lexicon::from_entries(&entries()).unwrap();
        let input: Vec<_> = "大阪".chars().collect();
        assert_eq!(lexicon.common_prefix_iterator(&input).count(), 0);
    }

    #[test]
    fn test_unsorted_entries() {
        let mut unsorted = entries();
        unsorted.swap(0, 3);
        assert!(Lexicon::from_entries(&unsorted).is_err());
    }

    #[test]
    fn test_verify() {
        let lexicon = Lexicon::from_entries(&entries()).unwrap();
        let large = MatrixConnector::from_reader("16 16".as_bytes()).unwrap();
        let small = MatrixConnector::from_reader("2 2".as_bytes()).unwrap();
        assert!(lexicon.verify(&large));
        assert!(!lexicon.verify(&small));
    }

    #[test]
    fn test_section_round_trip() {
        let lexicon = Lexicon::from_entries(&entries()).unwrap();

        let mut trie_bytes = vec![];
        lexicon.trie().write_to(&mut trie_bytes).unwrap();
        let mut token_bytes = vec![];
        lexicon.write_token_section(&mut token_bytes).unwrap();
        assert_eq!(token_bytes.len(), lexicon.token_section_len());

        let decoded = Lexicon::from_section_bytes(&trie_bytes, &token_bytes).unwrap();
        assert_eq!(decoded.num_records(), 4);
        assert_eq!(
            decoded.word_param(WordIdx::new(LexType::System, 0)),
            WordParam::new(10, 11, 12)
        );

        assert!(Lexicon::from_section_bytes(&trie_bytes, &token_bytes[..token_bytes.len() - 1])
            .is_err());
    }

    #[test]
    fn test_trie_value_out_of_group_range() {
        // A token section with a single posting group, paired with a trie
        // whose terminal value points far past it.
        let lexicon = Lexicon::from_entries(&[RawWordEntry {
            surface: "本".to_string(),
            record: record(0, 0, 1, 1),
        }])
        .unwrap();
        let mut token_bytes = vec![];
        lexicon.write_token_section(&mut token_bytes).unwrap();

        let bad_trie = Trie::from_records(&[("本", 7u32)]).unwrap();
        let mut trie_bytes = vec![];
        bad_trie.write_to(&mut trie_bytes).unwrap();

        assert!(matches!(
            Lexicon::from_section_bytes(&trie_bytes, &token_bytes),
            Err(DictionaryLoadError::Malformed { .. })
        ));
    }
}
