//! システム辞書のビルダー
//!
//! このモジュールは、テキスト形式の語彙・行列・未知語定義から
//! [`Dictionary`]を構築する機能を提供します。

use std::io::{BufRead, BufReader, Read};

use crate::dictionary::Dictionary;
use crate::dictionary::character::{CharClass, NUM_CHAR_CLASSES};
use crate::dictionary::connector::MatrixConnector;
use crate::dictionary::feature::{FeatureTablesBuilder, WordData};
use crate::dictionary::lexicon::{Lexicon, RawWordEntry, WordRecord};
use crate::dictionary::unknown::{UnkEntry, UnkHandler, UnkTemplate};
use crate::errors::{Result, WakachiError};
use crate::utils;

/// システム辞書のビルダー
pub struct SystemDictionaryBuilder {}

impl SystemDictionaryBuilder {
    /// テキスト形式の定義データから辞書を構築します。
    ///
    /// # 引数
    ///
    /// * `lexicon_rdr` - 語彙のCSVデータのリーダー。各行は
    ///   `表層形,左ID,右ID,コスト,品詞,活用型,活用形,基本形,読み,発音`
    ///   の10列で、6列目以降は省略できます。読みと発音は`/`区切りの
    ///   リストです。`*`は空を表します。
    /// * `matrix_rdr` - 接続コスト行列定義のリーダー
    /// * `unk_rdr` - 未知語定義のリーダー。`DEFAULT`クラスは必須で、
    ///   定義されなかったクラスは`DEFAULT`にフォールバックします。
    ///
    /// # 戻り値
    ///
    /// 構築された[`Dictionary`]
    ///
    /// # エラー
    ///
    /// いずれかの定義データの形式が不正な場合、または接続IDが行列の
    /// 範囲外の場合にエラーを返します。
    pub fn from_readers<L, M, U>(lexicon_rdr: L, matrix_rdr: M, unk_rdr: U) -> Result<Dictionary>
    where
        L: Read,
        M: Read,
        U: Read,
    {
        let connector = MatrixConnector::from_reader(matrix_rdr)?;

        let mut features = FeatureTablesBuilder::new();
        let mut entries = Self::parse_lexicon_csv(lexicon_rdr, &mut features)?;
        // The trie requires surfaces in code-point order; a stable sort
        // keeps homographs in their input order.
        entries.sort_by(|a, b| a.surface.cmp(&b.surface));
        let lexicon = Lexicon::from_entries(&entries)?;

        let unk_handler = Self::build_unk_handler(unk_rdr, &mut features)?;

        let dict = Dictionary::new(lexicon, connector, features.build(), unk_handler)?;
        tracing::info!(
            num_records = dict.system_lexicon().num_records(),
            num_left = dict.connector().num_left(),
            num_right = dict.connector().num_right(),
            "built system dictionary",
        );
        Ok(dict)
    }

    fn parse_lexicon_csv<R>(
        rdr: R,
        features: &mut FeatureTablesBuilder,
    ) -> Result<Vec<RawWordEntry>>
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
                    "lexicon_csv",
                    format!("a row must have five columns at least: {line}"),
                ));
            }
            let surface = &cols[0];
            if surface.is_empty() {
                tracing::warn!(row = %line, "skipped an empty surface");
                continue;
            }
            let surface_len =
                u16::try_from(surface.chars().count()).map_err(|_| {
                    WakachiError::invalid_format("lexicon_csv", format!("surface too long: {line}"))
                })?;

            let field = |i: usize| cols.get(i).map_or("*", String::as_str);
            let data = WordData {
                base_form: parse_opt_field(field(7)),
                readings: parse_list_field(field(8)),
                pronunciations: parse_list_field(field(9)),
            };

            let record = WordRecord {
                left_id: cols[1].parse()?,
                right_id: cols[2].parse()?,
                word_cost: cols[3].parse()?,
                surface_len,
                pos_id: features.intern_pos(&cols[4])?,
                conj_type_id: features.intern_conj_type(field(5))?,
                conj_form_id: features.intern_conj_form(field(6))?,
                data_id: features.push_word_data(data)?,
            };
            entries.push(RawWordEntry {
                surface: surface.clone(),
                record,
            });
        }
        Ok(entries)
    }

    fn build_unk_handler<R>(rdr: R, features: &mut FeatureTablesBuilder) -> Result<UnkHandler>
    where
        R: Read,
    {
        let entries = UnkEntry::from_reader(rdr)?;

        let mut by_class: Vec<Option<&UnkEntry>> = vec![None; NUM_CHAR_CLASSES];
        for entry in &entries {
            if by_class[entry.class.as_index()].is_some() {
                return Err(WakachiError::invalid_format(
                    "unk_def",
                    format!("duplicate definition for class {}", entry.class),
                ));
            }
            by_class[entry.class.as_index()] = Some(entry);
        }
        let default = by_class[CharClass::Other.as_index()].ok_or_else(|| {
            WakachiError::invalid_format("unk_def", "the DEFAULT class is not defined")
        })?;

        let mut templates = Vec::with_capacity(NUM_CHAR_CLASSES);
        for slot in &by_class {
            let entry = slot.unwrap_or(default);
            templates.push(UnkTemplate {
                left_id: entry.left_id,
                right_id: entry.right_id,
                word_cost: entry.word_cost,
                pos_id: features.intern_pos(&entry.pos)?,
            });
        }
        Ok(UnkHandler::new(templates))
    }
}

/// `*`を空文字列に写像します。
fn parse_opt_field(s: &str) -> String {
    if s == "*" { String::new() } else { s.to_string() }
}

/// `/`区切りのリスト列を解析します。`*`は空リストです。
fn parse_list_field(s: &str) -> Vec<String> {
    if s == "*" || s.is_empty() {
        return vec![];
    }
    s.split('/').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEXICON_CSV: &str = "\
東京,1,1,500,名詞,*,*,東京,トウキョウ,トーキョー
読む,0,2,400,動詞,五段,基本形,読む,ヨム/よむ,ヨム";
    const MATRIX_DEF: &str = "3 3\n0 0 0\n1 1 10";
    const UNK_DEF: &str = "DEFAULT,0,0,1000,補助記号\nKATAKANA,1,1,800,名詞";

    #[test]
    fn test_from_readers() {
        let dict = SystemDictionaryBuilder::from_readers(
            LEXICON_CSV.as_bytes(),
            MATRIX_DEF.as_bytes(),
            UNK_DEF.as_bytes(),
        )
        .unwrap();
        assert_eq!(dict.system_lexicon().num_records(), 2);

        let input: Vec<_> = "東京".chars().collect();
        let matches: Vec<_> = dict.system_lexicon().common_prefix_iterator(&input).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].word_param.word_cost, 500);

        let record = dict.system_lexicon().word_record(matches[0].word_idx);
        assert_eq!(dict.features().pos(record.pos_id), "名詞");
        let data = dict.features().word_data(record.data_id);
        assert_eq!(data.base_form, "東京");
        assert_eq!(data.readings, vec!["トウキョウ"]);

        let template = dict.unk_handler().template(CharClass::Katakana);
        assert_eq!(template.word_cost, 800);
        // HIRAGANA is undefined and falls back to DEFAULT.
        let fallback = dict.unk_handler().template(CharClass::Hiragana);
        assert_eq!(fallback.word_cost, 1000);
    }

    #[test]
    fn test_multivalued_lists() {
        let dict = SystemDictionaryBuilder::from_readers(
            LEXICON_CSV.as_bytes(),
            MATRIX_DEF.as_bytes(),
            UNK_DEF.as_bytes(),
        )
        .unwrap();
        let input: Vec<_> = "読む".chars().collect();
        let m = dict
            .system_lexicon()
            .common_prefix_iterator(&input)
            .next()
            .unwrap();
        let record = dict.system_lexicon().word_record(m.word_idx);
        let data = dict.features().word_data(record.data_id);
        assert_eq!(data.readings, vec!["ヨム", "よむ"]);
        assert_eq!(dict.features().conj_type(record.conj_type_id), "五段");
        assert_eq!(dict.features().conj_form(record.conj_form_id), "基本形");
    }

    #[test]
    fn test_missing_default_class() {
        let result = SystemDictionaryBuilder::from_readers(
            LEXICON_CSV.as_bytes(),
            MATRIX_DEF.as_bytes(),
            "KATAKANA,1,1,800,名詞".as_bytes(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_connection_id() {
        let result = SystemDictionaryBuilder::from_readers(
            "東京,5,5,500,名詞".as_bytes(),
            "2 2".as_bytes(),
            "DEFAULT,0,0,1000,補助記号".as_bytes(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_few_columns() {
        let result = SystemDictionaryBuilder::from_readers(
            "東京,1,1,500".as_bytes(),
            MATRIX_DEF.as_bytes(),
            UNK_DEF.as_bytes(),
        );
        assert!(result.is_err());
    }
}
