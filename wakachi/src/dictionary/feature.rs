//! 品詞・活用の文字列テーブルと単語付随データ
//!
//! このモジュールは、単語レコードが小さな整数インデックスで参照する
//! 表示用文字列（品詞、活用型、活用形）のテーブルと、単語ごとの付随
//! データ（基本形、読み、発音）を管理します。解決は純粋なテーブル参照
//! であり、遅延的に行われます。

use std::io::Write;

use hashbrown::HashMap;

use crate::errors::{DictionaryLoadError, Result, WakachiError};
use crate::utils::{self, FromU32, LeReader};

/// 単語ごとの付随データ
///
/// 単語レコードの`data_id`で参照されます。空のフィールドは
/// 空文字列・空リストで表現されます。
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct WordData {
    /// 基本形（原形）
    pub base_form: String,
    /// 読みのリスト
    pub readings: Vec<String>,
    /// 発音のリスト
    pub pronunciations: Vec<String>,
}

/// 品詞・活用の文字列テーブルと単語付随データの集合
///
/// 辞書読み込み後は不変であり、整数インデックスから表示文字列への
/// 解決のみを提供します。
#[derive(Default)]
pub struct FeatureTables {
    pos: Vec<String>,
    conj_types: Vec<String>,
    conj_forms: Vec<String>,
    word_data: Vec<WordData>,
}

impl FeatureTables {
    /// 品詞文字列を解決します。
    #[inline(always)]
    pub fn pos(&self, pos_id: u16) -> &str {
        &self.pos[usize::from(pos_id)]
    }

    /// 活用型文字列を解決します。
    #[inline(always)]
    pub fn conj_type(&self, conj_type_id: u16) -> &str {
        &self.conj_types[usize::from(conj_type_id)]
    }

    /// 活用形文字列を解決します。
    #[inline(always)]
    pub fn conj_form(&self, conj_form_id: u16) -> &str {
        &self.conj_forms[usize::from(conj_form_id)]
    }

    /// 単語付随データを解決します。
    #[inline(always)]
    pub fn word_data(&self, data_id: u32) -> &WordData {
        &self.word_data[usize::from_u32(data_id)]
    }

    /// 品詞テーブルのエントリ数を返します。
    #[inline(always)]
    pub fn num_pos(&self) -> usize {
        self.pos.len()
    }

    /// 活用型テーブルのエントリ数を返します。
    #[inline(always)]
    pub fn num_conj_types(&self) -> usize {
        self.conj_types.len()
    }

    /// 活用形テーブルのエントリ数を返します。
    #[inline(always)]
    pub fn num_conj_forms(&self) -> usize {
        self.conj_forms.len()
    }

    /// 単語付随データのエントリ数を返します。
    #[inline(always)]
    pub fn num_word_data(&self) -> usize {
        self.word_data.len()
    }

    /// シリアライズ後のバイト数を返します。
    pub(crate) fn serialized_len(&self) -> usize {
        let table_len = |table: &[String]| {
            2 + table.iter().map(|s| utils::str_serialized_len(s)).sum::<usize>()
        };
        let list_len = |list: &[String]| {
            2 + list.iter().map(|s| utils::str_serialized_len(s)).sum::<usize>()
        };
        table_len(&self.pos)
            + table_len(&self.conj_types)
            + table_len(&self.conj_forms)
            + 4
            + self
                .word_data
                .iter()
                .map(|d| {
                    utils::str_serialized_len(&d.base_form)
                        + list_len(&d.readings)
                        + list_len(&d.pronunciations)
                })
                .sum::<usize>()
    }

    /// 文字列テーブルリソースを書き出します。
    ///
    /// 3つのテーブル（品詞・活用型・活用形）をそれぞれu16のエントリ数と
    /// 長さ接頭辞付きUTF-8文字列の並びとして書き出し、続けてu32の
    /// エントリ数と単語付随データを書き出します。
    ///
    /// # エラー
    ///
    /// エントリ数や文字列長が長さ接頭辞の幅に収まらない場合は
    /// 符号化できないため、[`WakachiError::InvalidArgument`]を返します。
    pub fn write_to<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        for table in [&self.pos, &self.conj_types, &self.conj_forms] {
            let count = u16::try_from(table.len()).map_err(|_| {
                WakachiError::invalid_argument("table", "too many table entries")
            })?;
            wtr.write_all(&count.to_le_bytes())?;
            for s in table {
                utils::write_str(&mut wtr, s)?;
            }
        }
        let num_word_data = u32::try_from(self.word_data.len()).map_err(|_| {
            WakachiError::invalid_argument("word_data", "too many word-data entries")
        })?;
        wtr.write_all(&num_word_data.to_le_bytes())?;
        for data in &self.word_data {
            utils::write_str(&mut wtr, &data.base_form)?;
            for list in [&data.readings, &data.pronunciations] {
                let count = u16::try_from(list.len()).map_err(|_| {
                    WakachiError::invalid_argument("word_data", "too many list entries")
                })?;
                wtr.write_all(&count.to_le_bytes())?;
                for s in list {
                    utils::write_str(&mut wtr, s)?;
                }
            }
        }
        Ok(())
    }

    /// 文字列テーブルリソースのバイト列からテーブルを復元します。
    ///
    /// # エラー
    ///
    /// バイト列が途中で尽きる、または余剰バイトが残る場合は
    /// [`DictionaryLoadError`]を返します。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DictionaryLoadError> {
        fn read_table(rdr: &mut LeReader<'_>) -> Result<Vec<String>, DictionaryLoadError> {
            let count = usize::from(rdr.read_u16()?);
            let mut table = Vec::with_capacity(count);
            for _ in 0..count {
                table.push(rdr.read_str()?);
            }
            Ok(table)
        }

        let mut rdr = LeReader::new(bytes, "features");
        let pos = read_table(&mut rdr)?;
        let conj_types = read_table(&mut rdr)?;
        let conj_forms = read_table(&mut rdr)?;

        let num_word_data = usize::from_u32(rdr.read_u32()?);
        let mut word_data = Vec::with_capacity(num_word_data);
        for _ in 0..num_word_data {
            let base_form = rdr.read_str()?;
            let num_readings = usize::from(rdr.read_u16()?);
            let mut readings = Vec::with_capacity(num_readings);
            for _ in 0..num_readings {
                readings.push(rdr.read_str()?);
            }
            let num_pronunciations = usize::from(rdr.read_u16()?);
            let mut pronunciations = Vec::with_capacity(num_pronunciations);
            for _ in 0..num_pronunciations {
                pronunciations.push(rdr.read_str()?);
            }
            word_data.push(WordData {
                base_form,
                readings,
                pronunciations,
            });
        }
        if !rdr.is_empty() {
            return Err(DictionaryLoadError::malformed(
                "features",
                "trailing bytes after word data",
            ));
        }
        Ok(Self {
            pos,
            conj_types,
            conj_forms,
            word_data,
        })
    }
}

/// 文字列テーブルを構築するビルダー
///
/// 同じ文字列を一意なインデックスに割り当てるため、構築中のみ
/// インターンマップを保持します。
#[derive(Default)]
pub struct FeatureTablesBuilder {
    tables: FeatureTables,
    pos_ids: HashMap<String, u16>,
    conj_type_ids: HashMap<String, u16>,
    conj_form_ids: HashMap<String, u16>,
}

impl FeatureTablesBuilder {
    /// 新しいビルダーを作成します。
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(
        table: &mut Vec<String>,
        ids: &mut HashMap<String, u16>,
        s: &str,
    ) -> Result<u16> {
        if let Some(&id) = ids.get(s) {
            return Ok(id);
        }
        let id = u16::try_from(table.len()).map_err(|_| {
            WakachiError::invalid_argument("s", "too many distinct table entries")
        })?;
        table.push(s.to_string());
        ids.insert(s.to_string(), id);
        Ok(id)
    }

    /// 品詞文字列をインターンし、インデックスを返します。
    pub fn intern_pos(&mut self, s: &str) -> Result<u16> {
        Self::intern(&mut self.tables.pos, &mut self.pos_ids, s)
    }

    /// 活用型文字列をインターンし、インデックスを返します。
    pub fn intern_conj_type(&mut self, s: &str) -> Result<u16> {
        Self::intern(&mut self.tables.conj_types, &mut self.conj_type_ids, s)
    }

    /// 活用形文字列をインターンし、インデックスを返します。
    pub fn intern_conj_form(&mut self, s: &str) -> Result<u16> {
        Self::intern(&mut self.tables.conj_forms, &mut self.conj_form_ids, s)
    }

    /// 単語付随データを追加し、`data_id`を返します。
    pub fn push_word_data(&mut self, data: WordData) -> Result<u32> {
        let data_id = u32::try_from(self.tables.word_data.len()).map_err(|_| {
            WakachiError::invalid_argument("data", "too many word-data entries")
        })?;
        self.tables.word_data.push(data);
        Ok(data_id)
    }

    /// テーブルを確定し、不変の[`FeatureTables`]を返します。
    pub fn build(self) -> FeatureTables {
        self.tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern() {
        let mut builder = FeatureTablesBuilder::new();
        assert_eq!(builder.intern_pos("名詞").unwrap(), 0);
        assert_eq!(builder.intern_pos("助詞").unwrap(), 1);
        assert_eq!(builder.intern_pos("名詞").unwrap(), 0);
        assert_eq!(builder.intern_conj_type("*").unwrap(), 0);
        assert_eq!(builder.intern_conj_form("基本形").unwrap(), 0);

        let tables = builder.build();
        assert_eq!(tables.pos(0), "名詞");
        assert_eq!(tables.pos(1), "助詞");
        assert_eq!(tables.conj_type(0), "*");
        assert_eq!(tables.conj_form(0), "基本形");
        assert_eq!(tables.num_pos(), 2);
    }

    #[test]
    fn test_binary_round_trip() {
        let mut builder = FeatureTablesBuilder::new();
        builder.intern_pos("名詞").unwrap();
        builder.intern_pos("動詞").unwrap();
        builder.intern_conj_type("五段").unwrap();
        builder.intern_conj_form("基本形").unwrap();
        builder
            .push_word_data(WordData {
                base_form: "読む".to_string(),
                readings: vec!["ヨム".to_string(), "よむ".to_string()],
                pronunciations: vec!["ヨム".to_string()],
            })
            .unwrap();
        builder.push_word_data(WordData::default()).unwrap();
        let tables = builder.build();

        let mut buf = vec![];
        tables.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), tables.serialized_len());

        let decoded = FeatureTables::from_bytes(&buf).unwrap();
        assert_eq!(decoded.num_pos(), 2);
        assert_eq!(decoded.pos(1), "動詞");
        assert_eq!(decoded.word_data(0).base_form, "読む");
        assert_eq!(decoded.word_data(0).readings, vec!["ヨム", "よむ"]);
        assert_eq!(decoded.word_data(0).pronunciations, vec!["ヨム"]);
        assert_eq!(decoded.word_data(1), &WordData::default());

        assert!(FeatureTables::from_bytes(&buf[..buf.len() - 1]).is_err());
    }
}
