//! 辞書の管理モジュール
//!
//! このモジュールは、トライ、トークンレコード、接続コスト行列、
//! 文字列テーブル、未知語テンプレートという共依存のリソースを単一の
//! 不変な値として所有する辞書と、そのバイナリモデルの読み書きを
//! 提供します。辞書は一度読み込まれた後は変更されず、`Arc`を介して
//! 複数の解析セッションから共有できます。

pub mod builder;
pub mod character;
pub mod connector;
pub mod feature;
pub mod lexicon;
pub mod trie;
pub mod unknown;
pub mod word_idx;

use std::io::{Read, Write};

use crate::dictionary::connector::MatrixConnector;
use crate::dictionary::feature::FeatureTables;
use crate::dictionary::lexicon::Lexicon;
use crate::dictionary::unknown::UnkHandler;
use crate::errors::{DictionaryLoadError, Result, WakachiError};
use crate::utils::FromU32;

/// モデルファイルの先頭に置かれるマジックバイト
const MODEL_MAGIC: &[u8] = b"WakachiDict 0.1\n";

/// ヘッダに記録されるセクションサイズの個数
const NUM_SECTIONS: usize = 5;

/// 形態素解析に使用する辞書
///
/// 5つのバイナリリソースを所有します:
/// - トライ（表層形の共通接頭辞検索）
/// - トークンレコード（接続ID、コスト、素性インデックス）
/// - 接続コスト行列
/// - 品詞・活用の文字列テーブルと単語付随データ
/// - 未知語テンプレート
///
/// リソースは原子的に読み込まれ、部分的に読み込まれた辞書で検索を
/// 提供することはありません。再読み込みは新しい値の構築を意味します。
pub struct Dictionary {
    system_lexicon: Lexicon,
    connector: MatrixConnector,
    features: FeatureTables,
    unk_handler: UnkHandler,
}

impl Dictionary {
    /// 構築済みのリソースから辞書を作成します。
    ///
    /// # エラー
    ///
    /// レコードまたは未知語テンプレートの接続IDが行列の範囲外の場合に
    /// エラーを返します。
    pub(crate) fn new(
        system_lexicon: Lexicon,
        connector: MatrixConnector,
        features: FeatureTables,
        unk_handler: UnkHandler,
    ) -> Result<Self> {
        if !system_lexicon.verify(&connector) {
            return Err(WakachiError::invalid_argument(
                "system_lexicon",
                "connection ids of lexicon exceed the matrix size",
            ));
        }
        if !unk_handler.verify(&connector) {
            return Err(WakachiError::invalid_argument(
                "unk_handler",
                "connection ids of unknown templates exceed the matrix size",
            ));
        }
        Ok(Self {
            system_lexicon,
            connector,
            features,
            unk_handler,
        })
    }

    /// システム語彙への参照を返します。
    #[inline(always)]
    pub fn system_lexicon(&self) -> &Lexicon {
        &self.system_lexicon
    }

    /// コネクターへの参照を返します。
    #[inline(always)]
    pub fn connector(&self) -> &MatrixConnector {
        &self.connector
    }

    /// 文字列テーブルへの参照を返します。
    #[inline(always)]
    pub fn features(&self) -> &FeatureTables {
        &self.features
    }

    /// 未知語ハンドラーへの参照を返します。
    #[inline(always)]
    pub fn unk_handler(&self) -> &UnkHandler {
        &self.unk_handler
    }

    /// 隣接する2形態素間の接続コストを返します。
    ///
    /// # 引数
    ///
    /// * `left_id` - 先行形態素の右文脈ID
    /// * `right_id` - 後続形態素の左文脈ID
    #[inline(always)]
    pub fn connection_cost(&self, left_id: u16, right_id: u16) -> i32 {
        self.connector.cost(left_id, right_id)
    }

    /// バイナリモデルを書き出します。
    ///
    /// マジックバイト、5つのセクションのバイトサイズを記録したヘッダ、
    /// 各セクションの順に書き出します。
    ///
    /// # 引数
    ///
    /// * `wtr` - 書き出し先
    ///
    /// # エラー
    ///
    /// I/Oに失敗した場合にエラーを返します。
    pub fn write<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        let sizes = [
            self.system_lexicon.trie().serialized_len(),
            self.system_lexicon.token_section_len(),
            self.connector.serialized_len(),
            self.features.serialized_len(),
            self.unk_handler.serialized_len(),
        ];

        wtr.write_all(MODEL_MAGIC)?;
        for size in sizes {
            let size = u32::try_from(size).map_err(|_| {
                WakachiError::invalid_argument("wtr", "section size exceeds u32")
            })?;
            wtr.write_all(&size.to_le_bytes())?;
        }
        self.system_lexicon.trie().write_to(&mut wtr)?;
        self.system_lexicon.write_token_section(&mut wtr)?;
        self.connector.write_to(&mut wtr)?;
        self.features.write_to(&mut wtr)?;
        self.unk_handler.write_to(&mut wtr)?;

        tracing::debug!(
            trie = sizes[0],
            tokens = sizes[1],
            matrix = sizes[2],
            features = sizes[3],
            unknown = sizes[4],
            "wrote dictionary model",
        );
        Ok(())
    }

    /// バイナリモデルを読み込みます。
    ///
    /// # 引数
    ///
    /// * `rdr` - モデルのリーダー
    ///
    /// # エラー
    ///
    /// マジックバイトの不一致、ヘッダとの寸法不整合、各リソースの
    /// 破損が検出された場合は[`DictionaryLoadError`]を返します。
    pub fn read<R>(mut rdr: R) -> Result<Self, DictionaryLoadError>
    where
        R: Read,
    {
        let mut bytes = vec![];
        rdr.read_to_end(&mut bytes)?;
        Self::from_model_bytes(&bytes)
    }

    /// バイナリモデルのバイト列から辞書を読み込みます。
    pub fn from_model_bytes(bytes: &[u8]) -> Result<Self, DictionaryLoadError> {
        let header_len = MODEL_MAGIC.len() + NUM_SECTIONS * 4;
        if bytes.len() < header_len {
            return Err(DictionaryLoadError::Truncated {
                name: "model",
                expected: header_len,
                found: bytes.len(),
            });
        }
        if &bytes[..MODEL_MAGIC.len()] != MODEL_MAGIC {
            return Err(DictionaryLoadError::InvalidMagic);
        }

        let mut sizes = [0usize; NUM_SECTIONS];
        for (i, size) in sizes.iter_mut().enumerate() {
            let offset = MODEL_MAGIC.len() + i * 4;
            *size = usize::from_u32(u32::from_le_bytes(
                bytes[offset..offset + 4].try_into().unwrap(),
            ));
        }
        let total = header_len + sizes.iter().sum::<usize>();
        if bytes.len() != total {
            return Err(DictionaryLoadError::Truncated {
                name: "model",
                expected: total,
                found: bytes.len(),
            });
        }

        let mut sections = [&bytes[0..0]; NUM_SECTIONS];
        let mut offset = header_len;
        for (section, &size) in sections.iter_mut().zip(&sizes) {
            *section = &bytes[offset..offset + size];
            offset += size;
        }
        Self::from_sections(
            sections[0],
            sections[1],
            sections[2],
            sections[3],
            sections[4],
        )
    }

    /// 5つの生リソースから辞書を構築します。
    ///
    /// 上流の辞書変換ツールが生成したリソースを直接受け取る入口です。
    ///
    /// # 引数
    ///
    /// * `trie_bytes` - トライリソース
    /// * `token_bytes` - トークンリソース
    /// * `matrix_bytes` - 接続コスト行列リソース
    /// * `feature_bytes` - 文字列テーブルリソース
    /// * `unk_bytes` - 未知語テンプレートリソース
    ///
    /// # エラー
    ///
    /// いずれかのリソースが破損している、またはリソース間の整合性が
    /// 取れない場合は[`DictionaryLoadError`]を返します。
    pub fn from_sections(
        trie_bytes: &[u8],
        token_bytes: &[u8],
        matrix_bytes: &[u8],
        feature_bytes: &[u8],
        unk_bytes: &[u8],
    ) -> Result<Self, DictionaryLoadError> {
        let system_lexicon = Lexicon::from_section_bytes(trie_bytes, token_bytes)?;
        let connector = MatrixConnector::from_bytes(matrix_bytes)?;
        let features = FeatureTables::from_bytes(feature_bytes)?;
        let unk_handler = UnkHandler::from_bytes(unk_bytes)?;

        if !system_lexicon.verify(&connector) {
            return Err(DictionaryLoadError::malformed(
                "tokens",
                "connection ids of lexicon exceed the matrix size",
            ));
        }
        if !unk_handler.verify(&connector) {
            return Err(DictionaryLoadError::malformed(
                "unknown",
                "connection ids of unknown templates exceed the matrix size",
            ));
        }

        tracing::debug!(
            num_records = system_lexicon.num_records(),
            num_left = connector.num_left(),
            num_right = connector.num_right(),
            "loaded dictionary",
        );
        Ok(Self {
            system_lexicon,
            connector,
            features,
            unk_handler,
        })
    }
}
