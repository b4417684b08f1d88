//! エラー型の定義
//!
//! このモジュールは、wakachiライブラリで使用されるすべてのエラー型を定義します。
//! 辞書データとトライ構造は構築時に検証済みであることを前提とするため、
//! 構築・読み込み時のエラーはリトライされず、そのまま呼び出し元に伝播します。

use std::error::Error;
use std::fmt;

/// wakachi専用のResult型
///
/// エラー型としてデフォルトで[`WakachiError`]を使用します。
pub type Result<T, E = WakachiError> = std::result::Result<T, E>;

/// wakachiのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 各バリアントは特定のエラー条件に対応しています。
#[derive(Debug, thiserror::Error)]
pub enum WakachiError {
    /// トライ構築エラー
    ///
    /// [`BuildError`]のエラーバリアント。
    #[error(transparent)]
    Build(#[from] BuildError),

    /// 辞書読み込みエラー
    ///
    /// [`DictionaryLoadError`]のエラーバリアント。
    #[error(transparent)]
    DictionaryLoad(#[from] DictionaryLoadError),

    /// 共通接頭辞検索の結果バッファ溢れエラー
    ///
    /// [`SearchOverflowError`]のエラーバリアント。
    #[error(transparent)]
    SearchOverflow(#[from] SearchOverflowError),

    /// 無効な引数エラー
    ///
    /// [`InvalidArgumentError`]のエラーバリアント。
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 無効なフォーマットエラー
    ///
    /// [`InvalidFormatError`]のエラーバリアント。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 整数パースエラー
    ///
    /// [`ParseIntError`](std::num::ParseIntError)のエラーバリアント。
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    /// UTF-8エンコーディングエラー
    ///
    /// [`std::str::Utf8Error`]のエラーバリアント。
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    /// 標準I/Oエラー
    ///
    /// [`std::io::Error`]のエラーバリアント。
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl WakachiError {
    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - フォーマット名
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }
}

/// ダブル配列トライの構築エラー
///
/// トライ構築はワンショットの処理であり、失敗した場合は部分的な結果を
/// 返さずに全体を中断します。
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// キー列がソートされていない、または重複している
    ///
    /// キーは辞書順に一意にソートされている必要があります。違反は
    /// 再帰的な分割処理の途中で検出され、構築全体が中断されます。
    #[error("keys must be unique and lexicographically sorted (violation near key index {index})")]
    UnsortedKeys {
        /// 違反が検出されたキーのインデックス
        index: usize,
    },
}

/// 辞書読み込みエラー
///
/// バイナリリソースが破損・欠損している場合に発生します。部分的に
/// 読み込まれた辞書で検索を提供することはありません。
#[derive(Debug, thiserror::Error)]
pub enum DictionaryLoadError {
    /// マジックバイトの不一致
    #[error("invalid magic bytes: not a wakachi dictionary")]
    InvalidMagic,

    /// リソースの切り詰め
    ///
    /// ヘッダに記録されたサイズに対して実データが不足しています。
    #[error("resource '{name}' is truncated: expected {expected} bytes, found {found}")]
    Truncated {
        /// リソース名
        name: &'static str,
        /// 期待されるバイト数
        expected: usize,
        /// 実際に存在したバイト数
        found: usize,
    },

    /// リソースの内容不正
    #[error("resource '{name}' is malformed: {msg}")]
    Malformed {
        /// リソース名
        name: &'static str,
        /// エラーメッセージ
        msg: String,
    },

    /// I/Oエラー
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DictionaryLoadError {
    /// 内容不正エラーを生成します
    pub(crate) fn malformed<S>(name: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::Malformed {
            name,
            msg: msg.into(),
        }
    }
}

/// 共通接頭辞検索の結果バッファ溢れエラー
///
/// 呼び出し側が用意した結果バッファの容量が、実際のマッチ数より
/// 小さかった場合に発生します。容量はトライの深さとキー集合の性質から
/// 上限が証明できるため、これは呼び出し側の契約違反を示します。
#[derive(Debug, thiserror::Error)]
#[error("result capacity {capacity} exceeded during common-prefix search")]
pub struct SearchOverflowError {
    /// 呼び出し側が用意した容量
    pub capacity: usize,
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// フォーマットの名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}
