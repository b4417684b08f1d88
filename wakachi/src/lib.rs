//! # Wakachi
//!
//! Wakachiは、ビタビアルゴリズムに基づく日本語形態素解析（分かち書き）の実装です。
//!
//! ## 概要
//!
//! このライブラリは、語彙・接続コスト行列・未知語定義から構築した辞書を
//! 用いて、日本語テキストを形態素の列に分割するトークナイザーを提供します。
//! 辞書はダブル配列トライによる共通接頭辞検索で表層形を引き、辞書に載って
//! いない文字列は文字クラスに基づく未知語テンプレートで補完します。
//!
//! ## 主な機能
//!
//! - **最小コスト経路の探索**: ビタビアルゴリズムによる大域最適な分割
//! - **未知語処理**: 文字クラスごとのテンプレートによる辞書外語の補完
//! - **バイナリモデル**: 構築済み辞書の単一ファイルへの保存と読み込み
//! - **後処理フック**: デコード結果の形態素列を変換するフィルタの登録
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use wakachi::{SystemDictionaryBuilder, Tokenizer};
//!
//! let lexicon_csv = "これ,0,0,10,代名詞
//! は,0,0,10,助詞
//! 本,0,0,10,名詞
//! で,0,0,10,助動詞
//! ない,0,0,10,形容詞";
//! let matrix_def = "1 1\n0 0 0";
//! let unk_def = "DEFAULT,0,0,1000,補助記号";
//!
//! let dict = SystemDictionaryBuilder::from_readers(
//!     lexicon_csv.as_bytes(),
//!     matrix_def.as_bytes(),
//!     unk_def.as_bytes(),
//! )?;
//!
//! let tokenizer = Tokenizer::new(dict);
//! let mut worker = tokenizer.new_worker();
//!
//! worker.reset_sentence("これは本ではない");
//! worker.tokenize();
//! assert_eq!(worker.num_tokens(), 6);
//!
//! let surfaces: Vec<_> = worker.token_iter().map(|t| t.surface()).collect();
//! assert_eq!(surfaces, vec!["これ", "は", "本", "で", "は", "ない"]);
//!
//! let t0 = worker.token(0);
//! assert_eq!(t0.range_char(), 0..2);
//! assert_eq!(t0.range_byte(), 0..6);
//! assert_eq!(t0.part_of_speech(), "代名詞");
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(target_pointer_width = "32", target_pointer_width = "64")))]
compile_error!("`target_pointer_width` must be 32 or 64");

/// 共通の定数定義
pub mod common;

/// 辞書データ構造とビルダー
pub mod dictionary;

/// エラー型の定義
pub mod errors;

/// 形態素列の後処理フック
pub mod filter;

/// 文の内部表現
pub mod sentence;

/// トークン型の定義
pub mod token;

/// トークナイザーの実装
pub mod tokenizer;

/// 内部ユーティリティ関数
pub mod utils;


// Re-exports
pub use dictionary::Dictionary;
pub use dictionary::builder::SystemDictionaryBuilder;
pub use dictionary::character::CharClass;
pub use filter::MorphemeFilter;
pub use token::Morpheme;
pub use tokenizer::Tokenizer;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
