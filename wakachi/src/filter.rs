//! 形態素列の後処理フック
//!
//! このモジュールは、デコードされた形態素列が呼び出し元に渡される前に
//! 列を置き換えることができるフックのトレイトを提供します。複合語の
//! 分割や読みの付与といった協調コンポーネントは、このトレイトを実装
//! して[`Tokenizer::append_filter`]で登録します。
//!
//! [`Tokenizer::append_filter`]: crate::tokenizer::Tokenizer::append_filter

use crate::token::Morpheme;

/// 形態素列を変換する後処理フック
///
/// フックは登録順に適用されます。実装は受け取った列を自由に置き換えて
/// 構いませんが、返す列は左から右へ重なりなく並んでいる必要があります。
pub trait MorphemeFilter: Send + Sync {
    /// 形態素列を変換します。
    ///
    /// # 引数
    ///
    /// * `morphemes` - デコードされた形態素列
    ///
    /// # 戻り値
    ///
    /// 変換後の形態素列
    fn apply(&self, morphemes: Vec<Morpheme>) -> Vec<Morpheme>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dictionary::builder::SystemDictionaryBuilder;
    use crate::tokenizer::Tokenizer;

    /// 表層形が2文字以上の形態素を1文字ずつに分割するテスト用フック。
    struct SplitEveryChar;

    impl MorphemeFilter for SplitEveryChar {
        fn apply(&self, morphemes: Vec<Morpheme>) -> Vec<Morpheme> {
            let mut out = vec![];
            for m in morphemes {
                let num_chars = m.surface.chars().count();
                if num_chars < 2 {
                    out.push(m);
                    continue;
                }
                let mut start_char = m.range_char.start;
                let mut start_byte = m.range_byte.start;
                for c in m.surface.chars() {
                    let mut piece = m.clone();
                    piece.surface = c.to_string();
                    piece.range_char = start_char..start_char + 1;
                    piece.span_char = piece.range_char.clone();
                    piece.range_byte = start_byte..start_byte + c.len_utf8();
                    out.push(piece);
                    start_char += 1;
                    start_byte += c.len_utf8();
                }
            }
            out
        }
    }

    #[test]
    fn test_resegmentation() {
        let lexicon_csv = "自然,0,0,1,名詞,*,*,自然,シゼン,シゼン";
        let matrix_def = "1 1\n0 0 0";
        let unk_def = "DEFAULT,0,0,100,補助記号";

        let dict = SystemDictionaryBuilder::from_readers(
            lexicon_csv.as_bytes(),
            matrix_def.as_bytes(),
            unk_def.as_bytes(),
        )
        .unwrap();

        let tokenizer = Tokenizer::new(dict).append_filter(Arc::new(SplitEveryChar));
        let mut worker = tokenizer.new_worker();
        worker.reset_sentence("自然");
        worker.tokenize();

        let morphemes = worker.morphemes();
        let surfaces: Vec<_> = morphemes.iter().map(|m| m.surface.as_str()).collect();
        assert_eq!(surfaces, vec!["自", "然"]);
        assert!(morphemes[0].is_sentence_start);
        assert_eq!(morphemes[0].range_char, 0..1);
        assert_eq!(morphemes[1].range_byte, 3..6);
    }
}
