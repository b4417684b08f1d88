//! 文字分類器
//!
//! このモジュールは、各Unicodeコードポイントを固定された文字クラスの
//! いずれか一つに写像する全域的な分類関数を提供します。分類結果は
//! 未知語候補の合成（文字クラスの連続長の判定）に使用されます。

use std::fmt;

/// 文字クラス
///
/// 閉じた列挙であり、すべての文字がちょうど一つのクラスに分類されます。
/// 空白の判定はUnicodeブロックによる分類よりも優先されます。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CharClass {
    /// どのクラスにも属さない文字（既定値）
    #[default]
    Other = 0,
    /// 空白文字
    Space = 1,
    /// 漢字
    Kanji = 2,
    /// カタカナ
    Katakana = 3,
    /// ひらがな
    Hiragana = 4,
    /// 半角・全角形
    HalfWidthForm = 5,
}

/// 文字クラスの総数
pub const NUM_CHAR_CLASSES: usize = 6;

impl CharClass {
    /// 文字をクラスに分類します。
    ///
    /// この関数は純粋かつ全域的であり、どの文字に対しても必ず一つの
    /// クラスを返します。
    ///
    /// # 引数
    ///
    /// * `c` - 分類する文字
    ///
    /// # 戻り値
    ///
    /// 対応する[`CharClass`]
    #[inline(always)]
    pub fn of(c: char) -> Self {
        if c.is_whitespace() {
            return Self::Space;
        }
        match u32::from(c) {
            // CJK統合漢字、拡張A、々・〇・〻
            0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0x3005 | 0x3007 | 0x303B => Self::Kanji,
            // ひらがな
            0x3041..=0x309F => Self::Hiragana,
            // カタカナ（長音記号を含む）、カタカナ拡張
            0x30A0..=0x30FF | 0x31F0..=0x31FF => Self::Katakana,
            // 半角・全角形ブロック
            0xFF00..=0xFFEF => Self::HalfWidthForm,
            _ => Self::Other,
        }
    }

    /// クラスを小さな整数インデックスとして返します。
    ///
    /// 未知語テンプレート表の添字付けに使用されます。
    #[inline(always)]
    pub const fn as_index(self) -> usize {
        self as usize
    }

    /// インデックスからクラスを復元します。
    ///
    /// # 戻り値
    ///
    /// 範囲内であれば`Some(CharClass)`、範囲外であれば`None`
    #[inline(always)]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Other),
            1 => Some(Self::Space),
            2 => Some(Self::Kanji),
            3 => Some(Self::Katakana),
            4 => Some(Self::Hiragana),
            5 => Some(Self::HalfWidthForm),
            _ => None,
        }
    }

    /// 未知語候補を最大連続長まで延長するクラスかどうかを返します。
    ///
    /// ひらがな・漢字・その他のクラスは1文字単位のフォールバック
    /// 粒度を要するため延長しません。
    #[inline(always)]
    pub const fn groups_unknown_run(self) -> bool {
        matches!(self, Self::Katakana | Self::HalfWidthForm | Self::Space)
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Other => "OTHER",
            Self::Space => "SPACE",
            Self::Kanji => "KANJI",
            Self::Katakana => "KATAKANA",
            Self::Hiragana => "HIRAGANA",
            Self::HalfWidthForm => "HALFWIDTH",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(CharClass::of('本'), CharClass::Kanji);
        assert_eq!(CharClass::of('々'), CharClass::Kanji);
        assert_eq!(CharClass::of('こ'), CharClass::Hiragana);
        assert_eq!(CharClass::of('ア'), CharClass::Katakana);
        assert_eq!(CharClass::of('ー'), CharClass::Katakana);
        assert_eq!(CharClass::of('ｱ'), CharClass::HalfWidthForm);
        assert_eq!(CharClass::of('Ａ'), CharClass::HalfWidthForm);
        assert_eq!(CharClass::of(' '), CharClass::Space);
        assert_eq!(CharClass::of('\u{3000}'), CharClass::Space);
        assert_eq!(CharClass::of('a'), CharClass::Other);
        assert_eq!(CharClass::of('1'), CharClass::Other);
        assert_eq!(CharClass::of('\u{FFFD}'), CharClass::Other);
    }

    #[test]
    fn test_index_round_trip() {
        for index in 0..NUM_CHAR_CLASSES {
            let class = CharClass::from_index(index).unwrap();
            assert_eq!(class.as_index(), index);
        }
        assert!(CharClass::from_index(NUM_CHAR_CLASSES).is_none());
    }
}
