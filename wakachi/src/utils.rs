//! ユーティリティ関数と型変換トレイトを提供するモジュール
//!
//! このモジュールには、CSV処理、バイナリ読み取り、型変換のヘルパーが
//! 含まれています。

use csv_core::ReadFieldResult;

use crate::errors::{DictionaryLoadError, Result, WakachiError};

/// u32から他の型への変換を提供するトレイト
///
/// このトレイトは、u32値を実装型に変換する機能を定義します。
/// 標準ライブラリのFromトレイトとは異なり、ポインタ幅に関する
/// プラットフォーム固有の仮定を行うことができます。
pub trait FromU32 {
    /// u32値から実装型を生成する
    ///
    /// # 引数
    ///
    /// * `src` - 変換元のu32値
    ///
    /// # 戻り値
    ///
    /// 変換された実装型の値
    fn from_u32(src: u32) -> Self;
}

#[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
impl FromU32 for usize {
    /// u32値をusizeに変換する
    ///
    /// ポインタ幅が32ビットまたは64ビットであることが保証されているため、
    /// この変換は常に成功します。
    ///
    /// # 引数
    ///
    /// * `src` - 変換元のu32値
    ///
    /// # 戻り値
    ///
    /// 変換されたusize値
    #[inline(always)]
    fn from_u32(src: u32) -> Self {
        // Since the pointer width is guaranteed to be 32 or 64,
        // the following process always succeeds.
        unsafe { Self::try_from(src).unwrap_unchecked() }
    }
}

/// CSV形式の行を解析してフィールドのベクターに分割する
///
/// この関数は、CSV形式の文字列を解析し、各フィールドを個別の文字列として抽出します。
/// ダブルクォートで囲まれたフィールドや、フィールド内のカンマも正しく処理します。
///
/// # 引数
///
/// * `row` - 解析するCSV形式の文字列
///
/// # 戻り値
///
/// 解析されたフィールドを格納する文字列のベクター
///
/// # 例
///
/// ```
/// # use wakachi::utils::parse_csv_row;
/// let fields = parse_csv_row("名詞,トスカーナ");
/// assert_eq!(fields, vec!["名詞", "トスカーナ"]);
///
/// let fields_with_quote = parse_csv_row("名詞,\"1,2-ジクロロエタン\"");
/// assert_eq!(fields_with_quote, vec!["名詞", "1,2-ジクロロエタン"]);
/// ```
pub fn parse_csv_row(row: &str) -> Vec<String> {
    let mut features = vec![];
    let mut rdr = csv_core::Reader::new();
    let mut bytes = row.as_bytes();
    let mut output = [0; 4096];
    loop {
        let (result, nin, nout) = rdr.read_field(bytes, &mut output);
        let end = match result {
            ReadFieldResult::InputEmpty => true,
            ReadFieldResult::Field { .. } => false,
            ReadFieldResult::End => true,
            _ => unreachable!(),
        };
        features.push(std::str::from_utf8(&output[..nout]).unwrap().to_string());
        if end {
            break;
        }
        bytes = &bytes[nin..];
    }
    features
}

/// リトルエンディアンのバイナリリソースを先頭から読み進めるカーソル
///
/// 読み取りが末尾を越える場合は、リソース名を含む
/// [`DictionaryLoadError::Truncated`]を返します。
pub(crate) struct LeReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    name: &'static str,
}

impl<'a> LeReader<'a> {
    pub(crate) const fn new(bytes: &'a [u8], name: &'static str) -> Self {
        Self {
            bytes,
            pos: 0,
            name,
        }
    }

    /// 未読のバイトが残っていないかどうかを返します。
    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DictionaryLoadError> {
        let end = self.pos.checked_add(len).ok_or(DictionaryLoadError::Truncated {
            name: self.name,
            expected: usize::MAX,
            found: self.bytes.len(),
        })?;
        if self.bytes.len() < end {
            return Err(DictionaryLoadError::Truncated {
                name: self.name,
                expected: end,
                found: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, DictionaryLoadError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16, DictionaryLoadError> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, DictionaryLoadError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// u16の長さ接頭辞付きUTF-8文字列を読み取ります。
    pub(crate) fn read_str(&mut self) -> Result<String, DictionaryLoadError> {
        let len = usize::from(self.read_u16()?);
        let bytes = self.take(len)?;
        let s = std::str::from_utf8(bytes).map_err(|e| {
            DictionaryLoadError::malformed(self.name, format!("invalid UTF-8 string: {e}"))
        })?;
        Ok(s.to_string())
    }
}

/// u16の長さ接頭辞付きUTF-8文字列を書き出します。
///
/// # エラー
///
/// バイト長がu16に収まらない文字列は符号化できないため、
/// [`WakachiError::InvalidArgument`]を返します。
pub(crate) fn write_str<W>(mut wtr: W, s: &str) -> Result<()>
where
    W: std::io::Write,
{
    let len = u16::try_from(s.len()).map_err(|_| {
        WakachiError::invalid_argument("s", format!("string length {} exceeds u16", s.len()))
    })?;
    wtr.write_all(&len.to_le_bytes())?;
    wtr.write_all(s.as_bytes())?;
    Ok(())
}

/// u16の長さ接頭辞付き文字列のシリアライズ後のバイト数を返します。
#[inline(always)]
pub(crate) fn str_serialized_len(s: &str) -> usize {
    2 + s.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_row() {
        assert_eq!(
            &["名詞", "トスカーナ"],
            parse_csv_row("名詞,トスカーナ").as_slice()
        );
    }

    #[test]
    fn test_parse_csv_row_with_quote() {
        assert_eq!(
            &["名詞", "1,2-ジクロロエタン"],
            parse_csv_row("名詞,\"1,2-ジクロロエタン\"").as_slice()
        );
    }

    #[test]
    fn test_le_reader() {
        let mut buf = vec![];
        buf.extend_from_slice(&42u16.to_le_bytes());
        buf.extend_from_slice(&7u32.to_le_bytes());
        write_str(&mut buf, "名詞").unwrap();

        let mut rdr = LeReader::new(&buf, "test");
        assert_eq!(rdr.read_u16().unwrap(), 42);
        assert_eq!(rdr.read_u32().unwrap(), 7);
        assert_eq!(rdr.read_str().unwrap(), "名詞");
        assert!(rdr.is_empty());
        assert!(rdr.read_u16().is_err());
    }

    #[test]
    fn test_write_str_too_long() {
        let long = "a".repeat(usize::from(u16::MAX) + 1);
        let mut buf = vec![];
        assert!(write_str(&mut buf, &long).is_err());
        assert!(buf.is_empty());
    }
}
