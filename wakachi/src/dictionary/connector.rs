//! 接続コスト行列
//!
//! このモジュールは、隣接する形態素間の接続コストを密行列として保持する
//! コネクターを提供します。行列は読み込み後に不変であり、複数の解析
//! セッションから同時に参照できます。

use std::io::{BufRead, BufReader, Read, Write};

use crate::errors::{DictionaryLoadError, Result, WakachiError};

/// 接続コストの密行列
///
/// 形態素間の遷移コストを`num_left × num_right`の平坦なi16配列として
/// 保持します。`left_id`は先行形態素の右文脈ID、`right_id`は後続形態素の
/// 左文脈IDであり、コストは`data[left_id * num_right + right_id]`に
/// 格納されます。
pub struct MatrixConnector {
    /// 接続コストデータの平坦化された配列（行優先）
    data: Vec<i16>,
    /// 左文脈IDの総数（行数）
    num_left: usize,
    /// 右文脈IDの総数（列数）
    num_right: usize,
}

impl MatrixConnector {
    /// 生のパーツから行列を構築します。
    pub(crate) fn new(data: Vec<i16>, num_left: usize, num_right: usize) -> Self {
        debug_assert_eq!(data.len(), num_left * num_right);
        Self {
            data,
            num_left,
            num_right,
        }
    }

    /// テキスト形式の行列定義からコネクターを構築します。
    ///
    /// 1行目は`num_left num_right`のヘッダ、以降の各行は
    /// `left_id right_id cost`の3列です。定義されなかった組のコストは
    /// 0になります。
    ///
    /// # 引数
    ///
    /// * `rdr` - 行列定義のリーダー
    ///
    /// # エラー
    ///
    /// ヘッダや行の形式が不正な場合は[`WakachiError`]を返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let reader = BufReader::new(rdr);
        let mut lines = reader.lines();

        let header = lines.next().ok_or_else(|| {
            WakachiError::invalid_format("matrix_def", "missing header line")
        })??;
        let mut iter = header.split_ascii_whitespace();
        let num_left: usize = iter
            .next()
            .ok_or_else(|| WakachiError::invalid_format("matrix_def", "invalid header"))?
            .parse()?;
        let num_right: usize = iter
            .next()
            .ok_or_else(|| WakachiError::invalid_format("matrix_def", "invalid header"))?
            .parse()?;
        if num_left == 0 || num_right == 0 {
            return Err(WakachiError::invalid_format(
                "matrix_def",
                "matrix dimensions must be non-zero",
            ));
        }

        let mut data = vec![0i16; num_left * num_right];
        for line in lines {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut iter = line.split_ascii_whitespace();
            let (left_id, right_id, cost): (usize, usize, i16) = match (
                iter.next(),
                iter.next(),
                iter.next(),
            ) {
                (Some(l), Some(r), Some(c)) => (l.parse()?, r.parse()?, c.parse()?),
                _ => {
                    return Err(WakachiError::invalid_format(
                        "matrix_def",
                        format!("invalid row: {line}"),
                    ));
                }
            };
            if left_id >= num_left || right_id >= num_right {
                return Err(WakachiError::invalid_format(
                    "matrix_def",
                    format!("connection id out of range: {line}"),
                ));
            }
            data[left_id * num_right + right_id] = cost;
        }
        Ok(Self::new(data, num_left, num_right))
    }

    /// 接続コストを取得します。
    ///
    /// # 引数
    ///
    /// * `left_id` - 先行形態素の右文脈ID
    /// * `right_id` - 後続形態素の左文脈ID
    ///
    /// # 戻り値
    ///
    /// 接続コスト
    #[inline(always)]
    pub fn cost(&self, left_id: u16, right_id: u16) -> i32 {
        debug_assert!(usize::from(left_id) < self.num_left);
        debug_assert!(usize::from(right_id) < self.num_right);
        i32::from(self.data[usize::from(left_id) * self.num_right + usize::from(right_id)])
    }

    /// 左文脈IDの総数を返します。
    #[inline(always)]
    pub fn num_left(&self) -> usize {
        self.num_left
    }

    /// 右文脈IDの総数を返します。
    #[inline(always)]
    pub fn num_right(&self) -> usize {
        self.num_right
    }

    /// シリアライズ後のバイト数を返します。
    #[inline(always)]
    pub(crate) fn serialized_len(&self) -> usize {
        4 + self.data.len() * 2
    }

    /// 行列リソースを書き出します。
    ///
    /// u16の`num_left`・`num_right`に続けて、行優先のi16配列を
    /// リトルエンディアンで書き出します。
    ///
    /// # エラー
    ///
    /// 行列の寸法がu16に収まらない場合は符号化できないため、
    /// [`WakachiError::InvalidArgument`]を返します。
    pub fn write_to<W>(&self, mut wtr: W) -> Result<()>
    where
        W: Write,
    {
        let num_left = u16::try_from(self.num_left).map_err(|_| {
            WakachiError::invalid_argument("num_left", "matrix dimension exceeds u16")
        })?;
        let num_right = u16::try_from(self.num_right).map_err(|_| {
            WakachiError::invalid_argument("num_right", "matrix dimension exceeds u16")
        })?;
        wtr.write_all(&num_left.to_le_bytes())?;
        wtr.write_all(&num_right.to_le_bytes())?;
        for &cost in &self.data {
            wtr.write_all(&cost.to_le_bytes())?;
        }
        Ok(())
    }

    /// 行列リソースのバイト列からコネクターを復元します。
    ///
    /// # エラー
    ///
    /// バイト列がヘッダの寸法と一致しない場合は
    /// [`DictionaryLoadError`]を返します。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DictionaryLoadError> {
        if bytes.len() < 4 {
            return Err(DictionaryLoadError::Truncated {
                name: "matrix",
                expected: 4,
                found: bytes.len(),
            });
        }
        let num_left = u16::from_le_bytes(bytes[0..2].try_into().unwrap()) as usize;
        let num_right = u16::from_le_bytes(bytes[2..4].try_into().unwrap()) as usize;
        let expected = 4 + num_left * num_right * 2;
        if bytes.len() != expected {
            return Err(DictionaryLoadError::Truncated {
                name: "matrix",
                expected,
                found: bytes.len(),
            });
        }
        let data = bytes[4..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes(pair.try_into().unwrap()))
            .collect();
        Ok(Self::new(data, num_left, num_right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reader() {
        let matrix_def = "2 3\n0 1 -5\n1 2 7";
        let conn = MatrixConnector::from_reader(matrix_def.as_bytes()).unwrap();
        assert_eq!(conn.num_left(), 2);
        assert_eq!(conn.num_right(), 3);
        assert_eq!(conn.cost(0, 1), -5);
        assert_eq!(conn.cost(1, 2), 7);
        assert_eq!(conn.cost(0, 0), 0);
    }

    #[test]
    fn test_invalid_header() {
        assert!(MatrixConnector::from_reader("2".as_bytes()).is_err());
        assert!(MatrixConnector::from_reader("0 0".as_bytes()).is_err());
        assert!(MatrixConnector::from_reader("2 2\n5 0 1".as_bytes()).is_err());
    }

    #[test]
    fn test_binary_round_trip() {
        let matrix_def = "2 2\n0 0 1\n0 1 2\n1 0 3\n1 1 4";
        let conn = MatrixConnector::from_reader(matrix_def.as_bytes()).unwrap();

        let mut buf = vec![];
        conn.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), conn.serialized_len());

        let decoded = MatrixConnector::from_bytes(&buf).unwrap();
        for left_id in 0..2 {
            for right_id in 0..2 {
                assert_eq!(decoded.cost(left_id, right_id), conn.cost(left_id, right_id));
            }
        }

        assert!(matches!(
            MatrixConnector::from_bytes(&buf[..buf.len() - 1]),
            Err(DictionaryLoadError::Truncated { .. })
        ));
    }

    #[test]
    fn test_write_oversized_dimensions() {
        let num_left = usize::from(u16::MAX) + 1;
        let conn = MatrixConnector::new(vec![0i16; num_left], num_left, 1);
        let mut buf = vec![];
        assert!(conn.write_to(&mut buf).is_err());
    }
}
