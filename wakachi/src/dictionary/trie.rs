//! ダブル配列トライによる高速文字列検索
//!
//! このモジュールは、ダブル配列（double-array）トライの構築と
//! 共通接頭辞検索を提供します。トライは`base`と`check`の2本の
//! 平坦な符号付き整数配列として表現され、1遷移あたりO(1)の検索を
//! 実現します。
//!
//! # 表現
//!
//! 状態`s`の子は`base[s] + code`のスロットに配置され、そのスロットの
//! `check`には親の`base`値が書き込まれます。コード0はキー終端を表し、
//! 終端スロットの`base`には`-value - 1`が負数として符号化されます。
//! 構築後のトライは読み取り専用であり、スレッド間で安全に共有できます。

use std::io::{self, Write};

use crate::errors::{BuildError, DictionaryLoadError, Result, SearchOverflowError, WakachiError};

/// 空きスロットを示す`check`値
///
/// 有効な`check`値は親の`base`値（常に1以上）なので、負数と衝突しません。
const VACANT: i32 = -1;

/// 空きスロット候補カーソルを前進させる占有率のしきい値
const DENSITY_THRESHOLD: f32 = 0.95;

/// ダブル配列トライ
///
/// [`Trie::from_records`]で一度構築された後は不変であり、
/// 並行する複数の検索から同時に参照できます。
#[derive(Debug)]
pub struct Trie {
    base: Vec<i32>,
    check: Vec<i32>,
}

/// トライマッチング結果
#[derive(Debug, Default, Eq, PartialEq, Clone, Copy)]
pub struct TrieMatch {
    /// 一致したキーに対応づけられた値
    pub value: u32,
    /// 一致したキーの文字数（入力先頭からの排他的終端位置）
    pub end_char: usize,
}

impl TrieMatch {
    /// 新しいマッチング結果を作成します。
    #[inline(always)]
    pub const fn new(value: u32, end_char: usize) -> Self {
        Self { value, end_char }
    }
}

impl Trie {
    /// レコードからトライを構築します。
    ///
    /// キーは辞書順に一意にソートされている必要があります。ソート違反や
    /// 重複キーは再帰的な分割処理の途中で検出され、部分的なトライを
    /// 残さずに構築全体が中断されます。
    ///
    /// # 引数
    ///
    /// * `records` - `(キー, 値)`の列。値は`i32::MAX`以下の非負整数
    ///
    /// # エラー
    ///
    /// キー列がソートされていない場合は[`BuildError::UnsortedKeys`]、
    /// 値が範囲外の場合は[`WakachiError::InvalidArgument`]を返します。
    pub fn from_records<K>(records: &[(K, u32)]) -> Result<Self>
    where
        K: AsRef<str>,
    {
        for (k, v) in records {
            if *v > i32::MAX as u32 {
                return Err(WakachiError::invalid_argument(
                    "records",
                    format!("value {v} for key {:?} exceeds i32::MAX", k.as_ref()),
                ));
            }
        }

        // Character codes are shifted by one so that 0 is free for the
        // end-of-key marker.
        let keys: Vec<Vec<u32>> = records
            .iter()
            .map(|(k, _)| k.as_ref().chars().map(|c| c as u32 + 1).collect())
            .collect();
        let values: Vec<u32> = records.iter().map(|(_, v)| *v).collect();

        let mut builder = Builder::new();
        if !keys.is_empty() {
            builder.build_range(&keys, &values, 0, keys.len(), 0, 0)?;
        }
        builder.shrink();

        Ok(Self {
            base: builder.base,
            check: builder.check,
        })
    }

    /// 共通接頭辞検索のイテレータを取得します。
    ///
    /// 入力の先頭から1文字ずつ遷移をたどり、途中で遭遇した終端状態の
    /// 値をすべて返します。結果の順序はトライの走査順であり、長さ順は
    /// 保証されません。遷移が存在しない文字に達した時点で走査は停止し、
    /// それまでに見つかった結果のみが返されます（エラーにはなりません）。
    ///
    /// # 引数
    ///
    /// * `input` - 入力文字列の文字スライス
    ///
    /// # 戻り値
    ///
    /// 一致した[`TrieMatch`]のイテレータ
    #[inline(always)]
    pub fn common_prefix_iterator<'a>(&'a self, input: &'a [char]) -> CommonPrefixIter<'a> {
        CommonPrefixIter {
            trie: self,
            input,
            pos: 0,
            state_base: self.base.first().copied().unwrap_or(0),
            checked_terminal: false,
            done: self.base.is_empty(),
        }
    }

    /// 固定容量の結果バッファへ共通接頭辞検索を行います。
    ///
    /// バッファ容量は、トライの深さとキー集合の性質から導かれる
    /// 最大マッチ数以上を呼び出し側が保証する必要があります。
    ///
    /// # 引数
    ///
    /// * `input` - 入力文字列の文字スライス
    /// * `results` - 結果を書き込むバッファ
    ///
    /// # 戻り値
    ///
    /// 書き込まれたマッチ数
    ///
    /// # エラー
    ///
    /// マッチ数がバッファ容量を超えた場合は[`SearchOverflowError`]を
    /// 返します。これは呼び出し側の契約違反です。
    pub fn common_prefix_search_into(
        &self,
        input: &[char],
        results: &mut [TrieMatch],
    ) -> Result<usize, SearchOverflowError> {
        let mut num_results = 0;
        for m in self.common_prefix_iterator(input) {
            if num_results == results.len() {
                return Err(SearchOverflowError {
                    capacity: results.len(),
                });
            }
            results[num_results] = m;
            num_results += 1;
        }
        Ok(num_results)
    }

    /// トライの状態数を返します。
    #[inline(always)]
    pub fn num_states(&self) -> usize {
        self.base.len()
    }

    /// シリアライズ後のバイト数を返します。
    #[inline(always)]
    pub(crate) fn serialized_len(&self) -> usize {
        self.base.len() * 8
    }

    /// トライバッファを`(base, check)`のi32リトルエンディアン対の列として
    /// 書き出します。
    pub fn write_to<W>(&self, mut wtr: W) -> io::Result<()>
    where
        W: Write,
    {
        for (b, c) in self.base.iter().zip(&self.check) {
            wtr.write_all(&b.to_le_bytes())?;
            wtr.write_all(&c.to_le_bytes())?;
        }
        Ok(())
    }

    /// トライバッファのバイト列からトライを復元します。
    ///
    /// # エラー
    ///
    /// バイト長が8の倍数でない場合は[`DictionaryLoadError::Malformed`]を
    /// 返します。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DictionaryLoadError> {
        if bytes.len() % 8 != 0 {
            return Err(DictionaryLoadError::malformed(
                "trie",
                format!("buffer length {} is not a multiple of 8", bytes.len()),
            ));
        }
        let num_states = bytes.len() / 8;
        let mut base = Vec::with_capacity(num_states);
        let mut check = Vec::with_capacity(num_states);
        for pair in bytes.chunks_exact(8) {
            base.push(i32::from_le_bytes(pair[..4].try_into().unwrap()));
            check.push(i32::from_le_bytes(pair[4..].try_into().unwrap()));
        }
        Ok(Self { base, check })
    }

    /// すべての終端スロットの値が`num_values`未満であることを検査します。
    ///
    /// 信頼できないバイト列から復元したトライを、参照先のテーブルと
    /// 突き合わせて検索前に棄却するために使用します。
    ///
    /// # エラー
    ///
    /// 終端スロットの符号化が不正、または値が範囲外の場合は
    /// [`DictionaryLoadError::Malformed`]を返します。
    pub(crate) fn verify_values(&self, num_values: usize) -> Result<(), DictionaryLoadError> {
        for (slot, (&b, &c)) in self.base.iter().zip(&self.check).enumerate() {
            // check[slot] == slot holds exactly for end-of-key slots.
            let is_terminal = slot > 0 && i32::try_from(slot).is_ok_and(|s| s == c);
            if !is_terminal {
                continue;
            }
            if b >= 0 {
                return Err(DictionaryLoadError::malformed(
                    "trie",
                    format!("terminal slot {slot} holds non-negative base {b}"),
                ));
            }
            let value = -i64::from(b) - 1;
            if value >= num_values as i64 {
                return Err(DictionaryLoadError::malformed(
                    "trie",
                    format!("terminal value {value} out of range (expected < {num_values})"),
                ));
            }
        }
        Ok(())
    }
}

/// 共通接頭辞検索のイテレータ
///
/// 単一のパスをたどりながら、通過した終端状態の値を順に返します。
pub struct CommonPrefixIter<'a> {
    trie: &'a Trie,
    input: &'a [char],
    pos: usize,
    state_base: i32,
    checked_terminal: bool,
    done: bool,
}

impl Iterator for CommonPrefixIter<'_> {
    type Item = TrieMatch;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if !self.checked_terminal {
                self.checked_terminal = true;
                // The end-of-key child sits at slot base + 0.
                let slot = self.state_base as usize;
                if self.state_base > 0
                    && slot < self.trie.check.len()
                    && self.trie.check[slot] == self.state_base
                {
                    let encoded = self.trie.base[slot];
                    debug_assert!(encoded < 0);
                    return Some(TrieMatch::new((-encoded - 1) as u32, self.pos));
                }
            }
            if self.pos >= self.input.len() {
                self.done = true;
                return None;
            }
            let code = self.input[self.pos] as u32 + 1;
            let next = self.state_base as i64 + i64::from(code);
            if next >= 0
                && (next as usize) < self.trie.check.len()
                && self.trie.check[next as usize] == self.state_base
            {
                self.state_base = self.trie.base[next as usize];
                self.pos += 1;
                self.checked_terminal = false;
            } else {
                self.done = true;
                return None;
            }
        }
        None
    }
}

/// トライ構築時のみ使用される可変のバッキングストア
///
/// 構築が完了すると凍結され、不変の[`Trie`]としてのみ公開されます。
struct Builder {
    base: Vec<i32>,
    check: Vec<i32>,
    used_base: Vec<bool>,
    next_check_pos: usize,
    max_slot: usize,
}

impl Builder {
    fn new() -> Self {
        Self {
            base: vec![0; 1024],
            check: vec![VACANT; 1024],
            used_base: vec![false; 1024],
            next_check_pos: 1,
            max_slot: 0,
        }
    }

    /// `[key_begin, key_end)`のキー範囲を`depth`文字目で兄弟グループに
    /// 分割し、状態`state`の子として配置します。
    ///
    /// コード0（キー終端）の兄弟は終端値を負数符号化して格納し、
    /// それ以外の兄弟には再帰的に子を構築します。
    fn build_range(
        &mut self,
        keys: &[Vec<u32>],
        values: &[u32],
        key_begin: usize,
        key_end: usize,
        depth: usize,
        state: usize,
    ) -> Result<(), BuildError> {
        // Sibling groups keyed by the next character code. Sorted input
        // guarantees codes are non-decreasing; anything else means the
        // caller handed us unsorted keys.
        let mut siblings: Vec<(u32, usize, usize)> = vec![];
        for i in key_begin..key_end {
            let key = &keys[i];
            let code = if depth < key.len() { key[depth] } else { 0 };
            match siblings.last_mut() {
                Some((last_code, _, sub_end)) if *last_code == code => {
                    if code == 0 {
                        // Two keys ending at the same node are duplicates.
                        return Err(BuildError::UnsortedKeys { index: i });
                    }
                    *sub_end = i + 1;
                }
                Some((last_code, _, _)) if *last_code > code => {
                    return Err(BuildError::UnsortedKeys { index: i });
                }
                _ => siblings.push((code, i, i + 1)),
            }
        }

        let codes: Vec<u32> = siblings.iter().map(|&(code, _, _)| code).collect();
        let new_base = self.find_base(&codes);
        self.base[state] = new_base as i32;

        // Claim every sibling slot before recursing so that nested
        // find_base calls observe them as occupied.
        for &(code, _, _) in &siblings {
            let slot = new_base + code as usize;
            self.check[slot] = new_base as i32;
            self.max_slot = self.max_slot.max(slot);
        }

        for &(code, sub_begin, sub_end) in &siblings {
            let slot = new_base + code as usize;
            if code == 0 {
                self.base[slot] = -(values[sub_begin] as i32) - 1;
            } else {
                self.build_range(keys, values, sub_begin, sub_end, depth + 1, slot)?;
            }
        }
        Ok(())
    }

    /// 兄弟グループ全体が衝突なく収まる`base`値を探します。
    ///
    /// 空き候補カーソル`next_check_pos`から前方へ貪欲に走査し、走査した
    /// 窓の占有率がしきい値を超えた場合にカーソルを前進させます。
    /// `base`値は状態間で一意でなければならないため（`check`が親の
    /// `base`を保持する表現の前提）、使用済みの値はスキップします。
    fn find_base(&mut self, codes: &[u32]) -> usize {
        debug_assert!(!codes.is_empty());
        let first = codes[0] as usize;

        let mut pos = self.next_check_pos.max(first + 1);
        let mut num_scanned = 0usize;
        let mut num_filled = 0usize;
        loop {
            self.ensure_slot(pos);
            num_scanned += 1;
            if self.check[pos] != VACANT {
                num_filled += 1;
                pos += 1;
                continue;
            }
            let candidate = pos - first;
            if candidate > 0 && self.base_fits(candidate, codes) {
                if num_filled as f32 / num_scanned as f32 >= DENSITY_THRESHOLD {
                    self.next_check_pos = pos;
                }
                self.mark_base_used(candidate);
                return candidate;
            }
            pos += 1;
        }
    }

    /// `base`値が未使用で、全兄弟スロットが空いているかを検査します。
    fn base_fits(&mut self, base: usize, codes: &[u32]) -> bool {
        if base < self.used_base.len() && self.used_base[base] {
            return false;
        }
        for &code in codes {
            let slot = base + code as usize;
            self.ensure_slot(slot);
            if self.check[slot] != VACANT {
                return false;
            }
        }
        true
    }

    fn mark_base_used(&mut self, base: usize) {
        if base >= self.used_base.len() {
            let new_len = (base + 1).max(self.used_base.len() + self.used_base.len() / 20 + 16);
            self.used_base.resize(new_len, false);
        }
        self.used_base[base] = true;
    }

    /// 添字`idx`が収まるよう、バッキングバッファを約5%ずつ幾何級数的に
    /// 拡張します。
    fn ensure_slot(&mut self, idx: usize) {
        if idx >= self.check.len() {
            let new_len = (idx + 1).max(self.check.len() + self.check.len() / 20 + 16);
            self.base.resize(new_len, 0);
            self.check.resize(new_len, VACANT);
        }
    }

    /// 末尾の未使用領域を切り詰めます。
    fn shrink(&mut self) {
        let len = self.max_slot + 1;
        if len < self.base.len() {
            self.base.truncate(len);
            self.check.truncate(len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(trie: &Trie, input: &str) -> Vec<(u32, usize)> {
        let chars: Vec<char> = input.chars().collect();
        trie.common_prefix_iterator(&chars)
            .map(|m| (m.value, m.end_char))
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let records = [("す", 0u32), ("すもも", 1), ("もも", 2), ("桃", 3)];
        let trie = Trie::from_records(&records).unwrap();
        for (k, v) in &records {
            let chars: Vec<char> = k.chars().collect();
            let found: Vec<u32> = trie
                .common_prefix_iterator(&chars)
                .filter(|m| m.end_char == chars.len())
                .map(|m| m.value)
                .collect();
            assert_eq!(found, vec![*v], "key {k}");
        }
    }

    #[test]
    fn test_common_prefix_completeness() {
        let records = [("a", 101u32), ("ab", 201), ("abc", 301)];
        let trie = Trie::from_records(&records).unwrap();

        let mut found = collect(&trie, "abc");
        found.sort_unstable();
        assert_eq!(found, vec![(101, 1), (201, 2), (301, 3)]);

        let mut found = collect(&trie, "ab");
        found.sort_unstable();
        assert_eq!(found, vec![(101, 1), (201, 2)]);

        assert!(collect(&trie, "x").is_empty());
    }

    #[test]
    fn test_absent_key() {
        let records = [("ab", 0u32), ("cd", 1)];
        let trie = Trie::from_records(&records).unwrap();
        assert!(collect(&trie, "a").is_empty());
        assert!(collect(&trie, "ac").is_empty());
        assert_eq!(collect(&trie, "cdx"), vec![(1, 2)]);
    }

    #[test]
    fn test_unsorted_keys() {
        let records = [("b", 0u32), ("a", 1)];
        let err = Trie::from_records(&records).unwrap_err();
        assert!(matches!(
            err,
            WakachiError::Build(BuildError::UnsortedKeys { .. })
        ));
    }

    #[test]
    fn test_duplicate_keys() {
        let records = [("a", 0u32), ("a", 1)];
        let err = Trie::from_records(&records).unwrap_err();
        assert!(matches!(
            err,
            WakachiError::Build(BuildError::UnsortedKeys { index: 1 })
        ));
    }

    #[test]
    fn test_search_into_overflow() {
        let records = [("a", 0u32), ("ab", 1), ("abc", 2)];
        let trie = Trie::from_records(&records).unwrap();
        let chars: Vec<char> = "abc".chars().collect();

        let mut results = [TrieMatch::default(); 3];
        let n = trie.common_prefix_search_into(&chars, &mut results).unwrap();
        assert_eq!(n, 3);

        let mut small = [TrieMatch::default(); 2];
        let err = trie.common_prefix_search_into(&chars, &mut small).unwrap_err();
        assert_eq!(err.capacity, 2);
    }

    #[test]
    fn test_empty_trie() {
        let records: [(&str, u32); 0] = [];
        let trie = Trie::from_records(&records).unwrap();
        assert!(collect(&trie, "abc").is_empty());
    }

    #[test]
    fn test_serialization() {
        let records = [("これ", 0u32), ("は", 1), ("本", 2)];
        let trie = Trie::from_records(&records).unwrap();

        let mut buf = vec![];
        trie.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), trie.serialized_len());

        let decoded = Trie::from_bytes(&buf).unwrap();
        assert_eq!(decoded.num_states(), trie.num_states());
        assert_eq!(collect(&decoded, "これは"), collect(&trie, "これは"));

        assert!(matches!(
            Trie::from_bytes(&buf[..buf.len() - 1]),
            Err(DictionaryLoadError::Malformed { .. })
        ));
    }
}
