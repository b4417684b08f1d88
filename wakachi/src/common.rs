//! ライブラリ全体で共有される定数

/// BOS（文頭）およびEOS（文末）の接続ID
pub const BOS_EOS_CONNECTION_ID: u16 = 0;
