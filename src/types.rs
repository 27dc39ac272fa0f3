// パス: src/types.rs
// 役割: 変数型タグと定数値の表現を提供する
// 意図: 記述子間で受け渡す型情報を閉じた集合として固定する
// 関連ファイル: src/function_node.rs, src/function_builder.rs, tests/type_inference.rs
//! 型タグモジュール
//!
//! - `VarType` は引数・戻り値・ローカル宣言に付く解決済み型タグ。
//! - 汎用数値型 `Number` が未解決時の既定値。`Input` は不透明入力の予約タグ。
//! - 文字列表現は元システムの型タグと往復変換できる。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// 引数・戻り値・宣言に付与される型タグ。
pub enum VarType {
    Number,
    Integer,
    Float,
    Boolean,
    Array,
    Input,
}

impl VarType {
    /// 未解決時の既定値（汎用数値型）。
    pub const fn default_numeric() -> Self {
        VarType::Number
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VarType::Number => "Number",
            VarType::Integer => "Integer",
            VarType::Float => "Float",
            VarType::Boolean => "Boolean",
            VarType::Array => "Array",
            VarType::Input => "Input",
        }
    }
}

impl Default for VarType {
    fn default() -> Self {
        Self::default_numeric()
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// `VarType` として解釈できない文字列タグ。
pub struct UnknownTypeTag(pub String);

impl fmt::Display for UnknownTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知の型タグ: {}", self.0)
    }
}
impl std::error::Error for UnknownTypeTag {}

impl FromStr for VarType {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Number" => Ok(VarType::Number),
            "Integer" => Ok(VarType::Integer),
            "Float" => Ok(VarType::Float),
            "Boolean" => Ok(VarType::Boolean),
            "Array" => Ok(VarType::Array),
            "Input" => Ok(VarType::Input),
            other => Err(UnknownTypeTag(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// コンパイル時定数の値。コアは存在と型タグのみを参照し、値は下流エミッタへ渡す。
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConstantValue {
    /// 値から素朴に導出した型タグ。`constantTypes` が無い場合の補完に使う。
    pub fn inferred_type(&self) -> VarType {
        match self {
            ConstantValue::Bool(_) => VarType::Boolean,
            ConstantValue::Int(_) => VarType::Integer,
            ConstantValue::Float(_) => VarType::Number,
            ConstantValue::Str(_) => VarType::Input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_type_round_trips_through_str() {
        for ty in [
            VarType::Number,
            VarType::Integer,
            VarType::Float,
            VarType::Boolean,
            VarType::Array,
            VarType::Input,
        ] {
            assert_eq!(ty.as_str().parse::<VarType>().expect("parse"), ty);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!("Texture3D".parse::<VarType>().is_err());
    }
}
