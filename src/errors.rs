// パス: src/errors.rs
// 役割: エラー型の定義（共通フォーマット: [CODE] メッセージ @line:col / @pos）
// 意図: 変換失敗の原因を関数名・位置・スニペット付きで報告できるようにする
// 関連ファイル: src/lexer.rs, src/parser/mod.rs, src/function_node.rs
//! エラー型の定義（共通フォーマット: \[CODE\] メッセージ @line:col / @pos）。
//!
//! - `ConfigurationError` … コンストラクタ入力の不備（関数文字列でない、型配列長の不一致など）。
//! - `ParseError` … ソースから構文木が得られない。
//! - `UnsupportedSyntaxError` … 固定ディスパッチ集合の外にあるノード／展開不能なメンバ式。
//! - `StateMismatchError` … スコープ状態スタックの push/pop 不整合。

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub msg: String,
    pub pos: Option<usize>,      // バイトオフセット（任意）
    pub line: Option<usize>,     // 1-origin（任意）
    pub col: Option<usize>,      // 1-origin（任意）
    pub snippet: Option<String>, // エラー個所のソース断片（任意）
}

impl ErrorInfo {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self {
            code,
            msg: msg.into(),
            pos,
            line: None,
            col: None,
            snippet: None,
        }
    }
    pub fn at(
        code: &'static str,
        msg: impl Into<String>,
        pos: Option<usize>,
        line: Option<usize>,
        col: Option<usize>,
    ) -> Self {
        Self {
            code,
            msg: msg.into(),
            pos,
            line,
            col,
            snippet: None,
        }
    }
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // 1行目: ヘッダ
        match (self.line, self.col, self.pos) {
            (Some(l), Some(c), Some(p)) => write!(
                f,
                "[{}] {} @line={},col={} @pos={}",
                self.code, self.msg, l, c, p
            )?,
            (Some(l), Some(c), None) => {
                write!(f, "[{}] {} @line={},col={}", self.code, self.msg, l, c)?
            }
            (_, _, Some(p)) => write!(f, "[{}] {} @pos={}", self.code, self.msg, p)?,
            _ => write!(f, "[{}] {}", self.code, self.msg)?,
        }
        // 2行目以降: スニペット（列情報があればキャレットを付す）
        if let Some(s) = &self.snippet {
            match self.col {
                Some(c) => {
                    let caret = if c > 1 {
                        " ".repeat(c - 1) + "^"
                    } else {
                        "^".to_string()
                    };
                    write!(f, "\n{}\n{}", s, caret)?;
                }
                None => write!(f, "\n{}", s)?,
            }
        }
        Ok(())
    }
}

/// コンストラクタへの入力が仕様を満たさない場合のエラー。
#[derive(Debug, Clone)]
pub struct ConfigurationError(pub ErrorInfo);
impl ConfigurationError {
    pub fn new(code: &'static str, msg: impl Into<String>) -> Self {
        Self(ErrorInfo::new(code, msg, None))
    }
}

/// ソースから構文木を生成できなかった場合のエラー。
#[derive(Debug, Clone)]
pub struct ParseError(pub ErrorInfo);
impl ParseError {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self(ErrorInfo::new(code, msg, pos))
    }
    pub fn at(
        code: &'static str,
        msg: impl Into<String>,
        pos: Option<usize>,
        line: Option<usize>,
        col: Option<usize>,
    ) -> Self {
        Self(ErrorInfo::at(code, msg, pos, line, col))
    }
    pub fn at_with_snippet(
        code: &'static str,
        msg: impl Into<String>,
        pos: Option<usize>,
        line: Option<usize>,
        col: Option<usize>,
        snippet: impl Into<String>,
    ) -> Self {
        Self(ErrorInfo::at(code, msg, pos, line, col).with_snippet(snippet))
    }
}

/// ディスパッチ不能な構文要素に遭遇した場合のエラー。スニペット必須。
#[derive(Debug, Clone)]
pub struct UnsupportedSyntaxError(pub ErrorInfo);
impl UnsupportedSyntaxError {
    pub fn new(code: &'static str, msg: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self(ErrorInfo::new(code, msg, None).with_snippet(snippet))
    }
    pub fn at_with_snippet(
        code: &'static str,
        msg: impl Into<String>,
        pos: Option<usize>,
        line: Option<usize>,
        col: Option<usize>,
        snippet: impl Into<String>,
    ) -> Self {
        Self(ErrorInfo::at(code, msg, pos, line, col).with_snippet(snippet))
    }
}

/// 状態スタックの pop が先頭と一致しない場合のエラー。
#[derive(Debug, Clone)]
pub struct StateMismatchError(pub ErrorInfo);
impl StateMismatchError {
    pub fn new(code: &'static str, msg: impl Into<String>) -> Self {
        Self(ErrorInfo::new(code, msg, None))
    }
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl StdError for ConfigurationError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl StdError for ParseError {}

impl Display for UnsupportedSyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl StdError for UnsupportedSyntaxError {}

impl Display for StateMismatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}
impl StdError for StateMismatchError {}
