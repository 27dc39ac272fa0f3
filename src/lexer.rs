// パス: src/lexer.rs
// 役割: カーネル関数サブセットの字句解析器とトークン定義を提供する
// 意図: 構文解析に必要な位置付きトークンを生成する
// 関連ファイル: src/parser/mod.rs, src/errors.rs, tests/lexer_parser.rs
//! 字句解析モジュール
//!
//! - カーネル関数として許容するスクリプト言語サブセットをトークン列へ変換する。
//! - 正規表現ライブラリを使わず、カーソル走査で実装する。
//! - すべてのトークンに行・列・バイト位置を記録し、診断情報と連携させる。

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
/// 生成されたトークンとその位置情報を保持するレコード。
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: usize,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// 字句解析で識別されるトークンの分類。
pub enum TokenKind {
    EOF,
    // 区切り記号
    LPAREN,
    RPAREN,
    LBRACE,
    RBRACE,
    LBRACK,
    RBRACK,
    COMMA,
    SEMI,
    DOT,
    // 代入演算子
    ASSIGN,
    PLUSASSIGN,
    MINUSASSIGN,
    STARASSIGN,
    SLASHASSIGN,
    PERCENTASSIGN,
    // 比較演算子
    EQ,    // `==`
    SEQ,   // `===`
    NE,    // `!=`
    SNE,   // `!==`
    LT,
    LE,
    GT,
    GE,
    // 算術・ビット演算子
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    AMP,
    BAR,
    CARET,
    TILDE,
    SHL,  // `<<`
    SHR,  // `>>`
    USHR, // `>>>`
    // 論理・単項演算子
    ANDAND,
    OROR,
    NOT,
    INC,
    DEC,
    // リテラル分類
    INT,
    FLOAT,
    HEX,
    OCT,
    BIN,
    STRING,
    // 識別子・キーワード
    IDENT,
    FUNCTION,
    RETURN,
    IF,
    ELSE,
    FOR,
    WHILE,
    DO,
    BREAK,
    CONTINUE,
    VAR,
    LET,
    CONST,
    TRUE,
    FALSE,
    THIS,
    DEBUGGER,
}

/// 予約語からトークン分類への変換表。
static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    HashMap::from([
        ("function", TokenKind::FUNCTION),
        ("return", TokenKind::RETURN),
        ("if", TokenKind::IF),
        ("else", TokenKind::ELSE),
        ("for", TokenKind::FOR),
        ("while", TokenKind::WHILE),
        ("do", TokenKind::DO),
        ("break", TokenKind::BREAK),
        ("continue", TokenKind::CONTINUE),
        ("var", TokenKind::VAR),
        ("let", TokenKind::LET),
        ("const", TokenKind::CONST),
        ("true", TokenKind::TRUE),
        ("false", TokenKind::FALSE),
        ("this", TokenKind::THIS),
        ("debugger", TokenKind::DEBUGGER),
    ])
});

#[derive(Debug)]
/// 行頭オフセットを事前計算し、行・列情報を素早く算出するヘルパ。
pub(crate) struct LineMap {
    starts: Vec<usize>,
}

impl LineMap {
    /// 入力全体を 1 度だけ走査して行頭インデックスを収集する。
    pub(crate) fn new(src: &str) -> Self {
        let mut starts = vec![0];
        for (idx, ch) in src.char_indices() {
            if ch == '\n' {
                let next = idx + ch.len_utf8();
                if next <= src.len() {
                    starts.push(next);
                }
            }
        }
        Self { starts }
    }

    /// 指定バイト位置の行番号と桁位置を返す。
    pub(crate) fn locate(&self, src: &str, pos: usize) -> (usize, usize) {
        let idx = match self.starts.binary_search(&pos) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        };
        let line = idx + 1;
        let start = self.starts[idx];
        let col = src[start..pos].chars().count() + 1;
        (line, col)
    }

    /// 指定行に対応するテキスト断片を返す（改行は除去する）。
    pub(crate) fn line_text<'a>(&self, src: &'a str, line: usize) -> &'a str {
        if line == 0 {
            return "";
        }
        let idx = line - 1;
        if idx >= self.starts.len() {
            return "";
        }
        let start = self.starts[idx];
        let end = self.starts.get(idx + 1).copied().unwrap_or(src.len());
        let slice = &src[start..end];
        slice.strip_suffix('\n').unwrap_or(slice)
    }
}

/// 空白文字かどうかを判定するユーティリティ。
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
/// 10 進数字かどうかを判定するユーティリティ。
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}
/// 16 進数字かどうかを判定するユーティリティ。
fn is_hexdigit(c: char) -> bool {
    c.is_ascii_hexdigit()
}
/// 8 進数字かどうかを判定するユーティリティ。
fn is_octdigit(c: char) -> bool {
    matches!(c, '0'..='7')
}
/// 2 進数字かどうかを判定するユーティリティ。
fn is_bindigit(c: char) -> bool {
    matches!(c, '0' | '1')
}
/// 識別子の先頭に使用可能な文字かどうかを判定する。
fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}
/// 識別子の後続として許容される文字か判定する。
fn is_ident_rest(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

struct Lexer<'a> {
    src: &'a str,
    cursor: usize,
    len: usize,
    line_map: LineMap,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            cursor: 0,
            len: src.len(),
            line_map: LineMap::new(src),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ParseError> {
        while self.cursor < self.len {
            if self.consume_trivia()? {
                continue;
            }
            if self.cursor >= self.len {
                break;
            }
            self.lex_token()?;
        }
        self.push_simple(TokenKind::EOF, "", self.len);
        Ok(self.tokens)
    }

    fn consume_trivia(&mut self) -> Result<bool, ParseError> {
        let mut advanced = false;
        loop {
            if self.consume_whitespace() {
                advanced = true;
                continue;
            }
            if self.cursor >= self.len {
                break;
            }
            if self.consume_block_comment()? {
                advanced = true;
                continue;
            }
            if self.cursor >= self.len {
                break;
            }
            if self.consume_line_comment() {
                advanced = true;
                continue;
            }
            break;
        }
        Ok(advanced)
    }

    fn consume_whitespace(&mut self) -> bool {
        let mut advanced = false;
        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) {
                self.advance_char();
                advanced = true;
            } else {
                break;
            }
        }
        advanced
    }

    fn consume_line_comment(&mut self) -> bool {
        if !self.starts_with("//") {
            return false;
        }
        self.advance_bytes(2);
        while let Some(ch) = self.advance_char() {
            if ch == '\n' {
                break;
            }
        }
        true
    }

    fn consume_block_comment(&mut self) -> Result<bool, ParseError> {
        if !self.starts_with("/*") {
            return Ok(false);
        }
        let start = self.cursor;
        let mut idx = self.cursor + 2;
        while idx < self.len {
            if self.src[idx..].starts_with("*/") {
                self.cursor = idx + 2;
                return Ok(true);
            }
            let Some(ch) = self.src[idx..].chars().next() else {
                break;
            };
            idx += ch.len_utf8();
        }
        Err(self.err("LEX001", "ブロックコメントが閉じていません", start))
    }

    fn lex_token(&mut self) -> Result<(), ParseError> {
        let start = self.cursor;
        let ch = self
            .peek_char()
            .expect("lex_token は EOF では呼び出されない");
        if self.try_symbol(ch) {
            return Ok(());
        }
        if ch == '\'' || ch == '"' {
            return self.lex_string_literal(ch);
        }
        if is_digit(ch) {
            return self.lex_number();
        }
        if is_letter(ch) {
            return self.lex_identifier_or_keyword();
        }
        Err(self.err("LEX090", format!("字句解析に失敗: {:?}", ch), start))
    }

    /// 最長一致を優先して記号トークンを切り出す。
    fn try_symbol(&mut self, first: char) -> bool {
        const THREE: &[(&str, TokenKind)] = &[
            ("===", TokenKind::SEQ),
            ("!==", TokenKind::SNE),
            (">>>", TokenKind::USHR),
        ];
        const TWO: &[(&str, TokenKind)] = &[
            ("==", TokenKind::EQ),
            ("!=", TokenKind::NE),
            ("<=", TokenKind::LE),
            (">=", TokenKind::GE),
            ("&&", TokenKind::ANDAND),
            ("||", TokenKind::OROR),
            ("<<", TokenKind::SHL),
            (">>", TokenKind::SHR),
            ("++", TokenKind::INC),
            ("--", TokenKind::DEC),
            ("+=", TokenKind::PLUSASSIGN),
            ("-=", TokenKind::MINUSASSIGN),
            ("*=", TokenKind::STARASSIGN),
            ("/=", TokenKind::SLASHASSIGN),
            ("%=", TokenKind::PERCENTASSIGN),
        ];
        for (pat, kind) in THREE.iter().chain(TWO.iter()) {
            if self.starts_with(pat) {
                let start = self.cursor;
                self.advance_bytes(pat.len());
                self.push_simple(*kind, pat, start);
                return true;
            }
        }
        let kind = match first {
            '(' => Some(TokenKind::LPAREN),
            ')' => Some(TokenKind::RPAREN),
            '{' => Some(TokenKind::LBRACE),
            '}' => Some(TokenKind::RBRACE),
            '[' => Some(TokenKind::LBRACK),
            ']' => Some(TokenKind::RBRACK),
            ',' => Some(TokenKind::COMMA),
            ';' => Some(TokenKind::SEMI),
            '.' => Some(TokenKind::DOT),
            '=' => Some(TokenKind::ASSIGN),
            '<' => Some(TokenKind::LT),
            '>' => Some(TokenKind::GT),
            '+' => Some(TokenKind::PLUS),
            '-' => Some(TokenKind::MINUS),
            '*' => Some(TokenKind::STAR),
            '/' => Some(TokenKind::SLASH),
            '%' => Some(TokenKind::PERCENT),
            '&' => Some(TokenKind::AMP),
            '|' => Some(TokenKind::BAR),
            '^' => Some(TokenKind::CARET),
            '~' => Some(TokenKind::TILDE),
            '!' => Some(TokenKind::NOT),
            _ => None,
        };
        if let Some(kind) = kind {
            let start = self.cursor;
            self.advance_bytes(first.len_utf8());
            self.push_slice(kind, start, self.cursor);
            return true;
        }
        false
    }

    fn lex_string_literal(&mut self, quote: char) -> Result<(), ParseError> {
        let start = self.cursor;
        self.advance_bytes(1); // 開始クォート
        let mut escaped = false;
        let mut ok = false;
        while let Some(ch) = self.advance_char() {
            if !escaped {
                if ch == '\\' {
                    escaped = true;
                    continue;
                }
                if ch == quote {
                    ok = true;
                    break;
                }
                if ch == '\n' {
                    break;
                }
            } else {
                escaped = false;
            }
        }
        if !ok {
            return Err(self.err("LEX003", "文字列リテラルが閉じていません", start));
        }
        self.push_slice(TokenKind::STRING, start, self.cursor);
        Ok(())
    }

    fn lex_number(&mut self) -> Result<(), ParseError> {
        let start = self.cursor;
        if self.starts_with("0x") || self.starts_with("0X") {
            return self.lex_prefixed_number(
                start,
                2,
                is_hexdigit,
                TokenKind::HEX,
                "LEX010",
                "16進数の桁がありません",
            );
        }
        if self.starts_with("0o") || self.starts_with("0O") {
            return self.lex_prefixed_number(
                start,
                2,
                is_octdigit,
                TokenKind::OCT,
                "LEX011",
                "8進数の桁がありません",
            );
        }
        if self.starts_with("0b") || self.starts_with("0B") {
            return self.lex_prefixed_number(
                start,
                2,
                is_bindigit,
                TokenKind::BIN,
                "LEX012",
                "2進数の桁がありません",
            );
        }

        while let Some(ch) = self.peek_char() {
            if is_digit(ch) {
                self.advance_char();
            } else {
                break;
            }
        }

        let mut is_float = false;
        if self.peek_char() == Some('.') {
            if let Some(next_digit) = self.peek_second_char() {
                if is_digit(next_digit) {
                    is_float = true;
                    self.advance_char(); // '.'
                    while let Some(ch) = self.peek_char() {
                        if is_digit(ch) {
                            self.advance_char();
                        } else {
                            break;
                        }
                    }
                }
            }
        }

        if let Some('e') | Some('E') = self.peek_char() {
            let mut idx = self.cursor + 1;
            if let Some(sign) = self.char_at(idx) {
                if sign == '+' || sign == '-' {
                    idx += 1;
                }
            }
            let mut count = 0;
            let mut scan = idx;
            while let Some(ch) = self.char_at(scan) {
                if is_digit(ch) {
                    scan += ch.len_utf8();
                    count += 1;
                } else {
                    break;
                }
            }
            if count > 0 {
                is_float = true;
                self.cursor = scan;
            }
        }

        let kind = if is_float {
            TokenKind::FLOAT
        } else {
            TokenKind::INT
        };
        self.push_slice(kind, start, self.cursor);
        Ok(())
    }

    fn lex_prefixed_number<F>(
        &mut self,
        start: usize,
        prefix_len: usize,
        mut predicate: F,
        kind: TokenKind,
        code: &'static str,
        msg: &str,
    ) -> Result<(), ParseError>
    where
        F: FnMut(char) -> bool,
    {
        self.advance_bytes(prefix_len);
        let mut count = 0;
        while let Some(ch) = self.peek_char() {
            if predicate(ch) {
                self.advance_char();
                count += 1;
            } else {
                break;
            }
        }
        if count == 0 {
            return Err(self.err(code, msg, start));
        }
        self.push_slice(kind, start, self.cursor);
        Ok(())
    }

    fn lex_identifier_or_keyword(&mut self) -> Result<(), ParseError> {
        let start = self.cursor;
        self.advance_char();
        while let Some(ch) = self.peek_char() {
            if is_ident_rest(ch) {
                self.advance_char();
            } else {
                break;
            }
        }
        let slice = &self.src[start..self.cursor];
        let kind = KEYWORDS.get(slice).copied().unwrap_or(TokenKind::IDENT);
        self.push_simple(kind, slice, start);
        Ok(())
    }

    fn push_simple(&mut self, kind: TokenKind, value: &str, start: usize) {
        let (line, col) = self.line_map.locate(self.src, start);
        self.tokens.push(Token {
            kind,
            value: value.into(),
            pos: start,
            line,
            col,
        });
    }

    fn push_slice(&mut self, kind: TokenKind, start: usize, end: usize) {
        let (line, col) = self.line_map.locate(self.src, start);
        self.tokens.push(Token {
            kind,
            value: self.src[start..end].into(),
            pos: start,
            line,
            col,
        });
    }

    fn peek_char(&self) -> Option<char> {
        if self.cursor >= self.len {
            None
        } else {
            self.src[self.cursor..].chars().next()
        }
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut iter = self.src[self.cursor..].chars();
        iter.next()?;
        iter.next()
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        if idx >= self.len {
            None
        } else {
            self.src[idx..].chars().next()
        }
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.advance_bytes(ch.len_utf8());
        Some(ch)
    }

    fn advance_bytes(&mut self, count: usize) {
        self.cursor = (self.cursor + count).min(self.len);
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.src[self.cursor..].starts_with(pattern)
    }

    fn err(&self, code: &'static str, message: impl Into<String>, pos: usize) -> ParseError {
        let (line, col) = self.line_map.locate(self.src, pos);
        ParseError::at_with_snippet(
            code,
            message,
            Some(pos),
            Some(line),
            Some(col),
            self.line_map.line_text(self.src, line).to_string(),
        )
    }
}

pub fn lex(src: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(src).run()
}
