// パス: src/parser/mod.rs
// 役割: トークン列から AST を生成する再帰下降パーサのエントリポイント
// 意図: ラップ済み関数ソースを固定ノード集合の構文木へ落とし込む
// 関連ファイル: src/parser/stmt.rs, src/parser/expr.rs, src/lexer.rs
//! 構文解析モジュール
//!
//! - 記述子側で `var <name> = <関数ソース>;` にラップされたテキストを解析し、
//!   宣言子の初期化式（関数式）を取り出して返す。
//! - 演算子の結合規則・優先順位は `INFIX_LEVELS` の表でハンドコードする。
//! - 生成するノード種別は `ast::NodeKind` の閉じた集合に限る。

use crate::ast::{DeclarationKind, LiteralValue, Node, NodeKind, Span};
use crate::errors::ParseError;
use crate::lexer::{lex, Token, TokenKind};

mod expr;
mod stmt;

pub struct Parser {
    ts: Vec<Token>,
    i: usize,
}

/// 中置二項演算の優先順位表の 1 段。`logical` は論理式ノードを生成する段。
pub(super) struct InfixSpec {
    pub tokens: &'static [TokenKind],
    pub logical: bool,
}

impl InfixSpec {
    pub(super) fn contains(&self, kind: &TokenKind) -> bool {
        self.tokens.iter().any(|tk| tk == kind)
    }
}

/// 弱い束縛から強い束縛の順。すべて左結合。
pub(super) const INFIX_LEVELS: &[InfixSpec] = &[
    InfixSpec {
        tokens: &[TokenKind::OROR],
        logical: true,
    },
    InfixSpec {
        tokens: &[TokenKind::ANDAND],
        logical: true,
    },
    InfixSpec {
        tokens: &[TokenKind::BAR],
        logical: false,
    },
    InfixSpec {
        tokens: &[TokenKind::CARET],
        logical: false,
    },
    InfixSpec {
        tokens: &[TokenKind::AMP],
        logical: false,
    },
    InfixSpec {
        tokens: &[
            TokenKind::EQ,
            TokenKind::NE,
            TokenKind::SEQ,
            TokenKind::SNE,
        ],
        logical: false,
    },
    InfixSpec {
        tokens: &[TokenKind::LT, TokenKind::LE, TokenKind::GT, TokenKind::GE],
        logical: false,
    },
    InfixSpec {
        tokens: &[TokenKind::SHL, TokenKind::SHR, TokenKind::USHR],
        logical: false,
    },
    InfixSpec {
        tokens: &[TokenKind::PLUS, TokenKind::MINUS],
        logical: false,
    },
    InfixSpec {
        tokens: &[TokenKind::STAR, TokenKind::SLASH, TokenKind::PERCENT],
        logical: false,
    },
];

/// ラップ済みソース（`var <name> = <関数ソース>;`）を解析し、
/// 宣言子の初期化式に当たる関数式ノードを返す。
pub fn parse_wrapped(wrapped: &str) -> Result<Node, ParseError> {
    let tokens = lex(wrapped)?;
    let mut parser = Parser { ts: tokens, i: 0 };
    parser.pop(TokenKind::VAR)?;
    parser.pop(TokenKind::IDENT)?;
    parser.pop(TokenKind::ASSIGN)?;
    let init = parser.parse_function_expression()?;
    parser.accept(TokenKind::SEMI);
    let t = parser.peek().clone();
    if t.kind != TokenKind::EOF {
        return Err(Parser::err_at(
            &t,
            "PAR110",
            "関数定義の後に余分なトークンがあります",
        ));
    }
    Ok(init)
}

impl Parser {
    pub(super) fn peek(&self) -> &Token {
        &self.ts[self.i.min(self.ts.len() - 1)]
    }

    pub(super) fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub(super) fn pop_any(&mut self) -> Token {
        let t = self.ts[self.i.min(self.ts.len() - 1)].clone();
        if self.i < self.ts.len() - 1 {
            self.i += 1;
        }
        t
    }

    pub(super) fn pop(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let t = self.peek().clone();
        if t.kind == kind {
            Ok(self.pop_any())
        } else {
            Err(Self::err_at(
                &t,
                "PAR100",
                format!("{:?} を期待しましたが {:?} が現れました", kind, t.kind),
            ))
        }
    }

    pub(super) fn accept(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek().kind == kind {
            Some(self.pop_any())
        } else {
            None
        }
    }

    /// 直前に消費したトークンの末尾バイト位置。
    pub(super) fn end_of_prev(&self) -> usize {
        if self.i == 0 {
            return 0;
        }
        let t = &self.ts[self.i - 1];
        t.pos + t.value.len()
    }

    /// 開始トークンから直前トークンの末尾までを範囲とする。
    pub(super) fn span_from(&self, start: &Token) -> Span {
        Span::new(start.pos, self.end_of_prev(), start.line, start.col)
    }

    pub(super) fn err_at(t: &Token, code: &'static str, msg: impl Into<String>) -> ParseError {
        ParseError::at(code, msg, Some(t.pos), Some(t.line), Some(t.col))
    }

    /// `function [name](params) { body }` を関数式として解析する。
    pub(super) fn parse_function_expression(&mut self) -> Result<Node, ParseError> {
        let start = self.pop(TokenKind::FUNCTION)?;
        let name = self.accept(TokenKind::IDENT).map(|t| t.value);
        let params = self.parse_parameter_list()?;
        let body = self.parse_block_statement()?;
        Ok(Node::new(
            NodeKind::FunctionExpression {
                name,
                params,
                body: Box::new(body),
            },
            self.span_from(&start),
        ))
    }

    /// ネスト宣言用。名前必須である点だけが関数式と異なる。
    pub(super) fn parse_function_declaration(&mut self) -> Result<Node, ParseError> {
        let start = self.pop(TokenKind::FUNCTION)?;
        let name_tok = self.pop(TokenKind::IDENT)?;
        let params = self.parse_parameter_list()?;
        let body = self.parse_block_statement()?;
        Ok(Node::new(
            NodeKind::FunctionDeclaration {
                name: name_tok.value,
                params,
                body: Box::new(body),
            },
            self.span_from(&start),
        ))
    }

    fn parse_parameter_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.pop(TokenKind::LPAREN)?;
        let mut params = Vec::new();
        if self.peek_kind() != TokenKind::RPAREN {
            loop {
                let t = self.pop(TokenKind::IDENT)?;
                params.push(t.value);
                if self.accept(TokenKind::COMMA).is_none() {
                    break;
                }
            }
        }
        self.pop(TokenKind::RPAREN)?;
        Ok(params)
    }
}
