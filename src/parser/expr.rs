// パス: src/parser/expr.rs
// 役割: 式レベルの構文解析ルーチンを実装する
// 意図: 優先順位表に基づく中置解析とメンバ・呼び出し連鎖を専用モジュールに切り分ける
// 関連ファイル: src/parser/mod.rs, src/parser/stmt.rs, src/ast.rs

use super::*;

impl Parser {
    /// コンマ演算子を含む最上位の式。2 個以上連なれば `SequenceExpression`。
    pub(super) fn parse_expression(&mut self) -> Result<Node, ParseError> {
        let start = self.peek().clone();
        let first = self.parse_assignment_expression()?;
        if self.peek_kind() != TokenKind::COMMA {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.accept(TokenKind::COMMA).is_some() {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(Node::new(
            NodeKind::SequenceExpression { expressions },
            self.span_from(&start),
        ))
    }

    /// 代入（右結合）。複合代入演算子もここで扱う。
    pub(super) fn parse_assignment_expression(&mut self) -> Result<Node, ParseError> {
        let start = self.peek().clone();
        let left = self.parse_infix_level(0)?;
        let operator = match self.peek_kind() {
            TokenKind::ASSIGN => "=",
            TokenKind::PLUSASSIGN => "+=",
            TokenKind::MINUSASSIGN => "-=",
            TokenKind::STARASSIGN => "*=",
            TokenKind::SLASHASSIGN => "/=",
            TokenKind::PERCENTASSIGN => "%=",
            _ => return Ok(left),
        };
        match left.kind {
            NodeKind::Identifier { .. } | NodeKind::MemberExpression { .. } => {}
            _ => {
                let t = self.peek().clone();
                return Err(Self::err_at(&t, "PAR130", "代入先が左辺値ではありません"));
            }
        }
        self.pop_any();
        let right = self.parse_assignment_expression()?;
        Ok(Node::new(
            NodeKind::AssignmentExpression {
                operator: operator.to_string(),
                left: Box::new(left),
                right: Box::new(right),
            },
            self.span_from(&start),
        ))
    }

    /// `INFIX_LEVELS` の優先順位表に従う左結合の中置解析。
    fn parse_infix_level(&mut self, level: usize) -> Result<Node, ParseError> {
        if level >= INFIX_LEVELS.len() {
            return self.parse_unary_expression();
        }
        let spec = &INFIX_LEVELS[level];
        let start = self.peek().clone();
        let mut left = self.parse_infix_level(level + 1)?;
        while spec.contains(&self.peek_kind()) {
            let op_tok = self.pop_any();
            let right = self.parse_infix_level(level + 1)?;
            let kind = if spec.logical {
                NodeKind::LogicalExpression {
                    operator: op_tok.value,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            } else {
                NodeKind::BinaryExpression {
                    operator: op_tok.value,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            };
            left = Node::new(kind, self.span_from(&start));
        }
        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Node, ParseError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::NOT | TokenKind::TILDE | TokenKind::PLUS | TokenKind::MINUS => {
                self.pop_any();
                let argument = self.parse_unary_expression()?;
                Ok(Node::new(
                    NodeKind::UnaryExpression {
                        operator: t.value.clone(),
                        argument: Box::new(argument),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::INC | TokenKind::DEC => {
                self.pop_any();
                let argument = self.parse_unary_expression()?;
                Ok(Node::new(
                    NodeKind::UpdateExpression {
                        operator: t.value.clone(),
                        argument: Box::new(argument),
                        prefix: true,
                    },
                    self.span_from(&t),
                ))
            }
            _ => self.parse_postfix_expression(),
        }
    }

    fn parse_postfix_expression(&mut self) -> Result<Node, ParseError> {
        let start = self.peek().clone();
        let argument = self.parse_call_member_expression()?;
        match self.peek_kind() {
            TokenKind::INC | TokenKind::DEC => {
                let op_tok = self.pop_any();
                Ok(Node::new(
                    NodeKind::UpdateExpression {
                        operator: op_tok.value,
                        argument: Box::new(argument),
                        prefix: false,
                    },
                    self.span_from(&start),
                ))
            }
            _ => Ok(argument),
        }
    }

    /// メンバアクセス（`.` / `[]`）と関数呼び出しの左結合連鎖。
    fn parse_call_member_expression(&mut self) -> Result<Node, ParseError> {
        let start = self.peek().clone();
        let mut node = self.parse_primary_expression()?;
        loop {
            match self.peek_kind() {
                TokenKind::DOT => {
                    self.pop_any();
                    let prop_tok = self.pop(TokenKind::IDENT)?;
                    let prop_span = self.span_from(&prop_tok);
                    let property = Node::new(
                        NodeKind::Identifier {
                            name: prop_tok.value,
                        },
                        prop_span,
                    );
                    node = Node::new(
                        NodeKind::MemberExpression {
                            object: Box::new(node),
                            property: Box::new(property),
                            computed: false,
                        },
                        self.span_from(&start),
                    );
                }
                TokenKind::LBRACK => {
                    self.pop_any();
                    let property = self.parse_expression()?;
                    self.pop(TokenKind::RBRACK)?;
                    node = Node::new(
                        NodeKind::MemberExpression {
                            object: Box::new(node),
                            property: Box::new(property),
                            computed: true,
                        },
                        self.span_from(&start),
                    );
                }
                TokenKind::LPAREN => {
                    self.pop_any();
                    let mut arguments = Vec::new();
                    if self.peek_kind() != TokenKind::RPAREN {
                        loop {
                            arguments.push(self.parse_assignment_expression()?);
                            if self.accept(TokenKind::COMMA).is_none() {
                                break;
                            }
                        }
                    }
                    self.pop(TokenKind::RPAREN)?;
                    node = Node::new(
                        NodeKind::CallExpression {
                            callee: Box::new(node),
                            arguments,
                        },
                        self.span_from(&start),
                    );
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_primary_expression(&mut self) -> Result<Node, ParseError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::INT => {
                self.pop_any();
                let value = Self::parse_int_literal(&t, &t.value, 10)?;
                Ok(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Int(value),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::HEX => {
                self.pop_any();
                let value = Self::parse_int_literal(&t, &t.value[2..], 16)?;
                Ok(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Int(value),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::OCT => {
                self.pop_any();
                let value = Self::parse_int_literal(&t, &t.value[2..], 8)?;
                Ok(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Int(value),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::BIN => {
                self.pop_any();
                let value = Self::parse_int_literal(&t, &t.value[2..], 2)?;
                Ok(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Int(value),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::FLOAT => {
                self.pop_any();
                let value: f64 = t.value.parse().map_err(|_| {
                    Self::err_at(&t, "PAR140", format!("数値リテラルを解釈できません: {}", t.value))
                })?;
                Ok(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Float(value),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::STRING => {
                self.pop_any();
                let value = Self::unescape_string(&t.value);
                Ok(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Str(value),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::TRUE | TokenKind::FALSE => {
                self.pop_any();
                Ok(Node::new(
                    NodeKind::Literal {
                        value: LiteralValue::Bool(t.kind == TokenKind::TRUE),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::IDENT => {
                self.pop_any();
                Ok(Node::new(
                    NodeKind::Identifier {
                        name: t.value.clone(),
                    },
                    self.span_from(&t),
                ))
            }
            TokenKind::THIS => {
                self.pop_any();
                Ok(Node::new(NodeKind::ThisExpression, self.span_from(&t)))
            }
            TokenKind::LPAREN => {
                self.pop_any();
                let inner = self.parse_expression()?;
                self.pop(TokenKind::RPAREN)?;
                Ok(inner)
            }
            TokenKind::LBRACK => {
                self.pop_any();
                let mut elements = Vec::new();
                if self.peek_kind() != TokenKind::RBRACK {
                    loop {
                        elements.push(self.parse_assignment_expression()?);
                        if self.accept(TokenKind::COMMA).is_none() {
                            break;
                        }
                    }
                }
                self.pop(TokenKind::RBRACK)?;
                Ok(Node::new(
                    NodeKind::ArrayExpression { elements },
                    self.span_from(&t),
                ))
            }
            TokenKind::FUNCTION => self.parse_function_expression(),
            _ => Err(Self::err_at(
                &t,
                "PAR150",
                format!("式の先頭として解釈できません: {:?}", t.kind),
            )),
        }
    }

    fn parse_int_literal(t: &Token, digits: &str, radix: u32) -> Result<i64, ParseError> {
        i64::from_str_radix(digits, radix).map_err(|_| {
            Self::err_at(t, "PAR141", format!("整数リテラルを解釈できません: {}", t.value))
        })
    }

    /// クォートを除去し、基本的なエスケープのみ解決する。
    fn unescape_string(raw: &str) -> String {
        let inner = &raw[1..raw.len().saturating_sub(1)];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        }
        out
    }
}
