// パス: src/parser/stmt.rs
// 役割: 文レベルの構文解析ルーチンを実装する
// 意図: 制御構造・宣言の解析ロジックを `Parser` 本体から分離し可読性を高める
// 関連ファイル: src/parser/mod.rs, src/parser/expr.rs, src/ast.rs

use super::*;

impl Parser {
    pub(super) fn parse_block_statement(&mut self) -> Result<Node, ParseError> {
        let start = self.pop(TokenKind::LBRACE)?;
        let mut body = Vec::new();
        while self.peek_kind() != TokenKind::RBRACE {
            if self.peek_kind() == TokenKind::EOF {
                let t = self.peek().clone();
                return Err(Self::err_at(&t, "PAR120", "ブロックが閉じていません"));
            }
            body.push(self.parse_statement()?);
        }
        self.pop(TokenKind::RBRACE)?;
        Ok(Node::new(
            NodeKind::BlockStatement { body },
            self.span_from(&start),
        ))
    }

    pub(super) fn parse_statement(&mut self) -> Result<Node, ParseError> {
        match self.peek_kind() {
            TokenKind::LBRACE => self.parse_block_statement(),
            TokenKind::SEMI => {
                let t = self.pop_any();
                Ok(Node::new(NodeKind::EmptyStatement, self.span_from(&t)))
            }
            TokenKind::VAR | TokenKind::LET | TokenKind::CONST => {
                let decl = self.parse_variable_declaration()?;
                self.accept(TokenKind::SEMI);
                Ok(decl)
            }
            TokenKind::RETURN => self.parse_return_statement(),
            TokenKind::IF => self.parse_if_statement(),
            TokenKind::FOR => self.parse_for_statement(),
            TokenKind::WHILE => self.parse_while_statement(),
            TokenKind::DO => self.parse_do_while_statement(),
            TokenKind::BREAK => {
                let t = self.pop_any();
                self.accept(TokenKind::SEMI);
                Ok(Node::new(NodeKind::BreakStatement, self.span_from(&t)))
            }
            TokenKind::CONTINUE => {
                let t = self.pop_any();
                self.accept(TokenKind::SEMI);
                Ok(Node::new(NodeKind::ContinueStatement, self.span_from(&t)))
            }
            TokenKind::DEBUGGER => {
                let t = self.pop_any();
                self.accept(TokenKind::SEMI);
                Ok(Node::new(NodeKind::DebuggerStatement, self.span_from(&t)))
            }
            TokenKind::FUNCTION => self.parse_function_declaration(),
            _ => {
                let start = self.peek().clone();
                let expression = self.parse_expression()?;
                self.accept(TokenKind::SEMI);
                Ok(Node::new(
                    NodeKind::ExpressionStatement {
                        expression: Box::new(expression),
                    },
                    self.span_from(&start),
                ))
            }
        }
    }

    /// `var` / `let` / `const` 宣言。セミコロンは呼び出し側で消費する。
    pub(super) fn parse_variable_declaration(&mut self) -> Result<Node, ParseError> {
        let start = self.pop_any();
        let kind = match start.kind {
            TokenKind::VAR => DeclarationKind::Var,
            TokenKind::LET => DeclarationKind::Let,
            TokenKind::CONST => DeclarationKind::Const,
            _ => {
                return Err(Self::err_at(&start, "PAR121", "変数宣言ではありません"));
            }
        };
        let mut declarations = Vec::new();
        loop {
            let id_tok = self.pop(TokenKind::IDENT)?;
            let init = if self.accept(TokenKind::ASSIGN).is_some() {
                Some(Box::new(self.parse_assignment_expression()?))
            } else {
                None
            };
            let id_span = self.span_from(&id_tok);
            declarations.push(Node::new(
                NodeKind::VariableDeclarator {
                    id: id_tok.value,
                    init,
                },
                id_span,
            ));
            if self.accept(TokenKind::COMMA).is_none() {
                break;
            }
        }
        Ok(Node::new(
            NodeKind::VariableDeclaration { kind, declarations },
            self.span_from(&start),
        ))
    }

    fn parse_return_statement(&mut self) -> Result<Node, ParseError> {
        let start = self.pop(TokenKind::RETURN)?;
        let argument = match self.peek_kind() {
            TokenKind::SEMI | TokenKind::RBRACE | TokenKind::EOF => None,
            _ => Some(Box::new(self.parse_expression()?)),
        };
        self.accept(TokenKind::SEMI);
        Ok(Node::new(
            NodeKind::ReturnStatement { argument },
            self.span_from(&start),
        ))
    }

    fn parse_if_statement(&mut self) -> Result<Node, ParseError> {
        let start = self.pop(TokenKind::IF)?;
        self.pop(TokenKind::LPAREN)?;
        let test = self.parse_expression()?;
        self.pop(TokenKind::RPAREN)?;
        let consequent = self.parse_statement()?;
        let alternate = if self.accept(TokenKind::ELSE).is_some() {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Node::new(
            NodeKind::IfStatement {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            },
            self.span_from(&start),
        ))
    }

    fn parse_for_statement(&mut self) -> Result<Node, ParseError> {
        let start = self.pop(TokenKind::FOR)?;
        self.pop(TokenKind::LPAREN)?;
        let init = match self.peek_kind() {
            TokenKind::SEMI => None,
            TokenKind::VAR | TokenKind::LET | TokenKind::CONST => {
                Some(Box::new(self.parse_variable_declaration()?))
            }
            _ => Some(Box::new(self.parse_expression()?)),
        };
        self.pop(TokenKind::SEMI)?;
        let test = if self.peek_kind() == TokenKind::SEMI {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.pop(TokenKind::SEMI)?;
        let update = if self.peek_kind() == TokenKind::RPAREN {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.pop(TokenKind::RPAREN)?;
        let body = self.parse_statement()?;
        Ok(Node::new(
            NodeKind::ForStatement {
                init,
                test,
                update,
                body: Box::new(body),
            },
            self.span_from(&start),
        ))
    }

    fn parse_while_statement(&mut self) -> Result<Node, ParseError> {
        let start = self.pop(TokenKind::WHILE)?;
        self.pop(TokenKind::LPAREN)?;
        let test = self.parse_expression()?;
        self.pop(TokenKind::RPAREN)?;
        let body = self.parse_statement()?;
        Ok(Node::new(
            NodeKind::WhileStatement {
                test: Box::new(test),
                body: Box::new(body),
            },
            self.span_from(&start),
        ))
    }

    fn parse_do_while_statement(&mut self) -> Result<Node, ParseError> {
        let start = self.pop(TokenKind::DO)?;
        let body = self.parse_statement()?;
        self.pop(TokenKind::WHILE)?;
        self.pop(TokenKind::LPAREN)?;
        let test = self.parse_expression()?;
        self.pop(TokenKind::RPAREN)?;
        self.accept(TokenKind::SEMI);
        Ok(Node::new(
            NodeKind::DoWhileStatement {
                body: Box::new(body),
                test: Box::new(test),
            },
            self.span_from(&start),
        ))
    }
}
