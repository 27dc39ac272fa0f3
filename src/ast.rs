// パス: src/ast.rs
// 役割: カーネル関数サブセットの抽象構文木を定義する
// 意図: ディスパッチ対象のノード種別を閉じた集合として固定する
// 関連ファイル: src/parser/mod.rs, src/function_node.rs, src/translator.rs
//! 抽象構文木（AST）
//!
//! 目的:
//! - 既定パーサおよび外部パーサ能力の双方が生成する中立表現を固定する。
//!
//! 設計ノート:
//! - ノード種別は固定の 27 種で閉じており、`match` の網羅性検査で
//!   「未知ノード種別」を静的に排除する。
//! - 各ノードはラップ済みソースに対するバイト範囲（`Span`）を保持し、
//!   診断用のスニペット復元に使う。

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
/// ラップ済みソース上のバイト範囲と位置情報。
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize, // 1-origin
    pub col: usize,  // 1-origin
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, col: usize) -> Self {
        Self {
            start,
            end,
            line,
            col,
        }
    }

    /// 範囲に対応するソース断片を返す。範囲が不正なら空文字列。
    pub fn slice<'a>(&self, src: &'a str) -> &'a str {
        if self.start <= self.end && self.end <= src.len() {
            &src[self.start..self.end]
        } else {
            ""
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// 種別タグと位置情報を束ねた AST ノード。
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// 元システムの種別タグ名。診断メッセージで使用する。
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::FunctionExpression { .. } => "FunctionExpression",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::LogicalExpression { .. } => "LogicalExpression",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::UpdateExpression { .. } => "UpdateExpression",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::BlockStatement { .. } => "BlockStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::BreakStatement => "BreakStatement",
            NodeKind::ContinueStatement => "ContinueStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::VariableDeclarator { .. } => "VariableDeclarator",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::SequenceExpression { .. } => "SequenceExpression",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::ArrayExpression { .. } => "ArrayExpression",
            NodeKind::DebuggerStatement => "DebuggerStatement",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// ディスパッチ対象のノード種別（閉じた集合）。
pub enum NodeKind {
    FunctionDeclaration {
        name: String,
        params: Vec<String>,
        body: Box<Node>,
    },
    FunctionExpression {
        name: Option<String>,
        params: Vec<String>,
        body: Box<Node>,
    },
    ReturnStatement {
        argument: Option<Box<Node>>,
    },
    Literal {
        value: LiteralValue,
    },
    BinaryExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    UnaryExpression {
        operator: String,
        argument: Box<Node>,
    },
    UpdateExpression {
        operator: String,
        argument: Box<Node>,
        prefix: bool,
    },
    Identifier {
        name: String,
    },
    AssignmentExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    EmptyStatement,
    BlockStatement {
        body: Vec<Node>,
    },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    BreakStatement,
    ContinueStatement,
    ForStatement {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    WhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        body: Box<Node>,
        test: Box<Node>,
    },
    VariableDeclaration {
        kind: DeclarationKind,
        declarations: Vec<Node>,
    },
    VariableDeclarator {
        id: String,
        init: Option<Box<Node>>,
    },
    ThisExpression,
    SequenceExpression {
        expressions: Vec<Node>,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    ArrayExpression {
        elements: Vec<Node>,
    },
    DebuggerStatement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// 変数宣言の種別（`var` / `let` / `const`）。
pub enum DeclarationKind {
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
/// リテラル値。整数と浮動小数を区別して保持する（型推論で参照する）。
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl LiteralValue {
    /// 値がゼロ整数かどうか。コンマ演算子ラッパの判定に使う。
    pub fn is_zero_int(&self) -> bool {
        matches!(self, LiteralValue::Int(0))
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(v) => write!(f, "{v}"),
            LiteralValue::Float(v) => write!(f, "{v}"),
            LiteralValue::Bool(v) => write!(f, "{v}"),
            LiteralValue::Str(v) => write!(f, "\"{v}\""),
        }
    }
}
