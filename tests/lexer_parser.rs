// パス: tests/lexer_parser.rs
// 役割: Lexer と parser の基本〜境界テストを一本化
// 意図: 字句解析と構文解析の重要ケースをシンプルに網羅する
// 関連ファイル: src/lexer.rs, src/parser/mod.rs, tests/function_node.rs
use kernellang::ast::{DeclarationKind, LiteralValue, Node, NodeKind};
use kernellang::lexer::{self, TokenKind};
use kernellang::parser;

fn assert_token_presence(tokens: &[lexer::Token], kinds: &[TokenKind], note: &str) {
    for kind in kinds {
        assert!(
            tokens.iter().any(|t| &t.kind == kind),
            "{note}: expected token {:?}",
            kind
        );
    }
}

fn parse(source: &str) -> Node {
    let wrapped = format!("var kernel = {};", source);
    parser::parse_wrapped(&wrapped).expect("parse wrapped")
}

/// ラップ済みソースから関数本体の文リストを取り出す。
fn body_statements(root: &Node) -> Vec<Node> {
    let NodeKind::FunctionExpression { body, .. } = &root.kind else {
        panic!("root is not a function expression: {:?}", root.kind_name());
    };
    let NodeKind::BlockStatement { body } = &body.kind else {
        panic!("function body is not a block");
    };
    body.clone()
}

#[test]
/// 代表的な字句パターンをテーブル駆動で検証する。
fn lexer_happy_paths() {
    #[derive(Clone)]
    struct Case<'a> {
        src: &'a str,
        kinds: &'a [TokenKind],
        note: &'a str,
    }

    let cases = [
        Case {
            src: "var x = 0xFF; if (true) { return 0b101; }",
            kinds: &[
                TokenKind::VAR,
                TokenKind::HEX,
                TokenKind::TRUE,
                TokenKind::BIN,
                TokenKind::RETURN,
            ],
            note: "キーワードと基数付き整数",
        },
        Case {
            src: "// comment\nlet s = \"a\\n\\\"\"; /* block */ s += 'b';",
            kinds: &[
                TokenKind::LET,
                TokenKind::STRING,
                TokenKind::PLUSASSIGN,
            ],
            note: "コメント + 文字列（両クォート）",
        },
        Case {
            src: "a === b !== c >>> 2 << 1 && !d || ++e",
            kinds: &[
                TokenKind::SEQ,
                TokenKind::SNE,
                TokenKind::USHR,
                TokenKind::SHL,
                TokenKind::ANDAND,
                TokenKind::NOT,
                TokenKind::OROR,
                TokenKind::INC,
            ],
            note: "最長一致の記号列",
        },
        Case {
            src: "1.5 2e3 0o17 this.thread.x",
            kinds: &[
                TokenKind::FLOAT,
                TokenKind::OCT,
                TokenKind::THIS,
                TokenKind::DOT,
                TokenKind::IDENT,
            ],
            note: "数値の変種とメンバ参照",
        },
    ];

    for case in &cases {
        let tokens = lexer::lex(case.src).expect("lex");
        assert_token_presence(&tokens, case.kinds, case.note);
        assert_eq!(
            tokens.last().map(|t| t.kind),
            Some(TokenKind::EOF),
            "{}: 末尾は EOF",
            case.note
        );
    }
}

#[test]
/// 指数表記は符号つきでも 1 トークンの浮動小数になる。
fn lexer_exponent_forms() {
    for src in ["1e9", "1.5e-3", "2E+4"] {
        let tokens = lexer::lex(src).expect("lex");
        assert_eq!(tokens[0].kind, TokenKind::FLOAT, "src={src}");
        assert_eq!(tokens[0].value, src);
    }
    // 指数部が欠ける場合は整数 + 識別子として読む
    let tokens = lexer::lex("12e").expect("lex");
    assert_eq!(tokens[0].kind, TokenKind::INT);
    assert_eq!(tokens[1].kind, TokenKind::IDENT);
}

#[test]
/// 字句エラーはコードと位置つきで報告される。
fn lexer_error_cases() {
    let cases = [
        ("/* never closed", "LEX001"),
        ("\"never closed", "LEX003"),
        ("0x", "LEX010"),
        ("0o9", "LEX011"),
        ("0b2", "LEX012"),
        ("#", "LEX090"),
    ];
    for (src, code) in cases {
        let err = lexer::lex(src).expect_err(src);
        assert_eq!(err.0.code, code, "src={src}");
        assert!(err.0.line.is_some(), "src={src}: 行情報が必要");
    }
}

#[test]
/// トークンは 1-origin の行・列とバイト位置を持つ。
fn lexer_positions_are_1_origin() {
    let tokens = lexer::lex("a\n  b").expect("lex");
    assert_eq!((tokens[0].line, tokens[0].col, tokens[0].pos), (1, 1, 0));
    assert_eq!((tokens[1].line, tokens[1].col, tokens[1].pos), (2, 3, 4));
}

#[test]
/// ラップ形式の解析はルートに関数式を返す。
fn parse_wrapped_returns_function_expression() {
    let root = parse("function kernel(v1, v2) { return v1 + v2; }");
    let NodeKind::FunctionExpression { name, params, .. } = &root.kind else {
        panic!("unexpected root: {}", root.kind_name());
    };
    assert_eq!(name.as_deref(), Some("kernel"));
    assert_eq!(params, &["v1".to_string(), "v2".to_string()]);
}

#[test]
/// 無名関数式もラップ形式で受理する。
fn parse_wrapped_accepts_anonymous_function() {
    let root = parse("function (x) { return x; }");
    let NodeKind::FunctionExpression { name, .. } = &root.kind else {
        panic!("unexpected root: {}", root.kind_name());
    };
    assert!(name.is_none());
}

#[test]
/// 文の種別が一通りディスパッチ可能な形で構築される。
fn parse_statement_kinds() {
    let statements = body_statements(&parse(
        "function f() {\n\
         var a = 1, b = 2.5;\n\
         if (a < b) { a = b; } else { b = a; }\n\
         for (var i = 0; i < 4; i++) { continue; }\n\
         while (a > 0) { break; }\n\
         do { a--; } while (false);\n\
         ;\n\
         debugger;\n\
         return a;\n\
         }",
    ));
    let kinds: Vec<&str> = statements.iter().map(|s| s.kind_name()).collect();
    assert_eq!(
        kinds,
        [
            "VariableDeclaration",
            "IfStatement",
            "ForStatement",
            "WhileStatement",
            "DoWhileStatement",
            "EmptyStatement",
            "DebuggerStatement",
            "ReturnStatement",
        ]
    );
    let NodeKind::VariableDeclaration {
        kind, declarations, ..
    } = &statements[0].kind
    else {
        panic!("first statement is not a declaration");
    };
    assert_eq!(*kind, DeclarationKind::Var);
    assert_eq!(declarations.len(), 2);
}

#[test]
/// 乗算は加算より強く結合する。
fn parse_precedence_mul_over_add() {
    let statements = body_statements(&parse("function f() { return 1 + 2 * 3; }"));
    let NodeKind::ReturnStatement {
        argument: Some(sum),
    } = &statements[0].kind
    else {
        panic!("return argument missing");
    };
    let NodeKind::BinaryExpression {
        operator, right, ..
    } = &sum.kind
    else {
        panic!("not a binary expression");
    };
    assert_eq!(operator, "+");
    let NodeKind::BinaryExpression { operator, .. } = &right.kind else {
        panic!("right operand is not a product");
    };
    assert_eq!(operator, "*");
}

#[test]
/// 論理演算は専用のノード種別になり、比較より弱く結合する。
fn parse_logical_vs_binary_nodes() {
    let statements = body_statements(&parse("function f() { return a < b && c; }"));
    let NodeKind::ReturnStatement {
        argument: Some(expr),
    } = &statements[0].kind
    else {
        panic!("return argument missing");
    };
    let NodeKind::LogicalExpression { operator, left, .. } = &expr.kind else {
        panic!("not a logical expression: {}", expr.kind_name());
    };
    assert_eq!(operator, "&&");
    assert_eq!(left.kind_name(), "BinaryExpression");
}

#[test]
/// メンバ・添字・呼び出しの連鎖を左結合で構築する。
fn parse_member_call_chain() {
    let statements = body_statements(&parse("function f() { return this.color(a[0], 1.5); }"));
    let NodeKind::ReturnStatement {
        argument: Some(call),
    } = &statements[0].kind
    else {
        panic!("return argument missing");
    };
    let NodeKind::CallExpression { callee, arguments } = &call.kind else {
        panic!("not a call: {}", call.kind_name());
    };
    assert_eq!(arguments.len(), 2);
    let NodeKind::MemberExpression {
        object, computed, ..
    } = &callee.kind
    else {
        panic!("callee is not a member expression");
    };
    assert!(!computed);
    assert_eq!(object.kind_name(), "ThisExpression");
    let NodeKind::MemberExpression { computed, .. } = &arguments[0].kind else {
        panic!("first argument is not an index access");
    };
    assert!(computed);
    assert_eq!(
        arguments[1].kind,
        NodeKind::Literal {
            value: LiteralValue::Float(1.5)
        }
    );
}

#[test]
/// コンマ式は SequenceExpression として保存される。
fn parse_sequence_expression() {
    let statements = body_statements(&parse("function f() { return (0, a.b); }"));
    let NodeKind::ReturnStatement {
        argument: Some(seq),
    } = &statements[0].kind
    else {
        panic!("return argument missing");
    };
    let NodeKind::SequenceExpression { expressions } = &seq.kind else {
        panic!("not a sequence: {}", seq.kind_name());
    };
    assert_eq!(expressions.len(), 2);
}

#[test]
/// 構文エラーはコードつきで報告される。
fn parser_error_cases() {
    let cases = [
        ("var kernel = function f() { return 1; } trailing;", "PAR110"),
        ("var kernel = function f() { return 1;", "PAR120"),
        ("var kernel = function f() { 1 = 2; };", "PAR130"),
        ("var kernel = function f() { return ); };", "PAR150"),
        ("var kernel = 42;", "PAR100"),
    ];
    for (src, code) in cases {
        let err = parser::parse_wrapped(src).expect_err(src);
        assert_eq!(err.0.code, code, "src={src}");
    }
}

#[test]
/// 基数付き整数リテラルは値へ正規化される。
fn parse_radix_literals() {
    let statements = body_statements(&parse("function f() { return 0xFF + 0o17 + 0b101; }"));
    let NodeKind::ReturnStatement {
        argument: Some(expr),
    } = &statements[0].kind
    else {
        panic!("return argument missing");
    };
    fn literal_ints(node: &Node, out: &mut Vec<i64>) {
        match &node.kind {
            NodeKind::Literal {
                value: LiteralValue::Int(v),
            } => out.push(*v),
            NodeKind::BinaryExpression { left, right, .. } => {
                literal_ints(left, out);
                literal_ints(right, out);
            }
            _ => {}
        }
    }
    let mut values = Vec::new();
    literal_ints(expr, &mut values);
    assert_eq!(values, [255, 15, 5]);
}
