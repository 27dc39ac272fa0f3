// パス: src/function_node.rs
// 役割: 関数記述子と汎用 AST ディスパッチ骨格を実装する
// 意図: 1 関数分のソース・メタデータ・変換状態を束ね、バックエンド拡張の契約を固定する
// 関連ファイル: src/function_builder.rs, src/translator.rs, src/ast.rs
//! 関数記述子（FunctionNode）モジュール
//!
//! 目的:
//! - 1 つの関数のソース・引数メタデータ・構文木・変換中状態を保持する。
//! - バックエンドが必要なフックだけを上書きできる汎用ディスパッチ骨格
//!   （`FunctionTranslator`）を提供する。
//!
//! 設計ノート:
//! - 親参照（`parent`）はレジストリのキー文字列であり、所有参照は持たない。
//! - 構文解析は `var <name> = <source>;` へのラップを経由し、結果は 1 度だけ
//!   計算してメモ化する。
//! - 呼び出し元の実引数型を遅延逆伝播する型解決は「最初の呼び出し元が勝つ」
//!   一回限りのキャッシュとして実装する。呼び出し位置ごとの多相化はしない。

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use thiserror::Error;

use crate::ast::{LiteralValue, Node, NodeKind};
use crate::errors::{ConfigurationError, ParseError, StateMismatchError, UnsupportedSyntaxError};
use crate::parser;
use crate::types::{ConstantValue, VarType};

/// ルート関数がレジストリ内で持つ固定名。
pub const ENTRY_FUNCTION_NAME: &str = "kernel";
/// `this` を基底とするメンバ式が展開される予約受け手名。
pub const THIS_RECEIVER_NAME: &str = "this";
/// バックエンドがユーザ引数を出力する際の名前空間接頭辞。
pub const USER_ARGUMENT_PREFIX: &str = "user_";

/// ソーステキストから構文木を生成する能力。既定では内蔵パーサを使う。
pub trait AstParser {
    /// ラップ済みソース（`var <name> = <source>;`）を解析し、
    /// 宣言子の初期化式に当たる関数ノードを返す。
    fn parse(&self, wrapped: &str) -> Result<Node, ParseError>;
}

/// 内蔵の既定パーサ。
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultParser;

impl AstParser for DefaultParser {
    fn parse(&self, wrapped: &str) -> Result<Node, ParseError> {
        parser::parse_wrapped(wrapped)
    }
}

/// メモ化された解析結果。スニペット復元のためラップ済みソースも保持する。
#[derive(Debug)]
pub struct ParsedFunction {
    pub wrapped: String,
    pub root: Node,
}

impl ParsedFunction {
    /// ノードに対応するソース断片を返す。
    pub fn snippet(&self, ast: &Node) -> &str {
        ast.span.slice(&self.wrapped)
    }
}

/// 引数型ヒント。位置指定の配列か、名前キーのマップ（予約キー `returns` は戻り値型）。
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ArgumentTypeHints {
    Positional(Vec<VarType>),
    Named(BTreeMap<String, VarType>),
}

/// 呼び出し位置で観測された 1 実引数の記録。型の逆伝播と名前解決に使う。
#[derive(Clone, Debug, PartialEq)]
pub struct CallSiteArgument {
    pub name: Option<String>,
    pub var_type: VarType,
}

/// 記述子構築時の設定。未指定項目はソースからの抽出・既定値で補う。
#[derive(Clone)]
pub struct FunctionNodeSettings {
    pub name: Option<String>,
    pub is_root_kernel: bool,
    pub is_sub_kernel: bool,
    pub argument_types: Option<ArgumentTypeHints>,
    pub argument_sizes: Vec<Option<Vec<usize>>>,
    pub return_type: Option<VarType>,
    pub constants: BTreeMap<String, ConstantValue>,
    pub constant_types: BTreeMap<String, VarType>,
    pub loop_max_iterations: u32,
    pub debug: bool,
    pub parser: Option<Rc<dyn AstParser>>,
}

impl Default for FunctionNodeSettings {
    fn default() -> Self {
        Self {
            name: None,
            is_root_kernel: false,
            is_sub_kernel: false,
            argument_types: None,
            argument_sizes: Vec::new(),
            return_type: None,
            constants: BTreeMap::new(),
            constant_types: BTreeMap::new(),
            loop_max_iterations: 1000,
            debug: false,
            parser: None,
        }
    }
}

/// 1 関数分の記述子。ソース・メタデータ・解析結果・変換中の共有状態を持つ。
pub struct FunctionNode {
    pub name: String,
    pub source: String,
    pub argument_names: Vec<String>,
    pub argument_types: Vec<Option<VarType>>,
    pub argument_sizes: Vec<Option<Vec<usize>>>,
    return_type: Option<VarType>,
    pub constants: BTreeMap<String, ConstantValue>,
    pub constant_types: BTreeMap<String, VarType>,
    pub declarations: BTreeMap<String, VarType>,
    pub called_functions: Vec<String>,
    pub called_functions_arguments: BTreeMap<String, Vec<Vec<Option<CallSiteArgument>>>>,
    /// 直近にこの記述子をトレースした呼び出し元のキー（所有しない関係）。
    pub parent: Option<String>,
    pub is_root_kernel: bool,
    pub is_sub_kernel: bool,
    pub loop_max_iterations: u32,
    pub debug: bool,
    states: Vec<String>,
    parser: Option<Rc<dyn AstParser>>,
    ast: OnceCell<Rc<ParsedFunction>>,
    pub(crate) rendered: Option<String>,
}

impl fmt::Debug for FunctionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionNode")
            .field("name", &self.name)
            .field("argument_names", &self.argument_names)
            .field("argument_types", &self.argument_types)
            .field("return_type", &self.return_type)
            .field("called_functions", &self.called_functions)
            .field("parent", &self.parent)
            .field("is_root_kernel", &self.is_root_kernel)
            .field("is_sub_kernel", &self.is_sub_kernel)
            .finish_non_exhaustive()
    }
}

/// ソースが関数定義に見えるか（`function` キーワードで始まるか）。
pub fn is_function_source(source: &str) -> bool {
    let trimmed = source.trim_start();
    trimmed.starts_with("function")
        && trimmed["function".len()..]
            .chars()
            .next()
            .map(|c| !c.is_ascii_alphanumeric() && c != '_' && c != '$')
            .unwrap_or(false)
}

/// `function` と `(` の間から関数名を抽出する。無名関数なら `None`。
pub fn function_name_from_source(source: &str) -> Option<String> {
    let trimmed = source.trim_start();
    let rest = trimmed.strip_prefix("function")?;
    let paren = rest.find('(')?;
    let name = rest[..paren].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// 仮引数リストをソーステキストから抽出する。コメントは除去する。
pub fn argument_names_from_source(source: &str) -> Vec<String> {
    let Some(open) = source.find('(') else {
        return Vec::new();
    };
    let Some(close_rel) = source[open..].find(')') else {
        return Vec::new();
    };
    let raw = &source[open + 1..open + close_rel];
    let stripped = strip_comments(raw);
    stripped
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// `/* */` と `//` のコメントを取り除く。仮引数リスト専用の素朴な実装。
fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    loop {
        if let Some(block) = rest.find("/*") {
            let line = rest.find("//");
            if line.map(|l| block < l).unwrap_or(true) {
                out.push_str(&rest[..block]);
                match rest[block..].find("*/") {
                    Some(end) => {
                        rest = &rest[block + end + 2..];
                        continue;
                    }
                    None => break,
                }
            }
        }
        if let Some(line) = rest.find("//") {
            out.push_str(&rest[..line]);
            match rest[line..].find('\n') {
                Some(end) => {
                    rest = &rest[line + end + 1..];
                    continue;
                }
                None => break,
            }
        }
        out.push_str(rest);
        break;
    }
    out
}

impl FunctionNode {
    /// 記述子を構築する。引数名は常にソースから抽出し、型ヒントの長さと照合する。
    pub fn new(
        source: impl Into<String>,
        settings: FunctionNodeSettings,
    ) -> Result<Self, ConfigurationError> {
        let source = source.into();
        if source.trim().is_empty() {
            return Err(ConfigurationError::new(
                "CFG001",
                "関数ソースが空です",
            ));
        }
        if !is_function_source(&source) {
            return Err(ConfigurationError::new(
                "CFG002",
                "ソースが関数定義に見えません（`function` で始まる必要があります）",
            ));
        }

        let name = if settings.is_root_kernel {
            ENTRY_FUNCTION_NAME.to_string()
        } else {
            match settings.name {
                Some(name) => name,
                None => function_name_from_source(&source).unwrap_or_default(),
            }
        };
        if name.is_empty() {
            return Err(ConfigurationError::new(
                "CFG003",
                "関数名を決定できません（無名関数には名前の指定が必要です）",
            ));
        }

        let argument_names = argument_names_from_source(&source);
        let mut return_type = settings.return_type;
        let argument_types = match settings.argument_types {
            None => vec![None; argument_names.len()],
            Some(ArgumentTypeHints::Positional(types)) => {
                if types.len() != argument_names.len() {
                    return Err(ConfigurationError::new(
                        "CFG004",
                        format!(
                            "引数型配列の長さが仮引数の数と一致しません -> ({},{})",
                            types.len(),
                            argument_names.len()
                        ),
                    ));
                }
                types.into_iter().map(Some).collect()
            }
            Some(ArgumentTypeHints::Named(mut map)) => {
                if let Some(returns) = map.remove("returns") {
                    return_type = Some(returns);
                }
                if !map.is_empty() && map.len() != argument_names.len() {
                    return Err(ConfigurationError::new(
                        "CFG004",
                        format!(
                            "引数型マップの項目数が仮引数の数と一致しません -> ({},{})",
                            map.len(),
                            argument_names.len()
                        ),
                    ));
                }
                argument_names
                    .iter()
                    .map(|key| Some(map.get(key).copied().unwrap_or_default()))
                    .collect()
            }
        };

        let mut argument_sizes = settings.argument_sizes;
        argument_sizes.resize(argument_names.len(), None);

        Ok(Self {
            name,
            source,
            argument_names,
            argument_types,
            argument_sizes,
            return_type,
            constants: settings.constants,
            constant_types: settings.constant_types,
            declarations: BTreeMap::new(),
            called_functions: Vec::new(),
            called_functions_arguments: BTreeMap::new(),
            parent: None,
            is_root_kernel: settings.is_root_kernel,
            is_sub_kernel: settings.is_sub_kernel,
            loop_max_iterations: settings.loop_max_iterations,
            debug: settings.debug,
            states: Vec::new(),
            parser: settings.parser,
            ast: OnceCell::new(),
            rendered: None,
        })
    }

    /// 解決済みの戻り値型。未推論なら汎用数値型。
    pub fn return_type(&self) -> VarType {
        self.return_type.unwrap_or_default()
    }

    /// 明示・推論済みの戻り値型。未設定なら `None`（レジストリ照会用）。
    pub fn raw_return_type(&self) -> Option<VarType> {
        self.return_type
    }

    /// 戻り値型を設定する。既に設定済みなら何もしない（最初の推論が勝つ）。
    pub fn set_return_type(&mut self, var_type: VarType) {
        if self.return_type.is_none() {
            self.return_type = Some(var_type);
        }
    }

    /// 名前が定数かどうか。定数マップのキーに存在すれば真（型検査はしない）。
    pub fn is_identifier_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    /// 定数の型タグ。未知の定数は `None`。
    pub fn get_constant_type(&self, constant_name: &str) -> Option<VarType> {
        self.constant_types.get(constant_name).copied()
    }

    /// 仮引数の解決済み型が予約タグ `Input` のときに限り真。
    pub fn is_input(&self, argument_name: &str) -> bool {
        self.argument_names
            .iter()
            .position(|n| n == argument_name)
            .and_then(|idx| self.argument_types.get(idx).copied().flatten())
            == Some(VarType::Input)
    }

    /// 仮引数・宣言の型解決。親がいる場合は呼び出し位置の記録から遅延逆伝播する。
    ///
    /// 逆伝播は一回限りのキャッシュ: 一度解決した型は後続の呼び出し位置が
    /// 異なる型を記録していても再導出しない（最初の呼び出し元が勝つ）。
    pub fn get_argument_type(&mut self, name: &str, parent: Option<&FunctionNode>) -> VarType {
        let Some(idx) = self.argument_names.iter().position(|n| n == name) else {
            return self.declarations.get(name).copied().unwrap_or_default();
        };
        if let Some(ty) = self.argument_types.get(idx).copied().flatten() {
            return ty;
        }
        if let Some(parent) = parent {
            if let Some(records) = parent.called_functions_arguments.get(&self.name) {
                for record in records {
                    if let Some(Some(arg)) = record.get(idx) {
                        self.argument_types[idx] = Some(arg.var_type);
                        return arg.var_type;
                    }
                }
            }
        }
        VarType::default_numeric()
    }

    /// サブカーネル引数に対応するユーザ引数名を親の呼び出し記録から引く。
    /// `Integer` 型の実引数（添字など）は候補から除外する。
    pub fn get_user_argument_name(
        &self,
        name: &str,
        parent: Option<&FunctionNode>,
    ) -> Option<String> {
        let idx = self.argument_names.iter().position(|n| n == name)?;
        if !self.is_sub_kernel {
            return None;
        }
        let records = parent?.called_functions_arguments.get(&self.name)?;
        for record in records {
            if let Some(Some(arg)) = record.get(idx) {
                if arg.var_type != VarType::Integer {
                    return arg.name.clone();
                }
            }
        }
        None
    }

    /// 呼び出し先として発見した関数名を記録する（重複許容）。
    pub fn record_called_function(&mut self, callee: impl Into<String>) {
        self.called_functions.push(callee.into());
    }

    /// 呼び出し位置の実引数型の記録を追加する。
    pub fn record_call_arguments(
        &mut self,
        callee: &str,
        record: Vec<Option<CallSiteArgument>>,
    ) {
        self.called_functions_arguments
            .entry(callee.to_string())
            .or_default()
            .push(record);
    }

    /// ローカル宣言の型を登録する。
    pub fn add_declaration(&mut self, name: impl Into<String>, var_type: VarType) {
        self.declarations.insert(name.into(), var_type);
    }

    /// 変換コンテキスト状態を積む。
    pub fn push_state(&mut self, state: impl Into<String>) {
        self.states.push(state.into());
    }

    /// 先頭の状態を取り除く。先頭と一致しない pop はエラー。
    pub fn pop_state(&mut self, state: &str) -> Result<(), StateMismatchError> {
        if self.state() != Some(state) {
            return Err(StateMismatchError::new(
                "STA300",
                format!(
                    "状態 {:?} を pop できません（現在の状態は {:?}）",
                    state,
                    self.state().unwrap_or("none")
                ),
            ));
        }
        self.states.pop();
        Ok(())
    }

    /// 現在の状態が指定値かどうか。
    pub fn is_state(&self, state: &str) -> bool {
        self.state() == Some(state)
    }

    /// 状態スタックの先頭。空なら `None`。
    pub fn state(&self) -> Option<&str> {
        self.states.last().map(String::as_str)
    }

    /// 描画完了時に状態スタックが空であることを検査する。
    /// 残留状態はフック実装の push/pop 不均衡を意味するため黙殺しない。
    pub(crate) fn assert_states_drained(&self) -> Result<(), StateMismatchError> {
        if let Some(state) = self.state() {
            return Err(StateMismatchError::new(
                "STA301",
                format!("描画終了後に状態 {:?} が残っています", state),
            ));
        }
        Ok(())
    }

    /// ソースを解析し構文木を返す。結果は記述子ごとに 1 度だけ計算されメモ化される。
    pub fn ast(&self) -> Result<Rc<ParsedFunction>, ParseError> {
        if let Some(parsed) = self.ast.get() {
            return Ok(parsed.clone());
        }
        let wrapped = format!("var {} = {};", self.name, self.source);
        let root = match &self.parser {
            Some(parser) => parser.parse(&wrapped)?,
            None => DefaultParser.parse(&wrapped)?,
        };
        let parsed = Rc::new(ParsedFunction { wrapped, root });
        // 競合は起こらない（単一スレッド・直列評価）が、set の失敗は無視してよい
        let _ = self.ast.set(parsed.clone());
        Ok(parsed)
    }

    /// ノード位置情報つきの構文エラーを生成する。スニペットを必ず添付する。
    pub fn ast_error(
        &self,
        parsed: &ParsedFunction,
        ast: &Node,
        msg: impl Into<String>,
    ) -> UnsupportedSyntaxError {
        UnsupportedSyntaxError::at_with_snippet(
            "SYN200",
            msg,
            Some(ast.span.start),
            Some(ast.span.line),
            Some(ast.span.col),
            parsed.snippet(ast).to_string(),
        )
    }

    /// メンバ式の連鎖をドット区切りの名前へ展開する。
    ///
    /// 特例は 2 つ: `this` 基底は予約受け手名へ、先頭がゼロリテラルの
    /// 2 要素コンマ式はゼロを捨てて第 2 要素へ再帰する（source-to-source
    /// 変換が式をコンマ演算子で包む痕跡への対応）。
    pub fn ast_member_expression_unroll(
        &self,
        parsed: &ParsedFunction,
        ast: &Node,
    ) -> Result<String, UnsupportedSyntaxError> {
        match &ast.kind {
            NodeKind::Identifier { name } => Ok(name.clone()),
            NodeKind::ThisExpression => Ok(THIS_RECEIVER_NAME.to_string()),
            NodeKind::MemberExpression {
                object, property, ..
            } => {
                let object = self.ast_member_expression_unroll(parsed, object)?;
                let property = self.ast_member_expression_unroll(parsed, property)?;
                Ok(format!("{}.{}", object, property))
            }
            NodeKind::SequenceExpression { expressions } if expressions.len() == 2 => {
                match &expressions[0].kind {
                    NodeKind::Literal { value } if value.is_zero_int() => {
                        self.ast_member_expression_unroll(parsed, &expressions[1])
                    }
                    _ => Err(self.ast_error(parsed, ast, "メンバ式を展開できません")),
                }
            }
            _ => Err(self.ast_error(parsed, ast, "メンバ式を展開できません")),
        }
    }
}

/// 描画中にフックから発生しうるエラー。レジストリ側で関数名つきに包み直す。
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Syntax(#[from] UnsupportedSyntaxError),
    #[error(transparent)]
    State(#[from] StateMismatchError),
}

/// レジストリの読み取りビュー。描画中の記述子から親・戻り値型を参照するために使う。
pub trait RegistryView {
    fn function(&self, name: &str) -> Option<&FunctionNode>;
    fn lookup_return_type(&self, name: &str) -> Option<VarType>;
}

/// 1 回の描画に対する可変コンテキスト。
///
/// ネスト関数の発見はここへのイベント追記としてモデル化する。レジストリは
/// 描画完了後にキューを回収して upsert する（共有可変グローバルは使わない）。
pub struct RenderContext<'a> {
    pub node: &'a mut FunctionNode,
    pub parsed: Rc<ParsedFunction>,
    registry: Option<&'a dyn RegistryView>,
    discovered: Vec<String>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        node: &'a mut FunctionNode,
        parsed: Rc<ParsedFunction>,
        registry: Option<&'a dyn RegistryView>,
    ) -> Self {
        Self {
            node,
            parsed,
            registry,
            discovered: Vec::new(),
        }
    }

    /// ノードに対応するソース断片。
    pub fn source_of(&self, ast: &Node) -> &str {
        self.parsed.snippet(ast)
    }

    /// この描画のルートノードかどうか。
    pub fn is_root_node(&self, ast: &Node) -> bool {
        ast.span == self.parsed.root.span
    }

    /// ネスト関数宣言の発見イベントを積む。
    pub fn discover_nested_function(&mut self, source: impl Into<String>) {
        self.discovered.push(source.into());
    }

    /// 積まれた発見イベントを取り出す（レジストリ回収用）。
    pub fn take_discovered(&mut self) -> Vec<String> {
        std::mem::take(&mut self.discovered)
    }

    /// 仮引数・宣言の型解決。親記述子はレジストリ経由で遅延解決する。
    pub fn argument_type(&mut self, name: &str) -> VarType {
        let parent_name = self.node.parent.clone();
        let parent = parent_name
            .as_deref()
            .and_then(|p| self.registry.and_then(|r| r.function(p)));
        self.node.get_argument_type(name, parent)
    }

    /// 他関数の戻り値型をレジストリへ照会する。
    pub fn lookup_return_type(&self, name: &str) -> Option<VarType> {
        self.registry.and_then(|r| r.lookup_return_type(name))
    }

    /// メンバ式連鎖の展開（記述子実装への委譲）。
    pub fn member_expression_unroll(
        &self,
        ast: &Node,
    ) -> Result<String, UnsupportedSyntaxError> {
        self.node.ast_member_expression_unroll(&self.parsed, ast)
    }

    /// ノード位置情報つきの構文エラーを生成する。
    pub fn error(&self, ast: &Node, msg: impl Into<String>) -> UnsupportedSyntaxError {
        self.node.ast_error(&self.parsed, ast, msg)
    }
}

/// 汎用 AST ディスパッチ骨格。
///
/// `ast_generic` はノード種別ごとに名前付きフックへ振り分ける全域関数で、
/// 既定フックは何もしない素通し。具象バックエンドは必要なフックだけを
/// 上書きする。ノード種別は閉じた enum のため「未知種別」は静的に排除される。
pub trait FunctionTranslator {
    /// 種別ディスパッチ。`match` の網羅性でフック対応の抜けを防ぐ。
    fn ast_generic(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        match &ast.kind {
            NodeKind::FunctionDeclaration { .. } => self.ast_function_declaration(ctx, ast, out),
            NodeKind::FunctionExpression { .. } => self.ast_function_expression(ctx, ast, out),
            NodeKind::ReturnStatement { .. } => self.ast_return_statement(ctx, ast, out),
            NodeKind::Literal { .. } => self.ast_literal(ctx, ast, out),
            NodeKind::BinaryExpression { .. } => self.ast_binary_expression(ctx, ast, out),
            NodeKind::LogicalExpression { .. } => self.ast_logical_expression(ctx, ast, out),
            NodeKind::UnaryExpression { .. } => self.ast_unary_expression(ctx, ast, out),
            NodeKind::UpdateExpression { .. } => self.ast_update_expression(ctx, ast, out),
            NodeKind::Identifier { .. } => self.ast_identifier_expression(ctx, ast, out),
            NodeKind::AssignmentExpression { .. } => self.ast_assignment_expression(ctx, ast, out),
            NodeKind::ExpressionStatement { .. } => self.ast_expression_statement(ctx, ast, out),
            NodeKind::EmptyStatement => self.ast_empty_statement(ctx, ast, out),
            NodeKind::BlockStatement { .. } => self.ast_block_statement(ctx, ast, out),
            NodeKind::IfStatement { .. } => self.ast_if_statement(ctx, ast, out),
            NodeKind::BreakStatement => self.ast_break_statement(ctx, ast, out),
            NodeKind::ContinueStatement => self.ast_continue_statement(ctx, ast, out),
            NodeKind::ForStatement { .. } => self.ast_for_statement(ctx, ast, out),
            NodeKind::WhileStatement { .. } => self.ast_while_statement(ctx, ast, out),
            NodeKind::DoWhileStatement { .. } => self.ast_do_while_statement(ctx, ast, out),
            NodeKind::VariableDeclaration { .. } => self.ast_variable_declaration(ctx, ast, out),
            NodeKind::VariableDeclarator { .. } => self.ast_variable_declarator(ctx, ast, out),
            NodeKind::ThisExpression => self.ast_this_expression(ctx, ast, out),
            NodeKind::SequenceExpression { .. } => self.ast_sequence_expression(ctx, ast, out),
            NodeKind::MemberExpression { .. } => self.ast_member_expression(ctx, ast, out),
            NodeKind::CallExpression { .. } => self.ast_call_expression(ctx, ast, out),
            NodeKind::ArrayExpression { .. } => self.ast_array_expression(ctx, ast, out),
            NodeKind::DebuggerStatement => self.ast_debugger_statement(ctx, ast, out),
        }
    }

    /// ノード列の各要素を順にディスパッチする。
    fn ast_generic_list(
        &self,
        ctx: &mut RenderContext<'_>,
        nodes: &[Node],
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        for node in nodes {
            self.ast_generic(ctx, node, out)?;
        }
        Ok(())
    }

    /// ネスト関数宣言。発見イベントを登録側へ回す（走査はしない）。
    fn ast_function_declaration(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let source = ctx.source_of(ast).to_string();
        ctx.discover_nested_function(source);
        Ok(())
    }

    fn ast_function_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_return_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_literal(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_binary_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_logical_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_unary_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_update_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_identifier_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_assignment_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_expression_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_empty_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_block_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_if_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_break_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_continue_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_for_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_while_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_do_while_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_variable_declaration(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_variable_declarator(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_this_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_sequence_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_member_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_call_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_array_expression(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    fn ast_debugger_statement(
        &self,
        _ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        Ok(())
    }

    /// ユーザ引数を出力へ積む。必要なら予約接頭辞で名前空間化する。
    fn push_parameter(&self, out: &mut Vec<String>, name: &str) {
        out.push(format!("{}{}", USER_ARGUMENT_PREFIX, name));
    }
}

/// リテラルから素朴に導出した型タグ。フック実装の共通ヘルパ。
pub fn literal_type(value: &LiteralValue) -> Option<VarType> {
    match value {
        LiteralValue::Int(_) => Some(VarType::Integer),
        LiteralValue::Float(_) => Some(VarType::Number),
        LiteralValue::Bool(_) => Some(VarType::Boolean),
        LiteralValue::Str(_) => None,
    }
}
