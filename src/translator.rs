// パス: src/translator.rs
// 役割: 骨格フックの参照実装（ソース素通し + 意味解析）を提供する
// 意図: 呼び出し記録・宣言型登録・戻り値型推論という描画の副作用契約を 1 箇所で定義する
// 関連ファイル: src/function_node.rs, src/function_builder.rs, tests/type_inference.rs
//! 参照トランスレータ
//!
//! 目的:
//! - 構文木を全走査して呼び出し関係・呼び出し位置の実引数型・ローカル宣言型・
//!   戻り値型を記述子へ記録する。
//! - 出力テキストは関数ソースの素通し。ターゲット言語固有の整形は具象
//!   バックエンドの責務であり、ここでは意味解析の副作用だけを確定させる。
//!
//! 設計ノート:
//! - ループ本体の走査中は状態 `loop-body` を積む。バックエンドが反復上限の
//!   挿入位置を判定するための観測点で、ここでは積み降ろしの均衡だけを保証する。

use crate::ast::{Node, NodeKind};
use crate::function_node::{
    literal_type, CallSiteArgument, FunctionTranslator, RenderContext, TranslateError,
    THIS_RECEIVER_NAME,
};
use crate::types::VarType;

/// ループ本体走査中を表す状態名。
pub const STATE_LOOP_BODY: &str = "loop-body";

/// 定数参照のメンバパス接頭辞（`this.constants.<name>`）。
const CONSTANTS_PATH_PREFIX: &str = "this.constants.";

/// ソース素通しの参照トランスレータ。
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceTranslator;

impl SourceTranslator {
    /// 式の型を素朴に推論する。確定できない式は `None`。
    ///
    /// 識別子は定数 → 仮引数・宣言の順で解決し、呼び出し式は呼び出し先の
    /// 戻り値型をレジストリへ照会する（呼び出し境界を跨ぐ遅延推論）。
    fn infer_expression_type(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
    ) -> Option<VarType> {
        match &ast.kind {
            NodeKind::Literal { value } => literal_type(value),
            NodeKind::Identifier { name } => {
                if ctx.node.is_identifier_constant(name) {
                    return ctx
                        .node
                        .get_constant_type(name)
                        .or_else(|| ctx.node.constants.get(name).map(|v| v.inferred_type()));
                }
                Some(ctx.argument_type(name))
            }
            NodeKind::CallExpression { callee, .. } => {
                let unrolled = ctx.member_expression_unroll(callee).ok()?;
                let callee_name = strip_this_receiver(&unrolled);
                ctx.lookup_return_type(callee_name)
            }
            NodeKind::BinaryExpression {
                operator,
                left,
                right,
            } => {
                if is_comparison_operator(operator) {
                    return Some(VarType::Boolean);
                }
                let left = self.infer_expression_type(ctx, left);
                let right = self.infer_expression_type(ctx, right);
                join_numeric(left, right)
            }
            NodeKind::LogicalExpression { .. } => Some(VarType::Boolean),
            NodeKind::UnaryExpression { operator, argument } => {
                if operator == "!" {
                    Some(VarType::Boolean)
                } else {
                    self.infer_expression_type(ctx, argument)
                }
            }
            NodeKind::UpdateExpression { argument, .. } => {
                self.infer_expression_type(ctx, argument)
            }
            NodeKind::AssignmentExpression { right, .. } => {
                self.infer_expression_type(ctx, right)
            }
            NodeKind::SequenceExpression { expressions } => expressions
                .last()
                .and_then(|last| self.infer_expression_type(ctx, last)),
            NodeKind::MemberExpression { computed, .. } => {
                if *computed {
                    // 添字アクセス。配列要素の読み出しは汎用数値型とみなす
                    return Some(VarType::Number);
                }
                let path = ctx.member_expression_unroll(ast).ok()?;
                if let Some(constant) = path.strip_prefix(CONSTANTS_PATH_PREFIX) {
                    return ctx
                        .node
                        .get_constant_type(constant)
                        .or_else(|| ctx.node.constants.get(constant).map(|v| v.inferred_type()));
                }
                if path.starts_with("this.thread") || path.starts_with("this.output") {
                    // スレッド座標・出力寸法は常に整数
                    return Some(VarType::Integer);
                }
                None
            }
            NodeKind::ArrayExpression { .. } => Some(VarType::Array),
            _ => None,
        }
    }

    /// 呼び出し位置の実引数 1 つ分の記録を作る。
    ///
    /// 識別子は名前つきで記録し、呼び出し先のユーザ引数名解決に使えるようにする。
    /// 型を確定できない式は `None`（位置は保存される）。
    fn call_site_argument(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
    ) -> Option<CallSiteArgument> {
        if let NodeKind::Identifier { name } = &ast.kind {
            let var_type = ctx.argument_type(name);
            return Some(CallSiteArgument {
                name: Some(name.clone()),
                var_type,
            });
        }
        self.infer_expression_type(ctx, ast)
            .map(|var_type| CallSiteArgument {
                name: None,
                var_type,
            })
    }
}

/// `this.` 経由の呼び出しから受け手を外して素の関数名に揃える。
fn strip_this_receiver(unrolled: &str) -> &str {
    unrolled
        .strip_prefix(THIS_RECEIVER_NAME)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(unrolled)
}

/// 比較演算子かどうか。
fn is_comparison_operator(op: &str) -> bool {
    matches!(op, "==" | "===" | "!=" | "!==" | "<" | "<=" | ">" | ">=")
}

/// 数値型の合成。両方整数なら整数、片方でも型が取れれば汎用数値。
fn join_numeric(left: Option<VarType>, right: Option<VarType>) -> Option<VarType> {
    match (left, right) {
        (Some(VarType::Integer), Some(VarType::Integer)) => Some(VarType::Integer),
        (Some(_), _) | (_, Some(_)) => Some(VarType::Number),
        (None, None) => None,
    }
}

impl FunctionTranslator for SourceTranslator {
    /// 関数式。本体を走査して副作用を確定させ、描画ルートならソースを素通しで出力する。
    fn ast_function_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::FunctionExpression { body, .. } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic(ctx, body, out)?;
        if ctx.is_root_node(ast) {
            out.push(ctx.node.source.clone());
        }
        Ok(())
    }

    fn ast_return_statement(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::ReturnStatement { argument } = &ast.kind else {
            return Ok(());
        };
        let Some(argument) = argument.as_deref() else {
            return Ok(());
        };
        self.ast_generic(ctx, argument, out)?;
        if let Some(var_type) = self.infer_expression_type(ctx, argument) {
            ctx.node.set_return_type(var_type);
        }
        Ok(())
    }

    fn ast_block_statement(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::BlockStatement { body } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic_list(ctx, body, out)
    }

    fn ast_expression_statement(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::ExpressionStatement { expression } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic(ctx, expression, out)
    }

    fn ast_if_statement(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::IfStatement {
            test,
            consequent,
            alternate,
        } = &ast.kind
        else {
            return Ok(());
        };
        self.ast_generic(ctx, test, out)?;
        self.ast_generic(ctx, consequent, out)?;
        if let Some(alternate) = alternate.as_deref() {
            self.ast_generic(ctx, alternate, out)?;
        }
        Ok(())
    }

    fn ast_for_statement(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::ForStatement {
            init,
            test,
            update,
            body,
        } = &ast.kind
        else {
            return Ok(());
        };
        if let Some(init) = init.as_deref() {
            self.ast_generic(ctx, init, out)?;
        }
        if let Some(test) = test.as_deref() {
            self.ast_generic(ctx, test, out)?;
        }
        if let Some(update) = update.as_deref() {
            self.ast_generic(ctx, update, out)?;
        }
        ctx.node.push_state(STATE_LOOP_BODY);
        self.ast_generic(ctx, body, out)?;
        ctx.node.pop_state(STATE_LOOP_BODY)?;
        Ok(())
    }

    fn ast_while_statement(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::WhileStatement { test, body } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic(ctx, test, out)?;
        ctx.node.push_state(STATE_LOOP_BODY);
        self.ast_generic(ctx, body, out)?;
        ctx.node.pop_state(STATE_LOOP_BODY)?;
        Ok(())
    }

    fn ast_do_while_statement(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::DoWhileStatement { body, test } = &ast.kind else {
            return Ok(());
        };
        ctx.node.push_state(STATE_LOOP_BODY);
        self.ast_generic(ctx, body, out)?;
        ctx.node.pop_state(STATE_LOOP_BODY)?;
        self.ast_generic(ctx, test, out)
    }

    fn ast_variable_declaration(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::VariableDeclaration { declarations, .. } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic_list(ctx, declarations, out)
    }

    /// 宣言子。初期化式から型を推論してローカル宣言表へ登録する。
    fn ast_variable_declarator(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::VariableDeclarator { id, init } = &ast.kind else {
            return Ok(());
        };
        let mut var_type = VarType::default_numeric();
        if let Some(init) = init.as_deref() {
            self.ast_generic(ctx, init, out)?;
            if let Some(inferred) = self.infer_expression_type(ctx, init) {
                var_type = inferred;
            }
        }
        ctx.node.add_declaration(id.clone(), var_type);
        Ok(())
    }

    fn ast_binary_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::BinaryExpression { left, right, .. } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic(ctx, left, out)?;
        self.ast_generic(ctx, right, out)
    }

    fn ast_logical_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::LogicalExpression { left, right, .. } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic(ctx, left, out)?;
        self.ast_generic(ctx, right, out)
    }

    fn ast_assignment_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::AssignmentExpression { left, right, .. } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic(ctx, left, out)?;
        self.ast_generic(ctx, right, out)
    }

    fn ast_unary_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::UnaryExpression { argument, .. } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic(ctx, argument, out)
    }

    fn ast_update_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::UpdateExpression { argument, .. } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic(ctx, argument, out)
    }

    fn ast_sequence_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::SequenceExpression { expressions } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic_list(ctx, expressions, out)
    }

    fn ast_member_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::MemberExpression {
            object,
            property,
            computed,
        } = &ast.kind
        else {
            return Ok(());
        };
        self.ast_generic(ctx, object, out)?;
        // 非計算プロパティ名は変数参照ではないため走査しない
        if *computed {
            self.ast_generic(ctx, property, out)?;
        }
        Ok(())
    }

    /// 呼び出し式。呼び出し先の記録と実引数型の記録という 2 つの副作用を確定させる。
    fn ast_call_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::CallExpression { callee, arguments } = &ast.kind else {
            return Ok(());
        };
        let unrolled = ctx.member_expression_unroll(callee)?;
        let callee_name = strip_this_receiver(&unrolled).to_string();
        ctx.node.record_called_function(callee_name.clone());
        let mut record = Vec::with_capacity(arguments.len());
        for argument in arguments {
            record.push(self.call_site_argument(ctx, argument));
        }
        self.ast_generic_list(ctx, arguments, out)?;
        ctx.node.record_call_arguments(&callee_name, record);
        Ok(())
    }

    fn ast_array_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::ArrayExpression { elements } = &ast.kind else {
            return Ok(());
        };
        self.ast_generic_list(ctx, elements, out)
    }
}
