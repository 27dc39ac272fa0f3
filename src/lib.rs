// パス: src/lib.rs
// 役割: Crate root wiring modules and exports
// 意図: Expose minimal API surface for kernel front-end components
// 関連ファイル: src/function_builder.rs, src/function_node.rs, src/translator.rs
//! KernelLang (Rust) ルートモジュール
//!
//! 目的:
//! - 関数→シェーダ変換系のフロントエンド（関数レジストリ・呼び出しグラフ
//!   トレーサ・関数記述子・汎用 AST ディスパッチ骨格）を提供する。
//! - バックエンド（ターゲット言語固有のエミッタ）はフック上書きで差し込む。
//!
//! 方針:
//! - コメント/ドキュメントは日本語、識別子は英語。
//! - パブリックAPIは最小限。

pub mod ast;
pub mod errors;
pub mod function_builder;
pub mod function_node;
pub mod lexer;
pub mod parser;
pub mod translator;
pub mod types;

// 便利な再エクスポート（利用側の典型的な組み立てに必要な型のみ）
pub use crate::errors::{
    ConfigurationError, ErrorInfo, ParseError, StateMismatchError, UnsupportedSyntaxError,
};
pub use crate::function_builder::{
    BuilderError, FunctionBuilder, KernelFunctionSpec, KernelSpec, SubKernelSpec,
};
pub use crate::function_node::{
    ArgumentTypeHints, AstParser, CallSiteArgument, FunctionNode, FunctionNodeSettings,
    FunctionTranslator, RegistryView, RenderContext, TranslateError, ENTRY_FUNCTION_NAME,
};
pub use crate::translator::SourceTranslator;
pub use crate::types::{ConstantValue, VarType};

use std::rc::Rc;

/// カーネル仕様からレジストリを組み立てる（参照トランスレータ使用）。
pub fn build_kernel(spec: &KernelSpec) -> Result<FunctionBuilder, BuilderError> {
    let builder = FunctionBuilder::from_kernel(spec, Rc::new(SourceTranslator))?;
    Ok(builder)
}
