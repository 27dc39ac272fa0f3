// パス: tests/function_builder.rs
// 役割: レジストリ構築・呼び出しグラフトレース・出力収集のテスト
// 意図: 重複排除・循環解決・ネイティブフォールバック・ネスト発見の契約を固定する
// 関連ファイル: src/function_builder.rs, tests/type_inference.rs
#[path = "test_support.rs"]
mod support;

use std::rc::Rc;

use kernellang::ast::{Node, NodeKind};
use kernellang::{
    FunctionBuilder, FunctionTranslator, KernelSpec, RenderContext, SourceTranslator,
    SubKernelSpec, TranslateError, VarType,
};
use support::{make_named_node, BuilderFixture};

#[test]
/// 仕様からの構築: ルートは固定名で登録され、補助・サブカーネルも登録される。
fn from_kernel_registers_all_functions() {
    let mut spec = KernelSpec::new("function (v) { return addOne(v); }");
    spec.functions.push(kernellang::KernelFunctionSpec {
        source: "function addOne(n) { return n + 1; }".to_string(),
        name: None,
        argument_types: None,
        return_type: None,
    });
    spec.sub_kernels.push(SubKernelSpec {
        name: "sum".to_string(),
        source: "function sum(a, b) { return a + b; }".to_string(),
    });
    let fixture = BuilderFixture::from_kernel(&spec);
    assert_eq!(fixture.builder.root_name(), Some("kernel"));
    assert_eq!(fixture.builder.function_names(), ["kernel", "addOne", "sum"]);
    assert!(fixture.builder.get("sum").map(|n| n.is_sub_kernel).unwrap_or(false));
}

#[test]
/// JSON からの仕様読み込み。省略項目は既定値で埋まる。
fn kernel_spec_from_json() {
    let spec = KernelSpec::from_json(
        r#"{
            "source": "function (v) { return v; }",
            "argument_types": { "v": "Array" },
            "constants": { "SIZE": 64 },
            "native_functions": { "mix": "float mix(float a, float b);" }
        }"#,
    )
    .expect("parse spec json");
    assert_eq!(spec.loop_max_iterations, 1000);
    assert!(!spec.debug);
    assert_eq!(spec.native_functions.len(), 1);
    let fixture = BuilderFixture::from_kernel(&spec);
    let node = fixture.builder.get("kernel").expect("root node");
    assert_eq!(node.argument_types, [Some(VarType::Array)]);
}

#[test]
/// 登録は upsert: 同名は置換され、順序リストには 1 度だけ現れる。
fn add_function_node_is_upsert() {
    let mut builder = FunctionBuilder::new(Rc::new(SourceTranslator));
    builder.add_function_node(make_named_node("function f() { return 1; }", "f"));
    builder.add_function_node(make_named_node("function f() { return 2; }", "f"));
    assert_eq!(builder.function_names(), ["f"]);
    assert!(builder.get("f").expect("node").source.contains("return 2"));
}

#[test]
/// トレース: 呼び出し元が先、共有依存は 1 度だけ現れる。
fn trace_deduplicates_shared_dependency() {
    let mut fixture = BuilderFixture::with_functions(
        "function (v) { return a(v) + b(v); }",
        &[
            "function a(v) { return c(v); }",
            "function b(v) { return c(v); }",
            "function c(v) { return v; }",
        ],
    );
    // c は a 経由で先に現れるが、b からの再遭遇で末尾へ移動する
    assert_eq!(fixture.trace_root(), ["kernel", "a", "b", "c"]);
}

#[test]
/// 相互再帰は再遭遇時の末尾移動で解決し、トレースは停止する。
fn trace_resolves_cycles_by_moving_to_tail() {
    let mut fixture = BuilderFixture::with_functions(
        "function (v) { return a(v); }",
        &[
            "function a(v) { return b(v); }",
            "function b(v) { return a(v); }",
        ],
    );
    assert_eq!(fixture.trace_root(), ["kernel", "b", "a"]);
}

#[test]
/// 記述子にもネイティブ表にも無い呼び出し先は黙って落ちる。
fn trace_drops_unknown_callees() {
    let mut fixture = BuilderFixture::root_only("function (v) { return unknownFn(v); }");
    assert_eq!(fixture.trace_root(), ["kernel"]);
}

#[test]
/// ネイティブ関数は記述子が無くてもトレース結果に 1 度だけ現れる。
fn trace_includes_native_functions() {
    let mut fixture = BuilderFixture::root_only("function (v) { return mix(v, v); }");
    fixture
        .builder
        .set_native_function("mix", "float mix(float a, float b) { return a; }");
    assert_eq!(fixture.trace_root(), ["kernel", "mix"]);
}

#[test]
/// 描画中に発見されたネスト関数宣言は描画後に登録され、トレースで辿れる。
fn nested_function_declarations_are_discovered() {
    let mut fixture = BuilderFixture::root_only(
        "function (v) { function half(x) { return x / 2; } return half(v); }",
    );
    let order = fixture.trace_root();
    assert_eq!(order, ["kernel", "half"]);
    let half = fixture.builder.get("half").expect("discovered node");
    assert!(half.source.starts_with("function half"));
}

#[test]
/// 描画はメモ化され、2 回目は同じテキストを返す。未知名は None。
fn render_function_memoizes() {
    let mut fixture = BuilderFixture::root_only("function (v) { return v; }");
    let first = fixture.render("kernel").expect("first render");
    let second = fixture.render("kernel").expect("second render");
    assert_eq!(first, second);
    assert_eq!(fixture.render("missing"), None);
}

#[test]
/// 解析不能な記述子の描画は関数名つきで失敗する。
fn render_failure_names_the_function() {
    let mut builder = FunctionBuilder::new(Rc::new(SourceTranslator));
    builder.add_function_node(make_named_node("function broken() { return ; ", "broken"));
    let err = builder
        .render_function("broken")
        .expect_err("parse failure surfaces");
    let message = err.to_string();
    assert!(message.contains("broken"), "message={message}");
    assert!(message.contains("PAR120"), "message={message}");
}

#[test]
/// プロトタイプ収集: 依存順（被依存が先）で、ネイティブ表へフォールバックする。
fn get_prototypes_orders_dependencies_first() {
    let mut fixture = BuilderFixture::with_functions(
        "function (v) { return double(mix(v, v)); }",
        &["function double(x) { return x * 2.0; }"],
    );
    fixture
        .builder
        .set_native_function("mix", "float mix(float a, float b) { return a; }");
    let prototypes = fixture
        .builder
        .get_prototypes(Some("kernel"))
        .expect("prototypes");
    assert_eq!(prototypes.len(), 3);
    assert!(prototypes[0].contains("mix"));
    assert!(prototypes[1].starts_with("function double"));
    assert!(prototypes[2].contains("double(mix(v, v))"));

    let joined = fixture
        .builder
        .get_prototype_string(Some("kernel"))
        .expect("prototype string");
    assert_eq!(joined, prototypes.join("\n"));
}

#[test]
/// 名前省略のプロトタイプ収集は登録順で全関数を返す。
fn get_prototypes_without_name_uses_registration_order() {
    let mut fixture = BuilderFixture::with_functions(
        "function (v) { return v; }",
        &[
            "function a(v) { return v; }",
            "function b(v) { return v; }",
        ],
    );
    let prototypes = fixture.builder.get_prototypes(None).expect("prototypes");
    assert_eq!(prototypes.len(), 3);
    assert!(prototypes[1].starts_with("function a"));
    assert!(prototypes[2].starts_with("function b"));
}

#[test]
/// get_string は記述子のみを連結し、ネイティブ表へはフォールバックしない。
fn get_string_excludes_native_functions() {
    let mut fixture = BuilderFixture::root_only("function (v) { return mix(v, v); }");
    fixture
        .builder
        .set_native_function("mix", "float mix(float a, float b) { return a; }");
    let text = fixture.builder.get_string(Some("kernel")).expect("string");
    assert!(text.contains("mix(v, v)"));
    assert!(!text.contains("float mix"));
}

#[test]
/// トレースは親リンクを張る。再遭遇では親を付け替えない。
fn trace_sets_parent_links() {
    let mut fixture = BuilderFixture::with_functions(
        "function (v) { return a(v) + c(v); }",
        &[
            "function a(v) { return c(v); }",
            "function c(v) { return v; }",
        ],
    );
    fixture.trace_root();
    let a = fixture.builder.get("a").expect("a");
    assert_eq!(a.parent.as_deref(), Some("kernel"));
    // c は a から最初にトレースされるため、親は a のまま
    let c = fixture.builder.get("c").expect("c");
    assert_eq!(c.parent.as_deref(), Some("a"));
}

/// 仮引数だけを名前空間化して出力する最小のバックエンド。
/// フック 1 つの上書きで出力を差し替えられることを確かめる。
struct ParameterListTranslator;

impl FunctionTranslator for ParameterListTranslator {
    fn ast_function_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        ast: &Node,
        out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        let NodeKind::FunctionExpression { params, .. } = &ast.kind else {
            return Ok(());
        };
        for param in params {
            self.push_parameter(out, param);
        }
        Ok(())
    }
}

#[test]
/// バックエンドはフック上書きだけで独自の出力を組み立てられる。
fn custom_translator_overrides_a_single_hook() {
    let spec = KernelSpec::new("function (alpha, beta) { return alpha + beta; }");
    let mut builder =
        FunctionBuilder::from_kernel(&spec, Rc::new(ParameterListTranslator)).expect("build");
    let rendered = builder
        .render_function("kernel")
        .expect("render")
        .expect("root exists");
    assert_eq!(rendered, "user_alphauser_beta");
}

/// 状態を push したまま pop し忘れるバックエンド。
struct LeakyStateTranslator;

impl FunctionTranslator for LeakyStateTranslator {
    fn ast_function_expression(
        &self,
        ctx: &mut RenderContext<'_>,
        _ast: &Node,
        _out: &mut Vec<String>,
    ) -> Result<(), TranslateError> {
        ctx.node.push_state("leaked");
        Ok(())
    }
}

#[test]
/// 描画完了時に残留した状態は STA301 として表面化する。
fn dangling_state_after_render_is_an_error() {
    let spec = KernelSpec::new("function (v) { return v; }");
    let mut builder =
        FunctionBuilder::from_kernel(&spec, Rc::new(LeakyStateTranslator)).expect("build");
    let err = builder
        .render_function("kernel")
        .expect_err("残留状態は成功扱いにしない");
    assert!(err.to_string().contains("STA301"));
    assert!(err.to_string().contains("kernel"));
}

#[test]
/// 記述子もネイティブ登録もない名前は出力から黙って落とす。エラーにしない。
fn unresolved_names_are_dropped_from_prototypes() {
    let mut fixture = BuilderFixture::root_only("function (v) { return v; }");
    let names = ["kernel".to_string(), "ghost".to_string()];
    let prototypes = fixture
        .builder
        .get_prototypes_from_function_names(&names)
        .expect("render");
    assert_eq!(prototypes.len(), 1);
    assert!(prototypes[0].contains("return v"));
}

#[test]
/// 戻り値型の照会: 描画済みなら推論結果、未知の名前は None。
fn lookup_return_type_after_render() {
    let mut fixture = BuilderFixture::with_functions(
        "function (v) { return flag(v); }",
        &["function flag(v) { return v > 0.5; }"],
    );
    assert_eq!(fixture.builder.lookup_return_type("flag"), None);
    fixture.trace_root();
    assert_eq!(
        fixture.builder.lookup_return_type("flag"),
        Some(VarType::Boolean)
    );
    assert_eq!(fixture.builder.lookup_return_type("missing"), None);
}
