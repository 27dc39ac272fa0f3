// パス: tests/type_inference.rs
// 役割: 呼び出し境界を跨ぐ遅延型推論のシナリオテスト
// 意図: 逆伝播・宣言推論・定数参照・スレッド座標の型決定を固定する
// 関連ファイル: src/translator.rs, src/function_node.rs
#[path = "test_support.rs"]
mod support;

use std::collections::BTreeMap;

use kernellang::{ArgumentTypeHints, ConstantValue, KernelFunctionSpec, KernelSpec, VarType};
use support::BuilderFixture;

fn integer_hinted_kernel(source: &str, aux: &str) -> BuilderFixture {
    let mut spec = KernelSpec::new(source);
    spec.argument_types = Some(ArgumentTypeHints::Positional(vec![VarType::Integer]));
    spec.functions.push(KernelFunctionSpec {
        source: aux.to_string(),
        name: None,
        argument_types: None,
        return_type: None,
    });
    BuilderFixture::from_kernel(&spec)
}

#[test]
/// ヒント無しのルート引数は汎用数値型に落ちる。
fn unhinted_root_arguments_default_to_number() {
    let mut fixture = BuilderFixture::root_only("function (v1, v2) { return v1 + v2; }");
    fixture.trace_root();
    let node = fixture.builder.get_mut("kernel").expect("root");
    assert_eq!(node.get_argument_type("v1", None), VarType::Number);
    assert_eq!(node.get_argument_type("v2", None), VarType::Number);
    assert_eq!(node.return_type(), VarType::Number);
}

#[test]
/// 呼び出し元の実引数型が呼び出し先の仮引数へ逆伝播し、戻り値型まで届く。
fn caller_argument_types_back_propagate() {
    let mut fixture = integer_hinted_kernel(
        "function (x) { return addOne(x); }",
        "function addOne(n) { return n + 1; }",
    );
    fixture.trace_root();
    let add_one = fixture.builder.get_mut("addOne").expect("addOne");
    assert_eq!(add_one.argument_types, [Some(VarType::Integer)]);
    assert_eq!(
        fixture.builder.lookup_return_type("addOne"),
        Some(VarType::Integer)
    );
    // ルートは呼び出し先より先に描画されるため、描画時点の照会は未解決のまま
    assert_eq!(fixture.builder.lookup_return_type("kernel"), None);
}

#[test]
/// 同一関数を異なる型で呼んでも、最初の呼び出し位置の型が残る。
fn first_call_site_wins() {
    let mut fixture = integer_hinted_kernel(
        "function (x) { var f = 0.5; return twice(x) + twice(f); }",
        "function twice(n) { return n + n; }",
    );
    fixture.trace_root();
    let twice = fixture.builder.get_mut("twice").expect("twice");
    // 2 つ目の呼び出し位置は Number を記録しているが、再導出はしない
    assert_eq!(twice.argument_types, [Some(VarType::Integer)]);
    assert_eq!(
        fixture.builder.lookup_return_type("twice"),
        Some(VarType::Integer)
    );
}

#[test]
/// ローカル宣言は初期化式から型を推論して登録される。
fn declarations_are_inferred_from_initializers() {
    let mut fixture = BuilderFixture::root_only(
        "function () { var i = 1; var f = 2.5; var b = true; var a = [1, 2]; var u; return f; }",
    );
    fixture.trace_root();
    let node = fixture.builder.get("kernel").expect("root");
    assert_eq!(node.declarations.get("i"), Some(&VarType::Integer));
    assert_eq!(node.declarations.get("f"), Some(&VarType::Number));
    assert_eq!(node.declarations.get("b"), Some(&VarType::Boolean));
    assert_eq!(node.declarations.get("a"), Some(&VarType::Array));
    // 初期化子なしは汎用数値型
    assert_eq!(node.declarations.get("u"), Some(&VarType::Number));
    assert_eq!(node.raw_return_type(), Some(VarType::Number));
}

#[test]
/// 整数同士の算術は整数、片方が浮動小数なら汎用数値、比較は真偽値。
fn arithmetic_type_joins() {
    let mut fixture = BuilderFixture::root_only(
        "function () { var n = 1 + 2; var m = 1 + 2.5; var c = 1 < 2; return n; }",
    );
    fixture.trace_root();
    let node = fixture.builder.get("kernel").expect("root");
    assert_eq!(node.declarations.get("n"), Some(&VarType::Integer));
    assert_eq!(node.declarations.get("m"), Some(&VarType::Number));
    assert_eq!(node.declarations.get("c"), Some(&VarType::Boolean));
    assert_eq!(node.raw_return_type(), Some(VarType::Integer));
}

#[test]
/// 定数参照は `constantTypes` を優先し、無ければ値から導出する。
fn constants_resolve_through_this_reference() {
    let mut spec = KernelSpec::new(
        "function () { var a = this.constants.SIZE; var b = this.constants.SCALE; return a; }",
    );
    let mut constants = BTreeMap::new();
    constants.insert("SIZE".to_string(), ConstantValue::Int(64));
    constants.insert("SCALE".to_string(), ConstantValue::Float(0.5));
    let mut constant_types = BTreeMap::new();
    constant_types.insert("SIZE".to_string(), VarType::Float);
    spec.constants = constants;
    spec.constant_types = constant_types;
    let mut fixture = BuilderFixture::from_kernel(&spec);
    fixture.trace_root();
    let node = fixture.builder.get("kernel").expect("root");
    // SIZE は明示タグ、SCALE は値からの導出
    assert_eq!(node.declarations.get("a"), Some(&VarType::Float));
    assert_eq!(node.declarations.get("b"), Some(&VarType::Number));
}

#[test]
/// スレッド座標・出力寸法の参照は整数。
fn thread_coordinates_are_integer() {
    let mut fixture = BuilderFixture::root_only(
        "function () { var x = this.thread.x; var w = this.output.x; return x; }",
    );
    fixture.trace_root();
    let node = fixture.builder.get("kernel").expect("root");
    assert_eq!(node.declarations.get("x"), Some(&VarType::Integer));
    assert_eq!(node.declarations.get("w"), Some(&VarType::Integer));
    assert_eq!(node.raw_return_type(), Some(VarType::Integer));
}

#[test]
/// 添字アクセスの読み出しは汎用数値型とみなす。
fn indexed_reads_are_number() {
    let mut spec = KernelSpec::new("function (data) { var v = data[0]; return v; }");
    spec.argument_types = Some(ArgumentTypeHints::Positional(vec![VarType::Array]));
    let mut fixture = BuilderFixture::from_kernel(&spec);
    fixture.trace_root();
    let node = fixture.builder.get("kernel").expect("root");
    assert_eq!(node.declarations.get("v"), Some(&VarType::Number));
}

#[test]
/// 明示された戻り値型は推論で上書きされない。
fn explicit_return_type_wins_over_inference() {
    let mut spec = KernelSpec::new("function (x) { return toInt(x); }");
    spec.functions.push(KernelFunctionSpec {
        source: "function toInt(v) { return v; }".to_string(),
        name: None,
        argument_types: None,
        return_type: Some(VarType::Integer),
    });
    let mut fixture = BuilderFixture::from_kernel(&spec);
    fixture.trace_root();
    assert_eq!(
        fixture.builder.lookup_return_type("toInt"),
        Some(VarType::Integer)
    );
}

#[test]
/// ループ本体を含む描画でも状態スタックは均衡し、描画は成功する。
fn loop_bodies_balance_translation_states() {
    let mut fixture = BuilderFixture::root_only(
        "function (n) {\n\
         var total = 0;\n\
         for (var i = 0; i < n; i++) { total += i; }\n\
         while (total > 100) { total -= 1; }\n\
         do { total++; } while (false);\n\
         return total;\n\
         }",
    );
    let rendered = fixture.render("kernel").expect("render with loops");
    assert!(rendered.contains("for (var i = 0;"));
    let node = fixture.builder.get("kernel").expect("root");
    assert_eq!(node.state(), None);
}
