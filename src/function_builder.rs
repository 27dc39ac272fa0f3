// パス: src/function_builder.rs
// 役割: 関数レジストリと呼び出しグラフのトレーサを実装する
// 意図: 到達可能な関数集合を依存順・重複なしで下流エミッタへ供給する
// 関連ファイル: src/function_node.rs, src/translator.rs, tests/function_builder.rs
//! 関数レジストリ（FunctionBuilder）モジュール
//!
//! 目的:
//! - ルート・補助・サブカーネルの記述子集合を所有し、名前→記述子の対応を管理する。
//! - 呼び出しグラフを深さ優先でトレースし、到達可能な関数名の順序付きリストを返す。
//! - 記述子を持たない名前はネイティブ関数表へフォールバックする。
//!
//! 設計ノート:
//! - 記述子の描画には「ネスト関数の発見・登録」という観測可能な副作用があるため、
//!   トレースは厳密な呼び出し順で直列に評価する（並べ替え・並行描画は不可）。
//! - 既出名の再遭遇はリスト末尾への移動で解決する。これはテキスト連結向けの
//!   発見的順序付けであり、厳密なトポロジカルソートではない。

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::{ConfigurationError, ParseError};
use crate::function_node::{
    ArgumentTypeHints, FunctionNode, FunctionNodeSettings, FunctionTranslator, RegistryView,
    RenderContext, TranslateError, ENTRY_FUNCTION_NAME,
};
use crate::types::{ConstantValue, VarType};

/// レジストリ操作で発生しうるエラー。どれも当該コンパイル単位の描画を中断する。
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("関数 `{function}` の解析に失敗しました: {source}")]
    Parse {
        function: String,
        #[source]
        source: ParseError,
    },
    #[error("関数 `{function}` の変換に失敗しました: {source}")]
    Render {
        function: String,
        #[source]
        source: TranslateError,
    },
}

fn default_loop_max_iterations() -> u32 {
    1000
}

/// ルート仕様。エントリ関数のソースと引数メタデータ、補助・サブ関数仕様を束ねる。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KernelSpec {
    pub source: String,
    /// 引数名のヒント。記述子は常にソースから再抽出するため参考情報扱い。
    #[serde(default)]
    pub argument_names: Option<Vec<String>>,
    #[serde(default)]
    pub argument_types: Option<ArgumentTypeHints>,
    #[serde(default)]
    pub argument_sizes: Vec<Option<Vec<usize>>>,
    #[serde(default)]
    pub constants: BTreeMap<String, ConstantValue>,
    #[serde(default)]
    pub constant_types: BTreeMap<String, VarType>,
    #[serde(default = "default_loop_max_iterations")]
    pub loop_max_iterations: u32,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub native_functions: BTreeMap<String, String>,
    #[serde(default)]
    pub functions: Vec<KernelFunctionSpec>,
    #[serde(default)]
    pub sub_kernels: Vec<SubKernelSpec>,
}

impl KernelSpec {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            argument_names: None,
            argument_types: None,
            argument_sizes: Vec::new(),
            constants: BTreeMap::new(),
            constant_types: BTreeMap::new(),
            loop_max_iterations: default_loop_max_iterations(),
            debug: false,
            native_functions: BTreeMap::new(),
            functions: Vec::new(),
            sub_kernels: Vec::new(),
        }
    }

    /// JSON テキストから仕様を読み込む。
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// 補助関数仕様。ソースと任意の型設定を持つ。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KernelFunctionSpec {
    pub source: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub argument_types: Option<ArgumentTypeHints>,
    #[serde(default)]
    pub return_type: Option<VarType>,
}

/// サブカーネル仕様。名前は必須。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubKernelSpec {
    pub name: String,
    pub source: String,
}

/// 1 コンパイル単位分の関数レジストリ兼呼び出しグラフトレーサ。
pub struct FunctionBuilder {
    function_map: HashMap<String, FunctionNode>,
    /// 登録順。マップ全体の描画はこの順序に従う。
    function_order: Vec<String>,
    native_functions: BTreeMap<String, String>,
    root_name: Option<String>,
    translator: Rc<dyn FunctionTranslator>,
    /// ネスト関数発見時に新しい記述子へ引き継ぐ共通設定。
    node_settings: FunctionNodeSettings,
}

impl FunctionBuilder {
    /// 空のレジストリを作る。テストや手組みの構成用。
    pub fn new(translator: Rc<dyn FunctionTranslator>) -> Self {
        Self {
            function_map: HashMap::new(),
            function_order: Vec::new(),
            native_functions: BTreeMap::new(),
            root_name: None,
            translator,
            node_settings: FunctionNodeSettings::default(),
        }
    }

    /// ルート仕様からレジストリを構築する。ルートは固定名 `kernel` で登録され、
    /// 補助関数・サブカーネルも即時に登録される。
    pub fn from_kernel(
        spec: &KernelSpec,
        translator: Rc<dyn FunctionTranslator>,
    ) -> Result<Self, ConfigurationError> {
        let base = FunctionNodeSettings {
            constants: spec.constants.clone(),
            constant_types: spec.constant_types.clone(),
            loop_max_iterations: spec.loop_max_iterations,
            debug: spec.debug,
            ..Default::default()
        };
        let mut builder = Self {
            function_map: HashMap::new(),
            function_order: Vec::new(),
            native_functions: spec.native_functions.clone(),
            root_name: None,
            translator,
            node_settings: base.clone(),
        };

        let root = FunctionNode::new(
            spec.source.clone(),
            FunctionNodeSettings {
                is_root_kernel: true,
                argument_types: spec.argument_types.clone(),
                argument_sizes: spec.argument_sizes.clone(),
                ..base.clone()
            },
        )?;
        builder.add_function_node(root);

        for function in &spec.functions {
            let node = FunctionNode::new(
                function.source.clone(),
                FunctionNodeSettings {
                    name: function.name.clone(),
                    argument_types: function.argument_types.clone(),
                    return_type: function.return_type,
                    ..base.clone()
                },
            )?;
            builder.add_function_node(node);
        }

        for sub_kernel in &spec.sub_kernels {
            let node = FunctionNode::new(
                sub_kernel.source.clone(),
                FunctionNodeSettings {
                    name: Some(sub_kernel.name.clone()),
                    is_sub_kernel: true,
                    ..base.clone()
                },
            )?;
            builder.add_function_node(node);
        }

        Ok(builder)
    }

    /// 記述子を名前で upsert する。ルート印つきならルート参照も更新する。
    /// ネスト関数の発見コールバックが使う変更経路もここに集約される。
    pub fn add_function_node(&mut self, node: FunctionNode) {
        debug!("関数 {} を登録します", node.name);
        if node.is_root_kernel {
            self.root_name = Some(node.name.clone());
        }
        if !self.function_map.contains_key(&node.name) {
            self.function_order.push(node.name.clone());
        }
        self.function_map.insert(node.name.clone(), node);
    }

    /// ネイティブ関数（記述子なしの事前描画テキスト）を登録する。
    pub fn set_native_function(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.native_functions.insert(name.into(), source.into());
    }

    pub fn root_name(&self) -> Option<&str> {
        self.root_name.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&FunctionNode> {
        self.function_map.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FunctionNode> {
        self.function_map.get_mut(name)
    }

    /// 登録済み関数名を登録順で返す。
    pub fn function_names(&self) -> &[String] {
        &self.function_order
    }

    /// 名前の戻り値型を照会する。未知の名前・未設定の戻り値型は `None`。
    pub fn lookup_return_type(&self, function_name: &str) -> Option<VarType> {
        self.function_map
            .get(function_name)
            .and_then(|node| node.raw_return_type())
    }

    /// 記述子 1 つを描画する。結果は記述子にメモ化され、2 回目以降は再走査しない。
    ///
    /// 描画完了時点でネスト関数の発見イベントをすべて回収して登録するため、
    /// 呼び出し側が直後に `called_functions` を読む時には副作用が完了している。
    pub fn render_function(&mut self, name: &str) -> Result<Option<String>, BuilderError> {
        // 描画中の共有参照（RegistryView）と記述子の可変借用が重ならないよう、
        // いったんマップから取り外して作業する
        let mut node = match self.function_map.remove(name) {
            Some(node) => node,
            None => return Ok(None),
        };
        if let Some(text) = node.rendered.clone() {
            self.function_map.insert(name.to_string(), node);
            return Ok(Some(text));
        }
        debug!("関数 {} を描画します", name);
        let translator = Rc::clone(&self.translator);
        let parsed = match node.ast() {
            Ok(parsed) => parsed,
            Err(err) => {
                self.function_map.insert(name.to_string(), node);
                return Err(BuilderError::Parse {
                    function: name.to_string(),
                    source: err,
                });
            }
        };
        let mut out = Vec::new();
        let (result, discovered) = {
            let view: &dyn RegistryView = &*self;
            let mut ctx = RenderContext::new(&mut node, Rc::clone(&parsed), Some(view));
            let result = translator.ast_generic(&mut ctx, &parsed.root, &mut out);
            (result, ctx.take_discovered())
        };
        if let Err(err) = result {
            self.function_map.insert(name.to_string(), node);
            return Err(BuilderError::Render {
                function: name.to_string(),
                source: err,
            });
        }
        if let Err(err) = node.assert_states_drained() {
            self.function_map.insert(name.to_string(), node);
            return Err(BuilderError::Render {
                function: name.to_string(),
                source: TranslateError::State(err),
            });
        }
        let text = out.concat();
        if node.debug {
            trace!(
                "関数 {} の描画結果: {} 文字 / 呼び出し {} 件",
                name,
                text.len(),
                node.called_functions.len()
            );
        }
        node.rendered = Some(text.clone());
        self.function_map.insert(name.to_string(), node);
        for source in discovered {
            self.add_nested_function(&source)?;
        }
        Ok(Some(text))
    }

    /// 描画中に発見されたネスト関数ソースから記述子を作って登録する。
    fn add_nested_function(&mut self, source: &str) -> Result<(), BuilderError> {
        let node = FunctionNode::new(source.to_string(), self.node_settings.clone())?;
        debug!("ネスト関数 {} を発見しました", node.name);
        self.add_function_node(node);
        Ok(())
    }

    /// `start`（省略時はエントリ名）から到達可能な関数名を呼び出し順で集める。
    ///
    /// 既出名の再遭遇は循環または共有依存であり、エントリを末尾へ「移動」して
    /// 解決する。再遭遇時点でその関数に（推移的に）依存する呼び出し元より後に
    /// 出力されることが、前方参照を解決できないテキスト連結先にとって有効な
    /// 出力順になる。
    pub fn trace_function_calls(
        &mut self,
        function_name: Option<&str>,
        ret_list: &mut Vec<String>,
        parent: Option<&str>,
    ) -> Result<(), BuilderError> {
        let name = function_name.unwrap_or(ENTRY_FUNCTION_NAME);

        if self.function_map.contains_key(name) {
            if let Some(idx) = ret_list.iter().position(|n| n == name) {
                // 既にトレース済み → 末尾へ移動（再追加はしない）
                let moved = ret_list.remove(idx);
                trace!("関数 {} は既出のため末尾へ移動します", moved);
                ret_list.push(moved);
            } else {
                ret_list.push(name.to_string());
                if let Some(parent) = parent {
                    if let Some(node) = self.function_map.get_mut(name) {
                        node.parent = Some(parent.to_string());
                    }
                }
                // 描画を強制して called_functions（ネスト発見分も含む）を確定させる
                self.render_function(name)?;
                let callees = self
                    .function_map
                    .get(name)
                    .map(|node| node.called_functions.clone())
                    .unwrap_or_default();
                for callee in &callees {
                    self.trace_function_calls(Some(callee), ret_list, Some(name))?;
                }
            }
        }

        if self.native_functions.contains_key(name) && !ret_list.iter().any(|n| n == name) {
            ret_list.push(name.to_string());
        }

        Ok(())
    }

    /// トレース結果をリストで返す簡易版。リストは呼び出し順（呼び出し元が先）。
    pub fn trace(&mut self, function_name: Option<&str>) -> Result<Vec<String>, BuilderError> {
        let mut ret_list = Vec::new();
        self.trace_function_calls(function_name, &mut ret_list, None)?;
        Ok(ret_list)
    }

    /// 名前リストの各関数の描画テキストを集める。記述子がなければネイティブ表を
    /// 引き、どちらにも無い名前は黙って落とす（ベストエフォート出力）。
    pub fn get_prototypes_from_function_names(
        &mut self,
        function_list: &[String],
    ) -> Result<Vec<String>, BuilderError> {
        let mut ret = Vec::new();
        for function_name in function_list {
            if let Some(text) = self.render_function(function_name)? {
                ret.push(text);
            } else if let Some(native) = self.native_functions.get(function_name) {
                ret.push(native.clone());
            } else {
                trace!("関数 {} は記述子もネイティブ定義も無いため省略します", function_name);
            }
        }
        Ok(ret)
    }

    /// 指定関数から到達可能な関数の描画テキストを依存順（被依存が先）で返す。
    /// 名前省略時はレジストリ全体を登録順のまま返す。
    pub fn get_prototypes(
        &mut self,
        function_name: Option<&str>,
    ) -> Result<Vec<String>, BuilderError> {
        if let Some(root) = self.root_name.clone() {
            self.render_function(&root)?;
        }
        match function_name {
            Some(name) => {
                let mut list = Vec::new();
                self.trace_function_calls(Some(name), &mut list, None)?;
                list.reverse();
                self.get_prototypes_from_function_names(&list)
            }
            None => {
                let names = self.function_order.clone();
                self.get_prototypes_from_function_names(&names)
            }
        }
    }

    /// `get_prototypes` の結果を改行で連結する。
    pub fn get_prototype_string(
        &mut self,
        function_name: Option<&str>,
    ) -> Result<String, BuilderError> {
        Ok(self.get_prototypes(function_name)?.join("\n"))
    }

    /// 名前リストのうち記述子を持つものだけを描画して連結する
    /// （ネイティブ表へはフォールバックしない）。
    pub fn get_string_from_function_names(
        &mut self,
        function_list: &[String],
    ) -> Result<String, BuilderError> {
        let mut ret = Vec::new();
        for function_name in function_list {
            if let Some(text) = self.render_function(function_name)? {
                ret.push(text);
            }
        }
        Ok(ret.join("\n"))
    }

    /// 指定関数から到達可能な記述子の描画テキストを依存順で連結する。
    /// 名前省略時はレジストリ全体を登録順で連結する。
    pub fn get_string(&mut self, function_name: Option<&str>) -> Result<String, BuilderError> {
        match function_name {
            Some(name) => {
                let mut list = Vec::new();
                self.trace_function_calls(Some(name), &mut list, None)?;
                list.reverse();
                self.get_string_from_function_names(&list)
            }
            None => {
                let names = self.function_order.clone();
                self.get_string_from_function_names(&names)
            }
        }
    }
}

impl RegistryView for FunctionBuilder {
    fn function(&self, name: &str) -> Option<&FunctionNode> {
        self.function_map.get(name)
    }

    fn lookup_return_type(&self, name: &str) -> Option<VarType> {
        FunctionBuilder::lookup_return_type(self, name)
    }
}
