use std::collections::BTreeMap;

/// テンプレートに渡す変数の集合。
///
/// 生成時にバインドされる変数はディレクトリ名のみ。テンプレート側からは
/// `dirName` として参照でき、Tera 構文では `dir_name` も使える。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    vars: BTreeMap<String, String>,
}

impl TemplateContext {
    /// ディレクトリ名をバインドしたコンテキストを作る。
    pub fn new(dir_name: &str) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("dirName".to_string(), dir_name.to_string());
        Self { vars }
    }

    /// 変数を参照する。
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Tera コンテキストに変換する。
    pub fn to_tera_context(&self) -> tera::Context {
        let mut ctx = tera::Context::new();
        for (key, value) in &self.vars {
            ctx.insert(key.as_str(), value);
        }
        if let Some(dir_name) = self.get("dirName") {
            ctx.insert("dir_name", dir_name);
        }
        ctx
    }
}
