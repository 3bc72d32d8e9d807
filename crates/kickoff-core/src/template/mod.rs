pub mod context;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tera::Tera;

use crate::error::{Error, Result};
pub use context::TemplateContext;

/// EJS のエスケープ (`<%%`)、コメント (`<%# ... %>`)、
/// 出力タグ (`<%= name %>` / `<%- name %>`)。
///
/// グループ: 1 = コメントの閉じ修飾, 2 = 出力種別, 3 = 変数名, 4 = 出力タグの閉じ修飾
static EJS_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)<%%|<%#.*?([-_])?%>|<%([=-])\s*([A-Za-z_$][A-Za-z0-9_$]*)\s*([-_])?%>",
    )
    .expect("EJS tag pattern is a valid regex")
});

/// バイナリ判定で先頭から走査するバイト数。
const BINARY_SNIFF_LEN: usize = 8000;

/// テンプレートの置換構文。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    /// `<%= dirName %>` 形式 (リモートテンプレートが使う構文)
    #[default]
    Ejs,
    /// `{{ dirName }}` 形式の Tera テンプレート
    Tera,
}

impl Syntax {
    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Ejs => "ejs",
            Syntax::Tera => "tera",
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Syntax {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ejs" => Ok(Syntax::Ejs),
            "tera" => Ok(Syntax::Tera),
            other => Err(Error::InvalidValue {
                field: "syntax",
                value: other.to_string(),
            }),
        }
    }
}

/// テンプレートレンダラ。
///
/// ファイル単位でディレクトリ名を置換する。バイナリファイルは
/// 置換せずそのまま返す。
pub struct TemplateRenderer {
    syntax: Syntax,
    context: TemplateContext,
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new(syntax: Syntax, context: TemplateContext) -> Self {
        let mut tera = Tera::default();
        // HTML 以外のファイルも扱うため自動エスケープは無効にする
        tera.autoescape_on(vec![]);
        Self {
            syntax,
            context,
            tera,
        }
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// ファイル内容をレンダリングする。
    ///
    /// # Arguments
    /// * `path` - エラーメッセージとテンプレート名に使う相対パス
    /// * `bytes` - ファイルの生バイト列
    ///
    /// # Errors
    /// テキストファイルのレンダリングに失敗した場合。
    pub fn render_bytes(&mut self, path: &Path, bytes: Vec<u8>) -> Result<Vec<u8>> {
        if is_binary(&bytes) {
            return Ok(bytes);
        }
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => return Ok(e.into_bytes()),
        };
        let name = path.to_string_lossy().replace('\\', "/");
        let rendered = self.render_str(&name, &text).map_err(|message| Error::Render {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(rendered.into_bytes())
    }

    /// 文字列をレンダリングする。
    ///
    /// # Errors
    /// 未定義変数の参照や構文エラーの場合、原因を含むメッセージを返す。
    pub fn render_str(&mut self, name: &str, content: &str) -> std::result::Result<String, String> {
        match self.syntax {
            Syntax::Ejs => render_ejs(content, &self.context),
            Syntax::Tera => {
                let ctx = self.context.to_tera_context();
                self.tera
                    .add_raw_template(name, content)
                    .map_err(|e| error_chain(&e))?;
                self.tera.render(name, &ctx).map_err(|e| error_chain(&e))
            }
        }
    }
}

/// EJS の出力タグとコメントを展開する。
///
/// `<%=` は HTML エスケープ付き、`<%-` はそのまま出力し、`<%#` は取り除く。
/// 閉じタグ `-%>` は直後の改行 1 つを、`_%>` は直後の空白を取り除く。
/// それ以外のタグ (`<% ... %>` 等) には手を付けない。
fn render_ejs(content: &str, ctx: &TemplateContext) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for caps in EJS_TAG.captures_iter(content) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        // 直前のタグの trim で読み飛ばした範囲と重なる場合
        if whole.start() < last {
            continue;
        }
        out.push_str(&content[last..whole.start()]);
        let trim = match (caps.get(2), caps.get(3)) {
            (Some(kind), Some(var)) => {
                let value = ctx
                    .get(var.as_str())
                    .ok_or_else(|| format!("{} is not defined", var.as_str()))?;
                if kind.as_str() == "=" {
                    out.push_str(&escape_html(value));
                } else {
                    out.push_str(value);
                }
                caps.get(4)
            }
            _ if whole.as_str() == "<%%" => {
                out.push_str("<%");
                None
            }
            _ => caps.get(1),
        };
        last = whole.end();
        if let Some(trim) = trim {
            last += trailing_trim_len(&content[last..], trim.as_str());
        }
    }
    out.push_str(&content[last..]);
    Ok(out)
}

/// 閉じタグの修飾子が取り除く、直後のバイト数。
fn trailing_trim_len(rest: &str, modifier: &str) -> usize {
    match modifier {
        "-" if rest.starts_with("\r\n") => 2,
        "-" if rest.starts_with('\n') => 1,
        "_" => rest.len() - rest.trim_start_matches(|c: char| c == ' ' || c == '\t').len(),
        _ => 0,
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// NUL バイトを含むか UTF-8 として不正ならバイナリとみなす。
pub fn is_binary(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    head.contains(&0) || std::str::from_utf8(bytes).is_err()
}

/// Tera のエラーは原因がチェーンされているため連結して返す。
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
