//! Canned Tool Templates
//!
//! Exact and near-exact matching of a request against a fixed set of stock
//! tool templates. A hit bypasses AI generation entirely. The loose keyword
//! rule is guarded by a per-kind length ceiling so that longer, more specific
//! requests that merely mention a keyword still go to generation.

/// Stock tool kinds, in routing priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Calculator,
    Table,
    TextReplace,
    JsonFormatter,
    DataConverter,
    CsvProcessor,
    Custom,
}

impl ToolKind {
    pub fn template_name(&self) -> &'static str {
        match self {
            ToolKind::Calculator => "calculator",
            ToolKind::Table => "table_generator",
            ToolKind::TextReplace => "text_replace",
            ToolKind::JsonFormatter => "json_formatter",
            ToolKind::DataConverter => "data_converter",
            ToolKind::CsvProcessor => "csv_processor",
            ToolKind::Custom => "custom_tool",
        }
    }

    /// Embedded template body for this kind.
    pub fn body(&self) -> &'static str {
        match self {
            ToolKind::Calculator => include_str!("../assets/templates/calculator.html"),
            ToolKind::Table => include_str!("../assets/templates/table_generator.html"),
            ToolKind::TextReplace => include_str!("../assets/templates/text_replace.html"),
            ToolKind::JsonFormatter => include_str!("../assets/templates/json_formatter.html"),
            ToolKind::DataConverter => include_str!("../assets/templates/data_converter.html"),
            ToolKind::CsvProcessor => include_str!("../assets/templates/csv_processor.html"),
            ToolKind::Custom => include_str!("../assets/templates/custom_tool.html"),
        }
    }
}

/// Canonical request phrases mapped to their tool kind. Requests are
/// case-folded and trimmed before lookup, so keys are lowercase.
const EXACT_PHRASES: &[(&str, ToolKind)] = &[
    ("生成一个计算器工具", ToolKind::Calculator),
    ("生成一个表格生成器", ToolKind::Table),
    ("生成一个文本替换工具", ToolKind::TextReplace),
    ("生成一个json格式化工具", ToolKind::JsonFormatter),
    ("生成一个数据转换工具", ToolKind::DataConverter),
    ("计算器", ToolKind::Calculator),
    ("计算器工具", ToolKind::Calculator),
    ("表格", ToolKind::Table),
    ("表格生成器", ToolKind::Table),
    ("表格工具", ToolKind::Table),
    ("文本替换", ToolKind::TextReplace),
    ("文本替换工具", ToolKind::TextReplace),
    ("json格式化", ToolKind::JsonFormatter),
    ("json格式化工具", ToolKind::JsonFormatter),
    ("数据转换", ToolKind::DataConverter),
    ("数据转换工具", ToolKind::DataConverter),
];

/// Loose per-kind rule: the folded request contains one of the kind's aliases
/// AND its total character count stays under the kind's ceiling. The ceilings
/// are tunable compatibility constants, not semantic guarantees. First kind
/// wins, in declaration order.
const LOOSE_RULES: &[(ToolKind, &[&str], usize)] = &[
    (ToolKind::Calculator, &["计算器", "calculator"], 20),
    (ToolKind::Table, &["表格生成器", "表格", "table"], 20),
    (ToolKind::TextReplace, &["文本替换", "replace"], 20),
    (ToolKind::JsonFormatter, &["json格式化", "json格式", "json formatter"], 25),
    (ToolKind::DataConverter, &["数据转换", "data converter"], 20),
];

/// Fixed catalog of canned templates.
#[derive(Debug, Default)]
pub struct TemplateCatalog;

impl TemplateCatalog {
    pub fn new() -> Self {
        TemplateCatalog
    }

    /// Match a request against the catalog. Returns the rendered template
    /// content on a hit, `None` otherwise. No side effects.
    pub fn matches(&self, request: &str) -> Option<&'static str> {
        let folded = request.trim().to_lowercase();
        if folded.is_empty() {
            return None;
        }

        for (phrase, kind) in EXACT_PHRASES {
            if folded == *phrase {
                return Some(kind.body());
            }
        }

        let length = folded.chars().count();
        for (kind, aliases, ceiling) in LOOSE_RULES {
            if length < *ceiling && aliases.iter().any(|a| folded.contains(a)) {
                return Some(kind.body());
            }
        }

        None
    }

    /// Look up a template body by persisted name, defaulting to the generic
    /// tool page for unknown names.
    pub fn by_name(&self, name: &str) -> &'static str {
        [
            ToolKind::Calculator,
            ToolKind::Table,
            ToolKind::TextReplace,
            ToolKind::JsonFormatter,
            ToolKind::DataConverter,
            ToolKind::CsvProcessor,
            ToolKind::Custom,
        ]
        .iter()
        .find(|k| k.template_name() == name)
        .map(|k| k.body())
        .unwrap_or_else(|| ToolKind::Custom.body())
    }
}
