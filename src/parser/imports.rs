//
//  imports.rs
//  Blast
//
//  Created by hak (tharun)
//

use regex::Regex;
use std::collections::HashMap;

use super::language::SupportedLanguage;

/// One pattern in a language's rule list. Group 1 captures the specifier.
#[derive(Debug, Clone)]
struct ImportRule {
    pattern: Regex,
    /// The capture is a comma-separated module list (`import a, b as c`).
    list: bool,
}

impl ImportRule {
    fn single(pattern: &str) -> Self {
        Self {
            pattern: compile(pattern),
            list: false,
        }
    }

    fn list(pattern: &str) -> Self {
        Self {
            pattern: compile(pattern),
            list: true,
        }
    }

    fn specifiers(&self, capture: &str) -> Vec<String> {
        if !self.list {
            return vec![capture.trim().to_string()];
        }
        capture
            .split(',')
            .map(|part| {
                let part = part.trim().trim_matches(|c| c == '(' || c == ')');
                let module = part.split_whitespace().next().unwrap_or("");
                module.to_string()
            })
            .filter(|m| !m.is_empty())
            .collect()
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("import pattern must compile")
}

/// ES module `import x from "y"` and re-export `export { x } from "y"`.
const ES_FROM: &str = r#"\b(?:import|export)\s+[\w*{}\s,$]*?\bfrom\s*['"]([^'"\n]+)['"]"#;
/// Side-effect import: `import "./styles.css"`.
const ES_BARE: &str = r#"(?m)^\s*import\s*['"]([^'"\n]+)['"]"#;
/// CommonJS `require("x")`.
const CJS_REQUIRE: &str = r#"\brequire\(\s*['"]([^'"\n]+)['"]\s*\)"#;
/// Dynamic `import("x")`.
const ES_DYNAMIC: &str = r#"\bimport\(\s*['"]([^'"\n]+)['"]\s*\)"#;
/// Python `import a, b.c as d`.
const PY_IMPORT: &str = r"(?m)^[ \t]*import[ \t]+([^#\r\n]+)";
/// Python `from a.b import c`.
const PY_FROM: &str = r"(?m)^[ \t]*from[ \t]+(\S+)[ \t]+import\b";

/// Lexical import scanner keyed by file extension.
///
/// Extraction is textual: specifiers inside comments or strings that look
/// like imports are reported too.
#[derive(Debug, Clone)]
pub struct ImportExtractor {
    table: HashMap<SupportedLanguage, Vec<ImportRule>>,
}

impl ImportExtractor {
    pub fn new() -> Self {
        let script_rules = vec![
            ImportRule::single(ES_FROM),
            ImportRule::single(ES_BARE),
            ImportRule::single(CJS_REQUIRE),
            ImportRule::single(ES_DYNAMIC),
        ];
        let python_rules = vec![ImportRule::list(PY_IMPORT), ImportRule::single(PY_FROM)];

        let mut table = HashMap::new();
        for lang in [
            SupportedLanguage::JavaScript,
            SupportedLanguage::TypeScript,
            SupportedLanguage::Jsx,
            SupportedLanguage::Tsx,
            SupportedLanguage::Vue,
        ] {
            table.insert(lang, script_rules.clone());
        }
        table.insert(SupportedLanguage::Python, python_rules);

        Self { table }
    }

    /// Whether files with this extension are scanned at all.
    pub fn supports(&self, ext: &str) -> bool {
        SupportedLanguage::from_extension(ext).is_some_and(|lang| self.table.contains_key(&lang))
    }

    /// Raw specifiers found in `content`, rule by rule, in match order.
    ///
    /// Unsupported extensions yield nothing.
    pub fn extract<'a>(&'a self, content: &'a str, ext: &str) -> impl Iterator<Item = String> + 'a {
        let rules: &'a [ImportRule] = SupportedLanguage::from_extension(ext)
            .and_then(|lang| self.table.get(&lang))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        rules.iter().flat_map(move |rule| {
            rule.pattern
                .captures_iter(content)
                .filter_map(|caps| caps.get(1))
                .flat_map(move |m| rule.specifiers(m.as_str()))
        })
    }
}

impl Default for ImportExtractor {
    fn default() -> Self {
        Self::new()
    }
}
