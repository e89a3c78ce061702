//! Rule configuration: parsing, schema validation, typed rules.

mod parser;
pub mod schema;

pub use parser::{
    is_yaml_path, ColumnValueCheck, ConfigError, ContentFontRule, ContentRule, ExpectedTitle,
    FontRules, HeadingFontRule, HeadingTarget, RuleConfig, TableRule, TitleRules,
    LEGACY_CONTENT_RULES_KEY,
};
