use tracing::debug;

use crate::sql::{CreateModifiers, OpenDicStatement};

/// Words that end the optional object name in `CREATE OPEN <type> [<name>]`.
const CREATE_CLAUSE_KEYWORDS: &[&str] = &["if", "as", "props"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Text outside the `OPEN` dialect, handed verbatim to the host engine.
    Native(String),
    OpenDic(OpenDicStatement),
}

/// One grammar of the `OPEN` dialect.
///
/// Several grammars share a prefix (`SHOW OPEN` starts five of them), so they
/// are tried in the order of [`GRAMMARS`] and the first one that consumes the
/// whole statement wins.
pub struct Grammar {
    pub name: &'static str,
    parse: fn(&mut OpenDicParser<'_>) -> Option<OpenDicStatement>,
}

impl Grammar {
    /// Match `sql` against this grammar alone.
    pub fn apply(&self, sql: &str) -> Option<OpenDicStatement> {
        let mut parser = OpenDicParser::new(sql.trim());
        let statement = (self.parse)(&mut parser)?;
        parser.parse_end().then_some(statement)
    }
}

pub static GRAMMARS: &[Grammar] = &[
    Grammar {
        name: "create batch",
        parse: parse_create_batch,
    },
    Grammar {
        name: "create",
        parse: parse_create_udo,
    },
    Grammar {
        name: "show types",
        parse: parse_show_types,
    },
    Grammar {
        name: "show platforms",
        parse: parse_show_platforms,
    },
    Grammar {
        name: "show mappings for platform",
        parse: parse_show_mappings_for_platform,
    },
    Grammar {
        name: "show mapping",
        parse: parse_show_mapping,
    },
    Grammar {
        name: "show",
        parse: parse_show,
    },
    Grammar {
        name: "sync all",
        parse: parse_sync_all,
    },
    Grammar {
        name: "sync",
        parse: parse_sync,
    },
    Grammar {
        name: "define",
        parse: parse_define,
    },
    Grammar {
        name: "alter",
        parse: parse_alter,
    },
    Grammar {
        name: "drop mapping",
        parse: parse_drop_mapping,
    },
    Grammar {
        name: "drop",
        parse: parse_drop,
    },
    Grammar {
        name: "add mapping",
        parse: parse_add_mapping,
    },
];

/// Recognizer for the `OPEN` statement dialect.
///
/// The parser works directly on the statement text rather than on SQL tokens,
/// since the JSON islands following `PROPS`, `SYNTAX` and `OBJECTS` must be
/// captured exactly as written.
pub struct OpenDicParser<'a> {
    sql: &'a str,
    pos: usize,
}

impl<'a> OpenDicParser<'a> {
    pub fn new(sql: &'a str) -> Self {
        Self { sql, pos: 0 }
    }

    /// Classify a statement as `OPEN` dialect or native SQL.
    pub fn parse_sql(sql: &str) -> Statement {
        match Self::parse_open_statement(sql) {
            Some(statement) => Statement::OpenDic(statement),
            None => Statement::Native(sql.to_string()),
        }
    }

    /// Try every grammar in priority order.
    pub fn parse_open_statement(sql: &str) -> Option<OpenDicStatement> {
        GRAMMARS.iter().find_map(|grammar| {
            let statement = grammar.apply(sql)?;
            debug!("Matched '{}' grammar: {}", grammar.name, statement);
            Some(statement)
        })
    }

    fn rest(&self) -> &'a str {
        &self.sql[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Length in bytes of the word starting at the current position.
    fn word_len(&self) -> usize {
        self.rest()
            .char_indices()
            .find(|(_, c)| !is_word_char(*c))
            .map(|(idx, _)| idx)
            .unwrap_or(self.rest().len())
    }

    /// Consume `keyword` (case-insensitive) if it is the next whole word.
    pub fn parse_keyword(&mut self, keyword: &str) -> bool {
        let start = self.pos;
        self.skip_whitespace();
        let len = self.word_len();
        if self.rest()[..len].eq_ignore_ascii_case(keyword) {
            self.pos += len;
            true
        } else {
            self.pos = start;
            false
        }
    }

    /// Consume all of `keywords` in order, or none of them.
    pub fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        let start = self.pos;
        if keywords.iter().all(|keyword| self.parse_keyword(keyword)) {
            true
        } else {
            self.pos = start;
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Option<()> {
        self.parse_keyword(keyword).then_some(())
    }

    fn expect_keywords(&mut self, keywords: &[&str]) -> Option<()> {
        self.parse_keywords(keywords).then_some(())
    }

    /// Consume the next word as an identifier.
    pub fn parse_identifier(&mut self) -> Option<String> {
        self.skip_whitespace();
        let len = self.word_len();
        if len == 0 {
            return None;
        }
        let ident = self.rest()[..len].to_string();
        self.pos += len;
        Some(ident)
    }

    /// Consume the next word as an identifier unless it is one of `stop_words`.
    fn parse_optional_identifier(&mut self, stop_words: &[&str]) -> Option<String> {
        let start = self.pos;
        let ident = self.parse_identifier()?;
        if stop_words.iter().any(|w| ident.eq_ignore_ascii_case(w)) {
            self.pos = start;
            return None;
        }
        Some(ident)
    }

    /// Capture the raw text of a JSON value following a block keyword.
    ///
    /// Objects, arrays and strings are captured up to their balanced end,
    /// ignoring brackets inside string literals. The value extends to the end
    /// of the statement instead when it is not followed by one of `followers`
    /// or by the end of input. Stray text after a block is thus handed to the
    /// JSON decoder rather than failing the grammar.
    pub fn parse_json_island(&mut self, followers: &[&str]) -> String {
        self.skip_whitespace();
        let start = self.pos;
        let rest = self.rest();
        let len = match rest.chars().next() {
            Some('{' | '[' | '"') => balanced_len(rest),
            _ => rest.len(),
        };
        self.pos += len;
        if !self.at_clause_end(followers) {
            self.pos = start + statement_body_len(&self.sql[start..]);
        }
        self.sql[start..self.pos].trim_end().to_string()
    }

    /// Whether only semicolons remain or the next word is one of `followers`.
    fn at_clause_end(&mut self, followers: &[&str]) -> bool {
        let start = self.pos;
        let at_end = self.parse_end()
            || followers.iter().any(|keyword| {
                self.pos = start;
                self.parse_keyword(keyword)
            });
        self.pos = start;
        at_end
    }

    /// Accept trailing semicolons and whitespace, then require end of input.
    fn parse_end(&mut self) -> bool {
        loop {
            self.skip_whitespace();
            if !self.rest().starts_with(';') {
                break;
            }
            self.pos += 1;
        }
        self.rest().is_empty()
    }
}

fn parse_create_prefix(parser: &mut OpenDicParser<'_>) -> Option<CreateModifiers> {
    parser.expect_keyword("create")?;
    let or_replace = parser.parse_keywords(&["or", "replace"]);
    let temporary = parser.parse_keyword("temporary");
    parser.expect_keyword("open")?;
    Some(CreateModifiers {
        or_replace,
        temporary,
        if_not_exists: false,
    })
}

fn parse_create_batch(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    let mut modifiers = parse_create_prefix(parser)?;
    parser.expect_keyword("batch")?;
    let object_type = parser.parse_identifier()?;
    modifiers.if_not_exists = parser.parse_keywords(&["if", "not", "exists"]);
    let objects = parser
        .parse_keyword("objects")
        .then(|| parser.parse_json_island(&[]));
    Some(OpenDicStatement::CreateBatch {
        object_type,
        objects,
        modifiers,
    })
}

fn parse_create_udo(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    let mut modifiers = parse_create_prefix(parser)?;
    let object_type = parser.parse_identifier()?;
    let name = parser.parse_optional_identifier(CREATE_CLAUSE_KEYWORDS);
    modifiers.if_not_exists = parser.parse_keywords(&["if", "not", "exists"]);
    let alias = if parser.parse_keyword("as") {
        Some(parser.parse_identifier()?)
    } else {
        None
    };
    let props = parser.parse_keyword("props").then(|| parser.parse_json_island(&[]));
    Some(OpenDicStatement::CreateUdo {
        object_type,
        name,
        alias,
        props,
        modifiers,
    })
}

fn parse_show_types(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["show", "open", "types"])?;
    Some(OpenDicStatement::ShowTypes)
}

fn parse_show_platforms(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["show", "open", "platforms"])?;
    if parser.parse_keyword("for") {
        let object_type = parser.parse_identifier()?;
        Some(OpenDicStatement::ShowPlatformsForType { object_type })
    } else {
        Some(OpenDicStatement::ShowAllPlatforms)
    }
}

fn parse_show_mappings_for_platform(
    parser: &mut OpenDicParser<'_>,
) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["show", "open", "mappings", "for"])?;
    let platform = parser.parse_identifier()?;
    Some(OpenDicStatement::ShowMappingsForPlatform { platform })
}

fn parse_show_mapping(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["show", "open"])?;
    parser.parse_keyword("mapping");
    let object_type = parser.parse_identifier()?;
    parser.expect_keyword("platform")?;
    let platform = parser.parse_identifier()?;
    Some(OpenDicStatement::ShowMappingForPlatformAndType {
        object_type,
        platform,
    })
}

fn parse_show(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["show", "open"])?;
    let object_type = parser.parse_identifier()?;
    Some(OpenDicStatement::Show { object_type })
}

fn parse_sync_all(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["sync", "open", "objects", "for"])?;
    let platform = parser.parse_identifier()?;
    Some(OpenDicStatement::SyncAll { platform })
}

fn parse_sync(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["sync", "open"])?;
    let object_type = parser.parse_identifier()?;
    let platform = if parser.parse_keyword("for") {
        Some(parser.parse_identifier()?)
    } else {
        None
    };
    Some(OpenDicStatement::Sync {
        object_type,
        platform,
    })
}

fn parse_define(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["define", "open"])?;
    let object_type = parser.parse_identifier()?;
    let props = parser.parse_keyword("props").then(|| parser.parse_json_island(&[]));
    Some(OpenDicStatement::Define { object_type, props })
}

fn parse_alter(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["alter", "open"])?;
    let object_type = parser.parse_identifier()?;
    let name = parser.parse_identifier()?;
    let props = parser.parse_keyword("props").then(|| parser.parse_json_island(&[]));
    Some(OpenDicStatement::Alter {
        object_type,
        name,
        props,
    })
}

fn parse_drop_mapping(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["drop", "open", "mapping", "for"])?;
    let platform = parser.parse_identifier()?;
    Some(OpenDicStatement::DropMapping { platform })
}

fn parse_drop(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["drop", "open"])?;
    let object_type = parser.parse_identifier()?;
    Some(OpenDicStatement::Drop { object_type })
}

fn parse_add_mapping(parser: &mut OpenDicParser<'_>) -> Option<OpenDicStatement> {
    parser.expect_keywords(&["add", "open", "mapping"])?;
    let object_type = parser.parse_identifier()?;
    parser.expect_keyword("platform")?;
    let platform = parser.parse_identifier()?;
    let syntax = parser
        .parse_keyword("syntax")
        .then(|| parser.parse_json_island(&["props"]));
    let props = parser.parse_keyword("props").then(|| parser.parse_json_island(&[]));
    Some(OpenDicStatement::AddMapping {
        object_type,
        platform,
        syntax,
        props,
    })
}

/// Byte length of `text` without trailing semicolons and whitespace.
fn statement_body_len(text: &str) -> usize {
    text.trim_end_matches(|c: char| c == ';' || c.is_whitespace())
        .len()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte length of the bracketed or quoted value at the start of `text`, or the
/// whole text when the value is not terminated.
fn balanced_len(text: &str) -> usize {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                if depth == 0 {
                    return idx + 1;
                }
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return idx + 1;
                }
            }
            _ => {}
        }
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(sql: &str) -> OpenDicStatement {
        match OpenDicParser::parse_sql(sql) {
            Statement::OpenDic(statement) => statement,
            Statement::Native(sql) => panic!("expected OPEN statement, got native: {sql}"),
        }
    }

    #[test]
    fn test_parse_create_udo() {
        let statement = parse("CREATE OPEN function my_function");
        assert_eq!(
            statement,
            OpenDicStatement::CreateUdo {
                object_type: "function".to_string(),
                name: Some("my_function".to_string()),
                alias: None,
                props: None,
                modifiers: CreateModifiers::default(),
            }
        );

        let statement = parse(
            "create or replace temporary open function f if not exists as g props {\"a\": {\"b\": 1}}",
        );
        assert_eq!(
            statement,
            OpenDicStatement::CreateUdo {
                object_type: "function".to_string(),
                name: Some("f".to_string()),
                alias: Some("g".to_string()),
                props: Some("{\"a\": {\"b\": 1}}".to_string()),
                modifiers: CreateModifiers {
                    or_replace: true,
                    temporary: true,
                    if_not_exists: true,
                },
            }
        );
    }

    #[test]
    fn test_parse_create_multiline_props() {
        let sql = r#"
    CREATE OPEN function my_function
    props {
        "args": {
            "arg1": "string"
        },
        "definition": "SELECT '}' FROM t"
    }
    "#;
        let OpenDicStatement::CreateUdo { props, .. } = parse(sql) else {
            panic!("expected CreateUdo");
        };
        let props = props.unwrap();
        assert!(props.starts_with('{'));
        assert!(props.ends_with('}'));
        assert!(props.contains("SELECT '}' FROM t"));
    }

    #[test]
    fn test_parse_create_without_name() {
        assert!(matches!(
            parse("CREATE OPEN function PROPS {}"),
            OpenDicStatement::CreateUdo { name: None, props: Some(_), .. }
        ));
    }

    #[test]
    fn test_unterminated_props_extends_to_end() {
        let sql = "CREATE OPEN function f PROPS { \"args\": { \"a\": \"string\" }, \"language\": \"sql\"";
        let OpenDicStatement::CreateUdo { props, .. } = parse(sql) else {
            panic!("expected CreateUdo");
        };
        assert_eq!(
            props.as_deref(),
            Some("{ \"args\": { \"a\": \"string\" }, \"language\": \"sql\"")
        );
    }

    #[rstest]
    #[case(r#"CREATE OPEN function f PROPS {"a": 1}}"#, r#"{"a": 1}}"#)]
    #[case(r#"CREATE OPEN function f PROPS {"a": 1} trailing;"#, r#"{"a": 1} trailing"#)]
    #[case(r#"CREATE OPEN function f PROPS {"a": 1} ;"#, r#"{"a": 1}"#)]
    fn test_trailing_text_stays_in_last_block(#[case] sql: &str, #[case] expected: &str) {
        let OpenDicStatement::CreateUdo { props, .. } = parse(sql) else {
            panic!("expected CreateUdo");
        };
        assert_eq!(props.as_deref(), Some(expected));
    }

    #[test]
    fn test_syntax_block_stops_before_props() {
        let sql = r#"ADD OPEN MAPPING function PLATFORM spark SYNTAX {"a"}} PROPS {}"#;
        let OpenDicStatement::AddMapping { syntax, props, .. } = parse(sql) else {
            panic!("expected AddMapping");
        };
        assert_eq!(syntax.as_deref(), Some(r#"{"a"}} PROPS {}"#));
        assert_eq!(props, None);

        let sql = r#"ADD OPEN MAPPING function PLATFORM spark SYNTAX {"a"} PROPS {}}"#;
        let OpenDicStatement::AddMapping { syntax, props, .. } = parse(sql) else {
            panic!("expected AddMapping");
        };
        assert_eq!(syntax.as_deref(), Some(r#"{"a"}"#));
        assert_eq!(props.as_deref(), Some("{}}"));
    }

    #[test]
    fn test_parse_create_batch() {
        let sql = r#"CREATE OPEN BATCH function
    OBJECTS [
        { "name": "my_func1", "definition": "SELECT 1" },
        { "name": "my_func2", "definition": "SELECT 2" }
    ]"#;
        let OpenDicStatement::CreateBatch {
            object_type,
            objects,
            ..
        } = parse(sql)
        else {
            panic!("expected CreateBatch");
        };
        assert_eq!(object_type, "function");
        let objects = objects.unwrap();
        assert!(objects.starts_with('[') && objects.ends_with(']'));
    }

    #[rstest]
    #[case("SHOW OPEN TYPES", OpenDicStatement::ShowTypes)]
    #[case("SHOW OPEN PLATFORMS", OpenDicStatement::ShowAllPlatforms)]
    #[case(
        "show open platforms for function",
        OpenDicStatement::ShowPlatformsForType { object_type: "function".to_string() }
    )]
    #[case(
        "SHOW OPEN MAPPINGS FOR spark",
        OpenDicStatement::ShowMappingsForPlatform { platform: "spark".to_string() }
    )]
    #[case(
        "SHOW OPEN MAPPING function PLATFORM spark",
        OpenDicStatement::ShowMappingForPlatformAndType {
            object_type: "function".to_string(),
            platform: "spark".to_string(),
        }
    )]
    #[case(
        "SHOW OPEN function PLATFORM spark",
        OpenDicStatement::ShowMappingForPlatformAndType {
            object_type: "function".to_string(),
            platform: "spark".to_string(),
        }
    )]
    #[case("SHOW OPEN function", OpenDicStatement::Show { object_type: "function".to_string() })]
    #[case("  show   open\n functions ;", OpenDicStatement::Show { object_type: "functions".to_string() })]
    #[case(
        "SYNC OPEN OBJECTS FOR Spark",
        OpenDicStatement::SyncAll { platform: "Spark".to_string() }
    )]
    #[case(
        "SYNC OPEN function for Spark",
        OpenDicStatement::Sync { object_type: "function".to_string(), platform: Some("Spark".to_string()) }
    )]
    #[case(
        "SYNC OPEN function",
        OpenDicStatement::Sync { object_type: "function".to_string(), platform: None }
    )]
    #[case(
        "DEFINE OPEN function",
        OpenDicStatement::Define { object_type: "function".to_string(), props: None }
    )]
    #[case(
        "DROP OPEN MAPPING FOR spark",
        OpenDicStatement::DropMapping { platform: "spark".to_string() }
    )]
    #[case("DROP OPEN function", OpenDicStatement::Drop { object_type: "function".to_string() })]
    fn test_grammar_priority(#[case] sql: &str, #[case] expected: OpenDicStatement) {
        assert_eq!(parse(sql), expected);
    }

    #[test]
    fn test_parse_alter() {
        let statement = parse("ALTER OPEN function my_function PROPS {\"version\": \"2.0\"}");
        assert_eq!(
            statement,
            OpenDicStatement::Alter {
                object_type: "function".to_string(),
                name: "my_function".to_string(),
                props: Some("{\"version\": \"2.0\"}".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_add_mapping() {
        let sql = r#"
    ADD OPEN MAPPING function PLATFORM spark
    SYNTAX {
        "CREATE FUNCTION {name} ({params}) RETURNS STRING AS $$ {def} $$"
    }
    PROPS {
        "def": { "propType": "string", "format": "<value>", "delimiter": "" }
    }
    "#;
        let OpenDicStatement::AddMapping {
            object_type,
            platform,
            syntax,
            props,
        } = parse(sql)
        else {
            panic!("expected AddMapping");
        };
        assert_eq!(object_type, "function");
        assert_eq!(platform, "spark");
        assert!(syntax.unwrap().contains("{name} ({params})"));
        assert!(props.unwrap().contains("propType"));

        let sql = r#"ADD OPEN MAPPING function PLATFORM spark SYNTAX "CREATE {name}" PROPS {}"#;
        let OpenDicStatement::AddMapping { syntax, .. } = parse(sql) else {
            panic!("expected AddMapping");
        };
        assert_eq!(syntax.as_deref(), Some("\"CREATE {name}\""));
    }

    #[rstest]
    #[case("SELECT 1")]
    #[case("CREATE TABLE t (a INT)")]
    #[case("CREATEOPEN function f")]
    #[case("SHOW TABLES")]
    #[case("SHOW OPEN function extra tokens")]
    #[case("DROP OPEN")]
    #[case("")]
    fn test_native_fallback(#[case] sql: &str) {
        assert_eq!(
            OpenDicParser::parse_sql(sql),
            Statement::Native(sql.to_string())
        );
    }

    #[test]
    fn test_grammar_in_isolation() {
        let show = GRAMMARS.iter().find(|g| g.name == "show").unwrap();
        assert_eq!(
            show.apply("SHOW OPEN TYPES"),
            Some(OpenDicStatement::Show {
                object_type: "TYPES".to_string()
            })
        );
        let drop_mapping = GRAMMARS.iter().find(|g| g.name == "drop mapping").unwrap();
        assert_eq!(drop_mapping.apply("DROP OPEN function"), None);
    }
}
