//! CSS parsing using cssparser
//!
//! Selectors and declaration values are kept as raw source text: downstream
//! analysis needs the literal values the author wrote (`#0066FF`, not a
//! normalized color).

use crate::types::{Declaration, StyleRule, Stylesheet};
use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser,
};
use tracing::debug;

/// CSS Parser
pub struct CssParser;

impl CssParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a stylesheet from a string
    pub fn parse(&self, css: &str) -> Stylesheet {
        let mut sheet = Stylesheet::new();
        self.parse_into(&mut sheet, css, "inline");
        sheet
    }

    /// Parse `css` and append its rules to `sheet` under a new source
    pub fn parse_into(&self, sheet: &mut Stylesheet, css: &str, source_name: &str) {
        let source = sheet.add_source(source_name);
        let before = sheet.rules.len();

        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rule_parser = TopLevelRuleParser {
            sheet: &mut *sheet,
            source,
            media: None,
        };

        for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
            // Lenient parsing: unsupported at-rules and garbage are skipped
            if let Err((_, slice)) = result {
                debug!("Skipped CSS in {}: {}", source_name, abbreviate(slice));
            }
        }

        debug!(
            "Parsed {} rules from {}",
            sheet.rules.len() - before,
            source_name
        );
    }
}

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}

fn abbreviate(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(60) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Consume the remaining tokens of `input` and return their source text
fn consume_raw<'i>(input: &mut Parser<'i, '_>) -> String {
    let start = input.position();
    while input.next().is_ok() {}
    input.slice_from(start).trim().to_string()
}

/// Split a trailing `!important` off a raw declaration value
fn split_important(raw: &str) -> (String, bool) {
    if let Some(bang) = raw.rfind('!') {
        if raw[bang + 1..].trim().eq_ignore_ascii_case("important") {
            return (raw[..bang].trim().to_string(), true);
        }
    }
    (raw.trim().to_string(), false)
}

struct TopLevelRuleParser<'a> {
    sheet: &'a mut Stylesheet,
    source: usize,
    /// Condition of the enclosing `@media` block(s)
    media: Option<String>,
}

/// At-rules whose blocks contain ordinary style rules
enum BlockPrelude {
    Media(String),
    Grouping,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = BlockPrelude;
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        if name.eq_ignore_ascii_case("media") {
            Ok(BlockPrelude::Media(consume_raw(input)))
        } else if name.eq_ignore_ascii_case("supports") || name.eq_ignore_ascii_case("layer") {
            consume_raw(input);
            Ok(BlockPrelude::Grouping)
        } else {
            // @font-face, @keyframes, @import, ... carry no component styling
            Err(input.new_custom_error(()))
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        let outer = self.media.clone();
        if let BlockPrelude::Media(condition) = prelude {
            self.sheet.media_queries.push(condition.clone());
            self.media = Some(match &outer {
                Some(outer) => format!("{} and {}", outer, condition),
                None => condition,
            });
        }

        for result in StyleSheetParser::new(input, &mut *self) {
            let _ = result;
        }

        self.media = outer;
        Ok(())
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = String;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let selector = consume_raw(input)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if selector.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(selector)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut declarations = Vec::new();
        let mut decl_parser = DeclarationListParser {
            declarations: &mut declarations,
        };

        for result in RuleBodyParser::new(input, &mut decl_parser) {
            let _ = result;
        }

        self.sheet.rules.push(StyleRule {
            selector: prelude,
            declarations,
            media: self.media.clone(),
            source: self.source,
        });
        Ok(())
    }
}

struct DeclarationListParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();
}

impl<'i> DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let (value, important) = split_important(&consume_raw(input));
        // Custom property names are case-sensitive
        let property = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        self.declarations.push(Declaration {
            property,
            value,
            important,
        });
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}
