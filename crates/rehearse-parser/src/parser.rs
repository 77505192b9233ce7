//! Recursive descent parser with member-level error recovery

use rehearse_ast::*;
use tracing::trace;

use crate::ParseError;

/// Which body a member is parsed in. Decides the tokens that may resume
/// parsing after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    TopLevel,
    ScopeBody,
    TestBody,
    AssertBody,
    SetupBlock,
}

impl Context {
    fn can_start(&self, token: &Token) -> bool {
        let keyword = |words: &[&str]| words.iter().any(|w| token.is_keyword(w));
        let name = token.kind == TokenKind::Ident && !token.is_parameter();
        match self {
            Context::TopLevel => keyword(&["import", "query", "setup", "teardown"]) || name,
            Context::ScopeBody => keyword(&["setup", "teardown", "test", "group"]),
            Context::TestBody => keyword(&["setup", "assert"]) || token.kind == TokenKind::Ident,
            Context::AssertBody => expr_token(token).is_some(),
            Context::SetupBlock => name || token.kind == TokenKind::RawString,
        }
    }
}

/// Outcome of one member rule
enum Member<T> {
    Parsed(T),
    Skipped(RecoveryMeta),
}

/// What the first skipped token of a failed member announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lead {
    Import,
    Query,
    Setup,
    Teardown,
    Test,
    Group,
    Assert,
    Ident,
    Other,
}

fn lead(meta: &RecoveryMeta) -> Lead {
    let Some(token) = meta.significant().next() else {
        return Lead::Other;
    };
    match (token.kind, token.text.as_str()) {
        (TokenKind::Keyword, "import") => Lead::Import,
        (TokenKind::Keyword, "query") => Lead::Query,
        (TokenKind::Keyword, "setup") => Lead::Setup,
        (TokenKind::Keyword, "teardown") => Lead::Teardown,
        (TokenKind::Keyword, "test") => Lead::Test,
        (TokenKind::Keyword, "group") => Lead::Group,
        (TokenKind::Keyword, "assert") => Lead::Assert,
        (TokenKind::Ident, _) => Lead::Ident,
        _ => Lead::Other,
    }
}

fn placeholder_span(meta: &RecoveryMeta) -> Span {
    meta.covered_span()
        .or_else(|| meta.recovered_span.map(Span::point))
        .unwrap_or_default()
}

enum TopItem {
    Import(Import),
    Query(Query),
    Setup(SetupClause),
    Teardown(Teardown),
    Scope(QueryScope),
}

enum BodyItem {
    Setup(SetupClause),
    Teardown(Teardown),
    Test(Test),
    Group(Group),
}

enum TestItem {
    Setup(SetupClause),
    Statement(Statement),
    Assert(Assert),
}

/// Shared body of query scopes and groups
#[derive(Default)]
struct Body {
    setup: Option<SetupClause>,
    teardown: Option<Teardown>,
    items: Vec<TestOrGroup>,
    recovery: RecoveryMeta,
}

impl Body {
    fn place(&mut self, meta: RecoveryMeta) {
        let span = placeholder_span(&meta);
        match lead(&meta) {
            Lead::Setup if self.setup.is_none() => {
                self.setup = Some(SetupClause {
                    span,
                    recovery: meta,
                    ..Default::default()
                })
            }
            Lead::Teardown if self.teardown.is_none() => {
                self.teardown = Some(Teardown {
                    span,
                    recovery: meta,
                    ..Default::default()
                })
            }
            Lead::Test => self.items.push(TestOrGroup::Test(Test {
                span,
                recovery: meta,
                ..Default::default()
            })),
            Lead::Group => self.items.push(TestOrGroup::Group(Group {
                span,
                recovery: meta,
                ..Default::default()
            })),
            _ => self.recovery.absorb(meta),
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    /// Indices of the non-trivia tokens; the parser walks these
    significant: Vec<usize>,
    pos: usize,
    /// End of the last consumed token
    last_end: Position,
    recovery: bool,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>, recovery: bool) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.end()).unwrap_or_else(Position::start);
            tokens.push(Token::new(TokenKind::Eof, "", end));
        }
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_trivia())
            .map(|(i, _)| i)
            .collect();
        Self {
            tokens,
            significant,
            pos: 0,
            last_end: Position::start(),
            recovery,
            errors: Vec::new(),
        }
    }

    /// Errors recovered from so far, in the order they were met
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    // === Utilities ===

    fn current(&self) -> &Token {
        let index = self
            .significant
            .get(self.pos)
            .or(self.significant.last())
            .copied()
            .unwrap_or(0);
        &self.tokens[index]
    }

    fn peek_kind(&self, n: usize) -> TokenKind {
        self.significant
            .get(self.pos + n)
            .map(|&i| self.tokens[i].kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
            self.last_end = token.end();
        }
        token
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn at_name(&self) -> bool {
        self.at(TokenKind::Ident) && !self.current().is_parameter()
    }

    fn error_here(&self, expected: &str) -> ParseError {
        ParseError::unexpected(expected, self.current())
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(expected))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<Token, ParseError> {
        if self.current().is_keyword(word) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&format!("'{}'", word)))
        }
    }

    /// A plain identifier, `$parameters` excluded
    fn expect_name(&mut self, expected: &str) -> Result<String, ParseError> {
        if self.at_name() {
            Ok(self.advance().text)
        } else {
            Err(self.error_here(expected))
        }
    }

    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.last_end)
    }

    /// Whether the significant token at `index` is the first on its line
    fn starts_line(&self, index: usize) -> bool {
        let Some(&current) = self.significant.get(index) else {
            return false;
        };
        match index.checked_sub(1).and_then(|i| self.significant.get(i)) {
            Some(&prev) => self.tokens[prev].end().line < self.tokens[current].pos.line,
            None => true,
        }
    }

    // === Recovery ===

    /// Run one member rule. In recovery mode a failure rewinds to the
    /// member's first token and skips to the next synchronisation point.
    fn member<T>(
        &mut self,
        ctx: Context,
        rule: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Member<T>, ParseError> {
        let start = self.pos;
        let start_end = self.last_end;
        let mark = self.errors.len();
        match rule(self) {
            Ok(node) => Ok(Member::Parsed(node)),
            Err(err) if self.recovery => {
                trace!(error = %err, context = ?ctx, "member failed");
                self.errors.truncate(mark);
                self.errors.push(err);
                self.pos = start;
                self.last_end = start_end;
                Ok(Member::Skipped(self.synchronize(ctx)))
            }
            Err(err) => Err(err),
        }
    }

    /// Skip at least one token, stopping at end of input, at a `}` closing
    /// the enclosing body, or at a line-initial token that can begin a
    /// member of `ctx`.
    fn synchronize(&mut self, ctx: Context) -> RecoveryMeta {
        let first = self.pos;
        let mut depth = 0usize;
        let end = loop {
            let token = self.current().clone();
            if token.kind == TokenKind::Eof {
                break None;
            }
            if self.pos > first && depth == 0 {
                if token.kind == TokenKind::RBrace && ctx != Context::TopLevel {
                    break Some(token.pos);
                }
                if self.starts_line(self.pos) && ctx.can_start(&token) {
                    break Some(token.pos);
                }
            }
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.last_end = token.end();
            self.pos += 1;
        };

        let from = self.significant.get(first).copied().unwrap_or(self.tokens.len());
        let to = self
            .significant
            .get(self.pos)
            .copied()
            .unwrap_or(self.tokens.len());
        let skipped = self.tokens.get(from..to).map(<[Token]>::to_vec).unwrap_or_default();
        let start = self.tokens.get(from).map(|t| t.pos).unwrap_or(self.last_end);
        trace!(from = %start, skipped = skipped.len(), open = end.is_none(), "resynchronised");
        RecoveryMeta::new(start, end, skipped)
    }

    /// Consume the `}` closing a body. A body cut off by end of input is
    /// kept in recovery mode and marked recovered up to the end.
    fn close_brace(&mut self, recovery: &mut RecoveryMeta) -> Result<(), ParseError> {
        if self.at(TokenKind::RBrace) {
            self.advance();
            return Ok(());
        }
        let err = self.error_here("'}'");
        if self.recovery && self.at(TokenKind::Eof) {
            if !self.errors.iter().any(|e| e.span() == err.span()) {
                self.errors.push(err);
            }
            let eof = self.current().pos;
            if !recovery.contains(eof) {
                recovery.absorb(RecoveryMeta::new(eof, None, Vec::new()));
            }
            return Ok(());
        }
        Err(err)
    }

    // === Suite ===

    pub fn parse_suite(&mut self) -> Result<Suite, ParseError> {
        let mut suite = Suite::default();

        while !self.at(TokenKind::Eof) {
            let has_setup = suite.setup.is_some();
            let has_teardown = suite.teardown.is_some();
            match self.member(Context::TopLevel, |p| p.parse_top_item(has_setup, has_teardown))? {
                Member::Parsed(TopItem::Import(import)) => suite.imports.push(import),
                Member::Parsed(TopItem::Query(query)) => suite.queries.push(query),
                Member::Parsed(TopItem::Setup(setup)) => suite.setup = Some(setup),
                Member::Parsed(TopItem::Teardown(teardown)) => suite.teardown = Some(teardown),
                Member::Parsed(TopItem::Scope(scope)) => suite.scopes.push(scope),
                Member::Skipped(meta) => place_top(&mut suite, meta),
            }
        }

        suite.span = Span::new(Position::start(), self.current().pos);
        suite.tokens = self.tokens.clone();
        Ok(suite)
    }

    fn parse_top_item(&mut self, has_setup: bool, has_teardown: bool) -> Result<TopItem, ParseError> {
        let token = self.current().clone();
        match (token.kind, token.text.as_str()) {
            (TokenKind::Keyword, "import") => Ok(TopItem::Import(self.parse_import()?)),
            (TokenKind::Keyword, "query") => Ok(TopItem::Query(self.parse_query()?)),
            (TokenKind::Keyword, "setup") if has_setup => Err(duplicate("suite setup", &token)),
            (TokenKind::Keyword, "setup") => Ok(TopItem::Setup(self.parse_setup()?)),
            (TokenKind::Keyword, "teardown") if has_teardown => {
                Err(duplicate("suite teardown", &token))
            }
            (TokenKind::Keyword, "teardown") => Ok(TopItem::Teardown(self.parse_teardown()?)),
            (TokenKind::Ident, _) if !token.is_parameter() => {
                Ok(TopItem::Scope(self.parse_scope()?))
            }
            _ => Err(self.error_here("'import', 'query', 'setup', 'teardown' or a query scope")),
        }
    }

    fn parse_import(&mut self) -> Result<Import, ParseError> {
        let start = self.expect_keyword("import")?.pos;
        let alias = if self.at_name() {
            Some(self.advance().text)
        } else {
            None
        };
        let path = self.expect(TokenKind::String, "import path")?;
        Ok(Import {
            alias,
            path: unquote(&path.text),
            span: self.span_from(start),
            ..Default::default()
        })
    }

    fn parse_query(&mut self) -> Result<Query, ParseError> {
        let start = self.expect_keyword("query")?.pos;
        let name = self.expect_name("query name")?;
        let body = self.expect(TokenKind::RawString, "query body")?;
        Ok(Query {
            name,
            body: raw_body(&body.text).to_string(),
            span: self.span_from(start),
            ..Default::default()
        })
    }

    fn parse_teardown(&mut self) -> Result<Teardown, ParseError> {
        let start = self.expect_keyword("teardown")?.pos;
        let body = self.expect(TokenKind::RawString, "teardown body")?;
        Ok(Teardown {
            body: Some(raw_body(&body.text).to_string()),
            span: self.span_from(start),
            ..Default::default()
        })
    }

    // === Setup ===

    fn parse_setup(&mut self) -> Result<SetupClause, ParseError> {
        let start = self.expect_keyword("setup")?.pos;
        let mut recovery = RecoveryMeta::default();
        let body = match self.current().kind {
            TokenKind::RawString => SetupBody::Inline(raw_body(&self.advance().text).to_string()),
            TokenKind::LBrace => {
                let (items, meta) = self.parse_setup_block()?;
                recovery = meta;
                SetupBody::Block(items)
            }
            TokenKind::Ident if self.at_name() => {
                if matches!(self.peek_kind(1), TokenKind::Dot | TokenKind::LParen) {
                    SetupBody::Call(self.parse_call()?)
                } else {
                    SetupBody::Module(self.advance().text)
                }
            }
            _ => return Err(self.error_here("setup body")),
        };
        Ok(SetupClause {
            body: Some(body),
            span: self.span_from(start),
            recovery,
            ..Default::default()
        })
    }

    fn parse_setup_block(&mut self) -> Result<(Vec<SetupItem>, RecoveryMeta), ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut items = Vec::new();
        let mut recovery = RecoveryMeta::default();

        loop {
            while self.at(TokenKind::Semicolon) {
                self.advance();
            }
            if self.at(TokenKind::RBrace) || self.at(TokenKind::Eof) {
                break;
            }
            match self.member(Context::SetupBlock, |p| p.parse_setup_item())? {
                Member::Parsed(item) => items.push(item),
                Member::Skipped(meta) => items.push(SetupItem {
                    span: placeholder_span(&meta),
                    recovery: meta,
                    ..Default::default()
                }),
            }
        }

        self.close_brace(&mut recovery)?;
        Ok((items, recovery))
    }

    fn parse_setup_item(&mut self) -> Result<SetupItem, ParseError> {
        let start = self.current().pos;
        let kind = match self.current().kind {
            TokenKind::RawString => {
                SetupItemKind::Inline(raw_body(&self.advance().text).to_string())
            }
            TokenKind::Ident if self.at_name() => SetupItemKind::Call(self.parse_call()?),
            _ => return Err(self.error_here("setup item")),
        };
        Ok(SetupItem {
            kind: Some(kind),
            span: self.span_from(start),
            ..Default::default()
        })
    }

    /// `[alias.]Name[(params)]`
    fn parse_call(&mut self) -> Result<SetupCall, ParseError> {
        let start = self.current().pos;
        let first = self.expect_name("query name")?;
        let (module, query) = if self.at(TokenKind::Dot) {
            self.advance();
            (Some(first), self.expect_name("query name")?)
        } else {
            (None, first)
        };
        let params = if self.at(TokenKind::LParen) {
            self.parse_params()?
        } else {
            Vec::new()
        };
        Ok(SetupCall {
            module,
            query,
            params,
            span: self.span_from(start),
            ..Default::default()
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            let name = self.expect_name("parameter name")?;
            self.expect(TokenKind::Colon, "':'")?;
            let value = self.parse_param_value()?;
            params.push(Param { name, value });
            if !self.at(TokenKind::RParen) {
                self.expect(TokenKind::Comma, "',' or ')'")?;
            }
        }
        self.advance();
        Ok(params)
    }

    fn parse_param_value(&mut self) -> Result<ParamValue, ParseError> {
        match self.current().kind {
            TokenKind::Ident if self.current().is_parameter() => {
                let token = self.current().clone();
                match token.text.strip_prefix('$').filter(|name| !name.is_empty()) {
                    Some(name) => {
                        self.advance();
                        Ok(ParamValue::Variable(name.to_string()))
                    }
                    None => Err(self.error_here("parameter value")),
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut values = Vec::new();
                while !self.at(TokenKind::RBracket) {
                    values.push(self.parse_param_value()?);
                    if !self.at(TokenKind::RBracket) {
                        self.expect(TokenKind::Comma, "',' or ']'")?;
                    }
                }
                self.advance();
                Ok(ParamValue::List(values))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                while !self.at(TokenKind::RBrace) {
                    let key = self.parse_map_key()?;
                    self.expect(TokenKind::Colon, "':'")?;
                    entries.push((key, self.parse_param_value()?));
                    if !self.at(TokenKind::RBrace) {
                        self.expect(TokenKind::Comma, "',' or '}'")?;
                    }
                }
                self.advance();
                Ok(ParamValue::Map(entries))
            }
            _ => Ok(ParamValue::Literal(self.parse_literal()?)),
        }
    }

    // === Scopes and groups ===

    fn parse_scope(&mut self) -> Result<QueryScope, ParseError> {
        let start = self.current().pos;
        let query = self.expect_name("query name")?;
        let body = self.parse_body()?;
        Ok(QueryScope {
            query,
            setup: body.setup,
            teardown: body.teardown,
            items: body.items,
            span: self.span_from(start),
            recovery: body.recovery,
            ..Default::default()
        })
    }

    fn parse_group(&mut self) -> Result<Group, ParseError> {
        let start = self.expect_keyword("group")?.pos;
        let name = self.parse_name("group name")?;
        let body = self.parse_body()?;
        Ok(Group {
            name,
            setup: body.setup,
            teardown: body.teardown,
            items: body.items,
            span: self.span_from(start),
            recovery: body.recovery,
            ..Default::default()
        })
    }

    fn parse_body(&mut self) -> Result<Body, ParseError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut body = Body::default();

        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let has_setup = body.setup.is_some();
            let has_teardown = body.teardown.is_some();
            match self.member(Context::ScopeBody, |p| p.parse_body_item(has_setup, has_teardown))? {
                Member::Parsed(BodyItem::Setup(setup)) => body.setup = Some(setup),
                Member::Parsed(BodyItem::Teardown(teardown)) => body.teardown = Some(teardown),
                Member::Parsed(BodyItem::Test(test)) => body.items.push(TestOrGroup::Test(test)),
                Member::Parsed(BodyItem::Group(group)) => {
                    body.items.push(TestOrGroup::Group(group))
                }
                Member::Skipped(meta) => body.place(meta),
            }
        }

        self.close_brace(&mut body.recovery)?;
        Ok(body)
    }

    fn parse_body_item(&mut self, has_setup: bool, has_teardown: bool) -> Result<BodyItem, ParseError> {
        let token = self.current().clone();
        match (token.kind, token.text.as_str()) {
            (TokenKind::Keyword, "setup") if has_setup => Err(duplicate("setup", &token)),
            (TokenKind::Keyword, "setup") => Ok(BodyItem::Setup(self.parse_setup()?)),
            (TokenKind::Keyword, "teardown") if has_teardown => Err(duplicate("teardown", &token)),
            (TokenKind::Keyword, "teardown") => Ok(BodyItem::Teardown(self.parse_teardown()?)),
            (TokenKind::Keyword, "test") => Ok(BodyItem::Test(self.parse_test()?)),
            (TokenKind::Keyword, "group") => Ok(BodyItem::Group(self.parse_group()?)),
            _ => Err(self.error_here("'test', 'group', 'setup' or 'teardown'")),
        }
    }

    /// Test and group names: a string or an identifier
    fn parse_name(&mut self, expected: &str) -> Result<String, ParseError> {
        match self.current().kind {
            TokenKind::String => Ok(unquote(&self.advance().text)),
            TokenKind::Ident if self.at_name() => Ok(self.advance().text),
            _ => Err(self.error_here(expected)),
        }
    }

    // === Tests ===

    fn parse_test(&mut self) -> Result<Test, ParseError> {
        let start = self.expect_keyword("test")?.pos;
        let name = self.parse_name("test name")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut test = Test {
            name,
            ..Default::default()
        };

        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let has_setup = test.setup.is_some();
            match self.member(Context::TestBody, |p| p.parse_test_item(has_setup))? {
                Member::Parsed(TestItem::Setup(setup)) => test.setup = Some(setup),
                Member::Parsed(TestItem::Statement(stmt)) => test.statements.push(stmt),
                Member::Parsed(TestItem::Assert(assert)) => test.asserts.push(assert),
                Member::Skipped(meta) => {
                    let span = placeholder_span(&meta);
                    match lead(&meta) {
                        Lead::Setup if test.setup.is_none() => {
                            test.setup = Some(SetupClause {
                                span,
                                recovery: meta,
                                ..Default::default()
                            })
                        }
                        Lead::Assert => test.asserts.push(Assert {
                            span,
                            recovery: meta,
                            ..Default::default()
                        }),
                        Lead::Ident => test.statements.push(Statement {
                            span,
                            recovery: meta,
                            ..Default::default()
                        }),
                        _ => test.recovery.absorb(meta),
                    }
                }
            }
        }

        self.close_brace(&mut test.recovery)?;
        test.span = self.span_from(start);
        Ok(test)
    }

    fn parse_test_item(&mut self, has_setup: bool) -> Result<TestItem, ParseError> {
        let token = self.current().clone();
        match (token.kind, token.text.as_str()) {
            (TokenKind::Keyword, "setup") if has_setup => Err(duplicate("test setup", &token)),
            (TokenKind::Keyword, "setup") => Ok(TestItem::Setup(self.parse_setup()?)),
            (TokenKind::Keyword, "assert") => Ok(TestItem::Assert(self.parse_assert()?)),
            (TokenKind::Ident, _) => Ok(TestItem::Statement(self.parse_statement()?)),
            _ => Err(self.error_here("a statement, 'setup' or 'assert'")),
        }
    }

    /// `key.path: value`
    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let start = self.current().pos;
        let mut key = vec![self.expect(TokenKind::Ident, "statement key")?.text];
        while self.at(TokenKind::Dot) {
            self.advance();
            let segment = self.current().clone();
            match segment.kind {
                TokenKind::Ident if !segment.is_parameter() => key.push(segment.text),
                // `rows.0.1` lexes its tail as the number `0.1`
                TokenKind::Number if !segment.text.starts_with('-') => {
                    key.extend(segment.text.split('.').map(str::to_string))
                }
                _ => return Err(self.error_here("key segment")),
            }
            self.advance();
        }
        self.expect(TokenKind::Colon, "':'")?;
        let value = self.parse_value()?;
        Ok(Statement {
            key,
            value: Some(value),
            span: self.span_from(start),
            ..Default::default()
        })
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let start = self.current().pos;
        let kind = match self.current().kind {
            TokenKind::LBracket => {
                self.advance();
                let mut values = Vec::new();
                while !self.at(TokenKind::RBracket) {
                    values.push(self.parse_value()?);
                    if !self.at(TokenKind::RBracket) {
                        self.expect(TokenKind::Comma, "',' or ']'")?;
                    }
                }
                self.advance();
                ValueKind::List(values)
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                while !self.at(TokenKind::RBrace) {
                    let entry_start = self.current().pos;
                    let key = self.parse_map_key()?;
                    self.expect(TokenKind::Colon, "':'")?;
                    let value = self.parse_value()?;
                    entries.push(MapEntry {
                        key,
                        value,
                        span: self.span_from(entry_start),
                    });
                    if !self.at(TokenKind::RBrace) {
                        self.expect(TokenKind::Comma, "',' or '}'")?;
                    }
                }
                self.advance();
                ValueKind::Map(entries)
            }
            _ => ValueKind::Literal(self.parse_literal()?),
        };
        Ok(Value::new(kind, self.span_from(start)))
    }

    fn parse_map_key(&mut self) -> Result<String, ParseError> {
        match self.current().kind {
            TokenKind::String => Ok(unquote(&self.advance().text)),
            TokenKind::Ident if self.at_name() => Ok(self.advance().text),
            _ => Err(self.error_here("map key")),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let token = self.current().clone();
        let literal = match (token.kind, token.text.as_str()) {
            (TokenKind::String, text) => Literal::String(unquote(text)),
            (TokenKind::Number, text) => Literal::Number(
                text.parse()
                    .map_err(|_| ParseError::unexpected("number", &token))?,
            ),
            (TokenKind::Keyword, "true") => Literal::Bool(true),
            (TokenKind::Keyword, "false") => Literal::Bool(false),
            (TokenKind::Keyword, "null") => Literal::Null,
            _ => return Err(self.error_here("value")),
        };
        self.advance();
        Ok(literal)
    }

    // === Asserts ===

    fn parse_assert(&mut self) -> Result<Assert, ParseError> {
        let start = self.expect_keyword("assert")?.pos;
        let query = match self.current().kind {
            TokenKind::RawString => Some(AssertQuery::Inline(
                raw_body(&self.advance().text).to_string(),
            )),
            TokenKind::Ident if self.at_name() => Some(AssertQuery::Call(self.parse_call()?)),
            _ => None,
        };
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut assert = Assert {
            query,
            ..Default::default()
        };

        loop {
            while self.at(TokenKind::Semicolon) {
                self.advance();
            }
            if self.at(TokenKind::RBrace) || self.at(TokenKind::Eof) {
                break;
            }
            match self.member(Context::AssertBody, |p| p.parse_expr())? {
                Member::Parsed(expr) => assert.exprs.push(expr),
                Member::Skipped(meta) => assert.recovery.absorb(meta),
            }
        }

        self.close_brace(&mut assert.recovery)?;
        assert.span = self.span_from(start);
        Ok(assert)
    }

    /// The run of expression tokens up to the end of the line, `;` or `}`
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let start = self.current().pos;
        let mut tokens = Vec::new();
        loop {
            let token = self.current().clone();
            if token.pos.line != start.line
                || matches!(
                    token.kind,
                    TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof
                )
            {
                break;
            }
            let Some(expr) = expr_token(&token) else {
                return Err(self.error_here("expression"));
            };
            tokens.push(expr);
            self.advance();
        }
        if tokens.is_empty() {
            return Err(self.error_here("expression"));
        }
        Ok(Expr {
            tokens,
            span: self.span_from(start),
            ..Default::default()
        })
    }
}

fn place_top(suite: &mut Suite, meta: RecoveryMeta) {
    let span = placeholder_span(&meta);
    match lead(&meta) {
        Lead::Import => suite.imports.push(Import {
            span,
            recovery: meta,
            ..Default::default()
        }),
        Lead::Query => suite.queries.push(Query {
            span,
            recovery: meta,
            ..Default::default()
        }),
        Lead::Setup if suite.setup.is_none() => {
            suite.setup = Some(SetupClause {
                span,
                recovery: meta,
                ..Default::default()
            })
        }
        Lead::Teardown if suite.teardown.is_none() => {
            suite.teardown = Some(Teardown {
                span,
                recovery: meta,
                ..Default::default()
            })
        }
        _ => suite.recovery.absorb(meta),
    }
}

fn duplicate(what: &str, token: &Token) -> ParseError {
    ParseError::Duplicate {
        what: what.to_string(),
        span: token.span(),
    }
}

fn expr_token(token: &Token) -> Option<ExprToken> {
    let expr = match token.kind {
        TokenKind::String => ExprToken::String(unquote(&token.text)),
        TokenKind::Number => ExprToken::Number(token.text.clone()),
        TokenKind::Ident => ExprToken::Ident(token.text.clone()),
        TokenKind::Keyword if matches!(token.text.as_str(), "true" | "false" | "null") => {
            ExprToken::Ident(token.text.clone())
        }
        TokenKind::Operator => ExprToken::Operator(token.text.clone()),
        TokenKind::Dot => ExprToken::Dot,
        TokenKind::Colon => ExprToken::Colon,
        TokenKind::Comma => ExprToken::Comma,
        TokenKind::LParen => ExprToken::Bracket('('),
        TokenKind::RParen => ExprToken::Bracket(')'),
        TokenKind::LBracket => ExprToken::Bracket('['),
        TokenKind::RBracket => ExprToken::Bracket(']'),
        _ => return None,
    };
    Some(expr)
}

/// Contents of a backtick body, with or without its closing backtick
fn raw_body(text: &str) -> &str {
    let text = text.strip_prefix('`').unwrap_or(text);
    text.strip_suffix('`').unwrap_or(text)
}

/// Contents of a string literal with escapes resolved
fn unquote(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_escapes() {
        assert_eq!(unquote(r#""a\"b\\c\n""#), "a\"b\\c\n");
    }

    #[test]
    fn test_raw_body_unterminated() {
        assert_eq!(raw_body("`MATCH (n)`"), "MATCH (n)");
        assert_eq!(raw_body("`MATCH"), "MATCH");
    }

    #[test]
    fn test_context_start_tokens() {
        let at = Position::start();
        let setup = Token::new(TokenKind::Keyword, "setup", at);
        let param = Token::new(TokenKind::Ident, "$id", at);
        assert!(Context::TopLevel.can_start(&setup));
        assert!(!Context::TopLevel.can_start(&param));
        assert!(Context::TestBody.can_start(&param));
        assert!(!Context::ScopeBody.can_start(&param));
    }
}
