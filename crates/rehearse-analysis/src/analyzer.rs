//! Whole-document analysis

use std::path::{Path, PathBuf};

use rehearse_ast::{attach_comments, Suite};
use rehearse_parser::{parse, parse_with_recovery, ParseError};
use rehearse_symbols::{
    build_best_effort, ModuleResolver, PatternAnalyzer, QueryAnalyzer, SymbolExtractor,
    SymbolTable,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use crate::{AnalyzerConfig, Diagnostic, Validator};

/// Everything known about one document.
///
/// `suite` is the strict tree and is only present when the document parsed
/// cleanly. `recovery_suite` is only produced when the strict parse failed
/// and recovery is enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzedFile {
    pub path: Option<PathBuf>,
    pub suite: Option<Suite>,
    pub parse_error: Option<ParseError>,
    pub recovery_suite: Option<Suite>,
    pub recovery_error: Option<ParseError>,
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalyzedFile {
    pub fn has_errors(&self) -> bool {
        self.parse_error.is_some() || self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// The most complete tree available
    pub fn best_suite(&self) -> Option<&Suite> {
        self.suite.as_ref().or(self.recovery_suite.as_ref())
    }
}

pub struct Analyzer {
    config: AnalyzerConfig,
    query_analyzer: Box<dyn QueryAnalyzer>,
    resolver: Option<Box<dyn ModuleResolver>>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            query_analyzer: Box::new(PatternAnalyzer),
            resolver: None,
        }
    }

    pub fn with_query_analyzer(mut self, analyzer: impl QueryAnalyzer + 'static) -> Self {
        self.query_analyzer = Box::new(analyzer);
        self
    }

    /// Load imported modules through `resolver`
    pub fn with_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Parse, build symbols and collect diagnostics for `source`.
    ///
    /// Never fails: problems end up in the returned file's errors and
    /// diagnostics.
    pub fn analyze(&self, path: Option<&Path>, source: &str) -> AnalyzedFile {
        let _span = info_span!("analyze", path = ?path).entered();

        let strict = parse(source);
        let mut suite = strict.suite;
        if let Some(suite) = suite.as_mut() {
            attach_comments(suite, &strict.trivia);
        }

        let mut recovery_suite = None;
        let mut recovery_error = None;
        if suite.is_none() && self.config.recovery {
            let output = parse_with_recovery(source, true);
            recovery_suite = output.suite.map(|mut tree| {
                attach_comments(&mut tree, &output.trivia);
                tree
            });
            recovery_error = output.error;
        }

        let mut extractor = SymbolExtractor::new(self.query_analyzer.as_ref());
        if let Some(resolver) = self.resolver.as_deref() {
            extractor = extractor.with_resolver(resolver, path);
        }
        let symbols = build_best_effort(&extractor, suite.as_ref(), recovery_suite.as_ref(), source);

        let name = self.config.source_name.as_str();
        let mut diagnostics = match recovery_error.as_ref().or(strict.error.as_ref()) {
            Some(error) => Diagnostic::from_parse_error(error, name),
            None => Vec::new(),
        };
        if let (Some(tree), true) = (suite.as_ref(), self.config.validate) {
            diagnostics.extend(
                Validator::new(tree, &symbols, name)
                    .check_imports(self.resolver.is_some())
                    .validate(),
            );
        }

        debug!(
            clean = suite.is_some(),
            recovered = recovery_suite.is_some(),
            diagnostics = diagnostics.len(),
            "analysis complete"
        );

        AnalyzedFile {
            path: path.map(Path::to_path_buf),
            suite,
            parse_error: strict.error,
            recovery_suite,
            recovery_error,
            symbols,
            diagnostics,
        }
    }
}
