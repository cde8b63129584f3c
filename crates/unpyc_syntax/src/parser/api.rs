/// Parse a token stream against `grammar` with the standard reduce checks.
///
/// This is the main public entrypoint for parsing a prepared token stream.
///
/// ## Parameters
/// - `tokens`: Token stream produced by [`crate::scanner::scan`].
/// - `grammar`: The dialect grammar, already extended for the stream's variable-arity opcodes.
///
/// ## Errors
/// - [`ParseError`] if no reading of the whole stream reduces to the grammar's goal.
#[tracing::instrument(skip_all, fields(token_count = tokens.len(), productions = grammar.len()))]
pub fn parse(tokens: &[Token], grammar: &Grammar) -> Result<SyntaxTree, ParseError> {
    parse_with_checks(tokens, grammar, &ReduceChecks::standard())
}

/// Parse with an explicit reduce-check registry.
///
/// ## Errors
/// - [`ParseError`] if no reading of the whole stream survives the checks and reduces to the goal.
pub fn parse_with_checks(tokens: &[Token], grammar: &Grammar, checks: &ReduceChecks) -> Result<SyntaxTree, ParseError> {
    let compiled = CompiledGrammar::new(grammar);
    let mut recognizer = Recognizer::new(&compiled, tokens, checks);
    let furthest = recognizer.run();
    recognizer.extract().ok_or_else(|| recognizer.error(furthest))
}

/// Parse scanner output: extend the dialect's base grammar with the observed arities, then parse.
///
/// ## Errors
/// - [`ParseError`] as for [`parse`].
pub fn parse_tokens(scanned: &Scanned, repo: &GrammarRepository) -> Result<SyntaxTree, ParseError> {
    let mut session = repo.session(scanned.dialect);
    let grammar = session.extend(&scanned.customize);
    parse(&scanned.tokens, grammar)
}
